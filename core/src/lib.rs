//! Theme-aware design token merging and output.
//!
//! A [`TokenDocument`] holds named token sets plus the order they apply in.
//! [`select_order`] picks the sets for one [`Theme`], [`merge_by_order`] folds
//! them into a single tree, and an [`engine::Engine`] turns that tree into
//! CSS and JSON files.

use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

pub mod engine;
mod error;
mod expression;
pub mod extensions;
pub mod format;
pub mod merge;
pub mod resolve;
pub mod theme;
mod transform;

pub use error::{Error, Result};
pub use expression::Value;
pub use merge::{deep_merge, merge_by_order};
pub use theme::{select_order, Theme, ThemeSelector};

/// An ordered mapping of keys to nodes. Token sets, groups and merged trees
/// all use this shape.
pub type TokenGroup = IndexMap<String, Node>;

/// One value in a token tree.
///
/// Only [`Node::Group`] is a merge target. Lists and scalars are atomic and
/// always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Group(TokenGroup),
    List(Vec<Node>),
    Leaf(serde_json::Value),
}
impl Node {
    pub fn as_group(&self) -> Option<&TokenGroup> {
        match self {
            Node::Group(group) => Some(group),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Leaf(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}
impl From<TokenGroup> for Node {
    fn from(group: TokenGroup) -> Self {
        Node::Group(group)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub token_set_order: Vec<String>,
}
impl<'de> Deserialize<'de> for Metadata {
    /// Reads `tokenSetOrder` leniently. A missing, `null` or non-array order
    /// is empty, and entries that are not strings are dropped.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let token_set_order = raw
            .get("tokenSetOrder")
            .and_then(serde_json::Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Metadata { token_set_order })
    }
}

/// The raw token source: every token set keyed by name, plus `$metadata`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenDocument {
    #[serde(rename = "$metadata", default)]
    pub metadata: Option<Metadata>,
    #[serde(flatten)]
    pub sets: TokenGroup,
}
impl TokenDocument {
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(Error::Parse)
    }
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }
    /// The canonical merge order, empty when the document has no metadata.
    pub fn token_set_order(&self) -> &[String] {
        self.metadata
            .as_ref()
            .map(|metadata| metadata.token_set_order.as_slice())
            .unwrap_or_default()
    }
    /// Looks up a token set by name. Entries that are not mappings (such as
    /// an exported `$themes` list) are not token sets.
    pub fn token_set(&self, name: &str) -> Option<&TokenGroup> {
        self.sets.get(name).and_then(Node::as_group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TokenType {
    #[serde(rename = "color")]
    Color,
    #[serde(rename = "sizing")]
    Sizing,
    #[serde(rename = "spacing")]
    Spacing,
    #[serde(rename = "borderRadius")]
    BorderRadius,
    #[serde(rename = "borderWidth")]
    BorderWidth,
    #[serde(rename = "dimension")]
    Dimension,
    #[serde(rename = "fontSizes", alias = "fontSize")]
    FontSizes,
    #[serde(rename = "lineHeights", alias = "lineHeight")]
    LineHeights,
    #[serde(rename = "fontWeights", alias = "fontWeight")]
    FontWeights,
    #[serde(rename = "fontFamilies", alias = "fontFamily")]
    FontFamilies,
    #[serde(rename = "letterSpacing")]
    LetterSpacing,
    #[serde(rename = "paragraphSpacing")]
    ParagraphSpacing,
    #[serde(rename = "paragraphIndent")]
    ParagraphIndent,
    #[serde(rename = "opacity")]
    Opacity,
    #[serde(rename = "border")]
    Border,
    #[serde(rename = "typography")]
    Typography,
    #[serde(rename = "boxShadow", alias = "shadow")]
    BoxShadow,
    #[default]
    #[serde(other)]
    Other,
}
impl TokenType {
    /// Types whose unitless numbers are pixel lengths.
    pub fn is_dimension(self) -> bool {
        matches!(
            self,
            TokenType::Sizing
                | TokenType::Spacing
                | TokenType::BorderRadius
                | TokenType::BorderWidth
                | TokenType::Dimension
                | TokenType::FontSizes
                | TokenType::ParagraphSpacing
                | TokenType::ParagraphIndent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_reads_metadata_and_sets_in_order() {
        let document = TokenDocument::from_json(
            r##"{
                "global": { "space": { "value": "4", "type": "spacing" } },
                "component-color/light": { "fg": { "value": "#000" } },
                "$themes": [],
                "$metadata": { "tokenSetOrder": ["global", "component-color/light"] }
            }"##,
        )
        .unwrap();

        assert_eq!(
            document.token_set_order(),
            ["global".to_string(), "component-color/light".to_string()]
        );
        assert_eq!(
            document.sets.keys().collect::<Vec<_>>(),
            ["global", "component-color/light", "$themes"]
        );
        assert!(document.token_set("global").is_some());
        assert!(document.token_set("$themes").is_none());
    }

    #[test]
    fn document_without_metadata_has_empty_order() {
        let document = TokenDocument::from_json("{}").unwrap();
        assert!(document.token_set_order().is_empty());
        assert!(document.sets.is_empty());

        let document = TokenDocument::from_json(r#"{ "$metadata": null }"#).unwrap();
        assert!(document.token_set_order().is_empty());
    }

    #[test]
    fn malformed_metadata_degrades_to_empty_order() {
        let document =
            TokenDocument::from_json(r#"{ "$metadata": { "tokenSetOrder": null } }"#).unwrap();
        assert!(document.token_set_order().is_empty());

        let document = TokenDocument::from_json(
            r#"{ "$metadata": "x", "global": { "space": { "value": "4" } } }"#,
        )
        .unwrap();
        assert!(document.token_set_order().is_empty());
        assert!(document.token_set("global").is_some());

        let document = TokenDocument::from_json(
            r#"{ "$metadata": { "tokenSetOrder": ["global", 3, null, "theme"] } }"#,
        )
        .unwrap();
        assert_eq!(
            document.token_set_order(),
            ["global".to_string(), "theme".to_string()]
        );
    }

    #[test]
    fn arrays_are_lists_not_groups() {
        let node: Node = serde_json::from_str(r#"{ "a": [1, { "b": 2 }], "c": "x" }"#).unwrap();
        let group = node.as_group().unwrap();
        assert!(matches!(group["a"], Node::List(_)));
        assert_eq!(group["c"].as_str(), Some("x"));
    }

    #[test]
    fn token_type_accepts_dtcg_names() {
        let parse = |name: &str| TokenType::deserialize(&serde_json::Value::from(name)).unwrap();
        assert_eq!(parse("fontSizes"), TokenType::FontSizes);
        assert_eq!(parse("fontSize"), TokenType::FontSizes);
        assert_eq!(parse("shadow"), TokenType::BoxShadow);
        assert_eq!(parse("composition"), TokenType::Other);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TokenDocument::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
