//! Output formats for resolved tokens.

use convert_case::{Boundary, Case, Casing};
use indexmap::IndexMap;
use itertools::Itertools;

use crate::{expression::Value, resolve::ResolvedToken, Error, Node, Result, TokenGroup, TokenType};

const HEADER: &str = "/**\n * Do not edit directly, this file was auto-generated.\n */\n";

const NAME_BOUNDARIES: [Boundary; 5] = [
    Boundary::Space,
    Boundary::Hyphen,
    Boundary::Underscore,
    Boundary::LowerUpper,
    Boundary::Acronym,
];

fn slugify(segment: &str) -> String {
    deunicode::deunicode(segment)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect()
}

/// The custom property name for a token path, without the leading `--`.
pub fn css_name(path: &[String]) -> String {
    path.iter()
        .map(|segment| slugify(segment))
        .join(" ")
        .with_boundaries(&NAME_BOUNDARIES)
        .to_case(Case::Kebab)
}

/// The CSS form of a token's value, or `None` for composites CSS has no
/// single-property form for.
pub fn css_value(token: &ResolvedToken) -> Option<String> {
    match (token.token_type, &token.value) {
        (TokenType::Typography, Value::Composite(fields)) => Some(font_shorthand(fields)),
        (TokenType::Border, Value::Composite(fields)) => Some(
            ["width", "style", "color"]
                .iter()
                .filter_map(|key| fields.get(*key))
                .map(Value::to_css)
                .join(" "),
        ),
        (TokenType::BoxShadow, value @ (Value::Composite(_) | Value::List(_))) => Some(box_shadow(value)),
        (_, Value::Composite(_)) => None,
        (_, value) => Some(value.to_css()),
    }
}

fn font_shorthand(fields: &IndexMap<String, Value>) -> String {
    let part = |key: &str, default: &str| {
        fields
            .get(key)
            .map(Value::to_css)
            .unwrap_or_else(|| default.to_string())
    };
    format!(
        "{} {}/{} {}",
        part("fontWeight", "400"),
        part("fontSize", "16px"),
        part("lineHeight", "1"),
        quote_families(&part("fontFamily", "sans-serif"))
    )
}

fn quote_families(families: &str) -> String {
    families
        .split(',')
        .map(str::trim)
        .map(|family| {
            if family.contains(' ') && !family.starts_with(['\'', '"']) {
                format!("'{family}'")
            } else {
                family.to_string()
            }
        })
        .join(", ")
}

fn box_shadow(value: &Value) -> String {
    match value {
        Value::List(shadows) => shadows.iter().map(box_shadow).join(", "),
        Value::Composite(fields) => {
            let shadow = ["x", "y", "blur", "spread", "color"]
                .iter()
                .filter_map(|key| fields.get(*key))
                .map(Value::to_css)
                .join(" ");
            match fields.get("type") {
                Some(Value::Any(kind)) if kind == "innerShadow" => format!("inset {shadow}"),
                _ => shadow,
            }
        }
        other => other.to_css(),
    }
}

/// `css/variables`: one custom property per token under `selector`.
pub fn css_variables(tokens: &[ResolvedToken], selector: &str) -> String {
    let body: String = tokens
        .iter()
        .filter_map(|token| {
            let Some(value) = css_value(token) else {
                tracing::warn!(
                    token = %token.path.join("."),
                    "composite value has no CSS form, skipping"
                );
                return None;
            };
            let line = format!("  --{}: {};", css_name(&token.path), value);
            Some(match &token.description {
                Some(description) => format!("{line} /* {description} */\n"),
                None => format!("{line}\n"),
            })
        })
        .collect();
    format!("{HEADER}\n{selector} {{\n{body}}}\n")
}

/// `json/nested`: the token tree with each token replaced by its value.
pub fn json_nested(tokens: &[ResolvedToken]) -> Result<String> {
    let mut root = TokenGroup::new();
    for token in tokens {
        insert(&mut root, &token.path, token.value.to_node());
    }
    let mut out = serde_json::to_string_pretty(&root).map_err(Error::Serialize)?;
    out.push('\n');
    Ok(out)
}

fn insert(group: &mut TokenGroup, path: &[String], node: Node) {
    match path {
        [] => {}
        [last] => {
            group.insert(last.clone(), node);
        }
        [head, rest @ ..] => {
            let entry = group
                .entry(head.clone())
                .or_insert_with(|| Node::Group(TokenGroup::new()));
            if !matches!(entry, Node::Group(_)) {
                *entry = Node::Group(TokenGroup::new());
            }
            if let Node::Group(child) = entry {
                insert(child, rest, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_tree;

    fn resolved(json: &str) -> Vec<ResolvedToken> {
        resolve_tree(&serde_json::from_str(json).unwrap()).unwrap()
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn names_are_kebab_case() {
        assert_eq!(css_name(&path(&["color", "bg"])), "color-bg");
        assert_eq!(css_name(&path(&["fontSize", "XL"])), "font-size-xl");
        assert_eq!(css_name(&path(&["semantic-color", "text_primary"])), "semantic-color-text-primary");
        assert_eq!(css_name(&path(&["spacing", "1.5"])), "spacing-1-5");
        assert_eq!(css_name(&path(&["Größe", "Base Line"])), "grosse-base-line");
    }

    #[test]
    fn css_variables_under_selector() {
        let tokens = resolved(
            r##"{
                "color": {
                    "bg": { "value": "#fff", "type": "color", "description": "Page background" },
                    "fg": { "value": "{color.bg}", "type": "color" }
                },
                "space": { "sm": { "value": 4, "type": "spacing" } }
            }"##,
        );
        assert_eq!(
            css_variables(&tokens, "[data-theme=\"dark\"]"),
            concat!(
                "/**\n",
                " * Do not edit directly, this file was auto-generated.\n",
                " */\n",
                "\n",
                "[data-theme=\"dark\"] {\n",
                "  --color-bg: #fff; /* Page background */\n",
                "  --color-fg: #fff;\n",
                "  --space-sm: 4px;\n",
                "}\n",
            )
        );
    }

    #[test]
    fn empty_tree_still_renders_selector() {
        assert!(css_variables(&[], ":root").ends_with(":root {\n}\n"));
        assert_eq!(json_nested(&[]).unwrap(), "{}\n");
    }

    #[test]
    fn composite_shorthands() {
        let tokens = resolved(
            r##"{
                "heading": {
                    "value": { "fontFamily": "ABC Diatype, sans-serif", "fontWeight": "Bold", "fontSize": 32, "lineHeight": "120%" },
                    "type": "typography"
                },
                "outline": { "value": { "color": "#000", "width": 1, "style": "solid" }, "type": "border" },
                "raised": {
                    "value": [
                        { "x": 0, "y": 1, "blur": 2, "spread": 0, "color": "#0000001a", "type": "dropShadow" },
                        { "x": 0, "y": 0, "blur": 1, "spread": 0, "color": "#000", "type": "innerShadow" }
                    ],
                    "type": "boxShadow"
                },
                "layout": { "value": { "gap": 4 }, "type": "composition" }
            }"##,
        );
        let values: Vec<_> = tokens.iter().map(css_value).collect();
        assert_eq!(values[0].as_deref(), Some("700 32px/1.2 'ABC Diatype', sans-serif"));
        assert_eq!(values[1].as_deref(), Some("1px solid #000"));
        assert_eq!(
            values[2].as_deref(),
            Some("0px 1px 2px 0px #0000001a, inset 0px 0px 1px 0px #000")
        );
        assert_eq!(values[3], None);

        let css = css_variables(&tokens, ":root");
        assert!(!css.contains("--layout"));
    }

    #[test]
    fn json_nested_keeps_tree_shape() {
        let tokens = resolved(
            r##"{
                "color": { "$type": "color", "bg": { "value": "#fff" }, "fg": { "value": "#000" } },
                "size": { "base": { "value": "2 * 8", "type": "sizing" }, "ratio": { "value": 1.25 } }
            }"##,
        );
        assert_eq!(
            json_nested(&tokens).unwrap(),
            r##"{
  "color": {
    "bg": "#fff",
    "fg": "#000"
  },
  "size": {
    "base": "16px",
    "ratio": 1.25
  }
}
"##
        );
    }
}
