use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, TokenDocument};

/// Token set families that exist once per theme, as `<family>/<theme>`.
pub const THEMED_SETS: [&str; 2] = ["component-color", "semantic-color"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}
impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}
impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::UnknownTheme(other.to_string())),
        }
    }
}

/// Picks the token sets that apply to a theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSelector {
    themed_sets: Vec<String>,
}
impl Default for ThemeSelector {
    fn default() -> Self {
        Self::new(THEMED_SETS)
    }
}
impl ThemeSelector {
    pub fn new<I, S>(themed_sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            themed_sets: themed_sets.into_iter().map(Into::into).collect(),
        }
    }

    /// The theme a set name belongs to, if it is one of the themed families.
    /// Only an exact `light`/`dark` suffix counts.
    fn variant_of(&self, name: &str) -> Option<Theme> {
        let (family, variant) = name.rsplit_once('/')?;
        if !self.themed_sets.iter().any(|themed| themed == family) {
            return None;
        }
        variant.parse().ok()
    }

    pub fn includes(&self, name: &str, theme: Theme) -> bool {
        self.variant_of(name).map_or(true, |variant| variant == theme)
    }

    pub fn filter_order<'a, S: AsRef<str>>(&self, order: &'a [S], theme: Theme) -> Vec<&'a str> {
        order
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| self.includes(name, theme))
            .collect()
    }

    /// The document's merge order with the other theme's sets removed.
    pub fn select_order<'a>(&self, document: &'a TokenDocument, theme: Theme) -> Vec<&'a str> {
        self.filter_order(document.token_set_order(), theme)
    }
}

/// [`ThemeSelector::select_order`] with the default themed families.
pub fn select_order(document: &TokenDocument, theme: Theme) -> Vec<&str> {
    ThemeSelector::default().select_order(document, theme)
}
