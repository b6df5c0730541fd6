use csscolorparser::Color;
use serde::Deserialize;

use crate::expression::Expression;

/// The `$extensions` object of a token. Only the Tokens Studio entry is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Extensions {
    #[serde(rename = "studio.tokens", default)]
    pub studio_tokens: Option<StudioTokensExtension>,
}
impl Extensions {
    pub fn modify(&self) -> Option<&Modify> {
        self.studio_tokens.as_ref()?.modify.as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudioTokensExtension {
    #[serde(default)]
    pub modify: Option<Modify>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StudioTokensModify {
    #[serde(rename = "lighten")]
    Lighten,
    #[serde(rename = "darken")]
    Darken,
    #[serde(rename = "alpha")]
    Alpha,
    #[serde(rename = "mix")]
    Mix,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum StudioTokensSpace {
    #[default]
    #[serde(rename = "hsl")]
    Hsl,
    #[serde(rename = "lch")]
    Lch,
    #[serde(rename = "srgb")]
    Srgb,
    #[serde(rename = "p3")]
    P3,
    #[serde(other)]
    Other,
}

/// A color modifier as exported by Tokens Studio.
#[derive(Debug, Clone, Deserialize)]
pub struct Modify {
    #[serde(rename = "type")]
    pub type_: StudioTokensModify,
    /// Amount, between 0 and 1. May reference another token.
    pub value: Expression,
    #[serde(default)]
    pub space: StudioTokensSpace,
    /// Color to mix with, for `mix`.
    #[serde(default)]
    pub color: Option<Expression>,
}
impl Modify {
    pub fn apply(&self, base: &Color, amount: f64, mix_with: Option<&Color>) -> Result<Color, String> {
        let amount = amount.clamp(0.0, 1.0);
        match self.type_ {
            StudioTokensModify::Lighten => match self.space {
                StudioTokensSpace::Hsl => {
                    let (h, s, l, a) = base.to_hsla();
                    Ok(Color::from_hsla(h, s, (l + (1.0 - l) * amount).min(1.0), a))
                }
                StudioTokensSpace::Lch => {
                    let (l, c, h, a) = base.to_lch();
                    Ok(Color::from_lch((l + (100.0 - l) * amount).min(100.0), c, h, a))
                }
                StudioTokensSpace::Srgb | StudioTokensSpace::P3 => {
                    Ok(map_channels(base, |channel| channel + (1.0 - channel) * amount))
                }
                StudioTokensSpace::Other => Err("unsupported color space".to_string()),
            },
            StudioTokensModify::Darken => match self.space {
                StudioTokensSpace::Hsl => {
                    let (h, s, l, a) = base.to_hsla();
                    Ok(Color::from_hsla(h, s, (l - l * amount).max(0.0), a))
                }
                StudioTokensSpace::Lch => {
                    let (l, c, h, a) = base.to_lch();
                    Ok(Color::from_lch((l - l * amount).max(0.0), c, h, a))
                }
                StudioTokensSpace::Srgb | StudioTokensSpace::P3 => {
                    Ok(map_channels(base, |channel| channel - channel * amount))
                }
                StudioTokensSpace::Other => Err("unsupported color space".to_string()),
            },
            StudioTokensModify::Alpha => Ok(Color::new(base.r, base.g, base.b, amount)),
            StudioTokensModify::Mix => {
                let other = mix_with.ok_or("mix modifier needs a color")?;
                let lerp = |from: f64, to: f64| from + (to - from) * amount;
                Ok(Color::new(
                    lerp(base.r, other.r),
                    lerp(base.g, other.g),
                    lerp(base.b, other.b),
                    lerp(base.a, other.a),
                ))
            }
            StudioTokensModify::Other => Err("unsupported modifier type".to_string()),
        }
    }
}

fn map_channels(color: &Color, f: impl Fn(f64) -> f64) -> Color {
    Color::new(
        f(color.r).clamp(0.0, 1.0),
        f(color.g).clamp(0.0, 1.0),
        f(color.b).clamp(0.0, 1.0),
        color.a,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modify(json: &str) -> Modify {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn reads_studio_tokens_extension() {
        let extensions: Extensions = serde_json::from_str(
            r#"{ "studio.tokens": { "id": "abc", "modify": { "type": "darken", "value": "0.2", "space": "lch" } } }"#,
        )
        .unwrap();
        let modify = extensions.modify().unwrap();
        assert_eq!(modify.type_, StudioTokensModify::Darken);
        assert_eq!(modify.space, StudioTokensSpace::Lch);
    }

    #[test]
    fn numeric_amount_is_accepted() {
        let modify = modify(r#"{ "type": "alpha", "value": 0.4 }"#);
        assert_eq!(modify.space, StudioTokensSpace::Hsl);
        let color = modify.apply(&Color::new(1.0, 0.0, 0.0, 1.0), 0.4, None).unwrap();
        assert_eq!(color.a, 0.4);
        assert_eq!(color.r, 1.0);
    }

    #[test]
    fn lighten_and_darken_in_srgb() {
        let base = Color::new(0.5, 0.5, 0.5, 1.0);
        let lighter = modify(r#"{ "type": "lighten", "value": "0.5", "space": "srgb" }"#)
            .apply(&base, 0.5, None)
            .unwrap();
        assert_eq!(lighter.r, 0.75);

        let darker = modify(r#"{ "type": "darken", "value": "0.5", "space": "srgb" }"#)
            .apply(&base, 0.5, None)
            .unwrap();
        assert_eq!(darker.r, 0.25);
    }

    #[test]
    fn darken_in_hsl_reduces_lightness() {
        let base = csscolorparser::parse("#ff0000").unwrap();
        let darker = modify(r#"{ "type": "darken", "value": "0.5", "space": "hsl" }"#)
            .apply(&base, 0.5, None)
            .unwrap();
        assert!((darker.r - 0.5).abs() < 1e-6);
        assert!(darker.g.abs() < 1e-6 && darker.b.abs() < 1e-6);
    }

    #[test]
    fn mix_blends_towards_other_color() {
        let white = Color::new(1.0, 1.0, 1.0, 1.0);
        let black = Color::new(0.0, 0.0, 0.0, 1.0);
        let modify = modify(r##"{ "type": "mix", "value": "0.5", "space": "srgb", "color": "#000000" }"##);
        let mixed = modify.apply(&white, 0.5, Some(&black)).unwrap();
        assert_eq!(mixed.r, 0.5);
        assert!(modify.apply(&white, 0.5, None).is_err());
    }

    #[test]
    fn unknown_modifier_is_rejected() {
        let modify = modify(r#"{ "type": "saturate", "value": "0.5" }"#);
        assert!(modify.apply(&Color::new(0.0, 0.0, 0.0, 1.0), 0.5, None).is_err());
    }
}
