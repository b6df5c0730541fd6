//! Per-type value transforms applied after a token is evaluated.

use crate::{expression::Value, TokenType};

pub(crate) fn apply(token_type: TokenType, value: Value) -> Value {
    match (token_type, value) {
        (TokenType::Typography, Value::Composite(fields)) => Value::Composite(
            fields
                .into_iter()
                .map(|(key, value)| {
                    let field_type = typography_field(&key);
                    (key, apply(field_type, value))
                })
                .collect(),
        ),
        (TokenType::Border, Value::Composite(fields)) => Value::Composite(
            fields
                .into_iter()
                .map(|(key, value)| match key.as_str() {
                    "width" => (key, apply(TokenType::BorderWidth, value)),
                    _ => (key, value),
                })
                .collect(),
        ),
        (TokenType::BoxShadow, Value::List(shadows)) => Value::List(
            shadows
                .into_iter()
                .map(|shadow| apply(TokenType::BoxShadow, shadow))
                .collect(),
        ),
        (TokenType::BoxShadow, Value::Composite(fields)) => Value::Composite(
            fields
                .into_iter()
                .map(|(key, value)| match key.as_str() {
                    "x" | "y" | "blur" | "spread" => (key, apply(TokenType::Dimension, value)),
                    _ => (key, value),
                })
                .collect(),
        ),
        (t, Value::Number(n, unit)) if unit.is_empty() && t.is_dimension() => {
            Value::Number(n, "px".to_string())
        }
        (TokenType::LineHeights | TokenType::Opacity, Value::Number(n, unit)) if unit == "%" => {
            Value::Number(n / 100.0, String::new())
        }
        (TokenType::LetterSpacing, Value::Number(n, unit)) if unit == "%" => {
            Value::Number(n / 100.0, "em".to_string())
        }
        (TokenType::FontWeights, Value::Any(name)) => match font_weight(&name) {
            Some(weight) => Value::Number(weight, String::new()),
            None => Value::Any(name),
        },
        (_, value) => value,
    }
}

fn typography_field(key: &str) -> TokenType {
    match key {
        "fontSize" => TokenType::FontSizes,
        "lineHeight" => TokenType::LineHeights,
        "fontWeight" => TokenType::FontWeights,
        "fontFamily" => TokenType::FontFamilies,
        "letterSpacing" => TokenType::LetterSpacing,
        "paragraphSpacing" => TokenType::ParagraphSpacing,
        "paragraphIndent" => TokenType::ParagraphIndent,
        _ => TokenType::Other,
    }
}

fn font_weight(name: &str) -> Option<f64> {
    let normalized: String = name
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_ascii_lowercase();
    let weight = match normalized.as_str() {
        "hairline" | "thin" => 100.0,
        "extralight" | "ultralight" => 200.0,
        "light" => 300.0,
        "regular" | "normal" | "book" => 400.0,
        "medium" => 500.0,
        "semibold" | "demibold" => 600.0,
        "bold" => 700.0,
        "extrabold" | "ultrabold" => 800.0,
        "black" | "heavy" => 900.0,
        "extrablack" | "ultrablack" => 950.0,
        _ => return None,
    };
    Some(weight)
}
