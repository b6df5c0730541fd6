use std::{fmt, str::FromStr};

use csscolorparser::Color;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};

use crate::{resolve::Resolver, Error, Node, Result};

/// A fully evaluated token value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Color(Color),
    Number(f64, String),
    Any(String),
    Composite(IndexMap<String, Value>),
    List(Vec<Value>),
}
impl Value {
    pub fn to_css(&self) -> String {
        match self {
            Value::Color(val) => color_css(val),
            Value::Number(val, unit) => format!("{}{unit}", format_number(*val)),
            Value::Any(val) => val.to_string(),
            Value::Composite(fields) => fields.values().map(Value::to_css).join(" "),
            Value::List(items) => items.iter().map(Value::to_css).join(", "),
        }
    }
    /// The value as it appears in nested JSON output. Unitless numbers stay
    /// numbers; everything else scalar is written in its CSS form.
    pub fn to_node(&self) -> Node {
        match self {
            Value::Number(val, unit) if unit.is_empty() => Node::Leaf(number_json(*val)),
            Value::Composite(fields) => Node::Group(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_node()))
                    .collect(),
            ),
            Value::List(items) => Node::List(items.iter().map(Value::to_node).collect()),
            other => Node::Leaf(other.to_css().into()),
        }
    }
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(color) => Some(color.clone()),
            Value::Any(val) => csscolorparser::parse(val).ok(),
            _ => None,
        }
    }
}

/// Computed colors are hex when opaque and `rgba()` otherwise. Literal hex
/// colors never reach this; they keep their source spelling as [`Value::Any`].
fn color_css(color: &Color) -> String {
    if color.a >= 1.0 {
        return color.to_hex_string();
    }
    let [r, g, b, _] = color.to_rgba8();
    format!("rgba({r}, {g}, {b}, {})", format_number(color.a))
}

pub(crate) fn format_number(val: f64) -> String {
    let rounded = (val * 10_000.0).round() / 10_000.0;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        rounded.to_string()
    }
}

fn number_json(val: f64) -> serde_json::Value {
    let rounded = (val * 10_000.0).round() / 10_000.0;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        (rounded as i64).into()
    } else {
        serde_json::Number::from_f64(rounded).map_or(serde_json::Value::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}
impl Op {
    fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Div => '/',
        }
    }
    /// Numbers with compatible units are computed; anything else is left to
    /// the browser as `calc()`.
    fn evaluate(self, a: Value, b: Value) -> Value {
        if let (Value::Number(x, x_unit), Value::Number(y, y_unit)) = (&a, &b) {
            if let Some((n, unit)) = self.apply(*x, x_unit, *y, y_unit) {
                return Value::Number(n, unit);
            }
        }
        Value::Any(format!("calc({} {} {})", a.to_css(), self.symbol(), b.to_css()))
    }
    fn apply(self, x: f64, x_unit: &str, y: f64, y_unit: &str) -> Option<(f64, String)> {
        let unit = match (x_unit, y_unit) {
            ("", "") => "",
            (unit, "") => unit,
            ("", unit) if self != Op::Div => unit,
            (a, b) if a == b => match self {
                Op::Add | Op::Sub => a,
                Op::Div => "",
                Op::Mul => return None,
            },
            _ => return None,
        };
        let n = match self {
            Op::Add => x + y,
            Op::Sub => x - y,
            Op::Mul => x * y,
            Op::Div if y != 0.0 => x / y,
            Op::Div => return None,
        };
        Some((n, unit.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Ref(Vec<String>),
    Binary(Op, Box<Expression>, Box<Expression>),
    Alpha(Box<Expression>, f64),
    Template(Vec<Expression>),
    Value(Value),
}
impl Expression {
    fn template(mut parts: Vec<Expression>) -> Expression {
        match parts.len() {
            0 => Expression::Value(Value::Any(String::new())),
            1 => parts.remove(0),
            _ => Expression::Template(parts),
        }
    }
    pub fn evaluate(&self, resolver: &mut Resolver<'_>) -> Result<Value> {
        match self {
            Expression::Ref(path) => resolver.lookup(path),
            Expression::Binary(op, a, b) => {
                let a = a.evaluate(resolver)?;
                let b = b.evaluate(resolver)?;
                Ok(op.evaluate(a, b))
            }
            Expression::Alpha(base, alpha) => {
                let base = base.evaluate(resolver)?;
                Ok(match base.as_color() {
                    Some(color) => Value::Color(Color::new(color.r, color.g, color.b, alpha.clamp(0.0, 1.0))),
                    None => Value::Any(format!("rgba({}, {})", base.to_css(), format_number(*alpha))),
                })
            }
            Expression::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&part.evaluate(resolver)?.to_css());
                }
                Ok(Value::Any(out))
            }
            Expression::Value(value) => Ok(value.clone()),
        }
    }
}
impl FromStr for Expression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        expr_parser::expr(s).map_err(|err| Error::Expression {
            input: s.to_string(),
            message: err.to_string(),
        })
    }
}

peg::parser! {
  grammar expr_parser() for str {
    rule _ = quiet!{[' ' | '\n' | '\t']*}

    rule reference() -> Vec<String>
        = "{" v:($((!"}" !"{" !"." [_])+) ++ ".") "}" { v.iter().map(|x| x.to_string()).collect() }

    rule number() -> f64
        = n:$("-"? (['0'..='9']+ ("." ['0'..='9']+)? / "." ['0'..='9']+)) {? n.parse().or(Err("number")) }

    rule unit() -> String
        = u:$(['a'..='z' | 'A'..='Z' | '%']+) { u.to_string() }

    rule color() -> Color
        = v:$("#" ['a'..='f' | 'A'..='F' | '0'..='9']*<3,8>) {? csscolorparser::parse(v).or(Err("hex color")) }

    rule atom() -> Expression
        = "(" _ e:arithmetic() _ ")" { e }
        / r:reference() { Expression::Ref(r) }
        / n:number() u:unit()? { Expression::Value(Value::Number(n, u.unwrap_or_default())) }

    rule arithmetic() -> Expression = precedence!{
        x:(@) _ "+" _ y:@ { Expression::Binary(Op::Add, Box::new(x), Box::new(y)) }
        x:(@) _ "-" _ y:@ { Expression::Binary(Op::Sub, Box::new(x), Box::new(y)) }
        --
        x:(@) _ "*" _ y:@ { Expression::Binary(Op::Mul, Box::new(x), Box::new(y)) }
        x:(@) _ "/" _ y:@ { Expression::Binary(Op::Div, Box::new(x), Box::new(y)) }
        --
        a:atom() { a }
    }

    rule alpha_base() -> Expression
        = r:reference() { Expression::Ref(r) }
        / c:color() { Expression::Value(Value::Color(c)) }

    rule alpha() -> Expression
        = "rgba(" _ c:alpha_base() _ "," _ a:number() _ ")" { Expression::Alpha(Box::new(c), a) }

    rule part() -> Expression
        = r:reference() { Expression::Ref(r) }
        / t:$((!reference() [_])+) { Expression::Value(Value::Any(t.to_string())) }

    pub(crate) rule expr() -> Expression
        = _ v:$(color()) _ ![_] { Expression::Value(Value::Any(v.to_string())) }
        / _ a:alpha() _ ![_] { a }
        / _ e:arithmetic() _ ![_] { e }
        / parts:part()* { Expression::template(parts) }
  }
}

#[test]
fn test() {
    let number = |n: f64, unit: &str| Expression::Value(Value::Number(n, unit.to_string()));
    let reference = |path: &[&str]| Expression::Ref(path.iter().map(|x| x.to_string()).collect());

    assert_eq!(
        expr_parser::expr("{hello.world}").unwrap(),
        reference(&["hello", "world"])
    );
    assert_eq!(
        expr_parser::expr("#FF00ff").unwrap(),
        Expression::Value(Value::Any("#FF00ff".to_string()))
    );
    assert_eq!(
        expr_parser::expr("rgba(#fff, 0.25)").unwrap(),
        Expression::Alpha(
            Box::new(Expression::Value(Value::Color(csscolorparser::parse("#fff").unwrap()))),
            0.25
        )
    );
    assert_eq!(expr_parser::expr("90%").unwrap(), number(90.0, "%"));
    assert_eq!(expr_parser::expr("-90%").unwrap(), number(-90.0, "%"));
    assert_eq!(
        expr_parser::expr("ABC Diatype Variable").unwrap(),
        Expression::Value(Value::Any("ABC Diatype Variable".to_string()))
    );
    assert_eq!(
        expr_parser::expr("232.8300018310547").unwrap(),
        number(232.8300018310547, "")
    );

    assert_eq!(
        expr_parser::expr("{x} * {y}").unwrap(),
        Expression::Binary(Op::Mul, Box::new(reference(&["x"])), Box::new(reference(&["y"])))
    );
    assert_eq!(
        expr_parser::expr("{x}/5").unwrap(),
        Expression::Binary(Op::Div, Box::new(reference(&["x"])), Box::new(number(5.0, "")))
    );
    assert_eq!(
        expr_parser::expr("2 + 3 * 4px").unwrap(),
        Expression::Binary(
            Op::Add,
            Box::new(number(2.0, "")),
            Box::new(Expression::Binary(
                Op::Mul,
                Box::new(number(3.0, "")),
                Box::new(number(4.0, "px"))
            ))
        )
    );
    assert_eq!(
        expr_parser::expr("({a} - 2) / 2").unwrap(),
        Expression::Binary(
            Op::Div,
            Box::new(Expression::Binary(
                Op::Sub,
                Box::new(reference(&["a"])),
                Box::new(number(2.0, ""))
            )),
            Box::new(number(2.0, ""))
        )
    );
    assert_eq!(
        expr_parser::expr("rgba({colors.black}, 0.5)").unwrap(),
        Expression::Alpha(Box::new(reference(&["colors", "black"])), 0.5)
    );
    assert_eq!(
        expr_parser::expr("1px solid {colors.border}").unwrap(),
        Expression::Template(vec![
            Expression::Value(Value::Any("1px solid ".to_string())),
            reference(&["colors", "border"]),
        ])
    );
    assert_eq!(
        expr_parser::expr("sans-serif").unwrap(),
        Expression::Value(Value::Any("sans-serif".to_string()))
    );
    assert_eq!(
        expr_parser::expr("").unwrap(),
        Expression::Value(Value::Any(String::new()))
    );
    assert_eq!(
        expr_parser::expr("a { b").unwrap(),
        Expression::Value(Value::Any("a { b".to_string()))
    );
}

#[test]
fn test_number_formatting() {
    assert_eq!(format_number(16.0), "16");
    assert_eq!(format_number(1.5), "1.5");
    assert_eq!(format_number(0.1 + 0.2), "0.3");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(Value::Number(8.0, "px".to_string()).to_css(), "8px");
    assert_eq!(Value::Number(1.25, String::new()).to_node(), Node::Leaf(1.25.into()));
    assert_eq!(Value::Number(4.0, String::new()).to_node(), Node::Leaf(4.into()));
}

#[test]
fn test_color_output() {
    let color = |hex: &str| Value::Color(csscolorparser::parse(hex).unwrap());

    assert_eq!(color("#336699").to_css(), "#336699");
    assert_eq!(color("#fff").to_css(), "#ffffff");
    assert_eq!(color("#ff000080").to_css(), "rgba(255, 0, 0, 0.502)");
    assert_eq!(
        Value::Color(Color::new(0.2, 0.4, 0.6, 0.25)).to_css(),
        "rgba(51, 102, 153, 0.25)"
    );
    assert_eq!(Value::Any("#FFF".to_string()).to_node(), Node::Leaf("#FFF".into()));
}

#[test]
fn test_unit_arithmetic() {
    let px = |n: f64| Value::Number(n, "px".to_string());
    let plain = |n: f64| Value::Number(n, String::new());

    assert_eq!(Op::Mul.evaluate(px(8.0), plain(2.0)), px(16.0));
    assert_eq!(Op::Add.evaluate(px(8.0), px(2.0)), px(10.0));
    assert_eq!(Op::Div.evaluate(px(16.0), px(8.0)), plain(2.0));
    assert_eq!(
        Op::Add.evaluate(px(8.0), Value::Number(1.0, "rem".to_string())),
        Value::Any("calc(8px + 1rem)".to_string())
    );
    assert_eq!(
        Op::Div.evaluate(px(8.0), plain(0.0)),
        Value::Any("calc(8px / 0)".to_string())
    );
}

struct ExpressionVisitor;

impl<'de> Visitor<'de> for ExpressionVisitor {
    type Value = Expression;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a token expression or a number")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        value.parse().map_err(E::custom)
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Value(Value::Number(value, String::new())))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_f64(value as f64)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_f64(value as f64)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Expression, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ExpressionVisitor)
    }
}
