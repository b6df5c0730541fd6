//! Turns a merged tree into a flat list of evaluated tokens.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    expression::{Expression, Value},
    extensions::{Extensions, Modify},
    transform, Error, Node, Result, TokenGroup, TokenType,
};

/// A token found in the tree, before evaluation.
#[derive(Debug, Clone)]
pub struct Token {
    pub path: Vec<String>,
    pub token_type: TokenType,
    pub value: Node,
    pub description: Option<String>,
    pub extensions: Option<Extensions>,
}
impl Token {
    pub fn name(&self) -> String {
        self.path.join(".")
    }
}

/// A token with its final value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    pub path: Vec<String>,
    pub token_type: TokenType,
    pub value: Value,
    pub description: Option<String>,
}

fn field<'a>(group: &'a TokenGroup, name: &str) -> Option<&'a Node> {
    group.get(name).or_else(|| group.get(&format!("${name}")))
}

fn token_type(node: Option<&Node>) -> Option<TokenType> {
    match node {
        Some(Node::Leaf(value)) => TokenType::deserialize(value).ok(),
        _ => None,
    }
}

/// Collects every token of `tree`, keyed by dotted path, in document order.
///
/// A token is any mapping with a `value` or `$value` key. Tokens without a
/// type take the `$type` of their nearest ancestor group.
pub fn collect_tokens(tree: &TokenGroup) -> Result<IndexMap<String, Token>> {
    let mut tokens = IndexMap::new();
    walk(tree, &mut Vec::new(), None, &mut tokens)?;
    Ok(tokens)
}

fn walk(
    group: &TokenGroup,
    path: &mut Vec<String>,
    inherited: Option<TokenType>,
    tokens: &mut IndexMap<String, Token>,
) -> Result<()> {
    let inherited = token_type(group.get("$type")).or(inherited);
    for (key, node) in group {
        if key.starts_with('$') {
            continue;
        }
        let Node::Group(child) = node else {
            tracing::trace!(key = %key, "skipping loose value outside of a token");
            continue;
        };
        path.push(key.clone());
        match field(child, "value") {
            Some(value) => {
                let extensions = match child.get("$extensions") {
                    Some(node) => Some(parse_extensions(node).map_err(|err| Error::InvalidValue {
                        token: path.join("."),
                        reason: format!("invalid $extensions: {err}"),
                    })?),
                    None => None,
                };
                let token = Token {
                    path: path.clone(),
                    token_type: token_type(field(child, "type"))
                        .or(inherited)
                        .unwrap_or_default(),
                    value: value.clone(),
                    description: field(child, "description")
                        .and_then(Node::as_str)
                        .map(str::to_string),
                    extensions,
                };
                tokens.insert(token.name(), token);
            }
            None => walk(child, path, inherited, tokens)?,
        }
        path.pop();
    }
    Ok(())
}

fn parse_extensions(node: &Node) -> serde_json::Result<Extensions> {
    serde_json::from_value(serde_json::to_value(node)?)
}

/// Evaluates tokens on demand, following references and caching results.
pub struct Resolver<'a> {
    tokens: &'a IndexMap<String, Token>,
    resolved: HashMap<String, Value>,
    stack: Vec<String>,
}
impl<'a> Resolver<'a> {
    pub fn new(tokens: &'a IndexMap<String, Token>) -> Self {
        Self {
            tokens,
            resolved: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// The final value of the token at `name`.
    pub fn resolve(&mut self, name: &str) -> Result<Value> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }
        if let Some(start) = self.stack.iter().position(|visiting| visiting == name) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(name.to_string());
            return Err(Error::CircularReference { chain });
        }
        let tokens = self.tokens;
        let token = tokens.get(name).ok_or_else(|| Error::MissingReference {
            token: self.current(),
            reference: name.to_string(),
        })?;

        self.stack.push(name.to_string());
        let result = self.evaluate_token(token);
        self.stack.pop();

        let value = result?;
        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Resolves a `{a.b.c}` reference. The legacy `{a.b.c.value}` form is
    /// accepted too.
    pub(crate) fn lookup(&mut self, path: &[String]) -> Result<Value> {
        let name = path.join(".");
        if !self.tokens.contains_key(&name) {
            if let Some(stripped) = name.strip_suffix(".value") {
                if self.tokens.contains_key(stripped) {
                    return self.resolve(stripped);
                }
            }
            return Err(Error::MissingReference {
                token: self.current(),
                reference: name,
            });
        }
        self.resolve(&name)
    }

    fn current(&self) -> String {
        self.stack.last().cloned().unwrap_or_default()
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidValue {
            token: self.current(),
            reason: reason.into(),
        }
    }

    fn evaluate_token(&mut self, token: &Token) -> Result<Value> {
        let mut value = self.evaluate(&token.value)?;
        if let Some(modify) = token.extensions.as_ref().and_then(Extensions::modify) {
            value = self.apply_modifier(modify, value)?;
        }
        Ok(transform::apply(token.token_type, value))
    }

    fn evaluate(&mut self, node: &Node) -> Result<Value> {
        match node {
            Node::Leaf(serde_json::Value::String(s)) => s.parse::<Expression>()?.evaluate(self),
            Node::Leaf(serde_json::Value::Number(n)) => {
                Ok(Value::Number(n.as_f64().unwrap_or_default(), String::new()))
            }
            Node::Leaf(serde_json::Value::Bool(b)) => Ok(Value::Any(b.to_string())),
            Node::Leaf(serde_json::Value::Null) => Err(self.invalid("value is null")),
            Node::Leaf(other) => Ok(Value::Any(other.to_string())),
            Node::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<Result<_>>()?,
            )),
            Node::Group(fields) => Ok(Value::Composite(
                fields
                    .iter()
                    .map(|(key, field)| Ok((key.clone(), self.evaluate(field)?)))
                    .collect::<Result<_>>()?,
            )),
        }
    }

    fn apply_modifier(&mut self, modify: &Modify, value: Value) -> Result<Value> {
        let amount = match modify.value.evaluate(self)? {
            Value::Number(n, unit) if unit == "%" => n / 100.0,
            Value::Number(n, _) => n,
            other => {
                return Err(self.invalid(format!(
                    "modifier amount {:?} is not a number",
                    other.to_css()
                )))
            }
        };
        let mix_with = match &modify.color {
            Some(color) => {
                let color = color.evaluate(self)?;
                Some(color.as_color().ok_or_else(|| {
                    self.invalid(format!("cannot mix with {:?}", color.to_css()))
                })?)
            }
            None => None,
        };
        let base = value
            .as_color()
            .ok_or_else(|| self.invalid(format!("cannot modify non-color value {:?}", value.to_css())))?;
        let color = modify
            .apply(&base, amount, mix_with.as_ref())
            .map_err(|reason| self.invalid(reason))?;
        Ok(Value::Color(color))
    }
}

/// Collects and evaluates every token of `tree`, in document order.
pub fn resolve_tree(tree: &TokenGroup) -> Result<Vec<ResolvedToken>> {
    let tokens = collect_tokens(tree)?;
    let mut resolver = Resolver::new(&tokens);
    tokens
        .iter()
        .map(|(name, token)| {
            Ok(ResolvedToken {
                path: token.path.clone(),
                token_type: token.token_type,
                value: resolver.resolve(name)?,
                description: token.description.clone(),
            })
        })
        .collect()
}
