//! Selector language for rich queries.
//!
//! Queries travel as Mango-style JSON documents:
//!
//! ```text
//! {"selector": {"docType": "ticket",
//!               "dynamicPrice": {"$gte": 1000, "$lte": 5000},
//!               "$or": [{"serviceProvider": "P1"}, {"serviceProvider": "P2"}]}}
//! ```
//!
//! [`Selector`] is the typed form. Callers build it with the fluent methods
//! and render it with [`Selector::to_query_string`]; every value goes
//! through `serde_json`, so caller input can never break out of its string
//! literal. Ledgers parse the string back with [`Selector::parse`].

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Value};

use crate::{LedgerError, Result};

/// A condition applied to one field.
#[derive(Debug, Clone)]
pub enum Condition {
    Eq(Value),
    Gte(Value),
    Lte(Value),
    Regex(Regex),
}

impl Condition {
    fn operator(&self) -> &'static str {
        match self {
            Condition::Eq(_) => "$eq",
            Condition::Gte(_) => "$gte",
            Condition::Lte(_) => "$lte",
            Condition::Regex(_) => "$regex",
        }
    }

    fn operand(&self) -> Value {
        match self {
            Condition::Eq(v) | Condition::Gte(v) | Condition::Lte(v) => v.clone(),
            Condition::Regex(re) => Value::String(re.as_str().to_string()),
        }
    }

    fn matches(&self, found: &Value) -> bool {
        match self {
            Condition::Eq(expected) => values_equal(found, expected),
            Condition::Gte(bound) => {
                matches!(compare(found, bound), Some(Ordering::Greater | Ordering::Equal))
            }
            Condition::Lte(bound) => {
                matches!(compare(found, bound), Some(Ordering::Less | Ordering::Equal))
            }
            Condition::Regex(re) => found.as_str().is_some_and(|s| re.is_match(s)),
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Condition::Eq(a), Condition::Eq(b))
            | (Condition::Gte(a), Condition::Gte(b))
            | (Condition::Lte(a), Condition::Lte(b)) => a == b,
            (Condition::Regex(a), Condition::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Clause {
    Field {
        path: String,
        conditions: Vec<Condition>,
    },
    Or(Vec<Selector>),
    And(Vec<Selector>),
}

/// A conjunction of clauses over document fields.
///
/// An empty selector matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    clauses: Vec<Clause>,
}

impl Selector {
    /// Creates a selector that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `path` to equal `value`.
    pub fn eq(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(path, vec![Condition::Eq(value.into())])
    }

    /// Requires `path` to be greater than or equal to `value`.
    pub fn gte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(path, vec![Condition::Gte(value.into())])
    }

    /// Requires `path` to be less than or equal to `value`.
    pub fn lte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(path, vec![Condition::Lte(value.into())])
    }

    /// Requires `min <= path <= max`.
    pub fn range(
        self,
        path: impl Into<String>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        self.field(
            path,
            vec![Condition::Gte(min.into()), Condition::Lte(max.into())],
        )
    }

    /// Requires the string at `path` to match `pattern`.
    pub fn regex(self, path: impl Into<String>, pattern: &str) -> Result<Self> {
        let re = compile(pattern)?;
        Ok(self.field(path, vec![Condition::Regex(re)]))
    }

    /// Requires the string at `path` to start with the literal `prefix`.
    pub fn starts_with(self, path: impl Into<String>, prefix: &str) -> Result<Self> {
        self.regex(path, &format!("^{}", regex::escape(prefix)))
    }

    /// Requires at least one of `alternatives` to match.
    pub fn any_of(mut self, alternatives: Vec<Selector>) -> Self {
        self.clauses.push(Clause::Or(alternatives));
        self
    }

    /// Requires every one of `parts` to match.
    pub fn all_of(mut self, parts: Vec<Selector>) -> Self {
        self.clauses.push(Clause::And(parts));
        self
    }

    fn field(mut self, path: impl Into<String>, conditions: Vec<Condition>) -> Self {
        self.clauses.push(Clause::Field {
            path: path.into(),
            conditions,
        });
        self
    }

    pub(crate) fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns true if `doc` satisfies every clause.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Field { path, conditions } => match lookup(doc, path) {
                Some(found) => conditions.iter().all(|c| c.matches(found)),
                None => false,
            },
            Clause::Or(alternatives) => alternatives.iter().any(|s| s.matches(doc)),
            Clause::And(parts) => parts.iter().all(|s| s.matches(doc)),
        })
    }

    /// Renders the selector object (without the `{"selector": ...}` wrapper).
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        let mut overflow = Vec::new();

        for clause in &self.clauses {
            let (key, value) = match clause {
                Clause::Field { path, conditions } => (path.clone(), render_conditions(conditions)),
                Clause::Or(alts) => (
                    "$or".to_string(),
                    Value::Array(alts.iter().map(Selector::to_value).collect()),
                ),
                Clause::And(parts) => (
                    "$and".to_string(),
                    Value::Array(parts.iter().map(Selector::to_value).collect()),
                ),
            };
            if map.contains_key(&key) {
                let mut single = Map::new();
                single.insert(key, value);
                overflow.push(Value::Object(single));
            } else {
                map.insert(key, value);
            }
        }

        if !overflow.is_empty() {
            match map.get_mut("$and") {
                Some(Value::Array(existing)) => existing.extend(overflow),
                _ => {
                    map.insert("$and".to_string(), Value::Array(overflow));
                }
            }
        }

        Value::Object(map)
    }

    /// Renders the full query document understood by [`Ledger::rich_query`](crate::Ledger::rich_query).
    pub fn to_query_string(&self) -> String {
        let mut doc = Map::new();
        doc.insert("selector".to_string(), self.to_value());
        Value::Object(doc).to_string()
    }

    /// Parses a query document of the form `{"selector": {...}}`.
    ///
    /// Other top-level keys (index hints, limits) are accepted and ignored.
    pub fn parse(query: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(query)
            .map_err(|e| LedgerError::InvalidQuery(format!("not valid JSON: {e}")))?;
        let selector = doc
            .get("selector")
            .ok_or_else(|| LedgerError::InvalidQuery("missing \"selector\"".to_string()))?;
        Self::from_value(selector)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| LedgerError::InvalidQuery("selector must be an object".to_string()))?;

        let mut selector = Selector::new();
        for (key, value) in obj {
            match key.as_str() {
                "$or" => selector.clauses.push(Clause::Or(parse_list(key, value)?)),
                "$and" => selector.clauses.push(Clause::And(parse_list(key, value)?)),
                op if op.starts_with('$') => {
                    return Err(LedgerError::InvalidQuery(format!(
                        "unsupported combinator {op}"
                    )));
                }
                path => selector.clauses.push(Clause::Field {
                    path: path.to_string(),
                    conditions: parse_conditions(value)?,
                }),
            }
        }
        Ok(selector)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| LedgerError::InvalidQuery(format!("bad $regex: {e}")))
}

fn parse_list(op: &str, value: &Value) -> Result<Vec<Selector>> {
    let items = value
        .as_array()
        .ok_or_else(|| LedgerError::InvalidQuery(format!("{op} expects an array")))?;
    items.iter().map(Selector::from_value).collect()
}

fn parse_conditions(value: &Value) -> Result<Vec<Condition>> {
    let operators = match value.as_object() {
        Some(obj) if !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) => obj,
        _ => return Ok(vec![Condition::Eq(value.clone())]),
    };

    operators
        .iter()
        .map(|(op, operand)| match op.as_str() {
            "$eq" => Ok(Condition::Eq(operand.clone())),
            "$gte" => Ok(Condition::Gte(operand.clone())),
            "$lte" => Ok(Condition::Lte(operand.clone())),
            "$regex" => {
                let pattern = operand.as_str().ok_or_else(|| {
                    LedgerError::InvalidQuery("$regex expects a string".to_string())
                })?;
                Ok(Condition::Regex(compile(pattern)?))
            }
            other => Err(LedgerError::InvalidQuery(format!(
                "unsupported operator {other}"
            ))),
        })
        .collect()
}

fn render_conditions(conditions: &[Condition]) -> Value {
    if let [Condition::Eq(v)] = conditions
        && !v.is_object()
    {
        return v.clone();
    }
    let mut ops = Map::new();
    for condition in conditions {
        ops.insert(condition.operator().to_string(), condition.operand());
    }
    Value::Object(ops)
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
