//! Read-only view over a raw metrics document
//!
//! Metrics arrive either flat or nested as `raw` / `layer1` / `layer2` /
//! `layer3`. For nested documents a field is looked up in `layer2`, then
//! `layer1`, then `raw`, so later layers override earlier ones.

use serde_json::{Map, Value};

const LOOKUP_ORDER: [&str; 3] = ["layer2", "layer1", "raw"];

pub struct MetricsView<'a> {
    root: Option<&'a Map<String, Value>>,
    nested: bool,
}

impl<'a> MetricsView<'a> {
    pub fn new(metrics: &'a Value) -> Self {
        let root = metrics.as_object();
        let nested = root
            .map(|m| LOOKUP_ORDER.iter().any(|layer| m.get(*layer).is_some_and(Value::is_object)))
            .unwrap_or(false);
        Self { root, nested }
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    fn lookup(&self, field: &str) -> Option<&'a Value> {
        let root = self.root?;
        if self.nested {
            for layer in LOOKUP_ORDER {
                if let Some(value) = root
                    .get(layer)
                    .and_then(Value::as_object)
                    .and_then(|m| m.get(field))
                {
                    if !value.is_null() {
                        return Some(value);
                    }
                }
            }
        }
        root.get(field).filter(|v| !v.is_null())
    }

    /// String field, empty when missing or not a string
    pub fn str(&self, field: &str) -> &'a str {
        self.lookup(field).and_then(Value::as_str).unwrap_or("")
    }

    /// Integer field; floats are truncated and numeric strings parsed
    pub fn i64(&self, field: &str) -> i64 {
        match self.lookup(field) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn f64(&self, field: &str) -> f64 {
        match self.lookup(field) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn bool(&self, field: &str) -> bool {
        match self.lookup(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
            _ => false,
        }
    }

    /// Number of keys of an object field (0 when missing)
    pub fn object_len(&self, field: &str) -> usize {
        self.lookup(field)
            .and_then(Value::as_object)
            .map(Map::len)
            .unwrap_or(0)
    }

    /// The stored `layer3` object, if any
    pub fn layer3(&self) -> Option<&'a Map<String, Value>> {
        self.root?
            .get("layer3")
            .and_then(Value::as_object)
            .filter(|m| !m.is_empty())
    }
}
