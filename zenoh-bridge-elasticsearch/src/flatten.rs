//! Flattening of nested JSON documents into dotted metric paths.

use serde_json::{Map, Value};

/// Depth-first iterator over the leaves of a JSON object.
///
/// Only objects are descended into; arrays and scalars are leaves. Empty
/// objects produce nothing.
pub struct Flatten<'a> {
    stack: Vec<(String, serde_json::map::Iter<'a>)>,
}

impl<'a> Flatten<'a> {
    fn new(root: &'a Map<String, Value>) -> Self {
        Self {
            stack: vec![(String::new(), root.iter())],
        }
    }
}

impl<'a> Iterator for Flatten<'a> {
    type Item = (String, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, entries) = self.stack.last_mut()?;

            let Some((key, value)) = entries.next() else {
                self.stack.pop();
                continue;
            };

            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            match value {
                Value::Object(children) => self.stack.push((path, children.iter())),
                leaf => return Some((path, leaf)),
            }
        }
    }
}

/// Walk `value`, yielding `(dotted path, leaf)` pairs.
///
/// A non-object root yields nothing.
pub fn flatten(value: &Value) -> Flatten<'_> {
    match value {
        Value::Object(map) => Flatten::new(map),
        _ => Flatten { stack: Vec::new() },
    }
}

/// Like [`flatten`], keeping only numeric leaves.
pub fn flatten_numeric(value: &Value) -> impl Iterator<Item = (String, f64)> + '_ {
    flatten(value).filter_map(|(path, leaf)| leaf.as_f64().map(|v| (path, v)))
}
