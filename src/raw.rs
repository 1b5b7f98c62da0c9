use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_yaml::{Mapping, Number, Value};

use crate::error::LoadError;

const VERSION_MARKER: &str = "config_version=";

/// Reads the version marker from the first line of a document. A missing or
/// unreadable marker is version 0.
pub fn config_version(text: &str) -> u32 {
    let first = text
        .trim_start_matches('\u{feff}')
        .lines()
        .next()
        .unwrap_or("");
    match first.find(VERSION_MARKER) {
        Some(pos) => first[pos + VERSION_MARKER.len()..]
            .trim()
            .parse()
            .unwrap_or(0),
        None => 0,
    }
}

/// A parsed YAML node. Mappings keep every entry in document order, including
/// repeated keys, so that they can be reported rather than silently merged.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Value),
    Sequence(Vec<Node>),
    Mapping(Vec<(Value, Node)>),
}

impl Node {
    pub fn parse(text: &str) -> Result<Node, LoadError> {
        let blank = text.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#') || line == "---"
        });
        if blank {
            return Ok(Node::Scalar(Value::Null));
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn lowercase_keys(&mut self) {
        match self {
            Node::Scalar(_) => {}
            Node::Sequence(items) => items.iter_mut().for_each(Node::lowercase_keys),
            Node::Mapping(entries) => {
                for (key, value) in entries.iter_mut() {
                    if let Value::String(s) = key {
                        *s = s.to_lowercase();
                    }
                    value.lowercase_keys();
                }
            }
        }
    }

    /// Converts to a plain YAML value. Later duplicates replace earlier ones.
    pub fn into_value(self) -> Value {
        match self {
            Node::Scalar(value) => value,
            Node::Sequence(items) => Value::Sequence(items.into_iter().map(Node::into_value).collect()),
            Node::Mapping(entries) => {
                let mut mapping = Mapping::new();
                for (key, value) in entries {
                    mapping.insert(key, value.into_value());
                }
                Value::Mapping(mapping)
            }
        }
    }

    /// A short description of the node's type for error messages.
    pub fn describe(&self) -> String {
        match self {
            Node::Scalar(Value::Null) => "nothing".to_owned(),
            Node::Scalar(Value::Bool(b)) => format!("boolean {}", b),
            Node::Scalar(Value::Number(n)) => format!("number {}", n),
            Node::Scalar(Value::String(s)) => format!("'{}'", s),
            Node::Scalar(_) => "tagged value".to_owned(),
            Node::Sequence(_) => "a list".to_owned(),
            Node::Mapping(_) => "a mapping".to_owned(),
        }
    }
}

pub fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "~".to_owned(),
        other => format!("{:?}", other),
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a YAML node")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Scalar(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Scalar(Value::Number(Number::from(v))))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Scalar(Value::Number(Number::from(v))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Scalar(Value::Number(Number::from(v))))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::Scalar(Value::String(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::Scalar(Value::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Scalar(Value::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Scalar(Value::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<Value, Node>()? {
            entries.push((key, value));
        }
        Ok(Node::Mapping(entries))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Node, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_marker() {
        assert_eq!(config_version("#config_version=4\nswitches:\n"), 4);
        assert_eq!(config_version("# config_version=5  \n"), 5);
        assert_eq!(config_version("#config_version=four\n"), 0);
        assert_eq!(config_version("switches:\n#config_version=4\n"), 0);
        assert_eq!(config_version(""), 0);
    }

    #[test]
    fn keeps_duplicate_keys_in_order() {
        let node = Node::parse("coils:\n  c_b: {number: 1}\n  c_a: {number: 2}\n  c_b: {number: 3}\n")
            .unwrap();
        let coils = match node {
            Node::Mapping(mut sections) => sections.remove(0).1,
            other => panic!("unexpected node {:?}", other),
        };
        let names: Vec<String> = match coils {
            Node::Mapping(entries) => entries.iter().map(|(k, _)| key_text(k)).collect(),
            other => panic!("unexpected node {:?}", other),
        };
        assert_eq!(names, vec!["c_b", "c_a", "c_b"]);
    }

    #[test]
    fn syntax_errors_carry_a_location() {
        match Node::parse("switches:\n  s_test: [1, 2\n") {
            Err(LoadError::Syntax { line, .. }) => assert!(line >= 2),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn lowercases_keys_but_not_values() {
        let mut node = Node::parse("Switches:\n  S_Test:\n    Type: NC\n").unwrap();
        node.lowercase_keys();
        let value = node.into_value();
        assert_eq!(value["switches"]["s_test"]["type"], Value::String("NC".into()));
    }

    #[test]
    fn empty_document_is_null() {
        assert_eq!(Node::parse("#config_version=4\n").unwrap(), Node::Scalar(Value::Null));
    }
}
