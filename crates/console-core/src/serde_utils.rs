//! Serde helpers for ordered label lists carried as JSON objects.
//!
//! Labels are kept as `Vec<(String, String)>` so that the order an operator
//! typed them in survives formatting, but on the wire they are a plain map.

use std::fmt;
use serde::{Serializer, Deserializer};
use serde::ser::SerializeMap;
use serde::de::Visitor;

/// Insert or replace `key`, keeping the position of an existing entry.
pub fn upsert_label(labels: &mut Vec<(String, String)>, key: String, value: String) {
    match labels.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => labels.push((key, value)),
    }
}

pub fn serialize_labels<S>(labels: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(labels.len()))?;
    for (k, v) in labels {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

pub fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LabelVisitor;

    impl<'de> Visitor<'de> for LabelVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of label names to values")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut labels = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, String>()? {
                upsert_label(&mut labels, key, value);
            }
            Ok(labels)
        }
    }

    deserializer.deserialize_map(LabelVisitor)
}
