use serde_json::{Map, Value};
use std::fmt;

/// Largest array index a write may create. Names addressing anything beyond it
/// are stored under their literal name instead.
pub const MAX_ARRAY_INDEX: usize = 4096;

/// Lookup path of a form field inside the form data.
///
/// Built from a field's `config.name`. Dots and bracketed indices split the name
/// into segments (`address.lines[0]` -> `address`, `lines`, `0`), but a root key
/// spelled exactly like the whole name always wins over the nested reading.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyPath {
    raw: String,
    segments: Vec<String>,
}

impl KeyPath {
    pub fn parse(name: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        for ch in name.chars() {
            match ch {
                '.' | '[' | ']' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        KeyPath {
            raw: name.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Resolve the path in `data`. Absent values yield `None`.
    pub fn get<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        if let Some(value) = data.as_object().and_then(|map| map.get(&self.raw)) {
            return Some(value);
        }

        let mut cursor = data;
        for segment in &self.segments {
            cursor = match cursor {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(cursor)
    }

    /// Resolve the path, treating absence as JSON null.
    pub fn get_or_null<'a>(&self, data: &'a Value) -> &'a Value {
        static NULL: Value = Value::Null;
        self.get(data).unwrap_or(&NULL)
    }

    /// Write `value` at the location [`get`](Self::get) reads from.
    ///
    /// Missing intermediate containers are created: arrays when the following
    /// segment is an index, objects otherwise. A non-object root is replaced by
    /// an empty object. Paths with an index above [`MAX_ARRAY_INDEX`] are
    /// written flat under the literal name.
    pub fn set(&self, data: &mut Value, value: Value) {
        if !data.is_object() {
            *data = Value::Object(Map::new());
        }

        let root_has_raw = data
            .as_object()
            .is_some_and(|map| map.contains_key(&self.raw));
        if root_has_raw || self.segments.len() <= 1 || !self.indices_in_bounds() {
            if let Value::Object(map) = data {
                map.insert(self.raw.clone(), value);
            }
            return;
        }

        let mut cursor = data;
        let last = self.segments.len() - 1;
        for (i, segment) in self.segments.iter().enumerate() {
            let next_is_index = self
                .segments
                .get(i + 1)
                .is_some_and(|next| array_index(next).is_some());

            if i == last {
                assign(cursor, segment, value);
                return;
            }

            let child = child_mut(cursor, segment);
            if !child.is_object() && !child.is_array() {
                *child = if next_is_index {
                    Value::Array(Vec::new())
                } else {
                    Value::Object(Map::new())
                };
            }
            cursor = child;
        }
    }

    fn indices_in_bounds(&self) -> bool {
        self.segments
            .iter()
            .filter_map(|segment| segment.parse::<usize>().ok())
            .all(|index| index <= MAX_ARRAY_INDEX)
    }
}

fn array_index(segment: &str) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|index| *index <= MAX_ARRAY_INDEX)
}

/// Borrow (creating as null) the child `segment` of a container.
///
/// Containers that cannot hold `segment` (scalars, or arrays addressed by a
/// non-index key) are replaced by an empty object first.
fn child_mut<'a>(container: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = array_index(segment);
    let keeps_shape = match container {
        Value::Array(_) => index.is_some(),
        Value::Object(_) => true,
        _ => false,
    };
    if !keeps_shape {
        *container = Value::Object(Map::new());
    }

    match (container, index) {
        (Value::Array(items), Some(index)) => {
            if items.len() <= index {
                items.resize(index.saturating_add(1), Value::Null);
            }
            &mut items[index]
        }
        (Value::Object(map), _) => map.entry(segment.to_string()).or_insert(Value::Null),
        _ => unreachable!("container was normalised above"),
    }
}

fn assign(container: &mut Value, segment: &str, value: Value) {
    *child_mut(container, segment) = value;
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for KeyPath {
    fn from(name: &str) -> Self {
        KeyPath::parse(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_dots_and_indices() {
        let path = KeyPath::parse("address.lines[1].text");
        assert_eq!(path.segments(), &["address", "lines", "1", "text"]);
        assert_eq!(path.to_string(), "address.lines[1].text");
    }

    #[test]
    fn get_prefers_literal_root_key() {
        let data = json!({ "a.b": "flat", "a": { "b": "nested" } });
        assert_eq!(KeyPath::parse("a.b").get(&data), Some(&json!("flat")));

        let data = json!({ "a": { "b": "nested" } });
        assert_eq!(KeyPath::parse("a.b").get(&data), Some(&json!("nested")));
    }

    #[test]
    fn get_walks_arrays_and_reports_absence() {
        let data = json!({ "rows": [{ "x": 1 }, { "x": 2 }] });
        assert_eq!(KeyPath::parse("rows[1].x").get(&data), Some(&json!(2)));
        assert_eq!(KeyPath::parse("rows[5].x").get(&data), None);
        assert_eq!(KeyPath::parse("missing").get_or_null(&data), &Value::Null);
    }

    #[test]
    fn set_creates_nested_containers() {
        let mut data = json!({});
        KeyPath::parse("a.b").set(&mut data, json!(1));
        KeyPath::parse("list[1]").set(&mut data, json!("y"));
        assert_eq!(data, json!({ "a": { "b": 1 }, "list": [null, "y"] }));
    }

    #[test]
    fn set_overwrites_literal_root_key() {
        let mut data = json!({ "a.b": "old" });
        KeyPath::parse("a.b").set(&mut data, json!("new"));
        assert_eq!(data, json!({ "a.b": "new" }));
    }

    #[test]
    fn out_of_range_indices_are_written_flat() {
        let mut data = json!({ "rows": ["a"] });
        let huge = KeyPath::parse("rows[18446744073709551615]");
        huge.set(&mut data, json!("x"));
        let large = KeyPath::parse("rows[4000000000].name");
        large.set(&mut data, json!("y"));

        assert_eq!(
            data,
            json!({
                "rows": ["a"],
                "rows[18446744073709551615]": "x",
                "rows[4000000000].name": "y"
            })
        );
        assert_eq!(huge.get(&data), Some(&json!("x")));
        assert_eq!(large.get(&data), Some(&json!("y")));
    }

    #[test]
    fn indices_up_to_the_limit_pad_arrays() {
        let mut data = json!({});
        KeyPath::parse("rows[3]").set(&mut data, json!(1));
        assert_eq!(data, json!({ "rows": [null, null, null, 1] }));
    }

    #[test]
    fn set_replaces_non_object_root() {
        let mut data = Value::Null;
        KeyPath::parse("f1").set(&mut data, json!("hello"));
        assert_eq!(data, json!({ "f1": "hello" }));
    }
}
