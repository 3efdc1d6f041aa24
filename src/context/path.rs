use serde_json::{Map, Value};

/// Reads `path` out of `map`, walking objects by key and arrays by index.
///
/// A key that exists verbatim (dots included) wins over the nested walk.
pub fn get_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(path) {
        return Some(value);
    }

    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = map.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(inner) => inner.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// Any intermediate that is not an object is replaced by an empty one.
pub fn set_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = map;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(inner) => inner,
            _ => unreachable!("slot was just made an object"),
        };
    }
    current.insert(last.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn get_path_walks_objects_and_arrays() {
        let map = object(json!({
            "user": {"name": "ada", "roles": ["admin", "dev"]},
            "plain": 1
        }));

        assert_eq!(get_path(&map, "plain"), Some(&json!(1)));
        assert_eq!(get_path(&map, "user.name"), Some(&json!("ada")));
        assert_eq!(get_path(&map, "user.roles.1"), Some(&json!("dev")));
        assert_eq!(get_path(&map, "user.roles.7"), None);
        assert_eq!(get_path(&map, "user.missing"), None);
        assert_eq!(get_path(&map, "plain.deeper"), None);
    }

    #[test]
    fn get_path_prefers_literal_dotted_keys() {
        let map = object(json!({"a.b": "literal", "a": {"b": "nested"}}));
        assert_eq!(get_path(&map, "a.b"), Some(&json!("literal")));
    }

    #[test]
    fn get_path_treats_empty_path_as_a_plain_key() {
        let map = object(json!({"status": 200}));
        assert_eq!(get_path(&map, ""), None);

        let map = object(json!({"": "blank", "status": 200}));
        assert_eq!(get_path(&map, ""), Some(&json!("blank")));
    }

    #[test]
    fn set_path_creates_and_replaces_intermediates() {
        let mut map = object(json!({"status": 200, "scalar": "x"}));

        set_path(&mut map, "user.profile.name", json!("ada"));
        set_path(&mut map, "scalar.inner", json!(true));
        set_path(&mut map, "status", json!(201));

        assert_eq!(
            Value::Object(map),
            json!({
                "status": 201,
                "scalar": {"inner": true},
                "user": {"profile": {"name": "ada"}}
            })
        );
    }

    #[test]
    fn set_path_keeps_sibling_keys() {
        let mut map = object(json!({"response": {"x": 1}}));
        set_path(&mut map, "response.y", json!(2));
        assert_eq!(Value::Object(map), json!({"response": {"x": 1, "y": 2}}));
    }
}
