use serde_json::Value;

/// Upsert over untyped JSON objects keyed by their `"id"` field.
///
/// For consumers that cache raw payloads instead of typed entities. An update
/// that is not an object, or has no `"id"`, leaves the list unchanged.
pub fn upsert_json(list: &[Value], update: &Value) -> Vec<Value> {
    let mut next = list.to_vec();

    let Some(fields) = update.as_object() else {
        return next;
    };
    let Some(id) = fields.get("id") else {
        return next;
    };

    let existing = next
        .iter_mut()
        .find(|item| item.get("id") == Some(id))
        .and_then(Value::as_object_mut);

    match existing {
        Some(entity) => {
            for (key, value) in fields {
                entity.insert(key.clone(), value.clone());
            }
        }
        None => next.push(update.clone()),
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_shallowly_and_keeps_position() {
        let list = vec![
            json!({"id": 1, "status": "reported", "priority": "high"}),
            json!({"id": 2, "status": "reported"}),
        ];

        let result = upsert_json(&list, &json!({"id": 1, "status": "dispatched"}));

        assert_eq!(
            result,
            vec![
                json!({"id": 1, "status": "dispatched", "priority": "high"}),
                json!({"id": 2, "status": "reported"}),
            ]
        );
    }

    #[test]
    fn nested_objects_are_replaced_not_merged() {
        let list = vec![json!({"id": "a", "location": {"latitude": 1.0, "longitude": 2.0}})];

        let result = upsert_json(&list, &json!({"id": "a", "location": {"latitude": 3.0}}));

        assert_eq!(result[0]["location"], json!({"latitude": 3.0}));
    }

    #[test]
    fn unknown_id_appends() {
        let result = upsert_json(&[json!({"id": 1})], &json!({"id": 2, "eta": 5}));
        assert_eq!(result.len(), 2);
        assert_eq!(result[1], json!({"id": 2, "eta": 5}));
    }

    #[test]
    fn updates_without_id_are_ignored() {
        let list = vec![json!({"id": 1})];
        assert_eq!(upsert_json(&list, &json!({"status": "x"})), list);
        assert_eq!(upsert_json(&list, &json!("not an object")), list);
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        let list = vec![json!({"id": 1, "status": "reported"})];
        let update = json!({"id": 1, "status": "on_scene", "eta": 3});

        let once = upsert_json(&list, &update);
        assert_eq!(upsert_json(&once, &update), once);
    }
}
