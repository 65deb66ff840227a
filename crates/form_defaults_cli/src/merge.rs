use serde_json::Value;

/// Apply a user edit on top of the current form data. Objects merge key by
/// key, everything else is replaced.
pub fn merge_edit(data: &mut Value, edit: &Value) {
    match (data, edit) {
        (Value::Object(this), Value::Object(other)) => {
            for (key, value) in other {
                match this.get_mut(key) {
                    Some(existing) => merge_edit(existing, value),
                    None => {
                        this.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (this, other) => *this = other.clone(),
    }
}
