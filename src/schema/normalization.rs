use serde_json::{Map, Value};

use super::definitions::{DATABASES_KEY, LEGACY_DATABASES_KEY, LEGACY_DATABASE_FIELDS};

/// Rewrite a first-generation provisioning document into the current layout
///
/// Older documents list databases under `databases_users` with `db_name`,
/// `db_user` and `db_password` keys. This maps them onto `databases` with
/// `name`, `user` and `password`. Keys already in the current layout win
/// when both spellings are present. Anything that is not an object is
/// returned unchanged so the schema pass can report it.
///
/// A single-database document (`db_name` and friends at the top level) is
/// turned into a one-element database list.
pub fn normalize_legacy_layout(document: Value) -> Value {
    let mut root = match document {
        Value::Object(root) => root,
        other => return other,
    };

    if !root.contains_key(DATABASES_KEY)
        && !root.contains_key(LEGACY_DATABASES_KEY)
        && root.contains_key(LEGACY_DATABASE_FIELDS[0].0)
    {
        tracing::debug!("Rewriting single-database document into '{}'", DATABASES_KEY);
        let mut entry = Map::new();
        for (legacy, _) in LEGACY_DATABASE_FIELDS {
            if let Some(value) = root.remove(legacy) {
                entry.insert(legacy.to_string(), value);
            }
        }
        root.insert(DATABASES_KEY.to_string(), Value::Array(vec![Value::Object(entry)]));
    }

    if !root.contains_key(DATABASES_KEY) {
        if let Some(legacy) = root.remove(LEGACY_DATABASES_KEY) {
            tracing::debug!(
                "Rewriting legacy '{}' list into '{}'",
                LEGACY_DATABASES_KEY,
                DATABASES_KEY
            );
            root.insert(DATABASES_KEY.to_string(), legacy);
        }
    }

    if let Some(Value::Array(entries)) = root.get_mut(DATABASES_KEY) {
        for entry in entries.iter_mut() {
            if let Value::Object(fields) = entry {
                rename_legacy_fields(fields);
            }
        }
    }

    Value::Object(root)
}

fn rename_legacy_fields(fields: &mut Map<String, Value>) {
    for (legacy, current) in LEGACY_DATABASE_FIELDS {
        if let Some(value) = fields.remove(legacy) {
            if !fields.contains_key(current) {
                fields.insert(current.to_string(), value);
            }
        }
    }
}
