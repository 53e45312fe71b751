//!  Persisted state is organized through [key_value::KeyValueStore].
//!  The basic idea is:
//!   - The host supplies a key-value store, by default one JSON file in the application directory.
//!   - Activities live under one entry as a `DateKey -> record` object.
//!   - Records written by older versions are migrated once, when the store is loaded.
//!   - Projects and the employee name live under their own entries.

pub mod activity_store;
pub mod entities;
pub mod key_value;
pub mod projects;
pub mod records;

use anyhow::{bail, Result};
use serde_json::Value;

use key_value::KeyValueStore;

/// Entry holding the name of the employee reports are exported for.
pub const EMPLOYEE_NAME_KEY: &str = "employee-name";

pub fn load_employee_name(store: &impl KeyValueStore) -> Result<Option<String>> {
    Ok(match store.load(EMPLOYEE_NAME_KEY)? {
        Some(Value::String(name)) if !name.trim().is_empty() => Some(name),
        _ => None,
    })
}

pub fn save_employee_name(store: &impl KeyValueStore, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Employee name can't be empty");
    }
    store.persist(EMPLOYEE_NAME_KEY, &Value::String(name.to_owned()))?;
    Ok(name.to_owned())
}

pub fn forget_employee_name(store: &impl KeyValueStore) -> Result<()> {
    store.remove(EMPLOYEE_NAME_KEY)
}
