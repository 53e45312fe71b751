use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const DEFAULT_VACATION_HOURS: f64 = 8.;

/// Identifier of a project. Older data stored ids as numbers, so both numbers and strings are
/// accepted and every id is compared as a string from then on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(v) => Ok(ProjectId(v)),
            Value::Number(v) => Ok(ProjectId(v.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "project id should be a string or a number, found {other}"
            ))),
        }
    }
}

/// Shape of one project entry inside a persisted day record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectActivityEntity {
    pub project_id: ProjectId,
    #[serde(with = "hours_ser")]
    pub hours: f64,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Persisted structured day record. `isVacation` is the discriminant and is required, unknown
/// fields are kept untouched so that newer writers don't lose data to older readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecordEntity {
    pub is_vacation: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_hours_ser"
    )]
    pub vacation_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_projects")]
    pub projects: Vec<ProjectActivityEntity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Every shape a day has been persisted in. Plain strings come from the free-text generation of
/// the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRecord {
    Legacy(String),
    Structured(DayRecordEntity),
}

/// Persisted project registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntity {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads the project list of a day entry by entry. A broken entry is dropped on its own and the
/// rest of the day stays.
fn lenient_projects<'de, D>(deserializer: D) -> Result<Vec<ProjectActivityEntity>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values,
        None | Some(Value::Null) => return Ok(vec![]),
        Some(other) => {
            warn!("Projects of a day should be a list, found {other}. Ignoring them");
            return Ok(vec![]);
        }
    };
    Ok(values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<ProjectActivityEntity>(v) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Dropping malformed project entry: {e}");
                None
            }
        })
        .collect())
}

mod hours_ser {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(hours: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(*hours)
    }

    /// Hours typed into a text field were sometimes saved as strings.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hours = match Value::deserialize(deserializer)? {
            Value::Number(v) => v.as_f64(),
            Value::String(v) if v.trim().is_empty() => Some(0.),
            Value::String(v) => v.trim().replace(',', ".").parse::<f64>().ok(),
            Value::Null => Some(0.),
            _ => None,
        };
        hours
            .filter(|v| v.is_finite())
            .ok_or_else(|| serde::de::Error::custom("hours should be a number"))
    }
}

mod optional_hours_ser {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use tracing::warn;

    pub fn serialize<S>(hours: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match hours {
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_none(),
        }
    }

    /// Unreadable vacation hours fall back to the default instead of failing the whole day.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match super::hours_ser::deserialize(value) {
            Ok(hours) => Ok(Some(hours)),
            Err(e) => {
                warn!("Ignoring vacation hours: {e}");
                Ok(None)
            }
        }
    }
}
