use serde::Serialize;
use serde_json::Map;

use super::entities::{
    DayRecordEntity, ProjectActivityEntity, ProjectId, StoredRecord, DEFAULT_VACATION_HOURS,
};

/// Work done on one project during a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectActivity {
    pub project_id: ProjectId,
    pub hours: f64,
    pub description: String,
}

impl ProjectActivity {
    pub fn new(
        project_id: impl Into<ProjectId>,
        hours: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            hours,
            description: description.into(),
        }
    }

    /// Only activities with finite positive hours and a description make it into reports and
    /// storage.
    pub fn is_valid(&self) -> bool {
        self.hours.is_finite() && self.hours > 0. && !self.description.trim().is_empty()
    }
}

/// What was recorded for one day.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayRecord {
    #[default]
    Empty,
    Vacation {
        hours: f64,
    },
    Projects {
        entries: Vec<ProjectActivity>,
    },
    /// Free text written before activities were split by project. Kept for display only.
    LegacyText {
        text: String,
    },
}

impl DayRecord {
    pub fn vacation() -> Self {
        DayRecord::Vacation {
            hours: DEFAULT_VACATION_HOURS,
        }
    }

    pub fn projects(entries: impl IntoIterator<Item = ProjectActivity>) -> Self {
        DayRecord::Projects {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DayRecord::Empty)
    }

    /// Entries that count towards a report. Empty for anything but [DayRecord::Projects].
    pub fn valid_entries(&self) -> impl Iterator<Item = &ProjectActivity> {
        let entries = match self {
            DayRecord::Projects { entries } => entries.as_slice(),
            _ => &[][..],
        };
        entries.iter().filter(|v| v.is_valid())
    }

    /// Adds or replaces the entry of `activity.project_id`, keeping the other projects of the day.
    /// Anything that isn't a project list is replaced.
    pub fn with_project(self, activity: ProjectActivity) -> Self {
        let mut entries = match self {
            DayRecord::Projects { entries } => entries,
            _ => vec![],
        };
        match entries
            .iter_mut()
            .find(|v| v.project_id == activity.project_id)
        {
            Some(existing) => *existing = activity,
            None => entries.push(activity),
        }
        DayRecord::Projects { entries }
    }

    /// Removes the entry of a project. The result may hold no entries at all.
    pub fn without_project(self, project_id: &ProjectId) -> Self {
        match self {
            DayRecord::Projects { mut entries } => {
                entries.retain(|v| &v.project_id != project_id);
                DayRecord::Projects { entries }
            }
            other => other,
        }
    }

    /// Short human readable summary, used when listing days.
    pub fn summary(&self) -> String {
        match self {
            DayRecord::Empty => String::new(),
            DayRecord::Vacation { hours } => format!("Vacation ({hours}h)"),
            DayRecord::Projects { entries } => {
                let hours = entries.iter().map(|v| v.hours).sum::<f64>();
                format!("{} project(s), {hours}h", entries.len())
            }
            DayRecord::LegacyText { text } => text.clone(),
        }
    }
}

impl From<StoredRecord> for DayRecord {
    fn from(value: StoredRecord) -> Self {
        match value {
            StoredRecord::Legacy(text) => DayRecord::LegacyText { text },
            StoredRecord::Structured(entity) if entity.is_vacation => DayRecord::Vacation {
                hours: entity.vacation_hours.unwrap_or(DEFAULT_VACATION_HOURS),
            },
            StoredRecord::Structured(entity) => DayRecord::Projects {
                entries: entity
                    .projects
                    .into_iter()
                    .map(|v| ProjectActivity {
                        project_id: v.project_id,
                        hours: v.hours,
                        description: v.description,
                    })
                    .collect(),
            },
        }
    }
}

impl From<ProjectActivity> for ProjectActivityEntity {
    fn from(value: ProjectActivity) -> Self {
        ProjectActivityEntity {
            project_id: value.project_id,
            hours: value.hours,
            description: value.description,
            extra: Map::new(),
        }
    }
}

impl DayRecordEntity {
    pub fn vacation(hours: f64) -> Self {
        Self {
            is_vacation: true,
            vacation_hours: Some(hours),
            projects: vec![],
            extra: Map::new(),
        }
    }

    pub fn projects(entries: Vec<ProjectActivity>) -> Self {
        Self {
            is_vacation: false,
            vacation_hours: None,
            projects: entries.into_iter().map(Into::into).collect(),
            extra: Map::new(),
        }
    }
}
