use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{
    entities::{ProjectEntity, ProjectId},
    key_value::KeyValueStore,
};

/// Entry of the key-value store holding the project list.
pub const PROJECTS_KEY: &str = "projects";

/// Project an activity can be booked on.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

impl From<&ProjectEntity> for Project {
    fn from(value: &ProjectEntity) -> Self {
        Project {
            id: value.id.clone(),
            name: value.name.clone(),
        }
    }
}

/// List of known projects, persisted under [PROJECTS_KEY] after every change. At least one project
/// has to remain once any was created.
pub struct ProjectRegistry<S: KeyValueStore> {
    entities: Vec<ProjectEntity>,
    backend: S,
}

impl<S: KeyValueStore> ProjectRegistry<S> {
    pub fn load(backend: S) -> Result<Self> {
        let entities = match backend.load(PROJECTS_KEY)? {
            None => vec![],
            Some(Value::Array(values)) => values
                .into_iter()
                .filter_map(|v| match serde_json::from_value::<ProjectEntity>(v) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("Dropping malformed project: {e}");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                warn!("Projects should be a list, found {other}. Ignoring them");
                vec![]
            }
        };
        debug!("Loaded {} projects", entities.len());
        Ok(Self { entities, backend })
    }

    pub fn projects(&self) -> Vec<Project> {
        self.entities.iter().map(Project::from).collect()
    }

    pub fn resolve(&self, id: &ProjectId) -> Option<Project> {
        self.entities.iter().find(|v| &v.id == id).map(Project::from)
    }

    /// Creates a project. Its id is the creation time in milliseconds.
    pub fn add(&mut self, name: &str, created: DateTime<Utc>) -> Result<Project> {
        let name = validate_name(name)?;

        let mut millis = created.timestamp_millis();
        while self
            .entities
            .iter()
            .any(|v| v.id.as_str() == millis.to_string())
        {
            millis += 1;
        }

        let entity = ProjectEntity {
            id: ProjectId::new(millis.to_string()),
            name,
            created: Some(created),
            extra: Map::new(),
        };
        let project = Project::from(&entity);
        self.entities.push(entity);
        self.persist()?;
        info!("Added project {} {}", project.id, project.name);
        Ok(project)
    }

    pub fn rename(&mut self, id: &ProjectId, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        let entity = self
            .entities
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| anyhow!("There is no project with id {id}"))?;
        entity.name = name;
        self.persist()
    }

    /// Removes a project. Activities booked on it are kept and reported as an unknown project.
    pub fn remove(&mut self, id: &ProjectId) -> Result<Project> {
        let Some(index) = self.entities.iter().position(|v| &v.id == id) else {
            bail!("There is no project with id {id}");
        };
        if self.entities.len() <= 1 {
            bail!("The last project can't be removed. At least one project has to exist");
        }
        let removed = self.entities.remove(index);
        self.persist()?;
        info!("Removed project {} {}", removed.id, removed.name);
        Ok(Project::from(&removed))
    }

    fn persist(&self) -> Result<()> {
        let value = serde_json::to_value(&self.entities)?;
        self.backend.persist(PROJECTS_KEY, &value)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Project name can't be empty");
    }
    Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{ProjectRegistry, PROJECTS_KEY};
    use crate::storage::{
        entities::ProjectId,
        key_value::{KeyValueStore, MemoryStore},
    };

    #[test]
    fn load_normalizes_ids_and_drops_garbage() -> Result<()> {
        let backend = MemoryStore::new().with_entry(
            PROJECTS_KEY,
            json!([
                { "id": 1700000000000u64, "name": "Bridge", "created": "2023-11-14T22:13:20Z" },
                { "id": "42", "name": "Tunnel", "color": "red" },
                { "name": "No id" },
                "not a project",
            ]),
        );
        let registry = ProjectRegistry::load(&backend)?;
        let projects = registry.projects();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, ProjectId::new("1700000000000"));
        assert_eq!(
            registry.resolve(&ProjectId::new("42")).map(|v| v.name),
            Some("Tunnel".to_owned())
        );
        assert!(registry.resolve(&ProjectId::new("7")).is_none());
        Ok(())
    }

    #[test]
    fn add_rename_remove() -> Result<()> {
        let backend = MemoryStore::new();
        let mut registry = ProjectRegistry::load(&backend)?;
        let created = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();

        let bridge = registry.add("  Bridge ", created)?;
        let tunnel = registry.add("Tunnel", created)?;
        assert_eq!(bridge.name, "Bridge");
        assert_ne!(bridge.id, tunnel.id);
        assert_eq!(bridge.id.as_str(), created.timestamp_millis().to_string());

        registry.rename(&tunnel.id, "Road tunnel")?;
        assert!(registry.rename(&tunnel.id, "   ").is_err());
        assert!(registry.add("", created).is_err());

        registry.remove(&bridge.id)?;
        assert!(registry.remove(&tunnel.id).is_err());

        let reloaded = ProjectRegistry::load(&backend)?;
        let projects = reloaded.projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Road tunnel");
        assert!(backend.load(PROJECTS_KEY)?.unwrap()[0]["created"].is_string());
        Ok(())
    }

    #[test]
    fn unknown_fields_are_kept_on_rewrite() -> Result<()> {
        let backend = MemoryStore::new().with_entry(
            PROJECTS_KEY,
            json!([{ "id": "1", "name": "Bridge", "color": "red" }]),
        );
        let mut registry = ProjectRegistry::load(&backend)?;
        registry.rename(&ProjectId::new("1"), "Old bridge")?;
        assert_eq!(backend.load(PROJECTS_KEY)?.unwrap()[0]["color"], json!("red"));
        Ok(())
    }
}
