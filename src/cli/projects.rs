use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

use crate::{
    storage::{entities::ProjectId, key_value::KeyValueStore, projects::ProjectRegistry},
    utils::clock::Clock,
};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    #[command(about = "Create a project")]
    Add { name: String },
    #[command(about = "Rename a project")]
    Rename { id: String, name: String },
    #[command(
        about = "Remove a project. Recorded hours stay and are reported as an unknown project"
    )]
    Remove { id: String },
    #[command(about = "List projects")]
    List {},
}

pub fn process_project_command(
    command: ProjectCommand,
    state: &impl KeyValueStore,
    clock: &impl Clock,
) -> Result<()> {
    let mut registry = ProjectRegistry::load(state)?;
    match command {
        ProjectCommand::Add { name } => {
            let project = registry.add(&name, clock.now().with_timezone(&Utc))?;
            println!("Added {} with id {}", project.name, project.id);
        }
        ProjectCommand::Rename { id, name } => {
            registry.rename(&ProjectId::new(id), &name)?;
        }
        ProjectCommand::Remove { id } => {
            let project = registry.remove(&ProjectId::new(id))?;
            println!("Removed {}", project.name);
        }
        ProjectCommand::List {} => {
            let projects = registry.projects();
            if projects.is_empty() {
                println!("No projects yet");
            }
            for project in projects {
                println!("{}\t{}", project.id, project.name);
            }
        }
    }
    Ok(())
}
