//! task-roster command line.

use anyhow::{Result, anyhow};
use clap::Parser;
use serde::Serialize;
use task_roster::cli::task::TaskCommand;
use task_roster::cli::{Cli, Command, RelationArg, RemoveCommand, UserCommand};
use task_roster::config::Config;
use task_roster::db::schema::Table;
use task_roster::error::RosterError;
use task_roster::format::{self, OutputFormat};
use task_roster::logging::{self, LogTarget};
use task_roster::service::RosterService;
use task_roster::types::{FileKind, FileUpload, Owner, Role};
use tracing::{debug, info};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<RosterError>() {
            Some(err) => {
                let body = serde_json::to_string(err).unwrap_or_else(|_| err.to_string());
                eprintln!("error: {}", body);
            }
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load(path)?;
            config.apply_env();
            config
        }
        None => Config::load_or_default(),
    };

    if let Some(db_path) = &cli.database {
        config.storage.db_path = db_path.into();
    }
    if let Some(media_dir) = &cli.media_dir {
        config.storage.media_dir = media_dir.into();
    }
    Ok(config)
}

/// Render `value` as JSON, or as markdown through `markdown`.
fn render<T: Serialize>(
    output: OutputFormat,
    value: &T,
    markdown: impl FnOnce(&T) -> String,
) -> Result<String> {
    match output {
        OutputFormat::Json => Ok(format::to_json(value)?),
        OutputFormat::Markdown => Ok(markdown(value)),
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let output = OutputFormat::from_str(&cli.format)
        .ok_or_else(|| anyhow!("unknown output format '{}', expected json or markdown", cli.format))?;
    let config = load_config(&cli)?;
    debug!(db = ?config.storage.db_path, media = ?config.storage.media_dir, "Configuration loaded");

    let service = RosterService::from_config(&config)?;
    let text = execute(&service, cli.command, output)?;
    println!("{}", text.trim_end());
    Ok(())
}

fn execute(service: &RosterService, command: Command, output: OutputFormat) -> Result<String> {
    match command {
        Command::User(UserCommand::Add { email, name }) => {
            let user = service.create_user(&email, &name)?;
            render(output, &user, |u| format!("Added user `{}` <{}>\n", u.id, u.email))
        }
        Command::User(UserCommand::List) => {
            let users = service.list_users()?;
            render(output, &users, |u| format::format_users_markdown(u))
        }
        Command::Task(command) => execute_task(service, command, output),
        Command::Assign {
            role,
            task_id,
            email,
        } => {
            let role = Role::from(role);
            let member = service.assign(task_id, role, &email)?;
            render(output, &member, |m| {
                format!("Added {} `{}` <{}> to task `{}`\n", role.as_str(), m.id, m.email, task_id)
            })
        }
        Command::Attach {
            kind,
            task_id,
            name,
            url,
        } => {
            let kind = FileKind::from(kind);
            let file = service.attach_file(task_id, kind, &FileUpload::new(name, url))?;
            render(output, &file, |f| {
                format!("Attached {} file `{}` {} to task `{}`\n", kind.as_str(), f.id, f.file_name, task_id)
            })
        }
        Command::Remove(command) => execute_remove(service, command, output),
        Command::List { relation } => match relation {
            RelationArg::Owners => {
                let groups = service.list_owners()?;
                render(output, &groups, |g| {
                    format::format_relation_markdown("Owners", g.as_slice(), |o: &Owner| {
                        format!("- `{}` {}\n", o.id, o.email)
                    })
                })
            }
            RelationArg::Managers => {
                let groups = service.list_members(Role::Manager)?;
                render(output, &groups, |g| format::format_members_markdown("Managers", g))
            }
            RelationArg::Employees => {
                let groups = service.list_members(Role::Employee)?;
                render(output, &groups, |g| format::format_members_markdown("Employees", g))
            }
            RelationArg::PlanningFiles => {
                let groups = service.list_files(FileKind::Planning)?;
                render(output, &groups, |g| format::format_files_markdown("Planning files", g))
            }
            RelationArg::ProjectFiles => {
                let groups = service.list_files(FileKind::Project)?;
                render(output, &groups, |g| format::format_files_markdown("Project files", g))
            }
        },
        Command::Compact { table } => {
            let tables = match table {
                Some(table) => vec![table],
                None => Table::ALL.to_vec(),
            };
            let mut next_ids = Vec::with_capacity(tables.len());
            for table in tables {
                next_ids.push((table, service.database().compact_sequence(table)?));
            }
            info!(tables = next_ids.len(), "Compacted id sequences");
            render(output, &next_ids, |ids| {
                ids.iter()
                    .map(|(table, next)| format!("- {}: next id {}\n", table, next))
                    .collect()
            })
        }
    }
}

fn execute_task(service: &RosterService, command: TaskCommand, output: OutputFormat) -> Result<String> {
    match command {
        TaskCommand::Create { owner, fields } => {
            let (task, owner) = service.create_task(&owner, &fields.to_fields())?;
            let detail = service.get_task(task.id)?;
            render(output, &detail, |d| {
                format!("Created task `{}` owned by {}\n\n{}", task.id, owner.email, format::format_task_markdown(d))
            })
        }
        TaskCommand::Show { task_id } => {
            let detail = service.get_task(task_id)?;
            render(output, &detail, |d| format::format_task_markdown(d))
        }
        TaskCommand::List => {
            let tasks = service.list_tasks()?;
            render(output, &tasks, |t| format::format_tasks_markdown(t))
        }
        TaskCommand::Update(args) => {
            let outcome = service.update_task(args.task_id, &args.to_request())?;
            render(output, &outcome, |o| format::format_update_markdown(o))
        }
        TaskCommand::Delete { task_id } => {
            let report = service.delete_task(task_id)?;
            render(output, &report, |r| {
                format!("Deleted task `{}`\n{}", task_id, format::format_cascade_markdown(r))
            })
        }
    }
}

fn execute_remove(service: &RosterService, command: RemoveCommand, output: OutputFormat) -> Result<String> {
    match command {
        RemoveCommand::Manager {
            task_id,
            manager_id,
        } => {
            let report = service.delete_manager(task_id, manager_id)?;
            render(output, &report, |r| format::format_cascade_markdown(r))
        }
        RemoveCommand::Employee {
            task_id,
            employee_id,
        } => {
            let report = service.delete_employee(task_id, employee_id)?;
            render(output, &report, |r| format::format_cascade_markdown(r))
        }
        RemoveCommand::PlanningFile { file_id } => {
            let name = service.delete_planning_file(file_id)?;
            render(output, &name, |n| format!("Deleted planning file {}\n", n))
        }
        RemoveCommand::ProjectFile { file_id } => {
            let name = service.delete_project_file(file_id)?;
            render(output, &name, |n| format!("Deleted project file {}\n", n))
        }
    }
}
