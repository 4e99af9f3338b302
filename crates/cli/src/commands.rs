//! Command execution

use anyhow::{bail, Context};
use chrono::{Local, Utc};
use taskflux_core::account::{LoginForm, ProfileForm, RegisterForm};
use taskflux_core::session::User;
use taskflux_core::task::{NewTask, Task, TaskId, TaskPatch, TaskQuery};
use taskflux_core::view::{compute_stats, filter_tasks, TaskFilter};
use taskflux_core::{ApiClient, ClientConfig, SessionStore, TaskStore};

use crate::cli::Command;

pub struct App {
    client: ApiClient,
    tasks: TaskStore,
}

impl App {
    pub async fn open(config: &ClientConfig) -> anyhow::Result<Self> {
        let session = SessionStore::open(config.session_path())
            .await
            .with_context(|| format!("Failed to open session at {:?}", config.session_path()))?;
        let client = ApiClient::new(config, session)?;
        let tasks = TaskStore::remote(client.clone());
        Ok(Self { client, tasks })
    }

    pub async fn execute(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Register {
                name,
                email,
                password,
            } => {
                let response = self
                    .client
                    .register(&RegisterForm::new(name, email, password))
                    .await?;
                match (&response.access_token, &response.user) {
                    (Some(_), Some(user)) => println!("Registered and signed in as {}", describe(user)),
                    _ => println!(
                        "{}",
                        response
                            .message
                            .as_deref()
                            .unwrap_or("Registered; sign in to continue")
                    ),
                }
            }
            Command::Login { email, password } => {
                let response = self.client.login(&LoginForm::new(email, password)).await?;
                match response.user {
                    Some(user) if response.access_token.is_some() => {
                        println!("Signed in as {}", describe(&user))
                    }
                    _ => bail!("The service did not return a session"),
                }
            }
            Command::Logout => {
                self.client.logout().await?;
                println!("Signed out");
            }
            Command::Whoami => {
                let session = self.client.session();
                match session.user().await {
                    Some(user) => {
                        println!("{}", describe(&user));
                        match session.token_expiry().await {
                            Some(expiry) if expiry <= Utc::now() => {
                                println!("Token expired at {}", expiry.to_rfc3339())
                            }
                            Some(expiry) => println!("Token expires at {}", expiry.to_rfc3339()),
                            None => println!("Token expiry unknown"),
                        }
                    }
                    None => println!("Not signed in"),
                }
            }
            Command::Profile => match self.client.get_profile().await? {
                Some(user) => println!("{}", describe(&user)),
                None => println!("No profile returned"),
            },
            Command::ProfileUpdate { name, email } => {
                match self
                    .client
                    .update_profile(&ProfileForm::new(name, email))
                    .await?
                {
                    Some(user) => println!("Profile updated: {}", describe(&user)),
                    None => println!("Profile updated"),
                }
            }
            Command::Verify => match self.client.verify_token().await? {
                Some(reply) => println!("{}", reply),
                None => println!("Token accepted"),
            },
            Command::List {
                filter,
                status,
                priority,
            } => {
                let mut query = TaskQuery::new();
                if let Some(status) = status {
                    query = query.with_status(status);
                }
                if let Some(priority) = priority {
                    query = query.with_priority(priority);
                }
                self.tasks.refresh(&query).await?;
                self.print_tasks(filter).await;
            }
            Command::Add {
                title,
                description,
                priority,
                due,
                completed,
            } => {
                self.sync().await?;
                let mut new = NewTask::new(title)
                    .with_description(description)
                    .with_priority(priority)
                    .with_completed(completed);
                if let Some(due) = due {
                    new = new.with_due_date(due);
                }
                let task = self.tasks.create(new).await?;
                println!("Added {}", format_task(&task));
            }
            Command::Edit {
                id,
                title,
                description,
                priority,
                due,
                clear_due,
                completed,
            } => {
                let mut patch = TaskPatch::new();
                if let Some(title) = title {
                    patch = patch.title(title);
                }
                if let Some(description) = description {
                    patch = patch.description(description);
                }
                if let Some(priority) = priority {
                    patch = patch.priority(priority);
                }
                if clear_due {
                    patch = patch.due_date(None);
                } else if let Some(due) = due {
                    patch = patch.due_date(Some(due));
                }
                if let Some(completed) = completed {
                    patch = patch.completed(completed);
                }
                if patch.is_empty() {
                    bail!("Nothing to change");
                }

                self.sync().await?;
                let task = self.tasks.update(&id, patch).await?;
                println!("Updated {}", format_task(&found(task, &id)?));
            }
            Command::Toggle { id } => {
                self.sync().await?;
                let task = found(self.tasks.toggle_complete(&id).await?, &id)?;
                println!("{}", format_task(&task));
            }
            Command::Delete { id } => {
                self.sync().await?;
                let task = found(self.tasks.soft_delete(&id).await?, &id)?;
                println!("Deleted {}", format_task(&task));
            }
            Command::Stats => {
                self.sync().await?;
                let stats = compute_stats(&self.tasks.list().await);
                println!("Total:       {}", stats.total);
                println!("Completed:   {}", stats.completed);
                println!("Open:        {}", stats.open);
                println!("In progress: {}", stats.in_progress);
                println!("Done:        {:.0}%", stats.completion_ratio() * 100.0);
            }
        }
        Ok(())
    }

    async fn sync(&self) -> anyhow::Result<()> {
        self.tasks
            .refresh(&TaskQuery::new())
            .await
            .context("Failed to load tasks")?;
        Ok(())
    }

    async fn print_tasks(&self, filter: TaskFilter) {
        let tasks = filter_tasks(&self.tasks.list().await, filter, Local::now());
        if tasks.is_empty() {
            println!("No tasks match '{}'", filter);
            return;
        }
        for task in &tasks {
            println!("{}", format_task(task));
        }
    }
}

fn found(task: Option<Task>, id: &TaskId) -> anyhow::Result<Task> {
    task.with_context(|| format!("Task {} not found", id))
}

fn describe(user: &User) -> String {
    format!("{} <{}>", user.name, user.email)
}

fn format_task(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!(
        "[{}] {} | {} | {} | due {}",
        mark,
        task.id,
        task.title,
        task.priority,
        task.due_label()
    );
    if task.is_overdue(Local::now().date_naive()) {
        line.push_str(" (overdue)");
    }
    if task.deleted {
        line.push_str(" (deleted)");
    }
    line
}
