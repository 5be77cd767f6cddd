use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskdeck::auth::forms::{LoginForm, REGISTER_FAILED, RegisterForm, login_error_message};
use taskdeck::auth::{
    AuthStateProvider, FirebaseIdentityClient, HttpSessionClient, Identity, Navigator,
};
use taskdeck::backend::BackendClient;
use taskdeck::config::Config;
use taskdeck::init_tracing;
use taskdeck::tasks::{
    SortDirection, SortKey, StatusFilter, TaskFilter, TaskPriority, TaskSort, visible_tasks,
};
use tracing::info;

/// Command-line client for a running taskdeck server
///
/// Login and registration go through the server's session endpoint, but the
/// cookie it returns is not kept: each run signs in again, and task listing
/// talks to the backend directly rather than through the gated dashboard API.
#[derive(Debug, Parser)]
#[command(name = "taskdeck-client", version)]
struct Cli {
    /// Base URL of the taskdeck web app (defaults to the configured port on localhost)
    #[arg(long)]
    app_url: Option<String>,

    /// Log out again before exiting
    #[arg(long)]
    logout: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and show the resolved profile
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Sign in and list tasks
    Tasks {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// `active`, `all`, or a status name
        #[arg(long, default_value = "active")]
        status: String,
        #[arg(long)]
        category: Option<i64>,
        /// Low, Medium or High
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
        /// Sort by creation time instead of due date
        #[arg(long)]
        by_created: bool,
        #[arg(long)]
        desc: bool,
    },
}

/// Navigation has no page to show here; record it
struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "navigate");
    }
}

fn parse_priority(raw: &str) -> anyhow::Result<TaskPriority> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| anyhow::anyhow!("unknown priority: {}", raw))
}

fn print_identity(identity: &Identity) {
    println!("Halo, {}", identity.display_name());
    if identity.is_placeholder() {
        println!("(profil belum tersedia di backend)");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load()?;

    let app_url = cli
        .app_url
        .clone()
        .unwrap_or_else(|| format!("http://127.0.0.1:{}", config.port));

    let identity = Arc::new(FirebaseIdentityClient::new(
        config.identity.toolkit_url.clone(),
        config.identity.api_key.clone(),
    )?);
    let backend = Arc::new(BackendClient::from_config(&config)?);
    let session = Arc::new(HttpSessionClient::new(&app_url, config.backend_timeout())?);

    let provider = Arc::new(AuthStateProvider::new(
        identity,
        backend.clone(),
        session,
        Arc::new(LogNavigator),
    ));
    let tracking = provider.start_tracking();

    let outcome = run(&cli.command, &provider, &backend).await;

    if cli.logout && provider.current().user.is_some() {
        provider.logout().await?;
    }
    tracking.abort();
    outcome
}

async fn run(
    command: &Command,
    provider: &AuthStateProvider,
    backend: &BackendClient,
) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let form = LoginForm {
                email: email.clone(),
                password: password.clone(),
            };
            if let Err(errors) = form.validate() {
                for e in errors {
                    eprintln!("{}: {}", e.field, e.message);
                }
                anyhow::bail!("invalid login form");
            }

            match provider.login(email.trim(), password).await {
                Ok(identity) => print_identity(&identity),
                Err(e) => anyhow::bail!(login_error_message(&e)),
            }
        }
        Command::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            let form = RegisterForm {
                name: name.clone(),
                email: email.clone(),
                password: password.clone(),
                confirm_password: confirm_password.clone(),
            };
            if let Err(errors) = form.validate() {
                for e in errors {
                    eprintln!("{}: {}", e.field, e.message);
                }
                anyhow::bail!("invalid registration form");
            }

            match provider.register(email.trim(), password, Some(name.trim())).await {
                Ok(identity) => print_identity(&identity),
                Err(e) => {
                    tracing::warn!("registration failed: {}", e);
                    anyhow::bail!(REGISTER_FAILED);
                }
            }
        }
        Command::Tasks {
            email,
            password,
            status,
            category,
            priority,
            search,
            by_created,
            desc,
        } => {
            let filter = TaskFilter {
                status: StatusFilter::from_param(status)
                    .ok_or_else(|| anyhow::anyhow!("unknown status: {}", status))?,
                category_id: *category,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                search: search.clone(),
            };
            let sort = TaskSort {
                key: if *by_created {
                    SortKey::CreatedAt
                } else {
                    SortKey::DueDate
                },
                direction: if *desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
            };

            let identity = provider
                .login(email.trim(), password)
                .await
                .map_err(|e| anyhow::anyhow!(login_error_message(&e)))?;

            let tasks = backend.list_tasks(identity.user_id).await?;
            for task in visible_tasks(&tasks, &filter, sort) {
                println!(
                    "#{:<5} [{:?}] {:?} {} {}",
                    task.id,
                    task.status,
                    task.effective_priority(),
                    task.title,
                    task.due_date.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(())
}
