// ABOUTME: Entry point for the adminctl binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and drives the admin API client.

mod config;

use adminctl_client::{AuthApi, HttpClient, ResourceApi, resources};
use adminctl_core::controller::ResourceRecord;
use adminctl_core::events::{EventBus, EventTopic};
use adminctl_core::session::{SessionHandle, TokenPair};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "adminctl", version, about = "Headless admin console CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the account behind the current token
    Whoami,
    /// Log in and print a token for subsequent invocations
    Login {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        tenant: Option<String>,
    },
    /// List records of a resource
    List {
        resource: String,
        /// Filter parameters as a JSON object, e.g. '{"name": "x"}'
        #[arg(long)]
        params: Option<String>,
    },
    /// Fetch one record by id
    Get { resource: String, id: String },
    /// Create a record from a JSON payload
    Create { resource: String, json: String },
    /// Update a record from a JSON payload (must carry an id)
    Update { resource: String, json: String },
    /// Delete one record by id
    Delete { resource: String, id: String },
}

enum Action {
    List { params: Option<Value> },
    Get { id: String },
    Create { json: Value },
    Update { json: Value },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adminctl=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = CliConfig::from_env()?;

    let bus = EventBus::new();
    spawn_bus_logger(&bus);

    let session = SessionHandle::new(bus.clone());
    if let Some(token) = &config.token {
        // A pre-issued token has no refresh companion and no known expiry.
        session
            .update_tokens(Some(TokenPair {
                access_token: token.clone(),
                refresh_token: String::new(),
                expires_at: None,
            }))
            .await;
    }
    if let Some(tenant) = &config.tenant {
        session.switch_tenant(tenant).await;
    }

    let http = HttpClient::new(config.base_url.clone(), session.clone(), bus.clone());
    let auth = AuthApi::new(http.clone());

    match cli.command {
        Command::Whoami => {
            let account = auth
                .load_account(&session)
                .await
                .context("could not load the account; is ADMINCTL_TOKEN set and valid?")?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
        Command::Login {
            username,
            password,
            tenant,
        } => {
            let account = auth
                .login(&session, &username, &password, tenant.as_deref())
                .await?;
            info!(user = %account.user_id, "login succeeded");
            if let Some(token) = session.access_token().await {
                println!("export ADMINCTL_TOKEN={token}");
            }
        }
        Command::List { resource, params } => {
            let params = params
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .context("--params must be a JSON object")?;
            dispatch(&resource, http, Action::List { params }).await?;
        }
        Command::Get { resource, id } => {
            dispatch(&resource, http, Action::Get { id }).await?;
        }
        Command::Create { resource, json } => {
            let json = serde_json::from_str(&json).context("payload must be valid JSON")?;
            dispatch(&resource, http, Action::Create { json }).await?;
        }
        Command::Update { resource, json } => {
            let json = serde_json::from_str(&json).context("payload must be valid JSON")?;
            dispatch(&resource, http, Action::Update { json }).await?;
        }
        Command::Delete { resource, id } => {
            dispatch(&resource, http, Action::Delete { id }).await?;
        }
    }

    Ok(())
}

async fn dispatch(resource: &str, http: HttpClient, action: Action) -> anyhow::Result<()> {
    match resource {
        "users" => run(resources::users(http), action).await,
        "roles" => run(resources::roles(http), action).await,
        "permissions" => run(resources::permissions(http), action).await,
        "menus" => run(resources::menus(http), action).await,
        "tenants" => run(resources::tenants(http), action).await,
        "topics" => run(resources::topics(http), action).await,
        "taxonomies" => run(resources::taxonomies(http), action).await,
        "media" => run(resources::media(http), action).await,
        other => bail!(
            "unknown resource '{other}' (expected one of: users, roles, permissions, menus, tenants, topics, taxonomies, media)"
        ),
    }
}

async fn run<T>(api: ResourceApi<T>, action: Action) -> anyhow::Result<()>
where
    T: ResourceRecord + DeserializeOwned + 'static,
{
    match action {
        Action::List { params } => {
            let items = api.list(params).await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Action::Get { id } => {
            let item = api.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Action::Create { json } => {
            let created = api.create(&json).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Action::Update { json } => {
            let payload: T = serde_json::from_value(json)?;
            let updated = api.update(&payload).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        Action::Delete { id } => {
            api.delete(&id).await?;
            info!(%id, "deleted");
        }
    }
    Ok(())
}

fn spawn_bus_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event.topic() {
                EventTopic::Login | EventTopic::Logout => info!(?event, "console event"),
                _ => warn!(?event, "console event"),
            }
        }
    });
}
