//! Portal CLI - command-line front end for the portal session store
//!
//! Signs in and out against the simulated authenticator, inspects the
//! persisted session and edits durable key-value entries.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use portal_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, LoggingConfig,
    PortalConfig, StorageBackendKind,
};
use portal_session::{SessionStore, SimulatedAuthenticator};
use portal_storage::DurableStore;
use serde_json::Value;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Client-side session and durable key-value store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        /// Account email
        email: String,

        /// Password; read from stdin when omitted
        password: Option<String>,
    },

    /// Sign out and remove the persisted session
    Logout,

    /// Show the persisted session
    Whoami {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read and write durable values
    Kv {
        #[command(subcommand)]
        action: KvCommand,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,

        /// Get a configuration value
        #[arg(long)]
        get: Option<String>,

        /// Set a configuration value (key=value format)
        #[arg(long)]
        set: Option<String>,
    },
}

#[derive(Subcommand)]
enum KvCommand {
    /// Print the value stored under a key
    Get {
        key: String,

        /// JSON printed when the key is missing or corrupt
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Store a value; input that is not JSON is stored as a string
    Set { key: String, value: String },

    /// Delete a key
    Remove { key: String },

    /// List keys in the configured namespace
    List,
}

type PortalSessionStore = SessionStore<SimulatedAuthenticator>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    init_logging(&logging_config).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting Portal CLI v{}", env!("CARGO_PKG_VERSION"));

    let config = PortalConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let mut store = open_session_store(&config)?;
            handle_login(&mut store, &email, &password).await?;
        }
        Commands::Logout => {
            let mut store = open_session_store(&config)?;
            handle_logout(&mut store);
        }
        Commands::Whoami { json } => {
            let store = open_session_store(&config)?;
            handle_whoami(&store, json)?;
        }
        Commands::Kv { action } => {
            let storage = DurableStore::from_config(&config.storage)?;
            handle_kv(&storage, action)?;
        }
        Commands::Config {
            show,
            init,
            validate,
            get,
            set,
        } => {
            handle_config(cli.config.as_deref(), &config, show, init, validate, get, set)?;
        }
    }

    Ok(())
}

fn open_session_store(config: &PortalConfig) -> anyhow::Result<PortalSessionStore> {
    config.validate()?;
    if config.storage.backend == StorageBackendKind::Memory {
        debug!("Memory backend selected; the session will not outlive this process");
    }

    let storage = DurableStore::from_config(&config.storage)?;
    let authenticator = SimulatedAuthenticator::from_config(&config.session)?;
    Ok(SessionStore::restore(authenticator, storage, &config.session))
}

fn read_password() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn handle_login(
    store: &mut PortalSessionStore,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    log_operation_start!("login", email = %email);

    let user = store.login(email, password).await.map_err(|e| {
        log_operation_error!("login", e, email = %email);
        e
    })?;

    log_operation_success!("login", email = %user.email, role = %user.role);
    println!("Signed in as {} <{}> ({})", user.name, user.email, user.role);
    Ok(())
}

fn handle_logout(store: &mut PortalSessionStore) {
    let was_signed_in = store.is_authenticated();
    store.logout();

    if was_signed_in {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
}

fn handle_whoami(store: &PortalSessionStore, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        return Ok(());
    }

    match store.session().user() {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            println!("  role: {}", user.role);
            println!("  id:   {}", user.id);
            if let Some(at) = store.session().authenticated_at() {
                println!("  since: {}", at.to_rfc3339());
            }
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

fn handle_kv(storage: &DurableStore, action: KvCommand) -> anyhow::Result<()> {
    match action {
        KvCommand::Get { key, default } => {
            let fallback = match default {
                Some(raw) => serde_json::from_str(&raw)
                    .with_context(|| format!("--default is not valid JSON: {}", raw))?,
                None => Value::Null,
            };
            let value: Value = storage.get(&key, fallback);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        KvCommand::Set { key, value } => {
            let parsed = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            storage
                .try_set(&key, &parsed)
                .with_context(|| format!("Failed to store {}", key))?;
            println!("Stored {}", key);
        }
        KvCommand::Remove { key } => {
            storage
                .try_remove(&key)
                .with_context(|| format!("Failed to remove {}", key))?;
            println!("Removed {}", key);
        }
        KvCommand::List => {
            for key in storage.keys()? {
                println!("{}", key);
            }
        }
    }
    Ok(())
}

fn handle_config(
    explicit_path: Option<&Path>,
    config: &PortalConfig,
    show: bool,
    init: bool,
    validate: bool,
    get: Option<String>,
    set: Option<String>,
) -> anyhow::Result<()> {
    let config_path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => PortalConfig::default_paths()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No configuration directory available"))?,
    };

    if init {
        PortalConfig::default().save_to_file(&config_path)?;
        println!("Configuration initialized at: {}", config_path.display());
    }

    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }

    if validate {
        config.validate()?;
        println!("Configuration is valid");
    }

    if let Some(key_value) = set {
        let (key, value) = key_value
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid format. Use key=value, e.g. --set session.simulated_latency_ms=0"))?;

        let mut updated = if config_path.exists() {
            PortalConfig::from_file(&config_path)?
        } else {
            PortalConfig::default()
        };
        updated.set_value(key, value)?;
        updated.validate()?;
        updated.save_to_file(&config_path)?;
        println!("Set {} = {}", key, value);
    }

    if let Some(key) = get {
        println!("{} = {}", key, config.get_value(&key)?);
    }

    Ok(())
}
