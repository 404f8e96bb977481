//! Command line interface.
//!
//! The subcommands map onto the binding lifecycle: `set` creates, `status`
//! reads, `unset` deletes, `import` adopts an existing remote assignment.
//! `list` and `auth` only touch local state.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;

use crate::binding::{self, BindingId};
use crate::certinfo;
use crate::config::Config;
use crate::paths;
use crate::platform::PlatformClient;
use crate::secrets::{TOKEN_ENV, TokenManager};
use crate::storage::{BindingRecord, BindingStore};

#[derive(Parser)]
#[command(name = "certbind")]
#[command(about = "Attach certificate issuers to application CNAMEs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Control-plane base URL (defaults to CERTBIND_TARGET)
    #[arg(long, global = true)]
    pub target: Option<String>,

    /// API token (defaults to CERTBIND_TOKEN, then the OS keyring)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assign an issuer to an application CNAME
    Set {
        /// Application name
        #[arg(long)]
        app: String,

        /// Application CNAME
        #[arg(long)]
        cname: String,

        /// Certificate issuer
        #[arg(long)]
        issuer: String,

        /// Block until a certificate has been issued
        #[arg(long)]
        wait: bool,

        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 3600)]
        timeout_secs: u64,

        /// Seconds between readiness checks while waiting
        #[arg(long, default_value_t = 15)]
        interval_secs: u64,

        /// Print the reconciled state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove an issuer assignment
    Unset {
        /// Binding identifier (app::cname::issuer)
        id: String,
    },

    /// Refresh one binding from the control plane and print it
    Status {
        /// Binding identifier (app::cname::issuer)
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Adopt an existing remote assignment into the local store
    Import {
        /// Binding identifier (app::cname::issuer)
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Show locally tracked bindings
    List {
        #[arg(long)]
        json: bool,
    },

    /// Manage the stored API token for the target
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store the API token (from --token) in the OS keyring
    Login,
    /// Forget the stored token
    Logout,
    /// Show where the token would come from
    Status,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::List { json } => run_list(json),
        Commands::Auth { ref command } => run_auth(command, cli.target.clone(), cli.token.clone()),
        ref command => {
            let config = Config::resolve(cli.target.clone())?;
            let token = TokenManager::new().resolve(cli.token.as_deref(), &config.target_host())?;
            let client = PlatformClient::new(config.target.clone(), token.to_string());
            let store = BindingStore::initialize(&paths::data_dir()?)?;

            match command {
                Commands::Set {
                    app,
                    cname,
                    issuer,
                    wait,
                    timeout_secs,
                    interval_secs,
                    json,
                } => run_set(
                    &client,
                    &store,
                    app,
                    cname,
                    issuer,
                    *wait,
                    Duration::from_secs(*timeout_secs),
                    Duration::from_secs(*interval_secs),
                    *json,
                ),
                Commands::Unset { id } => run_unset(&client, &store, id),
                Commands::Status { id, json } => run_refresh(&client, &store, id, *json, false),
                Commands::Import { id, json } => run_refresh(&client, &store, id, *json, true),
                Commands::List { .. } | Commands::Auth { .. } => unreachable!(),
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

#[allow(clippy::too_many_arguments)]
fn run_set(
    client: &PlatformClient,
    store: &BindingStore,
    app: &str,
    cname: &str,
    issuer: &str,
    wait: bool,
    timeout: Duration,
    interval: Duration,
    json: bool,
) -> Result<()> {
    let id = BindingId::new(app, cname, issuer)?;
    let mut state = binding::set_binding(client, &id)?;
    if wait && !state.ready {
        state = binding::wait_until_ready(client, &id, timeout, interval)?;
    }

    let record = BindingRecord::from_state(&id, &state);
    store.upsert(&record)?;
    print_record(&record, json)
}

fn run_unset(client: &PlatformClient, store: &BindingStore, raw_id: &str) -> Result<()> {
    let id = BindingId::parse(raw_id)?;
    let state = binding::unset_binding(client, &id)?;
    store.delete(&id.compose())?;

    if !state.routers.is_empty() {
        warn!(
            "[cli] routers still report cname {} after unset: {:?}",
            id.cname, state.routers
        );
    }
    println!("unset {id}");
    Ok(())
}

fn run_refresh(
    client: &PlatformClient,
    store: &BindingStore,
    raw_id: &str,
    json: bool,
    import: bool,
) -> Result<()> {
    let id = BindingId::parse(raw_id)?;
    let state = binding::read_binding(client, &id)?;

    let record = BindingRecord::from_state(&id, &state);
    store.upsert(&record)?;
    if import && !json {
        println!("imported {id}");
    }
    print_record(&record, json)
}

fn run_list(json: bool) -> Result<()> {
    let store = BindingStore::initialize(&paths::data_dir()?)?;
    let records = store.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("no tracked bindings");
        return Ok(());
    }
    for record in records {
        let expires = record
            .not_after
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}\tready={}\texpires={}", record.id, record.ready, expires);
    }
    Ok(())
}

fn run_auth(
    command: &AuthCommands,
    target_flag: Option<String>,
    token_flag: Option<String>,
) -> Result<()> {
    let config = Config::resolve(target_flag)?;
    let host = config.target_host();
    let manager = TokenManager::new();

    match command {
        AuthCommands::Login => {
            let token = token_flag.context("pass the token with --token")?;
            manager.login(&host, &token)?;
            println!("stored token for {host}");
        }
        AuthCommands::Logout => {
            manager.logout(&host)?;
            println!("removed token for {host}");
        }
        AuthCommands::Status => {
            let env_set = std::env::var(TOKEN_ENV)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false);
            if env_set {
                println!("token for {host}: from {TOKEN_ENV}");
            } else if manager.has_stored(&host)? {
                println!("token for {host}: stored in OS keyring");
            } else {
                println!("token for {host}: none");
            }
        }
    }
    Ok(())
}

fn print_record(record: &BindingRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("binding: {}", record.id);
    println!("ready:   {}", record.ready);
    let routers = if record.routers.is_empty() {
        "-".to_string()
    } else {
        record.routers.join(", ")
    };
    println!("routers: {routers}");
    for (idx, chain) in record.certificates.iter().enumerate() {
        match certinfo::summarize_leaf(chain) {
            Ok(summary) => println!(
                "certificate[{idx}]: subjects={} serial={} expires={}",
                summary.subjects.join(","),
                summary.serial,
                summary.not_after.to_rfc3339()
            ),
            Err(err) => println!("certificate[{idx}]: unparseable ({err})"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
