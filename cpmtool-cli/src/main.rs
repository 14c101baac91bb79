//! `cpmtool`: command-line access to the cpmtool account service.
//!
//! Usage:
//!   cpmtool --key <ACCESS_KEY> check-device
//!   cpmtool --key <ACCESS_KEY> set-money 500000 --email <EMAIL> --password <PASSWORD>
//!
//! Auth tokens are not persisted, so account commands log in first.

use anyhow::{Context, Result, bail};
use clap::Parser;
use cpmtool_cli::{Cli, Command, Credentials, load_config};
use cpmtool_client::{CpmClient, Envelope};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = load_config(&cli)?;
    info!("Using service at {}", config.base_url);
    let client = CpmClient::new(cli.key.as_str(), config).context("Failed to create client")?;

    let outcome = run(&client, cli.command).await;
    client.flush_reports().await;
    outcome
}

async fn run(client: &CpmClient, command: Command) -> Result<()> {
    match command {
        Command::DeviceName => {
            let name = client.device_name().await?;
            println!("{name}");
        }
        Command::CheckDevice => print_envelope(client.check_device().await?)?,
        Command::KeyData => print_envelope(client.get_key_data().await?)?,
        Command::Register(credentials) => {
            let code = client
                .register(&credentials.email, &credentials.password)
                .await?;
            report_code("register", code)?;
        }
        Command::Login(credentials) => login(client, &credentials).await?,
        Command::PlayerData(credentials) => {
            login(client, &credentials).await?;
            print_envelope(client.get_player_data().await?)?;
        }
        Command::Delete(credentials) => {
            login(client, &credentials).await?;
            report_flag("account_delete", client.delete().await?)?;
        }
        Command::Mutate(command) => {
            let (mutation, credentials) = command.into_parts();
            login(client, &credentials).await?;
            let endpoint = mutation.endpoint();
            report_flag(endpoint, client.apply(mutation).await?)?;
        }
    }

    Ok(())
}

async fn login(client: &CpmClient, credentials: &Credentials) -> Result<()> {
    let code = client
        .login(&credentials.email, &credentials.password)
        .await?;
    if !client.is_authenticated().await {
        bail!("login failed with code {code}");
    }
    info!("Logged in as {}", credentials.email);
    Ok(())
}

fn print_envelope(envelope: Envelope) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if !envelope.is_ok() {
        bail!("service reported failure");
    }
    Ok(())
}

fn report_code(operation: &str, code: i64) -> Result<()> {
    println!("{operation}: code {code}");
    if code != 0 {
        bail!("{operation} failed with code {code}");
    }
    Ok(())
}

fn report_flag(operation: &str, ok: bool) -> Result<()> {
    if !ok {
        bail!("{operation}: failed");
    }
    println!("{operation}: ok");
    Ok(())
}
