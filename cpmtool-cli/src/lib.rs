//! Argument parsing and configuration loading for the `cpmtool` binary.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cpmtool_client::{ClientConfig, Mutation};
use std::path::{Path, PathBuf};

/// Config file looked up under the user's config directory.
const DEFAULT_CONFIG_FILE: &str = "cpmtool/config.json";

#[derive(Parser, Debug)]
#[command(name = "cpmtool")]
#[command(about = "Account and game-progress tool for the cpmtool service")]
pub struct Cli {
    /// Access key issued for this tool
    #[arg(short, long, env = "CPMTOOL_ACCESS_KEY", hide_env_values = true)]
    pub key: String,

    /// Path to a JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Don't report failures to the service
    #[arg(long)]
    pub no_telemetry: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Account credentials for commands that log in first.
#[derive(Args, Debug, Clone)]
pub struct Credentials {
    #[arg(long, env = "CPMTOOL_EMAIL")]
    pub email: String,

    #[arg(long, env = "CPMTOOL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print this machine's device name
    DeviceName,
    /// Check whether the key may be used from this device
    CheckDevice,
    /// Show access key details
    KeyData,
    /// Create an account
    Register(Credentials),
    /// Log in and report the status code
    Login(Credentials),
    /// Show the player's data
    PlayerData(Credentials),
    /// Delete the account
    Delete(Credentials),
    #[command(flatten)]
    Mutate(MutationCommand),
}

#[derive(Subcommand, Debug)]
pub enum MutationCommand {
    /// Set the top rank
    SetRank(Credentials),
    /// Unlock tire smoke
    UnlockSmoke(Credentials),
    /// Unlock the W16 engine
    UnlockW16(Credentials),
    /// Set the race loss count
    SetLoses {
        amount: i64,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Set the race win count
    SetWins {
        amount: i64,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Unlock all male clothes
    UnlockClothesMale(Credentials),
    /// Unlock all female clothes
    UnlockClothesFemale(Credentials),
    /// Unlock all houses
    UnlockHouses(Credentials),
    /// Unlock all animations
    UnlockAnimations(Credentials),
    /// Change the player name
    SetName {
        name: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Change the player's local ID
    SetId {
        id: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Set the money balance
    SetMoney {
        amount: i64,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Set the coin balance
    SetCoins {
        amount: i64,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Unlock all horns
    UnlockHorns(Credentials),
    /// Unlock all wheels
    UnlockWheels(Credentials),
    /// Disable engine damage
    DisableDamage(Credentials),
    /// Enable unlimited fuel
    UnlimitedFuel(Credentials),
}

impl MutationCommand {
    /// Splits the command into the mutation and the login to run first.
    pub fn into_parts(self) -> (Mutation, Credentials) {
        match self {
            Self::SetRank(c) => (Mutation::SetRank, c),
            Self::UnlockSmoke(c) => (Mutation::UnlockSmoke, c),
            Self::UnlockW16(c) => (Mutation::UnlockW16, c),
            Self::SetLoses { amount, credentials } => (Mutation::SetRaceLoses(amount), credentials),
            Self::SetWins { amount, credentials } => (Mutation::SetRaceWins(amount), credentials),
            Self::UnlockClothesMale(c) => (Mutation::UnlockClothesMale, c),
            Self::UnlockClothesFemale(c) => (Mutation::UnlockClothesFemale, c),
            Self::UnlockHouses(c) => (Mutation::UnlockHouses, c),
            Self::UnlockAnimations(c) => (Mutation::UnlockAnimations, c),
            Self::SetName { name, credentials } => (Mutation::SetName(name), credentials),
            Self::SetId { id, credentials } => (Mutation::SetId(id), credentials),
            Self::SetMoney { amount, credentials } => (Mutation::SetMoney(amount), credentials),
            Self::SetCoins { amount, credentials } => (Mutation::SetCoins(amount), credentials),
            Self::UnlockHorns(c) => (Mutation::UnlockHorns, c),
            Self::UnlockWheels(c) => (Mutation::UnlockWheels, c),
            Self::DisableDamage(c) => (Mutation::DisableEngineDamage, c),
            Self::UnlimitedFuel(c) => (Mutation::UnlimitedFuel, c),
        }
    }
}

/// Loads the client config: `--config`, then the user config file, then
/// defaults. Command-line overrides are applied last.
pub fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => match dirs::config_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILE)) {
            Some(path) if path.exists() => read_config(&path)?,
            _ => ClientConfig::default(),
        },
    };

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if cli.no_telemetry {
        config.report_errors = false;
    }
    Ok(config)
}

/// Reads a JSON config file; missing fields take their defaults.
pub fn read_config(path: &Path) -> Result<ClientConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid config file {}", path.display()))
}
