//! Coffre CLI - keyring management and item encryption.

mod keyring;

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use coffre_crypto::asymmetric::{private_key_identity, read_public_key};
use coffre_envelope::{EnvelopeConfig, EnvelopeManager, KdfProfile, StoredItem};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use crate::keyring::Keyring;

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "coffre")]
#[command(about = "Coffre - encrypt items under a passphrase-protected key pair")]
#[command(version)]
struct Cli {
    /// Keyring file
    #[arg(long, default_value = "coffre-keyring.json", env = "COFFRE_KEYRING")]
    keyring: PathBuf,

    /// Passphrase (prompted on stdin if not provided)
    #[arg(long, env = "COFFRE_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Argon2id profile for new key pairs (interactive, moderate, sensitive, low-cost)
    #[arg(long, default_value_t = KdfProfile::Interactive, env = "COFFRE_KDF_PROFILE")]
    kdf_profile: KdfProfile,

    /// Log filter, e.g. `info` or `coffre_envelope=debug`
    #[arg(long, default_value = "warn", env = "COFFRE_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a new key pair and write the keyring
    Init {
        /// Identity the key pair is bound to
        #[arg(long)]
        identity: String,
        /// Overwrite an existing keyring
        #[arg(long)]
        force: bool,
    },
    /// Show the keyring identity and fingerprint
    Status,
    /// Encrypt a value and print the stored item as JSON
    Encrypt {
        /// Value to encrypt (read from stdin if not provided, with one
        /// trailing newline removed)
        value: Option<String>,
    },
    /// Decrypt a stored item and print the value
    Decrypt {
        /// Stored item JSON file (read from stdin if not provided)
        file: Option<PathBuf>,
    },
    /// Print the serialized key pair as JSON
    Export,
}

// ============================================================================
// Input
// ============================================================================

/// Returns the passphrase from the command line, or prompts for it.
fn passphrase(given: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(p) = given {
        return Ok(Zeroizing::new(p));
    }

    eprint!("Enter passphrase: ");
    io::stderr().flush()?;
    let mut line = Zeroizing::new(String::new());
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read passphrase")?;

    Ok(Zeroizing::new(trim_newline(&line).to_string()))
}

fn trim_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

fn read_stdin() -> Result<Zeroizing<String>> {
    let mut data = Zeroizing::new(String::new());
    io::stdin()
        .lock()
        .read_to_string(&mut data)
        .context("Failed to read stdin")?;
    Ok(data)
}

async fn open_manager(path: &Path, passphrase: &str) -> Result<EnvelopeManager> {
    let keyring = Keyring::read(path)?;

    EnvelopeManager::new(keyring.identity, passphrase)
        .load(
            &keyring.master_keys.private_key,
            &keyring.master_keys.public_key,
        )
        .await
        .with_context(|| format!("Failed to load key pair from {}", path.display()))
}

// ============================================================================
// Command Handlers
// ============================================================================

async fn cmd_init(
    path: &Path,
    identity: String,
    force: bool,
    profile: KdfProfile,
    passphrase: &str,
) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Keyring {} already exists. Use --force to overwrite",
            path.display()
        );
    }

    println!("Generating key pair for {} ({} profile)...", identity, profile);

    let manager =
        EnvelopeManager::with_config(identity, passphrase, EnvelopeConfig::with_profile(profile))
            .provision()
            .await
            .context("Failed to provision key pair")?;

    Keyring::new(manager.identity(), manager.export_master_keys()).write(path, force)?;

    println!();
    println!("Keyring written to {}", path.display());
    if let Some(fingerprint) = manager.fingerprint() {
        println!("Fingerprint: {}", fingerprint);
    }
    println!();
    println!("IMPORTANT: The passphrase cannot be recovered. Items encrypted under");
    println!("this keyring are lost without it.");

    Ok(())
}

fn cmd_status(path: &Path) -> Result<()> {
    let keyring = Keyring::read(path)?;
    let public_key =
        read_public_key(&keyring.master_keys.public_key).context("Malformed public key")?;
    let private_identity =
        private_key_identity(&keyring.master_keys.private_key).context("Malformed private key")?;

    for found in [private_identity.as_str(), public_key.identity()] {
        if found != keyring.identity {
            bail!(
                "Keyring {} is for {:?} but holds a key bound to {:?}",
                path.display(),
                keyring.identity,
                found
            );
        }
    }

    println!("Coffre keyring status:");
    println!("  Keyring:     {}", path.display());
    println!("  Identity:    {}", keyring.identity);
    println!("  Fingerprint: {}", public_key.fingerprint());

    Ok(())
}

async fn cmd_encrypt(path: &Path, passphrase: &str, value: Option<String>) -> Result<()> {
    let manager = open_manager(path, passphrase).await?;

    let value = match value {
        Some(v) => Zeroizing::new(v),
        None => {
            let data = read_stdin()?;
            Zeroizing::new(trim_newline(&data).to_string())
        },
    };

    let item = manager
        .encrypt(&value)
        .await
        .context("Failed to encrypt value")?;
    println!("{}", serde_json::to_string_pretty(&item.stored())?);

    Ok(())
}

async fn cmd_decrypt(path: &Path, passphrase: &str, file: Option<&Path>) -> Result<()> {
    let manager = open_manager(path, passphrase).await?;

    let data = match file {
        Some(f) => fs::read_to_string(f)
            .map(Zeroizing::new)
            .with_context(|| format!("Failed to read {}", f.display()))?,
        None => read_stdin()?,
    };
    let item: StoredItem = serde_json::from_str(&data).context("Malformed stored item")?;

    let plain = manager
        .decrypt_stored(&item)
        .await
        .context("Failed to decrypt item")?;
    println!("{}", plain.value.as_str());

    Ok(())
}

fn cmd_export(path: &Path) -> Result<()> {
    let keyring = Keyring::read(path)?;
    println!("{}", serde_json::to_string_pretty(&keyring.master_keys)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_new(&cli.log_level)
        .with_context(|| format!("Invalid log filter: {}", cli.log_level))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { identity, force } => {
            let passphrase = passphrase(cli.passphrase)?;
            cmd_init(&cli.keyring, identity, force, cli.kdf_profile, &passphrase).await
        },
        Commands::Status => cmd_status(&cli.keyring),
        Commands::Encrypt { value } => {
            let passphrase = passphrase(cli.passphrase)?;
            cmd_encrypt(&cli.keyring, &passphrase, value).await
        },
        Commands::Decrypt { file } => {
            let passphrase = passphrase(cli.passphrase)?;
            cmd_decrypt(&cli.keyring, &passphrase, file.as_deref()).await
        },
        Commands::Export => cmd_export(&cli.keyring),
    }
}
