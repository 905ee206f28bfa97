use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, eyre};
use tracing::info;

use dsl_server::{
    config::Config,
    crypto::jws,
    dsl::{
        CredentialId, CredentialStatus, HolderProof, HolderProofBuilder, PublicationEnvelope,
        Verifier, unix_now,
    },
    issuer::{CredentialBundle, EntryOptions, PublicationScheduler},
    setup::setup,
    storage::json::{load_json, save_json},
    telemetry,
};

/// Issue credentials and publish their status as a dynamic status list.
#[derive(Parser, Debug)]
#[command(name = "dsl", version, about, long_about = None)]
struct Cli {
    /// Directory holding the key, registry and publication
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a mock credential
    Issue {
        #[arg(short, long, default_value = "mock-jwt.json")]
        out: PathBuf,

        #[arg(long, default_value = "Alice")]
        subject: String,
    },

    /// Create a status list entry for a credential and republish
    New {
        /// Credential bundle; updated in place with the status metadata
        #[arg(short, long)]
        r#in: PathBuf,

        /// Also create a detached status token
        #[arg(short, long)]
        detached: bool,
    },

    /// Derive the holder's status list identifier
    Wallet {
        #[arg(short, long)]
        r#in: PathBuf,

        /// Encode the identifier for the revoked hypothesis
        #[arg(short, long)]
        revoked: bool,

        /// Unix time to compute the identifier at (default: now)
        #[arg(short, long)]
        timestamp: Option<u64>,

        #[arg(short, long, default_value = "holder_status-list-identifier.json")]
        out: PathBuf,
    },

    /// Recompute and sign the status list
    Recompute {
        /// Unix time to publish at (default: now)
        #[arg(short, long)]
        timestamp: Option<u64>,
    },

    /// Revoke a credential and republish
    Revoke {
        #[arg(short, long)]
        jti: String,
    },

    /// Verify a holder proof against a publication
    Verify {
        /// Publication envelope (default: the configured publication file)
        #[arg(short, long)]
        status_list: Option<PathBuf>,

        #[arg(short = 'p', long, default_value = "holder_status-list-identifier.json")]
        holder_proof: PathBuf,

        /// Expected issuer key thumbprint (hex)
        #[arg(long)]
        issuer: Option<String>,
    },

    /// Pretty-print a JSON file
    Print {
        #[arg(short, long)]
        r#in: PathBuf,
    },

    /// Decode and print a JWT
    #[command(alias = "printjwt")]
    PrintJwt {
        /// Raw compact JWT or a JSON file with a "jwt" field
        #[arg(short, long)]
        r#in: PathBuf,
    },

    /// Republish every period until interrupted
    Serve,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    match cli.command {
        Commands::Issue { out, subject } => cmd_issue(&config, &out, &subject).await,
        Commands::New { r#in, detached } => cmd_new(&config, &r#in, detached).await,
        Commands::Wallet {
            r#in,
            revoked,
            timestamp,
            out,
        } => cmd_wallet(&config, &r#in, revoked, timestamp, &out).await,
        Commands::Recompute { timestamp } => cmd_recompute(&config, timestamp).await,
        Commands::Revoke { jti } => cmd_revoke(&config, jti).await,
        Commands::Verify {
            status_list,
            holder_proof,
            issuer,
        } => {
            let status_list = status_list.unwrap_or_else(|| config.storage.publication_path());
            cmd_verify(&status_list, &holder_proof, issuer.as_deref()).await
        }
        Commands::Print { r#in } => cmd_print(&r#in).await,
        Commands::PrintJwt { r#in } => cmd_print_jwt(&r#in).await,
        Commands::Serve => cmd_serve(&config).await,
    }
}

async fn cmd_issue(config: &Config, out: &Path, subject: &str) -> color_eyre::Result<()> {
    let issuer = setup(config).await?;
    let (jti, bundle) = issuer.issue_credential(subject)?;
    save_json(out, &bundle).await?;
    println!("> Mock credential {jti} issued and stored to {}", out.display());
    Ok(())
}

async fn cmd_new(config: &Config, path: &Path, detached: bool) -> color_eyre::Result<()> {
    let issuer = setup(config).await?;
    let bundle: CredentialBundle = load_json(path).await?;

    let options = if detached {
        EntryOptions::detached(issuer.distribution_point())
    } else {
        EntryOptions::inline()
    };
    let (jti, updated) = issuer.create_entry(&bundle, &options, unix_now()).await?;
    save_json(path, &updated).await?;

    println!(
        "> Status list entry created for {jti}. Publication stored in {}",
        config.storage.publication_path().display()
    );
    Ok(())
}

async fn cmd_wallet(
    config: &Config,
    path: &Path,
    revoked: bool,
    timestamp: Option<u64>,
    out: &Path,
) -> color_eyre::Result<()> {
    let bundle: CredentialBundle = load_json(path).await?;
    let hypothesis = CredentialStatus::from_valid_bit(!revoked);
    let at = timestamp.unwrap_or_else(unix_now);

    let proof = HolderProofBuilder::new(config.dsl.period()?).build_from_jws(
        bundle.private_metadata(),
        at,
        hypothesis,
    )?;
    save_json(out, &proof).await?;

    println!("> Status list identifier:");
    println!("{}", proof.sid);
    Ok(())
}

async fn cmd_recompute(config: &Config, timestamp: Option<u64>) -> color_eyre::Result<()> {
    let issuer = setup(config).await?;
    let publication = issuer.publish(timestamp.unwrap_or_else(unix_now)).await?;
    println!(
        "> Status list recomputed with {} identifiers, stored in {}",
        publication.claims().sid.len(),
        config.storage.publication_path().display()
    );
    Ok(())
}

async fn cmd_revoke(config: &Config, jti: String) -> color_eyre::Result<()> {
    let issuer = setup(config).await?;
    issuer.revoke(&CredentialId::from(jti.clone()), unix_now()).await?;
    println!("> Credential {jti} revoked");
    Ok(())
}

async fn cmd_verify(
    status_list: &Path,
    holder_proof: &Path,
    pinned_issuer: Option<&str>,
) -> color_eyre::Result<()> {
    let envelope: PublicationEnvelope = load_json(status_list).await?;
    let publication = envelope.into_publication()?;
    publication
        .verify_signature(pinned_issuer)
        .wrap_err("Status list signature check failed")?;

    let proof: HolderProof = load_json(holder_proof).await?;
    let status = Verifier::new(&publication).verify(&proof)?;
    info!("Verified {} against issuer {}", proof.jti, publication.claims().iss);

    println!(
        "> Proof verified. Revoked: {}",
        status == CredentialStatus::Revoked
    );
    Ok(())
}

async fn cmd_print(path: &Path) -> color_eyre::Result<()> {
    let value: serde_json::Value = load_json(path).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn cmd_print_jwt(path: &Path) -> color_eyre::Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;

    let compact = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => value
            .get("jwt")
            .or_else(|| value.get("dsl_jwt"))
            .and_then(|jwt| jwt.as_str())
            .map(str::to_string)
            .ok_or_else(|| eyre!("No \"jwt\" field in {}", path.display()))?,
        Err(_) => raw.trim().to_string(),
    };

    let (header, payload, signature) = jws::decode_segments(&compact)?;
    println!("Header:\n{}", serde_json::to_string_pretty(&header)?);
    println!("Payload:\n{}", serde_json::to_string_pretty(&payload)?);
    println!("Signature:\n{signature}");
    Ok(())
}

async fn cmd_serve(config: &Config) -> color_eyre::Result<()> {
    let issuer = setup(config).await?;
    let handle = PublicationScheduler::new(issuer, config.scheduler_config()?).start();

    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for shutdown signal")?;
    handle.stop().await;
    Ok(())
}
