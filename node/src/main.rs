// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # MMN Verifier
//!
//! Entry point for the `mmn-verifier` binary. Parses CLI arguments,
//! initializes logging, and dispatches to one of:
//!
//! - `setup`   — local Groth16 setup, writes the verifying key
//! - `keygen`  — fresh Ed25519 keypair
//! - `sign`    — sign a transaction JSON file
//! - `verify`  — acceptance checks over signed transactions
//! - `version` — print build version information

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mmn_protocol::config;
use mmn_protocol::crypto::MmnKeypair;
use mmn_protocol::transaction::{
    sign_transaction, verify_transaction, SignedTransaction, Transaction, TransactionType,
};
use mmn_protocol::zkp::{field_from_bytes, IdentityProver, ProofCacheConfig, ZkVerifier};

use cli::{Commands, MmnVerifierCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MmnVerifierCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    match cli.command {
        Commands::Setup(args) => run_setup(args),
        Commands::Keygen => keygen(),
        Commands::Sign(args) => {
            let signed = sign(&args)?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
            Ok(())
        }
        Commands::Verify(args) => verify(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs a local trusted setup and writes the key files.
fn run_setup(args: cli::SetupArgs) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::info!(vk_path = %args.vk_path.display(), "running groth16 setup");
    let (prover, vk) = IdentityProver::setup(&mut rng)?;
    vk.write_to_file(&args.vk_path)?;

    if let Some(pk_path) = &args.pk_path {
        prover.write_to_file(pk_path)?;
        restrict_permissions(pk_path)?;
        tracing::warn!(pk_path = %pk_path.display(), "proving key written; keep it off shared machines");
    }

    println!("Setup complete.");
    println!("  Verifying key : {}", args.vk_path.display());
    if let Some(pk_path) = &args.pk_path {
        println!("  Proving key   : {}", pk_path.display());
    }
    Ok(())
}

/// Prints a fresh keypair as JSON.
fn keygen() -> Result<()> {
    let keypair = MmnKeypair::generate();
    let out = json!({
        "address": keypair.address(),
        "seed_hex": hex::encode(keypair.seed()),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Signs the transaction in `args.tx`, attaching an identity proof when a
/// proving key is given.
fn sign(args: &cli::SignArgs) -> Result<SignedTransaction> {
    let keypair = load_signer(args)?;
    let mut tx: Transaction = serde_json::from_str(&read_input(&args.tx)?)
        .with_context(|| format!("failed to parse transaction from {}", args.tx.display()))?;

    if let (Some(pk_path), Some(secret_hex)) = (&args.pk_path, &args.zk_secret_hex) {
        if tx.tx_type() != TransactionType::TransferByZk {
            bail!("identity proofs only apply to TransferByZk, got {}", tx.tx_type());
        }
        let prover = IdentityProver::load(pk_path)?;
        let secret = hex::decode(secret_hex.trim()).context("zk secret is not valid hex")?;
        // The verifier binds the proof to the base58 envelope key.
        let proof = prover.prove(
            field_from_bytes(&secret),
            tx.nonce(),
            tx.sender(),
            &keypair.address(),
        )?;
        tx = tx
            .to_builder()
            .zk_proof(&proof.proof_base64(), &proof.witness_base64())
            .build()?;
    }

    let signed = sign_transaction(&tx, keypair.public_key().as_bytes(), &keypair.seed())?;
    tracing::info!(
        tx_type = %tx.tx_type(),
        sender = tx.sender(),
        nonce = tx.nonce(),
        "transaction signed"
    );
    Ok(signed)
}

fn load_signer(args: &cli::SignArgs) -> Result<MmnKeypair> {
    match (&args.seed_hex, &args.pkcs8_hex) {
        (Some(seed_hex), _) => {
            let seed = hex::decode(seed_hex.trim()).context("seed is not valid hex")?;
            Ok(MmnKeypair::from_seed_slice(&seed)?)
        }
        (None, Some(der_hex)) => Ok(MmnKeypair::from_pkcs8_hex(der_hex.trim())?),
        (None, None) => bail!("either --seed-hex or --pkcs8-hex is required"),
    }
}

/// Verifies every file concurrently and prints one JSON verdict per line.
async fn verify(args: cli::VerifyArgs) -> Result<()> {
    let cache_config = ProofCacheConfig::from(&args.cache);
    let zk = match &args.vk_path {
        Some(path) => {
            let verifier = Arc::new(
                ZkVerifier::load(path, cache_config)
                    .with_context(|| format!("failed to load verifying key {}", path.display()))?,
            );
            let janitor = verifier.spawn_janitor(verifier.clean_window());
            Some((verifier, janitor))
        }
        None => {
            tracing::warn!("no verifying key configured; TransferByZk will be rejected");
            None
        }
    };

    let mut tasks = Vec::with_capacity(args.txs.len());
    for path in args.txs {
        let signed: SignedTransaction = serde_json::from_str(&read_input(&path)?)
            .with_context(|| format!("failed to parse signed transaction {}", path.display()))?;
        let verifier = zk.as_ref().map(|(v, _)| Arc::clone(v));
        tasks.push(tokio::task::spawn_blocking(move || {
            let verdict = verify_transaction(&signed.tx, &signed.signature, verifier.as_deref());
            (path, verdict)
        }));
    }

    let mut rejected = 0usize;
    for task in tasks {
        let (path, verdict) = task.await.context("verification task panicked")?;
        let line = match &verdict {
            Ok(()) => json!({ "file": path.display().to_string(), "ok": true }),
            Err(e) => {
                rejected += 1;
                tracing::debug!(file = %path.display(), error = %e, "transaction rejected");
                json!({ "file": path.display().to_string(), "ok": false, "error": e.to_string() })
            }
        };
        println!("{}", line);
    }

    if let Some((verifier, janitor)) = zk {
        let stats = verifier.stats();
        tracing::info!(
            cache_hits = stats.cache_hits,
            cache_misses = stats.cache_misses,
            pairing_checks = stats.pairing_checks,
            "proof verifier stats"
        );
        janitor.abort();
    }

    if rejected > 0 {
        bail!("{} transaction(s) rejected", rejected);
    }
    Ok(())
}

/// Reads a file, or stdin when `path` is `-`.
fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn restrict_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("mmn-verifier {}", env!("CARGO_PKG_VERSION"));
    println!("signatures   {}", config::SIGNING_ALGORITHM);
    println!("proofs       Groth16/{}", config::ZKP_CURVE);
}
