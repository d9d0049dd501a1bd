//! # CLI Interface
//!
//! Defines the command-line argument structure for `mmn-verifier` using
//! `clap` derive. Five subcommands: `setup`, `keygen`, `sign`, `verify`
//! and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use mmn_protocol::config;
use mmn_protocol::zkp::ProofCacheConfig;

use crate::logging::LogFormat;

/// Signer and verifier for MMN transactions.
///
/// Produces keys and Groth16 parameters for local networks, signs
/// transactions, and runs the same acceptance checks a ledger node does.
#[derive(Parser, Debug)]
#[command(
    name = "mmn-verifier",
    about = "Sign and verify MMN transactions",
    version,
    propagate_version = true
)]
pub struct MmnVerifierCli {
    /// Log output format. Logs go to stderr.
    #[arg(long, global = true, env = "MMN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a local Groth16 setup for the identity binding circuit and write
    /// the verifying key.
    Setup(SetupArgs),
    /// Generate an Ed25519 keypair and print its address and seed.
    Keygen,
    /// Sign a transaction read from a JSON file.
    Sign(SignArgs),
    /// Run the acceptance checks on one or more signed transactions.
    Verify(VerifyArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `setup` subcommand.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Where to write the verifying key (base64).
    #[arg(long, env = "MMN_VK_PATH", default_value = "mmn.vk")]
    pub vk_path: PathBuf,

    /// Also write the proving key here. Whoever holds it can prove for any
    /// identity, so only use this on private networks.
    #[arg(long)]
    pub pk_path: Option<PathBuf>,

    /// Seed the setup RNG for reproducible parameters.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the `sign` subcommand.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Unsigned transaction JSON. `-` reads stdin.
    pub tx: PathBuf,

    /// Hex-encoded 32-byte Ed25519 seed.
    #[arg(long, env = "MMN_SIGNER_SEED", conflicts_with = "pkcs8_hex", required_unless_present = "pkcs8_hex")]
    pub seed_hex: Option<String>,

    /// Hex-encoded PKCS#8 DER Ed25519 private key.
    #[arg(long, env = "MMN_SIGNER_PKCS8")]
    pub pkcs8_hex: Option<String>,

    /// Proving key for attaching an identity proof to a `TransferByZk`.
    #[arg(long, requires = "zk_secret_hex")]
    pub pk_path: Option<PathBuf>,

    /// Hex-encoded identity secret the proof is made for.
    #[arg(long, requires = "pk_path")]
    pub zk_secret_hex: Option<String>,
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signed transaction JSON files.
    #[arg(required = true)]
    pub txs: Vec<PathBuf>,

    /// Verifying key for `TransferByZk` proofs. Without it, such
    /// transactions are rejected.
    #[arg(long, env = "MMN_VK_PATH")]
    pub vk_path: Option<PathBuf>,

    #[command(flatten)]
    pub cache: CacheArgs,
}

/// Proof cache tuning.
#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Number of cache shards (a power of two).
    #[arg(long, env = "MMN_CACHE_SHARDS", default_value_t = config::PROOF_CACHE_SHARDS)]
    pub cache_shards: usize,

    /// How long a cached verdict stays valid, in seconds.
    #[arg(long, env = "MMN_CACHE_LIFE_WINDOW_SECS", default_value_t = config::PROOF_CACHE_LIFE_WINDOW.as_secs())]
    pub life_window_secs: u64,

    /// Interval between expired-entry sweeps, in seconds.
    #[arg(long, env = "MMN_CACHE_CLEAN_WINDOW_SECS", default_value_t = config::PROOF_CACHE_CLEAN_WINDOW.as_secs())]
    pub clean_window_secs: u64,

    /// Verdicts the cache holds before it starts evicting.
    #[arg(long, env = "MMN_CACHE_MAX_ENTRIES", default_value_t = config::PROOF_CACHE_MAX_ENTRIES)]
    pub cache_max_entries: usize,
}

impl From<&CacheArgs> for ProofCacheConfig {
    fn from(args: &CacheArgs) -> Self {
        Self {
            shards: args.cache_shards,
            life_window: Duration::from_secs(args.life_window_secs),
            clean_window: Duration::from_secs(args.clean_window_secs),
            max_entries: args.cache_max_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        MmnVerifierCli::command().debug_assert();
    }

    #[test]
    fn cache_flags_default_to_protocol_values() {
        let cli = MmnVerifierCli::try_parse_from(["mmn-verifier", "verify", "tx.json"]).unwrap();
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(ProofCacheConfig::from(&args.cache), ProofCacheConfig::default());
    }

    #[test]
    fn sign_needs_a_key() {
        assert!(MmnVerifierCli::try_parse_from(["mmn-verifier", "sign", "tx.json"]).is_err());
        assert!(MmnVerifierCli::try_parse_from([
            "mmn-verifier",
            "sign",
            "tx.json",
            "--seed-hex",
            "00",
            "--pkcs8-hex",
            "00",
        ])
        .is_err());
    }

    #[test]
    fn log_format_is_global() {
        let cli =
            MmnVerifierCli::try_parse_from(["mmn-verifier", "keygen", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
