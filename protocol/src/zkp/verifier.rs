//! # Groth16 Proof Verification
//!
//! [`ZkVerifier`] is the gateway every `TransferByZk` transaction goes
//! through. It owns the prepared verifying key, the verdict cache and a few
//! counters, and is meant to be built once at startup and shared as
//! `Arc<ZkVerifier>`.
//!
//! A call to [`ZkVerifier::verify_proof`] is answered from the cache when
//! possible. Otherwise the proof and witness are decoded, the witness is
//! checked to carry exactly the claimed sender and public key, and only
//! then does the pairing check run. Every outcome is cached, negative ones
//! included.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;
use ark_snark::SNARK;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::cache::{CacheKey, ProofCache, ProofCacheConfig};
use super::field_from_bytes;
use super::witness::decode_public_witness;
use crate::config::{ZK_PUBLIC_INPUT_COUNT, ZK_PUBLIC_KEY_INDEX, ZK_SENDER_INDEX};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Initialization failures. All of them are fatal: a node that cannot load
/// its verifying key must not accept proof-gated transactions.
#[derive(Debug, Error)]
pub enum ZkSetupError {
    #[error("failed to read verifying key {path}: {source}")]
    VerifyingKeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("verifying key is not valid base64: {0}")]
    VerifyingKeyDecode(#[from] base64::DecodeError),

    #[error("failed to deserialize verifying key: {0}")]
    VerifyingKeyDeserialize(String),

    #[error("verifying key expects {got} public inputs, circuit has {expected}")]
    VerifyingKeyShape { expected: usize, got: usize },

    #[error("invalid proof cache config: {0}")]
    InvalidCacheConfig(String),
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Point-in-time copy of the verifier's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifierStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Groth16 pairing checks actually executed.
    pub pairing_checks: u64,
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    pairing_checks: AtomicU64,
}

// ---------------------------------------------------------------------------
// ZkVerifier
// ---------------------------------------------------------------------------

pub struct ZkVerifier {
    pvk: PreparedVerifyingKey<Bn254>,
    cache: ProofCache,
    clean_window: Duration,
    counters: Counters,
}

impl ZkVerifier {
    /// Load a verifying key file (base64 of the compressed key) and prepare
    /// it. Surrounding whitespace in the file is ignored.
    pub fn load(path: impl AsRef<Path>, config: ProofCacheConfig) -> Result<Self, ZkSetupError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ZkSetupError::VerifyingKeyRead {
                path: path.to_path_buf(),
                source,
            })?;
        let bytes = BASE64.decode(contents.trim())?;
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(&bytes[..])
            .map_err(|e| ZkSetupError::VerifyingKeyDeserialize(e.to_string()))?;

        let verifier = Self::from_verifying_key(vk, config)?;
        info!(path = %path.display(), "loaded zk verifying key");
        Ok(verifier)
    }

    /// Build from an in-memory key. The key must be for a circuit with
    /// exactly [`ZK_PUBLIC_INPUT_COUNT`] public inputs.
    pub fn from_verifying_key(
        vk: VerifyingKey<Bn254>,
        config: ProofCacheConfig,
    ) -> Result<Self, ZkSetupError> {
        let got = vk.gamma_abc_g1.len().saturating_sub(1);
        if got != ZK_PUBLIC_INPUT_COUNT {
            return Err(ZkSetupError::VerifyingKeyShape {
                expected: ZK_PUBLIC_INPUT_COUNT,
                got,
            });
        }
        let cache = ProofCache::new(&config)?;
        Ok(Self {
            pvk: prepare_verifying_key(&vk),
            cache,
            clean_window: config.clean_window,
            counters: Counters::default(),
        })
    }

    /// Whether `proof_b64` is a valid proof for `witness_b64`, and the
    /// witness binds exactly `sender` and `public_key`.
    ///
    /// Total: malformed input of any kind is `false`. Repeating a call with
    /// the same four arguments within the cache life window returns the
    /// same answer without another pairing check.
    pub fn verify_proof(
        &self,
        sender: &str,
        public_key: &str,
        proof_b64: &str,
        witness_b64: &str,
    ) -> bool {
        let key = CacheKey::new(sender, public_key, proof_b64, witness_b64);
        if let Some(verdict) = self.cache.get(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return verdict;
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        let verdict = self.verify_uncached(sender, public_key, proof_b64, witness_b64);
        self.cache.insert(key, verdict);
        verdict
    }

    fn verify_uncached(
        &self,
        sender: &str,
        public_key: &str,
        proof_b64: &str,
        witness_b64: &str,
    ) -> bool {
        let Some(proof) = decode_proof(proof_b64) else {
            debug!(sender, "zk proof rejected: undecodable proof");
            return false;
        };

        let public = match BASE64
            .decode(witness_b64)
            .ok()
            .map(|bytes| decode_public_witness(&bytes))
        {
            Some(Ok(public)) => public,
            Some(Err(e)) => {
                debug!(sender, error = %e, "zk proof rejected: malformed witness");
                return false;
            }
            None => {
                debug!(sender, "zk proof rejected: witness is not base64");
                return false;
            }
        };

        if public.len() != ZK_PUBLIC_INPUT_COUNT {
            debug!(sender, arity = public.len(), "zk proof rejected: wrong witness arity");
            return false;
        }
        if !binds_identity(&public, sender, public_key) {
            debug!(sender, "zk proof rejected: witness bound to another identity");
            return false;
        }

        self.counters.pairing_checks.fetch_add(1, Ordering::Relaxed);
        match Groth16::<Bn254>::verify_with_processed_vk(&self.pvk, &public, &proof) {
            Ok(true) => true,
            Ok(false) => {
                debug!(sender, "zk proof rejected: pairing check failed");
                false
            }
            Err(e) => {
                debug!(sender, error = %e, "zk proof rejected: verification error");
                false
            }
        }
    }

    pub fn stats(&self) -> VerifierStats {
        VerifierStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            pairing_checks: self.counters.pairing_checks.load(Ordering::Relaxed),
        }
    }

    pub fn cache(&self) -> &ProofCache {
        &self.cache
    }

    /// Sweep period configured at construction.
    pub fn clean_window(&self) -> Duration {
        self.clean_window
    }

    /// Spawn a task that purges expired verdicts every `period`. The task
    /// ends on its own once the last `Arc` to the verifier is dropped.
    pub fn spawn_janitor(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(verifier) = weak.upgrade() else {
                    break;
                };
                let purged = verifier.cache.purge_expired();
                debug!(purged, remaining = verifier.cache.len(), "proof cache sweep");
            }
        })
    }
}

fn decode_proof(proof_b64: &str) -> Option<Proof<Bn254>> {
    let bytes = BASE64.decode(proof_b64).ok()?;
    let mut reader = &bytes[..];
    let proof = Proof::<Bn254>::deserialize_compressed(&mut reader).ok()?;
    reader.is_empty().then_some(proof)
}

/// Slot 3 must be the sender and slot 2 the public key, both as field
/// elements of their UTF-8 bytes.
fn binds_identity(public: &[Fr], sender: &str, public_key: &str) -> bool {
    public[ZK_SENDER_INDEX] == field_from_bytes(sender.as_bytes())
        && public[ZK_PUBLIC_KEY_INDEX] == field_from_bytes(public_key.as_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
