//! Walkthrough of the MMN trust core.
//!
//! Creates wallets, funds an in-memory ledger, sends a key-signed transfer,
//! shows a tampered copy being refused, then runs a local Groth16 setup and
//! sends a transfer from a user-id address authorized by an identity proof.
//!
//! Run with:
//!   cargo run --example demo --release

use std::sync::Arc;
use std::time::Instant;

use ark_bn254::Fr;
use ark_ff::UniformRand;

use mmn_protocol::client::{LedgerClient, MemoryLedger};
use mmn_protocol::config::CONTENT_TYPE_DONATION_CAMPAIGN_FEED;
use mmn_protocol::crypto::MmnKeypair;
use mmn_protocol::transaction::{
    derive_address, sign_transaction, validate_curve_membership, Amount, ExtraInfo,
    TransactionBuilder, TransactionType,
};
use mmn_protocol::zkp::{IdentityProver, ProofCacheConfig, ZkVerifier};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]============================================{RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn refused(text: &str) {
    println!("{RED}  [REFUSED] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

async fn balances(ledger: &MemoryLedger, accounts: &[(&str, &str)]) {
    for (name, addr) in accounts {
        let acct = ledger.get_account(addr).await.unwrap();
        println!(
            "  {BOLD}{name:<10}{RESET} {WHITE}{:>12}{RESET} {DIM}(nonce {}){RESET}",
            acct.balance, acct.nonce
        );
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // -----------------------------------------------------------------------
    // Step 1: Wallets
    // -----------------------------------------------------------------------

    section(1, "Wallets");
    let alice = MmnKeypair::generate();
    let bob = MmnKeypair::generate();
    let carol_id = "user:carol";
    let carol_addr = derive_address(carol_id);
    let carol_key = MmnKeypair::generate();

    info("Alice", &alice.address());
    info("Bob", &bob.address());
    info("Carol (derived)", &carol_addr);

    // -----------------------------------------------------------------------
    // Step 2: Ledger with a proof verifier
    // -----------------------------------------------------------------------

    section(2, "Local Groth16 setup");
    let mut rng = ark_std::rand::thread_rng();
    let t = Instant::now();
    let (prover, vk) = IdentityProver::setup(&mut rng).unwrap();
    timing("setup", t.elapsed());

    let verifier = Arc::new(
        ZkVerifier::from_verifying_key(vk.into_inner(), ProofCacheConfig::default()).unwrap(),
    );
    let ledger = MemoryLedger::with_verifier(Arc::clone(&verifier));
    ledger.fund(&alice.address(), Amount::from(1_000_000u64)).unwrap();
    ledger.fund(&carol_addr, Amount::from(50_000u64)).unwrap();
    success("Ledger funded");

    // -----------------------------------------------------------------------
    // Step 3: Key-signed transfer
    // -----------------------------------------------------------------------

    section(3, "Transfer by key: Alice -> Bob");
    let tx = TransactionBuilder::new(TransactionType::TransferByKey)
        .sender(&alice.address())
        .recipient(&bob.address())
        .amount(250_000u64)
        .nonce(1)
        .text_data("rent | march")
        .build()
        .unwrap();

    let t = Instant::now();
    let signed = sign_transaction(&tx, alice.public_key().as_bytes(), &alice.seed()).unwrap();
    timing("sign", t.elapsed());
    info("Signature", &signed.signature[..24]);

    let mut tampered = signed.clone();
    tampered.tx = tampered.tx.to_builder().amount(250_001u64).build().unwrap();
    match ledger.add_tx(tampered).await {
        Err(e) => refused(&format!("amount changed after signing: {e}")),
        Ok(_) => unreachable!("tampered transaction admitted"),
    }

    let res = ledger.add_tx(signed).await.unwrap();
    info("Tx hash", &res.tx_hash);
    success("Admitted");

    // -----------------------------------------------------------------------
    // Step 4: Proof-authorized transfer
    // -----------------------------------------------------------------------

    section(4, "Transfer by identity proof: Carol -> Bob");
    let secret = Fr::rand(&mut rng);
    let t = Instant::now();
    let proof = prover.prove(secret, 1, &carol_addr, &carol_key.address()).unwrap();
    timing("prove", t.elapsed());

    let tx = TransactionBuilder::new(TransactionType::TransferByZk)
        .sender(&carol_addr)
        .recipient(&bob.address())
        .amount(20_000u64)
        .nonce(1)
        .zk_proof(&proof.proof_base64(), &proof.witness_base64())
        .build()
        .unwrap();
    let signed = sign_transaction(&tx, carol_key.public_key().as_bytes(), &carol_key.seed()).unwrap();

    let t = Instant::now();
    ledger.add_tx(signed).await.unwrap();
    timing("verify + apply", t.elapsed());
    let stats = verifier.stats();
    info(
        "Verifier",
        &format!("{} pairing check(s), {} cache hit(s)", stats.pairing_checks, stats.cache_hits),
    );
    success("Admitted");

    // -----------------------------------------------------------------------
    // Step 5: Curve membership
    // -----------------------------------------------------------------------

    section(5, "Donation campaign recipients");
    let mut extra = ExtraInfo::new();
    extra.insert("type".into(), CONTENT_TYPE_DONATION_CAMPAIGN_FEED.into());
    let candidates = [
        ("Bob's wallet", bob.address()),
        ("Derived id", derive_address("campaign:42")),
    ];
    for (name, recipient) in candidates {
        let post = TransactionBuilder::new(TransactionType::UserContent)
            .sender(&alice.address())
            .recipient(&recipient)
            .amount(1u64)
            .nonce(2)
            .extra_info(extra.clone())
            .build()
            .unwrap();
        if validate_curve_membership(&post) {
            success(&format!("{name} is an Ed25519 point"));
        } else {
            refused(&format!("{name} is not an Ed25519 point"));
        }
    }

    section(6, "Final balances");
    balances(
        &ledger,
        &[
            ("Alice", alice.address().as_str()),
            ("Bob", bob.address().as_str()),
            ("Carol", carol_addr.as_str()),
        ],
    )
    .await;
    println!();
}
