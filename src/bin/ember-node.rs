#![forbid(unsafe_code)]
//! Demo node for Emberchain
//!
//! Walks one ledger through the full request surface: key registration,
//! grants, a signed transfer, fraud screening, a blacklisted
//! resubmission, a tax-pool contract, and a few reward-only blocks.

use clap::Parser;
use emberchain::config::load_config;
use emberchain::contract::{ContractAction, ContractTerms};
use emberchain::crypto::{address_from_label, address_to_hex, Address, KeyPair};
use emberchain::ledger::MiningOutcome;
use emberchain::node::LedgerNode;
use emberchain::transaction::{Amount, Transaction, TAX_POOL_ADDRESS};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
    /// Reward-only blocks to mine after the scenario
    #[arg(long, default_value_t = 2)]
    blocks: u32,
    /// Emit the final summary as JSON instead of the narrative
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let verbose = !args.json;
    let config = load_config(&args.config)?;
    let node = LedgerNode::new(&config);

    let alice = KeyPair::generate()?;
    let bob = KeyPair::generate()?;
    let mallory = KeyPair::generate()?;
    let dave = address_from_label("dave");
    let miner = address_from_label("demo-miner");

    node.register_key(alice.address(), alice.public_key_bytes())
        .await?;
    node.register_key(bob.address(), bob.public_key_bytes())
        .await?;
    node.register_key(mallory.address(), mallory.public_key_bytes())
        .await?;

    // Seed balances and settle them into the first mined block.
    node.grant(alice.address(), Amount::from_num(2_000)).await?;
    node.grant(mallory.address(), Amount::from_num(50_000))
        .await?;
    mine_round(&node, miner, verbose).await?;

    // An honest transfer, admitted with its fee fixed in.
    let mut payment = Transaction::new(alice.address(), bob.address(), Amount::from_num(1_000));
    payment.sign(&alice)?;
    node.submit_transaction(payment).await?;
    if verbose {
        println!("✅ alice -> bob 1000 admitted");
    }

    // A malformed transfer is turned away at the door.
    let mut bogus = Transaction::new(alice.address(), bob.address(), Amount::from_num(-5));
    bogus.sign(&alice)?;
    match node.submit_transaction(bogus).await {
        Err(reason) => {
            if verbose {
                println!("🚫 negative transfer rejected: {}", reason);
            }
        }
        Ok(()) => unreachable!("negative amounts never pass admission"),
    }

    // A transfer above the suspicious ceiling passes admission but is
    // dropped at mining time, blacklisting its sender.
    let mut oversized =
        Transaction::new(mallory.address(), bob.address(), Amount::from_num(20_000));
    oversized.sign(&mallory)?;
    node.submit_transaction(oversized).await?;
    mine_round(&node, miner, verbose).await?;
    if verbose {
        let stats = node.stats().await;
        println!(
            "🕵️ fraud screen ran: {} address(es) blacklisted",
            stats.blacklist_size
        );
    }

    // The blacklisted sender is now refused outright.
    let mut retry = Transaction::new(mallory.address(), bob.address(), Amount::from_num(10));
    retry.sign(&mallory)?;
    match node.submit_transaction(retry).await {
        Err(reason) => {
            if verbose {
                println!("🚫 resubmission rejected: {}", reason);
            }
        }
        Ok(()) => unreachable!("blacklisted senders never pass admission"),
    }

    // A contract pays dave from the tax pool once bob's balance holds.
    let handle = node
        .deploy_contract(
            ContractTerms {
                target: bob.address(),
                minimum_balance: Amount::from_num(100),
                deadline: None,
            },
            vec![ContractAction::PayoutFromTaxPool {
                recipient: dave,
                amount: Amount::from_num(10),
            }],
        )
        .await?;
    let fulfilled = node.evaluate_contracts().await;
    if verbose {
        println!("📜 deployed {}; fulfilled this pass: {:?}", handle, fulfilled);
    }
    mine_round(&node, miner, verbose).await?;

    for _ in 0..args.blocks {
        mine_round(&node, miner, verbose).await?;
    }

    let stats = node.stats().await;
    let balances = [
        ("alice", alice.address()),
        ("bob", bob.address()),
        ("mallory", mallory.address()),
        ("dave", dave),
        ("miner", miner),
        ("tax-pool", *TAX_POOL_ADDRESS),
    ];

    if args.json {
        let mut entries = serde_json::Map::new();
        for (name, address) in &balances {
            entries.insert(
                name.to_string(),
                serde_json::json!({
                    "address": address_to_hex(address),
                    "balance": format!("{:.4}", node.query_balance(address).await),
                }),
            );
        }
        let chain = node.query_chain().await;
        let summary = serde_json::json!({
            "stats": stats,
            "balances": entries,
            "tip_hash": chain.last().map(|b| b.hash_hex()),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        println!("=== balances ===");
        for (name, address) in &balances {
            println!(
                "{:>10}  {}  {:.4}",
                name,
                &address_to_hex(address)[..12],
                node.query_balance(address).await
            );
        }
        println!("=== ledger ===");
        println!(
            "blocks {} | difficulty {} | pending {} | blacklisted {} | energy {}",
            stats.chain_length,
            stats.difficulty,
            stats.pending_count,
            stats.blacklist_size,
            stats.energy_spent
        );
        println!(
            "contracts: {} pending, {} fulfilled, {} expired",
            stats.contracts_pending, stats.contracts_fulfilled, stats.contracts_expired
        );
    }

    Ok(())
}

/// One mining round, spaced so block timing lands in the difficulty
/// controller's dead band instead of ratcheting upward every block.
async fn mine_round(
    node: &LedgerNode,
    miner: Address,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    match node.request_mining(miner).await? {
        MiningOutcome::Mined(block) => {
            if verbose {
                println!(
                    "⛏️  block {} mined: {} tx, nonce {}, hash {}…",
                    block.index,
                    block.transactions.len(),
                    block.nonce,
                    &block.hash_hex()[..12]
                );
            }
        }
        MiningOutcome::EmptyPool => {
            if verbose {
                println!("⛏️  nothing to mine");
            }
        }
    }
    Ok(())
}
