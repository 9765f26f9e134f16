//! Integration tests for the node facade
//!
//! Everything here goes through [`LedgerNode`]'s async surface the way an
//! embedding service would: submit, mine, query, adopt external chains.

use emberchain::config::LedgerConfig;
use emberchain::contract::{ContractAction, ContractTerms};
use emberchain::crypto::{address_from_label, KeyPair};
use emberchain::error::LedgerError;
use emberchain::ledger::{Ledger, MiningOutcome, SyncOutcome};
use emberchain::node::LedgerNode;
use emberchain::transaction::{Amount, Transaction};

fn test_config() -> LedgerConfig {
    LedgerConfig {
        initial_difficulty: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_wallet_round_trip_through_node() {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let node = LedgerNode::new(&test_config());
        let alice = KeyPair::generate().expect("keygen");
        let bob = address_from_label("bob");
        let miner = address_from_label("miner");

        node.register_key(alice.address(), alice.public_key_bytes())
            .await
            .expect("register");
        node.grant(alice.address(), Amount::from_num(2_000))
            .await
            .expect("grant");
        node.request_mining(miner).await.expect("first mine");

        let mut tx = Transaction::new(alice.address(), bob, Amount::from_num(500));
        tx.sign(&alice).expect("sign");
        node.submit_transaction(tx).await.expect("submit");
        node.request_mining(miner).await.expect("second mine");

        let fee = {
            let ledger = node.ledger.read().await;
            Amount::from_num(500) * ledger.fee_rate
        };
        assert_eq!(
            node.query_balance(&alice.address()).await,
            Amount::from_num(1_500)
        );
        assert_eq!(
            node.query_balance(&bob).await,
            Amount::from_num(500) - fee
        );
        assert_eq!(node.query_chain().await.len(), 3);
    })
    .await
    .expect("test_wallet_round_trip_through_node timed out");
}

#[tokio::test]
async fn test_mining_with_empty_pool_reports_outcome() {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let node = LedgerNode::new(&test_config());

        let outcome = node
            .request_mining(address_from_label("miner"))
            .await
            .expect("mining request");
        assert!(matches!(outcome, MiningOutcome::EmptyPool));
        assert_eq!(node.query_chain().await.len(), 1);
    })
    .await
    .expect("test_mining_with_empty_pool_reports_outcome timed out");
}

#[tokio::test]
async fn test_unsigned_transfer_is_refused() {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let node = LedgerNode::new(&test_config());
        let alice = KeyPair::generate().expect("keygen");

        node.register_key(alice.address(), alice.public_key_bytes())
            .await
            .expect("register");
        node.grant(alice.address(), Amount::from_num(100))
            .await
            .expect("grant");
        node.request_mining(address_from_label("miner"))
            .await
            .expect("mine");

        let unsigned = Transaction::new(
            alice.address(),
            address_from_label("bob"),
            Amount::from_num(10),
        );
        let refused = node.submit_transaction(unsigned).await;
        assert!(matches!(refused, Err(LedgerError::AuthenticationFailed(_))));
    })
    .await
    .expect("test_unsigned_transfer_is_refused timed out");
}

#[tokio::test]
async fn test_node_adopts_longer_external_chain() {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let alice = address_from_label("alice");
        let mut remote = Ledger::new(&test_config());
        remote.grant(alice, Amount::from_num(500)).expect("grant");
        remote
            .mine_block(address_from_label("remote-miner"))
            .expect("remote mine");
        remote
            .mine_block(address_from_label("remote-miner"))
            .expect("remote mine");

        let node = LedgerNode::new(&test_config());
        let outcome = node.submit_external_chain(remote.chain.clone()).await;
        assert_eq!(outcome, SyncOutcome::Replaced);
        assert_eq!(node.query_chain().await.len(), 3);
        assert_eq!(node.query_balance(&alice).await, Amount::from_num(500));
    })
    .await
    .expect("test_node_adopts_longer_external_chain timed out");
}

#[tokio::test]
async fn test_node_keeps_chain_over_shorter_candidate() {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let node = LedgerNode::new(&test_config());
        node.grant(address_from_label("alice"), Amount::from_num(100))
            .await
            .expect("grant");
        node.request_mining(address_from_label("miner"))
            .await
            .expect("mine");

        let stranger = Ledger::new(&test_config());
        let outcome = node.submit_external_chain(stranger.chain.clone()).await;
        assert_eq!(outcome, SyncOutcome::Kept);
        assert_eq!(node.query_chain().await.len(), 2);
    })
    .await
    .expect("test_node_keeps_chain_over_shorter_candidate timed out");
}

#[tokio::test]
async fn test_contract_lifecycle_through_node() {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let node = LedgerNode::new(&test_config());
        let alice = KeyPair::generate().expect("keygen");
        let bob = address_from_label("bob");
        let dave = address_from_label("dave");
        let miner = address_from_label("miner");

        node.register_key(alice.address(), alice.public_key_bytes())
            .await
            .expect("register");
        node.grant(alice.address(), Amount::from_num(2_000))
            .await
            .expect("grant");
        node.request_mining(miner).await.expect("first mine");

        // Fee-bearing transfer so the tax pool can fund the payout.
        let mut tx = Transaction::new(alice.address(), bob, Amount::from_num(1_000));
        tx.sign(&alice).expect("sign");
        node.submit_transaction(tx).await.expect("submit");
        node.request_mining(miner).await.expect("second mine");

        node.deploy_contract(
            ContractTerms {
                target: bob,
                minimum_balance: Amount::from_num(100),
                deadline: None,
            },
            vec![ContractAction::PayoutFromTaxPool {
                recipient: dave,
                amount: Amount::from_num(10),
            }],
        )
        .await
        .expect("deploy");
        assert_eq!(node.stats().await.contracts_pending, 1);

        let fulfilled = node.evaluate_contracts().await;
        assert_eq!(fulfilled.len(), 1);
        node.request_mining(miner).await.expect("third mine");

        assert_eq!(node.query_balance(&dave).await, Amount::from_num(10));
        let stats = node.stats().await;
        assert_eq!(stats.contracts_pending, 0);
        assert_eq!(stats.contracts_fulfilled, 1);
        assert_eq!(stats.chain_length, 4);
    })
    .await
    .expect("test_contract_lifecycle_through_node timed out");
}
