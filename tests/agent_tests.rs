//! Agent tests: trust bootstrap, anonymous reads, authenticated writes.

mod common;

use bitcoin::Amount;
use ckboost::agent::Transport;
use ckboost::config::RemoteEndpoint;
use ckboost::core::methods::{backend, canisters, ledger};
use ckboost::{create_client, Account, BoostError, ClientConfig, Identity, Token, TrustState};
use common::{local_config, mainnet_config, shared, CallKind, MemoryTransport, BACKEND};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn alice() -> Identity {
    Identity::new("2vxsx-fae", None).unwrap()
}

/// Test: development bootstrap failure is logged, not fatal
#[test]
fn dev_root_key_failure_continues_unverified() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(MemoryTransport::new().unreachable().reply(backend::GREET, Ok(json!("Hello, bob!"))));
        let client = create_client(&local_config(), transport.clone(), None).await.expect("client");

        assert_eq!(client.trust(), &TrustState::Unverified);
        assert_eq!(client.reads().greet("bob").await.unwrap(), "Hello, bob!");
    });
}

/// Test: development bootstrap records the fetched root key
#[test]
fn dev_root_key_is_fetched() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(MemoryTransport::new());
        let client = create_client(&local_config(), transport, None).await.unwrap();
        assert_eq!(client.trust(), &TrustState::RootKeyFetched(vec![0xab; 4]));
    });
}

/// Test: production endpoint must answer the status request
#[test]
fn production_status_failure_is_fatal() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(MemoryTransport::new().unreachable());
        let err = create_client(&mainnet_config(), transport.clone(), None).await.err().expect("error");
        assert!(matches!(err, BoostError::Connection(_)));
        assert!(transport.calls().is_empty());

        let healthy = shared(MemoryTransport::new());
        let client = create_client(&mainnet_config(), healthy, None).await.unwrap();
        assert_eq!(client.trust(), &TrustState::Verified);
    });
}

/// Test: production never falls back to a baked-in backend id
#[test]
fn backend_canister_fallback_only_in_development() {
    Runtime::new().unwrap().block_on(async {
        let transport: Arc<dyn Transport> = shared(MemoryTransport::new());

        let dev = ClientConfig::new(RemoteEndpoint::development("http://localhost:4943").unwrap());
        let client = create_client(&dev, transport.clone(), None).await.unwrap();
        assert_eq!(client.reads().backend_canister(), canisters::LOCAL_BACKEND_FALLBACK);

        let prod = ClientConfig::new(RemoteEndpoint::production("https://icp0.io").unwrap());
        let err = create_client(&prod, transport, None).await.err().expect("error");
        assert!(matches!(err, BoostError::Config(_)));
    });
}

/// Test: anonymous reads go out without a sender
#[test]
fn anonymous_reads() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(
            MemoryTransport::new()
                .reply(backend::GREET, Ok(json!("Hello, alice!")))
                .reply(backend::GET_DEPOSIT_ADDRESS, Ok(json!("bc1qdeposit"))),
        );
        let client = create_client(&local_config(), transport.clone(), None).await.unwrap();
        assert!(client.as_authenticated().is_none());
        assert!(client.identity().is_none());

        assert_eq!(client.reads().greet("alice").await.unwrap(), "Hello, alice!");
        assert_eq!(client.reads().get_deposit_address().await.unwrap(), "bc1qdeposit");

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.kind == CallKind::Query && c.canister == BACKEND));
        assert!(calls.iter().all(|c| c.envelope.sender.is_none()));
        assert!(calls.iter().all(|c| backend::ANONYMOUS.contains(&c.envelope.method.as_str())));
        assert_eq!(calls[0].envelope.args, json!({"name": "alice"}));
    });
}

/// Test: submitBoost is an update call signed by the identity
#[test]
fn authenticated_submit_boost() {
    Runtime::new().unwrap().block_on(async {
        let receipt = json!({
            "boost_id": 7,
            "deposit_address": "bc1qdeposit",
            "amount_e8s": 50_000,
            "destination": "bc1qdest"
        });
        let transport = shared(MemoryTransport::new().reply(backend::SUBMIT_BOOST, Ok(receipt)));
        let client = create_client(&local_config(), transport.clone(), Some(alice())).await.unwrap();
        let actor = client.as_authenticated().expect("authenticated");

        let receipt = actor.submit_boost(Amount::from_sat(50_000), "bc1qdest").await.unwrap();
        assert_eq!(receipt.boost_id, 7);
        assert_eq!(receipt.amount, Amount::from_sat(50_000));
        assert_eq!(receipt.deposit_address, "bc1qdeposit");

        let calls = transport.calls_to(backend::SUBMIT_BOOST);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Call);
        assert_eq!(calls[0].envelope.sender, Some(alice()));
        assert_eq!(calls[0].envelope.args, json!({"amount_e8s": 50_000, "destination": "bc1qdest"}));
    });
}

/// Test: backend rejection surfaces verbatim
#[test]
fn rejection_is_preserved() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(
            MemoryTransport::new().reply(backend::SUBMIT_BOOST, Err(BoostError::Rejected("insufficient funds".into()))),
        );
        let client = create_client(&local_config(), transport, Some(alice())).await.unwrap();
        let err = client
            .as_authenticated()
            .unwrap()
            .submit_boost(Amount::from_sat(50_000), "bc1qdest")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "insufficient funds");
        assert!(!err.is_recoverable());
    });
}

/// Test: slow replica hits the configured RPC timeout
#[test]
fn rpc_timeout() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(
            MemoryTransport::new()
                .with_delay(Duration::from_millis(500))
                .reply(backend::GREET, Ok(json!("late"))),
        );
        let config = local_config().with_rpc_timeout(Duration::from_millis(50));
        let client = create_client(&config, transport, None).await.unwrap();
        let err = client.reads().greet("slow").await.unwrap_err();
        assert_eq!(err, BoostError::Timeout(Duration::from_millis(50)));
        assert!(err.is_recoverable());
    });
}

/// Test: ledger balance for the session account
#[test]
fn balance_reads_the_ledger() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(MemoryTransport::new().reply(ledger::BALANCE_OF, Ok(json!(123_456))));
        let client = create_client(&local_config(), transport.clone(), Some(alice())).await.unwrap();

        let balance = client.as_authenticated().unwrap().balance().await.unwrap();
        assert_eq!(balance, Amount::from_sat(123_456));

        let calls = transport.calls_to(ledger::BALANCE_OF);
        assert_eq!(calls[0].canister, canisters::CKBTC_LEDGER);
        assert_eq!(calls[0].envelope.args, json!({"owner": "2vxsx-fae"}));

        let other = client.reads().balance_of(&Account::new("aaaaa-aa")).await.unwrap();
        assert_eq!(other, Amount::from_sat(123_456));
    });
}

/// Test: liquidity positions, with local validation before any call
#[test]
fn liquidity_positions() {
    Runtime::new().unwrap().block_on(async {
        let position = json!({
            "id": "pos-1",
            "amount_e8s": 1_000_000,
            "fee_percent": 0.5,
            "created_at_ms": 1_700_000_000_000i64
        });
        let transport = shared(
            MemoryTransport::new()
                .reply(backend::GET_LIQUIDITY_POSITIONS, Ok(json!([position.clone()])))
                .reply(backend::CREATE_LIQUIDITY_POSITION, Ok(position))
                .reply(backend::REMOVE_LIQUIDITY_POSITION, Ok(json!(null))),
        );
        let client = create_client(&local_config(), transport.clone(), Some(alice())).await.unwrap();
        let actor = client.as_authenticated().unwrap();

        let positions = actor.liquidity_positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].earnings, Amount::ZERO);

        assert!(actor.create_liquidity_position(Amount::from_sat(1_000_000), 5.0).await.unwrap_err().is_validation());
        assert!(actor.create_liquidity_position(Amount::ZERO, 0.5).await.unwrap_err().is_validation());
        assert!(transport.calls_to(backend::CREATE_LIQUIDITY_POSITION).is_empty());

        let created = actor.create_liquidity_position(Amount::from_sat(1_000_000), 0.5).await.unwrap();
        assert_eq!(created.id, "pos-1");
        actor.remove_liquidity_position("pos-1").await.unwrap();
        assert_eq!(transport.calls_to(backend::REMOVE_LIQUIDITY_POSITION)[0].envelope.args, json!({"id": "pos-1"}));
    });
}

/// Test: balances per token hit the matching ledger
#[test]
fn token_balances_use_their_ledgers() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(MemoryTransport::new().reply(ledger::BALANCE_OF, Ok(json!(7_000))));
        let config = local_config().with_icp_ledger_canister("icp-local-ledger");
        let client = create_client(&config, transport.clone(), Some(alice())).await.unwrap();
        let actor = client.as_authenticated().unwrap();

        assert_eq!(actor.token_balance(Token::Icp).await.unwrap(), Amount::from_sat(7_000));
        assert_eq!(actor.token_balance(Token::CkBtc).await.unwrap(), Amount::from_sat(7_000));

        let calls = transport.calls_to(ledger::BALANCE_OF);
        assert_eq!(calls[0].canister, "icp-local-ledger");
        assert_eq!(calls[1].canister, canisters::CKBTC_LEDGER);
    });
}

/// Test: send input is checked before any transfer goes out
#[test]
fn send_validates_locally() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(
            MemoryTransport::new()
                .reply(ledger::BALANCE_OF, Ok(json!(100_000)))
                .reply(ledger::TRANSFER, Ok(json!(1))),
        );
        let client = create_client(&local_config(), transport.clone(), Some(alice())).await.unwrap();
        let actor = client.as_authenticated().unwrap();

        let err = actor.send(Token::Icp, Amount::ZERO, "aaaaa-aa").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid amount");

        let err = actor.send(Token::Icp, Amount::from_sat(1), "   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a recipient address");

        let err = actor.send(Token::Icp, Amount::from_sat(100_001), "aaaaa-aa").await.unwrap_err();
        assert_eq!(err, BoostError::Validation("Insufficient ICP balance".into()));

        let err = actor.send(Token::CkBtc, Amount::from_sat(100_001), "aaaaa-aa").await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient ckBTC balance");

        assert!(transport.calls_to(ledger::TRANSFER).is_empty());
    });
}

/// Test: an ICP send is an update call on the ICP ledger
#[test]
fn send_transfers_on_token_ledger() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(
            MemoryTransport::new()
                .reply(ledger::BALANCE_OF, Ok(json!(100_000)))
                .reply(ledger::TRANSFER, Ok(json!(42))),
        );
        let client = create_client(&local_config(), transport.clone(), Some(alice())).await.unwrap();
        let actor = client.as_authenticated().unwrap();

        let sub = format!("{}02", "00".repeat(31));
        let block = actor.send(Token::Icp, Amount::from_sat(100_000), &format!("aaaaa-aa.{sub}")).await.unwrap();
        assert_eq!(block, 42);

        let calls = transport.calls_to(ledger::TRANSFER);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Call);
        assert_eq!(calls[0].canister, canisters::ICP_LEDGER);
        assert_eq!(calls[0].envelope.sender, Some(alice()));
        assert_eq!(
            calls[0].envelope.args,
            json!({"to": {"owner": "aaaaa-aa", "subaccount": sub}, "amount": 100_000})
        );
        assert_eq!(transport.calls_to(ledger::BALANCE_OF)[0].canister, canisters::ICP_LEDGER);
    });
}

/// Test: a ledger refusal surfaces as a rejection
#[test]
fn send_rejection_is_preserved() {
    Runtime::new().unwrap().block_on(async {
        let transport = shared(
            MemoryTransport::new()
                .reply(ledger::BALANCE_OF, Ok(json!(100_000)))
                .reply(ledger::TRANSFER, Err(BoostError::Rejected("BadFee".into()))),
        );
        let client = create_client(&local_config(), transport, Some(alice())).await.unwrap();
        let err = client
            .as_authenticated()
            .unwrap()
            .send(Token::CkBtc, Amount::from_sat(10), "aaaaa-aa")
            .await
            .unwrap_err();
        assert_eq!(err, BoostError::Rejected("BadFee".into()));
    });
}
