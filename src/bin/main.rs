//! ckboost CLI - drive the client core against a replica.
//!
//!   ckboost status                          → endpoint, network, trust state
//!   ckboost greet <name>                    → backend greeting (anonymous)
//!   ckboost deposit-address                 → BTC deposit address (anonymous)
//!   ckboost balance [principal]             → ckBTC balance
//!   ckboost wallet                          → ICP and ckBTC balances
//!   ckboost send <ICP|ckBTC> <amount> <to>  → ledger transfer
//!   ckboost boost <amount> <destination>    → run the boost wizard end to end
//!   ckboost positions                       → booster liquidity positions
//!   ckboost add-position <amount> <fee%>    → open a liquidity position
//!   ckboost remove-position <id>            → close a liquidity position
//!
//! Configuration comes from the environment (and `.env`):
//!   CKBOOST_NETWORK=ic|local (required), CKBOOST_HOST, CANISTER_ID_CKBOOST_BACKEND,
//!   CKBOOST_LEDGER_CANISTER_ID, CKBOOST_ICP_LEDGER_CANISTER_ID, CKBOOST_MIN_AMOUNT_SATS, CKBOOST_RPC_TIMEOUT_SECS,
//!   CKBOOST_PRINCIPAL (stands in for the wallet provider).

use anyhow::{anyhow, bail, Context};
use bitcoin::{Amount, Denomination};
use ckboost::config::load_env_file;
use ckboost::logging::init_logging;
use ckboost::query::{QueryClient, QueryKey, QueryOptions};
use ckboost::wizard::{btc_string, parse_btc};
use ckboost::{
    Account, ActorClient, BoostWizard, ClientConfig, ConfirmOutcome, HttpTransport, ProviderEvent,
    SessionClients, SessionStore, Subaccount, Token, TrustState, WalletUser,
};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }
    if opts.version {
        println!("ckboost {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    let Some(command) = opts.command.clone() else {
        print_usage();
        return;
    };

    let result = tokio::runtime::Runtime::new()
        .context("tokio runtime")
        .and_then(|rt| rt.block_on(run(&command, &opts)));

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{e:#}")}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

async fn run(command: &str, opts: &ParsedArgs) -> anyhow::Result<Value> {
    let config = ClientConfig::from_env()?;
    let transport = Arc::new(HttpTransport::new(config.endpoint.host()));
    let clients = SessionClients::new(config, transport);
    let store = SessionStore::new();

    // The CLI has no wallet provider: an explicit principal settles the session.
    match opts.principal.clone() {
        Some(principal) => {
            let mut user = WalletUser::new(principal);
            if let Some(hex) = &opts.subaccount {
                user = user.with_subaccount(Subaccount::from_hex(hex)?.as_bytes().to_vec());
            }
            store.apply(ProviderEvent::Connected(user))
        }
        None => store.apply(ProviderEvent::Disconnected),
    };

    let client = clients
        .client_for(&store.current())
        .await?
        .ok_or_else(|| anyhow!("session did not settle"))?;

    match command {
        "status" => cmd_status(&clients, &client),
        "greet" => {
            let name = opts.positional.first().map(String::as_str).unwrap_or("world");
            Ok(json!({"greeting": client.reads().greet(name).await?}))
        }
        "deposit-address" => Ok(json!({"address": client.reads().get_deposit_address().await?})),
        "balance" => cmd_balance(&client, opts).await,
        "boost" => cmd_boost(&clients, &client, opts).await,
        "wallet" => {
            let actor = require_auth(&client)?;
            let mut balances = serde_json::Map::new();
            for token in [Token::Icp, Token::CkBtc] {
                let balance = actor.token_balance(token).await?;
                balances.insert(token.as_str().to_string(), json!(btc_string(balance)));
            }
            Ok(json!({"principal": actor.identity().to_string(), "balances": balances}))
        }
        "send" => cmd_send(&client, opts).await,
        "positions" => {
            let actor = require_auth(&client)?;
            let positions = actor.liquidity_positions().await?;
            Ok(json!({
                "positions": positions.iter().map(position_json).collect::<Vec<_>>(),
                "count": positions.len()
            }))
        }
        "add-position" => {
            let actor = require_auth(&client)?;
            let amount = parse_btc(opts.positional.first().map(String::as_str).unwrap_or(""))?;
            let fee: f64 = opts
                .positional
                .get(1)
                .ok_or_else(|| anyhow!("usage: add-position <amount> <fee%>"))?
                .parse()
                .context("fee percent")?;
            Ok(position_json(&actor.create_liquidity_position(amount, fee).await?))
        }
        "remove-position" => {
            let actor = require_auth(&client)?;
            let id = opts.positional.first().ok_or_else(|| anyhow!("usage: remove-position <id>"))?;
            actor.remove_liquidity_position(id).await?;
            Ok(json!({"removed": id}))
        }
        other => bail!("Unknown command: {other}"),
    }
}

fn require_auth(client: &ActorClient) -> anyhow::Result<&ckboost::AuthenticatedActor> {
    client
        .as_authenticated()
        .ok_or_else(|| anyhow!("this command needs a connected wallet (--principal or CKBOOST_PRINCIPAL)"))
}

fn cmd_status(clients: &SessionClients, client: &ActorClient) -> anyhow::Result<Value> {
    let reads = client.reads();
    let trust = match reads.trust() {
        TrustState::Verified => "verified",
        TrustState::RootKeyFetched(_) => "root-key-fetched",
        TrustState::Unverified => "unverified",
    };
    Ok(json!({
        "host": reads.endpoint().host(),
        "production": reads.endpoint().is_production(),
        "trust": trust,
        "backend": reads.backend_canister(),
        "ledger": reads.ledger_canister(),
        "icp_ledger": reads.icp_ledger_canister(),
        "min_amount_btc": btc_string(clients.config().min_amount),
        "principal": client.identity().map(|id| id.to_string()),
    }))
}

async fn cmd_balance(client: &ActorClient, opts: &ParsedArgs) -> anyhow::Result<Value> {
    let account = match (opts.positional.first(), client.identity()) {
        (Some(owner), _) => Account::new(owner.clone()),
        (None, Some(identity)) => Account::from(identity),
        (None, None) => bail!("usage: balance <principal>"),
    };
    let key = QueryKey::new(["balance".to_string(), account.owner.clone()]);
    let reads = client.reads().clone();
    let queries = QueryClient::new();
    let state = queries
        .run(key, move || {
            let reads = reads.clone();
            let account = account.clone();
            async move { reads.balance_of(&account).await }
        }, QueryOptions::default())
        .await;
    match (state.data, state.error) {
        (Some(balance), _) => Ok(json!({"owner": state.key.parts()[1], "balance_btc": btc_string(balance), "balance_e8s": balance.to_sat()})),
        (None, Some(e)) => Err(e.into()),
        (None, None) => bail!("balance query did not run"),
    }
}

async fn cmd_boost(clients: &SessionClients, client: &ActorClient, opts: &ParsedArgs) -> anyhow::Result<Value> {
    let actor = require_auth(client)?.clone();
    let (amount, destination) = match opts.positional.as_slice() {
        [amount, destination, ..] => (amount.clone(), destination.clone()),
        _ => bail!("usage: boost <amount> <destination>"),
    };

    let wizard = BoostWizard::new(Arc::new(actor.clone()), clients.config().min_amount);
    if let Ok(balance) = actor.balance().await {
        wizard.set_available_balance(Some(balance));
    }
    wizard.submit_amount(&amount)?;
    wizard.submit_destination(&destination)?;
    let quote = wizard.quote().ok_or_else(|| anyhow!("no quote at confirmation"))?;

    if !opts.yes {
        return Ok(json!({
            "step": wizard.step().as_str(),
            "amount_btc": btc_string(quote.amount),
            "fee_btc": btc_string(quote.fee),
            "receive_btc": btc_string(quote.receive),
            "estimated_minutes": quote.estimated_delivery.as_secs() / 60,
            "destination": destination,
            "hint": "re-run with --yes to submit"
        }));
    }

    match wizard.confirm().await? {
        ConfirmOutcome::Submitted(receipt) => Ok(json!({
            "step": wizard.step().as_str(),
            "boost_id": receipt.boost_id,
            "send_exactly_btc": btc_string(receipt.amount),
            "deposit_address": receipt.deposit_address,
            "destination": receipt.destination,
        })),
        ConfirmOutcome::Ignored => bail!("a submission is already in flight"),
    }
}

async fn cmd_send(client: &ActorClient, opts: &ParsedArgs) -> anyhow::Result<Value> {
    let actor = require_auth(client)?;
    let (token, amount, recipient) = match opts.positional.as_slice() {
        [token, amount, recipient, ..] => (token, amount, recipient),
        _ => bail!("usage: send <ICP|ckBTC> <amount> <recipient>"),
    };
    let token = Token::from_str(token).ok_or_else(|| anyhow!("unknown token: {token} (expected ICP or ckBTC)"))?;
    let amount = Amount::from_str_in(amount.trim(), Denomination::Bitcoin)
        .map_err(|e| anyhow!("Invalid amount: {e}"))?;

    if !opts.yes {
        return Ok(json!({
            "token": token.as_str(),
            "amount": btc_string(amount),
            "to": recipient,
            "hint": "re-run with --yes to send"
        }));
    }

    let block = actor.send(token, amount, recipient).await?;
    Ok(json!({"token": token.as_str(), "amount": btc_string(amount), "to": recipient, "block_index": block}))
}

fn position_json(position: &ckboost::LiquidityPosition) -> Value {
    json!({
        "id": position.id,
        "amount_btc": btc_string(position.amount),
        "fee_percent": position.fee_percent,
        "created_at": position.created_at.to_rfc3339(),
        "earnings_btc": btc_string(position.earnings),
    })
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    positional: Vec<String>,
    principal: Option<String>,
    subaccount: Option<String>,
    yes: bool,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_env_file(Path::new(".env"));

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--yes" | "-y" => opts.yes = true,
                "--principal" | "-p" => {
                    if i + 1 < args.len() {
                        opts.principal = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--subaccount" => {
                    if i + 1 < args.len() {
                        opts.subaccount = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') || arg.parse::<f64>().is_ok() => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.positional = positional;

        if opts.principal.is_none() {
            opts.principal = env::var("CKBOOST_PRINCIPAL").ok().filter(|s| !s.is_empty());
        }
        opts
    }
}

fn print_usage() {
    println!(
        r#"ckboost - ckBoost client

USAGE:
    ckboost <command> [args] [options]

COMMANDS:
    status                          Endpoint, network and trust state
    greet <name>                    Call the backend greeting
    deposit-address                 Fetch the BTC deposit address
    balance [principal]             ckBTC balance (defaults to --principal)
    wallet                          ICP and ckBTC balances of --principal
    send <ICP|ckBTC> <amount> <to>  Ledger transfer; <to> is principal[.subaccount hex]
    boost <amount> <destination>    Boost BTC to ckBTC (quote only without --yes)
    positions                       List your liquidity positions
    add-position <amount> <fee%>    Open a liquidity position (fee 0.1..2)
    remove-position <id>            Close a liquidity position

OPTIONS:
    --principal, -p <id>    Connected wallet principal (env: CKBOOST_PRINCIPAL)
    --subaccount <hex>      32-byte sub-account, hex
    --yes, -y               Submit boosts and sends without stopping at confirmation
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENVIRONMENT:
    CKBOOST_NETWORK         ic | local (required, never defaulted)
    CKBOOST_HOST            Replica URL (default per network)
    CANISTER_ID_CKBOOST_BACKEND
    CKBOOST_LEDGER_CANISTER_ID      ckBTC ledger
    CKBOOST_ICP_LEDGER_CANISTER_ID  ICP ledger
    CKBOOST_MIN_AMOUNT_SATS Minimum boost in sats (default 10000 = 0.0001 BTC)
    CKBOOST_RPC_TIMEOUT_SECS
    CKBOOST_LOG_FORMAT      compact | pretty | json (logs go to stderr)

EXAMPLES:
    CKBOOST_NETWORK=local ckboost greet alice
    ckboost boost 0.01 bc1q... --principal 2vxsx-fae
    ckboost boost 0.01 bc1q... --principal 2vxsx-fae --yes
    ckboost send ICP 1.5 aaaaa-aa --principal 2vxsx-fae --yes
"#
    );
}
