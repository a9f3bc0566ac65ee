//! Canister ids, replica routes and method names.
//!
//! Centralized registry so the agent and the CLI never spell a method twice.

/// ckBoost backend canister methods
pub mod backend {
    pub const GREET: &str = "greet";
    pub const GET_DEPOSIT_ADDRESS: &str = "getDepositAddress";
    pub const SUBMIT_BOOST: &str = "submitBoost";
    pub const GET_LIQUIDITY_POSITIONS: &str = "getLiquidityPositions";
    pub const CREATE_LIQUIDITY_POSITION: &str = "createLiquidityPosition";
    pub const REMOVE_LIQUIDITY_POSITION: &str = "removeLiquidityPosition";

    /// Callable without an identity.
    pub const ANONYMOUS: &[&str] = &[GREET, GET_DEPOSIT_ADDRESS];
}

/// ICRC-1 ledger methods
pub mod ledger {
    pub const BALANCE_OF: &str = "icrc1_balance_of";
    pub const TRANSFER: &str = "icrc1_transfer";
}

/// Replica HTTP routes
pub mod api {
    pub const STATUS: &str = "/api/v2/status";
    pub const CANISTER_PREFIX: &str = "/api/v2/canister";
    pub const QUERY: &str = "query";
    pub const CALL: &str = "call";
}

/// Well-known canister ids
pub mod canisters {
    /// ckBTC ledger on mainnet.
    pub const CKBTC_LEDGER: &str = "mxzaz-hqaaa-aaaar-qaada-cai";
    /// ICP ledger on mainnet.
    pub const ICP_LEDGER: &str = "ryjl3-tyaaa-aaaaa-aaaba-cai";
    /// First canister id a local replica hands out. Development fallback only.
    pub const LOCAL_BACKEND_FALLBACK: &str = "bkyz2-fmaaa-aaaaa-qaaaq-cai";
}

/// Replica hosts
pub mod hosts {
    pub const MAINNET: &str = "https://icp0.io";
    pub const LOCAL: &str = "http://127.0.0.1:4943";
}
