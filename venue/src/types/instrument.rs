use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How one contract of a perpetual is denominated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContractKind {
    /// One contract is one unit of quote currency; margin and PnL are in the
    /// base coin (e.g. BTCUSD).
    Inverse,
    /// One contract is `contract_size` units of the base coin; margin and PnL
    /// are in the quote currency (e.g. BTCUSDT).
    #[serde(rename_all = "camelCase")]
    Linear { contract_size: Decimal },
}

/// Trading rules for a single market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentInfo {
    pub symbol: String,
    pub tick_size: Decimal,
    pub contract: ContractKind,
}
