//! End to end calculator tests.
//!
//! Each test starts its own devnet, so chain state and request counters never leak between
//! tests:
//!   - read-only operations answered by a single call
//!   - square roots through submit, receipt and simulation, including the hash fallback
//!   - session bookkeeping: connection, busy flag, result/error slot, events
//!   - contract-side arithmetic rules surfaced as operation errors

use abacus_client::{Calculator, ClientConfig};
use abacus_devnet::Devnet;
use color_eyre::Result;
use std::sync::Arc;

mod contract_rules;
mod read_only;
mod session;
mod square_root;

/// `2^256 - 1` in decimal.
pub const U256_MAX_DECIMAL: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

/// A devnet and a calculator bound to its wallet.
pub struct Harness {
    pub devnet: Devnet,
    pub calculator: Arc<Calculator>,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Builds a harness around `devnet` with `config`.
pub fn harness_with(devnet: Devnet, config: ClientConfig) -> Result<Harness> {
    init_tracing();
    let config = ClientConfig {
        contract_address: devnet.contract_address().to_string(),
        ..config
    };
    let calculator = Calculator::new(Some(devnet.wallet()), &config)?;
    Ok(Harness {
        devnet,
        calculator: Arc::new(calculator),
    })
}

/// A single-account devnet, not yet connected.
pub fn harness() -> Result<Harness> {
    harness_with(Devnet::start()?, ClientConfig::default())
}

/// A single-account devnet with the wallet connected.
pub async fn connected() -> Result<Harness> {
    let harness = harness()?;
    harness.calculator.connect().await?;
    Ok(harness)
}

/// Yields until the calculator reports an operation in flight.
pub async fn wait_until_busy(calculator: &Calculator) {
    while !calculator.is_busy() {
        tokio::task::yield_now().await;
    }
}
