//! Bond purchase and redemption
//!
//! Both go through the gas planner; nothing is broadcast unless the
//! estimate for the exact call succeeds.

use evm_node_client::bindings::ITreasury;
use evm_node_client::{ContractRegistry, GasPlanner, SubmittedTx};
use fbcash_core::{Amount, Error, ProtocolError, PROTOCOL_DECIMALS};

use crate::constants::contracts;

/// Buy bonds with `amount` of cash.
///
/// The treasury's current bond-oracle price is passed as the expected
/// price so the purchase reverts if the price moves before inclusion.
pub async fn buy_bonds(
    registry: &ContractRegistry,
    planner: &GasPlanner,
    amount: Amount,
) -> Result<SubmittedTx, Error> {
    check_protocol_amount(&amount)?;
    let treasury = registry.contract(contracts::TREASURY)?;
    let target_price = treasury
        .view(&ITreasury::getBondOraclePriceCall {})
        .await?
        .price;

    tracing::debug!(
        "Buying bonds with {} FBC at target price {}",
        amount,
        Amount::new(target_price, PROTOCOL_DECIMALS)
    );
    planner
        .submit(
            treasury,
            &ITreasury::buyBondsCall {
                amount: amount.raw(),
                targetPrice: target_price,
            },
        )
        .await
}

/// Redeem `amount` of bonds for cash
pub async fn redeem_bonds(
    registry: &ContractRegistry,
    planner: &GasPlanner,
    amount: Amount,
) -> Result<SubmittedTx, Error> {
    check_protocol_amount(&amount)?;
    let treasury = registry.contract(contracts::TREASURY)?;
    planner
        .submit(
            treasury,
            &ITreasury::redeemBondsCall {
                amount: amount.raw(),
            },
        )
        .await
}

fn check_protocol_amount(amount: &Amount) -> Result<(), ProtocolError> {
    if amount.decimals() != PROTOCOL_DECIMALS {
        return Err(ProtocolError::InvalidAmount {
            message: format!(
                "expected {} decimals, got {}",
                PROTOCOL_DECIMALS,
                amount.decimals()
            ),
        });
    }
    Ok(())
}
