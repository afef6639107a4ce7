//! ERC-20 token handle

use alloy::primitives::{Address, U256};
use fbcash_core::{Amount, Error};

use crate::bindings::IERC20;
use crate::gas::{GasPlanner, SubmittedTx};
use crate::registry::{Binding, ContractHandle};
use crate::Result;

/// A fungible token with a fixed decimal count
#[derive(Clone, Debug)]
pub struct TokenHandle {
    symbol: String,
    decimals: u8,
    contract: ContractHandle,
}

impl TokenHandle {
    pub fn new(symbol: impl Into<String>, decimals: u8, contract: ContractHandle) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            contract,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub fn contract(&self) -> &ContractHandle {
        &self.contract
    }

    pub(crate) fn rebind(&mut self, binding: Binding) {
        self.contract.rebind(binding);
    }

    /// Wrap a base-unit value in this token's decimals
    pub fn amount(&self, raw: U256) -> Amount {
        Amount::new(raw, self.decimals)
    }

    pub async fn balance_of(&self, account: Address) -> Result<Amount> {
        let ret = self.contract.view(&IERC20::balanceOfCall { account }).await?;
        Ok(self.amount(ret.balance))
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<Amount> {
        let ret = self
            .contract
            .view(&IERC20::allowanceCall { owner, spender })
            .await?;
        Ok(self.amount(ret.remaining))
    }

    pub async fn total_supply(&self) -> Result<Amount> {
        let ret = self.contract.view(&IERC20::totalSupplyCall {}).await?;
        Ok(self.amount(ret.supply))
    }

    /// Total supply as an exact decimal string
    pub async fn displayed_total_supply(&self) -> Result<String> {
        Ok(self.total_supply().await?.to_decimal_string())
    }

    /// Approve `spender` for exactly `amount` base units. Unlimited
    /// approval is `U256::MAX`, passed explicitly by the caller.
    pub async fn approve(
        &self,
        planner: &GasPlanner,
        spender: Address,
        amount: U256,
    ) -> std::result::Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IERC20::approveCall { spender, amount })
            .await
    }
}
