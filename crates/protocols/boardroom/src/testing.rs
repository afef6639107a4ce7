//! Shared fixtures for boardroom tests

use std::sync::Arc;

use alloy::primitives::{address, Address};
use evm_node_client::mock::MockTransport;
use evm_node_client::{Binding, ContractRegistry, Signer};
use fbcash_core::{ClientConfig, Deployment};

pub const BOARDROOM1: Address = address!("00000000000000000000000000000000000000b1");
pub const BOARDROOM2: Address = address!("00000000000000000000000000000000000000b2");
pub const BOARDROOM3: Address = address!("00000000000000000000000000000000000000b3");
pub const ALICE: Address = address!("000000000000000000000000000000000000a11c");

pub fn registry(mock: &Arc<MockTransport>, signed: bool) -> ContractRegistry {
    let mut config = ClientConfig::default();
    for (name, address) in [
        ("Boardroom1", BOARDROOM1),
        ("Boardroom2", BOARDROOM2),
        ("Boardroom3", BOARDROOM3),
    ] {
        config.deployments.insert(
            name.to_string(),
            Deployment {
                address,
                abi: serde_json::Value::Null,
            },
        );
    }
    let mut registry = ContractRegistry::from_config(&config, mock.clone());
    if signed {
        registry.connect(Binding::Signer(Signer::new(ALICE, mock.clone())));
    }
    registry
}
