//! Contract handles and the registry that owns them
//!
//! Handles are created once from the deployment descriptor. Unlocking a
//! wallet rebinds every handle to the signer; addresses and interfaces
//! never change after construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::sol_types::SolCall;
use fbcash_core::{ClientConfig, NodeError, ProtocolError, PROTOCOL_DECIMALS};

use crate::token::TokenHandle;
use crate::transport::{CallRequest, ChainTransport};
use crate::Result;

/// Protocol tokens: (symbol, deployment entry)
pub const PROTOCOL_TOKENS: [(&str, &str); 4] = [
    ("FBC", "Cash"),
    ("FBS", "Share"),
    ("FBB", "Bond"),
    ("FBG", "FBG"),
];

/// An account able to sign, together with the transport that signs for it
#[derive(Clone)]
pub struct Signer {
    account: Address,
    transport: Arc<dyn ChainTransport>,
}

impl Signer {
    pub fn new(account: Address, transport: Arc<dyn ChainTransport>) -> Self {
        Self { account, transport }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn transport(&self) -> &Arc<dyn ChainTransport> {
        &self.transport
    }

    /// Same account behind the same transport instance
    pub fn same_as(&self, other: &Signer) -> bool {
        self.account == other.account && same_transport(&self.transport, &other.transport)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// What a handle is currently bound to
#[derive(Clone)]
pub enum Binding {
    /// Read-only access
    Provider(Arc<dyn ChainTransport>),
    /// Read and submit as the signer's account
    Signer(Signer),
}

impl Binding {
    pub fn transport(&self) -> &Arc<dyn ChainTransport> {
        match self {
            Self::Provider(transport) => transport,
            Self::Signer(signer) => signer.transport(),
        }
    }

    pub fn signer(&self) -> Option<&Signer> {
        match self {
            Self::Provider(_) => None,
            Self::Signer(signer) => Some(signer),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.signer().map(Signer::account)
    }

    pub fn same_as(&self, other: &Binding) -> bool {
        match (self, other) {
            (Self::Provider(a), Self::Provider(b)) => same_transport(a, b),
            (Self::Signer(a), Self::Signer(b)) => a.same_as(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(_) => write!(f, "Provider"),
            Self::Signer(signer) => write!(f, "Signer({})", signer.account),
        }
    }
}

fn same_transport(a: &Arc<dyn ChainTransport>, b: &Arc<dyn ChainTransport>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// One deployed contract
#[derive(Clone, Debug)]
pub struct ContractHandle {
    name: String,
    address: Address,
    abi: Arc<serde_json::Value>,
    binding: Binding,
}

impl ContractHandle {
    pub fn new(
        name: impl Into<String>,
        address: Address,
        abi: Arc<serde_json::Value>,
        binding: Binding,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            abi,
            binding,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// ABI JSON from the deployment descriptor (`Null` if none was shipped)
    pub fn abi(&self) -> &serde_json::Value {
        &self.abi
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub(crate) fn rebind(&mut self, binding: Binding) {
        self.binding = binding;
    }

    /// Build the wire request for `call`, sent from the bound account if any
    pub fn request<C: SolCall>(&self, call: &C) -> CallRequest {
        CallRequest::new(self.address, call.abi_encode()).from_account(self.binding.account())
    }

    /// Label used in logs and errors, e.g. `Treasury.getPeriod()`
    pub fn method_label<C: SolCall>(&self) -> String {
        format!("{}.{}", self.name, C::SIGNATURE)
    }

    /// Execute a read-only call and decode its return values
    pub async fn view<C: SolCall>(&self, call: &C) -> Result<C::Return> {
        let request = self.request(call);
        let data = self
            .binding
            .transport()
            .call(&request)
            .await
            .map_err(|e| label_revert(e, self.method_label::<C>()))?;

        C::abi_decode_returns(&data, true).map_err(|e| {
            NodeError::ParseError(format!("{}: {}", self.method_label::<C>(), e))
        })
    }
}

fn label_revert(err: NodeError, method: String) -> NodeError {
    match err {
        NodeError::CallReverted { reason, .. } => NodeError::CallReverted { method, reason },
        other => other,
    }
}

/// All contract and token handles of one deployment
#[derive(Clone, Debug)]
pub struct ContractRegistry {
    contracts: HashMap<String, ContractHandle>,
    tokens: HashMap<String, TokenHandle>,
    binding: Binding,
}

impl ContractRegistry {
    /// Build provider-bound handles for every deployment and token entry
    pub fn from_config(config: &ClientConfig, provider: Arc<dyn ChainTransport>) -> Self {
        let binding = Binding::Provider(provider);

        let contracts: HashMap<String, ContractHandle> = config
            .deployments
            .iter()
            .map(|(name, deployment)| {
                let handle = ContractHandle::new(
                    name.clone(),
                    deployment.address,
                    Arc::new(deployment.abi.clone()),
                    binding.clone(),
                );
                (name.clone(), handle)
            })
            .collect();

        let mut tokens = HashMap::new();
        for (symbol, token) in &config.external_tokens {
            let handle = ContractHandle::new(
                symbol.clone(),
                token.address(),
                Arc::new(serde_json::Value::Null),
                binding.clone(),
            );
            tokens.insert(
                symbol.clone(),
                TokenHandle::new(symbol.clone(), token.decimals(), handle),
            );
        }
        for (symbol, deployment_name) in PROTOCOL_TOKENS {
            match contracts.get(deployment_name) {
                Some(handle) => {
                    tokens.insert(
                        symbol.to_string(),
                        TokenHandle::new(symbol, PROTOCOL_DECIMALS, handle.clone()),
                    );
                }
                None => tracing::debug!(
                    "No {} deployment; {} token handle not created",
                    deployment_name,
                    symbol
                ),
            }
        }

        Self {
            contracts,
            tokens,
            binding,
        }
    }

    pub fn contract(&self, name: &str) -> std::result::Result<&ContractHandle, ProtocolError> {
        self.contracts
            .get(name)
            .ok_or_else(|| ProtocolError::UnknownContract {
                name: name.to_string(),
            })
    }

    pub fn token(&self, symbol: &str) -> std::result::Result<&TokenHandle, ProtocolError> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| ProtocolError::UnknownToken {
                symbol: symbol.to_string(),
            })
    }

    pub fn contract_names(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Account of the bound signer, if unlocked
    pub fn account(&self) -> Option<Address> {
        self.binding.account()
    }

    /// Handle for a contract outside the descriptor (e.g. a derived pair),
    /// bound like everything else.
    pub fn handle_at(&self, name: impl Into<String>, address: Address) -> ContractHandle {
        ContractHandle::new(
            name,
            address,
            Arc::new(serde_json::Value::Null),
            self.binding.clone(),
        )
    }

    /// Rebind every handle. Returns false when already bound to `binding`.
    pub fn connect(&mut self, binding: Binding) -> bool {
        if self.binding.same_as(&binding) {
            return false;
        }

        for handle in self.contracts.values_mut() {
            handle.rebind(binding.clone());
        }
        for token in self.tokens.values_mut() {
            token.rebind(binding.clone());
        }
        tracing::debug!(
            "Rebound {} contracts and {} tokens to {:?}",
            self.contracts.len(),
            self.tokens.len(),
            binding
        );
        self.binding = binding;
        true
    }

    /// Drop the signer and go back to read-only access through `provider`
    pub fn disconnect(&mut self, provider: Arc<dyn ChainTransport>) -> bool {
        self.connect(Binding::Provider(provider))
    }
}
