//! Wallet session state
//!
//! The registry and the session describing who it is bound to are swapped
//! together as one immutable snapshot. Each unlock or disconnect starts a
//! new generation; work started under an older generation can finish but
//! cannot commit into the current one.

use std::sync::Arc;

use alloy::primitives::Address;
use boardroom::ResolutionState;
use evm_node_client::{ContractRegistry, Signer};
use fbcash_core::BoardroomVersion;
use tokio::sync::RwLock;

/// Who the client acts for
#[derive(Debug, Clone)]
pub struct Session {
    pub signer: Option<Signer>,
    pub resolution: ResolutionState,
    pub generation: u64,
}

impl Session {
    pub fn locked(generation: u64) -> Self {
        Self {
            signer: None,
            resolution: ResolutionState::Unresolved,
            generation,
        }
    }

    pub fn unlocked(signer: Signer, generation: u64) -> Self {
        Self {
            signer: Some(signer),
            resolution: ResolutionState::Unresolved,
            generation,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.signer.as_ref().map(Signer::account)
    }

    pub fn is_unlocked(&self) -> bool {
        self.signer.is_some()
    }
}

/// Registry and session as of one point in time
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub registry: ContractRegistry,
    pub session: Session,
}

/// The current snapshot. Generations only grow: each install takes the
/// next one under the same write lock that swaps the snapshot in.
pub struct SessionState {
    current: RwLock<Arc<Snapshot>>,
}

impl SessionState {
    pub fn new(registry: ContractRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot {
                registry,
                session: Session::locked(0),
            })),
        }
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Build the next snapshot from the current one and install it.
    ///
    /// `build` gets the current snapshot and the generation the new one
    /// must carry.
    pub async fn install<F>(&self, build: F) -> Arc<Snapshot>
    where
        F: FnOnce(&Snapshot, u64) -> Snapshot,
    {
        let mut current = self.current.write().await;
        let generation = current.session.generation + 1;
        let mut next = build(&current, generation);
        next.session.generation = generation;

        let next = Arc::new(next);
        *current = next.clone();
        next
    }

    /// Record `version` if `generation` is still current. Returns whether
    /// it was committed.
    pub async fn commit_resolution(&self, generation: u64, version: BoardroomVersion) -> bool {
        let mut current = self.current.write().await;
        if current.session.generation != generation {
            tracing::debug!(
                "Dropping boardroom resolution of generation {} (current is {})",
                generation,
                current.session.generation
            );
            return false;
        }

        let mut next = Snapshot::clone(&current);
        next.session.resolution = ResolutionState::Resolved(version);
        *current = Arc::new(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use evm_node_client::mock::MockTransport;
    use evm_node_client::Binding;
    use fbcash_core::ClientConfig;

    const ALICE: Address = address!("000000000000000000000000000000000000a11c");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");

    async fn unlock(state: &SessionState, account: Address) -> u64 {
        let signer = Signer::new(account, MockTransport::new());
        let snapshot = state
            .install(|current, generation| {
                let mut registry = current.registry.clone();
                registry.connect(Binding::Signer(signer.clone()));
                Snapshot {
                    registry,
                    session: Session::unlocked(signer, generation),
                }
            })
            .await;
        snapshot.session.generation
    }

    #[tokio::test]
    async fn test_last_unlock_wins() {
        let registry = ContractRegistry::from_config(&ClientConfig::default(), MockTransport::new());
        let state = SessionState::new(registry);

        let first = unlock(&state, ALICE).await;
        let second = unlock(&state, BOB).await;

        // ALICE's resolution finishes late
        assert!(!state.commit_resolution(first, BoardroomVersion::V1).await);
        assert!(state.commit_resolution(second, BoardroomVersion::Latest).await);

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.session.account(), Some(BOB));
        assert_eq!(snapshot.registry.account(), Some(BOB));
        assert_eq!(
            snapshot.session.resolution,
            ResolutionState::Resolved(BoardroomVersion::Latest)
        );
    }

    #[tokio::test]
    async fn test_readers_keep_their_snapshot() {
        let registry = ContractRegistry::from_config(&ClientConfig::default(), MockTransport::new());
        let state = SessionState::new(registry);

        let before = state.snapshot().await;
        unlock(&state, ALICE).await;

        assert!(!before.session.is_unlocked());
        assert!(state.snapshot().await.session.is_unlocked());
    }

    #[tokio::test]
    async fn test_generations_grow_with_installs() {
        let registry = ContractRegistry::from_config(&ClientConfig::default(), MockTransport::new());
        let state = SessionState::new(registry);

        assert_eq!(unlock(&state, ALICE).await, 1);
        assert_eq!(unlock(&state, BOB).await, 2);

        // a builder cannot smuggle in an older generation
        let snapshot = state
            .install(|current, _| Snapshot {
                registry: current.registry.clone(),
                session: Session::locked(1),
            })
            .await;
        assert_eq!(snapshot.session.generation, 3);
        assert!(!state.commit_resolution(2, BoardroomVersion::Latest).await);
    }
}
