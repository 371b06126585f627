//! Battle session orchestrator.
//!
//! Coordinates two independently connected wallet-holding clients
//! through one shared session record: lobby lifecycle, dual-identity
//! linking, readiness negotiation, the turn-based battle driven by
//! [`battle_engine`], and push-based snapshot fan-out. Combat outcomes
//! are orchestrator-authoritative; on-chain transaction hashes are
//! attached to moves as evidence, never awaited.

pub mod error;
pub mod external;
pub mod identity;
pub mod lobby;
pub mod movelog;
pub mod notify;
pub mod orchestrator;
pub mod readiness;
pub mod session;
pub mod snapshot;

pub use error::{Result, SessionError};
pub use external::{CombatantResolver, CritRoll, RandomCrit, SettlementSubmitter, WalletProvider};
pub use identity::{IdentityLink, IdentityLinkRegistry};
pub use lobby::{Lobby, LobbyStatus, LobbyStore, NftRef, VersionedLobby};
pub use movelog::{MoveLog, MoveRecord};
pub use notify::SessionNotifier;
pub use orchestrator::{Orchestrator, SessionConfig};
pub use readiness::{evaluate, gather_facts, GateDecision, PlayerFacts};
pub use session::{BattleSession, MoveResult};
pub use snapshot::SessionSnapshot;
