use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use battle_engine::MoveAction;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::external::{CombatantResolver, CritRoll, RandomCrit, SettlementSubmitter, WalletProvider};
use crate::identity::{IdentityLink, IdentityLinkRegistry};
use crate::lobby::{LobbyStore, NftRef, VersionedLobby};
use crate::notify::{SessionNotifier, DEFAULT_CHANNEL_CAPACITY};
use crate::readiness::{self, GateDecision, PlayerFacts};
use crate::session::{BattleSession, MoveResult};
use crate::snapshot::SessionSnapshot;

/// Orchestrator tuning knobs.
pub struct SessionConfig {
    /// Per-room broadcast channel capacity.
    pub channel_capacity: usize,
    /// Critical-hit probability for the default roll source.
    pub crit_chance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            crit_chance: battle_engine::damage::CRIT_CHANCE,
        }
    }
}

/// The battle session orchestrator: the single consistent view of
/// lobby and battle state that two concurrent, untrusted clients
/// write against.
///
/// One instance per process, explicitly passed around — there is no
/// hidden global. Cloning is cheap and shares state. Each room is an
/// independent unit of concurrency: lobby writes are guarded by
/// per-record compare-and-swap, battle writes by turn ownership.
/// No external I/O ever happens while a state lock is held.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    lobbies: LobbyStore,
    identities: IdentityLinkRegistry,
    battles: RwLock<HashMap<String, BattleSession>>,
    notifier: SessionNotifier,
    resolver: Arc<dyn CombatantResolver>,
    settlement: Option<Arc<dyn SettlementSubmitter>>,
    crit: Arc<dyn CritRoll>,
}

impl Orchestrator {
    pub fn new(resolver: Arc<dyn CombatantResolver>) -> Self {
        let config = SessionConfig::default();
        let crit = Arc::new(RandomCrit::new(config.crit_chance));
        Self::with_options(resolver, None, crit, config)
    }

    pub fn with_options(
        resolver: Arc<dyn CombatantResolver>,
        settlement: Option<Arc<dyn SettlementSubmitter>>,
        crit: Arc<dyn CritRoll>,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                lobbies: LobbyStore::new(),
                identities: IdentityLinkRegistry::new(),
                battles: RwLock::new(HashMap::new()),
                notifier: SessionNotifier::new(config.channel_capacity),
                resolver,
                settlement,
                crit,
            }),
        }
    }

    // -----------------------------------------------------------------
    // Lobby lifecycle
    // -----------------------------------------------------------------

    pub fn create_lobby(
        &self,
        room_id: &str,
        creator_address: &str,
        nft: NftRef,
        is_private: bool,
        metadata: Option<serde_json::Value>,
    ) -> Result<SessionSnapshot> {
        self.inner
            .lobbies
            .create(room_id, creator_address, nft, is_private, metadata)?;
        info!(room_id, creator_address, is_private, "lobby created");
        self.publish(room_id)
    }

    /// Join as the second player. `expected_version` is the version
    /// from the joiner's last-read snapshot; a concurrent writer in
    /// between surfaces as `Conflict`.
    pub fn join_lobby(
        &self,
        room_id: &str,
        joiner_address: &str,
        nft: NftRef,
        expected_version: u64,
    ) -> Result<SessionSnapshot> {
        self.inner
            .lobbies
            .join(room_id, joiner_address, nft, expected_version)?;
        info!(room_id, joiner_address, "player joined lobby");
        self.publish(room_id)
    }

    pub fn set_ready(
        &self,
        room_id: &str,
        address: &str,
        ready: bool,
        expected_version: u64,
    ) -> Result<SessionSnapshot> {
        let v = self
            .inner
            .lobbies
            .set_ready(room_id, address, ready, expected_version)?;
        debug!(room_id, address, ready, status = ?v.lobby.status, "ready flag updated");
        self.publish(room_id)
    }

    pub fn list_open_lobbies(&self) -> Vec<VersionedLobby> {
        self.inner.lobbies.list_open()
    }

    // -----------------------------------------------------------------
    // Identity linking
    // -----------------------------------------------------------------

    /// Upsert the EVM-compatible address linked to a primary account.
    /// Rejected while the primary occupies a started lobby — the link
    /// a battle was entered with is frozen until it ends.
    pub fn link_identity(&self, primary_address: &str, linked_address: &str) -> Result<IdentityLink> {
        if self.inner.lobbies.occupies_started_lobby(primary_address) {
            return Err(SessionError::InvalidState(format!(
                "{primary_address} is in an active battle; relinking is frozen"
            )));
        }
        let link = self.inner.identities.link(primary_address, linked_address)?;
        debug!(primary_address, linked_address, "identity linked");
        Ok(link)
    }

    pub fn resolve_identity(&self, primary_address: &str) -> Option<String> {
        self.inner.identities.resolve(primary_address)
    }

    // -----------------------------------------------------------------
    // Readiness gate
    // -----------------------------------------------------------------

    /// Gather one player's environmental facts from their wallet and
    /// this orchestrator's identity registry.
    pub fn player_facts(&self, wallet: &dyn WalletProvider, primary_address: &str) -> PlayerFacts {
        readiness::gather_facts(wallet, &self.inner.identities, primary_address)
    }

    /// Combine eligibility (the gate) with intent (the lobby ready
    /// flags). `can_start` requires both for both players; the lobby
    /// flag alone is never trusted because a wallet can disconnect
    /// after the player toggled ready.
    pub fn readiness_decision(
        &self,
        room_id: &str,
        creator_facts: PlayerFacts,
        joiner_facts: PlayerFacts,
    ) -> Result<GateDecision> {
        let v = self
            .inner
            .lobbies
            .get(room_id)
            .ok_or_else(|| SessionError::NotFound(format!("room {room_id}")))?;
        let gate = readiness::evaluate(creator_facts, joiner_facts);
        let creator_ready = gate.creator_ready && v.lobby.creator_ready;
        let joiner_ready = gate.joiner_ready && v.lobby.joiner_ready;
        Ok(GateDecision {
            creator_ready,
            joiner_ready,
            can_start: creator_ready && joiner_ready,
        })
    }

    // -----------------------------------------------------------------
    // Battle lifecycle
    // -----------------------------------------------------------------

    /// Creator-only start. Combatant stats are resolved from NFT
    /// metadata before the lobby transition commits, so an unavailable
    /// resolver fails the start closed and leaves the lobby `Ready`.
    pub fn start_battle(
        &self,
        room_id: &str,
        by_address: &str,
        expected_version: u64,
    ) -> Result<SessionSnapshot> {
        let v = self
            .inner
            .lobbies
            .get(room_id)
            .ok_or_else(|| SessionError::NotFound(format!("room {room_id}")))?;
        if by_address != v.lobby.creator_address {
            return Err(SessionError::Forbidden(
                "only the creator can start the battle".into(),
            ));
        }
        let joiner_address = v.lobby.joiner_address.clone().ok_or_else(|| {
            SessionError::InvalidState(format!("room {room_id} has no second player"))
        })?;
        let joiner_nft = v.lobby.joiner_nft.clone().ok_or_else(|| {
            SessionError::InvalidState(format!("room {room_id} has no joiner NFT"))
        })?;

        // Chain reads happen before the state transition, never inside it.
        let creator_stats = self.inner.resolver.resolve_combatant_stats(&v.lobby.creator_nft)?;
        let joiner_stats = self.inner.resolver.resolve_combatant_stats(&joiner_nft)?;

        let v = self.inner.lobbies.start(room_id, by_address, expected_version)?;
        let session = BattleSession::start(
            &v.lobby.creator_address,
            creator_stats,
            &joiner_address,
            joiner_stats,
        );
        self.inner
            .battles
            .write()
            .expect("battle map lock poisoned")
            .insert(room_id.to_string(), session);

        info!(room_id, by_address, "battle started");
        self.publish(room_id)
    }

    /// Execute one move for `player`. Turn ownership is the guard
    /// here: only the active player's request can succeed, so no
    /// version token is needed. The critical roll happens before the
    /// state transition; settlement submission happens after it, on a
    /// background task, and never delays the next turn.
    pub fn submit_move(
        &self,
        room_id: &str,
        player: &str,
        action: MoveAction,
    ) -> Result<MoveResult> {
        if self.inner.lobbies.get(room_id).is_none() {
            return Err(SessionError::NotFound(format!("room {room_id}")));
        }

        let critical = self.inner.crit.roll();

        let (result, finished) = {
            let mut battles = self.inner.battles.write().expect("battle map lock poisoned");
            let session = battles.get_mut(room_id).ok_or_else(|| {
                SessionError::InvalidState(format!("room {room_id} has no battle in progress"))
            })?;
            let result = session.submit_move(player, action, critical)?;
            let finished = result.state.is_finished();
            (result, finished)
        };

        debug!(
            room_id,
            player,
            turn = result.record.turn_number,
            damage = ?result.record.damage,
            critical,
            "move executed"
        );

        if finished {
            self.inner.lobbies.mark_finished(room_id)?;
            info!(room_id, winner = ?result.state.winner(), "battle finished");
        }

        self.publish(room_id)?;
        self.spawn_settlement(room_id, &result);
        Ok(result)
    }

    /// Attach a settlement transaction hash to an already-executed
    /// move. Best-effort evidence; the move outcome stands regardless.
    pub fn attach_settlement(
        &self,
        room_id: &str,
        turn_number: u32,
        tx_hash: &str,
    ) -> Result<SessionSnapshot> {
        {
            let mut battles = self.inner.battles.write().expect("battle map lock poisoned");
            let session = battles.get_mut(room_id).ok_or_else(|| {
                SessionError::NotFound(format!("room {room_id} has no battle"))
            })?;
            session.attach_settlement(turn_number, tx_hash)?;
        }
        debug!(room_id, turn_number, tx_hash, "settlement attached");
        self.publish(room_id)
    }

    // -----------------------------------------------------------------
    // Snapshots and subscription
    // -----------------------------------------------------------------

    pub fn get_snapshot(&self, room_id: &str) -> Result<SessionSnapshot> {
        let v = self
            .inner
            .lobbies
            .get(room_id)
            .ok_or_else(|| SessionError::NotFound(format!("room {room_id}")))?;
        let battles = self.inner.battles.read().expect("battle map lock poisoned");
        let session = battles.get(room_id);
        Ok(SessionSnapshot {
            version: v.version,
            lobby: v.lobby,
            battle_state: session.map(|s| s.state().clone()),
            move_log: session.map(|s| s.log().all().to_vec()),
        })
    }

    /// Initial snapshot plus a live ordered stream of subsequent
    /// snapshots. The receiver is subscribed before the snapshot is
    /// taken, so no committed mutation can fall in the gap. Dropping
    /// the receiver unsubscribes.
    pub fn subscribe(
        &self,
        room_id: &str,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SessionSnapshot>)> {
        if self.inner.lobbies.get(room_id).is_none() {
            return Err(SessionError::NotFound(format!("room {room_id}")));
        }
        let rx = self.inner.notifier.subscribe(room_id);
        let snapshot = self.get_snapshot(room_id)?;
        Ok((snapshot, rx))
    }

    fn publish(&self, room_id: &str) -> Result<SessionSnapshot> {
        let snapshot = self.get_snapshot(room_id)?;
        self.inner.notifier.publish(room_id, snapshot.clone());
        Ok(snapshot)
    }

    /// Fire-and-forget settlement of an executed move. Runs on a
    /// blocking task so chain I/O stays out of every lock; a failure
    /// is logged and the move stands.
    fn spawn_settlement(&self, room_id: &str, result: &MoveResult) {
        let Some(submitter) = self.inner.settlement.clone() else {
            return;
        };
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(room_id, "no async runtime; settlement submission skipped");
                return;
            }
        };

        let orchestrator = self.clone();
        let room = room_id.to_string();
        let record = result.record.clone();
        handle.spawn(async move {
            let turn_number = record.turn_number;
            let submitted = tokio::task::spawn_blocking(move || {
                submitter.submit_move_transaction(&record)
            })
            .await;

            match submitted {
                Ok(Ok(tx_hash)) => {
                    if let Err(err) = orchestrator.attach_settlement(&room, turn_number, &tx_hash) {
                        warn!(room = %room, turn_number, %err, "settlement attach failed");
                    }
                }
                Ok(Err(err)) => {
                    warn!(room = %room, turn_number, %err, "settlement submission failed");
                }
                Err(err) => {
                    warn!(room = %room, turn_number, %err, "settlement task panicked");
                }
            }
        });
    }
}
