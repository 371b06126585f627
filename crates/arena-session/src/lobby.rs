use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Reference to the NFT a player fights with: collection + item id.
/// Immutable once set at create/join.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftRef {
    pub collection_id: String,
    pub item_id: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyStatus {
    Waiting,
    Ready,
    Started,
    Finished,
}

/// Lobby record. Owned exclusively by [`LobbyStore`]; callers only ever
/// see clones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lobby {
    pub room_id: String,
    pub creator_address: String,
    pub joiner_address: Option<String>,
    pub creator_nft: NftRef,
    pub joiner_nft: Option<NftRef>,
    pub status: LobbyStatus,
    pub is_private: bool,
    pub creator_ready: bool,
    pub joiner_ready: bool,
    pub created_at_ms: u64,
    /// Opaque display metadata the core stores but never interprets.
    pub metadata: Option<serde_json::Value>,
}

impl Lobby {
    pub fn is_full(&self) -> bool {
        self.joiner_address.is_some()
    }

    /// Ready iff two occupants and both intent flags set.
    fn recompute_status(&mut self) {
        if matches!(self.status, LobbyStatus::Started | LobbyStatus::Finished) {
            return;
        }
        self.status = if self.is_full() && self.creator_ready && self.joiner_ready {
            LobbyStatus::Ready
        } else {
            LobbyStatus::Waiting
        };
    }
}

/// A lobby snapshot together with the store version it was read at.
/// The version is the compare-and-swap token for every mutating call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedLobby {
    pub version: u64,
    pub lobby: Lobby,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// In-memory lobby store with per-room optimistic concurrency.
///
/// Every mutating operation except `create` takes the version the
/// caller last read; a stale version returns `Conflict` and the caller
/// re-reads and retries. Rooms are independent units of concurrency —
/// the single map lock is held only for the duration of one record
/// update, never across external I/O.
pub struct LobbyStore {
    rooms: RwLock<HashMap<String, VersionedLobby>>,
}

impl Default for LobbyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LobbyStore {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(
        &self,
        room_id: &str,
        creator_address: &str,
        nft: NftRef,
        is_private: bool,
        metadata: Option<serde_json::Value>,
    ) -> Result<VersionedLobby> {
        if room_id.is_empty() {
            return Err(SessionError::Invalid("room id must not be empty".into()));
        }
        if creator_address.is_empty() {
            return Err(SessionError::Invalid("creator address must not be empty".into()));
        }

        let mut rooms = self.rooms.write().expect("lobby store lock poisoned");
        if rooms.contains_key(room_id) {
            return Err(SessionError::Conflict(format!("room {room_id} already exists")));
        }

        let entry = VersionedLobby {
            version: 1,
            lobby: Lobby {
                room_id: room_id.to_string(),
                creator_address: creator_address.to_string(),
                joiner_address: None,
                creator_nft: nft,
                joiner_nft: None,
                status: LobbyStatus::Waiting,
                is_private,
                creator_ready: false,
                joiner_ready: false,
                created_at_ms: now_ms(),
                metadata,
            },
        };
        rooms.insert(room_id.to_string(), entry.clone());
        Ok(entry)
    }

    pub fn get(&self, room_id: &str) -> Option<VersionedLobby> {
        self.rooms
            .read()
            .expect("lobby store lock poisoned")
            .get(room_id)
            .cloned()
    }

    /// Non-private lobbies still waiting for a second player.
    pub fn list_open(&self) -> Vec<VersionedLobby> {
        let mut open: Vec<VersionedLobby> = self
            .rooms
            .read()
            .expect("lobby store lock poisoned")
            .values()
            .filter(|v| !v.lobby.is_private && !v.lobby.is_full())
            .filter(|v| v.lobby.status == LobbyStatus::Waiting)
            .cloned()
            .collect();
        open.sort_by_key(|v| v.lobby.created_at_ms);
        open
    }

    pub fn join(
        &self,
        room_id: &str,
        joiner_address: &str,
        nft: NftRef,
        expected_version: u64,
    ) -> Result<VersionedLobby> {
        self.update(room_id, expected_version, |lobby| {
            if lobby.is_full() {
                return Err(SessionError::Conflict(format!("room {room_id} is full")));
            }
            if joiner_address == lobby.creator_address {
                return Err(SessionError::Conflict(
                    "joiner must differ from creator".into(),
                ));
            }
            lobby.joiner_address = Some(joiner_address.to_string());
            lobby.joiner_nft = Some(nft.clone());
            Ok(())
        })
    }

    /// Set the intent flag for whichever occupant `address` resolves
    /// to, then recompute status. Idempotent for a repeated value.
    pub fn set_ready(
        &self,
        room_id: &str,
        address: &str,
        ready: bool,
        expected_version: u64,
    ) -> Result<VersionedLobby> {
        self.update(room_id, expected_version, |lobby| {
            if matches!(lobby.status, LobbyStatus::Started | LobbyStatus::Finished) {
                return Err(SessionError::InvalidState(format!(
                    "room {room_id} is no longer in the lobby phase"
                )));
            }
            if address == lobby.creator_address {
                lobby.creator_ready = ready;
            } else if lobby.joiner_address.as_deref() == Some(address) {
                lobby.joiner_ready = ready;
            } else {
                return Err(SessionError::Forbidden(format!(
                    "{address} is not an occupant of room {room_id}"
                )));
            }
            lobby.recompute_status();
            Ok(())
        })
    }

    /// Creator-only transition from `Ready` to `Started`.
    pub fn start(
        &self,
        room_id: &str,
        by_address: &str,
        expected_version: u64,
    ) -> Result<VersionedLobby> {
        self.update(room_id, expected_version, |lobby| {
            if by_address != lobby.creator_address {
                return Err(SessionError::Forbidden(
                    "only the creator can start the battle".into(),
                ));
            }
            if lobby.status != LobbyStatus::Ready {
                return Err(SessionError::InvalidState(format!(
                    "room {room_id} is not ready to start"
                )));
            }
            lobby.status = LobbyStatus::Started;
            Ok(())
        })
    }

    /// Terminal transition driven by the battle machine when a battle
    /// concludes. Not version-checked: the machine is the only writer
    /// of this transition and `Finished` is irreversible.
    pub fn mark_finished(&self, room_id: &str) -> Result<VersionedLobby> {
        let mut rooms = self.rooms.write().expect("lobby store lock poisoned");
        let entry = rooms
            .get_mut(room_id)
            .ok_or_else(|| SessionError::NotFound(format!("room {room_id}")))?;
        if entry.lobby.status != LobbyStatus::Started {
            return Err(SessionError::InvalidState(format!(
                "room {room_id} has no battle in progress"
            )));
        }
        entry.lobby.status = LobbyStatus::Finished;
        entry.version += 1;
        Ok(entry.clone())
    }

    /// True if `address` occupies any lobby whose battle has started.
    /// Used to freeze identity links mid-battle.
    pub fn occupies_started_lobby(&self, address: &str) -> bool {
        self.rooms
            .read()
            .expect("lobby store lock poisoned")
            .values()
            .any(|v| {
                v.lobby.status == LobbyStatus::Started
                    && (v.lobby.creator_address == address
                        || v.lobby.joiner_address.as_deref() == Some(address))
            })
    }

    /// Compare-and-swap update: applies `f` only when the stored
    /// version matches, bumping the version on success.
    fn update<F>(&self, room_id: &str, expected_version: u64, f: F) -> Result<VersionedLobby>
    where
        F: FnOnce(&mut Lobby) -> Result<()>,
    {
        let mut rooms = self.rooms.write().expect("lobby store lock poisoned");
        let entry = rooms
            .get_mut(room_id)
            .ok_or_else(|| SessionError::NotFound(format!("room {room_id}")))?;
        if entry.version != expected_version {
            return Err(SessionError::Conflict(format!(
                "room {room_id} version {} does not match expected {expected_version}",
                entry.version
            )));
        }
        f(&mut entry.lobby)?;
        entry.version += 1;
        Ok(entry.clone())
    }
}
