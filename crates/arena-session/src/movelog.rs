use battle_engine::MoveAction;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// One executed move. Immutable once appended, except for the
/// settlement reference which arrives asynchronously.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub turn_number: u32,
    pub player: String,
    pub action: MoveAction,
    /// Present only for damaging actions.
    pub damage: Option<u32>,
    pub was_critical: Option<bool>,
    /// Settlement transaction hash, attached best-effort after the
    /// move was already applied. Evidentiary, never authoritative.
    pub tx_hash: Option<String>,
}

/// Append-only move log, totally ordered by turn then insertion.
/// Growth is bounded: HP and minimum damage make every battle finite.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MoveLog {
    entries: Vec<MoveRecord>,
}

impl MoveLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: MoveRecord) {
        debug_assert!(
            self.entries
                .last()
                .map(|e| e.turn_number <= record.turn_number)
                .unwrap_or(true),
            "move log turn order violated"
        );
        self.entries.push(record);
    }

    pub fn all(&self) -> &[MoveRecord] {
        &self.entries
    }

    pub fn slice(&self, last_n: usize) -> &[MoveRecord] {
        let start = self.entries.len().saturating_sub(last_n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attach a settlement reference to the move executed on
    /// `turn_number`. Fails `NotFound` for an unknown turn and
    /// `Conflict` if a hash is already attached.
    pub fn attach_settlement(&mut self, turn_number: u32, tx_hash: &str) -> Result<&MoveRecord> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.turn_number == turn_number)
            .ok_or_else(|| SessionError::NotFound(format!("no move for turn {turn_number}")))?;
        if entry.tx_hash.is_some() {
            return Err(SessionError::Conflict(format!(
                "turn {turn_number} already has a settlement reference"
            )));
        }
        entry.tx_hash = Some(tx_hash.to_string());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(turn: u32, player: &str) -> MoveRecord {
        MoveRecord {
            turn_number: turn,
            player: player.to_string(),
            action: MoveAction::Strike,
            damage: Some(20),
            was_critical: Some(false),
            tx_hash: None,
        }
    }

    #[test]
    fn append_preserves_order() {
        let mut log = MoveLog::new();
        for turn in 1..=5 {
            log.append(record(turn, if turn % 2 == 1 { "a" } else { "b" }));
        }
        assert_eq!(log.len(), 5);
        let turns: Vec<u32> = log.all().iter().map(|e| e.turn_number).collect();
        assert_eq!(turns, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn slice_returns_last_n() {
        let mut log = MoveLog::new();
        for turn in 1..=5 {
            log.append(record(turn, "a"));
        }
        let tail = log.slice(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].turn_number, 4);
        assert_eq!(tail[1].turn_number, 5);

        // asking for more than exists returns everything
        assert_eq!(log.slice(100).len(), 5);
        assert!(log.slice(0).is_empty());
    }

    #[test]
    fn attach_settlement_once() {
        let mut log = MoveLog::new();
        log.append(record(1, "a"));

        let entry = log.attach_settlement(1, "0xdeadbeef").unwrap();
        assert_eq!(entry.tx_hash.as_deref(), Some("0xdeadbeef"));

        let err = log.attach_settlement(1, "0xcafe").unwrap_err();
        assert!(matches!(err, SessionError::Conflict(_)));
        // first hash survives
        assert_eq!(log.all()[0].tx_hash.as_deref(), Some("0xdeadbeef"));
    }

    #[test]
    fn attach_settlement_unknown_turn() {
        let mut log = MoveLog::new();
        log.append(record(1, "a"));
        let err = log.attach_settlement(7, "0xdead").unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }
}
