use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Link from a native-chain account to its EVM-compatible account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityLink {
    pub primary_address: String,
    pub linked_address: String,
    pub linked_at_ms: u64,
}

/// `0x` followed by exactly 40 hex characters.
pub fn is_evm_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// At most one active link per primary address. Linking is an upsert;
/// revocation is out of scope. Mid-battle freezing is enforced one
/// level up by the orchestrator, which knows which lobbies started.
pub struct IdentityLinkRegistry {
    links: RwLock<HashMap<String, IdentityLink>>,
}

impl Default for IdentityLinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityLinkRegistry {
    pub fn new() -> Self {
        Self {
            links: RwLock::new(HashMap::new()),
        }
    }

    pub fn link(&self, primary_address: &str, linked_address: &str) -> Result<IdentityLink> {
        if primary_address.is_empty() {
            return Err(SessionError::Invalid("primary address must not be empty".into()));
        }
        if !is_evm_address(linked_address) {
            return Err(SessionError::Invalid(format!(
                "{linked_address} is not a valid EVM address"
            )));
        }

        let link = IdentityLink {
            primary_address: primary_address.to_string(),
            linked_address: linked_address.to_string(),
            linked_at_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        };
        self.links
            .write()
            .expect("identity registry lock poisoned")
            .insert(primary_address.to_string(), link.clone());
        Ok(link)
    }

    pub fn resolve(&self, primary_address: &str) -> Option<String> {
        self.links
            .read()
            .expect("identity registry lock poisoned")
            .get(primary_address)
            .map(|l| l.linked_address.clone())
    }
}
