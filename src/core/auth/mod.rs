use serde::{Deserialize, Serialize};
use uuid::Uuid;

const OFFLINE_ACCESS_TOKEN: &str = "offline_access_token";

/// Identity handed to the game. Obtaining real tokens is up to the caller;
/// the engine only substitutes these values into launch arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    /// Dashless or dashed UUID string, passed through verbatim.
    pub uuid: String,
    pub access_token: String,
}

impl Session {
    pub fn new(
        username: impl Into<String>,
        uuid: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            uuid: uuid.into(),
            access_token: access_token.into(),
        }
    }

    /// An offline session. The UUID is derived from the name so the same
    /// player keeps the same world data across launches.
    pub fn offline(username: &str) -> Self {
        let username = match username.trim() {
            "" => "Player",
            name => name,
        };
        let uuid = Uuid::new_v3(
            &Uuid::NAMESPACE_OID,
            format!("OfflinePlayer:{username}").as_bytes(),
        );
        Self {
            username: username.to_string(),
            uuid: uuid.simple().to_string(),
            access_token: OFFLINE_ACCESS_TOKEN.to_string(),
        }
    }

    /// `msa` for real accounts, `legacy` for offline ones.
    pub fn user_type(&self) -> &'static str {
        if self.access_token == OFFLINE_ACCESS_TOKEN {
            "legacy"
        } else {
            "msa"
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::offline("Player")
    }
}
