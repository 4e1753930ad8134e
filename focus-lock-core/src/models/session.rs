use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of an established capture session.
///
/// Owned by the session host; the controller only holds a copy while the
/// session is usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
