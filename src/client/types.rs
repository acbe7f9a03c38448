/**
 * Client Types
 *
 * Session information supplied by the authentication layer. The sync
 * coordinator only needs to know whether the active user operates the
 * point of sale; everything else about authentication lives outside the core.
 */
use serde::{Deserialize, Serialize};

/// Role of the signed-in user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(alias = "cajero")]
    Cashier,
    Viewer,
}

impl Role {
    /// Whether this role records sales at the point of sale
    pub fn can_sell(&self) -> bool {
        matches!(self, Role::Admin | Role::Cashier)
    }
}

/// Active user session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    #[serde(alias = "rol")]
    pub role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// Whether this session needs the catalog cached for offline selling
    pub fn is_pos_operator(&self) -> bool {
        self.role.can_sell()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Admin.can_sell());
        assert!(Role::Cashier.can_sell());
        assert!(!Role::Viewer.can_sell());
    }

    #[test]
    fn test_session_from_server_json() {
        let session: Session =
            serde_json::from_str(r#"{"username": "cajero", "rol": "cajero"}"#).unwrap();
        assert_eq!(session.role, Role::Cashier);
        assert!(session.is_pos_operator());
    }
}
