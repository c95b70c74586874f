use serde::{Deserialize, Serialize};
use tourdesk_shared::{User, UserRole, UserStatus};

use crate::{CoreError, CoreResult};

/// The authenticated back-office user performing an operation. Authentication
/// itself happens upstream; the core only checks role, status and ownership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: UserRole,
    pub status: UserStatus,
}

impl Actor {
    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            role: UserRole::Admin,
            status: UserStatus::Active,
        }
    }

    pub fn agent(user_id: i64) -> Self {
        Self {
            user_id,
            role: UserRole::Agent,
            status: UserStatus::Active,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> CoreResult<()> {
        self.require_active()?;
        if !self.is_admin() {
            return Err(CoreError::AuthorizationError(format!(
                "user {} is not an admin",
                self.user_id
            )));
        }
        Ok(())
    }

    pub fn require_active(&self) -> CoreResult<()> {
        if self.status != UserStatus::Active {
            return Err(CoreError::AuthorizationError(format!(
                "user {} is suspended",
                self.user_id
            )));
        }
        Ok(())
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            status: user.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_agent_is_not_admin() {
        let err = Actor::agent(7).require_admin().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(Actor::admin(1).require_admin().is_ok());
    }

    #[test]
    fn test_suspended_admin_is_rejected() {
        let mut actor = Actor::admin(1);
        actor.status = UserStatus::Inactive;
        assert!(actor.require_admin().is_err());
    }
}
