use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use tourdesk_core::identity::Actor;
use tourdesk_core::repository::{NewUser, Store};
use tourdesk_core::{CoreError, CoreResult};
use tourdesk_shared::{User, UserRole, UserStatus};
use tracing::{info, warn};

use crate::notify::Notifier;

pub const TEMPORARY_PASSWORD_LEN: usize = 12;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteAgentRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

pub fn temporary_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Admin management of agent accounts.
pub struct AgentAdmin {
    store: Arc<dyn Store>,
    notifier: Notifier,
    hash_cost: u32,
}

impl AgentAdmin {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier) -> Self {
        Self {
            store,
            notifier,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Creates an active agent with a random temporary password and queues the
    /// invitation carrying it.
    pub async fn invite(&self, actor: &Actor, req: InviteAgentRequest) -> CoreResult<User> {
        actor.require_admin()?;

        let name = req.name.trim().to_string();
        let email = req.email.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(CoreError::ValidationError("name is required".to_string()));
        }
        if !email.contains('@') {
            return Err(CoreError::ValidationError(format!(
                "email: {} is not a valid address",
                email
            )));
        }

        let password = temporary_password();
        let password_hash = bcrypt::hash(&password, self.hash_cost).map_err(CoreError::internal)?;

        let agent = self
            .store
            .create_user(&NewUser {
                name,
                email,
                phone: req.phone.filter(|p| !p.trim().is_empty()),
                role: UserRole::Agent,
                password_hash,
            })
            .await?;
        info!(agent_id = agent.id, invited_by = actor.user_id, "Agent invited");

        if let Err(e) = self.notifier.agent_invited(&agent, &password).await {
            warn!(agent_id = agent.id, "Failed to queue agent invitation: {}", e);
        }
        Ok(agent)
    }

    pub async fn suspend(&self, actor: &Actor, user_id: i64) -> CoreResult<User> {
        self.set_status(actor, user_id, UserStatus::Inactive).await
    }

    pub async fn activate(&self, actor: &Actor, user_id: i64) -> CoreResult<User> {
        self.set_status(actor, user_id, UserStatus::Active).await
    }

    async fn set_status(&self, actor: &Actor, user_id: i64, status: UserStatus) -> CoreResult<User> {
        actor.require_admin()?;
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("user", user_id))?;
        if user.role != UserRole::Agent {
            return Err(CoreError::ValidationError(format!(
                "user {} is not an agent",
                user_id
            )));
        }
        let user = self.store.set_user_status(user_id, status).await?;
        info!(agent_id = user.id, status = %user.status, "Agent status changed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourdesk_core::memory::InMemoryStore;
    use tourdesk_core::ErrorKind;
    use tourdesk_shared::{NotificationPayload, TemplateKind};

    async fn setup() -> (Arc<InMemoryStore>, AgentAdmin, Actor) {
        let store = Arc::new(InMemoryStore::new());
        let admin = store.insert_user("Ada", "ada@example.com", UserRole::Admin).await;
        let service = AgentAdmin::new(store.clone(), Notifier::new(store.clone(), store.clone()))
            .with_hash_cost(4);
        (store, service, Actor::from(&admin))
    }

    fn invite(email: &str) -> InviteAgentRequest {
        InviteAgentRequest {
            name: "Jane Smith".to_string(),
            email: email.to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_temporary_password_is_twelve_alphanumerics() {
        let password = temporary_password();
        assert_eq!(password.len(), TEMPORARY_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_invite_hashes_password_and_queues_invitation() {
        let (store, service, admin) = setup().await;
        let agent = service.invite(&admin, invite("Jane@Example.com")).await.unwrap();
        assert_eq!(agent.role, UserRole::Agent);
        assert_eq!(agent.email, "jane@example.com");

        let sent = store.notifications().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].template, TemplateKind::AgentInvitation);
        let NotificationPayload::Invitation(invitation) = &sent[0].payload else {
            panic!("expected an invitation payload");
        };

        let hash = store.password_hash(agent.id).await.unwrap();
        assert!(bcrypt::verify(invitation.password.expose(), &hash).unwrap());

        let err = service.invite(&admin, invite("jane@example.com")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_suspend_and_activate_only_touch_agents() {
        let (store, service, admin) = setup().await;
        let agent = store.insert_user("Jane", "jane@example.com", UserRole::Agent).await;

        let suspended = service.suspend(&admin, agent.id).await.unwrap();
        assert_eq!(suspended.status, UserStatus::Inactive);
        let active = service.activate(&admin, agent.id).await.unwrap();
        assert_eq!(active.status, UserStatus::Active);

        let err = service.suspend(&admin, admin.user_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service.suspend(&Actor::agent(agent.id), agent.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }
}
