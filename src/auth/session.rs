//! Session state driven only by auth events.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use utoipa::ToSchema;

use super::model::User;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    /// Before the initial session has been resolved.
    Loading,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// Result of the startup session lookup; `None` when there is no
    /// session or the lookup failed.
    InitialSession(Option<User>),
    SignedIn(User),
    SignedOut,
    TokenRefreshed(User),
}

impl AuthEvent {
    fn name(&self) -> &'static str {
        match self {
            AuthEvent::InitialSession(_) => "INITIAL_SESSION",
            AuthEvent::SignedIn(_) => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::TokenRefreshed(_) => "TOKEN_REFRESHED",
        }
    }
}

/// Owner of the session state. Observers hold a [`SessionSubscription`].
#[derive(Debug)]
pub struct SessionManager {
    sender: watch::Sender<SessionState>,
}

impl SessionManager {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::Loading);
        Self { sender }
    }

    pub fn state(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    pub fn handle(&self, event: AuthEvent) {
        log::debug!("Auth state changed: {}", event.name());
        let next = match event {
            AuthEvent::InitialSession(Some(user))
            | AuthEvent::SignedIn(user)
            | AuthEvent::TokenRefreshed(user) => SessionState::Authenticated(user),
            AuthEvent::InitialSession(None) | AuthEvent::SignedOut => {
                SessionState::Unauthenticated
            }
        };
        self.sender.send_replace(next);
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: Some(self.sender.subscribe()),
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer handle. After [`unsubscribe`](Self::unsubscribe) no further
/// states are delivered.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: Option<watch::Receiver<SessionState>>,
}

impl SessionSubscription {
    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn current(&self) -> Option<SessionState> {
        self.receiver.as_ref().map(|rx| rx.borrow().clone())
    }

    /// Wait for the next state. `None` once unsubscribed or when the
    /// manager is gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        let receiver = self.receiver.as_mut()?;
        receiver.changed().await.ok()?;
        let state = receiver.borrow_and_update().clone();
        Some(state)
    }

    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unauthenticated,
    Loading,
    Authenticated,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub status: SessionStatus,
    pub user: Option<User>,
}

impl From<&SessionState> for SessionResponse {
    fn from(state: &SessionState) -> Self {
        let status = match state {
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Authenticated(_) => SessionStatus::Authenticated,
        };
        Self {
            status,
            user: state.user().cloned(),
        }
    }
}
