//! # Session State Machine
//!
//! | From                                     | Event                  | To              |
//! |------------------------------------------|------------------------|-----------------|
//! | Unauthenticated                          | `begin_login`          | LoggingIn       |
//! | LoggingIn                                | `login_succeeded`      | Initializing    |
//! | Error, Ready                             | `begin_initialization` | Initializing    |
//! | Initializing                             | `mark_ready`           | Ready           |
//! | Unauthenticated, LoggingIn, Initializing | `fail`                 | Error           |
//! | any                                      | `logout`               | Unauthenticated |
//!
//! `Initializing → Ready` and `Initializing → Error` are driven by the
//! [`crate::InitCoordinator`] only. Invalid transitions are rejected at
//! runtime with [`AuthError::InvalidTransition`]; the state is unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The user a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&ghdb_github::Credentials> for SessionUser {
    fn from(creds: &ghdb_github::Credentials) -> Self {
        Self {
            login: creds.login().to_string(),
            email: creds.email().map(str::to_string),
        }
    }
}

/// Session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    LoggingIn,
    Initializing {
        user: SessionUser,
    },
    Ready {
        user: SessionUser,
        /// Full names of the connected repositories, service entity first.
        connected: Vec<String>,
    },
    Error {
        reason: String,
    },
}

impl AuthState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::LoggingIn => "LOGGING_IN",
            Self::Initializing { .. } => "INITIALIZING",
            Self::Ready { .. } => "READY",
            Self::Error { .. } => "ERROR",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Initializing { user } | Self::Ready { user, .. } => Some(user),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from session transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid session transition: {event} from {from}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
}

/// A session state with validated transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMachine {
    state: AuthState,
}

impl Default for AuthMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthMachine {
    pub fn new() -> Self {
        Self {
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    fn reject(&self, event: &'static str) -> AuthError {
        AuthError::InvalidTransition {
            from: self.state.name(),
            event,
        }
    }

    fn enter(&mut self, next: AuthState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "session transition");
        self.state = next;
    }

    /// `Unauthenticated → LoggingIn`.
    pub fn begin_login(&mut self) -> Result<(), AuthError> {
        match self.state {
            AuthState::Unauthenticated => {
                self.enter(AuthState::LoggingIn);
                Ok(())
            }
            _ => Err(self.reject("begin_login")),
        }
    }

    /// `LoggingIn → Initializing`.
    pub fn login_succeeded(&mut self, user: SessionUser) -> Result<(), AuthError> {
        match self.state {
            AuthState::LoggingIn => {
                self.enter(AuthState::Initializing { user });
                Ok(())
            }
            _ => Err(self.reject("login_succeeded")),
        }
    }

    /// `Error | Ready → Initializing`, for a retry or a reload.
    pub fn begin_initialization(&mut self, user: SessionUser) -> Result<(), AuthError> {
        match self.state {
            AuthState::Error { .. } | AuthState::Ready { .. } => {
                self.enter(AuthState::Initializing { user });
                Ok(())
            }
            _ => Err(self.reject("begin_initialization")),
        }
    }

    /// `Initializing → Ready`.
    pub fn mark_ready(&mut self, connected: Vec<String>) -> Result<(), AuthError> {
        match &self.state {
            AuthState::Initializing { user } => {
                let user = user.clone();
                self.enter(AuthState::Ready { user, connected });
                Ok(())
            }
            _ => Err(self.reject("mark_ready")),
        }
    }

    /// Any non-terminal, not-yet-ready state `→ Error`.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), AuthError> {
        match self.state {
            AuthState::Unauthenticated | AuthState::LoggingIn | AuthState::Initializing { .. } => {
                self.enter(AuthState::Error {
                    reason: reason.into(),
                });
                Ok(())
            }
            _ => Err(self.reject("fail")),
        }
    }

    /// Any state `→ Unauthenticated`.
    pub fn logout(&mut self) {
        self.enter(AuthState::Unauthenticated);
    }
}
