//! # Initialization Coordinator
//!
//! Collapses concurrent initialization requests for one session onto a
//! single in-flight operation. The pending operation is a
//! [`futures::future::Shared`] held in a one-slot mutex: a second `start`
//! while the slot is occupied gets a clone of the same handle, so the
//! underlying [`Initializer`] runs once and every waiter sees its result.
//!
//! The slot is cleared when the operation completes and on `logout`. Each
//! operation is tagged with the session generation it started under; a
//! completion from before a logout finds a newer generation and leaves
//! both the slot and the state machine alone.
//!
//! The mutex is never held across an `.await`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use ghdb_core::ConfigDocument;
use ghdb_github::{Credentials, Repository};
use ghdb_store::{ConfigStore, StoreError};
use parking_lot::Mutex;
use serde::Serialize;

use crate::auth::{AuthMachine, AuthState, SessionUser};

/// What a completed initialization hands to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitSnapshot {
    pub config: ConfigDocument,
    /// Connected repositories, service entity first.
    pub repositories: Vec<Repository>,
}

/// Initialization failure, delivered to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct InitError {
    /// Human-readable failure reason.
    pub reason: String,
}

impl InitError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for InitError {
    fn from(err: StoreError) -> Self {
        Self::new(err.to_string())
    }
}

/// The operation the coordinator de-duplicates.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn initialize_session(&self, creds: &Credentials) -> Result<InitSnapshot, InitError>;
}

#[async_trait]
impl Initializer for ConfigStore {
    /// Self-healing initialize, then read the document and resolve the
    /// repositories it lists.
    async fn initialize_session(&self, creds: &Credentials) -> Result<InitSnapshot, InitError> {
        self.initialize(creds).await?;
        let config = self.read(creds).await?;
        let repositories = self.connected_repositories(creds, &config).await?;
        Ok(InitSnapshot {
            config,
            repositories,
        })
    }
}

/// Shared handle to an in-flight initialization.
pub type InitHandle = Shared<BoxFuture<'static, Result<InitSnapshot, InitError>>>;

struct Session {
    machine: AuthMachine,
    generation: u64,
    pending: Option<InitHandle>,
}

/// Per-session initialization coordinator.
#[derive(Clone)]
pub struct InitCoordinator {
    initializer: Arc<dyn Initializer>,
    session: Arc<Mutex<Session>>,
}

impl std::fmt::Debug for InitCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.lock();
        f.debug_struct("InitCoordinator")
            .field("state", session.machine.state())
            .field("generation", &session.generation)
            .field("pending", &session.pending.is_some())
            .finish()
    }
}

impl InitCoordinator {
    pub fn new(initializer: Arc<dyn Initializer>) -> Self {
        Self {
            initializer,
            session: Arc::new(Mutex::new(Session {
                machine: AuthMachine::new(),
                generation: 0,
                pending: None,
            })),
        }
    }

    /// Current session state.
    pub fn state(&self) -> AuthState {
        self.session.lock().machine.state().clone()
    }

    /// Whether an initialization is in flight.
    pub fn is_pending(&self) -> bool {
        self.session.lock().pending.is_some()
    }

    /// Start initialization, or join the one already in flight.
    ///
    /// The operation is spawned onto the runtime, so it completes and
    /// updates the session even if every waiter drops its handle. Must be
    /// called from within a tokio runtime.
    pub fn start(&self, creds: Credentials) -> InitHandle {
        let mut session = self.session.lock();
        if let Some(pending) = &session.pending {
            tracing::debug!(login = creds.login(), "initialization already in flight");
            return pending.clone();
        }

        enter_initializing(&mut session.machine, SessionUser::from(&creds));
        let generation = session.generation;
        let initializer = Arc::clone(&self.initializer);
        let shared = Arc::clone(&self.session);

        let handle = async move {
            tracing::info!(login = creds.login(), "initializing session");
            let result = initializer.initialize_session(&creds).await;
            complete(&shared, generation, &result);
            result
        }
        .boxed()
        .shared();

        session.pending = Some(handle.clone());
        drop(session);

        tokio::spawn(handle.clone());
        handle
    }

    /// Reset the session. Any in-flight initialization is detached: its
    /// waiters still get its result, but it no longer affects this session.
    pub fn logout(&self) {
        let mut session = self.session.lock();
        session.generation += 1;
        session.pending = None;
        session.machine.logout();
    }
}

/// Move the machine to `Initializing` from wherever it is.
fn enter_initializing(machine: &mut AuthMachine, user: SessionUser) {
    let result = match machine.state().clone() {
        AuthState::Unauthenticated => machine
            .begin_login()
            .and_then(|()| machine.login_succeeded(user)),
        AuthState::LoggingIn => machine.login_succeeded(user),
        AuthState::Error { .. } | AuthState::Ready { .. } => machine.begin_initialization(user),
        AuthState::Initializing { .. } => Ok(()),
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "unexpected session state at initialization start");
    }
}

/// Record a finished initialization, unless the session moved on.
fn complete(
    session: &Mutex<Session>,
    generation: u64,
    result: &Result<InitSnapshot, InitError>,
) {
    let mut session = session.lock();
    if session.generation != generation {
        tracing::debug!(generation, "discarding initialization result from a previous session");
        return;
    }
    session.pending = None;

    let transition = match result {
        Ok(snapshot) => {
            let connected = snapshot
                .repositories
                .iter()
                .map(|r| r.full_name.clone())
                .collect();
            session.machine.mark_ready(connected)
        }
        Err(e) => {
            tracing::warn!(reason = %e.reason, "initialization failed");
            session.machine.fail(e.reason.clone())
        }
    };
    if let Err(e) = transition {
        tracing::warn!(error = %e, "could not record initialization result");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ghdb_core::QualifiedName;
    use ghdb_github::RepositoryOwner;
    use tokio::sync::Semaphore;

    use super::*;

    /// Counts calls and blocks each one until the test releases a permit.
    struct Gated {
        calls: AtomicUsize,
        gate: Semaphore,
        fail: bool,
    }

    impl Gated {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Semaphore::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Initializer for Gated {
        async fn initialize_session(&self, creds: &Credentials) -> Result<InitSnapshot, InitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.acquire().await.unwrap().forget();
            if self.fail {
                return Err(InitError::new("GitHub is down"));
            }
            let service = QualifiedName::service_entity(creds.login()).unwrap();
            Ok(InitSnapshot {
                config: ConfigDocument::initial(&service),
                repositories: vec![Repository {
                    name: service.name().to_string(),
                    full_name: service.to_string(),
                    owner: RepositoryOwner {
                        login: creds.login().to_string(),
                    },
                    private: true,
                    default_branch: None,
                    html_url: None,
                    description: None,
                }],
            })
        }
    }

    fn creds() -> Credentials {
        Credentials::new("token", "alice")
    }

    #[tokio::test]
    async fn concurrent_starts_share_one_operation() {
        let init = Gated::new(false);
        let coordinator = InitCoordinator::new(init.clone());

        let first = coordinator.start(creds());
        let second = coordinator.start(creds());
        assert!(coordinator.is_pending());
        assert_eq!(coordinator.state().name(), "INITIALIZING");

        init.gate.add_permits(1);
        let (a, b) = tokio::join!(first, second);

        assert_eq!(init.calls(), 1);
        assert_eq!(a, b);
        assert!(!coordinator.is_pending());
        assert_eq!(
            coordinator.state(),
            AuthState::Ready {
                user: SessionUser {
                    login: "alice".into(),
                    email: None,
                },
                connected: vec!["alice/3db-service".into()],
            }
        );
    }

    #[tokio::test]
    async fn start_after_completion_runs_again() {
        let init = Gated::new(false);
        let coordinator = InitCoordinator::new(init.clone());
        init.gate.add_permits(2);

        coordinator.start(creds()).await.unwrap();
        assert!(coordinator.state().is_ready());
        coordinator.start(creds()).await.unwrap();

        assert_eq!(init.calls(), 2);
        assert!(coordinator.state().is_ready());
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_sets_error() {
        let init = Gated::new(true);
        let coordinator = InitCoordinator::new(init.clone());

        let first = coordinator.start(creds());
        let second = coordinator.start(creds());
        init.gate.add_permits(1);
        let (a, b) = tokio::join!(first, second);

        assert_eq!(a, Err(InitError::new("GitHub is down")));
        assert_eq!(b, Err(InitError::new("GitHub is down")));
        assert_eq!(init.calls(), 1);
        assert_eq!(
            coordinator.state(),
            AuthState::Error {
                reason: "GitHub is down".into()
            }
        );
        assert!(!coordinator.is_pending());
    }

    #[tokio::test]
    async fn logout_clears_slot_and_ignores_stale_completion() {
        let init = Gated::new(false);
        let coordinator = InitCoordinator::new(init.clone());

        let stale = coordinator.start(creds());
        coordinator.logout();
        assert!(!coordinator.is_pending());
        assert_eq!(coordinator.state(), AuthState::Unauthenticated);

        let fresh = coordinator.start(creds());
        assert!(coordinator.is_pending());

        // Let the pre-logout operation finish first; it must not touch the
        // new session.
        init.gate.add_permits(1);
        stale.await.unwrap();
        assert!(coordinator.is_pending());
        assert_eq!(coordinator.state().name(), "INITIALIZING");

        init.gate.add_permits(1);
        fresh.await.unwrap();
        assert_eq!(init.calls(), 2);
        assert!(coordinator.state().is_ready());
    }

    #[tokio::test]
    async fn operation_completes_when_waiters_drop() {
        let init = Gated::new(false);
        let coordinator = InitCoordinator::new(init.clone());

        drop(coordinator.start(creds()));
        init.gate.add_permits(1);

        for _ in 0..100 {
            if !coordinator.is_pending() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(coordinator.state().is_ready());
    }

    #[tokio::test]
    async fn retry_from_error_state() {
        let failing = Gated::new(true);
        let coordinator = InitCoordinator::new(failing.clone());
        failing.gate.add_permits(1);
        assert!(coordinator.start(creds()).await.is_err());
        assert_eq!(coordinator.state().name(), "ERROR");

        // A second attempt moves through Initializing again.
        let _pending = coordinator.start(creds());
        assert_eq!(coordinator.state().name(), "INITIALIZING");
    }
}
