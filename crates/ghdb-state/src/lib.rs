//! # ghdb-state
//!
//! Per-session lifecycle: a validated [`AuthMachine`] and the
//! [`InitCoordinator`] that de-duplicates concurrent initialization.

pub mod auth;
pub mod coordinator;

pub use auth::{AuthError, AuthMachine, AuthState, SessionUser};
pub use coordinator::{InitCoordinator, InitError, InitHandle, InitSnapshot, Initializer};
