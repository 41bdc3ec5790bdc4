//! Route modules, one per resource.

pub mod config;
pub mod links;
pub mod resolve;
pub mod session;
