//! # ghdb-cli: Operator CLI
//!
//! ## Subcommands
//!
//! - `ghdb token encode|decode`: link tokens, offline.
//! - `ghdb init`: create or repair the service entity and print its config.
//! - `ghdb config show`: print the service config.
//! - `ghdb links list`: print the recorded link index.
//!
//! ```bash
//! URL_ENCRYPTION_KEY=... ghdb token decode <token>
//! GITHUB_TOKEN=... GITHUB_LOGIN=alice ghdb init
//! ```

pub mod remote;
pub mod token;
