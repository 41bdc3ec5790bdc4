//! # Token Subcommand
//!
//! Encode a URL into a link token, or decode a token back, with the same
//! key the API server uses. Decoding needs nothing but the key.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use ghdb_crypto::TokenCipher;

/// Arguments for the `ghdb token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Token key material.
    #[arg(long, env = "URL_ENCRYPTION_KEY", hide_env_values = true)]
    pub key: String,

    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Encode a URL into a fresh token.
    Encode {
        /// Target URL.
        url: String,
    },
    /// Decode a token back to its URL.
    Decode {
        /// Link token.
        token: String,
    },
}

/// Execute the token subcommand and return the line to print.
pub fn execute_token(args: &TokenArgs) -> Result<String> {
    let cipher = TokenCipher::new(&args.key);
    match &args.command {
        TokenCommand::Encode { url } => cipher.encode(url).context("encoding URL"),
        TokenCommand::Decode { token } => cipher
            .decode(token.trim())
            .context("token is malformed or was issued under a different key"),
    }
}

/// Run the token subcommand.
pub fn run_token(args: &TokenArgs) -> Result<u8> {
    println!("{}", execute_token(args)?);
    Ok(0)
}
