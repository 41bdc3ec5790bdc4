//! # Remote Subcommands
//!
//! `init`, `config show` and `links list` act on the caller's service
//! entity through the GitHub API, with credentials taken from flags or the
//! `GITHUB_*` environment.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use ghdb_github::{ContentStore, Credentials, GithubClient, GithubConfig};
use ghdb_store::{ConfigStore, MappingStore};

/// GitHub credentials for remote subcommands.
#[derive(Args, Debug)]
pub struct GithubArgs {
    /// GitHub access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// GitHub login owning the service entity.
    #[arg(long, env = "GITHUB_LOGIN")]
    pub login: String,

    /// Commit email; defaults to the login's noreply address.
    #[arg(long, env = "GITHUB_EMAIL")]
    pub email: Option<String>,
}

impl GithubArgs {
    pub fn credentials(&self) -> Credentials {
        let creds = Credentials::new(self.token.clone(), self.login.clone());
        match &self.email {
            Some(email) => creds.with_email(email.clone()),
            None => creds,
        }
    }
}

/// An operation against the service entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Init,
    ConfigShow,
    LinksList,
}

/// Execute a remote operation and return pretty JSON to print.
pub async fn execute_remote(
    command: RemoteCommand,
    store: Arc<dyn ContentStore>,
    creds: &Credentials,
) -> Result<String> {
    let value = match command {
        RemoteCommand::Init => {
            let configs = ConfigStore::new(store);
            let entity = configs
                .initialize(creds)
                .await
                .context("initializing service entity")?;
            let config = configs.read(creds).await.context("reading config")?;
            tracing::info!(entity = %entity.name, "service entity ready");
            serde_json::json!({
                "service": entity.name,
                "config": config,
            })
        }
        RemoteCommand::ConfigShow => {
            let config = ConfigStore::new(store)
                .read(creds)
                .await
                .context("reading config")?;
            serde_json::to_value(config)?
        }
        RemoteCommand::LinksList => {
            let index = MappingStore::new(store)
                .get_all(creds, creds.login())
                .await
                .context("reading link index")?;
            serde_json::to_value(index)?
        }
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Run a remote operation against GitHub.
pub fn run_remote(command: RemoteCommand, args: &GithubArgs) -> Result<u8> {
    let config = GithubConfig::from_env().context("loading GitHub configuration")?;
    let client = GithubClient::new(config).context("building GitHub client")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let output = runtime.block_on(execute_remote(
        command,
        Arc::new(client),
        &args.credentials(),
    ))?;
    println!("{output}");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghdb_github::MemoryStore;

    fn creds() -> Credentials {
        Credentials::new("token", "alice")
    }

    #[tokio::test]
    async fn init_then_show() {
        let memory = MemoryStore::new();
        let out = execute_remote(RemoteCommand::Init, Arc::new(memory.clone()), &creds())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["service"], "alice/3db-service");
        assert_eq!(value["config"]["connectedRepos"][0], "alice/3db-service");

        let out = execute_remote(RemoteCommand::ConfigShow, Arc::new(memory), &creds())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["connectedRepos"][0], "alice/3db-service");
    }

    #[tokio::test]
    async fn show_before_init_fails() {
        let err = execute_remote(
            RemoteCommand::ConfigShow,
            Arc::new(MemoryStore::new()),
            &creds(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[tokio::test]
    async fn links_list_is_empty_without_index() {
        let out = execute_remote(
            RemoteCommand::LinksList,
            Arc::new(MemoryStore::new()),
            &creds(),
        )
        .await
        .unwrap();
        assert_eq!(out, "{}");
    }

    #[test]
    fn email_flag_is_optional() {
        let args = GithubArgs {
            token: "t".into(),
            login: "alice".into(),
            email: None,
        };
        assert_eq!(args.credentials().email(), None);
    }
}
