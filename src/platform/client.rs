//! Typed wrappers around the gigalixir CLI commands
//!
//! Every method requires exit code 0. Read commands decode the JSON the
//! CLI prints on stdout.

use std::path::Path;
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::harness::{CliHarness, CliRequest, Invocation};

use super::types::{App, AppStatus, Configs, Confirmation, Credentials, Database, DatabaseId};

/// Client for the gigalixir CLI
#[derive(Clone)]
pub struct GigalixirCli {
    harness: Arc<dyn CliHarness>,
}

impl GigalixirCli {
    pub fn new(harness: Arc<dyn CliHarness>) -> Self {
        Self { harness }
    }

    async fn run(&self, request: CliRequest) -> Result<Invocation> {
        tracing::debug!("gigalixir {}", request.display());
        self.harness.invoke(request).await?.ensure_success()
    }

    /// Log in, answering the password prompt and agreeing to store the token
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let input = format!(
            "{}\n{}",
            credentials.password,
            Confirmation::Yes.as_input()
        );
        let email = format!("--email={}", credentials.email);
        self.run(CliRequest::new(["login".to_string(), email]).input(input))
            .await?;
        Ok(())
    }

    pub async fn apps(&self) -> Result<Vec<App>> {
        self.run(CliRequest::new(["apps"])).await?.json()
    }

    pub async fn databases(&self, app: &str) -> Result<Vec<Database>> {
        self.run(CliRequest::new(["databases", app])).await?.json()
    }

    pub async fn create_database(&self, app: &str) -> Result<()> {
        self.run(CliRequest::new(["create_database", app])).await?;
        Ok(())
    }

    pub async fn scale_database(&self, app: &str, id: &DatabaseId, size: f64) -> Result<()> {
        self.run(CliRequest::new([
            "scale_database".to_string(),
            app.to_string(),
            id.to_string(),
            format!("--size={size}"),
        ]))
        .await?;
        Ok(())
    }

    pub async fn delete_database(
        &self,
        app: &str,
        id: &DatabaseId,
        confirm: Confirmation,
    ) -> Result<()> {
        self.run(
            CliRequest::new(["delete_database", app, id.as_str()]).input(confirm.as_input()),
        )
        .await?;
        Ok(())
    }

    /// Create an app from the git repository in `repo`, returning its name
    pub async fn create_app(&self, repo: &Path) -> Result<String> {
        let inv = self.run(CliRequest::new(["create"]).in_dir(repo)).await?;
        let name = inv.trimmed_stdout().trim();
        if name.is_empty() {
            return Err(Error::unexpected_output("create", "no app name printed"));
        }
        Ok(name.to_string())
    }

    pub async fn status(&self, app: &str) -> Result<AppStatus> {
        self.run(CliRequest::new(["status", app])).await?.json()
    }

    pub async fn set_config(&self, app: &str, key: &str, value: &str) -> Result<()> {
        self.run(CliRequest::new(["set_config", app, key, value]))
            .await?;
        Ok(())
    }

    pub async fn configs(&self, app: &str) -> Result<Configs> {
        self.run(CliRequest::new(["configs", app])).await?.json()
    }

    pub async fn delete_config(&self, app: &str, key: &str) -> Result<()> {
        self.run(CliRequest::new(["delete_config", app, key])).await?;
        Ok(())
    }

    pub async fn scale(&self, app: &str, replicas: u32) -> Result<()> {
        self.run(CliRequest::new([
            "scale".to_string(),
            app.to_string(),
            format!("--replicas={replicas}"),
        ]))
        .await?;
        Ok(())
    }
}
