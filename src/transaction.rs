//! All-or-nothing upload of an artifact set to the remote target.

use anyhow::Context;
use log::{error, info};

use crate::artifact::Artifact;
use crate::command::CreateLibrary;
use crate::error::{Error, Result};
use crate::executor::RemoteExecutor;
use crate::requirement::PackageName;
use crate::scope::Scope;

/// State of one install transaction. `Committed` and `RolledBack` are
/// terminal; no operation is accepted after either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NotStarted,
    Active,
    Committed,
    RolledBack,
}

impl TransactionState {
    fn name(self) -> &'static str {
        match self {
            TransactionState::NotStarted => "NotStarted",
            TransactionState::Active => "Active",
            TransactionState::Committed => "Committed",
            TransactionState::RolledBack => "RolledBack",
        }
    }
}

/// Uploads one or more artifacts inside a single named remote transaction.
///
/// The transaction name is derived from the target package's normalized
/// name, so concurrent installs of the same package on the same connection
/// collide detectably while installs of different packages stay independent.
pub struct InstallTransaction<'a> {
    executor: &'a dyn RemoteExecutor,
    name: String,
    scope: Scope,
    state: TransactionState,
}

impl<'a> InstallTransaction<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor, target: &PackageName, scope: Scope) -> Self {
        InstallTransaction {
            executor,
            name: format!("{}InstallTransaction", target.normalized()),
            scope,
            state: TransactionState::NotStarted,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn require_state(&self, expected: TransactionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransactionState {
                expected: expected.name(),
                actual: self.state.name(),
            })
        }
    }

    pub async fn begin(&mut self) -> Result<()> {
        self.require_state(TransactionState::NotStarted)?;
        self.executor
            .begin_transaction(&self.name)
            .await
            .with_context(|| format!("failed to begin transaction {}", self.name))?;
        self.state = TransactionState::Active;
        Ok(())
    }

    /// Upload dependencies in their given order, then the target.
    ///
    /// On any upload failure the whole transaction is rolled back exactly
    /// once and the failure surfaces as [`Error::InstallationFailed`] with
    /// the cause chained. Partial success is never observable remotely.
    #[tracing::instrument(skip(self, dependencies, target), fields(transaction = %self.name))]
    pub async fn apply(&mut self, dependencies: &[Artifact], target: &Artifact) -> Result<()> {
        self.require_state(TransactionState::Active)?;

        for dependency in dependencies {
            info!(
                "Installing required dependency {} version {}",
                dependency.name,
                dependency.version_text()
            );
            if let Err(cause) = self.upload(dependency).await {
                return Err(self.rollback_after_failure(cause).await);
            }
        }

        info!(
            "Installing target package {} version {}",
            target.name,
            target.version_text()
        );
        if let Err(cause) = self.upload(target).await {
            return Err(self.rollback_after_failure(cause).await);
        }
        Ok(())
    }

    async fn upload(&self, artifact: &Artifact) -> Result<(), anyhow::Error> {
        let content = artifact.prezip().map_err(anyhow::Error::new)?;
        let command = CreateLibrary::new(artifact.name.as_str(), self.scope, content);
        self.executor
            .create_library(&command)
            .await
            .with_context(|| format!("failed to upload {}", artifact.name))
    }

    /// One rollback attempt; a rollback failure is reported alongside the
    /// original error, never swallowed.
    async fn rollback_after_failure(&mut self, cause: anyhow::Error) -> Error {
        error!("upload failed, rolling back transaction {}: {cause:#}", self.name);
        self.state = TransactionState::RolledBack;
        match self.executor.rollback_transaction(&self.name).await {
            Ok(()) => Error::InstallationFailed { source: cause },
            Err(rollback_error) => Error::RollbackFailed {
                source: cause,
                rollback_error: format!("{rollback_error:#}"),
            },
        }
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.require_state(TransactionState::Active)?;
        self.executor
            .commit_transaction(&self.name)
            .await
            .with_context(|| format!("failed to commit transaction {}", self.name))?;
        self.state = TransactionState::Committed;
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.require_state(TransactionState::Active)?;
        self.executor
            .rollback_transaction(&self.name)
            .await
            .with_context(|| format!("failed to roll back transaction {}", self.name))?;
        self.state = TransactionState::RolledBack;
        Ok(())
    }
}
