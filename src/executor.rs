//! Collaborator seams.
//!
//! The core is a pure orchestration layer: every remote round trip goes
//! through [`RemoteExecutor`] and every package download through
//! [`RepositoryClient`]. Implementations (database driver, pip-style client
//! process) live outside this crate; tests inject mocks.
//!
//! One executor is exclusively owned by one in-flight operation. Every call
//! blocks until the remote side answers; no timeout or retry happens here.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::command::{CreateLibrary, DropLibrary, RemoteCommand, Row};
use crate::index::RemotePackageRecord;

/// Compatibility tags of the remote execution environment, used to select
/// binary artifacts that will actually run there. Obtained once per fetch and
/// passed explicitly to the repository client; never derived from the local
/// machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentTags {
    /// Interpreter version tag, e.g. "3.10".
    pub interpreter_version: String,
    /// ABI tag, e.g. "cp310".
    pub abi: String,
    /// Platform tag, e.g. "win_amd64" or "linux_x86_64".
    pub platform: String,
}

/// Captured textual output of one repository client invocation.
#[derive(Debug, Clone, Default)]
pub struct DownloadOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Query and command execution against the remote target.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run a generic query command and return its rows.
    async fn execute(&self, command: &RemoteCommand) -> Result<Vec<Row>>;

    /// Open a named transaction on the remote target.
    async fn begin_transaction(&self, name: &str) -> Result<()>;

    async fn commit_transaction(&self, name: &str) -> Result<()>;

    async fn rollback_transaction(&self, name: &str) -> Result<()>;

    /// Create an installable library from zipped package content.
    async fn create_library(&self, command: &CreateLibrary) -> Result<()>;

    async fn drop_library(&self, command: &DropLibrary) -> Result<()>;

    /// Compatibility tags of the remote execution environment.
    async fn environment_info(&self) -> Result<EnvironmentTags>;

    /// Packages currently installed on the remote target.
    async fn inventory(&self) -> Result<Vec<RemotePackageRecord>>;
}

/// External package-repository client. The implementation shells out to a
/// downloader; the core only sees the destination directory it filled and the
/// textual output it produced.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Download `spec` (a requirement string or a local file path) into
    /// `dest`, optionally with its transitive dependencies, selecting
    /// artifacts compatible with `tags`.
    async fn download(
        &self,
        spec: &str,
        dest: &Path,
        with_dependencies: bool,
        tags: &EnvironmentTags,
    ) -> Result<DownloadOutput>;
}
