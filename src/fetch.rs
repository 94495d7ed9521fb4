//! Downloads a package and its transitive dependencies into a staging area.

use std::path::PathBuf;

use anyhow::Context;
use log::{debug, warn};
use tempfile::TempDir;

use crate::artifact::Artifact;
use crate::error::{Error, Result};
use crate::executor::{RemoteExecutor, RepositoryClient};
use crate::requirement::RequirementSpec;

/// Everything one repository-client invocation produced: the dependency
/// requirements it reported and the artifacts it staged.
#[derive(Debug)]
pub struct FetchResult {
    pub requirements: Vec<RequirementSpec>,
    pub artifacts: Vec<Artifact>,
}

/// Retrieves package artifacts compatible with the remote target.
///
/// The repository client is configured with the *remote* environment's
/// compatibility tags, queried once per fetch, so downloads match where the
/// packages will run rather than the local machine.
pub struct ArtifactFetcher<'a> {
    executor: &'a dyn RemoteExecutor,
    client: &'a dyn RepositoryClient,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor, client: &'a dyn RepositoryClient) -> Self {
        ArtifactFetcher { executor, client }
    }

    /// Download `spec` plus its transitive dependencies.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_with_dependencies(&self, spec: &str) -> Result<FetchResult> {
        self.fetch(spec, true).await
    }

    /// Download only `spec` itself.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_single(&self, spec: &str) -> Result<Artifact> {
        let mut result = self.fetch(spec, false).await?;
        if result.artifacts.len() > 1 {
            warn!(
                "expected a single artifact for {spec}, got {}; using the first",
                result.artifacts.len()
            );
        }
        // fetch() guarantees at least one artifact.
        Ok(result.artifacts.remove(0))
    }

    async fn fetch(&self, spec: &str, with_dependencies: bool) -> Result<FetchResult> {
        let tags = self
            .executor
            .environment_info()
            .await
            .context("failed to query remote environment info")?;
        debug!(
            "fetching {spec} for remote environment {}/{}/{}",
            tags.interpreter_version, tags.abi, tags.platform
        );

        // Staging is scoped to this call; the directory is removed on every
        // exit path once the artifacts are in memory.
        let staging = TempDir::new().context("failed to create staging directory")?;

        let output = self
            .client
            .download(spec, staging.path(), with_dependencies, &tags)
            .await
            .context("repository client invocation failed")?;

        let requirements = parse_requirements(&output.stdout)?;

        let mut files: Vec<PathBuf> = std::fs::read_dir(staging.path())
            .context("failed to read staging directory")?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let artifacts = files
            .iter()
            .map(|path| Artifact::from_file(path))
            .collect::<Result<Vec<_>>>()?;

        if artifacts.is_empty() {
            return Err(Error::NoArtifactsDownloaded {
                stderr: output.stderr,
            });
        }

        debug!(
            "staged {} artifact(s), {} requirement(s) reported",
            artifacts.len(),
            requirements.len()
        );
        Ok(FetchResult {
            requirements,
            artifacts,
        })
    }
}

/// Extract dependency requirements from the repository client's progress
/// output: the lines announcing each collected requirement.
///
/// This scrapes a textual interface that is not a stable contract; it is the
/// only place the client exposes the dependency list without installing.
fn parse_requirements(stdout: &str) -> Result<Vec<RequirementSpec>> {
    let mut requirements = Vec::new();
    for line in stdout.lines() {
        let Some(rest) = line.trim().strip_prefix("Collecting ") else {
            continue;
        };
        // Drop any parenthesized origin note, e.g. "(from pkgA)".
        let cleaned = match rest.find('(') {
            Some(idx) => &rest[..idx],
            None => rest,
        };
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }
        requirements.push(cleaned.parse::<RequirementSpec>()?);
    }
    Ok(requirements)
}
