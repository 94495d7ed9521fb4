//! High-level package management operations against one remote target.

use std::path::Path;

use anyhow::Context;
use log::{info, warn};

use crate::artifact::{Artifact, name_and_version_from_file};
use crate::command::{DropLibrary, RemoteCommand};
use crate::error::{Error, Result};
use crate::executor::{RemoteExecutor, RepositoryClient};
use crate::fetch::ArtifactFetcher;
use crate::index::{PackageIndex, RemotePackageRecord};
use crate::requirement::PackageName;
use crate::resolver::DependencyResolver;
use crate::scope::Scope;
use crate::transaction::InstallTransaction;
use crate::version::Version;

/// Options for one install call.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Replace an older installed version. Without this, an existing install
    /// always wins regardless of version.
    pub upgrade: bool,
    /// Exact version to request from the repository. Ignored when installing
    /// from a file, where the version comes from the filename.
    pub version: Option<String>,
    /// Installation scope; defaults per the connecting principal's role.
    pub scope: Option<Scope>,
}

/// Façade over the whole install/uninstall/list pipeline.
///
/// Holds no remote state of its own; every operation starts from a fresh
/// inventory snapshot.
pub struct PackageManager<'a> {
    executor: &'a dyn RemoteExecutor,
    client: &'a dyn RepositoryClient,
}

impl<'a> PackageManager<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor, client: &'a dyn RepositoryClient) -> Self {
        PackageManager { executor, client }
    }

    /// Install a package by name or from a local package file, together with
    /// whatever transitive dependencies the remote target is missing.
    #[tracing::instrument(skip(self))]
    pub async fn install(&self, package: &str, options: InstallOptions) -> Result<()> {
        let scope = match options.scope {
            Some(scope) => scope,
            None => self.default_scope().await?,
        };

        let from_file = Path::new(package).is_file();
        let (target, requested) = if from_file {
            let (name, version) = name_and_version_from_file(Path::new(package));
            (name, version)
        } else {
            (
                PackageName::new(package),
                options.version.as_deref().map(Version::parse),
            )
        };

        let index = PackageIndex::snapshot(self.executor).await?;
        let resolver = DependencyResolver::new(&index, target.clone());
        if resolver.requirement_met(options.upgrade, requested.as_ref()) {
            let server = resolver
                .installed_version()
                .map(|v| v.as_str().to_string())
                .unwrap_or_default();
            info!(
                "requirement already satisfied: {target} is installed on the remote \
                 target (server version {server}, requested {})",
                requested.as_ref().map(|v| v.as_str()).unwrap_or("any")
            );
            return Ok(());
        }

        let spec = if from_file {
            package.to_string()
        } else {
            match &requested {
                Some(version) => format!("{target}=={}", version.as_str()),
                None => target.as_str().to_string(),
            }
        };

        let fetcher = ArtifactFetcher::new(self.executor, self.client);
        let fetched = fetcher.fetch_with_dependencies(&spec).await?;

        let required = resolver.required_installs(&fetched.requirements);
        let (dependencies, target_artifact) =
            select_artifacts(&target, &required, fetched.artifacts)?;

        let mut tx = InstallTransaction::new(self.executor, &target, scope);
        tx.begin().await?;
        tx.apply(&dependencies, &target_artifact).await?;
        tx.commit().await?;

        info!(
            "successfully installed {target} version {}",
            target_artifact.version_text()
        );
        Ok(())
    }

    /// Drop the named package from the remote target. Dependencies that were
    /// installed alongside it are deliberately left in place.
    #[tracing::instrument(skip(self))]
    pub async fn uninstall(&self, package: &str, scope: Option<Scope>) -> Result<()> {
        let scope = match scope {
            Some(scope) => scope,
            None => self.default_scope().await?,
        };
        let name = PackageName::new(package);
        info!("Uninstalling {name} only, not dependencies");
        self.executor
            .drop_library(&DropLibrary::new(name.as_str(), scope))
            .await
            .with_context(|| format!("failed to drop library {name}"))?;
        info!("successfully uninstalled {name}");
        Ok(())
    }

    /// Current remote inventory.
    pub async fn list(&self) -> Result<Vec<RemotePackageRecord>> {
        let index = PackageIndex::snapshot(self.executor).await?;
        Ok(index.records().to_vec())
    }

    /// Public when the connecting principal holds the elevated administrative
    /// role, Private otherwise.
    async fn default_scope(&self) -> Result<Scope> {
        let rows = self
            .executor
            .execute(&RemoteCommand::ElevatedRoleCheck)
            .await
            .context("failed to query the connecting principal's role")?;
        let elevated = rows
            .first()
            .and_then(|row| row.first())
            .is_some_and(|value| value.is_truthy());
        Ok(if elevated { Scope::Public } else { Scope::Private })
    }
}

/// Split the downloaded artifacts into the dependencies that actually need
/// installing (in required order) and the target artifact itself.
fn select_artifacts(
    target: &PackageName,
    required: &[PackageName],
    artifacts: Vec<Artifact>,
) -> Result<(Vec<Artifact>, Artifact)> {
    let mut pool: Vec<Option<Artifact>> = artifacts.into_iter().map(Some).collect();
    let mut take = |name: &PackageName| -> Option<Artifact> {
        pool.iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|a| &a.name == name))
            .and_then(|slot| slot.take())
    };

    let mut dependencies = Vec::new();
    for name in required {
        if name == target {
            continue;
        }
        match take(name) {
            Some(artifact) => dependencies.push(artifact),
            // Satisfied remotely in a way the requirement scrape missed, or
            // the client skipped it; nothing to upload.
            None => warn!("required dependency {name} was not downloaded; skipping"),
        }
    }

    let target_artifact = take(target).ok_or_else(|| {
        Error::planning(format!("downloaded artifacts do not include target {target}"))
    })?;
    Ok((dependencies, target_artifact))
}
