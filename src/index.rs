//! Snapshot of the packages installed on the remote target.

use anyhow::Context;
use log::debug;

use crate::error::Result;
use crate::executor::RemoteExecutor;
use crate::requirement::PackageName;
use crate::scope::Scope;
use crate::version::Version;

/// One row of the remote inventory. Immutable for the duration of one
/// planning cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePackageRecord {
    pub name: PackageName,
    pub version: Version,
    pub scope: Scope,
}

impl RemotePackageRecord {
    pub fn new(name: impl Into<String>, version: &str, scope: Scope) -> Self {
        RemotePackageRecord {
            name: PackageName::new(name),
            version: Version::parse(version),
            scope,
        }
    }
}

/// In-memory view of the remote inventory.
///
/// One snapshot backs one whole resolution request, so planning never
/// observes a half-installed state from interleaved queries. Read-only after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    records: Vec<RemotePackageRecord>,
}

impl PackageIndex {
    /// Query the remote target once and capture its inventory.
    pub async fn snapshot(executor: &dyn RemoteExecutor) -> Result<Self> {
        let records = executor
            .inventory()
            .await
            .context("failed to query remote package inventory")?;
        debug!("remote inventory snapshot: {} packages", records.len());
        Ok(PackageIndex { records })
    }

    pub fn from_records(records: Vec<RemotePackageRecord>) -> Self {
        PackageIndex { records }
    }

    /// Look up a package by normalized name.
    pub fn find(&self, name: &PackageName) -> Option<&RemotePackageRecord> {
        self.records.iter().find(|record| &record.name == name)
    }

    pub fn contains(&self, name: &PackageName) -> bool {
        self.find(name).is_some()
    }

    pub fn records(&self) -> &[RemotePackageRecord] {
        &self.records
    }
}
