//! Decides which packages actually need to be shipped to the remote target.

use log::debug;

use crate::index::PackageIndex;
use crate::requirement::{PackageName, RequirementSpec};
use crate::version::{Version, satisfies};

/// The work left to do for one install call. Produced once, consumed
/// immediately by the fetch stage; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallPlan {
    pub target: PackageName,
    pub required_installs: Vec<PackageName>,
}

/// Outcome of planning a single install.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The target requirement is already met on the remote target; the
    /// transaction stage must not be contacted.
    pub already_satisfied: bool,
    pub plan: InstallPlan,
}

/// Evaluates requirements against one inventory snapshot.
pub struct DependencyResolver<'a> {
    index: &'a PackageIndex,
    target: PackageName,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(index: &'a PackageIndex, target: PackageName) -> Self {
        DependencyResolver { index, target }
    }

    /// Version of the target currently installed remotely, if any.
    pub fn installed_version(&self) -> Option<&Version> {
        self.index.find(&self.target).map(|record| &record.version)
    }

    /// Is the target requirement already met?
    ///
    /// An existing install always wins when no upgrade was requested. With
    /// `upgrade`, the installed version must be at least the requested one;
    /// if no version was requested, presence alone satisfies. An empty
    /// installed version never satisfies an upgrade.
    pub fn requirement_met(&self, upgrade: bool, requested: Option<&Version>) -> bool {
        let Some(record) = self.index.find(&self.target) else {
            return false;
        };
        if !upgrade {
            return true;
        }
        match requested {
            None => true,
            Some(wanted) => !record.version.is_empty() && record.version >= *wanted,
        }
    }

    pub fn plan_install(&self, upgrade: bool, requested: Option<&Version>) -> PlanOutcome {
        let already_satisfied = self.requirement_met(upgrade, requested);
        let required_installs = if already_satisfied {
            Vec::new()
        } else {
            vec![self.target.clone()]
        };
        debug!(
            "plan for {}: already_satisfied={already_satisfied}",
            self.target
        );
        PlanOutcome {
            already_satisfied,
            plan: InstallPlan {
                target: self.target.clone(),
                required_installs,
            },
        }
    }

    /// Which of the target's transitive requirements must be installed.
    ///
    /// A requirement is needed when it is absent from the inventory or its
    /// installed version fails the declared constraints. The target itself is
    /// always included to force re-resolution of its own constraint set at
    /// install time. Evaluation follows the order the requirements were
    /// declared upstream; names are only deduplicated after normalization.
    pub fn required_installs(&self, requirements: &[RequirementSpec]) -> Vec<PackageName> {
        let mut required: Vec<PackageName> = Vec::new();
        for requirement in requirements {
            let met = match self.index.find(&requirement.name) {
                None => false,
                Some(record) => satisfies(&record.version, &requirement.constraints),
            };
            if (!met || requirement.name == self.target)
                && !required.contains(&requirement.name)
            {
                debug!("requirement {} needs install", requirement);
                required.push(requirement.name.clone());
            }
        }
        required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RemotePackageRecord;
    use crate::scope::Scope;

    fn index(records: &[(&str, &str)]) -> PackageIndex {
        PackageIndex::from_records(
            records
                .iter()
                .map(|(name, version)| RemotePackageRecord::new(*name, version, Scope::Private))
                .collect(),
        )
    }

    fn reqs(lines: &[&str]) -> Vec<RequirementSpec> {
        lines.iter().map(|line| line.parse().unwrap()).collect()
    }

    #[test]
    fn test_absent_target_is_not_satisfied() {
        let index = index(&[]);
        let resolver = DependencyResolver::new(&index, "astor".into());

        let outcome = resolver.plan_install(false, Some(&Version::parse("0.8.1")));
        assert!(!outcome.already_satisfied);
        assert_eq!(outcome.plan.required_installs, vec![PackageName::new("astor")]);
    }

    #[test]
    fn test_existing_install_wins_without_upgrade() {
        let index = index(&[("astor", "0.7.0")]);
        let resolver = DependencyResolver::new(&index, "astor".into());

        // Even an older installed version satisfies when upgrade is off.
        let outcome = resolver.plan_install(false, Some(&Version::parse("0.8.1")));
        assert!(outcome.already_satisfied);
        assert!(outcome.plan.required_installs.is_empty());
    }

    #[test]
    fn test_upgrade_monotonicity() {
        let index = index(&[("pkg", "1.0.0")]);
        let resolver = DependencyResolver::new(&index, "pkg".into());

        // Requesting an older version with upgrade on is already satisfied:
        // no downgrade is ever attempted.
        assert!(resolver.requirement_met(true, Some(&Version::parse("0.9.0"))));
        // Requesting a newer version proceeds.
        assert!(!resolver.requirement_met(true, Some(&Version::parse("2.0.0"))));
        // Equal is satisfied.
        assert!(resolver.requirement_met(true, Some(&Version::parse("1.0.0"))));
    }

    #[test]
    fn test_upgrade_without_version_presence_satisfies() {
        let index = index(&[("pkg", "1.0.0")]);
        let resolver = DependencyResolver::new(&index, "pkg".into());
        assert!(resolver.requirement_met(true, None));
    }

    #[test]
    fn test_empty_installed_version_never_satisfies_upgrade() {
        let index = index(&[("pkg", "")]);
        let resolver = DependencyResolver::new(&index, "pkg".into());
        assert!(!resolver.requirement_met(true, Some(&Version::parse("0.1"))));
        // ... but presence alone still wins when no upgrade was asked for.
        assert!(resolver.requirement_met(false, Some(&Version::parse("0.1"))));
    }

    #[test]
    fn test_required_installs_includes_target_and_unmet_deps() {
        // Remote has pkgB 1.0 but pkgA needs pkgB >= 2.0.
        let index = index(&[("pkgB", "1.0")]);
        let resolver = DependencyResolver::new(&index, "pkgA".into());

        let required = resolver.required_installs(&reqs(&["pkgA", "pkgB>=2.0"]));
        assert_eq!(
            required,
            vec![PackageName::new("pkgA"), PackageName::new("pkgB")]
        );
    }

    #[test]
    fn test_required_installs_skips_satisfied_deps() {
        let index = index(&[("six", "1.16.0")]);
        let resolver = DependencyResolver::new(&index, "pkgA".into());

        let required = resolver.required_installs(&reqs(&["pkgA", "six>=1.5"]));
        assert_eq!(required, vec![PackageName::new("pkgA")]);
    }

    #[test]
    fn test_required_installs_target_always_included() {
        // Target present and satisfied, but still re-resolved at install time.
        let index = index(&[("pkgA", "1.0"), ("dep", "2.0")]);
        let resolver = DependencyResolver::new(&index, "pkgA".into());

        let required = resolver.required_installs(&reqs(&["dep>=1.0", "pkgA==1.0"]));
        assert_eq!(required, vec![PackageName::new("pkgA")]);
    }

    #[test]
    fn test_required_installs_keeps_declaration_order() {
        let index = index(&[]);
        let resolver = DependencyResolver::new(&index, "top".into());

        let required = resolver.required_installs(&reqs(&["zzz", "aaa", "mmm"]));
        assert_eq!(
            required,
            vec![
                PackageName::new("zzz"),
                PackageName::new("aaa"),
                PackageName::new("mmm")
            ]
        );
    }

    #[test]
    fn test_required_installs_dedupes_normalized_names() {
        let index = index(&[]);
        let resolver = DependencyResolver::new(&index, "top".into());

        let required = resolver.required_installs(&reqs(&["Foo-Bar>=1.0", "foo_bar"]));
        assert_eq!(required, vec![PackageName::new("foo_bar")]);
    }

    #[test]
    fn test_bare_presence_meets_unconstrained_requirement() {
        let index = index(&[("dep", "0.1")]);
        let resolver = DependencyResolver::new(&index, "top".into());

        let required = resolver.required_installs(&reqs(&["dep"]));
        assert!(required.is_empty());
    }
}
