//! Cross-project version policy: independent, lock-step, or grouped.

use crate::domain::SemVer;
use globset::Glob;
use std::collections::HashMap;
use tracing::debug;

/// A named set of projects sharing one version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionGroup {
    pub name: String,
    /// Member patterns: exact names or wildcards (`services-*`).
    pub members: Vec<String>,
    /// Floor for the shared version.
    pub base_version: Option<SemVer>,
}

impl VersionGroup {
    fn matches(&self, project: &str) -> bool {
        self.members.iter().any(|pattern| {
            if pattern == project {
                return true;
            }
            if pattern.contains('*') || pattern.contains('?') {
                if let Ok(glob) = Glob::new(pattern) {
                    return glob.compile_matcher().is_match(project);
                }
            }
            false
        })
    }
}

/// How versions are shared across the projects of one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VersionPolicy {
    /// No cross-project effect.
    #[default]
    Independent,
    /// Every project shares the single highest version.
    LockStep { base_version: Option<SemVer> },
    /// Named groups share versions; ungrouped projects stay independent.
    Grouped { groups: Vec<VersionGroup> },
}

/// The forced version a coordinated project ends up with.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatedVersion {
    pub version: SemVer,
    pub group: String,
    /// The other projects sharing this version.
    pub siblings: Vec<String>,
}

/// Applies a [VersionPolicy] over independently computed versions.
pub struct VersionPolicyCoordinator {
    policy: VersionPolicy,
}

impl VersionPolicyCoordinator {
    pub fn new(policy: VersionPolicy) -> Self {
        VersionPolicyCoordinator { policy }
    }

    /// Compute per-project overrides from independently computed versions.
    ///
    /// Returns the overrides plus, per conflicted project, the names of the
    /// groups claiming it; a project claimed by two groups fails alone
    /// without affecting the rest of the run.
    pub fn coordinate(
        &self,
        computed: &HashMap<String, SemVer>,
    ) -> (
        HashMap<String, CoordinatedVersion>,
        HashMap<String, Vec<String>>,
    ) {
        let groups: Vec<VersionGroup> = match &self.policy {
            VersionPolicy::Independent => return (HashMap::new(), HashMap::new()),
            VersionPolicy::LockStep { base_version } => vec![VersionGroup {
                name: "lockstep".to_string(),
                members: vec!["*".to_string()],
                base_version: base_version.clone(),
            }],
            VersionPolicy::Grouped { groups } => groups.clone(),
        };

        let mut errors = HashMap::new();
        let mut membership: HashMap<&str, &VersionGroup> = HashMap::new();

        for project in computed.keys() {
            let matched: Vec<&VersionGroup> =
                groups.iter().filter(|g| g.matches(project)).collect();
            match matched.as_slice() {
                [] => {}
                [group] => {
                    membership.insert(project.as_str(), *group);
                }
                many => {
                    errors.insert(
                        project.clone(),
                        many.iter().map(|g| g.name.clone()).collect(),
                    );
                }
            }
        }

        let mut overrides = HashMap::new();
        for group in &groups {
            let members: Vec<&str> = membership
                .iter()
                .filter(|(_, g)| g.name == group.name)
                .map(|(p, _)| *p)
                .collect();
            if members.is_empty() {
                continue;
            }

            // The shared version is the highest member version, floored by
            // the group's own base version
            let mut shared = members
                .iter()
                .filter_map(|p| computed.get(*p))
                .max()
                .cloned()
                .expect("group has members");
            if let Some(ref base) = group.base_version {
                if base > &shared {
                    shared = base.clone();
                }
            }
            debug!(group = %group.name, version = %shared, "coordinated group version");

            let mut sorted_members: Vec<String> =
                members.iter().map(|m| m.to_string()).collect();
            sorted_members.sort();

            for member in &sorted_members {
                let siblings: Vec<String> = sorted_members
                    .iter()
                    .filter(|m| *m != member)
                    .cloned()
                    .collect();
                overrides.insert(
                    member.clone(),
                    CoordinatedVersion {
                        version: shared.clone(),
                        group: group.name.clone(),
                        siblings,
                    },
                );
            }
        }

        (overrides, errors)
    }
}
