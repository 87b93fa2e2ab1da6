//! Multi-project resolution runs.
//!
//! Each project resolves independently (in parallel when beneficial), then
//! policy coordination forces group members onto their shared version and
//! re-validates them. One project's failure never aborts its siblings; the
//! run returns per-project outcomes.

use crate::calver::CalVerCalculator;
use crate::error::Result;
use crate::git::GitHistory;
use crate::policy::{VersionPolicy, VersionPolicyCoordinator};
use crate::resolver::{ProjectSpec, SchemeConfig, VersionResolver, VersionResult, VersioningRequest};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of one run: per-project results in project-name order.
pub type RunOutcome = Vec<(String, Result<VersionResult>)>;

/// Resolve every request against one repository and apply the version
/// policy across the successful results.
pub fn resolve_all<H: GitHistory>(
    history: &H,
    projects: &[ProjectSpec],
    requests: &[VersioningRequest],
    policy: &VersionPolicy,
) -> RunOutcome {
    let resolver = VersionResolver::new(history, projects);

    let mut outcomes: Vec<(String, Result<VersionResult>)> = requests
        .par_iter()
        .map(|request| {
            let outcome = resolver.resolve(request);
            if let Err(ref e) = outcome {
                warn!(project = %request.project, error = %e, "resolution failed");
            }
            (request.project.clone(), outcome)
        })
        .collect();

    apply_policy(&resolver, requests, policy, &mut outcomes);

    outcomes.sort_by(|a, b| a.0.cmp(&b.0));
    outcomes
}

fn apply_policy<H: GitHistory>(
    resolver: &VersionResolver<'_, H>,
    requests: &[VersioningRequest],
    policy: &VersionPolicy,
    outcomes: &mut [(String, Result<VersionResult>)],
) {
    let computed: HashMap<String, _> = outcomes
        .iter()
        .filter_map(|(project, outcome)| {
            outcome
                .as_ref()
                .ok()
                .map(|r| (project.clone(), r.version.clone()))
        })
        .collect();

    let coordinator = VersionPolicyCoordinator::new(policy.clone());
    let (overrides, conflicts) = coordinator.coordinate(&computed);

    let requests_by_project: HashMap<&str, &VersioningRequest> = requests
        .iter()
        .map(|r| (r.project.as_str(), r))
        .collect();

    for (project, outcome) in outcomes.iter_mut() {
        if let Some(groups) = conflicts.get(project) {
            // Surface the configuration conflict in place of the result
            *outcome = Err(crate::error::MonoverError::GroupConflict {
                project: project.clone(),
                groups: groups.clone(),
            });
            continue;
        }

        let Some(coordinated) = overrides.get(project) else {
            continue;
        };
        let Ok(result) = outcome.as_mut() else {
            continue;
        };
        let Some(request) = requests_by_project.get(project.as_str()) else {
            continue;
        };

        if result.version != coordinated.version {
            debug!(
                %project,
                from = %result.version,
                to = %coordinated.version,
                group = %coordinated.group,
                "policy override"
            );
            result.changed = true;
            result.reason = format!("version group '{}'", coordinated.group);
            result.version = coordinated.version.clone();
        }
        result.version_string = render(request, result);
        result.group = Some(coordinated.group.clone());
        result.shared_with = coordinated.siblings.clone();
        resolver.revalidate(request, result);
    }
}

fn render(request: &VersioningRequest, result: &VersionResult) -> String {
    match &request.scheme {
        SchemeConfig::SemVer => result.version.to_string(),
        SchemeConfig::CalVer {
            scheme,
            reset_patch_periodically,
        } => CalVerCalculator::new(*scheme)
            .with_reset(*reset_patch_periodically)
            .format(&result.version),
    }
}
