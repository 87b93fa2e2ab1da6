//! Per-project version resolution.
//!
//! One resolution walks a fixed pipeline: locate the base tag, classify the
//! branch, gather change evidence (commits, file patterns, dependency
//! propagation), then compute the new version under the configured scheme
//! and branch policy, and validate it. Identical git state and
//! configuration always produce an identical result.

use crate::analyzer::{
    ChangeEvidence, CommitClassifier, CommitPatterns, CommitVerdict, FileChangeClassifier,
    FilePatterns,
};
use crate::calver::{CalVerCalculator, CalVerScheme};
use crate::constraints::{Constraints, ConstraintValidator, ValidationResult};
use crate::domain::prerelease::next_counter;
use crate::domain::{BranchContext, BranchKind, BumpType, PreReleaseType, SemVer, TagParser, TagScope};
use crate::error::Result;
use crate::git::GitHistory;
use crate::graph::DependencyGraph;
use crate::warnings::ResolutionWarning;
use chrono::NaiveDate;
use git2::Oid;
use std::collections::HashMap;
use tracing::{debug, info};

/// Versioning scheme selection with its configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemeConfig {
    SemVer,
    CalVer {
        scheme: CalVerScheme,
        reset_patch_periodically: bool,
    },
}

impl SchemeConfig {
    pub fn kind(&self) -> SchemeKind {
        match self {
            SchemeConfig::SemVer => SchemeKind::SemVer,
            SchemeConfig::CalVer { .. } => SchemeKind::CalVer,
        }
    }
}

impl Default for SchemeConfig {
    fn default() -> Self {
        SchemeConfig::SemVer
    }
}

/// Which scheme produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    SemVer,
    CalVer,
}

impl std::fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemeKind::SemVer => write!(f, "semver"),
            SchemeKind::CalVer => write!(f, "calver"),
        }
    }
}

/// How feature branches derive their version.
///
/// Both observed behaviors are supported; the default bumps patch and
/// appends `{branch}.{height}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureBumpStrategy {
    /// Patch floor, prerelease `{branch}.{commit-height}`.
    #[default]
    PatchWithHeight,
    /// Minor floor, prerelease `{branch}`.
    MinorWithLabel,
}

/// A project known to the resolver: where it lives and what it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub name: String,
    /// Repository-relative directory; empty means the repository root.
    pub dir: String,
    /// Direct project references.
    pub dependencies: Vec<String>,
}

/// Everything one resolution needs.
#[derive(Debug, Clone)]
pub struct VersioningRequest {
    pub project: String,
    /// Branch to resolve on; defaults to the checked-out branch.
    pub branch: Option<String>,
    /// Tag prefix, commonly "v".
    pub tag_prefix: String,
    /// Starting version when no tag exists.
    pub base_version: Option<SemVer>,
    /// Prerelease label appended on main/dev branches.
    pub prerelease: Option<PreReleaseType>,
    /// Additional direct dependencies beyond the project spec.
    pub dependencies: Vec<String>,
    pub commit_patterns: CommitPatterns,
    pub file_patterns: FilePatterns,
    /// Paths outside the project directory that count as project changes.
    pub monitored_paths: Vec<String>,
    pub scheme: SchemeConfig,
    pub constraints: Constraints,
    pub feature_strategy: FeatureBumpStrategy,
    /// Approval flag consumed by the major-approval constraint.
    pub major_approved: bool,
    /// Skip computation and emit exactly this version.
    pub force_version: Option<SemVer>,
    /// Fixed observation date for CalVer; defaults to today.
    pub as_of: Option<NaiveDate>,
}

impl VersioningRequest {
    pub fn new(project: impl Into<String>) -> Self {
        VersioningRequest {
            project: project.into(),
            branch: None,
            tag_prefix: "v".to_string(),
            base_version: None,
            prerelease: None,
            dependencies: Vec::new(),
            commit_patterns: CommitPatterns::default(),
            file_patterns: FilePatterns::default(),
            monitored_paths: Vec::new(),
            scheme: SchemeConfig::SemVer,
            constraints: Constraints::default(),
            feature_strategy: FeatureBumpStrategy::default(),
            major_approved: false,
            force_version: None,
            as_of: None,
        }
    }
}

/// The resolved version and everything that explains it.
#[derive(Debug, Clone)]
pub struct VersionResult {
    pub project: String,
    pub version: SemVer,
    pub version_string: String,
    pub changed: bool,
    pub reason: String,
    pub bump: BumpType,
    pub branch: BranchKind,
    pub branch_name: String,
    pub commit_height: usize,
    pub scheme: SchemeKind,
    /// The base tag's version, when a tag was found.
    pub base: Option<SemVer>,
    /// Set when policy coordination forced this version.
    pub group: Option<String>,
    pub shared_with: Vec<String>,
    /// Per-commit classification, for changelog rendering downstream.
    pub commit_verdicts: Vec<CommitVerdict>,
    pub validation: Option<ValidationResult>,
    pub warnings: Vec<ResolutionWarning>,
}

struct BaseTag {
    version: SemVer,
    target: Option<Oid>,
    name: Option<String>,
}

/// Resolves versions for the projects of one repository.
pub struct VersionResolver<'a, H: GitHistory> {
    history: &'a H,
    dirs: HashMap<String, String>,
    graph: DependencyGraph,
}

impl<'a, H: GitHistory> VersionResolver<'a, H> {
    pub fn new(history: &'a H, projects: &[ProjectSpec]) -> Self {
        let mut graph = DependencyGraph::new();
        let mut dirs = HashMap::new();
        for spec in projects {
            graph.add_project(&spec.name);
            dirs.insert(spec.name.clone(), normalize_dir(&spec.dir));
            for dep in &spec.dependencies {
                graph.add_dependency(&spec.name, dep);
            }
        }
        VersionResolver {
            history,
            dirs,
            graph,
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Resolve one project to its [VersionResult].
    pub fn resolve(&self, request: &VersioningRequest) -> Result<VersionResult> {
        let mut warnings = Vec::new();

        let branch_name = match &request.branch {
            Some(name) => name.clone(),
            None => self.history.current_branch()?,
        };
        let branch = BranchContext::classify(branch_name);

        let configured_base = request
            .base_version
            .clone()
            .unwrap_or_else(|| SemVer::new(0, 1, 0));

        // An empty repository resolves to the configured base, unchanged,
        // unless a forced version overrides even that
        let tip = match self.history.head_of(&branch.name) {
            Ok(tip) => tip,
            Err(_) => {
                warnings.push(ResolutionWarning::EmptyHistory);
                if let Some(ref forced) = request.force_version {
                    let validation = ConstraintValidator::new(request.constraints.clone())
                        .validate(forced, None, request.major_approved);
                    let mut result = self.unchanged_result(
                        request,
                        &branch,
                        forced.clone(),
                        None,
                        "forced version".to_string(),
                        warnings,
                    );
                    result.changed = true;
                    result.validation = Some(validation);
                    return Ok(result);
                }
                return Ok(self.unchanged_result(
                    request,
                    &branch,
                    configured_base,
                    None,
                    "empty history".to_string(),
                    warnings,
                ));
            }
        };

        if self.history.is_shallow() {
            warnings.push(ResolutionWarning::ShallowHistory {
                fallback: configured_base.to_string(),
            });
        }

        let parser = TagParser::new(&request.tag_prefix)?;
        let (base, applicable) =
            self.base_tag(&request.project, &parser, tip, &branch.name, &mut warnings)?;

        let base = match base {
            Some(base) => base,
            None => BaseTag {
                version: configured_base.clone(),
                target: None,
                name: None,
            },
        };
        let previous = base.name.as_ref().map(|_| base.version.clone());

        // A forced version short-circuits everything after base-tag lookup
        if let Some(ref forced) = request.force_version {
            let changed = previous.as_ref().map(|p| p != forced).unwrap_or(true);
            let validation = ConstraintValidator::new(request.constraints.clone()).validate(
                forced,
                previous.as_ref(),
                request.major_approved,
            );
            info!(project = %request.project, version = %forced, "forced version");
            return Ok(VersionResult {
                project: request.project.clone(),
                version: forced.clone(),
                version_string: forced.to_string(),
                changed,
                reason: "forced version".to_string(),
                bump: BumpType::None,
                branch: branch.kind,
                branch_name: branch.name,
                commit_height: 0,
                scheme: request.scheme.kind(),
                base: previous,
                group: None,
                shared_with: Vec::new(),
                commit_verdicts: Vec::new(),
                validation: Some(validation),
                warnings,
            });
        }

        let evidence_range = base.target;
        let commits = self.history.commits_between(evidence_range, tip)?;
        let commit_height = commits.len();
        let changed_files = self.history.changed_files_between(evidence_range, tip)?;

        // Only files under the project scope feed classification
        let scope = self.project_scope(request);
        let project_files: Vec<String> = changed_files
            .iter()
            .filter(|f| scope.iter().any(|dir| under_dir(f, dir)))
            .cloned()
            .collect();

        let file_classifier = FileChangeClassifier::new(&request.file_patterns)?;
        let file_evidence = file_classifier.classify(&project_files);
        let own_changed = file_evidence.bump > BumpType::None;

        let commit_classifier = CommitClassifier::new(request.commit_patterns.clone());
        let (commit_bump, commit_verdicts) = commit_classifier.classify(&commits);

        // Dependency propagation only matters when the project itself is quiet
        let matched_dependency = if own_changed {
            None
        } else {
            self.changed_dependency(request, &parser, tip, &mut warnings)?
        };

        let evidence = ChangeEvidence {
            from_commits: if own_changed { commit_bump } else { BumpType::None },
            from_files: file_evidence.bump,
            ignored_only: file_evidence.ignored_only,
            changed_files: file_evidence.relevant,
            matched_dependency,
        };

        if !evidence.is_changed() {
            let reason = match &base.name {
                Some(name) => format!("no change evidence since {}", name),
                None => "no tags and no change evidence".to_string(),
            };
            debug!(project = %request.project, "unchanged");
            let mut result = self.unchanged_result(
                request,
                &branch,
                base.version.clone(),
                previous,
                reason,
                warnings,
            );
            result.commit_height = commit_height;
            result.commit_verdicts = commit_verdicts;
            return Ok(result);
        }

        // Dependency-only evidence bumps at patch level
        let bump = evidence.bump().at_least(BumpType::Patch);
        let had_base_tag = base.name.is_some();

        let (version, version_string) = self.compute_version(
            request,
            &branch,
            &base,
            had_base_tag,
            bump,
            commit_height,
            &applicable,
        )?;

        let reason = match &evidence.matched_dependency {
            Some(dep) => format!("dependency {} changed", dep),
            None => match &base.name {
                Some(name) => format!("{} change since {}", bump, name),
                None => "first release".to_string(),
            },
        };

        let validation = ConstraintValidator::new(request.constraints.clone()).validate(
            &version,
            previous.as_ref(),
            request.major_approved,
        );

        info!(
            project = %request.project,
            version = %version_string,
            %bump,
            branch = %branch.kind,
            "resolved"
        );

        Ok(VersionResult {
            project: request.project.clone(),
            version,
            version_string,
            changed: true,
            reason,
            bump,
            branch: branch.kind,
            branch_name: branch.name,
            commit_height,
            scheme: request.scheme.kind(),
            base: previous,
            group: None,
            shared_with: Vec::new(),
            commit_verdicts,
            validation: Some(validation),
            warnings,
        })
    }

    /// Re-validate a result after policy coordination replaced its version.
    pub fn revalidate(&self, request: &VersioningRequest, result: &mut VersionResult) {
        let validation = ConstraintValidator::new(request.constraints.clone()).validate(
            &result.version,
            result.base.as_ref(),
            request.major_approved,
        );
        result.validation = Some(validation);
    }

    fn unchanged_result(
        &self,
        request: &VersioningRequest,
        branch: &BranchContext,
        version: SemVer,
        base: Option<SemVer>,
        reason: String,
        warnings: Vec<ResolutionWarning>,
    ) -> VersionResult {
        let version_string = match &request.scheme {
            SchemeConfig::SemVer => version.to_string(),
            SchemeConfig::CalVer {
                scheme,
                reset_patch_periodically,
            } => CalVerCalculator::new(*scheme)
                .with_reset(*reset_patch_periodically)
                .format(&version),
        };
        VersionResult {
            project: request.project.clone(),
            version_string,
            version,
            changed: false,
            reason,
            bump: BumpType::None,
            branch: branch.kind,
            branch_name: branch.name.clone(),
            commit_height: 0,
            scheme: request.scheme.kind(),
            base,
            group: None,
            shared_with: Vec::new(),
            commit_verdicts: Vec::new(),
            validation: None,
            warnings,
        }
    }

    /// Find the base tag: the highest applicable version among tags
    /// reachable from the tip. Returns the winner plus every applicable
    /// parsed version (used for prerelease counter continuation).
    fn base_tag(
        &self,
        project: &str,
        parser: &TagParser,
        tip: Oid,
        branch: &str,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> Result<(Option<BaseTag>, Vec<SemVer>)> {
        let mut best: Option<(SemVer, bool, String, Oid)> = None;
        let mut applicable = Vec::new();

        for tag in self.history.list_tags()? {
            let parsed = match parser.parse(&tag.name) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!(tag = %tag.name, "skipping unparsable tag");
                    warnings.push(ResolutionWarning::UnparsableTag {
                        tag: tag.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if !parsed.scope.applies_to(project) {
                continue;
            }
            if !self.history.is_ancestor(tag.target, tip)? {
                warnings.push(ResolutionWarning::UnreachableTag {
                    tag: tag.name.clone(),
                    branch: branch.to_string(),
                });
                continue;
            }

            applicable.push(parsed.version.clone());
            let specific = matches!(parsed.scope, TagScope::Project(_));
            let better = match &best {
                None => true,
                Some((version, best_specific, _, _)) => {
                    // project-specific wins a tie at equal versions
                    parsed.version > *version
                        || (parsed.version == *version && specific && !best_specific)
                }
            };
            if better {
                best = Some((parsed.version, specific, tag.name.clone(), tag.target));
            }
        }

        Ok((
            best.map(|(version, _, name, target)| BaseTag {
                version,
                target: Some(target),
                name: Some(name),
            }),
            applicable,
        ))
    }

    /// Directories whose changes count as this project's own changes.
    fn project_scope(&self, request: &VersioningRequest) -> Vec<String> {
        let mut scope = Vec::new();
        scope.push(
            self.dirs
                .get(&request.project)
                .cloned()
                .unwrap_or_default(),
        );
        for path in &request.monitored_paths {
            scope.push(normalize_dir(path));
        }
        scope
    }

    /// First transitive dependency that changed since its own base tag.
    fn changed_dependency(
        &self,
        request: &VersioningRequest,
        parser: &TagParser,
        tip: Oid,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> Result<Option<String>> {
        if self.graph.is_in_cycle(&request.project) {
            warnings.push(ResolutionWarning::DependencyCycle {
                project: request.project.clone(),
            });
        }

        let mut deps = self.graph.dependencies_of(&request.project);
        for extra in &request.dependencies {
            if !deps.contains(extra) && *extra != request.project {
                deps.push(extra.clone());
                for transitive in self.graph.dependencies_of(extra) {
                    if !deps.contains(&transitive) && transitive != request.project {
                        deps.push(transitive);
                    }
                }
            }
        }
        deps.sort();

        for dep in deps {
            let Some(dir) = self.dirs.get(&dep) else {
                debug!(dependency = %dep, "unknown dependency; skipping");
                continue;
            };
            // The dependency's change window starts at its own base tag
            let mut dep_warnings = Vec::new();
            let (dep_base, _) =
                self.base_tag(&dep, parser, tip, "", &mut dep_warnings)?;
            let since = dep_base.and_then(|b| b.target);
            let files = self.history.changed_files_between(since, tip)?;
            if files.iter().any(|f| under_dir(f, dir)) {
                debug!(project = %request.project, dependency = %dep, "dependency changed");
                return Ok(Some(dep));
            }
        }
        Ok(None)
    }

    fn compute_version(
        &self,
        request: &VersioningRequest,
        branch: &BranchContext,
        base: &BaseTag,
        had_base_tag: bool,
        bump: BumpType,
        commit_height: usize,
        applicable: &[SemVer],
    ) -> Result<(SemVer, String)> {
        let triple = match &request.scheme {
            SchemeConfig::SemVer => {
                self.semver_triple(request, branch, base, had_base_tag, bump)?
            }
            SchemeConfig::CalVer {
                scheme,
                reset_patch_periodically,
            } => {
                let calc = CalVerCalculator::new(*scheme)
                    .with_reset(*reset_patch_periodically);
                let date = request
                    .as_of
                    .unwrap_or_else(|| chrono::Utc::now().date_naive());
                let previous = had_base_tag.then_some(&base.version);
                calc.calculate(previous, date)
            }
        };

        let version = self.apply_branch_prerelease(
            request,
            branch,
            triple,
            commit_height,
            applicable,
        );

        let version_string = match &request.scheme {
            SchemeConfig::SemVer => version.to_string(),
            SchemeConfig::CalVer {
                scheme,
                reset_patch_periodically,
            } => CalVerCalculator::new(*scheme)
                .with_reset(*reset_patch_periodically)
                .format(&version),
        };

        Ok((version, version_string))
    }

    fn semver_triple(
        &self,
        request: &VersioningRequest,
        branch: &BranchContext,
        base: &BaseTag,
        had_base_tag: bool,
        bump: BumpType,
    ) -> Result<SemVer> {
        // First release: the configured base version is emitted as-is
        if !had_base_tag {
            return Ok(base.version.release());
        }

        // A prerelease base tag means a cycle is in progress on this triple;
        // patch-level evidence rebuilds it instead of advancing past it
        if base.version.is_prerelease() && bump <= BumpType::Patch {
            return Ok(base.version.release());
        }

        let bumped = match branch.kind {
            BranchKind::Feature => {
                let floor = match request.feature_strategy {
                    FeatureBumpStrategy::PatchWithHeight => BumpType::Patch,
                    FeatureBumpStrategy::MinorWithLabel => BumpType::Minor,
                };
                base.version.release().bump(bump.at_least(floor))
            }
            _ => base.version.release().bump(bump),
        };

        // A release branch may name its target version (release/1.1)
        if branch.kind == BranchKind::Release {
            if let Some(target) = branch.release_target() {
                if let Ok(target) = SemVer::parse(target) {
                    let target = target.release();
                    if target > bumped {
                        return Ok(target);
                    }
                }
            }
        }

        Ok(bumped)
    }

    fn apply_branch_prerelease(
        &self,
        request: &VersioningRequest,
        branch: &BranchContext,
        triple: SemVer,
        commit_height: usize,
        applicable: &[SemVer],
    ) -> SemVer {
        let same_triple: Vec<&[String]> = applicable
            .iter()
            .filter(|v| v.same_triple(&triple))
            .map(|v| v.prerelease.as_slice())
            .collect();

        match branch.kind {
            BranchKind::Main | BranchKind::Dev => match &request.prerelease {
                Some(label) => {
                    let label = label.label();
                    let counter = next_counter(&label, same_triple);
                    triple.with_prerelease(format!("{}.{}", label, counter))
                }
                None => triple,
            },
            BranchKind::Release => {
                let counter = next_counter("rc", same_triple);
                triple.with_prerelease(format!("rc.{}", counter))
            }
            BranchKind::Feature => match request.feature_strategy {
                FeatureBumpStrategy::PatchWithHeight => triple.with_prerelease(format!(
                    "{}.{}",
                    branch.normalized, commit_height
                )),
                FeatureBumpStrategy::MinorWithLabel => {
                    triple.with_prerelease(branch.normalized.clone())
                }
            },
        }
    }
}

fn normalize_dir(dir: &str) -> String {
    dir.trim_matches('/').to_string()
}

/// Whether `path` lives under `dir` (empty dir means the repository root).
fn under_dir(path: &str, dir: &str) -> bool {
    if dir.is_empty() {
        return true;
    }
    path == dir || path.starts_with(&format!("{}/", dir))
}
