//! Configuration model: partial TOML layers merged by precedence.
//!
//! Callers load any number of partial layers (user config, repository
//! config, CLI overrides) and merge them with [merge_layers]; later layers
//! override earlier ones field by field. The merged [ResolvedConfig] is
//! immutable and is the single configuration value the engine consumes.

use crate::analyzer::{CommitPatterns, FilePatterns};
use crate::calver::CalVerScheme;
use crate::constraints::{Constraints, CustomRule};
use crate::domain::{BumpType, PreReleaseType, SemVer};
use crate::error::{MonoverError, Result};
use crate::policy::{VersionGroup, VersionPolicy};
use crate::resolver::{FeatureBumpStrategy, ProjectSpec, SchemeConfig, VersioningRequest};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One partial configuration layer as read from a TOML file.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub tag_prefix: Option<String>,
    pub base_version: Option<String>,
    pub prerelease: Option<String>,
    pub scheme: Option<SchemeSection>,
    pub feature_strategy: Option<String>,
    pub commits: Option<CommitsSection>,
    pub files: Option<FilesSection>,
    pub monitored_paths: Option<Vec<String>>,
    pub constraints: Option<ConstraintsSection>,
    pub policy: Option<PolicySection>,
    pub projects: Option<BTreeMap<String, ProjectSection>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct SchemeSection {
    /// "semver" (default) or "calver"
    pub kind: Option<String>,
    /// CalVer pattern, e.g. "YYYY.MM.PATCH"
    pub calver: Option<String>,
    pub reset_patch_periodically: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct CommitsSection {
    pub major: Option<Vec<String>>,
    pub minor: Option<Vec<String>>,
    pub patch: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FilesSection {
    pub ignore: Option<Vec<String>>,
    pub major: Option<Vec<String>>,
    pub minor: Option<Vec<String>>,
    pub patch: Option<Vec<String>>,
    /// Bucket for unmatched files: "patch" (default), "minor", "major", "none"
    pub unmatched: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ConstraintsSection {
    pub minimum_version: Option<String>,
    pub maximum_version: Option<String>,
    pub allowed_range: Option<String>,
    pub blocked_versions: Option<Vec<String>>,
    pub require_monotonic_increase: Option<bool>,
    pub require_major_approval: Option<bool>,
    pub custom_rules: Option<Vec<RuleSection>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RuleSection {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    /// "independent" (default), "lockstep", or "grouped"
    pub strategy: Option<String>,
    pub base_version: Option<String>,
    pub groups: Option<Vec<GroupSection>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct GroupSection {
    pub name: String,
    pub members: Vec<String>,
    pub base_version: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub dir: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// The fully merged, typed configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub tag_prefix: String,
    pub base_version: Option<SemVer>,
    pub prerelease: Option<PreReleaseType>,
    pub scheme: SchemeConfig,
    pub feature_strategy: FeatureBumpStrategy,
    pub commit_patterns: CommitPatterns,
    pub file_patterns: FilePatterns,
    pub monitored_paths: Vec<String>,
    pub constraints: Constraints,
    pub policy: VersionPolicy,
    pub projects: Vec<ProjectSpec>,
}

impl ResolvedConfig {
    /// Build the per-project request this configuration implies.
    pub fn request_for(&self, project: &str) -> VersioningRequest {
        let mut request = VersioningRequest::new(project);
        request.tag_prefix = self.tag_prefix.clone();
        request.base_version = self.base_version.clone();
        request.prerelease = self.prerelease.clone();
        request.scheme = self.scheme.clone();
        request.feature_strategy = self.feature_strategy;
        request.commit_patterns = self.commit_patterns.clone();
        request.file_patterns = self.file_patterns.clone();
        request.monitored_paths = self.monitored_paths.clone();
        request.constraints = self.constraints.clone();
        request
    }
}

/// Merge partial layers into one configuration. Later layers override
/// earlier ones; pass layers lowest-precedence first.
pub fn merge_layers(layers: &[ConfigLayer]) -> Result<ResolvedConfig> {
    let mut merged = ConfigLayer::default();
    for layer in layers {
        overlay(&mut merged, layer);
    }
    realize(merged)
}

fn overlay(base: &mut ConfigLayer, layer: &ConfigLayer) {
    macro_rules! take {
        ($field:ident) => {
            if layer.$field.is_some() {
                base.$field = layer.$field.clone();
            }
        };
    }
    take!(tag_prefix);
    take!(base_version);
    take!(prerelease);
    take!(scheme);
    take!(feature_strategy);
    take!(commits);
    take!(files);
    take!(monitored_paths);
    take!(constraints);
    take!(policy);

    // project tables merge by name rather than replacing wholesale
    if let Some(projects) = &layer.projects {
        let merged = base.projects.get_or_insert_with(BTreeMap::new);
        for (name, section) in projects {
            merged.insert(name.clone(), section.clone());
        }
    }
}

fn realize(layer: ConfigLayer) -> Result<ResolvedConfig> {
    let base_version = layer
        .base_version
        .as_deref()
        .map(SemVer::parse)
        .transpose()?;

    let prerelease = layer
        .prerelease
        .as_deref()
        .map(PreReleaseType::parse)
        .transpose()?;

    let scheme = match layer.scheme {
        None => SchemeConfig::SemVer,
        Some(section) => match section.kind.as_deref().unwrap_or("semver") {
            "semver" => SchemeConfig::SemVer,
            "calver" => {
                let pattern = section
                    .calver
                    .as_deref()
                    .unwrap_or("YYYY.MM.PATCH")
                    .parse::<CalVerScheme>()?;
                SchemeConfig::CalVer {
                    scheme: pattern,
                    reset_patch_periodically: section.reset_patch_periodically.unwrap_or(true),
                }
            }
            other => {
                return Err(MonoverError::config(format!(
                    "Unknown scheme kind: '{}'",
                    other
                )))
            }
        },
    };

    let feature_strategy = match layer.feature_strategy.as_deref() {
        None | Some("patch-height") => FeatureBumpStrategy::PatchWithHeight,
        Some("minor-label") => FeatureBumpStrategy::MinorWithLabel,
        Some(other) => {
            return Err(MonoverError::config(format!(
                "Unknown feature strategy: '{}'",
                other
            )))
        }
    };

    let commit_patterns = match layer.commits {
        None => CommitPatterns::default(),
        Some(section) => {
            let defaults = CommitPatterns::default();
            CommitPatterns {
                major: section.major.unwrap_or(defaults.major),
                minor: section.minor.unwrap_or(defaults.minor),
                patch: section.patch.unwrap_or(defaults.patch),
                ignore: section.ignore.unwrap_or(defaults.ignore),
            }
        }
    };

    let file_patterns = match layer.files {
        None => FilePatterns::default(),
        Some(section) => FilePatterns {
            ignore: section.ignore.unwrap_or_default(),
            major: section.major.unwrap_or_default(),
            minor: section.minor.unwrap_or_default(),
            patch: section.patch.unwrap_or_default(),
            unmatched: section.unmatched.as_deref().map(parse_bump).transpose()?,
        },
    };

    let constraints = match layer.constraints {
        None => Constraints::default(),
        Some(section) => Constraints {
            minimum_version: section
                .minimum_version
                .as_deref()
                .map(SemVer::parse)
                .transpose()?,
            maximum_version: section
                .maximum_version
                .as_deref()
                .map(SemVer::parse)
                .transpose()?,
            allowed_range: section.allowed_range,
            blocked_versions: section
                .blocked_versions
                .unwrap_or_default()
                .iter()
                .map(|s| SemVer::parse(s))
                .collect::<Result<Vec<_>>>()?,
            require_monotonic_increase: section.require_monotonic_increase.unwrap_or(false),
            require_major_approval: section.require_major_approval.unwrap_or(false),
            custom_rules: section
                .custom_rules
                .unwrap_or_default()
                .into_iter()
                .map(|r| CustomRule {
                    name: r.name,
                    pattern: r.pattern,
                })
                .collect(),
        },
    };

    let policy = match layer.policy {
        None => VersionPolicy::Independent,
        Some(section) => match section.strategy.as_deref().unwrap_or("independent") {
            "independent" => VersionPolicy::Independent,
            "lockstep" => VersionPolicy::LockStep {
                base_version: section
                    .base_version
                    .as_deref()
                    .map(SemVer::parse)
                    .transpose()?,
            },
            "grouped" => {
                let groups = section
                    .groups
                    .unwrap_or_default()
                    .into_iter()
                    .map(|g| {
                        Ok(VersionGroup {
                            name: g.name,
                            members: g.members,
                            base_version: g
                                .base_version
                                .as_deref()
                                .map(SemVer::parse)
                                .transpose()?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                VersionPolicy::Grouped { groups }
            }
            other => {
                return Err(MonoverError::config(format!(
                    "Unknown policy strategy: '{}'",
                    other
                )))
            }
        },
    };

    let projects = layer
        .projects
        .unwrap_or_default()
        .into_iter()
        .map(|(name, section)| ProjectSpec {
            dir: section.dir.unwrap_or_else(|| name.clone()),
            dependencies: section.dependencies,
            name,
        })
        .collect();

    Ok(ResolvedConfig {
        tag_prefix: layer.tag_prefix.unwrap_or_else(|| "v".to_string()),
        base_version,
        prerelease,
        scheme,
        feature_strategy,
        commit_patterns,
        file_patterns,
        monitored_paths: layer.monitored_paths.unwrap_or_default(),
        constraints,
        policy,
        projects,
    })
}

fn parse_bump(s: &str) -> Result<BumpType> {
    match s {
        "none" => Ok(BumpType::None),
        "patch" => Ok(BumpType::Patch),
        "minor" => Ok(BumpType::Minor),
        "major" => Ok(BumpType::Major),
        other => Err(MonoverError::config(format!(
            "Unknown bump type: '{}'",
            other
        ))),
    }
}

/// Read one layer from a TOML file.
pub fn load_layer(path: impl AsRef<Path>) -> Result<ConfigLayer> {
    let text = fs::read_to_string(path.as_ref())?;
    toml::from_str(&text).map_err(|e| {
        MonoverError::config(format!("{}: {}", path.as_ref().display(), e))
    })
}

/// Collect the default layer stack, lowest precedence first:
/// the user config (`~/.config/monover.toml`) then the repository config
/// (`monover.toml` under `root`). Missing files are simply skipped.
pub fn discover_layers(root: impl AsRef<Path>) -> Result<Vec<ConfigLayer>> {
    let mut layers = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("monover.toml");
        if user.exists() {
            layers.push(load_layer(user)?);
        }
    }

    let repo = root.as_ref().join("monover.toml");
    if repo.exists() {
        layers.push(load_layer(repo)?);
    }

    Ok(layers)
}
