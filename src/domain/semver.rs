use crate::domain::bump::BumpType;
use crate::error::{MonoverError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Semantic version value.
///
/// Follows the semver precedence rules: the numeric triple compares first, a
/// version without prerelease identifiers ranks above any prerelease at the
/// same triple, and build metadata never participates in ordering or
/// equality.
#[derive(Debug, Clone, Default)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Dot-separated prerelease identifiers, in order.
    pub prerelease: Vec<String>,
    /// Opaque build metadata after `+`.
    pub build: Option<String>,
}

impl SemVer {
    /// Create a release version with no prerelease or build parts.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemVer {
            major,
            minor,
            patch,
            prerelease: Vec::new(),
            build: None,
        }
    }

    /// Parse `MAJOR.MINOR[.PATCH][-PRERELEASE][+BUILD]`.
    ///
    /// The patch component defaults to 0 when absent. A single leading 'v' or
    /// 'V' is tolerated so raw tag bodies parse directly.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let s = s.strip_prefix('v').or_else(|| s.strip_prefix('V')).unwrap_or(s);
        if s.is_empty() {
            return Err(MonoverError::version("Empty version string"));
        }

        let (version_pre, build) = match s.split_once('+') {
            Some((v, b)) if !b.is_empty() => (v, Some(b.to_string())),
            Some((v, _)) => (v, None),
            None => (s, None),
        };

        let (triple, prerelease_raw) = match version_pre.split_once('-') {
            Some((v, p)) => (v, Some(p)),
            None => (version_pre, None),
        };

        let parts: Vec<&str> = triple.split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(MonoverError::version(format!(
                "Invalid version format: '{}' - expected MAJOR.MINOR[.PATCH]",
                input
            )));
        }

        let major = parse_component(parts[0], "major", input)?;
        let minor = parse_component(parts[1], "minor", input)?;
        let patch = if parts.len() == 3 {
            parse_component(parts[2], "patch", input)?
        } else {
            0
        };

        let prerelease = match prerelease_raw {
            Some(raw) => parse_prerelease(raw)?,
            None => Vec::new(),
        };

        Ok(SemVer {
            major,
            minor,
            patch,
            prerelease,
            build,
        })
    }

    /// Replace the prerelease identifiers, splitting `pre` on dots.
    pub fn with_prerelease(mut self, pre: impl Into<String>) -> Self {
        self.prerelease = pre.into().split('.').map(str::to_string).collect();
        self
    }

    /// Replace the build metadata.
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    /// Apply a bump to the numeric triple. Bumping clears prerelease and
    /// build parts; `BumpType::None` returns the version untouched.
    pub fn bump(&self, bump: BumpType) -> Self {
        match bump {
            BumpType::Major => SemVer::new(self.major + 1, 0, 0),
            BumpType::Minor => SemVer::new(self.major, self.minor + 1, 0),
            BumpType::Patch => SemVer::new(self.major, self.minor, self.patch + 1),
            BumpType::None => self.clone(),
        }
    }

    /// The version with prerelease and build stripped.
    pub fn release(&self) -> Self {
        SemVer::new(self.major, self.minor, self.patch)
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// True when the numeric triples are equal, regardless of prerelease.
    pub fn same_triple(&self, other: &SemVer) -> bool {
        self.major == other.major && self.minor == other.minor && self.patch == other.patch
    }
}

fn parse_component(part: &str, name: &str, whole: &str) -> Result<u64> {
    part.parse::<u64>().map_err(|_| {
        MonoverError::version(format!("Invalid {} version in '{}': {}", name, whole, part))
    })
}

fn parse_prerelease(raw: &str) -> Result<Vec<String>> {
    let idents: Vec<String> = raw.split('.').map(str::to_string).collect();
    for ident in &idents {
        if ident.is_empty() {
            return Err(MonoverError::version(format!(
                "Empty prerelease identifier in '{}'",
                raw
            )));
        }
        if !ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(MonoverError::version(format!(
                "Invalid prerelease identifier: '{}'",
                ident
            )));
        }
    }
    Ok(idents)
}

/// Compare prerelease identifier lists per semver precedence: numeric
/// identifiers compare numerically and rank below alphanumeric ones; a list
/// that is a strict prefix of another is smaller.
fn cmp_prerelease(a: &[String], b: &[String]) -> Ordering {
    for (left, right) in a.iter().zip(b.iter()) {
        let ord = match (left.parse::<u64>(), right.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => left.cmp(right),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for SemVer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemVer {}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.minor.cmp(&other.minor) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.patch.cmp(&other.patch) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => cmp_prerelease(&self.prerelease, &other.prerelease),
        }
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease.join("."))?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for SemVer {
    type Err = MonoverError;

    fn from_str(s: &str) -> Result<Self> {
        SemVer::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let v = SemVer::parse("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert!(v.prerelease.is_empty());
        assert!(v.build.is_none());
    }

    #[test]
    fn test_parse_patch_defaults_to_zero() {
        let v = SemVer::parse("2.5").unwrap();
        assert_eq!(v, SemVer::new(2, 5, 0));
    }

    #[test]
    fn test_parse_with_v_prefix() {
        assert_eq!(SemVer::parse("v1.2.3").unwrap(), SemVer::new(1, 2, 3));
        assert_eq!(SemVer::parse("V1.2.3").unwrap(), SemVer::new(1, 2, 3));
    }

    #[test]
    fn test_parse_prerelease_and_build() {
        let v = SemVer::parse("1.2.3-rc.1+build.456").unwrap();
        assert_eq!(v.prerelease, vec!["rc".to_string(), "1".to_string()]);
        assert_eq!(v.build, Some("build.456".to_string()));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(SemVer::parse("1").is_err());
        assert!(SemVer::parse("1.2.3.4").is_err());
        assert!(SemVer::parse("a.b.c").is_err());
        assert!(SemVer::parse("1.2.3-").is_err());
        assert!(SemVer::parse("1.2.3-rc..1").is_err());
        assert!(SemVer::parse("").is_err());
    }

    #[test]
    fn test_roundtrip() {
        for s in ["1.2.3", "0.1.0-alpha.1", "2025.11.0", "1.0.0-rc.2+abc123"] {
            let v = SemVer::parse(s).unwrap();
            assert_eq!(v.to_string(), s);
            assert_eq!(SemVer::parse(&v.to_string()).unwrap(), v);
        }
    }

    #[test]
    fn test_bump() {
        let v = SemVer::parse("1.2.3-beta.1").unwrap();
        assert_eq!(v.bump(BumpType::Major), SemVer::new(2, 0, 0));
        assert_eq!(v.bump(BumpType::Minor), SemVer::new(1, 3, 0));
        assert_eq!(v.bump(BumpType::Patch), SemVer::new(1, 2, 4));
        assert_eq!(v.bump(BumpType::None), v);
    }

    #[test]
    fn test_ordering_triple() {
        assert!(SemVer::new(2, 0, 0) > SemVer::new(1, 9, 9));
        assert!(SemVer::new(1, 1, 0) > SemVer::new(1, 0, 9));
        assert!(SemVer::new(1, 0, 1) > SemVer::new(1, 0, 0));
    }

    #[test]
    fn test_ordering_prerelease_below_release() {
        let release = SemVer::new(1, 0, 0);
        let pre = SemVer::new(1, 0, 0).with_prerelease("rc.1");
        assert!(release > pre);
    }

    #[test]
    fn test_ordering_prerelease_identifiers() {
        let alpha = SemVer::parse("1.0.0-alpha").unwrap();
        let alpha1 = SemVer::parse("1.0.0-alpha.1").unwrap();
        let alpha_beta = SemVer::parse("1.0.0-alpha.beta").unwrap();
        let beta = SemVer::parse("1.0.0-beta").unwrap();
        let beta2 = SemVer::parse("1.0.0-beta.2").unwrap();
        let beta11 = SemVer::parse("1.0.0-beta.11").unwrap();
        let rc1 = SemVer::parse("1.0.0-rc.1").unwrap();

        // semver.org item 11 example chain
        assert!(alpha < alpha1);
        assert!(alpha1 < alpha_beta);
        assert!(alpha_beta < beta);
        assert!(beta < beta2);
        assert!(beta2 < beta11);
        assert!(beta11 < rc1);
    }

    #[test]
    fn test_numeric_below_alphanumeric() {
        let numeric = SemVer::parse("1.0.0-1").unwrap();
        let alpha = SemVer::parse("1.0.0-alpha").unwrap();
        assert!(numeric < alpha);
    }

    #[test]
    fn test_build_ignored_in_ordering_and_equality() {
        let a = SemVer::parse("1.2.3+aaa").unwrap();
        let b = SemVer::new(1, 2, 3).with_build("zzz");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_display_padding_free() {
        assert_eq!(SemVer::new(2025, 4, 0).to_string(), "2025.4.0");
    }

    #[test]
    fn test_same_triple() {
        let a = SemVer::parse("1.2.3-alpha").unwrap();
        let b = SemVer::parse("1.2.3-beta").unwrap();
        assert!(a.same_triple(&b));
        assert!(!a.same_triple(&SemVer::new(1, 2, 4)));
    }
}
