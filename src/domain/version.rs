use crate::error::{GitVersionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

static SEMVER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)(?:-([a-zA-Z0-9.-]+))?(?:\+([a-zA-Z0-9.+-]+))?$")
        .expect("semver pattern is valid")
});

/// Semantic version with optional pre-release label and build metadata.
///
/// Build metadata never takes part in ordering or equality.
#[derive(Debug, Clone, Default)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<String>,
    pub build: Option<String>,
}

impl SemanticVersion {
    /// Create a release version without pre-release or build metadata
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
            pre_release: None,
            build: None,
        }
    }

    /// Attach a pre-release label
    pub fn with_pre_release(mut self, pre_release: impl Into<String>) -> Self {
        self.pre_release = Some(pre_release.into());
        self
    }

    /// Attach build metadata
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    /// Parse a version such as `1.2.3`, `v1.2.3-beta.1` or `1.2.3-rc.1+5+abc1234`
    pub fn parse(text: &str) -> Result<Self> {
        let captures = SEMVER_PATTERN.captures(text).ok_or_else(|| {
            GitVersionError::invalid_format(format!(
                "'{}' - expected MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]",
                text
            ))
        })?;

        let number = |index: usize, part: &str| -> Result<u64> {
            let raw = captures.get(index).map(|m| m.as_str()).unwrap_or_default();
            raw.parse::<u64>().map_err(|_| {
                GitVersionError::invalid_format(format!("{} component '{}' in '{}'", part, raw, text))
            })
        };

        Ok(SemanticVersion {
            major: number(1, "major")?,
            minor: number(2, "minor")?,
            patch: number(3, "patch")?,
            pre_release: captures.get(4).map(|m| m.as_str().to_string()),
            build: captures.get(5).map(|m| m.as_str().to_string()),
        })
    }

    pub fn increment_major(&mut self) -> Result<()> {
        self.major = next_component(self.major, "major", self)?;
        self.minor = 0;
        self.patch = 0;
        Ok(())
    }

    pub fn increment_minor(&mut self) -> Result<()> {
        self.minor = next_component(self.minor, "minor", self)?;
        self.patch = 0;
        Ok(())
    }

    pub fn increment_patch(&mut self) -> Result<()> {
        self.patch = next_component(self.patch, "patch", self)?;
        Ok(())
    }

    /// Apply a bump in place according to semver truncation rules.
    ///
    /// Fails without modifying `self` when the bumped component would overflow.
    pub fn increment(&mut self, bump: VersionBump) -> Result<()> {
        match bump {
            VersionBump::Major => self.increment_major(),
            VersionBump::Minor => self.increment_minor(),
            VersionBump::Patch => self.increment_patch(),
        }
    }

    /// Return a bumped copy, leaving `self` untouched
    pub fn bumped(&self, bump: VersionBump) -> Result<Self> {
        let mut next = self.clone();
        next.increment(bump)?;
        Ok(next)
    }

    pub fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    /// `major.minor.patch` without labels
    pub fn major_minor_patch(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// Four-part assembly version, e.g. `1.2.3.0`
    pub fn assembly_sem_ver(&self) -> String {
        format!("{}.{}.{}.0", self.major, self.minor, self.patch)
    }

    /// `major.minor.patch[-pre]` without build metadata
    pub fn sem_ver(&self) -> String {
        match &self.pre_release {
            Some(pre) => format!("{}-{}", self.major_minor_patch(), pre),
            None => self.major_minor_patch(),
        }
    }
}

fn next_component(value: u64, part: &str, version: &SemanticVersion) -> Result<u64> {
    value.checked_add(1).ok_or_else(|| {
        GitVersionError::invalid_format(format!(
            "cannot increment {} component of '{}'",
            part, version
        ))
    })
}

/// Compare two pre-release strings using semver precedence.
///
/// Identifiers are compared left to right; numeric identifiers compare numerically
/// and sort below alphanumeric ones; a shorter list that is a prefix of the other is lower.
pub fn compare_pre_release(left: &str, right: &str) -> Ordering {
    let mut lhs = left.split('.');
    let mut rhs = right.split('.');
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = compare_identifier(a, b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn compare_identifier(a: &str, b: &str) -> Ordering {
    let a_numeric = is_numeric(a);
    let b_numeric = is_numeric(b);
    match (a_numeric, b_numeric) {
        // Leading zeros are tolerated: compare by magnitude first, then by text.
        (true, true) => {
            let a_trimmed = a.trim_start_matches('0');
            let b_trimmed = b.trim_start_matches('0');
            a_trimmed
                .len()
                .cmp(&b_trimmed.len())
                .then_with(|| a_trimmed.cmp(b_trimmed))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

fn is_numeric(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre_release(a, b),
            })
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.pre_release == other.pre_release
    }
}

impl Eq for SemanticVersion {}

impl FromStr for SemanticVersion {
    type Err = GitVersionError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VersionBump {
    Patch,
    Minor,
    Major,
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionBump::Major => write!(f, "major"),
            VersionBump::Minor => write!(f, "minor"),
            VersionBump::Patch => write!(f, "patch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v = SemanticVersion::parse("v1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert_eq!(v.pre_release, None);
        assert_eq!(v.build, None);
    }

    #[test]
    fn test_version_parse_full() {
        let v = SemanticVersion::parse("1.2.3-beta.1+7+abc1234").unwrap();
        assert_eq!(v.pre_release.as_deref(), Some("beta.1"));
        assert_eq!(v.build.as_deref(), Some("7+abc1234"));
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(SemanticVersion::parse("1.2").is_err());
        assert!(SemanticVersion::parse("v1.2.3.4").is_err());
        assert!(SemanticVersion::parse("V1.2.3").is_err());
        assert!(SemanticVersion::parse("1.2.3-").is_err());
        assert!(SemanticVersion::parse("1.2.3-beta_1").is_err());
        assert!(SemanticVersion::parse("release-1.2.3").is_err());
    }

    #[test]
    fn test_version_parse_overflow_is_invalid_format() {
        let err = SemanticVersion::parse("99999999999999999999.0.0").unwrap_err();
        assert!(matches!(err, GitVersionError::InvalidFormat(_)));
    }

    #[test]
    fn test_increment_truncation() {
        let mut v = SemanticVersion::new(1, 2, 3);
        v.increment_minor().unwrap();
        assert_eq!(v, SemanticVersion::new(1, 3, 0));
        v.increment_major().unwrap();
        assert_eq!(v, SemanticVersion::new(2, 0, 0));
        v.increment_patch().unwrap();
        assert_eq!(v, SemanticVersion::new(2, 0, 1));
    }

    #[test]
    fn test_increment_at_component_limit_is_an_error() {
        let mut v = SemanticVersion::parse("v1.0.18446744073709551615").unwrap();
        let err = v.increment(VersionBump::Patch).unwrap_err();
        assert!(matches!(err, GitVersionError::InvalidFormat(_)));
        assert_eq!(v.patch, u64::MAX);

        assert_eq!(
            v.bumped(VersionBump::Minor).unwrap(),
            SemanticVersion::new(1, 1, 0)
        );
        assert!(SemanticVersion::new(u64::MAX, 0, 0)
            .bumped(VersionBump::Major)
            .is_err());
    }

    #[test]
    fn test_bumped_leaves_original() {
        let v = SemanticVersion::new(0, 1, 0);
        let next = v.bumped(VersionBump::Major).unwrap();
        assert_eq!(next, SemanticVersion::new(1, 0, 0));
        assert_eq!(v, SemanticVersion::new(0, 1, 0));
    }

    #[test]
    fn test_release_greater_than_pre_release() {
        let release = SemanticVersion::new(1, 0, 0);
        let pre = SemanticVersion::new(1, 0, 0).with_pre_release("rc.1");
        assert!(release > pre);
        assert!(SemanticVersion::new(1, 0, 1).with_pre_release("alpha") > release);
    }

    #[test]
    fn test_pre_release_precedence() {
        let ordered = [
            "alpha", "alpha.1", "alpha.beta", "beta", "beta.2", "beta.11", "rc.1",
        ];
        for pair in ordered.windows(2) {
            assert_eq!(
                compare_pre_release(pair[0], pair[1]),
                Ordering::Less,
                "{} < {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_build_metadata_ignored_for_equality() {
        let a = SemanticVersion::new(1, 0, 0).with_build("1+abc");
        let b = SemanticVersion::new(1, 0, 0).with_build("2+def");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_version_display() {
        let v = SemanticVersion::new(1, 2, 3)
            .with_pre_release("alpha.3")
            .with_build("3+abc1234");
        assert_eq!(v.to_string(), "1.2.3-alpha.3+3+abc1234");
        assert_eq!(v.sem_ver(), "1.2.3-alpha.3");
        assert_eq!(v.assembly_sem_ver(), "1.2.3.0");
    }

    #[test]
    fn test_version_bump_ordering() {
        assert!(VersionBump::Major > VersionBump::Minor);
        assert!(VersionBump::Minor > VersionBump::Patch);
    }
}
