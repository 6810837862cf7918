use crate::config::Config;
use crate::domain::{ParsedCommit, VersionBump};
use crate::error::{GitVersionError, Result};
use regex::Regex;

/// Analyzes commit messages to determine the version bump they ask for.
///
/// Major wins over minor, minor over patch, regardless of message order.
pub struct VersionAnalyzer {
    major_directive: Regex,
    minor_directive: Regex,
}

impl VersionAnalyzer {
    /// Create an analyzer using the directive patterns from configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_patterns(
            &config.major_version_bump_message,
            &config.minor_version_bump_message,
        )
    }

    /// Create an analyzer from explicit `+semver:` directive patterns
    pub fn with_patterns(major: &str, minor: &str) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(&format!("(?i){}", pattern)).map_err(|e| {
                GitVersionError::config(format!("invalid bump message '{}': {}", pattern, e))
            })
        };

        Ok(VersionAnalyzer {
            major_directive: compile(major)?,
            minor_directive: compile(minor)?,
        })
    }

    /// Decide the bump a single message requests
    pub fn analyze_message(&self, message: &str) -> VersionBump {
        let parsed = ParsedCommit::parse(message);

        if self.major_directive.is_match(message)
            || parsed.breaking_footer
            || (parsed.is_feature() && parsed.breaking_header)
        {
            return VersionBump::Major;
        }

        if self.minor_directive.is_match(message) || parsed.is_feature() {
            return VersionBump::Minor;
        }

        VersionBump::Patch
    }

    /// Analyze commit messages and determine version bump
    pub fn analyze_messages<I, S>(&self, messages: I) -> VersionBump
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bump = VersionBump::Patch;

        for message in messages {
            bump = bump.max(self.analyze_message(message.as_ref()));

            // Nothing outranks a major bump
            if bump == VersionBump::Major {
                break;
            }
        }

        bump
    }
}

impl Default for VersionAnalyzer {
    fn default() -> Self {
        let config = Config::default();
        // The default patterns are static and always compile.
        Self::new(&config).expect("default bump message patterns are valid")
    }
}
