//! Rendering of a resolved version.
//!
//! Pure functions; the binary decides where the text goes.

use crate::calculator::ResolvedVersion;
use crate::domain::sanitize_branch_name;
use crate::error::{GitVersionError, Result};
use serde::{Deserialize, Serialize};

/// Weight reported for versions without a pre-release label
pub const RELEASE_WEIGHT: i64 = 60000;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum OutputFormat {
    /// `major.minor.patch[-pre][+build]`
    #[default]
    #[value(name = "text")]
    Text,
    /// Every variable as a JSON object
    #[value(name = "json")]
    Json,
    #[value(name = "AssemblySemVer", alias = "assemblysemver")]
    AssemblySemVer,
    #[value(name = "AssemblySemFileVer", alias = "assemblysemfilever")]
    AssemblySemFileVer,
}

/// Version variables, serialized with the conventional PascalCase names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionVariables {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release_tag: String,
    pub pre_release_tag_with_dash: String,
    pub build_meta_data: String,
    pub full_build_meta_data: String,
    pub major_minor_patch: String,
    pub sem_ver: String,
    pub full_sem_ver: String,
    pub assembly_sem_ver: String,
    pub assembly_sem_file_ver: String,
    pub informational_version: String,
    pub branch_name: String,
    pub escaped_branch_name: String,
    pub sha: String,
    pub short_sha: String,
    pub version_source_sha: String,
    pub commits_since_version_source: usize,
    pub weighted_pre_release_number: i64,
    pub commit_date: String,
}

/// Policy weight plus the trailing number of the pre-release label
pub fn weighted_pre_release_number(resolved: &ResolvedVersion) -> i64 {
    match &resolved.version.pre_release {
        Some(pre) => {
            let number = pre
                .rsplit('.')
                .next()
                .and_then(|last| last.parse::<i64>().ok())
                .unwrap_or(0);
            i64::from(resolved.pre_release_weight) + number
        }
        None => RELEASE_WEIGHT,
    }
}

impl From<&ResolvedVersion> for VersionVariables {
    fn from(resolved: &ResolvedVersion) -> Self {
        let version = &resolved.version;
        let pre_release_tag = version.pre_release.clone().unwrap_or_default();
        let full_build_meta_data = version.build.clone().unwrap_or_default();

        VersionVariables {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
            pre_release_tag_with_dash: if pre_release_tag.is_empty() {
                String::new()
            } else {
                format!("-{}", pre_release_tag)
            },
            pre_release_tag,
            build_meta_data: full_build_meta_data
                .split('+')
                .next()
                .unwrap_or_default()
                .to_string(),
            full_build_meta_data,
            major_minor_patch: version.major_minor_patch(),
            sem_ver: version.sem_ver(),
            full_sem_ver: version.to_string(),
            assembly_sem_ver: version.assembly_sem_ver(),
            assembly_sem_file_ver: version.assembly_sem_ver(),
            informational_version: version.to_string(),
            branch_name: resolved.branch.clone(),
            escaped_branch_name: sanitize_branch_name(&resolved.branch),
            sha: resolved.sha.clone(),
            short_sha: resolved.short_sha.clone(),
            version_source_sha: resolved.source_sha.clone(),
            commits_since_version_source: resolved.commits_since_source,
            weighted_pre_release_number: weighted_pre_release_number(resolved),
            commit_date: resolved.commit_date.clone(),
        }
    }
}

/// Render a resolved version in the requested format
pub fn format(resolved: &ResolvedVersion, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(resolved.version.to_string()),
        OutputFormat::AssemblySemVer | OutputFormat::AssemblySemFileVer => {
            Ok(resolved.version.assembly_sem_ver())
        }
        OutputFormat::Json => serde_json::to_string_pretty(&VersionVariables::from(resolved))
            .map_err(|e| GitVersionError::output(format!("failed to serialize JSON: {}", e))),
    }
}
