// tests/integration_test.rs
use gitversion::calculator::IncrementDecision;
use gitversion::config::{BranchPolicy, CommitMessageIncrementMode, Config, IncrementStrategy};
use gitversion::domain::{BranchKind, SemanticVersion, VersionBump, Workflow};
use gitversion::git::{MockRepository, Repository};
use gitversion::output::{self, OutputFormat};
use gitversion::strategy::Strategy;
use gitversion::{GitVersionError, VersionCalculator};

fn resolve(repo: MockRepository, config: Config) -> SemanticVersion {
    VersionCalculator::new(repo, config)
        .resolve_version(None, Workflow::GitFlow, None, None)
        .unwrap()
}

#[test]
fn test_main_without_tags_uses_fallback() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.add_commit("fix: typo");
    let calculator = VersionCalculator::new(repo, Config::default());

    let resolved = calculator
        .resolve(None, Workflow::GitFlow, None, None)
        .unwrap();
    assert_eq!(resolved.source, "Fallback base version");
    assert_eq!(resolved.version.to_string(), "0.0.1+2+c000002");
    assert_eq!(resolved.version.pre_release, None);
    assert_eq!(resolved.kind, BranchKind::Main);
}

#[test]
fn test_main_increments_latest_tag() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.4.2");
    repo.add_commit("fix: a");
    repo.add_commit("fix: b");

    let version = resolve(repo, Config::default());
    assert_eq!(version.to_string(), "1.4.3+2+c000003");
}

#[test]
fn test_release_branch_scenario() {
    let mut repo = MockRepository::new();
    repo.add_commit("one");
    repo.add_commit("two");
    repo.add_commit_with_sha("abc1234ffffffffffffffffffffffffffffffff", "three");
    repo.set_current_branch("release/0.0.2-alpha");

    let version = resolve(repo, Config::default());
    assert_eq!(version.major_minor_patch(), "0.0.2");
    assert_eq!(version.pre_release.as_deref(), Some("alpha.3"));
    assert_eq!(version.build.as_deref(), Some("3+abc1234"));
}

#[test]
fn test_feature_branch_scenario() {
    let mut repo = MockRepository::new();
    for n in 0..4 {
        repo.add_commit(format!("feat: part {}", n));
    }
    repo.add_commit_with_sha("def5678000000000000000000000000000000000", "feat: last");
    repo.set_current_branch("feature/user-auth");

    let version = resolve(repo, Config::default());
    assert_eq!(version.pre_release.as_deref(), Some("user-auth.5"));
    assert_eq!(version.build.as_deref(), Some("5+def5678"));
}

#[test]
fn test_forced_major_on_feature_branch() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v0.1.0");
    repo.add_commit("fix: something");
    repo.set_current_branch("feature/rework");
    let calculator = VersionCalculator::new(repo, Config::default());

    let resolved = calculator
        .resolve(None, Workflow::GitFlow, Some(VersionBump::Major), None)
        .unwrap();
    assert_eq!(resolved.increment, IncrementDecision::Forced(VersionBump::Major));
    assert_eq!(resolved.version.major_minor_patch(), "1.0.0");
    assert_eq!(resolved.version.pre_release.as_deref(), Some("rework.1"));
    assert_eq!(resolved.commits_since_source, 1);
}

#[test]
fn test_next_version_override_beats_larger_tag() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v5.0.0");
    repo.add_commit("fix: x");
    let calculator = VersionCalculator::new(repo, Config::default());

    let resolved = calculator
        .resolve(None, Workflow::GitFlow, None, Some("2.0.0"))
        .unwrap();
    assert_eq!(resolved.version.major_minor_patch(), "2.0.0");
    assert_eq!(resolved.increment, IncrementDecision::NotEligible);
    assert!(resolved.source.contains("2.0.0"));
}

#[test]
fn test_configured_next_version_from_config() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    let mut config = Config::default();
    config.next_version = Some("3.0.0".to_string());

    assert_eq!(resolve(repo, config).major_minor_patch(), "3.0.0");
}

#[test]
fn test_invalid_configured_version_is_fatal() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    let calculator = VersionCalculator::new(repo, Config::default());

    let err = calculator
        .resolve_version(None, Workflow::GitFlow, None, Some("three"))
        .unwrap_err();
    match err {
        GitVersionError::InvalidConfiguredVersion { value, .. } => assert_eq!(value, "three"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_strategy_failure_aborts_resolution() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.fail_query("tags_reachable_from_head");
    let calculator = VersionCalculator::new(repo, Config::default());

    let err = calculator
        .resolve_version(None, Workflow::GitFlow, None, None)
        .unwrap_err();
    let message = err.to_string();
    assert!(
        matches!(
            err,
            GitVersionError::StrategyFailure {
                strategy: Strategy::TaggedCommit,
                ..
            }
        ),
        "got: {}",
        message
    );
    assert!(message.contains("tags_reachable_from_head failed"));
}

#[test]
fn test_not_a_repository() {
    let calculator = VersionCalculator::new(MockRepository::not_a_repository(), Config::default());
    let err = calculator
        .resolve_version(Some("main"), Workflow::GitFlow, None, None)
        .unwrap_err();
    assert!(matches!(err, GitVersionError::NotARepository(_)));
    assert_eq!(calculator.repository().inner().call_count("head_sha"), 0);
}

#[test]
fn test_develop_tracks_release_branches() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.0.0");
    let fork = repo.add_commit("feat: start release");
    repo.add_commit("feat: next thing");
    repo.set_current_branch("develop");
    repo.add_remote_branch("release/1.1.0");
    repo.set_merge_base("release/1.1.0", "develop", fork);

    let version = resolve(repo, Config::default());
    assert_eq!(version.major_minor_patch(), "1.2.0");
    assert_eq!(version.pre_release.as_deref(), Some("alpha.1"));
}

#[test]
fn test_merge_message_of_release_branch() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.0.0");
    repo.add_commit("Merge branch 'release/1.1.0'");

    let version = resolve(repo, Config::default());
    assert_eq!(version.to_string(), "1.1.1+1+c000002");
}

#[test]
fn test_repository_queries_are_cached() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.0.0");
    repo.add_commit("fix: x");
    repo.set_current_branch("release/next");
    let calculator = VersionCalculator::new(repo, Config::default());

    calculator
        .resolve(None, Workflow::GitFlow, None, None)
        .unwrap();
    calculator
        .resolve(None, Workflow::GitFlow, None, None)
        .unwrap();

    let inner = calculator.repository().inner();
    assert_eq!(inner.call_count("tags_reachable_from_head"), 1);
    assert_eq!(inner.call_count("head_sha"), 1);
}

#[test]
fn test_ignored_tag_is_not_evidence() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.0.0");
    let bad = repo.add_commit("fix: x");
    repo.tag_head("v9.0.0");
    repo.add_commit("fix: y");
    let mut config = Config::default();
    config.ignore.sha = vec![bad];

    assert_eq!(resolve(repo, config).major_minor_patch(), "1.0.1");
}

#[test]
fn test_policy_increment_none() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v2.0.0");
    repo.add_commit("fix: x");
    let mut config = Config::default();
    if let Some(main) = config.branches.get_mut("main") {
        main.increment = IncrementStrategy::None;
    }

    assert_eq!(resolve(repo, config).major_minor_patch(), "2.0.0");
}

#[test]
fn test_custom_policy_label() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.add_commit("work");
    repo.set_current_branch("exp/faster");
    let mut config = Config::default();
    config.branches.insert(
        "exp".to_string(),
        BranchPolicy {
            name: "exp".to_string(),
            regex: Some("^exp/".to_string()),
            increment: IncrementStrategy::Minor,
            label: Some("experiment".to_string()),
            ..BranchKind::Unknown.default_policy()
        },
    );

    let version = resolve(repo, config);
    assert_eq!(version.major_minor_patch(), "0.1.0");
    assert_eq!(version.pre_release.as_deref(), Some("experiment.2"));
}

#[test]
fn test_githubflow_treats_everything_else_as_feature() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.0.0");
    repo.add_commit("work");
    repo.set_current_branch("develop");
    let calculator = VersionCalculator::new(repo, Config::default());

    let resolved = calculator
        .resolve(None, Workflow::GitHubFlow, None, None)
        .unwrap();
    assert_eq!(resolved.kind, BranchKind::Feature);
    assert_eq!(resolved.version.to_string(), "1.0.1-develop.1+1+c000002");
}

#[test]
fn test_trunk_never_labels() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.add_commit("work");
    repo.set_current_branch("feature/x");
    let calculator = VersionCalculator::new(repo, Config::default());

    let version = calculator
        .resolve_version(None, Workflow::Trunk, None, None)
        .unwrap();
    assert_eq!(version.pre_release, None);
}

#[test]
fn test_branch_override_and_json_output() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.0.0");
    repo.add_commit("work");
    let calculator = VersionCalculator::new(repo, Config::default());

    let resolved = calculator
        .resolve(Some("hotfix/crash"), Workflow::GitFlow, None, None)
        .unwrap();
    let json = output::format(&resolved, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["BranchName"], "hotfix/crash");
    assert_eq!(value["SemVer"], "1.0.1-hotfix.1");
    assert_eq!(value["WeightedPreReleaseNumber"], 40001);
    assert_eq!(
        value["VersionSourceSha"],
        calculator.repository().commit_sha_for_tag("v1.0.0").unwrap()
    );
    assert_eq!(value["CommitDate"], "2024-01-02 12:00:00 +0000");
}

#[test]
fn test_increment_past_component_limit_is_an_error() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.0.18446744073709551615");
    repo.add_commit("fix: x");
    let calculator = VersionCalculator::new(repo, Config::default());

    let err = calculator
        .resolve_version(None, Workflow::GitFlow, None, None)
        .unwrap_err();
    assert!(matches!(err, GitVersionError::InvalidFormat(_)), "got: {}", err);

    let version = calculator
        .resolve_version(None, Workflow::GitFlow, Some(VersionBump::Minor), None)
        .unwrap();
    assert_eq!(version.major_minor_patch(), "1.1.0");
}

#[test]
fn test_hyphenated_breaking_change_text_is_not_a_major_bump() {
    let mut repo = MockRepository::new();
    repo.add_commit("initial");
    repo.tag_head("v1.2.0");
    repo.add_commit("docs: explain non-breaking-change policy");
    let mut config = Config::default();
    config.commit_message_incrementing = CommitMessageIncrementMode::Enabled;

    assert_eq!(resolve(repo, config).to_string(), "1.2.1+1+c000002");
}
