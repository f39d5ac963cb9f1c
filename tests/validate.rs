// ABOUTME: Integration tests for the ordered prerequisite checks run before deploying.
// ABOUTME: Uses a fake tool probe to observe which checks ran and which warnings were raised.

use async_trait::async_trait;
use deckhand::config::{Config, EnvSnapshot, env};
use deckhand::diagnostics::{Diagnostics, WarningKind};
use deckhand::types::StageName;
use deckhand::validate::{PrerequisiteError, ToolError, ToolProbe, Validator};
use std::sync::atomic::{AtomicUsize, Ordering};

struct FakeTool {
    version: Result<String, String>,
    login_fails: bool,
    version_calls: AtomicUsize,
    login_calls: AtomicUsize,
}

impl FakeTool {
    fn at(version: &str) -> Self {
        Self {
            version: Ok(version.to_string()),
            login_fails: false,
            version_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
        }
    }

    fn missing() -> Self {
        Self {
            version: Err("No such file or directory (os error 2)".to_string()),
            ..Self::at("")
        }
    }

    fn probed(&self) -> bool {
        self.version_calls.load(Ordering::SeqCst) > 0
    }
}

#[async_trait]
impl ToolProbe for FakeTool {
    fn name(&self) -> &str {
        "serverless"
    }

    async fn version(&self) -> Result<String, ToolError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        self.version.clone().map_err(|reason| ToolError::Spawn {
            tool: "serverless".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, reason),
        })
    }

    async fn login(&self) -> Result<(), ToolError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.login_fails {
            return Err(ToolError::Failed {
                tool: "serverless".to_string(),
                action: "login",
                status: "exit status: 1".to_string(),
                stderr: "browser login required".to_string(),
            });
        }
        Ok(())
    }
}

fn stage(name: &str) -> StageName {
    StageName::new(name).unwrap()
}

fn keys() -> EnvSnapshot {
    EnvSnapshot {
        access_key_id: Some("AKIAEXAMPLE".to_string()),
        secret_access_key: Some("secret".to_string()),
        region: Some("us-east-1".to_string()),
        tool_access_key: Some("sls-key".to_string()),
        ..Default::default()
    }
}

fn profile() -> EnvSnapshot {
    EnvSnapshot {
        profile: Some("team".to_string()),
        region: Some("us-east-1".to_string()),
        tool_access_key: Some("sls-key".to_string()),
        ..Default::default()
    }
}

async fn check(
    config: &Config,
    snapshot: &EnvSnapshot,
    tool: &FakeTool,
    stage_name: &str,
) -> (Result<(), PrerequisiteError>, Diagnostics) {
    let mut diag = Diagnostics::default();
    let result = Validator::new(config, snapshot, tool)
        .validate(&stage(stage_name), &mut diag)
        .await;
    (result, diag)
}

#[tokio::test]
async fn complete_environment_passes() {
    let tool = FakeTool::at("Serverless Framework 4.4.7");
    let (result, diag) = check(&Config::default(), &keys(), &tool, "prod").await;

    assert_eq!(result, Ok(()));
    assert!(!diag.has_warnings());
    assert!(tool.probed());
}

#[tokio::test]
async fn lone_access_key_fails_before_anything_else() {
    let snapshot = EnvSnapshot {
        access_key_id: Some("AKIAEXAMPLE".to_string()),
        ..Default::default()
    };
    let tool = FakeTool::at("4.4.7");

    let (result, _) = check(&Config::default(), &snapshot, &tool, "dev").await;

    assert_eq!(
        result,
        Err(PrerequisiteError::IncompleteKeyPair {
            present: env::ACCESS_KEY_ID,
            missing: env::SECRET_ACCESS_KEY,
        })
    );
    assert!(!tool.probed());
}

#[tokio::test]
async fn lone_secret_key_is_also_incomplete() {
    let snapshot = EnvSnapshot {
        secret_access_key: Some("secret".to_string()),
        profile: Some("team".to_string()),
        ..Default::default()
    };
    let (result, _) = check(&Config::default(), &snapshot, &FakeTool::at("4.0.0"), "dev").await;

    assert!(matches!(
        result,
        Err(PrerequisiteError::IncompleteKeyPair {
            present: env::SECRET_ACCESS_KEY,
            ..
        })
    ));
}

#[tokio::test]
async fn profile_is_enough_for_dev_but_not_prod() {
    let tool = FakeTool::at("4.1.0");

    let (dev, _) = check(&Config::default(), &profile(), &tool, "dev").await;
    assert_eq!(dev, Ok(()));

    let (prod, _) = check(&Config::default(), &profile(), &tool, "prod").await;
    assert_eq!(
        prod,
        Err(PrerequisiteError::ProfileNotAllowed {
            stage: stage("prod")
        })
    );
}

#[tokio::test]
async fn missing_region_is_reported_after_credentials() {
    let snapshot = EnvSnapshot {
        region: None,
        ..keys()
    };
    let (result, _) = check(&Config::default(), &snapshot, &FakeTool::at("4.0.0"), "dev").await;
    assert_eq!(result, Err(PrerequisiteError::MissingRegion));
}

#[tokio::test]
async fn tool_access_key_requirement_is_configurable() {
    let snapshot = EnvSnapshot {
        tool_access_key: None,
        ..keys()
    };
    let tool = FakeTool::at("4.0.0");

    let (result, _) = check(&Config::default(), &snapshot, &tool, "dev").await;
    assert_eq!(result, Err(PrerequisiteError::MissingToolAccessKey));

    let config = Config::from_yaml("tool:\n  require_access_key: false\n").unwrap();
    let (result, _) = check(&config, &snapshot, &tool, "dev").await;
    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn unknown_stage_lists_configured_stages() {
    let tool = FakeTool::at("4.0.0");
    let (result, _) = check(&Config::default(), &keys(), &tool, "qa").await;

    assert_eq!(
        result,
        Err(PrerequisiteError::UnknownStage {
            stage: stage("qa"),
            known: "dev, prod".to_string(),
        })
    );
    assert!(!tool.probed());
}

#[tokio::test]
async fn unknown_stage_with_profile_fails_on_stage_not_credentials() {
    let (result, _) = check(&Config::default(), &profile(), &FakeTool::at("4.0.0"), "qa").await;
    assert!(matches!(result, Err(PrerequisiteError::UnknownStage { .. })));
}

#[tokio::test]
async fn missing_tool_is_fatal() {
    let (result, _) = check(&Config::default(), &keys(), &FakeTool::missing(), "dev").await;

    match result {
        Err(PrerequisiteError::ToolUnavailable { tool, reason }) => {
            assert_eq!(tool, "serverless");
            assert!(reason.contains("No such file"));
        }
        other => panic!("expected tool unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn old_tool_version_only_warns() {
    let (result, diag) = check(
        &Config::default(),
        &keys(),
        &FakeTool::at("Framework Core: 3.38.0"),
        "dev",
    )
    .await;

    assert_eq!(result, Ok(()));
    assert!(diag.has(WarningKind::ToolVersion));
    assert!(diag.warnings()[0].message.contains("3.38.0"));
}

#[tokio::test]
async fn unparseable_version_only_warns() {
    let (result, diag) = check(&Config::default(), &keys(), &FakeTool::at("dev build"), "dev").await;

    assert_eq!(result, Ok(()));
    assert!(diag.has(WarningKind::ToolVersion));
}

#[tokio::test]
async fn login_runs_only_when_enabled_and_failure_warns() {
    let tool = FakeTool {
        login_fails: true,
        ..FakeTool::at("4.2.0")
    };

    let (_, diag) = check(&Config::default(), &keys(), &tool, "dev").await;
    assert_eq!(tool.login_calls.load(Ordering::SeqCst), 0);
    assert!(!diag.has(WarningKind::ToolLogin));

    let config = Config::from_yaml("tool:\n  login: true\n").unwrap();
    let (result, diag) = check(&config, &keys(), &tool, "dev").await;
    assert_eq!(result, Ok(()));
    assert_eq!(tool.login_calls.load(Ordering::SeqCst), 1);
    assert!(diag.has(WarningKind::ToolLogin));
}
