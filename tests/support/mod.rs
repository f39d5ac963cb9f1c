// ABOUTME: Test support utilities.
// ABOUTME: Fake revision history and deployer, plus workspace builders for integration tests.

use async_trait::async_trait;
use deckhand::deploy::{DeployError, DeployReceipt, Deployer};
use deckhand::discovery::Module;
use deckhand::fingerprint::{RevisionControl, RevisionError};
use deckhand::types::{ModuleName, StageName};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("deckhand=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Create `<root>/<dir>/<name>/serverless.yml` plus a handler file.
/// An existing module is left untouched.
#[allow(dead_code)]
pub fn add_module(root: &Path, dir: &str, name: &str) -> PathBuf {
    let path = root.join(dir).join(name);
    if path.join("serverless.yml").exists() {
        return path;
    }
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("serverless.yml"), format!("service: {name}\n")).unwrap();
    fs::write(path.join("handler.js"), "module.exports.handler = async () => ({});\n").unwrap();
    path
}

#[allow(dead_code)]
pub fn module(root: &Path, name: &str) -> Module {
    Module::new(
        ModuleName::new(name).unwrap(),
        add_module(root, "functions", name),
    )
}

#[allow(dead_code)]
pub fn stage(name: &str) -> StageName {
    StageName::new(name).unwrap()
}

/// Revision history with a fixed current revision and per-module change sets.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeRevisions {
    pub current: Option<String>,
    /// Changed files keyed by the module directory name.
    pub changed: HashMap<String, Vec<String>>,
    pub fail_diff: bool,
    pub diff_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeRevisions {
    pub fn at(revision: &str) -> Self {
        Self {
            current: Some(revision.to_string()),
            ..Default::default()
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_changes(mut self, module: &str, files: &[&str]) -> Self {
        self.changed.insert(
            module.to_string(),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn failing_diff(mut self) -> Self {
        self.fail_diff = true;
        self
    }
}

#[async_trait]
impl RevisionControl for FakeRevisions {
    async fn current_revision(&self) -> Option<String> {
        self.current.clone()
    }

    async fn changed_files(
        &self,
        _from: &str,
        _to: &str,
        scope: &Path,
    ) -> Result<Vec<String>, RevisionError> {
        self.diff_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_diff {
            return Err(RevisionError::Command {
                command: "diff".to_string(),
                stderr: "fatal: bad object".to_string(),
            });
        }
        let name = scope
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        Ok(self.changed.get(name).cloned().unwrap_or_default())
    }
}

/// Deployer that records calls, tracks overlap, and fails on request.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeDeployer {
    failing: HashSet<String>,
    endpoints: HashMap<String, Vec<String>>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    starts: Mutex<Vec<tokio::time::Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl FakeDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, module: &str) -> Self {
        self.failing.insert(module.to_string());
        self
    }

    pub fn with_endpoint(mut self, module: &str, url: &str) -> Self {
        self.endpoints
            .entry(module.to_string())
            .or_default()
            .push(url.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<tokio::time::Instant> {
        self.starts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Deployer for FakeDeployer {
    async fn deploy(&self, module: &Module, _stage: &StageName) -> Result<DeployReceipt, DeployError> {
        let name = module.name.to_string();
        self.calls.lock().unwrap().push(name.clone());
        self.starts.lock().unwrap().push(tokio::time::Instant::now());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&name) {
            return Err(DeployError::ToolFailed {
                tool: "serverless".to_string(),
                status: "exit status: 1".to_string(),
                output: "Error: User is not authorized to perform: cloudformation:CreateStack"
                    .to_string(),
            });
        }

        Ok(DeployReceipt {
            endpoints: self.endpoints.get(&name).cloned().unwrap_or_default(),
            output: format!("✔ Service deployed to stack {name}-dev"),
        })
    }
}
