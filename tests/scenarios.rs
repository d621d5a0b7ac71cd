//! Scenario tests against a simulated platform
//!
//! The fake CLI keeps database, config and replica state in memory and
//! moves databases through transitional states on each `databases` call,
//! so the polling loops see the same convergence pattern as a live run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gigalixir_smoke::common::config::{Config, PollSettings};
use gigalixir_smoke::harness::{CliHarness, CliRequest, Invocation};
use gigalixir_smoke::platform::{Credentials, GigalixirCli};
use gigalixir_smoke::probe::{Endpoint, Fetched};
use gigalixir_smoke::scenario::{run_with, StepLog};
use gigalixir_smoke::vcs::{repo_dir_name, PushMode, Vcs};
use gigalixir_smoke::{FailureKind, Result, ScenarioContext, ScenarioKind, ScenarioReport};

const APP_NAME: &str = "gentle-fox-4821";

// ============== Fake CLI ==============

#[derive(Default)]
struct PlatformState {
    apps: Vec<(String, u32)>,
    databases: Vec<(String, String)>,
    /// Target state and remaining `databases` calls before it applies
    transition: Option<(usize, String, u32)>,
    settle_after: u32,
    next_db: u32,
    configs: BTreeMap<String, String>,
    replicas: u32,
    fail_command: Option<String>,
    log: Vec<CliRequest>,
}

struct FakePlatform {
    state: Mutex<PlatformState>,
}

impl FakePlatform {
    fn new(apps: &[(&str, u32)], settle_after: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PlatformState {
                apps: apps.iter().map(|(n, r)| (n.to_string(), *r)).collect(),
                settle_after,
                next_db: 1,
                ..Default::default()
            }),
        })
    }

    fn with_database(self: Arc<Self>, id: &str, state: &str) -> Arc<Self> {
        self.state
            .lock()
            .unwrap()
            .databases
            .push((id.to_string(), state.to_string()));
        self
    }

    fn failing(self: Arc<Self>, command: &str) -> Arc<Self> {
        self.state.lock().unwrap().fail_command = Some(command.to_string());
        self
    }

    fn calls(&self, command: &str) -> Vec<CliRequest> {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|r| r.command() == command)
            .cloned()
            .collect()
    }
}

fn ok(stdout: impl Into<String>) -> (i32, String) {
    (0, stdout.into())
}

impl PlatformState {
    fn start_transition(&mut self, idx: usize, during: &str, target: &str) {
        self.databases[idx].1 = during.to_string();
        self.transition = Some((idx, target.to_string(), self.settle_after));
    }

    fn list_databases(&mut self) -> String {
        if let Some((idx, target, remaining)) = self.transition.take() {
            if remaining == 0 {
                self.databases[idx].1 = target;
            } else {
                self.transition = Some((idx, target, remaining - 1));
            }
        }
        let entries: Vec<serde_json::Value> = self
            .databases
            .iter()
            .map(|(id, state)| serde_json::json!({"id": id, "state": state, "size": 0.6}))
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    fn db_index(&self, id: &str) -> Option<usize> {
        self.databases.iter().position(|(db, _)| db == id)
    }

    fn handle(&mut self, req: &CliRequest) -> (i32, String) {
        let args: Vec<&str> = req.args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["login", email] if email.starts_with("--email=") => {
                match req.stdin.as_deref() {
                    Some(input) if input.ends_with("\ny\n") => ok(""),
                    _ => (1, String::new()),
                }
            }
            ["apps"] => {
                let apps: Vec<serde_json::Value> = self
                    .apps
                    .iter()
                    .map(|(name, replicas)| serde_json::json!({"name": name, "replicas": replicas}))
                    .collect();
                ok(serde_json::Value::Array(apps).to_string())
            }
            ["databases", _] => {
                let listing = self.list_databases();
                ok(listing)
            }
            ["create_database", _] => {
                let id = format!("db-{}", self.next_db);
                self.next_db += 1;
                self.databases.push((id, String::new()));
                let idx = self.databases.len() - 1;
                self.start_transition(idx, "PROVISIONING", "AVAILABLE");
                ok("")
            }
            ["scale_database", _, id, size] if size.starts_with("--size=") => {
                match self.db_index(id) {
                    Some(idx) => {
                        self.start_transition(idx, "SCALING", "AVAILABLE");
                        ok("")
                    }
                    None => (1, String::new()),
                }
            }
            ["delete_database", _, id] => {
                if req.stdin.as_deref() != Some("y\n") {
                    return (1, String::new());
                }
                match self.db_index(id) {
                    Some(idx) => {
                        self.start_transition(idx, "DELETING", "DELETED");
                        ok("")
                    }
                    None => (1, String::new()),
                }
            }
            ["create"] => {
                let in_repo = req
                    .cwd
                    .as_deref()
                    .map(|cwd| cwd.ends_with("gigalixir-getting-started"))
                    .unwrap_or(false);
                if !in_repo {
                    return (1, String::new());
                }
                self.replicas = 1;
                ok(format!("{APP_NAME}\n"))
            }
            ["status", app] if *app == APP_NAME => ok(serde_json::json!({
                "replicas_desired": self.replicas,
                "replicas_running": self.replicas,
            })
            .to_string()),
            ["set_config", _, key, value] => {
                self.configs.insert(key.to_string(), value.to_string());
                ok("")
            }
            ["configs", _] => ok(serde_json::to_string(&self.configs).unwrap()),
            ["delete_config", _, key] => {
                self.configs.remove(*key);
                ok("")
            }
            ["scale", _, replicas] => match replicas
                .strip_prefix("--replicas=")
                .and_then(|n| n.parse().ok())
            {
                Some(n) => {
                    self.replicas = n;
                    ok("")
                }
                None => (2, String::new()),
            },
            _ => (2, String::new()),
        }
    }
}

#[async_trait]
impl CliHarness for FakePlatform {
    async fn invoke(&self, request: CliRequest) -> Result<Invocation> {
        let mut state = self.state.lock().unwrap();
        state.log.push(request.clone());

        let (code, stdout) = if state.fail_command.as_deref() == Some(request.command()) {
            (1, String::new())
        } else {
            state.handle(&request)
        };

        Ok(Invocation {
            command: request.command().to_string(),
            exit_code: Some(code),
            stdout,
            stderr: if code == 0 {
                String::new()
            } else {
                "simulated failure".to_string()
            },
        })
    }
}

// ============== Fake git + HTTP ==============

#[derive(Default)]
struct Site {
    live: bool,
    version: String,
    rebased_onto: Option<String>,
    /// Hot pushes after a rebase serve the new version
    upgrades_apply: bool,
    /// 503s served after each push before the app answers
    warmup: u32,
    warming: u32,
    fetches: u32,
    urls: Vec<String>,
    pushes: Vec<PushMode>,
}

#[derive(Clone)]
struct FakeSite(Arc<Mutex<Site>>);

impl FakeSite {
    fn new(warmup: u32, upgrades_apply: bool) -> Self {
        Self(Arc::new(Mutex::new(Site {
            warmup,
            upgrades_apply,
            ..Default::default()
        })))
    }

    fn never_live() -> Self {
        Self(Arc::new(Mutex::new(Site::default())))
    }

    fn fetches(&self) -> u32 {
        self.0.lock().unwrap().fetches
    }
}

struct FakeVcs {
    site: FakeSite,
    go_live: bool,
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn clone_repo(&self, url: &str, parent: &Path) -> Result<PathBuf> {
        let dir = parent.join(repo_dir_name(url));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    async fn push(&self, _repo: &Path, remote: &str, branch: &str, mode: PushMode) -> Result<()> {
        assert_eq!((remote, branch), ("gigalixir", "master"));
        let mut site = self.site.0.lock().unwrap();
        site.pushes.push(mode);
        site.warming = site.warmup;
        match mode {
            PushMode::Cold => {
                site.live = self.go_live;
                site.version = "0.0.1".to_string();
            }
            PushMode::Hot => {
                if site.upgrades_apply && site.rebased_onto.as_deref() == Some("origin/v0.0.2") {
                    site.version = "0.0.2".to_string();
                }
            }
        }
        Ok(())
    }

    async fn rebase(&self, _repo: &Path, onto: &str) -> Result<()> {
        self.site.0.lock().unwrap().rebased_onto = Some(onto.to_string());
        Ok(())
    }
}

#[async_trait]
impl Endpoint for FakeSite {
    async fn fetch(&self, url: &str) -> Result<Fetched> {
        let mut site = self.0.lock().unwrap();
        site.fetches += 1;
        site.urls.push(url.to_string());
        if !site.live {
            return Ok(Fetched::Unreachable("connection refused".to_string()));
        }
        if site.warming > 0 {
            site.warming -= 1;
            return Ok(Fetched::Response {
                status: 503,
                body: String::new(),
            });
        }
        Ok(Fetched::Response {
            status: 200,
            body: format!("<footer>Version {}</footer>", site.version),
        })
    }
}

// ============== Helpers ==============

fn context(
    platform: Arc<FakePlatform>,
    site: FakeSite,
    go_live: bool,
    attempts: u32,
    workdir: &Path,
) -> ScenarioContext {
    let mut config = Config::default();
    config.polling.database = PollSettings {
        attempts,
        interval_secs: 0,
    };
    config.polling.http = PollSettings {
        attempts,
        interval_secs: 0,
    };

    ScenarioContext {
        config,
        credentials: Credentials {
            email: "ops@example.com".to_string(),
            password: "hunter2".to_string(),
        },
        cli: GigalixirCli::new(platform),
        vcs: Arc::new(FakeVcs {
            site: site.clone(),
            go_live,
        }),
        endpoint: Arc::new(site),
        workdir: workdir.to_path_buf(),
    }
}

async fn run(kind: ScenarioKind, ctx: &ScenarioContext) -> ScenarioReport {
    run_with(kind, ctx, &mut StepLog::quiet()).await
}

// ============== Database lifecycle ==============

#[tokio::test]
async fn test_database_lifecycle_passes() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[("busy", 2), ("idle", 0)], 2)
        .with_database("old", "DELETED");
    let ctx = context(platform.clone(), FakeSite::never_live(), false, 30, dir.path());

    let report = run(ScenarioKind::Databases, &ctx).await;
    assert!(report.passed, "scenario failed: {:?}", report.error);
    assert_eq!(report.steps_run, 8);
    assert_eq!(report.steps_total, 8);

    // One pre-check plus three polls of three calls each
    assert_eq!(platform.calls("databases").len(), 10);

    let scale = &platform.calls("scale_database")[0];
    assert_eq!(scale.args, vec!["scale_database", "idle", "db-1", "--size=1.7"]);
    let delete = &platform.calls("delete_database")[0];
    assert_eq!(delete.args, vec!["delete_database", "idle", "db-1"]);
    assert_eq!(delete.stdin.as_deref(), Some("y\n"));
}

#[tokio::test]
async fn test_available_database_at_start_is_precondition_failure() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[("idle", 0)], 0).with_database("leftover", "AVAILABLE");
    let ctx = context(platform.clone(), FakeSite::never_live(), false, 30, dir.path());

    let report = run(ScenarioKind::Databases, &ctx).await;
    assert!(!report.passed);
    assert_eq!(report.failure, Some(FailureKind::Precondition));
    assert_eq!(report.steps_run, 3);
    assert!(report.error.unwrap().contains("leftover"));
    assert!(platform.calls("create_database").is_empty());
}

#[tokio::test]
async fn test_running_app_is_precondition_failure() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[("idle", 0), ("busy", 1)], 0);
    let ctx = context(platform.clone(), FakeSite::never_live(), false, 30, dir.path());

    let report = run(ScenarioKind::Databases, &ctx).await;
    assert_eq!(report.failure, Some(FailureKind::Precondition));
    assert_eq!(report.steps_run, 2);
    assert!(platform.calls("databases").is_empty());
}

#[tokio::test]
async fn test_database_never_available_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[("idle", 0)], u32::MAX);
    let ctx = context(platform.clone(), FakeSite::never_live(), false, 4, dir.path());

    let report = run(ScenarioKind::Databases, &ctx).await;
    assert!(!report.passed);
    assert_eq!(report.failure, Some(FailureKind::ConvergenceTimeout));
    assert_eq!(report.steps_run, 5);
    assert!(report.error.unwrap().contains("delete database manually"));
    // Pre-check plus exactly the attempt budget
    assert_eq!(platform.calls("databases").len(), 1 + 4);
    assert!(platform.calls("scale_database").is_empty());
}

#[tokio::test]
async fn test_login_failure_aborts_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[("idle", 0)], 0).failing("login");
    let ctx = context(platform.clone(), FakeSite::never_live(), false, 30, dir.path());

    let report = run(ScenarioKind::Databases, &ctx).await;
    assert_eq!(report.failure, Some(FailureKind::CommandFailure));
    assert_eq!(report.steps_run, 1);
    assert!(platform.calls("apps").is_empty());
}

// ============== Deploy lifecycle ==============

#[tokio::test]
async fn test_deploy_lifecycle_passes() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[], 0);
    let site = FakeSite::new(2, true);
    let ctx = context(platform.clone(), site.clone(), true, 30, dir.path());

    let report = run(ScenarioKind::Deploy, &ctx).await;
    assert!(report.passed, "scenario failed: {:?}", report.error);
    assert_eq!(report.steps_run, 9);

    let site = site.0.lock().unwrap();
    assert_eq!(site.pushes, vec![PushMode::Cold, PushMode::Hot]);
    assert_eq!(site.rebased_onto.as_deref(), Some("origin/v0.0.2"));
    // Two warmup 503s then success, twice
    assert_eq!(site.fetches, 6);
    assert!(site
        .urls
        .iter()
        .all(|url| url == "https://gentle-fox-4821.gigalixirapp.com/"));
    drop(site);

    let state = platform.state.lock().unwrap();
    assert!(state.configs.is_empty());
    assert_eq!(state.replicas, 0);
    drop(state);

    let configs = platform.calls("configs");
    assert_eq!(configs.len(), 2);
    assert_eq!(
        platform.calls("set_config")[0].args,
        vec!["set_config", APP_NAME, "FOO", "foo"]
    );
    assert_eq!(
        platform.calls("scale")[0].args,
        vec!["scale", APP_NAME, "--replicas=0"]
    );
}

#[tokio::test]
async fn test_unreachable_app_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[], 0);
    let site = FakeSite::never_live();
    let ctx = context(platform.clone(), site.clone(), false, 3, dir.path());

    let report = run(ScenarioKind::Deploy, &ctx).await;
    assert_eq!(report.failure, Some(FailureKind::ConvergenceTimeout));
    assert_eq!(report.steps_run, 5);
    assert!(report.error.unwrap().contains("scale down your app manually"));
    assert_eq!(site.fetches(), 3);
    assert!(platform.calls("status").is_empty());
}

#[tokio::test]
async fn test_hot_upgrade_without_new_version_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[], 0);
    let site = FakeSite::new(0, false);
    let ctx = context(platform.clone(), site.clone(), true, 4, dir.path());

    let report = run(ScenarioKind::Deploy, &ctx).await;
    assert_eq!(report.failure, Some(FailureKind::ConvergenceTimeout));
    assert_eq!(report.steps_run, 8);
    assert!(report.error.unwrap().contains("0.0.2"));
    // First check passes at once, the upgrade check uses the whole budget
    assert_eq!(site.fetches(), 1 + 4);
    assert!(platform.calls("scale").is_empty());
}

#[tokio::test]
async fn test_config_command_failure_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(&[], 0).failing("set_config");
    let ctx = context(platform.clone(), FakeSite::new(0, true), true, 30, dir.path());

    let report = run(ScenarioKind::Deploy, &ctx).await;
    assert_eq!(report.failure, Some(FailureKind::CommandFailure));
    assert_eq!(report.steps_run, 7);
    assert_eq!(platform.calls("set_config").len(), 1);
    assert!(platform.calls("configs").is_empty());
}
