use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use shipwright_config::{GitConfig, PipelineConfig, RetryConfig};
use shipwright_core::{
    IngressEvent, IssueStatus, RunReport, StageId, TestResult, WorkflowRecord,
};
use tempfile::TempDir;

use crate::context::{Collaborators, PipelineContext};
use crate::error::{CollaboratorError, StageError};
use crate::stage::Stage;
use crate::stages::{
    AnalyzeStage, DeployStage, GenerateStage, PersistStage, PlanStage, TestStage, VerifyStage,
};
use crate::traits::{
    CodeGenerator, Deployer, DeploymentRequest, GeneratedFiles, GenerationFailure,
    GenerationRequest, HealthCheck, IssueTracker, ReportWriter, SourceHost, TestRunner,
};

pub const ORIGINAL_APP_JSX: &str = "export default function App() {}\n";
pub const ORIGINAL_APP_CSS: &str = ".app {}\n";

/// Temp project with a frontend containing `App.jsx` and `App.css`.
pub fn setup_project() -> anyhow::Result<TempDir> {
    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("frontend/src"))?;
    fs::write(dir.path().join("frontend/src/App.jsx"), ORIGINAL_APP_JSX)?;
    fs::write(dir.path().join("frontend/src/App.css"), ORIGINAL_APP_CSS)?;
    Ok(dir)
}

fn run_stages(
    ctx: &PipelineContext,
    record: &mut WorkflowRecord,
    stages: &[&dyn Stage],
) -> Result<(), StageError> {
    for stage in stages {
        stage.execute(ctx, record)?;
    }
    Ok(())
}

fn event(key: &str, description: &str) -> IngressEvent {
    IngressEvent::new(key, "Improve the task list")
        .with_type("Story")
        .with_description(description)
}

/// Record that went through verify, analyze and plan.
pub fn planned_record(key: &str, description: &str) -> anyhow::Result<WorkflowRecord> {
    let ctx = MockSetup::new().context(Path::new("."));
    let mut record = WorkflowRecord::new(event(key, description));
    run_stages(&ctx, &mut record, &[&VerifyStage, &AnalyzeStage, &PlanStage])?;
    Ok(record)
}

pub fn generated_record(
    ctx: &PipelineContext,
    key: &str,
    description: &str,
) -> anyhow::Result<WorkflowRecord> {
    let mut record = planned_record(key, description)?;
    GenerateStage.execute(ctx, &mut record)?;
    Ok(record)
}

pub fn persisted_record(
    ctx: &PipelineContext,
    key: &str,
    description: &str,
) -> anyhow::Result<WorkflowRecord> {
    let mut record = generated_record(ctx, key, description)?;
    PersistStage.execute(ctx, &mut record)?;
    Ok(record)
}

pub fn deployed_record(
    ctx: &PipelineContext,
    key: &str,
    description: &str,
) -> anyhow::Result<WorkflowRecord> {
    let mut record = persisted_record(ctx, key, description)?;
    run_stages(ctx, &mut record, &[&TestStage, &DeployStage])?;
    Ok(record)
}

/// Every collaborator as an inspectable mock.
pub struct MockSetup {
    pub tracker: Arc<RecordingIssueTracker>,
    pub source_host: Arc<MockSourceHost>,
    pub generator: Arc<ScriptedCodeGenerator>,
    pub test_runner: Arc<MockTestRunner>,
    pub deployer: Arc<MockDeployer>,
    pub health_check: Arc<MockHealthCheck>,
    pub reports: Arc<RecordingReportWriter>,
    commit: bool,
}

impl MockSetup {
    pub fn new() -> Self {
        Self {
            tracker: Arc::new(RecordingIssueTracker::default()),
            source_host: Arc::new(MockSourceHost::default()),
            generator: Arc::new(ScriptedCodeGenerator::new()),
            test_runner: Arc::new(MockTestRunner::passing()),
            deployer: Arc::new(MockDeployer::succeeding()),
            health_check: Arc::new(MockHealthCheck::healthy()),
            reports: Arc::new(RecordingReportWriter::default()),
            commit: true,
        }
    }

    pub fn with_failing_tracker(mut self) -> Self {
        self.tracker = Arc::new(RecordingIssueTracker {
            fail: true,
            ..RecordingIssueTracker::default()
        });
        self
    }

    pub fn with_failing_commit(mut self) -> Self {
        self.source_host = Arc::new(MockSourceHost {
            fail_commit: true,
            ..MockSourceHost::default()
        });
        self
    }

    pub fn without_commit(mut self) -> Self {
        self.commit = false;
        self
    }

    pub fn with_generator(mut self, generator: ScriptedCodeGenerator) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    pub fn with_test_runner(mut self, runner: MockTestRunner) -> Self {
        self.test_runner = Arc::new(runner);
        self
    }

    pub fn with_deployer(mut self, deployer: MockDeployer) -> Self {
        self.deployer = Arc::new(deployer);
        self
    }

    pub fn with_health_check(mut self, check: MockHealthCheck) -> Self {
        self.health_check = Arc::new(check);
        self
    }

    pub fn with_report_writer(mut self, writer: RecordingReportWriter) -> Self {
        self.reports = Arc::new(writer);
        self
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_retry(RetryConfig::immediate(2))
            .with_git(GitConfig::default().with_commit(self.commit))
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            issue_tracker: self.tracker.clone(),
            source_host: self.source_host.clone(),
            code_generator: self.generator.clone(),
            test_runner: self.test_runner.clone(),
            deployer: self.deployer.clone(),
            health_check: self.health_check.clone(),
            report_writer: self.reports.clone(),
        }
    }

    pub fn context(&self, project_root: &Path) -> PipelineContext {
        PipelineContext::new(project_root, self.config(), self.collaborators())
    }
}

#[derive(Default)]
pub struct RecordingIssueTracker {
    updates: Mutex<Vec<(String, IssueStatus, String)>>,
    comments: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingIssueTracker {
    pub fn updates(&self) -> Vec<(String, IssueStatus, String)> {
        self.updates.lock().expect("lock poisoned").clone()
    }

    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().expect("lock poisoned").clone()
    }
}

impl IssueTracker for RecordingIssueTracker {
    fn update_status(
        &self,
        issue_key: &str,
        status: IssueStatus,
        comment: &str,
    ) -> Result<bool, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Rejected("tracker unavailable".to_string()));
        }
        self.updates.lock().expect("lock poisoned").push((
            issue_key.to_string(),
            status,
            comment.to_string(),
        ));
        Ok(true)
    }

    fn add_comment(&self, issue_key: &str, comment: &str) -> Result<bool, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Rejected("tracker unavailable".to_string()));
        }
        self.comments
            .lock()
            .expect("lock poisoned")
            .push((issue_key.to_string(), comment.to_string()));
        Ok(true)
    }
}

#[derive(Default)]
pub struct MockSourceHost {
    branches: Mutex<Vec<String>>,
    commits: Mutex<Vec<(String, Vec<PathBuf>)>>,
    pull_requests: Mutex<Vec<String>>,
    fail_commit: bool,
}

impl MockSourceHost {
    pub fn branches(&self) -> Vec<String> {
        self.branches.lock().expect("lock poisoned").clone()
    }

    pub fn commits(&self) -> Vec<(String, Vec<PathBuf>)> {
        self.commits.lock().expect("lock poisoned").clone()
    }

    pub fn pull_requests(&self) -> Vec<String> {
        self.pull_requests.lock().expect("lock poisoned").clone()
    }
}

impl SourceHost for MockSourceHost {
    fn create_branch(&self, name: &str) -> Result<bool, CollaboratorError> {
        self.branches
            .lock()
            .expect("lock poisoned")
            .push(name.to_string());
        Ok(true)
    }

    fn commit(&self, message: &str, paths: &[&Path]) -> Result<String, CollaboratorError> {
        if self.fail_commit {
            return Err(CollaboratorError::Rejected("push rejected".to_string()));
        }
        self.commits.lock().expect("lock poisoned").push((
            message.to_string(),
            paths.iter().map(|p| p.to_path_buf()).collect(),
        ));
        Ok("c0ffee".to_string())
    }

    fn create_pull_request(
        &self,
        branch: &str,
        _title: &str,
        _body: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        let mut pull_requests = self.pull_requests.lock().expect("lock poisoned");
        pull_requests.push(branch.to_string());
        Ok(Some(format!("https://host.test/pull/{}", pull_requests.len())))
    }
}

/// Generates `// <path>` for every plan target, optionally failing first.
pub struct ScriptedCodeGenerator {
    failures_before_success: u32,
    partial: GeneratedFiles,
    calls: AtomicU32,
}

impl ScriptedCodeGenerator {
    pub fn new() -> Self {
        Self {
            failures_before_success: 0,
            partial: GeneratedFiles::new(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing_times(mut self, failures: u32) -> Self {
        self.failures_before_success = failures;
        self
    }

    pub fn always_failing(self) -> Self {
        self.failing_times(u32::MAX)
    }

    pub fn with_partial(mut self, path: &str, content: &str) -> Self {
        self.partial.insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeGenerator for ScriptedCodeGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedFiles, GenerationFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures_before_success {
            return Err(GenerationFailure::new(format!("generation service error on call {call}"))
                .with_partial(self.partial.clone()));
        }
        Ok(request
            .plan
            .targets
            .iter()
            .map(|target| {
                (
                    target.path.clone(),
                    format!("// {}\n", target.path.display()),
                )
            })
            .collect())
    }
}

/// Passes every suite unless given explicit results or told to fail.
pub struct MockTestRunner {
    results: Option<Vec<TestResult>>,
    fail: bool,
    runs: Mutex<Vec<Vec<PathBuf>>>,
}

impl MockTestRunner {
    pub fn passing() -> Self {
        Self {
            results: None,
            fail: false,
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(results: Vec<TestResult>) -> Self {
        Self {
            results: Some(results),
            ..Self::passing()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::passing()
        }
    }

    pub fn runs(&self) -> Vec<Vec<PathBuf>> {
        self.runs.lock().expect("lock poisoned").clone()
    }
}

impl TestRunner for MockTestRunner {
    fn run(&self, suite: &IndexMap<PathBuf, String>) -> Result<Vec<TestResult>, CollaboratorError> {
        self.runs
            .lock()
            .expect("lock poisoned")
            .push(suite.keys().cloned().collect());
        if self.fail {
            return Err(CollaboratorError::Rejected("test runner crashed".to_string()));
        }
        if let Some(results) = &self.results {
            return Ok(results.clone());
        }
        Ok(suite
            .keys()
            .map(|path| TestResult {
                suite: path.display().to_string(),
                passed: 1,
                failed: 0,
                output: None,
            })
            .collect())
    }
}

pub struct MockDeployer {
    failures_before_success: u32,
    calls: AtomicU32,
}

impl MockDeployer {
    pub fn succeeding() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures_before_success: failures,
            calls: AtomicU32::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_times(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Deployer for MockDeployer {
    fn deploy(&self, request: &DeploymentRequest<'_>) -> Result<String, CollaboratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures_before_success {
            return Err(CollaboratorError::Rejected(format!(
                "deploy target unavailable on call {call}"
            )));
        }
        Ok(format!(
            "https://deploy.test/{}",
            request.issue_key.to_lowercase()
        ))
    }
}

pub struct MockHealthCheck {
    problems: Vec<String>,
    fail: bool,
}

impl MockHealthCheck {
    pub fn healthy() -> Self {
        Self {
            problems: Vec::new(),
            fail: false,
        }
    }

    pub fn reporting<const N: usize>(problems: [&str; N]) -> Self {
        Self {
            problems: problems.iter().map(ToString::to_string).collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            problems: Vec::new(),
            fail: true,
        }
    }
}

impl HealthCheck for MockHealthCheck {
    fn check(&self, _deployment_url: Option<&str>) -> Result<Vec<String>, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Rejected("health endpoint unreachable".to_string()));
        }
        Ok(self.problems.clone())
    }
}

#[derive(Default)]
pub struct RecordingReportWriter {
    writes: Mutex<Vec<PathBuf>>,
    fail: bool,
}

impl RecordingReportWriter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().expect("lock poisoned").clone()
    }
}

impl ReportWriter for RecordingReportWriter {
    fn write(
        &self,
        path: &Path,
        _record: &WorkflowRecord,
        _report: &RunReport,
    ) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Rejected("disk full".to_string()));
        }
        self.writes
            .lock()
            .expect("lock poisoned")
            .push(path.to_path_buf());
        Ok(())
    }
}

/// Stage that panics, standing in for a bug in stage code.
pub struct PanickingStage(pub StageId);

impl Stage for PanickingStage {
    fn id(&self) -> StageId {
        self.0
    }

    fn execute(&self, _ctx: &PipelineContext, _record: &mut WorkflowRecord) -> Result<(), StageError> {
        panic!("stage {} blew up", self.0);
    }
}

/// Stage that returns an error without touching the record.
pub struct FailingStage(pub StageId);

impl Stage for FailingStage {
    fn id(&self) -> StageId {
        self.0
    }

    fn execute(&self, _ctx: &PipelineContext, _record: &mut WorkflowRecord) -> Result<(), StageError> {
        Err(StageError::MissingInput {
            stage: self.0,
            what: "a working stage",
        })
    }
}
