use std::path::{Path, PathBuf};
use std::sync::Arc;

use shipwright_config::PipelineConfig;
use shipwright_txn::FileTransactionManager;

use crate::providers::{
    CommandDeployer, CommandHealthCheck, CommandTestRunner, FileSystemReportWriter,
    LocalGitSourceHost, TemplateCodeGenerator, TracingIssueTracker,
};
use crate::traits::{
    CodeGenerator, Deployer, HealthCheck, IssueTracker, ReportWriter, SourceHost, TestRunner,
};

/// The external collaborators stages call out to.
#[derive(Clone)]
pub struct Collaborators {
    pub issue_tracker: Arc<dyn IssueTracker>,
    pub source_host: Arc<dyn SourceHost>,
    pub code_generator: Arc<dyn CodeGenerator>,
    pub test_runner: Arc<dyn TestRunner>,
    pub deployer: Arc<dyn Deployer>,
    pub health_check: Arc<dyn HealthCheck>,
    pub report_writer: Arc<dyn ReportWriter>,
}

impl Collaborators {
    /// Local providers: log-only tracker, git2 source host, template
    /// generator and the configured shell commands.
    #[must_use]
    pub fn local(project_root: &Path, config: &PipelineConfig) -> Self {
        let commands = config.commands();
        Self {
            issue_tracker: Arc::new(TracingIssueTracker::new()),
            source_host: Arc::new(LocalGitSourceHost::new(project_root)),
            code_generator: Arc::new(TemplateCodeGenerator::new()),
            test_runner: Arc::new(CommandTestRunner::new(
                project_root,
                commands.test(),
                commands.timeout(),
            )),
            deployer: Arc::new(CommandDeployer::new(
                project_root,
                commands.deploy(),
                commands.timeout(),
                config.deployment_url_base(),
            )),
            health_check: Arc::new(CommandHealthCheck::new(
                project_root,
                commands.health(),
                commands.timeout(),
            )),
            report_writer: Arc::new(FileSystemReportWriter::new()),
        }
    }
}

/// Shared, read-only environment of every run: project root, configuration,
/// the transaction manager and the collaborators.
///
/// Safe to share between concurrent runs; all mutable state lives either in
/// the record or behind the transaction manager's per-trace bookkeeping.
#[derive(Clone)]
pub struct PipelineContext {
    project_root: PathBuf,
    config: PipelineConfig,
    files: Arc<FileTransactionManager>,
    collaborators: Collaborators,
}

impl PipelineContext {
    #[must_use]
    pub fn new(
        project_root: impl Into<PathBuf>,
        config: PipelineConfig,
        collaborators: Collaborators,
    ) -> Self {
        let project_root = project_root.into();
        let files = Arc::new(FileTransactionManager::new(
            project_root.clone(),
            config.backup_dir(),
        ));
        Self {
            project_root,
            config,
            files,
            collaborators,
        }
    }

    /// Context wired to [`Collaborators::local`].
    #[must_use]
    pub fn local(project_root: impl Into<PathBuf>, config: PipelineConfig) -> Self {
        let project_root = project_root.into();
        let collaborators = Collaborators::local(&project_root, &config);
        Self::new(project_root, config, collaborators)
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn files(&self) -> &FileTransactionManager {
        &self.files
    }

    #[must_use]
    pub fn issue_tracker(&self) -> &dyn IssueTracker {
        self.collaborators.issue_tracker.as_ref()
    }

    #[must_use]
    pub fn source_host(&self) -> &dyn SourceHost {
        self.collaborators.source_host.as_ref()
    }

    #[must_use]
    pub fn code_generator(&self) -> &dyn CodeGenerator {
        self.collaborators.code_generator.as_ref()
    }

    #[must_use]
    pub fn test_runner(&self) -> &dyn TestRunner {
        self.collaborators.test_runner.as_ref()
    }

    #[must_use]
    pub fn deployer(&self) -> &dyn Deployer {
        self.collaborators.deployer.as_ref()
    }

    #[must_use]
    pub fn health_check(&self) -> &dyn HealthCheck {
        self.collaborators.health_check.as_ref()
    }

    #[must_use]
    pub fn report_writer(&self) -> &dyn ReportWriter {
        self.collaborators.report_writer.as_ref()
    }
}
