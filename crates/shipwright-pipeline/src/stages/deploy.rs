use std::fmt::Write;

use shipwright_core::{ErrorKind, IssueStatus, StageId, WorkflowRecord};
use tracing::{debug, info, warn};

use super::{missing, notify};
use crate::context::PipelineContext;
use crate::error::StageError;
use crate::retry::with_retry;
use crate::stage::Stage;
use crate::traits::DeploymentRequest;

/// Opens a pull request for committed work, then deploys under the retry
/// policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployStage;

impl Stage for DeployStage {
    fn id(&self) -> StageId {
        StageId::Deploy
    }

    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError> {
        let issue_key = record
            .issue_key()
            .ok_or_else(|| missing(StageId::Deploy, "a verified identity"))?
            .to_string();
        let branch = record
            .plan()
            .map(|plan| plan.branch.clone())
            .ok_or_else(|| missing(StageId::Deploy, "a plan"))?;

        if record.commit_id().is_some() {
            open_pull_request(ctx, record, &branch);
        }

        record.mark_deployment_attempted();
        let commit_id = record.commit_id().map(str::to_string);
        let request = DeploymentRequest {
            issue_key: &issue_key,
            branch: &branch,
            commit_id: commit_id.as_deref(),
        };

        match with_retry(ctx.config().retry(), "deploy", |_| {
            ctx.deployer().deploy(&request)
        }) {
            Ok(url) => {
                info!(url = %url, "deployment succeeded");
                record.set_deployment_url(url.as_str());
                record.set_deployment_successful(true);
                notify(ctx, record, IssueStatus::Deployed, format!("Deployed to {url}"));
            }
            Err(e) => {
                warn!(error = %e, "deployment failed");
                record.set_deployment_successful(false);
                record.push_error(ErrorKind::Deployment, format!("deployment failed: {e}"));
                notify(ctx, record, IssueStatus::Failed, "Deployment failed");
            }
        }
        Ok(())
    }
}

fn open_pull_request(ctx: &PipelineContext, record: &mut WorkflowRecord, branch: &str) {
    let title = record.identity().map_or_else(String::new, |identity| {
        format!("[{}] {}", identity.key(), identity.summary())
    });
    let body = pull_request_body(record);

    match ctx.source_host().create_pull_request(branch, &title, &body) {
        Ok(Some(url)) => {
            info!(url = %url, "pull request opened");
            record.set_pr_url(url.as_str());
            notify(
                ctx,
                record,
                IssueStatus::InReview,
                format!("Pull request opened: {url}"),
            );
        }
        Ok(None) => debug!("source host does not support pull requests"),
        Err(e) => {
            warn!(error = %e, "pull request creation failed");
            record.push_error(
                ErrorKind::SourceControl,
                format!("failed to open pull request: {e}"),
            );
        }
    }
}

fn pull_request_body(record: &WorkflowRecord) -> String {
    let mut body = String::from("Automated change.\n\n");
    for change in record.file_changes() {
        let _ = writeln!(body, "- {} `{}`", change.action(), change.path().display());
    }
    let _ = write!(body, "\nTrace-Id: {}", record.trace_id());
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockDeployer, MockSetup, persisted_record, setup_project};

    #[test]
    fn successful_deploy_records_urls() -> anyhow::Result<()> {
        let dir = setup_project()?;
        let mocks = MockSetup::new();
        let ctx = mocks.context(dir.path());
        let mut record = persisted_record(&ctx, "SHIP-1", "needs search")?;

        DeployStage.execute(&ctx, &mut record)?;

        assert!(record.deployment_attempted());
        assert!(record.deployment_successful());
        assert_eq!(
            record.deployment_url(),
            Some("https://deploy.test/ship-1")
        );
        assert_eq!(record.pr_url(), Some("https://host.test/pull/1"));
        assert!(record.errors().is_empty());
        Ok(())
    }

    #[test]
    fn transient_deploy_failure_is_retried() -> anyhow::Result<()> {
        let dir = setup_project()?;
        let mocks = MockSetup::new().with_deployer(MockDeployer::failing_times(1));
        let ctx = mocks.context(dir.path());
        let mut record = persisted_record(&ctx, "SHIP-1", "needs search")?;

        DeployStage.execute(&ctx, &mut record)?;

        assert_eq!(mocks.deployer.calls(), 2);
        assert!(record.deployment_successful());
        Ok(())
    }

    #[test]
    fn exhausted_retries_record_deployment_error() -> anyhow::Result<()> {
        let dir = setup_project()?;
        let mocks = MockSetup::new().with_deployer(MockDeployer::always_failing());
        let ctx = mocks.context(dir.path());
        let mut record = persisted_record(&ctx, "SHIP-1", "needs search")?;

        DeployStage.execute(&ctx, &mut record)?;

        assert!(record.deployment_attempted());
        assert!(!record.deployment_successful());
        assert!(record.deployment_url().is_none());
        assert_eq!(record.errors()[0].kind, ErrorKind::Deployment);
        Ok(())
    }

    #[test]
    fn uncommitted_work_gets_no_pull_request() -> anyhow::Result<()> {
        let dir = setup_project()?;
        let mocks = MockSetup::new().without_commit();
        let ctx = mocks.context(dir.path());
        let mut record = persisted_record(&ctx, "SHIP-1", "needs search")?;

        DeployStage.execute(&ctx, &mut record)?;

        assert!(record.pr_url().is_none());
        assert!(mocks.source_host.pull_requests().is_empty());
        assert!(record.deployment_successful());
        Ok(())
    }

    #[test]
    fn pull_request_body_lists_changes() -> anyhow::Result<()> {
        let dir = setup_project()?;
        let ctx = MockSetup::new().context(dir.path());
        let record = persisted_record(&ctx, "SHIP-1", "needs search")?;

        let body = pull_request_body(&record);

        assert!(body.contains("- created `frontend/src/components/SearchBar.jsx`"));
        assert!(body.contains(&record.trace_id().to_string()));
        Ok(())
    }
}
