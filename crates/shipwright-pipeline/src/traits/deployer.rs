use crate::error::CollaboratorError;

#[derive(Debug, Clone, Copy)]
pub struct DeploymentRequest<'a> {
    pub issue_key: &'a str,
    pub branch: &'a str,
    pub commit_id: Option<&'a str>,
}

pub trait Deployer: Send + Sync {
    /// Deploys the run's branch and returns the deployment URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment failed.
    fn deploy(&self, request: &DeploymentRequest<'_>) -> Result<String, CollaboratorError>;
}
