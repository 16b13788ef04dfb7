use crate::error::CollaboratorError;

/// Post-deploy health check.
pub trait HealthCheck: Send + Sync {
    /// Returns the problems observed; an empty list means healthy.
    ///
    /// # Errors
    ///
    /// Returns an error if the check could not run at all.
    fn check(&self, deployment_url: Option<&str>) -> Result<Vec<String>, CollaboratorError>;
}
