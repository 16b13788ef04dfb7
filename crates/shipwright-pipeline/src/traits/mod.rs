mod code_generator;
mod deployer;
mod health_check;
mod issue_tracker;
mod report_writer;
mod source_host;
mod test_runner;

pub use code_generator::{CodeGenerator, GeneratedFiles, GenerationFailure, GenerationRequest};
pub use deployer::{Deployer, DeploymentRequest};
pub use health_check::HealthCheck;
pub use issue_tracker::IssueTracker;
pub use report_writer::ReportWriter;
pub use source_host::SourceHost;
pub use test_runner::TestRunner;
