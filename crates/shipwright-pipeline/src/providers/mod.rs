//! Local implementations of the collaborator traits.

mod command;
mod deployer;
mod generator;
mod git;
mod health;
mod report;
mod test_runner;
mod tracker;

pub use deployer::CommandDeployer;
pub use generator::TemplateCodeGenerator;
pub use git::LocalGitSourceHost;
pub use health::CommandHealthCheck;
pub use report::FileSystemReportWriter;
pub use test_runner::CommandTestRunner;
pub use tracker::TracingIssueTracker;
