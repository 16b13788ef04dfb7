mod context;
mod engine;
mod error;
mod retry;
mod stage;
mod transition;

pub mod providers;
pub mod stages;
pub mod traits;

#[cfg(test)]
pub(crate) mod mocks;
#[cfg(test)]
mod scenarios;

pub use context::{Collaborators, PipelineContext};
pub use engine::PipelineEngine;
pub use error::{CollaboratorError, EngineError, StageError};
pub use stage::Stage;
pub use transition::{Checkpoint, Guard, TransitionTable};

pub type Result<T> = std::result::Result<T, EngineError>;
