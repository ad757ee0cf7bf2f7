pub mod backend;
pub mod error;
pub mod history;
pub mod options;
pub mod orchestrator;
pub mod payload;
pub mod prompt;
pub mod session;

pub use backend::ImageBackend;
pub use error::{ErrorKind, GenerationResult, StudioError};
pub use orchestrator::{Orchestrator, StudioModels};
pub use payload::ImagePayload;
pub use session::{Flow, FlowState, Session};
