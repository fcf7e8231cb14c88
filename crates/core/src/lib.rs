//! Plain-text slide document parsing and the lifecycle of the presentation
//! session that receives the parsed slides.

pub mod error;
pub mod example;
pub mod host;
pub mod input;
pub mod parser;
pub mod prompt;
pub mod selection;
pub mod session;
pub mod types;

pub use error::{Error, HostError, HostResult, Result};
pub use example::EXAMPLE_TEXT;
pub use host::{DocumentHandle, DocumentHost, InstanceHandle};
pub use input::read_all_text;
pub use parser::{parse_slides, SlideParser};
pub use prompt::{PromptAnswer, PromptService};
pub use selection::SlideSelection;
pub use session::{
    HostOwnership, ImportOptions, ImportReport, Phase, RetainedSession, SaveDecision,
    SessionManager, SessionState,
};
pub use types::{InvalidReason, SlideContent, SlideRecord};
