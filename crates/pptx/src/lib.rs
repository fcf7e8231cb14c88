//! PPTX (Office Open XML) backend for plain-text slide import.
//!
//! Provides an in-process document host that writes `.pptx` packages and a
//! reader that pulls the title/bullet outline back out of them.

pub mod host;
pub mod outline;
pub mod template;
pub mod writer;

pub use host::{OpenDocument, PptxHost};
pub use outline::{read_outline, OutlineReader, OutlineSlide};
pub use writer::{write_package, DeckSlide};
