//! Contract for the external presentation application that receives slides.
//!
//! A document host may be a process shared with other users (when attached
//! rather than started), so every call is treated as fallible. Handles are
//! opaque tokens issued by the host; the session manager owns the ones it
//! receives until it releases them.

use crate::error::HostResult;
use std::fmt;
use std::path::Path;

/// Opaque reference to a running host instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceHandle(pub u64);

/// Opaque reference to a document open in a host instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentHandle(pub u64);

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance #{}", self.0)
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document #{}", self.0)
    }
}

/// Capabilities the session manager needs from a presentation application.
pub trait DocumentHost {
    /// Find an instance that is already running. `Ok(None)` means none was found.
    fn try_attach_running_instance(&mut self) -> HostResult<Option<InstanceHandle>>;

    /// Start a new instance.
    fn create_instance(&mut self) -> HostResult<InstanceHandle>;

    fn set_visible(&mut self, instance: InstanceHandle, visible: bool) -> HostResult<()>;

    /// Create a new, empty document in the instance.
    fn create_document(&mut self, instance: InstanceHandle) -> HostResult<DocumentHandle>;

    /// Append a slide with a title and a body holding one line per bullet.
    fn append_slide(
        &mut self,
        document: DocumentHandle,
        title: &str,
        bullet_lines: &[String],
    ) -> HostResult<()>;

    /// Whether the document has changes that were never saved.
    fn is_dirty(&mut self, document: DocumentHandle) -> HostResult<bool>;

    fn save_as(&mut self, document: DocumentHandle, path: &Path) -> HostResult<()>;

    /// Ask the instance to exit.
    fn quit(&mut self, instance: InstanceHandle) -> HostResult<()>;

    /// Drop this caller's reference to an instance.
    fn release_instance(&mut self, instance: InstanceHandle) -> HostResult<()>;

    /// Drop this caller's reference to a document.
    fn release_document(&mut self, document: DocumentHandle) -> HostResult<()>;
}

impl<H: DocumentHost + ?Sized> DocumentHost for &mut H {
    fn try_attach_running_instance(&mut self) -> HostResult<Option<InstanceHandle>> {
        (**self).try_attach_running_instance()
    }

    fn create_instance(&mut self) -> HostResult<InstanceHandle> {
        (**self).create_instance()
    }

    fn set_visible(&mut self, instance: InstanceHandle, visible: bool) -> HostResult<()> {
        (**self).set_visible(instance, visible)
    }

    fn create_document(&mut self, instance: InstanceHandle) -> HostResult<DocumentHandle> {
        (**self).create_document(instance)
    }

    fn append_slide(
        &mut self,
        document: DocumentHandle,
        title: &str,
        bullet_lines: &[String],
    ) -> HostResult<()> {
        (**self).append_slide(document, title, bullet_lines)
    }

    fn is_dirty(&mut self, document: DocumentHandle) -> HostResult<bool> {
        (**self).is_dirty(document)
    }

    fn save_as(&mut self, document: DocumentHandle, path: &Path) -> HostResult<()> {
        (**self).save_as(document, path)
    }

    fn quit(&mut self, instance: InstanceHandle) -> HostResult<()> {
        (**self).quit(instance)
    }

    fn release_instance(&mut self, instance: InstanceHandle) -> HostResult<()> {
        (**self).release_instance(instance)
    }

    fn release_document(&mut self, document: DocumentHandle) -> HostResult<()> {
        (**self).release_document(document)
    }
}
