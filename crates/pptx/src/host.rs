//! In-process document host that renders documents as PPTX files.
//!
//! Instances and documents live in memory. An instance runs from
//! `create_instance` until `quit`; quitting closes its documents. Releasing
//! a handle only drops the caller's reference: a released document stays
//! open in its instance, the same way a real application keeps showing a
//! deck after an automation client lets go of it.
//!
//! `save_as` replaces the destination only once the whole package is written.

use crate::writer::{write_package, DeckSlide};
use slides_core::{DocumentHandle, DocumentHost, HostError, HostResult, InstanceHandle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
struct InstanceState {
    running: bool,
    visible: bool,
    references: usize,
}

#[derive(Debug)]
struct DocumentState {
    instance: u64,
    slides: Vec<DeckSlide>,
    dirty: bool,
    saved_to: Option<PathBuf>,
    referenced: bool,
}

/// A document that is still open in a running instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDocument {
    pub handle: DocumentHandle,
    pub slide_count: usize,
    pub dirty: bool,
    pub saved_to: Option<PathBuf>,
}

/// Document host backed by in-memory decks and PPTX output.
#[derive(Debug, Default)]
pub struct PptxHost {
    next_id: u64,
    instances: BTreeMap<u64, InstanceState>,
    documents: BTreeMap<u64, DocumentState>,
}

impl PptxHost {
    /// Create a host with no running instances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents still open in running instances, including released ones.
    pub fn open_documents(&self) -> Vec<OpenDocument> {
        self.documents
            .iter()
            .map(|(&id, doc)| OpenDocument {
                handle: DocumentHandle(id),
                slide_count: doc.slides.len(),
                dirty: doc.dirty,
                saved_to: doc.saved_to.clone(),
            })
            .collect()
    }

    /// Slides currently in a document.
    pub fn slides(&self, document: DocumentHandle) -> Option<&[DeckSlide]> {
        self.documents
            .get(&document.0)
            .map(|doc| doc.slides.as_slice())
    }

    pub fn is_running(&self, instance: InstanceHandle) -> bool {
        self.instances
            .get(&instance.0)
            .is_some_and(|state| state.running)
    }

    pub fn is_visible(&self, instance: InstanceHandle) -> bool {
        self.instances
            .get(&instance.0)
            .is_some_and(|state| state.running && state.visible)
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn running_instance(&mut self, instance: InstanceHandle) -> HostResult<&mut InstanceState> {
        self.instances
            .get_mut(&instance.0)
            .filter(|state| state.running)
            .ok_or(HostError::UnknownInstance(instance.0))
    }

    fn referenced_document(&mut self, document: DocumentHandle) -> HostResult<&mut DocumentState> {
        self.documents
            .get_mut(&document.0)
            .filter(|doc| doc.referenced)
            .ok_or(HostError::UnknownDocument(document.0))
    }

    fn forget_instance_if_unused(&mut self, id: u64) {
        let unused = self
            .instances
            .get(&id)
            .is_some_and(|state| !state.running && state.references == 0);
        if unused {
            self.instances.remove(&id);
        }
    }
}

impl DocumentHost for PptxHost {
    fn try_attach_running_instance(&mut self) -> HostResult<Option<InstanceHandle>> {
        let found = self
            .instances
            .iter_mut()
            .find(|(_, state)| state.running)
            .map(|(&id, state)| {
                state.references += 1;
                InstanceHandle(id)
            });

        match found {
            Some(instance) => log::debug!("Attached to running {}", instance),
            None => log::debug!("No running instance to attach to"),
        }
        Ok(found)
    }

    fn create_instance(&mut self) -> HostResult<InstanceHandle> {
        let id = self.allocate_id();
        self.instances.insert(
            id,
            InstanceState {
                running: true,
                visible: false,
                references: 1,
            },
        );
        Ok(InstanceHandle(id))
    }

    fn set_visible(&mut self, instance: InstanceHandle, visible: bool) -> HostResult<()> {
        self.running_instance(instance)?.visible = visible;
        Ok(())
    }

    fn create_document(&mut self, instance: InstanceHandle) -> HostResult<DocumentHandle> {
        self.running_instance(instance)?;

        let id = self.allocate_id();
        self.documents.insert(
            id,
            DocumentState {
                instance: instance.0,
                slides: Vec::new(),
                dirty: false,
                saved_to: None,
                referenced: true,
            },
        );
        log::debug!("Created document #{} in {}", id, instance);
        Ok(DocumentHandle(id))
    }

    fn append_slide(
        &mut self,
        document: DocumentHandle,
        title: &str,
        bullet_lines: &[String],
    ) -> HostResult<()> {
        let doc = self.referenced_document(document)?;
        doc.slides.push(DeckSlide::new(title, bullet_lines.to_vec()));
        doc.dirty = true;
        Ok(())
    }

    fn is_dirty(&mut self, document: DocumentHandle) -> HostResult<bool> {
        Ok(self.referenced_document(document)?.dirty)
    }

    fn save_as(&mut self, document: DocumentHandle, path: &Path) -> HostResult<()> {
        let doc = self.referenced_document(document)?;

        let save_error = |message: String| HostError::Save {
            path: path.to_path_buf(),
            message,
        };

        // Staged beside the destination: the rename must not cross filesystems.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = NamedTempFile::new_in(dir).map_err(|e| save_error(e.to_string()))?;
        let staging = write_package(staging, &doc.slides).map_err(|e| save_error(e.to_string()))?;
        staging
            .persist(path)
            .map_err(|e| save_error(e.error.to_string()))?;

        doc.dirty = false;
        doc.saved_to = Some(path.to_path_buf());
        log::info!("Wrote {} slides to {}", doc.slides.len(), path.display());
        Ok(())
    }

    fn quit(&mut self, instance: InstanceHandle) -> HostResult<()> {
        self.running_instance(instance)?.running = false;

        let closing: Vec<u64> = self
            .documents
            .iter()
            .filter(|(_, doc)| doc.instance == instance.0)
            .map(|(&id, _)| id)
            .collect();
        for id in closing {
            if let Some(doc) = self.documents.remove(&id) {
                if doc.dirty {
                    log::warn!(
                        "Discarding unsaved document #{} ({} slides) on quit",
                        id,
                        doc.slides.len()
                    );
                }
            }
        }

        self.forget_instance_if_unused(instance.0);
        Ok(())
    }

    fn release_instance(&mut self, instance: InstanceHandle) -> HostResult<()> {
        let state = self
            .instances
            .get_mut(&instance.0)
            .filter(|state| state.references > 0)
            .ok_or(HostError::UnknownInstance(instance.0))?;
        state.references -= 1;

        self.forget_instance_if_unused(instance.0);
        Ok(())
    }

    fn release_document(&mut self, document: DocumentHandle) -> HostResult<()> {
        self.referenced_document(document)?.referenced = false;
        Ok(())
    }
}
