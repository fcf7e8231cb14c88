//! Session lifecycle for importing slides into a document host.
//!
//! One import runs through these phases:
//!
//! ```text
//! Idle -> Attaching -> Populating -> Negotiating -> Cleanup -> Idle
//!                          |                           ^
//!                          +--------> Failing ---------+
//! ```
//!
//! The manager remembers whether it attached to a host someone else started
//! or started one itself; only a host it started may be told to quit.
//! When the user cancels a save decision, cleanup is abandoned and the
//! host and document stay open for the user to keep working in.

use crate::error::{Error, HostError, Result};
use crate::host::{DocumentHandle, DocumentHost, InstanceHandle};
use crate::input::read_all_text;
use crate::parser::SlideParser;
use crate::prompt::{PromptAnswer, PromptService};
use crate::selection::SlideSelection;
use crate::types::{SlideContent, SlideRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SAVE_PROMPT: &str = "Do you want to save the presentation?";
const UNSAVED_PROMPT: &str = "The presentation has unsaved changes. Save before closing?";

/// Who started the host instance used by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostOwnership {
    /// An instance was already running and was attached to.
    AttachedExisting,
    /// This session started the instance.
    CreatedNew,
}

/// What the user decided about saving the imported document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveDecision {
    Unset,
    SaveRequested(PathBuf),
    DeclinedExplicitly,
    /// Keep the document open; cleanup is skipped.
    Canceled,
}

/// Where the manager is in the current import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Attaching,
    Populating,
    Failing,
    Negotiating,
    Cleanup,
}

/// Ownership and outcome of a single import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub ownership: HostOwnership,
    pub instance: Option<InstanceHandle>,
    pub document: Option<DocumentHandle>,
    pub save_decision: SaveDecision,
    pub save_error: Option<HostError>,
}

impl SessionState {
    fn new(instance: InstanceHandle, ownership: HostOwnership) -> Self {
        Self {
            ownership,
            instance: Some(instance),
            document: None,
            save_decision: SaveDecision::Unset,
            save_error: None,
        }
    }

    pub fn host_attached_existing(&self) -> bool {
        self.ownership == HostOwnership::AttachedExisting
    }

    /// Handles left open when the save decision was canceled.
    fn retained(&self) -> Option<RetainedSession> {
        match self.save_decision {
            SaveDecision::Canceled => self.instance.map(|instance| RetainedSession {
                instance,
                document: self.document,
            }),
            _ => None,
        }
    }
}

/// Handles intentionally left open because the user canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainedSession {
    pub instance: InstanceHandle,
    pub document: Option<DocumentHandle>,
}

/// Result of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of slides appended to the document.
    pub slides_emitted: usize,
    pub ownership: HostOwnership,
    pub save_decision: SaveDecision,
    /// Set when the user asked to save but writing the file failed. The
    /// import itself still counts as successful.
    pub save_error: Option<HostError>,
    /// Present only when the save decision was canceled.
    pub retained: Option<RetainedSession>,
}

impl ImportReport {
    fn from_session(session: SessionState, slides_emitted: usize) -> Self {
        let retained = session.retained();

        Self {
            slides_emitted,
            ownership: session.ownership,
            save_decision: session.save_decision,
            save_error: session.save_error,
            retained,
        }
    }
}

/// Tunables for an import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Extension suggested when asking for a save path.
    pub default_extension: String,
    /// Shown once all slides have been added.
    pub success_message: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_extension: "pptx".to_string(),
            success_message: "Slides created successfully!".to_string(),
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = extension.into();
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }
}

/// Drives slide emission and save negotiation against a document host.
///
/// Not reentrant: at most one import is active at a time.
pub struct SessionManager<H, P> {
    host: H,
    prompt: P,
    options: ImportOptions,
    parser: SlideParser,
    phase: Phase,
    retained_after_failure: Option<RetainedSession>,
}

impl<H: DocumentHost, P: PromptService> SessionManager<H, P> {
    pub fn new(host: H, prompt: P) -> Self {
        Self {
            host,
            prompt,
            options: ImportOptions::default(),
            parser: SlideParser::new(),
            phase: Phase::Idle,
            retained_after_failure: None,
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handles kept open by the last import that failed after the user
    /// canceled the unsaved-changes question. Cleared when the next import
    /// starts.
    pub fn retained_after_failure(&self) -> Option<RetainedSession> {
        self.retained_after_failure
    }

    pub fn into_parts(self) -> (H, P) {
        (self.host, self.prompt)
    }

    /// Read a slide document from disk and import it.
    ///
    /// Read failures abort before any host is contacted.
    pub fn import_file(
        &mut self,
        path: impl AsRef<Path>,
        selection: &SlideSelection,
    ) -> Result<ImportReport> {
        let text = read_all_text(path)?;
        self.import_text(&text, selection)
    }

    /// Parse a slide document and import it.
    pub fn import_text(&mut self, text: &str, selection: &SlideSelection) -> Result<ImportReport> {
        let records = self.parser.parse(text);
        self.begin_import(&records, selection)
    }

    /// Emit the selected, valid records into a host document, then negotiate
    /// saving and release what this session owns.
    ///
    /// Records that are unselected or invalid are skipped without error.
    ///
    /// When adding slides fails, cleanup still runs and may ask about
    /// unsaved changes. If the user cancels there, the error is returned and
    /// the open handles are available from [`Self::retained_after_failure`].
    pub fn begin_import(
        &mut self,
        records: &[SlideRecord],
        selection: &SlideSelection,
    ) -> Result<ImportReport> {
        if self.phase != Phase::Idle {
            return Err(Error::SessionBusy);
        }

        self.retained_after_failure = None;
        let result = self.run_session(records, selection);
        self.enter(Phase::Idle);
        result
    }

    fn run_session(
        &mut self,
        records: &[SlideRecord],
        selection: &SlideSelection,
    ) -> Result<ImportReport> {
        self.enter(Phase::Attaching);
        let mut session = self.acquire_host().map_err(Error::ImportFailed)?;

        self.enter(Phase::Populating);
        let emitted = match self.populate(&mut session, records, selection) {
            Ok(emitted) => emitted,
            Err(err) => {
                log::warn!("Adding slides failed: {}", err);
                self.enter(Phase::Failing);
                self.release(&mut session);
                if let Some(retained) = session.retained() {
                    log::warn!(
                        "Import failed; {} and {:?} stay open",
                        retained.instance,
                        retained.document
                    );
                    self.retained_after_failure = Some(retained);
                }
                return Err(Error::ImportFailed(err));
            }
        };

        self.prompt.show_info(&self.options.success_message);

        self.enter(Phase::Negotiating);
        match self.prompt.ask_yes_no_cancel(SAVE_PROMPT) {
            PromptAnswer::Yes => self.save_to_chosen_path(&mut session),
            PromptAnswer::No => session.save_decision = SaveDecision::DeclinedExplicitly,
            PromptAnswer::Cancel => session.save_decision = SaveDecision::Canceled,
        }

        self.enter(Phase::Cleanup);
        self.release(&mut session);

        Ok(ImportReport::from_session(session, emitted))
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("Session phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn acquire_host(&mut self) -> std::result::Result<SessionState, HostError> {
        if let Some(instance) = self.host.try_attach_running_instance()? {
            log::info!("Attached to running host {}", instance);
            return Ok(SessionState::new(instance, HostOwnership::AttachedExisting));
        }

        let instance = self.host.create_instance()?;
        log::info!("Started new host {}", instance);
        Ok(SessionState::new(instance, HostOwnership::CreatedNew))
    }

    fn populate(
        &mut self,
        session: &mut SessionState,
        records: &[SlideRecord],
        selection: &SlideSelection,
    ) -> std::result::Result<usize, HostError> {
        let instance = session
            .instance
            .ok_or_else(|| HostError::Communication("no host instance".to_string()))?;

        self.host.set_visible(instance, true)?;
        let document = self.host.create_document(instance)?;
        session.document = Some(document);

        let mut emitted = 0;
        for record in records {
            if !selection.is_selected(record.ordinal) {
                log::debug!("Skipping unselected block {}", record.ordinal);
                continue;
            }

            let SlideContent::Valid {
                title,
                bullet_points,
            } = &record.content
            else {
                log::debug!("Skipping invalid block {}", record.ordinal);
                continue;
            };

            self.host.append_slide(document, title, bullet_points)?;
            emitted += 1;
        }

        log::info!("Added {} slides to {}", emitted, document);
        Ok(emitted)
    }

    /// Ask for a destination and save there. Aborting the path choice
    /// cancels; a failed write is recorded but not retried.
    fn save_to_chosen_path(&mut self, session: &mut SessionState) {
        let Some(document) = session.document else {
            return;
        };

        let Some(path) = self
            .prompt
            .choose_path_to_save(&self.options.default_extension)
        else {
            log::info!("Save path selection aborted");
            session.save_decision = SaveDecision::Canceled;
            return;
        };

        match self.host.save_as(document, &path) {
            Ok(()) => {
                log::info!("Saved {} to {}", document, path.display());
                self.prompt
                    .show_info(&format!("Presentation saved to {}", path.display()));
                session.save_error = None;
                session.save_decision = SaveDecision::SaveRequested(path);
            }
            Err(err) => {
                log::warn!("Saving {} failed: {}", document, err);
                self.prompt
                    .show_error(&format!("Presentation created, but save failed: {}", err));
                session.save_error = Some(err);
            }
        }
    }

    /// Release everything the session owns unless the user canceled.
    ///
    /// Never fails: host errors during cleanup are logged and dropped.
    fn release(&mut self, session: &mut SessionState) {
        if session.save_decision == SaveDecision::Canceled {
            log::warn!("Save canceled; leaving host and document open");
            return;
        }

        if let Some(document) = session.document {
            if session.save_decision != SaveDecision::DeclinedExplicitly
                && self.document_is_dirty(document)
            {
                match self.prompt.ask_yes_no_cancel(UNSAVED_PROMPT) {
                    PromptAnswer::Yes => self.save_to_chosen_path(session),
                    PromptAnswer::No => session.save_decision = SaveDecision::DeclinedExplicitly,
                    PromptAnswer::Cancel => session.save_decision = SaveDecision::Canceled,
                }

                if session.save_decision == SaveDecision::Canceled {
                    log::warn!("Save canceled; leaving host and document open");
                    return;
                }
            }

            session.document = None;
            if let Err(err) = self.host.release_document(document) {
                log::warn!("Ignoring failure to release {}: {}", document, err);
            }
        }

        if let Some(instance) = session.instance.take() {
            if session.ownership == HostOwnership::CreatedNew {
                if let Err(err) = self.host.quit(instance) {
                    log::warn!("Ignoring failure to quit {}: {}", instance, err);
                }
            }
            if let Err(err) = self.host.release_instance(instance) {
                log::warn!("Ignoring failure to release {}: {}", instance, err);
            }
        }
    }

    fn document_is_dirty(&mut self, document: DocumentHandle) -> bool {
        self.host.is_dirty(document).unwrap_or_else(|err| {
            log::warn!("Could not query {} for unsaved changes: {}", document, err);
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostResult;
    use crate::parser::parse_slides;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        TryAttach,
        CreateInstance,
        SetVisible(bool),
        CreateDocument,
        AppendSlide(String, Vec<String>),
        IsDirty,
        SaveAs(PathBuf),
        Quit,
        ReleaseInstance,
        ReleaseDocument,
    }

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<Call>,
        running: bool,
        fail_attach: bool,
        fail_create: bool,
        fail_visible: bool,
        fail_create_document: bool,
        fail_append_at: Option<usize>,
        fail_save: bool,
        fail_cleanup: bool,
        appended: usize,
        dirty: bool,
    }

    impl RecordingHost {
        fn running() -> Self {
            Self {
                running: true,
                ..Default::default()
            }
        }

        fn appended_titles(&self) -> Vec<&str> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::AppendSlide(title, _) => Some(title.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }

        fn has_release_calls(&self) -> bool {
            self.calls
                .iter()
                .any(|c| matches!(c, Call::Quit | Call::ReleaseInstance | Call::ReleaseDocument))
        }
    }

    impl DocumentHost for RecordingHost {
        fn try_attach_running_instance(&mut self) -> HostResult<Option<InstanceHandle>> {
            self.calls.push(Call::TryAttach);
            if self.fail_attach {
                return Err(HostError::Communication("attach".to_string()));
            }
            Ok(self.running.then_some(InstanceHandle(1)))
        }

        fn create_instance(&mut self) -> HostResult<InstanceHandle> {
            self.calls.push(Call::CreateInstance);
            if self.fail_create {
                return Err(HostError::Unavailable("not installed".to_string()));
            }
            Ok(InstanceHandle(2))
        }

        fn set_visible(&mut self, _instance: InstanceHandle, visible: bool) -> HostResult<()> {
            self.calls.push(Call::SetVisible(visible));
            if self.fail_visible {
                return Err(HostError::Communication("window".to_string()));
            }
            Ok(())
        }

        fn create_document(&mut self, _instance: InstanceHandle) -> HostResult<DocumentHandle> {
            self.calls.push(Call::CreateDocument);
            if self.fail_create_document {
                return Err(HostError::Communication("no document".to_string()));
            }
            Ok(DocumentHandle(10))
        }

        fn append_slide(
            &mut self,
            _document: DocumentHandle,
            title: &str,
            bullet_lines: &[String],
        ) -> HostResult<()> {
            self.calls
                .push(Call::AppendSlide(title.to_string(), bullet_lines.to_vec()));
            if self.fail_append_at == Some(self.appended) {
                return Err(HostError::Communication("append".to_string()));
            }
            self.appended += 1;
            self.dirty = true;
            Ok(())
        }

        fn is_dirty(&mut self, _document: DocumentHandle) -> HostResult<bool> {
            self.calls.push(Call::IsDirty);
            Ok(self.dirty)
        }

        fn save_as(&mut self, _document: DocumentHandle, path: &Path) -> HostResult<()> {
            self.calls.push(Call::SaveAs(path.to_path_buf()));
            if self.fail_save {
                return Err(HostError::Save {
                    path: path.to_path_buf(),
                    message: "disk full".to_string(),
                });
            }
            self.dirty = false;
            Ok(())
        }

        fn quit(&mut self, _instance: InstanceHandle) -> HostResult<()> {
            self.calls.push(Call::Quit);
            if self.fail_cleanup {
                return Err(HostError::Communication("gone".to_string()));
            }
            Ok(())
        }

        fn release_instance(&mut self, _instance: InstanceHandle) -> HostResult<()> {
            self.calls.push(Call::ReleaseInstance);
            if self.fail_cleanup {
                return Err(HostError::UnknownInstance(1));
            }
            Ok(())
        }

        fn release_document(&mut self, _document: DocumentHandle) -> HostResult<()> {
            self.calls.push(Call::ReleaseDocument);
            if self.fail_cleanup {
                return Err(HostError::UnknownDocument(10));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct ScriptedPrompt {
        answers: VecDeque<PromptAnswer>,
        paths: VecDeque<Option<PathBuf>>,
        questions: Vec<String>,
        extensions: Vec<String>,
        infos: Vec<String>,
        errors: Vec<String>,
    }

    impl ScriptedPrompt {
        fn answering(answers: &[PromptAnswer]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn with_path(mut self, path: Option<&str>) -> Self {
            self.paths.push_back(path.map(PathBuf::from));
            self
        }
    }

    impl PromptService for ScriptedPrompt {
        fn ask_yes_no_cancel(&mut self, message: &str) -> PromptAnswer {
            self.questions.push(message.to_string());
            self.answers.pop_front().expect("unexpected question")
        }

        fn choose_path_to_save(&mut self, default_extension: &str) -> Option<PathBuf> {
            self.extensions.push(default_extension.to_string());
            self.paths.pop_front().expect("unexpected path request")
        }

        fn show_info(&mut self, message: &str) {
            self.infos.push(message.to_string());
        }

        fn show_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    const TWO_SLIDES: &str = "Slide 1: Intro\n- Welcome\n- Agenda\n\nSlide 2: Body\n- Point A";

    #[test]
    fn test_attached_host_with_excluded_slide_and_decline() {
        let mut host = RecordingHost::running();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);
        let records = parse_slides(TWO_SLIDES);

        let report = SessionManager::new(&mut host, &mut prompt)
            .begin_import(&records, &SlideSelection::all().exclude(2))
            .unwrap();

        assert_eq!(report.slides_emitted, 1);
        assert_eq!(report.ownership, HostOwnership::AttachedExisting);
        assert_eq!(report.save_decision, SaveDecision::DeclinedExplicitly);
        assert_eq!(host.appended_titles(), vec!["Intro"]);
        assert_eq!(host.count(&Call::Quit), 0);
        assert_eq!(host.count(&Call::ReleaseDocument), 1);
        assert_eq!(host.count(&Call::ReleaseInstance), 1);
        assert_eq!(host.count(&Call::CreateInstance), 0);
    }

    #[test]
    fn test_bullets_passed_as_lines() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);

        SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert!(host.calls.contains(&Call::AppendSlide(
            "Intro".to_string(),
            vec!["Welcome".to_string(), "Agenda".to_string()]
        )));
        assert_eq!(host.appended_titles(), vec!["Intro", "Body"]);
    }

    #[test]
    fn test_created_host_quits_then_releases() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(report.ownership, HostOwnership::CreatedNew);
        assert_eq!(
            host.calls,
            vec![
                Call::TryAttach,
                Call::CreateInstance,
                Call::SetVisible(true),
                Call::CreateDocument,
                Call::AppendSlide(
                    "Intro".to_string(),
                    vec!["Welcome".to_string(), "Agenda".to_string()]
                ),
                Call::AppendSlide("Body".to_string(), vec!["Point A".to_string()]),
                Call::ReleaseDocument,
                Call::Quit,
                Call::ReleaseInstance,
            ]
        );
    }

    #[test]
    fn test_save_requested() {
        let mut host = RecordingHost::default();
        let mut prompt =
            ScriptedPrompt::answering(&[PromptAnswer::Yes]).with_path(Some("/tmp/out.pptx"));

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(
            report.save_decision,
            SaveDecision::SaveRequested(PathBuf::from("/tmp/out.pptx"))
        );
        assert_eq!(report.save_error, None);
        assert_eq!(report.retained, None);
        assert_eq!(host.count(&Call::SaveAs(PathBuf::from("/tmp/out.pptx"))), 1);
        assert_eq!(host.count(&Call::Quit), 1);
        // Saved document is clean, so no second question.
        assert_eq!(prompt.questions, vec![SAVE_PROMPT.to_string()]);
        assert_eq!(prompt.extensions, vec!["pptx".to_string()]);
        assert_eq!(
            prompt.infos,
            vec![
                "Slides created successfully!".to_string(),
                "Presentation saved to /tmp/out.pptx".to_string()
            ]
        );
    }

    #[test]
    fn test_cancel_leaves_everything_open() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::Cancel]);

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(report.save_decision, SaveDecision::Canceled);
        assert_eq!(
            report.retained,
            Some(RetainedSession {
                instance: InstanceHandle(2),
                document: Some(DocumentHandle(10)),
            })
        );
        assert!(!host.has_release_calls());
    }

    #[test]
    fn test_aborted_path_choice_cancels() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::Yes]).with_path(None);

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(report.save_decision, SaveDecision::Canceled);
        assert!(report.retained.is_some());
        assert!(!host.has_release_calls());
        assert!(!host.calls.iter().any(|c| matches!(c, Call::SaveAs(_))));
    }

    #[test]
    fn test_attached_host_never_quits() {
        let scripts: Vec<(Vec<PromptAnswer>, Vec<Option<&str>>)> = vec![
            (vec![PromptAnswer::No], vec![]),
            (vec![PromptAnswer::Yes], vec![Some("a.pptx")]),
            (vec![PromptAnswer::Yes], vec![None]),
            (vec![PromptAnswer::Cancel], vec![]),
        ];

        for (answers, paths) in scripts {
            let mut host = RecordingHost::running();
            let mut prompt = paths
                .into_iter()
                .fold(ScriptedPrompt::answering(&answers), |p, path| p.with_path(path));

            SessionManager::new(&mut host, &mut prompt)
                .import_text(TWO_SLIDES, &SlideSelection::all())
                .unwrap();

            assert_eq!(host.count(&Call::Quit), 0, "answers {:?}", answers);
        }
    }

    #[test]
    fn test_selected_invalid_records_are_skipped() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);
        let text = "Slide 1: Good\n- yes\n\nSlide 2: Empty\nnothing\n\ngarbage";

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(text, &SlideSelection::only([1, 2, 3]))
            .unwrap();

        assert_eq!(report.slides_emitted, 1);
        assert_eq!(host.appended_titles(), vec!["Good"]);
        assert!(prompt.errors.is_empty());
    }

    #[test]
    fn test_nothing_selected_creates_clean_document() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::none())
            .unwrap();

        assert_eq!(report.slides_emitted, 0);
        assert_eq!(host.count(&Call::CreateDocument), 1);
        assert_eq!(host.count(&Call::ReleaseDocument), 1);
    }

    #[test]
    fn test_append_failure_cleans_up_and_fails() {
        let mut host = RecordingHost {
            fail_append_at: Some(1),
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);

        let result = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(
            result,
            Err(Error::ImportFailed(HostError::Communication(_)))
        ));
        // First slide made the document dirty, so the user is asked once.
        assert_eq!(prompt.questions, vec![UNSAVED_PROMPT.to_string()]);
        assert!(prompt.infos.is_empty());
        assert_eq!(host.count(&Call::ReleaseDocument), 1);
        assert_eq!(host.count(&Call::Quit), 1);
        assert_eq!(host.count(&Call::ReleaseInstance), 1);
    }

    #[test]
    fn test_failure_cleanup_can_still_be_canceled() {
        let mut host = RecordingHost {
            fail_append_at: Some(1),
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::Cancel]);

        let result = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(result, Err(Error::ImportFailed(_))));
        assert!(!host.has_release_calls());
    }

    #[test]
    fn test_failure_cancel_reports_retained_handles() {
        let mut host = RecordingHost {
            fail_append_at: Some(1),
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::Cancel, PromptAnswer::No]);
        let mut manager = SessionManager::new(&mut host, &mut prompt);

        let result = manager.import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(result, Err(Error::ImportFailed(_))));
        assert_eq!(
            manager.retained_after_failure(),
            Some(RetainedSession {
                instance: InstanceHandle(2),
                document: Some(DocumentHandle(10)),
            })
        );

        manager
            .import_text(TWO_SLIDES, &SlideSelection::none())
            .unwrap();
        assert_eq!(manager.retained_after_failure(), None);
    }

    #[test]
    fn test_failure_without_cancel_retains_nothing() {
        let mut host = RecordingHost {
            fail_append_at: Some(0),
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::default();
        let mut manager = SessionManager::new(&mut host, &mut prompt);

        assert!(manager
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .is_err());
        assert_eq!(manager.retained_after_failure(), None);
    }

    #[test]
    fn test_set_visible_failure_releases_instance() {
        let mut host = RecordingHost {
            fail_visible: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::default();

        let result = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(
            result,
            Err(Error::ImportFailed(HostError::Communication(_)))
        ));
        assert_eq!(
            host.calls,
            vec![
                Call::TryAttach,
                Call::CreateInstance,
                Call::SetVisible(true),
                Call::Quit,
                Call::ReleaseInstance,
            ]
        );
        assert!(prompt.questions.is_empty());
    }

    #[test]
    fn test_create_document_failure_releases_instance() {
        let mut host = RecordingHost {
            fail_create_document: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::default();

        let result = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(result, Err(Error::ImportFailed(_))));
        assert_eq!(host.count(&Call::ReleaseDocument), 0);
        assert_eq!(host.count(&Call::Quit), 1);
        assert_eq!(host.count(&Call::ReleaseInstance), 1);
        assert!(host.appended_titles().is_empty());
    }

    #[test]
    fn test_failure_on_attached_host_releases_without_quit() {
        let mut host = RecordingHost {
            running: true,
            fail_append_at: Some(1),
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);

        let result = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(result, Err(Error::ImportFailed(_))));
        assert_eq!(host.count(&Call::ReleaseDocument), 1);
        assert_eq!(host.count(&Call::ReleaseInstance), 1);
        assert_eq!(host.count(&Call::Quit), 0);
        assert_eq!(host.count(&Call::CreateInstance), 0);
    }

    #[test]
    fn test_create_failure_is_import_error() {
        let mut host = RecordingHost {
            fail_create: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::default();
        let mut manager = SessionManager::new(&mut host, &mut prompt);

        let result = manager.import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(
            result,
            Err(Error::ImportFailed(HostError::Unavailable(_)))
        ));
        assert_eq!(manager.phase(), Phase::Idle);
        drop(manager);
        assert_eq!(host.calls, vec![Call::TryAttach, Call::CreateInstance]);
    }

    #[test]
    fn test_attach_failure_is_import_error() {
        let mut host = RecordingHost {
            fail_attach: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::default();

        let result = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(result, Err(Error::ImportFailed(_))));
        assert_eq!(host.calls, vec![Call::TryAttach]);
    }

    #[test]
    fn test_save_failure_is_reported_not_fatal() {
        let mut host = RecordingHost {
            fail_save: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::Yes, PromptAnswer::No])
            .with_path(Some("/readonly/out.pptx"));

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert!(matches!(report.save_error, Some(HostError::Save { .. })));
        assert_eq!(report.save_decision, SaveDecision::DeclinedExplicitly);
        assert_eq!(prompt.errors.len(), 1);
        assert!(prompt.errors[0].starts_with("Presentation created, but save failed"));
        // Exactly one save attempt: no automatic retry.
        assert_eq!(
            host.calls
                .iter()
                .filter(|c| matches!(c, Call::SaveAs(_)))
                .count(),
            1
        );
        assert_eq!(host.count(&Call::ReleaseDocument), 1);
    }

    #[test]
    fn test_unsaved_prompt_cancel_keeps_document() {
        let mut host = RecordingHost {
            fail_save: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::Yes, PromptAnswer::Cancel])
            .with_path(Some("out.pptx"));

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(report.save_decision, SaveDecision::Canceled);
        assert!(report.retained.is_some());
        assert!(!host.has_release_calls());
    }

    #[test]
    fn test_declined_document_is_not_asked_again() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);

        SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(prompt.questions.len(), 1);
        assert_eq!(host.count(&Call::IsDirty), 0);
    }

    #[test]
    fn test_cleanup_errors_are_swallowed() {
        let mut host = RecordingHost {
            fail_cleanup: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(report.slides_emitted, 2);
        assert_eq!(host.count(&Call::ReleaseDocument), 1);
        assert_eq!(host.count(&Call::Quit), 1);
        assert_eq!(host.count(&Call::ReleaseInstance), 1);
    }

    #[test]
    fn test_missing_file_never_touches_host() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::default();

        let result = SessionManager::new(&mut host, &mut prompt)
            .import_file(dir.path().join("nope.txt"), &SlideSelection::all());

        assert!(matches!(result, Err(Error::FileNotFound(_))));
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_import_file_reads_and_imports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.txt");
        std::fs::write(&path, TWO_SLIDES).unwrap();
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No]);

        let report = SessionManager::new(&mut host, &mut prompt)
            .import_file(&path, &SlideSelection::all())
            .unwrap();

        assert_eq!(report.slides_emitted, 2);
    }

    #[test]
    fn test_manager_is_reusable_after_done() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::answering(&[PromptAnswer::No, PromptAnswer::No]);
        let mut manager = SessionManager::new(&mut host, &mut prompt);

        manager
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();
        assert_eq!(manager.phase(), Phase::Idle);
        let report = manager
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(report.slides_emitted, 2);
    }

    #[test]
    fn test_busy_manager_rejects_second_import() {
        let mut host = RecordingHost::default();
        let mut prompt = ScriptedPrompt::default();
        let mut manager = SessionManager::new(&mut host, &mut prompt);
        manager.phase = Phase::Populating;

        let result = manager.import_text(TWO_SLIDES, &SlideSelection::all());

        assert!(matches!(result, Err(Error::SessionBusy)));
        assert_eq!(manager.phase(), Phase::Populating);
        drop(manager);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_custom_options() {
        let mut host = RecordingHost::default();
        let mut prompt =
            ScriptedPrompt::answering(&[PromptAnswer::Yes]).with_path(Some("/tmp/out.odp"));

        SessionManager::new(&mut host, &mut prompt)
            .with_options(
                ImportOptions::new()
                    .with_success_message("Done.")
                    .with_default_extension("odp"),
            )
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        assert_eq!(prompt.infos[0], "Done.");
        assert_eq!(prompt.extensions, vec!["odp".to_string()]);
    }

    #[test]
    fn test_into_parts_returns_host_and_prompt() {
        let mut manager = SessionManager::new(
            RecordingHost::default(),
            ScriptedPrompt::answering(&[PromptAnswer::No]),
        );
        manager
            .import_text(TWO_SLIDES, &SlideSelection::all())
            .unwrap();

        let (host, prompt) = manager.into_parts();

        assert_eq!(host.appended_titles(), vec!["Intro", "Body"]);
        assert_eq!(prompt.questions, vec![SAVE_PROMPT.to_string()]);
    }

    #[test]
    fn test_session_state_ownership_flag() {
        let state = SessionState::new(InstanceHandle(1), HostOwnership::AttachedExisting);
        assert!(state.host_attached_existing());
        assert_eq!(state.save_decision, SaveDecision::Unset);
    }
}
