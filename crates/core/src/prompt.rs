//! Contract for asking the user to make decisions.

use std::path::PathBuf;

/// Answer to a modal yes/no/cancel question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Yes,
    No,
    Cancel,
}

/// Modal dialogs used by the session manager. Each call blocks until the
/// user answers.
pub trait PromptService {
    fn ask_yes_no_cancel(&mut self, message: &str) -> PromptAnswer;

    /// Ask for a destination file. `None` means the user aborted.
    fn choose_path_to_save(&mut self, default_extension: &str) -> Option<PathBuf>;

    fn show_info(&mut self, message: &str);

    fn show_error(&mut self, message: &str);
}

impl<P: PromptService + ?Sized> PromptService for &mut P {
    fn ask_yes_no_cancel(&mut self, message: &str) -> PromptAnswer {
        (**self).ask_yes_no_cancel(message)
    }

    fn choose_path_to_save(&mut self, default_extension: &str) -> Option<PathBuf> {
        (**self).choose_path_to_save(default_extension)
    }

    fn show_info(&mut self, message: &str) {
        (**self).show_info(message)
    }

    fn show_error(&mut self, message: &str) {
        (**self).show_error(message)
    }
}
