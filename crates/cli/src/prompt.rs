//! Prompt services for the command line.

use slides_core::{PromptAnswer, PromptService};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Asks questions on a terminal.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one trimmed line. `None` on end of input.
    fn ask(&mut self, question: &str) -> Option<String> {
        // A broken terminal just means no answer.
        let _ = write!(self.output, "{}", question);
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead, W: Write> PromptService for TerminalPrompt<R, W> {
    fn ask_yes_no_cancel(&mut self, message: &str) -> PromptAnswer {
        loop {
            let Some(answer) = self.ask(&format!("{} [y]es/[n]o/[c]ancel: ", message)) else {
                return PromptAnswer::Cancel;
            };

            match answer.to_lowercase().as_str() {
                "y" | "yes" => return PromptAnswer::Yes,
                "n" | "no" => return PromptAnswer::No,
                "c" | "cancel" => return PromptAnswer::Cancel,
                _ => {
                    let _ = writeln!(self.output, "Please answer y, n or c.");
                }
            }
        }
    }

    fn choose_path_to_save(&mut self, default_extension: &str) -> Option<PathBuf> {
        let answer = self.ask(&format!(
            "Save as (.{} added if missing, empty to abort): ",
            default_extension
        ))?;

        if answer.is_empty() {
            return None;
        }
        Some(with_extension(PathBuf::from(answer), default_extension))
    }

    fn show_info(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", message);
    }

    fn show_error(&mut self, message: &str) {
        let _ = writeln!(self.output, "Error: {}", message);
    }
}

/// Answers the save question from command-line flags.
///
/// In save mode the first question of each file is answered "yes" and
/// later ones "no", so a failed save is not retried.
#[derive(Debug, Clone)]
pub struct BatchPrompt {
    output_dir: Option<PathBuf>,
    current: Option<PathBuf>,
    asked: bool,
}

impl BatchPrompt {
    /// Save every presentation into `output_dir`.
    pub fn save_to(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(output_dir.into()),
            current: None,
            asked: false,
        }
    }

    /// Decline saving for every presentation.
    pub fn discard() -> Self {
        Self {
            output_dir: None,
            current: None,
            asked: false,
        }
    }

    /// Point the prompt at the next source file.
    pub fn begin_file(&mut self, input_path: &Path, default_extension: &str) {
        self.asked = false;
        self.current = self.output_dir.as_ref().map(|dir| {
            let stem = input_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            dir.join(format!("{}.{}", stem, default_extension))
        });
    }
}

impl PromptService for BatchPrompt {
    fn ask_yes_no_cancel(&mut self, message: &str) -> PromptAnswer {
        let answer = if self.current.is_some() && !self.asked {
            PromptAnswer::Yes
        } else {
            PromptAnswer::No
        };
        self.asked = true;
        log::debug!("{} -> {:?}", message, answer);
        answer
    }

    fn choose_path_to_save(&mut self, _default_extension: &str) -> Option<PathBuf> {
        self.current.clone()
    }

    fn show_info(&mut self, message: &str) {
        eprintln!("{}", message);
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("Error: {}", message);
    }
}

/// Append `extension` unless the path already has one.
fn with_extension(path: PathBuf, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(extension)
    }
}
