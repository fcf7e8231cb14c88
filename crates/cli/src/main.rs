//! CLI tool for turning plain-text slide outlines into PowerPoint presentations.

mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prompt::{BatchPrompt, TerminalPrompt};
use slides_core::{
    parse_slides, read_all_text, ImportOptions, ImportReport, PromptService,
    SaveDecision, SessionManager, SlideRecord, SlideSelection, EXAMPLE_TEXT,
};
use slides_pptx::{read_outline, OutlineSlide, PptxHost};
use std::fs::File;
use std::io::{BufReader, Stderr, StdinLock};
use std::path::{Path, PathBuf};

/// Create PowerPoint presentations from plain-text slide outlines.
#[derive(Parser, Debug)]
#[command(name = "slide-import")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a text file and list the slides it contains
    Preview {
        /// Input text file
        input: PathBuf,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a presentation from each text file
    Import {
        /// Input text file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Skip the block with this ordinal (repeatable)
        #[arg(short = 'x', long = "exclude", value_name = "N")]
        exclude: Vec<usize>,

        /// Import only the blocks with these ordinals (repeatable)
        #[arg(long = "only", value_name = "N", conflicts_with = "exclude")]
        only: Vec<usize>,

        /// Save every presentation into this directory without asking
        #[arg(short, long, conflicts_with = "discard")]
        output: Option<PathBuf>,

        /// Do not save, without asking
        #[arg(long)]
        discard: bool,
    },

    /// Print an example of the input format
    Example,

    /// Print the slide outline of a saved .pptx file
    Outline {
        /// Input .pptx file
        input: PathBuf,

        /// Print slides as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match &args.command {
        Command::Preview { input, json } => preview(input, *json, args.verbose),
        Command::Import {
            input,
            exclude,
            only,
            output,
            discard,
        } => {
            let selection = build_selection(exclude, only);
            let prompt = match (output, discard) {
                (Some(dir), _) => {
                    std::fs::create_dir_all(dir).with_context(|| {
                        format!("Failed to create output directory: {}", dir.display())
                    })?;
                    CliPrompt::Batch(BatchPrompt::save_to(dir))
                }
                (None, true) => CliPrompt::Batch(BatchPrompt::discard()),
                (None, false) => CliPrompt::Terminal(TerminalPrompt::new(
                    std::io::stdin().lock(),
                    std::io::stderr(),
                )),
            };
            import(input, &selection, prompt, args.verbose)
        }
        Command::Example => {
            println!("{}", EXAMPLE_TEXT);
            Ok(())
        }
        Command::Outline { input, json } => outline(input, *json),
    }
}

/// Prompt chosen from the command line.
enum CliPrompt {
    Terminal(TerminalPrompt<StdinLock<'static>, Stderr>),
    Batch(BatchPrompt),
}

impl CliPrompt {
    fn begin_file(&mut self, input_path: &Path, default_extension: &str) {
        if let CliPrompt::Batch(batch) = self {
            batch.begin_file(input_path, default_extension);
        }
    }

    fn service(&mut self) -> &mut dyn PromptService {
        match self {
            CliPrompt::Terminal(terminal) => terminal,
            CliPrompt::Batch(batch) => batch,
        }
    }
}

fn build_selection(exclude: &[usize], only: &[usize]) -> SlideSelection {
    if only.is_empty() {
        exclude
            .iter()
            .fold(SlideSelection::all(), |selection, &n| selection.exclude(n))
    } else {
        SlideSelection::only(only.iter().copied())
    }
}

/// Parse a file and print one line per block.
fn preview(input_path: &Path, json: bool, verbose: bool) -> Result<()> {
    let text = read_all_text(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;
    let records = parse_slides(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        println!("{}", describe_record(record));
        if verbose {
            for line in record.raw_text.lines() {
                println!("      | {}", line);
            }
        }
    }

    let valid = records.iter().filter(|r| r.is_valid()).count();
    println!(
        "{} blocks, {} valid, {} invalid",
        records.len(),
        valid,
        records.len() - valid
    );
    Ok(())
}

fn describe_record(record: &SlideRecord) -> String {
    match (record.bullet_points(), record.error_message()) {
        (Some(bullets), _) => format!(
            "{:>4} [x] {} ({} bullet points)",
            record.ordinal,
            record.title(),
            bullets.len()
        ),
        (None, Some(error)) => format!(
            "{:>4} [ ] {} -- {}",
            record.ordinal,
            record.title(),
            error
        ),
        (None, None) => format!("{:>4} [ ] {}", record.ordinal, record.title()),
    }
}

/// Import each file through one shared host.
fn import(
    inputs: &[PathBuf],
    selection: &SlideSelection,
    mut prompt: CliPrompt,
    verbose: bool,
) -> Result<()> {
    let options = ImportOptions::default();
    let mut host = PptxHost::new();
    let mut failures = 0;

    for input_path in inputs {
        if verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        prompt.begin_file(input_path, &options.default_extension);
        let mut manager =
            SessionManager::new(&mut host, prompt.service()).with_options(options.clone());

        match manager.import_file(input_path, selection) {
            Ok(report) => print_report(input_path, &report),
            Err(e) => {
                failures += 1;
                eprintln!("Error importing {}: {}", input_path.display(), e);
                if let Some(retained) = manager.retained_after_failure() {
                    eprintln!(
                        "{}: partial presentation kept open in {}",
                        input_path.display(),
                        retained.instance
                    );
                }
            }
        }
    }

    let unsaved: Vec<_> = host
        .open_documents()
        .into_iter()
        .filter(|doc| doc.dirty)
        .collect();
    if !unsaved.is_empty() {
        log::warn!(
            "{} presentation(s) left open with unsaved changes are discarded on exit",
            unsaved.len()
        );
        eprintln!(
            "Warning: {} presentation(s) were kept open without saving and are lost when slide-import exits",
            unsaved.len()
        );
    }

    if failures > 0 {
        anyhow::bail!("{} of {} imports failed", failures, inputs.len());
    }
    Ok(())
}

fn print_report(input_path: &Path, report: &ImportReport) {
    eprintln!(
        "{}: {} slides, {}",
        input_path.display(),
        report.slides_emitted,
        report_outcome(report)
    );
}

fn report_outcome(report: &ImportReport) -> String {
    // A failed save is followed by the unsaved-changes question, so the
    // final decision alone does not show it.
    let outcome = match &report.save_decision {
        SaveDecision::SaveRequested(path) => format!("saved to {}", path.display()),
        SaveDecision::Canceled => "kept open".to_string(),
        SaveDecision::DeclinedExplicitly | SaveDecision::Unset => "not saved".to_string(),
    };

    match &report.save_error {
        Some(err) => format!("save failed ({}), {}", err, outcome),
        None => outcome,
    }
}

/// Print the outline of a saved deck in the input format.
fn outline(input_path: &Path, json: bool) -> Result<()> {
    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let slides = read_outline(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&slides)?);
    } else {
        print!("{}", format_outline(&slides));
    }
    Ok(())
}

fn format_outline(slides: &[OutlineSlide]) -> String {
    slides
        .iter()
        .map(|slide| {
            let mut block = format!(
                "Slide {}: {}\n",
                slide.number,
                slide.title.as_deref().unwrap_or_default()
            );
            for bullet in &slide.bullets {
                block.push_str(&format!("- {}\n", bullet));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slides_core::PromptAnswer;
    use slides_pptx::{write_package, DeckSlide};

    #[test]
    fn test_args_parse_import() {
        let args = Args::try_parse_from([
            "slide-import",
            "import",
            "a.txt",
            "b.txt",
            "-x",
            "2",
            "--exclude",
            "4",
            "--discard",
        ])
        .unwrap();

        match args.command {
            Command::Import {
                input,
                exclude,
                discard,
                ..
            } => {
                assert_eq!(input.len(), 2);
                assert_eq!(exclude, vec![2, 4]);
                assert!(discard);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_output_conflicts_with_discard() {
        let result = Args::try_parse_from([
            "slide-import",
            "import",
            "a.txt",
            "--output",
            "out",
            "--discard",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_selection() {
        let selection = build_selection(&[2], &[]);
        assert!(selection.is_selected(1));
        assert!(!selection.is_selected(2));

        let selection = build_selection(&[], &[3]);
        assert!(!selection.is_selected(1));
        assert!(selection.is_selected(3));
    }

    #[test]
    fn test_describe_record() {
        let records = parse_slides("Slide 1: Intro\n- a\n- b\n\nnope");

        assert_eq!(describe_record(&records[0]), "   1 [x] Intro (2 bullet points)");
        assert_eq!(
            describe_record(&records[1]),
            "   2 [ ] nope -- Invalid slide title format"
        );
    }

    #[test]
    fn test_outline_text_reparses() {
        let slides = vec![
            DeckSlide::new("Intro", vec!["Welcome".to_string()]),
            DeckSlide::new("Body", vec!["Point A".to_string(), "Point B".to_string()]),
        ];
        let bytes = write_package(std::io::Cursor::new(Vec::new()), &slides)
            .unwrap()
            .into_inner();
        let outline = read_outline(std::io::Cursor::new(bytes)).unwrap();

        let records = parse_slides(&format_outline(&outline));

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_valid()));
        assert_eq!(records[1].bullet_points().unwrap().len(), 2);
    }

    #[test]
    fn test_batch_import_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("talk.txt");
        std::fs::write(&input, "Slide 1: Intro\n- Welcome\n").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();

        import(
            &[input],
            &SlideSelection::all(),
            CliPrompt::Batch(BatchPrompt::save_to(&out)),
            false,
        )
        .unwrap();

        let file = File::open(out.join("talk.pptx")).unwrap();
        let outline = read_outline(BufReader::new(file)).unwrap();
        assert_eq!(outline[0].title.as_deref(), Some("Intro"));
    }

    #[test]
    fn test_batch_import_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = import(
            &[dir.path().join("missing.txt")],
            &SlideSelection::all(),
            CliPrompt::Batch(BatchPrompt::discard()),
            false,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_batch_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("talk.txt");
        std::fs::write(&input, "Slide 1: Intro\n- Welcome\n").unwrap();
        let out = dir.path().join("out");
        // A directory where the deck should go makes the save fail.
        std::fs::create_dir_all(out.join("talk.pptx")).unwrap();

        let mut host = PptxHost::new();
        let mut prompt = BatchPrompt::save_to(&out);
        prompt.begin_file(&input, "pptx");
        let report = SessionManager::new(&mut host, &mut prompt)
            .import_file(&input, &SlideSelection::all())
            .unwrap();

        assert_eq!(report.save_decision, SaveDecision::DeclinedExplicitly);
        let outcome = report_outcome(&report);
        assert!(outcome.starts_with("save failed ("), "{}", outcome);
        assert!(outcome.ends_with(", not saved"), "{}", outcome);
    }

    #[test]
    fn test_report_outcome_for_saved_deck() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("talk.txt");
        std::fs::write(&input, "Slide 1: Intro\n- Welcome\n").unwrap();

        let mut host = PptxHost::new();
        let mut prompt = BatchPrompt::save_to(dir.path());
        prompt.begin_file(&input, "pptx");
        let report = SessionManager::new(&mut host, &mut prompt)
            .import_file(&input, &SlideSelection::all())
            .unwrap();

        assert_eq!(
            report_outcome(&report),
            format!("saved to {}", dir.path().join("talk.pptx").display())
        );
    }

    #[test]
    fn test_discard_prompt_declines() {
        let mut prompt = CliPrompt::Batch(BatchPrompt::discard());
        assert_eq!(
            prompt.service().ask_yes_no_cancel("Save?"),
            PromptAnswer::No
        );
    }
}
