//! Generate command: run a review session in the terminal.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::{GeneratorProvider, Prompts, Settings};
use crate::document::DocumentState;
use crate::error::{BlogError, Result};
use crate::generator::create_generator;
use crate::pipeline::Pipeline;
use crate::review::{ReviewDecision, ReviewState};
use crate::session::{run_session, Checkpoint, Presenter};
use crate::transcript_source::YoutubeTranscriptSource;
use console::style;
use indicatif::ProgressBar;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

/// Build a pipeline from settings: yt-dlp captions and the configured generator.
pub fn build_pipeline(settings: &Settings) -> Result<Pipeline> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let source = Arc::new(YoutubeTranscriptSource::with_config(
        &settings.transcript.yt_dlp,
        &settings.transcript.languages,
    ));
    let generator = create_generator(&settings.generator)?;

    Ok(Pipeline::new(source, generator, prompts)
        .with_timeout(Duration::from_secs(settings.generator.timeout_seconds)))
}

/// A failure the terminal has already shown to the user.
///
/// `main` exits non-zero without printing it again.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ReportedError(#[from] pub BlogError);

/// Whether `error` was already shown to the user.
pub fn is_reported(error: &anyhow::Error) -> bool {
    error.is::<ReportedError>()
}

/// Run the generate command.
pub async fn run_generate(
    url: &str,
    output: Option<String>,
    max_revisions: Option<u32>,
    provider: Option<String>,
    model: Option<String>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if let Some(provider) = provider {
        settings.generator.provider = provider
            .parse::<GeneratorProvider>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(model) = model {
        settings.generator.model = model;
    }
    let max_revisions = max_revisions.unwrap_or(settings.review.max_revisions);

    // Pre-flight checks
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ytblog doctor' for detailed diagnostics.");
        return Err(ReportedError(e).into());
    }

    let pipeline = build_pipeline(&settings)?;

    Output::info(&format!("Processing: {}", url));
    Output::kv(
        "Model",
        &format!("{} ({})", pipeline.generator().model(), settings.generator.provider),
    );

    let stdin = io::stdin();
    let mut presenter = TerminalPresenter::new(stdin.lock());
    presenter.start_spinner("Fetching transcript and drafting post...");

    let outcome = run_session(&pipeline, &mut presenter, url, max_revisions)
        .await
        .map_err(ReportedError)?;

    match (outcome.approved_draft(), output) {
        (Some(draft), Some(path)) => {
            let path = Settings::expand_path(&path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, draft)?;
            Output::success(&format!("Saved approved post to {}", path.display()));
        }
        (None, Some(_)) => {
            Output::warning("Post was not approved; nothing written.");
        }
        _ => {}
    }

    if outcome.state == ReviewState::Revising {
        Output::warning("Session ended with a revision pending.");
    }

    Ok(())
}

/// Presenter reading decisions from a line-based input (stdin in practice).
struct TerminalPresenter<R: BufRead> {
    input: R,
    spinner: Option<ProgressBar>,
}

impl<R: BufRead> TerminalPresenter<R> {
    fn new(input: R) -> Self {
        Self {
            input,
            spinner: None,
        }
    }

    fn start_spinner(&mut self, msg: &str) {
        self.stop_spinner();
        self.spinner = Some(Output::spinner(msg));
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Prompt and read one trimmed line. EOF is an error.
    fn ask(&mut self, prompt: &str) -> Result<String> {
        print!("{} ", style(prompt).bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(BlogError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a decision was made",
            )));
        }
        Ok(line.trim().to_string())
    }

    fn ask_yes_no(&mut self, prompt: &str) -> Result<bool> {
        loop {
            match parse_yes_no(&self.ask(prompt)?) {
                Some(answer) => return Ok(answer),
                None => Output::warning("Please answer yes or no."),
            }
        }
    }
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl<R: BufRead> Presenter for TerminalPresenter<R> {
    fn display_document(&mut self, document: &DocumentState, checkpoint: Checkpoint) {
        self.stop_spinner();
        let draft = document.draft().unwrap_or_default();

        match checkpoint {
            Checkpoint::Draft => Output::header("Generated Blog Post"),
            Checkpoint::Revision(n) => Output::header(&format!("Revised Blog Post (revision {})", n)),
            Checkpoint::Final => {
                Output::success("Blog post approved!");
                Output::header("Final Blog Post");
            }
            Checkpoint::RevisionLimitReached => {
                Output::warning("Maximum number of revisions reached.");
                Output::header("Latest Blog Post");
            }
        }
        Output::document(draft);
    }

    fn collect_approval(&mut self) -> Result<ReviewDecision> {
        if self.ask_yes_no("Approve this blog post? (yes/no):")? {
            return Ok(ReviewDecision::approve());
        }

        let feedback = self.ask("Feedback for improvement:")?;
        self.start_spinner("Revising blog post...");
        Ok(ReviewDecision::reject(feedback))
    }

    fn confirm_retry(&mut self, _error: &BlogError) -> Result<bool> {
        let retry = self.ask_yes_no("Retry the revision? (yes/no):")?;
        if retry {
            self.start_spinner("Revising blog post...");
        }
        Ok(retry)
    }

    fn report_error(&mut self, error: &BlogError) {
        self.stop_spinner();
        Output::error(&error.to_string());
    }
}
