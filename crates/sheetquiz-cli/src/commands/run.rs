//! The `sheetquiz run` command.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use sheetquiz_core::loader::QuestionBankLoader;
use sheetquiz_core::model::{Question, QuestionLayout, QuizMode, SessionConfig, Theme};
use sheetquiz_core::random::{RandomSource, SeededRandom, ThreadRandom};
use sheetquiz_core::report::SessionReport;
use sheetquiz_core::session::{format_clock, QuizSession, Selection};
use sheetquiz_core::summary::{to_percent, Summary};
use sheetquiz_core::timer::Countdown;
use sheetquiz_report::html::write_html_report;
use sheetquiz_sources::config::{
    global_config_path, locate_config, read_config_file, LOCAL_CONFIG_FILE,
};
use sheetquiz_sources::{load_config_from, save_config_to, DefaultSource, SheetSelection};

use crate::commands::resolve_locations;
use crate::console::{
    confirm_prompt, help_text, parse_input, render_screen, render_summary, Input,
};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Sheet links, CSV URLs, or local paths (default: `default_source` from config)
    #[arg(long, num_args = 1..)]
    pub source: Vec<String>,

    /// Tabs to load when a source is a whole workbook: "all" or gids
    #[arg(long)]
    pub sheets: Option<SheetSelection>,

    /// Quiz mode: learning or timed
    #[arg(long)]
    pub mode: Option<QuizMode>,

    /// Countdown length in minutes (timed mode)
    #[arg(long)]
    pub time_limit: Option<u32>,

    /// Maximum number of questions
    #[arg(long)]
    pub limit: Option<usize>,

    /// Keep the sheet order
    #[arg(long)]
    pub no_shuffle: bool,

    /// Question layout: single or list (learning mode)
    #[arg(long)]
    pub layout: Option<QuestionLayout>,

    /// Colour theme for HTML exports: light or dark
    #[arg(long)]
    pub theme: Option<Theme>,

    /// Output directory for exports
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Export formats: json, html, md, all (default: json when --output is given)
    #[arg(long)]
    pub format: Option<String>,

    /// Seed for shuffling, for reproducible sessions
    #[arg(long)]
    pub seed: Option<u64>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    if let Some(minutes) = args.time_limit {
        anyhow::ensure!(minutes >= 1, "time limit must be at least 1 minute");
    }

    let config = load_config_from(args.config.as_deref())?;

    let inputs: Vec<String> = if args.source.is_empty() {
        config.default_source.clone().into_iter().collect()
    } else {
        args.source.clone()
    };
    anyhow::ensure!(
        !inputs.is_empty(),
        "no question source given; pass --source or set default_source in {LOCAL_CONFIG_FILE}"
    );

    let formats = parse_formats(args.format.as_deref(), args.output.is_some())?;
    let mut session_config = config.session_config();
    if let Some(mode) = args.mode {
        session_config.mode = mode;
    }
    if let Some(layout) = args.layout {
        session_config.layout = layout;
    }
    if let Some(minutes) = args.time_limit {
        session_config.time_limit_minutes = minutes;
    }
    let session_config = session_config.normalized();

    let mut options = config.load_options();
    if args.no_shuffle {
        options.shuffle = false;
    }
    if let Some(limit) = args.limit {
        options.question_limit = Some(limit);
    }

    let source = Arc::new(DefaultSource::default());
    let locations = resolve_locations(source.http(), &inputs, args.sheets.as_ref()).await?;

    let mut rng: Box<dyn RandomSource> = match args.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    };
    let loader = QuestionBankLoader::new(source.clone());
    let questions = loader
        .load(&locations, options, rng.as_mut())
        .await
        .context("failed to load the question bank")?;

    print_preview(&questions, &session_config, locations.len());

    let start_theme = args.theme.unwrap_or(config.theme);
    let exports = Exports {
        source_label: inputs.join(", "),
        output_dir: args.output.unwrap_or_else(|| config.output_dir.clone()),
        formats,
    };

    let session = QuizSession::new(questions, session_config);
    let lines = BufReader::new(tokio::io::stdin()).lines();
    let mut driver = Driver::new(session, exports, start_theme);
    driver.run(lines).await?;

    if driver.reports.len() > 1 {
        let best = driver
            .reports
            .iter()
            .map(|r| r.summary.accuracy)
            .fold(0.0, f64::max);
        println!(
            "{} attempts, best accuracy {}%",
            driver.reports.len(),
            to_percent(best)
        );
    }
    if driver.theme != start_theme {
        persist_theme(args.config.as_deref(), driver.theme)?;
    }
    Ok(())
}

/// Export formats requested on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Formats {
    json: bool,
    html: bool,
    markdown: bool,
}

pub(crate) fn parse_formats(format: Option<&str>, has_output: bool) -> Result<Formats> {
    let Some(format) = format else {
        return Ok(Formats {
            json: has_output,
            ..Formats::default()
        });
    };

    let mut formats = Formats::default();
    for fmt in format.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        match fmt {
            "json" => formats.json = true,
            "html" => formats.html = true,
            "md" | "markdown" => formats.markdown = true,
            "all" => {
                formats.json = true;
                formats.html = true;
                formats.markdown = true;
            }
            other => anyhow::bail!("unknown format: {other} (expected json, html, md, or all)"),
        }
    }
    Ok(formats)
}

fn print_preview(questions: &[Question], config: &SessionConfig, sources: usize) {
    let mut seen = HashSet::new();
    let modules: Vec<&str> = questions
        .iter()
        .map(|q| q.module.as_str())
        .filter(|m| seen.insert(*m))
        .collect();

    println!(
        "Loaded {} questions from {} source(s): {}",
        questions.len(),
        sources,
        modules.join(", ")
    );
    match config.mode {
        QuizMode::Learning => println!("Mode: learning ({} layout)", config.layout),
        QuizMode::Timed => println!(
            "Mode: timed, {} minute(s) on the clock",
            config.time_limit_minutes
        ),
    }
}

/// Write the theme back to the config file that was read, or the user config.
fn persist_theme(explicit: Option<&std::path::Path>, theme: Theme) -> Result<()> {
    let path = locate_config(explicit)?
        .or_else(global_config_path)
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

    let mut stored = if path.exists() {
        read_config_file(&path)?
    } else {
        Default::default()
    };
    stored.theme = theme;
    save_config_to(&stored, &path)?;
    tracing::info!("saved theme {theme} to {}", path.display());
    Ok(())
}

pub(crate) struct Exports {
    pub(crate) source_label: String,
    pub(crate) output_dir: PathBuf,
    pub(crate) formats: Formats,
}

impl Exports {
    pub(crate) fn write(&self, report: &SessionReport, theme: Theme) -> Result<()> {
        if self.formats.json {
            let path = self.output_dir.join(format!("{}.json", report.file_stem()));
            report.save_json(&path)?;
            println!("Results saved to: {}", path.display());
        }
        if self.formats.html {
            let path = self.output_dir.join(format!("{}.html", report.file_stem()));
            write_html_report(report, theme, &path)?;
            println!("HTML report: {}", path.display());
        }
        if self.formats.markdown {
            let path = self.output_dir.join(format!("{}.md", report.file_stem()));
            std::fs::create_dir_all(&self.output_dir)
                .with_context(|| format!("failed to create {}", self.output_dir.display()))?;
            std::fs::write(&path, report.to_markdown())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Markdown report: {}", path.display());
        }
        Ok(())
    }
}

enum Event {
    Line(Option<String>),
    Tick,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Owns one session and feeds it user input and countdown ticks.
struct Driver {
    session: QuizSession,
    countdown: Option<Countdown>,
    confirming: bool,
    theme: Theme,
    exports: Exports,
    reports: Vec<SessionReport>,
}

impl Driver {
    fn new(session: QuizSession, exports: Exports, theme: Theme) -> Self {
        Self {
            session,
            countdown: None,
            confirming: false,
            theme,
            exports,
            reports: Vec::new(),
        }
    }

    async fn run<R: AsyncBufRead + Unpin>(&mut self, mut lines: Lines<R>) -> Result<()> {
        self.begin();
        println!(
            "{}",
            help_text(self.session.mode(), self.session.layout())
        );
        println!("\n{}", render_screen(&self.session));

        loop {
            let event = tokio::select! {
                line = lines.next_line() => Event::Line(line.context("failed to read input")?),
                Some(()) = next_tick(&mut self.countdown) => Event::Tick,
            };

            let flow = match event {
                Event::Tick => self.on_tick()?,
                Event::Line(Some(line)) => self.on_line(&line)?,
                Event::Line(None) => Flow::Quit,
            };
            if flow == Flow::Quit {
                break;
            }
        }

        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
        if self.session.is_running() {
            println!(
                "Session ended before submission ({} of {} answered).",
                self.session.answered_count(),
                self.session.questions().len()
            );
        }
        Ok(())
    }

    fn begin(&mut self) {
        self.session.launch();
        self.confirming = false;
        if self.session.remaining_seconds().is_some() {
            self.countdown = Some(Countdown::every_second());
        }
    }

    fn on_tick(&mut self) -> Result<Flow> {
        if let Some(summary) = self.session.tick() {
            let summary = summary.clone();
            println!("\nTime is up! Your answers were submitted automatically.");
            self.complete(summary)?;
        } else if let Some(remaining) = self.session.remaining_seconds() {
            if remaining == 60 || remaining == 10 {
                println!("{} left", format_clock(remaining));
            }
        }
        Ok(Flow::Continue)
    }

    fn on_line(&mut self, line: &str) -> Result<Flow> {
        let input = parse_input(line);

        if self.confirming {
            self.confirming = false;
            if input == Some(Input::Yes) {
                let summary = self.session.finalize(false).clone();
                self.complete(summary)?;
            } else {
                println!("Submission cancelled.");
            }
            return Ok(Flow::Continue);
        }

        let Some(input) = input else {
            if !line.trim().is_empty() {
                println!("Unknown command. Type h for help.");
            }
            return Ok(Flow::Continue);
        };

        match input {
            Input::Quit => return Ok(Flow::Quit),
            Input::Help => println!(
                "{}",
                help_text(self.session.mode(), self.session.layout())
            ),
            Input::ToggleTheme => {
                self.theme = self.theme.toggled();
                println!("Theme: {}", self.theme);
            }
            Input::Retake if self.session.is_finished() => {
                self.session.retake();
                self.begin();
                println!("\n{}", render_screen(&self.session));
            }
            _ if self.session.is_finished() => {
                println!("Session finished. Type r to retake or q to quit.");
            }
            other => self.on_session_input(other)?,
        }
        Ok(Flow::Continue)
    }

    fn on_session_input(&mut self, input: Input) -> Result<()> {
        let session = &mut self.session;
        match input {
            Input::Select(letter) => {
                if session.layout() == QuestionLayout::List {
                    println!("Use <number><letter>, e.g. 2{letter}.");
                    return Ok(());
                }
                let outcome = session.select_current(&letter);
                self.after_selection(outcome, &letter);
            }
            Input::SelectAt(index, letter) => {
                if index >= session.questions().len() {
                    println!("There is no question {}.", index + 1);
                    return Ok(());
                }
                session.go_to(index);
                let outcome = session.select_current(&letter);
                self.after_selection(outcome, &letter);
            }
            Input::Next => {
                if session.advance() {
                    println!("\n{}", render_screen(session));
                } else {
                    println!("This is the last question. {}", finish_hint(session.mode()));
                }
            }
            Input::Prev => {
                if session.retreat() {
                    println!("\n{}", render_screen(session));
                } else {
                    println!("This is the first question.");
                }
            }
            Input::GoTo(index) => {
                session.go_to(index);
                println!("\n{}", render_screen(session));
            }
            Input::Clear => {
                let cleared = session
                    .current_question()
                    .map(|q| q.id.clone())
                    .is_some_and(|id| session.clear_answer(&id));
                if cleared {
                    println!("\n{}", render_screen(session));
                } else if session.mode() == QuizMode::Learning {
                    println!("Answers are final in learning mode.");
                } else {
                    println!("Nothing to clear.");
                }
            }
            Input::Submit | Input::Finish => self.submit()?,
            Input::Retake => println!("Retake is available after the summary."),
            Input::Yes | Input::No => println!("Nothing to confirm."),
            Input::Quit | Input::Help | Input::ToggleTheme => {}
        }
        Ok(())
    }

    fn after_selection(&self, outcome: Selection, letter: &str) {
        match outcome {
            Selection::Recorded => println!("\n{}", render_screen(&self.session)),
            Selection::Locked => println!("Your first answer is final in learning mode."),
            Selection::Ignored => println!("There is no option {letter} on this question."),
        }
    }

    fn submit(&mut self) -> Result<()> {
        let session = &mut self.session;
        match (session.mode(), session.layout()) {
            (QuizMode::Timed, _) if session.needs_submit_confirmation() => {
                self.confirming = true;
                println!("{}", confirm_prompt(session.unanswered_count()));
            }
            (QuizMode::Learning, QuestionLayout::Single) => match session.finish() {
                Some(summary) => {
                    let summary = summary.clone();
                    self.complete(summary)?;
                }
                None => println!(
                    "Finish is available on the last question ({}/{}).",
                    session.questions().len(),
                    session.questions().len()
                ),
            },
            _ => {
                let summary = session.finalize(false).clone();
                self.complete(summary)?;
            }
        }
        Ok(())
    }

    fn complete(&mut self, summary: Summary) -> Result<()> {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
        // A pending submit prompt is void once the session is finished.
        self.confirming = false;
        println!("{}", render_summary(&summary));

        let report = SessionReport::new(self.exports.source_label.clone(), summary);
        self.exports.write(&report, self.theme)?;
        self.reports.push(report);

        println!("Type r to retake or q to quit.");
        Ok(())
    }
}

fn finish_hint(mode: QuizMode) -> &'static str {
    match mode {
        QuizMode::Learning => "Type f to finish.",
        QuizMode::Timed => "Type s to submit.",
    }
}

async fn next_tick(countdown: &mut Option<Countdown>) -> Option<()> {
    match countdown {
        Some(countdown) => countdown.tick().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    use sheetquiz_core::model::AnswerOption;

    fn bank(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: format!("q{i}"),
                module: "Ops".into(),
                submodule: if i % 2 == 0 { "Deploy" } else { "Monitor" }.into(),
                prompt: format!("Question {i}"),
                options: vec![
                    AnswerOption {
                        id: "a".into(),
                        label: "right".into(),
                    },
                    AnswerOption {
                        id: "b".into(),
                        label: "wrong".into(),
                    },
                ],
                correct_option: "a".into(),
                explanation: None,
                difficulty: None,
                tags: vec![],
            })
            .collect()
    }

    fn driver(n: usize, config: SessionConfig) -> Driver {
        let exports = Exports {
            source_label: "test".into(),
            output_dir: PathBuf::from("unused"),
            formats: Formats::default(),
        };
        Driver::new(QuizSession::new(bank(n), config), exports, Theme::Light)
    }

    fn script(input: &'static str) -> Lines<BufReader<&'static [u8]>> {
        BufReader::new(input.as_bytes()).lines()
    }

    #[test]
    fn format_selection() {
        assert_eq!(parse_formats(None, false).unwrap(), Formats::default());
        assert_eq!(
            parse_formats(None, true).unwrap(),
            Formats {
                json: true,
                ..Formats::default()
            }
        );
        assert_eq!(
            parse_formats(Some("all"), false).unwrap(),
            Formats {
                json: true,
                html: true,
                markdown: true,
            }
        );
        assert!(parse_formats(Some("md"), false).unwrap().markdown);
        assert!(parse_formats(Some("json,sarif"), true).is_err());
    }

    #[tokio::test]
    async fn learning_run_locks_answers_and_finishes() {
        let mut driver = driver(2, SessionConfig::default());
        driver.run(script("a\nb\nf\nn\nb\nf\nq\n")).await.unwrap();

        let summary = &driver.reports[0].summary;
        assert_eq!(driver.reports.len(), 1);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.incorrect, 1);
        assert!(driver.session.is_finished());
    }

    #[tokio::test]
    async fn retake_runs_a_second_attempt() {
        let mut driver = driver(1, SessionConfig::default());
        driver.run(script("b\nf\nr\na\nf\nq\n")).await.unwrap();

        assert_eq!(driver.reports.len(), 2);
        assert_eq!(driver.reports[0].summary.correct, 0);
        assert_eq!(driver.reports[1].summary.correct, 1);
    }

    #[tokio::test]
    async fn list_layout_answers_by_number() {
        let mut driver = driver(3, SessionConfig::learning(QuestionLayout::List));
        driver.run(script("a\n2a\n3b\nf\nq\n")).await.unwrap();

        let summary = &driver.reports[0].summary;
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_submit_needs_confirmation() {
        let mut driver = driver(2, SessionConfig::timed(5));
        driver.run(script("a\ns\nno\ns\ny\nq\n")).await.unwrap();

        assert_eq!(driver.reports.len(), 1);
        let summary = &driver.reports[0].summary;
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.skipped, 1);
        assert!(summary.timing.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_clear_then_submit_without_gaps() {
        let mut driver = driver(1, SessionConfig::timed(5));
        driver.run(script("b\nx\na\ns\nq\n")).await.unwrap();

        let summary = &driver.reports[0].summary;
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expiry_submits_automatically() {
        let mut driver = driver(2, SessionConfig::timed(1));
        let (mut keyboard, stdin) = tokio::io::duplex(64);

        let typist = async move {
            keyboard.write_all(b"a\n").await.unwrap();
            tokio::time::sleep(Duration::from_secs(90)).await;
            keyboard.write_all(b"q\n").await.unwrap();
        };
        let (result, ()) = tokio::join!(driver.run(BufReader::new(stdin).lines()), typist);
        result.unwrap();

        assert_eq!(driver.reports.len(), 1);
        let summary = &driver.reports[0].summary;
        assert_eq!(summary.timing.unwrap().elapsed_seconds, 60);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_cancels_pending_confirmation() {
        let mut driver = driver(2, SessionConfig::timed(1));
        let (mut keyboard, stdin) = tokio::io::duplex(64);

        let typist = async move {
            keyboard.write_all(b"a\ns\n").await.unwrap();
            tokio::time::sleep(Duration::from_secs(90)).await;
            keyboard.write_all(b"y\nr\nq\n").await.unwrap();
        };
        let (result, ()) = tokio::join!(driver.run(BufReader::new(stdin).lines()), typist);
        result.unwrap();

        assert_eq!(driver.reports.len(), 1);
        assert!(!driver.confirming);
        assert_eq!(
            driver.reports[0].summary.timing.unwrap().elapsed_seconds,
            60
        );
        // `r` after the summary starts a fresh attempt instead of answering the old prompt.
        assert!(driver.session.is_running());
        assert_eq!(driver.session.answered_count(), 0);
    }

    #[tokio::test]
    async fn eof_abandons_running_session() {
        let mut driver = driver(2, SessionConfig::default());
        driver.run(script("a\n")).await.unwrap();
        assert!(driver.reports.is_empty());
        assert!(driver.session.is_running());
    }
}
