//! Terminal rendering and input parsing for interactive sessions.

use comfy_table::{Cell, Table};

use sheetquiz_core::model::{Question, QuestionLayout, QuizMode};
use sheetquiz_core::session::{OptionFeedback, QuizSession};
use sheetquiz_core::summary::{to_percent, Outcome, Summary};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Answer the current card.
    Select(String),
    /// Answer question `n` (zero-based) in the list layout.
    SelectAt(usize, String),
    Next,
    Prev,
    /// Jump to question `n` (zero-based).
    GoTo(usize),
    Clear,
    Submit,
    Finish,
    Retake,
    ToggleTheme,
    Help,
    Quit,
    Yes,
    No,
}

/// Parse a command line. Numbers shown to the user are one-based.
pub fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim().to_lowercase();
    let input = match line.as_str() {
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Prev,
        "x" | "clear" => Input::Clear,
        "s" | "submit" => Input::Submit,
        "f" | "finish" => Input::Finish,
        "r" | "retake" => Input::Retake,
        "t" | "theme" => Input::ToggleTheme,
        "h" | "?" | "help" => Input::Help,
        "q" | "quit" => Input::Quit,
        "y" | "yes" => Input::Yes,
        "no" => Input::No,
        "a" | "b" | "c" | "d" => Input::Select(line),
        other => {
            let digits_end = other
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(other.len());
            let number: usize = other[..digits_end].parse().ok()?;
            let index = number.checked_sub(1)?;
            match other[digits_end..].trim() {
                "" => Input::GoTo(index),
                letter @ ("a" | "b" | "c" | "d") => Input::SelectAt(index, letter.to_string()),
                _ => return None,
            }
        }
    };
    Some(input)
}

pub fn help_text(mode: QuizMode, layout: QuestionLayout) -> String {
    let mut lines = vec![];
    match layout {
        QuestionLayout::Single => {
            lines.push("  a-d      choose an option");
            lines.push("  n / p    next / previous question");
            lines.push("  <num>    jump to question");
        }
        QuestionLayout::List => {
            lines.push("  <num><a-d>  answer a question, e.g. 3b");
        }
    }
    match mode {
        QuizMode::Learning => lines.push("  f        finish and show the summary"),
        QuizMode::Timed => {
            lines.push("  x        clear the current answer");
            lines.push("  s        submit");
        }
    }
    lines.push("  t        toggle light/dark theme");
    lines.push("  q        quit");
    format!("Commands:\n{}", lines.join("\n"))
}

fn marker(feedback: OptionFeedback) -> &'static str {
    match feedback {
        OptionFeedback::Neutral => " ",
        OptionFeedback::Selected => "*",
        OptionFeedback::Correct => "+",
        OptionFeedback::Incorrect => "x",
    }
}

/// Render one question card with option markers and, once revealed, the explanation.
pub fn render_question(session: &QuizSession, index: usize, question: &Question) -> String {
    let mut out = format!(
        "[{}/{}] {} / {}",
        index + 1,
        session.questions().len(),
        question.module,
        question.submodule
    );
    if let Some(difficulty) = &question.difficulty {
        out.push_str(&format!(" ({difficulty})"));
    }
    out.push_str(&format!("\n{}\n", question.prompt));

    for option in &question.options {
        let feedback = session.option_feedback(&question.id, &option.id);
        out.push_str(&format!(
            "  {} {}) {}\n",
            marker(feedback),
            option.id,
            option.label
        ));
    }

    if session.is_revealed(&question.id) {
        match session.answers().get(&question.id) {
            Some(id) if question.is_correct(id) => out.push_str("Correct!\n"),
            Some(_) => out.push_str(&format!("Incorrect. Answer: {}\n", question.correct_label())),
            None => out.push_str(&format!("Skipped. Answer: {}\n", question.correct_label())),
        }
        if let Some(explanation) = &question.explanation {
            out.push_str(&format!("  {explanation}\n"));
        }
    }
    out
}

/// Render whatever the layout puts on screen, plus a status line.
pub fn render_screen(session: &QuizSession) -> String {
    let mut out = String::new();
    match session.layout() {
        QuestionLayout::Single => {
            if let Some(q) = session.current_question() {
                out.push_str(&render_question(session, session.current_index(), q));
            }
        }
        QuestionLayout::List => {
            for (i, q) in session.questions().iter().enumerate() {
                out.push_str(&render_question(session, i, q));
                out.push('\n');
            }
        }
    }
    out.push_str(&status_line(session));
    out
}

pub fn status_line(session: &QuizSession) -> String {
    let mut line = format!(
        "{}/{} answered ({:.0}%)",
        session.answered_count(),
        session.questions().len(),
        session.progress() * 100.0
    );
    if let Some(clock) = session.format_remaining() {
        line.push_str(&format!(" | {clock} left"));
    }
    line
}

pub fn confirm_prompt(unanswered: usize) -> String {
    format!("You still have {unanswered} unanswered question(s). Submit anyway? [y/N]")
}

/// Render the summary: headline numbers, highlights, and a per-submodule table.
pub fn render_summary(summary: &Summary) -> String {
    let mut out = format!(
        "\nSummary ({} mode): {}/{} correct ({}%), {} incorrect, {} skipped\n",
        summary.mode,
        summary.correct,
        summary.total,
        to_percent(summary.accuracy),
        summary.incorrect,
        summary.skipped
    );
    if let Some(timing) = summary.timing {
        out.push_str(&format!(
            "Time used: {}\n",
            sheetquiz_core::session::format_clock(timing.elapsed_seconds)
        ));
    }
    if !summary.strengths.is_empty() {
        out.push_str(&format!("Strengths: {}\n", summary.strengths.join(", ")));
    }
    if !summary.focus.is_empty() {
        out.push_str(&format!("Focus areas: {}\n", summary.focus.join(", ")));
    }

    if !summary.by_submodule.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Module", "Submodule", "Correct", "Total", "Accuracy"]);
        for g in &summary.by_submodule {
            table.add_row(vec![
                Cell::new(g.module.as_deref().unwrap_or("-")),
                Cell::new(&g.label),
                Cell::new(g.correct),
                Cell::new(g.total),
                Cell::new(format!("{}%", to_percent(g.accuracy))),
            ]);
        }
        out.push_str(&format!("\n{table}\n"));
    }

    let missed: Vec<_> = summary
        .questions
        .iter()
        .enumerate()
        .filter(|(_, q)| q.outcome() != Outcome::Correct)
        .collect();
    if !missed.is_empty() {
        out.push_str("\nReview:\n");
        for (i, q) in missed {
            out.push_str(&format!(
                "  {}. {} (yours: {}, answer: {})\n",
                i + 1,
                q.prompt,
                q.selected_label.as_deref().unwrap_or("skipped"),
                q.correct_label
            ));
        }
    }
    out
}
