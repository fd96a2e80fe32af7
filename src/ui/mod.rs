//! Terminal output for the CLI: status lines, record summaries and a spinner.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::models::FinalizedRecord;
use crate::pipeline::SaveOutcome;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different outcomes.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    if !is_terminal() {
        println!("{} {}", icon, msg);
        return;
    }
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => println!("{} {}", icon.red().bold(), msg),
        Status::Warning => println!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
    }
}

/// Print the single status line of a save attempt
pub fn print_outcome(outcome: &SaveOutcome) {
    let status = if outcome.success {
        Status::Success
    } else {
        Status::Error
    };
    print_status(status, &outcome.message);
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    if is_terminal() {
        println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
    } else {
        println!("━━━ {} ━━━", title);
    }
}

/// Label/value rows describing a finalized record
pub fn record_rows(record: &FinalizedRecord) -> Vec<(&'static str, String)> {
    let fields = record.record();
    let mut rows = vec![
        ("Name", record.display_name().to_string()),
        ("Citekey", record.citation_key().to_string()),
    ];
    let optional = [
        ("Title", fields.title.clone()),
        ("Authors", Some(fields.authors().join("; ")).filter(|a| !a.is_empty())),
        ("Year", fields.year.clone()),
        ("Journal", fields.journal.clone()),
        ("DOI", fields.doi.clone()),
        ("arXiv", fields.preprint_id.clone()),
    ];
    rows.extend(
        optional
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| (label, v))),
    );
    rows.push(("Type", fields.document_type_or_default().to_string()));
    rows.push(("URL", fields.url.clone()));
    rows
}

/// Print a record as aligned label/value rows.
pub fn print_record(record: &FinalizedRecord) {
    for (label, value) in record_rows(record) {
        let value = truncate_with_ellipsis(&value, 100);
        if is_terminal() {
            println!("  {:>8}  {}", label.dimmed(), value);
        } else {
            println!("  {:>8}  {}", label, value);
        }
    }
}

/// Truncate text to at most `max_chars` characters, ending in "...".
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if max_chars <= 3 {
        return "...".to_string();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

/// Spinner shown while a save runs. Hidden when stdout is not a terminal.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = if is_terminal() {
            indicatif::ProgressBar::new_spinner()
        } else {
            indicatif::ProgressBar::hidden()
        };
        if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Remove the spinner so the status line stands alone.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::finalize_at;
    use crate::models::RecordBuilder;

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Success), "✓");
        assert_eq!(status_icon(Status::Error), "✗");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 3), "...");
        assert_eq!(truncate_with_ellipsis("論文の要約です", 5), "論文...");
    }

    #[test]
    fn test_record_rows_skip_missing_fields() {
        let record = finalize_at(
            RecordBuilder::new("https://example.com/p")
                .title("A Study")
                .authors(["Ada Lovelace"])
                .year("1843")
                .build(),
            0,
        );
        let rows = record_rows(&record);
        let labels: Vec<&str> = rows.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec!["Name", "Citekey", "Title", "Authors", "Year", "Type", "URL"]
        );
        assert_eq!(rows[0].1, "Lovelace 1843");
    }
}
