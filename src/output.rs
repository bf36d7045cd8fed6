// src/output.rs
// =============================================================================
// Renders confirmed findings for the terminal.
//
// Output for one finding looks like:
//
//   https://example.com
//   [us,de] [200] Home
//   [cn] [403] no title
//
// Countries that saw the same status and title are grouped on one line.
// Colors come from a Palette passed in by the caller; with Palette::Plain the
// same text is produced without escape codes.
// =============================================================================

use std::env;
use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use tracing::error;

use crate::checker::{CheckResult, CountryOutcome};
use crate::pipeline::FindingSink;

const MAX_TITLE_CHARS: usize = 50;
const TRUNCATED_TITLE_CHARS: usize = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Yellow,
    Red,
    Blue,
    Magenta,
    Cyan,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Red => "\x1b[31m",
            Color::Blue => "\x1b[34m",
            Color::Magenta => "\x1b[35m",
            Color::Cyan => "\x1b[36m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Whether rendered text carries ANSI color codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Ansi,
    Plain,
}

impl Palette {
    /// Colors only when stdout is a terminal, NO_COLOR is unset and the user
    /// did not pass --no-color.
    pub fn detect(no_color: bool) -> Palette {
        if no_color || env::var_os("NO_COLOR").is_some() || !io::stdout().is_terminal() {
            Palette::Plain
        } else {
            Palette::Ansi
        }
    }

    pub fn paint(self, color: Color, text: impl Display) -> String {
        match self {
            Palette::Ansi => format!("{}{}{}", color.code(), text, RESET),
            Palette::Plain => text.to_string(),
        }
    }
}

/// Renders one finding: the URL line followed by one line per group.
pub fn render_finding(result: &CheckResult, palette: Palette) -> String {
    let mut out = palette.paint(Color::Blue, &result.url);
    out.push('\n');

    for group in group_outcomes(&result.outcomes) {
        let countries: Vec<&str> = group.iter().map(|o| o.country.as_str()).collect();
        let first = group[0];

        let status = match &first.error {
            Some(error) => palette.paint(Color::Red, error),
            None => colorize_status(first.status_code, palette),
        };

        out.push_str(&format!(
            "[{}] [{}] {}\n",
            countries.join(","),
            status,
            format_title(&first.title, palette)
        ));
    }

    out
}

// Groups outcomes sharing the same status and title, in first-seen order.
fn group_outcomes(outcomes: &[CountryOutcome]) -> Vec<Vec<&CountryOutcome>> {
    let mut groups: Vec<(String, Vec<&CountryOutcome>)> = Vec::new();

    for outcome in outcomes {
        let key = group_key(outcome);
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(outcome),
            None => groups.push((key, vec![outcome])),
        }
    }

    groups.into_iter().map(|(_, members)| members).collect()
}

fn group_key(outcome: &CountryOutcome) -> String {
    match &outcome.error {
        Some(error) => format!("error:{}", error),
        None => format!("{}:{}", outcome.status_code, outcome.title),
    }
}

pub fn colorize_status(status: u16, palette: Palette) -> String {
    match status {
        200..=299 => palette.paint(Color::Green, status),
        300..=399 => palette.paint(Color::Yellow, status),
        400..=499 => palette.paint(Color::Red, status),
        500..=u16::MAX => palette.paint(Color::Magenta, status),
        _ => status.to_string(),
    }
}

pub fn format_title(title: &str, palette: Palette) -> String {
    if title.is_empty() {
        return palette.paint(Color::Yellow, "no title");
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        let cut: String = title.chars().take(TRUNCATED_TITLE_CHARS).collect();
        return format!("{}...", cut);
    }
    title.to_string()
}

/// Prints findings as colored text, separated by blank lines.
pub struct TerminalSink<W> {
    out: W,
    palette: Palette,
    printed_any: bool,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(palette: Palette) -> Self {
        TerminalSink::new(io::stdout(), palette)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        TerminalSink {
            out,
            palette,
            printed_any: false,
        }
    }

    fn print(&mut self, finding: &CheckResult) -> io::Result<()> {
        if self.printed_any {
            writeln!(self.out)?;
        }
        write!(self.out, "{}", render_finding(finding, self.palette))?;
        self.out.flush()
    }
}

impl<W: Write + Send> FindingSink for TerminalSink<W> {
    fn accept(&mut self, finding: &CheckResult, _accumulated: &[CheckResult]) {
        if let Err(e) = self.print(finding) {
            error!(error = %e, "failed to print finding");
        }
        self.printed_any = true;
    }
}

/// Prints each finding as one compact JSON object per line.
pub struct JsonLinesSink<W> {
    out: W,
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        JsonLinesSink::new(io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out }
    }

    fn print(&mut self, finding: &CheckResult) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, finding)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> FindingSink for JsonLinesSink<W> {
    fn accept(&mut self, finding: &CheckResult, _accumulated: &[CheckResult]) {
        if let Err(e) = self.print(finding) {
            error!(error = %e, "failed to print finding");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding() -> CheckResult {
        CheckResult::new(
            "https://example.com",
            vec![
                CountryOutcome::succeeded("us", 200, "Home", 1000),
                CountryOutcome::succeeded("cn", 403, "", 50),
                CountryOutcome::succeeded("de", 200, "Home", 1100),
                CountryOutcome::failed("jp", "making request: proxy error"),
            ],
        )
    }

    #[test]
    fn test_render_groups_countries_in_first_seen_order() {
        let text = render_finding(&finding(), Palette::Plain);
        assert_eq!(
            text,
            "https://example.com\n\
             [us,de] [200] Home\n\
             [cn] [403] no title\n\
             [jp] [making request: proxy error] no title\n"
        );
    }

    #[test]
    fn test_ansi_palette_colors_status() {
        assert_eq!(colorize_status(200, Palette::Ansi), "\x1b[32m200\x1b[0m");
        assert_eq!(colorize_status(301, Palette::Ansi), "\x1b[33m301\x1b[0m");
        assert_eq!(colorize_status(404, Palette::Ansi), "\x1b[31m404\x1b[0m");
        assert_eq!(colorize_status(503, Palette::Ansi), "\x1b[35m503\x1b[0m");
        assert_eq!(colorize_status(0, Palette::Ansi), "0");
        assert_eq!(colorize_status(200, Palette::Plain), "200");
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let title = "x".repeat(60);
        let formatted = format_title(&title, Palette::Plain);
        assert_eq!(formatted.chars().count(), 50);
        assert!(formatted.ends_with("..."));

        let exactly_fifty = "y".repeat(50);
        assert_eq!(format_title(&exactly_fifty, Palette::Plain), exactly_fifty);
    }

    #[test]
    fn test_truncation_respects_multibyte_chars() {
        let title = "é".repeat(55);
        let formatted = format_title(&title, Palette::Plain);
        assert_eq!(formatted, format!("{}...", "é".repeat(47)));
    }

    #[test]
    fn test_terminal_sink_separates_findings_with_blank_line() {
        let mut sink = TerminalSink::new(Vec::new(), Palette::Plain);
        let result = finding();
        sink.accept(&result, std::slice::from_ref(&result));
        sink.accept(&result, &[result.clone(), result.clone()]);

        let text = String::from_utf8(sink.out).unwrap();
        let rendered = render_finding(&result, Palette::Plain);
        assert_eq!(text, format!("{}\n{}", rendered, rendered));
    }

    #[test]
    fn test_json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let result = finding();
        sink.accept(&result, std::slice::from_ref(&result));
        sink.accept(&result, std::slice::from_ref(&result));

        let text = String::from_utf8(sink.out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: CheckResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, result);
    }
}
