// Panic reports: header, message, frames with code context, variables

use crate::highlight::strip_ansi;
use crate::snippet::code_context;
use crate::style::StyleProvider;
use crate::Span;
use colored::Colorize;

/// Most variables shown in the `Variables:` section
pub const MAX_VARIABLES: usize = 15;
/// Longest value repr before truncation
pub const MAX_VARIABLE_LENGTH: usize = 100;
/// Default number of lines shown either side of a frame's line
pub const DEFAULT_EXTRA_LINES: usize = 5;
/// Width of frame separators when the terminal width is unknown
pub const DEFAULT_WIDTH: usize = 100;

/// One stack frame of a report
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub function: String,
    pub span: Option<Span>,
    /// Standard library or registry crate code
    pub is_library: bool,
}

impl FrameInfo {
    pub fn new(function: impl Into<String>, span: Option<Span>) -> Self {
        let span_is_library = span.as_ref().map_or(false, |s| is_library_path(&s.file));
        Self {
            function: function.into(),
            span,
            is_library: span_is_library,
        }
    }
}

/// Paths that belong to the toolchain or to downloaded dependencies
pub fn is_library_path(path: &str) -> bool {
    let path = path.replace('\\', "/");
    path.starts_with("/rustc/")
        || path.contains("/.cargo/registry/")
        || path.contains("/.cargo/git/")
        || path.contains("/library/std/src/")
        || path.contains("/library/core/src/")
}

/// Rendering knobs for [`PanicReport::render`]
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub extra_lines: usize,
    pub width: usize,
    pub show_library_source: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            extra_lines: DEFAULT_EXTRA_LINES,
            width: DEFAULT_WIDTH,
            show_library_source: false,
        }
    }
}

/// Everything needed to draw one panic
#[derive(Debug, Clone, Default)]
pub struct PanicReport {
    pub timestamp: String,
    pub thread: Option<String>,
    pub message: String,
    pub location: Option<Span>,
    pub frames: Vec<FrameInfo>,
    /// Name / already-formatted value pairs
    pub variables: Vec<(String, String)>,
}

impl PanicReport {
    /// Render to lines. `load_source` resolves a span's file to its text.
    pub fn render(
        &self,
        options: &ReportOptions,
        provider: &dyn StyleProvider,
        load_source: &dyn Fn(&str) -> Option<String>,
    ) -> Vec<String> {
        let mut out = Vec::new();

        out.push(format!("Panic captured at {}", self.timestamp).bright_black().to_string());
        out.push(String::new());

        let thread = self
            .thread
            .as_deref()
            .map(|t| format!(" in thread '{}'", t))
            .unwrap_or_default();
        out.push(format!(
            "{}{}: {}",
            "panicked".red().bold(),
            thread,
            self.message.red()
        ));

        if let Some(span) = &self.location {
            out.push(String::new());
            out.push(frame_header(span, None, false));
            out.extend(context_or_note(span, options, provider, load_source));
        }

        if !self.frames.is_empty() {
            out.push(String::new());
            out.push("Backtrace (most recent call last):".bold().to_string());
        }
        for (index, frame) in self.frames.iter().enumerate() {
            out.push(String::new());
            match &frame.span {
                Some(span) => {
                    out.push(frame_header(span, Some(&frame.function), frame.is_library));
                    if !frame.is_library || options.show_library_source {
                        out.extend(context_or_note(span, options, provider, load_source));
                    }
                }
                None => out.push(format!("  in {}", frame.function.cyan())),
            }
            if index + 1 < self.frames.len() {
                out.push(String::new());
                let rule = "─".repeat(options.width.saturating_sub(4));
                out.push(format!("  {}", rule).bright_black().to_string());
            }
        }

        let variables = format_variables(&self.variables);
        if !variables.is_empty() {
            out.push(String::new());
            out.push(format!("  {}", "Variables:".white().bold()));
            out.extend(variables);
        }

        out
    }
}

fn frame_header(span: &Span, function: Option<&str>, is_library: bool) -> String {
    let mut header = format!(
        "  File \"{}\", line {}",
        span.file.blue(),
        span.line.to_string().yellow()
    );
    if let Some(function) = function {
        header.push_str(&format!(", in {}", function.cyan()));
    }
    if is_library {
        header.push_str(&format!(" {}", "[Library]".bright_black()));
    }
    header
}

fn context_or_note(
    span: &Span,
    options: &ReportOptions,
    provider: &dyn StyleProvider,
    load_source: &dyn Fn(&str) -> Option<String>,
) -> Vec<String> {
    let lines = load_source(&span.file)
        .map(|source| code_context(&source, span.line, options.extra_lines, provider))
        .unwrap_or_default();

    if lines.is_empty() {
        vec![format!("  {}", "[Source code not available]".bright_black())]
    } else {
        lines
    }
}

/// Two-column `name = value` layout. Names are sorted; the first half of
/// the list fills the left column, the rest the right one. Left-column names
/// are padded to the widest of them so their `=` signs line up.
pub fn format_variables(variables: &[(String, String)]) -> Vec<String> {
    if variables.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&(String, String)> = variables.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut cells: Vec<(String, String)> = sorted
        .iter()
        .take(MAX_VARIABLES)
        .map(|(name, value)| {
            (
                name.magenta().to_string(),
                color_value(&truncate(value, MAX_VARIABLE_LENGTH)),
            )
        })
        .collect();
    if sorted.len() > MAX_VARIABLES {
        cells.push((
            "...".dimmed().to_string(),
            format!("<{} more variables>", sorted.len() - MAX_VARIABLES)
                .dimmed()
                .to_string(),
        ));
    }

    let rows = (cells.len() + 1) / 2;
    let key_width = cells[..rows]
        .iter()
        .map(|(name, _)| visible_width(name))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(rows);
    for (i, (name, value)) in cells[..rows].iter().enumerate() {
        let pad = " ".repeat(key_width - visible_width(name));
        let mut line = format!("  {}{} {} {}", name, pad, "=".bright_black(), value);
        if let Some((name, value)) = cells.get(i + rows) {
            line.push_str(&format!("    {} {} {}", name, "=".bright_black(), value));
        }
        lines.push(line);
    }

    lines
}

fn visible_width(text: &str) -> usize {
    strip_ansi(text).chars().count()
}

fn truncate(value: &str, max: usize) -> String {
    // Multi-line values are folded so the layout stays one row per pair
    let flat = value.replace('\n', " ");
    if flat.chars().count() > max {
        let kept: String = flat.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    } else {
        flat
    }
}

/// Colour a value repr by its shape
fn color_value(repr: &str) -> String {
    let val = repr.trim();
    let painted = if val == "None" {
        val.bright_black().italic()
    } else if val == "true" || val == "false" {
        val.green()
    } else if (val.starts_with('\'') && val.ends_with('\''))
        || (val.starts_with('"') && val.ends_with('"'))
    {
        val.yellow()
    } else if val.parse::<f64>().is_ok() {
        val.blue()
    } else if val.starts_with("<class ") {
        val.cyan()
    } else if val.starts_with(['{', '[', '(']) || (val.starts_with('<') && val.ends_with('>')) {
        val.magenta()
    } else {
        val.white()
    };
    painted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Theme;

    fn plain(lines: &[String]) -> Vec<String> {
        lines.iter().map(|l| strip_ansi(l)).collect()
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_two_column_layout() {
        let lines = plain(&format_variables(&vars(&[
            ("zeta", "1"),
            ("a", "'x'"),
            ("count", "12345"),
        ])));

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "  a     = 'x'    zeta = 1");
        assert_eq!(lines[1], "  count = 12345");
    }

    #[test]
    fn test_left_keys_share_a_column() {
        let lines = plain(&format_variables(&vars(&[
            ("a", "1"),
            ("bbbbbb", "22222"),
            ("c", "3"),
            ("d", "4"),
        ])));

        assert_eq!(lines[0], "  a      = 1    c = 3");
        assert_eq!(lines[1], "  bbbbbb = 22222    d = 4");
        assert_eq!(lines[0].find('='), lines[1].find('='));
    }

    #[test]
    fn test_variable_limit() {
        let many: Vec<(String, String)> = (0..20)
            .map(|i| (format!("v{:02}", i), i.to_string()))
            .collect();
        let lines = plain(&format_variables(&many));
        let joined = lines.join("\n");

        assert_eq!(lines.len(), 8);
        assert!(joined.contains("<5 more variables>"));
        assert!(!joined.contains("v15"));
    }

    #[test]
    fn test_long_values_truncate() {
        let long = "x".repeat(150);
        let lines = plain(&format_variables(&vars(&[("big", &long)])));
        assert!(lines[0].ends_with('…'));
        assert_eq!(lines[0].chars().count(), "  big = ".len() + MAX_VARIABLE_LENGTH);
    }

    #[test]
    fn test_render_report() {
        let report = PanicReport {
            timestamp: "2024-01-01 00:00:00".to_string(),
            thread: Some("main".to_string()),
            message: "attempt to divide by zero".to_string(),
            location: Some(Span::new("src/main.rs".to_string(), 2, 13, 1)),
            frames: Vec::new(),
            variables: vars(&[("b", "0")]),
        };
        let source = "fn main() {\n    let c = 1 / 0;\n}\n".to_string();
        let lines = plain(&report.render(
            &ReportOptions::default(),
            &Theme::monochrome(),
            &|_| Some(source.clone()),
        ));

        assert_eq!(lines[0], "Panic captured at 2024-01-01 00:00:00");
        assert_eq!(lines[2], "panicked in thread 'main': attempt to divide by zero");
        assert_eq!(lines[4], "  File \"src/main.rs\", line 2");
        assert!(lines.iter().any(|l| l.starts_with("  ❱") && l.contains("1 / 0")));
        assert_eq!(lines.last().map(String::as_str), Some("  b = 0"));
    }

    #[test]
    fn test_missing_source_note() {
        let report = PanicReport {
            message: "boom".to_string(),
            frames: vec![FrameInfo::new(
                "app::run",
                Some(Span::new("src/gone.rs".to_string(), 3, 1, 1)),
            )],
            ..Default::default()
        };
        let lines = plain(&report.render(&ReportOptions::default(), &Theme::monochrome(), &|_| None));

        assert!(lines.contains(&"  [Source code not available]".to_string()));
        assert!(lines.iter().any(|l| l.contains("in app::run")));
    }

    #[test]
    fn test_library_paths() {
        assert!(is_library_path("/rustc/abc123/library/core/src/panicking.rs"));
        assert!(is_library_path("/home/u/.cargo/registry/src/x/lib.rs"));
        assert!(!is_library_path("src/main.rs"));
    }
}
