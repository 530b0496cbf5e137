// Source windows around a line, with the focus line marked

use crate::highlight::highlight;
use crate::style::StyleProvider;
use colored::Colorize;

/// Marker drawn in the gutter of the focus line
pub const LINE_MARKER: &str = "❱";
/// Separator between line numbers and code
pub const LINE_SEPARATOR: &str = "│";

/// Render `extra_lines` lines either side of `line` (1-based).
/// Returns an empty vector if `line` is outside the source.
pub fn code_context(
    source: &str,
    line: usize,
    extra_lines: usize,
    provider: &dyn StyleProvider,
) -> Vec<String> {
    let lines: Vec<&str> = source.lines().collect();
    if line == 0 || line > lines.len() {
        return Vec::new();
    }

    let first = line.saturating_sub(extra_lines).max(1);
    let last = (line + extra_lines).min(lines.len());
    let number_width = last.to_string().len().max(4);

    let mut out = Vec::with_capacity(last - first + 1);
    for number in first..=last {
        let text = lines[number - 1].trim_end();
        let painted = highlight(text, provider);
        let label = format!("{:>width$}", number, width = number_width);

        if number == line {
            out.push(format!(
                "  {} {} {} {}",
                LINE_MARKER.red().bold(),
                label.yellow(),
                LINE_SEPARATOR,
                painted.bold()
            ));
        } else {
            out.push(format!(
                "    {} {} {}",
                label.bright_black(),
                LINE_SEPARATOR,
                painted
            ));
        }
    }

    out
}
