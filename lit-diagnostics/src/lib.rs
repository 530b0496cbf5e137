// Terminal rendering shared by the debug printer and the panic hook:
// themes, syntax highlighting, code windows and panic reports

use std::fmt;

pub mod highlight;
pub mod report;
pub mod snippet;
pub mod style;

pub use highlight::{highlight, strip_ansi};
pub use report::{format_variables, FrameInfo, PanicReport, ReportOptions};
pub use snippet::{code_context, LINE_MARKER, LINE_SEPARATOR};
pub use style::{Style, StyleProvider, Theme, ThemeError, BUILTIN_THEMES};

/// Source code location (line, column, file)
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl Span {
    pub fn new(file: String, line: usize, column: usize, length: usize) -> Self {
        Self {
            file,
            line,
            column,
            length,
        }
    }

    /// Convert a byte range of `source` into a line/column span
    pub fn from_file_and_span(file: &str, source: &str, span: std::ops::Range<usize>) -> Self {
        let start = span.start.min(source.len());
        let before = source.get(..start).unwrap_or("");
        let line = before.chars().filter(|&c| c == '\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(pos) => before[pos + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        let length = span.end.saturating_sub(span.start).max(1);

        Self {
            file: file.to_string(),
            line,
            column,
            length,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_from_range() {
        let source = "fn main() {\n    lit!(x);\n}\n";
        let start = source.find("lit!").unwrap();
        let span = Span::from_file_and_span("src/main.rs", source, start..start + 4);

        assert_eq!(span.line, 2);
        assert_eq!(span.column, 5);
        assert_eq!(span.length, 4);
        assert_eq!(span.to_string(), "src/main.rs:2:5");
    }

    #[test]
    fn test_span_columns_count_chars() {
        let source = "// é\nlet é = 1;";
        let start = source.rfind('=').unwrap();
        let span = Span::from_file_and_span("a.rs", source, start..start + 1);
        assert_eq!((span.line, span.column), (2, 7));
    }
}
