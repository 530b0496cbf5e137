// Composes expression/value pairs into the printed block

use lit_formatter::Value;
use lit_lexer::is_literal;

/// Separates the call context from the first pair
pub const CONTEXT_DELIMITER: &str = " >>> ";
/// Separates pairs on a single line
pub const PAIR_DELIMITER: &str = ", ";
/// Longest first line before switching to one pair per line
pub const DEFAULT_LINE_WRAP_WIDTH: usize = 70;

/// One argument: its source text (when known) and its value
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentPair {
    pub expression: Option<String>,
    pub value: Value,
}

impl ArgumentPair {
    pub fn new(expression: Option<String>, value: Value) -> Self {
        Self { expression, value }
    }

    /// Label printed before the value; literals print bare
    pub fn label(&self) -> Option<&str> {
        self.expression
            .as_deref()
            .filter(|expr| !is_literal(expr))
    }
}

/// Build the output block. `context` is empty when call context is off.
pub fn layout(
    prefix: &str,
    context: &str,
    pairs: &[ArgumentPair],
    width: usize,
    format: &dyn Fn(&Value) -> String,
) -> String {
    let formatted: Vec<(Option<&str>, String)> = pairs
        .iter()
        .map(|pair| (pair.label(), format(&pair.value)))
        .collect();

    let pair_strs: Vec<String> = formatted
        .iter()
        .map(|(label, value)| match label {
            Some(label) => format!("{}: {}", label, value),
            None => value.clone(),
        })
        .collect();

    let one_line = pair_strs.join(PAIR_DELIMITER);
    let multiline_args = one_line.lines().count() > 1;
    let delimiter = if context.is_empty() { "" } else { CONTEXT_DELIMITER };
    let all_pairs = format!("{}{}{}{}", prefix, context, delimiter, one_line);
    let first_line_too_long = all_pairs.lines().next().unwrap_or("").chars().count() > width;

    if !(multiline_args || first_line_too_long) {
        return all_pairs;
    }

    if !context.is_empty() {
        let indent = " ".repeat(prefix.chars().count());
        let mut lines = vec![format!("{}{}", prefix, context)];
        lines.extend(
            formatted
                .iter()
                .map(|(label, value)| format_pair(&indent, *label, value)),
        );
        lines.join("\n")
    } else {
        let arg_lines: Vec<String> = formatted
            .iter()
            .map(|(label, value)| format_pair("", *label, value))
            .collect();
        prefix_first_line_indent_remaining(prefix, &arg_lines.join("\n")).join("\n")
    }
}

/// One pair in multi-line mode. The label's lines are aligned under
/// `prefix`; the value continues on the label's last line.
pub fn format_pair(prefix: &str, label: Option<&str>, value: &str) -> String {
    let (mut lines, value_prefix) = match label {
        Some(label) => {
            let mut label_lines = prefix_first_line_indent_remaining(prefix, label);
            let last = label_lines.pop().unwrap_or_default();
            (label_lines, format!("{}: ", last))
        }
        None => (Vec::new(), prefix.to_string()),
    };

    let value = if looks_like_string(value) {
        prefix_lines(" ", value, 1).join("\n")
    } else {
        value.to_string()
    };

    lines.extend(prefix_first_line_indent_remaining(&value_prefix, &value));
    lines.join("\n")
}

/// Quoted on both ends with the same quote char
fn looks_like_string(value: &str) -> bool {
    match (value.chars().next(), value.chars().last()) {
        (Some(first), Some(last)) => first == last && (first == '\'' || first == '"'),
        _ => false,
    }
}

/// Prefix every line from `start_at` on
pub fn prefix_lines(prefix: &str, text: &str, start_at: usize) -> Vec<String> {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i >= start_at {
                format!("{}{}", prefix, line)
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// `prefix` on the first line, matching-width spaces on the rest
pub fn prefix_first_line_indent_remaining(prefix: &str, text: &str) -> Vec<String> {
    let indent = " ".repeat(prefix.chars().count());
    let mut lines = prefix_lines(&indent, text, 1);
    match lines.first_mut() {
        Some(first) => first.insert_str(0, prefix),
        None => lines.push(prefix.to_string()),
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use lit_formatter::{FormatterRegistry, Inspect};

    fn pair(expr: &str, value: impl Inspect) -> ArgumentPair {
        ArgumentPair::new(Some(expr.to_string()), value.inspect())
    }

    fn run(prefix: &str, context: &str, pairs: &[ArgumentPair], width: usize) -> String {
        let registry = FormatterRegistry::new();
        layout(prefix, context, pairs, width, &|v| registry.format(v))
    }

    #[test]
    fn test_single_line_with_context() {
        let out = run(
            "LIT| ",
            "[main.rs:3 in g()]",
            &[pair("x", 10), pair("y", 20)],
            70,
        );
        assert_eq!(out, "LIT| [main.rs:3 in g()] >>> x: 10, y: 20");
    }

    #[test]
    fn test_literals_and_unknown_expressions_print_bare() {
        let out = run(
            "LIT| ",
            "",
            &[
                pair("42", 42),
                pair("\"s\"", "s"),
                ArgumentPair::new(None, 7.inspect()),
                pair("n", 42),
            ],
            70,
        );
        assert_eq!(out, "LIT| 42, 's', 7, n: 42");
    }

    #[test]
    fn test_width_boundary() {
        // "p| " + "v: " + value: 6 chars of overhead
        let fits = "a".repeat(62);
        let out = run("p| ", "", &[pair("v", fits.as_str())], 70);
        assert_eq!(out.chars().count(), 70);
        assert!(!out.contains('\n'));

        let over = "a".repeat(63);
        let out = run("p| ", "", &[pair("v", over.as_str()), pair("w", 1)], 70);
        assert_eq!(out, format!("p| v: '{}'\n   w: 1", over));
    }

    #[test]
    fn test_multiline_with_context_aligns_under_prefix() {
        let out = run(
            "LIT| ",
            "[a.rs:1 in f()]",
            &[pair("xs", vec![1, 2, 3, 4, 5, 6]), pair("n", 1)],
            70,
        );
        assert_eq!(
            out,
            "LIT| [a.rs:1 in f()]\n     xs: [\n           1\n           2\n           3\n           4\n           5\n           6\n         ]\n     n: 1"
        );
    }

    #[test]
    fn test_multiline_string_values_shift_continuations() {
        let out = run("LIT| ", "", &[pair("s", "line1\nline2")], 70);
        assert_eq!(out, "LIT| s: '''line1\n         line2'''");
    }

    #[test]
    fn test_multiline_label() {
        let lines = format_pair("  ", Some("foo(\n  1)"), "3");
        assert_eq!(lines, "  foo(\n    1): 3");
    }

    #[test]
    fn test_prefix_helpers() {
        assert_eq!(prefix_lines("> ", "a\nb\nc", 1), vec!["a", "> b", "> c"]);
        assert_eq!(
            prefix_first_line_indent_remaining("ab", "x\ny"),
            vec!["abx", "  y"]
        );
        assert_eq!(prefix_first_line_indent_remaining("ab", ""), vec!["ab"]);
        assert!(looks_like_string("'x'"));
        assert!(!looks_like_string("'x\""));
    }
}
