// Argument text as the caller wrote it

use crate::source::{ArgNode, CallNode};

/// Source text of one argument. Multi-line arguments keep their relative
/// indentation: the first line is padded back to its original column and
/// the common leading whitespace is removed from every line.
pub fn extract_text(arg: &ArgNode, source: &str) -> String {
    let raw = source.get(arg.span.clone()).unwrap_or("");

    let text = if raw.contains('\n') {
        let padded = format!("{}{}", " ".repeat(arg.start_column), raw);
        dedent(&padded)
    } else {
        raw.to_string()
    };

    text.trim().to_string()
}

/// Texts for every argument of `node`
pub fn extract_all(node: &CallNode) -> Vec<String> {
    node.args
        .iter()
        .map(|arg| extract_text(arg, &node.source))
        .collect()
}

/// Remove the longest whitespace prefix shared by all non-blank lines.
/// Blank lines are normalised to empty.
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(common_prefix);

    let Some(margin) = margin else {
        return text.lines().map(|_| "").collect::<Vec<_>>().join("\n");
    };

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((i, x), _)| i + x.len_utf8());
    &a[..len]
}
