// Syntax highlighting through the lit-lexer token stream

use crate::style::StyleProvider;
use lit_lexer::{Lexer, TokenClass};

/// Colourize `source` token by token. Bytes the lexer rejects are painted
/// with the provider's `Error` style, so the output text (minus escape
/// codes) is always identical to the input.
pub fn highlight(source: &str, provider: &dyn StyleProvider) -> String {
    let mut out = String::with_capacity(source.len() * 2);

    for token in Lexer::new(source) {
        let (class, span) = match token {
            Ok(tok) => {
                let text = tok.text(source);
                (tok.token.class(text), tok.span)
            }
            Err(err) => (TokenClass::Error, err.span()),
        };
        let text = source.get(span).unwrap_or("");

        match class {
            // Escape codes around newlines confuse some terminals
            TokenClass::Whitespace => out.push_str(text),
            _ => out.push_str(&provider.style(class).paint(text).to_string()),
        }
    }

    out
}

/// Remove ANSI escape sequences (used for width measurements)
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI: parameters then a final byte in @..~
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        } else {
            out.push(ch);
        }
    }

    out
}
