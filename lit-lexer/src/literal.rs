// Literal detection for argument expressions
//
// An expression is literal when it is built only from literal tokens:
// numbers (optionally negated), strings, chars, `true`/`false`/`None`,
// and parenthesised tuples or bracketed arrays of those.

use crate::{Lexer, Token, TokenSpan};

/// Returns true if `text` is a literal expression such as `42`, `-1.5`,
/// `"hi"`, `(1, 'a')` or `[true, false]`.
pub fn is_literal(text: &str) -> bool {
    let tokens = match Lexer::significant(text) {
        Ok(tokens) => tokens,
        Err(_) => return false,
    };
    if tokens.is_empty() {
        return false;
    }

    let mut parser = LiteralParser {
        source: text,
        tokens: &tokens,
        pos: 0,
    };
    parser.literal() && parser.pos == tokens.len()
}

struct LiteralParser<'a> {
    source: &'a str,
    tokens: &'a [TokenSpan],
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn peek(&self) -> Option<&TokenSpan> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek().map(|t| t.token) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn literal(&mut self) -> bool {
        let Some(current) = self.peek().cloned() else {
            return false;
        };

        match current.token {
            Token::Number | Token::Str | Token::RawStr | Token::Char => {
                self.pos += 1;
                true
            }
            Token::Minus => {
                self.pos += 1;
                self.eat(Token::Number)
            }
            Token::Ident => {
                let word = current.text(self.source);
                if matches!(word, "true" | "false" | "None") {
                    self.pos += 1;
                    true
                } else {
                    false
                }
            }
            Token::LParen => {
                self.pos += 1;
                self.sequence(Token::RParen)
            }
            Token::LBracket => {
                self.pos += 1;
                self.sequence(Token::RBracket)
            }
            _ => false,
        }
    }

    /// Comma separated literals up to `close`, trailing comma allowed
    fn sequence(&mut self, close: Token) -> bool {
        loop {
            if self.eat(close) {
                return true;
            }
            if !self.literal() {
                return false;
            }
            if self.eat(close) {
                return true;
            }
            if !self.eat(Token::Comma) {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_literals() {
        assert!(is_literal("42"));
        assert!(is_literal("-7"));
        assert!(is_literal("3.5e2"));
        assert!(is_literal("\"hello\""));
        assert!(is_literal("r#\"raw\"#"));
        assert!(is_literal("'c'"));
        assert!(is_literal("true"));
        assert!(is_literal("None"));
    }

    #[test]
    fn test_compound_literals() {
        assert!(is_literal("(1, 2)"));
        assert!(is_literal("()"));
        assert!(is_literal("[1, 2, 3,]"));
        assert!(is_literal("[(1, \"a\"), (2, \"b\")]"));
        assert!(is_literal("  ( 1 )  "));
    }

    #[test]
    fn test_expressions_are_not_literal() {
        assert!(!is_literal("x"));
        assert!(!is_literal("1 + 2"));
        assert!(!is_literal("-x"));
        assert!(!is_literal("vec![1, 2]"));
        assert!(!is_literal("Some(1)"));
        assert!(!is_literal("[x, 1]"));
        assert!(!is_literal("(1, 2"));
        assert!(!is_literal(""));
    }
}
