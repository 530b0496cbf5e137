// lit-lexer - Lossless Rust source tokenizer
// Keeps trivia so spans map straight back onto the caller's source text

use logos::Logos;

pub mod literal;

pub use literal::is_literal;

/// Rust keywords that get keyword highlighting
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "super", "trait", "type", "unsafe", "use",
    "where", "while", "yield",
];

/// Identifiers that read as constants rather than names
const CONSTANTS: &[&str] = &["true", "false", "None", "Some", "Ok", "Err", "self", "Self"];

/// Scan to the closing quote of a raw string (`r"..."`, `r#"..."#`, `br##"..."##`)
fn raw_string(lex: &mut logos::Lexer<Token>) -> bool {
    let hashes = lex.slice().bytes().filter(|b| *b == b'#').count();
    let closing = format!("\"{}", "#".repeat(hashes));

    match lex.remainder().find(&closing) {
        Some(end) => {
            lex.bump(end + closing.len());
            true
        }
        None => false,
    }
}

/// Scan past a block comment opened by `/*`. Comments nest, so `/* a /* b */ c */`
/// is one token.
fn block_comment(lex: &mut logos::Lexer<Token>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;

    loop {
        match rest.get(i..i + 2) {
            Some(b"/*") => {
                depth += 1;
                i += 2;
            }
            Some(b"*/") => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    lex.bump(i);
                    return true;
                }
            }
            Some(_) => i += 1,
            None => return false,
        }
    }
}

/// Token types for Rust source. Trivia is kept (not skipped) so that every
/// byte of the input belongs to exactly one token.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    // --- Trivia ---
    #[regex(r"[ \t\f\r]+")]
    Whitespace,
    #[token("\n")]
    Newline,
    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,

    // --- Names ---
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"r#[A-Za-z_][A-Za-z0-9_]*")]
    RawIdent,
    #[regex(r"'[A-Za-z_][A-Za-z0-9_]*")]
    Lifetime,

    // --- Literals ---
    #[regex(r#"b?'([^'\\\n]|\\[nrt0\\'"]|\\x[0-9a-fA-F][0-9a-fA-F]|\\u\{[0-9a-fA-F]+\})'"#)]
    Char,
    #[regex(r#"[bc]?"([^"\\]|\\[^\r]|\\\r\n)*""#)]
    Str,
    #[regex(r##"[bc]?r#*""##, raw_string)]
    RawStr,
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9_]+)?(_?(u8|u16|u32|u64|u128|usize|i8|i16|i32|i64|i128|isize|f32|f64))?")]
    #[regex(r"0[xX][0-9a-fA-F_]+(_?(u8|u16|u32|u64|u128|usize|i8|i16|i32|i64|i128|isize))?")]
    #[regex(r"0[oO][0-7_]+(_?(u8|u16|u32|u64|u128|usize|i8|i16|i32|i64|i128|isize))?")]
    #[regex(r"0[bB][01_]+(_?(u8|u16|u32|u64|u128|usize|i8|i16|i32|i64|i128|isize))?")]
    Number,

    // --- Delimiters ---
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // --- Punctuation the call-site scanner cares about ---
    #[token("!")]
    Bang,
    #[token("::")]
    PathSep,
    #[token(":")]
    Colon,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("-")]
    Minus,

    // Everything else, one char at a time
    #[regex(r"[+*/%^&|=.@?~$#']")]
    Punct,
}

impl Token {
    /// Whitespace, newlines and comments
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment | Token::BlockComment
        )
    }

    /// Opening delimiter of a group
    pub fn is_open(self) -> bool {
        matches!(self, Token::LParen | Token::LBracket | Token::LBrace)
    }

    /// Closing delimiter of a group
    pub fn is_close(self) -> bool {
        matches!(self, Token::RParen | Token::RBracket | Token::RBrace)
    }

    /// Matching closer for an opening delimiter
    pub fn closer(self) -> Option<Token> {
        match self {
            Token::LParen => Some(Token::RParen),
            Token::LBracket => Some(Token::RBracket),
            Token::LBrace => Some(Token::RBrace),
            _ => None,
        }
    }

    /// Semantic class used by highlighters; `text` is the token's source slice
    pub fn class(self, text: &str) -> TokenClass {
        match self {
            Token::Whitespace | Token::Newline => TokenClass::Whitespace,
            Token::LineComment | Token::BlockComment => TokenClass::Comment,
            Token::Ident | Token::RawIdent => {
                if KEYWORDS.contains(&text) {
                    TokenClass::Keyword
                } else if CONSTANTS.contains(&text) {
                    TokenClass::Constant
                } else if text.starts_with(|c: char| c.is_ascii_uppercase()) {
                    TokenClass::Type
                } else {
                    TokenClass::Name
                }
            }
            Token::Lifetime => TokenClass::Lifetime,
            Token::Char | Token::Str | Token::RawStr => TokenClass::String,
            Token::Number => TokenClass::Number,
            Token::LParen
            | Token::RParen
            | Token::LBracket
            | Token::RBracket
            | Token::LBrace
            | Token::RBrace
            | Token::Comma
            | Token::Semicolon
            | Token::Colon
            | Token::PathSep => TokenClass::Punctuation,
            Token::Bang | Token::Lt | Token::Gt | Token::Minus | Token::Punct => {
                TokenClass::Operator
            }
        }
    }
}

/// Coarse token classes a style provider maps to colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenClass {
    Whitespace,
    Comment,
    Keyword,
    Constant,
    Type,
    Name,
    Lifetime,
    String,
    Number,
    Punctuation,
    Operator,
    /// Bytes the lexer could not classify
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

impl TokenSpan {
    /// Source slice covered by this token
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.clone()).unwrap_or("")
    }
}

pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }

    /// Tokens that are not trivia, stopping at the first lex error
    pub fn significant(source: &'source str) -> Result<Vec<TokenSpan>, LexError> {
        Lexer::new(source)
            .filter(|t| t.as_ref().map_or(true, |t| !t.token.is_trivia()))
            .collect()
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<TokenSpan, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let span = self.inner.span();

        match token {
            Ok(tok) => Some(Ok(TokenSpan { token: tok, span })),
            Err(_) => Some(Err(LexError::InvalidToken { span })),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Invalid token at {span:?}")]
    InvalidToken { span: std::ops::Range<usize> },
}

impl LexError {
    pub fn span(&self) -> std::ops::Range<usize> {
        match self {
            LexError::InvalidToken { span } => span.clone(),
        }
    }
}
