// Call-site capture and source lookup for macro invocations

use dashmap::DashMap;
use lit_diagnostics::Span;
use lit_lexer::{Lexer, Token};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Where a debug macro was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// `file!()`: relative to the workspace root for local crates
    pub file: &'static str,
    pub line: u32,
    /// `column!()`: 1-based, counted in chars
    pub column: u32,
    pub module_path: &'static str,
    /// Innermost named function, or `<module>` outside any function
    pub function: &'static str,
    pub manifest_dir: Option<&'static str>,
}

impl Frame {
    pub fn new(file: &'static str, line: u32, column: u32) -> Self {
        Self {
            file,
            line,
            column,
            module_path: "",
            function: "<module>",
            manifest_dir: None,
        }
    }

    pub fn with_function(mut self, function: &'static str) -> Self {
        self.function = function;
        self
    }

    pub fn with_manifest_dir(mut self, dir: &'static str) -> Self {
        self.manifest_dir = Some(dir);
        self
    }

    /// Paths worth trying for `file`, in order
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        let file = Path::new(self.file);
        if file.is_absolute() {
            return vec![file.to_path_buf()];
        }

        let mut paths = vec![file.to_path_buf()];
        if let Some(dir) = self.manifest_dir {
            // Workspace members see `file!()` relative to the workspace root
            paths.extend(Path::new(dir).ancestors().map(|base| base.join(file)));
        }
        paths
    }
}

/// One argument of a located invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgNode {
    /// Byte range in the source file, trivia trimmed
    pub span: Range<usize>,
    /// Char column (0-based) of the argument's first char
    pub start_column: usize,
}

/// A macro invocation found in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallNode {
    pub path: PathBuf,
    pub source: Arc<str>,
    /// Whole invocation, path through closing delimiter
    pub span: Range<usize>,
    /// Macro path as written, e.g. `lit` or `litprint::lit`
    pub callee: String,
    pub args: Vec<ArgNode>,
}

/// Everything known about one invocation
#[derive(Debug, Clone)]
pub struct CallSite {
    pub frame: Frame,
    pub node: Option<CallNode>,
}

impl CallSite {
    pub fn source_available(&self) -> bool {
        self.node.is_some()
    }
}

/// Why no call node could be produced
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceUnavailable {
    #[error("source file `{file}` not found")]
    NotFound { file: String },

    #[error("cannot read `{file}`: {reason}")]
    Unreadable { file: String, reason: String },

    #[error("{file}:{line}:{column} is outside the source file")]
    OutOfRange {
        file: String,
        line: u32,
        column: u32,
    },

    #[error("no macro invocation at {0} (source changed since compilation?)")]
    NoInvocation(Span),

    #[error("unbalanced delimiters in invocation at {0}")]
    Unbalanced(Span),

    #[error("source lookup disabled")]
    Disabled,
}

/// Finds the invocation a [`Frame`] points at
pub trait SourceLocator: Send + Sync {
    fn locate(&self, frame: &Frame) -> Result<CallNode, SourceUnavailable>;
}

/// Source files read so far, keyed by resolved path. Each file is read
/// once per process.
#[derive(Debug, Default)]
pub struct SourceCache {
    files: DashMap<PathBuf, Arc<str>>,
}

static GLOBAL_CACHE: OnceLock<Arc<SourceCache>> = OnceLock::new();

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<SourceCache> {
        GLOBAL_CACHE
            .get_or_init(|| Arc::new(SourceCache::new()))
            .clone()
    }

    /// Cached text of `path`, reading it on first use
    pub fn load(&self, path: &Path) -> std::io::Result<Arc<str>> {
        if let Some(text) = self.files.get(path) {
            return Ok(text.clone());
        }

        log::debug!("source cache miss: {}", path.display());
        let text: Arc<str> = std::fs::read_to_string(path)?.into();
        self.files.insert(path.to_path_buf(), text.clone());
        Ok(text)
    }

    /// Provide text for `path` without touching the filesystem
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<Arc<str>>) {
        self.files.insert(path.into(), text.into());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn invalidate(&self, path: &Path) {
        self.files.remove(path);
    }

    pub fn clear(&self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Reads the caller's source and re-parses the invocation
#[derive(Debug, Clone)]
pub struct IntrospectingLocator {
    cache: Arc<SourceCache>,
}

impl IntrospectingLocator {
    pub fn new() -> Self {
        Self::with_cache(SourceCache::global())
    }

    pub fn with_cache(cache: Arc<SourceCache>) -> Self {
        Self { cache }
    }

    fn read(&self, frame: &Frame) -> Result<(PathBuf, Arc<str>), SourceUnavailable> {
        let candidates = frame.candidate_paths();

        for path in &candidates {
            if self.cache.contains(path) || path.is_file() {
                return self
                    .cache
                    .load(path)
                    .map(|text| (path.clone(), text))
                    .map_err(|err| SourceUnavailable::Unreadable {
                        file: path.display().to_string(),
                        reason: err.to_string(),
                    });
            }
        }

        Err(SourceUnavailable::NotFound {
            file: frame.file.to_string(),
        })
    }
}

impl Default for IntrospectingLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLocator for IntrospectingLocator {
    fn locate(&self, frame: &Frame) -> Result<CallNode, SourceUnavailable> {
        let (path, source) = self.read(frame)?;

        let offset = byte_offset(&source, frame.line, frame.column).ok_or_else(|| {
            SourceUnavailable::OutOfRange {
                file: frame.file.to_string(),
                line: frame.line,
                column: frame.column,
            }
        })?;

        let (mut span, mut callee, mut args) = parse_invocation(&source, offset, frame.file)?;
        if !is_debug_macro(&callee) {
            // Inside another macro, `column!()` points at the outer invocation
            if let [start] = nested_debug_invocations(&source, span.clone()).as_slice() {
                (span, callee, args) = parse_invocation(&source, *start, frame.file)?;
            }
        }
        Ok(CallNode {
            path,
            source,
            span,
            callee,
            args,
        })
    }
}

/// Always reports [`SourceUnavailable::Disabled`]; for stripped builds
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSourceLocator;

impl SourceLocator for NoSourceLocator {
    fn locate(&self, _frame: &Frame) -> Result<CallNode, SourceUnavailable> {
        Err(SourceUnavailable::Disabled)
    }
}

/// Macros whose arguments are debug expressions
pub const DEBUG_MACROS: &[&str] = &["lit", "litprint", "lit_with", "lit_format"];

fn is_debug_macro(callee: &str) -> bool {
    let name = callee.rsplit("::").next().unwrap_or(callee);
    DEBUG_MACROS.contains(&name)
}

/// Start offsets of debug macro names invoked within `range`
fn nested_debug_invocations(source: &str, range: Range<usize>) -> Vec<usize> {
    let tokens: Vec<Tok> = significant_tokens(source, range.start)
        .into_iter()
        .take_while(|t| t.span.end <= range.end)
        .collect();

    tokens
        .windows(2)
        .filter(|pair| {
            pair[0].token == Some(Token::Ident)
                && pair[1].token == Some(Token::Bang)
                && source
                    .get(pair[0].span.clone())
                    .map_or(false, |name| DEBUG_MACROS.contains(&name))
        })
        .map(|pair| pair[0].span.start)
        .collect()
}

/// Byte offset of a 1-based line and char column
pub fn byte_offset(source: &str, line: u32, column: u32) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }

    let mut start = 0;
    for _ in 1..line {
        start += source.get(start..)?.find('\n')? + 1;
    }

    let text = source.get(start..)?;
    let text = text.split('\n').next().unwrap_or("");
    text.char_indices()
        .nth(column as usize - 1)
        .map(|(idx, _)| start + idx)
}

/// Char column (0-based) of byte `offset`
pub fn column_of(source: &str, offset: usize) -> usize {
    let before = source.get(..offset).unwrap_or("");
    match before.rfind('\n') {
        Some(pos) => before[pos + 1..].chars().count(),
        None => before.chars().count(),
    }
}

/// Token at the byte level, errors folded in as opaque tokens
#[derive(Debug, Clone)]
struct Tok {
    token: Option<Token>,
    span: Range<usize>,
}

fn significant_tokens(source: &str, offset: usize) -> Vec<Tok> {
    let rest = source.get(offset..).unwrap_or("");
    Lexer::new(rest)
        .filter_map(|item| match item {
            Ok(t) if t.token.is_trivia() => None,
            Ok(t) => Some(Tok {
                token: Some(t.token),
                span: t.span.start + offset..t.span.end + offset,
            }),
            Err(err) => {
                let span = err.span();
                Some(Tok {
                    token: None,
                    span: span.start + offset..span.end + offset,
                })
            }
        })
        .collect()
}

/// Parse `path ! ( args )` starting at `offset`
fn parse_invocation(
    source: &str,
    offset: usize,
    file: &str,
) -> Result<(Range<usize>, String, Vec<ArgNode>), SourceUnavailable> {
    let here = |at: usize| Span::from_file_and_span(file, source, at..at + 1);
    let no_invocation = || SourceUnavailable::NoInvocation(here(offset));

    let tokens = significant_tokens(source, offset);
    let mut pos = 0;

    // Macro path: `::`? ident (`::` ident)*
    let path_start = pos;
    if matches!(tokens.first().and_then(|t| t.token), Some(Token::PathSep)) {
        pos += 1;
    }
    loop {
        match tokens.get(pos).and_then(|t| t.token) {
            Some(Token::Ident) | Some(Token::RawIdent) => pos += 1,
            _ => return Err(no_invocation()),
        }
        if tokens.get(pos).and_then(|t| t.token) == Some(Token::PathSep) {
            pos += 1;
        } else {
            break;
        }
    }
    let callee: String = tokens[path_start..pos]
        .iter()
        .map(|t| source.get(t.span.clone()).unwrap_or(""))
        .collect();

    if tokens.get(pos).and_then(|t| t.token) != Some(Token::Bang) {
        return Err(no_invocation());
    }
    pos += 1;

    let open = tokens.get(pos).ok_or_else(no_invocation)?;
    if !open.token.map_or(false, Token::is_open) {
        return Err(no_invocation());
    }
    let group_start = open.span.start;
    pos += 1;

    let mut stack: Vec<Token> = open.token.and_then(Token::closer).into_iter().collect();
    let mut angle_depth = 0usize;
    let mut args: Vec<Range<usize>> = Vec::new();
    let mut current: Option<Range<usize>> = None;

    while let Some(tok) = tokens.get(pos) {
        let prev = pos.checked_sub(1).and_then(|p| tokens.get(p));
        let top_level = stack.len() == 1 && angle_depth == 0;

        match tok.token {
            Some(t) if t.is_open() => {
                if let Some(close) = t.closer() {
                    stack.push(close);
                }
            }
            Some(t) if t.is_close() => {
                if stack.last() != Some(&t) {
                    return Err(SourceUnavailable::Unbalanced(here(tok.span.start)));
                }
                stack.pop();
                if stack.is_empty() {
                    if let Some(arg) = current.take() {
                        args.push(arg);
                    }
                    let span = tokens[0].span.start..tok.span.end;
                    let args = args
                        .into_iter()
                        .map(|span| ArgNode {
                            start_column: column_of(source, span.start),
                            span,
                        })
                        .collect();
                    log::trace!("invocation `{}!` at byte {}", callee, group_start);
                    return Ok((span, callee, args));
                }
            }
            Some(Token::Lt) if prev.and_then(|p| p.token) == Some(Token::PathSep) => {
                angle_depth += 1;
            }
            Some(Token::Lt) if angle_depth > 0 => angle_depth += 1,
            Some(Token::Gt) if angle_depth > 0 => {
                // `->` and `=>` inside generics are not closers
                let arrow = prev.map_or(false, |p| {
                    p.span.end == tok.span.start
                        && matches!(source.get(p.span.clone()), Some("-") | Some("="))
                });
                if !arrow {
                    angle_depth -= 1;
                }
            }
            Some(Token::Comma) if top_level => {
                if let Some(arg) = current.take() {
                    args.push(arg);
                }
                pos += 1;
                continue;
            }
            Some(Token::Semicolon) if top_level => {
                // `lit_with!(&debugger; args)`: only what follows counts
                args.clear();
                current = None;
                pos += 1;
                continue;
            }
            _ => {}
        }

        current = Some(match current {
            Some(range) => range.start..tok.span.end,
            None => tok.span.clone(),
        });
        pos += 1;
    }

    Err(SourceUnavailable::Unbalanced(here(group_start)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate_in(source: &str, line: u32, column: u32) -> Result<CallNode, SourceUnavailable> {
        let cache = Arc::new(SourceCache::new());
        cache.insert("virtual/src/lib.rs", source);
        let locator = IntrospectingLocator::with_cache(cache);
        locator.locate(&Frame::new("virtual/src/lib.rs", line, column))
    }

    fn arg_texts(node: &CallNode) -> Vec<&str> {
        node.args
            .iter()
            .map(|a| &node.source[a.span.clone()])
            .collect()
    }

    #[test]
    fn test_simple_invocation() {
        let node = locate_in("fn f() {\n    lit!(a, b + 1);\n}\n", 2, 5).unwrap();
        assert_eq!(node.callee, "lit");
        assert_eq!(arg_texts(&node), vec!["a", "b + 1"]);
        assert_eq!(node.args[1].start_column, 12);
    }

    #[test]
    fn test_nested_commas_and_trailing_comma() {
        let src = "litprint::lit!(foo(1, 2), [3, 4], { let x = (5, 6); x }, Vec::<(u8, u8)>::new(),);";
        let node = locate_in(src, 1, 1).unwrap();
        assert_eq!(node.callee, "litprint::lit");
        assert_eq!(
            arg_texts(&node),
            vec![
                "foo(1, 2)",
                "[3, 4]",
                "{ let x = (5, 6); x }",
                "Vec::<(u8, u8)>::new()",
            ]
        );
    }

    #[test]
    fn test_column_picks_invocation() {
        let src = "let p = (lit!(a), lit!(b, c));";
        let first = locate_in(src, 1, 10).unwrap();
        let second = locate_in(src, 1, 19).unwrap();
        assert_eq!(arg_texts(&first), vec!["a"]);
        assert_eq!(arg_texts(&second), vec!["b", "c"]);
    }

    #[test]
    fn test_zero_args_and_comments() {
        let node = locate_in("lit!( /* nothing */ );", 1, 1).unwrap();
        assert!(node.args.is_empty());

        let node = locate_in("lit!(\n    x, // first\n    y\n)", 1, 1).unwrap();
        assert_eq!(arg_texts(&node), vec!["x", "y"]);
    }

    #[test]
    fn test_block_comments_stay_out_of_labels() {
        let node = locate_in("lit!(x /* n */, y)", 1, 1).unwrap();
        assert_eq!(arg_texts(&node), vec!["x", "y"]);

        let node = locate_in("lit!(a, /* trailing */)", 1, 1).unwrap();
        assert_eq!(arg_texts(&node), vec!["a"]);

        let node = locate_in("lit!(/* a /* nested */ b */ v)", 1, 1).unwrap();
        assert_eq!(arg_texts(&node), vec!["v"]);
    }

    #[test]
    fn test_debugger_prefix_skipped() {
        let node = locate_in("lit_with!(&dbg; left, right)", 1, 1).unwrap();
        assert_eq!(arg_texts(&node), vec!["left", "right"]);
    }

    #[test]
    fn test_invocation_inside_other_macro() {
        let node = locate_in("assert_eq!(lit!(a, b), (1, 2));", 1, 1).unwrap();
        assert_eq!(node.callee, "lit");
        assert_eq!(arg_texts(&node), vec!["a", "b"]);

        // Ambiguous: the outer invocation is kept
        let node = locate_in("assert_eq!(lit!(a), lit!(b));", 1, 1).unwrap();
        assert_eq!(node.callee, "assert_eq");
    }

    #[test]
    fn test_turbofish_arrows() {
        let node = locate_in("lit!(f::<fn() -> u8>(g), 2)", 1, 1).unwrap();
        assert_eq!(arg_texts(&node), vec!["f::<fn() -> u8>(g)", "2"]);
    }

    #[test]
    fn test_failures() {
        assert!(matches!(
            locate_in("let x = 1;", 1, 9),
            Err(SourceUnavailable::NoInvocation(_))
        ));
        assert!(matches!(
            locate_in("lit!(a, (b", 1, 1),
            Err(SourceUnavailable::Unbalanced(_))
        ));
        assert!(matches!(
            locate_in("lit!(a]", 1, 1),
            Err(SourceUnavailable::Unbalanced(_))
        ));
        assert!(matches!(
            locate_in("lit!(a)", 3, 1),
            Err(SourceUnavailable::OutOfRange { .. })
        ));
        assert_eq!(
            NoSourceLocator.locate(&Frame::new("x.rs", 1, 1)),
            Err(SourceUnavailable::Disabled)
        );
    }

    #[test]
    fn test_missing_file() {
        let locator = IntrospectingLocator::with_cache(Arc::new(SourceCache::new()));
        let err = locator
            .locate(&Frame::new("does/not/exist.rs", 1, 1))
            .unwrap_err();
        assert_eq!(
            err,
            SourceUnavailable::NotFound {
                file: "does/not/exist.rs".to_string()
            }
        );
    }

    #[test]
    fn test_candidate_paths_walk_manifest_ancestors() {
        let frame = Frame::new("crate/src/lib.rs", 1, 1).with_manifest_dir("/ws/crate");
        assert_eq!(
            frame.candidate_paths(),
            vec![
                PathBuf::from("crate/src/lib.rs"),
                PathBuf::from("/ws/crate/crate/src/lib.rs"),
                PathBuf::from("/ws/crate/src/lib.rs"),
                PathBuf::from("/crate/src/lib.rs"),
            ]
        );

        let absolute = Frame::new("/abs/main.rs", 1, 1).with_manifest_dir("/ws");
        assert_eq!(absolute.candidate_paths(), vec![PathBuf::from("/abs/main.rs")]);
    }

    #[test]
    fn test_byte_offset_counts_chars() {
        let src = "é = 1;\n  ééx";
        assert_eq!(byte_offset(src, 1, 1), Some(0));
        assert_eq!(byte_offset(src, 2, 5), Some(src.find('x').unwrap()));
        assert_eq!(byte_offset(src, 2, 9), None);
        assert_eq!(column_of(src, src.find('x').unwrap()), 4);
    }
}
