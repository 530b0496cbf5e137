// Panic hook that prints a report with source context and tracked variables

use crate::debugger::{OutputSink, TerminalScope};
use crate::source::SourceCache;
use lit_diagnostics::report::{DEFAULT_EXTRA_LINES, DEFAULT_WIDTH};
use lit_diagnostics::{strip_ansi, FrameInfo, PanicReport, ReportOptions, Span, Theme};
use lit_formatter::{panic_message, FormatterRegistry, Value};
use std::cell::RefCell;
use std::io::Write;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// A panic hook as held by [`install`] and [`uninstall`]
pub type PreviousHook = Arc<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// How the panic report looks and where it goes
#[derive(Debug, Clone)]
pub struct TracebackOptions {
    pub theme: Theme,
    /// Lines of code shown either side of each location
    pub extra_lines: usize,
    /// Width of the rules between frames
    pub width: usize,
    pub show_library_source: bool,
    pub show_backtrace: bool,
    /// Include values recorded with `lit_track!`
    pub show_variables: bool,
    pub output: OutputSink,
}

impl Default for TracebackOptions {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            extra_lines: DEFAULT_EXTRA_LINES,
            width: DEFAULT_WIDTH,
            show_library_source: false,
            show_backtrace: true,
            show_variables: true,
            output: OutputSink::default(),
        }
    }
}

impl TracebackOptions {
    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            extra_lines: self.extra_lines,
            width: self.width,
            show_library_source: self.show_library_source,
        }
    }
}

/// The hook that was active before the first [`install`]
static ORIGINAL_HOOK: Mutex<Option<PreviousHook>> = Mutex::new(None);

thread_local! {
    static TRACKED: RefCell<Vec<(String, Value)>> = const { RefCell::new(Vec::new()) };
}

/// Replace the process panic hook with the report printer. Returns the hook
/// that was active before the first install; installing again swaps the
/// options but keeps that original.
pub fn install(options: TracebackOptions) -> PreviousHook {
    let mut original = ORIGINAL_HOOK.lock().unwrap_or_else(PoisonError::into_inner);

    let current: PreviousHook = Arc::from(std::panic::take_hook());
    let previous = original.get_or_insert(current).clone();

    std::panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        let report = capture(info, &options);
        write_report(&options.output, &render(&report, &options));
    }));
    log::debug!("panic report hook installed");

    previous
}

/// Restore the hook saved by [`install`]. False when nothing was installed.
pub fn uninstall() -> bool {
    let mut original = ORIGINAL_HOOK.lock().unwrap_or_else(PoisonError::into_inner);

    match original.take() {
        Some(hook) => {
            std::panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| hook(info)));
            log::debug!("panic report hook removed");
            true
        }
        None => false,
    }
}

/// Record `value` under `name` for reports raised on this thread
pub fn track(name: &str, value: Value) {
    TRACKED.with(|tracked| {
        let mut tracked = tracked.borrow_mut();
        match tracked.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => tracked.push((name.to_string(), value)),
        }
    });
}

/// Forget every value tracked on this thread
pub fn clear_tracked() {
    TRACKED.with(|tracked| tracked.borrow_mut().clear());
}

/// Values tracked on this thread, in recording order
pub fn tracked() -> Vec<(String, Value)> {
    TRACKED.with(|tracked| tracked.borrow().clone())
}

fn capture(info: &PanicHookInfo<'_>, options: &TracebackOptions) -> PanicReport {
    let location = info
        .location()
        .map(|loc| Span::new(loc.file().to_string(), loc.line() as usize, loc.column() as usize, 1));

    let frames = if options.show_backtrace {
        capture_frames()
    } else {
        Vec::new()
    };

    let variables = if options.show_variables {
        let registry = FormatterRegistry::global();
        tracked()
            .iter()
            .map(|(name, value)| (name.clone(), registry.format(value)))
            .collect()
    } else {
        Vec::new()
    };

    PanicReport {
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        thread: std::thread::current().name().map(str::to_string),
        message: panic_message(info.payload()),
        location,
        frames,
        variables,
    }
}

/// Render `report` as one block of (colored) text
pub fn render(report: &PanicReport, options: &TracebackOptions) -> String {
    report
        .render(&options.report_options(), &options.theme, &load_source)
        .join("\n")
}

fn write_report(output: &OutputSink, text: &str) {
    match output {
        OutputSink::Stderr { colorize, .. } => {
            let text = if *colorize {
                text.to_string()
            } else {
                strip_ansi(text)
            };
            let _scope = TerminalScope::enter();
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", text);
        }
        OutputSink::Function(f) => f(&strip_ansi(text)),
    }
}

fn load_source(file: &str) -> Option<String> {
    let file_path = Path::new(file);
    let mut candidates = vec![file_path.to_path_buf()];
    if let Some(dir) = std::env::var_os("CARGO_MANIFEST_DIR") {
        candidates.extend(PathBuf::from(dir).ancestors().map(|base| base.join(file_path)));
    }

    candidates
        .iter()
        .find(|path| path.is_file())
        .and_then(|path| SourceCache::global().load(path).ok())
        .map(|text| text.to_string())
}

/// Frames of the panic machinery itself
fn is_hook_frame(function: &str) -> bool {
    const INTERNAL: &[&str] = &[
        "backtrace::",
        "std::backtrace",
        "std::panicking",
        "std::panic::",
        "std::sys::backtrace",
        "core::panicking",
        "rust_begin_unwind",
        "litprint::traceback::capture",
        "litprint::traceback::install",
        "<alloc::boxed::Box<F,A> as core::ops::function::Fn",
    ];
    INTERNAL.iter().any(|prefix| function.starts_with(prefix))
}

/// Resolve the current stack, outermost frame first
pub fn capture_frames() -> Vec<FrameInfo> {
    let trace = backtrace::Backtrace::new();
    let symbols = trace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .map(|symbol| {
            // `{:#}` drops the trailing symbol hash
            let function = symbol
                .name()
                .map(|name| format!("{:#}", name))
                .unwrap_or_else(|| "<unknown>".to_string());
            let span = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => Some(Span::new(
                    file.display().to_string(),
                    line as usize,
                    symbol.colno().unwrap_or(1) as usize,
                    1,
                )),
                _ => None,
            };
            (function, span)
        })
        .collect();

    user_frames(symbols)
}

/// Turn resolved symbols (innermost first) into report frames, outermost
/// first. Symbols without a source location and the panic machinery are
/// skipped.
pub fn user_frames(symbols: Vec<(String, Option<Span>)>) -> Vec<FrameInfo> {
    let mut frames: Vec<FrameInfo> = symbols
        .into_iter()
        .filter(|(function, span)| span.is_some() && !is_hook_frame(function))
        .map(|(function, span)| FrameInfo::new(function, span))
        .collect();
    frames.reverse();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use lit_formatter::Inspect;

    fn at(file: &str, line: usize) -> Option<Span> {
        Some(Span::new(file.to_string(), line, 5, 1))
    }

    fn sym(function: &str, span: Option<Span>) -> (String, Option<Span>) {
        (function.to_string(), span)
    }

    #[test]
    fn test_user_frames() {
        let std_src = "/rustc/abc/library/std/src";
        let symbols = vec![
            sym("backtrace::backtrace::trace", at("/cargo/backtrace/src/lib.rs", 9)),
            sym("litprint::traceback::capture", at("./litprint/src/traceback.rs", 120)),
            sym(
                "std::panicking::rust_panic_with_hook",
                at(&format!("{}/panicking.rs", std_src), 820),
            ),
            sym("app::parse", at("./src/main.rs", 12)),
            sym("app::main", at("./src/main.rs", 4)),
            sym(
                "core::ops::function::FnOnce::call_once",
                at("/rustc/abc/library/core/src/ops/function.rs", 250),
            ),
            sym("__libc_start_main", None),
            sym("_start", None),
        ];

        let frames = user_frames(symbols);
        let names: Vec<&str> = frames.iter().map(|f| f.function.as_str()).collect();
        assert_eq!(
            names,
            vec!["core::ops::function::FnOnce::call_once", "app::main", "app::parse"]
        );
        assert!(frames[0].is_library);
        assert!(!frames[2].is_library);
        assert_eq!(frames[2].span, at("./src/main.rs", 12));
    }

    #[test]
    fn test_captured_frames_include_caller() {
        let frames = capture_frames();
        assert!(frames
            .iter()
            .any(|f| f.function.ends_with("test_captured_frames_include_caller")));
        assert!(frames.iter().all(|f| !f.function.starts_with("backtrace::")));
        assert!(frames.iter().all(|f| f.span.is_some()));
    }

    #[test]
    fn test_tracking_is_per_thread() {
        clear_tracked();
        track("a", 1.inspect());
        track("b", "x".inspect());
        track("a", 2.inspect());
        assert_eq!(
            tracked(),
            vec![
                ("a".to_string(), Value::Int(2)),
                ("b".to_string(), Value::Str("x".to_string())),
            ]
        );

        let other = std::thread::spawn(tracked).join().unwrap();
        assert!(other.is_empty());

        clear_tracked();
        assert!(tracked().is_empty());
    }

    #[test]
    fn test_render_without_source() {
        let report = PanicReport {
            timestamp: "2026-01-01 00:00:00".to_string(),
            thread: Some("main".to_string()),
            message: "boom".to_string(),
            location: Some(Span::new("missing/file.rs".to_string(), 3, 1, 1)),
            frames: Vec::new(),
            variables: vec![("n".to_string(), "3".to_string())],
        };
        let text = strip_ansi(&render(&report, &TracebackOptions::default()));
        assert!(text.starts_with("Panic captured at 2026-01-01 00:00:00"));
        assert!(text.contains("panicked in thread 'main': boom"));
        assert!(text.contains("File \"missing/file.rs\", line 3"));
        assert!(text.contains("[Source code not available]"));
        assert!(text.contains("Variables:"));
    }
}
