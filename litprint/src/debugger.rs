// The debug printer: configuration, formatting and output

use crate::error::{LitError, Result};
use crate::extract::extract_all;
use crate::layout::{layout, ArgumentPair, DEFAULT_LINE_WRAP_WIDTH};
use crate::source::{CallSite, Frame, IntrospectingLocator, SourceLocator, SourceUnavailable};
use lit_diagnostics::{highlight, StyleProvider, Theme};
use lit_formatter::{FormatterRegistry, Settings, Value};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Printed once per call whose source could not be read
pub const NO_SOURCE_WARNING: &str = "Failed to access the underlying source code for analysis. \
    Was the binary moved away from its sources, or did the source code change after compilation?";

/// Default line prefix
pub const DEFAULT_PREFIX: &str = "LIT| ";

/// Environment variable that starts the global printers disabled
pub const DISABLE_ENV: &str = "LITPRINT_DISABLE";

pub type ValueFormatFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;
pub type OutputFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Line prefix: fixed text or computed per call
#[derive(Clone)]
pub enum Prefix {
    Static(String),
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Prefix {
    pub fn dynamic(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Prefix::Dynamic(Arc::new(f))
    }

    pub fn resolve(&self) -> String {
        match self {
            Prefix::Static(text) => text.clone(),
            Prefix::Dynamic(f) => f(),
        }
    }
}

impl From<&str> for Prefix {
    fn from(text: &str) -> Self {
        Prefix::Static(text.to_string())
    }
}

impl From<String> for Prefix {
    fn from(text: String) -> Self {
        Prefix::Static(text)
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Prefix::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Enables ANSI processing on Windows consoles while alive
pub struct TerminalScope {
    _private: (),
}

impl TerminalScope {
    pub fn enter() -> Self {
        #[cfg(windows)]
        {
            let _ = colored::control::set_virtual_terminal(true);
        }
        Self { _private: () }
    }
}

impl Drop for TerminalScope {
    fn drop(&mut self) {
        #[cfg(windows)]
        {
            let _ = colored::control::set_virtual_terminal(false);
        }
    }
}

/// Where formatted output goes
#[derive(Clone)]
pub enum OutputSink {
    /// stderr, syntax highlighted when `colorize` is set
    Stderr {
        colorize: bool,
        theme: Arc<dyn StyleProvider>,
    },
    Function(OutputFn),
}

impl OutputSink {
    pub fn stderr(theme: impl StyleProvider + 'static) -> Self {
        OutputSink::Stderr {
            colorize: true,
            theme: Arc::new(theme),
        }
    }

    pub fn plain_stderr() -> Self {
        OutputSink::Stderr {
            colorize: false,
            theme: Arc::new(Theme::monochrome()),
        }
    }

    pub fn function(f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        OutputSink::Function(Arc::new(f))
    }

    pub fn write(&self, text: &str) {
        match self {
            OutputSink::Stderr { colorize, theme } => {
                let text = if *colorize {
                    highlight(text, theme.as_ref())
                } else {
                    text.to_string()
                };
                let _scope = TerminalScope::enter();
                let mut stderr = std::io::stderr().lock();
                let _ = writeln!(stderr, "{}", text);
            }
            OutputSink::Function(f) => f(text),
        }
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        OutputSink::stderr(Theme::default())
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Stderr { colorize, .. } => f
                .debug_struct("Stderr")
                .field("colorize", colorize)
                .finish_non_exhaustive(),
            OutputSink::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Everything that shapes one debugger's output
#[derive(Clone)]
pub struct DebuggerConfig {
    pub prefix: Prefix,
    pub output: OutputSink,
    /// Replaces the registry for turning values into text
    pub value_formatter: Option<ValueFormatFn>,
    pub include_context: bool,
    pub use_absolute_paths: bool,
    pub line_wrap_width: usize,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            prefix: Prefix::from(DEFAULT_PREFIX),
            output: OutputSink::default(),
            value_formatter: None,
            include_context: false,
            use_absolute_paths: false,
            line_wrap_width: DEFAULT_LINE_WRAP_WIDTH,
        }
    }
}

impl fmt::Debug for DebuggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebuggerConfig")
            .field("prefix", &self.prefix)
            .field("output", &self.output)
            .field("value_formatter", &self.value_formatter.is_some())
            .field("include_context", &self.include_context)
            .field("use_absolute_paths", &self.use_absolute_paths)
            .field("line_wrap_width", &self.line_wrap_width)
            .finish()
    }
}

/// Partial update for [`Debugger::configure`]; unset fields keep their value
#[derive(Default)]
pub struct Overrides {
    pub prefix: Option<Prefix>,
    pub output: Option<OutputSink>,
    pub value_formatter: Option<ValueFormatFn>,
    pub include_context: Option<bool>,
    pub use_absolute_paths: Option<bool>,
    pub line_wrap_width: Option<usize>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<Prefix>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn output(mut self, output: OutputSink) -> Self {
        self.output = Some(output);
        self
    }

    pub fn value_formatter(mut self, f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        self.value_formatter = Some(Arc::new(f));
        self
    }

    pub fn include_context(mut self, on: bool) -> Self {
        self.include_context = Some(on);
        self
    }

    pub fn use_absolute_paths(mut self, on: bool) -> Self {
        self.use_absolute_paths = Some(on);
        self
    }

    pub fn line_wrap_width(mut self, width: usize) -> Self {
        self.line_wrap_width = Some(width);
        self
    }

    fn is_empty(&self) -> bool {
        self.prefix.is_none()
            && self.output.is_none()
            && self.value_formatter.is_none()
            && self.include_context.is_none()
            && self.use_absolute_paths.is_none()
            && self.line_wrap_width.is_none()
    }
}

/// Debug printer. Shared freely between threads.
pub struct Debugger {
    config: RwLock<DebuggerConfig>,
    enabled: AtomicBool,
    registry: Arc<FormatterRegistry>,
    locator: Arc<dyn SourceLocator>,
}

impl Debugger {
    pub fn new(config: DebuggerConfig) -> Self {
        Self {
            config: RwLock::new(config),
            enabled: AtomicBool::new(true),
            registry: FormatterRegistry::global(),
            locator: Arc::new(IntrospectingLocator::new()),
        }
    }

    /// Build from file settings; fails on an unknown theme name
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let theme = Theme::by_name(&settings.theme)?;
        let output = if settings.colorize {
            OutputSink::stderr(theme)
        } else {
            OutputSink::plain_stderr()
        };

        let config = DebuggerConfig {
            prefix: Prefix::from(settings.prefix.as_str()),
            output,
            value_formatter: None,
            include_context: settings.include_context.unwrap_or(true),
            use_absolute_paths: settings.use_absolute_paths,
            line_wrap_width: settings.line_wrap_width,
        };

        let mut debugger = Self::new(config);
        if settings.format != *debugger.registry.config() {
            debugger.registry = Arc::new(FormatterRegistry::with_config(settings.format.clone()));
        }
        debugger.set_enabled(settings.enabled);
        Ok(debugger)
    }

    pub fn with_registry(mut self, registry: Arc<FormatterRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn SourceLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn registry(&self) -> &Arc<FormatterRegistry> {
        &self.registry
    }

    pub fn enable(&self) {
        self.set_enabled(true);
    }

    pub fn disable(&self) {
        self.set_enabled(false);
    }

    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> DebuggerConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply the set fields of `overrides`
    pub fn configure(&self, overrides: Overrides) -> Result<()> {
        if overrides.is_empty() {
            return Err(LitError::NothingToConfigure);
        }

        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(prefix) = overrides.prefix {
            config.prefix = prefix;
        }
        if let Some(output) = overrides.output {
            config.output = output;
        }
        if let Some(f) = overrides.value_formatter {
            config.value_formatter = Some(f);
        }
        if let Some(on) = overrides.include_context {
            config.include_context = on;
        }
        if let Some(on) = overrides.use_absolute_paths {
            config.use_absolute_paths = on;
        }
        if let Some(width) = overrides.line_wrap_width {
            config.line_wrap_width = width;
        }
        Ok(())
    }

    /// Resolve the invocation `frame` points at
    pub fn call_site(&self, frame: &Frame) -> std::result::Result<CallSite, SourceUnavailable> {
        let node = self.locator.locate(frame)?;
        Ok(CallSite {
            frame: *frame,
            node: Some(node),
        })
    }

    /// Format one call without printing it, whether enabled or not
    pub fn format(&self, frame: &Frame, values: Vec<Value>) -> String {
        let config = self.config();
        let prefix = config.prefix.resolve();
        let context = if config.include_context {
            format_context(frame, config.use_absolute_paths)
        } else {
            String::new()
        };

        if values.is_empty() {
            let lead = if context.is_empty() {
                prefix.trim_end().to_string()
            } else {
                format!("{}{}", prefix, context)
            };
            return format!("{} at {}", lead, format_time());
        }

        let expressions = self.expressions(frame, values.len());
        let pairs: Vec<ArgumentPair> = expressions
            .into_iter()
            .zip(values)
            .map(|(expression, value)| ArgumentPair::new(expression, value))
            .collect();

        let registry = &self.registry;
        let format_value = |value: &Value| match &config.value_formatter {
            Some(f) => f(value),
            None => registry.format(value),
        };
        layout(
            &prefix,
            &context,
            &pairs,
            config.line_wrap_width,
            &format_value,
        )
    }

    /// Format and print, if enabled
    pub fn emit(&self, frame: &Frame, values: Vec<Value>) {
        if !self.is_enabled() {
            return;
        }
        let text = self.format(frame, values);
        let output = self.config().output;
        output.write(&text);
    }

    /// Argument texts, or all `None` with a single warning
    fn expressions(&self, frame: &Frame, count: usize) -> Vec<Option<String>> {
        let texts = self
            .call_site(frame)
            .and_then(|site| site.node.ok_or(SourceUnavailable::Disabled))
            .map(|node| extract_all(&node));

        match texts {
            Ok(texts) if texts.len() == count => texts.into_iter().map(Some).collect(),
            Ok(texts) => {
                log::warn!(
                    "{} [{}:{}: found {} argument(s) in source, got {} value(s)]",
                    NO_SOURCE_WARNING,
                    frame.file,
                    frame.line,
                    texts.len(),
                    count
                );
                vec![None; count]
            }
            Err(reason) => {
                log::warn!(
                    "{} [{}:{}: {}]",
                    NO_SOURCE_WARNING,
                    frame.file,
                    frame.line,
                    reason
                );
                vec![None; count]
            }
        }
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new(DebuggerConfig::default())
    }
}

impl fmt::Debug for Debugger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debugger")
            .field("enabled", &self.is_enabled())
            .field("config", &self.config())
            .finish_non_exhaustive()
    }
}

/// `[file:line in function()]`
pub fn format_context(frame: &Frame, absolute: bool) -> String {
    let file = if absolute {
        absolute_path(frame)
    } else {
        Path::new(frame.file)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| frame.file.to_string())
    };

    let function = if frame.function == "<module>" {
        frame.function.to_string()
    } else {
        format!("{}()", frame.function)
    };

    format!("[{}:{} in {}]", file, frame.line, function)
}

fn absolute_path(frame: &Frame) -> String {
    frame
        .candidate_paths()
        .iter()
        .find_map(|path| path.canonicalize().ok())
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| frame.file.to_string())
}

/// `HH:MM:SS.mmm`, local time
pub fn format_time() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

static LIT: OnceLock<Debugger> = OnceLock::new();
static LITPRINT: OnceLock<Debugger> = OnceLock::new();

/// Global printer behind `lit!`: call context always on
pub fn lit() -> &'static Debugger {
    LIT.get_or_init(|| global_debugger(&load_settings(), Global::Lit))
}

/// Global printer behind `litprint!`: call context off unless
/// `include_context` is set in `litprint.json`
pub fn litprint() -> &'static Debugger {
    LITPRINT.get_or_init(|| global_debugger(&load_settings(), Global::LitPrint))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Global {
    Lit,
    LitPrint,
}

fn load_settings() -> Settings {
    std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(Settings::from_dir)
        .unwrap_or_else(|err| {
            log::warn!("ignoring litprint settings: {:#}", err);
            Settings::default()
        })
}

fn global_debugger(settings: &Settings, which: Global) -> Debugger {
    let include_context = match which {
        Global::Lit => true,
        Global::LitPrint => settings.include_context.unwrap_or(false),
    };

    let debugger = Debugger::from_settings(settings).unwrap_or_else(|err| {
        log::warn!("{}; using defaults", err);
        Debugger::default()
    });

    {
        let mut config = debugger
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        config.include_context = include_context;
    }

    if std::env::var_os(DISABLE_ENV).map_or(false, |v| !v.is_empty()) {
        debugger.disable();
    }
    debugger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NoSourceLocator, SourceCache};
    use lit_formatter::Inspect;
    use std::sync::Mutex;

    fn capture() -> (OutputSink, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        let sink = OutputSink::function(move |text| {
            sink_lines.lock().unwrap().push(text.to_string());
        });
        (sink, lines)
    }

    fn debugger_for(source: &'static str, include_context: bool) -> (Debugger, Frame) {
        let cache = Arc::new(SourceCache::new());
        cache.insert("app/src/calc.rs", source);
        let config = DebuggerConfig {
            include_context,
            output: OutputSink::plain_stderr(),
            ..DebuggerConfig::default()
        };
        let debugger = Debugger::new(config)
            .with_registry(Arc::new(FormatterRegistry::new()))
            .with_locator(Arc::new(IntrospectingLocator::with_cache(cache)));
        let line = source.lines().position(|l| l.contains("lit!")).unwrap() + 1;
        let column = source.lines().nth(line - 1).unwrap().find("lit!").unwrap() + 1;
        let frame = Frame::new("app/src/calc.rs", line as u32, column as u32).with_function("g");
        (debugger, frame)
    }

    #[test]
    fn test_context_line() {
        let (debugger, frame) = debugger_for("fn g() {\n    lit!(x, y);\n}\n", true);
        let out = debugger.format(&frame, vec![10.inspect(), 20.inspect()]);
        assert_eq!(out, "LIT| [calc.rs:2 in g()] >>> x: 10, y: 20");
    }

    #[test]
    fn test_without_context() {
        let (debugger, frame) = debugger_for("fn g() {\n    lit!(x, 42);\n}\n", false);
        let out = debugger.format(&frame, vec![1.inspect(), 42.inspect()]);
        assert_eq!(out, "LIT| x: 1, 42");
    }

    #[test]
    fn test_zero_args_shows_time() {
        let (debugger, frame) = debugger_for("fn g() {\n    lit!();\n}\n", true);
        let out = debugger.format(&frame, vec![]);
        assert!(out.starts_with("LIT| [calc.rs:2 in g()] at "), "{}", out);
        assert!(!out.contains(">>>"));

        debugger
            .configure(Overrides::new().include_context(false))
            .unwrap();
        let out = debugger.format(&frame, vec![]);
        assert!(out.starts_with("LIT| at "), "{}", out);
    }

    #[test]
    fn test_configure_requires_something() {
        let debugger = Debugger::default();
        assert!(matches!(
            debugger.configure(Overrides::new()),
            Err(LitError::NothingToConfigure)
        ));
    }

    #[test]
    fn test_configure_prefix_and_formatter() {
        let (debugger, frame) = debugger_for("lit!(v)", false);
        debugger
            .configure(
                Overrides::new()
                    .prefix(Prefix::dynamic(|| "dyn> ".to_string()))
                    .value_formatter(|v| format!("<{}>", v.repr())),
            )
            .unwrap();
        assert_eq!(debugger.format(&frame, vec![3.inspect()]), "dyn> v: <3>");
    }

    #[test]
    fn test_emit_respects_enabled() {
        let (debugger, frame) = debugger_for("lit!(v)", false);
        let (sink, lines) = capture();
        debugger.configure(Overrides::new().output(sink)).unwrap();

        debugger.emit(&frame, vec![1.inspect()]);
        debugger.disable();
        debugger.emit(&frame, vec![2.inspect()]);
        debugger.enable();
        debugger.emit(&frame, vec![3.inspect()]);

        assert_eq!(*lines.lock().unwrap(), vec!["LIT| v: 1", "LIT| v: 3"]);
    }

    #[test]
    fn test_no_source_drops_labels() {
        let debugger = Debugger::new(DebuggerConfig::default())
            .with_locator(Arc::new(NoSourceLocator));
        let frame = Frame::new("gone.rs", 1, 1);
        assert_eq!(
            debugger.format(&frame, vec![1.inspect(), "a".inspect()]),
            "LIT| 1, 'a'"
        );
    }

    #[test]
    fn test_arity_mismatch_drops_labels() {
        let (debugger, frame) = debugger_for("lit!(a, b)", false);
        assert_eq!(debugger.format(&frame, vec![5.inspect()]), "LIT| 5");
    }

    #[test]
    fn test_format_context() {
        let frame = Frame::new("src/deep/mod.rs", 9, 1).with_function("run");
        assert_eq!(format_context(&frame, false), "[mod.rs:9 in run()]");

        let frame = Frame::new("src/main.rs", 1, 1);
        assert_eq!(format_context(&frame, false), "[main.rs:1 in <module>]");
    }

    #[test]
    fn test_from_settings_rejects_unknown_theme() {
        let settings = Settings {
            theme: "draculla".to_string(),
            ..Settings::default()
        };
        let err = Debugger::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("did you mean `dracula`"));
    }

    #[test]
    fn test_global_context_follows_settings() {
        let mut settings = Settings::default();
        assert!(global_debugger(&settings, Global::Lit).config().include_context);
        assert!(!global_debugger(&settings, Global::LitPrint).config().include_context);

        settings.include_context = Some(true);
        assert!(global_debugger(&settings, Global::LitPrint).config().include_context);

        settings.include_context = Some(false);
        assert!(global_debugger(&settings, Global::Lit).config().include_context);
        assert!(!global_debugger(&settings, Global::LitPrint).config().include_context);
    }

    #[test]
    fn test_from_settings_custom_thresholds() {
        let mut settings = Settings::default();
        settings.format.max_list_items = 2;
        settings.prefix = "> ".to_string();
        settings.include_context = Some(false);
        let debugger = Debugger::from_settings(&settings)
            .unwrap()
            .with_locator(Arc::new(NoSourceLocator));

        let out = debugger.format(&Frame::new("x.rs", 1, 1), vec![vec![1, 2, 3].inspect()]);
        assert_eq!(out, "> <list with 3 items>");
    }
}
