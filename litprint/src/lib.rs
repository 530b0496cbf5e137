// litprint - Debug printing with source-aware labels
// `lit!(x)` prints `LIT| [main.rs:4 in run()] >>> x: 42` and returns `x`

pub mod debugger;
pub mod error;
pub mod extract;
pub mod layout;
mod macros;
pub mod source;
pub mod traceback;

pub use debugger::{
    format_context, format_time, lit, litprint, Debugger, DebuggerConfig, OutputSink, Overrides,
    Prefix, TerminalScope, ValueFormatFn, DEFAULT_PREFIX, DISABLE_ENV, NO_SOURCE_WARNING,
};
pub use error::{LitError, Result};
pub use extract::{dedent, extract_all, extract_text};
pub use layout::{layout, ArgumentPair, CONTEXT_DELIMITER, DEFAULT_LINE_WRAP_WIDTH, PAIR_DELIMITER};
pub use source::{
    ArgNode, CallNode, CallSite, Frame, IntrospectingLocator, NoSourceLocator, SourceCache,
    SourceLocator, SourceUnavailable,
};
pub use traceback::{install, uninstall, TracebackOptions};

pub use lit_diagnostics::{StyleProvider, Theme};
pub use lit_formatter::{
    Bytes, FnFormatter, FormatConfig, FormatContext, FormatError, FormatterRegistry, Inspect,
    Kind, Settings, TypeKey, Value, ValueFormatter,
};

#[doc(hidden)]
pub mod __private {
    use lit_formatter::{Inspect, Value};
    use std::error::Error;
    use std::fmt::Debug;

    pub struct Wrap<'a, T: ?Sized>(pub &'a T);

    // Method lookup on `&&Wrap` tries `&&Wrap`, then `&&&Wrap`, then `&Wrap`,
    // so the impls below are picked in that order.

    pub trait ViaInspect {
        fn __lit_value(&self) -> Value;
    }

    impl<T: Inspect + ?Sized> ViaInspect for &Wrap<'_, T> {
        fn __lit_value(&self) -> Value {
            self.0.inspect()
        }
    }

    pub trait ViaError {
        fn __lit_value(&self) -> Value;
    }

    impl<T: Error + ?Sized> ViaError for &&Wrap<'_, T> {
        fn __lit_value(&self) -> Value {
            Value::error(self.0)
        }
    }

    pub trait ViaDebug {
        fn __lit_value(&self) -> Value;
    }

    impl<T: Debug + ?Sized> ViaDebug for Wrap<'_, T> {
        fn __lit_value(&self) -> Value {
            Value::object(self.0)
        }
    }

    /// `crate::outer::inner::__f` -> `inner`
    pub fn function_name(path: &'static str) -> &'static str {
        let mut path = path.strip_suffix("::__f").unwrap_or(path);
        while let Some(stripped) = path.strip_suffix("::{{closure}}") {
            path = stripped;
        }
        match path.rsplit_once("::") {
            Some((_, name)) => name,
            None => "<module>",
        }
    }
}
