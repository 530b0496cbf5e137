// lit-formatter - Value model and type-keyed display formatting
// Provides the formatter registry used by the debug printer

pub mod builtins;
pub mod config;
pub mod registry;
pub mod value;

pub use config::{FormatConfig, Settings, SETTINGS_FILE};
pub use registry::{
    panic_message, FnFormatter, FormatContext, FormatError, FormatterRegistry, ValueFormatter,
};
pub use value::{
    short_type_name, type_display_name, Bytes, Inspect, Kind, TypeKey, Value, MAX_INSPECT_ITEMS,
};

/// Format a value with the process-wide registry
pub fn format_value(value: &Value) -> String {
    FormatterRegistry::global().format(value)
}

/// Format anything implementing [`Inspect`] with default settings
pub fn format_with_defaults<T: Inspect + ?Sized>(value: &T) -> String {
    format_value(&value.inspect())
}
