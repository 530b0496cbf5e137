// Type-keyed formatter dispatch

use crate::builtins;
use crate::config::FormatConfig;
use crate::value::{TypeKey, Value};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Errors raised while formatting a value. The registry recovers from all
/// of them; they only surface through [`FormatterRegistry::try_format`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("value nested deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("formatter for `{key}` panicked: {message}")]
    Panicked { key: String, message: String },

    #[error("cannot encode value as JSON: {0}")]
    Json(String),

    #[error("{0}")]
    Custom(String),
}

/// Turns one value into display text
pub trait ValueFormatter: Send + Sync {
    /// Second-stage filter after the type key matched
    fn can_handle(&self, _value: &Value) -> bool {
        true
    }

    fn format(&self, value: &Value, ctx: &FormatContext<'_>) -> Result<String, FormatError>;
}

/// Formatter backed by a plain function
pub struct FnFormatter<F>(pub F);

impl<F> ValueFormatter for FnFormatter<F>
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn format(&self, value: &Value, _ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        Ok((self.0)(value))
    }
}

/// Passed to formatters so nested values go back through the registry
pub struct FormatContext<'a> {
    registry: &'a FormatterRegistry,
    depth: usize,
}

impl<'a> FormatContext<'a> {
    pub fn config(&self) -> &FormatConfig {
        &self.registry.config
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Format a nested value one level deeper
    pub fn format(&self, value: &Value) -> Result<String, FormatError> {
        self.registry.format_at(value, self.depth + 1)
    }
}

type Table = HashMap<TypeKey, Arc<dyn ValueFormatter>>;

/// Formatter lookup table with copy-on-write updates. Readers take a
/// snapshot `Arc`; writers clone the table, modify it and swap it in.
pub struct FormatterRegistry {
    table: RwLock<Arc<Table>>,
    fallback: Arc<dyn ValueFormatter>,
    config: FormatConfig,
}

static GLOBAL: OnceLock<Arc<FormatterRegistry>> = OnceLock::new();

impl FormatterRegistry {
    /// Registry with the built-in formatters and default thresholds
    pub fn new() -> Self {
        Self::with_config(FormatConfig::default())
    }

    pub fn with_config(config: FormatConfig) -> Self {
        let registry = Self::empty(config);
        builtins::install(&registry);
        registry
    }

    /// Only the default handler; nothing registered
    pub fn empty(config: FormatConfig) -> Self {
        Self {
            table: RwLock::new(Arc::new(HashMap::new())),
            fallback: Arc::new(builtins::DefaultFormatter),
            config,
        }
    }

    /// Process-wide registry, created on first use
    pub fn global() -> Arc<FormatterRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(FormatterRegistry::new()))
            .clone()
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Register a formatter, returning the one it replaces
    pub fn register(
        &self,
        key: impl Into<TypeKey>,
        formatter: Arc<dyn ValueFormatter>,
    ) -> Option<Arc<dyn ValueFormatter>> {
        let key = key.into();
        log::debug!("registering formatter for `{}`", key);
        self.update(|table| table.insert(key, formatter))
    }

    /// Register a closure as formatter
    pub fn register_fn<F>(&self, key: impl Into<TypeKey>, f: F) -> Option<Arc<dyn ValueFormatter>>
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.register(key, Arc::new(FnFormatter(f)))
    }

    pub fn unregister(&self, key: impl Into<TypeKey>) -> Option<Arc<dyn ValueFormatter>> {
        let key = key.into();
        self.update(|table| table.remove(&key))
    }

    pub fn is_registered(&self, key: &TypeKey) -> bool {
        self.snapshot().contains_key(key)
    }

    /// Formatter that will handle `value`
    pub fn resolve(&self, value: &Value) -> Arc<dyn ValueFormatter> {
        let table = self.snapshot();
        value
            .type_chain()
            .iter()
            .filter_map(|key| table.get(key))
            .find(|formatter| formatter.can_handle(value))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Format `value`, degrading to a placeholder on any failure
    pub fn format(&self, value: &Value) -> String {
        match self.try_format(value) {
            Ok(text) => text,
            Err(err) => {
                log::debug!("formatting {:?} failed: {}", value.kind(), err);
                value.placeholder()
            }
        }
    }

    pub fn try_format(&self, value: &Value) -> Result<String, FormatError> {
        self.format_at(value, 0)
    }

    fn format_at(&self, value: &Value, depth: usize) -> Result<String, FormatError> {
        if depth > self.config.max_depth {
            return Err(FormatError::TooDeep {
                max: self.config.max_depth,
            });
        }

        let formatter = self.resolve(value);
        let ctx = FormatContext {
            registry: self,
            depth,
        };

        catch_unwind(AssertUnwindSafe(|| formatter.format(value, &ctx))).unwrap_or_else(
            |payload| {
                Err(FormatError::Panicked {
                    key: value
                        .type_chain()
                        .first()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    message: panic_message(payload.as_ref()),
                })
            },
        )
    }

    fn snapshot(&self) -> Arc<Table> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut Table) -> R) -> R {
        let mut guard = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let mut table = (**guard).clone();
        let result = f(&mut table);
        *guard = Arc::new(table);
        result
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.snapshot();
        let mut keys: Vec<String> = table.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("FormatterRegistry")
            .field("registered", &keys)
            .field("config", &self.config)
            .finish()
    }
}

/// Text of a panic payload (`&str` or `String`)
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
