// Built-in formatters for strings, collections, errors, bytes and types

use crate::registry::{FormatContext, FormatError, FormatterRegistry, ValueFormatter};
use crate::value::{quote, short_type_name, type_display_name, Kind, Value};
use std::sync::Arc;

/// Register every built-in formatter on `registry`
pub fn install(registry: &FormatterRegistry) {
    registry.register(Kind::Str, Arc::new(StrFormatter));
    registry.register(Kind::Map, Arc::new(MapFormatter));
    registry.register(Kind::List, Arc::new(SeqFormatter::list()));
    registry.register(Kind::Tuple, Arc::new(SeqFormatter::tuple()));
    registry.register(Kind::Set, Arc::new(SetFormatter));
    registry.register(Kind::Error, Arc::new(ErrorFormatter));
    registry.register(Kind::Bytes, Arc::new(BytesFormatter));
    registry.register(Kind::Type, Arc::new(TypeFormatter));
    registry.register(Kind::Variant, Arc::new(VariantFormatter));
}

/// `'text'` with backslashes doubled, or `'''text'''` for multi-line text
pub fn format_str(text: &str) -> String {
    if text.contains('\n') {
        format!("'''{}'''", text)
    } else {
        format!("'{}'", text.replace('\\', "\\\\"))
    }
}

/// Indent every line after the first
fn indent_continuation(text: &str, indent: &str) -> String {
    text.replace('\n', &format!("\n{}", indent))
}

/// Handler used when nothing registered matches
pub struct DefaultFormatter;

impl ValueFormatter for DefaultFormatter {
    fn format(&self, value: &Value, ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        let text = match value {
            Value::Str(s) => format_str(s),
            Value::Object {
                compact, pretty, ..
            } => {
                let chosen = if compact.chars().count() > ctx.config().pretty_width {
                    pretty
                } else {
                    compact
                };
                // Escaped newlines inside Debug output become real ones
                chosen.replace("\\n", "\n")
            }
            other => other.repr(),
        };
        Ok(text)
    }
}

pub struct StrFormatter;

impl ValueFormatter for StrFormatter {
    fn can_handle(&self, value: &Value) -> bool {
        matches!(value, Value::Str(_))
    }

    fn format(&self, value: &Value, _ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        Ok(format_str(&value.display_key()))
    }
}

/// Maps: inline when small and flat, else one sorted entry per line
pub struct MapFormatter;

impl MapFormatter {
    fn layout(
        entries: &[(Value, Value)],
        ctx: &FormatContext<'_>,
    ) -> Result<String, FormatError> {
        if entries.is_empty() {
            return Ok("{}".to_string());
        }

        if entries.len() <= ctx.config().inline_map_items
            && entries.iter().all(|(k, v)| k.is_scalar() && v.is_scalar())
        {
            let items: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                .collect();
            return Ok(format!("{{ {} }}", items.join(", ")));
        }

        let mut sorted: Vec<&(Value, Value)> = entries.iter().collect();
        sorted.sort_by_cached_key(|(k, _)| k.display_key());

        let mut lines = Vec::with_capacity(sorted.len());
        for (k, v) in sorted {
            let formatted = ctx.format(v)?;
            lines.push(format!("  {}: {}", k.repr(), indent_continuation(&formatted, "    ")));
        }

        Ok(format!("{{\n{}\n}}", lines.join("\n")))
    }
}

impl ValueFormatter for MapFormatter {
    fn can_handle(&self, value: &Value) -> bool {
        matches!(value, Value::Map(_))
    }

    fn format(&self, value: &Value, ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        let Value::Map(entries) = value else {
            return Ok(value.repr());
        };
        if entries.len() > ctx.config().max_map_items {
            return Ok(value.placeholder());
        }

        match Self::layout(entries, ctx) {
            Ok(text) => Ok(text),
            Err(err) => {
                log::debug!("map layout failed ({}), trying JSON", err);
                Ok(value
                    .to_json()
                    .and_then(|json| {
                        serde_json::to_string_pretty(&json)
                            .map_err(|e| FormatError::Json(e.to_string()))
                    })
                    .unwrap_or_else(|_| value.placeholder()))
            }
        }
    }
}

/// Lists and tuples
pub struct SeqFormatter {
    kind: Kind,
    open: &'static str,
    close: &'static str,
}

impl SeqFormatter {
    pub fn list() -> Self {
        Self {
            kind: Kind::List,
            open: "[",
            close: "]",
        }
    }

    pub fn tuple() -> Self {
        Self {
            kind: Kind::Tuple,
            open: "(",
            close: ")",
        }
    }

    fn layout(&self, items: &[Value], ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        match items {
            [] => return Ok(format!("{}{}", self.open, self.close)),
            [single] if self.kind == Kind::Tuple => {
                return Ok(format!("({},)", ctx.format(single)?));
            }
            _ => {}
        }

        if items.len() <= ctx.config().inline_seq_items && items.iter().all(Value::is_scalar) {
            let inline: Vec<String> = items.iter().map(Value::repr).collect();
            return Ok(format!("{}{}{}", self.open, inline.join(", "), self.close));
        }

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let formatted = ctx.format(item)?;
            lines.push(format!("  {}", indent_continuation(&formatted, "  ")));
        }

        Ok(format!("{}\n{}\n{}", self.open, lines.join("\n"), self.close))
    }

    fn limit(&self, ctx: &FormatContext<'_>) -> usize {
        match self.kind {
            Kind::Tuple => ctx.config().max_tuple_items,
            _ => ctx.config().max_list_items,
        }
    }
}

impl ValueFormatter for SeqFormatter {
    fn can_handle(&self, value: &Value) -> bool {
        matches!(value, Value::List(_) | Value::Tuple(_))
    }

    fn format(&self, value: &Value, ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        let (Value::List(items) | Value::Tuple(items)) = value else {
            return Ok(value.repr());
        };
        if items.len() > self.limit(ctx) {
            return Ok(value.placeholder());
        }

        Ok(self
            .layout(items, ctx)
            .unwrap_or_else(|_| value.placeholder()))
    }
}

/// Sets, sorted by element text
pub struct SetFormatter;

impl ValueFormatter for SetFormatter {
    fn can_handle(&self, value: &Value) -> bool {
        matches!(value, Value::Set(_))
    }

    fn format(&self, value: &Value, ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        let Value::Set(items) = value else {
            return Ok(value.repr());
        };
        if items.len() > ctx.config().max_set_items {
            return Ok(value.placeholder());
        }

        let mut sorted: Vec<&Value> = items.iter().collect();
        sorted.sort_by_cached_key(|item| item.display_key());

        let formatted: Result<Vec<String>, FormatError> =
            sorted.into_iter().map(|item| ctx.format(item)).collect();
        let Ok(formatted) = formatted else {
            return Ok(value.placeholder());
        };

        if items.len() <= ctx.config().inline_set_items {
            Ok(format!("{{{}}}", formatted.join(", ")))
        } else {
            Ok(format!("{{\n  {}\n}}", formatted.join(",\n  ")))
        }
    }
}

/// `<TypeName: message>`
pub struct ErrorFormatter;

impl ValueFormatter for ErrorFormatter {
    fn format(&self, value: &Value, _ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        match value {
            Value::Error { type_name, message } => {
                Ok(format!("<{}: {}>", short_type_name(type_name), message))
            }
            other => Ok(other.repr()),
        }
    }
}

/// Short UTF-8 bytes as `b'..'`, everything else as a length placeholder
pub struct BytesFormatter;

impl ValueFormatter for BytesFormatter {
    fn format(&self, value: &Value, ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        let Value::Bytes(data) = value else {
            return Ok(value.repr());
        };
        if data.len() > ctx.config().max_bytes_len {
            return Ok(value.placeholder());
        }

        Ok(match std::str::from_utf8(data) {
            Ok(text) => format!("b'{}'", text),
            Err(_) => value.placeholder(),
        })
    }
}

/// `<class 'String'>` for std types, `<class 'app::Point'>` for the rest
pub struct TypeFormatter;

impl ValueFormatter for TypeFormatter {
    fn format(&self, value: &Value, _ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        Ok(match value {
            Value::Type { path } => format!("<class {}>", quote(&type_display_name(path))),
            other => other.repr(),
        })
    }
}

/// `Some(x)`, `Ok(x)`, `Err(x)` with the payload formatted recursively
pub struct VariantFormatter;

impl ValueFormatter for VariantFormatter {
    fn format(&self, value: &Value, ctx: &FormatContext<'_>) -> Result<String, FormatError> {
        match value {
            Value::Variant { name, value } => Ok(format!("{}({})", name, ctx.format(value)?)),
            other => Ok(other.repr()),
        }
    }
}
