// Owned value model: what a debug-printed argument looks like once captured

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::BuildHasher;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

/// Collections longer than this are not copied by [`Inspect`]; they become
/// [`Value::Elided`] and always print as a size placeholder.
pub const MAX_INSPECT_ITEMS: usize = 1000;

/// Snapshot of a runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i128),
    UInt(u128),
    Float(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    /// `Some(..)`, `Ok(..)`, `Err(..)`
    Variant { name: String, value: Box<Value> },
    Error { type_name: String, message: String },
    Type { path: String },
    /// Anything only known through `Debug`
    Object {
        type_name: String,
        compact: String,
        pretty: String,
    },
    /// Collection too large to copy; only its kind and length are kept
    Elided { kind: Kind, len: usize },
}

/// Structural kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    None,
    Bool,
    Int,
    Float,
    Char,
    Str,
    Bytes,
    List,
    Tuple,
    Set,
    Map,
    Variant,
    Error,
    Type,
    Object,
}

impl Kind {
    /// Name used in `<name with N items>` placeholders
    pub fn placeholder_name(self) -> &'static str {
        match self {
            Kind::None => "none",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Char => "char",
            Kind::Str => "str",
            Kind::Bytes => "bytes",
            Kind::List => "list",
            Kind::Tuple => "tuple",
            Kind::Set => "set",
            Kind::Map => "dict",
            Kind::Variant => "variant",
            Kind::Error => "error",
            Kind::Type => "type",
            Kind::Object => "object",
        }
    }
}

/// Registry key: a structural kind or a concrete Rust type path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Kind(Kind),
    Named(String),
}

impl TypeKey {
    /// Key for values captured from `T` (objects and errors)
    pub fn named<T: ?Sized>() -> Self {
        TypeKey::Named(std::any::type_name::<T>().to_string())
    }
}

impl From<Kind> for TypeKey {
    fn from(kind: Kind) -> Self {
        TypeKey::Kind(kind)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeKey::Kind(kind) => write!(f, "{:?}", kind),
            TypeKey::Named(name) => write!(f, "{}", name),
        }
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::None => Kind::None,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) | Value::UInt(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Char(_) => Kind::Char,
            Value::Str(_) => Kind::Str,
            Value::Bytes(_) => Kind::Bytes,
            Value::List(_) => Kind::List,
            Value::Tuple(_) => Kind::Tuple,
            Value::Set(_) => Kind::Set,
            Value::Map(_) => Kind::Map,
            Value::Variant { .. } => Kind::Variant,
            Value::Error { .. } => Kind::Error,
            Value::Type { .. } => Kind::Type,
            Value::Object { .. } => Kind::Object,
            Value::Elided { kind, .. } => *kind,
        }
    }

    /// Concrete type path, when the value was captured from a named type
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Error { type_name, .. } | Value::Object { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// Registry lookup order, most specific first
    pub fn type_chain(&self) -> Vec<TypeKey> {
        let mut chain = Vec::with_capacity(2);
        if let Some(name) = self.type_name() {
            chain.push(TypeKey::Named(name.to_string()));
        }
        chain.push(TypeKey::Kind(self.kind()));
        chain
    }

    /// Plain numbers, strings, chars and booleans
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::UInt(_)
                | Value::Float(_)
                | Value::Char(_)
                | Value::Str(_)
        )
    }

    /// Item count for collections
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Bytes(b) => Some(b.len()),
            Value::List(v) | Value::Tuple(v) | Value::Set(v) => Some(v.len()),
            Value::Map(m) => Some(m.len()),
            Value::Elided { len, .. } => Some(*len),
            _ => None,
        }
    }

    /// Size-bounded stand-in used when full formatting is refused or fails
    pub fn placeholder(&self) -> String {
        match (self, self.len()) {
            (value, Some(n)) if value.kind() == Kind::Bytes => format!("<bytes of length {}>", n),
            (_, Some(n)) => format!("<{} with {} items>", self.kind().placeholder_name(), n),
            _ => self.repr(),
        }
    }

    /// Compact source-like representation. Strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => format!("{:?}", f),
            Value::Char(c) => quote(&c.to_string()),
            Value::Str(s) => quote(s),
            Value::Bytes(b) => format!("b{}", quote(&String::from_utf8_lossy(b))),
            Value::List(items) => format!("[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_repr(items)),
            Value::Set(items) => format!("{{{}}}", join_repr(items)),
            Value::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Variant { name, value } => format!("{}({})", name, value.repr()),
            Value::Error { type_name, message } => {
                format!("<{}: {}>", short_type_name(type_name), message)
            }
            Value::Type { path } => format!("<class {}>", quote(&type_display_name(path))),
            Value::Object { compact, .. } => compact.clone(),
            Value::Elided { .. } => self.placeholder(),
        }
    }

    /// Unquoted text form, used as the sort key for maps and sets
    pub fn display_key(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Char(c) => c.to_string(),
            other => other.repr(),
        }
    }

    /// Structured JSON form (keys stringified, sorted by serde_json's map)
    pub fn to_json(&self) -> Result<serde_json::Value, crate::FormatError> {
        use serde_json::Value as Json;

        Ok(match self {
            Value::None => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => match i64::try_from(*i) {
                Ok(n) => Json::from(n),
                Err(_) => Json::String(i.to_string()),
            },
            Value::UInt(u) => match u64::try_from(*u) {
                Ok(n) => Json::from(n),
                Err(_) => Json::String(u.to_string()),
            },
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| crate::FormatError::Json(format!("{} is not representable", f)))?,
            Value::Char(c) => Json::String(c.to_string()),
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => Json::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Map(entries) => {
                let mut map = serde_json::Map::new();
                for (k, v) in entries {
                    map.insert(k.display_key(), v.to_json()?);
                }
                Json::Object(map)
            }
            other => Json::String(other.repr()),
        })
    }

    /// Value of an error: `<TypeName: message>`
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Value::Error {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
        }
    }

    /// Raw bytes, shown as `b'..'` when they are short UTF-8. Wrap a value
    /// in [`Bytes`] to get this from the debug macros.
    pub fn bytes(data: impl AsRef<[u8]>) -> Self {
        let data = data.as_ref();
        if data.len() > MAX_INSPECT_ITEMS {
            return Value::elided(Kind::Bytes, data.len());
        }
        Value::Bytes(data.to_vec())
    }

    /// Placeholder for a collection of `len` items that was not copied
    pub fn elided(kind: Kind, len: usize) -> Self {
        Value::Elided { kind, len }
    }

    /// The type `T` itself
    pub fn type_of<T: ?Sized>() -> Self {
        Value::Type {
            path: std::any::type_name::<T>().to_string(),
        }
    }

    /// Any `Debug` value, keeping both compact and pretty renderings. A
    /// panicking `Debug` impl yields `<TypeName repr failed>` instead.
    pub fn object<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        let type_name = std::any::type_name::<T>();
        let rendered = catch_unwind(AssertUnwindSafe(|| {
            (format!("{:?}", value), format!("{:#?}", value))
        }));

        let (compact, pretty) = rendered.unwrap_or_else(|payload| {
            log::debug!(
                "Debug impl of {} panicked: {}",
                type_name,
                crate::registry::panic_message(payload.as_ref())
            );
            let failed = format!("<{} repr failed>", short_type_name(type_name));
            (failed.clone(), failed)
        });

        Value::Object {
            type_name: type_name.to_string(),
            compact,
            pretty,
        }
    }
}

/// `alloc::string::String` -> `String`, `a::b::Err<T>` -> `Err`
pub fn short_type_name(path: &str) -> &str {
    let base = path.split('<').next().unwrap_or(path);
    base.rsplit("::").next().unwrap_or(base)
}

/// Type path as shown to users. Paths into the standard library lose their
/// module prefix, so `alloc::vec::Vec<alloc::string::String>` reads
/// `Vec<String>`; user paths are kept whole.
pub fn type_display_name(path: &str) -> String {
    const STD_ROOTS: &[&str] = &["core::", "alloc::", "std::"];

    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while !rest.is_empty() {
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        let (segment, tail) = rest.split_at(end);
        if STD_ROOTS.iter().any(|root| segment.starts_with(root)) {
            out.push_str(segment.rsplit("::").next().unwrap_or(segment));
        } else {
            out.push_str(segment);
        }

        let mut chars = tail.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

/// Quote like a source literal: single quotes unless the text holds a
/// single quote and no double quote
pub(crate) fn quote(text: &str) -> String {
    let delim = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(delim);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

/// Conversion into a [`Value`]. Types without an impl are still printable
/// through `Debug`.
pub trait Inspect {
    fn inspect(&self) -> Value;
}

/// Marks a byte buffer for `b'..'` display instead of a list of numbers
///
/// `lit!(Bytes(b"abc"))` prints `b'abc'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bytes<T: AsRef<[u8]>>(pub T);

impl<T: AsRef<[u8]>> Inspect for Bytes<T> {
    fn inspect(&self) -> Value {
        Value::bytes(&self.0)
    }
}

/// Copy at most [`MAX_INSPECT_ITEMS`] items; longer collections keep only
/// their length
fn inspect_items<'a, T: Inspect + 'a>(
    kind: Kind,
    len: usize,
    items: impl Iterator<Item = &'a T>,
    wrap: fn(Vec<Value>) -> Value,
) -> Value {
    if len > MAX_INSPECT_ITEMS {
        return Value::elided(kind, len);
    }
    wrap(items.map(Inspect::inspect).collect())
}

macro_rules! inspect_int {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(impl Inspect for $t {
            fn inspect(&self) -> Value {
                Value::$variant(*self as $wide)
            }
        })*
    };
}

inspect_int!(Int as i128: i8, i16, i32, i64, i128, isize);
inspect_int!(UInt as u128: u8, u16, u32, u64, u128, usize);

impl Inspect for f32 {
    fn inspect(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl Inspect for f64 {
    fn inspect(&self) -> Value {
        Value::Float(*self)
    }
}

impl Inspect for bool {
    fn inspect(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Inspect for char {
    fn inspect(&self) -> Value {
        Value::Char(*self)
    }
}

impl Inspect for str {
    fn inspect(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl Inspect for String {
    fn inspect(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl Inspect for Cow<'_, str> {
    fn inspect(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl Inspect for () {
    fn inspect(&self) -> Value {
        Value::Tuple(Vec::new())
    }
}

impl Inspect for Value {
    fn inspect(&self) -> Value {
        self.clone()
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn inspect(&self) -> Value {
        match self {
            Some(v) => Value::Variant {
                name: "Some".to_string(),
                value: Box::new(v.inspect()),
            },
            None => Value::None,
        }
    }
}

impl<T: Inspect, E: Inspect> Inspect for Result<T, E> {
    fn inspect(&self) -> Value {
        let (name, value) = match self {
            Ok(v) => ("Ok", v.inspect()),
            Err(e) => ("Err", e.inspect()),
        };
        Value::Variant {
            name: name.to_string(),
            value: Box::new(value),
        }
    }
}

impl<T: Inspect> Inspect for [T] {
    fn inspect(&self) -> Value {
        inspect_items(Kind::List, self.len(), self.iter(), Value::List)
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn inspect(&self) -> Value {
        self.as_slice().inspect()
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn inspect(&self) -> Value {
        self.as_slice().inspect()
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn inspect(&self) -> Value {
        inspect_items(Kind::List, self.len(), self.iter(), Value::List)
    }
}

impl<K: Inspect, V: Inspect, S: BuildHasher> Inspect for HashMap<K, V, S> {
    fn inspect(&self) -> Value {
        if self.len() > MAX_INSPECT_ITEMS {
            return Value::elided(Kind::Map, self.len());
        }
        let mut entries: Vec<(Value, Value)> =
            self.iter().map(|(k, v)| (k.inspect(), v.inspect())).collect();
        // Hash order is arbitrary; keep output stable between runs
        entries.sort_by_cached_key(|(k, _)| k.display_key());
        Value::Map(entries)
    }
}

impl<K: Inspect, V: Inspect> Inspect for BTreeMap<K, V> {
    fn inspect(&self) -> Value {
        if self.len() > MAX_INSPECT_ITEMS {
            return Value::elided(Kind::Map, self.len());
        }
        Value::Map(self.iter().map(|(k, v)| (k.inspect(), v.inspect())).collect())
    }
}

impl<T: Inspect, S: BuildHasher> Inspect for HashSet<T, S> {
    fn inspect(&self) -> Value {
        inspect_items(Kind::Set, self.len(), self.iter(), Value::Set)
    }
}

impl<T: Inspect> Inspect for BTreeSet<T> {
    fn inspect(&self) -> Value {
        inspect_items(Kind::Set, self.len(), self.iter(), Value::Set)
    }
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect + ?Sized> Inspect for &mut T {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect + ?Sized> Inspect for Rc<T> {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect + ?Sized> Inspect for Arc<T> {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

macro_rules! inspect_tuple {
    ($($name:ident)+) => {
        impl<$($name: Inspect),+> Inspect for ($($name,)+) {
            #[allow(non_snake_case)]
            fn inspect(&self) -> Value {
                let ($($name,)+) = self;
                Value::Tuple(vec![$($name.inspect()),+])
            }
        }
    };
}

inspect_tuple!(A);
inspect_tuple!(A B);
inspect_tuple!(A B C);
inspect_tuple!(A B C D);
inspect_tuple!(A B C D E);
inspect_tuple!(A B C D E F);
inspect_tuple!(A B C D E F G);
inspect_tuple!(A B C D E F G H);
inspect_tuple!(A B C D E F G H I);
inspect_tuple!(A B C D E F G H I J);
inspect_tuple!(A B C D E F G H I J K);
inspect_tuple!(A B C D E F G H I J K L);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_primitives() {
        assert_eq!(42i32.inspect(), Value::Int(42));
        assert_eq!(7u8.inspect(), Value::UInt(7));
        assert_eq!(1.5f32.inspect(), Value::Float(1.5));
        assert_eq!("hi".inspect(), Value::Str("hi".to_string()));
        assert_eq!(().inspect(), Value::Tuple(vec![]));
    }

    #[test]
    fn test_inspect_containers() {
        let v = vec![Some(1), None];
        assert_eq!(
            v.inspect(),
            Value::List(vec![
                Value::Variant {
                    name: "Some".to_string(),
                    value: Box::new(Value::Int(1)),
                },
                Value::None,
            ])
        );

        let mut map = HashMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        let Value::Map(entries) = map.inspect() else {
            panic!("expected map");
        };
        assert_eq!(entries[0].0, Value::Str("a".to_string()));
    }

    #[test]
    fn test_repr() {
        assert_eq!(Value::Str("it's".to_string()).repr(), "\"it's\"");
        assert_eq!(Value::Str("a\\b".to_string()).repr(), "'a\\\\b'");
        assert_eq!(Value::Float(1.0).repr(), "1.0");
        assert_eq!((1,).inspect().repr(), "(1,)");
        assert_eq!(Value::Char('x').display_key(), "x");
    }

    #[test]
    fn test_type_chain() {
        let obj = Value::object(&std::time::Duration::from_secs(1));
        assert_eq!(
            obj.type_chain(),
            vec![
                TypeKey::named::<std::time::Duration>(),
                TypeKey::Kind(Kind::Object),
            ]
        );
        assert_eq!(Value::Int(1).type_chain(), vec![TypeKey::Kind(Kind::Int)]);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Value::Map(vec![]).placeholder(), "<dict with 0 items>");
        assert_eq!(Value::bytes([0u8; 3]).placeholder(), "<bytes of length 3>");
        assert_eq!(Value::Int(3).placeholder(), "3");
    }

    #[test]
    fn test_large_collections_are_not_copied() {
        let big: Vec<u32> = (0..MAX_INSPECT_ITEMS as u32 + 1).collect();
        let value = big.inspect();
        assert_eq!(value, Value::elided(Kind::List, MAX_INSPECT_ITEMS + 1));
        assert_eq!(value.kind(), Kind::List);
        assert_eq!(value.repr(), "<list with 1001 items>");

        let map: HashMap<usize, usize> = (0..2000).map(|i| (i, i)).collect();
        assert_eq!(map.inspect().placeholder(), "<dict with 2000 items>");

        let data = vec![0u8; 4096];
        assert_eq!(Bytes(&data).inspect().repr(), "<bytes of length 4096>");

        let fits: Vec<u32> = (0..MAX_INSPECT_ITEMS as u32).collect();
        assert_eq!(fits.inspect().len(), Some(MAX_INSPECT_ITEMS));
        assert!(matches!(fits.inspect(), Value::List(_)));
    }

    #[test]
    fn test_bytes_wrapper() {
        assert_eq!(Bytes(b"abc").inspect(), Value::Bytes(b"abc".to_vec()));
        assert_eq!(Bytes(vec![104u8, 105]).inspect().repr(), "b'hi'");
    }

    #[test]
    fn test_panicking_debug_is_contained() {
        struct Boom;

        impl fmt::Debug for Boom {
            fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("no debug for you")
            }
        }

        let value = Value::object(&Boom);
        assert_eq!(value.repr(), "<Boom repr failed>");
        assert_eq!(value.kind(), Kind::Object);
    }

    #[test]
    fn test_type_display_name() {
        assert_eq!(type_display_name("i32"), "i32");
        assert_eq!(type_display_name("alloc::string::String"), "String");
        assert_eq!(
            type_display_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(
            type_display_name("core::option::Option<app::model::User>"),
            "Option<app::model::User>"
        );
        assert_eq!(type_display_name("&str"), "&str");
        assert_eq!(Value::type_of::<Vec<u8>>().repr(), "<class 'Vec<u8>'>");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("core::num::ParseIntError"), "ParseIntError");
        assert_eq!(short_type_name("app::Wrapper<core::fmt::Error>"), "Wrapper");
    }

    #[test]
    fn test_nan_is_not_json() {
        assert!(Value::Float(f64::NAN).to_json().is_err());
        assert_eq!(
            Value::Map(vec![(Value::Int(2), Value::Bool(true))])
                .to_json()
                .unwrap()
                .to_string(),
            "{\"2\":true}"
        );
    }
}
