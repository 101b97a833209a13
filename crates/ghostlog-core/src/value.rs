//! Console argument values.
//!
//! [`Value`] models whatever a caller may hand to a console method: primitives,
//! dates, patterns, errors and shared object graphs. Objects are reference
//! handles with interior mutability so cyclic graphs can be wired up after
//! construction, exactly as they would be in a dynamic host.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use time::OffsetDateTime;

/// A single console call argument.
#[derive(Clone)]
pub enum Value {
    /// The absent value.
    Undefined,
    /// The explicit null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double-precision number.
    Number(f64),
    /// An arbitrary-size integer (rendered with an `n` suffix).
    BigInt(i128),
    /// Text.
    String(String),
    /// A unique symbol with its description.
    Symbol(String),
    /// A callable, optionally named.
    Function(Option<String>),
    /// A point in time.
    Date(OffsetDateTime),
    /// A regular expression.
    Pattern(Regex),
    /// An error object.
    Error(ErrorValue),
    /// A shared object or array.
    Object(Object),
}

impl Value {
    /// Whether this is a text value (the only kind treated as a format template).
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns the text if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object handle if this is an object or array.
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the error if this is an error value.
    #[must_use]
    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Truthiness as a dynamic host would evaluate it in a condition.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::BigInt(n) => *n != 0,
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Builds an error value from any Rust error, including its source chain.
    #[must_use]
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::Error(ErrorValue::from_error(err))
    }

    /// Builds a symbol value.
    #[must_use]
    pub fn symbol(description: impl Into<String>) -> Self {
        Self::Symbol(description.into())
    }

    /// Builds a named function value.
    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(Some(name.into()))
    }

    /// Short name of the value's kind, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Function(_) => "function",
            Self::Date(_) => "date",
            Self::Pattern(_) => "pattern",
            Self::Error(_) => "error",
            Self::Object(o) if o.is_array() => "array",
            Self::Object(_) => "object",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::BigInt(n) => f.debug_tuple("BigInt").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Symbol(s) => f.debug_tuple("Symbol").field(s).finish(),
            Self::Function(name) => f.debug_tuple("Function").field(name).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Self::Object(o) => f.debug_tuple("Object").field(o).finish(),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────

/// An error-type console argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    name: String,
    message: String,
    stack: Option<String>,
}

impl ErrorValue {
    /// Creates an `Error` with the given message and a captured stack of
    /// `Error: message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::named("Error", message)
    }

    /// Creates an error with an explicit name (`TypeError`, `RangeError`, ...).
    #[must_use]
    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let stack = Some(header(&name, &message));
        Self {
            name,
            message,
            stack,
        }
    }

    /// Captures a Rust error and its `source()` chain.
    #[must_use]
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut value = Self::new(err.to_string());
        let mut stack = header(&value.name, &value.message);
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }
        value.stack = Some(stack);
        value
    }

    /// Replaces the captured stack.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Drops the captured stack.
    #[must_use]
    pub fn without_stack(mut self) -> Self {
        self.stack = None;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

fn header(name: &str, message: &str) -> String {
    if message.is_empty() {
        name.to_string()
    } else {
        format!("{name}: {message}")
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&header(&self.name, &self.message))
    }
}

impl std::error::Error for ErrorValue {}

// ─────────────────────────────────────────────────────────
// Objects
// ─────────────────────────────────────────────────────────

/// Key of an object entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKey {
    /// A string-named property.
    Name(String),
    /// A symbol-keyed property, identified by its description.
    Symbol(String),
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Shape of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    /// A keyed object, optionally an instance of a named class.
    Plain(Option<String>),
    /// An ordered list.
    Array,
}

struct ObjectData {
    kind: ObjectKind,
    entries: RwLock<Vec<(PropertyKey, Value)>>,
}

/// Shared handle to an object or array.
///
/// Cloning the handle aliases the same object; identity comparisons use
/// [`Object::ptr_eq`]. Self-referential graphs keep themselves alive.
#[derive(Clone)]
pub struct Object(Arc<ObjectData>);

impl Object {
    /// Creates an empty plain object.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Plain(None))
    }

    /// Creates an empty instance of a named class.
    #[must_use]
    pub fn with_class(name: impl Into<String>) -> Self {
        Self::with_kind(ObjectKind::Plain(Some(name.into())))
    }

    /// Creates an empty array.
    #[must_use]
    pub fn array() -> Self {
        Self::with_kind(ObjectKind::Array)
    }

    fn with_kind(kind: ObjectKind) -> Self {
        Self(Arc::new(ObjectData {
            kind,
            entries: RwLock::new(Vec::new()),
        }))
    }

    /// Creates an array holding `values`.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let array = Self::array();
        for value in values {
            array.push(value);
        }
        array
    }

    /// Creates a plain object from `(name, value)` pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PropertyKey>,
        V: Into<Value>,
    {
        let object = Self::new();
        for (key, value) in entries {
            object.set(key, value);
        }
        object
    }

    /// Sets a property, replacing an existing entry with the same key in place.
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self
            .0
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            entries.push((key, value));
        }
    }

    /// Appends an element, keyed by its index.
    pub fn push(&self, value: impl Into<Value>) {
        let mut entries = self
            .0
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let index = entries.len();
        entries.push((PropertyKey::Name(index.to_string()), value.into()));
    }

    /// Looks up a string-named property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(k, _)| matches!(k, PropertyKey::Name(n) if n == name))
            .map(|(_, v)| v.clone())
    }

    /// Snapshot of the entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(PropertyKey, Value)> {
        self.0
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the values in insertion order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.0
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, v)| v.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn kind(&self) -> &ObjectKind {
        &self.0.kind
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.0.kind == ObjectKind::Array
    }

    /// Class name of a plain object, if any.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        match &self.0.kind {
            ObjectKind::Plain(name) => name.as_deref(),
            ObjectKind::Array => None,
        }
    }

    /// Whether both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stable identity of the object for the lifetime of the handle.
    #[must_use]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

// Entries are not printed: a derived impl would recurse forever on cycles.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("kind", &self.0.kind)
            .field("len", &self.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(f64::from(n))
    }
}

/// Largest integer an `f64` holds exactly (`Number.MAX_SAFE_INTEGER`).
const MAX_SAFE_INTEGER: i128 = (1 << 53) - 1;

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Self::Number(f64::from(n))
                }
            }
        )*
    };
}

// Integers past the safe range become BigInt instead of rounding.
macro_rules! wide_number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    let wide = n as i128;
                    if wide.abs() <= MAX_SAFE_INTEGER {
                        Self::Number(wide as f64)
                    } else {
                        Self::BigInt(wide)
                    }
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, u8, u16, u32);
wide_number_from!(i64, isize, u64, usize);

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Self::BigInt(n)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<ErrorValue> for Value {
    fn from(err: ErrorValue) -> Self {
        Self::Error(err)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(date: OffsetDateTime) -> Self {
        Self::Date(date)
    }
}

impl From<Regex> for Value {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Object(Object::from_values(items)),
            serde_json::Value::Object(map) => Self::Object(Object::from_entries(map)),
        }
    }
}
