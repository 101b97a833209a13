//! Structural stringification of arbitrary values.
//!
//! [`inspect`] renders any [`Value`] as deterministic, diagnostic-quality text.
//! Rendering happens in two passes:
//!
//! 1. A scan walks the graph keeping only the *active path* (the current
//!    recursion stack). Any object met again while still on that path is a
//!    cycle participant and receives the next reference number.
//! 2. The format pass renders the graph. A cycle participant carries a
//!    `<ref *n>` prefix where it is defined and is shown as `[Circular *n]`
//!    when reached again from inside its own subtree.
//!
//! Objects leave the active path once their subtree is done, so the same
//! object appearing twice as siblings is rendered twice, not as a cycle.
//! Output always terminates: cycles are cut by the active path and depth by
//! [`InspectOptions::depth`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::number::inspect_number;
use crate::value::{ErrorValue, Object, PropertyKey, Value};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

/// Options for structural rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectOptions {
    /// Nesting levels rendered before objects collapse to a placeholder.
    /// `None` renders every level.
    pub depth: Option<usize>,
    /// Emit ANSI color sequences.
    pub colors: bool,
    /// Width below which an object's entries stay on one line.
    pub break_length: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            depth: Some(2),
            colors: false,
            break_length: 80,
        }
    }
}

impl InspectOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum depth (`None` for unlimited)
    #[must_use]
    pub fn with_depth(mut self, depth: Option<usize>) -> Self {
        self.depth = depth;
        self
    }

    /// Toggle ANSI colors
    #[must_use]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Set the single-line width limit
    #[must_use]
    pub fn with_break_length(mut self, width: usize) -> Self {
        self.break_length = width;
        self
    }
}

// ─────────────────────────────────────────────────
// Palette
// ─────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Paint {
    open: u8,
    close: u8,
}

const STRING: Paint = Paint { open: 32, close: 39 };
const NUMBER: Paint = Paint { open: 33, close: 39 };
const BOOLEAN: Paint = NUMBER;
const NULL: Paint = Paint { open: 1, close: 22 };
const UNDEFINED: Paint = Paint { open: 90, close: 39 };
const SPECIAL: Paint = Paint { open: 36, close: 39 };
const DATE: Paint = Paint { open: 35, close: 39 };
const PATTERN: Paint = Paint { open: 31, close: 39 };

// ─────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────

/// Renders `value` structurally.
#[must_use]
pub fn inspect(value: &Value, options: &InspectOptions) -> String {
    let refs = scan(value, options.depth);
    let mut inspector = Inspector {
        options,
        refs,
        seen: Vec::new(),
    };
    inspector.format_value(value, 0)
}

/// Renders a top-level console argument: strings are emitted raw, errors as
/// their stack, everything else through [`inspect`].
#[must_use]
pub fn inspect_argument(value: &Value, options: &InspectOptions) -> String {
    match value {
        Value::String(s) => s.clone(),
        _ => inspect(value, options),
    }
}

/// Canonical ISO-8601 rendering of a date, in UTC with millisecond precision.
#[must_use]
pub fn date_to_iso(date: &OffsetDateTime) -> String {
    let utc = date.to_offset(time::UtcOffset::UTC);
    utc.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ))
    .unwrap_or_else(|_| "Invalid Date".to_string())
}

/// Canonical rendering of a regular expression.
#[must_use]
pub fn pattern_source(pattern: &Regex) -> String {
    format!("/{}/", pattern.as_str())
}

/// Canonical rendering of a symbol.
#[must_use]
pub fn symbol_to_string(description: &str) -> String {
    format!("Symbol({description})")
}

/// Canonical rendering of a function.
#[must_use]
pub fn function_to_string(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("[Function: {name}]"),
        _ => "[Function (anonymous)]".to_string(),
    }
}

/// Renders an error as its stack, or `[Name: message]` when none was captured.
#[must_use]
pub fn error_to_string(err: &ErrorValue) -> String {
    match err.stack() {
        Some(stack) => stack.to_string(),
        None => format!("[{err}]"),
    }
}

/// Quotes and escapes a string for display inside structures.
#[must_use]
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

// ─────────────────────────────────────────────────
// Scan pass
// ─────────────────────────────────────────────────

fn scan(value: &Value, max_depth: Option<usize>) -> HashMap<usize, usize> {
    let mut refs = HashMap::new();
    let mut path = Vec::new();
    scan_value(value, 0, max_depth, &mut path, &mut refs);
    refs
}

fn scan_value(
    value: &Value,
    depth: usize,
    max_depth: Option<usize>,
    path: &mut Vec<usize>,
    refs: &mut HashMap<usize, usize>,
) {
    let Value::Object(object) = value else {
        return;
    };
    let id = object.id();
    if path.contains(&id) {
        let next = refs.len() + 1;
        refs.entry(id).or_insert(next);
        return;
    }
    if max_depth.is_some_and(|max| depth > max) {
        return;
    }

    path.push(id);
    for child in object.values() {
        scan_value(&child, depth + 1, max_depth, path, refs);
    }
    path.pop();
}

// ─────────────────────────────────────────────────
// Format pass
// ─────────────────────────────────────────────────

struct Inspector<'a> {
    options: &'a InspectOptions,
    refs: HashMap<usize, usize>,
    seen: Vec<usize>,
}

impl Inspector<'_> {
    fn paint(&self, text: &str, paint: Paint) -> String {
        if self.options.colors {
            format!("\x1b[{}m{text}\x1b[{}m", paint.open, paint.close)
        } else {
            text.to_string()
        }
    }

    fn format_value(&mut self, value: &Value, depth: usize) -> String {
        match value {
            Value::Undefined => self.paint("undefined", UNDEFINED),
            Value::Null => self.paint("null", NULL),
            Value::Bool(b) => self.paint(if *b { "true" } else { "false" }, BOOLEAN),
            Value::Number(n) => self.paint(&inspect_number(*n), NUMBER),
            Value::BigInt(n) => self.paint(&format!("{n}n"), NUMBER),
            Value::String(s) => self.paint(&quote(s), STRING),
            Value::Symbol(desc) => self.paint(&symbol_to_string(desc), STRING),
            Value::Function(name) => self.paint(&function_to_string(name.as_deref()), SPECIAL),
            Value::Date(date) => self.paint(&date_to_iso(date), DATE),
            Value::Pattern(re) => self.paint(&pattern_source(re), PATTERN),
            Value::Error(err) => self.format_error(err, depth),
            Value::Object(object) => self.format_object(object, depth),
        }
    }

    fn format_error(&self, err: &ErrorValue, depth: usize) -> String {
        let text = error_to_string(err);
        if depth == 0 {
            return text;
        }
        let indent = "  ".repeat(depth);
        text.replace('\n', &format!("\n{indent}"))
    }

    fn format_object(&mut self, object: &Object, depth: usize) -> String {
        let id = object.id();
        if self.seen.contains(&id) {
            let marker = match self.refs.get(&id) {
                Some(n) => format!("[Circular *{n}]"),
                None => "[Circular]".to_string(),
            };
            return self.paint(&marker, SPECIAL);
        }

        if self.options.depth.is_some_and(|max| depth > max) {
            let placeholder = match (object.is_array(), object.class_name()) {
                (true, _) => "[Array]".to_string(),
                (false, Some(name)) => format!("[{name}]"),
                (false, None) => "[Object]".to_string(),
            };
            return self.paint(&placeholder, SPECIAL);
        }

        self.seen.push(id);
        let entries: Vec<String> = if object.is_array() {
            object
                .values()
                .iter()
                .map(|value| self.format_value(value, depth + 1))
                .collect()
        } else {
            object
                .entries()
                .iter()
                .map(|(key, value)| {
                    let key = self.format_key(key);
                    let value = self.format_value(value, depth + 1);
                    format!("{key}: {value}")
                })
                .collect()
        };
        self.seen.pop();

        let mut prefix = String::new();
        if let Some(n) = self.refs.get(&id) {
            prefix.push_str(&self.paint(&format!("<ref *{n}>"), SPECIAL));
            prefix.push(' ');
        }
        if let Some(name) = object.class_name() {
            prefix.push_str(name);
            prefix.push(' ');
        }

        let (open, close) = if object.is_array() { ('[', ']') } else { ('{', '}') };
        prefix.push_str(&self.reduce(&entries, open, close, depth, prefix.len()));
        prefix
    }

    fn format_key(&self, key: &PropertyKey) -> String {
        match key {
            PropertyKey::Name(name) if IDENTIFIER.is_match(name) => name.clone(),
            PropertyKey::Name(name) => self.paint(&quote(name), STRING),
            PropertyKey::Symbol(desc) => format!("[{}]", self.paint(&symbol_to_string(desc), STRING)),
        }
    }

    fn reduce(
        &self,
        entries: &[String],
        open: char,
        close: char,
        depth: usize,
        prefix_len: usize,
    ) -> String {
        if entries.is_empty() {
            return format!("{open}{close}");
        }

        let total: usize = entries
            .iter()
            .map(|e| console::measure_text_width(e) + 2)
            .sum::<usize>()
            + prefix_len
            + 2 * depth
            + 2;
        let multiline = entries.iter().any(|e| e.contains('\n'));
        if !multiline && total <= self.options.break_length {
            return format!("{open} {} {close}", entries.join(", "));
        }

        let inner = "  ".repeat(depth + 1);
        let outer = "  ".repeat(depth);
        let body = entries
            .iter()
            .map(|e| format!("{inner}{e}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{open}\n{body}\n{outer}{close}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ErrorValue;

    fn plain(value: &Value) -> String {
        inspect(value, &InspectOptions::default())
    }

    #[test]
    fn test_primitives() {
        assert_eq!(plain(&Value::from("hi")), "'hi'");
        assert_eq!(plain(&Value::from(42)), "42");
        assert_eq!(plain(&Value::Number(-0.0)), "-0");
        assert_eq!(plain(&Value::BigInt(7)), "7n");
        assert_eq!(plain(&Value::Bool(true)), "true");
        assert_eq!(plain(&Value::Null), "null");
        assert_eq!(plain(&Value::Undefined), "undefined");
        assert_eq!(plain(&Value::symbol("tag")), "Symbol(tag)");
        assert_eq!(plain(&Value::function("run")), "[Function: run]");
        assert_eq!(plain(&Value::Function(None)), "[Function (anonymous)]");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(plain(&Value::from("it's\n")), "'it\\'s\\n'");
        assert_eq!(plain(&Value::from("\x1b[31m")), "'\\x1B[31m'");
    }

    #[test]
    fn test_date_and_pattern() {
        let date = time::macros::datetime!(2020-01-02 03:04:05.678 UTC);
        assert_eq!(plain(&Value::Date(date)), "2020-01-02T03:04:05.678Z");
        let re = Regex::new("a+b").unwrap();
        assert_eq!(plain(&Value::Pattern(re)), "/a+b/");
    }

    #[test]
    fn test_single_line_object() {
        let obj = Object::from_entries([("a", Value::from(1)), ("b", Value::from("x"))]);
        assert_eq!(plain(&obj.into()), "{ a: 1, b: 'x' }");
    }

    #[test]
    fn test_empty_structures() {
        assert_eq!(plain(&Object::new().into()), "{}");
        assert_eq!(plain(&Object::array().into()), "[]");
        assert_eq!(plain(&Object::with_class("Empty").into()), "Empty {}");
    }

    #[test]
    fn test_array_omits_keys() {
        let arr = Object::from_values([1, 2, 3]);
        assert_eq!(plain(&arr.into()), "[ 1, 2, 3 ]");
    }

    #[test]
    fn test_quoted_and_symbol_keys() {
        let obj = Object::new();
        obj.set("my-key", 1);
        obj.set(PropertyKey::Symbol("id".into()), 2);
        assert_eq!(plain(&obj.into()), "{ 'my-key': 1, [Symbol(id)]: 2 }");
    }

    #[test]
    fn test_class_name_prefix() {
        let point = Object::with_class("Point");
        point.set("x", 1);
        assert_eq!(plain(&point.into()), "Point { x: 1 }");
    }

    #[test]
    fn test_multiline_when_too_wide() {
        let obj = Object::new();
        obj.set("first", "a".repeat(40));
        obj.set("second", "b".repeat(40));
        let out = plain(&obj.into());
        let expected = format!("{{\n  first: '{}',\n  second: '{}'\n}}", "a".repeat(40), "b".repeat(40));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_nested_multiline_indents_per_level() {
        let inner = Object::new();
        inner.set("long", "c".repeat(90));
        let outer = Object::new();
        outer.set("inner", inner);
        let out = plain(&outer.into());
        assert!(out.contains("\n  inner: {\n    long: '"));
        assert!(out.ends_with("\n  }\n}"));
    }

    #[test]
    fn test_depth_limit() {
        let level3 = Object::from_entries([("deep", 1)]);
        let level2 = Object::from_entries([("c", level3)]);
        let level1 = Object::from_entries([("b", level2)]);
        let root = Object::from_entries([("a", level1)]);
        assert_eq!(plain(&root.clone().into()), "{ a: { b: { c: [Object] } } }");

        let unlimited = inspect(&root.into(), &InspectOptions::default().with_depth(None));
        assert_eq!(unlimited, "{ a: { b: { c: { deep: 1 } } } }");
    }

    #[test]
    fn test_depth_zero_placeholders() {
        let root = Object::from_entries([
            ("arr", Value::from(Object::from_values([1]))),
            ("pt", Value::from(Object::with_class("Point"))),
        ]);
        let out = inspect(&root.into(), &InspectOptions::default().with_depth(Some(0)));
        assert_eq!(out, "{ arr: [Array], pt: [Point] }");
    }

    #[test]
    fn test_self_cycle() {
        let obj = Object::new();
        obj.set("self", obj.clone());
        let out = plain(&obj.into());
        assert_eq!(out, "<ref *1> { self: [Circular *1] }");
        assert_eq!(out.matches("[Circular").count(), 1);
    }

    #[test]
    fn test_indirect_cycle() {
        let parent = Object::new();
        let child = Object::new();
        child.set("parent", parent.clone());
        parent.set("name", "root");
        parent.set("child", child);
        assert_eq!(
            plain(&parent.into()),
            "<ref *1> { name: 'root', child: { parent: [Circular *1] } }"
        );
    }

    #[test]
    fn test_two_cycles_numbered_in_order() {
        let a = Object::new();
        let b = Object::new();
        a.set("me", a.clone());
        b.set("me", b.clone());
        let root = Object::from_entries([("a", a), ("b", b)]);
        let out = plain(&root.into());
        assert_eq!(
            out,
            "{ a: <ref *1> { me: [Circular *1] }, b: <ref *2> { me: [Circular *2] } }"
        );
    }

    #[test]
    fn test_shared_sibling_is_not_circular() {
        let shared = Object::from_entries([("v", 1)]);
        let root = Object::from_entries([("x", shared.clone()), ("y", shared)]);
        assert_eq!(plain(&root.into()), "{ x: { v: 1 }, y: { v: 1 } }");
    }

    #[test]
    fn test_cycle_beyond_depth_has_no_ref() {
        let deep = Object::new();
        deep.set("loop", deep.clone());
        let root = Object::from_entries([("a", Object::from_entries([("b", Object::from_entries([("c", deep)]))]))]);
        let out = plain(&root.into());
        assert!(!out.contains("<ref"));
        assert!(out.contains("[Object]"));
    }

    #[test]
    fn test_errors() {
        let err = ErrorValue::new("boom");
        assert_eq!(plain(&err.clone().into()), "Error: boom");
        assert_eq!(plain(&err.without_stack().into()), "[Error: boom]");

        let nested = Object::from_entries([(
            "err",
            Value::from(ErrorValue::new("x").with_stack("Error: x\n    at main")),
        )]);
        assert!(plain(&nested.into()).contains("Error: x\n      at main"));
    }

    #[test]
    fn test_colors() {
        let options = InspectOptions::default().with_colors(true);
        assert_eq!(inspect(&Value::from(1), &options), "\x1b[33m1\x1b[39m");
        assert_eq!(inspect(&Value::from("s"), &options), "\x1b[32m's'\x1b[39m");
        assert_eq!(inspect(&Value::Null, &options), "\x1b[1mnull\x1b[22m");
    }

    #[test]
    fn test_colors_do_not_affect_line_breaking() {
        let obj = Object::from_entries([("a", 1), ("b", 2)]);
        let options = InspectOptions::default().with_colors(true);
        let out = inspect(&obj.into(), &options);
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_inspect_argument_keeps_top_level_strings_raw() {
        let options = InspectOptions::default();
        assert_eq!(inspect_argument(&Value::from("raw"), &options), "raw");
        assert_eq!(inspect_argument(&Value::from(1), &options), "1");
    }
}
