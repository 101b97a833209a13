//! Console argument formatting.
//!
//! Turns the argument list of a console call into the line a native console
//! would print: plain text via [`format_text`], and an HTML fragment via
//! [`format_html`]. Both walk the arguments with the same template engine and
//! differ only in how pieces are emitted.
//!
//! When the first argument is a string it is a template. `%s %d %i %f %o %O
//! %c %j %%` are substituted left to right; a specifier with no argument left
//! stays literal. Arguments remaining after the template are appended,
//! separated by spaces. Formatting never fails: non-serializable values fall
//! back to structural inspection.

use crate::inspect::{
    InspectOptions, date_to_iso, error_to_string, function_to_string, inspect, inspect_argument,
    pattern_source, symbol_to_string,
};
use crate::json::{to_json, to_json_pretty};
use crate::number::{format_number, parse_float, parse_int};
use crate::value::Value;

/// Options shared by both output modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Options for structural rendering of non-template arguments.
    pub inspect: InspectOptions,
    /// Recognize `%j` as a JSON specifier.
    pub json_specifier: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            inspect: InspectOptions::default(),
            json_specifier: true,
        }
    }
}

impl FormatOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inspection options
    #[must_use]
    pub fn with_inspect(mut self, inspect: InspectOptions) -> Self {
        self.inspect = inspect;
        self
    }

    /// Toggle `%j` support
    #[must_use]
    pub fn with_json_specifier(mut self, enabled: bool) -> Self {
        self.json_specifier = enabled;
        self
    }
}

/// Formats a call's arguments as plain text, without a trailing newline.
#[must_use]
pub fn format_text(args: &[Value], options: &FormatOptions) -> String {
    let mut emitter = TextEmitter::default();
    render(args, options, options.inspect, &mut emitter);
    emitter.out
}

/// Formats a call's arguments as an HTML fragment, without a trailing break.
///
/// Structural output is colorized and converted to styled spans. All text is
/// escaped; `%c` arguments become `style` attributes of their own container.
#[cfg(feature = "html")]
#[must_use]
pub fn format_html(args: &[Value], options: &FormatOptions) -> String {
    let mut emitter = HtmlEmitter::new();
    render(args, options, options.inspect.with_colors(true), &mut emitter);
    emitter.finish()
}

/// Safe string conversion used by `%s`.
///
/// Primitives use their canonical text; objects are inspected one level deep.
#[must_use]
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::BigInt(n) => format!("{n}n"),
        Value::String(s) => s.clone(),
        Value::Symbol(desc) => symbol_to_string(desc),
        Value::Function(name) => function_to_string(name.as_deref()),
        Value::Date(date) => date_to_iso(date),
        Value::Pattern(re) => pattern_source(re),
        Value::Error(err) => err.to_string(),
        Value::Object(_) => inspect(value, &InspectOptions::default().with_depth(Some(0))),
    }
}

fn integer_of(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_finite() => format_number(n.trunc()),
        Value::BigInt(n) => format!("{n}n"),
        Value::String(s) => format_number(parse_int(s)),
        _ => format_number(f64::NAN),
    }
}

fn float_of(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::BigInt(n) => format_number(*n as f64),
        Value::String(s) => format_number(parse_float(s)),
        _ => format_number(f64::NAN),
    }
}

// ─────────────────────────────────────────────────
// Emitters
// ─────────────────────────────────────────────────

/// Receives the pieces of a formatted line.
trait Emitter {
    /// Template text or substituted content. May contain ANSI sequences.
    fn text(&mut self, text: &str);
    /// A `%c` style marker.
    fn style(&mut self, css: &str);
}

#[derive(Default)]
struct TextEmitter {
    out: String,
}

impl Emitter for TextEmitter {
    fn text(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn style(&mut self, _css: &str) {}
}

/// A run of output under one `%c` style. `raw` keeps the ANSI sequences so
/// colors carry across substitutions; it is converted once in `finish`.
#[cfg(feature = "html")]
struct Segment {
    style: Option<String>,
    raw: String,
}

#[cfg(feature = "html")]
struct HtmlEmitter {
    segments: Vec<Segment>,
    styled: bool,
}

#[cfg(feature = "html")]
impl HtmlEmitter {
    fn new() -> Self {
        Self {
            segments: vec![Segment {
                style: None,
                raw: String::new(),
            }],
            styled: false,
        }
    }

    fn finish(self) -> String {
        use crate::html::{ansi_to_html, newlines_to_breaks};

        if !self.styled {
            let content = self
                .segments
                .into_iter()
                .next()
                .map(|s| ansi_to_html(&s.raw))
                .unwrap_or_default();
            return newlines_to_breaks(&content);
        }

        let mut out = String::new();
        for segment in self.segments {
            let content = ansi_to_html(&segment.raw);
            if content.is_empty() {
                continue;
            }
            match segment.style.as_deref() {
                Some(style) if !style.is_empty() => {
                    out.push_str("<span style=\"");
                    out.push_str(style);
                    out.push_str("\">");
                }
                _ => out.push_str("<span>"),
            }
            out.push_str(&content);
            out.push_str("</span>");
        }
        newlines_to_breaks(&out)
    }
}

#[cfg(feature = "html")]
impl Emitter for HtmlEmitter {
    fn text(&mut self, text: &str) {
        if let Some(segment) = self.segments.last_mut() {
            segment.raw.push_str(text);
        }
    }

    fn style(&mut self, css: &str) {
        self.styled = true;
        self.segments.push(Segment {
            style: Some(crate::html::escape_attr(css)),
            raw: String::new(),
        });
    }
}

// ─────────────────────────────────────────────────
// Template engine
// ─────────────────────────────────────────────────

fn render<E: Emitter>(
    args: &[Value],
    options: &FormatOptions,
    inspect_options: InspectOptions,
    out: &mut E,
) {
    let Some((first, rest)) = args.split_first() else {
        return;
    };

    let loose = |value: &Value| match value {
        Value::Error(err) if err.stack().is_some() => error_to_string(err),
        _ => inspect_argument(value, &inspect_options),
    };

    let Value::String(template) = first else {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.text(" ");
            }
            out.text(&loose(arg));
        }
        return;
    };

    let mut remaining = rest.iter();
    let bytes = template.as_bytes();
    let mut flushed = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find('%') {
        let pos = cursor + offset;
        let Some(&spec) = bytes.get(pos + 1) else {
            break;
        };

        let recognized = match spec {
            b's' | b'd' | b'i' | b'f' | b'o' | b'O' | b'c' | b'%' => true,
            b'j' => options.json_specifier,
            _ => false,
        };
        if !recognized {
            cursor = pos + 1;
            continue;
        }

        if flushed < pos {
            out.text(&template[flushed..pos]);
        }
        flushed = pos + 2;
        cursor = pos + 2;

        if spec == b'%' {
            out.text("%");
            continue;
        }

        let Some(arg) = remaining.next() else {
            out.text(&template[pos..pos + 2]);
            continue;
        };

        match spec {
            b's' => out.text(&to_display_string(arg)),
            b'd' | b'i' => out.text(&integer_of(arg)),
            b'f' => out.text(&float_of(arg)),
            b'o' | b'O' => match to_json_pretty(arg) {
                Ok(json) => out.text(&json),
                Err(err) => {
                    log::trace!(target: crate::logging::targets::FORMAT, "%o fallback: {err}");
                    out.text(&loose(arg));
                }
            },
            b'j' => match to_json(arg) {
                Ok(json) => out.text(&json),
                Err(_) => out.text(&to_display_string(arg)),
            },
            b'c' => out.style(&to_display_string(arg)),
            _ => {}
        }
    }

    if flushed < template.len() {
        out.text(&template[flushed..]);
    }

    for arg in remaining {
        out.text(" ");
        out.text(&loose(arg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ErrorValue, Object};

    fn text(args: &[Value]) -> String {
        format_text(args, &FormatOptions::default())
    }

    #[test]
    fn test_empty_args() {
        assert_eq!(text(&[]), "");
    }

    #[test]
    fn test_string_substitution() {
        assert_eq!(text(&["%s".into(), "a".into()]), "a");
        assert_eq!(text(&["Hello, %s!".into(), "World".into()]), "Hello, World!");
    }

    #[test]
    fn test_integer_substitution() {
        assert_eq!(text(&["%d".into(), "3.9".into()]), "3");
        assert_eq!(text(&["%i".into(), 7.8.into()]), "7");
        assert_eq!(text(&["%d".into(), "abc".into()]), "NaN");
        assert_eq!(text(&["%d".into(), Object::new().into()]), "NaN");
        assert_eq!(text(&["%d".into(), Value::BigInt(5)]), "5n");
    }

    #[test]
    fn test_float_substitution() {
        assert_eq!(text(&["%f".into(), "3.9".into()]), "3.9");
        assert_eq!(text(&["%f".into(), "x".into()]), "NaN");
        assert_eq!(text(&["%f".into(), Value::BigInt(12)]), "12");
    }

    #[test]
    fn test_percent_escape() {
        assert_eq!(text(&["%%".into()]), "%");
        assert_eq!(text(&["100%% sure %s".into(), "yes".into()]), "100% sure yes");
        assert_eq!(text(&["%%s".into(), "x".into()]), "%s x");
    }

    #[test]
    fn test_under_supply_keeps_specifier() {
        assert_eq!(text(&["%s %s".into(), "only-one".into()]), "only-one %s");
        assert_eq!(text(&["%d%%".into()]), "%d%");
    }

    #[test]
    fn test_overflow_appended() {
        assert_eq!(
            text(&["%s".into(), "a".into(), "b".into(), 3.into()]),
            "a b 3"
        );
        let obj = Object::from_entries([("k", 1)]);
        assert_eq!(text(&["x".into(), obj.into()]), "x { k: 1 }");
    }

    #[test]
    fn test_unknown_specifiers_are_literal() {
        assert_eq!(text(&["%x %".into(), "a".into()]), "%x % a");
        assert_eq!(text(&["50%".into()]), "50%");
    }

    #[test]
    fn test_non_template_first_argument() {
        assert_eq!(text(&[1.into(), "b".into(), true.into()]), "1 b true");
        let obj = Object::from_entries([("a", "%s")]);
        assert_eq!(text(&[obj.into(), "x".into()]), "{ a: '%s' } x");
    }

    #[test]
    fn test_error_arguments_use_stack() {
        let err = ErrorValue::new("boom").with_stack("Error: boom\n    at main");
        assert_eq!(text(&[err.into()]), "Error: boom\n    at main");
        assert_eq!(
            text(&["failed:".into(), ErrorValue::new("x").into()]),
            "failed: Error: x"
        );
    }

    #[test]
    fn test_object_specifier_uses_json() {
        let obj = Object::from_entries([("a", 1)]);
        assert_eq!(text(&["%o".into(), obj.into()]), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_object_specifier_falls_back_on_cycles() {
        let obj = Object::new();
        obj.set("self", obj.clone());
        assert_eq!(
            text(&["%O".into(), obj.into()]),
            "<ref *1> { self: [Circular *1] }"
        );
    }

    #[test]
    fn test_json_specifier() {
        let obj = Object::from_entries([("a", 1)]);
        assert_eq!(text(&["%j".into(), obj.into()]), r#"{"a":1}"#);
        assert_eq!(text(&["%j".into(), Value::BigInt(2)]), "2n");

        let without = FormatOptions::default().with_json_specifier(false);
        assert_eq!(format_text(&["%j".into(), 1.into()], &without), "%j 1");
    }

    #[test]
    fn test_style_specifier_discarded_in_text() {
        assert_eq!(text(&["%cBig".into(), "color:blue".into()]), "Big");
    }

    #[test]
    fn test_display_string_of_object_is_shallow() {
        let inner = Object::from_entries([("b", 1)]);
        let outer = Object::from_entries([("a", inner)]);
        assert_eq!(text(&["%s".into(), outer.into()]), "{ a: [Object] }");
    }

    #[test]
    fn test_multibyte_template() {
        assert_eq!(text(&["héllo %s ✓".into(), "wörld".into()]), "héllo wörld ✓");
    }

    #[cfg(feature = "html")]
    mod html {
        use super::*;

        fn html(args: &[Value]) -> String {
            format_html(args, &FormatOptions::default())
        }

        #[test]
        fn test_plain_html_is_escaped() {
            assert_eq!(html(&["<b>%s</b>".into(), "&".into()]), "&lt;b&gt;&amp;&lt;/b&gt;");
        }

        #[test]
        fn test_template_color_spans_substitution() {
            assert_eq!(
                html(&["\x1b[31m%s\x1b[39m done".into(), "red".into()]),
                "<span style=\"color:#cd3131\">red</span> done"
            );
        }

        #[test]
        fn test_substituted_markup_inside_color_is_escaped() {
            assert_eq!(
                html(&["\x1b[31m%s".into(), "<i>".into()]),
                "<span style=\"color:#cd3131\">&lt;i&gt;</span>"
            );
        }

        #[test]
        fn test_style_segment() {
            assert_eq!(
                html(&["%cBig".into(), "color:blue".into()]),
                "<span style=\"color:blue\">Big</span>"
            );
        }

        #[test]
        fn test_unstyled_prefix_is_wrapped() {
            assert_eq!(
                html(&["a%cb".into(), "color:red".into()]),
                "<span>a</span><span style=\"color:red\">b</span>"
            );
        }

        #[test]
        fn test_empty_style_container() {
            assert_eq!(
                html(&["%cx%c".into(), "".into(), "color:red".into()]),
                "<span>x</span>"
            );
        }

        #[test]
        fn test_style_injection_is_escaped() {
            let out = html(&["%cX".into(), "\"><script>alert(1)</script>".into()]);
            assert_eq!(out.matches("<span").count(), 1);
            assert!(!out.contains("<script>"));
            assert!(out.contains("&quot;&gt;&lt;script&gt;"));
        }

        #[test]
        fn test_ansi_in_template_becomes_span() {
            assert_eq!(
                html(&["\x1b[31mred\x1b[39m".into()]),
                "<span style=\"color:#cd3131\">red</span>"
            );
        }

        #[test]
        fn test_newlines_become_breaks() {
            assert_eq!(html(&["a\nb".into()]), "a<br>\nb");
        }

        #[test]
        fn test_structural_values_are_colored() {
            assert_eq!(
                html(&[1.into()]),
                "<span style=\"color:#e5e510\">1</span>"
            );
        }
    }
}
