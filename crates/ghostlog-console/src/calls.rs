//! Turning console calls into output lines.
//!
//! The core methods print their arguments. The extended surface keeps a bit
//! of state per console (counters, timers, group depth) and either prints a
//! derived line or nothing. [`CallState`] holds that state and resolves each
//! call into an [`Output`]; the capturing console and the real platform
//! console both use it, so a forwarded call renders the same way in both.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ghostlog_core::format::{FormatOptions, format_text, to_display_string};
use ghostlog_core::inspect::inspect;
use ghostlog_core::value::Value;

use crate::method::Method;
use crate::table::render_table;

const DEFAULT_LABEL: &str = "default";
const GROUP_INDENT: &str = "  ";

/// What a call prints.
#[derive(Debug, Clone)]
pub enum Body {
    /// Arguments to run through the formatter.
    Args(Vec<Value>),
    /// A single value rendered structurally.
    Inspect(Value),
    /// Pre-rendered text (tables).
    Block(String),
}

/// A resolved call: the line to print and whether it is diagnostic output.
#[derive(Debug, Clone)]
pub struct Output {
    pub body: Body,
    pub diagnostic: bool,
    /// Group indentation in effect for this line.
    pub indent: usize,
}

impl Output {
    /// Plain-text rendering, indented, without a trailing newline.
    #[must_use]
    pub fn to_text(&self, options: &FormatOptions) -> String {
        let text = match &self.body {
            Body::Args(args) => format_text(args, options),
            Body::Inspect(value) => inspect(value, &options.inspect),
            Body::Block(text) => text.clone(),
        };
        indent_lines(&text, self.indent)
    }

    /// HTML rendering, indented, without a trailing break.
    #[cfg(feature = "html")]
    #[must_use]
    pub fn to_html(&self, options: &FormatOptions) -> String {
        use ghostlog_core::html::{ansi_to_html, newlines_to_breaks};

        let html = match &self.body {
            Body::Args(args) => ghostlog_core::format_html(args, options),
            Body::Inspect(value) => {
                newlines_to_breaks(&ansi_to_html(&inspect(value, &options.inspect.with_colors(true))))
            }
            Body::Block(text) => newlines_to_breaks(&ansi_to_html(text)),
        };
        indent_lines(&html, self.indent)
    }
}

fn indent_lines(text: &str, depth: usize) -> String {
    if depth == 0 {
        return text.to_string();
    }
    let indent = GROUP_INDENT.repeat(depth);
    text.split('\n')
        .map(|line| format!("{indent}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Counters, timers and group depth for one console.
#[derive(Debug, Default)]
pub struct CallState {
    counters: HashMap<String, u64>,
    timers: HashMap<String, Instant>,
    group_depth: usize,
}

impl CallState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current group nesting.
    #[must_use]
    pub fn group_depth(&self) -> usize {
        self.group_depth
    }

    /// Resolves a call, updating bookkeeping. Returns `None` when the call
    /// prints nothing.
    pub fn resolve(&mut self, method: Method, args: &[Value]) -> Option<Output> {
        let indent = self.group_depth;
        let line = |body: Body, diagnostic: bool| {
            Some(Output {
                body,
                diagnostic,
                indent,
            })
        };

        match method {
            Method::Log | Method::Info | Method::Debug => line(Body::Args(args.to_vec()), false),
            Method::Warn | Method::Error => line(Body::Args(args.to_vec()), true),
            Method::Dir => line(
                Body::Inspect(args.first().cloned().unwrap_or(Value::Undefined)),
                false,
            ),
            Method::Table => {
                let columns = args.get(1).and_then(column_filter);
                match args.first().and_then(|data| render_table(data, columns.as_deref())) {
                    Some(table) => line(Body::Block(table), false),
                    None => line(Body::Args(args.to_vec()), false),
                }
            }
            Method::Assert => {
                let passed = args.first().is_some_and(Value::is_truthy);
                if passed {
                    return None;
                }
                let mut rest: Vec<Value> = args.iter().skip(1).cloned().collect();
                match rest.first_mut() {
                    Some(Value::String(first)) => {
                        *first = format!("Assertion failed: {first}");
                    }
                    _ => rest.insert(0, Value::from("Assertion failed")),
                }
                line(Body::Args(rest), true)
            }
            Method::Count => {
                let label = label_of(args);
                let count = self.counters.entry(label.clone()).or_insert(0);
                *count += 1;
                line(
                    Body::Args(vec!["%s: %s".into(), label.into(), (*count).into()]),
                    false,
                )
            }
            Method::CountReset => {
                let label = label_of(args);
                match self.counters.get_mut(&label) {
                    Some(count) => {
                        *count = 0;
                        None
                    }
                    None => line(
                        Body::Args(vec!["Count for '%s' does not exist".into(), label.into()]),
                        true,
                    ),
                }
            }
            Method::Time => {
                let label = label_of(args);
                if self.timers.contains_key(&label) {
                    return line(
                        Body::Args(vec![
                            "Label '%s' already exists for console.time()".into(),
                            label.into(),
                        ]),
                        true,
                    );
                }
                self.timers.insert(label, Instant::now());
                None
            }
            Method::TimeLog | Method::TimeEnd => {
                let label = label_of(args);
                let started = if method == Method::TimeEnd {
                    self.timers.remove(&label)
                } else {
                    self.timers.get(&label).copied()
                };
                let Some(started) = started else {
                    return line(
                        Body::Args(vec![
                            format!("No such label '%s' for console.{method}()").into(),
                            label.into(),
                        ]),
                        true,
                    );
                };
                let mut out: Vec<Value> = vec![
                    "%s: %s".into(),
                    label.into(),
                    format_elapsed(started.elapsed()).into(),
                ];
                if method == Method::TimeLog {
                    out.extend(args.iter().skip(1).cloned());
                }
                line(Body::Args(out), false)
            }
            Method::Group | Method::GroupCollapsed => {
                self.group_depth += 1;
                if args.is_empty() {
                    None
                } else {
                    line(Body::Args(args.to_vec()), false)
                }
            }
            Method::GroupEnd => {
                self.group_depth = self.group_depth.saturating_sub(1);
                None
            }
        }
    }
}

fn label_of(args: &[Value]) -> String {
    match args.first() {
        None | Some(Value::Undefined) => DEFAULT_LABEL.to_string(),
        Some(value) => to_display_string(value),
    }
}

fn column_filter(value: &Value) -> Option<Vec<String>> {
    let Value::Object(object) = value else {
        return None;
    };
    object.is_array().then(|| {
        object
            .values()
            .iter()
            .map(to_display_string)
            .collect()
    })
}

/// `1.234ms` below one second, `1.500s` above.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_secs_f64() * 1000.0;
    if millis >= 1000.0 {
        format!("{:.3}s", millis / 1000.0)
    } else {
        format!("{millis:.3}ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostlog_core::value::Object;

    fn text(state: &mut CallState, method: Method, args: &[Value]) -> Option<String> {
        state
            .resolve(method, args)
            .map(|out| out.to_text(&FormatOptions::default()))
    }

    #[test]
    fn test_log_formats_args() {
        let mut state = CallState::new();
        let out = text(&mut state, Method::Log, &["%s!".into(), "hi".into()]);
        assert_eq!(out.as_deref(), Some("hi!"));
    }

    #[test]
    fn test_warn_and_error_are_diagnostic() {
        let mut state = CallState::new();
        assert!(state.resolve(Method::Warn, &[]).is_some_and(|o| o.diagnostic));
        assert!(state.resolve(Method::Info, &[]).is_some_and(|o| !o.diagnostic));
    }

    #[test]
    fn test_count_and_reset() {
        let mut state = CallState::new();
        assert_eq!(text(&mut state, Method::Count, &[]).as_deref(), Some("default: 1"));
        assert_eq!(text(&mut state, Method::Count, &[]).as_deref(), Some("default: 2"));
        assert_eq!(text(&mut state, Method::Count, &["x".into()]).as_deref(), Some("x: 1"));
        assert!(text(&mut state, Method::CountReset, &[]).is_none());
        assert_eq!(text(&mut state, Method::Count, &[]).as_deref(), Some("default: 1"));
        assert_eq!(
            text(&mut state, Method::CountReset, &["nope".into()]).as_deref(),
            Some("Count for 'nope' does not exist")
        );
    }

    #[test]
    fn test_count_label_with_percent_is_literal() {
        let mut state = CallState::new();
        assert_eq!(
            text(&mut state, Method::Count, &["%s".into()]).as_deref(),
            Some("%s: 1")
        );
    }

    #[test]
    fn test_timers() {
        let mut state = CallState::new();
        assert!(text(&mut state, Method::Time, &["t".into()]).is_none());
        assert!(
            text(&mut state, Method::Time, &["t".into()])
                .is_some_and(|s| s.contains("already exists"))
        );
        let logged = text(&mut state, Method::TimeLog, &["t".into(), "extra".into()]).unwrap_or_default();
        assert!(logged.starts_with("t: "));
        assert!(logged.ends_with("ms extra"));
        let ended = text(&mut state, Method::TimeEnd, &["t".into()]).unwrap_or_default();
        assert!(ended.starts_with("t: ") && ended.ends_with("ms"));
        assert_eq!(
            text(&mut state, Method::TimeEnd, &["t".into()]).as_deref(),
            Some("No such label 't' for console.timeEnd()")
        );
    }

    #[test]
    fn test_assert() {
        let mut state = CallState::new();
        assert!(text(&mut state, Method::Assert, &[true.into(), "ok".into()]).is_none());
        assert_eq!(
            text(&mut state, Method::Assert, &[false.into()]).as_deref(),
            Some("Assertion failed")
        );
        assert_eq!(
            text(&mut state, Method::Assert, &[0.into(), "x is %d".into(), 5.into()]).as_deref(),
            Some("Assertion failed: x is 5")
        );
        assert_eq!(
            text(&mut state, Method::Assert, &[Value::Null, 1.into()]).as_deref(),
            Some("Assertion failed 1")
        );
    }

    #[test]
    fn test_groups_indent() {
        let mut state = CallState::new();
        assert_eq!(text(&mut state, Method::Group, &["outer".into()]).as_deref(), Some("outer"));
        assert_eq!(text(&mut state, Method::Log, &["a\nb".into()]).as_deref(), Some("  a\n  b"));
        assert!(text(&mut state, Method::GroupCollapsed, &[]).is_none());
        assert_eq!(text(&mut state, Method::Log, &["c".into()]).as_deref(), Some("    c"));
        assert!(text(&mut state, Method::GroupEnd, &[]).is_none());
        assert!(text(&mut state, Method::GroupEnd, &[]).is_none());
        assert!(text(&mut state, Method::GroupEnd, &[]).is_none());
        assert_eq!(state.group_depth(), 0);
    }

    #[test]
    fn test_dir_inspects_strings_quoted() {
        let mut state = CallState::new();
        assert_eq!(text(&mut state, Method::Dir, &["s".into()]).as_deref(), Some("'s'"));
    }

    #[test]
    fn test_table_falls_back_to_log() {
        let mut state = CallState::new();
        assert_eq!(text(&mut state, Method::Table, &["plain".into()]).as_deref(), Some("plain"));
        let rows = Object::from_values([Object::from_entries([("a", 1)])]);
        assert!(
            text(&mut state, Method::Table, &[rows.into()]).is_some_and(|t| t.starts_with('┌'))
        );
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_micros(1234)), "1.234ms");
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.500s");
    }

    #[cfg(feature = "html")]
    #[test]
    fn test_html_indent_and_block() {
        let mut state = CallState::new();
        state.resolve(Method::Group, &[]);
        let out = state
            .resolve(Method::Log, &["<x>".into()])
            .map(|o| o.to_html(&FormatOptions::default()));
        assert_eq!(out.as_deref(), Some("  &lt;x&gt;"));
    }
}
