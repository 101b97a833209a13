//! Core formatting engine for ghostlog.
//!
//! This crate turns console call arguments into text and HTML:
//! - [`Value`] models dynamically-typed console arguments, including cyclic
//!   object graphs
//! - [`inspect`] is the cycle-safe, depth-limited structural stringifier
//! - [`format_text`] / [`format_html`] implement printf-style templates
//! - [`html`] escapes text and converts ANSI colors to inline spans
//!
//! # Design Principles
//!
//! - Pure functions, no global state
//! - Formatting never fails and never panics on malformed input
//! - All types support `Send + Sync`

#![forbid(unsafe_code)]

pub mod error;
pub mod format;
#[cfg(feature = "html")]
pub mod html;
pub mod inspect;
pub mod json;
pub mod logging;
pub mod number;
pub mod value;

pub use error::{Error, Result};
#[cfg(feature = "html")]
pub use format::format_html;
pub use format::{FormatOptions, format_text, to_display_string};
pub use inspect::{InspectOptions, inspect, inspect_argument};
pub use value::{ErrorValue, Object, ObjectKind, PropertyKey, Value};
