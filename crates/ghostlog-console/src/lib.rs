//! Capturing consoles for ghostlog.
//!
//! A [`CaptureConsole`] stands in for the platform console: it records what
//! every call prints, as plain text and as HTML, and can still forward the
//! original call to the real console. The [`router`] decides which console
//! a call reaches, per task, so concurrent work captures its own output.
//!
//! ```ignore
//! use ghostlog_console::{CaptureConsole, ConsoleConfig, ErrorValue, console_error, console_log};
//!
//! let capture = CaptureConsole::new(ConsoleConfig::new());
//! capture
//!     .run_async(async {
//!         console_log!("Hello, %s!", "World");
//!         console_error!(ErrorValue::new("boom"));
//!     })
//!     .await?;
//! assert!(capture.outputs().starts_with("Hello, World!\n"));
//! ```

#![forbid(unsafe_code)]

pub mod calls;
pub mod config;
pub mod console;
pub mod detection;
pub mod escapes;
pub mod global;
pub mod logging;
pub mod method;
pub mod router;
pub mod sink;
pub mod stream;
pub mod table;
pub mod testing;

pub use config::{ConsoleConfig, ErrorHandler, Settings};
pub use crate::console::{CaptureConsole, ConsoleRef};
pub use detection::ColorDepth;
pub use global::{console, default_console, extension, remove_extension, set_extension};
pub use method::{Capability, Method, MethodTable};
pub use router::{ContextStrategy, GlobalCellStrategy, TaskLocalStrategy};
pub use sink::{ConsoleSink, StdConsole};
pub use stream::{OutputStream, TermStream, TerminalSize};

pub use ghostlog_core::{Error, ErrorValue, FormatOptions, InspectOptions, Object, Result, Value};
