//! Testing utilities for ghostlog consoles
//!
//! - [`TestConsole`] captures output and offers assertions on it
//! - [`RecordingSink`] stands in for the real console and records forwarded calls
//! - [`MemoryStream`] is an output stream with a settable size and resize events

mod memory_stream;
mod recording_sink;
mod test_console;

pub use memory_stream::MemoryStream;
pub use recording_sink::{RecordedCall, RecordingSink};
pub use test_console::TestConsole;
