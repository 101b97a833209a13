//! Console method surface and the per-instance capability table.

use std::fmt;
use std::str::FromStr;

use ghostlog_core::Error;

/// A console method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Log,
    Info,
    Warn,
    Debug,
    Error,
    Table,
    Dir,
    Assert,
    Count,
    CountReset,
    Time,
    TimeLog,
    TimeEnd,
    Group,
    GroupCollapsed,
    GroupEnd,
}

impl Method {
    /// Every method, in declaration order.
    pub const ALL: [Method; 16] = [
        Method::Log,
        Method::Info,
        Method::Warn,
        Method::Debug,
        Method::Error,
        Method::Table,
        Method::Dir,
        Method::Assert,
        Method::Count,
        Method::CountReset,
        Method::Time,
        Method::TimeLog,
        Method::TimeEnd,
        Method::Group,
        Method::GroupCollapsed,
        Method::GroupEnd,
    ];

    /// The minimal surface every console must capture.
    pub const CORE: [Method; 5] = [
        Method::Log,
        Method::Info,
        Method::Warn,
        Method::Debug,
        Method::Error,
    ];

    /// The method's name as call sites spell it.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Debug => "debug",
            Self::Error => "error",
            Self::Table => "table",
            Self::Dir => "dir",
            Self::Assert => "assert",
            Self::Count => "count",
            Self::CountReset => "countReset",
            Self::Time => "time",
            Self::TimeLog => "timeLog",
            Self::TimeEnd => "timeEnd",
            Self::Group => "group",
            Self::GroupCollapsed => "groupCollapsed",
            Self::GroupEnd => "groupEnd",
        }
    }

    /// Whether this method belongs to the minimal surface.
    #[must_use]
    pub fn is_core(self) -> bool {
        Self::CORE.contains(&self)
    }

    /// Whether a real console writes this method's output to the error stream.
    #[must_use]
    pub fn is_diagnostic(self) -> bool {
        matches!(self, Self::Warn | Self::Error | Self::Assert)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::UnknownMethod(s.to_string()))
    }
}

impl From<log::Level> for Method {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug | log::Level::Trace => Self::Debug,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Capability table
// ─────────────────────────────────────────────────────────

/// What an instance does with a call to one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capability {
    /// Append the call's output to the instance's buffers.
    pub record: bool,
    /// Forward the original call to the base console.
    pub forward: bool,
}

/// Per-method behavior, built once when an instance is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTable {
    entries: [Capability; Method::ALL.len()],
}

impl MethodTable {
    /// Builds the table for an instance.
    ///
    /// Core methods are recorded when `record` is set; the extended surface
    /// (tables, counters, timers, groups, ...) is recorded only when
    /// `extended` is also set and is otherwise just forwarded.
    #[must_use]
    pub fn new(record: bool, forward: bool, extended: bool) -> Self {
        let mut entries = [Capability::default(); Method::ALL.len()];
        for method in Method::ALL {
            entries[method.index()] = Capability {
                record: record && (extended || method.is_core()),
                forward,
            };
        }
        Self { entries }
    }

    /// Looks up the capability for `method`.
    #[must_use]
    pub fn get(&self, method: Method) -> Capability {
        self.entries[method.index()]
    }

    /// Overrides the capability for one method.
    pub fn set(&mut self, method: Method, capability: Capability) {
        self.entries[method.index()] = capability;
    }
}
