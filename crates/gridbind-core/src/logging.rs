//! Logging facilities for gridbind.
//!
//! gridbind uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("gridbind=debug")
//!     .init();
//! ```
//!
//! Use the constants in [`targets`] to filter by subsystem.

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "gridbind_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "gridbind_core::signal";
    /// Flush queue target.
    pub const FLUSH: &str = "gridbind_core::flush";
    /// Binding controller target (resets, patches, paging).
    pub const BINDING: &str = "gridbind::binding";
    /// Data source target.
    pub const SOURCE: &str = "gridbind::source";
    /// Selection tracker target.
    pub const SELECTION: &str = "gridbind::selection";
    /// Performance spans.
    pub const PERF: &str = "gridbind::perf";
}

/// Span names used for tracing.
pub mod span_names {
    /// A full reset of a table's visible rows.
    pub const RESET: &str = "gridbind::reset";
    /// A single-row patch.
    pub const REFRESH_ITEM: &str = "gridbind::refresh_item";
    /// A flush of deferred notifications.
    pub const FLUSH: &str = "gridbind::flush";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing an operation in a profiler or a `tracing` layer that
/// records span durations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "gridbind::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new(span_names::RESET);
    }

    #[test]
    fn test_targets_are_prefixed() {
        for target in [targets::SIGNAL, targets::FLUSH] {
            assert!(target.starts_with(targets::CORE));
        }
        for target in [targets::BINDING, targets::SOURCE, targets::SELECTION] {
            assert!(target.starts_with("gridbind::"));
        }
    }
}
