//! Subscriber construction: `EnvFilter` over a JSON `fmt` layer.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Where formatted events go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// libtest's captured writer.
    TestWriter,
}

pub fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber; a second install is silently ignored.
pub fn init(target: LogTarget) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_current_span(true)
        .with_target(false);

    let _ = match target {
        LogTarget::Stdout => builder.try_init(),
        LogTarget::TestWriter => builder.with_test_writer().try_init(),
    };
}
