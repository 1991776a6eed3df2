//! Process-wide tracing setup shared by the depot crates and their tests.

/// Install the JSON subscriber (filter from `RUST_LOG`, default `info`).
///
/// Safe to call multiple times; only the first call installs anything.
pub fn init() {
    self::tracing::init(self::tracing::LogTarget::Stdout);
}

/// Same as [`init`], but routes output through the test harness so it is
/// captured per test.
pub fn init_for_tests() {
    self::tracing::init(self::tracing::LogTarget::TestWriter);
}

/// Subscriber construction.
pub mod tracing;
