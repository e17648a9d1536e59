//! Version string recorded in logs and @PG records.

/// Cargo package version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
