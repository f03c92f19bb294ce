//! Tracing and logging setup shared by both service binaries.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(service: &'static str) {
    tracing::init();
    ::tracing::info!(service, "observability initialized");
}

/// Tracing configuration (filters, layers).
pub mod tracing;
