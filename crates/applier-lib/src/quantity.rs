//! Kubernetes resource quantity formatting
//!
//! Renders recommendation values in the units the API server expects:
//! millicores for CPU and mebibytes for memory.

/// Bytes per mebibyte
pub const BYTES_PER_MI: i64 = 1024 * 1024;

/// Format millicores as a CPU quantity, e.g. `250m`.
///
/// Values are passed through untouched, negatives included.
pub fn format_cpu(millicores: i64) -> String {
    format!("{}m", millicores)
}

/// Format bytes as a memory quantity in whole mebibytes, e.g. `512Mi`.
///
/// Rounds half away from zero, so 0.5Mi becomes `1Mi`.
pub fn format_memory(bytes: i64) -> String {
    let mi = bytes as f64 / BYTES_PER_MI as f64;
    format!("{}Mi", mi.round() as i64)
}
