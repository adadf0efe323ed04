//! Bind mount representation and engine argument formatting
//!
//! Formatting is pure: it never touches the filesystem, and identical inputs
//! always produce identical strings. A path that cannot be represented in the
//! active dialect's grammar fails with `InvalidPath` rather than producing a
//! corrupted argument.

use std::path::PathBuf;
use styx_foundation::{Error, Result};

// ============================================================================
// Mount
// ============================================================================

/// A single host-to-container bind mount accumulated by an execution.
///
/// Immutable once created and owned exclusively by the execution that
/// created it. `sequence_id` is embedded in the container path, so two
/// inputs never collide even when their host basenames do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    /// Absolute path on the host
    pub host_path: PathBuf,
    /// Path the host file/directory becomes visible at inside the container
    pub container_path: String,
    /// Mount writable instead of read-only
    pub writable: bool,
    /// Position in declaration order, unique within one execution
    pub sequence_id: u32,
}

// ============================================================================
// MountFormatter
// ============================================================================

/// Formats one mount into the engine's bind-mount argument grammar.
///
/// One formatter is active per runner; rejection and escaping are never mixed
/// for the same character within a dialect.
pub trait MountFormatter: Send + Sync {
    /// CLI flag preceding each mount specification
    fn flag(&self) -> &'static str;

    /// Render one mount specification
    fn format(&self, host_path: &str, container_path: &str, writable: bool) -> Result<String>;
}

// ============================================================================
// Colon dialect
// ============================================================================

/// `host:container[:ro]` bind syntax (`--bind`).
///
/// The grammar has no escape mechanism, so `,`, `\` and `:` are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColonMountFormatter;

const COLON_FORBIDDEN: [char; 3] = [',', '\\', ':'];

impl MountFormatter for ColonMountFormatter {
    fn flag(&self) -> &'static str {
        "--bind"
    }

    fn format(&self, host_path: &str, container_path: &str, writable: bool) -> Result<String> {
        if let Some(c) = host_path
            .chars()
            .chain(container_path.chars())
            .find(|c| COLON_FORBIDDEN.contains(c))
        {
            return Err(Error::invalid_path(format!(
                "'{c}' cannot be represented in the bind mount syntax"
            )));
        }

        let mode = if writable { "" } else { ":ro" };
        Ok(format!("{host_path}:{container_path}{mode}"))
    }
}

// ============================================================================
// CSV dialect
// ============================================================================

/// `type=bind,source=…,destination=…[,ro]` key=value syntax (`--mount`).
///
/// Embedded `\`, `"`, `,` and `:` are backslash-escaped instead of rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvMountFormatter;

impl MountFormatter for CsvMountFormatter {
    fn flag(&self) -> &'static str {
        "--mount"
    }

    fn format(&self, host_path: &str, container_path: &str, writable: bool) -> Result<String> {
        let mode = if writable { "" } else { ",ro" };
        Ok(format!(
            "type=bind,source={},destination={}{}",
            escape_csv_value(host_path),
            escape_csv_value(container_path),
            mode
        ))
    }
}

fn escape_csv_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | ',' | ':') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
