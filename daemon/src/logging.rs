use std::env;

use tracing_subscriber::EnvFilter;

const CRATE_TARGET: &str = "navchime";

/// Compute the filter spec with precedence:
/// - `debug` forces crate-scoped `debug`
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(debug: bool, rust_log: Option<&str>) -> String {
    if debug {
        return format!("{CRATE_TARGET}=debug");
    }
    match rust_log {
        Some(spec) if !spec.trim().is_empty() => spec.to_string(),
        _ => format!("{CRATE_TARGET}=info"),
    }
}

/// Installs the global stderr subscriber. Safe to call more than once; only
/// the first call takes effect.
pub fn init(debug: bool) {
    let rust_log = env::var("RUST_LOG").ok();
    let filter = EnvFilter::new(compute_spec(debug, rust_log.as_deref()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_overrides_rust_log() {
        assert_eq!(compute_spec(true, Some("warn")), "navchime=debug");
    }

    #[test]
    fn rust_log_used_when_not_debugging() {
        assert_eq!(compute_spec(false, Some("navchime=trace")), "navchime=trace");
    }

    #[test]
    fn default_is_crate_scoped_info() {
        assert_eq!(compute_spec(false, None), "navchime=info");
        assert_eq!(compute_spec(false, Some("  ")), "navchime=info");
    }
}
