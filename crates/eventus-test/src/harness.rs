//! Test harness helpers.

use std::io::Write;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test writer using `filter`.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Write `content` to a temporary `.toml` file.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
#[must_use]
pub fn test_config_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Poll `predicate` until it holds or `timeout` elapses.
///
/// Returns the final value of the predicate.
#[must_use]
pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now()
        .checked_add(timeout)
        .unwrap_or_else(Instant::now);
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// [`wait_until`] with a timeout generous enough for a loaded CI machine.
#[must_use]
pub fn eventually(predicate: impl FnMut() -> bool) -> bool {
    wait_until(Duration::from_secs(5), predicate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_until_immediate() {
        assert!(wait_until(Duration::from_millis(1), || true));
    }

    #[test]
    fn test_wait_until_times_out() {
        assert!(!wait_until(Duration::from_millis(10), || false));
    }

    #[test]
    fn test_config_file_contents() {
        let file = test_config_file("gc = false\n");
        let read = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(read, "gc = false\n");
        assert!(file.path().extension().is_some_and(|e| e == "toml"));
    }
}
