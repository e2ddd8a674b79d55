use std::sync::{Mutex, MutexGuard};

static BUFFER: Mutex<Option<Vec<String>>> = Mutex::new(None);

fn buffer() -> MutexGuard<'static, Option<Vec<String>>> {
    BUFFER.lock().unwrap_or_else(|e| e.into_inner())
}

/// Start collecting warnings instead of printing them, so machine-readable
/// stdout output can carry them itself.
pub fn activate() {
    *buffer() = Some(Vec::new());
}

/// Stop collecting and return everything collected so far.
pub fn drain() -> Vec<String> {
    buffer().take().unwrap_or_default()
}

/// Write a warning message. If buffering is active the message is stored;
/// otherwise it is printed to stderr immediately.
pub fn warn(msg: String) {
    let mut guard = buffer();
    if let Some(buf) = guard.as_mut() {
        buf.push(msg);
    } else {
        drop(guard);
        eprintln!("{}", msg);
    }
}

/// Like `eprintln!`, but routed through the diagnostics buffer when it is active.
#[macro_export]
macro_rules! buffered_eprintln {
    ($($arg:tt)*) => {
        $crate::diagnostics::warn(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the buffer is process-global
    #[test]
    fn test_buffer_collects_until_drained() {
        activate();
        crate::buffered_eprintln!("column '{}' is constant", "C");
        warn("second".to_string());

        let messages = drain();
        assert_eq!(messages, vec!["column 'C' is constant", "second"]);
        assert!(drain().is_empty());
    }
}
