//! Session trace IDs

use tracing::Span;
use uuid::Uuid;

/// Generate a new trace ID using UUID v4
///
/// Every log line emitted while a session runs carries this ID, so the
/// upload, the stream and every decode of one session can be correlated.
///
/// # Examples
///
/// ```
/// use pitchlens::logging::generate_trace_id;
///
/// let trace_id = generate_trace_id();
/// assert!(!trace_id.is_empty());
/// ```
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one session run.
pub fn session_span(trace_id: &str, file: &str) -> Span {
    tracing::info_span!("session", trace_id = %trace_id, file = %file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_trace_id_format() {
        let id = generate_trace_id();
        // UUID v4 format: xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn test_generate_trace_id_uniqueness() {
        assert_ne!(generate_trace_id(), generate_trace_id());
    }

    #[test]
    fn test_generate_trace_id_parseable() {
        assert!(Uuid::parse_str(&generate_trace_id()).is_ok());
    }
}
