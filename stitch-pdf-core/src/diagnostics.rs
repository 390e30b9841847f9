//! Recoverable-condition reporting.
//!
//! Parsers and the merger never print or mutate global state when they hit
//! something recoverable. They report through an injected [`DiagnosticSink`].

/// Receiver for non-fatal parse and merge diagnostics.
pub trait DiagnosticSink {
    fn warning(&mut self, message: &str);
}

/// Routes warnings to the `tracing` subscriber. The default sink.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warning(&mut self, message: &str) {
        tracing::warn!(target: "stitch_pdf", "{message}");
    }
}

/// Discards all diagnostics.
#[derive(Debug, Default)]
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn warning(&mut self, _message: &str) {}
}

/// Collects diagnostics for later inspection. Used by tests.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub messages: Vec<String>,
}

impl DiagnosticSink for BufferSink {
    fn warning(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_collects() {
        let mut sink = BufferSink::default();
        sink.warning("first");
        sink.warning("second");
        assert_eq!(sink.messages, vec!["first", "second"]);
    }

    #[test]
    fn test_silent_sink_drops() {
        let mut sink = SilentSink;
        sink.warning("ignored");
    }
}
