/// Diagnostic channel handed to the relocation core by the install pipeline.
pub trait MessageSink {
    fn debug(&self, message: &str);
    fn alert_error(&self, message: &str);
}

/// Sink backed by the global console logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    pub debug: bool,
}

impl ConsoleSink {
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl MessageSink for ConsoleSink {
    fn debug(&self, message: &str) {
        crate::debug(message, self.debug);
    }

    fn alert_error(&self, message: &str) {
        crate::error(message);
    }
}
