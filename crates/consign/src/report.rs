/// Logging seam threaded through every pipeline operation.
///
/// The library never writes to stdout/stderr itself; hosts decide how lines
/// are rendered. Debug lines carry per-file classification and skip
/// decisions and are expected to be dropped unless the host enables them.
pub trait Reporter {
    fn debug(&mut self, msg: &str);
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Reporter that discards everything. Useful for hosts that surface errors
/// through return values only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn debug(&mut self, _msg: &str) {}
    fn info(&mut self, _msg: &str) {}
    fn warn(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}
