use crate::Error;

/// Hooks the codecs call at fixed points in the frame lifecycle.
///
/// Every method has an empty default, so implementors only override what they
/// care about.
pub trait LinkObserver: Send + Sync {
    /// `wire` is the complete encoded frame, delimiters included.
    fn frame_sent(&self, _wire: &[u8]) {}

    /// `address` and `control` are `None` for raw frames.
    fn frame_received(&self, _address: Option<u8>, _control: Option<u8>, _payload: &[u8]) {}

    /// Both recovered framing errors and errors about to be returned to the
    /// caller pass through here.
    fn error(&self, _error: &Error) {}

    /// An address or control byte collides with a reserved value and is being
    /// sent unescaped.
    fn ambiguous_header(&self, _address: u8, _control: u8) {}
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NoopObserver;

impl LinkObserver for NoopObserver {}

/// Reports everything as `tracing` events.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TracingObserver;

impl LinkObserver for TracingObserver {
    fn frame_sent(&self, wire: &[u8]) {
        tracing::debug!(frame = %hex::encode(wire), "frame sent");
    }

    fn frame_received(&self, address: Option<u8>, control: Option<u8>, payload: &[u8]) {
        tracing::debug!(
            ?address,
            ?control,
            payload = %hex::encode(payload),
            "frame received"
        );
    }

    fn error(&self, error: &Error) {
        match error {
            Error::Framing(e) => tracing::warn!(error = %e, "discarding malformed frame"),
            e => tracing::error!(error = %e, "frame error"),
        }
    }

    fn ambiguous_header(&self, address: u8, control: u8) {
        tracing::warn!(
            address = %hex::encode([address]),
            control = %hex::encode([control]),
            "reserved byte in unescaped frame header"
        );
    }
}
