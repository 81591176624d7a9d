//! Scanner input adapter.
//!
//! Owns the camera seam of one scan station. A [`PayloadSource`] yields
//! decoded frame payloads; [`ScannerAdapter`] layers station behavior on
//! top: suppressing repeat reads while a code is held in frame, and the
//! pause/resume gate used while a decision or result card is showing.

use std::collections::VecDeque;

use thiserror::Error;

/// Failure modes of the capture device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScannerError {
    /// The input device could not be opened or permission was denied.
    /// Not retryable without operator action.
    #[error("Camera unavailable: {reason}")]
    CameraUnavailable { reason: String },
}

/// A stream of decoded QR payloads from a capture device.
///
/// Implementations wrap a camera pipeline and yield the latest decoded frame
/// on each poll, dropping frames decoded while nobody polled. The same
/// payload repeats for as long as a code stays in frame.
pub trait PayloadSource {
    fn poll_frame(&mut self) -> Result<Option<String>, ScannerError>;
}

/// Camera-owning adapter for one scan station.
///
/// Exclusively owns its [`PayloadSource`] for its lifetime; dropping the
/// adapter releases the device. Emits a payload only when it differs from
/// the immediately preceding emission, and the remembered emission is
/// forgotten on [`resume`](Self::resume), so a deliberate re-scan after a
/// result card clears is read again.
pub struct ScannerAdapter<S> {
    source: S,
    last_emitted: Option<String>,
    paused: bool,
}

impl<S: PayloadSource> ScannerAdapter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_emitted: None,
            paused: false,
        }
    }

    /// Next distinct payload, if any. Returns `Ok(None)` while paused, when
    /// no frame decoded, or when the frame repeats the last emission.
    pub fn poll_payload(&mut self) -> Result<Option<String>, ScannerError> {
        if self.paused {
            return Ok(None);
        }
        match self.source.poll_frame()? {
            None => Ok(None),
            Some(raw) if self.last_emitted.as_deref() == Some(raw.as_str()) => Ok(None),
            Some(raw) => {
                self.last_emitted = Some(raw.clone());
                Ok(Some(raw))
            }
        }
    }

    /// Halts the feed without releasing the device.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Restarts the feed and forgets the last emission.
    pub fn resume(&mut self) {
        self.paused = false;
        self.last_emitted = None;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Releases the capture device.
    pub fn close(self) {}
}

/// Scripted source for tests and dry-run stations.
#[derive(Debug, Default)]
pub struct ScriptedPayloadSource {
    frames: VecDeque<Result<Option<String>, ScannerError>>,
}

impl ScriptedPayloadSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decoded frame.
    pub fn then_payload(mut self, payload: impl Into<String>) -> Self {
        self.frames.push_back(Ok(Some(payload.into())));
        self
    }

    /// Appends a tick with no code in frame.
    pub fn then_idle(mut self) -> Self {
        self.frames.push_back(Ok(None));
        self
    }

    /// Appends a device failure.
    pub fn then_error(mut self, reason: impl Into<String>) -> Self {
        self.frames.push_back(Err(ScannerError::CameraUnavailable {
            reason: reason.into(),
        }));
        self
    }
}

impl PayloadSource for ScriptedPayloadSource {
    fn poll_frame(&mut self) -> Result<Option<String>, ScannerError> {
        self.frames.pop_front().unwrap_or(Ok(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_distinct_payloads_in_order() {
        let source = ScriptedPayloadSource::new()
            .then_payload("ticket-a")
            .then_idle()
            .then_payload("ticket-b");
        let mut adapter = ScannerAdapter::new(source);

        assert_eq!(adapter.poll_payload().unwrap().as_deref(), Some("ticket-a"));
        assert_eq!(adapter.poll_payload().unwrap(), None);
        assert_eq!(adapter.poll_payload().unwrap().as_deref(), Some("ticket-b"));
        assert_eq!(adapter.poll_payload().unwrap(), None);
    }

    #[test]
    fn test_suppresses_repeat_of_last_emission() {
        let source = ScriptedPayloadSource::new()
            .then_payload("ticket-a")
            .then_payload("ticket-a")
            .then_payload("ticket-b")
            .then_payload("ticket-a");
        let mut adapter = ScannerAdapter::new(source);

        assert_eq!(adapter.poll_payload().unwrap().as_deref(), Some("ticket-a"));
        // Same code still in frame.
        assert_eq!(adapter.poll_payload().unwrap(), None);
        assert_eq!(adapter.poll_payload().unwrap().as_deref(), Some("ticket-b"));
        // Differs from the previous emission again, so it is read.
        assert_eq!(adapter.poll_payload().unwrap().as_deref(), Some("ticket-a"));
    }

    #[test]
    fn test_resume_clears_suppression() {
        let source = ScriptedPayloadSource::new()
            .then_payload("ticket-a")
            .then_payload("ticket-a");
        let mut adapter = ScannerAdapter::new(source);

        assert_eq!(adapter.poll_payload().unwrap().as_deref(), Some("ticket-a"));
        adapter.pause();
        adapter.resume();
        assert_eq!(adapter.poll_payload().unwrap().as_deref(), Some("ticket-a"));
    }

    #[test]
    fn test_pause_blocks_reads_without_consuming_frames() {
        let source = ScriptedPayloadSource::new().then_payload("ticket-a");
        let mut adapter = ScannerAdapter::new(source);

        adapter.pause();
        assert!(adapter.is_paused());
        assert_eq!(adapter.poll_payload().unwrap(), None);

        adapter.resume();
        assert_eq!(adapter.poll_payload().unwrap().as_deref(), Some("ticket-a"));
    }

    #[test]
    fn test_device_error_propagates() {
        let source = ScriptedPayloadSource::new().then_error("permission denied");
        let mut adapter = ScannerAdapter::new(source);

        let err = adapter.poll_payload().unwrap_err();
        assert_eq!(
            err,
            ScannerError::CameraUnavailable {
                reason: "permission denied".to_string()
            }
        );
        assert_eq!(err.to_string(), "Camera unavailable: permission denied");
    }
}
