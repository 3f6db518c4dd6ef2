//! Media capture port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::Frame;

/// Supplier of live camera streams
#[async_trait]
pub trait MediaCaptureSource: Send + Sync {
    /// Acquire the rear-facing camera.
    ///
    /// Fails with `Error::CaptureUnavailable` when permission is denied or no
    /// camera exists.
    async fn start(&self) -> Result<Box<dyn CaptureStream>>;
}

/// An acquired stream. Holding one keeps the camera busy until `stop`.
pub trait CaptureStream: Send {
    /// Latest frame, or None while the stream has no frame ready
    fn next_frame(&mut self) -> Option<Frame>;

    /// Release the camera. Must be idempotent.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}
