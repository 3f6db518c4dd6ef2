//! Cancellable per-frame QR polling
//!
//! A `ScanTask` owns an acquired capture stream and a spawned task that reads
//! one frame per tick and tries to decode it. The stream is shared with the
//! handle so `stop` can release the camera synchronously, without waiting
//! for the task to observe cancellation.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ports::CaptureStream;
use crate::services::qr;

/// Default delay between two decode attempts
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Shortest accepted delay; `tokio::time::interval` panics on zero
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

type SharedStream = Arc<Mutex<Box<dyn CaptureStream>>>;

fn lock_stream(stream: &SharedStream) -> MutexGuard<'_, Box<dyn CaptureStream>> {
    // A poisoned lock still holds a stream that must be released
    stream.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

enum Poll {
    Payload(String),
    Nothing,
    Ended,
}

/// Read one frame and try to decode it. Blocking: frame sources may read
/// files and the decoder is CPU-bound.
fn poll_once(stream: &SharedStream) -> Poll {
    let frame = {
        let mut stream = lock_stream(stream);
        if !stream.is_active() {
            return Poll::Ended;
        }
        stream.next_frame()
    };

    match frame.as_ref().and_then(qr::decode_frame) {
        Some(payload) => Poll::Payload(payload),
        None => Poll::Nothing,
    }
}

/// Handle to a running scan
pub struct ScanTask {
    stream: SharedStream,
    handle: Option<JoinHandle<()>>,
    result: oneshot::Receiver<String>,
}

impl ScanTask {
    /// Start polling `stream` every `frame_interval`
    ///
    /// Intervals below `MIN_FRAME_INTERVAL` are raised to it. Frames are
    /// read and decoded on the blocking pool. Must be called from within a
    /// tokio runtime.
    pub fn start(stream: Box<dyn CaptureStream>, frame_interval: Duration) -> Self {
        let frame_interval = frame_interval.max(MIN_FRAME_INTERVAL);
        let stream: SharedStream = Arc::new(Mutex::new(stream));
        let (tx, rx) = oneshot::channel();
        let task_stream = Arc::clone(&stream);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let polled_stream = Arc::clone(&task_stream);
                let polled = tokio::task::spawn_blocking(move || poll_once(&polled_stream)).await;
                match polled {
                    Ok(Poll::Payload(payload)) => {
                        lock_stream(&task_stream).stop();
                        let _ = tx.send(payload);
                        return;
                    }
                    Ok(Poll::Nothing) => continue,
                    // Stream ended, or the decoder panicked
                    Ok(Poll::Ended) | Err(_) => return,
                }
            }
        });

        Self {
            stream,
            handle: Some(handle),
            result: rx,
        }
    }

    /// Wait for the first decoded payload.
    ///
    /// Returns None if the stream ended or the scan was stopped first.
    /// Cancel-safe: dropping the future leaves the scan running.
    pub async fn payload(&mut self) -> Option<String> {
        (&mut self.result).await.ok()
    }

    /// Stop polling and release the camera. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        lock_stream(&self.stream).stop();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScanTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use image::DynamicImage;

    use super::*;
    use crate::domain::Frame;
    use crate::services::qr::fixtures::qr_image;

    /// Stream that yields `blank_frames` empty frames, then a QR frame
    struct FakeStream {
        blank_frames: usize,
        payload: Option<&'static str>,
        active: Arc<AtomicBool>,
    }

    impl CaptureStream for FakeStream {
        fn next_frame(&mut self) -> Option<Frame> {
            if self.blank_frames > 0 {
                self.blank_frames -= 1;
                return Some(Frame::new(8, 8, vec![255; 8 * 8 * 4]));
            }
            let rgba = DynamicImage::ImageLuma8(qr_image(self.payload?)).to_rgba8();
            Some(Frame::new(rgba.width(), rgba.height(), rgba.into_raw()))
        }

        fn stop(&mut self) {
            self.active.store(false, Ordering::SeqCst);
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    fn fake(blank_frames: usize, payload: Option<&'static str>) -> (Box<FakeStream>, Arc<AtomicBool>) {
        let active = Arc::new(AtomicBool::new(true));
        let stream = Box::new(FakeStream {
            blank_frames,
            payload,
            active: active.clone(),
        });
        (stream, active)
    }

    #[tokio::test]
    async fn test_payload_after_blank_frames() {
        let (stream, active) = fake(3, Some("ABC123"));
        let mut scan = ScanTask::start(stream, Duration::from_millis(1));

        assert_eq!(scan.payload().await.as_deref(), Some("ABC123"));
        // Stream released as soon as a code is found
        assert!(!active.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stop_releases_stream_immediately() {
        let (stream, active) = fake(usize::MAX, None);
        let mut scan = ScanTask::start(stream, Duration::from_millis(5));

        scan.stop();
        assert!(!active.load(Ordering::SeqCst));
        assert!(scan.payload().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_stream() {
        let (stream, active) = fake(usize::MAX, None);
        let scan = ScanTask::start(stream, Duration::from_millis(5));
        drop(scan);
        assert!(!active.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let (stream, active) = fake(2, Some("ZERO-TICK"));
        let mut scan = ScanTask::start(stream, Duration::ZERO);

        assert_eq!(scan.payload().await.as_deref(), Some("ZERO-TICK"));
        assert!(!active.load(Ordering::SeqCst));
    }

    /// Stream whose frame reads block the calling thread
    struct SlowStream {
        active: Arc<AtomicBool>,
    }

    impl CaptureStream for SlowStream {
        fn next_frame(&mut self) -> Option<Frame> {
            std::thread::sleep(Duration::from_millis(100));
            None
        }

        fn stop(&mut self) {
            self.active.store(false, Ordering::SeqCst);
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    // Single-threaded runtime: a frame read on the worker would delay the timer
    #[tokio::test(flavor = "current_thread")]
    async fn test_slow_frames_do_not_stall_the_runtime() {
        let active = Arc::new(AtomicBool::new(true));
        let mut scan = ScanTask::start(
            Box::new(SlowStream {
                active: active.clone(),
            }),
            Duration::from_millis(1),
        );
        tokio::task::yield_now().await;

        let started = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(started.elapsed() < Duration::from_millis(80));

        scan.stop();
        assert!(!active.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_payload_times_out_while_scanning() {
        let (stream, active) = fake(usize::MAX, None);
        let mut scan = ScanTask::start(stream, Duration::from_millis(1));

        let waited = tokio::time::timeout(Duration::from_millis(30), scan.payload()).await;
        assert!(waited.is_err());
        assert!(active.load(Ordering::SeqCst));
        assert!(scan.is_running());
    }
}
