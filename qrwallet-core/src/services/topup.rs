//! Wallet top-up flow
//!
//! The dialog that takes a redeem code from the camera, an uploaded image or
//! the keyboard, submits it, and refreshes the balance. All operations take
//! `&mut self`, so at most one submission can be in flight per flow.
//!
//! ```text
//! Idle -> ChoosingMethod -> CameraActive -> ManualEntry -> Submitting -> Idle
//!                        -> FilePicker   ->
//!                        -> ManualEntry
//! ```
//!
//! `cancel` returns to Idle from anywhere and releases the camera.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::result::{Error, Result};
use crate::domain::{CaptureMethod, FlowState, Notice, RedeemCode, SubmitOutcome};
use crate::ports::MediaCaptureSource;
use crate::services::logging::{LogEvent, LoggingService};
use crate::services::qr;
use crate::services::scanner::{ScanTask, DEFAULT_FRAME_INTERVAL};
use crate::services::{RedemptionLedger, WalletService};

pub const MSG_CAMERA_UNAVAILABLE: &str =
    "Camera is not available, upload an image or enter the code manually";
pub const MSG_QR_NOT_RECOGNIZED: &str = "QR code not recognized, try again with a clearer image";
pub const MSG_EMPTY_CODE: &str = "Please enter the barcode number";
pub const MSG_TOPUP_SUCCEEDED: &str = "Top-up succeeded";
pub const MSG_BALANCE_UNCONFIRMED: &str = "Top-up succeeded, but the balance could not be read";
pub const MSG_TRANSPORT_FAILED: &str = "An error occurred while reading the QR code";

pub struct WalletTopUpFlow {
    wallet: Arc<WalletService>,
    ledger: Arc<RedemptionLedger>,
    camera: Arc<dyn MediaCaptureSource>,
    logger: Option<Arc<LoggingService>>,
    frame_interval: Duration,

    state: FlowState,
    method: Option<CaptureMethod>,
    code: String,
    inline_error: Option<String>,
    notice: Option<Notice>,
    // Dropping the flow drops the scan, which releases the camera
    scan: Option<ScanTask>,
}

impl WalletTopUpFlow {
    pub fn new(
        wallet: Arc<WalletService>,
        ledger: Arc<RedemptionLedger>,
        camera: Arc<dyn MediaCaptureSource>,
    ) -> Self {
        Self {
            wallet,
            ledger,
            camera,
            logger: None,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            state: FlowState::Idle,
            method: None,
            code: String::new(),
            inline_error: None,
            notice: None,
            scan: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn method(&self) -> Option<CaptureMethod> {
        self.method
    }

    /// Code currently in the entry field
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Message shown inside the dialog (camera unavailable, retry, empty code)
    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    /// The current notice, unless it has expired
    pub fn notice(&self) -> Option<&Notice> {
        self.notice_at(Instant::now())
    }

    pub fn notice_at(&self, now: Instant) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| !n.is_expired_at(now))
    }

    pub fn is_capturing(&self) -> bool {
        self.scan.is_some()
    }

    fn log(&self, event: LogEvent) {
        let Some(logger) = &self.logger else {
            return;
        };
        let mut event = event.with_state(self.state);
        if let Some(method) = self.method {
            event = event.with_method(method);
        }
        // Logging must never break the flow
        let _ = logger.log(event);
    }

    fn expect_state(&self, expected: FlowState, action: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidTransition {
                state: self.state,
                action,
            });
        }
        Ok(())
    }

    fn stop_capture(&mut self) {
        if let Some(mut scan) = self.scan.take() {
            scan.stop();
        }
    }

    /// Open the dialog
    pub fn open(&mut self) -> Result<()> {
        self.expect_state(FlowState::Idle, "open the top-up dialog")?;
        self.code.clear();
        self.inline_error = None;
        self.method = None;
        self.state = FlowState::ChoosingMethod;
        self.log(LogEvent::new("topup_opened"));
        Ok(())
    }

    pub fn choose_manual_entry(&mut self) -> Result<()> {
        self.expect_state(FlowState::ChoosingMethod, "enter a code manually")?;
        self.code.clear();
        self.inline_error = None;
        self.method = Some(CaptureMethod::Manual);
        self.state = FlowState::ManualEntry;
        Ok(())
    }

    pub fn choose_file_picker(&mut self) -> Result<()> {
        self.expect_state(FlowState::ChoosingMethod, "upload an image")?;
        self.code.clear();
        self.inline_error = None;
        self.method = Some(CaptureMethod::File);
        self.state = FlowState::FilePicker;
        Ok(())
    }

    /// Acquire the rear camera and start scanning frames
    ///
    /// On failure the dialog stays on the method choice with an inline
    /// message, so the user can pick another method.
    pub async fn start_camera(&mut self) -> Result<()> {
        self.expect_state(FlowState::ChoosingMethod, "start the camera")?;
        self.code.clear();
        self.inline_error = None;
        self.method = Some(CaptureMethod::Camera);

        let stream = match self.camera.start().await {
            Ok(stream) => stream,
            Err(e) => {
                let reason = match e {
                    Error::CaptureUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                self.inline_error = Some(MSG_CAMERA_UNAVAILABLE.to_string());
                self.log(LogEvent::new("capture_unavailable").with_error(reason.as_str()));
                self.method = None;
                return Err(Error::CaptureUnavailable(reason));
            }
        };

        self.scan = Some(ScanTask::start(stream, self.frame_interval));
        self.state = FlowState::CameraActive;
        self.log(LogEvent::new("capture_started"));
        Ok(())
    }

    /// Wait until the camera sees a QR code
    ///
    /// On success the code is prefilled, the camera released and the flow
    /// moves to manual entry for confirmation. Cancel-safe: callers may race
    /// this against a cancel signal and then call `cancel`.
    pub async fn wait_for_scan(&mut self) -> Result<String> {
        self.expect_state(FlowState::CameraActive, "wait for a scan")?;
        let Some(scan) = self.scan.as_mut() else {
            return Err(Error::CaptureUnavailable("no active capture".to_string()));
        };

        let payload = scan.payload().await;
        self.stop_capture();

        match payload {
            Some(payload) => {
                self.code = payload.clone();
                self.state = FlowState::ManualEntry;
                self.log(LogEvent::new("qr_decoded").with_code(&payload));
                Ok(payload)
            }
            None => {
                self.state = FlowState::ChoosingMethod;
                self.inline_error = Some(MSG_CAMERA_UNAVAILABLE.to_string());
                self.log(LogEvent::new("capture_unavailable").with_error("stream ended"));
                self.method = None;
                Err(Error::CaptureUnavailable("camera stream ended".to_string()))
            }
        }
    }

    /// Decode an uploaded image file
    ///
    /// The file is read and decoded off the async worker threads.
    pub async fn decode_image_file(&mut self, path: &Path) -> Result<String> {
        self.expect_state(FlowState::FilePicker, "decode an image")?;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.decode_failed(format!("{}: {}", path.display(), e))),
        };

        let decoded = tokio::task::spawn_blocking(move || qr::decode_image_bytes(&bytes))
            .await
            .unwrap_or_else(|e| Err(Error::DecodeFailure(format!("decoder task failed: {}", e))));
        self.apply_decoded(decoded)
    }

    /// Decode an uploaded image held in memory
    ///
    /// Runs the decoder on the calling thread.
    pub fn decode_image_bytes(&mut self, bytes: &[u8]) -> Result<String> {
        self.expect_state(FlowState::FilePicker, "decode an image")?;
        let decoded = qr::decode_image_bytes(bytes);
        self.apply_decoded(decoded)
    }

    fn apply_decoded(&mut self, decoded: Result<Option<String>>) -> Result<String> {
        match decoded {
            Ok(Some(payload)) => {
                self.code = payload.clone();
                self.inline_error = None;
                self.state = FlowState::ManualEntry;
                self.log(LogEvent::new("qr_decoded").with_code(&payload));
                Ok(payload)
            }
            Ok(None) => Err(self.decode_failed("no QR code in image".to_string())),
            Err(Error::DecodeFailure(reason)) => Err(self.decode_failed(reason)),
            Err(other) => Err(self.decode_failed(other.to_string())),
        }
    }

    fn decode_failed(&mut self, reason: String) -> Error {
        self.inline_error = Some(MSG_QR_NOT_RECOGNIZED.to_string());
        self.log(LogEvent::new("qr_not_found").with_error(reason.as_str()));
        Error::DecodeFailure(reason)
    }

    pub fn set_code(&mut self, code: &str) -> Result<()> {
        self.expect_state(FlowState::ManualEntry, "edit the code")?;
        self.code = code.to_string();
        self.inline_error = None;
        Ok(())
    }

    /// Set the code and submit it
    pub async fn submit_code(&mut self, code: &str) -> Result<SubmitOutcome> {
        self.set_code(code)?;
        self.submit().await
    }

    /// Redeem the entered code, then refresh the balance
    ///
    /// A blank code fails with `EmptyInput` without any network call. A
    /// rejected code, or a network failure on either call, leaves the dialog
    /// on manual entry with the code intact. When the server accepts the code
    /// but answers the balance request with an error or an unusable amount,
    /// the dialog still closes with the cached balance.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        self.expect_state(FlowState::ManualEntry, "submit")?;

        let code = match RedeemCode::parse(&self.code) {
            Ok(code) => code,
            Err(e) => {
                self.inline_error = Some(MSG_EMPTY_CODE.to_string());
                return Err(e);
            }
        };

        self.inline_error = None;
        self.state = FlowState::Submitting;

        if let Err(e) = self.wallet.redeem(&code).await {
            self.state = FlowState::ManualEntry;
            match &e {
                Error::DomainRejected { code: error_code, message } => {
                    self.notice = Some(Notice::error(message.as_str()));
                    self.log(
                        LogEvent::new("redeem_rejected")
                            .with_code(code.as_str())
                            .with_error(message.as_str())
                            .with_error_details(format!("errorCode {}", error_code)),
                    );
                }
                other => {
                    self.notice = Some(Notice::error(MSG_TRANSPORT_FAILED));
                    self.log(
                        LogEvent::new("redeem_transport_failed")
                            .with_code(code.as_str())
                            .with_error(other.to_string()),
                    );
                }
            }
            return Err(e);
        }

        // The server accepted the code, so it is spent even if the balance call fails
        if let Err(e) = self.ledger.record(&code) {
            self.log(
                LogEvent::new("ledger_write_failed")
                    .with_code(code.as_str())
                    .with_error(e.to_string()),
            );
        }

        let outcome = match self.wallet.refresh_balance().await {
            Ok(balance) => {
                self.notice = Some(Notice::success(MSG_TOPUP_SUCCEEDED));
                SubmitOutcome::Confirmed { balance }
            }
            // Network failure on either call keeps the dialog open
            Err(e @ Error::Transport(_)) => {
                self.state = FlowState::ManualEntry;
                self.notice = Some(Notice::error(MSG_TRANSPORT_FAILED));
                self.log(
                    LogEvent::new("balance_transport_failed")
                        .with_code(code.as_str())
                        .with_error(e.to_string()),
                );
                return Err(e);
            }
            Err(e) => {
                self.notice = Some(Notice::info(MSG_BALANCE_UNCONFIRMED));
                self.log(
                    LogEvent::new("balance_unconfirmed")
                        .with_code(code.as_str())
                        .with_error(e.to_string()),
                );
                match self.wallet.session().balance() {
                    Ok(balance) => SubmitOutcome::BalanceUnconfirmed { balance },
                    Err(e) => {
                        self.reset();
                        return Err(e);
                    }
                }
            }
        };

        self.log(LogEvent::new("topup_succeeded").with_code(code.as_str()));
        self.reset();
        Ok(outcome)
    }

    fn reset(&mut self) {
        self.stop_capture();
        self.code.clear();
        self.inline_error = None;
        self.method = None;
        self.state = FlowState::Idle;
    }

    /// Close the dialog from any state, releasing the camera first
    pub fn cancel(&mut self) {
        if self.state == FlowState::Idle {
            return;
        }
        self.stop_capture();
        self.log(LogEvent::new("topup_cancelled"));
        self.reset();
    }

    /// Close the dialog and drop any visible notice
    pub fn dismiss(&mut self) {
        self.cancel();
        self.notice = None;
    }
}
