//! Topup command - redeem a code from the camera, an image or the keyboard

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use qrwallet_core::adapters::frames::FrameDirectorySource;
use qrwallet_core::ports::MediaCaptureSource;
use qrwallet_core::services::{LoggingService, WalletTopUpFlow};
use qrwallet_core::{CaptureMethod, Error, FlowState, OperationResult, SubmitOutcome};

use super::{get_context, is_interactive};
use crate::output;

const METHOD_LABELS: &[&str] = &[
    "Scan with the camera",
    "Upload a QR image",
    "Type the code",
];

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn show_inline_error(flow: &WalletTopUpFlow) {
    if let Some(msg) = flow.inline_error() {
        output::warning(msg);
    }
}

/// Ask for a method until the flow reaches manual entry
///
/// Returns false if the user gave up.
async fn choose_interactively(flow: &mut WalletTopUpFlow) -> Result<bool> {
    loop {
        let choice = Select::new()
            .with_prompt("How do you want to enter the code?")
            .items(METHOD_LABELS)
            .default(0)
            .interact_opt()?;

        match choice {
            None => return Ok(false),
            Some(0) => {
                if !scan(flow).await? {
                    return Ok(false);
                }
            }
            Some(1) => {
                flow.choose_file_picker()?;
                return pick_files(flow).await;
            }
            Some(_) => {
                flow.choose_manual_entry()?;
            }
        }

        if flow.state() == FlowState::ManualEntry {
            return Ok(true);
        }
    }
}

/// Run the camera until a code is seen, the user presses Ctrl-C, or the
/// camera fails. Returns false on Ctrl-C.
async fn scan(flow: &mut WalletTopUpFlow) -> Result<bool> {
    if flow.start_camera().await.is_err() {
        show_inline_error(flow);
        return Ok(true);
    }

    let pb = spinner("Scanning for a QR code... press Ctrl-C to cancel");
    let scanned = tokio::select! {
        result = flow.wait_for_scan() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    pb.finish_and_clear();

    match scanned {
        None => Ok(false),
        Some(Ok(code)) => {
            output::info(&format!("Scanned: {}", code));
            Ok(true)
        }
        Some(Err(_)) => {
            show_inline_error(flow);
            Ok(true)
        }
    }
}

/// Prompt for image paths until one decodes. Empty input gives up.
async fn pick_files(flow: &mut WalletTopUpFlow) -> Result<bool> {
    loop {
        let path: String = Input::new()
            .with_prompt("Image path (empty to cancel)")
            .allow_empty(true)
            .interact_text()?;
        if path.trim().is_empty() {
            return Ok(false);
        }

        match flow.decode_image_file(&PathBuf::from(path.trim())).await {
            Ok(code) => {
                output::info(&format!("Read: {}", code));
                return Ok(true);
            }
            Err(_) => show_inline_error(flow),
        }
    }
}

/// Prompt for the code, prefilled with whatever was scanned
fn prompt_code(flow: &WalletTopUpFlow) -> Result<Option<String>> {
    let code: String = Input::new()
        .with_prompt("Code (empty to cancel)")
        .with_initial_text(flow.code().to_string())
        .allow_empty(true)
        .interact_text()?;
    Ok((!code.trim().is_empty()).then_some(code))
}

fn report(json: bool, flow: &WalletTopUpFlow, result: &std::result::Result<SubmitOutcome, Error>) -> Result<()> {
    let notice = flow.notice();
    if json {
        let body = match result {
            Ok(outcome) => OperationResult::ok(*outcome),
            Err(e) => OperationResult::fail(e.to_string()),
        };
        let body = match notice {
            Some(n) => body.with_context("notice", serde_json::json!(n.text)),
            None => body,
        };
        return output::json(&body);
    }

    match (notice, result) {
        (Some(n), _) => output::notice(n),
        (None, Err(e)) => {
            let msg = flow
                .inline_error()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string());
            output::error(&msg);
        }
        (None, Ok(_)) => {}
    }
    if let Ok(outcome) = result {
        println!("Balance: {}", outcome.balance());
    }
    Ok(())
}

pub async fn run(
    logger: Option<Arc<LoggingService>>,
    code: Option<String>,
    image: Option<PathBuf>,
    frames: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let ctx = get_context(logger)?;
    if !ctx.session.is_signed_in()? {
        anyhow::bail!("Not signed in. Run 'qw login --token <TOKEN>' first.");
    }

    let interactive = is_interactive() && !json;
    let camera_dir = frames.clone().unwrap_or_else(|| ctx.wallet_dir.join("camera"));
    let camera: Arc<dyn MediaCaptureSource> = Arc::new(FrameDirectorySource::new(camera_dir));
    let mut flow = ctx.topup_flow(camera);
    flow.open()?;

    let method = match (&code, &image, &frames) {
        (Some(_), _, _) => Some(CaptureMethod::Manual),
        (_, Some(_), _) => Some(CaptureMethod::File),
        (_, _, Some(_)) => Some(CaptureMethod::Camera),
        _ => None,
    };

    let ready = match method {
        Some(CaptureMethod::Manual) => {
            flow.choose_manual_entry()?;
            true
        }
        Some(CaptureMethod::File) => {
            flow.choose_file_picker()?;
            if let Some(path) = &image {
                if let Err(e) = flow.decode_image_file(path).await {
                    show_inline_error(&flow);
                    return Err(e.into());
                }
            }
            true
        }
        Some(CaptureMethod::Camera) => {
            let scanned = scan(&mut flow).await?;
            if flow.state() == FlowState::ChoosingMethod {
                anyhow::bail!("Camera is not available");
            }
            scanned
        }
        None if interactive => choose_interactively(&mut flow).await?,
        None => anyhow::bail!("Pass --code, --image or --frames when not running in a terminal"),
    };

    if !ready {
        flow.cancel();
        output::info("Top-up cancelled.");
        return Ok(());
    }

    let mut entered = code;
    loop {
        let attempt = match entered.take() {
            Some(c) => c,
            None if interactive => match prompt_code(&flow)? {
                Some(c) => c,
                None => {
                    flow.cancel();
                    output::info("Top-up cancelled.");
                    return Ok(());
                }
            },
            None => flow.code().to_string(),
        };

        let pb = (!json).then(|| spinner("Redeeming..."));
        let result = flow.submit_code(&attempt).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        report(json, &flow, &result)?;

        match result {
            Ok(_) => return Ok(()),
            // Still on manual entry: let the user fix the code and retry
            Err(e) if e.is_retryable() && interactive => continue,
            Err(_) => anyhow::bail!("Top-up did not complete"),
        }
    }
}
