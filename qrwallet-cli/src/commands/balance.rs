//! Balance command - show (and optionally re-read) the wallet balance

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use qrwallet_core::services::LoggingService;
use qrwallet_core::OperationResult;

use super::get_context;
use crate::output;

pub async fn run(logger: Option<Arc<LoggingService>>, refresh: bool, json: bool) -> Result<()> {
    let ctx = get_context(logger)?;

    let mut confirmed = false;
    let mut warning = None;
    if refresh {
        if !ctx.session.is_signed_in()? {
            anyhow::bail!("Not signed in. Run 'qw login --token <TOKEN>' first.");
        }
        match ctx.wallet_service.refresh_balance().await {
            Ok(_) => confirmed = true,
            Err(e) => warning = Some(e.to_string()),
        }
    }

    let balance = ctx.session.balance()?;

    if json {
        let mut result = OperationResult::ok(balance)
            .with_context("confirmed", serde_json::json!(confirmed));
        if let Some(w) = &warning {
            result = result.with_context("warning", serde_json::json!(w));
        }
        return output::json(&result);
    }

    let label = if confirmed { "(confirmed)" } else { "(cached)" };
    println!("{} {}", balance.to_string().bold(), label.dimmed());

    if let Some(w) = warning {
        output::warning(&w);
    }

    Ok(())
}
