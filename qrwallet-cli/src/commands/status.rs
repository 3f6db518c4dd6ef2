//! Status command - show the signed-in profile and wallet summary

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use qrwallet_core::services::LoggingService;
use qrwallet_core::WalletContext;
use serde::Serialize;

use super::get_context;
use crate::output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    #[serde(flatten)]
    session: qrwallet_core::services::SessionSummary,
    used_codes: usize,
    api_base_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

/// Re-read profile and balance, collecting failures as warnings
pub async fn refresh(ctx: &WalletContext) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Err(e) = ctx.wallet_service.refresh_profile().await {
        warnings.push(format!("Profile not refreshed: {}", e));
    }
    if let Err(e) = ctx.wallet_service.refresh_balance().await {
        warnings.push(format!("Balance not refreshed: {}", e));
    }
    warnings
}

pub async fn run(logger: Option<Arc<LoggingService>>, refresh_first: bool, json: bool) -> Result<()> {
    let ctx = get_context(logger)?;

    let warnings = if refresh_first && ctx.session.is_signed_in()? {
        refresh(&ctx).await
    } else {
        Vec::new()
    };

    let report = StatusReport {
        session: ctx.session.summary()?,
        used_codes: ctx.ledger.records()?.len(),
        api_base_url: ctx.config.api_base_url.clone(),
        warnings,
    };

    if json {
        return output::json(&report);
    }

    println!("{}", "Wallet Status".bold());
    println!();

    if !report.session.signed_in {
        output::warning("Not signed in. Run 'qw login --token <TOKEN>' first.");
        println!();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let profile = &report.session.profile;
    table.add_row(vec!["Name", profile.user_name.as_str()]);
    table.add_row(vec!["Phone", profile.phone_number.as_str()]);
    table.add_row(vec!["Balance", &report.session.balance.to_string()]);
    table.add_row(vec!["Used codes", &report.used_codes.to_string()]);
    table.add_row(vec!["API", report.api_base_url.as_str()]);

    println!("{}", table);

    for warning in &report.warnings {
        output::warning(warning);
    }

    Ok(())
}
