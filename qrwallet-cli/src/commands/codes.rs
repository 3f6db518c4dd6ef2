//! Codes command - list codes redeemed on this device

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use qrwallet_core::services::LoggingService;

use super::get_context;
use crate::output;

pub fn run(logger: Option<Arc<LoggingService>>, json: bool) -> Result<()> {
    let ctx = get_context(logger)?;
    let records = ctx.ledger.records()?;

    if json {
        return output::json(&records);
    }

    if records.is_empty() {
        println!("No codes redeemed yet.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["#", "Code", "Redeemed at"]);
    for (i, record) in records.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            record.code.clone(),
            record
                .redeemed_at
                .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{}", table);
    Ok(())
}
