//! Login and logout commands

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Password};
use qrwallet_core::services::{LogEvent, LoggingService, LoginDetails};
use qrwallet_core::WalletBalance;
use rust_decimal::Decimal;

use super::{get_context, is_interactive, log_event};

pub fn run(
    logger: Option<Arc<LoggingService>>,
    token: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    balance: Option<String>,
) -> Result<()> {
    let token = match token {
        Some(t) => t,
        None if is_interactive() => Password::new().with_prompt("API token").interact()?,
        None => anyhow::bail!("--token is required when not running in a terminal"),
    };

    let balance = balance
        .map(|raw| -> Result<WalletBalance> {
            let amount = Decimal::from_str(raw.trim())
                .with_context(|| format!("Invalid balance: {}", raw))?;
            Ok(WalletBalance::new(amount)?)
        })
        .transpose()?;

    let ctx = get_context(logger.clone())?;
    ctx.session.login(LoginDetails {
        user_name: name.unwrap_or_default(),
        phone_number: phone.unwrap_or_default(),
        token,
        balance,
    })?;
    log_event(&logger, LogEvent::new("signed_in"));

    let profile = ctx.session.profile()?;
    let who = if profile.user_name.is_empty() {
        "student".to_string()
    } else {
        profile.user_name
    };
    println!("{} Signed in as {}", "Success!".green(), who);
    println!("Run 'qw balance --refresh' to read your balance.");
    Ok(())
}

pub fn run_logout(logger: Option<Arc<LoggingService>>, force: bool) -> Result<()> {
    if !force && is_interactive() {
        let confirmed = Confirm::new()
            .with_prompt("Sign out? Used codes stay on this device.")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let ctx = get_context(logger.clone())?;
    ctx.session.logout()?;
    log_event(&logger, LogEvent::new("signed_out"));
    println!("{}", "Signed out.".green());
    Ok(())
}
