use std::error::Error;
use std::io::{self, Write};

use serde_json::{json, Value};

use facegate_core::faces::enrollment::EnrollmentOutcome;
use facegate_core::login::FaceLoginOutcome;

use crate::cli::OutputMode;
use crate::commands::IdentityListing;
use crate::errors::{AppError, AppResult};

pub fn render_enroll(outcome: &EnrollmentOutcome, mode: OutputMode, verbose: bool) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            if verbose {
                for line in &outcome.logs {
                    tracing::info!("{line}");
                }
            }
            println!(
                "Enrollment successful: '{}' registered as {}",
                outcome.display_name, outcome.id
            );
        }
        OutputMode::Json => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let payload = serde_json::to_string(&json!({
                "id": outcome.id,
                "display_name": outcome.display_name,
            }))?;
            handle.write_all(payload.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

pub fn render_login(outcome: &FaceLoginOutcome, mode: OutputMode, verbose: bool) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            if verbose {
                for line in &outcome.logs {
                    tracing::info!("{line}");
                }
            }
            println!("Login successful: {}", outcome.display_name);
            println!("Session token: {}", outcome.credential.token);
            println!("Expires at: {}", outcome.credential.expires_at);
        }
        OutputMode::Json => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let payload = serde_json::to_string(&login_json_payload(outcome))?;
            handle.write_all(payload.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

pub fn render_identities(
    listing: &IdentityListing,
    mode: OutputMode,
    _verbose: bool,
) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            if listing.identities.is_empty() {
                println!("No identities enrolled in {}", listing.store_path.display());
                return Ok(());
            }
            println!(
                "{} identities in {}",
                listing.identities.len(),
                listing.store_path.display()
            );
            for record in &listing.identities {
                println!("{}  {}  {}", record.id, record.display_name, record.created_at);
            }
        }
        OutputMode::Json => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let payload = serde_json::to_string(&identities_json_payload(listing))?;
            handle.write_all(payload.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn login_json_payload(outcome: &FaceLoginOutcome) -> Value {
    json!({
        "identity_id": outcome.identity_id,
        "display_name": outcome.display_name,
        "token": outcome.credential.token,
        "expires_at": outcome.credential.expires_at,
    })
}

fn identities_json_payload(listing: &IdentityListing) -> Value {
    let identities: Vec<Value> = listing
        .identities
        .iter()
        .map(|record| {
            json!({
                "id": record.id,
                "display_name": record.display_name,
                "created_at": record.created_at,
            })
        })
        .collect();
    json!({
        "store_path": listing.store_path.display().to_string(),
        "identities": identities,
    })
}

pub fn render_error(err: &AppError, mode: OutputMode) {
    match mode {
        OutputMode::Human => {
            eprintln!("error: {}", err.human_message());
            if let Some(source) = err.source() {
                eprintln!("cause: {source}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "success": false,
                "error": err.human_message(),
            });
            if let Ok(json) = serde_json::to_string(&payload) {
                println!("{json}");
            }
            if let Some(source) = err.source() {
                eprintln!("cause: {source}");
            }
        }
    }
}
