//! Error log command handler.

use anyhow::{Context, Result};
use wordbank_core::AppContext;

pub async fn show(ctx: &AppContext, clear: bool) -> Result<()> {
    if clear {
        ctx.error_log().clear().await.context("clear error log")?;
        println!("Error log cleared");
        return Ok(());
    }

    let entries = ctx.error_log().entries().await.context("read error log")?;
    if entries.is_empty() {
        println!("No errors recorded");
    }
    for entry in entries {
        println!("{}  {}", entry.at.to_rfc3339(), entry.message);
    }
    Ok(())
}
