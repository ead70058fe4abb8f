use anyhow::{Context, Result};
use std::path::Path;

use dietlog_core::DietService;

pub(crate) fn cmd_export(svc: &DietService, path: &Path, json: bool) -> Result<()> {
    svc.export_workbook(path)
        .with_context(|| format!("Failed to export workbook to {}", path.display()))?;

    if json {
        println!("{}", serde_json::json!({ "exported": path.display().to_string() }));
    } else {
        println!("Exported workbook to {}", path.display());
    }
    Ok(())
}

pub(crate) fn cmd_session_reset(svc: &DietService, json: bool) -> Result<()> {
    let had_session = svc.reset_session()?;

    if json {
        println!("{}", serde_json::json!({ "reset": had_session }));
    } else if had_session {
        println!("Session reset: meals emptied and goals cleared");
    } else {
        println!("Nothing to reset");
    }
    Ok(())
}
