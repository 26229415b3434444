//! `shimreg check` command

use anyhow::{bail, Result};
use serde_json::json;

use super::{current_config, print_json, table_path, GlobalOpts};
use crate::cli::CheckArgs;
use shimreg::ops::{check, format_report};
use shimreg::util::diagnostic::emit;

pub fn execute(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let config = current_config()?;
    let report = check(table_path(global, &config).as_deref())?;

    if args.json {
        let excluded: Vec<_> = report
            .excluded
            .iter()
            .map(|e| json!({"shim": e.shim, "pattern": e.pattern, "reason": e.reason}))
            .collect();
        print_json(&json!({
            "loaded": report.loaded,
            "patterns": report.patterns,
            "excluded": excluded,
        }))?;
    } else {
        for diag in report.diagnostics() {
            emit(&diag, global.color);
        }
        print!("{}", format_report(&report));
    }

    if !report.is_clean() {
        bail!("{} shim(s) excluded from the table", report.excluded.len());
    }
    Ok(())
}
