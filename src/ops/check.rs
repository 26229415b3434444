//! Table validation.
//!
//! `shimreg check` loads a table the same way the engine does and reports
//! what made it into the registry, what was excluded, and a few counts that
//! are handy when reviewing a table change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::shim::errors::PatternError;
use crate::shim::registry::{LoadReport, ShimRegistry};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Load the table at `path`, or the built-in table.
pub fn load_registry(path: Option<&Path>) -> Result<LoadReport> {
    match path {
        Some(path) => ShimRegistry::load(path)
            .with_context(|| format!("failed to load shim table {}", path.display())),
        None => ShimRegistry::builtin().context("failed to load the built-in shim table"),
    }
}

/// Summary of a loaded table.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Table path, or `None` for the built-in table
    pub table: Option<PathBuf>,

    /// Shims in the registry
    pub loaded: usize,

    /// Shims left out because a pattern failed to compile
    pub excluded: Vec<PatternError>,

    pub disabled: usize,
    pub etp_only: usize,
    pub injected: usize,
    pub with_unblocks: usize,
    pub patterns: usize,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.excluded.is_empty()
    }

    /// One diagnostic per excluded shim.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.excluded
            .iter()
            .map(|err| {
                let diag = Diagnostic::warning(format!("excluded shim `{}`", err.shim))
                    .with_context(format!(
                        "invalid match pattern `{}`: {}",
                        err.pattern, err.reason
                    ))
                    .with_suggestion(suggestions::FIX_PATTERN);
                match &self.table {
                    Some(path) => diag.with_location(path.clone()),
                    None => diag,
                }
            })
            .collect()
    }
}

/// Load and summarize a table.
pub fn check(table: Option<&Path>) -> Result<CheckReport> {
    let report = load_registry(table)?;
    let registry = &report.registry;

    Ok(CheckReport {
        table: table.map(Path::to_path_buf),
        loaded: registry.len(),
        disabled: registry.all().filter(|s| s.disabled).count(),
        etp_only: registry.all().filter(|s| s.only_if_blocked_by_etp).count(),
        injected: registry.all().filter(|s| s.needs_helpers()).count(),
        with_unblocks: registry
            .all()
            .filter(|s| !s.unblocks_on_opt_in.is_empty())
            .count(),
        patterns: registry.all().map(|s| s.patterns().count()).sum(),
        excluded: report.excluded,
    })
}

/// Format a check report for display.
pub fn format_report(report: &CheckReport) -> String {
    let source = match &report.table {
        Some(path) => path.display().to_string(),
        None => "built-in table".to_string(),
    };

    let mut output = format!("Checked {}\n", source);
    output.push_str(&format!(
        "  {} shims loaded, {} excluded\n",
        report.loaded,
        report.excluded.len()
    ));
    output.push_str(&format!("  {} patterns\n", report.patterns));
    output.push_str(&format!("  {} disabled\n", report.disabled));
    output.push_str(&format!(
        "  {} only apply when tracking protection blocks\n",
        report.etp_only
    ));
    output.push_str(&format!("  {} inject scripts with helpers\n", report.injected));
    output.push_str(&format!(
        "  {} unblock extra URLs on opt-in\n",
        report.with_unblocks
    ));
    output
}
