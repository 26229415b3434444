//! High-level operations.
//!
//! This module contains the implementation of shimreg commands.

pub mod check;
pub mod explain;
pub mod simulate;

use anyhow::{anyhow, Context, Result};
use url::{Host, Url};

pub use check::{check, format_report, load_registry, CheckReport};
pub use explain::{explain, first_failure, format_explanation, Explanation};
pub use simulate::{format_simulation, parse_requests, simulate, Simulation};

/// Host of a page, given either a bare host or a full page URL.
pub fn page_host(page: &str) -> Result<String> {
    if page.contains("://") {
        let url = Url::parse(page).with_context(|| format!("invalid page URL `{}`", page))?;
        return url
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("page URL `{}` has no host", page));
    }

    let host = Host::parse(page).with_context(|| format!("invalid page host `{}`", page))?;
    Ok(host.to_string())
}
