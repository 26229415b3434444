//! Batch dispatch over a request log.
//!
//! Input is one request per line: `<url> <type> [<page>]`. `<page>` is the
//! page host or a full page URL. Blank lines and `#` comments are skipped.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::core::context::RuntimeContext;
use crate::core::resource::ResourceType;
use crate::shim::dispatch::{Action, DispatchEngine, DispatchRequest};

/// One evaluated request.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRow {
    pub line: usize,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub action: Option<Action>,
}

/// Result of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub rows: Vec<SimulationRow>,
    /// Requests handled, by shim id
    pub by_shim: BTreeMap<String, usize>,
}

impl Simulation {
    pub fn handled(&self) -> usize {
        self.rows.iter().filter(|r| r.action.is_some()).count()
    }
}

/// Parse a request log into dispatch requests built on `base`.
pub fn parse_requests(input: &str, base: &RuntimeContext) -> Result<Vec<(usize, DispatchRequest)>> {
    let mut requests = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let (url, resource_type, page) = match fields.as_slice() {
            [url, ty] => (*url, *ty, None),
            [url, ty, page] => (*url, *ty, Some(*page)),
            _ => bail!("line {}: expected `<url> <type> [<page>]`", line_no),
        };

        let resource_type: ResourceType = resource_type
            .parse()
            .with_context(|| format!("line {}", line_no))?;

        let mut ctx = base.clone().with_resource_type(resource_type);
        if let Some(page) = page {
            ctx = ctx.with_host(super::page_host(page).with_context(|| format!("line {}", line_no))?);
        }

        requests.push((
            line_no,
            DispatchRequest {
                url: url.to_string(),
                resource_type,
                ctx,
            },
        ));
    }

    Ok(requests)
}

/// Dispatch every request in the log in parallel.
pub fn simulate(engine: &DispatchEngine, input: &str, base: &RuntimeContext) -> Result<Simulation> {
    let parsed = parse_requests(input, base)?;
    let (lines, requests): (Vec<usize>, Vec<DispatchRequest>) = parsed.into_iter().unzip();

    let actions = engine.dispatch_batch(&requests);
    tracing::debug!("simulated {} requests", requests.len());

    let mut by_shim = BTreeMap::new();
    let rows = lines
        .into_iter()
        .zip(requests)
        .zip(actions)
        .map(|((line, request), action)| {
            if let Some(action) = &action {
                *by_shim.entry(action.shim().to_string()).or_insert(0) += 1;
            }
            SimulationRow {
                line,
                url: request.url,
                resource_type: request.resource_type,
                action,
            }
        })
        .collect();

    Ok(Simulation { rows, by_shim })
}

/// Format a simulation for display.
pub fn format_simulation(simulation: &Simulation) -> String {
    let mut output = String::new();
    for row in &simulation.rows {
        let decision = match &row.action {
            None => "pass".to_string(),
            Some(Action::Serve { shim, resource, .. }) => format!("serve {} ({})", resource, shim),
            Some(Action::Inject { shim, script, .. }) => format!("inject {} ({})", script, shim),
        };
        output.push_str(&format!(
            "{:>4}  {:<14} {}  -> {}\n",
            row.line,
            row.resource_type.as_str(),
            row.url,
            decision
        ));
    }

    output.push_str(&format!(
        "\n{} of {} requests handled\n",
        simulation.handled(),
        simulation.rows.len()
    ));
    for (shim, count) in &simulation.by_shim {
        output.push_str(&format!("  {:<32} {}\n", shim, count));
    }
    output
}
