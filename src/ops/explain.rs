//! Explain why a shim does or doesn't apply.

use serde::Serialize;

use crate::core::context::RuntimeContext;
use crate::core::options::ResolvedOptions;
use crate::core::resource::ResourceType;
use crate::shim::eligibility::evaluate_all;
use crate::shim::errors::UnknownShimError;
use crate::shim::registry::ShimRegistry;

/// Result of one eligibility gate.
#[derive(Debug, Clone, Serialize)]
pub struct GateResult {
    pub gate: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// How a URL fared against one match entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResult {
    pub index: usize,
    /// Pattern that matched, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub type_admitted: bool,
    pub branch_admitted: bool,
}

impl EntryResult {
    pub fn is_hit(&self) -> bool {
        self.pattern.is_some() && self.type_admitted && self.branch_admitted
    }
}

/// Everything known about one shim in one context.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bug: Option<String>,
    pub eligible: bool,
    pub gates: Vec<GateResult>,
    pub options: ResolvedOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryResult>,
}

/// Evaluate every gate for a shim, and optionally test a URL against its
/// match entries.
pub fn explain(
    registry: &ShimRegistry,
    id: &str,
    ctx: &RuntimeContext,
    url: Option<(&str, ResourceType)>,
) -> Result<Explanation, UnknownShimError> {
    let shim = registry.require(id)?;

    let gates: Vec<GateResult> = evaluate_all(shim, ctx)
        .into_iter()
        .map(|(gate, result)| GateResult {
            gate: gate.to_string(),
            passed: result.is_ok(),
            reason: result.err().map(|e| e.to_string()),
        })
        .collect();

    let entries = match url {
        Some((url, resource_type)) => shim
            .matches
            .iter()
            .enumerate()
            .map(|(index, entry)| EntryResult {
                index,
                pattern: entry.first_hit(url).map(|p| p.to_string()),
                type_admitted: entry.admits_type(resource_type),
                branch_admitted: entry.admits_branch(ctx),
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(Explanation {
        id: shim.id.clone(),
        name: shim.display_name().to_string(),
        bug: shim.bug.clone(),
        eligible: gates.iter().all(|g| g.passed),
        gates,
        options: shim.resolve_options(ctx),
        entries,
    })
}

/// Format an explanation for display.
pub fn format_explanation(explanation: &Explanation) -> String {
    let mut output = format!("{} ({})\n", explanation.name, explanation.id);
    if let Some(bug) = &explanation.bug {
        output.push_str(&format!("  bug: {}\n", bug));
    }

    output.push_str("\nGates:\n");
    for gate in &explanation.gates {
        let status = if gate.passed { "[OK]" } else { "[!!]" };
        output.push_str(&format!("  {} {}", status, gate.gate));
        if let Some(reason) = &gate.reason {
            output.push_str(&format!(": {}", reason));
        }
        output.push('\n');
    }

    if !explanation.options.is_empty() {
        output.push_str("\nOptions:\n");
        for (key, value) in &explanation.options {
            output.push_str(&format!("  {} = {}\n", key, value));
        }
    }

    if !explanation.entries.is_empty() {
        output.push_str("\nMatch entries:\n");
        for entry in &explanation.entries {
            let detail = match &entry.pattern {
                None => "no pattern matches".to_string(),
                Some(p) if !entry.type_admitted => format!("{} matches, wrong resource type", p),
                Some(p) if !entry.branch_admitted => format!("{} matches, wrong branch", p),
                Some(p) => format!("{} matches", p),
            };
            output.push_str(&format!("  #{} {}\n", entry.index, detail));
        }
    }

    let verdict = if explanation.eligible {
        "eligible"
    } else {
        "not eligible"
    };
    output.push_str(&format!("\n{} is {}\n", explanation.id, verdict));
    output
}

/// Name of the first gate that failed, if any.
pub fn first_failure(explanation: &Explanation) -> Option<&str> {
    explanation
        .gates
        .iter()
        .find(|g| !g.passed)
        .map(|g| g.gate.as_str())
}
