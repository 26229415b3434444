//! `shimreg list` command

use anyhow::Result;
use serde::Serialize;

use super::{print_json, GlobalOpts, Session};
use crate::cli::ListArgs;
use shimreg::ShimDefinition;

#[derive(Serialize)]
struct ListedShim<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bug: Option<&'a str>,
    disabled: bool,
    platform: &'a str,
    #[serde(rename = "onlyIfBlockedByETP")]
    only_if_blocked_by_etp: bool,
}

impl<'a> From<&'a ShimDefinition> for ListedShim<'a> {
    fn from(shim: &'a ShimDefinition) -> Self {
        ListedShim {
            id: &shim.id,
            name: shim.display_name(),
            bug: shim.bug.as_deref(),
            disabled: shim.disabled,
            platform: shim.platform.as_str(),
            only_if_blocked_by_etp: shim.only_if_blocked_by_etp,
        }
    }
}

pub fn execute(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let ctx = session.context(&args.env)?;

    let shims: Vec<&ShimDefinition> = if args.all {
        session.registry.all().collect()
    } else {
        session.registry.candidates_for(&ctx).collect()
    };

    if args.json {
        let listed: Vec<ListedShim> = shims.into_iter().map(ListedShim::from).collect();
        return print_json(&listed);
    }

    for shim in &shims {
        let mut flags = Vec::new();
        if shim.disabled {
            flags.push("disabled");
        }
        if shim.only_if_blocked_by_etp {
            flags.push("etp");
        }
        if shim.needs_helpers() {
            flags.push("inject");
        }
        if !shim.unblocks_on_opt_in.is_empty() {
            flags.push("opt-in");
        }

        if flags.is_empty() {
            println!("{:<34} {}", shim.id, shim.display_name());
        } else {
            println!(
                "{:<34} {} [{}]",
                shim.id,
                shim.display_name(),
                flags.join(", ")
            );
        }
    }

    tracing::info!("{} of {} shims listed", shims.len(), session.registry.len());
    Ok(())
}
