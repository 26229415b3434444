//! `shimreg explain` command

use anyhow::Result;

use super::{print_json, GlobalOpts, Session};
use crate::cli::ExplainArgs;
use shimreg::ops::{explain, first_failure, format_explanation};

pub fn execute(args: ExplainArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let ctx = session.context(&args.env)?;

    let url = args.url.as_deref().map(|u| (u, args.resource_type));
    let explanation =
        explain(&session.registry, &args.id, &ctx, url).map_err(|e| session.unknown_shim(e))?;

    if let Some(gate) = first_failure(&explanation) {
        tracing::debug!("`{}` stops at the {} gate", explanation.id, gate);
    }

    if args.json {
        return print_json(&explanation);
    }

    print!("{}", format_explanation(&explanation));
    Ok(())
}
