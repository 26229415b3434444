//! `shimreg options` command

use anyhow::Result;

use super::{print_json, GlobalOpts, Session};
use crate::cli::OptionsArgs;

pub fn execute(args: OptionsArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let ctx = session.context(&args.env)?;

    let options = session
        .registry
        .resolve_options(&args.id, &ctx)
        .map_err(|e| session.unknown_shim(e))?;
    print_json(&options)
}
