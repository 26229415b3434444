//! `shimreg unblock` command

use anyhow::Result;
use serde_json::json;

use super::{print_json, GlobalOpts, Session};
use crate::cli::UnblockArgs;
use shimreg::DispatchEngine;

pub fn execute(args: UnblockArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let ctx = session
        .context(&args.env)?
        .with_resource_type(args.resource_type);
    let engine = DispatchEngine::new(session.registry.clone());

    let unblock = engine.unblock_check(&args.url, &ctx);
    if args.json {
        return print_json(&json!({ "url": args.url, "unblock": unblock }));
    }

    println!("{}", if unblock { "allow" } else { "block" });
    Ok(())
}
