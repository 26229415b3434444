//! `shimreg simulate` command

use std::io::Read;

use anyhow::{Context, Result};

use super::{print_json, GlobalOpts, Session};
use crate::cli::SimulateArgs;
use shimreg::ops::{format_simulation, simulate};
use shimreg::DispatchEngine;

pub fn execute(args: SimulateArgs, global: &GlobalOpts) -> Result<()> {
    let input = if args.file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read requests from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&args.file)
            .with_context(|| format!("failed to read {}", args.file.display()))?
    };

    let session = Session::open(global)?;
    let ctx = session.context(&args.env)?;
    let engine = DispatchEngine::new(session.registry.clone());

    let simulation = simulate(&engine, &input, &ctx)?;
    tracing::info!(
        "{} of {} requests handled",
        simulation.handled(),
        simulation.rows.len()
    );

    if args.json {
        return print_json(&simulation);
    }

    print!("{}", format_simulation(&simulation));
    Ok(())
}
