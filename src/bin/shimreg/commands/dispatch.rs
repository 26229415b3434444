//! `shimreg dispatch` command

use anyhow::Result;
use serde_json::json;

use super::{print_json, GlobalOpts, Session};
use crate::cli::DispatchArgs;
use shimreg::{Action, DispatchEngine};

pub fn execute(args: DispatchArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let ctx = session
        .context(&args.env)?
        .with_resource_type(args.resource_type);
    let engine = DispatchEngine::new(session.registry.clone());

    if args.all {
        let hits = engine.dispatch_all(&args.url, args.resource_type, &ctx);
        if args.json {
            let hits: Vec<_> = hits
                .iter()
                .map(|h| json!({"pattern": h.pattern.as_str(), "action": h.action}))
                .collect();
            return print_json(&hits);
        }
        if hits.is_empty() {
            println!("no action");
        }
        for (i, hit) in hits.iter().enumerate() {
            let marker = if i == 0 { "*" } else { " " };
            println!("{} {}  (via {})", marker, describe(&hit.action), hit.pattern);
        }
        return Ok(());
    }

    let action = engine.dispatch(&args.url, args.resource_type, &ctx);
    if args.json {
        return print_json(&json!({ "url": args.url, "action": action }));
    }

    match action {
        Some(action) => println!("{}", describe(&action)),
        None => println!("no action"),
    }
    Ok(())
}

fn describe(action: &Action) -> String {
    match action {
        Action::Serve {
            shim,
            resource,
            resource_type,
        } => format!("serve {} as {} ({})", resource, resource_type, shim),
        Action::Inject {
            shim,
            script,
            helpers,
        } => {
            let helpers: Vec<_> = helpers.iter().map(|h| h.as_str()).collect();
            format!(
                "inject {} with [{}] ({})",
                script,
                helpers.join(", "),
                shim
            )
        }
    }
}
