//! Command implementations

pub mod check;
pub mod completions;
pub mod dispatch;
pub mod explain;
pub mod list;
pub mod options;
pub mod simulate;
pub mod unblock;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::EnvArgs;
use shimreg::ops::{load_registry, page_host};
use shimreg::shim::UnknownShimError;
use shimreg::util::diagnostic::{emit, suggestions, Diagnostic};
use shimreg::util::config::{global_config_path, load_config, project_config_path};
use shimreg::util::Config;
use shimreg::{HostPlatform, OptInSet, ReleaseChannel, RuntimeContext, ShimRegistry};

/// Options every command receives from the global flags.
#[derive(Debug, Clone)]
pub struct GlobalOpts {
    pub table: Option<PathBuf>,
    pub color: bool,
}

/// Loaded config and registry.
pub struct Session {
    pub config: Config,
    pub registry: Arc<ShimRegistry>,
    pub color: bool,
}

impl Session {
    /// Load config, then the table it (or `--table`) points at.
    ///
    /// Excluded shims are only logged here; `shimreg check` reports them.
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let config = current_config()?;
        let report = load_registry(table_path(global, &config).as_deref())?;

        if !report.excluded.is_empty() {
            let note = Diagnostic::note(format!(
                "{} shim(s) excluded from the table",
                report.excluded.len()
            ))
            .with_suggestion(suggestions::CHECK_TABLE);
            emit(&note, global.color);
        }

        Ok(Session {
            config,
            registry: Arc::new(report.registry),
            color: global.color,
        })
    }

    /// Build the runtime context from flags, falling back to config.
    pub fn context(&self, env: &EnvArgs) -> Result<RuntimeContext> {
        let platform = env
            .platform
            .or_else(|| self.config.platform())
            .unwrap_or(HostPlatform::Desktop);
        let channel = env
            .channel
            .or_else(|| self.config.channel())
            .unwrap_or(ReleaseChannel::Release);

        let opt_ins = OptInSet::restore(&self.registry, &self.config.opt_in.shims);
        for id in &env.opt_in {
            opt_ins
                .opt_in(&self.registry, id)
                .map_err(|e| self.unknown_shim(e))?;
        }

        let mut ctx = RuntimeContext::new(platform, channel)
            .with_etp_blocked(env.etp_blocked)
            .with_opted_in(opt_ins.snapshot());
        if let Some(page) = &env.page {
            ctx = ctx.with_host(page_host(page)?);
        }

        tracing::debug!(
            "context: {}:{} host `{}` etp_blocked={} opted_in={:?}",
            ctx.channel,
            ctx.platform,
            ctx.host,
            ctx.etp_blocked,
            ctx.opted_in
        );

        Ok(ctx)
    }

    /// Point the user at `shimreg list` before failing on an unknown id.
    pub fn unknown_shim(&self, err: UnknownShimError) -> anyhow::Error {
        let hint = Diagnostic::note(format!("`{}` is not in the loaded table", err.id))
            .with_suggestion(suggestions::LIST_SHIMS);
        emit(&hint, self.color);
        err.into()
    }
}

/// `--table`, then the configured table, then the built-in one (`None`).
pub fn table_path(global: &GlobalOpts, config: &Config) -> Option<PathBuf> {
    global
        .table
        .clone()
        .or_else(|| config.registry.table.clone())
}

pub fn current_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let project = project_config_path(&cwd);
    let global = global_config_path().unwrap_or_else(|| Path::new("").to_path_buf());
    Ok(load_config(&global, &project))
}

/// Print a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
