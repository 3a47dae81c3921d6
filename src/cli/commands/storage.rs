//! grove reload / reset

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::{GroveError, Result};

#[derive(Args, Debug)]
pub struct ReloadArgs {
    /// Reload only this provider
    #[arg(long)]
    pub provider: Option<String>,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm deleting every persisted group
    #[arg(long)]
    pub yes: bool,
}

pub fn run_reload(ctx: &mut AppContext, args: &ReloadArgs) -> Result<()> {
    ctx.reload(args.provider.as_deref())?;
    let groups = ctx.manager.forest().len();
    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({
            "provider": args.provider,
            "groups": groups,
            "providers": ctx.manager.providers(),
        })));
    }
    println!("{} Loaded {groups} group(s)", "✓".green());
    Ok(())
}

pub fn run_reset(ctx: &mut AppContext, args: &ResetArgs) -> Result<()> {
    if !args.yes {
        return Err(GroveError::ValidationFailed(
            "reset deletes every persisted group; pass --yes to confirm".to_string(),
        ));
    }
    ctx.reset()?;
    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({ "reset": true })));
    }
    println!("{} Storage reset", "✓".green());
    Ok(())
}
