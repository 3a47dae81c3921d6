//! grove pin / unpin

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct PinArgs {
    /// Group name or id
    pub group: String,
}

pub fn run(ctx: &mut AppContext, args: &PinArgs) -> Result<()> {
    let id = ctx.pin(&args.group)?;
    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({ "pinned": id })));
    }
    println!("{} Pinned {}", "✓".green(), args.group.bold());
    Ok(())
}

pub fn run_unpin(ctx: &mut AppContext) -> Result<()> {
    let previous = ctx.unpin()?;
    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({ "unpinned": previous })));
    }
    match previous {
        Some(_) => println!("{} Unpinned", "✓".green()),
        None => println!("{}", "No group was pinned".dimmed()),
    }
    Ok(())
}
