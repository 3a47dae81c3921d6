//! grove add / rm / replace - Edit group resources

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::{GroveError, Result};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Group name or id followed by the paths or URIs to add
    /// (only paths with --pinned)
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,

    /// Add to the pinned group
    #[arg(long)]
    pub pinned: bool,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Group name or id
    pub group: String,

    /// Paths or URIs to remove
    #[arg(required_unless_present = "clear")]
    pub resources: Vec<String>,

    /// Remove every resource of the group
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct ReplaceArgs {
    /// Group name or id
    pub group: String,
    /// Resource to replace
    pub from: String,
    /// Replacement
    pub to: String,
}

pub fn run_add(ctx: &mut AppContext, args: &AddArgs) -> Result<()> {
    if args.pinned {
        if ctx.manager.pinned_group().is_none() {
            return Err(GroveError::GroupNotFound("no group is pinned".to_string()));
        }
        let mut added = Vec::new();
        for input in &args.targets {
            if ctx.observe(input)? {
                added.push(ctx.parse_resource(input)?.display());
            }
        }
        return report_added(ctx, added);
    }

    let Some((group, resources)) = args.targets.split_first().filter(|(_, rest)| !rest.is_empty())
    else {
        return Err(GroveError::ValidationFailed(
            "usage: grove add <group> <resource>...".to_string(),
        ));
    };
    let added: Vec<String> = ctx
        .add_resources(group, resources)?
        .iter()
        .map(|r| r.display())
        .collect();
    report_added(ctx, added)
}

fn report_added(ctx: &AppContext, added: Vec<String>) -> Result<()> {
    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({ "added": added })));
    }
    if added.is_empty() {
        println!("{}", "Nothing added (already present)".dimmed());
    }
    for resource in added {
        println!("{} {resource}", "+".green());
    }
    Ok(())
}

pub fn run_rm(ctx: &mut AppContext, args: &RmArgs) -> Result<()> {
    let removed = if args.clear {
        let count = ctx
            .manager
            .find_group(ctx.resolve(&args.group)?.as_str())
            .map_or(0, |g| g.resources().len());
        if ctx.clear_resources(&args.group)? {
            count
        } else {
            0
        }
    } else {
        ctx.remove_resources(&args.group, &args.resources)?
    };
    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({ "removed": removed })));
    }
    println!("{} Removed {removed} resource(s)", "-".red());
    Ok(())
}

pub fn run_replace(ctx: &mut AppContext, args: &ReplaceArgs) -> Result<()> {
    if !ctx.replace_resource(&args.group, &args.from, &args.to)? {
        return Err(GroveError::InvalidResource(format!(
            "{} is not in {}",
            args.from, args.group
        )));
    }
    if ctx.robot_mode {
        return emit_robot(&robot_ok(
            serde_json::json!({ "replaced": args.from, "with": args.to }),
        ));
    }
    println!("{} {} -> {}", "~".yellow(), args.from, args.to);
    Ok(())
}
