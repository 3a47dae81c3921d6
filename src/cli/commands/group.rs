//! grove group - Manage groups

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a group
    New {
        /// Group name
        name: String,

        /// Nest the new group under this group (name or id)
        #[arg(long)]
        parent: Option<String>,

        /// Storage provider for a new top-level group
        #[arg(long)]
        provider: Option<String>,
    },

    /// Rename a group
    Rename {
        /// Group name or id
        group: String,
        /// New name
        name: String,
    },

    /// Move a group under another group, or to the top level
    Move {
        /// Group name or id
        group: String,

        /// New parent (name or id)
        #[arg(long, conflicts_with = "root")]
        to: Option<String>,

        /// Make the group a top-level group
        #[arg(long)]
        root: bool,
    },

    /// Remove a group and everything nested in it
    Remove {
        /// Group name or id
        group: String,
    },

    /// List group names
    List {
        /// Only top-level groups
        #[arg(long)]
        roots: bool,

        /// Only groups that can be edited
        #[arg(long, conflicts_with = "roots")]
        writable: bool,
    },
}

pub fn run(ctx: &mut AppContext, args: &GroupArgs) -> Result<()> {
    match &args.command {
        GroupCommand::New {
            name,
            parent,
            provider,
        } => {
            let id = ctx.create_group(name, parent.as_deref(), provider.as_deref())?;
            report(
                ctx,
                serde_json::json!({ "created": id, "name": name.trim() }),
                &format!("Created group {}", name.trim().bold()),
            )
        }
        GroupCommand::Rename { group, name } => {
            let id = ctx.rename_group(group, name)?;
            report(
                ctx,
                serde_json::json!({ "renamed": group, "id": id, "name": name.trim() }),
                &format!("Renamed {group} to {}", name.trim().bold()),
            )
        }
        GroupCommand::Move { group, to, root } => {
            if to.is_none() && !root {
                return Err(crate::error::GroveError::ValidationFailed(
                    "pass --to <group> or --root".to_string(),
                ));
            }
            ctx.move_group(group, to.as_deref())?;
            let target = to.as_deref().unwrap_or("top level");
            report(
                ctx,
                serde_json::json!({ "moved": group, "parent": to }),
                &format!("Moved {} to {target}", group.bold()),
            )
        }
        GroupCommand::Remove { group } => {
            ctx.remove_group(group)?;
            report(
                ctx,
                serde_json::json!({ "removed": group }),
                &format!("Removed group {}", group.bold()),
            )
        }
        GroupCommand::List { roots, writable } => {
            let names = if *roots {
                ctx.manager.root_group_names()
            } else if *writable {
                ctx.manager.writable_group_names()
            } else {
                ctx.manager.group_names()
            };
            if ctx.robot_mode {
                return emit_robot(&robot_ok(serde_json::json!({ "groups": names })));
            }
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn report(ctx: &AppContext, data: serde_json::Value, human: &str) -> Result<()> {
    if ctx.robot_mode {
        emit_robot(&robot_ok(data))
    } else {
        println!("{} {human}", "✓".green());
        Ok(())
    }
}
