//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod group;
pub mod pin;
pub mod resource;
pub mod show;
pub mod storage;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, rename, move, remove and list groups
    Group(group::GroupArgs),

    /// Add resources to a group
    Add(resource::AddArgs),

    /// Remove resources from a group
    Rm(resource::RmArgs),

    /// Replace one resource of a group with another
    Replace(resource::ReplaceArgs),

    /// Show the group tree, or one group
    Show(show::ShowArgs),

    /// Pin a group so observed resources land in it
    Pin(pin::PinArgs),

    /// Clear the pinned group
    Unpin,

    /// Reload groups from storage
    Reload(storage::ReloadArgs),

    /// Delete every persisted group
    Reset(storage::ResetArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &mut AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Group(args) => group::run(ctx, args),
        Commands::Add(args) => resource::run_add(ctx, args),
        Commands::Rm(args) => resource::run_rm(ctx, args),
        Commands::Replace(args) => resource::run_replace(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::Pin(args) => pin::run(ctx, args),
        Commands::Unpin => pin::run_unpin(ctx),
        Commands::Reload(args) => storage::run_reload(ctx, args),
        Commands::Reset(args) => storage::run_reset(ctx, args),
    }
}
