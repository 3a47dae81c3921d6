//! grove show - Print the group tree

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::manager::GroupManager;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Group name or id (default: every root group)
    pub group: Option<String>,

    /// Include resources of nested groups in the listing
    #[arg(long)]
    pub all: bool,
}

/// Serializable view of one group and its subtree.
#[derive(Debug, Serialize)]
pub struct GroupView {
    pub id: String,
    pub name: String,
    pub readonly: bool,
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub resources: Vec<String>,
    pub children: Vec<GroupView>,
}

impl GroupView {
    #[must_use]
    pub fn build(manager: &GroupManager, id: &str) -> Option<Self> {
        let group = manager.find_group(id)?;
        Some(Self {
            id: group.id().to_string(),
            name: group.name().to_string(),
            readonly: group.is_readonly(),
            pinned: manager.pinned_group_id() == Some(group.id()),
            provider: manager.provider_of(id).map(str::to_string),
            resources: manager
                .sorted_resources(id)
                .into_iter()
                .map(|r| r.display())
                .collect(),
            children: group
                .child_ids()
                .iter()
                .filter_map(|child| Self::build(manager, child.as_str()))
                .collect(),
        })
    }

    fn render(&self, depth: usize, layout: &mut HumanLayout) {
        let indent = "  ".repeat(depth);
        let mut label = self.name.bold().to_string();
        if self.readonly {
            label.push_str(&format!(" {}", "(readonly)".dimmed()));
        }
        if self.pinned {
            label.push_str(&format!(" {}", "[pinned]".green()));
        }
        layout.push_line(format!("{indent}{label}"));
        for resource in &self.resources {
            layout.push_line(format!("{indent}  - {resource}"));
        }
        for child in &self.children {
            child.render(depth + 1, layout);
        }
    }
}

pub fn run(ctx: &mut AppContext, args: &ShowArgs) -> Result<()> {
    let manager = &ctx.manager;
    let views: Vec<GroupView> = match &args.group {
        Some(group) => {
            let id = ctx.resolve(group)?;
            GroupView::build(manager, id.as_str()).into_iter().collect()
        }
        None => manager
            .roots()
            .iter()
            .filter_map(|id| GroupView::build(manager, id.as_str()))
            .collect(),
    };

    if ctx.robot_mode {
        let mut data = serde_json::json!({
            "groups": views,
            "sort_order": manager.sort_order().as_str(),
        });
        if args.all {
            if let Some(group) = &args.group {
                let id = ctx.resolve(group)?;
                let all: Vec<String> = manager
                    .forest()
                    .all_resources(id.as_str())
                    .into_iter()
                    .map(|r| r.display())
                    .collect();
                data["all_resources"] = serde_json::json!(all);
            }
        }
        return emit_robot(&robot_ok(data));
    }

    let mut layout = HumanLayout::new();
    if views.is_empty() {
        layout.push_line("No groups.".dimmed().to_string());
    }
    for view in &views {
        view.render(0, &mut layout);
    }
    if args.all {
        if let Some(group) = &args.group {
            let id = ctx.resolve(group)?;
            layout.push_line(String::new());
            layout.title("All resources");
            for resource in manager.forest().all_resources(id.as_str()) {
                layout.push_line(format!("  {}", resource.display()));
            }
        }
    }
    emit_human(layout);
    Ok(())
}
