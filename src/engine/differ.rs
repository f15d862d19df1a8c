//! Plan display

use colored::{ColoredString, Colorize};
use declarative::{AttributeChange, Plan, PlannedAction, PlannedChange};
use serde::Serialize;

use crate::ui;

/// Longest attribute value shown before truncation
const MAX_VALUE_WIDTH: usize = 60;

/// Display a plan in a user-friendly format
pub fn display_plan<C: Serialize>(plan: &Plan<C>) {
    if !plan.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Identity Provider Plan".bold()
    );
    println!("│");

    for change in plan.changes.iter().filter(|c| c.action.is_change()) {
        println!(
            "│ {} {:<30} {}",
            symbol(&change.action),
            change.name,
            headline(change).dimmed()
        );
        for line in detail_lines(&change.action) {
            println!("│     {}", line);
        }
        println!("│");
    }

    let summary = plan.summary();
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Plan: {} to create, {} to update, {} to delete, {} unchanged",
        summary.creates.to_string().green(),
        summary.updates.to_string().yellow(),
        summary.deletes.to_string().red(),
        summary.unchanged
    );
    println!("└─────────────────────────────────────────────────────┘");
}

fn symbol<C>(action: &PlannedAction<C>) -> ColoredString {
    match action {
        PlannedAction::Create { .. } => "+".green(),
        PlannedAction::Update { .. } => "~".yellow(),
        PlannedAction::Delete { .. } => "-".red(),
        PlannedAction::NoChange { .. } => "○".dimmed(),
    }
}

/// One-line summary next to the name
pub fn headline<C>(change: &PlannedChange<C>) -> String {
    match &change.action {
        PlannedAction::Create { .. } => "(will create)".to_string(),
        PlannedAction::Update {
            current, changes, ..
        } => format!(
            "{} ({} attribute{})",
            current.id().unwrap_or("?"),
            changes.len(),
            if changes.len() == 1 { "" } else { "s" }
        ),
        PlannedAction::Delete { current } => {
            format!("{} (will delete)", current.id().unwrap_or("?"))
        }
        PlannedAction::NoChange { .. } => String::new(),
    }
}

/// Attribute lines under a change
///
/// Creates list every attribute that will be sent; updates list only what
/// differs.
pub fn detail_lines<C: Serialize>(action: &PlannedAction<C>) -> Vec<String> {
    match action {
        PlannedAction::Create { desired } => ui::attribute_lines(desired)
            .into_iter()
            .map(|(key, value)| format!("{} = {}", key, ui::truncate_start(&value, MAX_VALUE_WIDTH)))
            .collect(),
        PlannedAction::Update { changes, .. } => changes.iter().map(change_line).collect(),
        PlannedAction::Delete { .. } | PlannedAction::NoChange { .. } => Vec::new(),
    }
}

fn change_line(change: &AttributeChange) -> String {
    let render = |value: Option<&serde_json::Value>| {
        value.map_or_else(
            || "(unset)".to_string(),
            |v| ui::truncate_start(&ui::format_value(v), MAX_VALUE_WIDTH),
        )
    };
    format!(
        "{}: {} → {}",
        change.attribute,
        render(change.current.as_ref()),
        render(change.desired.as_ref())
    )
}
