//! Terminal integration for the declarative executor

use anyhow::Result;
use colored::Colorize;
use declarative::{ApplyResult, ConfirmCallback, ExecuteSummary, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the changes being applied
///
/// Hidden in quiet mode.
pub struct TerminalProgress {
    quiet: bool,
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet, bar: None }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_batch_start(&mut self, count: usize) {
        if self.quiet {
            return;
        }
        println!();
        println!("  {} Applying {} change(s)...", "→".cyan(), count);

        let pb = ProgressBar::new(count as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        self.bar = Some(pb);
    }

    fn on_resource_start(&mut self, name: &str, description: &str) {
        log::debug!("{}: {}", name, description);
        if let Some(pb) = &self.bar {
            pb.set_message(name.to_string());
        }
    }

    fn on_resource_complete(&mut self, name: &str, result: &ApplyResult) {
        let Some(pb) = &self.bar else {
            return;
        };
        pb.inc(1);
        if let ApplyResult::Failed { error } = result {
            pb.suspend(|| println!("  {} {} ({})", "✗".red(), name, error));
        } else {
            pb.set_message(format!("{} {}", symbol(result), name));
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

/// Interactive confirmation, skipped with `--yes`
pub struct TerminalConfirm {
    yes: bool,
}

impl TerminalConfirm {
    pub fn new(yes: bool) -> Self {
        Self { yes }
    }
}

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        if !confirmed {
            println!();
            println!("  {} Aborted", "✗".red());
        }
        Ok(confirmed)
    }
}

/// Status symbol for a result
pub fn symbol(result: &ApplyResult) -> &'static str {
    match result {
        ApplyResult::NoChange => "○",
        ApplyResult::Created | ApplyResult::Modified | ApplyResult::Removed => "✓",
        ApplyResult::Failed { .. } => "✗",
        ApplyResult::Skipped { .. } => "⊘",
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Identity providers applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Identity providers applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} updated", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} deleted", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}
