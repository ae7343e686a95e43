use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::{RunStatus, TargetSummary};
use crate::fragment::Fragment;
use crate::resolve::PrecedenceTier;
use crate::target::TargetAdapter;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    pub fn print_target_summary(&self, summary: &TargetSummary) {
        let status_style = self.status_style(summary.status);

        println!(
            "{}  {}  {}",
            style(&summary.target).bold(),
            style(summary.root.display()).dim(),
            status_style.apply_to(status_label(summary.status))
        );
        println!(
            "    written: {}  pruned: {}  unchanged: {}",
            style(summary.written.len()).green(),
            style(summary.pruned.len()).yellow(),
            style(summary.unchanged).dim()
        );

        for path in &summary.written {
            println!("    {} {}", style("+").green(), path.display());
        }
        for path in &summary.pruned {
            println!("    {} {}", style("-").yellow(), path.display());
        }
        for warning in &summary.warnings {
            self.print_warning(&warning.to_string());
        }
        if let Some(error) = &summary.error {
            self.print_error(error);
        }
        println!();
    }

    pub fn print_fragments_table(&self, fragments: &[Fragment]) {
        if fragments.is_empty() {
            println!("{}", style("No fragments found.").dim());
            return;
        }

        println!(
            "{:<48} {:<22} {}",
            style("Category/Name").bold(),
            style("Tier").bold(),
            style("Scope").bold()
        );
        println!("{}", style("─".repeat(90)).dim());

        for fragment in fragments {
            let tier = PrecedenceTier::of(fragment);
            let scope = if fragment.always_on {
                style("always-on".to_string()).green()
            } else if fragment.scope.is_empty() {
                style("(convention)".to_string()).dim()
            } else {
                style(fragment.scope.join(", ")).white()
            };
            println!("{:<48} {:<22} {}", fragment.id(), tier.to_string(), scope);
        }
    }

    pub fn print_targets_table(&self, adapters: &[TargetAdapter]) {
        println!(
            "{:<10} {:<24} {}",
            style("Target").bold(),
            style("Generated root").bold(),
            style("Custom root").bold()
        );
        println!("{}", style("─".repeat(70)).dim());
        for adapter in adapters {
            println!(
                "{:<10} {:<24} {}",
                adapter.name(),
                adapter.root().display(),
                style(adapter.custom_root().display()).dim()
            );
        }
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("static template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }

    fn status_style(&self, status: RunStatus) -> Style {
        match status {
            RunStatus::Success => Style::new().green(),
            RunStatus::SuccessWithWarnings => Style::new().yellow(),
            RunStatus::Failed => Style::new().red().bold(),
        }
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Success => "ok",
        RunStatus::SuccessWithWarnings => "ok (warnings)",
        RunStatus::Failed => "failed",
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
