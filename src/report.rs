//! Human-readable rendering of operation results.

use colored::Colorize;

use crate::dispatch::Outcome;
use crate::error::ErrorReport;
use crate::model::{Repo, Visibility};

fn visibility_badge(v: Visibility) -> String {
    match v {
        Visibility::Private => format!("🔒 {}", "PRIVATE".yellow()),
        Visibility::Public => format!("🌍 {}", "PUBLIC".green()),
    }
}

fn repo_line(r: &Repo) -> String {
    format!(
        "{} {} {}",
        visibility_badge(r.visibility),
        r.name.bold(),
        r.html_url.dimmed()
    )
}

/// Detail lines for `outcome`, headline excluded.
pub fn outcome_lines(outcome: &Outcome) -> Vec<String> {
    let mut lines = Vec::new();
    match outcome {
        Outcome::Listed { repos, .. } => {
            lines.extend(repos.iter().map(repo_line));
        }
        Outcome::Created { repo }
        | Outcome::VisibilityToggled { repo }
        | Outcome::Renamed { repo, .. } => {
            lines.push(repo_line(repo));
        }
        Outcome::Released { release, asset } => {
            lines.push(format!("  {}", release.html_url.dimmed()));
            if let Some(a) = asset {
                lines.push(format!(
                    "  asset  {} ({} bytes, {})",
                    a.name.bold(),
                    a.size,
                    a.content_type
                ));
                lines.push(format!("  sha256 {}", a.sha256));
            }
        }
        Outcome::WorkflowsDispatched { workflows, .. } => {
            lines.extend(workflows.iter().map(|w| format!("  - {}", w)));
        }
        Outcome::Mirrored(s) => {
            lines.push(format!(
                "  {} {}",
                visibility_badge(s.visibility),
                s.destination_url.dimmed()
            ));
            let branch = s.chosen_default_branch.as_deref().unwrap_or("<none>");
            let state = if s.confirmed {
                "confirmed".green()
            } else {
                "unconfirmed".yellow()
            };
            lines.push(format!("  default branch {} ({})", branch.bold(), state));
            if s.refs_removed > 0 {
                lines.push(format!("  removed {} hidden ref(s)", s.refs_removed));
            }
        }
        Outcome::Deleted { .. }
        | Outcome::ActionsPermissions { .. }
        | Outcome::RunsCancelled { .. } => {}
    }
    for w in outcome.warnings() {
        lines.push(format!("{} {}", "warning:".yellow().bold(), w));
    }
    lines
}

pub fn print_outcome(outcome: &Outcome) {
    for line in outcome_lines(outcome) {
        println!("{}", line);
    }
}

pub fn print_error(report: &ErrorReport) {
    eprintln!("{} [{}] {}", "error:".red().bold(), report.kind, report.message);
}
