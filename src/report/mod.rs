use colored::Colorize;

use crate::git::remote::RemoteChange;
use crate::pr::OpenPull;
use crate::workflow::cleanup::{CleanupReport, RemoteFate, RemoteOutcome};
use crate::workflow::PullOutcome;

pub const NO_PULLS: &str = "No pull requests found";
pub const NO_PR_REMOTES: &str = "No PR remotes found to clean up.";

/// `N - title (owner/fork:branch)`, or `None` for an untitled entry.
pub fn format_open_pull(pull: &OpenPull) -> Option<String> {
    let title = pull.title.as_deref()?;
    Some(format!(
        "{} - {} ({}:{})",
        pull.number,
        title,
        pull.head_repo_full_name.as_deref().unwrap_or("unknown repo"),
        pull.head_ref.as_deref().unwrap_or("unknown branch"),
    ))
}

pub fn format_outcome(outcome: &RemoteOutcome) -> String {
    match outcome.fate {
        RemoteFate::Kept => format!(
            "Keeping remote '{}' (PR #{} is still open)",
            outcome.remote, outcome.number
        ),
        RemoteFate::Removed => format!(
            "Removing remote '{}' (PR #{} is not open)",
            outcome.remote, outcome.number
        ),
    }
}

pub fn format_removed_count(report: &CleanupReport) -> String {
    format!("{} remote(s) removed.", report.removed_count())
}

pub fn print_open_pulls(pulls: &[OpenPull]) {
    let lines: Vec<String> = pulls.iter().filter_map(format_open_pull).collect();
    if lines.is_empty() {
        println!("{NO_PULLS}");
        return;
    }
    for line in lines {
        println!("{line}");
    }
}

pub fn print_cleanup(report: &CleanupReport) {
    if report.outcomes.is_empty() {
        println!("{NO_PR_REMOTES}");
        return;
    }
    for outcome in &report.outcomes {
        let line = format_outcome(outcome);
        match outcome.fate {
            RemoteFate::Kept => println!("{}", line.green()),
            RemoteFate::Removed => println!("{}", line.yellow()),
        }
    }
    println!();
    println!("{}", format_removed_count(report).bold());
}

pub fn format_pull_summary(outcome: &PullOutcome, commit: bool) -> String {
    let remote = match outcome.remote.change {
        RemoteChange::Added => "added",
        RemoteChange::Updated => "updated",
    };
    let merge = if commit { "merged" } else { "staged, not committed" };
    format!(
        "Branch '{}' (from '{}') now has {}/{} {}; remote '{}' {} ({}).",
        outcome.branch,
        outcome.base_branch,
        outcome.remote.name,
        outcome.head_branch,
        merge,
        outcome.remote.name,
        remote,
        outcome.remote.url
    )
}

pub fn print_pull_summary(outcome: &PullOutcome, commit: bool) {
    println!();
    println!("{}", format_pull_summary(outcome, commit).green().bold());
}

/// Trimmed user-facing error line.
pub fn print_error(message: &str) {
    eprintln!("{}", message.trim().red());
    eprintln!();
}
