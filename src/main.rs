use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod checklist;
mod cli;
mod config;
mod document;
mod moderation;
mod pipeline;
mod registry;
mod report;
mod repository;
#[cfg(test)]
mod testing;
mod validation;
mod writeback;

use cli::{CheckArgs, Command, RootArgs, RunArgs};
use config::Config;
use pipeline::{collect_documents, run_batch, BatchSummary, Mode, Outcome};
use registry::HttpRegistry;
use repository::GitHubClient;

/// Exit status when the batch completed but not every document made it through.
const EXIT_INCOMPLETE: u8 = 2;

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.command.verbose());

    match args.command {
        Command::Run(args) => cmd_run(&args),
        Command::Check(args) => cmd_check(&args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_run(args: &RunArgs) -> Result<ExitCode> {
    let config = Config::for_run(args)?;
    let github = config
        .github
        .as_ref()
        .context("source-control settings missing for run")?;
    let repository = GitHubClient::new(&github.api_url, &github.token)
        .repository_info(&github.repository)?;
    println!("Repository URL: {}", repository.html_url);
    println!("Default branch: {}", repository.default_branch);
    println!("Latest commit ID: {}", repository.commit_id);

    let paths = collect_documents(&config.proposals_dir, &config.files)?;
    let registry = HttpRegistry::new(&config.api_url);
    let summary = run_batch(&paths, &registry, &Mode::Submit(repository));
    Ok(finish(&summary))
}

fn cmd_check(args: &CheckArgs) -> Result<ExitCode> {
    let config = Config::for_check(args)?;
    let paths = collect_documents(&config.proposals_dir, &config.files)?;
    let registry = HttpRegistry::new(&config.api_url);
    let summary = run_batch(&paths, &registry, &Mode::Check);
    Ok(finish(&summary))
}

fn finish(summary: &BatchSummary) -> ExitCode {
    println!(
        "Processed {} proposal(s): {} submitted, {} unchanged, {} ready, {} skipped, {} failed",
        summary.reports.len(),
        summary.count(|outcome| matches!(outcome, Outcome::Submitted { .. })),
        summary.count(|outcome| matches!(outcome, Outcome::Unchanged)),
        summary.count(|outcome| matches!(outcome, Outcome::Ready)),
        summary.count(|outcome| matches!(outcome, Outcome::Skipped { .. })),
        summary.count(|outcome| matches!(outcome, Outcome::Failed { .. })),
    );
    if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        for report in &summary.reports {
            if report.outcome.is_success() {
                continue;
            }
            let failed: Vec<String> = report
                .checklist
                .iter()
                .flat_map(|checklist| checklist.failed())
                .map(|rule| rule.description())
                .collect();
            tracing::warn!(
                path = %report.path.display(),
                outcome = ?report.outcome,
                ?failed,
                "proposal not accepted"
            );
        }
        ExitCode::from(EXIT_INCOMPLETE)
    }
}
