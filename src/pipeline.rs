//! Batch driver: parse, validate, moderate, decide, and submit.
//!
//! Every document gets its own [`Checklist`]; nothing carries over between
//! documents. A document that fails any check is reported and skipped, and
//! the batch continues.
use crate::checklist::Checklist;
use crate::document::ProposalDocument;
use crate::registry::{ExistingProposal, Registry, SubmissionPayload};
use crate::report::render_checklist;
use crate::repository::RepositoryInfo;
use crate::{moderation, validation, writeback};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do with a document whose checklist fully passes.
pub enum Mode {
    /// Report only; never submit or rewrite documents.
    Check,
    /// Submit to the registry with the given repository metadata.
    Submit(RepositoryInfo),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Submitted { identifier: Option<String> },
    /// Update mode and the stored record already matches the document.
    Unchanged,
    /// Every check passed in check mode.
    Ready,
    Skipped { failed: usize },
    Failed { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Submitted { .. } | Outcome::Unchanged | Outcome::Ready
        )
    }
}

#[derive(Debug)]
pub struct DocumentReport {
    pub path: PathBuf,
    /// `None` when the document could not be read or parsed.
    pub checklist: Option<Checklist>,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<DocumentReport>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.reports.iter().all(|report| report.outcome.is_success())
    }

    pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Validation and moderation results for one document.
#[derive(Debug)]
pub struct Evaluation {
    pub checklist: Checklist,
    /// Stored record when the document is in update mode and the registry knows it.
    pub prior: Option<ExistingProposal>,
}

/// Documents to process: explicit `files`, or every regular file in `dir`
/// sorted by name.
pub fn collect_documents(dir: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files.to_vec());
    }
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "proposals folder does not exist");
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Process every document in order with a fresh checklist each.
pub fn run_batch<R: Registry + ?Sized>(
    paths: &[PathBuf],
    registry: &R,
    mode: &Mode,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for path in paths {
        summary.reports.push(process_document(path, registry, mode));
    }
    summary
}

pub fn process_document<R: Registry + ?Sized>(
    path: &Path,
    registry: &R,
    mode: &Mode,
) -> DocumentReport {
    println!("Reading proposal file: {}", path.display());
    let parsed = fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))
        .and_then(|content| {
            ProposalDocument::parse(&content)
                .with_context(|| format!("parse front matter of {}", path.display()))
        });
    let doc = match parsed {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %format!("{err:#}"), "skipping document");
            println!("Skipped: {err:#}");
            return DocumentReport {
                path: path.to_path_buf(),
                checklist: None,
                outcome: Outcome::Failed {
                    reason: format!("{err:#}"),
                },
            };
        }
    };
    log_received_contents(&doc);

    let evaluation = evaluate(&doc, registry);
    print!("{}", render_checklist(&evaluation.checklist));
    let outcome = decide(path, &doc, &evaluation, registry, mode);
    DocumentReport {
        path: path.to_path_buf(),
        checklist: Some(evaluation.checklist),
        outcome,
    }
}

/// Run validation then moderation against a fresh checklist.
pub fn evaluate<R: Registry + ?Sized>(doc: &ProposalDocument, registry: &R) -> Evaluation {
    let prior = doc.proposal_id().and_then(|id| registry.check_proposal(id));
    let mut checklist = Checklist::initialize();
    validation::validate(doc, prior.as_ref(), registry, &mut checklist);
    moderation::moderate(doc, prior.as_ref(), registry, &mut checklist);
    Evaluation { checklist, prior }
}

fn decide<R: Registry + ?Sized>(
    path: &Path,
    doc: &ProposalDocument,
    evaluation: &Evaluation,
    registry: &R,
    mode: &Mode,
) -> Outcome {
    if !evaluation.checklist.all_passed() {
        let failed = evaluation.checklist.failed().count();
        tracing::info!(path = %path.display(), failed, "checks failed; not submitting");
        println!("Some checks failed. Please fix the issues and try again.");
        return Outcome::Skipped { failed };
    }

    let repository = match mode {
        Mode::Check => {
            println!("All checks passed. Proposal is ready for submission.");
            return Outcome::Ready;
        }
        Mode::Submit(repository) => repository,
    };

    let payload = build_payload(doc, repository);
    if evaluation
        .prior
        .as_ref()
        .is_some_and(|prior| prior.matches(&payload))
    {
        println!("All checks passed. Registry already holds this proposal; nothing to submit.");
        return Outcome::Unchanged;
    }

    println!("All checks passed. Submitting proposal to the API.");
    submit(path, &payload, registry)
}

fn submit<R: Registry + ?Sized>(
    path: &Path,
    payload: &SubmissionPayload,
    registry: &R,
) -> Outcome {
    let receipt = match registry.submit_proposal(payload) {
        Ok(receipt) => receipt,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %format!("{err:#}"), "submission failed");
            println!("Submission failed: {err:#}");
            return Outcome::Failed {
                reason: format!("{err:#}"),
            };
        }
    };
    if !receipt.message.is_empty() {
        println!("{}", receipt.message);
    }

    if let Some(identifier) = &receipt.identifier {
        match writeback::write_identifier(path, identifier) {
            Ok(true) => tracing::info!(path = %path.display(), identifier, "recorded proposal identifier"),
            Ok(false) => tracing::debug!(path = %path.display(), identifier, "identifier already recorded"),
            Err(err) => {
                tracing::error!(path = %path.display(), error = %format!("{err:#}"), "could not record identifier");
                return Outcome::Failed {
                    reason: format!("submitted as {identifier} but could not record it: {err:#}"),
                };
            }
        }
    }
    Outcome::Submitted {
        identifier: receipt.identifier,
    }
}

/// Map a parsed document and repository metadata to the registry payload.
pub fn build_payload(doc: &ProposalDocument, repository: &RepositoryInfo) -> SubmissionPayload {
    SubmissionPayload {
        id: doc.proposal_id().map(str::to_string),
        title: doc.title().unwrap_or_default().to_string(),
        tagline: doc.tagline().map(str::to_string),
        funds_requested: doc.requested_funding().map(str::to_string),
        skills: doc.skills(),
        organization_willing_to_sponsor: doc.sponsor_willing() == Some("Yes"),
        existing_oss_project: doc.existing_oss() == Some("Yes"),
        author: doc.author().unwrap_or_default().to_string(),
        description: doc.sections.description.clone(),
        details: doc.sections.details.clone(),
        project_stages: doc.phases.clone(),
        extra_information: doc.sections.supporting_info.clone(),
        github_url: repository.html_url.clone(),
        commit_id: repository.commit_id.clone(),
    }
}

fn log_received_contents(doc: &ProposalDocument) {
    tracing::debug!(
        title = ?doc.title(),
        tagline = ?doc.tagline(),
        requested_funding = ?doc.requested_funding(),
        skills = ?doc.skills(),
        sponsor = ?doc.sponsor_willing(),
        existing_oss = ?doc.existing_oss(),
        author = ?doc.author(),
        proposal_id = ?doc.proposal_id(),
        "received proposal metadata"
    );
    tracing::debug!(
        description_words = validation::word_count(&doc.sections.description),
        details_words = validation::word_count(&doc.sections.details),
        phases = ?doc.phases.iter().map(|(label, _)| label).collect::<Vec<_>>(),
        supporting_info_words = validation::word_count(&doc.sections.supporting_info),
        "received proposal sections"
    );
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
