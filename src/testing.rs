//! Shared fixtures for unit tests: a proposal text builder and an in-memory
//! registry that records every call it receives.
use crate::document::ProposalDocument;
use crate::pipeline::build_payload;
use crate::registry::{
    ExistingProposal, Registry, SubmissionPayload, SubmissionReceipt, Verdict,
};
use crate::repository::RepositoryInfo;
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// `count` space-separated tokens `{prefix}0 {prefix}1 ...`.
pub(crate) fn words(prefix: &str, count: usize) -> String {
    (0..count)
        .map(|index| format!("{prefix}{index}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn sample_proposal() -> String {
    ProposalBuilder::valid().build()
}

pub(crate) fn sample_repository() -> RepositoryInfo {
    RepositoryInfo {
        html_url: "https://github.com/acme/plugins".to_string(),
        default_branch: "main".to_string(),
        commit_id: "0123456789abcdef".to_string(),
    }
}

pub(crate) fn sample_payload() -> SubmissionPayload {
    let doc = ProposalDocument::parse(&sample_proposal()).expect("parse sample proposal");
    build_payload(&doc, &sample_repository())
}

/// A stored record holding exactly what `payload` would submit.
pub(crate) fn stored_copy(payload: &SubmissionPayload) -> ExistingProposal {
    ExistingProposal {
        title: payload.title.clone(),
        tagline: payload.tagline.clone(),
        funds_requested: payload.funds_requested.clone(),
        skills: payload.skills.clone(),
        organization_willing_to_sponsor: Some(payload.organization_willing_to_sponsor),
        existing_oss_project: Some(payload.existing_oss_project),
        author: Some(payload.author.clone()),
        description: Some(payload.description.clone()),
        details: Some(payload.details.clone()),
        project_stages: Some(
            payload
                .project_stages
                .iter()
                .map(|(label, text)| (label.to_string(), text.to_string()))
                .collect(),
        ),
        extra_information: Some(payload.extra_information.clone()),
    }
}

/// Builds proposal markdown with every field valid unless overridden.
#[derive(Clone)]
pub(crate) struct ProposalBuilder {
    proposal_id: Option<String>,
    title: Option<String>,
    tagline: Option<String>,
    funding: Option<String>,
    skills: Vec<String>,
    sponsor: Option<String>,
    existing_oss: Option<String>,
    author: Option<String>,
    description: String,
    details: String,
    phases: Vec<(String, String)>,
    supporting: String,
}

impl ProposalBuilder {
    pub(crate) fn valid() -> Self {
        Self {
            proposal_id: None,
            title: Some("Sandboxed plugin runtime".to_string()),
            tagline: Some("Run untrusted plugins safely".to_string()),
            funding: Some("5000".to_string()),
            skills: vec!["Rust".to_string(), "WebAssembly".to_string()],
            sponsor: Some("Yes".to_string()),
            existing_oss: Some("No".to_string()),
            author: Some("@octocat".to_string()),
            description: words("word", 60),
            details: words("detail", 60),
            phases: vec![
                ("Phase 1".to_string(), words("phase1word", 25)),
                ("Phase 2".to_string(), words("phase2word", 25)),
            ],
            supporting: "See the design notes.".to_string(),
        }
    }

    pub(crate) fn proposal_id(mut self, id: &str) -> Self {
        self.proposal_id = Some(id.to_string());
        self
    }

    pub(crate) fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub(crate) fn without_title(mut self) -> Self {
        self.title = None;
        self
    }

    pub(crate) fn tagline(mut self, tagline: &str) -> Self {
        self.tagline = Some(tagline.to_string());
        self
    }

    pub(crate) fn without_tagline(mut self) -> Self {
        self.tagline = None;
        self
    }

    pub(crate) fn funding(mut self, amount: &str) -> Self {
        self.funding = Some(amount.to_string());
        self
    }

    pub(crate) fn without_funding(mut self) -> Self {
        self.funding = None;
        self
    }

    pub(crate) fn sponsor(mut self, answer: &str) -> Self {
        self.sponsor = Some(answer.to_string());
        self
    }

    pub(crate) fn without_existing_oss(mut self) -> Self {
        self.existing_oss = None;
        self
    }

    pub(crate) fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub(crate) fn without_author(mut self) -> Self {
        self.author = None;
        self
    }

    pub(crate) fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    pub(crate) fn details(mut self, text: &str) -> Self {
        self.details = text.to_string();
        self
    }

    pub(crate) fn phase(mut self, label: &str, text: &str) -> Self {
        self.phases.push((label.to_string(), text.to_string()));
        self
    }

    pub(crate) fn replace_phase(mut self, label: &str, text: &str) -> Self {
        for entry in &mut self.phases {
            if entry.0 == label {
                entry.1 = text.to_string();
            }
        }
        self
    }

    pub(crate) fn without_phases(mut self) -> Self {
        self.phases.clear();
        self
    }

    pub(crate) fn supporting(mut self, text: &str) -> Self {
        self.supporting = text.to_string();
        self
    }

    pub(crate) fn build(&self) -> String {
        let mut out = String::from("---\n");
        let fields = [
            ("Proposal ID", &self.proposal_id),
            ("Proposal Title", &self.title),
            ("Tagline", &self.tagline),
            ("Requested Funding Amount", &self.funding),
            ("Is your organization willing to sponsor this project?", &self.sponsor),
            ("Is this an existing OSS project?", &self.existing_oss),
            ("Author", &self.author),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                out.push_str(&format!("{key}: {}\n", quoted(value)));
            }
        }
        if !self.skills.is_empty() {
            let skills: Vec<String> = self.skills.iter().map(String::as_str).map(quoted).collect();
            out.push_str(&format!("Skills: [{}]\n", skills.join(", ")));
        }
        out.push_str("---\n\n");
        out.push_str(&format!("## Project Description\n{}\n\n", self.description));
        out.push_str(&format!(
            "## Project Details & Specifications\n{}\n\n",
            self.details
        ));
        out.push_str("## Project Stages\n");
        for (label, text) in &self.phases {
            out.push_str(&format!("### {label}\n{text}\n\n"));
        }
        out.push_str(&format!("\n## Supporting Information\n{}\n", self.supporting));
        out
    }
}

fn quoted(value: &str) -> String {
    serde_json::to_string(value).expect("quote YAML scalar")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Title(String),
    Username(String),
    Proposal(String),
    Moderation(String),
    Submit(SubmissionPayload),
}

/// In-memory registry; everything passes unless configured otherwise.
#[derive(Default)]
pub(crate) struct FakeRegistry {
    taken_titles: Vec<String>,
    unknown_users: Vec<String>,
    flagged: Vec<String>,
    stored: BTreeMap<String, ExistingProposal>,
    assigned_id: Option<String>,
    reject_submissions: bool,
    unreachable: bool,
    calls: RefCell<Vec<Call>>,
}

impl FakeRegistry {
    pub(crate) fn with_taken_title(mut self, title: &str) -> Self {
        self.taken_titles.push(title.to_string());
        self
    }

    pub(crate) fn with_unknown_user(mut self, username: &str) -> Self {
        self.unknown_users.push(username.to_string());
        self
    }

    /// Moderation fails for any text containing `needle`.
    pub(crate) fn flagging(mut self, needle: &str) -> Self {
        self.flagged.push(needle.to_string());
        self
    }

    pub(crate) fn with_stored(mut self, id: &str, record: ExistingProposal) -> Self {
        self.stored.insert(id.to_string(), record);
        self
    }

    pub(crate) fn assigning(mut self, id: &str) -> Self {
        self.assigned_id = Some(id.to_string());
        self
    }

    pub(crate) fn rejecting_submissions(mut self) -> Self {
        self.reject_submissions = true;
        self
    }

    /// Every oracle fails, as if the registry could not be reached.
    pub(crate) fn failing_all(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    fn log(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn verdict(&self, passed: bool) -> Verdict {
        if passed && !self.unreachable {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }
}

impl Registry for FakeRegistry {
    fn check_title(&self, title: &str) -> Verdict {
        self.log(Call::Title(title.to_string()));
        self.verdict(!self.taken_titles.iter().any(|taken| taken == title))
    }

    fn check_username(&self, username: &str) -> Verdict {
        self.log(Call::Username(username.to_string()));
        self.verdict(!self.unknown_users.iter().any(|unknown| unknown == username))
    }

    fn check_proposal(&self, id: &str) -> Option<ExistingProposal> {
        self.log(Call::Proposal(id.to_string()));
        if self.unreachable {
            return None;
        }
        self.stored.get(id).cloned()
    }

    fn check_moderation(&self, text: &str) -> Verdict {
        self.log(Call::Moderation(text.to_string()));
        self.verdict(!self.flagged.iter().any(|needle| text.contains(needle.as_str())))
    }

    fn submit_proposal(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt> {
        self.log(Call::Submit(payload.clone()));
        if self.reject_submissions || self.unreachable {
            return Err(anyhow!("registry rejected submission with status 400: bad request"));
        }
        Ok(SubmissionReceipt {
            message: "Proposal received".to_string(),
            identifier: self.assigned_id.clone(),
        })
    }
}
