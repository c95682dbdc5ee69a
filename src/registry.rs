//! Remote proposal registry.
//!
//! The registry exposes four oracles (title uniqueness, username identity,
//! stored-proposal lookup, content moderation) and the submission endpoint.
//! Oracle failures never abort a run: a transport error or any status other
//! than 200 is reported as [`Verdict::Failed`] and logged.
use crate::document::Phases;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use ureq::Agent;

/// Outcome of a remote pass/fail check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    pub fn passed(self) -> bool {
        matches!(self, Verdict::Passed)
    }

    fn from_status(status: u16) -> Self {
        if status == 200 {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }
}

/// Prior state of a proposal, fetched by identifier in update mode.
///
/// Only `title` is guaranteed. A field the registry leaves out is `None` (or
/// empty for `skills`) and never matches a present payload value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExistingProposal {
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub funds_requested: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub organization_willing_to_sponsor: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub existing_oss_project: Option<bool>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub project_stages: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub extra_information: Option<String>,
}

impl ExistingProposal {
    /// True when the stored record holds every submitted field with an equal value.
    pub fn matches(&self, payload: &SubmissionPayload) -> bool {
        self.title == payload.title
            && self.tagline == payload.tagline
            && self.funds_requested == payload.funds_requested
            && self.skills == payload.skills
            && self.organization_willing_to_sponsor
                == Some(payload.organization_willing_to_sponsor)
            && self.existing_oss_project == Some(payload.existing_oss_project)
            && self.author.as_deref() == Some(payload.author.as_str())
            && self.description.as_deref() == Some(payload.description.as_str())
            && self.details.as_deref() == Some(payload.details.as_str())
            && self.extra_information.as_deref() == Some(payload.extra_information.as_str())
            && self
                .project_stages
                .as_ref()
                .is_some_and(|stored| same_stages(stored, &payload.project_stages))
    }
}

fn same_stages(stored: &BTreeMap<String, String>, phases: &Phases) -> bool {
    stored.len() == phases.iter().count()
        && phases
            .iter()
            .all(|(label, text)| stored.get(label).map(String::as_str) == Some(text))
}

/// Fields forwarded to the registry on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub tagline: Option<String>,
    pub funds_requested: Option<String>,
    pub skills: Vec<String>,
    pub organization_willing_to_sponsor: bool,
    pub existing_oss_project: bool,
    pub author: String,
    pub description: String,
    pub details: String,
    pub project_stages: Phases,
    pub extra_information: String,
    pub github_url: String,
    pub commit_id: String,
}

/// Registry reply to an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub message: String,
    pub identifier: Option<String>,
}

#[derive(Deserialize)]
struct RawReceipt {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    id: Option<String>,
}

pub trait Registry {
    fn check_title(&self, title: &str) -> Verdict;
    fn check_username(&self, username: &str) -> Verdict;
    /// Stored record for `id`, or `None` when it is unknown or unreachable.
    fn check_proposal(&self, id: &str) -> Option<ExistingProposal>;
    fn check_moderation(&self, text: &str) -> Verdict;
    fn submit_proposal(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt>;
}

/// Blocking HTTP client for the registry API.
pub struct HttpRegistry {
    base_url: String,
    agent: Agent,
}

impl HttpRegistry {
    /// `base_url` must end with `/`; endpoint paths are appended verbatim.
    pub fn new(base_url: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            base_url: base_url.to_string(),
            agent,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn verdict(&self, check: &str, result: Result<u16, ureq::Error>) -> Verdict {
        match result {
            Ok(status) => {
                let verdict = Verdict::from_status(status);
                tracing::debug!(check, status, ?verdict, "registry check complete");
                verdict
            }
            Err(err) => {
                tracing::warn!(check, error = %err, "registry check failed; recording as failure");
                Verdict::Failed
            }
        }
    }
}

impl Registry for HttpRegistry {
    fn check_title(&self, title: &str) -> Verdict {
        let result = self
            .agent
            .get(&self.endpoint("check_title"))
            .query("title", title)
            .call()
            .map(|response| response.status().as_u16());
        self.verdict("check_title", result)
    }

    fn check_username(&self, username: &str) -> Verdict {
        let result = self
            .agent
            .get(&self.endpoint("check_username"))
            .query("username", username)
            .call()
            .map(|response| response.status().as_u16());
        self.verdict("check_username", result)
    }

    fn check_proposal(&self, id: &str) -> Option<ExistingProposal> {
        let url = self.endpoint(&proposal_path(id));
        let mut response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(id, error = %err, "stored proposal lookup failed");
                return None;
            }
        };
        let status = response.status().as_u16();
        if status != 200 {
            tracing::info!(id, status, "no stored proposal for identifier");
            return None;
        }
        match response.body_mut().read_json::<ExistingProposal>() {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(id, error = %err, "stored proposal response is not valid JSON");
                None
            }
        }
    }

    fn check_moderation(&self, text: &str) -> Verdict {
        let result = self
            .agent
            .post(&self.endpoint("check_moderation/"))
            .send_form([("text", text)])
            .map(|response| response.status().as_u16());
        self.verdict("check_moderation", result)
    }

    fn submit_proposal(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt> {
        let mut response = self
            .agent
            .post(&self.endpoint("submit_proposal/"))
            .send_json(payload)
            .context("send proposal submission")?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .context("read submission response")?;
        if status != 200 {
            return Err(anyhow!(
                "registry rejected submission with status {status}: {}",
                body.trim()
            ));
        }
        let raw: RawReceipt =
            serde_json::from_str(&body).context("parse submission response JSON")?;
        Ok(SubmissionReceipt {
            message: raw.message.unwrap_or_default(),
            identifier: raw.id,
        })
    }
}

/// `proposals/{id}/` with `id` encoded as a single path segment.
fn proposal_path(id: &str) -> String {
    format!("proposals/{}/", urlencoding::encode(id))
}

/// Accept a boolean or a `Yes`/`No` answer.
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::String(text)) => match text.as_str() {
            "Yes" | "true" => Some(true),
            "No" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Accept a string or number and render it as text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
