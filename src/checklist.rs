//! Per-document checklist of validation and moderation outcomes.
//!
//! Rules are keyed by [`RuleId`]; display text is rendered separately so rule
//! identity never depends on report wording. A rule governed by an optional
//! field is removed when that field is absent, which keeps "not applicable"
//! distinct from "passed".
use std::fmt;

/// Stable identity of a checklist rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleId {
    TitleRequired,
    TitleLength,
    TitleUnique,
    TaglineLength,
    FundingInteger,
    SponsorRequired,
    ExistingOssRequired,
    AuthorRequired,
    AuthorIdentity,
    DescriptionRequired,
    DescriptionLength,
    DetailsRequired,
    DetailsLength,
    StagesRequired,
    /// Minimum length of the phase with this label.
    PhaseLength(String),
    TitleModeration,
    TaglineModeration,
    DescriptionModeration,
    DetailsModeration,
    /// Moderation of the phase with this label.
    PhaseModeration(String),
    SupportingInfoModeration,
}

pub const MANDATORY_PHASES: [&str; 2] = ["Phase 1", "Phase 2"];

impl RuleId {
    /// Human-readable text shown in the report.
    pub fn description(&self) -> String {
        match self {
            RuleId::TitleRequired => "Title is required.".to_string(),
            RuleId::TitleLength => "Title must be less than 20 words.".to_string(),
            RuleId::TitleUnique => "Title must be unique.".to_string(),
            RuleId::TaglineLength => "Tagline must be less than 160 characters.".to_string(),
            RuleId::FundingInteger => {
                "Requested funding amount must be an integer.".to_string()
            }
            RuleId::SponsorRequired => "Organization willing to sponsor is required. \
                 Kindly provide a response in Yes or No."
                .to_string(),
            RuleId::ExistingOssRequired => "Is it an existing OSS project is required. \
                 Kindly provide a response in Yes or No."
                .to_string(),
            RuleId::AuthorRequired => "Author is required.".to_string(),
            RuleId::AuthorIdentity => "Author must be a user on REPOS.".to_string(),
            RuleId::DescriptionRequired => "Project description is required. \
                 Please provide a description in minimum 50 words."
                .to_string(),
            RuleId::DescriptionLength => {
                "Project description must be more than 50 words.".to_string()
            }
            RuleId::DetailsRequired => "Project details are required. \
                 Please provide details in minimum 50 words."
                .to_string(),
            RuleId::DetailsLength => "Project details must be more than 50 words.".to_string(),
            RuleId::StagesRequired => {
                "Project stages are required. Phase 1 and Phase 2 are mandatory.".to_string()
            }
            RuleId::PhaseLength(label) => format!("{label} must be more than 20 words."),
            RuleId::TitleModeration => "Title moderation passed.".to_string(),
            RuleId::TaglineModeration => "Tagline moderation passed.".to_string(),
            RuleId::DescriptionModeration => {
                "Project description moderation passed.".to_string()
            }
            RuleId::DetailsModeration => {
                "Project details & specification moderation passed.".to_string()
            }
            RuleId::PhaseModeration(label) => format!("{label} moderation passed."),
            RuleId::SupportingInfoModeration => {
                "Supporting information moderation passed.".to_string()
            }
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Tri-state view of a rule; suppressed rules are `NotApplicable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Passed,
    Failed,
    NotApplicable,
}

/// Ordered rule outcomes for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checklist {
    entries: Vec<(RuleId, bool)>,
}

impl Checklist {
    /// Fresh checklist with every fixed rule optimistically passed.
    pub fn initialize() -> Self {
        let [phase1, phase2] = MANDATORY_PHASES;
        let rules = vec![
            RuleId::TitleRequired,
            RuleId::TitleLength,
            RuleId::TitleUnique,
            RuleId::TaglineLength,
            RuleId::FundingInteger,
            RuleId::SponsorRequired,
            RuleId::ExistingOssRequired,
            RuleId::AuthorRequired,
            RuleId::AuthorIdentity,
            RuleId::DescriptionRequired,
            RuleId::DescriptionLength,
            RuleId::DetailsRequired,
            RuleId::DetailsLength,
            RuleId::StagesRequired,
            RuleId::PhaseLength(phase1.to_string()),
            RuleId::PhaseLength(phase2.to_string()),
            RuleId::TitleModeration,
            RuleId::TaglineModeration,
            RuleId::DescriptionModeration,
            RuleId::DetailsModeration,
            RuleId::PhaseModeration(phase1.to_string()),
            RuleId::PhaseModeration(phase2.to_string()),
            RuleId::SupportingInfoModeration,
        ];
        Self {
            entries: rules.into_iter().map(|rule| (rule, true)).collect(),
        }
    }

    /// Mark an existing rule failed. Returns `false` if the rule is not present.
    pub fn fail(&mut self, rule: &RuleId) -> bool {
        self.set(rule, false)
    }

    /// Mark an existing rule passed. Returns `false` if the rule is not present.
    pub fn pass(&mut self, rule: &RuleId) -> bool {
        self.set(rule, true)
    }

    /// Record `passed` for `rule`, appending it if the key space lacks it.
    ///
    /// Used for per-phase rules, whose labels are only known after parsing.
    /// Fixed rules go through [`Checklist::pass`] and [`Checklist::fail`] so a
    /// suppressed rule is never brought back.
    pub fn record(&mut self, rule: RuleId, passed: bool) {
        if self.contains(&rule) {
            self.set(&rule, passed);
        } else {
            self.entries.push((rule, passed));
        }
    }

    /// Remove a rule whose governing optional field is absent.
    pub fn suppress(&mut self, rule: &RuleId) {
        self.entries.retain(|(id, _)| id != rule);
    }

    pub fn contains(&self, rule: &RuleId) -> bool {
        self.entries.iter().any(|(id, _)| id == rule)
    }

    pub fn state(&self, rule: &RuleId) -> RuleState {
        match self.entries.iter().find(|(id, _)| id == rule) {
            Some((_, true)) => RuleState::Passed,
            Some((_, false)) => RuleState::Failed,
            None => RuleState::NotApplicable,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.entries.iter().all(|(_, passed)| *passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RuleId> {
        self.entries
            .iter()
            .filter(|(_, passed)| !passed)
            .map(|(id, _)| id)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RuleId, bool)> {
        self.entries.iter().map(|(id, passed)| (id, *passed))
    }

    fn set(&mut self, rule: &RuleId, passed: bool) -> bool {
        match self.entries.iter_mut().find(|(id, _)| id == rule) {
            Some(entry) => {
                entry.1 = passed;
                true
            }
            None => {
                tracing::debug!(rule = %rule, "ignoring update for rule not in checklist");
                false
            }
        }
    }
}
