//! Field validation rules.
//!
//! Rules run in a fixed order and only ever flip entries to failed; a failed
//! remote lookup is a rule failure, never an error, so the full checklist is
//! always available for the report.
use crate::checklist::{Checklist, RuleId, MANDATORY_PHASES};
use crate::document::ProposalDocument;
use crate::registry::{ExistingProposal, Registry};

pub const TITLE_MAX_WORDS: usize = 20;
pub const TAGLINE_MAX_CHARS: usize = 160;
pub const SECTION_MIN_WORDS: usize = 50;
pub const PHASE_MIN_WORDS: usize = 20;

const YES_NO: [&str; 2] = ["Yes", "No"];

/// Count ASCII-whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| c.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .count()
}

/// True when the update-mode record shows the title is unchanged.
///
/// Comparison is exact; case or whitespace variants are a different title.
pub fn title_unchanged(title: &str, prior: Option<&ExistingProposal>) -> bool {
    prior.is_some_and(|prior| prior.title == title)
}

/// Run every validation rule against `doc`, recording outcomes in `checklist`.
///
/// `prior` is the stored record when the document is in update mode.
pub fn validate<R: Registry + ?Sized>(
    doc: &ProposalDocument,
    prior: Option<&ExistingProposal>,
    registry: &R,
    checklist: &mut Checklist,
) {
    validate_title(doc.title(), prior, registry, checklist);
    validate_tagline(doc.tagline(), checklist);
    validate_funding(doc.requested_funding(), checklist);
    validate_yes_no(doc.sponsor_willing(), RuleId::SponsorRequired, checklist);
    validate_yes_no(doc.existing_oss(), RuleId::ExistingOssRequired, checklist);
    validate_author(doc.author(), registry, checklist);
    validate_section(
        &doc.sections.description,
        [
            RuleId::DescriptionRequired,
            RuleId::DescriptionLength,
            RuleId::DescriptionModeration,
        ],
        checklist,
    );
    validate_section(
        &doc.sections.details,
        [
            RuleId::DetailsRequired,
            RuleId::DetailsLength,
            RuleId::DetailsModeration,
        ],
        checklist,
    );
    validate_phases(doc, checklist);
    if doc.sections.supporting_info.is_empty() {
        checklist.suppress(&RuleId::SupportingInfoModeration);
    }
}

fn validate_title<R: Registry + ?Sized>(
    title: Option<&str>,
    prior: Option<&ExistingProposal>,
    registry: &R,
    checklist: &mut Checklist,
) {
    let Some(title) = title else {
        checklist.fail(&RuleId::TitleRequired);
        checklist.fail(&RuleId::TitleUnique);
        checklist.fail(&RuleId::TitleLength);
        checklist.fail(&RuleId::TitleModeration);
        return;
    };

    if title_unchanged(title, prior) {
        tracing::debug!(title, "title unchanged since last submission; skipping uniqueness check");
    } else if !registry.check_title(title).passed() {
        checklist.fail(&RuleId::TitleUnique);
    }

    if word_count(title) > TITLE_MAX_WORDS {
        checklist.fail(&RuleId::TitleLength);
    }
}

fn validate_tagline(tagline: Option<&str>, checklist: &mut Checklist) {
    let Some(tagline) = tagline else {
        checklist.suppress(&RuleId::TaglineLength);
        checklist.suppress(&RuleId::TaglineModeration);
        return;
    };
    if tagline.chars().count() > TAGLINE_MAX_CHARS {
        checklist.fail(&RuleId::TaglineLength);
    }
}

fn validate_funding(amount: Option<&str>, checklist: &mut Checklist) {
    if let Some(amount) = amount {
        if !amount.chars().all(|c| c.is_ascii_digit()) {
            checklist.fail(&RuleId::FundingInteger);
        }
    }
}

fn validate_yes_no(answer: Option<&str>, rule: RuleId, checklist: &mut Checklist) {
    if !answer.is_some_and(|answer| YES_NO.contains(&answer)) {
        checklist.fail(&rule);
    }
}

fn validate_author<R: Registry + ?Sized>(
    author: Option<&str>,
    registry: &R,
    checklist: &mut Checklist,
) {
    let Some(author) = author else {
        checklist.fail(&RuleId::AuthorRequired);
        checklist.fail(&RuleId::AuthorIdentity);
        return;
    };
    let username = author.trim_start_matches('@');
    if !registry.check_username(username).passed() {
        checklist.fail(&RuleId::AuthorIdentity);
    }
}

/// `rules` is `[required, minimum length, moderation]` for the section.
fn validate_section(text: &str, rules: [RuleId; 3], checklist: &mut Checklist) {
    let [required, length, moderation] = rules;
    if text.is_empty() {
        checklist.fail(&required);
        checklist.fail(&length);
        checklist.fail(&moderation);
        return;
    }
    if word_count(text) < SECTION_MIN_WORDS {
        checklist.fail(&length);
    }
}

fn validate_phases(doc: &ProposalDocument, checklist: &mut Checklist) {
    if !MANDATORY_PHASES.iter().any(|label| doc.phases.contains(label)) {
        checklist.fail(&RuleId::StagesRequired);
        for label in MANDATORY_PHASES {
            checklist.fail(&RuleId::PhaseLength(label.to_string()));
            checklist.fail(&RuleId::PhaseModeration(label.to_string()));
        }
    } else {
        for label in MANDATORY_PHASES {
            let Some(text) = doc.phases.get(label) else {
                // Absent mandatory phase cannot meet its length or moderation rule.
                checklist.fail(&RuleId::PhaseLength(label.to_string()));
                checklist.fail(&RuleId::PhaseModeration(label.to_string()));
                continue;
            };
            if word_count(text) < PHASE_MIN_WORDS {
                checklist.fail(&RuleId::PhaseLength(label.to_string()));
            }
        }
    }

    for (label, text) in doc.phases.iter() {
        if MANDATORY_PHASES.contains(&label) {
            continue;
        }
        let passed = word_count(text) >= PHASE_MIN_WORDS;
        checklist.record(RuleId::PhaseLength(label.to_string()), passed);
    }
}
