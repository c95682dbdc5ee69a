//! Content moderation of every free-text field.
//!
//! Each present field gets exactly one moderation call. Unlike validation,
//! a passing response re-affirms its rule, so a field that failed on an
//! earlier evaluation can recover. Absent fields are left to validation,
//! which has already failed or suppressed their rule.
use crate::checklist::{Checklist, RuleId, RuleState};
use crate::document::ProposalDocument;
use crate::registry::{ExistingProposal, Registry};
use crate::validation::title_unchanged;

pub fn moderate<R: Registry + ?Sized>(
    doc: &ProposalDocument,
    prior: Option<&ExistingProposal>,
    registry: &R,
    checklist: &mut Checklist,
) {
    if let Some(title) = doc.title() {
        if title_unchanged(title, prior) {
            tracing::debug!(title, "title unchanged since last submission; skipping moderation");
        } else {
            check(registry, title, &RuleId::TitleModeration, checklist);
        }
    }
    if let Some(tagline) = doc.tagline() {
        check(registry, tagline, &RuleId::TaglineModeration, checklist);
    }
    if !doc.sections.description.is_empty() {
        check(
            registry,
            &doc.sections.description,
            &RuleId::DescriptionModeration,
            checklist,
        );
    }
    if !doc.sections.details.is_empty() {
        check(
            registry,
            &doc.sections.details,
            &RuleId::DetailsModeration,
            checklist,
        );
    }
    for (label, text) in doc.phases.iter() {
        let rule = RuleId::PhaseModeration(label.to_string());
        let passed = moderated(registry, text, &rule);
        checklist.record(rule, passed);
    }
    if !doc.sections.supporting_info.is_empty() {
        check(
            registry,
            &doc.sections.supporting_info,
            &RuleId::SupportingInfoModeration,
            checklist,
        );
    }
}

/// Moderate a fixed field. Suppressed rules stay out of the checklist.
fn check<R: Registry + ?Sized>(registry: &R, text: &str, rule: &RuleId, checklist: &mut Checklist) {
    if checklist.state(rule) == RuleState::NotApplicable {
        return;
    }
    if moderated(registry, text, rule) {
        checklist.pass(rule);
    } else {
        checklist.fail(rule);
    }
}

fn moderated<R: Registry + ?Sized>(registry: &R, text: &str, rule: &RuleId) -> bool {
    let passed = registry.check_moderation(text).passed();
    if !passed {
        tracing::info!(rule = %rule, "moderation rejected field");
    }
    passed
}
