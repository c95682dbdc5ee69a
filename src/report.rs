//! Plain-text checklist report printed once per document.
use crate::checklist::Checklist;

const CHECK_COLUMN_WIDTH: usize = 85;
const HEAVY_RULE: &str = "=========================================================";
const LIGHT_RULE: &str = "---------------------------------------------------------";

/// Render the two-column `Check | Result` table in checklist order.
///
/// Suppressed rules are absent from the checklist and so never appear.
pub fn render_checklist(checklist: &Checklist) -> String {
    let mut out = String::new();
    push_line(&mut out, HEAVY_RULE);
    push_line(&mut out, "Validations & Moderations Checks Results:");
    push_line(&mut out, HEAVY_RULE);
    push_row(&mut out, "Check", "Result");
    push_line(&mut out, LIGHT_RULE);
    for (rule, passed) in checklist.iter() {
        push_row(&mut out, &rule.description(), result_label(passed));
    }
    push_line(&mut out, HEAVY_RULE);
    out
}

pub fn result_label(passed: bool) -> &'static str {
    if passed {
        "Passed"
    } else {
        "Failed"
    }
}

fn push_row(out: &mut String, check: &str, result: &str) {
    push_line(
        out,
        &format!("{check:<width$} | {result}", width = CHECK_COLUMN_WIDTH),
    );
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::RuleId;

    #[test]
    fn rows_follow_checklist_order() {
        let mut checklist = Checklist::initialize();
        checklist.fail(&RuleId::TitleUnique);
        let report = render_checklist(&checklist);
        let rows: Vec<&str> = report.lines().filter(|line| line.contains(" | ")).collect();
        assert_eq!(rows.len(), checklist.iter().count() + 1);
        assert!(rows[0].starts_with("Check "));
        assert!(rows[1].starts_with("Title is required."));
        assert!(rows[1].ends_with("| Passed"));
        assert!(rows[3].starts_with("Title must be unique."));
        assert!(rows[3].ends_with("| Failed"));
    }

    #[test]
    fn check_column_is_padded() {
        let report = render_checklist(&Checklist::initialize());
        let header = report
            .lines()
            .find(|line| line.starts_with("Check"))
            .expect("header row");
        assert_eq!(header.find('|'), Some(CHECK_COLUMN_WIDTH + 1));
    }

    #[test]
    fn suppressed_rules_are_not_reported() {
        let mut checklist = Checklist::initialize();
        checklist.suppress(&RuleId::TaglineLength);
        checklist.suppress(&RuleId::TaglineModeration);
        let report = render_checklist(&checklist);
        assert!(!report.contains("Tagline must be less than 160 characters."));
        assert!(!report.contains("Tagline moderation passed."));
        assert!(!report.contains("Failed"));
    }
}
