use std::collections::HashSet;
use std::fmt::Write;

use crate::dashboard::DashboardState;
use crate::metrics::{risk_color, RiskColor, StudentMetrics};
use crate::models::{RiskLevel, StudentRecord};

const ATTENDANCE_PREVIEW: usize = 5;
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(self, text: &str, color: RiskColor) -> String {
        if self.enabled {
            format!("{}{}{}", color.ansi(), text, RESET)
        } else {
            text.to_string()
        }
    }
}

pub fn filter_label(filter: Option<RiskLevel>) -> &'static str {
    match filter {
        None => "All Levels",
        Some(RiskLevel::High) => "High Risk",
        Some(RiskLevel::Medium) => "Medium Risk",
        Some(RiskLevel::Low) => "Low Risk",
    }
}

pub fn render_dashboard(
    state: &DashboardState,
    expanded: &HashSet<String>,
    palette: Palette,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Student Dropout Risk Dashboard");
    let action = if state.can_evaluate() {
        "[Evaluate Students]"
    } else {
        "[Evaluating...]"
    };
    let _ = writeln!(
        output,
        "Risk Level: {} | Sort By: {} | {}",
        filter_label(state.risk_filter),
        state.sort_option.label(),
        action
    );
    let _ = writeln!(output);

    if let Some(error) = &state.error {
        let _ = writeln!(output, "{}", palette.paint(&format!("! {error}"), RiskColor::Danger));
        let _ = writeln!(output);
    }

    if state.loading {
        let _ = writeln!(output, "Loading...");
    } else if state.students.is_empty() {
        let _ = writeln!(output, "No students found.");
    } else {
        for student in &state.students {
            let open = expanded.contains(&student.student_id);
            output.push_str(&render_card(student, open, palette));
            let _ = writeln!(output);
        }
    }

    output
}

pub fn render_card(student: &StudentRecord, expanded: bool, palette: Palette) -> String {
    let metrics = StudentMetrics::of(student);
    let level = student.dropout_risk_level.as_deref();
    let badge = match level {
        Some(level) if !level.is_empty() => level,
        _ => "Unknown",
    };
    let score = student
        .dropout_score
        .map(|score| score.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let note = match student.dropout_note.as_deref() {
        Some(note) if !note.is_empty() => note,
        _ => "No notes",
    };

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} ({})  {}",
        student.student_name,
        student.student_id,
        palette.paint(&format!("[{badge}]"), risk_color(level))
    );
    let _ = writeln!(output, "  Risk Score: {score}");
    let _ = writeln!(output, "  Note: {note}");
    let _ = writeln!(
        output,
        "  Attendance: {}% | Assignments: {}% | Contact Failures: {}",
        metrics.attendance_rate, metrics.assignment_rate, metrics.contact_failures
    );

    if expanded {
        render_history(&mut output, student, palette);
    }

    output
}

fn render_history(output: &mut String, student: &StudentRecord, palette: Palette) {
    let _ = writeln!(output, "  Attendance");
    for entry in student.attendance.iter().take(ATTENDANCE_PREVIEW) {
        let color = if entry.is_attended() {
            RiskColor::Success
        } else {
            RiskColor::Danger
        };
        let _ = writeln!(output, "    {}  {}", entry.date, palette.paint(&entry.status, color));
    }
    if student.attendance.len() > ATTENDANCE_PREVIEW {
        let _ = writeln!(
            output,
            "    +{} more...",
            student.attendance.len() - ATTENDANCE_PREVIEW
        );
    }

    let _ = writeln!(output, "  Assignments");
    for assignment in &student.assignments {
        let status = if assignment.submitted {
            palette.paint("Submitted", RiskColor::Success)
        } else {
            palette.paint("Not Submitted", RiskColor::Danger)
        };
        let _ = writeln!(output, "    {}  {}", assignment.name, status);
    }

    let _ = writeln!(output, "  Contact Attempts");
    if student.contacts.is_empty() {
        let _ = writeln!(output, "    No contact attempts");
    }
    for contact in &student.contacts {
        let color = if contact.is_success() {
            RiskColor::Success
        } else {
            RiskColor::Danger
        };
        let _ = writeln!(output, "    {}  {}", contact.date, palette.paint(&contact.status, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{reduce, Action, FETCH_FAILED};
    use crate::fixtures::{assignment, attendance, contact, student};
    use crate::models::ListQuery;

    fn plain() -> Palette {
        Palette::new(false)
    }

    #[test]
    fn unevaluated_card_uses_placeholders() {
        let card = render_card(&student("S010", None, None), false, plain());
        assert!(card.starts_with("Student S010 (S010)  [Unknown]"));
        assert!(card.contains("Risk Score: N/A"));
        assert!(card.contains("Note: No notes"));
        assert!(card.contains("Attendance: 100% | Assignments: 100% | Contact Failures: 0"));
        assert!(!card.contains("Contact Attempts"));
    }

    #[test]
    fn expanded_card_truncates_attendance() {
        let mut record = student("S011", Some("HIGH"), Some(3));
        record.dropout_note = Some("attendance, communication risk factors".to_string());
        record.attendance = (1..=7)
            .map(|day| attendance(&format!("2025-03-0{day}"), "ABSENT"))
            .collect();
        record.assignments = vec![assignment("2025-03-01", "Lab Report", false)];

        let card = render_card(&record, true, plain());
        assert!(card.contains("2025-03-05  ABSENT"));
        assert!(!card.contains("2025-03-06"));
        assert!(card.contains("+2 more..."));
        assert!(card.contains("Lab Report  Not Submitted"));
        assert!(card.contains("No contact attempts"));
        assert!(card.contains("Attendance: 0.0%"));
    }

    #[test]
    fn colored_badge_wraps_in_escape_codes() {
        let mut record = student("S012", Some("LOW"), Some(0));
        record.contacts = vec![contact("2025-03-01", "SUCCESS")];
        let card = render_card(&record, false, Palette::new(true));
        assert!(card.contains("\x1b[32m[LOW]\x1b[0m"));
    }

    #[test]
    fn dashboard_shows_banner_and_disabled_action() {
        let (state, _) = reduce(DashboardState::new(ListQuery::default()), Action::Mount);
        let (mut state, _) = reduce(
            state,
            Action::ListSettled {
                generation: 1,
                outcome: Ok(Vec::new()),
            },
        );
        state.error = Some(FETCH_FAILED.to_string());
        state.evaluating = true;

        let screen = render_dashboard(&state, &HashSet::new(), plain());
        assert!(screen.contains("Risk Level: All Levels | Sort By: Default | [Evaluating...]"));
        assert!(screen.contains("! Failed to fetch students."));
        assert!(screen.contains("No students found."));
    }

    #[test]
    fn loading_hides_list() {
        let (state, _) = reduce(DashboardState::default(), Action::Mount);
        let screen = render_dashboard(&state, &HashSet::new(), plain());
        assert!(screen.contains("Loading..."));
        assert!(!screen.contains("No students found."));
    }
}
