use crate::models::StudentRecord;

/// Display figures derived from one record's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentMetrics {
    pub attendance_rate: String,
    pub assignment_rate: String,
    pub contact_failures: usize,
}

impl StudentMetrics {
    pub fn of(record: &StudentRecord) -> Self {
        Self {
            attendance_rate: attendance_rate(record),
            assignment_rate: assignment_rate(record),
            contact_failures: contact_failure_count(record),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskColor {
    Danger,
    Warning,
    Success,
    Neutral,
}

impl RiskColor {
    pub fn hex(self) -> &'static str {
        match self {
            RiskColor::Danger => "#f44336",
            RiskColor::Warning => "#ff9800",
            RiskColor::Success => "#4caf50",
            RiskColor::Neutral => "#9e9e9e",
        }
    }

    /// SGR foreground sequence for terminal output.
    pub fn ansi(self) -> &'static str {
        match self {
            RiskColor::Danger => "\x1b[31m",
            RiskColor::Warning => "\x1b[33m",
            RiskColor::Success => "\x1b[32m",
            RiskColor::Neutral => "\x1b[90m",
        }
    }
}

/// Percentage of ATTEND entries. An empty history counts as full attendance.
pub fn attendance_rate(record: &StudentRecord) -> String {
    let attended = record
        .attendance
        .iter()
        .filter(|entry| entry.is_attended())
        .count();
    format_rate(attended, record.attendance.len())
}

/// Percentage of submitted assignments. No assignments reads as `100`.
pub fn assignment_rate(record: &StudentRecord) -> String {
    let submitted = record
        .assignments
        .iter()
        .filter(|assignment| assignment.submitted)
        .count();
    format_rate(submitted, record.assignments.len())
}

pub fn contact_failure_count(record: &StudentRecord) -> usize {
    record
        .contacts
        .iter()
        .filter(|contact| contact.is_failed())
        .count()
}

pub fn risk_color(risk_level: Option<&str>) -> RiskColor {
    match risk_level {
        Some("HIGH") => RiskColor::Danger,
        Some("MEDIUM") => RiskColor::Warning,
        Some("LOW") => RiskColor::Success,
        _ => RiskColor::Neutral,
    }
}

fn format_rate(hits: usize, total: usize) -> String {
    if total == 0 {
        return "100".to_string();
    }
    format!("{:.1}", hits as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{assignment, attendance, contact, student};

    #[test]
    fn empty_histories_read_as_full_rates() {
        let record = student("S001", None, None);
        assert_eq!(attendance_rate(&record), "100");
        assert_eq!(assignment_rate(&record), "100");
        assert_eq!(contact_failure_count(&record), 0);
    }

    #[test]
    fn attendance_rate_keeps_one_decimal() {
        let mut record = student("S001", None, None);
        record.attendance = vec![
            attendance("2025-03-01", "ATTEND"),
            attendance("2025-03-02", "ATTEND"),
            attendance("2025-03-03", "ABSENT"),
            attendance("2025-03-04", "ATTEND"),
        ];
        assert_eq!(attendance_rate(&record), "75.0");

        record.attendance.push(attendance("2025-03-05", "ABSENT"));
        record.attendance.push(attendance("2025-03-06", "LATE"));
        assert_eq!(attendance_rate(&record), "50.0");

        record.attendance.truncate(3);
        assert_eq!(attendance_rate(&record), "66.7");
    }

    #[test]
    fn only_failed_contacts_count() {
        let mut record = student("S001", None, None);
        record.contacts = vec![
            contact("2025-03-01", "SUCCESS"),
            contact("2025-03-02", "FAILED"),
            contact("2025-03-03", "FAILED"),
        ];
        assert_eq!(contact_failure_count(&record), 2);
    }

    #[test]
    fn mixed_history_scenario() {
        let mut record = student("S001", None, None);
        record.assignments = vec![
            assignment("2025-03-01", "Essay", true),
            assignment("2025-03-08", "Quiz", false),
        ];
        record.contacts = vec![contact("2025-03-02", "FAILED")];

        let metrics = StudentMetrics::of(&record);
        assert_eq!(metrics.attendance_rate, "100");
        assert_eq!(metrics.assignment_rate, "50.0");
        assert_eq!(metrics.contact_failures, 1);
    }

    #[test]
    fn risk_color_is_total() {
        assert_eq!(risk_color(Some("HIGH")), RiskColor::Danger);
        assert_eq!(risk_color(Some("MEDIUM")), RiskColor::Warning);
        assert_eq!(risk_color(Some("LOW")), RiskColor::Success);
        assert_eq!(risk_color(None), RiskColor::Neutral);
        assert_eq!(risk_color(Some("")), RiskColor::Neutral);
        assert_eq!(risk_color(Some("UNKNOWN")), RiskColor::Neutral);
        assert_eq!(risk_color(Some("UNKNOWN")).hex(), "#9e9e9e");
    }
}
