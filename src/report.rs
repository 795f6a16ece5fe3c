use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::metrics::{contact_failure_count, risk_color, StudentMetrics};
use crate::models::{ListQuery, RiskLevel, StudentRecord};
use crate::render::filter_label;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskLevelSummary {
    pub label: String,
    pub count: usize,
    pub avg_score: Option<f64>,
}

pub fn summarize_by_level(students: &[StudentRecord]) -> Vec<RiskLevelSummary> {
    let mut map: HashMap<String, (usize, i64, usize)> = HashMap::new();

    for student in students {
        let label = match student.dropout_risk_level.as_deref() {
            Some(level) if !level.is_empty() => level.to_string(),
            _ => "Unknown".to_string(),
        };
        let entry = map.entry(label).or_insert((0, 0, 0));
        entry.0 += 1;
        if let Some(score) = student.dropout_score {
            entry.1 += score;
            entry.2 += 1;
        }
    }

    let mut summaries: Vec<RiskLevelSummary> = map
        .into_iter()
        .map(|(label, (count, total_score, scored))| RiskLevelSummary {
            label,
            count,
            avg_score: (scored > 0).then(|| total_score as f64 / scored as f64),
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    summaries
}

pub fn build_report(
    query: ListQuery,
    students: &[StudentRecord],
    generated_at: DateTime<Utc>,
) -> String {
    let summaries = summarize_by_level(students);
    let mut output = String::new();

    let _ = writeln!(output, "# Student Dropout Risk Report");
    let _ = writeln!(
        output,
        "Generated {} for {} (sorted by {})",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        filter_label(query.risk_level),
        query.sort_by.label()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No students matched this view.");
    } else {
        for summary in &summaries {
            let badge = format!(
                "<span style=\"color:{}\">{}</span>",
                risk_color(Some(summary.label.as_str())).hex(),
                summary.label
            );
            match summary.avg_score {
                Some(avg) => {
                    let _ = writeln!(
                        output,
                        "- {}: {} students (avg score {:.1})",
                        badge, summary.count, avg
                    );
                }
                None => {
                    let _ = writeln!(output, "- {}: {} students", badge, summary.count);
                }
            }
        }
    }

    // ties keep the service order
    let mut scored: Vec<&StudentRecord> = students
        .iter()
        .filter(|student| student.dropout_score.is_some())
        .collect();
    scored.sort_by(|a, b| b.dropout_score.cmp(&a.dropout_score));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");
    if scored.is_empty() {
        let _ = writeln!(output, "No evaluated students in this view.");
    } else {
        for student in scored.iter().take(10) {
            let metrics = StudentMetrics::of(student);
            let _ = writeln!(
                output,
                "- {} ({}) score {} | attendance {}% | assignments {}% | contact failures {}",
                student.student_name,
                student.student_id,
                student.dropout_score.unwrap_or_default(),
                metrics.attendance_rate,
                metrics.assignment_rate,
                metrics.contact_failures
            );
        }
    }

    let mut unreachable: Vec<(&StudentRecord, usize)> = students
        .iter()
        .map(|student| (student, contact_failure_count(student)))
        .filter(|(_, failures)| *failures > 0)
        .collect();
    unreachable.sort_by(|a, b| b.1.cmp(&a.1));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Failed Contact Attempts");
    if unreachable.is_empty() {
        let _ = writeln!(output, "No failed contact attempts recorded.");
    } else {
        for (student, failures) in unreachable {
            let _ = writeln!(
                output,
                "- {} ({}): {} failed of {} attempts",
                student.student_name,
                student.student_id,
                failures,
                student.contacts.len()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## High Risk Notes");
    let high: Vec<&StudentRecord> = students
        .iter()
        .filter(|student| student.risk_level() == Some(RiskLevel::High))
        .collect();
    if high.is_empty() {
        let _ = writeln!(output, "No high risk students in this view.");
    } else {
        for student in high {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                student.student_name,
                student.student_id,
                student.dropout_note.as_deref().unwrap_or("No notes")
            );
        }
    }

    output
}
