use std::io;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat};
use serde::Serialize;

use crate::metrics::StudentMetrics;
use crate::models::StudentRecord;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    student_id: &'a str,
    student_name: &'a str,
    risk_level: &'a str,
    score: Option<i64>,
    attendance_rate: String,
    assignment_rate: String,
    contact_failures: usize,
    note: &'a str,
    updated_at: String,
}

impl<'a> ExportRow<'a> {
    fn from_record(student: &'a StudentRecord) -> Self {
        let metrics = StudentMetrics::of(student);
        Self {
            student_id: &student.student_id,
            student_name: &student.student_name,
            risk_level: student.dropout_risk_level.as_deref().unwrap_or(""),
            score: student.dropout_score,
            attendance_rate: metrics.attendance_rate,
            assignment_rate: metrics.assignment_rate,
            contact_failures: metrics.contact_failures,
            note: student.dropout_note.as_deref().unwrap_or(""),
            updated_at: epoch_to_rfc3339(student.updated_at),
        }
    }
}

/// Renders epoch seconds as RFC 3339; empty for out-of-range values.
pub fn epoch_to_rfc3339(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

pub fn write_csv<W: io::Write>(writer: W, students: &[StudentRecord]) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    for student in students {
        writer.serialize(ExportRow::from_record(student))?;
    }
    writer.flush()?;
    Ok(students.len())
}

pub fn export_csv(path: &Path, students: &[StudentRecord]) -> anyhow::Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(file, students)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{assignment, attendance, student};

    #[test]
    fn writes_header_and_metric_columns() {
        let mut avery = student("S001", Some("HIGH"), Some(3));
        avery.student_name = "Avery Lee".to_string();
        avery.dropout_note = Some("attendance, assignment risk factors".to_string());
        avery.attendance = vec![
            attendance("2025-03-01", "ATTEND"),
            attendance("2025-03-02", "ABSENT"),
        ];
        avery.assignments = vec![assignment("2025-03-01", "Essay", true)];

        let mut buffer = Vec::new();
        let written = write_csv(&mut buffer, &[avery, student("S002", None, None)])
            .expect("write csv");
        assert_eq!(written, 2);

        let text = String::from_utf8(buffer).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("student_id,student_name,risk_level,score,attendance_rate,assignment_rate,contact_failures,note,updated_at")
        );
        assert_eq!(
            lines.next(),
            Some("S001,Avery Lee,HIGH,3,50.0,100.0,0,\"attendance, assignment risk factors\",2025-03-02T00:00:00Z")
        );
        assert_eq!(
            lines.next(),
            Some("S002,Student S002,,,100,100,0,,2025-03-02T00:00:00Z")
        );
    }

    #[test]
    fn out_of_range_timestamps_export_empty() {
        assert_eq!(epoch_to_rfc3339(0), "1970-01-01T00:00:00Z");
        assert_eq!(epoch_to_rfc3339(i64::MAX), "");
    }
}
