use uuid::Uuid;

use crate::models::{AssignmentEntry, AttendanceEntry, ContactEntry, StudentRecord};

pub fn student(student_id: &str, risk_level: Option<&str>, score: Option<i64>) -> StudentRecord {
    StudentRecord {
        id: Uuid::new_v4(),
        student_id: student_id.to_string(),
        student_name: format!("Student {student_id}"),
        attendance: Vec::new(),
        assignments: Vec::new(),
        contacts: Vec::new(),
        dropout_score: score,
        dropout_risk_level: risk_level.map(str::to_string),
        dropout_note: None,
        created_at: 1_740_787_200,
        updated_at: 1_740_873_600,
    }
}

pub fn attendance(date: &str, status: &str) -> AttendanceEntry {
    AttendanceEntry {
        date: date.to_string(),
        status: status.to_string(),
    }
}

pub fn assignment(date: &str, name: &str, submitted: bool) -> AssignmentEntry {
    AssignmentEntry {
        date: date.to_string(),
        name: name.to_string(),
        submitted,
    }
}

pub fn contact(date: &str, status: &str) -> ContactEntry {
    ContactEntry {
        date: date.to_string(),
        status: status.to_string(),
    }
}
