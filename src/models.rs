use clap::ValueEnum;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub const ATTEND: &str = "ATTEND";
pub const SUCCESS: &str = "SUCCESS";
pub const FAILED: &str = "FAILED";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentRecord {
    pub id: Uuid,
    pub student_id: String,
    pub student_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attendance: Vec<AttendanceEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assignments: Vec<AssignmentEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contacts: Vec<ContactEntry>,
    #[serde(default)]
    pub dropout_score: Option<i64>,
    #[serde(default)]
    pub dropout_risk_level: Option<String>,
    #[serde(default)]
    pub dropout_note: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl StudentRecord {
    /// Recognised risk level, `None` when unevaluated or unknown to this client.
    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.dropout_risk_level.as_deref().and_then(RiskLevel::parse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttendanceEntry {
    pub date: String,
    pub status: String,
}

impl AttendanceEntry {
    pub fn is_attended(&self) -> bool {
        self.status == ATTEND
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssignmentEntry {
    pub date: String,
    pub name: String,
    pub submitted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactEntry {
    pub date: String,
    pub status: String,
}

impl ContactEntry {
    pub fn is_failed(&self) -> bool {
        self.status == FAILED
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum RiskLevel {
    #[value(name = "LOW")]
    Low,
    #[value(name = "MEDIUM")]
    Medium,
    #[value(name = "HIGH")]
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

/// Ordering requested from the directory service. `Default` leaves the
/// order to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOption {
    #[default]
    #[value(name = "default")]
    Default,
    #[value(name = "risk_level")]
    RiskLevel,
    #[value(name = "risk_level_asc")]
    RiskLevelAsc,
    #[value(name = "score")]
    Score,
    #[value(name = "score_asc")]
    ScoreAsc,
}

impl SortOption {
    pub fn as_query(self) -> Option<&'static str> {
        match self {
            SortOption::Default => None,
            SortOption::RiskLevel => Some("risk_level"),
            SortOption::RiskLevelAsc => Some("risk_level_asc"),
            SortOption::Score => Some("score"),
            SortOption::ScoreAsc => Some("score_asc"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOption::Default => "Default",
            SortOption::RiskLevel => "Risk Level (High -> Low)",
            SortOption::RiskLevelAsc => "Risk Level (Low -> High)",
            SortOption::Score => "Score (High -> Low)",
            SortOption::ScoreAsc => "Score (Low -> High)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub risk_level: Option<RiskLevel>,
    pub sort_by: SortOption,
}

impl ListQuery {
    pub fn new(risk_level: Option<RiskLevel>, sort_by: SortOption) -> Self {
        Self {
            risk_level,
            sort_by,
        }
    }

    /// Wire query pairs; unset parameters are left out entirely.
    pub fn pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::new();
        if let Some(level) = self.risk_level {
            pairs.push(("risk_level", level.as_str()));
        }
        if let Some(sort) = self.sort_by.as_query() {
            pairs.push(("sort_by", sort));
        }
        pairs
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
