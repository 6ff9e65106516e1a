use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The two report families that own evidence. The wire and key
/// representation is the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Work,
    Warehouse,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Work => "work",
            ReportType::Warehouse => "warehouse",
        }
    }

    pub fn parse(s: &str) -> Option<ReportType> {
        match s {
            "work" => Some(ReportType::Work),
            "warehouse" => Some(ReportType::Warehouse),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::parse(s).ok_or_else(|| format!("unknown report type '{}'", s))
    }
}

/// Hierarchy coordinates of an owning report, as resolved by the external
/// report stores. The folio is the human-facing report number technicians
/// search by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub subsystem: String,
    pub date: NaiveDate,
    pub folio: String,
}
