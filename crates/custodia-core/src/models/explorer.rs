use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::report::ReportType;

/// Hierarchy coordinates supplied by the caller. Each listing call
/// materializes exactly one level deeper than the most specific coordinate
/// given, which is what keeps listings bounded.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExplorerScope {
    pub subsystem_slug: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub report_type: Option<ReportType>,
    pub report_id: Option<Uuid>,
}

/// The level the next listing call will materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerDepth {
    /// Nothing given: list subsystems.
    Subsystems,
    /// Subsystem given: list years.
    Years,
    /// + year: list months.
    Months,
    /// + month: list days.
    Days,
    /// + day: list report-type folders.
    ReportTypes,
    /// + report type: list report folders.
    Reports,
    /// + report id: list leaf files.
    Files,
}

impl ExplorerScope {
    /// Resolve the listing depth from which coordinates are present.
    ///
    /// A coordinate without its full prefix chain (e.g. a month without a
    /// year, or a day without a month) is a validation error: the hierarchy
    /// has no meaningful listing for it.
    pub fn depth(&self) -> Result<ExplorerDepth, AppError> {
        let chain = [
            self.subsystem_slug.is_some(),
            self.year.is_some(),
            self.month.is_some(),
            self.day.is_some(),
            self.report_type.is_some(),
            self.report_id.is_some(),
        ];

        let given = chain.iter().filter(|p| **p).count();
        let prefix_len = chain.iter().take_while(|p| **p).count();
        if given != prefix_len {
            return Err(AppError::Validation(
                "Explorer scope parameters must form a prefix of \
                 subsystemSlug/year/month/day/reportType/reportId"
                    .to_string(),
            ));
        }

        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(AppError::Validation(format!("Invalid month: {}", month)));
            }
        }
        if let Some(day) = self.day {
            if !(1..=31).contains(&day) {
                return Err(AppError::Validation(format!("Invalid day: {}", day)));
            }
        }

        Ok(match prefix_len {
            0 => ExplorerDepth::Subsystems,
            1 => ExplorerDepth::Years,
            2 => ExplorerDepth::Months,
            3 => ExplorerDepth::Days,
            4 => ExplorerDepth::ReportTypes,
            5 => ExplorerDepth::Reports,
            _ => ExplorerDepth::Files,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExplorerNodeKind {
    Folder,
    File,
}

/// One computed node of the evidence hierarchy. Folders carry an aggregate
/// count of confirmed evidence beneath them; files carry the ledger fields a
/// browser needs to render and download the leaf. Nodes are computed on
/// read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerNode {
    pub kind: ExplorerNodeKind,
    /// Display label: subsystem slug, "2024", "03", report folio, or filename.
    pub label: String,
    /// Confirmed-evidence count under a folder node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    /// File id for leaf nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Uuid>,
    /// Full object key for leaf nodes (breadcrumb reconstruction).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_folio: Option<String>,
}

impl ExplorerNode {
    pub fn folder(label: impl Into<String>, count: i64) -> Self {
        ExplorerNode {
            kind: ExplorerNodeKind::Folder,
            label: label.into(),
            count: Some(count),
            file_id: None,
            key: None,
            original_name: None,
            mime_type: None,
            size_bytes: None,
            report_id: None,
            report_folio: None,
        }
    }

    pub fn file(record: &crate::models::evidence::EvidenceRecord) -> Self {
        ExplorerNode {
            kind: ExplorerNodeKind::File,
            label: record.original_name.clone(),
            count: None,
            file_id: Some(record.id),
            key: Some(record.key.clone()),
            original_name: Some(record.original_name.clone()),
            mime_type: Some(record.mime_type.clone()),
            size_bytes: Some(record.size_bytes),
            report_id: Some(record.report_id),
            report_folio: Some(record.report_folio.clone()),
        }
    }
}
