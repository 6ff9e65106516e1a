//! Hierarchical evidence key construction.
//!
//! Key format (all backends and the explorer depend on this layout):
//!
//! `{evidences|signatures}/{work|warehouse}/{subsystemSlug}/{yyyy}/{mm}/{dd}/{reportId}/{fileId}_{slugifiedName}`
//!
//! Key construction is pure and deterministic: the same inputs always produce
//! the same key, so a client retrying a presign request cannot mint a second
//! storage path for the same file id. Keys must not contain `..` or a leading
//! `/`; the slugifier guarantees filesystem- and URL-safe segments.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::report::ReportType;

/// Top-level key namespace. Signatures live under a distinct prefix so the
/// download path can route by prefix without a metadata lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Evidences,
    Signatures,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Evidences => "evidences",
            Namespace::Signatures => "signatures",
        }
    }

    /// Classify a raw key by its first segment.
    pub fn from_key(key: &str) -> Option<Namespace> {
        match key.split('/').next() {
            Some("evidences") => Some(Namespace::Evidences),
            Some("signatures") => Some(Namespace::Signatures),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.prefix()
    }

    pub fn parse(s: &str) -> Option<Namespace> {
        match s {
            "evidences" => Some(Namespace::Evidences),
            "signatures" => Some(Namespace::Signatures),
            _ => None,
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Build the canonical object key for one evidence file.
///
/// Fails with a validation error before any I/O if the subsystem is blank or
/// the original name slugifies to nothing.
pub fn build_key(
    namespace: Namespace,
    report_type: ReportType,
    subsystem: &str,
    date: NaiveDate,
    report_id: Uuid,
    file_id: Uuid,
    original_name: &str,
) -> Result<String, AppError> {
    let subsystem_slug = slugify(subsystem);
    if subsystem_slug.is_empty() {
        return Err(AppError::Validation(format!(
            "Subsystem '{}' produces an empty path segment",
            subsystem
        )));
    }

    let name_slug = slugify(original_name);
    if name_slug.is_empty() {
        return Err(AppError::Validation(format!(
            "Filename '{}' produces an empty path segment",
            original_name
        )));
    }

    Ok(format!(
        "{}/{}/{}/{:04}/{:02}/{:02}/{}/{}_{}",
        namespace.prefix(),
        report_type.as_str(),
        subsystem_slug,
        date.year(),
        date.month(),
        date.day(),
        report_id,
        file_id,
        name_slug
    ))
}

/// Lowercase, strip diacritics to ASCII, and collapse everything outside
/// `[a-z0-9._-]` into single hyphens. Stable across calls by construction.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_sep = true;

    for c in input.trim().to_lowercase().chars() {
        let mapped = fold_diacritic(c);
        match mapped {
            Some(c) if c.is_ascii_alphanumeric() || c == '.' || c == '_' => {
                out.push(c);
                last_was_sep = false;
            }
            _ => {
                if !last_was_sep {
                    out.push('-');
                    last_was_sep = true;
                }
            }
        }
    }

    out.trim_matches(|c| c == '-' || c == '.').to_string()
}

/// Map common Latin-1/Spanish diacritics to their ASCII base letter.
/// Characters outside ASCII that have no mapping are dropped (treated as
/// separators by the caller).
fn fold_diacritic(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        c if c.is_ascii() => c,
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_key_exact_format() {
        let report_id = Uuid::parse_str("0a6e7cbe-6ff5-4ab7-a7c1-3a2c53111111").unwrap();
        let file_id = Uuid::parse_str("5f0c2ad1-9f14-4d4e-8a65-9cde5e222222").unwrap();
        let key = build_key(
            Namespace::Evidences,
            ReportType::Work,
            "Bombas",
            date(2024, 3, 7),
            report_id,
            file_id,
            "Informe Diario.jpg",
        )
        .unwrap();
        assert_eq!(
            key,
            format!(
                "evidences/work/bombas/2024/03/07/{}/{}_informe-diario.jpg",
                report_id, file_id
            )
        );
    }

    #[test]
    fn test_build_key_is_deterministic() {
        let report_id = Uuid::new_v4();
        let file_id = Uuid::new_v4();
        let a = build_key(
            Namespace::Evidences,
            ReportType::Warehouse,
            "Báscula Nº 2",
            date(2023, 12, 1),
            report_id,
            file_id,
            "foto (1).png",
        )
        .unwrap();
        let b = build_key(
            Namespace::Evidences,
            ReportType::Warehouse,
            "Báscula Nº 2",
            date(2023, 12, 1),
            report_id,
            file_id,
            "foto (1).png",
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_slugify_strips_diacritics() {
        assert_eq!(slugify("Báscula Nº 2"), "bascula-n-2");
        assert_eq!(slugify("Compresión aceite.jpg"), "compresion-aceite.jpg");
        assert_eq!(slugify("  señal--de   prueba  "), "senal-de-prueba");
    }

    #[test]
    fn test_signatures_use_distinct_namespace() {
        let key = build_key(
            Namespace::Signatures,
            ReportType::Work,
            "bombas",
            date(2024, 1, 2),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "firma.png",
        )
        .unwrap();
        assert!(key.starts_with("signatures/work/bombas/2024/01/02/"));
        assert_eq!(Namespace::from_key(&key), Some(Namespace::Signatures));
    }

    #[test]
    fn test_blank_subsystem_rejected() {
        let err = build_key(
            Namespace::Evidences,
            ReportType::Work,
            "   ",
            date(2024, 1, 1),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "a.jpg",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unsluggable_filename_rejected() {
        let err = build_key(
            Namespace::Evidences,
            ReportType::Work,
            "bombas",
            date(2024, 1, 1),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "¡¡¡",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_month_and_day_zero_padded() {
        let key = build_key(
            Namespace::Evidences,
            ReportType::Work,
            "molinos",
            date(2024, 9, 5),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "x.jpg",
        )
        .unwrap();
        assert!(key.contains("/2024/09/05/"));
    }

    #[test]
    fn test_namespace_from_key_rejects_foreign_prefix() {
        assert_eq!(Namespace::from_key("media/foo.jpg"), None);
        assert_eq!(Namespace::from_key(""), None);
    }
}
