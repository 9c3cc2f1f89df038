//! Filtrado en cliente y cálculo de paginación.
//!
//! Reglas que el CMS no resuelve bien en servidor: categoría de documento por
//! ID interno de taxonomía, separación Q&A / FAQ por estado y acotación por
//! fecha de fin en la agenda. Las reglas viven en tablas, no en comparaciones
//! sueltas dentro de los fetchers.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::models::{CompositeResult, QuestionKind, Resource};

pub const DOCUMENT_CATEGORY_FIELD: &str = "field_cac_loai_van_ban";
pub const QUESTION_STATUS_FIELD: &str = "field_trang_thai";
pub const SCHEDULE_DATE_FIELD: &str = "field_ngay";

/// Slug (actual, heredado o en inglés) → ID interno del término de taxonomía.
const DOCUMENT_CATEGORY_SLUGS: &[(&str, &str)] = &[
    ("cai-cach-hanh-chinh", "16"),
    ("cchc", "16"),
    ("administrative-reform", "16"),
    ("quy-hoach", "17"),
    ("quy-hoach-xay-dung", "17"),
    ("planning", "17"),
    ("dau-tu", "18"),
    ("xuc-tien-dau-tu", "18"),
    ("investment", "18"),
    ("moi-truong", "19"),
    ("environment", "19"),
    ("lao-dong", "20"),
    ("labour", "20"),
    ("labor", "20"),
    ("van-ban-chi-dao-dieu-hanh", "21"),
    ("directives", "21"),
];

pub fn category_id_for_slug(slug: &str) -> Option<&'static str> {
    let slug = slug.trim().to_lowercase();
    DOCUMENT_CATEGORY_SLUGS
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, id)| *id)
}

/// Conserva los documentos de la categoría `slug`. Un slug desconocido no filtra.
pub fn filter_by_category(documents: Vec<Resource>, slug: &str) -> Vec<Resource> {
    let Some(target) = category_id_for_slug(slug) else {
        warn!("Categoría desconocida '{slug}': se ignora el filtro");
        return documents;
    };
    documents
        .into_iter()
        .filter(|doc| {
            doc.relationship(DOCUMENT_CATEGORY_FIELD)
                .map(|rel| rel.refs().iter().any(|r| r.target_id().as_deref() == Some(target)))
                .unwrap_or(false)
        })
        .collect()
}

// --- Preguntas: Q&A frente a FAQ ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Answered,
    PendingReview,
    Published,
    Unknown,
}

const QUESTION_STATUSES: &[(&str, QuestionStatus)] = &[
    ("da_tra_loi", QuestionStatus::Answered),
    ("cho_duyet", QuestionStatus::PendingReview),
    ("da_cong_khai", QuestionStatus::Published),
];

impl QuestionStatus {
    pub fn from_value(value: Option<&str>) -> Self {
        value
            .and_then(|v| QUESTION_STATUSES.iter().find(|(raw, _)| *raw == v))
            .map(|(_, status)| *status)
            .unwrap_or(QuestionStatus::Unknown)
    }

    /// Las preguntas publicadas forman el listado de preguntas frecuentes.
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionStatus::Published => QuestionKind::Faq,
            _ => QuestionKind::Qa,
        }
    }
}

pub fn question_kind(question: &Resource) -> QuestionKind {
    QuestionStatus::from_value(question.attr_str(QUESTION_STATUS_FIELD)).kind()
}

pub fn partition_questions(questions: Vec<Resource>, kind: QuestionKind) -> Vec<Resource> {
    questions
        .into_iter()
        .filter(|q| question_kind(q) == kind)
        .collect()
}

// --- Agenda ---

/// Admite `YYYY-MM-DD` y fechas RFC 3339 (`2025-03-01T08:00:00+07:00`).
pub fn parse_cms_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Descarta las entradas posteriores a `end`. Las fechas ilegibles se conservan.
pub fn narrow_until(items: Vec<Resource>, end: NaiveDate) -> Vec<Resource> {
    items
        .into_iter()
        .filter(|item| {
            match item.attr_str(SCHEDULE_DATE_FIELD).and_then(parse_cms_date) {
                Some(date) => date <= end,
                None => true,
            }
        })
        .collect()
}

// --- Paginación ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_results: u64,
    pub start_result: u64,
    pub end_result: u64,
    pub total_pages: u64,
    /// Un filtro en cliente descartó elementos: `total_results` es una cota inferior.
    pub narrowed: bool,
}

impl Pagination {
    pub fn compute(page: u32, page_size: u32, total_results: u64) -> Self {
        let page = page.max(1);
        let size = u64::from(page_size.max(1));
        let (start_result, end_result) = if total_results == 0 {
            (0, 0)
        } else {
            let start = (u64::from(page) - 1) * size + 1;
            (start.min(total_results), (u64::from(page) * size).min(total_results))
        };
        Self {
            page,
            page_size: page_size.max(1),
            total_results,
            start_result,
            end_result,
            total_pages: total_results.div_ceil(size),
            narrowed: false,
        }
    }

    /// Tras filtrar en cliente sólo se sabe lo que queda en la página pedida:
    /// se conserva `page` y los contadores cubren hasta el último elemento mostrado.
    pub fn narrowed(page: u32, page_size: u32, shown: u64) -> Self {
        let page = page.max(1);
        let size = u64::from(page_size.max(1));
        let offset = (u64::from(page) - 1) * size;
        let (start_result, end_result) = if shown == 0 {
            (0, 0)
        } else {
            (offset + 1, offset + shown)
        };
        let total_results = offset + shown;
        Self {
            page,
            page_size: page_size.max(1),
            total_results,
            start_result,
            end_result,
            total_pages: total_results.div_ceil(size),
            narrowed: true,
        }
    }
}

/// Página de resultados lista para la vista: el documento JSON:API más sus contadores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    #[serde(flatten)]
    pub result: CompositeResult,
    pub pagination: Pagination,
}

impl Listing {
    /// `narrowed` indica que un filtro en cliente descartó elementos de la página,
    /// con lo que `meta.count` del servidor deja de ser fiable.
    pub fn new(result: CompositeResult, page: u32, page_size: u32, narrowed: bool) -> Self {
        let shown = result.resources().len() as u64;
        let pagination = if narrowed {
            Pagination::narrowed(page, page_size, shown)
        } else {
            let offset = u64::from(page.max(1) - 1) * u64::from(page_size.max(1));
            let total = result.total_count().unwrap_or(offset + shown);
            Pagination::compute(page, page_size, total)
        };
        Self { result, pagination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, target: Option<&str>) -> Resource {
        let rel = match target {
            Some(t) => json!({ "data": { "type": "taxonomy_term--loai_van_ban", "id": format!("t{t}"),
                                         "meta": { "drupal_internal__target_id": t } } }),
            None => json!({ "data": null }),
        };
        serde_json::from_value(json!({
            "id": id, "type": "node--legal_document",
            "relationships": { "field_cac_loai_van_ban": rel }
        }))
        .unwrap()
    }

    fn question(id: &str, status: Option<&str>) -> Resource {
        serde_json::from_value(json!({
            "id": id, "type": "node--question", "attributes": { "field_trang_thai": status }
        }))
        .unwrap()
    }

    #[test]
    fn category_filter_keeps_matching_document() {
        let docs = vec![doc("a", Some("17")), doc("b", Some("16")), doc("c", None)];
        let kept = filter_by_category(docs, "cai-cach-hanh-chinh");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "b");
    }

    #[test]
    fn legacy_and_english_slugs_map_to_same_term() {
        assert_eq!(category_id_for_slug("cchc"), Some("16"));
        assert_eq!(category_id_for_slug("Administrative-Reform"), Some("16"));
    }

    #[test]
    fn unknown_slug_returns_input_unchanged() {
        let docs = vec![doc("a", Some("17")), doc("b", Some("16"))];
        let kept = filter_by_category(docs.clone(), "khong-ton-tai");
        assert_eq!(kept, docs);
    }

    #[test]
    fn qa_excludes_only_published_status() {
        let items = vec![
            question("1", Some("da_tra_loi")),
            question("2", Some("cho_duyet")),
            question("3", None),
            question("4", Some("da_cong_khai")),
        ];
        let qa: Vec<String> = partition_questions(items.clone(), QuestionKind::Qa)
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(qa, vec!["1", "2", "3"]);

        let faq = partition_questions(items, QuestionKind::Faq);
        assert_eq!(faq.len(), 1);
        assert_eq!(faq[0].id, "4");
    }

    #[test]
    fn schedule_narrowing_by_end_date() {
        let item = |id: &str, date: &str| -> Resource {
            serde_json::from_value(json!({ "id": id, "type": "node--schedule_item",
                                           "attributes": { "field_ngay": date } }))
            .unwrap()
        };
        let items = vec![
            item("1", "2025-03-01"),
            item("2", "2025-03-07T08:00:00+07:00"),
            item("3", "2025-03-08"),
            item("4", "không rõ"),
        ];
        let end = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let ids: Vec<String> = narrow_until(items, end).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
    }

    #[test]
    fn pagination_arithmetic() {
        let p = Pagination::compute(2, 10, 25);
        assert_eq!((p.start_result, p.end_result, p.total_pages), (11, 20, 3));

        let last = Pagination::compute(3, 10, 25);
        assert_eq!((last.start_result, last.end_result), (21, 25));

        let empty = Pagination::compute(1, 10, 0);
        assert_eq!((empty.start_result, empty.end_result, empty.total_pages), (0, 0, 0));
    }

    #[test]
    fn listing_uses_server_count_unless_narrowed() {
        let result = CompositeResult {
            meta: Some(json!({ "count": 25 })),
            ..CompositeResult::many(vec![doc("a", None), doc("b", None)], Vec::new())
        };
        let listing = Listing::new(result.clone(), 2, 10, false);
        assert_eq!(listing.pagination.total_results, 25);
        assert_eq!(listing.pagination.start_result, 11);

        let narrowed = Listing::new(result, 2, 10, true);
        assert_eq!(narrowed.pagination.page, 2);
        assert_eq!(narrowed.pagination.start_result, 11);
        assert_eq!(narrowed.pagination.end_result, 12);
        assert_eq!(narrowed.pagination.total_results, 12);
        assert!(narrowed.pagination.narrowed);
        assert!(!listing.pagination.narrowed);
    }
}
