//! Búsqueda de documentos legales (`node--legal_document`).

use chrono::NaiveDate;

use crate::client::CmsClient;
use crate::error::ContentResult;
use crate::filters::{category_id_for_slug, filter_by_category, parse_cms_date, Listing};
use crate::models::{CompositeResult, DocumentFilters, Language, Resource};
use crate::query::{document_params, page_or_default, page_size_or, DOCUMENT_BUNDLE, DOCUMENT_PAGE_SIZE};
use crate::strategy::FallbackChain;

pub const ISSUE_DATE_FIELD: &str = "field_ngay_ban_hanh";

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn within(date: Option<NaiveDate>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    match date {
        Some(d) => from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t),
        None => from.is_none() && to.is_none(),
    }
}

/// Equivalente en cliente de los filtros que `document_params` envía al servidor.
pub fn matches_filters(doc: &Resource, filters: &DocumentFilters) -> bool {
    let text = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(keyword) = text(&filters.keyword) {
        if !contains_ci(doc.attr_str("title"), &keyword) {
            return false;
        }
    }
    if let Some(number) = text(&filters.document_number) {
        if !contains_ci(doc.attr_str("field_so_ky_hieu"), &number) {
            return false;
        }
    }
    if let Some(agency) = text(&filters.issuing_agency) {
        if doc.attr_str("field_co_quan_ban_hanh") != Some(agency.as_str()) {
            return false;
        }
    }
    let issued = doc.attr_str(ISSUE_DATE_FIELD).and_then(parse_cms_date);
    within(issued, filters.date_from, filters.date_to)
}

fn apply_category(result: CompositeResult, category: Option<&str>) -> (CompositeResult, bool) {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(slug) if category_id_for_slug(slug).is_some() => {
            let before = result.resources().len();
            let kept = filter_by_category(result.resources().to_vec(), slug);
            let narrowed = kept.len() < before;
            (result.with_resources(kept), narrowed)
        }
        // Slug desconocido: filter_by_category lo registra y no filtra.
        Some(slug) => {
            let kept = filter_by_category(result.resources().to_vec(), slug);
            (result.with_resources(kept), false)
        }
        None => (result, false),
    }
}

/// Búsqueda paginada. Si la consulta filtrada falla se repite sólo con la
/// paginación y los filtros se aplican en cliente. La categoría siempre se
/// filtra en cliente.
pub async fn search_documents(client: &CmsClient, lang: Language, filters: &DocumentFilters) -> ContentResult<Listing> {
    let page = page_or_default(filters.page);
    let page_size = page_size_or(filters.page_size, DOCUMENT_PAGE_SIZE);

    let primary = document_params(filters);
    let broad = document_params(&DocumentFilters {
        page: filters.page,
        page_size: filters.page_size,
        ..Default::default()
    });

    let (result, narrowed_by_server_fallback) = FallbackChain::new("No se pudieron buscar los documentos")
        .tier("filtros en servidor", async {
            let result = client.get_jsonapi(lang, DOCUMENT_BUNDLE, None, &primary).await?;
            Ok((result, false))
        })
        .tier("filtros en cliente", async {
            let result = client.get_jsonapi(lang, DOCUMENT_BUNDLE, None, &broad).await?;
            let before = result.resources().len();
            let kept: Vec<Resource> = result
                .resources()
                .iter()
                .filter(|doc| matches_filters(doc, filters))
                .cloned()
                .collect();
            let narrowed = kept.len() < before;
            Ok((result.with_resources(kept), narrowed))
        })
        .run()
        .await?;

    let (result, narrowed_by_category) = apply_category(result, filters.category.as_deref());
    Ok(Listing::new(
        result,
        page,
        page_size,
        narrowed_by_server_fallback || narrowed_by_category,
    ))
}
