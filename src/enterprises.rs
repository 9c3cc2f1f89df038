//! Directorio de empresas instaladas en las zonas económicas (`node--listed_enterprise`).

use crate::client::CmsClient;
use crate::error::ContentResult;
use crate::filters::Listing;
use crate::models::{EnterpriseFilters, Language, Resource};
use crate::query::{enterprise_params, page_or_default, page_size_or, DEFAULT_PAGE_SIZE, ENTERPRISE_BUNDLE};
use crate::relations::taxonomy_term_name;
use crate::strategy::FallbackChain;

pub const INDUSTRY_FIELD: &str = "field_nganh_nghe";

fn eq_ci(a: Option<&str>, b: &str) -> bool {
    a.is_some_and(|a| a.trim().eq_ignore_ascii_case(b.trim()))
}

fn matches_filters(enterprise: &Resource, included: &[Resource], filters: &EnterpriseFilters) -> bool {
    let wanted = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(keyword) = wanted(&filters.keyword) {
        let title = enterprise.attr_str("title").unwrap_or_default().to_lowercase();
        if !title.contains(&keyword.to_lowercase()) {
            return false;
        }
    }
    if let Some(industry) = wanted(&filters.industry) {
        let name = taxonomy_term_name(enterprise, INDUSTRY_FIELD, included);
        if !eq_ci(Some(name.as_str()), &industry) {
            return false;
        }
    }
    if let Some(zone) = wanted(&filters.zone) {
        if !eq_ci(enterprise.attr_str("field_khu_kinh_te"), &zone) {
            return false;
        }
    }
    if let Some(country) = wanted(&filters.country) {
        if !eq_ci(enterprise.attr_str("field_quoc_gia"), &country) {
            return false;
        }
    }
    true
}

pub async fn search_enterprises(
    client: &CmsClient,
    lang: Language,
    filters: &EnterpriseFilters,
) -> ContentResult<Listing> {
    let page = page_or_default(filters.page);
    let page_size = page_size_or(filters.page_size, DEFAULT_PAGE_SIZE);

    let primary = enterprise_params(filters);
    let broad = enterprise_params(&EnterpriseFilters {
        page: filters.page,
        page_size: filters.page_size,
        ..Default::default()
    });

    FallbackChain::new("No se pudo cargar el directorio de empresas")
        .tier("filtros en servidor", async {
            let result = client.get_jsonapi(lang, ENTERPRISE_BUNDLE, None, &primary).await?;
            Ok(Listing::new(result, page, page_size, false))
        })
        .tier("filtros en cliente", async {
            let result = client.get_jsonapi(lang, ENTERPRISE_BUNDLE, None, &broad).await?;
            let before = result.resources().len();
            let kept: Vec<Resource> = result
                .resources()
                .iter()
                .filter(|e| matches_filters(e, &result.included, filters))
                .cloned()
                .collect();
            let narrowed = kept.len() < before;
            Ok(Listing::new(result.with_resources(kept), page, page_size, narrowed))
        })
        .run()
        .await
}
