//! Construcción de consultas: documentos GraphQL para menús y cadenas de
//! consulta JSON:API (filter / sort / include / page) para el resto.
//!
//! Todas las funciones son puras: los mismos filtros producen exactamente la
//! misma cadena, que además sirve como parte de la clave de la caché.

use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{ArticleFilters, DocumentFilters, EnterpriseFilters, QuestionFilters, ScheduleFilters};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DOCUMENT_PAGE_SIZE: u32 = 5;
/// Límite máximo de página que acepta Drupal JSON:API.
pub const MAX_PAGE_LIMIT: u32 = 50;

pub const ARTICLE_BUNDLE: &str = "node/bai-viet";
pub const DOCUMENT_BUNDLE: &str = "node/legal_document";
pub const ENTERPRISE_BUNDLE: &str = "node/listed_enterprise";
pub const SCHEDULE_BUNDLE: &str = "node/schedule_item";
pub const QUESTION_BUNDLE: &str = "node/question";

pub const ARTICLE_INCLUDE: &str = "field_anh_dai_dien,field_chuyen_muc,field_noi_dung";
pub const DOCUMENT_INCLUDE: &str = "field_cac_loai_van_ban,field_tep_dinh_kem";
pub const ENTERPRISE_INCLUDE: &str = "field_logo,field_nganh_nghe";
pub const QUESTION_INCLUDE: &str = "field_linh_vuc";

// ---------------------------------------------------------------------
// GRAPHQL
// ---------------------------------------------------------------------

/// Menús publicados en el CMS. Se serializan como el enum `MenuAvailable` de GraphQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MenuName {
    #[serde(rename = "MAIN")]
    Main,
    #[serde(rename = "FOOTER")]
    Footer,
}

const MENU_FIELDS: &str = "
      langcode
      links {
        link { label url { path } expanded }
        subtree {
          link { label url { path } expanded }
          subtree {
            link { label url { path } expanded }
            subtree {
              link { label url { path } expanded }
            }
          }
        }
      }";

/// Consulta parametrizada: el nombre del menú viaja como variable.
pub fn menu_query() -> String {
    format!(
        "query GetMainMenu($name: MenuAvailable!) {{\n  menuByName(name: $name) {{{MENU_FIELDS}\n  }}\n}}"
    )
}

/// Consulta estática de respaldo, con el token `MAIN` fijo en el texto.
pub fn menu_fallback_query() -> String {
    format!("query GetMainMenuFallback {{\n  menuByName(name: MAIN) {{{MENU_FIELDS}\n  }}\n}}")
}

/// Cuerpo `{query, variables}` listo para enviar al endpoint GraphQL.
pub fn graphql_body(query: String, variables: Option<Value>) -> Value {
    match variables {
        Some(vars) => json!({ "query": query, "variables": vars }),
        None => json!({ "query": query }),
    }
}

pub fn menu_variables(name: MenuName) -> Value {
    json!({ "name": name })
}

// ---------------------------------------------------------------------
// JSON:API
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Contains,
    Gte,
    Lte,
    Eq,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Contains => "CONTAINS",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
            FilterOp::Eq => "=",
        }
    }
}

/// Constructor de parámetros JSON:API. Conserva el orden de inserción.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonApiQuery {
    params: Vec<(String, String)>,
}

impl JsonApiQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `filter[field]=value`
    pub fn exact(mut self, field: &str, value: impl Into<String>) -> Self {
        self.params.push((format!("filter[{field}]"), value.into()));
        self
    }

    /// `filter[field][operator]=OP&filter[field][value]=value`
    pub fn condition(mut self, field: &str, op: FilterOp, value: impl Into<String>) -> Self {
        self.params.push((format!("filter[{field}][operator]"), op.as_str().to_string()));
        self.params.push((format!("filter[{field}][value]"), value.into()));
        self
    }

    /// Grupo con nombre: permite dos condiciones sobre el mismo campo.
    pub fn named_condition(mut self, key: &str, path: &str, op: FilterOp, value: impl Into<String>) -> Self {
        self.params.push((format!("filter[{key}][condition][path]"), path.to_string()));
        self.params.push((format!("filter[{key}][condition][operator]"), op.as_str().to_string()));
        self.params.push((format!("filter[{key}][condition][value]"), value.into()));
        self
    }

    pub fn sort(mut self, sort: &str) -> Self {
        self.params.push(("sort".to_string(), sort.to_string()));
        self
    }

    pub fn include(mut self, include: &str) -> Self {
        if !include.is_empty() {
            self.params.push(("include".to_string(), include.to_string()));
        }
        self
    }

    /// Paginación por desplazamiento: `offset = (page - 1) * page_size`.
    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        let size = page_size.clamp(1, MAX_PAGE_LIMIT);
        // En u64: `page` llega sin acotar desde la URL del gateway.
        let offset = u64::from(page.max(1) - 1) * u64::from(size);
        self.params.push(("page[limit]".to_string(), size.to_string()));
        self.params.push(("page[offset]".to_string(), offset.to_string()));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.params
            .push(("page[limit]".to_string(), limit.clamp(1, MAX_PAGE_LIMIT).to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Cadena de consulta sin `?` inicial. Los valores se codifican; las claves
    /// conservan los corchetes tal cual.
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn page_or_default(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

pub fn page_size_or(page_size: Option<u32>, default: u32) -> u32 {
    page_size.unwrap_or(default).clamp(1, MAX_PAGE_LIMIT)
}

pub fn article_params(filters: &ArticleFilters) -> JsonApiQuery {
    let mut q = JsonApiQuery::new().exact("status", "1");
    if let Some(keyword) = non_empty(&filters.keyword) {
        q = q.condition("title", FilterOp::Contains, keyword);
    }
    if let Some(category) = non_empty(&filters.category_id) {
        q = q.exact("field_chuyen_muc.meta.drupal_internal__target_id", category);
    }
    q.sort("-created")
        .include(ARTICLE_INCLUDE)
        .page(
            page_or_default(filters.page),
            page_size_or(filters.page_size, DEFAULT_PAGE_SIZE),
        )
}

pub fn document_params(filters: &DocumentFilters) -> JsonApiQuery {
    let mut q = JsonApiQuery::new().exact("status", "1");
    if let Some(keyword) = non_empty(&filters.keyword) {
        q = q.condition("title", FilterOp::Contains, keyword);
    }
    if let Some(number) = non_empty(&filters.document_number) {
        q = q.condition("field_so_ky_hieu", FilterOp::Contains, number);
    }
    if let Some(agency) = non_empty(&filters.issuing_agency) {
        q = q.exact("field_co_quan_ban_hanh", agency);
    }
    if let Some(from) = filters.date_from {
        q = q.named_condition("date_from", "field_ngay_ban_hanh", FilterOp::Gte, from.to_string());
    }
    if let Some(to) = filters.date_to {
        q = q.named_condition("date_to", "field_ngay_ban_hanh", FilterOp::Lte, to.to_string());
    }
    q.sort("-field_ngay_ban_hanh")
        .include(DOCUMENT_INCLUDE)
        .page(
            page_or_default(filters.page),
            page_size_or(filters.page_size, DOCUMENT_PAGE_SIZE),
        )
}

pub fn enterprise_params(filters: &EnterpriseFilters) -> JsonApiQuery {
    let mut q = JsonApiQuery::new().exact("status", "1");
    if let Some(keyword) = non_empty(&filters.keyword) {
        q = q.condition("title", FilterOp::Contains, keyword);
    }
    if let Some(industry) = non_empty(&filters.industry) {
        q = q.exact("field_nganh_nghe.name", industry);
    }
    if let Some(zone) = non_empty(&filters.zone) {
        q = q.exact("field_khu_kinh_te", zone);
    }
    if let Some(country) = non_empty(&filters.country) {
        q = q.exact("field_quoc_gia", country);
    }
    q.sort("title")
        .include(ENTERPRISE_INCLUDE)
        .page(
            page_or_default(filters.page),
            page_size_or(filters.page_size, DEFAULT_PAGE_SIZE),
        )
}

/// El servidor sólo filtra por la fecha de inicio; el fin se acota en cliente.
pub fn schedule_params(filters: &ScheduleFilters) -> JsonApiQuery {
    let mut q = JsonApiQuery::new();
    if let Some(start) = filters.start_date {
        q = q.condition("field_ngay", FilterOp::Gte, start.to_string());
    }
    q.sort("field_ngay").limit(MAX_PAGE_LIMIT)
}

pub fn question_params(filters: &QuestionFilters) -> JsonApiQuery {
    let mut q = JsonApiQuery::new().exact("status", "1");
    if let Some(keyword) = non_empty(&filters.keyword) {
        q = q.condition("title", FilterOp::Contains, keyword);
    }
    if let Some(topic) = non_empty(&filters.topic) {
        q = q.exact("field_linh_vuc.meta.drupal_internal__target_id", topic);
    }
    q.sort("-created")
        .include(QUESTION_INCLUDE)
        .page(
            page_or_default(filters.page),
            page_size_or(filters.page_size, DEFAULT_PAGE_SIZE),
        )
}
