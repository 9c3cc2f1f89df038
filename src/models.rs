//! Modelos de dominio: forma en tránsito de los datos del CMS (menús,
//! recursos JSON:API, contadores de visitas) y los filtros de búsqueda.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Idioma de la interfaz. Determina el prefijo `/vi` o `/en` de las URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vi,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Vi, Language::En];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Vi => "vi",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// --- Menús (GraphQL) ---

/// Árbol de menú tal como lo devuelve `menuByName`.
/// `links` vacío es un estado válido ("sin menú"), nunca null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub langcode: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub link: MenuLink,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtree: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuLink {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: MenuUrl,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expanded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuUrl {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
}

impl MenuTree {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Profundidad máxima del árbol (0 si no hay enlaces).
    pub fn depth(&self) -> usize {
        fn item_depth(item: &MenuItem) -> usize {
            1 + item.subtree.iter().map(item_depth).max().unwrap_or(0)
        }
        self.links.iter().map(item_depth).max().unwrap_or(0)
    }
}

/// Menú principal en ambos idiomas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainMenuData {
    pub vi: MenuTree,
    pub en: MenuTree,
}

impl MainMenuData {
    pub fn empty() -> Self {
        Self::default()
    }
}

// --- Recursos JSON:API ---

/// Referencia `{type, id}` dentro de una relación.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl RelRef {
    /// `meta.drupal_internal__target_id` normalizado a texto (llega como número o cadena).
    pub fn target_id(&self) -> Option<String> {
        match self.meta.as_ref()?.get("drupal_internal__target_id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelData {
    Many(Vec<RelRef>),
    One(RelRef),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<RelData>,
}

impl Relationship {
    pub fn refs(&self) -> Vec<&RelRef> {
        match &self.data {
            Some(RelData::One(r)) => vec![r],
            Some(RelData::Many(list)) => list.iter().collect(),
            None => Vec::new(),
        }
    }

    /// Primera referencia; las relaciones múltiples sólo se resuelven por su primer elemento.
    pub fn first(&self) -> Option<&RelRef> {
        match &self.data {
            Some(RelData::One(r)) => Some(r),
            Some(RelData::Many(list)) => list.first(),
            None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Relationship>,
}

impl Resource {
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Value::as_str)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    /// `attributes.path.alias`, p. ej. `/tin-tuc/khu-kinh-te-moi`.
    pub fn path_alias(&self) -> Option<&str> {
        self.attr("path")?.get("alias")?.as_str()
    }

    /// Identidad JSON:API: par (type, id).
    pub fn is_same(&self, kind: &str, id: &str) -> bool {
        self.kind == kind && self.id == id
    }
}

/// `data` de un documento JSON:API: un recurso o una colección.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<Resource>),
    One(Box<Resource>),
}

/// Unidad devuelta a los consumidores: `{ data, included, meta? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub data: PrimaryData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub included: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl CompositeResult {
    pub fn single(resource: Resource, included: Vec<Resource>) -> Self {
        Self {
            data: PrimaryData::One(Box::new(resource)),
            included,
            meta: None,
        }
    }

    pub fn many(resources: Vec<Resource>, included: Vec<Resource>) -> Self {
        Self {
            data: PrimaryData::Many(resources),
            included,
            meta: None,
        }
    }

    /// Recursos primarios, sea cual sea la forma de `data`.
    pub fn resources(&self) -> &[Resource] {
        match &self.data {
            PrimaryData::Many(list) => list,
            PrimaryData::One(r) => std::slice::from_ref(r.as_ref()),
        }
    }

    pub fn into_resources(self) -> Vec<Resource> {
        match self.data {
            PrimaryData::Many(list) => list,
            PrimaryData::One(r) => vec![*r],
        }
    }

    /// `meta.count` de Drupal (total de resultados) si el CMS lo expone.
    pub fn total_count(&self) -> Option<u64> {
        let count = self.meta.as_ref()?.get("count")?;
        count
            .as_u64()
            .or_else(|| count.as_str().and_then(|s| s.parse().ok()))
    }

    /// Nuevo resultado con `included` ampliado, sin duplicados por (type, id).
    pub fn merge_included(self, extra: impl IntoIterator<Item = Resource>) -> Self {
        let mut included = self.included;
        for resource in extra {
            if !included.iter().any(|r| r.is_same(&resource.kind, &resource.id)) {
                included.push(resource);
            }
        }
        Self { included, ..self }
    }

    /// Sustituye los recursos primarios conservando `included` y `meta`.
    pub fn with_resources(self, resources: Vec<Resource>) -> Self {
        Self {
            data: PrimaryData::Many(resources),
            ..self
        }
    }
}

// --- Contador de visitas (endpoint auxiliar, no JSON:API) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewCount {
    #[serde(default, deserialize_with = "lenient_string")]
    pub nid: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub totalcount: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
}

impl ViewCount {
    pub fn zero(nid: &str) -> Self {
        Self {
            nid: nid.to_string(),
            totalcount: 0,
            uuid: String::new(),
        }
    }
}

// --- Filtros de búsqueda ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleFilters {
    pub keyword: Option<String>,
    /// ID interno del término de la categoría de noticias.
    pub category_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFilters {
    pub keyword: Option<String>,
    pub document_number: Option<String>,
    pub issuing_agency: Option<String>,
    /// Slug legible de la categoría (se filtra en cliente).
    pub category: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseFilters {
    pub keyword: Option<String>,
    pub industry: Option<String>,
    pub zone: Option<String>,
    pub country: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Subconjunto de preguntas: consultas ciudadanas (Q&A) o preguntas frecuentes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Qa,
    Faq,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionFilters {
    pub keyword: Option<String>,
    pub topic: Option<String>,
    #[serde(default)]
    pub kind: QuestionKind,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// --- Envíos de formularios ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Credenciales reenviadas al CMS: token bearer opcional y cookies de sesión.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub bearer_token: Option<String>,
    pub cookie: Option<String>,
}

/// Respuesta de los endpoints de envío; se conserva todo lo que devuelva el CMS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// --- Deserializadores tolerantes ---

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => Ok(n.as_u64().unwrap_or(0)),
        Some(Value::String(s)) => Ok(s.trim().parse().unwrap_or(0)),
        _ => Ok(0),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn menu_with_null_links_is_empty() {
        let tree: MenuTree = serde_json::from_value(json!({ "langcode": "vi", "links": null })).unwrap();
        assert!(tree.links.is_empty());
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn menu_depth_counts_nested_subtrees() {
        let tree: MenuTree = serde_json::from_value(json!({
            "links": [{
                "link": { "label": "Giới thiệu", "url": { "path": "/gioi-thieu" }, "expanded": true },
                "subtree": [{
                    "link": { "label": "Lịch sử", "url": { "path": "/lich-su" }, "expanded": false },
                    "subtree": [{ "link": { "label": "Tổ chức", "url": null, "expanded": null } }]
                }]
            }]
        }))
        .unwrap();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.links[0].subtree[0].subtree[0].link.url.path, "");
    }

    #[test]
    fn relationship_data_shapes() {
        let one: Relationship =
            serde_json::from_value(json!({ "data": { "type": "taxonomy_term--x", "id": "a" } })).unwrap();
        let many: Relationship = serde_json::from_value(json!({ "data": [
            { "type": "t", "id": "b" }, { "type": "t", "id": "c" }
        ] }))
        .unwrap();
        let none: Relationship = serde_json::from_value(json!({ "data": null })).unwrap();

        assert_eq!(one.first().map(|r| r.id.as_str()), Some("a"));
        assert_eq!(many.first().map(|r| r.id.as_str()), Some("b"));
        assert_eq!(many.refs().len(), 2);
        assert!(none.first().is_none());
    }

    #[test]
    fn target_id_accepts_numbers_and_strings() {
        let a = RelRef { kind: "t".into(), id: "x".into(), meta: Some(json!({ "drupal_internal__target_id": 16 })) };
        let b = RelRef { kind: "t".into(), id: "y".into(), meta: Some(json!({ "drupal_internal__target_id": "16" })) };
        assert_eq!(a.target_id().as_deref(), Some("16"));
        assert_eq!(b.target_id().as_deref(), Some("16"));
    }

    #[test]
    fn composite_single_and_many() {
        let single: CompositeResult = serde_json::from_value(json!({
            "data": { "id": "1", "type": "node--bai-viet", "attributes": { "title": "A" } }
        }))
        .unwrap();
        assert_eq!(single.resources().len(), 1);
        assert!(single.included.is_empty());

        let many: CompositeResult = serde_json::from_value(json!({
            "data": [{ "id": "1", "type": "n" }, { "id": "2", "type": "n" }],
            "included": null,
            "meta": { "count": "25" }
        }))
        .unwrap();
        assert_eq!(many.resources().len(), 2);
        assert_eq!(many.total_count(), Some(25));
    }

    #[test]
    fn view_count_tolerates_string_numbers() {
        let vc: ViewCount =
            serde_json::from_value(json!({ "nid": 12, "totalcount": "340", "uuid": null })).unwrap();
        assert_eq!(vc, ViewCount { nid: "12".into(), totalcount: 340, uuid: String::new() });
    }
}
