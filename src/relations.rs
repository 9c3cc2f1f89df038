//! Resolución de relaciones contra el `included` de la misma respuesta.
//!
//! Búsqueda lineal por (type, id): los `included` están acotados por una
//! página de resultados. Nada de aquí falla; lo que no se encuentra es `None`
//! o el centinela [`NOT_AVAILABLE`].

use crate::models::{RelRef, Resource};

pub const NOT_AVAILABLE: &str = "N/A";

pub fn find_included<'a>(included: &'a [Resource], reference: &RelRef) -> Option<&'a Resource> {
    included
        .iter()
        .find(|r| r.is_same(&reference.kind, &reference.id))
}

/// Recurso referenciado por `relationship` (sólo el primero si es múltiple).
pub fn related<'a>(resource: &Resource, relationship: &str, included: &'a [Resource]) -> Option<&'a Resource> {
    let reference = resource.relationship(relationship)?.first()?;
    find_included(included, reference)
}

/// Todos los recursos referenciados que estén presentes en `included`.
pub fn related_all<'a>(resource: &Resource, relationship: &str, included: &'a [Resource]) -> Vec<&'a Resource> {
    resource
        .relationship(relationship)
        .map(|rel| {
            rel.refs()
                .into_iter()
                .filter_map(|reference| find_included(included, reference))
                .collect()
        })
        .unwrap_or_default()
}

/// Nombre del término de taxonomía relacionado, o `"N/A"`.
pub fn taxonomy_term_name(resource: &Resource, relationship: &str, included: &[Resource]) -> String {
    related(resource, relationship, included)
        .and_then(|term| term.attr_str("name"))
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// URL pública de un fichero relacionado (`attributes.uri.url`), si existe.
pub fn file_url(resource: &Resource, relationship: &str, included: &[Resource]) -> Option<String> {
    let file = related(resource, relationship, included)?;
    file.attr("uri")
        .and_then(|uri| uri.get("url"))
        .and_then(|url| url.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(value: serde_json::Value) -> Resource {
        serde_json::from_value(value).unwrap()
    }

    fn pool() -> Vec<Resource> {
        vec![
            resource(json!({ "id": "a", "type": "taxonomy_term--loai_van_ban", "attributes": { "name": "Quy hoạch" } })),
            resource(json!({ "id": "b", "type": "taxonomy_term--loai_van_ban", "attributes": { "name": "Cải cách hành chính" } })),
            resource(json!({ "id": "f", "type": "file--file", "attributes": { "uri": { "url": "/sites/default/files/qd.pdf" } } })),
        ]
    }

    #[test]
    fn resolves_referenced_resource() {
        let doc = resource(json!({
            "id": "d1", "type": "node--legal_document",
            "relationships": { "field_cac_loai_van_ban": { "data": { "type": "taxonomy_term--loai_van_ban", "id": "b" } } }
        }));
        let included = pool();
        assert_eq!(related(&doc, "field_cac_loai_van_ban", &included).map(|r| r.id.as_str()), Some("b"));
        assert_eq!(taxonomy_term_name(&doc, "field_cac_loai_van_ban", &included), "Cải cách hành chính");
    }

    #[test]
    fn missing_target_yields_sentinel() {
        let doc = resource(json!({
            "id": "d1", "type": "node--legal_document",
            "relationships": { "field_cac_loai_van_ban": { "data": { "type": "taxonomy_term--loai_van_ban", "id": "zzz" } } }
        }));
        let included = pool();
        assert!(related(&doc, "field_cac_loai_van_ban", &included).is_none());
        assert_eq!(taxonomy_term_name(&doc, "field_cac_loai_van_ban", &included), NOT_AVAILABLE);
        assert_eq!(taxonomy_term_name(&doc, "field_inexistente", &included), NOT_AVAILABLE);
    }

    #[test]
    fn type_must_match_as_well_as_id() {
        let doc = resource(json!({
            "id": "d1", "type": "node--legal_document",
            "relationships": { "field_x": { "data": { "type": "media--image", "id": "a" } } }
        }));
        assert!(related(&doc, "field_x", &pool()).is_none());
    }

    #[test]
    fn array_relationship_uses_first_for_names_and_all_for_lists() {
        let doc = resource(json!({
            "id": "d1", "type": "node--legal_document",
            "relationships": {
                "field_cac_loai_van_ban": { "data": [
                    { "type": "taxonomy_term--loai_van_ban", "id": "a" },
                    { "type": "taxonomy_term--loai_van_ban", "id": "b" }
                ] },
                "field_tep_dinh_kem": { "data": { "type": "file--file", "id": "f" } }
            }
        }));
        let included = pool();
        assert_eq!(taxonomy_term_name(&doc, "field_cac_loai_van_ban", &included), "Quy hoạch");
        assert_eq!(related_all(&doc, "field_cac_loai_van_ban", &included).len(), 2);
        assert_eq!(
            file_url(&doc, "field_tep_dinh_kem", &included).as_deref(),
            Some("/sites/default/files/qd.pdf")
        );
    }
}
