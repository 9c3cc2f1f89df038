//! Enriquecimiento de medios: los párrafos de imagen que referencian medios
//! ausentes de `included` se completan con una petición secundaria por medio.
//!
//! Devuelve un `CompositeResult` nuevo; el original no se modifica. Los fallos
//! se registran y se ignoran: una imagen ausente no debe romper el contenido.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::client::CmsClient;
use crate::error::{ContentError, ContentResult};
use crate::models::{CompositeResult, Language, RelRef};
use crate::query::JsonApiQuery;
use crate::relations::find_included;

/// Tipos de párrafo que contienen imágenes.
pub const IMAGE_BLOCK_TYPES: &[&str] = &[
    "paragraph--image_block",
    "paragraph--khoi_hinh_anh",
    "paragraph--hinh_anh_va_van_ban",
];

/// `include` a pedir según el tipo de medio.
const MEDIA_INCLUDES: &[(&str, &str)] = &[
    ("media--image", "field_media_image"),
    ("media--document", "field_media_document"),
    ("media--remote_video", ""),
];

fn is_media_relationship(key: &str) -> bool {
    key.contains("image") || key.contains("media")
}

/// Referencias a medios que ningún recurso de `included` satisface.
pub fn missing_media_refs(result: &CompositeResult) -> Vec<RelRef> {
    let mut missing: Vec<RelRef> = Vec::new();
    let candidates = result
        .resources()
        .iter()
        .chain(result.included.iter())
        .filter(|r| IMAGE_BLOCK_TYPES.contains(&r.kind.as_str()));

    for block in candidates {
        for (key, relationship) in &block.relationships {
            if !is_media_relationship(key) {
                continue;
            }
            for reference in relationship.refs() {
                let already_listed = missing
                    .iter()
                    .any(|m| m.kind == reference.kind && m.id == reference.id);
                if !already_listed && find_included(&result.included, reference).is_none() {
                    missing.push(reference.clone());
                }
            }
        }
    }
    missing
}

/// `media--image` → `media/image`.
pub fn bundle_path(kind: &str) -> ContentResult<String> {
    match kind.split_once("--") {
        Some((entity, bundle)) if !entity.is_empty() && !bundle.is_empty() => Ok(format!("{entity}/{bundle}")),
        _ => Err(ContentError::InvalidInput(format!("tipo de recurso no válido: '{kind}'"))),
    }
}

fn include_for(kind: &str) -> &'static str {
    MEDIA_INCLUDES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, include)| *include)
        .unwrap_or("")
}

/// `GET /{lang}/jsonapi/{media_type}/{id}?include=…`
pub async fn fetch_media(client: &CmsClient, lang: Language, kind: &str, id: &str) -> ContentResult<CompositeResult> {
    let bundle = bundle_path(kind)?;
    let query = JsonApiQuery::new().include(include_for(kind));
    client.get_jsonapi(lang, &bundle, Some(id), &query).await
}

pub async fn enrich_media(client: &CmsClient, lang: Language, result: CompositeResult) -> CompositeResult {
    let missing = missing_media_refs(&result);
    if missing.is_empty() {
        return result;
    }
    debug!("Enriqueciendo {} medios ausentes de included", missing.len());

    let outcomes = join_all(
        missing
            .iter()
            .map(|reference| fetch_media(client, lang, &reference.kind, &reference.id)),
    )
    .await;

    let mut fetched = Vec::new();
    for (reference, outcome) in missing.iter().zip(outcomes) {
        match outcome {
            Ok(media) => {
                let nested = media.included.clone();
                fetched.extend(media.into_resources());
                fetched.extend(nested);
            }
            Err(err) => warn!(
                "No se pudo cargar el medio {} {}: {err}. Se continúa sin él.",
                reference.kind, reference.id
            ),
        }
    }
    result.merge_included(fetched)
}
