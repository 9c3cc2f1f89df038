//! Contador de visitas de un nodo. Es decorativo: nunca devuelve error.

use crate::client::CmsClient;
use crate::error::{ContentError, ContentResult};
use crate::models::ViewCount;
use crate::strategy::FallbackChain;

async fn fetch_first(client: &CmsClient, nid: &str) -> ContentResult<ViewCount> {
    let path = format!("/api/view-count/{}?_format=json", urlencoding::encode(nid));
    let rows: Vec<ViewCount> = client.get_json(&path).await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| ContentError::NotFound(format!("contador de visitas de {nid}")))
}

/// Variante con error, para la capa de caché del gateway.
pub async fn try_fetch_view_count(client: &CmsClient, nid: &str) -> ContentResult<ViewCount> {
    fetch_first(client, nid)
        .await
        .map_err(|e| e.context(format!("Contador de visitas de {nid}")))
}

/// Cualquier fallo (HTTP, JSON, lista vacía) se traduce en `{nid, 0, ""}`.
pub async fn fetch_view_count(client: &CmsClient, nid: &str) -> ViewCount {
    FallbackChain::new(format!("Contador de visitas de {nid}"))
        .tier("endpoint view-count", fetch_first(client, nid))
        .run_or(ViewCount::zero(nid))
        .await
}
