//! Artículos (`node--bai-viet`): detalle por identificador y listados.
//!
//! El identificador se clasifica como UUID, nid numérico o alias de ruta y
//! cada clase tiene su propia cadena de respaldo:
//!   - UUID: acceso directo.
//!   - nid: acceso directo y, si falla, filtro por `drupal_internal__nid`.
//!   - alias: filtro `path.alias` en servidor y, si falla o no devuelve nada,
//!     última página de artículos filtrada en cliente.

use crate::client::CmsClient;
use crate::enrichment::enrich_media;
use crate::error::{ContentError, ContentResult};
use crate::filters::Listing;
use crate::identifier::{classify_identifier, normalize_alias, IdentifierKind};
use crate::models::{ArticleFilters, CompositeResult, Language};
use crate::query::{
    article_params, page_or_default, page_size_or, JsonApiQuery, ARTICLE_BUNDLE, ARTICLE_INCLUDE,
    DEFAULT_PAGE_SIZE, MAX_PAGE_LIMIT,
};
use crate::strategy::FallbackChain;

async fn fetch_by_uuid(client: &CmsClient, lang: Language, id: &str) -> ContentResult<CompositeResult> {
    let query = JsonApiQuery::new().include(ARTICLE_INCLUDE);
    client.get_jsonapi(lang, ARTICLE_BUNDLE, Some(id), &query).await
}

async fn fetch_by_nid(client: &CmsClient, lang: Language, nid: &str) -> ContentResult<CompositeResult> {
    let query = JsonApiQuery::new()
        .exact("drupal_internal__nid", nid)
        .include(ARTICLE_INCLUDE);
    let result = client.get_jsonapi(lang, ARTICLE_BUNDLE, None, &query).await?;
    first_as_single(result, nid)
}

async fn fetch_by_alias_server(client: &CmsClient, lang: Language, alias: &str) -> ContentResult<CompositeResult> {
    let query = JsonApiQuery::new()
        .exact("path.alias", alias)
        .include(ARTICLE_INCLUDE);
    let result = client.get_jsonapi(lang, ARTICLE_BUNDLE, None, &query).await?;
    first_as_single(result, alias)
}

async fn fetch_by_alias_client(client: &CmsClient, lang: Language, alias: &str) -> ContentResult<CompositeResult> {
    let query = JsonApiQuery::new()
        .sort("-created")
        .include(ARTICLE_INCLUDE)
        .limit(MAX_PAGE_LIMIT);
    let result = client.get_jsonapi(lang, ARTICLE_BUNDLE, None, &query).await?;
    let included = result.included.clone();
    result
        .into_resources()
        .into_iter()
        .find(|article| article.path_alias().map(normalize_alias).as_deref() == Some(alias))
        .map(|article| CompositeResult::single(article, included))
        .ok_or_else(|| ContentError::NotFound(format!("artículo con alias {alias}")))
}

/// Primer recurso de una colección, como resultado individual.
fn first_as_single(result: CompositeResult, what: &str) -> ContentResult<CompositeResult> {
    let included = result.included.clone();
    result
        .into_resources()
        .into_iter()
        .next()
        .map(|article| CompositeResult::single(article, included))
        .ok_or_else(|| ContentError::NotFound(format!("artículo {what}")))
}

/// Detalle de artículo con los medios de sus párrafos ya enriquecidos.
pub async fn fetch_article_by_identifier(
    client: &CmsClient,
    lang: Language,
    identifier: &str,
) -> ContentResult<CompositeResult> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(ContentError::InvalidInput("identificador de artículo vacío".to_string()));
    }
    let chain = FallbackChain::new(format!("No se pudo cargar el artículo '{identifier}'"));

    let result = match classify_identifier(identifier) {
        IdentifierKind::Uuid => {
            chain
                .tier("acceso por uuid", fetch_by_uuid(client, lang, identifier))
                .run()
                .await?
        }
        IdentifierKind::Numeric => {
            chain
                .tier("acceso directo", fetch_by_uuid(client, lang, identifier))
                .tier("filtro por nid", fetch_by_nid(client, lang, identifier))
                .run()
                .await?
        }
        IdentifierKind::Path => {
            let alias = normalize_alias(identifier);
            chain
                .tier("alias en servidor", fetch_by_alias_server(client, lang, &alias))
                .tier("alias en cliente", fetch_by_alias_client(client, lang, &alias))
                .run()
                .await?
        }
    };

    Ok(enrich_media(client, lang, result).await)
}

/// Listado de noticias. Si el filtro por título falla en servidor se repite sin
/// él y se aplica en cliente.
pub async fn fetch_articles(client: &CmsClient, lang: Language, filters: &ArticleFilters) -> ContentResult<Listing> {
    let page = page_or_default(filters.page);
    let page_size = page_size_or(filters.page_size, DEFAULT_PAGE_SIZE);
    let keyword = filters
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase);

    let primary = article_params(filters);
    let broad = article_params(&ArticleFilters {
        keyword: None,
        ..filters.clone()
    });

    FallbackChain::new("No se pudo cargar el listado de artículos")
        .tier("filtro en servidor", async {
            let result = client.get_jsonapi(lang, ARTICLE_BUNDLE, None, &primary).await?;
            Ok(Listing::new(result, page, page_size, false))
        })
        .tier("filtro en cliente", async {
            let result = client.get_jsonapi(lang, ARTICLE_BUNDLE, None, &broad).await?;
            let Some(keyword) = keyword.as_deref() else {
                return Ok(Listing::new(result, page, page_size, false));
            };
            let kept = result
                .resources()
                .iter()
                .filter(|a| a.attr_str("title").is_some_and(|t| t.to_lowercase().contains(keyword)))
                .cloned()
                .collect();
            Ok(Listing::new(result.with_resources(kept), page, page_size, true))
        })
        .run()
        .await
}
