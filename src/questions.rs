//! Preguntas ciudadanas (`node--question`).
//!
//! Un único tipo de contenido alimenta dos listados: Q&A y preguntas
//! frecuentes. La separación por estado se hace aquí, no en la vista.

use crate::client::CmsClient;
use crate::error::ContentResult;
use crate::filters::{partition_questions, Listing};
use crate::models::{Language, QuestionFilters, Resource};
use crate::query::{page_or_default, page_size_or, question_params, DEFAULT_PAGE_SIZE, QUESTION_BUNDLE};
use crate::strategy::FallbackChain;

pub async fn fetch_questions(client: &CmsClient, lang: Language, filters: &QuestionFilters) -> ContentResult<Listing> {
    let page = page_or_default(filters.page);
    let page_size = page_size_or(filters.page_size, DEFAULT_PAGE_SIZE);

    let primary = question_params(filters);
    let broad = question_params(&QuestionFilters {
        keyword: None,
        ..filters.clone()
    });
    let keyword = filters
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase);

    let (result, narrowed_by_keyword) = FallbackChain::new("No se pudieron cargar las preguntas")
        .tier("filtros en servidor", async {
            let result = client.get_jsonapi(lang, QUESTION_BUNDLE, None, &primary).await?;
            Ok((result, false))
        })
        .tier("palabra clave en cliente", async {
            let result = client.get_jsonapi(lang, QUESTION_BUNDLE, None, &broad).await?;
            let Some(keyword) = keyword.as_deref() else {
                return Ok((result, false));
            };
            let kept: Vec<Resource> = result
                .resources()
                .iter()
                .filter(|q| q.attr_str("title").is_some_and(|t| t.to_lowercase().contains(keyword)))
                .cloned()
                .collect();
            let narrowed = kept.len() < result.resources().len();
            Ok((result.with_resources(kept), narrowed))
        })
        .run()
        .await?;

    let before = result.resources().len();
    let kept = partition_questions(result.resources().to_vec(), filters.kind);
    let narrowed = narrowed_by_keyword || kept.len() < before;
    Ok(Listing::new(result.with_resources(kept), page, page_size, narrowed))
}
