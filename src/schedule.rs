//! Agenda de trabajo (`node--schedule_item`).
//!
//! El servidor filtra por `field_ngay >= inicio`; el fin del rango se aplica
//! siempre en cliente.

use crate::client::CmsClient;
use crate::error::ContentResult;
use crate::filters::{narrow_until, parse_cms_date, SCHEDULE_DATE_FIELD};
use crate::models::{CompositeResult, Language, Resource, ScheduleFilters};
use crate::query::{schedule_params, SCHEDULE_BUNDLE};
use crate::strategy::FallbackChain;

fn narrow_from(items: Vec<Resource>, filters: &ScheduleFilters) -> Vec<Resource> {
    let Some(start) = filters.start_date else {
        return items;
    };
    items
        .into_iter()
        .filter(|item| {
            item.attr_str(SCHEDULE_DATE_FIELD)
                .and_then(parse_cms_date)
                .map_or(true, |date| date >= start)
        })
        .collect()
}

pub async fn fetch_schedule(
    client: &CmsClient,
    lang: Language,
    filters: &ScheduleFilters,
) -> ContentResult<CompositeResult> {
    let primary = schedule_params(filters);
    let broad = schedule_params(&ScheduleFilters::default());

    let result = FallbackChain::new("No se pudo cargar la agenda de trabajo")
        .tier("fecha de inicio en servidor", client.get_jsonapi(lang, SCHEDULE_BUNDLE, None, &primary))
        .tier("fechas en cliente", async {
            let result = client.get_jsonapi(lang, SCHEDULE_BUNDLE, None, &broad).await?;
            let kept = narrow_from(result.resources().to_vec(), filters);
            Ok(result.with_resources(kept))
        })
        .run()
        .await?;

    Ok(match filters.end_date {
        Some(end) => {
            let kept = narrow_until(result.resources().to_vec(), end);
            result.with_resources(kept)
        }
        None => result,
    })
}
