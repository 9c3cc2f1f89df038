//! Menús vía GraphQL.
//!
//! Menú principal: consulta parametrizada por idioma → consulta estática de
//! respaldo → menú vacío en ambos idiomas. `fetch_main_menu_data` nunca falla;
//! `try_fetch_main_menu_data` devuelve el error en lugar del menú vacío.

use futures::future::try_join;
use serde::Deserialize;

use crate::client::CmsClient;
use crate::error::ContentResult;
use crate::models::{Language, MainMenuData, MenuTree};
use crate::query::{graphql_body, menu_fallback_query, menu_query, menu_variables, MenuName};
use crate::strategy::FallbackChain;

#[derive(Debug, Deserialize)]
struct MenuByName {
    #[serde(rename = "menuByName")]
    menu_by_name: Option<MenuTree>,
}

/// Un `menuByName` null equivale a "sin menú": árbol vacío, no error.
pub async fn fetch_menu(client: &CmsClient, lang: Language, name: MenuName) -> ContentResult<MenuTree> {
    let body = graphql_body(menu_query(), Some(menu_variables(name)));
    let response: MenuByName = client.graphql(lang, &body).await?;
    Ok(response.menu_by_name.unwrap_or_default())
}

async fn fetch_menu_static(client: &CmsClient, lang: Language) -> ContentResult<MenuTree> {
    let body = graphql_body(menu_fallback_query(), None);
    let response: MenuByName = client.graphql(lang, &body).await?;
    Ok(response.menu_by_name.unwrap_or_default())
}

fn main_menu_chain(client: &CmsClient) -> FallbackChain<'_, MainMenuData> {
    FallbackChain::new("No se pudo cargar el menú principal")
        .tier("consulta parametrizada por idioma", async move {
            let (vi, en) = try_join(
                fetch_menu(client, Language::Vi, MenuName::Main),
                fetch_menu(client, Language::En, MenuName::Main),
            )
            .await?;
            Ok(MainMenuData { vi, en })
        })
        .tier("consulta estática", async move {
            let (vi, en) = try_join(
                fetch_menu_static(client, Language::Vi),
                fetch_menu_static(client, Language::En),
            )
            .await?;
            Ok(MainMenuData { vi, en })
        })
}

/// Variante que propaga el error cuando fallan las dos consultas, para que el
/// llamador decida (reintentar, servir la copia en caché) antes del menú vacío.
pub async fn try_fetch_main_menu_data(client: &CmsClient) -> ContentResult<MainMenuData> {
    main_menu_chain(client).run().await
}

pub async fn fetch_main_menu_data(client: &CmsClient) -> MainMenuData {
    main_menu_chain(client).run_or(MainMenuData::empty()).await
}
