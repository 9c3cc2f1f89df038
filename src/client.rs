//! Cliente HTTP del CMS (Drupal): JSON:API, GraphQL y endpoints JSON planos.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_LANGUAGE, CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{ContentError, ContentResult};
use crate::models::{CompositeResult, Credentials, Language};
use crate::query::JsonApiQuery;

pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

/// Cliente compartido por todos los fetchers. Clonarlo es barato.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: Client,
    base_url: String,
}

impl CmsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ContentResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &AppConfig) -> ContentResult<Self> {
        Self::new(cfg.cms_base_url.clone(), cfg.cms_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{lang}/jsonapi/{bundle}[/{id}][?query]`
    pub fn jsonapi_url(&self, lang: Language, bundle: &str, id: Option<&str>, query: &JsonApiQuery) -> String {
        let mut url = format!("{}/{}/jsonapi/{}", self.base_url, lang.code(), bundle);
        if let Some(id) = id {
            url.push('/');
            url.push_str(&urlencoding::encode(id));
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.to_query_string());
        }
        url
    }

    fn jsonapi_request(&self, url: &str, lang: Language) -> RequestBuilder {
        self.http
            .get(url)
            .header(ACCEPT, JSONAPI_MEDIA_TYPE)
            .header(CONTENT_TYPE, JSONAPI_MEDIA_TYPE)
            .header(ACCEPT_LANGUAGE, lang.code())
            .header(CONTENT_LANGUAGE, lang.code())
    }

    /// GET sobre JSON:API; cualquier estado no 2xx es un error.
    pub async fn get_jsonapi(
        &self,
        lang: Language,
        bundle: &str,
        id: Option<&str>,
        query: &JsonApiQuery,
    ) -> ContentResult<CompositeResult> {
        let url = self.jsonapi_url(lang, bundle, id, query);
        debug!("GET {url}");
        let response = self.jsonapi_request(&url, lang).send().await?;
        let response = ensure_success(response, &url)?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST al endpoint GraphQL del idioma. Un array `errors` no vacío es un fallo.
    pub async fn graphql<T: DeserializeOwned>(&self, lang: Language, body: &Value) -> ContentResult<T> {
        let url = format!("{}/{}/graphql", self.base_url, lang.code());
        debug!("POST {url} (GraphQL)");
        let request = self
            .http
            .post(&url)
            .header(ACCEPT_LANGUAGE, lang.code())
            .json(body);
        let response = ensure_success(request.send().await?, &url)?;
        let body = response.bytes().await?;
        let parsed: GraphQlResponse<T> = serde_json::from_slice(&body)?;

        if !parsed.errors.is_empty() {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            return Err(ContentError::GraphQl(messages.join("; ")));
        }
        parsed
            .data
            .ok_or_else(|| ContentError::GraphQl("respuesta sin campo data".to_string()))
    }

    /// GET de un endpoint JSON plano (p. ej. `/api/view-count/{nid}`).
    pub async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> ContentResult<T> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("GET {url}");
        let response = self.http.get(&url).header(ACCEPT, "application/json").send().await?;
        let response = ensure_success(response, &url)?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST de formulario. Los errores del CMS se traducen a `ContentError::Submission`
    /// conservando su mensaje.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        lang: Language,
        body: &B,
        credentials: Option<&Credentials>,
    ) -> ContentResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {url}");
        let mut request = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, lang.code())
            .header(CONTENT_LANGUAGE, lang.code())
            .json(body);

        if let Some(creds) = credentials {
            if let Some(token) = creds.bearer_token.as_deref().filter(|t| !t.is_empty()) {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            if let Some(cookie) = creds.cookie.as_deref().filter(|c| !c.is_empty()) {
                request = request.header(COOKIE, cookie);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ContentError::Submission {
                status,
                message: extract_error_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn ensure_success(response: Response, url: &str) -> ContentResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ContentError::Status {
            status,
            url: url.to_string(),
        })
    }
}

/// Busca `message` o `error` en un cuerpo JSON; si no, devuelve el texto recortado.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "sin detalle".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
