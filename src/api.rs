use std::future::Future;

use axum::{
    extract::{Json, Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    articles, documents, enrichment, enterprises,
    cache::{Entity, QueryKey},
    error::{ContentError, ContentResult},
    menu,
    models::{
        ArticleFilters, ChangePasswordRequest, ContactSubmission, Credentials, DocumentFilters, EnterpriseFilters,
        Language, MainMenuData, QuestionFilters, RegistrationRequest, ScheduleFilters, SubmissionReceipt, ViewCount,
    },
    questions, schedule, submissions, view_count,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

type ApiError = (StatusCode, Json<Value>);

// --- Parámetros comunes ---

#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    #[serde(default)]
    lang: Language,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/menu", get(menu_handler))
        .route("/api/articles", get(articles_handler))
        .route("/api/articles/*identifier", get(article_detail_handler))
        .route("/api/documents", get(documents_handler))
        .route("/api/enterprises", get(enterprises_handler))
        .route("/api/schedule", get(schedule_handler))
        .route("/api/questions", get(questions_handler))
        .route("/api/media/:media_type/:id", get(media_handler))
        .route("/api/view-count/:nid", get(view_count_handler))
        .route("/api/contact", post(contact_handler))
        .route("/api/register", post(register_handler))
        .route("/api/change-password", post(change_password_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(app_state)
}

/// Asigna un id a cada petición, lo propaga a los logs y lo devuelve en `x-request-id`.
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "gateway",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

// --- Errores ---

fn status_for(err: &ContentError) -> StatusCode {
    if err.is_not_found() {
        return StatusCode::NOT_FOUND;
    }
    match err {
        ContentError::Fetch { source, .. } => status_for(source),
        ContentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        // Los rechazos de validación del CMS (4xx) se devuelven tal cual al cliente.
        ContentError::Submission { status, .. } if status.is_client_error() => *status,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: ContentError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Error del CMS: {err}");
    } else {
        warn!("Petición rechazada ({status}): {err}");
    }
    (status, Json(json!({ "error": err.to_string() })))
}

/// Sirve desde la caché o ejecuta `fetch` (con reintentos) y guarda el resultado serializado.
async fn cached<T, F, Fut>(state: &AppState, key: QueryKey, mut fetch: F) -> Result<Json<Value>, ApiError>
where
    T: Serialize,
    F: FnMut() -> Fut,
    Fut: Future<Output = ContentResult<T>>,
{
    state
        .cache
        .get_or_fetch(&key, move || {
            let pending = fetch();
            async move { Ok::<_, ContentError>(serde_json::to_value(pending.await?)?) }
        })
        .await
        .map(Json)
        .map_err(error_response)
}

fn filters_key<F: Serialize>(entity: Entity, lang: Language, filters: &F) -> Result<QueryKey, ApiError> {
    QueryKey::for_filters(entity, lang, filters).map_err(error_response)
}

// --- Handlers ---

#[axum::debug_handler]
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "environment": format!("{:?}", state.config.environment),
        "cms_base_url": state.client.base_url(),
        "cached_entries": state.cache.len(),
    }))
}

/// Respuesta por defecto cuando ni el CMS ni la caché tienen el dato. No se guarda.
fn silent_default<T: Serialize>(result: Result<Json<Value>, ApiError>, default: T) -> Json<Value> {
    result.unwrap_or_else(|_| Json(serde_json::to_value(default).unwrap_or(Value::Null)))
}

/// Los dos idiomas van siempre juntos; `lang` no cambia la respuesta.
#[axum::debug_handler]
async fn menu_handler(State(state): State<AppState>) -> Json<Value> {
    let client = &state.client;
    let key = QueryKey::new(Entity::Menu, Language::default(), "main");
    let result = cached(&state, key, move || menu::try_fetch_main_menu_data(client)).await;
    silent_default(result, MainMenuData::empty())
}

#[axum::debug_handler]
async fn articles_handler(
    State(state): State<AppState>,
    Query(LangQuery { lang }): Query<LangQuery>,
    Query(filters): Query<ArticleFilters>,
) -> Result<Json<Value>, ApiError> {
    let key = filters_key(Entity::ArticleList, lang, &filters)?;
    let (client, filters) = (&state.client, &filters);
    cached(&state, key, move || articles::fetch_articles(client, lang, filters)).await
}

#[axum::debug_handler]
async fn article_detail_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(LangQuery { lang }): Query<LangQuery>,
) -> Result<Json<Value>, ApiError> {
    let key = QueryKey::new(Entity::Article, lang, &identifier);
    let (client, identifier) = (&state.client, identifier.as_str());
    cached(&state, key, move || articles::fetch_article_by_identifier(client, lang, identifier)).await
}

#[axum::debug_handler]
async fn documents_handler(
    State(state): State<AppState>,
    Query(LangQuery { lang }): Query<LangQuery>,
    Query(filters): Query<DocumentFilters>,
) -> Result<Json<Value>, ApiError> {
    let key = filters_key(Entity::Document, lang, &filters)?;
    let (client, filters) = (&state.client, &filters);
    cached(&state, key, move || documents::search_documents(client, lang, filters)).await
}

#[axum::debug_handler]
async fn enterprises_handler(
    State(state): State<AppState>,
    Query(LangQuery { lang }): Query<LangQuery>,
    Query(filters): Query<EnterpriseFilters>,
) -> Result<Json<Value>, ApiError> {
    let key = filters_key(Entity::Enterprise, lang, &filters)?;
    let (client, filters) = (&state.client, &filters);
    cached(&state, key, move || enterprises::search_enterprises(client, lang, filters)).await
}

#[axum::debug_handler]
async fn schedule_handler(
    State(state): State<AppState>,
    Query(LangQuery { lang }): Query<LangQuery>,
    Query(filters): Query<ScheduleFilters>,
) -> Result<Json<Value>, ApiError> {
    let key = filters_key(Entity::Schedule, lang, &filters)?;
    let (client, filters) = (&state.client, &filters);
    cached(&state, key, move || schedule::fetch_schedule(client, lang, filters)).await
}

#[axum::debug_handler]
async fn questions_handler(
    State(state): State<AppState>,
    Query(LangQuery { lang }): Query<LangQuery>,
    Query(filters): Query<QuestionFilters>,
) -> Result<Json<Value>, ApiError> {
    let key = filters_key(Entity::Question, lang, &filters)?;
    let (client, filters) = (&state.client, &filters);
    cached(&state, key, move || questions::fetch_questions(client, lang, filters)).await
}

#[axum::debug_handler]
async fn media_handler(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
    Query(LangQuery { lang }): Query<LangQuery>,
) -> Result<Json<Value>, ApiError> {
    let key = QueryKey::new(Entity::Media, lang, &format!("{media_type}/{id}"));
    let (client, media_type, id) = (&state.client, media_type.as_str(), id.as_str());
    cached(&state, key, move || enrichment::fetch_media(client, lang, media_type, id)).await
}

#[axum::debug_handler]
async fn view_count_handler(
    State(state): State<AppState>,
    Path(nid): Path<String>,
    Query(LangQuery { lang }): Query<LangQuery>,
) -> Json<Value> {
    let key = QueryKey::new(Entity::ViewCount, lang, &nid);
    let (client, nid) = (&state.client, nid.as_str());
    let result = cached(&state, key, move || view_count::try_fetch_view_count(client, nid)).await;
    silent_default(result, ViewCount::zero(nid))
}

// Los envíos no pasan por la caché ni se reintentan.

#[axum::debug_handler]
async fn contact_handler(
    State(state): State<AppState>,
    Query(LangQuery { lang }): Query<LangQuery>,
    Json(form): Json<ContactSubmission>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    submissions::submit_contact_form(&state.client, lang, &form)
        .await
        .map(Json)
        .map_err(error_response)
}

#[axum::debug_handler]
async fn register_handler(
    State(state): State<AppState>,
    Query(LangQuery { lang }): Query<LangQuery>,
    Json(request): Json<RegistrationRequest>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    submissions::register_user(&state.client, lang, &request)
        .await
        .map(Json)
        .map_err(error_response)
}

fn credentials_from(headers: &HeaderMap) -> Credentials {
    let bearer_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Credentials { bearer_token, cookie }
}

#[axum::debug_handler]
async fn change_password_handler(
    State(state): State<AppState>,
    Query(LangQuery { lang }): Query<LangQuery>,
    headers: HeaderMap,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let credentials = credentials_from(&headers);
    submissions::change_password(&state.client, lang, &request, &credentials)
        .await
        .map(Json)
        .map_err(error_response)
}
