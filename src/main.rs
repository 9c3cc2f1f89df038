use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use bqlkkt_content::{api, app_state::AppState, cache::QueryCache, config::AppConfig};
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Barrido periódico de las entradas de caché fuera de su ventana de recolección.
fn spawn_cache_sweeper(cache: Arc<QueryCache<Value>>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!("Caché: {purged} entradas expiradas eliminadas");
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;
    info!("Entorno {:?}, CMS en {}", cfg.environment, cfg.cms_base_url);

    // 3. Estado compartido: cliente del CMS + caché de consultas
    let app_state = AppState::from_config(cfg.clone()).context("Error creando el cliente del CMS")?;
    spawn_cache_sweeper(app_state.cache.clone(), cfg.cache_sweep_interval);

    // 4. Router de la API
    let app = Router::new()
        .merge(api::create_router(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 5. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {}", cfg.server_addr))?;
    info!("🚀 Gateway escuchando en http://{}", cfg.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await
        .context("Error en el servidor HTTP")?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
