//! Caché de consultas del gateway, con ventanas de frescura y de recolección
//! por tipo de entidad.
//!
//! - Entrada fresca (`age < stale_time`): se sirve sin ir al CMS.
//! - Entrada caducada: se vuelve a pedir (con reintentos); si falla y la
//!   entrada sigue dentro de `gc_time`, se sirve la copia antigua.
//! - Entradas más viejas que `gc_time`: se eliminan al consultarlas o en el
//!   barrido periódico.
//!
//! El mutex nunca se mantiene durante un `.await`; dos fallos simultáneos de
//! la misma clave hacen dos peticiones.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ContentResult;
use crate::models::Language;
use crate::retry::{retry_with_backoff, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub stale_time: Duration,
    pub gc_time: Duration,
}

const fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Menu,
    Article,
    ArticleList,
    Document,
    Enterprise,
    Schedule,
    Question,
    ViewCount,
    Media,
}

impl Entity {
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Menu => "menu",
            Entity::Article => "article",
            Entity::ArticleList => "articles",
            Entity::Document => "documents",
            Entity::Enterprise => "enterprises",
            Entity::Schedule => "schedule",
            Entity::Question => "questions",
            Entity::ViewCount => "view-count",
            Entity::Media => "media",
        }
    }

    /// Ventanas según lo volátil que es cada tipo de contenido.
    pub fn policy(&self) -> CachePolicy {
        let (stale, gc) = match self {
            Entity::Menu => (minutes(30), minutes(60)),
            Entity::Article | Entity::ArticleList | Entity::Document | Entity::Enterprise | Entity::Media => {
                (minutes(5), minutes(10))
            }
            Entity::Schedule | Entity::Question | Entity::ViewCount => (minutes(2), minutes(5)),
        };
        CachePolicy {
            stale_time: stale,
            gc_time: gc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    entity: Entity,
    key: String,
}

impl QueryKey {
    pub fn new(entity: Entity, lang: Language, fragment: &str) -> Self {
        Self {
            entity,
            key: format!("{}:{}:{}", entity.name(), lang.code(), fragment),
        }
    }

    /// Clave a partir del objeto de filtros serializado (orden de campos estable).
    pub fn for_filters<F: Serialize>(entity: Entity, lang: Language, filters: &F) -> ContentResult<Self> {
        Ok(Self::new(entity, lang, &serde_json::to_string(filters)?))
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

struct Entry<V> {
    value: V,
    fetched_at: Instant,
    policy: CachePolicy,
}

pub struct QueryCache<V> {
    entries: Mutex<HashMap<QueryKey, Entry<V>>>,
    retry: RetryPolicy,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retry,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry<V>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Valor y antigüedad de la entrada; elimina la entrada si ya superó `gc_time`.
    fn lookup(&self, key: &QueryKey) -> Option<(V, Duration)> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        let age = entry.fetched_at.elapsed();
        if age >= entry.policy.gc_time {
            entries.remove(key);
            return None;
        }
        Some((entry.value.clone(), age))
    }

    fn store(&self, key: &QueryKey, value: V) {
        self.lock().insert(
            key.clone(),
            Entry {
                value,
                fetched_at: Instant::now(),
                policy: key.entity().policy(),
            },
        );
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: &QueryKey, fetch: F) -> ContentResult<V>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ContentResult<V>>,
    {
        let policy = key.entity().policy();
        let cached = self.lookup(key);
        if let Some((value, age)) = &cached {
            if *age < policy.stale_time {
                debug!("caché: {} (fresca)", key.as_str());
                return Ok(value.clone());
            }
        }

        match retry_with_backoff(&self.retry, key.as_str(), fetch).await {
            Ok(value) => {
                self.store(key, value.clone());
                Ok(value)
            }
            Err(err) => match cached {
                Some((stale, _)) => {
                    warn!("{}: se sirve la copia en caché tras un error ({err})", key.as_str());
                    Ok(stale)
                }
                None => Err(err),
            },
        }
    }

    pub fn invalidate(&self, key: &QueryKey) {
        self.lock().remove(key);
    }

    /// Elimina las entradas fuera de su ventana de recolección. Devuelve cuántas.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at.elapsed() < entry.policy.gc_time);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
