//! Cadenas de respaldo: lista ordenada de estrategias con el mismo contrato
//! (`attempt -> ContentResult<T>`), evaluadas en secuencia hasta el primer éxito.
//!
//! Los futures de Rust son perezosos, así que cada nivel sólo hace su petición
//! si los anteriores han fallado.

use std::future::Future;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::{ContentError, ContentResult};

pub struct FallbackChain<'a, T> {
    context: String,
    tiers: Vec<(&'static str, BoxFuture<'a, ContentResult<T>>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    /// `context` es el mensaje legible que envuelve el error final.
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            tiers: Vec::new(),
        }
    }

    pub fn tier<F>(mut self, name: &'static str, attempt: F) -> Self
    where
        F: Future<Output = ContentResult<T>> + Send + 'a,
    {
        self.tiers.push((name, Box::pin(attempt)));
        self
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Ejecuta los niveles en orden. Si todos fallan devuelve el último error
    /// envuelto con el contexto de la cadena.
    pub async fn run(self) -> ContentResult<T> {
        let mut last_error = None;
        for (index, (name, attempt)) in self.tiers.into_iter().enumerate() {
            match attempt.await {
                Ok(value) => {
                    if index > 0 {
                        debug!("{}: resuelto por la estrategia '{name}'", self.context);
                    }
                    return Ok(value);
                }
                Err(err) => {
                    warn!("{}: la estrategia '{name}' falló: {err}", self.context);
                    last_error = Some(err);
                }
            }
        }
        let err = last_error
            .unwrap_or_else(|| ContentError::InvalidInput("cadena de respaldo sin estrategias".to_string()));
        Err(err.context(self.context))
    }

    /// Variante silenciosa: si todo falla devuelve `default` en lugar del error.
    pub async fn run_or(self, default: T) -> T {
        let context = self.context.clone();
        match self.run().await {
            Ok(value) => value,
            Err(err) => {
                warn!("{context}: se usa el valor por defecto ({err})");
                default
            }
        }
    }
}
