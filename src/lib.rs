//! Capa de acceso a contenidos del portal bilingüe (vi/en) de la autoridad de
//! zonas económicas: consultas GraphQL de menús y JSON:API de contenidos
//! contra un CMS Drupal, con cadenas de respaldo, enriquecimiento de medios,
//! filtros de negocio en cliente y un gateway HTTP con caché.

pub mod api;
pub mod app_state;
pub mod articles;
pub mod cache;
pub mod client;
pub mod config;
pub mod documents;
pub mod enrichment;
pub mod enterprises;
pub mod error;
pub mod filters;
pub mod identifier;
pub mod menu;
pub mod models;
pub mod query;
pub mod questions;
pub mod relations;
pub mod retry;
pub mod schedule;
pub mod strategy;
pub mod submissions;
pub mod view_count;

pub use client::CmsClient;
pub use error::{ContentError, ContentResult};
pub use models::{CompositeResult, Language};
