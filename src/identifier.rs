//! Clasificación de identificadores de artículo: UUID, nid numérico o alias de ruta.

use std::sync::LazyLock;

use regex_lite::Regex;

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("la expresión de UUID es válida")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Uuid,
    Numeric,
    Path,
}

pub fn classify_identifier(identifier: &str) -> IdentifierKind {
    if UUID_RE.is_match(identifier) {
        IdentifierKind::Uuid
    } else if !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit()) {
        IdentifierKind::Numeric
    } else {
        IdentifierKind::Path
    }
}

/// Normaliza un alias para compararlo: una sola `/` inicial, sin `/` final
/// y sin prefijo de idioma (`/vi/...`, `/en/...`).
pub fn normalize_alias(alias: &str) -> String {
    let trimmed = alias.trim().trim_matches('/');
    let without_lang = ["vi/", "en/"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    format!("/{without_lang}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_are_case_insensitive() {
        assert_eq!(
            classify_identifier("3f2b8c1e-9a7d-4c2e-8b1f-0a1b2c3d4e5f"),
            IdentifierKind::Uuid
        );
        assert_eq!(
            classify_identifier("3F2B8C1E-9A7D-4C2E-8B1F-0A1B2C3D4E5F"),
            IdentifierKind::Uuid
        );
    }

    #[test]
    fn digits_are_numeric() {
        assert_eq!(classify_identifier("1234"), IdentifierKind::Numeric);
        assert_eq!(classify_identifier("0"), IdentifierKind::Numeric);
    }

    #[test]
    fn everything_else_is_a_path() {
        for id in ["tin-tuc/khu-kinh-te", "", "12a", "3f2b8c1e-9a7d-4c2e-8b1f", "-12"] {
            assert_eq!(classify_identifier(id), IdentifierKind::Path, "{id}");
        }
    }

    #[test]
    fn alias_normalization() {
        assert_eq!(normalize_alias("tin-tuc/a"), "/tin-tuc/a");
        assert_eq!(normalize_alias("/vi/tin-tuc/a/"), "/tin-tuc/a");
        assert_eq!(normalize_alias("/en/news/a"), "/news/a");
        assert_eq!(normalize_alias("/video"), "/video");
    }
}
