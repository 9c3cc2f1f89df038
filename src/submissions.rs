//! Envío de formularios al CMS: contacto, registro y cambio de contraseña.
//! Los errores siempre se propagan con un mensaje legible.

use tracing::info;

use crate::client::CmsClient;
use crate::error::{ContentError, ContentResult};
use crate::models::{ChangePasswordRequest, ContactSubmission, Credentials, Language, RegistrationRequest, SubmissionReceipt};

pub const CONTACT_PATH: &str = "/api/v1/submit-contact-form";
pub const REGISTER_PATH: &str = "/api/v1/user/register";
pub const CHANGE_PASSWORD_PATH: &str = "/api/v1/user/change-password";

fn require(field: &str, value: &str) -> ContentResult<()> {
    if value.trim().is_empty() {
        Err(ContentError::InvalidInput(format!("el campo '{field}' es obligatorio")))
    } else {
        Ok(())
    }
}

fn require_email(value: &str) -> ContentResult<()> {
    require("email", value)?;
    match value.trim().split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ContentError::InvalidInput(format!("email no válido: '{value}'"))),
    }
}

pub async fn submit_contact_form(
    client: &CmsClient,
    lang: Language,
    form: &ContactSubmission,
) -> ContentResult<SubmissionReceipt> {
    require("name", &form.name)?;
    require_email(&form.email)?;
    require("subject", &form.subject)?;
    require("message", &form.message)?;

    let receipt = client
        .post_json(CONTACT_PATH, lang, form, None)
        .await
        .map_err(|e| e.context("No se pudo enviar el formulario de contacto"))?;
    info!("Formulario de contacto enviado por {}", form.email);
    Ok(receipt)
}

pub async fn register_user(
    client: &CmsClient,
    lang: Language,
    request: &RegistrationRequest,
) -> ContentResult<SubmissionReceipt> {
    require("username", &request.username)?;
    require_email(&request.email)?;
    require("password", &request.password)?;

    let receipt = client
        .post_json(REGISTER_PATH, lang, request, None)
        .await
        .map_err(|e| e.context("No se pudo completar el registro"))?;
    info!("Usuario '{}' registrado", request.username);
    Ok(receipt)
}

/// Acepta un token bearer opcional; la sesión viaja en las cookies reenviadas.
pub async fn change_password(
    client: &CmsClient,
    lang: Language,
    request: &ChangePasswordRequest,
    credentials: &Credentials,
) -> ContentResult<SubmissionReceipt> {
    require("current_password", &request.current_password)?;
    require("new_password", &request.new_password)?;
    if request.current_password == request.new_password {
        return Err(ContentError::InvalidInput(
            "la nueva contraseña debe ser distinta de la actual".to_string(),
        ));
    }

    client
        .post_json(CHANGE_PASSWORD_PATH, lang, request, Some(credentials))
        .await
        .map_err(|e| e.context("No se pudo cambiar la contraseña"))
}
