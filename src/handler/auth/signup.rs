use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorBody},
    service::registration::{SignupArtifacts, SignupPayload},
    state::AppState,
};

/// Four images of up to 5 MB each plus the text fields.
const SIGNUP_BODY_LIMIT: usize = 25 * 1024 * 1024;

#[derive(Serialize, ToSchema)]
pub struct SignupResponse {
    pub message: &'static str,
}

struct SignupForm {
    payload: SignupPayload,
    artifacts: SignupArtifacts,
    stored: Vec<String>,
}

fn apply_text_field(payload: &mut SignupPayload, name: &str, value: String) {
    let slot = match name {
        "type" => &mut payload.intent,
        "role" => &mut payload.role,
        "name" => &mut payload.name,
        "lastname" => &mut payload.lastname,
        "phone" => &mut payload.phone,
        "email" => &mut payload.email,
        "password" => &mut payload.password,
        "address" => &mut payload.address,
        "id_number" => &mut payload.id_number,
        "number_license" => &mut payload.number_license,
        "agency_name" => &mut payload.agency_name,
        "line_id" => &mut payload.line_id,
        _ => return,
    };
    *slot = Some(value);
}

/// Drain the multipart stream into payload fields and stored images. On any
/// failure the names stored so far come back with the error so the caller
/// can clean up.
async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<SignupForm, (ApiError, Vec<String>)> {
    let mut payload = SignupPayload::default();
    let mut embedded: Option<String> = None;
    let mut artifacts = SignupArtifacts::default();
    let mut stored: Vec<String> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => {
                return Err((
                    ApiError::Validation("Invalid payload format".to_string()),
                    stored,
                ))
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let is_file = field
            .file_name()
            .map(|file_name| !file_name.is_empty())
            .unwrap_or(false);

        if is_file {
            let already_taken = match name.as_str() {
                "id_front" => artifacts.id_front.is_some(),
                "id_back" => artifacts.id_back.is_some(),
                "selfie" => artifacts.selfie.is_some(),
                "license_image" => artifacts.license_image.is_some(),
                // A file under any other part name is not accepted at all.
                _ => {
                    return Err((
                        ApiError::Validation("Upload Error: Unexpected field".to_string()),
                        stored,
                    ))
                }
            };
            if already_taken {
                return Err((
                    ApiError::Validation("Upload Error: Unexpected field".to_string()),
                    stored,
                ));
            }

            let original = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return Err((
                        ApiError::Validation("Invalid payload format".to_string()),
                        stored,
                    ))
                }
            };
            let stored_name = match state
                .artifacts()
                .store("", &name, &original, content_type.as_deref(), &bytes)
                .await
            {
                Ok(stored_name) => stored_name,
                Err(err) => return Err((err, stored)),
            };
            stored.push(stored_name.clone());
            match name.as_str() {
                "id_front" => artifacts.id_front = Some(stored_name),
                "id_back" => artifacts.id_back = Some(stored_name),
                "selfie" => artifacts.selfie = Some(stored_name),
                _ => artifacts.license_image = Some(stored_name),
            }
        } else {
            let text = match field.text().await {
                Ok(text) => text,
                Err(_) => {
                    return Err((
                        ApiError::Validation("Invalid payload format".to_string()),
                        stored,
                    ))
                }
            };
            if name == "payload" {
                embedded = Some(text);
            } else {
                apply_text_field(&mut payload, &name, text);
            }
        }
    }

    // An embedded JSON payload part replaces the individual text fields.
    if let Some(raw) = embedded {
        payload = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(_) => {
                return Err((
                    ApiError::Validation("Invalid payload format".to_string()),
                    stored,
                ))
            }
        };
    }

    Ok(SignupForm {
        payload,
        artifacts,
        stored,
    })
}

async fn discard_all(state: &AppState, names: &[String]) {
    for name in names {
        state.artifacts().discard("", name).await;
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Validation or duplicate failure", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let form = match read_form(&state, &mut multipart).await {
        Ok(form) => form,
        Err((err, stored)) => {
            discard_all(&state, &stored).await;
            return Err(err);
        }
    };

    if let Err(err) = state
        .registration()
        .signup(form.payload, form.artifacts)
        .await
    {
        discard_all(&state, &form.stored).await;
        return Err(err);
    }

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Signup successful",
        }),
    ))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .layer(DefaultBodyLimit::max(SIGNUP_BODY_LIMIT))
        .with_state(state)
}
