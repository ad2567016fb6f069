use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorBody},
    handler::{require_role, AuthUser, MaybeAuthUser},
    service::listings::{CreateListingInput, LandDetail, MAX_LISTING_IMAGES},
    state::AppState,
};

/// Listing photos land in their own folder, apart from signup documents.
const LISTING_FOLDER: &str = "lands";
/// Five photos of up to 5 MB each plus the text fields.
const LISTING_BODY_LIMIT: usize = 30 * 1024 * 1024;

#[derive(Serialize, ToSchema)]
pub struct CreateLandResponse {
    pub status: &'static str,
    pub land_id: i64,
    pub message: &'static str,
}

fn apply_text_field(input: &mut CreateListingInput, name: &str, value: String) {
    let slot = match name {
        "seller_name" => &mut input.seller_name,
        "agency_name" => &mut input.agency_name,
        "phone" => &mut input.phone,
        "line_id" => &mut input.line_id,
        "doc_detail" => &mut input.doc_detail,
        "documents" => &mut input.documents,
        "rai" => &mut input.rai,
        "ngan" => &mut input.ngan,
        "wa" => &mut input.wa,
        "frontage_width" => &mut input.frontage_width,
        "price_per_sqwa" => &mut input.price_per_sqwa,
        "price_total" => &mut input.price_total,
        _ => return,
    };
    *slot = Some(value);
}

struct ListingForm {
    input: CreateListingInput,
    images: Vec<String>,
}

/// Drain the multipart stream into listing fields and stored photos. Only
/// `images` may carry files, at most five of them; stored names come back
/// with any error so the caller can clean up.
async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<ListingForm, (ApiError, Vec<String>)> {
    let mut input = CreateListingInput::default();
    let mut images: Vec<String> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => {
                return Err((
                    ApiError::Validation("Invalid payload format".to_string()),
                    images,
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
            if name != "images" || images.len() >= MAX_LISTING_IMAGES {
                return Err((
                    ApiError::Validation("A maximum of 5 images can be uploaded.".to_string()),
                    images,
                ));
            }
            let original = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return Err((
                        ApiError::Validation("Invalid payload format".to_string()),
                        images,
                    ))
                }
            };
            let stored = match state
                .artifacts()
                .store(LISTING_FOLDER, &name, &original, content_type.as_deref(), &bytes)
                .await
            {
                Ok(stored) => stored,
                Err(err) => return Err((err, images)),
            };
            images.push(stored);
        } else {
            let text = match field.text().await {
                Ok(text) => text,
                Err(_) => {
                    return Err((
                        ApiError::Validation("Invalid payload format".to_string()),
                        images,
                    ))
                }
            };
            apply_text_field(&mut input, &name, text);
        }
    }

    Ok(ListingForm { input, images })
}

async fn discard_all(state: &AppState, names: &[String]) {
    for name in names {
        state.artifacts().discard(LISTING_FOLDER, name).await;
    }
}

#[utoipa::path(
    post,
    path = "/api/lands",
    responses(
        (status = 201, description = "Listing stored", body = CreateLandResponse),
        (status = 400, description = "Validation failure", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller may not post listings", body = ErrorBody)
    ),
    tag = "lands"
)]
pub async fn create_land(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateLandResponse>), ApiError> {
    // Reject before touching the body, like the role gate ahead of the
    // upload handler.
    require_role(&claims, &["landlord", "agent"])?;

    let form = match read_form(&state, &mut multipart).await {
        Ok(form) => form,
        Err((err, stored)) => {
            discard_all(&state, &stored).await;
            return Err(err);
        }
    };

    let land = match state
        .listings()
        .create(claims.sub, &claims.role, form.input, form.images.clone())
        .await
    {
        Ok(land) => land,
        Err(err) => {
            discard_all(&state, &form.images).await;
            return Err(err);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateLandResponse {
            status: "success",
            land_id: land.land_id,
            message: "Land information has been saved successfully.",
        }),
    ))
}

#[derive(Serialize, ToSchema)]
pub struct ContactResponse {
    pub seller_name: String,
    pub agency: String,
    pub phone: String,
    pub line_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentResponse {
    pub doc_type: String,
    pub file: String,
    pub is_locked: bool,
}

#[derive(Serialize, ToSchema)]
pub struct LandDetailResponse {
    pub land_id: i64,
    pub price_total: f64,
    pub price_per_sqwa: f64,
    pub area_sqwa: f64,
    pub rai: i32,
    pub ngan: i32,
    pub wa: f64,
    pub view_count: i64,
    pub images: Vec<String>,
    pub contact: ContactResponse,
    pub documents: Vec<DocumentResponse>,
    pub unlocked_list: Vec<String>,
}

impl From<LandDetail> for LandDetailResponse {
    fn from(detail: LandDetail) -> Self {
        Self {
            land_id: detail.land_id,
            price_total: detail.price_total,
            price_per_sqwa: detail.price_per_sqwa,
            area_sqwa: detail.area_sqwa,
            rai: detail.rai,
            ngan: detail.ngan,
            wa: detail.wa,
            view_count: detail.view_count,
            images: detail.images,
            contact: ContactResponse {
                seller_name: detail.contact.seller_name,
                agency: detail.contact.agency,
                phone: detail.contact.phone,
                line_id: detail.contact.line_id,
            },
            documents: detail
                .documents
                .into_iter()
                .map(|doc| DocumentResponse {
                    doc_type: doc.doc_type,
                    file: doc.file,
                    is_locked: doc.is_locked,
                })
                .collect(),
            unlocked_list: detail.unlocked_list,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/lands/{id}",
    params(("id" = i64, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing rendered for the caller", body = LandDetailResponse),
        (status = 404, description = "No such listing", body = ErrorBody)
    ),
    tag = "lands"
)]
pub async fn land_detail(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(claims): MaybeAuthUser,
    Path(land_id): Path<i64>,
) -> Result<Json<LandDetailResponse>, ApiError> {
    let viewer = claims.map(|claims| claims.sub);
    let detail = state.listings().detail(viewer, land_id).await?;
    Ok(Json(LandDetailResponse::from(detail)))
}

#[derive(Deserialize, ToSchema)]
pub struct UnlockRequest {
    pub land_id: Option<i64>,
    pub items: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct UnlockResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[utoipa::path(
    post,
    path = "/api/lands/unlock",
    request_body = UnlockRequest,
    responses(
        (status = 201, description = "Categories granted", body = UnlockResponse),
        (status = 400, description = "Nothing selected or unknown item", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such listing", body = ErrorBody)
    ),
    tag = "lands"
)]
pub async fn unlock(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(request): Json<UnlockRequest>,
) -> Result<(StatusCode, Json<UnlockResponse>), ApiError> {
    state
        .listings()
        .unlock(claims.sub, request.land_id, request.items)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(UnlockResponse {
            status: "success",
            message: "Transaction processed successfully.",
        }),
    ))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/lands", post(create_land))
        .route("/api/lands/unlock", post(unlock))
        .route("/api/lands/:id", get(land_detail))
        .layer(DefaultBodyLimit::max(LISTING_BODY_LIMIT))
        .with_state(state)
}
