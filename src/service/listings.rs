use async_trait::async_trait;
use sea_orm::{Set, TransactionTrait};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    entities::{
        land_documents::{self, LandDocKind},
        land_images,
        land_unlocks::{self, UnlockCategory},
        lands,
    },
    error::ApiError,
    repo::{lands::LandsRepo, unlocks::UnlocksRepo},
    service::validate::is_mobile_phone,
    state::DatabaseClient,
};

/// Placeholder shown for every field the viewer has not paid for.
pub const MASKED: &str = "-----";
/// Shown for a missing agency once the owner fields are unlocked.
const PRIVATE_AGENCY: &str = "Private";
/// Allowed drift between price_total and area * price_per_sqwa.
const PRICE_TOLERANCE: f64 = 5.0;
pub const MAX_LISTING_IMAGES: usize = 5;

/// Listing fields as multipart text parts. Numeric fields arrive as strings
/// and parse leniently: absent or unparseable values count as zero and fall
/// to the range checks.
#[derive(Debug, Default, Clone)]
pub struct CreateListingInput {
    pub seller_name: Option<String>,
    pub agency_name: Option<String>,
    pub phone: Option<String>,
    pub line_id: Option<String>,
    pub doc_detail: Option<String>,
    /// Optional JSON array of extra typed documents beyond the deed.
    pub documents: Option<String>,
    pub rai: Option<String>,
    pub ngan: Option<String>,
    pub wa: Option<String>,
    pub frontage_width: Option<String>,
    pub price_per_sqwa: Option<String>,
    pub price_total: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentSpec {
    doc_type: String,
    file: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactView {
    pub seller_name: String,
    pub agency: String,
    pub phone: String,
    pub line_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentView {
    pub doc_type: String,
    pub file: String,
    pub is_locked: bool,
}

/// Viewer-specific rendering of one listing. Every unpaid field carries the
/// mask, never the stored value, so serializing this struct cannot leak.
#[derive(Debug, Clone, PartialEq)]
pub struct LandDetail {
    pub land_id: i64,
    pub price_total: f64,
    pub price_per_sqwa: f64,
    pub area_sqwa: f64,
    pub rai: i32,
    pub ngan: i32,
    pub wa: f64,
    pub view_count: i64,
    pub images: Vec<String>,
    pub contact: ContactView,
    pub documents: Vec<DocumentView>,
    pub unlocked_list: Vec<String>,
}

#[async_trait]
pub trait ListingsService: Send + Sync {
    /// Validate and persist a listing with its images and deed reference in
    /// one transaction. Contact columns are snapshotted onto the listing.
    async fn create(
        &self,
        seller_id: i64,
        role_name: &str,
        input: CreateListingInput,
        image_names: Vec<String>,
    ) -> Result<lands::Model, ApiError>;
    /// Render a listing for `viewer`, masking per their entitlements, and
    /// bump the view counter. The returned count already includes this view.
    async fn detail(&self, viewer: Option<i64>, land_id: i64) -> Result<LandDetail, ApiError>;
    /// Grant the given categories. Already-held categories are no-ops.
    async fn unlock(
        &self,
        account_id: i64,
        land_id: Option<i64>,
        items: Option<Vec<String>>,
    ) -> Result<(), ApiError>;
}

pub struct ListingsServiceImpl {
    db: Arc<dyn DatabaseClient>,
    lands_repo: Arc<dyn LandsRepo>,
    unlocks_repo: Arc<dyn UnlocksRepo>,
}

impl ListingsServiceImpl {
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        lands_repo: Arc<dyn LandsRepo>,
        unlocks_repo: Arc<dyn UnlocksRepo>,
    ) -> Self {
        Self {
            db,
            lands_repo,
            unlocks_repo,
        }
    }
}

fn parse_or_zero_i32(raw: Option<&str>) -> i32 {
    raw.map(str::trim).and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn parse_or_zero_f64(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0)
}

/// The deed from `doc_detail` plus any extra typed documents from the
/// optional JSON list. Every stored kind can be created this way, so the
/// boundary and survey-map unlock paths are reachable.
fn parse_document_specs(
    doc_detail: &str,
    raw: Option<&str>,
) -> Result<Vec<(LandDocKind, String)>, ApiError> {
    let mut documents = vec![(LandDocKind::Deed, doc_detail.to_string())];

    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(documents);
    };
    let specs: Vec<DocumentSpec> = serde_json::from_str(raw)
        .map_err(|_| ApiError::Validation("Invalid document list format.".to_string()))?;
    for spec in specs {
        let kind = LandDocKind::parse(spec.doc_type.trim())
            .ok_or_else(|| ApiError::Validation("Invalid document type.".to_string()))?;
        let file = spec.file.trim();
        if file.is_empty() {
            return Err(ApiError::Validation(
                "Invalid document list format.".to_string(),
            ));
        }
        documents.push((kind, file.to_string()));
    }
    Ok(documents)
}

#[async_trait]
impl ListingsService for ListingsServiceImpl {
    async fn create(
        &self,
        seller_id: i64,
        role_name: &str,
        input: CreateListingInput,
        image_names: Vec<String>,
    ) -> Result<lands::Model, ApiError> {
        if role_name != "landlord" && role_name != "agent" {
            return Err(ApiError::Forbidden(
                "Permission denied. Only landlords or agents can post land listings.".to_string(),
            ));
        }

        let seller_name = input.seller_name.as_deref().unwrap_or_default().trim();
        let agency_name = input.agency_name.as_deref().unwrap_or_default().trim();
        let phone = input.phone.as_deref().unwrap_or_default().trim();
        let line_id = input.line_id.as_deref().unwrap_or_default().trim();
        let doc_detail = input.doc_detail.as_deref().unwrap_or_default().trim();

        if !is_mobile_phone(phone) {
            return Err(ApiError::Validation(
                "Invalid phone number format. Must be 10 digits starting with 0.".to_string(),
            ));
        }
        if seller_name.is_empty() || line_id.is_empty() || doc_detail.is_empty() {
            return Err(ApiError::Validation(
                "Contact information and document details are required.".to_string(),
            ));
        }

        let rai = parse_or_zero_i32(input.rai.as_deref());
        let ngan = parse_or_zero_i32(input.ngan.as_deref());
        let wa = parse_or_zero_f64(input.wa.as_deref());
        let frontage_width = parse_or_zero_f64(input.frontage_width.as_deref());
        let price_per_sqwa = parse_or_zero_f64(input.price_per_sqwa.as_deref());
        let price_total = parse_or_zero_f64(input.price_total.as_deref());

        if rai < 0 || ngan < 0 || wa < 0.0 {
            return Err(ApiError::Validation("Invalid land size values.".to_string()));
        }
        if frontage_width <= 0.0 || price_per_sqwa <= 0.0 || price_total <= 0.0 {
            return Err(ApiError::Validation(
                "Price and frontage width must be greater than 0.".to_string(),
            ));
        }

        let area_sqwa = f64::from(rai) * 400.0 + f64::from(ngan) * 100.0 + wa;
        if area_sqwa <= 0.0 {
            return Err(ApiError::Validation(
                "Total area size must be greater than 0 Sq. Wa.".to_string(),
            ));
        }

        let expected_total = area_sqwa * price_per_sqwa;
        if (expected_total - price_total).abs() > PRICE_TOLERANCE {
            return Err(ApiError::Validation(
                "Total price does not match the price per Sq. Wa calculation.".to_string(),
            ));
        }

        if image_names.is_empty() {
            return Err(ApiError::Validation(
                "At least one land image is required.".to_string(),
            ));
        }
        let mut image_names = image_names;
        image_names.truncate(MAX_LISTING_IMAGES);

        let documents = parse_document_specs(doc_detail, input.documents.as_deref())?;

        let model = lands::ActiveModel {
            seller_id: Set(seller_id),
            rai: Set(rai),
            ngan: Set(ngan),
            wa: Set(wa),
            area_sqwa: Set(area_sqwa),
            frontage_width: Set(frontage_width),
            price_per_sqwa: Set(price_per_sqwa),
            price_total: Set(price_total),
            seller_name: Set(seller_name.to_string()),
            agency_name: Set((!agency_name.is_empty()).then(|| agency_name.to_string())),
            phone: Set(phone.to_string()),
            line_id: Set(line_id.to_string()),
            ..Default::default()
        };

        let lands_repo = self.lands_repo.clone();

        let created = self
            .db
            .conn()
            .transaction(|txn| {
                let lands_repo = lands_repo.clone();
                let model = model.clone();
                let image_names = image_names.clone();
                let documents = documents.clone();
                Box::pin(async move {
                    let created = lands_repo.insert_with_txn(txn, model).await?;

                    let images = image_names
                        .into_iter()
                        .map(|name| land_images::ActiveModel {
                            land_id: Set(created.land_id),
                            image: Set(name),
                            ..Default::default()
                        })
                        .collect();
                    lands_repo.insert_images_with_txn(txn, images).await?;

                    let documents = documents
                        .into_iter()
                        .map(|(kind, file)| land_documents::ActiveModel {
                            land_id: Set(created.land_id),
                            kind: Set(kind),
                            file: Set(file),
                            ..Default::default()
                        })
                        .collect();
                    lands_repo.insert_documents_with_txn(txn, documents).await?;

                    Ok::<_, ApiError>(created)
                })
            })
            .await
            .map_err(ApiError::from)?;

        Ok(created)
    }

    async fn detail(&self, viewer: Option<i64>, land_id: i64) -> Result<LandDetail, ApiError> {
        let land = self
            .lands_repo
            .find_by_id(land_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Land information not found.".to_string()))?;

        let images = self.lands_repo.images_for(land_id).await?;
        let documents = self.lands_repo.documents_for(land_id).await?;
        let unlocked = match viewer {
            Some(account_id) => self.unlocks_repo.categories_for(account_id, land_id).await?,
            None => Vec::new(),
        };

        let detail = masked_detail(&land, &images, &documents, &unlocked);

        // Bump after the read; the response already counts this view.
        self.lands_repo.increment_view_count(land_id).await?;

        Ok(detail)
    }

    async fn unlock(
        &self,
        account_id: i64,
        land_id: Option<i64>,
        items: Option<Vec<String>>,
    ) -> Result<(), ApiError> {
        let Some(land_id) = land_id else {
            return Err(ApiError::Validation(
                "Please select items to unlock.".to_string(),
            ));
        };
        let items = items.unwrap_or_default();
        if items.is_empty() {
            return Err(ApiError::Validation(
                "Please select items to unlock.".to_string(),
            ));
        }

        let mut categories = Vec::new();
        let mut seen = HashSet::new();
        for item in &items {
            let category = UnlockCategory::parse(item.trim())
                .ok_or_else(|| ApiError::Validation("Invalid unlock item.".to_string()))?;
            if seen.insert(category) {
                categories.push(category);
            }
        }

        if self.lands_repo.find_by_id(land_id).await?.is_none() {
            return Err(ApiError::NotFound(
                "Land information not found.".to_string(),
            ));
        }

        let unlocks_repo = self.unlocks_repo.clone();
        self.db
            .conn()
            .transaction(|txn| {
                let unlocks_repo = unlocks_repo.clone();
                let categories = categories.clone();
                Box::pin(async move {
                    let models = categories
                        .into_iter()
                        .map(|category| land_unlocks::ActiveModel {
                            account_id: Set(account_id),
                            land_id: Set(land_id),
                            unlock_type: Set(category),
                            ..Default::default()
                        })
                        .collect();
                    unlocks_repo.grant_many_with_txn(txn, models).await?;
                    Ok::<_, ApiError>(())
                })
            })
            .await
            .map_err(ApiError::from)?;

        Ok(())
    }
}

/// Render `land` for a viewer holding `unlocked`. Owner covers the seller
/// identity, contact the phone and LINE id, boundary the boundary plans,
/// document the deeds and survey maps. Everything else masks.
fn masked_detail(
    land: &lands::Model,
    images: &[land_images::Model],
    documents: &[land_documents::Model],
    unlocked: &[UnlockCategory],
) -> LandDetail {
    let granted: HashSet<UnlockCategory> = unlocked.iter().copied().collect();
    let owner = granted.contains(&UnlockCategory::Owner);
    let contact = granted.contains(&UnlockCategory::Contact);

    let documents = documents
        .iter()
        .map(|doc| {
            let category = match doc.kind {
                LandDocKind::BoundaryPlan => UnlockCategory::Boundary,
                LandDocKind::Deed | LandDocKind::SurveyMap => UnlockCategory::Document,
            };
            let is_locked = !granted.contains(&category);
            DocumentView {
                doc_type: doc.kind.as_str().to_string(),
                file: if is_locked {
                    MASKED.to_string()
                } else {
                    doc.file.clone()
                },
                is_locked,
            }
        })
        .collect();

    LandDetail {
        land_id: land.land_id,
        price_total: land.price_total,
        price_per_sqwa: land.price_per_sqwa,
        area_sqwa: land.area_sqwa,
        rai: land.rai,
        ngan: land.ngan,
        wa: land.wa,
        view_count: land.view_count + 1,
        images: images.iter().map(|img| img.image.clone()).collect(),
        contact: ContactView {
            seller_name: if owner {
                land.seller_name.clone()
            } else {
                MASKED.to_string()
            },
            agency: if owner {
                land.agency_name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| PRIVATE_AGENCY.to_string())
            } else {
                MASKED.to_string()
            },
            phone: if contact {
                land.phone.clone()
            } else {
                MASKED.to_string()
            },
            line_id: if contact {
                land.line_id.clone()
            } else {
                MASKED.to_string()
            },
        },
        documents,
        unlocked_list: unlocked
            .iter()
            .map(|category| category.as_str().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn land_fixture() -> lands::Model {
        lands::Model {
            land_id: 7,
            seller_id: 3,
            rai: 2,
            ngan: 1,
            wa: 25.0,
            area_sqwa: 925.0,
            frontage_width: 18.0,
            price_per_sqwa: 12_000.0,
            price_total: 11_100_000.0,
            seller_name: "Somsri Landlady".to_string(),
            agency_name: None,
            phone: "0899990000".to_string(),
            line_id: "somsri_land".to_string(),
            view_count: 41,
            status: "broadcast".to_string(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn doc(kind: LandDocKind, file: &str) -> land_documents::Model {
        land_documents::Model {
            document_id: 0,
            land_id: 7,
            kind,
            file: file.to_string(),
        }
    }

    fn img(name: &str) -> land_images::Model {
        land_images::Model {
            image_id: 0,
            land_id: 7,
            image: name.to_string(),
        }
    }

    #[test]
    fn anonymous_view_masks_everything() {
        let land = land_fixture();
        let images = vec![img("images-a.jpg"), img("images-b.jpg")];
        let documents = vec![
            doc(LandDocKind::Deed, "CN-1234"),
            doc(LandDocKind::BoundaryPlan, "plan.pdf"),
        ];

        let view = masked_detail(&land, &images, &documents, &[]);

        assert_eq!(view.view_count, 42);
        assert_eq!(view.images, vec!["images-a.jpg", "images-b.jpg"]);
        assert_eq!(view.contact.seller_name, MASKED);
        assert_eq!(view.contact.agency, MASKED);
        assert_eq!(view.contact.phone, MASKED);
        assert_eq!(view.contact.line_id, MASKED);
        assert!(view
            .documents
            .iter()
            .all(|d| d.is_locked && d.file == MASKED));
        assert!(view.unlocked_list.is_empty());
    }

    #[test]
    fn owner_and_document_grants_unmask_their_fields() {
        let land = land_fixture();
        let documents = vec![
            doc(LandDocKind::Deed, "CN-1234"),
            doc(LandDocKind::SurveyMap, "sheet-5136-II"),
            doc(LandDocKind::BoundaryPlan, "plan.pdf"),
        ];

        let view = masked_detail(
            &land,
            &[],
            &documents,
            &[UnlockCategory::Owner, UnlockCategory::Document],
        );

        assert_eq!(view.contact.seller_name, "Somsri Landlady");
        // No agency on record reads as a private seller once unlocked.
        assert_eq!(view.contact.agency, "Private");
        assert_eq!(view.contact.phone, MASKED);

        assert!(!view.documents[0].is_locked);
        assert_eq!(view.documents[0].file, "CN-1234");
        assert!(!view.documents[1].is_locked);
        assert_eq!(view.documents[1].file, "sheet-5136-II");
        assert!(view.documents[2].is_locked);
        assert_eq!(view.documents[2].file, MASKED);

        assert_eq!(view.unlocked_list, vec!["owner", "document"]);
    }

    #[test]
    fn contact_grant_reveals_phone_and_line_only() {
        let view = masked_detail(&land_fixture(), &[], &[], &[UnlockCategory::Contact]);
        assert_eq!(view.contact.phone, "0899990000");
        assert_eq!(view.contact.line_id, "somsri_land");
        assert_eq!(view.contact.seller_name, MASKED);
        assert_eq!(view.contact.agency, MASKED);
    }

    #[test]
    fn named_agency_survives_owner_unlock() {
        let mut land = land_fixture();
        land.agency_name = Some("Good Land Co".to_string());
        let view = masked_detail(&land, &[], &[], &[UnlockCategory::Owner]);
        assert_eq!(view.contact.agency, "Good Land Co");
    }

    #[test]
    fn lenient_numeric_parsing_defaults_to_zero() {
        assert_eq!(parse_or_zero_i32(Some(" 3 ")), 3);
        assert_eq!(parse_or_zero_i32(Some("abc")), 0);
        assert_eq!(parse_or_zero_i32(None), 0);
        assert_eq!(parse_or_zero_f64(Some("12.5")), 12.5);
        assert_eq!(parse_or_zero_f64(Some("")), 0.0);
    }

    #[test]
    fn document_list_extends_the_deed() {
        let raw = r#"[
            {"doc_type": "boundary-plan", "file": "plan.pdf"},
            {"doc_type": "survey-map", "file": "sheet-5136-II"}
        ]"#;
        let documents = parse_document_specs("CN-1234", Some(raw)).unwrap();
        assert_eq!(
            documents,
            vec![
                (LandDocKind::Deed, "CN-1234".to_string()),
                (LandDocKind::BoundaryPlan, "plan.pdf".to_string()),
                (LandDocKind::SurveyMap, "sheet-5136-II".to_string()),
            ]
        );
    }

    #[test]
    fn absent_document_list_leaves_only_the_deed() {
        let documents = parse_document_specs("CN-1234", None).unwrap();
        assert_eq!(documents, vec![(LandDocKind::Deed, "CN-1234".to_string())]);
        let documents = parse_document_specs("CN-1234", Some("  ")).unwrap();
        assert_eq!(documents.len(), 1);
    }

    #[test]
    fn document_list_rejects_unknown_kinds_and_bad_json() {
        let err = parse_document_specs("CN-1", Some(r#"[{"doc_type": "title", "file": "x"}]"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid document type.");

        let err = parse_document_specs("CN-1", Some("not-json")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid document list format.");

        let err = parse_document_specs("CN-1", Some(r#"[{"doc_type": "deed", "file": " "}]"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid document list format.");
    }

    use crate::repo::{accounts::AccountsRepo, roles::RolesRepo};
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    struct TestDatabaseClient {
        conn: sea_orm::DatabaseConnection,
    }

    impl DatabaseClient for TestDatabaseClient {
        fn conn(&self) -> &sea_orm::DatabaseConnection {
            &self.conn
        }
    }

    #[tokio::test]
    #[ignore]
    async fn repeated_grants_stay_single_rows() -> Result<(), Box<dyn std::error::Error>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return Ok(());
        };
        let conn = sea_orm::Database::connect(&url).await?;
        crate::schema::apply(&conn).await?;

        let client: Arc<dyn DatabaseClient> = Arc::new(TestDatabaseClient { conn });
        let accounts_repo = crate::repo::accounts::SeaOrmAccountsRepo::new(client.clone());
        let roles_repo = crate::repo::roles::SeaOrmRolesRepo::new(client.clone());
        let lands_repo = crate::repo::lands::SeaOrmLandsRepo::new(client.clone());
        let unlocks_repo = crate::repo::unlocks::SeaOrmUnlocksRepo::new(client.clone());

        let txn = client.conn().begin().await?;
        let role = roles_repo
            .find_by_name_with_txn(&txn, "buyer")
            .await?
            .ok_or("buyer role missing")?;

        let buyer = accounts_repo
            .insert_with_txn(
                &txn,
                crate::entities::accounts::ActiveModel {
                    kind: Set(crate::entities::accounts::AccountKind::User),
                    role_id: Set(role.role_id),
                    email: Set("grant-test@example.com".to_string()),
                    password_hash: Set("not-a-real-hash".to_string()),
                    two_factor_enabled: Set(false),
                    ..Default::default()
                },
            )
            .await?;

        let land = lands_repo
            .insert_with_txn(
                &txn,
                lands::ActiveModel {
                    seller_id: Set(buyer.account_id),
                    rai: Set(1),
                    ngan: Set(0),
                    wa: Set(0.0),
                    area_sqwa: Set(400.0),
                    frontage_width: Set(20.0),
                    price_per_sqwa: Set(1000.0),
                    price_total: Set(400_000.0),
                    seller_name: Set("Seller".to_string()),
                    agency_name: Set(None),
                    phone: Set("0812345678".to_string()),
                    line_id: Set("seller_line".to_string()),
                    ..Default::default()
                },
            )
            .await?;

        let grant = |category| land_unlocks::ActiveModel {
            account_id: Set(buyer.account_id),
            land_id: Set(land.land_id),
            unlock_type: Set(category),
            ..Default::default()
        };

        unlocks_repo
            .grant_many_with_txn(
                &txn,
                vec![grant(UnlockCategory::Owner), grant(UnlockCategory::Contact)],
            )
            .await?;
        unlocks_repo
            .grant_many_with_txn(
                &txn,
                vec![grant(UnlockCategory::Owner), grant(UnlockCategory::Contact)],
            )
            .await?;
        unlocks_repo
            .grant_many_with_txn(&txn, vec![grant(UnlockCategory::Owner)])
            .await?;

        let rows = land_unlocks::Entity::find()
            .filter(land_unlocks::Column::AccountId.eq(buyer.account_id))
            .filter(land_unlocks::Column::LandId.eq(land.land_id))
            .all(&txn)
            .await?;
        assert_eq!(rows.len(), 2);

        txn.rollback().await?;
        Ok(())
    }
}
