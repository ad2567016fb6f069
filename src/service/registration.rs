use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, Set, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    entities::accounts::{self, AccountKind},
    error::ApiError,
    repo::{accounts::AccountsRepo, roles::RolesRepo},
    service::{
        artifacts::ArtifactStore,
        password::hash_password,
        validate::{
            is_exact_digits, is_person_name, is_valid_email, normalize_email,
            validate_password_strength,
        },
    },
    state::DatabaseClient,
};

/// Signup fields as they arrive on the wire, either as individual multipart
/// text parts or inside an embedded JSON `payload` part.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SignupPayload {
    /// Applicant intent: `investor`, `seller`, or anything else for buyer.
    #[serde(rename = "type")]
    pub intent: Option<String>,
    /// Seller sub-selection; `agent` upgrades a seller to the agent role.
    pub role: Option<String>,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub id_number: Option<String>,
    pub number_license: Option<String>,
    pub agency_name: Option<String>,
    pub line_id: Option<String>,
}

/// Stored filenames of the uploaded verification images.
#[derive(Debug, Default, Clone)]
pub struct SignupArtifacts {
    pub id_front: Option<String>,
    pub id_back: Option<String>,
    pub selfie: Option<String>,
    pub license_image: Option<String>,
}

impl SignupArtifacts {
    pub fn all_names(&self) -> Vec<String> {
        [
            self.id_front.as_ref(),
            self.id_back.as_ref(),
            self.selfie.as_ref(),
            self.license_image.as_ref(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

pub fn derive_role(intent: Option<&str>, sub_role: Option<&str>) -> &'static str {
    match intent {
        Some("investor") => "investor",
        Some("seller") => {
            if sub_role == Some("agent") {
                "agent"
            } else {
                "landlord"
            }
        }
        _ => "buyer",
    }
}

#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Validate and commit one signup. The duplicate check and the insert
    /// share a transaction with a row-locking read, so two concurrent
    /// signups on the same email or citizen id cannot both pass.
    async fn signup(
        &self,
        payload: SignupPayload,
        artifacts: SignupArtifacts,
    ) -> Result<(), ApiError>;
}

pub struct RegistrationServiceImpl {
    db: Arc<dyn DatabaseClient>,
    accounts_repo: Arc<dyn AccountsRepo>,
    roles_repo: Arc<dyn RolesRepo>,
    artifacts_store: Arc<dyn ArtifactStore>,
}

impl RegistrationServiceImpl {
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        accounts_repo: Arc<dyn AccountsRepo>,
        roles_repo: Arc<dyn RolesRepo>,
        artifacts_store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            db,
            accounts_repo,
            roles_repo,
            artifacts_store,
        }
    }
}

#[async_trait]
impl RegistrationService for RegistrationServiceImpl {
    async fn signup(
        &self,
        payload: SignupPayload,
        artifacts: SignupArtifacts,
    ) -> Result<(), ApiError> {
        let clean_email = normalize_email(payload.email.as_deref().unwrap_or_default());
        let clean_phone = payload.phone.as_deref().unwrap_or_default().trim();
        let clean_id_number = payload.id_number.as_deref().unwrap_or_default().trim();
        let clean_name = payload.name.as_deref().unwrap_or_default().trim();
        let clean_lastname = payload.lastname.as_deref().unwrap_or_default().trim();
        let clean_line_id = payload.line_id.as_deref().unwrap_or_default().trim();
        let address = payload.address.as_deref().unwrap_or_default().trim();
        let password = payload.password.as_deref().unwrap_or_default();

        let required = [
            clean_name,
            clean_lastname,
            clean_phone,
            clean_email.as_str(),
            password.trim(),
            address,
            clean_id_number,
            clean_line_id,
        ];
        if required.iter().any(|field| field.is_empty()) {
            return Err(ApiError::Validation(
                "Missing required information.".to_string(),
            ));
        }

        let (Some(id_front), Some(id_back), Some(selfie)) = (
            artifacts.id_front.as_deref(),
            artifacts.id_back.as_deref(),
            artifacts.selfie.as_deref(),
        ) else {
            return Err(ApiError::Validation(
                "Missing required ID card images (front, back, or selfie).".to_string(),
            ));
        };

        if !is_valid_email(&clean_email) {
            return Err(ApiError::Validation("Invalid email format.".to_string()));
        }
        if !is_exact_digits(clean_phone, 10) {
            return Err(ApiError::Validation(
                "Phone number must be 10 digits.".to_string(),
            ));
        }
        if !is_exact_digits(clean_id_number, 13) {
            return Err(ApiError::Validation(
                "ID card number must be 13 digits.".to_string(),
            ));
        }
        validate_password_strength(password)?;
        if !is_person_name(clean_name) || !is_person_name(clean_lastname) {
            return Err(ApiError::Validation(
                "First and last names must contain only letters.".to_string(),
            ));
        }

        let role_name = derive_role(payload.intent.as_deref(), payload.role.as_deref());
        let is_agent = role_name == "agent";
        let clean_license = payload
            .number_license
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string();
        let clean_agency = payload
            .agency_name
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string();

        if is_agent
            && (clean_agency.is_empty()
                || artifacts.license_image.is_none()
                || !is_exact_digits(&clean_license, 10))
        {
            return Err(ApiError::Validation(
                "Agent requires 10-digit license number, agency name, and license image."
                    .to_string(),
            ));
        }

        // A non-agent who sent a license image anyway never gets it stored.
        if !is_agent {
            if let Some(name) = artifacts.license_image.as_deref() {
                self.artifacts_store.discard("", name).await;
            }
        }

        let password_hash = hash_password(password)?;

        let model = accounts::ActiveModel {
            kind: Set(AccountKind::User),
            email: Set(clean_email.clone()),
            password_hash: Set(password_hash),
            first_name: Set(Some(clean_name.to_string())),
            last_name: Set(Some(clean_lastname.to_string())),
            phone: Set(Some(clean_phone.to_string())),
            address: Set(Some(address.to_string())),
            citizen_id: Set(Some(clean_id_number.to_string())),
            line_id: Set(Some(clean_line_id.to_string())),
            id_card_front: Set(Some(id_front.to_string())),
            id_card_back: Set(Some(id_back.to_string())),
            selfie: Set(Some(selfie.to_string())),
            license_number: Set(is_agent.then(|| clean_license.clone())),
            license_image: Set(if is_agent {
                artifacts.license_image.clone()
            } else {
                None
            }),
            agency_name: Set(is_agent.then(|| clean_agency.clone())),
            two_factor_enabled: Set(false),
            ..Default::default()
        };

        let accounts_repo = self.accounts_repo.clone();
        let roles_repo = self.roles_repo.clone();
        let clean_id_number = clean_id_number.to_string();

        self.db
            .conn()
            .transaction(|txn| {
                let accounts_repo = accounts_repo.clone();
                let roles_repo = roles_repo.clone();
                let clean_email = clean_email.clone();
                let clean_id_number = clean_id_number.clone();
                let model = model.clone();
                Box::pin(async move {
                    signup_txn(
                        txn,
                        accounts_repo.as_ref(),
                        roles_repo.as_ref(),
                        model,
                        &clean_email,
                        &clean_id_number,
                        role_name,
                    )
                    .await
                })
            })
            .await
            .map_err(ApiError::from)?;

        Ok(())
    }
}

/// Transaction body of one signup. The duplicate read locks any matching
/// rows, so the verdict holds until this transaction resolves.
async fn signup_txn(
    txn: &DatabaseTransaction,
    accounts_repo: &dyn AccountsRepo,
    roles_repo: &dyn RolesRepo,
    mut model: accounts::ActiveModel,
    email: &str,
    citizen_id: &str,
    role_name: &str,
) -> Result<(), ApiError> {
    let existing = accounts_repo
        .find_duplicates_for_update(txn, email, citizen_id)
        .await?;

    if !existing.is_empty() {
        let email_dup = existing.iter().any(|row| row.email == email);
        let id_dup = existing
            .iter()
            .any(|row| row.citizen_id.as_deref() == Some(citizen_id));
        let message = if email_dup && id_dup {
            "Email and ID card already registered"
        } else if email_dup {
            "Email is already registered"
        } else {
            "ID card number is already registered"
        };
        return Err(ApiError::Conflict(message.to_string()));
    }

    let role = roles_repo
        .find_by_name_with_txn(txn, role_name)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("role {role_name} is not seeded")))?;
    model.role_id = Set(role.role_id);

    accounts_repo.insert_with_txn(txn, model).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_derivation_matrix() {
        assert_eq!(derive_role(Some("investor"), None), "investor");
        assert_eq!(derive_role(Some("seller"), Some("agent")), "agent");
        assert_eq!(derive_role(Some("seller"), Some("owner")), "landlord");
        assert_eq!(derive_role(Some("seller"), None), "landlord");
        assert_eq!(derive_role(Some("anything"), Some("agent")), "buyer");
        assert_eq!(derive_role(None, None), "buyer");
    }

    #[test]
    fn artifact_names_collect_only_present_files() {
        let artifacts = SignupArtifacts {
            id_front: Some("id_front-a.jpg".to_string()),
            id_back: None,
            selfie: Some("selfie-b.png".to_string()),
            license_image: None,
        };
        assert_eq!(
            artifacts.all_names(),
            vec!["id_front-a.jpg".to_string(), "selfie-b.png".to_string()]
        );
    }

    struct TestDatabaseClient {
        conn: sea_orm::DatabaseConnection,
    }

    impl DatabaseClient for TestDatabaseClient {
        fn conn(&self) -> &sea_orm::DatabaseConnection {
            &self.conn
        }
    }

    fn user_model(email: &str, citizen_id: &str) -> accounts::ActiveModel {
        accounts::ActiveModel {
            kind: Set(AccountKind::User),
            email: Set(email.to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            citizen_id: Set(Some(citizen_id.to_string())),
            two_factor_enabled: Set(false),
            ..Default::default()
        }
    }

    #[tokio::test]
    #[ignore]
    async fn duplicate_signup_is_rejected_under_lock() -> Result<(), Box<dyn std::error::Error>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return Ok(());
        };
        let conn = sea_orm::Database::connect(&url).await?;
        crate::schema::apply(&conn).await?;

        let client: Arc<dyn DatabaseClient> = Arc::new(TestDatabaseClient { conn });
        let accounts_repo = crate::repo::accounts::SeaOrmAccountsRepo::new(client.clone());
        let roles_repo = crate::repo::roles::SeaOrmRolesRepo::new(client.clone());

        let txn = client.conn().begin().await?;

        signup_txn(
            &txn,
            &accounts_repo,
            &roles_repo,
            user_model("dup-check@example.com", "1102003334445"),
            "dup-check@example.com",
            "1102003334445",
            "buyer",
        )
        .await?;

        let second = signup_txn(
            &txn,
            &accounts_repo,
            &roles_repo,
            user_model("dup-check@example.com", "9988776655443"),
            "dup-check@example.com",
            "9988776655443",
            "landlord",
        )
        .await;
        match second {
            Err(ApiError::Conflict(message)) => {
                assert_eq!(message, "Email is already registered")
            }
            other => panic!("expected a conflict, got {other:?}"),
        }

        txn.rollback().await?;
        Ok(())
    }

    #[test]
    fn payload_parses_from_embedded_json() {
        let raw = r#"{
            "type": "seller",
            "role": "agent",
            "name": "Somchai",
            "lastname": "Jaidee",
            "phone": "0812345678",
            "email": "somchai@example.com",
            "password": "Secret1",
            "address": "Bangkok",
            "id_number": "1234567890123",
            "number_license": "9876543210",
            "agency_name": "Good Land Co",
            "line_id": "somchai_j"
        }"#;
        let payload: SignupPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.intent.as_deref(), Some("seller"));
        assert_eq!(payload.role.as_deref(), Some("agent"));
        assert_eq!(payload.email.as_deref(), Some("somchai@example.com"));
    }
}
