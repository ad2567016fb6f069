use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::service::{
    accounts::AccountsService, artifacts::ArtifactStore, auth::AuthService, config::ConfigService,
    listings::ListingsService, registration::RegistrationService, reset::ResetService,
    token::TokenService,
};

pub trait DatabaseClient: Send + Sync {
    fn conn(&self) -> &DatabaseConnection;
}

pub struct SeaOrmDatabaseClient {
    conn: DatabaseConnection,
}

impl SeaOrmDatabaseClient {
    pub async fn new(pool_size: u32) -> Self {
        let conn = crate::db::connect(pool_size)
            .await
            .expect("database connection failed");
        crate::schema::apply(&conn)
            .await
            .expect("schema apply failed");
        Self { conn }
    }
}

impl DatabaseClient for SeaOrmDatabaseClient {
    fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }
}

pub struct AppState {
    config: Arc<dyn ConfigService>,
    tokens: Arc<dyn TokenService>,
    artifacts: Arc<dyn ArtifactStore>,
    auth: Arc<dyn AuthService>,
    registration: Arc<dyn RegistrationService>,
    reset: Arc<dyn ResetService>,
    accounts: Arc<dyn AccountsService>,
    listings: Arc<dyn ListingsService>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config: Arc<dyn ConfigService> =
            Arc::new(crate::service::config::ConfigServiceImpl::new());
        let db: Arc<dyn DatabaseClient> =
            Arc::new(SeaOrmDatabaseClient::new(config.values().db_pool_size).await);

        let accounts_repo = Arc::new(crate::repo::accounts::SeaOrmAccountsRepo::new(db.clone()));
        let roles_repo = Arc::new(crate::repo::roles::SeaOrmRolesRepo::new(db.clone()));
        let lands_repo = Arc::new(crate::repo::lands::SeaOrmLandsRepo::new(db.clone()));
        let unlocks_repo = Arc::new(crate::repo::unlocks::SeaOrmUnlocksRepo::new(db.clone()));

        let tokens: Arc<dyn TokenService> = Arc::new(crate::service::token::JwtTokenService::new(
            &config.values().jwt_secret,
            config.values().token_ttl_seconds,
        ));
        let artifacts: Arc<dyn ArtifactStore> = Arc::new(
            crate::service::artifacts::DiskArtifactStore::new(config.values().upload_dir.clone()),
        );

        let auth: Arc<dyn AuthService> = Arc::new(crate::service::auth::AuthServiceImpl::new(
            db.clone(),
            accounts_repo.clone(),
            roles_repo.clone(),
            tokens.clone(),
        ));
        let registration: Arc<dyn RegistrationService> = Arc::new(
            crate::service::registration::RegistrationServiceImpl::new(
                db.clone(),
                accounts_repo.clone(),
                roles_repo.clone(),
                artifacts.clone(),
            ),
        );
        let reset: Arc<dyn ResetService> = Arc::new(crate::service::reset::ResetServiceImpl::new(
            db.clone(),
            accounts_repo.clone(),
            config.clone(),
        ));
        let accounts: Arc<dyn AccountsService> =
            Arc::new(crate::service::accounts::AccountsServiceImpl::new(
                db.clone(),
                accounts_repo.clone(),
                roles_repo.clone(),
            ));
        let listings: Arc<dyn ListingsService> =
            Arc::new(crate::service::listings::ListingsServiceImpl::new(
                db.clone(),
                lands_repo.clone(),
                unlocks_repo.clone(),
            ));

        Arc::new(Self {
            config,
            tokens,
            artifacts,
            auth,
            registration,
            reset,
            accounts,
            listings,
        })
    }

    pub fn config(&self) -> &dyn ConfigService {
        self.config.as_ref()
    }

    pub fn tokens(&self) -> &dyn TokenService {
        self.tokens.as_ref()
    }

    pub fn artifacts(&self) -> &dyn ArtifactStore {
        self.artifacts.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthService {
        self.auth.as_ref()
    }

    pub fn registration(&self) -> &dyn RegistrationService {
        self.registration.as_ref()
    }

    pub fn reset(&self) -> &dyn ResetService {
        self.reset.as_ref()
    }

    pub fn accounts(&self) -> &dyn AccountsService {
        self.accounts.as_ref()
    }

    pub fn listings(&self) -> &dyn ListingsService {
        self.listings.as_ref()
    }
}
