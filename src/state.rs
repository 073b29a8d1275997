use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{JwtKeys, PasswordCodec};
use crate::config::AppConfig;
use crate::store::{MemoryStore, OrganizationStore, PgStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub organizations: Arc<dyn OrganizationStore>,
    pub jwt: JwtKeys,
    pub passwords: PasswordCodec,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        if config.uses_default_secret() {
            warn!("JWT_SECRET is not set; using the insecure development default");
        }

        let (users, organizations): (Arc<dyn UserStore>, Arc<dyn OrganizationStore>) =
            if config.database_url == "memory" {
                warn!("DATABASE_URL=memory; records are lost on restart");
                let store = Arc::new(MemoryStore::new());
                let users: Arc<dyn UserStore> = store.clone();
                let organizations: Arc<dyn OrganizationStore> = store;
                (users, organizations)
            } else {
                let store =
                    PgStore::connect(&config.database_url, config.database_max_connections).await?;
                store.migrate().await?;
                let store = Arc::new(store);
                let users: Arc<dyn UserStore> = store.clone();
                let organizations: Arc<dyn OrganizationStore> = store;
                (users, organizations)
            };
        info!(port = config.port, "application state ready");

        Self::from_parts(Arc::new(config), users, organizations)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        organizations: Arc<dyn OrganizationStore>,
    ) -> anyhow::Result<Self> {
        let jwt = JwtKeys::new(&config.jwt);
        let passwords = PasswordCodec::new(&config.password)?;
        Ok(Self {
            config,
            users,
            organizations,
            jwt,
            passwords,
        })
    }

    /// In-memory state with cheap hashing parameters for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        let mut config = AppConfig::from_lookup(|_| None);
        config.jwt.secret = "test".into();
        config.jwt.issuer = "test-issuer".into();
        config.jwt.audience = "test-aud".into();
        config.password = crate::config::PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(Arc::new(config), store.clone(), store).expect("fake state")
    }
}
