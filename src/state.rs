use crate::backend::appwrite::AppwriteClient;
use crate::backend::fake::FakeBackend;
use crate::backend::Backend;
use crate::config::{AppConfig, AppwriteConfig, HttpConfig};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Arc<dyn Backend>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        // Real platform over HTTP
        let backend = Arc::new(AppwriteClient::new(&config.appwrite, &config.http)?)
            as Arc<dyn Backend>;

        Ok(Self { config, backend })
    }

    pub fn from_parts(config: Arc<AppConfig>, backend: Arc<dyn Backend>) -> Self {
        Self { config, backend }
    }

    /// State wired to an in-memory backend. The second value is the same
    /// backend, for seeding and failure injection.
    pub fn fake() -> (Self, Arc<FakeBackend>) {
        let config = Arc::new(AppConfig {
            appwrite: AppwriteConfig {
                endpoint: "https://fake.local/v1".into(),
                project_id: "test".into(),
                platform: "com.msufood.test".into(),
                database_id: "db".into(),
                bucket_id: "bucket".into(),
                user_collection_id: "users".into(),
                categories_collection_id: "categories".into(),
                menu_collection_id: "menu".into(),
                customizations_collection_id: "customizations".into(),
                menu_customizations_collection_id: "menu_customizations".into(),
            },
            http: HttpConfig {
                timeout_secs: 5,
                connect_timeout_secs: 5,
            },
        });

        let fake = Arc::new(FakeBackend::new(
            config.appwrite.endpoint.clone(),
            config.appwrite.project_id.clone(),
        ));
        let backend = fake.clone() as Arc<dyn Backend>;
        (Self { config, backend }, fake)
    }
}
