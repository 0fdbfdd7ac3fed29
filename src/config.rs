use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_PLATFORM: &str = "com.msufood.app";
pub const DEFAULT_DATABASE_ID: &str = "6885a1ec0034af2bdeee";
pub const DEFAULT_BUCKET_ID: &str = "6886088b0013adca315a";
pub const DEFAULT_USER_COLLECTION_ID: &str = "6885a2170031e3fa3276";
pub const DEFAULT_CATEGORIES_COLLECTION_ID: &str = "6885ec21003304f8e7d6";
pub const DEFAULT_MENU_COLLECTION_ID: &str = "6886045100033fff0860";
pub const DEFAULT_CUSTOMIZATIONS_COLLECTION_ID: &str = "68860550001ed82266f7";
pub const DEFAULT_MENU_CUSTOMIZATIONS_COLLECTION_ID: &str = "6886078f00014ccbe1ae";

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub platform: String,
    pub database_id: String,
    pub bucket_id: String,
    pub user_collection_id: String,
    pub categories_collection_id: String,
    pub menu_collection_id: String,
    pub customizations_collection_id: String,
    pub menu_customizations_collection_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub appwrite: AppwriteConfig,
    pub http: HttpConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    ///
    /// Only the endpoint and project id are required; every identifier has an
    /// embedded default.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = var("EXPO_PUBLIC_APPWRITE_ENDPOINT")
            .context("EXPO_PUBLIC_APPWRITE_ENDPOINT is not set")?
            .trim_end_matches('/')
            .to_string();
        let project_id =
            var("EXPO_PUBLIC_APPWRITE_PROJECT_ID").context("EXPO_PUBLIC_APPWRITE_PROJECT_ID is not set")?;
        anyhow::ensure!(!endpoint.is_empty(), "EXPO_PUBLIC_APPWRITE_ENDPOINT is empty");
        anyhow::ensure!(!project_id.is_empty(), "EXPO_PUBLIC_APPWRITE_PROJECT_ID is empty");

        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.into());
        let appwrite = AppwriteConfig {
            endpoint,
            project_id,
            platform: or("APPWRITE_PLATFORM", DEFAULT_PLATFORM),
            database_id: or("APPWRITE_DATABASE_ID", DEFAULT_DATABASE_ID),
            bucket_id: or("APPWRITE_BUCKET_ID", DEFAULT_BUCKET_ID),
            user_collection_id: or("APPWRITE_USER_COLLECTION_ID", DEFAULT_USER_COLLECTION_ID),
            categories_collection_id: or(
                "APPWRITE_CATEGORIES_COLLECTION_ID",
                DEFAULT_CATEGORIES_COLLECTION_ID,
            ),
            menu_collection_id: or("APPWRITE_MENU_COLLECTION_ID", DEFAULT_MENU_COLLECTION_ID),
            customizations_collection_id: or(
                "APPWRITE_CUSTOMIZATIONS_COLLECTION_ID",
                DEFAULT_CUSTOMIZATIONS_COLLECTION_ID,
            ),
            menu_customizations_collection_id: or(
                "APPWRITE_MENU_CUSTOMIZATIONS_COLLECTION_ID",
                DEFAULT_MENU_CUSTOMIZATIONS_COLLECTION_ID,
            ),
        };

        let http = HttpConfig {
            timeout_secs: var("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            connect_timeout_secs: var("HTTP_CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };

        Ok(Self { appwrite, http })
    }
}
