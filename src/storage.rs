use bytes::Bytes;
use tracing::error;

use crate::config::AppwriteConfig;
use crate::error::GatewayError;
use crate::state::AppState;

/// View URL for a file in the app bucket, as the platform client builds it.
pub fn file_view_url(st: &AppState, file_id: &str) -> String {
    st.backend
        .file_view_url(&st.config.appwrite.bucket_id, file_id)
}

/// View URL built from configuration alone, without going through a backend.
pub fn construct_file_url(cfg: &AppwriteConfig, file_id: &str) -> String {
    format!(
        "{}/storage/buckets/{}/files/{}/view?project={}",
        cfg.endpoint, cfg.bucket_id, file_id, cfg.project_id
    )
}

pub async fn get_file_data(st: &AppState, file_id: &str) -> Result<Bytes, GatewayError> {
    st.backend
        .get_file_view(&st.config.appwrite.bucket_id, file_id)
        .await
        .map_err(|e| {
            error!(error = %e, file_id, "get file data failed");
            GatewayError::from(e)
        })
}
