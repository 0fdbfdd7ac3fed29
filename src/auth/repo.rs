use serde_json::json;

use crate::auth::dto::UpdateUserParams;
use crate::auth::repo_types::UserDocument;
use crate::backend::{decode_document, Query};
use crate::error::BackendError;
use crate::state::AppState;

impl UserDocument {
    /// Find the profile owned by an account. First match wins.
    pub async fn find_by_account_id(
        st: &AppState,
        account_id: &str,
    ) -> Result<Option<UserDocument>, BackendError> {
        let cfg = &st.config.appwrite;
        let list = st
            .backend
            .list_documents(
                &cfg.database_id,
                &cfg.user_collection_id,
                &[Query::equal("accountId", account_id)],
            )
            .await?;
        list.documents
            .into_iter()
            .next()
            .map(decode_document)
            .transpose()
    }

    /// Create the profile document for a freshly registered account.
    pub async fn create(
        st: &AppState,
        document_id: &str,
        account_id: &str,
        email: &str,
        name: &str,
        avatar: &str,
    ) -> Result<UserDocument, BackendError> {
        let cfg = &st.config.appwrite;
        let doc = st
            .backend
            .create_document(
                &cfg.database_id,
                &cfg.user_collection_id,
                document_id,
                json!({
                    "email": email,
                    "name": name,
                    "accountId": account_id,
                    "avatar": avatar,
                }),
            )
            .await?;
        decode_document(doc)
    }

    /// Overwrite the editable fields of a profile.
    pub async fn update(
        st: &AppState,
        document_id: &str,
        changes: &UpdateUserParams,
    ) -> Result<UserDocument, BackendError> {
        let cfg = &st.config.appwrite;
        let doc = st
            .backend
            .update_document(
                &cfg.database_id,
                &cfg.user_collection_id,
                document_id,
                json!({ "name": changes.name, "email": changes.email }),
            )
            .await?;
        decode_document(doc)
    }
}
