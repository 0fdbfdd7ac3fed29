use crate::backend::{decode_document, Query};
use crate::error::BackendError;
use crate::menu::dto::GetMenuParams;
use crate::menu::repo_types::{Category, MenuItem};
use crate::state::AppState;

impl MenuItem {
    /// List menu items, narrowed by category and/or a name search.
    pub async fn list(st: &AppState, params: &GetMenuParams) -> Result<Vec<MenuItem>, BackendError> {
        let mut queries = Vec::new();
        if let Some(category) = params.category.as_deref().filter(|c| !c.is_empty()) {
            queries.push(Query::equal("categories", category));
        }
        if let Some(query) = params.query.as_deref().filter(|q| !q.is_empty()) {
            queries.push(Query::search("name", query));
        }

        let cfg = &st.config.appwrite;
        let list = st
            .backend
            .list_documents(&cfg.database_id, &cfg.menu_collection_id, &queries)
            .await?;
        list.documents.into_iter().map(decode_document).collect()
    }
}

impl Category {
    pub async fn list_all(st: &AppState) -> Result<Vec<Category>, BackendError> {
        let cfg = &st.config.appwrite;
        let list = st
            .backend
            .list_documents(&cfg.database_id, &cfg.categories_collection_id, &[])
            .await?;
        list.documents.into_iter().map(decode_document).collect()
    }
}
