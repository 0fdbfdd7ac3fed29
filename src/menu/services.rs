use tracing::{debug, instrument};

use crate::error::GatewayError;
use crate::menu::dto::GetMenuParams;
use crate::menu::repo_types::{Category, MenuItem};
use crate::state::AppState;

#[instrument(skip(st))]
pub async fn get_menu(st: &AppState, params: GetMenuParams) -> Result<Vec<MenuItem>, GatewayError> {
    let items = MenuItem::list(st, &params).await?;
    debug!(count = items.len(), "menu loaded");
    Ok(items)
}

#[instrument(skip(st))]
pub async fn get_categories(st: &AppState) -> Result<Vec<Category>, GatewayError> {
    let categories = Category::list_all(st).await?;
    debug!(count = categories.len(), "categories loaded");
    Ok(categories)
}
