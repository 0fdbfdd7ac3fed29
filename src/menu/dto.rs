use serde::Deserialize;

/// Menu filter. Both parts are optional; empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetMenuParams {
    pub category: Option<String>,
    pub query: Option<String>,
}
