use axum::{extract::State, response::Html};

use super::AppState;
use crate::{
    page::{render_page, PageProps},
    Result, User,
};

/// User identifier the server-rendered page evaluates for. The request's `uid` cookie is not
/// consulted here, so every visitor of `/` gets the same bucket; `/edge` uses the cookie.
pub const SERVER_USER_ID: &str = "123";

/// Render the page with a bucket evaluated on the server.
///
/// Every request initializes its own client from Edge Config. There is no caching between requests
/// and no timeout around initialization.
pub async fn handle_page(State(state): State<AppState>) -> Result<Html<String>> {
    let bucket = state.evaluate_bucket(&User::new(SERVER_USER_ID)).await?;

    Ok(Html(render_page(&PageProps {
        bucket,
        client_key: state.settings.client_key.clone(),
    })))
}
