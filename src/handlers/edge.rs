use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
};
use uuid::Uuid;

use super::{read_cookie, AppState};
use crate::{
    page::{render_page, PageProps, UID_COOKIE},
    Result, User,
};

/// Response header reporting the evaluated bucket.
pub const BUCKET_HEADER: &str = "x-experiment-bucket";

const UID_COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// Middleware-style entry point: the bucket follows the visitor's `uid` cookie.
///
/// Visitors without the cookie get a fresh UUID, which is set on the response so that later visits
/// land in the same bucket.
pub async fn handle_edge(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let (uid, is_new_uid) = match read_cookie(&headers, UID_COOKIE) {
        Some(uid) => (uid, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    let bucket = state.evaluate_bucket(&User::new(uid.as_str())).await?;

    let bucket_header = HeaderValue::from_str(&bucket).ok();
    let mut response = Html(render_page(&PageProps {
        bucket,
        client_key: state.settings.client_key.clone(),
    }))
    .into_response();

    if let Some(bucket_header) = bucket_header {
        response.headers_mut().insert(BUCKET_HEADER, bucket_header);
    }

    if is_new_uid {
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            UID_COOKIE, uid, UID_COOKIE_MAX_AGE_SECS
        );
        match HeaderValue::from_str(&cookie) {
            Ok(cookie) => {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
            Err(err) => {
                log::warn!(target: "edge_experiments", "failed to build uid cookie: {}", err);
            }
        }
    }

    Ok(response)
}
