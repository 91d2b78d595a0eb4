//! Invalidation endpoint.
//!
//! `POST /catalog/invalidate` accepts either the shared-secret header
//! (automated callers) or an authenticated admin session cookie (the admin
//! UI). The two methods are OR'd with equal privilege. Rejected requests
//! change no cache state.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use vitrina_api_types::{InvalidateRequest, InvalidateResponse};

use super::{ApiError, RouterState, SESSION_COOKIE};

const TOKEN_HEADER: &str = "x-invalidate-token";

pub async fn invalidate(
    State(state): State<RouterState>,
    headers: HeaderMap,
    Json(request): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    info!(phase = "authorizing", "invalidation request received");

    let by_token = token_matches(
        headers.get(TOKEN_HEADER),
        state.policy.invalidate_token.as_deref(),
    );
    let authorized = by_token || session_authorized(&state, &headers).await;

    if !authorized {
        warn!(phase = "rejected", "invalidation request not authorized");
        return Err(ApiError::unauthorized());
    }
    info!(
        phase = "authorized",
        method = if by_token { "token" } else { "session" },
        "invalidation request authorized"
    );

    let path = match request.path.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => {
            return Err(ApiError::bad_request(
                "invalid invalidation request",
                Some("body field `path` is required".to_string()),
            ));
        }
    };
    if !path.starts_with('/') {
        return Err(ApiError::bad_request(
            "invalid invalidation request",
            Some("`path` must begin with `/`".to_string()),
        ));
    }

    let outcome = state.coordinator.fan_out(&path).await;

    Ok(Json(InvalidateResponse {
        revalidated: outcome.revalidated,
        products_refreshed: outcome.products_refreshed,
        path: outcome.path,
        timestamp: outcome.timestamp,
    }))
}

fn token_matches(header: Option<&HeaderValue>, configured: Option<&str>) -> bool {
    let (Some(header), Some(configured)) = (header, configured) else {
        return false;
    };
    let Ok(provided) = header.to_str() else {
        return false;
    };
    provided.as_bytes().ct_eq(configured.as_bytes()).into()
}

async fn session_authorized(state: &RouterState, headers: &HeaderMap) -> bool {
    let Some(token) = session_cookie(headers) else {
        return false;
    };
    match state.sessions.authenticate(&token).await {
        Ok(valid) => valid,
        Err(err) => {
            // Deny by default when the session store cannot be consulted.
            warn!(error = %err, "session lookup failed during invalidation auth");
            false
        }
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comparison_requires_exact_match() {
        let header = HeaderValue::from_static("secret-token");
        assert!(token_matches(Some(&header), Some("secret-token")));
        assert!(!token_matches(Some(&header), Some("other-token")));
        assert!(!token_matches(Some(&header), Some("secret-token-longer")));
        assert!(!token_matches(None, Some("secret-token")));
        assert!(!token_matches(Some(&header), None));
    }

    #[test]
    fn session_cookie_is_extracted_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; vitrina_session=tok123; lang=es"),
        );
        assert_eq!(session_cookie(&headers), Some("tok123".to_string()));

        let mut other = HeaderMap::new();
        other.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_cookie(&other), None);
    }
}
