//! Session extraction and the session cookie.
//!
//! A request is authenticated by `Authorization: Bearer <token>` or by the
//! `pw_access_token` cookie set at sign-in. Pages redirect anonymous callers
//! to `/login`; JSON endpoints answer 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Cookie};
use axum_extra::TypedHeader;

use primerwatch_common::backend::Session;
use primerwatch_common::error::ApiError;

pub const SESSION_COOKIE: &str = "pw_access_token";

async fn session_from_parts<S: Send + Sync>(parts: &mut Parts, state: &S) -> Session {
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    {
        return Session::bearer(bearer.token());
    }
    if let Ok(TypedHeader(cookie)) = TypedHeader::<Cookie>::from_request_parts(parts, state).await {
        if let Some(token) = cookie.get(SESSION_COOKIE).filter(|t| !t.is_empty()) {
            return Session::bearer(token);
        }
    }
    Session::anonymous()
}

/// Authenticated caller of a page route.
pub struct PageSession(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for PageSession {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await;
        if session.is_authenticated() {
            Ok(PageSession(session))
        } else {
            Err(Redirect::to("/login"))
        }
    }
}

/// Authenticated caller of a JSON route.
pub struct ApiSession(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for ApiSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await;
        if session.is_authenticated() {
            Ok(ApiSession(session))
        } else {
            Err(ApiError::Unauthorized("Not authenticated".to_string()))
        }
    }
}

pub fn session_cookie(token: &str, secure: bool) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
        SESSION_COOKIE,
        token,
        if secure { "; Secure" } else { "" }
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}
