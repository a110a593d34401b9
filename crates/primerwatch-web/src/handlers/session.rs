//! Sign-in and sign-out.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{clear_session_cookie, session_cookie, PageSession};
use crate::handlers::layout::{bare_page, escape, Notice};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn index() -> Redirect {
    Redirect::to("/dashboard")
}

pub async fn login_page() -> Html<String> {
    Html(render_login("", None))
}

pub async fn login_submit(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.sign_in(&form.email, &form.password).await {
        Ok(session) => {
            let Ok(token) = session.token() else {
                return Html(render_login(&form.email, Some(Notice::Error("Sign-in failed".into())))).into_response();
            };
            info!(email = %form.email.trim(), "user signed in");
            let cookie = session_cookie(token, state.config.server.secure_cookies);
            ([(header::SET_COOKIE, cookie)], Redirect::to("/dashboard")).into_response()
        }
        Err(e) => {
            warn!(error = %e, "sign-in failed");
            Html(render_login(&form.email, Some(Notice::Error(e.user_message())))).into_response()
        }
    }
}

pub async fn logout(State(state): State<SharedState>, PageSession(session): PageSession) -> Response {
    if let Err(e) = state.auth.sign_out(&session).await {
        warn!(error = %e, "sign-out call failed; clearing cookie anyway");
    }
    ([(header::SET_COOKIE, clear_session_cookie())], Redirect::to("/login")).into_response()
}

fn render_login(email: &str, notice: Option<Notice>) -> String {
    let notice_html = notice.map(|n| n.render()).unwrap_or_default();
    bare_page("Sign in", &format!(r#"
<div class="card login-card">
    <h1 class="page-title">primer<span class="text-gradient">watch</span></h1>
    <p class="text-muted">Sign in to manage assays and surveillance jobs.</p>
    {}
    <form method="post" action="/login" class="form-stack">
        <label>Email <input type="email" name="email" value="{}" required autofocus></label>
        <label>Password <input type="password" name="password" required></label>
        <button type="submit" class="btn btn-primary">Sign in</button>
    </form>
</div>"#, notice_html, escape(email)))
}
