// src/handlers/auth.rs

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::SESSION_COOKIE,
    models::auth::{LoginPayload, LoginResponse},
};

fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_seconds))
        .secure(secure)
        .build()
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Sessão criada (cookie box-drop-auth)", body = LoginResponse),
        (status = 401, description = "Senha inválida")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let token = app_state.auth_service.login(&payload.password).await?;
    let cookie = session_cookie(
        &token,
        app_state.auth_service.session_ttl_seconds(),
        app_state.cookie_secure,
    );

    tracing::info!("🔑 Sessão do painel iniciada");
    Ok((jar.add(cookie), Json(LoginResponse { success: true })))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Cookie de sessão removido", body = LoginResponse)
    )
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<LoginResponse>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(LoginResponse { success: true }))
}
