/// GitHub OAuth login, callback and logout endpoints
use crate::{
    api::found,
    context::AppContext,
    error::{GistError, GistResult},
    oauth::generate_state,
    session::Session,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

/// Build authentication routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/_/login", get(login))
        .route("/_/login/callback", get(login_callback))
        .route("/_/logout", get(logout))
}

/// Redirect the user to GitHub for authorization
async fn login(State(ctx): State<AppContext>, jar: SignedCookieJar) -> GistResult<Response> {
    let state = generate_state();

    let mut session = Session::load(&jar);
    session.auth_state = Some(state.clone());
    let jar = session.save(jar)?;

    let auth_url = ctx.oauth.authorize_url(&state)?;
    Ok((jar, found(&auth_url)).into_response())
}

/// OAuth callback parameters
#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

/// Receive the GitHub OAuth callback and log the user in
async fn login_callback(
    State(ctx): State<AppContext>,
    jar: SignedCookieJar,
    Query(params): Query<CallbackParams>,
) -> GistResult<Response> {
    let mut session = Session::load(&jar);

    // Verify that the auth state was not tampered with
    let expected = session.auth_state.as_deref().unwrap_or_default();
    let received = params.state.as_deref().unwrap_or_default();
    if expected.is_empty() || expected != received {
        warn!("tampered state: {:?} != {:?}", received, expected);
        return Err(GistError::StateMismatch);
    }

    let code = params.code.unwrap_or_default();
    let access_token = ctx.oauth.exchange(&code).await.map_err(|e| {
        error!("exchange: {}", e);
        GistError::BadRequest("oauth exchange error".to_string())
    })?;

    let mut user = ctx.github.user(&access_token).await.map_err(|e| {
        error!("github: {}", e);
        GistError::Internal("github api error".to_string())
    })?;
    user.access_token = access_token;

    ctx.db.update(|tx| tx.save_user(&user))?;
    info!("User {} ({}) logged in", user.username, user.id);

    session.user_id = Some(user.id);
    session.auth_state = None;
    let jar = session.save(jar)?;

    Ok((jar, found("/_/dashboard")).into_response())
}

/// Remove user authentication
async fn logout(jar: SignedCookieJar) -> Response {
    (Session::clear(jar), found("/")).into_response()
}
