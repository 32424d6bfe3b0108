/// Home page and dashboard
use crate::{
    api::{found, pages},
    context::AppContext,
    error::{GistError, GistResult},
    session::Session,
};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::error;

/// Build home routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/", get(root))
        .route("/_/dashboard", get(dashboard))
}

/// Serve the home page, or forward logged-in users to their dashboard
async fn root(State(ctx): State<AppContext>, jar: SignedCookieJar) -> Response {
    if Session::load(&jar).authenticated() {
        return found("/_/dashboard");
    }

    Html(pages::index(&ctx.config.embed.provider_name)).into_response()
}

/// Serve the dashboard with hosted gists and gists available on GitHub
async fn dashboard(State(ctx): State<AppContext>, jar: SignedCookieJar) -> GistResult<Response> {
    let session = Session::load(&jar);
    if !session.authenticated() {
        return Ok(found("/"));
    }

    let user_id = session.user_id();
    let (user, hosted) = ctx.db.view(|tx| {
        let user = tx.user(user_id)?;
        let hosted = tx.gists_by_user_id(user_id)?;
        Ok((user, hosted))
    })?;

    // Session outlived its user record
    let Some(user) = user else {
        return Ok((Session::clear(jar), found("/")).into_response());
    };

    let recent = ctx.github.gists(&user.access_token).await.map_err(|e| {
        error!("github gists: {}", e);
        GistError::Internal("github api error".to_string())
    })?;

    Ok(Html(pages::dashboard(
        &ctx.config.embed.provider_name,
        &hosted,
        &recent,
    ))
    .into_response())
}
