use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use auth::{session, AuthUser, IdentityError, IdentityProvider};
use common::{GenerateRequest, GenerateResponse};
use errors::AppError;

use crate::pages::{self, make_path};
use crate::service::LedgerService;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub base_path: String,
}

#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub prompt: String,
}

async fn require_login(session: &Session, base: &str) -> Result<AuthUser, Response> {
    match session::current_user(session).await {
        Some(user) => Ok(user),
        None => Err(Redirect::to(&make_path(base, "/login")).into_response()),
    }
}

pub async fn root(session: Session, State(state): State<AppState>) -> Redirect {
    if session::current_user(&session).await.is_some() {
        Redirect::to(&make_path(&state.base_path, "/dashboard"))
    } else {
        Redirect::to(&make_path(&state.base_path, "/login"))
    }
}

pub async fn login_form(State(state): State<AppState>) -> Html<String> {
    Html(pages::auth::render_login(&state.base_path, None))
}

pub async fn login(
    session: Session,
    State(state): State<AppState>,
    axum::Form(form): axum::Form<CredentialsForm>,
) -> Response {
    match state
        .identity
        .verify_credentials(&form.email, &form.password)
        .await
    {
        Ok(Some(user)) => {
            if let Err(e) = session::sign_in(&session, &user).await {
                log::error!("Failed to establish session: {e}");
                return Html(pages::auth::render_login(
                    &state.base_path,
                    Some("Failed to log in"),
                ))
                .into_response();
            }
            Redirect::to(&make_path(&state.base_path, "/dashboard")).into_response()
        }
        Ok(None) => Html(pages::auth::render_login(
            &state.base_path,
            Some("Invalid email or password"),
        ))
        .into_response(),
        Err(e) => {
            log::error!("Identity provider error during login: {e}");
            Html(pages::auth::render_login(
                &state.base_path,
                Some("Failed to log in"),
            ))
            .into_response()
        }
    }
}

pub async fn signup_form(State(state): State<AppState>) -> Html<String> {
    Html(pages::auth::render_signup(&state.base_path, None))
}

pub async fn signup(
    session: Session,
    State(state): State<AppState>,
    axum::Form(form): axum::Form<CredentialsForm>,
) -> Response {
    let user = match state.identity.sign_up(&form.email, &form.password).await {
        Ok(user) => user,
        Err(
            e @ (IdentityError::InvalidEmail
            | IdentityError::WeakPassword
            | IdentityError::EmailTaken),
        ) => {
            return Html(pages::auth::render_signup(
                &state.base_path,
                Some(&e.to_string()),
            ))
            .into_response();
        }
        Err(e) => {
            log::error!("Identity provider error during signup: {e}");
            return Html(pages::auth::render_signup(
                &state.base_path,
                Some("Failed to sign up"),
            ))
            .into_response();
        }
    };

    // The credit grant is part of signup: if it cannot be recorded the
    // identity is rolled back rather than leaving an account without a
    // profile row.
    if let Err(e) = state
        .ledger
        .provision_profile(user.user_id, &user.email)
        .await
    {
        log::error!("Profile provisioning failed for {}: {e}", user.user_id);
        if let Err(e) = state.identity.remove(user.user_id).await {
            log::error!("Rollback of identity {} failed: {e}", user.user_id);
        }
        return Html(pages::auth::render_signup(
            &state.base_path,
            Some("Failed to sign up"),
        ))
        .into_response();
    }

    if let Err(e) = session::sign_in(&session, &user).await {
        log::error!("Failed to establish session: {e}");
        return Html(pages::auth::render_login(
            &state.base_path,
            Some("Account created, please log in"),
        ))
        .into_response();
    }
    Redirect::to(&make_path(&state.base_path, "/dashboard")).into_response()
}

pub async fn logout(session: Session, State(state): State<AppState>) -> Redirect {
    session::sign_out(&session).await;
    Redirect::to(&make_path(&state.base_path, "/login"))
}

pub async fn dashboard(session: Session, State(state): State<AppState>) -> Response {
    let user = match require_login(&session, &state.base_path).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    render_dashboard(&state, &user, None).await
}

/// HTML form variant of the generate endpoint: success redirects back to
/// the dashboard, failures re-render it with the inline message.
pub async fn generate_form(
    session: Session,
    State(state): State<AppState>,
    axum::Form(form): axum::Form<PromptForm>,
) -> Response {
    let user = match require_login(&session, &state.base_path).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    match state.ledger.generate(user.user_id, &form.prompt).await {
        Ok(_) => Redirect::to(&make_path(&state.base_path, "/dashboard")).into_response(),
        Err(err) => {
            if !matches!(err, AppError::Validation(_)) {
                log::error!("Generation failed for {}: {err}", user.user_id);
            }
            let message = match &err {
                AppError::Validation(msg) => msg.clone(),
                _ => errors::GENERATION_FAILED_MSG.to_string(),
            };
            render_dashboard(&state, &user, Some(&message)).await
        }
    }
}

/// JSON endpoint matching the original API:
/// `{prompt}` in, `{success, image_url, prompt}` or `{error}` out.
pub async fn api_generate(
    session: Session,
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let Some(user) = session::current_user(&session).await else {
        return AppError::Auth.into_response();
    };

    match state.ledger.generate(user.user_id, &request.prompt).await {
        Ok(outcome) => Json(GenerateResponse {
            success: true,
            image_url: outcome.image.image_url,
            prompt: outcome.image.prompt,
        })
        .into_response(),
        Err(err) => {
            if !matches!(err, AppError::Validation(_)) {
                log::error!("Generation failed for {}: {err}", user.user_id);
            }
            err.into_response()
        }
    }
}

async fn render_dashboard(state: &AppState, user: &AuthUser, error: Option<&str>) -> Response {
    let Some(profile) = state.ledger.get_profile(user.user_id).await else {
        log::error!("No profile row for signed-in user {}", user.user_id);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(templates::page_layout(
                "AI Image Generator",
                "<p>Your account profile is missing. Please contact support.</p>".to_string(),
            )),
        )
            .into_response();
    };
    let images = state.ledger.list_images(user.user_id).await;
    Html(pages::dashboard::render(
        &state.base_path,
        &profile,
        &images,
        error,
    ))
    .into_response()
}
