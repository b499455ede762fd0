use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::Platform,
    debounce::Debouncer,
    handlers::{Controller, Outcome},
    models::{CardRequest, CategoryRequest, CredentialRequest, IdeaRequest},
    render::{self, IMAGE_DOWNLOAD_NAME},
    view::Slot,
};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    pub input: Arc<Debouncer<String>>,
}

impl AppState {
    pub fn new(controller: Arc<Controller>, debounce: Duration) -> Self {
        let handler = controller.clone();
        let input = Debouncer::new(debounce, move |idea: String| {
            let controller = handler.clone();
            async move {
                controller.handle_input(&idea).await;
            }
        });
        Self { controller, input: Arc::new(input) }
    }
}

/// Result of a UI action: what happened and the affected element's new content.
#[derive(Debug, Serialize)]
pub struct UiUpdate {
    pub outcome: Outcome,
    pub html: String,
}

impl UiUpdate {
    fn of(outcome: Outcome, slot: &Slot) -> Json<Self> {
        Json(Self { outcome, html: slot.html() })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub idea: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ui/input", post(input))
        .route("/ui/ideas", post(generate_ideas))
        .route("/ui/category", post(select_category))
        .route("/ui/suggestion/image", post(suggestion_preview))
        .route("/ui/image", post(generate_image))
        .route("/ui/image/regenerate", post(regenerate_image))
        .route("/ui/image/download", get(download_image))
        .route("/ui/generate", post(generate_all))
        .route("/ui/trending", get(trending))
        .route("/ui/status", get(status))
        .route("/ui/search/:platform", get(search))
        .route("/ui/auth", post(sign_in))
        .with_state(state)
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render::render_page(state.controller.view()))
}

pub async fn input(State(state): State<AppState>, Json(body): Json<IdeaRequest>) -> StatusCode {
    let target = &state.controller.view().idea_input;
    target.set_value(body.idea.clone());
    state.input.trigger_for(target, body.idea);
    StatusCode::ACCEPTED
}

pub async fn generate_ideas(State(state): State<AppState>, Json(body): Json<IdeaRequest>) -> Json<UiUpdate> {
    state.controller.view().idea_input.set_value(body.idea.clone());
    let outcome = state.controller.generate_ideas(&body.idea).await;
    UiUpdate::of(outcome, &state.controller.view().output)
}

pub async fn select_category(State(state): State<AppState>, Json(body): Json<CategoryRequest>) -> Json<UiUpdate> {
    let outcome = state.controller.select_category(&body.category).await;
    UiUpdate::of(outcome, &state.controller.view().output)
}

pub async fn suggestion_preview(State(state): State<AppState>, Json(body): Json<CardRequest>) -> Json<UiUpdate> {
    let outcome = state.controller.generate_suggestion_preview(body.index).await;
    UiUpdate::of(outcome, &state.controller.view().output)
}

pub async fn generate_image(State(state): State<AppState>, Json(body): Json<IdeaRequest>) -> Json<UiUpdate> {
    state.controller.view().idea_input.set_value(body.idea.clone());
    let outcome = state.controller.generate_image(&body.idea).await;
    UiUpdate::of(outcome, &state.controller.view().image_preview)
}

pub async fn regenerate_image(State(state): State<AppState>) -> Json<UiUpdate> {
    let outcome = state.controller.regenerate_image().await;
    UiUpdate::of(outcome, &state.controller.view().image_preview)
}

pub async fn download_image(State(state): State<AppState>) -> Response {
    match state.controller.displayed_image() {
        Some(image) => (
            [
                (header::CONTENT_TYPE, image.mime().to_string()),
                (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", IMAGE_DOWNLOAD_NAME)),
            ],
            image.bytes(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn generate_all(State(state): State<AppState>, Json(body): Json<IdeaRequest>) -> Json<UiUpdate> {
    state.controller.view().idea_input.set_value(body.idea.clone());
    let outcome = state.controller.generate_ideas_with_image(&body.idea).await;
    UiUpdate::of(outcome, &state.controller.view().results)
}

pub async fn trending(State(state): State<AppState>) -> Json<UiUpdate> {
    let outcome = state.controller.load_trending().await;
    UiUpdate::of(outcome, &state.controller.view().trending_projects)
}

pub async fn status(State(state): State<AppState>) -> Json<UiUpdate> {
    let outcome = state.controller.check_status().await;
    let view = state.controller.view();
    Json(UiUpdate { outcome, html: format!("{}{}", view.connection_status.html(), view.model_status.html()) })
}

pub async fn search(
    Path(platform): Path<String>,
    Query(query): Query<SearchQuery>,
    State(state): State<AppState>,
) -> Response {
    let Some(platform) = Platform::from_slug(&platform) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let idea = query.idea.unwrap_or_else(|| state.controller.view().idea_input.value());
    match state.controller.search_url(platform, &idea) {
        Some(url) => Redirect::to(url.as_str()).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

pub async fn sign_in(State(state): State<AppState>, Json(body): Json<CredentialRequest>) -> Json<UiUpdate> {
    let outcome = state.controller.sign_in(&body.credential).await;
    UiUpdate::of(outcome, &state.controller.view().user_profile)
}
