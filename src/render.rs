//! HTML fragments for every render target on the page.
//!
//! Markup is built with `maud`, so every interpolated value is escaped. Everything here is a
//! pure function of its input except [`decode_image`], which decodes the image off the async
//! runtime before any markup for it exists.

use std::collections::HashMap;

use base64::Engine;
use bytes::Bytes;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use tracing::info;

use crate::{
    api::preview,
    error::RenderError,
    models::{Suggestion, TrendingProject, UserProfile},
    presenter::{LoadingIndicator, NotificationKind, ToastPhase, LOADING_STEPS},
    view::{Slot, ViewBindings},
};

pub const IMAGE_DOWNLOAD_NAME: &str = "craft-project.jpg";
pub const RESULTS_DOWNLOAD_NAME: &str = "project-preview.jpg";

/// Quick-pick categories offered under the idea input.
pub const CATEGORIES: [&str; 5] = ["Paper Crafts", "Upcycling", "Textiles", "Home Decor", "Kids Crafts"];

/// One card per suggestion in input order, or a single "no results" card. Each card carries
/// its own "Generate Preview" control.
pub fn render_suggestions(suggestions: &[Suggestion]) -> String {
    render_suggestions_with_previews(suggestions, &HashMap::new())
}

/// Like [`render_suggestions`], with already generated card previews keyed by card index.
pub fn render_suggestions_with_previews(suggestions: &[Suggestion], previews: &HashMap<usize, ImagePreview>) -> String {
    suggestion_cards(suggestions, Some(previews)).into_string()
}

/// `previews` is `None` where cards are read-only (the combined results grid).
fn suggestion_cards(suggestions: &[Suggestion], previews: Option<&HashMap<usize, ImagePreview>>) -> Markup {
    html! {
        @if suggestions.is_empty() {
            div class="suggestion-card empty" {
                p { "No suggestions found for this idea. Try describing it differently." }
            }
        }
        @for (index, s) in suggestions.iter().enumerate() {
            div class="suggestion-card" data-index=(index) {
                h3 { (s.title) }
                div class="suggestion-details" {
                    p class="materials" { strong { "Materials:" } " " (s.materials) }
                    p class={ "difficulty " (s.difficulty.to_lowercase()) } { strong { "Difficulty:" } " " (s.difficulty) }
                    p class="time" { strong { "Time:" } " " (s.time) }
                    p class="cost" { strong { "Estimated Cost:" } " " (s.cost) }
                }
                @if !s.steps.is_empty() {
                    div class="steps" {
                        h4 { "Steps:" }
                        ol { @for step in &s.steps { li { (step) } } }
                    }
                }
                @if let Some(reqs) = s.tech_requirements() {
                    div class="tech-requirements" {
                        h4 { "Tech Requirements:" }
                        ul { @for req in reqs { li { (req) } } }
                    }
                }
                @if let Some(previews) = previews {
                    button class="control-btn generate-image-btn" data-endpoint="/ui/suggestion/image" data-index=(index) {
                        "Generate Preview"
                    }
                    @if let Some(image) = previews.get(&index) {
                        div class="image-preview" {
                            img class="generated-image" src=(image.data_url()) alt="Generated preview";
                        }
                    }
                }
            }
        }
    }
}

/// A generated image that has been fully decoded and is ready to display.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePreview {
    payload: String,
    bytes: Bytes,
    mime: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ImagePreview {
    pub fn payload(&self) -> &str { &self.payload }

    pub fn bytes(&self) -> Bytes { self.bytes.clone() }

    pub fn mime(&self) -> &'static str { self.mime }

    /// `data:` URL built from the payload exactly as the backend sent it.
    pub fn data_url(&self) -> String { format!("data:{};base64,{}", self.mime, self.payload) }
}

pub async fn decode_image(payload: String) -> Result<ImagePreview, RenderError> {
    tokio::task::spawn_blocking(move || {
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;
        let mime = image::guess_format(&bytes).map(|f| f.to_mime_type()).unwrap_or("image/jpeg");
        let decoded = image::load_from_memory(&bytes)?;
        info!("🖼️ Decoded {} image {}x{}: {}", mime, decoded.width(), decoded.height(), preview(&payload));
        Ok(ImagePreview { width: decoded.width(), height: decoded.height(), bytes: Bytes::from(bytes), mime, payload })
    })
    .await
    .map_err(|e| RenderError::Interrupted(e.to_string()))?
}

pub fn image_placeholder() -> String {
    html! {
        div class="placeholder" { p { "Your visualization will appear here" } }
    }
    .into_string()
}

/// The image followed by its controls. Only reachable with a decoded [`ImagePreview`], so the
/// controls never appear before the image has loaded.
pub fn render_image_preview(image: &ImagePreview) -> String {
    let src = image.data_url();
    html! {
        img class="generated-image" src=(src) width=(image.width) height=(image.height) alt="Generated preview";
        div class="image-controls" {
            button class="control-btn regenerate" data-action="regenerate" { "Regenerate" }
            a class="control-btn download" href=(src) download=(IMAGE_DOWNLOAD_NAME) { "Download" }
            a class="control-btn save" href="/ui/image/download" { "Save" }
        }
    }
    .into_string()
}

/// Combined view: optional image section, then the suggestion grid.
pub fn render_results(suggestions: &[Suggestion], image: Option<&ImagePreview>) -> String {
    html! {
        div class="results-container" {
            @if let Some(image) = image {
                div class="image-preview-section" {
                    h3 { "Project Preview" }
                    div class="image-preview" { img src=(image.data_url()) alt="Generated preview"; }
                    div class="image-actions" {
                        a class="action-button save" href=(image.data_url()) download=(RESULTS_DOWNLOAD_NAME) { "Save Image" }
                    }
                }
            }
            div class="suggestions-section" {
                div class="suggestions-grid" { (suggestion_cards(suggestions, None)) }
            }
        }
    }
    .into_string()
}

pub fn render_trending(projects: &[TrendingProject]) -> String {
    html! {
        @if projects.is_empty() {
            div class="project-card empty" { p { "No trending projects right now." } }
        }
        @for p in projects {
            div class="project-card" {
                div class="project-image" { img src=(p.image_url) alt=(p.title) loading="lazy"; }
                div class="project-info" {
                    h4 { (p.title) }
                    p class="category" { (p.category) }
                    div class="project-meta" { span class="likes" { (p.likes) } }
                }
            }
        }
    }
    .into_string()
}

pub fn status_badge(label: &str, class: &str) -> String {
    html! { span class={ "status " (class) } { (label) } }.into_string()
}

pub fn render_user_profile(user: &UserProfile) -> String {
    let name = user.name.as_deref().unwrap_or("Signed in");
    html! {
        @if let Some(picture) = &user.picture {
            img class="avatar" src=(picture) alt=(name);
        }
        span class="user-name" { (name) }
    }
    .into_string()
}

pub fn render_notification(kind: NotificationKind, message: &str, phase: ToastPhase) -> String {
    if phase == ToastPhase::Removed {
        return String::new();
    }
    let show = if phase == ToastPhase::Shown { " show" } else { "" };
    html! { div class={ "notification " (kind.as_str()) (show) } { (message) } }.into_string()
}

pub fn render_loading(indicator: &LoadingIndicator) -> String {
    let markup = match indicator {
        LoadingIndicator::Indicator(message) => html! {
            div class="loading-indicator" {
                div class="loading-content" { div class="spinner" {} p { (message) } }
            }
        },
        LoadingIndicator::MiniLoader(message) => html! {
            div class="mini-loader" { div class="spinner-small" {} span { (message) } }
        },
        LoadingIndicator::Overlay => html! {
            div class="loading-overlay" {
                div class="loading-content" {
                    h3 { "Creating Your Vision" }
                    div class="loading-steps" {
                        @for step in LOADING_STEPS { div class="loading-step" { span { (step) } } }
                    }
                }
            }
        },
    };
    markup.into_string()
}

/// A page element wrapping its slot's current content, which is already-rendered markup.
fn section(class: &str, slot: &Slot) -> Markup {
    let class = if slot.is_hidden() { format!("{class} hidden") } else { class.to_string() };
    html! { div id=(slot.id().as_str()) class=(class) { (PreEscaped(slot.html())) } }
}

pub fn render_page(view: &ViewBindings) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Craft Copilot" }
            }
            body {
                header class="status-bar" {
                    (section("connection-status", &view.connection_status))
                    (section("model-status", &view.model_status))
                    (section("user-profile", &view.user_profile))
                }
                main {
                    section class="hero" {
                        h1 { "Craft Copilot" }
                        input id="ideaInput" type="text" placeholder="Describe your craft idea..." value=(view.idea_input.value());
                        button id="generateIdeasBtn" data-endpoint="/ui/ideas" { "Generate Ideas" }
                        button id="generateImageBtn" data-endpoint="/ui/image" { "Generate Image" }
                        button id="generateBtn" data-endpoint="/ui/generate" { "Generate Both" }
                        nav class="categories" {
                            @for category in CATEGORIES {
                                button class="category-btn" data-endpoint="/ui/category" data-category=(category) { (category) }
                            }
                        }
                        nav class="platforms" {
                            a href="/ui/search/youtube" { "YouTube" }
                            a href="/ui/search/pinterest" { "Pinterest" }
                            a href="/ui/search/instructables" { "Instructables" }
                        }
                    }
                    (section("suggestions-container", &view.output))
                    (section("image-preview", &view.image_preview))
                    (section("results", &view.results))
                    section class="projects-showcase" {
                        h2 { "Trending Projects" }
                        (section("trending-grid", &view.trending_projects))
                    }
                }
                (section("loading", &view.loading))
                (section("notifications", &view.notifications))
            }
        }
    }
    .into_string()
}
