use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    api::{ApiClient, Platform},
    models::{Idea, Suggestion},
    presenter::{LoadingIndicator, NotificationKind, Presenter},
    render::{self, ImagePreview},
    view::ViewBindings,
};

pub const COMBINED_FAILURE_MESSAGE: &str = "Error generating ideas. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The target element now shows the new result.
    Rendered,
    /// Input was refused before any request was made.
    Rejected,
    /// A request was made and failed; the user has been told.
    Failed,
    /// The response arrived for cards that have since been replaced, so nothing was drawn.
    Discarded,
}

/// Suggestion cards currently in the output element, with any per-card previews.
/// `generation` moves on every time the cards are replaced.
#[derive(Default)]
struct Cards {
    generation: u64,
    suggestions: Vec<Suggestion>,
    previews: HashMap<usize, ImagePreview>,
}

/// Binds user actions to backend calls and render targets. Errors stop here: every failure
/// becomes a notification and an [`Outcome`].
///
/// Overlapping calls are not cancelled. Whichever response settles last owns the element it
/// writes to.
pub struct Controller {
    client: ApiClient,
    view: ViewBindings,
    presenter: Arc<dyn Presenter>,
    min_input_chars: usize,
    displayed_image: RwLock<Option<ImagePreview>>,
    cards: RwLock<Cards>,
}

impl Controller {
    pub fn new(client: ApiClient, view: ViewBindings, presenter: Arc<dyn Presenter>, min_input_chars: usize) -> Self {
        Self { client, view, presenter, min_input_chars, displayed_image: RwLock::new(None), cards: RwLock::default() }
    }

    pub fn view(&self) -> &ViewBindings { &self.view }

    /// The image in the preview element, if one has been rendered. This is what the preview's
    /// download and save controls hand out.
    pub fn displayed_image(&self) -> Option<ImagePreview> { self.displayed_image.read().clone() }

    fn validate(&self, raw: &str) -> Option<Idea> {
        match Idea::parse(raw) {
            Ok(idea) => Some(idea),
            Err(e) => {
                warn!("Rejected input: {}", e);
                self.presenter.notify(NotificationKind::Error, &e.to_string());
                None
            }
        }
    }

    fn fail(&self, context: &str, message: &str) -> Outcome {
        error!("❌ {}: {}", context, message);
        self.presenter.notify(NotificationKind::Error, message);
        Outcome::Failed
    }

    pub async fn generate_ideas(&self, raw: &str) -> Outcome {
        let Some(idea) = self.validate(raw) else { return Outcome::Rejected };

        self.presenter.show_loading(LoadingIndicator::Indicator("Generating creative ideas...".into()));
        let result = self.client.fetch_suggestions(&idea).await;
        self.presenter.hide_loading();

        match result {
            Ok(suggestions) => {
                let mut cards = self.cards.write();
                cards.generation += 1;
                cards.previews.clear();
                self.view.output.set_html(render::render_suggestions(&suggestions));
                cards.suggestions = suggestions;
                drop(cards);
                self.presenter.notify(NotificationKind::Success, "Ideas generated successfully!");
                Outcome::Rendered
            }
            Err(e) => self.fail("Idea generation failed", &e.to_string()),
        }
    }

    pub async fn generate_image(&self, raw: &str) -> Outcome {
        let Some(idea) = self.validate(raw) else { return Outcome::Rejected };

        self.presenter.show_loading(LoadingIndicator::Overlay);
        let result = match self.client.fetch_image(&idea).await {
            Ok(generated) => render::decode_image(generated.image)
                .await
                .map(|preview| (preview, generated.remaining_requests))
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        self.presenter.hide_loading();

        match result {
            Ok((preview, remaining)) => {
                // The preview element and `displayed_image` change under one guard.
                let mut shown = self.displayed_image.write();
                self.view.image_preview.set_html(render::render_image_preview(&preview));
                *shown = Some(preview);
                drop(shown);
                let message = match remaining {
                    Some(n) => format!("Image generated successfully! {n} requests remaining"),
                    None => "Image generated successfully!".to_string(),
                };
                self.presenter.notify(NotificationKind::Success, &message);
                Outcome::Rendered
            }
            Err(message) => self.fail("Image generation failed", &message),
        }
    }

    /// Regenerate the image for whatever the input currently holds.
    pub async fn regenerate_image(&self) -> Outcome {
        let current = self.view.idea_input.value();
        self.generate_image(&current).await
    }

    /// Fetch suggestions and image together and render both once both have settled. Any
    /// failure yields one generic notification and no partial results.
    pub async fn generate_ideas_with_image(&self, raw: &str) -> Outcome {
        let Some(idea) = self.validate(raw) else { return Outcome::Rejected };

        self.presenter.show_loading(LoadingIndicator::MiniLoader("Generating your idea...".into()));
        let (suggestions, image) = tokio::join!(self.client.fetch_suggestions(&idea), self.client.fetch_image(&idea));
        let settled = match (suggestions, image) {
            (Ok(suggestions), Ok(generated)) => render::decode_image(generated.image)
                .await
                .map(|preview| (suggestions, preview))
                .map_err(|e| e.to_string()),
            (Err(e), _) | (_, Err(e)) => Err(e.to_string()),
        };
        self.presenter.hide_loading();

        match settled {
            Ok((suggestions, preview)) => {
                self.view.results.set_html(render::render_results(&suggestions, Some(&preview)));
                self.view.results.set_hidden(false);
                info!("✅ Rendered {} suggestions with preview", suggestions.len());
                Outcome::Rendered
            }
            Err(reason) => {
                error!("❌ Combined generation failed: {}", reason);
                self.presenter.notify(NotificationKind::Error, COMBINED_FAILURE_MESSAGE);
                Outcome::Failed
            }
        }
    }

    /// Generate an image for one suggestion card, using its title as the idea, and show it
    /// inside that card. A response for cards that were replaced meanwhile is dropped.
    pub async fn generate_suggestion_preview(&self, index: usize) -> Outcome {
        let (generation, title) = {
            let cards = self.cards.read();
            match cards.suggestions.get(index) {
                Some(s) => (cards.generation, s.title.clone()),
                None => {
                    warn!("No suggestion card at index {}", index);
                    self.presenter.notify(NotificationKind::Error, "That suggestion is no longer available");
                    return Outcome::Rejected;
                }
            }
        };
        let Some(idea) = self.validate(&title) else { return Outcome::Rejected };

        self.presenter.show_loading(LoadingIndicator::MiniLoader("Generating preview...".into()));
        let result = match self.client.fetch_image(&idea).await {
            Ok(generated) => render::decode_image(generated.image).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        self.presenter.hide_loading();

        match result {
            Ok(preview) => {
                let mut cards = self.cards.write();
                if cards.generation != generation {
                    debug!("Dropping preview for replaced card {}", index);
                    return Outcome::Discarded;
                }
                cards.previews.insert(index, preview);
                self.view.output.set_html(render::render_suggestions_with_previews(&cards.suggestions, &cards.previews));
                info!("✅ Preview rendered for card {}: {}", index, idea);
                Outcome::Rendered
            }
            Err(message) => self.fail("Card preview failed", &message),
        }
    }

    /// Category quick-pick: the category becomes the idea and suggestions are fetched for it.
    pub async fn select_category(&self, category: &str) -> Outcome {
        self.view.idea_input.set_value(category);
        self.generate_ideas(category).await
    }

    /// Debounced keystroke handler. Short input is ignored without feedback.
    pub async fn handle_input(&self, raw: &str) -> Outcome {
        if raw.trim().chars().count() < self.min_input_chars {
            debug!("Input too short to generate: {:?}", raw);
            return Outcome::Rejected;
        }
        self.generate_ideas_with_image(raw).await
    }

    /// Failures are logged only; the grid keeps its previous content.
    pub async fn load_trending(&self) -> Outcome {
        match self.client.fetch_trending().await {
            Ok(projects) => {
                self.view.trending_projects.set_html(render::render_trending(&projects));
                Outcome::Rendered
            }
            Err(e) => {
                error!("Failed to load trending projects: {}", e);
                Outcome::Failed
            }
        }
    }

    pub async fn check_status(&self) -> Outcome {
        let (connected, model_ready) = tokio::join!(self.client.check_liveness(), self.client.check_image_model());
        info!("Backend status: connected={} model_ready={}", connected, model_ready);

        let connection = if connected { render::status_badge("Connected", "connected") } else { render::status_badge("Disconnected", "error") };
        let model = if model_ready { render::status_badge("Ready", "ready") } else { render::status_badge("Not Ready", "error") };
        self.view.connection_status.set_html(connection);
        self.view.model_status.set_html(model);
        Outcome::Rendered
    }

    pub async fn sign_in(&self, credential: &str) -> Outcome {
        match self.client.authenticate_google(credential).await {
            Ok(user) => {
                self.view.user_profile.set_html(render::render_user_profile(&user));
                self.view.user_profile.set_hidden(false);
                self.presenter.notify(NotificationKind::Success, "Successfully signed in!");
                Outcome::Rendered
            }
            Err(e) => {
                error!("Auth error: {}", e);
                self.presenter.notify(NotificationKind::Error, "Sign in failed");
                Outcome::Failed
            }
        }
    }

    pub fn search_url(&self, platform: Platform, raw: &str) -> Option<Url> {
        let idea = self.validate(raw)?;
        match platform.search_url(&idea) {
            Ok(url) => Some(url),
            Err(e) => {
                self.fail("Could not build search link", &e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        api::{testing::ScriptedTransport, GENERATE_IMAGE_PATH, LIVENESS_PATH, SUGGEST_PATH, TRENDING_PATH, AUTH_GOOGLE_PATH},
        presenter::testing::RecordingPresenter,
        render::testing::jpeg_base64,
        view::Document,
    };

    struct Fixture {
        transport: Arc<ScriptedTransport>,
        presenter: Arc<RecordingPresenter>,
        controller: Controller,
    }

    fn fixture() -> Fixture {
        let transport = ScriptedTransport::new();
        let presenter = Arc::new(RecordingPresenter::default());
        let view = ViewBindings::resolve(&Document::standard()).unwrap();
        let controller = Controller::new(ApiClient::new(transport.clone()), view, presenter.clone(), 3);
        Fixture { transport, presenter, controller }
    }

    fn suggestions_body(titles: &[&str]) -> serde_json::Value {
        let items: Vec<_> = titles.iter().map(|t| json!({ "title": t, "steps": ["one"] })).collect();
        json!({ "success": true, "suggestions": items })
    }

    #[tokio::test]
    async fn blank_input_never_reaches_the_network() {
        let f = fixture();
        for raw in ["", "   ", "\t\n"] {
            assert_eq!(f.controller.generate_ideas(raw).await, Outcome::Rejected);
            assert_eq!(f.controller.generate_image(raw).await, Outcome::Rejected);
            assert_eq!(f.controller.generate_ideas_with_image(raw).await, Outcome::Rejected);
        }
        assert_eq!(f.transport.request_count(), 0);
        let notes = f.presenter.notifications();
        assert_eq!(notes.len(), 9);
        assert!(notes.iter().all(|(kind, msg)| *kind == NotificationKind::Error && msg == "Please describe your idea first"));
    }

    #[tokio::test]
    async fn ideas_render_in_backend_order() {
        let f = fixture();
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Kite", "Lantern", "Mobile", "Wreath"]));

        assert_eq!(f.controller.generate_ideas("paper").await, Outcome::Rendered);

        let html = f.controller.view().output.html();
        assert_eq!(html.matches(r#"class="suggestion-card""#).count(), 4);
        assert!(html.find("Kite").unwrap() < html.find("Wreath").unwrap());
        assert!(f.presenter.loading_balanced());
        assert_eq!(f.presenter.notifications(), vec![(NotificationKind::Success, "Ideas generated successfully!".to_string())]);
    }

    #[tokio::test]
    async fn rate_limited_image_is_not_rendered() {
        let f = fixture();
        f.transport.reply(GENERATE_IMAGE_PATH, 429, json!({ "success": false, "error": "slow down" }));
        let before = f.controller.view().image_preview.html();

        assert_eq!(f.controller.generate_image("vase").await, Outcome::Failed);

        assert_eq!(f.controller.view().image_preview.html(), before);
        assert_eq!(f.controller.displayed_image(), None);
        assert!(f.presenter.loading_balanced());
        assert_eq!(
            f.presenter.notifications(),
            vec![(NotificationKind::Error, "Rate limit exceeded. Please try again later.".to_string())]
        );
    }

    #[tokio::test]
    async fn image_success_reports_remaining_requests() {
        let f = fixture();
        let payload = jpeg_base64(3, 3, 10);
        f.transport.reply(GENERATE_IMAGE_PATH, 200, json!({ "success": true, "image": payload, "remaining_requests": 4 }));

        assert_eq!(f.controller.generate_image("vase").await, Outcome::Rendered);

        assert!(f.controller.view().image_preview.html().contains("image-controls"));
        assert_eq!(f.controller.displayed_image().map(|i| i.payload().to_string()), Some(payload));
        assert_eq!(
            f.presenter.notifications(),
            vec![(NotificationKind::Success, "Image generated successfully! 4 requests remaining".to_string())]
        );
    }

    #[tokio::test]
    async fn undecodable_image_fails_cleanly() {
        let f = fixture();
        f.transport.reply(GENERATE_IMAGE_PATH, 200, json!({ "success": true, "image": "bm90IGFuIGltYWdl" }));

        assert_eq!(f.controller.generate_image("vase").await, Outcome::Failed);
        assert!(f.controller.view().image_preview.html().contains("placeholder"));
        assert!(f.presenter.loading_balanced());
    }

    #[tokio::test]
    async fn last_resolved_response_wins() {
        let f = fixture();
        let first = jpeg_base64(2, 2, 10);
        let second = jpeg_base64(2, 2, 250);
        // R1 is issued first but settles last.
        f.transport.reply_for_idea_after(GENERATE_IMAGE_PATH, "first", Duration::from_millis(300), json!({ "success": true, "image": first }));
        f.transport.reply_for_idea_after(GENERATE_IMAGE_PATH, "second", Duration::from_millis(20), json!({ "success": true, "image": second }));

        let (r1, r2) = tokio::join!(f.controller.generate_image("first"), f.controller.generate_image("second"));
        assert_eq!((r1, r2), (Outcome::Rendered, Outcome::Rendered));

        let html = f.controller.view().image_preview.html();
        assert!(html.contains(&first));
        assert!(!html.contains(&second));
        assert_eq!(f.controller.displayed_image().map(|i| i.payload().to_string()), Some(first));
    }

    #[tokio::test]
    async fn combined_flow_renders_both_after_both_settle() {
        let f = fixture();
        let payload = jpeg_base64(2, 2, 60);
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Kite", "Lantern"]));
        f.transport.reply(GENERATE_IMAGE_PATH, 200, json!({ "success": true, "image": payload }));

        assert_eq!(f.controller.generate_ideas_with_image("paper").await, Outcome::Rendered);

        let results = &f.controller.view().results;
        assert!(!results.is_hidden());
        let html = results.html();
        assert!(html.contains("image-preview-section"));
        assert_eq!(html.matches(r#"class="suggestion-card""#).count(), 2);
        assert!(f.presenter.notifications().is_empty());
    }

    #[tokio::test]
    async fn combined_flow_partial_failure_shows_generic_error_only() {
        let f = fixture();
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Kite"]));
        f.transport.reply(GENERATE_IMAGE_PATH, 429, json!({}));

        assert_eq!(f.controller.generate_ideas_with_image("paper").await, Outcome::Failed);

        assert!(f.controller.view().results.is_hidden());
        assert_eq!(f.controller.view().results.html(), "");
        assert_eq!(f.presenter.notifications(), vec![(NotificationKind::Error, COMBINED_FAILURE_MESSAGE.to_string())]);
        assert!(f.presenter.loading_balanced());
    }

    #[tokio::test]
    async fn combined_flow_leaves_preview_download_alone() {
        let f = fixture();
        let shown = jpeg_base64(2, 2, 20);
        let combined = jpeg_base64(2, 2, 220);
        f.transport.reply_for_idea_after(GENERATE_IMAGE_PATH, "first", Duration::ZERO, json!({ "success": true, "image": shown }));
        f.transport.reply_for_idea_after(GENERATE_IMAGE_PATH, "second", Duration::ZERO, json!({ "success": true, "image": combined }));
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Kite"]));

        assert_eq!(f.controller.generate_image("first").await, Outcome::Rendered);
        assert_eq!(f.controller.generate_ideas_with_image("second").await, Outcome::Rendered);

        assert!(f.controller.view().results.html().contains(&combined));
        let preview = f.controller.view().image_preview.html();
        assert!(preview.contains(&shown));
        assert_eq!(f.controller.displayed_image().map(|i| i.payload().to_string()), Some(shown));
    }

    #[tokio::test]
    async fn card_preview_uses_the_card_title_and_renders_inside_it() {
        let f = fixture();
        let payload = jpeg_base64(2, 2, 120);
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Kite", "Paper Lantern"]));
        f.transport.reply(GENERATE_IMAGE_PATH, 200, json!({ "success": true, "image": payload }));
        f.controller.generate_ideas("paper").await;

        assert_eq!(f.controller.generate_suggestion_preview(1).await, Outcome::Rendered);

        let sent = f.transport.requests.lock().last().and_then(|r| r.body.clone());
        assert_eq!(sent, Some(json!({ "idea": "Paper Lantern" })));
        let html = f.controller.view().output.html();
        assert!(html.find("Paper Lantern").unwrap() < html.find(&payload).unwrap());
        assert_eq!(html.matches(r#"class="suggestion-card""#).count(), 2);
        assert_eq!(f.controller.displayed_image(), None);
        assert!(f.presenter.loading_balanced());
    }

    #[tokio::test]
    async fn card_preview_failure_becomes_a_notification() {
        let f = fixture();
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Kite"]));
        f.transport.reply(GENERATE_IMAGE_PATH, 200, json!({ "success": false, "error": "model offline" }));
        f.controller.generate_ideas("paper").await;
        let before = f.controller.view().output.html();

        assert_eq!(f.controller.generate_suggestion_preview(0).await, Outcome::Failed);
        assert_eq!(f.controller.generate_suggestion_preview(7).await, Outcome::Rejected);

        assert_eq!(f.controller.view().output.html(), before);
        let notes = f.presenter.notifications();
        assert_eq!(notes[1], (NotificationKind::Error, "model offline".to_string()));
        assert_eq!(notes[2], (NotificationKind::Error, "That suggestion is no longer available".to_string()));
        assert_eq!(f.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn card_preview_for_replaced_cards_is_dropped() {
        let f = fixture();
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Kite"]));
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Quilt"]));
        f.transport.reply_for_idea_after(GENERATE_IMAGE_PATH, "Kite", Duration::from_millis(200), json!({ "success": true, "image": jpeg_base64(2, 2, 1) }));
        f.controller.generate_ideas("paper").await;

        let (preview, _) = tokio::join!(f.controller.generate_suggestion_preview(0), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            f.controller.generate_ideas("fabric").await
        });

        assert_eq!(preview, Outcome::Discarded);
        let html = f.controller.view().output.html();
        assert!(html.contains("Quilt"));
        assert!(!html.contains("data:image"));
    }

    #[tokio::test]
    async fn category_pick_fills_input_and_fetches_suggestions() {
        let f = fixture();
        f.transport.reply(SUGGEST_PATH, 200, suggestions_body(&["Bottle Planter"]));

        assert_eq!(f.controller.select_category("Upcycling").await, Outcome::Rendered);

        assert_eq!(f.controller.view().idea_input.value(), "Upcycling");
        let sent: Vec<_> = f.transport.requests.lock().iter().map(|r| (r.path, r.body.clone())).collect();
        assert_eq!(sent, vec![(SUGGEST_PATH, Some(json!({ "idea": "Upcycling" })))]);
        assert!(f.controller.view().output.html().contains("Bottle Planter"));
    }

    #[tokio::test]
    async fn short_input_is_ignored_silently() {
        let f = fixture();
        assert_eq!(f.controller.handle_input(" ab ").await, Outcome::Rejected);
        assert_eq!(f.transport.request_count(), 0);
        assert!(f.presenter.notifications().is_empty());
    }

    #[tokio::test]
    async fn trending_failure_keeps_grid_and_stays_quiet() {
        let f = fixture();
        f.transport.fail(TRENDING_PATH, "refused");
        assert_eq!(f.controller.load_trending().await, Outcome::Failed);
        assert!(f.presenter.notifications().is_empty());

        f.transport.reply(TRENDING_PATH, 200, json!({
            "success": true,
            "ideas": [{ "title": "DIY Home Security", "category": "IoT/Security", "image": "https://img.example/a.jpg", "likes": 1380 }]
        }));
        assert_eq!(f.controller.load_trending().await, Outcome::Rendered);
        assert!(f.controller.view().trending_projects.html().contains("DIY Home Security"));
    }

    #[tokio::test]
    async fn status_probe_updates_both_badges() {
        let f = fixture();
        f.transport.reply_raw(LIVENESS_PATH, 200, "ok");
        f.transport.reply(GENERATE_IMAGE_PATH, 503, json!({}));

        f.controller.check_status().await;

        assert!(f.controller.view().connection_status.html().contains("Connected"));
        assert!(f.controller.view().model_status.html().contains("Not Ready"));
    }

    #[tokio::test]
    async fn sign_in_reveals_profile() {
        let f = fixture();
        f.transport.reply(AUTH_GOOGLE_PATH, 200, json!({ "success": true, "user": { "picture": "https://pics.example/me.png" } }));
        f.transport.reply(AUTH_GOOGLE_PATH, 200, json!({ "success": false, "error": "bad token" }));

        assert_eq!(f.controller.sign_in("cred").await, Outcome::Rendered);
        assert!(!f.controller.view().user_profile.is_hidden());
        assert_eq!(f.controller.sign_in("cred").await, Outcome::Failed);
        assert_eq!(
            f.presenter.notifications(),
            vec![
                (NotificationKind::Success, "Successfully signed in!".to_string()),
                (NotificationKind::Error, "Sign in failed".to_string()),
            ]
        );
    }

    #[test]
    fn search_link_requires_an_idea() {
        let f = fixture();
        assert_eq!(f.controller.search_url(Platform::Instructables, "  "), None);
        assert_eq!(
            f.controller.search_url(Platform::Instructables, "kite").map(|u| u.to_string()),
            Some("https://www.instructables.com/search/?q=kite+craft".to_string())
        );
    }
}
