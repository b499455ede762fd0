//! In-memory page model.
//!
//! A [`Document`] owns the named element slots the page is built from. Handlers never look
//! elements up by id themselves: [`ViewBindings::resolve`] does it once at startup and fails
//! if anything is missing.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::warn;

use crate::{error::ViewError, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    IdeaInput,
    Output,
    ImagePreview,
    Results,
    TrendingProjects,
    ConnectionStatus,
    ModelStatus,
    UserProfile,
    Notifications,
    Loading,
}

impl ElementId {
    pub const ALL: [ElementId; 10] = [
        ElementId::IdeaInput,
        ElementId::Output,
        ElementId::ImagePreview,
        ElementId::Results,
        ElementId::TrendingProjects,
        ElementId::ConnectionStatus,
        ElementId::ModelStatus,
        ElementId::UserProfile,
        ElementId::Notifications,
        ElementId::Loading,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementId::IdeaInput => "ideaInput",
            ElementId::Output => "output",
            ElementId::ImagePreview => "imagePreview",
            ElementId::Results => "results",
            ElementId::TrendingProjects => "trendingProjects",
            ElementId::ConnectionStatus => "connectionStatus",
            ElementId::ModelStatus => "modelStatus",
            ElementId::UserProfile => "userProfile",
            ElementId::Notifications => "notifications",
            ElementId::Loading => "loading",
        }
    }
}

#[derive(Debug, Default)]
struct SlotState {
    html: String,
    value: String,
    hidden: bool,
    detached: bool,
}

/// Shared handle to one element. Clones point at the same element.
#[derive(Debug, Clone)]
pub struct Slot {
    id: ElementId,
    state: Arc<RwLock<SlotState>>,
}

impl Slot {
    fn new(id: ElementId) -> Self {
        Self { id, state: Arc::default() }
    }

    pub fn id(&self) -> ElementId { self.id }

    pub fn html(&self) -> String { self.state.read().html.clone() }

    /// Replace the element's content. Writes to a detached element are dropped.
    pub fn set_html(&self, html: impl Into<String>) {
        let mut state = self.state.write();
        if state.detached {
            warn!("Ignoring write to detached element #{}", self.id.as_str());
            return;
        }
        state.html = html.into();
    }

    pub fn value(&self) -> String { self.state.read().value.clone() }

    pub fn set_value(&self, value: impl Into<String>) {
        let mut state = self.state.write();
        if !state.detached {
            state.value = value.into();
        }
    }

    pub fn is_hidden(&self) -> bool { self.state.read().hidden }

    pub fn set_hidden(&self, hidden: bool) { self.state.write().hidden = hidden; }

    pub fn is_attached(&self) -> bool { !self.state.read().detached }

    fn detach(&self) { self.state.write().detached = true; }
}

#[derive(Debug, Default)]
pub struct Document {
    slots: HashMap<ElementId, Slot>,
}

impl Document {
    pub fn new() -> Self { Self::default() }

    /// The full craft page with its initial placeholders.
    pub fn standard() -> Self {
        let mut doc = Self::new();
        for id in ElementId::ALL {
            doc.insert(id);
        }
        if let Some(slot) = doc.get(ElementId::ImagePreview) {
            slot.set_html(render::image_placeholder());
        }
        for id in [ElementId::ConnectionStatus, ElementId::ModelStatus] {
            if let Some(slot) = doc.get(id) {
                slot.set_html(render::status_badge("Checking...", "pending"));
            }
        }
        for id in [ElementId::Results, ElementId::UserProfile] {
            if let Some(slot) = doc.get(id) {
                slot.set_hidden(true);
            }
        }
        doc
    }

    pub fn insert(&mut self, id: ElementId) -> Slot {
        self.slots.entry(id).or_insert_with(|| Slot::new(id)).clone()
    }

    pub fn get(&self, id: ElementId) -> Option<Slot> { self.slots.get(&id).cloned() }

    /// Remove an element. Outstanding handles stay valid but become inert.
    pub fn remove(&mut self, id: ElementId) -> Option<Slot> {
        let slot = self.slots.remove(&id)?;
        slot.detach();
        Some(slot)
    }
}

/// Every element the handlers touch, resolved once.
#[derive(Debug, Clone)]
pub struct ViewBindings {
    pub idea_input: Slot,
    pub output: Slot,
    pub image_preview: Slot,
    pub results: Slot,
    pub trending_projects: Slot,
    pub connection_status: Slot,
    pub model_status: Slot,
    pub user_profile: Slot,
    pub notifications: Slot,
    pub loading: Slot,
}

impl ViewBindings {
    pub fn resolve(doc: &Document) -> Result<Self, ViewError> {
        let lookup = |id: ElementId| doc.get(id).ok_or(ViewError::MissingElement(id.as_str()));
        Ok(Self {
            idea_input: lookup(ElementId::IdeaInput)?,
            output: lookup(ElementId::Output)?,
            image_preview: lookup(ElementId::ImagePreview)?,
            results: lookup(ElementId::Results)?,
            trending_projects: lookup(ElementId::TrendingProjects)?,
            connection_status: lookup(ElementId::ConnectionStatus)?,
            model_status: lookup(ElementId::ModelStatus)?,
            user_profile: lookup(ElementId::UserProfile)?,
            notifications: lookup(ElementId::Notifications)?,
            loading: lookup(ElementId::Loading)?,
        })
    }
}
