//! Routes remote `component_update` events into the live preview.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::events::{Event, EVENT_COMPONENT_UPDATE};
use crate::domain::foundation::{DomainError, ValidationError};
use crate::domain::preview::ComponentPatch;
use crate::ports::{EventHandler, EventSubscriber, Subscription};

use super::synchronizer::LivePreviewSynchronizer;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentUpdatePayload {
    component_id: String,
    updates: ComponentPatch,
}

/// Applies collaborators' component edits through the frame batch, so
/// remote echoes coalesce with local edits.
pub struct RemoteEditBridge {
    preview: LivePreviewSynchronizer,
}

impl RemoteEditBridge {
    pub fn new(preview: LivePreviewSynchronizer) -> Self {
        Self { preview }
    }

    /// Create as an Arc (for sharing with event subscriber).
    pub fn new_shared(preview: LivePreviewSynchronizer) -> Arc<Self> {
        Arc::new(Self::new(preview))
    }

    /// Subscribe this bridge to remote component updates.
    pub fn register(self: &Arc<Self>, subscriber: &dyn EventSubscriber) -> Subscription {
        subscriber.subscribe(EVENT_COMPONENT_UPDATE, self.clone())
    }
}

impl EventHandler for RemoteEditBridge {
    fn handle(&self, event: &Event) -> Result<(), DomainError> {
        let payload: ComponentUpdatePayload = event
            .payload_as()
            .map_err(|e| ValidationError::invalid_format("component_update", e.to_string()))?;

        if payload.component_id.is_empty() {
            return Err(ValidationError::empty_field("componentId").into());
        }

        self.preview
            .update_component(payload.component_id, payload.updates);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "RemoteEditBridge"
    }
}
