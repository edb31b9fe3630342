use tokio::sync::mpsc::UnboundedSender;

use crate::app_event::AppEvent;

/// Cloneable handle used by the composer to emit [`AppEvent`]s.
///
/// Sending never fails from the caller's perspective: if the receiver is gone
/// the event is dropped and logged.
#[derive(Clone, Debug)]
pub struct AppEventSender {
    app_event_tx: UnboundedSender<AppEvent>,
}

impl AppEventSender {
    pub fn new(app_event_tx: UnboundedSender<AppEvent>) -> Self {
        Self { app_event_tx }
    }

    pub fn send(&self, event: AppEvent) {
        if let AppEvent::Dispatch(action) = &event {
            tracing::debug!(
                action = %action,
                conversation_id = %action.conversation_id(),
                "dispatching composer action"
            );
        }
        if let Err(err) = self.app_event_tx.send(event) {
            tracing::warn!("failed to send app event: {err}");
        }
    }
}
