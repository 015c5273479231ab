use std::sync::{Arc, Mutex};

use chat_pulse::{StreamEvent, TransitionHandler};

#[derive(Clone, Default)]
pub struct RecordingHandler {
    pub events: Arc<Mutex<Vec<StreamEvent>>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn transitions(&self) -> Vec<bool> {
        self.events().iter().map(|e| e.is_live).collect()
    }
}

impl TransitionHandler for RecordingHandler {
    async fn on_transition(&self, event: StreamEvent) {
        self.events.lock().unwrap().push(event);
    }
}
