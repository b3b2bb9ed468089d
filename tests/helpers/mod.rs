use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rolegate::authz::gate::{AuditEvent, AuditSink};

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Audit sink that keeps every event for later assertions.
#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit lock poisoned").clone()
    }
}

impl AuditSink for RecordingSink {
    fn record(&self, event: &AuditEvent) {
        self.events
            .lock()
            .expect("audit lock poisoned")
            .push(event.clone());
    }
}
