use tracing::{debug, warn};
use uuid::Uuid;

/// Narrow callback surface the dispatcher reports through. Stands in for the
/// run/step event stream of a hosted agent runtime: one call per question,
/// after the routed tool returns or fails.
pub trait RunEventSink: Send + Sync {
    fn on_result(&self, request_id: Uuid, tool_name: &str, payload: &str);
    fn on_error(&self, request_id: Uuid, tool_name: &str, message: &str);
}

/// Default sink: forwards events to the tracing subscriber.
pub struct TracingEventSink;

impl RunEventSink for TracingEventSink {
    fn on_result(&self, request_id: Uuid, tool_name: &str, payload: &str) {
        debug!(%request_id, tool_name, payload, "tool returned");
    }

    fn on_error(&self, request_id: Uuid, tool_name: &str, message: &str) {
        warn!(%request_id, tool_name, message, "tool failed");
    }
}
