//! Maps orchestrator events onto Server-Sent Events.
//!
//! Each event is framed with an SSE event name matching its kind ("started",
//! "chunk", "critique", "persona_error", "done") and a JSON payload. Keep-alive
//! comments are sent while personas think.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};

use crate::models::StreamEvent;

/// SSE event name for a stream event.
pub fn event_name(event: &StreamEvent) -> &'static str {
    match event {
        StreamEvent::Started { .. } => "started",
        StreamEvent::Chunk(_) => "chunk",
        StreamEvent::Critique { .. } => "critique",
        StreamEvent::PersonaError { .. } => "persona_error",
        StreamEvent::Done { .. } => "done",
    }
}

fn to_sse_event(event: StreamEvent) -> Event {
    let name = event_name(&event);
    match Event::default().event(name).json_data(&event) {
        Ok(frame) => frame,
        Err(error) => {
            tracing::error!(error = %error, "Failed to encode stream event");
            Event::default()
                .event("done")
                .data(r#"{"type":"done","status":"error","message":"Encoding failure"}"#)
        }
    }
}

/// Wrap a turn stream as an SSE response.
pub fn sse_response<S>(events: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    Sse::new(events.map(|event| Ok(to_sse_event(event))))
        .keep_alive(KeepAlive::default())
}
