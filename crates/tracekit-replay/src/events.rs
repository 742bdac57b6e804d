//! The unified replay event sequence (§4.4) and its three projections.
//!
//! Every replayed call, regardless of how the original API shape returns
//! results (a callback, a promise, an event emitter), is driven from the
//! same ordered event sequence: zero or one `Fields`, zero or more `Row`,
//! then exactly one of `End` or `Error`. The projections below adapt that
//! sequence to a `Future`, a `futures::Stream`, or a scheduled callback,
//! matching the three result-reconstruction styles a mock connection needs
//! to support.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{ReplayError, ReplayResult};

/// One step of a replayed result sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplayEvent {
    /// Column/field metadata, emitted at most once and before any `Row`.
    Fields(Value),
    /// A single result row.
    Row(Value),
    /// Successful completion; no further events follow.
    End,
    /// Terminal failure; no further events follow.
    Error(String),
}

/// Producing half of an event sequence. A mock connection builds one of
/// these from a matched [`crate::request::MatchRequest`]'s recorded result
/// and sends events in order; the receiving half is handed to whichever
/// projection the caller's API shape needs.
pub struct EventSource {
    tx: mpsc::UnboundedSender<ReplayEvent>,
}

impl EventSource {
    pub fn channel() -> (Self, EventSink) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, EventSink { rx })
    }

    pub fn send(&self, event: ReplayEvent) {
        // The sink outliving the source is the only failure mode, and a
        // dropped receiver means nobody is waiting on the result anymore.
        let _ = self.tx.send(event);
    }

    /// Emit a no-op successful sequence: no fields, no rows, straight to
    /// `End`. Used when ambient context is missing and replay has nothing
    /// to reconstruct (§5).
    pub fn emit_empty_success(&self) {
        self.send(ReplayEvent::End);
    }

    /// Emit fields followed by each row, then `End`.
    pub fn emit_result_set(&self, fields: Value, rows: impl IntoIterator<Item = Value>) {
        self.send(ReplayEvent::Fields(fields));
        for row in rows {
            self.send(ReplayEvent::Row(row));
        }
        self.send(ReplayEvent::End);
    }

    pub fn emit_error(&self, message: impl Into<String>) {
        self.send(ReplayEvent::Error(message.into()));
    }
}

pub struct EventSink {
    rx: mpsc::UnboundedReceiver<ReplayEvent>,
}

impl EventSink {
    /// Drain the whole sequence and collapse it into `(rows, fields)`,
    /// matching the "awaiting the emitter resolves to `[rows, fields]`"
    /// promise shape (§4.4).
    pub async fn into_future(mut self) -> ReplayResult<(Vec<Value>, Option<Value>)> {
        let mut rows = Vec::new();
        let mut fields = None;
        while let Some(event) = self.rx.recv().await {
            match event {
                ReplayEvent::Fields(f) => fields = Some(f),
                ReplayEvent::Row(r) => rows.push(r),
                ReplayEvent::End => return Ok((rows, fields)),
                ReplayEvent::Error(message) => return Err(ReplayError::Transport(message)),
            }
        }
        Ok((rows, fields))
    }

    /// Project onto a `futures::Stream` of raw events, for callers that
    /// want to observe `fields`/`row`/`end`/`error` as they arrive rather
    /// than waiting for the whole sequence (the event-emitter shape).
    pub fn into_stream(self) -> EventStream {
        EventStream { rx: self.rx }
    }

    /// Drive the sequence through a scheduled callback shape:
    /// `cb(error, rows, fields)`, invoked once after `End`/`Error`, never
    /// synchronously from within the call that requested replay (§4.4:
    /// "must invoke the callback asynchronously").
    pub async fn into_callback<F>(self, cb: F)
    where
        F: FnOnce(Option<ReplayError>, Vec<Value>, Option<Value>) + Send + 'static,
    {
        match self.into_future().await {
            Ok((rows, fields)) => cb(None, rows, fields),
            Err(err) => cb(Some(err), Vec::new(), None),
        }
    }
}

pub struct EventStream {
    rx: mpsc::UnboundedReceiver<ReplayEvent>,
}

impl Stream for EventStream {
    type Item = ReplayEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
