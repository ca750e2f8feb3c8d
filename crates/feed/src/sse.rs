use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::FeedError;

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

#[derive(Debug, Default)]
struct PendingEvent {
    event: Option<String>,
    id: Option<String>,
    data: Vec<String>,
}

impl PendingEvent {
    /// An event without data lines is discarded at the blank line.
    fn dispatch(&mut self) -> Option<SseEvent> {
        let pending = std::mem::take(self);
        if pending.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: pending.event,
            id: pending.id,
            data: pending.data.join("\n"),
        })
    }
}

/// Parses an SSE byte stream into [`SseEvent`] items.
///
/// ```text
/// : keep-alive comment
/// event: change
/// data: refresh
///
/// ```
///
/// Lines may end in `\n` or `\r\n` and may be split across chunks. When the
/// byte stream ends, a trailing event without its blank line is still
/// dispatched.
pub struct SseParser<S> {
    inner: S,
    buffer: Vec<u8>,
    pending: PendingEvent,
    finished: bool,
}

impl<S> SseParser<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            pending: PendingEvent::default(),
            finished: false,
        }
    }

    fn try_parse_event(&mut self) -> Option<SseEvent> {
        loop {
            let line_end = self.buffer.iter().position(|b| *b == b'\n')?;
            let mut raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            let line = String::from_utf8_lossy(&raw);

            if line.is_empty() {
                if let Some(event) = self.pending.dispatch() {
                    return Some(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line.as_ref(), ""),
            };
            match field {
                "data" => self.pending.data.push(value.to_string()),
                "event" => self.pending.event = Some(value.to_string()),
                "id" => self.pending.id = Some(value.to_string()),
                // retry hints are ignored; reconnect timing is ours
                _ => {}
            }
        }
    }
}

impl<S, E> Stream for SseParser<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<FeedError>,
{
    type Item = Result<SseEvent, FeedError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.try_parse_event() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            match self.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(bytes))) => self.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e.into()))),
                Poll::Ready(None) => {
                    self.finished = true;
                    if !self.buffer.is_empty() {
                        self.buffer.push(b'\n');
                    }
                    self.buffer.push(b'\n');
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn parse(chunks: &[&str]) -> Vec<SseEvent> {
        let chunks: Vec<Result<Bytes, FeedError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect();
        SseParser::new(stream::iter(chunks))
            .map(|r| r.expect("no transport errors"))
            .collect()
            .await
    }

    #[tokio::test]
    async fn parses_plain_message() {
        let events = parse(&["data: refresh\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "refresh");
        assert_eq!(events[0].event, None);
    }

    #[tokio::test]
    async fn handles_lines_split_across_chunks() {
        let events = parse(&["da", "ta: refr", "esh\r", "\n\r\ndata:ping\n", "\n"]).await;
        let data: Vec<&str> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["refresh", "ping"]);
    }

    #[tokio::test]
    async fn skips_comments_and_joins_multiline_data() {
        let events = parse(&[": hi\nevent: change\nid: 7\nretry: 10\ndata: a\ndata: b\n\n"]).await;
        assert_eq!(
            events,
            vec![SseEvent {
                event: Some("change".into()),
                id: Some("7".into()),
                data: "a\nb".into(),
            }]
        );
    }

    #[tokio::test]
    async fn event_without_data_is_dropped() {
        let events = parse(&["event: ping\n\n", "data: refresh\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, None);
    }

    #[tokio::test]
    async fn flushes_trailing_event_at_end_of_stream() {
        let events = parse(&["data: refresh"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "refresh");
    }

    #[tokio::test]
    async fn surfaces_transport_errors() {
        let chunks: Vec<Result<Bytes, FeedError>> = vec![
            Ok(Bytes::from_static(b"data: refresh\n\n")),
            Err(FeedError::Stream("reset".into())),
        ];
        let items: Vec<_> = SseParser::new(stream::iter(chunks)).collect().await;
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(FeedError::Stream(_))));
    }
}
