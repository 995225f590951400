//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{HttpRequest, HttpResponse, Transport, TransportError};

type Handler = Box<
    dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError>
        + Send
        + Sync,
>;

#[derive(Default)]
struct MockState {
    queued: VecDeque<Result<HttpResponse, TransportError>>,
    handler: Option<Handler>,
    requests: Vec<HttpRequest>,
}

/// A [`Transport`] that records every request and answers from a script.
///
/// Responses are served from the FIFO queue first; when it is empty the
/// handler (if any) is asked; with neither, the request fails with a
/// connection error. Cloning shares the same script and request log, so
/// a test can keep one clone for assertions after moving another into
/// the SDK.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Creates a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every unscripted request through `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        let mock = Self::new();
        mock.lock().handler = Some(Box::new(handler));
        mock
    }

    /// Delays every response by `latency` (tokio time, so paused-clock
    /// tests control it).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queues a JSON response with the given HTTP status.
    pub fn push_json(&self, status: u16, body: impl Into<String>) {
        self.push(Ok(HttpResponse::new(status, body)));
    }

    /// Queues an arbitrary result.
    pub fn push(&self, result: Result<HttpResponse, TransportError>) {
        self.lock().queued.push_back(result);
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests sent so far.
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.lock().requests.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn answer(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.lock();
        let result = match state.queued.pop_front() {
            Some(result) => result,
            None => match &state.handler {
                Some(handler) => handler(&request),
                None => Err(TransportError::Connection(format!(
                    "no scripted response for {} {}",
                    request.method, request.url
                ))),
            },
        };
        state.requests.push(request);
        result
    }
}

impl Transport for MockTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        // Recorded on entry, so a test can see a request that is still
        // "on the wire".
        let result = self.answer(request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    fn get(url: &str) -> HttpRequest {
        HttpRequest::new(Method::Get, url)
    }

    #[tokio::test]
    async fn test_queued_responses_are_served_in_order() {
        let mock = MockTransport::new();
        mock.push_json(200, "first");
        mock.push_json(500, "second");

        let a = mock.send(get("http://x/a")).await.unwrap();
        let b = mock.send(get("http://x/b")).await.unwrap();

        assert_eq!((a.status, a.body.as_str()), (200, "first"));
        assert_eq!((b.status, b.body.as_str()), (500, "second"));
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unscripted_request_is_connection_error() {
        let mock = MockTransport::new();
        let err = mock.send(get("http://x/a")).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
        // The request is still recorded.
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_handler_answers_after_queue_drains() {
        let mock = MockTransport::with_handler(|req| {
            Ok(HttpResponse::new(200, req.url.clone()))
        });
        mock.push_json(201, "queued");

        let a = mock.send(get("http://x/a")).await.unwrap();
        let b = mock.send(get("http://x/b")).await.unwrap();

        assert_eq!(a.body, "queued");
        assert_eq!(b.body, "http://x/b");
    }

    #[tokio::test]
    async fn test_clones_share_the_request_log() {
        let mock = MockTransport::new();
        let observer = mock.clone();
        mock.push_json(200, "{}");

        mock.send(get("http://x/a")).await.unwrap();

        assert_eq!(observer.last_request().unwrap().url, "http://x/a");
    }
}
