//! Shared request dispatch.
//!
//! Every CrateBytes call has the same shape: build a URL from the base
//! and a path, encode an optional JSON body, attach the bearer token,
//! send, decode the envelope. [`ApiClient`] does that once so the
//! session supervisor and the game services don't each re-implement it.

use std::sync::Arc;

use cratebytes_protocol::{Codec, JsonCodec, ResponseEnvelope, decode_response};
use cratebytes_transport::{HttpRequest, Method, Transport};
use serde::{Serialize, de::DeserializeOwned};

use crate::{SessionError, TokenHolder};

/// Whether a call needs a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Login endpoints. A held token is still sent if present.
    Public,
    /// Everything else. Fails with [`SessionError::NotAuthenticated`]
    /// before any I/O when no token is held.
    Authenticated,
}

/// Issues API calls over a [`Transport`] on behalf of the current token.
pub struct ApiClient<T> {
    transport: T,
    base_url: String,
    tokens: Arc<TokenHolder>,
    codec: JsonCodec,
}

impl<T: Transport> ApiClient<T> {
    /// `base_url` is joined with endpoint paths verbatim; a trailing
    /// slash is dropped.
    pub fn new(
        transport: T,
        base_url: impl Into<String>,
        tokens: Arc<TokenHolder>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            transport,
            base_url,
            tokens,
            codec: JsonCodec,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenHolder> {
        &self.tokens
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn codec(&self) -> &JsonCodec {
        &self.codec
    }

    /// Authenticated `GET`.
    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ResponseEnvelope<R>, SessionError> {
        self.send(Method::Get, path, None, Access::Authenticated).await
    }

    /// Authenticated `POST` with a JSON body.
    pub async fn post<B, R>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ResponseEnvelope<R>, SessionError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let body = self.codec.encode(body)?;
        self.send(Method::Post, path, Some(body), Access::Authenticated)
            .await
    }

    /// `POST` that works without a token (login).
    pub async fn post_public<B, R>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ResponseEnvelope<R>, SessionError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let body = self.codec.encode(body)?;
        self.send(Method::Post, path, Some(body), Access::Public).await
    }

    /// Authenticated `DELETE`.
    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ResponseEnvelope<R>, SessionError> {
        self.send(Method::Delete, path, None, Access::Authenticated)
            .await
    }

    /// Sends one request and decodes the reply.
    ///
    /// The token is read at call time, so a login or logout between two
    /// calls is always reflected in the second.
    ///
    /// # Errors
    /// Only [`SessionError::NotAuthenticated`] for an
    /// [`Access::Authenticated`] call without a token. Network and server
    /// failures are reported inside the envelope.
    pub async fn send<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        access: Access,
    ) -> Result<ResponseEnvelope<R>, SessionError> {
        let token = self.tokens.token();
        if access == Access::Authenticated && token.is_none() {
            tracing::warn!(%method, path, "call rejected: not authenticated");
            return Err(SessionError::NotAuthenticated);
        }

        let mut request = HttpRequest::new(method, format!("{}{path}", self.base_url));
        if let Some(body) = body {
            request = request.with_json_body(body);
        }
        if let Some(token) = token {
            request = request.with_bearer(&token);
        }

        let envelope = decode_response(self.transport.send(request).await);
        if envelope.success {
            tracing::debug!(%method, path, status = envelope.status_code, "api call succeeded");
        } else {
            tracing::debug!(
                %method,
                path,
                status = envelope.status_code,
                error = envelope.error_message().unwrap_or_default(),
                "api call failed"
            );
        }
        Ok(envelope)
    }
}
