//! Per-player metadata: one opaque string the game stores server-side.
//!
//! The server stores whatever string it's given. Games usually store
//! JSON, so the `*_object` / `*_as` helpers encode and decode that inner
//! JSON for you.

use std::sync::Arc;

use cratebytes_protocol::{
    ApiError, Codec, ErrorKind, MetadataPayload, PlayerDataRequest, ResponseEnvelope,
    endpoints,
};
use cratebytes_session::{ApiClient, SessionError};
use cratebytes_transport::Transport;
use serde::{Serialize, de::DeserializeOwned};

/// Reads, writes, and deletes the logged-in player's metadata. Every
/// call requires a logged-in player.
pub struct MetadataService<T> {
    client: Arc<ApiClient<T>>,
}

impl<T: Transport> MetadataService<T> {
    pub(crate) fn new(client: Arc<ApiClient<T>>) -> Self {
        Self { client }
    }

    /// The logged-in player's metadata string.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn get_player_data(&self) -> Result<ResponseEnvelope<String>, SessionError> {
        self.fetch(endpoints::METADATA).await
    }

    /// Another player's metadata, by their sequential id.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn get_player_data_by_sequential_id(
        &self,
        sequential_id: i64,
    ) -> Result<ResponseEnvelope<String>, SessionError> {
        self.fetch(&endpoints::metadata_by_sequential_id(sequential_id))
            .await
    }

    async fn fetch(&self, path: &str) -> Result<ResponseEnvelope<String>, SessionError> {
        let envelope: ResponseEnvelope<MetadataPayload> =
            self.client.get(path).await?.require_data();
        Ok(envelope.map(MetadataPayload::into_string))
    }

    /// The logged-in player's metadata, decoded from JSON into `D`.
    ///
    /// A stored string that isn't valid JSON for `D` yields a failed
    /// envelope with [`ErrorKind::Decode`].
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn get_player_data_as<D: DeserializeOwned>(
        &self,
    ) -> Result<ResponseEnvelope<D>, SessionError> {
        let codec = *self.client.codec();
        let envelope = self.get_player_data().await?;
        Ok(envelope.try_map(|raw| {
            codec.decode::<D>(&raw).map_err(|err| {
                tracing::debug!(%err, "stored metadata does not match the requested type");
                ApiError::new(
                    ErrorKind::Decode,
                    format!("Failed to deserialize data: {err}"),
                )
            })
        }))
    }

    /// Replaces the logged-in player's metadata. The envelope carries the
    /// string as stored by the server.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn set_player_data(
        &self,
        data: impl Into<String>,
    ) -> Result<ResponseEnvelope<String>, SessionError> {
        let body = PlayerDataRequest { data: data.into() };
        let envelope: ResponseEnvelope<MetadataPayload> = self
            .client
            .post(endpoints::METADATA, &body)
            .await?
            .require_data();
        Ok(envelope.map(MetadataPayload::into_string))
    }

    /// Encodes `value` as JSON and stores it as the metadata string.
    ///
    /// # Errors
    /// [`SessionError::Encode`] if `value` can't be serialized;
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn set_player_data_object<S: Serialize + Sync>(
        &self,
        value: &S,
    ) -> Result<ResponseEnvelope<String>, SessionError> {
        let data = self.client.codec().encode(value)?;
        self.set_player_data(data).await
    }

    /// Deletes the logged-in player's metadata. The server may or may not
    /// echo the deleted string.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn delete_player_data(
        &self,
    ) -> Result<ResponseEnvelope<Option<String>>, SessionError> {
        let envelope: ResponseEnvelope<Option<MetadataPayload>> =
            self.client.delete(endpoints::METADATA).await?;
        Ok(envelope.map(|payload| payload.map(MetadataPayload::into_string)))
    }
}
