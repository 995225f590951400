//! Leaderboard reads and score submission.

use std::sync::Arc;

use cratebytes_protocol::{
    LeaderboardPage, ResponseEnvelope, ScoreSubmission, ScoreSubmitRequest, endpoints,
};
use cratebytes_session::{ApiClient, SessionError};
use cratebytes_transport::Transport;

/// Reads leaderboard pages and submits scores. Both calls require a
/// logged-in player.
pub struct LeaderboardService<T> {
    client: Arc<ApiClient<T>>,
}

impl<T: Transport> LeaderboardService<T> {
    pub(crate) fn new(client: Arc<ApiClient<T>>) -> Self {
        Self { client }
    }

    /// Fetches one page (1-based) of a leaderboard.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn get_leaderboard(
        &self,
        leaderboard_id: &str,
        page: u32,
    ) -> Result<ResponseEnvelope<LeaderboardPage>, SessionError> {
        let path = endpoints::leaderboard_page(leaderboard_id, page.max(1));
        Ok(self.client.get(&path).await?.require_data())
    }

    /// Submits a score. Scores travel as strings; the server interprets
    /// them according to the leaderboard's type.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn submit_score(
        &self,
        leaderboard_id: &str,
        score: impl Into<String>,
    ) -> Result<ResponseEnvelope<ScoreSubmission>, SessionError> {
        let body = ScoreSubmitRequest {
            score: score.into(),
        };
        let envelope: ResponseEnvelope<ScoreSubmission> = self
            .client
            .post(&endpoints::leaderboard_submit(leaderboard_id), &body)
            .await?
            .require_data();
        if envelope.success {
            tracing::info!(leaderboard_id, score = %body.score, "score submitted");
        }
        Ok(envelope)
    }
}
