use chat_datastore::LiveInfo;

use crate::{error::Error, twitch::StatusSource};

/// Resolves a channel's live status through a [`StatusSource`].
///
/// Never retries: a failed lookup is returned to the caller, which owns the
/// retry policy.
#[derive(Debug, Clone)]
pub struct StatusProber<S> {
    source: S,
}

impl<S> StatusProber<S>
where
    S: StatusSource + Send + Sync,
{
    pub fn new(source: S) -> Self {
        StatusProber { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Looks up the channel's user, then its live stream.
    ///
    /// # Returns
    /// * `Ok(LiveInfo)` with `is_live = false` if the channel does not exist or
    ///   is not streaming.
    /// * `Err(Error::Lookup)` if either lookup fails.
    #[tracing::instrument(skip(self))]
    pub async fn probe(&self, channel: &str) -> Result<LiveInfo, Error> {
        let lookup_error = |e: S::Error| Error::Lookup {
            channel: channel.to_string(),
            reason: e.to_string(),
        };

        let Some(user) = self
            .source
            .lookup_user(channel)
            .await
            .map_err(lookup_error)?
        else {
            tracing::warn!(%channel, "Channel not found");
            return Ok(LiveInfo::offline());
        };

        let stream = self
            .source
            .lookup_stream(&user.id)
            .await
            .map_err(lookup_error)?;

        Ok(stream.map(LiveInfo::from).unwrap_or_else(LiveInfo::offline))
    }
}
