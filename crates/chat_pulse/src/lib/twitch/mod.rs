pub mod helix;
pub mod irc;

use std::{fmt::Display, future::Future};

use crate::types::{HelixStream, HelixUser};

/// Where the live status of a channel comes from.
///
/// `Ok(None)` means the user or stream does not exist, an `Err` means the
/// lookup itself failed and must not be read as "offline".
pub trait StatusSource {
    type Error: Display;

    fn lookup_user(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<Option<HelixUser>, Self::Error>> + Send;

    fn lookup_stream(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<HelixStream>, Self::Error>> + Send;
}
