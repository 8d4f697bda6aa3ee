use std::{io, path::Path};

use thiserror::Error;

use crate::remote::{InputRef, ItemDescriptor};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Account tiers differ in how many saved items a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountTier {
    Ordinary,
    Elevated,
}

/// Remote calls needed to walk and export a saved collection.
///
/// Calls are issued one at a time and awaited before the next one starts.
pub trait RemoteListClient {
    /// Newest-first listing of the currently visible window. The number of
    /// returned items is compared against the window size by the caller.
    async fn list_saved(&mut self) -> Result<Vec<ItemDescriptor>, RemoteError>;

    async fn set_saved_state(&mut self, item: &InputRef, saved: bool) -> Result<(), RemoteError>;

    async fn who_am_i(&mut self) -> Result<AccountTier, RemoteError>;

    /// Writes the content of `item` to `destination`, replacing it if present.
    async fn download(
        &mut self,
        item: &ItemDescriptor,
        destination: &Path,
    ) -> Result<(), RemoteError>;
}
