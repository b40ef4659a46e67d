//! Crate-level error taxonomy.
//!
//! Each concern keeps its own error enum; this type unifies them for
//! the lifecycle operations that can fail in more than one way.

use crate::client::RequestError;
use crate::crypto::CipherError;
use crate::resolver::ResolveError;
use crate::session::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// A lifecycle operation needed an existing recipe and found none.
    #[error("no snap recipe registered for store name '{store_name}'")]
    SnapNotFound { store_name: String },
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Request(RequestError::Transport(err))
    }
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SnapNotFound { .. })
    }
}
