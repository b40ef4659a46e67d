//! Mock Launchpad implementation.
//!
//! An in-process stand-in for the Launchpad API used by unit and
//! integration tests. Supports the operations the lane issues, with
//! seedable state and per-operation error injection.
//!
//! # Usage
//!
//! Configure a [`MockLaunchpad`], hand a clone to a [`MockSession`],
//! drive the lane through it and assert on the resulting records.

mod launchpad;
mod session;
mod state;

pub use launchpad::MockLaunchpad;
pub use session::MockSession;
pub use state::{BuildRecord, MockState, SnapRecord, WebhookRecord};

use crate::crypto::{CipherError, MetadataCipher};

/// Deterministic stand-in for the GPG cipher.
///
/// Produces armored-looking output embedding both inputs so tests can
/// assert what was encrypted and under which passphrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeCipher;

impl MetadataCipher for FakeCipher {
    fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<String, CipherError> {
        Ok(format!(
            "-----BEGIN PGP MESSAGE-----\n[{passphrase}|{plaintext}]\n-----END PGP MESSAGE-----"
        ))
    }
}
