//! Author-metadata encryption seam.
//!
//! Image build metadata carries contact details for the requesting
//! author; the blob is encrypted before it leaves the client and
//! Launchpad stores it as-is. Encryption is an external capability
//! (symmetric GPG in production) kept behind a trait so the build
//! logic does not depend on any particular implementation.

use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("failed to run encryption command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("encryption command exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("ciphertext is not valid UTF-8")]
    InvalidOutput,
}

/// Symmetric encryption of metadata blobs.
pub trait MetadataCipher: Send + Sync {
    /// Encrypt `plaintext` under `passphrase`, returning ASCII-armored
    /// ciphertext.
    fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<String, CipherError>;
}

/// Shells out to `gpg` for symmetric encryption.
#[derive(Debug, Clone, Default)]
pub struct GpgCipher {
    binary: Option<String>,
}

impl GpgCipher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }

    fn binary(&self) -> &str {
        self.binary.as_deref().unwrap_or("gpg")
    }
}

impl MetadataCipher for GpgCipher {
    fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<String, CipherError> {
        let mut child = Command::new(self.binary())
            .args([
                "--batch",
                "--yes",
                "--armor",
                "--symmetric",
                "--pinentry-mode",
                "loopback",
                "--passphrase",
                passphrase,
                "--output",
                "-",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(ref mut stdin) = child.stdin {
            stdin.write_all(plaintext.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(CipherError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| CipherError::InvalidOutput)
    }
}
