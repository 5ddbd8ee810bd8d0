//! The client's half of the handshake: signing challenges.

use base64::{Engine, engine::general_purpose::STANDARD as B64};
use ed25519_dalek::{Signer, SigningKey};
use rand::Rng;

use crate::AuthError;

/// Signs server challenges with a client's Ed25519 private key.
///
/// Stateless apart from the key itself. Private keys are accepted in the
/// two shapes operators have on disk: a bare 32-byte seed, or the 64-byte
/// `seed ‖ public key` keypair form.
pub struct ClientSigner {
    key: SigningKey,
}

impl ClientSigner {
    /// Builds a signer from raw private key bytes (32 or 64 bytes).
    ///
    /// # Errors
    /// [`AuthError::InvalidPrivateKey`] for any other length, or if a
    /// 64-byte keypair's public half doesn't match its seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthError> {
        let key = match bytes.len() {
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(bytes);
                SigningKey::from_bytes(&seed)
            }
            64 => {
                let mut pair = [0u8; 64];
                pair.copy_from_slice(bytes);
                SigningKey::from_keypair_bytes(&pair).map_err(|e| {
                    AuthError::InvalidPrivateKey(e.to_string())
                })?
            }
            n => {
                return Err(AuthError::InvalidPrivateKey(format!(
                    "expected 32 or 64 bytes, got {n}"
                )));
            }
        };
        Ok(Self { key })
    }

    /// Builds a signer from a base64 (standard alphabet) private key, the
    /// form it takes in the client's config file.
    pub fn from_base64(encoded: &str) -> Result<Self, AuthError> {
        let bytes = B64
            .decode(encoded.trim())
            .map_err(|e| AuthError::InvalidPrivateKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Generates a fresh random key.
    pub fn generate() -> Self {
        let seed: [u8; 32] = rand::rng().random();
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// Signs the challenge string's bytes and returns the signature in
    /// base64, ready for the verify request.
    pub fn sign_challenge(&self, nonce: &str) -> String {
        let signature = self.key.sign(nonce.as_bytes());
        B64.encode(signature.to_bytes())
    }

    /// The matching public key in base64, the form the server's registry
    /// stores.
    pub fn public_key_base64(&self) -> String {
        B64.encode(self.key.verifying_key().as_bytes())
    }

    /// The 64-byte keypair form of the private key in base64.
    pub fn keypair_base64(&self) -> String {
        B64.encode(self.key.to_keypair_bytes())
    }
}

impl std::fmt::Debug for ClientSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the private key.
        f.debug_struct("ClientSigner")
            .field("public_key", &self.public_key_base64())
            .finish()
    }
}
