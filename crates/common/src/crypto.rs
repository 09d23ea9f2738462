//! RSA key material for `ActivityPub` HTTP Signatures.
//!
//! Each local entity carries a 2048-bit RSA key pair generated at creation
//! time. The public half is published in the actor document; the private
//! half signs outbound requests and never leaves the server.

use rsa::{
    pkcs1::DecodeRsaPrivateKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
    RsaPrivateKey, RsaPublicKey,
};

use crate::{AppError, AppResult};

/// RSA key pair in PEM form.
#[derive(Debug, Clone)]
pub struct RsaKeypair {
    /// Public key in PEM format (SPKI encoding).
    pub public_key_pem: String,
    /// Private key in PEM format (PKCS#8 encoding).
    pub private_key_pem: String,
}

const RSA_KEY_SIZE: usize = 2048;

/// Generate a new RSA key pair for an entity.
///
/// # Errors
///
/// Returns [`AppError::Crypto`] if key generation or PEM encoding fails.
pub fn generate_rsa_keypair() -> AppResult<RsaKeypair> {
    let mut rng = rand::thread_rng();

    let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_SIZE)
        .map_err(|e| AppError::Crypto(format!("failed to generate RSA key: {e}")))?;

    let public_key = RsaPublicKey::from(&private_key);

    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| AppError::Crypto(format!("failed to encode private key: {e}")))?
        .to_string();

    let public_key_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| AppError::Crypto(format!("failed to encode public key: {e}")))?;

    Ok(RsaKeypair {
        public_key_pem,
        private_key_pem,
    })
}

/// Parse an RSA private key from PEM.
///
/// Accepts PKCS#8 (`BEGIN PRIVATE KEY`) and falls back to PKCS#1
/// (`BEGIN RSA PRIVATE KEY`); stored keys exist in both encodings.
///
/// # Errors
///
/// Returns [`AppError::Crypto`] when neither encoding parses.
pub fn parse_private_key(pem: &str) -> AppResult<RsaPrivateKey> {
    if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
        return Ok(key);
    }
    RsaPrivateKey::from_pkcs1_pem(pem)
        .map_err(|e| AppError::Crypto(format!("failed to parse private key: {e}")))
}

/// Parse an RSA public key from SPKI PEM.
///
/// # Errors
///
/// Returns [`AppError::Crypto`] if the PEM is not a valid SPKI RSA key.
pub fn parse_public_key(pem: &str) -> AppResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| AppError::Crypto(format!("failed to parse public key: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair() {
        let keypair = generate_rsa_keypair().unwrap();

        assert!(keypair.public_key_pem.contains("BEGIN PUBLIC KEY"));
        assert!(keypair.private_key_pem.contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn test_parse_generated_keys() {
        let keypair = generate_rsa_keypair().unwrap();

        parse_private_key(&keypair.private_key_pem).unwrap();
        parse_public_key(&keypair.public_key_pem).unwrap();
    }

    #[test]
    fn test_parse_pkcs1_private_key() {
        use rsa::pkcs1::EncodeRsaPrivateKey;

        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let pem = key.to_pkcs1_pem(LineEnding::LF).unwrap().to_string();
        assert!(pem.contains("BEGIN RSA PRIVATE KEY"));

        parse_private_key(&pem).unwrap();
    }
}
