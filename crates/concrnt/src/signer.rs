//! Proxy document signing and address derivation.
//!
//! Documents minted on behalf of remote AP authors are signed with the
//! server-wide proxy key. The signature covers the serialized document
//! bytes and travels hex-encoded inside the commit.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ccbridge_common::{AppError, AppResult};
use ed25519_dalek::{Signer, SigningKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Length of a derived address: `CC` + 40 hex chars.
const CCID_LEN: usize = 42;

fn signing_key(priv_hex: &str) -> AppResult<SigningKey> {
    let bytes = hex::decode(priv_hex.trim())
        .map_err(|e| AppError::Crypto(format!("invalid private key hex: {e}")))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| AppError::Crypto("private key must be 32 bytes".to_string()))?;
    Ok(SigningKey::from_bytes(&bytes))
}

/// Sign serialized document bytes with the proxy private key.
///
/// Returns the hex-encoded signature carried in [`crate::Commit`].
///
/// # Errors
///
/// Returns [`AppError::Crypto`] on malformed key material.
pub fn sign_document(document: &[u8], priv_hex: &str) -> AppResult<String> {
    let key = signing_key(priv_hex)?;
    let signature = key.sign(document);
    Ok(hex::encode(signature.to_bytes()))
}

/// Derive the 42-char address of the key holder.
///
/// `CC` followed by the first 20 bytes of the SHA-256 of the verifying key,
/// lowercase hex.
///
/// # Errors
///
/// Returns [`AppError::Crypto`] on malformed key material.
pub fn derive_ccid(priv_hex: &str) -> AppResult<String> {
    let key = signing_key(priv_hex)?;
    let digest = Sha256::digest(key.verifying_key().as_bytes());
    let ccid = format!("CC{}", hex::encode(&digest[..20]));
    debug_assert_eq!(ccid.len(), CCID_LEN);
    Ok(ccid)
}

#[derive(Serialize)]
struct TokenHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct TokenClaims {
    jti: String,
    iat: String,
    exp: String,
    aud: String,
    iss: String,
    sub: String,
}

/// Mint a short-lived (5 minute) gateway auth token signed by the proxy key.
///
/// Used when fetching messages whose visibility policy restricts readers.
///
/// # Errors
///
/// Returns [`AppError::Crypto`] on malformed key material.
pub fn create_token(audience: &str, issuer_ccid: &str, priv_hex: &str) -> AppResult<String> {
    let key = signing_key(priv_hex)?;

    let now = chrono::Utc::now().timestamp();
    let header = TokenHeader {
        alg: "EdDSA",
        typ: "JWT",
    };
    let claims = TokenClaims {
        jti: uuid::Uuid::new_v4().to_string(),
        iat: now.to_string(),
        exp: (now + 300).to_string(),
        aud: audience.to_string(),
        iss: issuer_ccid.to_string(),
        sub: "concrnt".to_string(),
    };

    let header = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&header).map_err(|e| AppError::Crypto(e.to_string()))?,
    );
    let claims = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&claims).map_err(|e| AppError::Crypto(e.to_string()))?,
    );

    let payload = format!("{header}.{claims}");
    let signature = key.sign(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(signature.to_bytes());

    Ok(format!("{payload}.{signature}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    const TEST_PRIV: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    #[test]
    fn test_derive_ccid_shape() {
        let ccid = derive_ccid(TEST_PRIV).unwrap();
        assert_eq!(ccid.len(), CCID_LEN);
        assert!(ccid.starts_with("CC"));
        assert!(ccid[2..].chars().all(|c| c.is_ascii_hexdigit()));
        // deterministic
        assert_eq!(ccid, derive_ccid(TEST_PRIV).unwrap());
    }

    #[test]
    fn test_sign_document_verifies() {
        let document = br#"{"signer":"CCtest","type":"message"}"#;
        let sig_hex = sign_document(document, TEST_PRIV).unwrap();

        let key = signing_key(TEST_PRIV).unwrap();
        let sig_bytes: [u8; 64] = hex::decode(sig_hex).unwrap().try_into().unwrap();
        let signature = Signature::from_bytes(&sig_bytes);
        key.verifying_key().verify(document, &signature).unwrap();
    }

    #[test]
    fn test_sign_rejects_bad_key() {
        assert!(sign_document(b"x", "not-hex").is_err());
        assert!(sign_document(b"x", "abcd").is_err());
    }

    #[test]
    fn test_create_token_shape() {
        let token = create_token("example.com", "CCproxy", TEST_PRIV).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let claims = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let claims: serde_json::Value = serde_json::from_slice(&claims).unwrap();
        assert_eq!(claims["aud"], "example.com");
        assert_eq!(claims["iss"], "CCproxy");
        assert_eq!(claims["sub"], "concrnt");
    }
}
