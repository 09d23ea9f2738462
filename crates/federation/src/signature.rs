//! HTTP Signature implementation for `ActivityPub`.
//!
//! Implements draft-cavage-http-signatures for signing and verifying
//! requests. Outbound GETs sign `(request-target) date host`; outbound
//! POSTs additionally cover a SHA-256 `digest`. Inbound verification covers
//! whatever header set the remote chose.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rsa::pkcs1v15::{SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// HTTP Signature error.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("verification failed: {0}")]
    VerificationFailed(String),
    #[error("missing header: {0}")]
    MissingHeader(String),
    #[error("invalid signature header")]
    InvalidSignatureHeader,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// HTTP Signature signer for outgoing requests.
pub struct HttpSigner {
    private_key: RsaPrivateKey,
    key_id: String,
}

impl HttpSigner {
    /// Create a signer from a parsed private key and its published key id.
    #[must_use]
    pub const fn new(private_key: RsaPrivateKey, key_id: String) -> Self {
        Self {
            private_key,
            key_id,
        }
    }

    /// Sign a request and return the headers to attach.
    ///
    /// Produces `Host`, `Date`, `Digest` (when a body is present) and
    /// `Signature`.
    pub fn sign_request(
        &self,
        method: &str,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<HeaderMap, SignatureError> {
        let host = url
            .host_str()
            .ok_or_else(|| SignatureError::InvalidUrl("no host in URL".to_string()))?;
        let query = url.query().map_or(String::new(), |q| format!("?{q}"));
        let request_target = format!("{} {}{query}", method.to_lowercase(), url.path());

        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let digest = body.map(|b| {
            let hash = Sha256::digest(b);
            format!("SHA-256={}", BASE64.encode(hash))
        });

        let mut signed_headers = vec!["(request-target)", "date"];
        if digest.is_some() {
            signed_headers.push("digest");
        }
        signed_headers.push("host");

        let mut signing_parts = Vec::new();
        for header in &signed_headers {
            let value = match *header {
                "(request-target)" => request_target.clone(),
                "host" => host.to_string(),
                "date" => date.clone(),
                "digest" => digest.clone().unwrap_or_default(),
                _ => String::new(),
            };
            signing_parts.push(format!("{header}: {value}"));
        }
        let signing_string = signing_parts.join("\n");

        debug!(signing_string = %signing_string, "signing string");

        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let signature_bytes = signing_key
            .try_sign(signing_string.as_bytes())
            .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
        let signature = BASE64.encode(signature_bytes.to_bytes());

        let signature_header = format!(
            "keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            signed_headers.join(" "),
            signature
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            "Host",
            HeaderValue::from_str(host).map_err(|e| SignatureError::InvalidUrl(e.to_string()))?,
        );
        headers.insert(
            "Date",
            HeaderValue::from_str(&date).map_err(|e| SignatureError::SigningFailed(e.to_string()))?,
        );
        if let Some(ref d) = digest {
            headers.insert(
                "Digest",
                HeaderValue::from_str(d)
                    .map_err(|e| SignatureError::SigningFailed(e.to_string()))?,
            );
        }
        headers.insert(
            HeaderName::from_static("signature"),
            HeaderValue::from_str(&signature_header)
                .map_err(|e| SignatureError::SigningFailed(e.to_string()))?,
        );

        Ok(headers)
    }
}

/// HTTP Signature verifier for incoming requests.
pub struct HttpVerifier;

impl HttpVerifier {
    /// Parse the `Signature` header into components.
    pub fn parse_signature_header(header: &str) -> Result<SignatureComponents, SignatureError> {
        let mut key_id = None;
        let mut algorithm = None;
        let mut headers_list = None;
        let mut signature = None;

        for part in header.split(',') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                let value = value.trim_matches('"');
                match key {
                    "keyId" => key_id = Some(value.to_string()),
                    "algorithm" => algorithm = Some(value.to_string()),
                    "headers" => headers_list = Some(value.to_string()),
                    "signature" => signature = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        Ok(SignatureComponents {
            key_id: key_id.ok_or(SignatureError::InvalidSignatureHeader)?,
            algorithm: algorithm.unwrap_or_else(|| "rsa-sha256".to_string()),
            headers: headers_list
                .unwrap_or_else(|| "date".to_string())
                .split(' ')
                .map(String::from)
                .collect(),
            signature: signature.ok_or(SignatureError::InvalidSignatureHeader)?,
        })
    }

    /// Verify an HTTP signature against the given SPKI public key PEM.
    pub fn verify(
        public_key_pem: &str,
        components: &SignatureComponents,
        method: &str,
        path: &str,
        headers: &HashMap<String, String>,
    ) -> Result<bool, SignatureError> {
        let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

        let mut signing_parts = Vec::new();
        for header in &components.headers {
            let value = match header.as_str() {
                "(request-target)" => format!("{} {path}", method.to_lowercase()),
                h => headers
                    .get(h)
                    .ok_or_else(|| SignatureError::MissingHeader(h.to_string()))?
                    .clone(),
            };
            signing_parts.push(format!("{header}: {value}"));
        }
        let signing_string = signing_parts.join("\n");

        debug!(signing_string = %signing_string, "verifying signing string");

        let signature_bytes = BASE64
            .decode(&components.signature)
            .map_err(|e| SignatureError::VerificationFailed(e.to_string()))?;

        let verifying_key = VerifyingKey::<Sha256>::new(public_key);
        let signature = rsa::pkcs1v15::Signature::try_from(signature_bytes.as_slice())
            .map_err(|e| SignatureError::VerificationFailed(e.to_string()))?;

        match verifying_key.verify(signing_string.as_bytes(), &signature) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "signature verification failed");
                Ok(false)
            }
        }
    }
}

/// Parsed signature header components.
#[derive(Debug, Clone)]
pub struct SignatureComponents {
    pub key_id: String,
    pub algorithm: String,
    pub headers: Vec<String>,
    pub signature: String,
}

/// Calculate the SHA-256 digest header value of a body.
#[must_use]
pub fn calculate_digest(body: &[u8]) -> String {
    let hash = Sha256::digest(body);
    format!("SHA-256={}", BASE64.encode(hash))
}

/// Verify that a digest header matches the body.
#[must_use]
pub fn verify_digest(body: &[u8], digest_header: &str) -> bool {
    calculate_digest(body) == digest_header
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn generate_test_keypair() -> (RsaPrivateKey, String) {
        use rsa::pkcs8::{EncodePublicKey, LineEnding};

        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public_pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .unwrap();

        (private_key, public_pem)
    }

    #[test]
    fn test_sign_and_verify_post() {
        let (private_key, public_pem) = generate_test_keypair();
        let signer = HttpSigner::new(
            private_key,
            "https://example.com/ap/acct/test#main-key".to_string(),
        );

        let url = Url::parse("https://remote.example/inbox").unwrap();
        let body = br#"{"type":"Create"}"#;

        let headers = signer.sign_request("POST", &url, Some(body)).unwrap();

        let sig_header = headers.get("signature").unwrap().to_str().unwrap();
        let components = HttpVerifier::parse_signature_header(sig_header).unwrap();
        assert_eq!(
            components.headers,
            vec!["(request-target)", "date", "digest", "host"]
        );

        let mut verify_headers = HashMap::new();
        verify_headers.insert("host".to_string(), "remote.example".to_string());
        verify_headers.insert(
            "date".to_string(),
            headers.get("Date").unwrap().to_str().unwrap().to_string(),
        );
        verify_headers.insert(
            "digest".to_string(),
            headers.get("Digest").unwrap().to_str().unwrap().to_string(),
        );

        let valid =
            HttpVerifier::verify(&public_pem, &components, "POST", "/inbox", &verify_headers)
                .unwrap();
        assert!(valid);

        // tampering with the date invalidates the signature
        verify_headers.insert("date".to_string(), "Sun, 06 Nov 1994 08:49:37 GMT".to_string());
        let valid =
            HttpVerifier::verify(&public_pem, &components, "POST", "/inbox", &verify_headers)
                .unwrap();
        assert!(!valid);
    }

    #[test]
    fn test_get_signature_covers_no_digest() {
        let (private_key, _) = generate_test_keypair();
        let signer = HttpSigner::new(private_key, "key".to_string());

        let url = Url::parse("https://remote.example/users/bob").unwrap();
        let headers = signer.sign_request("GET", &url, None).unwrap();

        assert!(headers.get("Digest").is_none());
        let sig_header = headers.get("signature").unwrap().to_str().unwrap();
        let components = HttpVerifier::parse_signature_header(sig_header).unwrap();
        assert_eq!(components.headers, vec!["(request-target)", "date", "host"]);
    }

    #[test]
    fn test_parse_signature_header() {
        let header = r#"keyId="https://example.com/users/test#main-key",algorithm="rsa-sha256",headers="(request-target) host date digest",signature="abc123==""#;

        let components = HttpVerifier::parse_signature_header(header).unwrap();

        assert_eq!(components.key_id, "https://example.com/users/test#main-key");
        assert_eq!(components.algorithm, "rsa-sha256");
        assert_eq!(components.signature, "abc123==");
    }

    #[test]
    fn test_parse_rejects_missing_key_id() {
        assert!(HttpVerifier::parse_signature_header("algorithm=\"rsa-sha256\"").is_err());
    }

    #[test]
    fn test_verify_digest() {
        let body = b"hello world";
        let digest = calculate_digest(body);
        assert!(verify_digest(body, &digest));
        assert!(!verify_digest(b"wrong body", &digest));
    }
}
