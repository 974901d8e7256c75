use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature header")]
    MissingHeader,
    #[error("Malformed signature header")]
    MalformedHeader,
    #[error("Timestamp outside tolerance")]
    TimestampOutsideTolerance,
    #[error("No signature matches the payload")]
    NoMatchingSignature,
}

/// Verifies `t=<unix>,v1=<hex>` headers: HMAC-SHA256 over `"{t}.{payload}"`.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    pub fn verify(&self, payload: &[u8], header: Option<&str>, now: i64) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::MissingHeader)?;

        let mut timestamp: Option<i64> = None;
        let mut candidates = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = Some(value.parse().map_err(|_| SignatureError::MalformedHeader)?);
                }
                Some(("v1", value)) => candidates.push(value),
                // other schemes (v0) are ignored
                Some(_) => {}
                None => return Err(SignatureError::MalformedHeader),
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
        if candidates.is_empty() {
            return Err(SignatureError::NoMatchingSignature);
        }
        if self.tolerance_secs > 0 && now.abs_diff(timestamp) > self.tolerance_secs.unsigned_abs() {
            return Err(SignatureError::TimestampOutsideTolerance);
        }

        for candidate in candidates {
            let Ok(expected) = hex::decode(candidate) else {
                continue;
            };
            let Some(mac) = self.mac(timestamp, payload) else {
                break;
            };
            if mac.verify_slice(&expected).is_ok() {
                return Ok(());
            }
        }

        Err(SignatureError::NoMatchingSignature)
    }

    /// Produces a header value the way the provider does.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Option<String> {
        let digest = self.mac(timestamp, payload)?.finalize().into_bytes();
        Some(format!("t={},v1={}", timestamp, hex::encode(digest)))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Some(mac)
    }
}
