use crate::{
    error::{ApiError, Result},
    services::ReplicateService,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::instrument;

type HmacSha256 = Hmac<Sha256>;

/// Required headers on every provider delivery.
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

/// Authenticates inbound completion callbacks.
///
/// The provider signs `{id}.{timestamp}.{body}` with HMAC-SHA256 using a
/// rotating account secret. The signature header may carry several
/// space-separated `v{n},{base64}` candidates so deliveries stay valid across
/// a key rotation; any one match accepts.
pub struct WebhookVerifier {
    replicate: Arc<ReplicateService>,
    timestamp_tolerance_seconds: i64,
}

impl WebhookVerifier {
    pub fn new(replicate: Arc<ReplicateService>, timestamp_tolerance_seconds: i64) -> Self {
        Self {
            replicate,
            timestamp_tolerance_seconds,
        }
    }

    /// Verify one delivery. The signing secret is fetched from the provider
    /// per call, it rotates and must not be cached for the process lifetime.
    ///
    /// A secret-fetch failure propagates as a provider error (the caller
    /// answers non-2xx and the delivery is retried); everything else maps to
    /// `SignatureVerification`.
    #[instrument(skip(self, body))]
    pub async fn verify(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<()> {
        let timestamp: i64 = headers.timestamp.parse().map_err(|_| {
            ApiError::SignatureVerification(format!(
                "Non-numeric delivery timestamp {:?}",
                headers.timestamp
            ))
        })?;

        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        if !timestamp_is_fresh(timestamp, now, self.timestamp_tolerance_seconds) {
            return Err(ApiError::SignatureVerification(format!(
                "Delivery timestamp {} outside tolerance of {}s",
                timestamp, self.timestamp_tolerance_seconds
            )));
        }

        let secret = self.replicate.get_webhook_secret().await?;
        let key = decode_secret_key(&secret).ok_or_else(|| {
            ApiError::SignatureVerification("Provider secret is not in prefix_base64 form".into())
        })?;

        if verify_with_key(&key, &headers.id, &headers.timestamp, body, &headers.signature) {
            Ok(())
        } else {
            Err(ApiError::SignatureVerification(
                "No candidate signature matched".into(),
            ))
        }
    }
}

/// Extract HMAC key material from a `whsec_`-style secret: the part after the
/// first underscore, base64-decoded.
fn decode_secret_key(secret: &str) -> Option<Vec<u8>> {
    let (_, encoded) = secret.split_once('_')?;
    BASE64_STANDARD.decode(encoded).ok()
}

/// Compute the expected signature over `{id}.{timestamp}.{body}`.
fn compute_signature(key: &[u8], id: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Check every `v{n},{sig}` candidate in the signature header against the
/// recomputed value. Comparison is constant-time per candidate.
fn verify_with_key(key: &[u8], id: &str, timestamp: &str, body: &[u8], header: &str) -> bool {
    let expected = compute_signature(key, id, timestamp, body);

    header
        .split_whitespace()
        .filter_map(|candidate| candidate.split_once(',').map(|(_, sig)| sig))
        .any(|sig| constant_time_eq(sig.as_bytes(), expected.as_bytes()))
}

fn timestamp_is_fresh(timestamp: i64, now: i64, tolerance: i64) -> bool {
    (now - timestamp).abs() <= tolerance
}

/// Constant-time byte comparison to prevent timing side-channels.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
