//! Payment signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{CheckoutError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded SHA-256 MAC.
const SIGNATURE_HEX_LEN: usize = 64;

/// Verifies the signature the gateway attaches to a completed payment.
///
/// The signature is the lower-case hex `HMAC-SHA256(secret, "{order_id}|{payment_id}")`.
#[derive(Clone)]
pub struct SignatureVerifier {
    key: HmacSha256,
}

impl SignatureVerifier {
    /// Creates a verifier keyed with the gateway's API secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CheckoutError::InvalidSecret);
        }
        let key = HmacSha256::new_from_slice(secret).map_err(|_| CheckoutError::InvalidSecret)?;
        Ok(Self { key })
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> HmacSha256 {
        let mut mac = self.key.clone();
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac
    }

    /// Computes the signature for an order and payment id pair.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        hex::encode(self.mac(order_id, payment_id).finalize().into_bytes())
    }

    /// Checks a signature in constant time.
    ///
    /// Only the exact lower-case hex form produced by [`sign`](Self::sign) is
    /// accepted; padding or upper-case digits are a mismatch.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<()> {
        if signature.len() != SIGNATURE_HEX_LEN
            || !signature
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(CheckoutError::SignatureMismatch);
        }
        let expected = hex::decode(signature).map_err(|_| CheckoutError::SignatureMismatch)?;
        self.mac(order_id, payment_id)
            .verify_slice(&expected)
            .map_err(|_| CheckoutError::SignatureMismatch)
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}
