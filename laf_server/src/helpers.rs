use hmac::{Hmac, Mac};
use sha2::Sha256;

/// HMAC-SHA256 over `data`, base64 encoded, matching the signature scheme the checkout gateway uses for its
/// webhook calls.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}
