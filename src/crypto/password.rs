/// Legacy credential verification
///
/// Stored credentials use the four-field format
/// `pbkdf2_sha256$<iterations>$<salt>$<base64 key>` inherited from the
/// previous HR system. Verification re-derives the key with the parameters
/// extracted from the stored string, so records written by either system
/// keep working.
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Supported algorithm tag
const ALGORITHM: &str = "pbkdf2_sha256";

/// Derived key length in bytes
const DERIVED_KEY_LEN: usize = 32;

/// Salt length for newly generated hashes
const SALT_LEN: usize = 22;

/// Verify a plaintext password against a stored credential string.
///
/// Returns true iff the plaintext, hashed with the exact parameters
/// extracted from the stored string, reproduces the stored derived key.
/// A malformed stored value (wrong field count, unknown algorithm,
/// non-numeric iteration count, undecodable key) never matches; it is
/// operator data the verifier must not crash on.
pub fn verify(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    if parts.len() != 4 {
        return false;
    }

    if parts[0] != ALGORITHM {
        return false;
    }

    let iterations: u32 = match parts[1].parse() {
        Ok(n) if n > 0 => n,
        _ => return false,
    };

    let salt = parts[2];

    let expected = match BASE64.decode(parts[3]) {
        Ok(bytes) if bytes.len() == DERIVED_KEY_LEN => bytes,
        _ => return false,
    };

    let mut derived = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived);

    derived.ct_eq(expected.as_slice()).into()
}

/// Hash a password into the stored credential format.
///
/// Produces the same four-field layout the legacy system writes, with a
/// fresh alphanumeric salt.
pub fn hash(password: &str, iterations: u32) -> String {
    let salt = generate_salt();

    let mut derived = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived);

    format!("{}${}${}${}", ALGORITHM, iterations, salt, BASE64.encode(derived))
}

/// Generate a random alphanumeric salt
fn generate_salt() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                             abcdefghijklmnopqrstuvwxyz\
                             0123456789";
    let mut rng = rand::thread_rng();
    (0..SALT_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
