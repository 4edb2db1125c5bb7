//! Time-based one-time passwords (RFC 6238) for authenticator apps, plus recovery codes.

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::{distributions::Uniform, Rng, RngCore};
use sha1::Sha1;
use sha2::{Digest, Sha256};

const STEP_SECONDS: i64 = 30;
const DIGITS: u32 = 6;
const ALLOWED_DRIFT_STEPS: i64 = 1;
const RECOVERY_CODE_ALPHABET: &[u8] = b"23456789BCDFGHJKMNPQRTVWXY";

pub const RECOVERY_CODE_COUNT: usize = 10;

/// Fresh base32 shared key (160 bits) for enrolling an authenticator
pub fn generate_shared_key() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE32_NOPAD.encode(&bytes)
}

/// The code an authenticator shows at `at` for the given key
pub fn code_at(shared_key: &str, at: DateTime<Utc>) -> Option<String> {
    let key = decode_key(shared_key)?;
    Some(format!("{:0width$}", hotp(&key, (at.timestamp() / STEP_SECONDS) as u64), width = DIGITS as usize))
}

/// Check a user-entered code, tolerating one step of clock drift either way
pub fn verify(shared_key: &str, code: &str, at: DateTime<Utc>) -> bool {
    let code = code.replace([' ', '-'], "");
    if code.len() != DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let Ok(expected) = code.parse::<u32>() else {
        return false;
    };
    let Some(key) = decode_key(shared_key) else {
        return false;
    };

    let counter = at.timestamp() / STEP_SECONDS;
    (-ALLOWED_DRIFT_STEPS..=ALLOWED_DRIFT_STEPS)
        .any(|drift| hotp(&key, (counter + drift) as u64) == expected)
}

/// Plain recovery codes shaped like `XXXXX-XXXXX`
pub fn generate_recovery_codes() -> Vec<String> {
    let mut rng = rand::thread_rng();
    let dist = Uniform::from(0..RECOVERY_CODE_ALPHABET.len());
    (0..RECOVERY_CODE_COUNT)
        .map(|_| {
            let chars: String = (0..10)
                .map(|_| RECOVERY_CODE_ALPHABET[rng.sample(dist)] as char)
                .collect();
            format!("{}-{}", &chars[..5], &chars[5..])
        })
        .collect()
}

/// Stored form of a recovery code
pub fn hash_recovery_code(code: &str) -> String {
    let digest = Sha256::digest(code.trim().to_uppercase().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn decode_key(shared_key: &str) -> Option<Vec<u8>> {
    let normalized: String = shared_key
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    BASE32_NOPAD.decode(normalized.trim_end_matches('=').as_bytes()).ok()
}

fn hotp(key: &[u8], counter: u64) -> u32 {
    let mut mac = match Hmac::<Sha1>::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => return u32::MAX,
    };
    mac.update(&counter.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let binary = ((hash[offset] as u32 & 0x7f) << 24)
        | ((hash[offset + 1] as u32) << 16)
        | ((hash[offset + 2] as u32) << 8)
        | hash[offset + 3] as u32;

    binary % 10u32.pow(DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // RFC 6238 appendix B seed "12345678901234567890"
    const RFC_KEY: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn matches_rfc_6238_vectors() {
        let at = Utc.timestamp_opt(59, 0).unwrap();
        assert_eq!(code_at(RFC_KEY, at).as_deref(), Some("287082"));

        let at = Utc.timestamp_opt(1_111_111_109, 0).unwrap();
        assert_eq!(code_at(RFC_KEY, at).as_deref(), Some("081804"));
    }

    #[test]
    fn verify_allows_one_step_of_drift() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let previous = code_at(RFC_KEY, now - chrono::Duration::seconds(30)).unwrap();
        let next = code_at(RFC_KEY, now + chrono::Duration::seconds(30)).unwrap();

        assert!(verify(RFC_KEY, &previous, now));
        assert!(verify(RFC_KEY, &next, now));
        assert!(!verify(RFC_KEY, "12ab56", now));
        assert!(!verify(RFC_KEY, "1234567", now));
    }

    #[test]
    fn shared_keys_decode() {
        let key = generate_shared_key();
        assert_eq!(key.len(), 32);
        assert!(code_at(&key, Utc::now()).is_some());
    }

    #[test]
    fn recovery_codes_are_distinct_and_hash_case_insensitively() {
        let codes = generate_recovery_codes();
        assert_eq!(codes.len(), RECOVERY_CODE_COUNT);
        assert_eq!(codes[0].len(), 11);
        assert_eq!(hash_recovery_code(&codes[0]), hash_recovery_code(&codes[0].to_lowercase()));
    }
}
