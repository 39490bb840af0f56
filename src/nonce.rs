use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

/// Length of a generated `oauth_nonce`.
pub const NONCE_LEN: usize = 32;

/// Source of `oauth_nonce` values.
///
/// Implementations must be safe to share between concurrently running
/// signers; two processes signing with the same credentials must not be able
/// to collide in practice.
pub trait NonceSource: Send + Sync {
    /// Produce `len` random characters from `[A-Za-z0-9]`.
    fn alphanumeric(&self, len: usize) -> String;
}

/// Draws nonces from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsNonce;

impl NonceSource for OsNonce {
    fn alphanumeric(&self, len: usize) -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

/// Always yields the same value, truncated or repeated to the requested length.
#[derive(Debug, Clone)]
pub struct FixedNonce(pub String);

impl NonceSource for FixedNonce {
    fn alphanumeric(&self, len: usize) -> String {
        self.0.chars().cycle().take(len).collect()
    }
}
