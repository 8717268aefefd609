/// Password generation and hashing using Argon2id
///
/// This module provides the credential primitives used when provisioning an
/// account from a purchase and when verifying a login:
///
/// - Random password generation from the 62-symbol alphanumeric alphabet
/// - Salted Argon2id hashing (PHC string format)
/// - Constant-time verification that never fails loudly on a bad hash
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
/// - **Randomness**: passwords and salts both come from the OS CSPRNG
///
/// # Example
///
/// ```
/// use accessgate_shared::auth::password::{generate_random_password, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let password = generate_random_password(8);
/// let hash = hash_password(password.expose())?;
///
/// assert!(verify_password(password.expose(), &hash));
/// assert!(!verify_password("wrong_password", &hash));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng as SaltRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use secrecy::{ExposeSecret, SecretString};

/// Length of passwords generated for new accounts
pub const DEFAULT_PASSWORD_LENGTH: usize = 8;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// The blocking hash task did not complete
    #[error("Password task failed: {0}")]
    TaskFailed(String),
}

/// A freshly generated plaintext password
///
/// The plaintext only lives in memory for the duration of a provisioning run
/// and in the one outbound access email. It is held in a [`SecretString`], so
/// `Debug` is redacted and the buffer is zeroized on drop; call
/// [`expose`](Self::expose) where the plaintext is genuinely needed.
#[derive(Debug, Clone)]
pub struct GeneratedPassword(SecretString);

impl GeneratedPassword {
    /// Returns the plaintext password
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Number of characters in the password
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    /// Whether the password is empty (only possible with a zero length request)
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

/// Generates a random alphanumeric password
///
/// Each character is drawn uniformly from `A-Z`, `a-z` and `0-9` (62 symbols)
/// using the operating system's CSPRNG. No uniqueness is guaranteed across
/// calls; at the default length the key space is 62^8 ≈ 2^47.
///
/// # Example
///
/// ```
/// use accessgate_shared::auth::password::{generate_random_password, DEFAULT_PASSWORD_LENGTH};
///
/// let password = generate_random_password(DEFAULT_PASSWORD_LENGTH);
/// assert_eq!(password.len(), 8);
/// assert!(password.expose().chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_random_password(length: usize) -> GeneratedPassword {
    let password: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();

    GeneratedPassword(SecretString::from(password))
}

fn argon2() -> Result<Argon2<'static>, PasswordError> {
    // - m_cost: 64 MB (65536 KB) of memory
    // - t_cost: 3 iterations
    // - p_cost: 4 parallel lanes
    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password using Argon2id with a fresh random salt
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash)
///
/// Example output:
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut SaltRng);

    let password_hash = argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// The algorithm, parameters and salt are read back from the PHC string, and
/// the digest comparison is constant time. A malformed hash is treated as a
/// mismatch: it is logged and `false` is returned.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Password verification failed");
            false
        }
    }
}

/// Runs [`hash_password`] on the blocking thread pool
///
/// Argon2id is deliberately expensive, so async callers hand it off rather
/// than stall the runtime.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}

/// Runs [`verify_password`] on the blocking thread pool
///
/// A failed blocking task counts as a mismatch.
pub async fn verify_password_blocking(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await {
        Ok(valid) => valid,
        Err(e) => {
            tracing::error!(error = %e, "Password verification task failed");
            false
        }
    }
}
