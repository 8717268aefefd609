/// Credential utilities
///
/// # Modules
///
/// - [`password`]: random password generation and Argon2id hashing/verification
///
/// # Security Features
///
/// - **Password Generation**: 62-symbol alphanumeric alphabet drawn from the OS CSPRNG
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations, per-hash salt
/// - **Constant-time Comparison**: verification never short-circuits on the digest
///
/// # Example
///
/// ```no_run
/// use accessgate_shared::auth::password::{generate_random_password, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let password = generate_random_password(8);
/// let hash = hash_password(password.expose())?;
/// assert!(verify_password(password.expose(), &hash));
/// # Ok(())
/// # }
/// ```

pub mod password;
