//! Secret generation for blinded messages. Random secrets back normal change output; deterministic
//! secrets (`{base}_{index}`) let a sender precompute the exact secrets a receiver will need to
//! redeem a token, without any interaction beyond sharing `base`.

use moksha_core::amount::generate_random_secret;

use crate::error::MokshaWalletError;
use crate::localstore::LocalStore;

const MAX_SECRET_RETRIES: usize = 5;

pub fn generate_deterministic_secrets(base: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{base}_{i}")).collect()
}

/// Draws `count` random secrets guaranteed not to collide with anything already in `local`.
/// Retries on collision up to [`MAX_SECRET_RETRIES`] times per secret before giving up.
pub async fn generate_unique_random_secrets(
    local: &impl LocalStore,
    count: usize,
) -> Result<Vec<String>, MokshaWalletError> {
    let mut secrets = Vec::with_capacity(count);
    for _ in 0..count {
        let mut attempt = 0;
        loop {
            let candidate = generate_random_secret();
            if !local.secret_used(&candidate).await? {
                secrets.push(candidate);
                break;
            }
            attempt += 1;
            if attempt >= MAX_SECRET_RETRIES {
                return Err(MokshaWalletError::SecretReused(count, MAX_SECRET_RETRIES));
            }
        }
    }
    Ok(secrets)
}
