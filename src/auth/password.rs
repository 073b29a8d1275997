use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{debug, error};

use crate::config::PasswordConfig;

/// One-way credential codec: Argon2id with a configurable work factor and a
/// fresh random salt per hash. Output is a PHC string.
#[derive(Clone)]
pub struct PasswordCodec {
    params: Params,
    // Verified against when the account does not exist, so both login
    // failure paths cost one Argon2 run.
    dummy_hash: Arc<str>,
}

impl PasswordCodec {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        let mut codec = Self {
            params,
            dummy_hash: Arc::from(""),
        };
        codec.dummy_hash = Arc::from(codec.hash("timing-equalizer-password")?);
        Ok(codec)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// `false` on mismatch and on a malformed stored credential.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "stored credential is not a valid PHC string");
                return false;
            }
        };
        self.argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spends the same work as a real verification and always fails.
    pub fn verify_dummy(&self, plain: &str) -> bool {
        let _ = self.verify(plain, &self.dummy_hash);
        false
    }

    pub async fn hash_blocking(&self, plain: String) -> anyhow::Result<String> {
        let codec = self.clone();
        tokio::task::spawn_blocking(move || codec.hash(&plain))
            .await
            .context("password hashing task")?
    }

    /// Verifies off the async runtime; `None` runs the dummy comparison.
    pub async fn verify_blocking(
        &self,
        plain: String,
        hash: Option<String>,
    ) -> anyhow::Result<bool> {
        let codec = self.clone();
        tokio::task::spawn_blocking(move || match hash {
            Some(h) => codec.verify(&plain, &h),
            None => codec.verify_dummy(&plain),
        })
        .await
        .context("password verification task")
    }
}
