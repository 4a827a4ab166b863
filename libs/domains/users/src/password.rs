//! Credential hashing.
//!
//! Digests are Argon2id PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
//! salted per call. Verification reads the parameters from the digest itself, so
//! changing [`HasherConfig`] does not invalidate existing passwords.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
        rand_core::OsRng,
    },
};
use core_config::{ConfigError, FromEnv, env_parse_or};

use crate::error::{UserError, UserResult};

/// One-way password hashing.
///
/// `verify` returns `Ok(false)` on mismatch and only errors on a malformed digest.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, plaintext: &str) -> UserResult<String>;
    fn verify(&self, plaintext: &str, digest: &str) -> UserResult<bool>;
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    /// 19 MiB, 2 passes, 1 lane
    fn default() -> Self {
        Self {
            memory_cost_kib: Params::DEFAULT_M_COST,
            time_cost: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Environment variables:
/// - `PASSWORD_HASH_MEMORY_KIB` (default: 19456)
/// - `PASSWORD_HASH_TIME_COST` (default: 2)
/// - `PASSWORD_HASH_PARALLELISM` (default: 1)
impl FromEnv for HasherConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            memory_cost_kib: env_parse_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_cost_kib)?,
            time_cost: env_parse_or("PASSWORD_HASH_TIME_COST", defaults.time_cost)?,
            parallelism: env_parse_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        })
    }
}

#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Fails on out-of-range parameters (e.g. memory below 8 KiB per lane).
    pub fn new(config: HasherConfig) -> UserResult<Self> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| UserError::PasswordHash(format!("invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> UserResult<bool> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| UserError::PasswordHash(format!("malformed digest: {e}")))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(UserError::PasswordHash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::new(HasherConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_verifies_only_its_own_plaintext() {
        let hasher = hasher();
        let digest = hasher.hash("secret1").unwrap();

        assert!(hasher.verify("secret1", &digest).unwrap());
        assert!(!hasher.verify("secret2", &digest).unwrap());
        assert!(!hasher.verify("", &digest).unwrap());
    }

    #[test]
    fn test_same_plaintext_gets_distinct_salted_digests() {
        let hasher = hasher();
        let first = hasher.hash("secret1").unwrap();
        let second = hasher.hash("secret1").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret1", &first).unwrap());
        assert!(hasher.verify("secret1", &second).unwrap());
    }

    #[test]
    fn test_digest_is_self_describing_phc_string() {
        let digest = hasher().hash("secret1").unwrap();

        assert!(digest.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert!(!digest.contains("secret1"));
    }

    #[test]
    fn test_verify_uses_parameters_from_digest() {
        let cheap = hasher().hash("secret1").unwrap();
        let other = Argon2Hasher::new(HasherConfig {
            memory_cost_kib: 2048,
            time_cost: 2,
            parallelism: 1,
        })
        .unwrap();

        assert!(other.verify("secret1", &cheap).unwrap());
    }

    #[test]
    fn test_malformed_digest_is_an_error() {
        let result = hasher().verify("secret1", "not-a-phc-string");
        assert!(matches!(result, Err(UserError::PasswordHash(_))));
    }

    #[test]
    fn test_invalid_parameters_fail_at_construction() {
        let result = Argon2Hasher::new(HasherConfig {
            memory_cost_kib: 1,
            time_cost: 1,
            parallelism: 1,
        });
        assert!(matches!(result, Err(UserError::PasswordHash(_))));
    }

    #[test]
    fn test_config_defaults_and_env_overrides() {
        temp_env::with_vars(
            [
                ("PASSWORD_HASH_MEMORY_KIB", None::<&str>),
                ("PASSWORD_HASH_TIME_COST", Some("3")),
                ("PASSWORD_HASH_PARALLELISM", None::<&str>),
            ],
            || {
                let config = HasherConfig::from_env().unwrap();
                assert_eq!(config.memory_cost_kib, 19 * 1024);
                assert_eq!(config.time_cost, 3);
                assert_eq!(config.parallelism, 1);
            },
        );
    }

    #[test]
    fn test_config_rejects_non_numeric_cost() {
        temp_env::with_var("PASSWORD_HASH_TIME_COST", Some("high"), || {
            let err = HasherConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PASSWORD_HASH_TIME_COST"));
        });
    }
}
