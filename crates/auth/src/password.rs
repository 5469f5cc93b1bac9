use crate::error::{AuthError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Strength rules applied to new passwords at registration and password change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_mixed_case: bool,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_mixed_case: true,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    /// Reasons `password` falls short; empty when it is acceptable
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut problems = Vec::new();

        if password.chars().count() < self.min_length {
            problems.push(format!("at least {} characters", self.min_length));
        }
        if self.require_mixed_case
            && !(password.chars().any(char::is_uppercase) && password.chars().any(char::is_lowercase))
        {
            problems.push("both upper and lower case letters".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            problems.push("a number".to_string());
        }

        problems
    }

    pub fn check(&self, password: &str) -> Result<()> {
        let problems = self.violations(password);
        if problems.is_empty() {
            return Ok(());
        }
        Err(AuthError::WeakPassword(format!(
            "Password must contain {}",
            problems.join(", ")
        )))
    }
}

/// Argon2id hashing guarded by a [`PasswordPolicy`]
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    policy: PasswordPolicy,
}

impl PasswordHasher {
    pub fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Check the policy, then hash with a fresh salt
    pub fn hash(&self, password: &str) -> Result<String> {
        self.policy.check(password)?;

        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// Stored hashes are checked regardless of the current policy
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::default();
        let hash = hasher.hash("MySecureP@ssw0rd").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("MySecureP@ssw0rd", &hash).unwrap());
        assert!(!hasher.verify("WrongPassword1!", &hash).unwrap());
    }

    #[test]
    fn test_default_policy() {
        let policy = PasswordPolicy::default();

        assert!(policy.check("Short1").is_err());
        assert!(policy.check("nouppercase1").is_err());
        assert!(policy.check("NOLOWERCASE1").is_err());
        assert!(policy.check("NoNumbersHere").is_err());
        assert!(policy.check("ValidP@ssw0rd").is_ok());
    }

    #[test]
    fn test_violations_are_listed_together() {
        let problems = PasswordPolicy::default().violations("abc");
        assert_eq!(problems.len(), 3);

        let Err(AuthError::WeakPassword(message)) = PasswordPolicy::default().check("abc") else {
            panic!("expected a weak password error");
        };
        assert!(message.contains("at least 8 characters"));
        assert!(message.contains("a number"));
    }

    #[test]
    fn test_relaxed_policy() {
        let policy = PasswordPolicy {
            min_length: 12,
            require_mixed_case: false,
            require_digit: false,
        };
        assert!(policy.check("correct horse battery").is_ok());
        assert!(policy.check("tooshort").is_err());

        let hasher = PasswordHasher::new(policy);
        assert_eq!(hasher.policy().min_length, 12);
        assert!(hasher.hash("correct horse battery").is_ok());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            PasswordHasher::default().verify("whatever", "not-a-phc-string"),
            Err(AuthError::PasswordHashError(_))
        ));
    }
}
