use bcrypt::{hash, verify, DEFAULT_COST};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password must be between {min} and {max} characters long")]
    Length { min: usize, max: usize },
    #[error("Password must contain {0}")]
    Missing(CharClass),
    #[error("Password must not contain the account email")]
    ContainsEmail,
    #[error("Failed to hash password")]
    HashingFailed,
    #[error("Failed to verify password")]
    VerificationFailed,
}

/// Character classes a password may be required to mix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl CharClass {
    fn found_in(self, password: &str) -> bool {
        match self {
            CharClass::Uppercase => password.chars().any(char::is_uppercase),
            CharClass::Lowercase => password.chars().any(char::is_lowercase),
            CharClass::Digit => password.chars().any(|c| c.is_ascii_digit()),
            CharClass::Symbol => symbols().is_match(password),
        }
    }
}

impl std::fmt::Display for CharClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CharClass::Uppercase => "an uppercase letter",
            CharClass::Lowercase => "a lowercase letter",
            CharClass::Digit => "a digit",
            CharClass::Symbol => "a symbol",
        })
    }
}

fn symbols() -> &'static Regex {
    static SYMBOLS: OnceLock<Regex> = OnceLock::new();
    SYMBOLS.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("static regex"))
}

/// Rules applied to every account password, including seeded ones
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_chars: usize,
    pub max_chars: usize,
    pub required: Vec<CharClass>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_chars: 8,
            max_chars: 128,
            required: vec![
                CharClass::Uppercase,
                CharClass::Lowercase,
                CharClass::Digit,
                CharClass::Symbol,
            ],
        }
    }
}

impl PasswordPolicy {
    /// Checks `password` for an account registered under `email`
    pub fn check(&self, password: &str, email: &str) -> Result<(), PasswordError> {
        let chars = password.chars().count();
        if chars < self.min_chars || chars > self.max_chars {
            return Err(PasswordError::Length {
                min: self.min_chars,
                max: self.max_chars,
            });
        }

        if let Some(class) = self.required.iter().find(|class| !class.found_in(password)) {
            return Err(PasswordError::Missing(*class));
        }

        // the mailbox name is the first thing anyone guesses
        let mailbox = email.split('@').next().unwrap_or_default().to_lowercase();
        if mailbox.len() >= 4 && password.to_lowercase().contains(&mailbox) {
            return Err(PasswordError::ContainsEmail);
        }

        Ok(())
    }
}

/// Hashes a password for `email` after the default policy accepts it
pub fn hash_password(password: &str, email: &str) -> Result<String, PasswordError> {
    PasswordPolicy::default().check(password, email)?;

    hash(password, DEFAULT_COST).map_err(|_| PasswordError::HashingFailed)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    verify(password, hash).map_err(|_| PasswordError::VerificationFailed)
}
