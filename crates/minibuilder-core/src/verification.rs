//! One-time verification tokens
//!
//! A token authorizes exactly one extraction request. Whoever holds a
//! [`Verifier`] must call [`Verifier::invalidate`] after every attempt.

use rand::Rng;
use std::fmt;
use std::time::{Duration, Instant};

/// Opaque proof of passing the anti-abuse challenge
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the token itself
impl fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationToken(..)")
    }
}

pub trait Verifier {
    /// The current token, or `None` if none was issued or it has expired
    fn obtain(&mut self) -> Option<VerificationToken>;

    fn invalidate(&mut self);
}

/// A caller-supplied token, usable once
pub struct StaticToken {
    token: Option<VerificationToken>,
}

impl StaticToken {
    pub fn new(token: &str) -> Self {
        let token = token.trim();
        Self {
            token: (!token.is_empty()).then(|| VerificationToken::new(token)),
        }
    }
}

impl Verifier for StaticToken {
    fn obtain(&mut self) -> Option<VerificationToken> {
        self.token.clone()
    }

    fn invalidate(&mut self) {
        self.token = None;
    }
}

// No 0/O or 1/I/L
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 5;

/// Type-back-the-code challenge for the terminal UI
pub struct CodeChallenge {
    code: String,
    issued: Option<(VerificationToken, Instant)>,
    ttl: Duration,
}

impl CodeChallenge {
    pub fn new(ttl: Duration) -> Self {
        Self {
            code: generate_code(),
            issued: None,
            ttl,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Check an answer. A correct one issues a fresh token; a wrong one
    /// rotates the code.
    pub fn answer(&mut self, input: &str) -> bool {
        if input.trim().eq_ignore_ascii_case(&self.code) {
            self.issued = Some((generate_token(), Instant::now()));
            true
        } else {
            self.code = generate_code();
            false
        }
    }

    pub fn obtain_at(&self, now: Instant) -> Option<VerificationToken> {
        match &self.issued {
            Some((token, at)) if now.saturating_duration_since(*at) < self.ttl => Some(token.clone()),
            _ => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.obtain_at(Instant::now()).is_some()
    }

    /// Issued but past its ttl
    pub fn is_expired(&self) -> bool {
        self.issued.is_some() && !self.is_verified()
    }

    pub fn remaining(&self) -> Option<Duration> {
        let (_, at) = self.issued.as_ref()?;
        self.ttl.checked_sub(at.elapsed()).filter(|d| !d.is_zero())
    }
}

impl Verifier for CodeChallenge {
    fn obtain(&mut self) -> Option<VerificationToken> {
        self.obtain_at(Instant::now())
    }

    fn invalidate(&mut self) {
        self.issued = None;
        self.code = generate_code();
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

fn generate_token() -> VerificationToken {
    let value: u128 = rand::thread_rng().gen();
    VerificationToken(format!("{:032x}", value))
}
