use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ShareError;

/// Short code addressing a session: four copies of one decimal digit.
///
/// Only ten codes exist. They are trivial to read out loud and type, at the cost
/// of being trivially guessable; anyone holding a code sees the session's files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionCode(String);

impl SessionCode {
    pub const LEN: usize = 4;

    /// Pick a random digit and repeat it.
    pub fn generate() -> Self {
        let digit = rand::rng().random_range(0..10u8);
        Self(char::from(b'0' + digit).to_string().repeat(Self::LEN))
    }

    /// True iff `input` is exactly four identical ASCII digits.
    pub fn is_valid(input: &str) -> bool {
        let bytes = input.as_bytes();
        bytes.len() == Self::LEN
            && bytes[0].is_ascii_digit()
            && bytes.iter().all(|b| *b == bytes[0])
    }

    pub fn parse(input: &str) -> Result<Self, ShareError> {
        if Self::is_valid(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(ShareError::InvalidCode(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionCode {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionCode {
    type Error = ShareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(ShareError::InvalidCode(value))
        }
    }
}

impl From<SessionCode> for String {
    fn from(code: SessionCode) -> Self {
        code.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
