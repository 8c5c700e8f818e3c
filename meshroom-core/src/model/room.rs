use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::utils::ROOM_CODE_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRoomCode {
    #[error("room code is empty")]
    Empty,
    #[error("room code must be exactly {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Six-character room code shared between participants.
///
/// Surrounding whitespace is trimmed before validation, matching what a user
/// pastes into a join prompt. Case is preserved: codes are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn parse(raw: &str) -> Result<Self, InvalidRoomCode> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(InvalidRoomCode::Empty);
        }

        let actual = code.chars().count();
        if actual != ROOM_CODE_LENGTH {
            return Err(InvalidRoomCode::WrongLength {
                expected: ROOM_CODE_LENGTH,
                actual,
            });
        }

        Ok(Self(code.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomCode {
    type Err = InvalidRoomCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
