//! Mood model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the author felt when writing a note.
///
/// The set is closed: the remote store only ever carries one of these tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    #[default]
    Neutral,
    Sad,
}

impl Mood {
    /// All moods, in display order.
    pub const ALL: [Self; 3] = [Self::Happy, Self::Neutral, Self::Sad];

    /// Wire/storage tag for this mood.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Sad => "sad",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A mood tag outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized mood tag '{0}'")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mood| mood.tag() == s)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}
