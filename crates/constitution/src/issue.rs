//! Validation issues and their wire codes.

use serde::{Serialize, Serializer};
use std::fmt;

/// A rule violation found in generated text.
///
/// Displays (and serializes) as the issue code, e.g. `BANNED_PHRASE:synergy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Issue {
    /// A configured banned phrase occurs in the text
    BannedPhrase(String),
    MissingSignature,
    /// The closing line has this many sentences, more than allowed
    ClosingTooLong(usize),
    MultipleLensesDetected,
    MissingPrefix,
    EmojiOrHashtagFound,
}

impl Issue {
    /// Whether [`auto_fix`](crate::ConstitutionChecker::auto_fix) knows a
    /// safe textual correction for this issue.
    pub fn is_auto_fixable(&self) -> bool {
        matches!(
            self,
            Self::MissingSignature | Self::ClosingTooLong(_) | Self::MissingPrefix
        )
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BannedPhrase(phrase) => write!(f, "BANNED_PHRASE:{phrase}"),
            Self::MissingSignature => f.write_str("MISSING_SIGNATURE"),
            Self::ClosingTooLong(n) => write!(f, "CLOSING_TOO_LONG:{n}"),
            Self::MultipleLensesDetected => f.write_str("MULTIPLE_LENSES_DETECTED"),
            Self::MissingPrefix => f.write_str("MISSING_ZM_PREFIX"),
            Self::EmojiOrHashtagFound => f.write_str("EMOJI_OR_HASHTAG_FOUND"),
        }
    }
}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
