use core::fmt;
use core::num::NonZeroU32;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Identity of a Run Record within its store.
///
/// - strictly positive, so a zero or missing cell can never become an id
/// - `Option<RunNumber>` is the same size as `RunNumber`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RunNumber(NonZeroU32);

impl RunNumber {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for RunNumber {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(CoreError::InvalidRunNumber {
            value: value.to_string(),
        })
    }
}

impl From<RunNumber> for u32 {
    fn from(run: RunNumber) -> Self {
        run.get()
    }
}

impl FromStr for RunNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| CoreError::InvalidRunNumber {
                value: s.to_string(),
            })
    }
}

impl fmt::Debug for RunNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Run({})", self.get())
    }
}

impl fmt::Display for RunNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_run_number() {
        assert!(RunNumber::new(0).is_none());
        assert!("0".parse::<RunNumber>().is_err());
        assert!(RunNumber::try_from(0_u32).is_err());
    }

    #[test]
    fn parses_trimmed_text() {
        let run: RunNumber = " 12 ".parse().unwrap();
        assert_eq!(run.get(), 12);
        assert!("abc".parse::<RunNumber>().is_err());
        assert!("-3".parse::<RunNumber>().is_err());
    }

    #[test]
    fn option_run_number_is_small() {
        assert_eq!(
            core::mem::size_of::<RunNumber>(),
            core::mem::size_of::<Option<RunNumber>>()
        );
    }

    #[test]
    fn serializes_as_plain_integer() {
        let run = RunNumber::new(7).unwrap();
        assert_eq!(serde_json::to_string(&run).unwrap(), "7");
        let back: RunNumber = serde_json::from_str("7").unwrap();
        assert_eq!(back, run);
        assert!(serde_json::from_str::<RunNumber>("0").is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn display_parses_back(n in 1u32..=u32::MAX, pad in 0usize..3) {
                let run = RunNumber::new(n).unwrap();
                let text = format!("{}{}{}", " ".repeat(pad), run, " ".repeat(pad));
                prop_assert_eq!(text.parse::<RunNumber>().unwrap(), run);
                prop_assert_eq!(u32::from(run), n);
            }

            #[test]
            fn non_positive_text_is_rejected(n in i64::MIN..=0) {
                prop_assert!(n.to_string().parse::<RunNumber>().is_err());
            }
        }
    }
}
