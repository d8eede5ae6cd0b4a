//! Label classification: which interval labels are fricatives, which is a pause

use std::collections::BTreeSet;

use crate::{FricativeError, Result};

/// SAMPA fricatives recognised by default
pub const DEFAULT_FRICATIVES: [&str; 6] = ["f", "v", "s", "S", "z", "Z"];

/// Pause label written by common aligners for silent stretches
pub const DEFAULT_PAUSE: &str = "<p:>";

/// Fricative symbols plus the one pause symbol, matched by exact label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSet {
    fricatives: BTreeSet<String>,
    pause: String,
}

impl SymbolSet {
    /// Build a symbol set. The pause symbol may not also be a fricative.
    pub fn new<I, S>(fricatives: I, pause: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fricatives: BTreeSet<String> = fricatives.into_iter().map(Into::into).collect();
        let pause = pause.into();

        if fricatives.is_empty() {
            return Err(FricativeError::InvalidParameter(
                "at least one fricative symbol is required".to_string(),
            ));
        }
        if fricatives.contains(&pause) {
            return Err(FricativeError::InvalidParameter(format!(
                "pause symbol \"{}\" is also listed as a fricative",
                pause
            )));
        }

        Ok(Self { fricatives, pause })
    }

    pub fn is_fricative(&self, label: &str) -> bool {
        self.fricatives.contains(label)
    }

    pub fn is_pause(&self, label: &str) -> bool {
        self.pause == label
    }

    pub fn fricatives(&self) -> impl Iterator<Item = &str> {
        self.fricatives.iter().map(String::as_str)
    }

    pub fn pause(&self) -> &str {
        &self.pause
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self {
            fricatives: DEFAULT_FRICATIVES.iter().map(|s| s.to_string()).collect(),
            pause: DEFAULT_PAUSE.to_string(),
        }
    }
}
