//! Types for candidate matching.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::RawCandidate;

/// Outcome of scoring one candidate's brand text against a target brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether the candidate matched at all.
    pub matched: bool,
    /// The target text (exact) or target token (partial) that matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_word: Option<String>,
    /// 0 for an exact match, 1-based token position for a partial match.
    pub rank: usize,
    /// Full case-insensitive equality.
    pub exact: bool,
}

impl MatchResult {
    /// A non-match.
    pub fn none() -> Self {
        Self {
            matched: false,
            matched_word: None,
            rank: 0,
            exact: false,
        }
    }

    /// An exact match on the whole target.
    pub fn exact(target: &str) -> Self {
        Self {
            matched: true,
            matched_word: Some(target.to_string()),
            rank: 0,
            exact: true,
        }
    }

    /// A partial match on the target token at 1-based position `rank`.
    pub fn partial(token: &str, rank: usize) -> Self {
        Self {
            matched: true,
            matched_word: Some(token.to_string()),
            rank,
            exact: false,
        }
    }

    /// Label written to output rows: `Exact Match`, `Word <rank>`, or `no match`.
    pub fn label(&self) -> String {
        match (self.matched, self.exact) {
            (false, _) => NO_MATCH_LABEL.to_string(),
            (true, true) => "Exact Match".to_string(),
            (true, false) => format!("Word {}", self.rank),
        }
    }
}

/// Label used for rows where nothing matched.
pub const NO_MATCH_LABEL: &str = "no match";

/// A candidate that survived matching, with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedCandidate {
    pub candidate: RawCandidate,
    pub result: MatchResult,
}

/// Result of matching a whole candidate set.
#[derive(Debug, Clone, Default)]
pub struct MatchSummary {
    /// Final candidate set, in arrival order, after cutover and cap.
    pub accepted: Vec<MatchedCandidate>,
    /// Number of exact matches seen before the cap.
    pub exact_count: usize,
    /// Number of partial matches seen before the cap.
    pub partial_count: usize,
}

impl MatchSummary {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Maximum number of results kept per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResultCap {
    #[default]
    All,
    Limit(usize),
}

impl ResultCap {
    /// Truncate a list in place according to the cap.
    pub fn apply<T>(&self, items: &mut Vec<T>) {
        if let ResultCap::Limit(limit) = self {
            items.truncate(*limit);
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid result cap {0:?}: expected \"all\" or a positive integer")]
pub struct ParseResultCapError(pub String);

impl FromStr for ResultCap {
    type Err = ParseResultCapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(ResultCap::All);
        }
        match trimmed.parse::<usize>() {
            Ok(0) | Err(_) => Err(ParseResultCapError(s.to_string())),
            Ok(limit) => Ok(ResultCap::Limit(limit)),
        }
    }
}

impl TryFrom<String> for ResultCap {
    type Error = ParseResultCapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResultCap> for String {
    fn from(cap: ResultCap) -> Self {
        cap.to_string()
    }
}

impl fmt::Display for ResultCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCap::All => write!(f, "all"),
            ResultCap::Limit(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(MatchResult::exact("Nike").label(), "Exact Match");
        assert_eq!(MatchResult::partial("Armour", 2).label(), "Word 2");
        assert_eq!(MatchResult::none().label(), "no match");
    }

    #[test]
    fn test_result_cap_parse() {
        assert_eq!("all".parse::<ResultCap>().unwrap(), ResultCap::All);
        assert_eq!("ALL".parse::<ResultCap>().unwrap(), ResultCap::All);
        assert_eq!(" 5 ".parse::<ResultCap>().unwrap(), ResultCap::Limit(5));
        assert!("five".parse::<ResultCap>().is_err());
        assert!("-1".parse::<ResultCap>().is_err());
    }

    #[test]
    fn test_result_cap_rejects_zero() {
        assert_eq!(
            "0".parse::<ResultCap>(),
            Err(ParseResultCapError("0".to_string()))
        );
        assert!(ResultCap::try_from(" 00 ".to_string()).is_err());
    }

    #[test]
    fn test_result_cap_apply() {
        let mut items = vec![1, 2, 3, 4];
        ResultCap::Limit(2).apply(&mut items);
        assert_eq!(items, vec![1, 2]);

        let mut items = vec![1, 2, 3];
        ResultCap::All.apply(&mut items);
        assert_eq!(items.len(), 3);

        let mut items = vec![1, 2];
        ResultCap::Limit(10).apply(&mut items);
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_result_cap_display() {
        assert_eq!(ResultCap::All.to_string(), "all");
        assert_eq!(ResultCap::Limit(10).to_string(), "10");
    }
}
