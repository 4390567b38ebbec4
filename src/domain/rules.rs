//! Birth/survival rules for Life-like automata.
//!
//! Rule strings are case-insensitive and may be written as `S23/B3`,
//! `B3/S23` or the legacy `23/3` (survive digits first). Digits run 0-8; a
//! `9` anywhere makes the whole string invalid.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Neighbour counting produced something a Moore neighbourhood cannot.
    #[error("neighbour count must be between 0 and 8, got {0}")]
    NeighbourCount(u8),
    #[error("invalid rule string {0:?}")]
    InvalidRuleString(String),
}

/// Which grammar a rule string is written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleFormat {
    SurviveThenBirth,
    BirthThenSurvive,
    Legacy,
    Invalid,
}

impl RuleFormat {
    /// Classify a rule string.
    pub fn of(rule_string: &str) -> Self {
        split(&rule_string.trim().to_uppercase())
            .map_or(RuleFormat::Invalid, |(format, _, _)| format)
    }
}

/// Survival and birth tables indexed by neighbour count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LifeRule {
    survive: [bool; 9],
    birth: [bool; 9],
}

impl LifeRule {
    /// Conway's Game of Life (S23/B3)
    pub const CONWAY: LifeRule = LifeRule {
        survive: [false, false, true, true, false, false, false, false, false],
        birth: [false, false, false, true, false, false, false, false, false],
    };

    /// Build a rule from explicit neighbour counts.
    pub fn from_counts(survive: &[u8], birth: &[u8]) -> Result<Self, RuleError> {
        let mut rule = LifeRule { survive: [false; 9], birth: [false; 9] };
        for &n in survive {
            *rule.survive.get_mut(n as usize).ok_or(RuleError::NeighbourCount(n))? = true;
        }
        for &n in birth {
            *rule.birth.get_mut(n as usize).ok_or(RuleError::NeighbourCount(n))? = true;
        }
        Ok(rule)
    }

    pub fn validate(rule_string: &str) -> bool {
        RuleFormat::of(rule_string) != RuleFormat::Invalid
    }

    pub fn parse(rule_string: &str) -> Result<Self, RuleError> {
        let normalized = rule_string.trim().to_uppercase();
        let (_, survive, birth) = split(&normalized)
            .ok_or_else(|| RuleError::InvalidRuleString(rule_string.to_string()))?;

        Ok(LifeRule { survive: table(survive), birth: table(birth) })
    }

    /// Parse `rule_string`, falling back to Conway's rule when it is absent
    /// or invalid.
    pub fn parse_or_default(rule_string: Option<&str>) -> Self {
        rule_string
            .and_then(|s| LifeRule::parse(s).ok())
            .unwrap_or(LifeRule::CONWAY)
    }

    pub fn survive(&self) -> &[bool; 9] {
        &self.survive
    }

    pub fn birth(&self) -> &[bool; 9] {
        &self.birth
    }

    /// Next state of a cell with `neighbours` live neighbours.
    #[inline]
    pub fn evaluate(&self, alive: bool, neighbours: u8) -> Result<bool, RuleError> {
        let table = if alive { &self.survive } else { &self.birth };
        table
            .get(neighbours as usize)
            .copied()
            .ok_or(RuleError::NeighbourCount(neighbours))
    }

    /// Canonical `S<digits>/B<digits>` form.
    pub fn to_rule_string(&self) -> String {
        format!("S{}/B{}", digits(&self.survive), digits(&self.birth))
    }
}

impl Default for LifeRule {
    fn default() -> Self {
        LifeRule::CONWAY
    }
}

impl fmt::Display for LifeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rule_string())
    }
}

impl FromStr for LifeRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifeRule::parse(s)
    }
}

/// Split a normalized rule string into its format and its survive and
/// birth digit runs.
fn split(normalized: &str) -> Option<(RuleFormat, &str, &str)> {
    let (left, right) = normalized.split_once('/')?;
    let survive_first = (left.strip_prefix('S'), right.strip_prefix('B'));
    let birth_first = (left.strip_prefix('B'), right.strip_prefix('S'));
    let parts = if let (Some(survive), Some(birth)) = survive_first {
        (RuleFormat::SurviveThenBirth, survive, birth)
    } else if let (Some(birth), Some(survive)) = birth_first {
        (RuleFormat::BirthThenSurvive, survive, birth)
    } else {
        (RuleFormat::Legacy, left, right)
    };
    let counts = |digits: &str| digits.bytes().all(|b| matches!(b, b'0'..=b'8'));
    (counts(parts.1) && counts(parts.2)).then_some(parts)
}

fn table(digits: &str) -> [bool; 9] {
    let mut table = [false; 9];
    for n in digits.bytes().map(|b| (b - b'0') as usize) {
        if let Some(slot) = table.get_mut(n) {
            *slot = true;
        }
    }
    table
}

fn digits(table: &[bool; 9]) -> String {
    table
        .iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .map(|(n, _)| char::from(b'0' + n as u8))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conway_rules() {
        let rule = LifeRule::CONWAY;

        // Underpopulation
        assert_eq!(rule.evaluate(true, 0), Ok(false));
        assert_eq!(rule.evaluate(true, 1), Ok(false));

        // Survival
        assert_eq!(rule.evaluate(true, 2), Ok(true));
        assert_eq!(rule.evaluate(true, 3), Ok(true));

        // Overpopulation
        assert_eq!(rule.evaluate(true, 4), Ok(false));

        // Reproduction
        assert_eq!(rule.evaluate(false, 3), Ok(true));
        assert_eq!(rule.evaluate(false, 2), Ok(false));
    }

    #[test]
    fn test_equivalent_spellings() {
        let expected = LifeRule::CONWAY;
        for spelling in ["B3/S23", "S23/B3", "23/3", "s23/b3", "  b3/s23  "] {
            assert_eq!(LifeRule::parse(spelling), Ok(expected), "{spelling}");
        }
    }

    #[test]
    fn test_formats() {
        assert_eq!(RuleFormat::of("S23/B3"), RuleFormat::SurviveThenBirth);
        assert_eq!(RuleFormat::of("b36/s23"), RuleFormat::BirthThenSurvive);
        assert_eq!(RuleFormat::of("23/36"), RuleFormat::Legacy);
        assert_eq!(RuleFormat::of("S/B"), RuleFormat::SurviveThenBirth);
        assert_eq!(RuleFormat::of("hello"), RuleFormat::Invalid);
        assert_eq!(RuleFormat::of(""), RuleFormat::Invalid);
    }

    #[test]
    fn test_nine_rejected_anywhere() {
        assert!(!LifeRule::validate("S239/B3"));
        assert!(!LifeRule::validate("B9/S23"));
        assert!(!LifeRule::validate("23/3 9"));
        assert!(LifeRule::parse("239/3").is_err());
    }

    #[test]
    fn test_default_fallback() {
        assert_eq!(LifeRule::parse_or_default(None), LifeRule::CONWAY);
        assert_eq!(LifeRule::parse_or_default(Some("")), LifeRule::CONWAY);
        assert_eq!(LifeRule::parse_or_default(Some("S9/B9")), LifeRule::CONWAY);
        assert_ne!(LifeRule::parse_or_default(Some("B36/S23")), LifeRule::CONWAY);
    }

    #[test]
    fn test_highlife_reproduction() {
        let rule = LifeRule::parse("B36/S23").unwrap();
        assert_eq!(rule.evaluate(false, 6), Ok(true));
        assert_eq!(rule.evaluate(false, 3), Ok(true));
        assert_eq!(rule.evaluate(true, 6), Ok(false));
    }

    #[test]
    fn test_seeds_always_dies() {
        let rule = LifeRule::parse("B2/S").unwrap();
        for n in 0..=8 {
            assert_eq!(rule.evaluate(true, n), Ok(false));
        }
        assert_eq!(rule.evaluate(false, 2), Ok(true));
        assert_eq!(rule.evaluate(false, 3), Ok(false));
    }

    #[test]
    fn test_evaluate_matches_tables() {
        let rule = LifeRule::parse("S1357/B1357").unwrap();
        for n in 0..=8u8 {
            assert_eq!(rule.evaluate(true, n), Ok(rule.survive()[n as usize]));
            assert_eq!(rule.evaluate(false, n), Ok(rule.birth()[n as usize]));
        }
    }

    #[test]
    fn test_neighbour_count_contract() {
        assert_eq!(LifeRule::CONWAY.evaluate(true, 9), Err(RuleError::NeighbourCount(9)));
        assert_eq!(LifeRule::CONWAY.evaluate(false, 9), Err(RuleError::NeighbourCount(9)));
    }

    #[test]
    fn test_canonical_string() {
        assert_eq!(LifeRule::parse("3/23").unwrap().to_rule_string(), "S3/B23");
        assert_eq!(LifeRule::parse("B3678/S34678").unwrap().to_string(), "S34678/B3678");
        assert_eq!(LifeRule::parse("b2/s").unwrap().to_string(), "S/B2");
    }

    #[test]
    fn test_from_counts() {
        assert_eq!(LifeRule::from_counts(&[2, 3], &[3]), Ok(LifeRule::CONWAY));
        assert_eq!(LifeRule::from_counts(&[9], &[]), Err(RuleError::NeighbourCount(9)));
    }
}
