//! Ordered extraction rules.
//!
//! Each field of a record is recovered by a list of rules tried top to
//! bottom. The first rule that yields a value wins; later rules never run.
//! Keeping the rules as named data makes every heuristic testable on its own.

use log::trace;

/// One named extraction heuristic.
pub struct Rule<T> {
    pub name: &'static str,
    pub extract: fn(&str) -> Option<T>,
}

impl<T> Rule<T> {
    pub const fn new(name: &'static str, extract: fn(&str) -> Option<T>) -> Self {
        Self { name, extract }
    }
}

/// Evaluate `rules` in order against `body`, returning the first hit and the
/// name of the rule that produced it.
pub fn first_match<T>(rules: &[Rule<T>], body: &str) -> Option<(&'static str, T)> {
    rules.iter().find_map(|rule| {
        let value = (rule.extract)(body)?;
        trace!("event=rule_match rule={}", rule.name);
        Some((rule.name, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(body: &str) -> Option<u32> {
        body.trim().parse().ok()
    }

    fn length(body: &str) -> Option<u32> {
        Some(body.len() as u32)
    }

    #[test]
    fn earlier_rules_take_precedence() {
        let rules = [Rule::new("digits", digits), Rule::new("length", length)];
        assert_eq!(first_match(&rules, "42"), Some(("digits", 42)));
        assert_eq!(first_match(&rules, "abc"), Some(("length", 3)));
    }

    #[test]
    fn no_rule_no_value() {
        let rules: [Rule<u32>; 1] = [Rule::new("digits", digits)];
        assert_eq!(first_match(&rules, "x"), None);
    }
}
