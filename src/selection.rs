use std::collections::BTreeSet;
use thiserror::Error;

/// Widest range a single `a-b` token may expand to.
pub const MAX_RANGE_SPAN: usize = 10_000;

/// A set of 1-based roster positions, always iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    positions: BTreeSet<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no indices given")]
    Empty,
    #[error("invalid index: {0}")]
    InvalidIndex(String),
    #[error("invalid range format: {0}")]
    InvalidRangeFormat(String),
    #[error("range {0} must contain positive numbers only")]
    NonPositiveRange(String),
    #[error("range {0} ends before it starts")]
    ReversedRange(String),
    #[error("range {0} covers more than {1} positions")]
    RangeTooLarge(String, usize),
}

impl Selection {
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl FromIterator<usize> for Selection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

/// Parses `"1, 3, 5-7"` style expressions.
pub fn parse_selection(expression: &str) -> Result<Selection, SelectionError> {
    let mut positions = BTreeSet::new();
    for raw in expression.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        if token.contains('-') {
            let (start, end) = parse_range(token)?;
            positions.extend(start..=end);
        } else {
            positions.insert(parse_index(token)?);
        }
    }
    if positions.is_empty() {
        return Err(SelectionError::Empty);
    }
    Ok(Selection { positions })
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_index(token: &str) -> Result<usize, SelectionError> {
    if !is_digits(token) {
        return Err(SelectionError::InvalidIndex(token.to_string()));
    }
    match token.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SelectionError::InvalidIndex(token.to_string())),
    }
}

fn parse_range(token: &str) -> Result<(usize, usize), SelectionError> {
    let parts: Vec<&str> = token.split('-').map(str::trim).collect();
    if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(SelectionError::InvalidRangeFormat(token.to_string()));
    }
    let bound = |s: &str| {
        if !is_digits(s) {
            return Err(SelectionError::InvalidRangeFormat(token.to_string()));
        }
        s.parse::<usize>()
            .map_err(|_| SelectionError::InvalidRangeFormat(token.to_string()))
    };
    let start = bound(parts[0])?;
    let end = bound(parts[1])?;
    if start == 0 || end == 0 {
        return Err(SelectionError::NonPositiveRange(token.to_string()));
    }
    if end < start {
        return Err(SelectionError::ReversedRange(token.to_string()));
    }
    if end - start >= MAX_RANGE_SPAN {
        return Err(SelectionError::RangeTooLarge(token.to_string(), MAX_RANGE_SPAN));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn positions(expr: &str) -> Vec<usize> {
        parse_selection(expr).expect("parse").iter().collect()
    }

    #[test]
    fn expands_ranges_and_singles() {
        assert_eq!(positions("3-5"), vec![3, 4, 5]);
        assert_eq!(positions("1,3-5,7"), vec![1, 3, 4, 5, 7]);
        assert_eq!(positions("1,1-2"), vec![1, 2]);
        assert_eq!(positions("7, 2 ,  4 - 5"), vec![2, 4, 5, 7]);
    }

    #[test]
    fn single_element_range() {
        assert_eq!(positions("4-4"), vec![4]);
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_eq!(
            parse_selection("5-3"),
            Err(SelectionError::ReversedRange("5-3".into()))
        );
        assert_eq!(positions("3-5"), vec![3, 4, 5]);
    }

    #[test]
    fn bad_tokens_name_the_offender() {
        assert_eq!(
            parse_selection("1,abc"),
            Err(SelectionError::InvalidIndex("abc".into()))
        );
        assert_eq!(
            parse_selection("0"),
            Err(SelectionError::InvalidIndex("0".into()))
        );
        assert_eq!(
            parse_selection("1-2-3"),
            Err(SelectionError::InvalidRangeFormat("1-2-3".into()))
        );
        assert_eq!(
            parse_selection("4-"),
            Err(SelectionError::InvalidRangeFormat("4-".into()))
        );
        assert_eq!(
            parse_selection("a-3"),
            Err(SelectionError::InvalidRangeFormat("a-3".into()))
        );
        assert_eq!(
            parse_selection("0-3"),
            Err(SelectionError::NonPositiveRange("0-3".into()))
        );
    }

    #[test]
    fn negative_single_is_invalid_range_shape() {
        // "-3" splits into an empty left side.
        assert_eq!(
            parse_selection("-3"),
            Err(SelectionError::InvalidRangeFormat("-3".into()))
        );
    }

    #[test]
    fn huge_ranges_are_refused_before_expanding() {
        assert_eq!(
            parse_selection("1-2000000000"),
            Err(SelectionError::RangeTooLarge("1-2000000000".into(), MAX_RANGE_SPAN))
        );
        assert_eq!(parse_selection("1-10000").expect("cap").len(), MAX_RANGE_SPAN);
        assert!(parse_selection("1-10001").is_err());
        assert_eq!(positions("2000000000-2000000001"), vec![2000000000, 2000000001]);
    }

    #[test]
    fn signs_are_not_part_of_an_index() {
        assert_eq!(
            parse_selection("+3"),
            Err(SelectionError::InvalidIndex("+3".into()))
        );
        assert_eq!(
            parse_selection("+1-+4"),
            Err(SelectionError::InvalidRangeFormat("+1-+4".into()))
        );
        assert_eq!(
            parse_selection("99999999999999999999999"),
            Err(SelectionError::InvalidIndex("99999999999999999999999".into()))
        );
    }

    #[test]
    fn empty_expression_fails() {
        assert_eq!(parse_selection(""), Err(SelectionError::Empty));
        assert_eq!(parse_selection(" , "), Err(SelectionError::Empty));
    }

    #[test]
    fn error_messages_match_user_wording() {
        let e = parse_selection("x").unwrap_err();
        assert_eq!(e.to_string(), "invalid index: x");
        let e = parse_selection("0-2").unwrap_err();
        assert!(e.to_string().contains("must contain positive numbers only"));
    }

    proptest! {
        #[test]
        fn comma_list_round_trips(set in proptest::collection::btree_set(1usize..5000, 1..40)) {
            let expr = set.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",");
            let parsed: BTreeSet<usize> = parse_selection(&expr).unwrap().iter().collect();
            prop_assert_eq!(parsed, set);
        }
    }
}
