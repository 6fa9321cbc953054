// Numeric range grammar shared by the stat and species-number predicates:
//
//   N      exactly N
//   N-     at least N
//   -N     at most N
//   N-M    N through M inclusive (M may be empty: unbounded)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

fn int(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

impl NumericRange {
    pub fn exactly(v: i64) -> Self {
        Self {
            min: Some(v),
            max: Some(v),
        }
    }

    /// `None` when the text is not valid range syntax.
    pub fn parse(expr: &str) -> Option<Self> {
        if !expr.contains('-') {
            return int(expr).map(Self::exactly);
        }
        let parts: Vec<&str> = expr.split('-').collect();
        if expr.starts_with('-') {
            return Some(Self {
                min: None,
                max: Some(int(parts[1])?),
            });
        }
        if expr.ends_with('-') {
            return Some(Self {
                min: Some(int(parts[0])?),
                max: None,
            });
        }
        let max = if parts[1].trim().is_empty() {
            None
        } else {
            Some(int(parts[1])?)
        };
        Some(Self {
            min: Some(int(parts[0])?),
            max,
        })
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min.map_or(true, |lo| value >= lo) && self.max.map_or(true, |hi| value <= hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forms() {
        assert_eq!(NumericRange::parse("100"), Some(NumericRange::exactly(100)));
        assert_eq!(
            NumericRange::parse("100-"),
            Some(NumericRange { min: Some(100), max: None })
        );
        assert_eq!(
            NumericRange::parse("-100"),
            Some(NumericRange { min: None, max: Some(100) })
        );
        assert_eq!(
            NumericRange::parse("100-200"),
            Some(NumericRange { min: Some(100), max: Some(200) })
        );
        assert_eq!(
            NumericRange::parse("100--"),
            Some(NumericRange { min: Some(100), max: None })
        );
    }

    #[test]
    fn test_bad_syntax() {
        assert_eq!(NumericRange::parse(""), None);
        assert_eq!(NumericRange::parse("-"), None);
        assert_eq!(NumericRange::parse("abc"), None);
        assert_eq!(NumericRange::parse("1x-5"), None);
        assert_eq!(NumericRange::parse("5-y"), None);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = NumericRange::parse("150-151").unwrap();
        assert!(!r.contains(149));
        assert!(r.contains(150));
        assert!(r.contains(151));
        assert!(!r.contains(152));
        assert!(NumericRange::parse("-10").unwrap().contains(-3));
        assert!(NumericRange::parse("10-").unwrap().contains(i64::MAX));
    }
}
