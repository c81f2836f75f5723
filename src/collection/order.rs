//! Composable orderings over the resource list.
//!
//! A sort order is a list of [`LessFn`] predicates with lexicographic
//! priority: the first predicate that distinguishes two keys decides,
//! ties fall through to the next one, and a full tie compares equal so
//! the stable sort preserves insertion order.

use std::cmp::Ordering;

/// Cheap per-resource key extracted under the resource's read lock once
/// per list rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub name: String,
    /// Sum of the local volumes' sizes in KiB.
    pub size: u64,
    pub danger: u64,
}

/// Strict "comes before" predicate over two sort keys.
pub type LessFn = fn(&SortKey, &SortKey) -> bool;

/// Resource names in natural order.
pub fn name(a: &SortKey, b: &SortKey) -> bool {
    natural_cmp(&a.name, &b.name) == Ordering::Less
}

/// Resource names in reverse natural order. Operands are swapped rather
/// than the result negated, so equal names still compare equal.
pub fn name_reverse(a: &SortKey, b: &SortKey) -> bool {
    name(b, a)
}

/// Smallest local size first.
pub fn size(a: &SortKey, b: &SortKey) -> bool {
    a.size < b.size
}

/// Largest local size first.
pub fn size_reverse(a: &SortKey, b: &SortKey) -> bool {
    size(b, a)
}

/// Least dangerous first.
pub fn danger(a: &SortKey, b: &SortKey) -> bool {
    a.danger < b.danger
}

/// Most dangerous first.
pub fn danger_reverse(a: &SortKey, b: &SortKey) -> bool {
    danger(b, a)
}

/// Resolve a composed predicate list into a total comparison.
pub fn compare(order: &[LessFn], a: &SortKey, b: &SortKey) -> Ordering {
    for less in order {
        if less(a, b) {
            return Ordering::Less;
        }
        if less(b, a) {
            return Ordering::Greater;
        }
    }
    Ordering::Equal
}

/// Natural (alphanumeric) string order: digit runs compare by numeric
/// value with leading zeros ignored, other runs compare bytewise.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.as_bytes();
    let mut b = b.as_bytes();

    while let (Some(&ca), Some(&cb)) = (a.first(), b.first()) {
        let a_digits = ca.is_ascii_digit();
        let b_digits = cb.is_ascii_digit();

        if a_digits != b_digits {
            // A digit run sorts before any other run, matching bytewise
            // order of ASCII digits vs. letters.
            return if a_digits {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }

        let (run_a, rest_a) = split_run(a, a_digits);
        let (run_b, rest_b) = split_run(b, b_digits);

        let ord = if a_digits {
            numeric_run_cmp(run_a, run_b)
        } else {
            run_a.cmp(run_b)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        a = rest_a;
        b = rest_b;
    }

    a.len().cmp(&b.len())
}

fn split_run(s: &[u8], digits: bool) -> (&[u8], &[u8]) {
    let end = s
        .iter()
        .position(|c| c.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn numeric_run_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let a = trim_leading_zeros(a);
    let b = trim_leading_zeros(b);
    // Equal-length digit strings compare correctly bytewise; a longer
    // one is the larger number.
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn trim_leading_zeros(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&c| c != b'0').unwrap_or(s.len());
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str, size: u64, danger: u64) -> SortKey {
        SortKey {
            name: name.to_string(),
            size,
            danger,
        }
    }

    #[test]
    fn test_natural_order() {
        assert_eq!(natural_cmp("test2", "test10"), Ordering::Less);
        assert_eq!(natural_cmp("test10", "test100"), Ordering::Less);
        assert_eq!(natural_cmp("test100", "test2"), Ordering::Greater);
        assert_eq!(natural_cmp("z2a", "z1a"), Ordering::Greater);
        assert_eq!(natural_cmp("r0", "r0"), Ordering::Equal);
    }

    #[test]
    fn test_natural_order_leading_zeros() {
        assert_eq!(natural_cmp("r007", "r7"), Ordering::Equal);
        assert_eq!(natural_cmp("r007a", "r7b"), Ordering::Less);
        assert_eq!(natural_cmp("r09", "r10"), Ordering::Less);
    }

    #[test]
    fn test_natural_order_mixed_runs() {
        assert_eq!(natural_cmp("1a", "a1"), Ordering::Less);
        assert_eq!(natural_cmp("vol", "vol1"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }

    #[test]
    fn test_name_predicates() {
        let a = key("test10", 0, 0);
        let b = key("test100", 0, 0);

        assert!(name(&a, &b));
        assert!(!name(&b, &a));
        assert!(name_reverse(&b, &a));
        assert!(!name_reverse(&a, &b));

        // Distinct names: reverse equals swapped forward.
        assert_eq!(name_reverse(&a, &b), name(&b, &a));
    }

    #[test]
    fn test_reverse_predicates_keep_equal_keys_equal() {
        let a = key("a", 100, 5);
        let b = key("b", 100, 5);

        assert!(!size_reverse(&a, &b));
        assert!(!size_reverse(&b, &a));
        assert!(!danger_reverse(&a, &b));
        assert!(!danger_reverse(&b, &a));
    }

    #[test]
    fn test_composed_compare_falls_through_ties() {
        let order: Vec<LessFn> = vec![danger_reverse, size_reverse, name];

        let a = key("b", 100, 5);
        let b = key("a", 200, 5);
        let c = key("a", 100, 5);

        // Same danger: size decides, largest first.
        assert_eq!(compare(&order, &a, &b), Ordering::Greater);
        // Same danger and size: name decides, ascending.
        assert_eq!(compare(&order, &a, &c), Ordering::Greater);
        // Danger dominates everything.
        let hot = key("z", 1, 30);
        assert_eq!(compare(&order, &hot, &b), Ordering::Less);
    }

    #[test]
    fn test_composed_compare_total_tie() {
        let order: Vec<LessFn> = vec![danger, size];
        let a = key("a", 7, 1);
        let b = key("b", 7, 1);
        assert_eq!(compare(&order, &a, &b), Ordering::Equal);
    }
}
