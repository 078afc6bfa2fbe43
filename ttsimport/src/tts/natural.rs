//! Natural ("human") ordering of names: digit runs compare by value, so `img2` sorts
//! before `img10`.

use std::cmp::Ordering;

/// Compares two optional names. `None` sorts before any name.
pub fn natural_cmp_opt(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => natural_cmp(a, b),
    }
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let runs_a = runs(a);
    let runs_b = runs(b);
    for (x, y) in runs_a.iter().zip(&runs_b) {
        let result = compare_runs(x, y);
        if result != Ordering::Equal {
            return result;
        }
    }
    runs_a.len().cmp(&runs_b.len())
}

/// Splits into maximal all-digit / no-digit runs.
fn runs(name: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (index, ch) in name.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(previous) if previous != digit => {
                out.push(&name[start..index]);
                start = index;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if start < name.len() {
        out.push(&name[start..]);
    }
    out
}

fn is_numeric(run: &str) -> bool {
    run.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

fn compare_runs(x: &str, y: &str) -> Ordering {
    if is_numeric(x) && is_numeric(y) {
        let tx = x.trim_start_matches('0');
        let ty = y.trim_start_matches('0');
        // Equal-length digit strings order the same way their values do.
        let by_value = tx.len().cmp(&ty.len()).then_with(|| tx.cmp(ty));
        if by_value != Ordering::Equal {
            return by_value;
        }
    }
    x.cmp(y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }

    #[test]
    fn numbers_sort_by_value() {
        assert_eq!(sorted(&["img2", "img10", "img1"]), vec!["img1", "img2", "img10"]);
    }

    #[test]
    fn runs_split_on_digit_boundaries() {
        assert_eq!(runs("a12b3"), vec!["a", "12", "b", "3"]);
        assert_eq!(runs("42"), vec!["42"]);
        assert!(runs("").is_empty());
    }

    #[test]
    fn leading_zeros_fall_back_to_raw_order() {
        assert_eq!(natural_cmp("007", "7"), Ordering::Less);
        assert_eq!(natural_cmp("x010", "x9"), Ordering::Greater);
        assert_eq!(natural_cmp("a01", "a01"), Ordering::Equal);
    }

    #[test]
    fn run_prefix_sorts_first() {
        assert_eq!(natural_cmp("card", "card1"), Ordering::Less);
        assert_eq!(natural_cmp("card1", "card1.png"), Ordering::Less);
    }

    #[test]
    fn missing_names_sort_first() {
        assert_eq!(natural_cmp_opt(None, None), Ordering::Equal);
        assert_eq!(natural_cmp_opt(None, Some("a")), Ordering::Less);
        assert_eq!(natural_cmp_opt(Some("a"), None), Ordering::Greater);
    }

    #[test]
    fn comparison_is_antisymmetric() {
        let names = ["a1", "a01", "a10", "a2b", "a2", "b", "", "10", "9z", "A1"];
        for a in names {
            for b in names {
                assert_eq!(natural_cmp(a, b), natural_cmp(b, a).reverse(), "{a} vs {b}");
            }
        }
    }
}
