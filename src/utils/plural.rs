//! Pluralization utilities.

/// Return "s" suffix for plural counts
///
/// # Examples
///
/// - `plural_s(0)` -> `"s"` (0 icons)
/// - `plural_s(1)` -> `""` (1 icon)
/// - `plural_s(5)` -> `"s"` (5 icons)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun, handling pluralization
///
/// # Examples
///
/// - `plural_count(0, "icon")` -> `"0 icons"`
/// - `plural_count(1, "icon")` -> `"1 icon"`
/// - `plural_count(5, "icon")` -> `"5 icons"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "icon"), "0 icons");
        assert_eq!(plural_count(1, "sprite"), "1 sprite");
        assert_eq!(plural_count(3, "source"), "3 sources");
    }
}
