//! Airtable filter formulas for the bucket predicates.
//!
//! Field names are wrapped in braces; boolean checkbox fields compare
//! against `1`.

/// `{Year} = 1999`
pub fn year_equals(year: i32) -> String {
    format!("{{Year}} = {}", year)
}

/// `AND({Year} >= 1990, {Year} < 2000)`: start inclusive, end exclusive.
pub fn year_range(start: i32, end: i32) -> String {
    format!("AND({{Year}} >= {}, {{Year}} < {})", start, end)
}

/// `{Like} = 1`
pub fn flag_set(field: &str) -> String {
    format!("{{{}}} = 1", field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formulas() {
        assert_eq!(year_equals(1999), "{Year} = 1999");
        assert_eq!(year_range(1990, 2000), "AND({Year} >= 1990, {Year} < 2000)");
        assert_eq!(flag_set("Like"), "{Like} = 1");
        assert_eq!(flag_set("Love"), "{Love} = 1");
    }
}
