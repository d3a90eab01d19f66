/// `1 note`, `3 notes`, `0 notes`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "note"), "0 notes");
        assert_eq!(plural_count(1, "note"), "1 note");
        assert_eq!(plural_count(12, "failure"), "12 failures");
    }
}
