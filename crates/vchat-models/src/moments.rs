//! Key-moment post-processing.

/// Split a key-moments response into its non-blank lines.
///
/// Each line is trimmed and blank lines are dropped; order is preserved and
/// no further structure (numbering, timestamps) is assumed.
pub fn parse_key_moments(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_removed() {
        assert_eq!(parse_key_moments("A\n\nB\n"), vec!["A", "B"]);
    }

    #[test]
    fn test_lines_trimmed_in_order() {
        let text = "  1. Intro  \r\n\t\n2. Demo\n   \n3. Outro";
        assert_eq!(parse_key_moments(text), vec!["1. Intro", "2. Demo", "3. Outro"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_key_moments("").is_empty());
        assert!(parse_key_moments("\n \n").is_empty());
    }
}
