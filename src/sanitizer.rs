use crate::token::is_command_byte;

/// Strip everything that is not part of the command alphabet.
///
/// The result is the dense command stream, still in source order. Comments,
/// whitespace and any other prose are dropped without complaint; pairing the
/// survivors into tokens is left to [`crate::program::Program::parse`].
pub fn sanitize(text: &str) -> String {
    text.bytes()
        .filter(|&b| is_command_byte(b))
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_prose_and_whitespace() {
        let text = "increment a twice: +A +A\n\tthen print it .A  // done";
        assert_eq!(sanitize(text), "+A+A.A");
    }

    #[test]
    fn test_keeps_uppercase_selectors_inside_comments() {
        // No comment syntax exists, so capital A/B in prose leak through.
        assert_eq!(sanitize("A Bee +A"), "AB+A");
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(sanitize("é+A→]B✓"), "+A]B");
    }

    #[test]
    fn test_empty() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("nothing to see here"), "");
    }
}
