use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)(?:\([^)]*\))?(!?):").expect("header pattern is valid")
});

/// Words may be separated by whitespace only; `breaking-change` and `BREAKING_CHANGE` are plain text
static BREAKING_FOOTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)BREAKING\s*CHANGE").expect("footer pattern is valid"));

/// Parsed representation of a conventional commit header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    /// Header carries the `!` marker
    pub breaking_header: bool,
    /// Body or footer mentions a breaking change
    pub breaking_footer: bool,
}

impl ParsedCommit {
    /// Parse a commit message according to conventional commits.
    ///
    /// Only the first line is treated as the header. Supports:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    /// - non-conventional text (typed as `chore`)
    pub fn parse(message: &str) -> Self {
        let header = message.lines().next().unwrap_or_default().trim();
        let breaking_footer = BREAKING_FOOTER.is_match(message);

        match HEADER_PATTERN.captures(header) {
            Some(captures) => ParsedCommit {
                r#type: captures
                    .get(1)
                    .map(|m| m.as_str().to_lowercase())
                    .unwrap_or_default(),
                breaking_header: captures.get(2).map(|m| m.as_str()) == Some("!"),
                breaking_footer,
            },
            None => ParsedCommit {
                r#type: "chore".to_string(),
                breaking_header: false,
                breaking_footer,
            },
        }
    }

    pub fn is_feature(&self) -> bool {
        self.r#type == "feat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_scope() {
        let commit = ParsedCommit::parse("feat(auth): add login");
        assert_eq!(commit.r#type, "feat");
        assert!(!commit.breaking_header);
    }

    #[test]
    fn test_parse_with_breaking_marker() {
        let commit = ParsedCommit::parse("feat(auth)!: redesign login");
        assert!(commit.is_feature());
        assert!(commit.breaking_header);
    }

    #[test]
    fn test_parse_breaking_without_scope() {
        let commit = ParsedCommit::parse("feat!: redesign");
        assert!(commit.is_feature());
        assert!(commit.breaking_header);
    }

    #[test]
    fn test_parse_uppercase_type() {
        let commit = ParsedCommit::parse("FEAT: shout");
        assert!(commit.is_feature());
    }

    #[test]
    fn test_parse_non_conventional() {
        let commit = ParsedCommit::parse("Random commit message");
        assert_eq!(commit.r#type, "chore");
        assert!(!commit.breaking_header);
        assert!(!commit.breaking_footer);
    }

    #[test]
    fn test_parse_breaking_change_footer() {
        let commit = ParsedCommit::parse("fix: something\n\nbreaking  change: desc");
        assert_eq!(commit.r#type, "fix");
        assert!(commit.breaking_footer);
    }

    #[test]
    fn test_hyphenated_or_underscored_breaking_change_is_plain_text() {
        for message in [
            "Merge branch 'fix/non-breaking-change-docs'",
            "chore: rename BREAKING_CHANGES.md",
            "docs: explain non-breaking-change policy",
        ] {
            assert!(!ParsedCommit::parse(message).breaking_footer, "{}", message);
        }
    }

    #[test]
    fn test_header_is_first_line_only() {
        let commit = ParsedCommit::parse("update docs\n\nfeat: not a header");
        assert_eq!(commit.r#type, "chore");
    }
}
