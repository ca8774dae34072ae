use serde::{Deserialize, Serialize};

/// How a hunk line is tested against the list of marker candidates
/// (`+` and ` +` for insertions in a combined diff, for example).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrefixMatching {
    /// A line matches when it starts with any candidate.
    #[default]
    AllCandidates,
    /// Only the first candidate is ever tested. Combined-diff lines marked
    /// ` +`/` -` then fall through to context. Kept for output compatibility
    /// with older renderers.
    FirstCandidateOnly,
}

impl PrefixMatching {
    pub fn matches(self, line: &str, candidates: &[&str]) -> bool {
        match self {
            PrefixMatching::AllCandidates => candidates.iter().any(|p| line.starts_with(p)),
            PrefixMatching::FirstCandidateOnly => candidates
                .first()
                .is_some_and(|p| line.starts_with(p)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Extra prefix stripped from old-side paths, tried after `a/`, `b/`, ...
    pub src_prefix: String,
    /// Extra prefix stripped from new-side paths.
    pub dst_prefix: String,
    pub prefix_matching: PrefixMatching,
}

impl ParserConfig {
    pub fn with_prefixes(src_prefix: impl Into<String>, dst_prefix: impl Into<String>) -> Self {
        Self {
            src_prefix: src_prefix.into(),
            dst_prefix: dst_prefix.into(),
            ..Self::default()
        }
    }
}

/// Unit the highlighter diffs two paired lines by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Chars,
    /// Whitespace-separated words; coarser but easier to read on prose.
    Words,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub granularity: Granularity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_candidates_checks_every_prefix() {
        let candidates = ["+", " +"];
        assert!(PrefixMatching::AllCandidates.matches(" +added", &candidates));
        assert!(PrefixMatching::AllCandidates.matches("++added", &candidates));
        assert!(!PrefixMatching::AllCandidates.matches("  kept", &candidates));
    }

    #[test]
    fn first_candidate_only_ignores_the_rest() {
        let candidates = ["+", " +"];
        assert!(PrefixMatching::FirstCandidateOnly.matches("++added", &candidates));
        assert!(!PrefixMatching::FirstCandidateOnly.matches(" +added", &candidates));
        assert!(!PrefixMatching::FirstCandidateOnly.matches("+x", &[]));
    }

    #[test]
    fn config_deserialises_with_defaults() {
        let config: ParserConfig = serde_json::from_str(r#"{"srcPrefix":"src/"}"#).unwrap();
        assert_eq!(config.src_prefix, "src/");
        assert_eq!(config.dst_prefix, "");
        assert_eq!(config.prefix_matching, PrefixMatching::AllCandidates);
    }
}
