//! Line recognisers for patch metadata.
//!
//! Every pattern is compiled once, on first use, into a single immutable
//! [`PatternTable`] shared by all parses. Classification is stateless: the
//! parser decides what a match means for the file being built.

use std::sync::LazyLock;

use regex::Regex;

pub const OLD_FILE_HEADER: &str = "--- ";
pub const NEW_FILE_HEADER: &str = "+++ ";
pub const HUNK_HEADER_PREFIX: &str = "@@";
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Conventional path prefixes written by git (`a/`, `b/`) and by
/// `diff.mnemonicPrefix` (index, worktree, commit, object).
pub const PATH_PREFIXES: [&str; 6] = ["a/", "b/", "i/", "w/", "c/", "o/"];

pub struct PatternTable {
    old_mode: Regex,
    new_mode: Regex,
    deleted_file_mode: Regex,
    new_file_mode: Regex,
    copy_from: Regex,
    copy_to: Regex,
    rename_from: Regex,
    rename_to: Regex,
    similarity_index: Regex,
    dissimilarity_index: Regex,
    index: Regex,
    binary_files: Regex,
    binary_patch: Regex,
    combined_index: Regex,
    combined_mode: Regex,
    combined_deleted_file_mode: Regex,
    git_diff_start: Regex,
    hunk_header: Regex,
    combined_hunk_header: Regex,
    quoted_path: Regex,
    timestamp_suffix: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pattern table entries are valid static regexes")
}

static PATTERNS: LazyLock<PatternTable> = LazyLock::new(|| PatternTable {
    old_mode: compile(r"^old mode (\d{6})"),
    new_mode: compile(r"^new mode (\d{6})"),
    deleted_file_mode: compile(r"^deleted file mode (\d{6})"),
    new_file_mode: compile(r"^new file mode (\d{6})"),
    copy_from: compile(r#"^copy from "?(.+?)"?$"#),
    copy_to: compile(r#"^copy to "?(.+?)"?$"#),
    rename_from: compile(r#"^rename from "?(.+?)"?$"#),
    rename_to: compile(r#"^rename to "?(.+?)"?$"#),
    similarity_index: compile(r"^similarity index (\d+)%"),
    dissimilarity_index: compile(r"^dissimilarity index (\d+)%"),
    index: compile(r"^index ([0-9a-z]+)\.\.([0-9a-z]+)\s*(\d{6})?"),
    binary_files: compile(r"^Binary files (.*) and (.*) differ"),
    binary_patch: compile(r"^GIT binary patch"),
    combined_index: compile(r"^index ([0-9a-z]+),([0-9a-z]+)\.\.([0-9a-z]+)"),
    combined_mode: compile(r"^mode (\d{6}),(\d{6})\.\.(\d{6})"),
    combined_deleted_file_mode: compile(r"^deleted file mode (\d{6}),(\d{6})"),
    git_diff_start: compile(r#"^diff --git (?:"([^"]*)"|(\S+)) (?:"([^"]*)"|(\S+))$"#),
    hunk_header: compile(r"^@@ -(\d+)(?:,\d+)? \+(\d+)(?:,\d+)? @@"),
    combined_hunk_header: compile(r"^@@@ -(\d+)(?:,\d+)? -(\d+)(?:,\d+)? \+(\d+)(?:,\d+)? @@@"),
    quoted_path: compile(r#"^"?(.+?)"?$"#),
    timestamp_suffix: compile(
        r"[\t ]+\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d+)? [+-]\d{4}.*$",
    ),
});

pub fn patterns() -> &'static PatternTable {
    &PATTERNS
}

/// A recognised metadata line, borrowing its captures from the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metadata<'a> {
    OldMode(&'a str),
    NewMode(&'a str),
    DeletedFileMode(&'a str),
    NewFileMode(&'a str),
    CopyFrom(&'a str),
    CopyTo(&'a str),
    RenameFrom(&'a str),
    RenameTo(&'a str),
    BinaryFiles { old: &'a str, new: &'a str },
    BinaryPatch,
    SimilarityIndex(&'a str),
    DissimilarityIndex(&'a str),
    Index {
        before: &'a str,
        after: &'a str,
        mode: Option<&'a str>,
    },
    CombinedIndex {
        parent1: &'a str,
        parent2: &'a str,
        result: &'a str,
    },
    CombinedMode {
        parent1: &'a str,
        parent2: &'a str,
        result: &'a str,
    },
    CombinedDeletedFileMode { parent1: &'a str, parent2: &'a str },
}

/// Raw numeric captures of a hunk header, still unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkNumbers<'a> {
    Plain { old: &'a str, new: &'a str },
    Combined { old: &'a str, old2: &'a str, new: &'a str },
}

impl PatternTable {
    /// Tests `line` against the metadata recognisers in priority order.
    pub fn classify<'a>(&self, line: &'a str) -> Option<Metadata<'a>> {
        if let Some(mode) = capture(&self.old_mode, line) {
            return Some(Metadata::OldMode(mode));
        }
        if let Some(mode) = capture(&self.new_mode, line) {
            return Some(Metadata::NewMode(mode));
        }
        if let Some(caps) = self.combined_deleted_file_mode.captures(line) {
            return Some(Metadata::CombinedDeletedFileMode {
                parent1: group(&caps, 1),
                parent2: group(&caps, 2),
            });
        }
        if let Some(mode) = capture(&self.deleted_file_mode, line) {
            return Some(Metadata::DeletedFileMode(mode));
        }
        // Also covers the merge form, which git prints with a single mode.
        if let Some(mode) = capture(&self.new_file_mode, line) {
            return Some(Metadata::NewFileMode(mode));
        }
        if let Some(path) = capture(&self.copy_from, line) {
            return Some(Metadata::CopyFrom(path));
        }
        if let Some(path) = capture(&self.copy_to, line) {
            return Some(Metadata::CopyTo(path));
        }
        if let Some(path) = capture(&self.rename_from, line) {
            return Some(Metadata::RenameFrom(path));
        }
        if let Some(path) = capture(&self.rename_to, line) {
            return Some(Metadata::RenameTo(path));
        }
        if let Some(caps) = self.binary_files.captures(line) {
            return Some(Metadata::BinaryFiles {
                old: group(&caps, 1),
                new: group(&caps, 2),
            });
        }
        if self.binary_patch.is_match(line) {
            return Some(Metadata::BinaryPatch);
        }
        if let Some(percent) = capture(&self.similarity_index, line) {
            return Some(Metadata::SimilarityIndex(percent));
        }
        if let Some(percent) = capture(&self.dissimilarity_index, line) {
            return Some(Metadata::DissimilarityIndex(percent));
        }
        if let Some(caps) = self.index.captures(line) {
            return Some(Metadata::Index {
                before: group(&caps, 1),
                after: group(&caps, 2),
                mode: caps.get(3).map(|m| m.as_str()),
            });
        }
        if let Some(caps) = self.combined_index.captures(line) {
            return Some(Metadata::CombinedIndex {
                parent1: group(&caps, 1),
                parent2: group(&caps, 2),
                result: group(&caps, 3),
            });
        }
        if let Some(caps) = self.combined_mode.captures(line) {
            return Some(Metadata::CombinedMode {
                parent1: group(&caps, 1),
                parent2: group(&caps, 2),
                result: group(&caps, 3),
            });
        }
        None
    }

    pub fn hunk_numbers<'a>(&self, line: &'a str) -> Option<HunkNumbers<'a>> {
        if let Some(caps) = self.hunk_header.captures(line) {
            return Some(HunkNumbers::Plain {
                old: group(&caps, 1),
                new: group(&caps, 2),
            });
        }
        self.combined_hunk_header
            .captures(line)
            .map(|caps| HunkNumbers::Combined {
                old: group(&caps, 1),
                old2: group(&caps, 2),
                new: group(&caps, 3),
            })
    }

    /// Both paths of a `diff --git` line, still carrying their `a/`/`b/`.
    ///
    /// Each path is either a quoted string or a single token. Unquoted paths
    /// containing spaces are split at the ` b/` that starts the new path.
    pub fn git_diff_paths<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        if let Some(caps) = self.git_diff_start.captures(line) {
            let old = caps.get(1).or_else(|| caps.get(2))?;
            let new = caps.get(3).or_else(|| caps.get(4))?;
            return Some((old.as_str(), new.as_str()));
        }

        let paths = line.strip_prefix("diff --git ")?;
        let split = paths.find(" b/")?;
        Some((&paths[..split], &paths[split + 1..]))
    }

    /// Cleans a raw path token: drops surrounding quotes, at most one
    /// conventional (or configured) prefix, then any trailing timestamp.
    /// Git ends `---`/`+++` paths that contain a space with a tab, which is
    /// dropped as well.
    pub fn clean_path(&self, raw: &str, extra_prefix: &str) -> String {
        let Some(unquoted) = capture(&self.quoted_path, raw.trim_end_matches('\t')) else {
            return String::new();
        };

        let stripped = PATH_PREFIXES
            .iter()
            .find_map(|prefix| unquoted.strip_prefix(*prefix))
            .or_else(|| match extra_prefix {
                "" => None,
                extra => unquoted.strip_prefix(extra),
            })
            .unwrap_or(unquoted);

        self.timestamp_suffix
            .replace(stripped, "")
            .trim_end_matches('\t')
            .to_string()
    }
}

fn capture<'a>(regex: &Regex, line: &'a str) -> Option<&'a str> {
    regex
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn group<'a>(caps: &regex::Captures<'a>, index: usize) -> &'a str {
    caps.get(index).map_or("", |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_mode_and_rename_lines() {
        let table = patterns();
        assert_eq!(table.classify("old mode 100644"), Some(Metadata::OldMode("100644")));
        assert_eq!(
            table.classify("rename from \"dir/old name.txt\""),
            Some(Metadata::RenameFrom("dir/old name.txt"))
        );
        assert_eq!(table.classify("rename to new.txt"), Some(Metadata::RenameTo("new.txt")));
        assert_eq!(table.classify("similarity index 92%"), Some(Metadata::SimilarityIndex("92")));
    }

    #[test]
    fn classifies_index_lines() {
        let table = patterns();
        assert_eq!(
            table.classify("index 1a2b3c4..5d6e7f8 100644"),
            Some(Metadata::Index {
                before: "1a2b3c4",
                after: "5d6e7f8",
                mode: Some("100644"),
            })
        );
        assert_eq!(
            table.classify("index 0000001..0ddf2ba"),
            Some(Metadata::Index {
                before: "0000001",
                after: "0ddf2ba",
                mode: None,
            })
        );
        assert_eq!(
            table.classify("index 111,222..333"),
            Some(Metadata::CombinedIndex {
                parent1: "111",
                parent2: "222",
                result: "333",
            })
        );
    }

    #[test]
    fn combined_deleted_mode_keeps_both_parents() {
        assert_eq!(
            patterns().classify("deleted file mode 100644,100755"),
            Some(Metadata::CombinedDeletedFileMode {
                parent1: "100644",
                parent2: "100755",
            })
        );
        assert_eq!(
            patterns().classify("deleted file mode 100644"),
            Some(Metadata::DeletedFileMode("100644"))
        );
    }

    #[test]
    fn unknown_lines_are_not_classified() {
        assert_eq!(patterns().classify("From 1234 Mon Sep 17 00:00:00 2001"), None);
        assert_eq!(patterns().classify(""), None);
    }

    #[test]
    fn hunk_headers() {
        let table = patterns();
        assert_eq!(
            table.hunk_numbers("@@ -1 +1,2 @@ fn main() {"),
            Some(HunkNumbers::Plain { old: "1", new: "1" })
        );
        assert_eq!(
            table.hunk_numbers("@@@ -98,20 -98,20 +98,20 @@@"),
            Some(HunkNumbers::Combined {
                old: "98",
                old2: "98",
                new: "98",
            })
        );
        assert_eq!(table.hunk_numbers("@@ broken @@"), None);
    }

    #[test]
    fn clean_path_strips_one_prefix_only() {
        assert_eq!(patterns().clean_path("a/a/foo.go", ""), "a/foo.go");
        assert_eq!(patterns().clean_path("foo.go", ""), "foo.go");
    }

    #[test]
    fn clean_path_uses_extra_prefix_after_builtins() {
        assert_eq!(patterns().clean_path("src/lib.rs", "src/"), "lib.rs");
        assert_eq!(patterns().clean_path("b/src/lib.rs", "src/"), "src/lib.rs");
    }

    #[test]
    fn clean_path_drops_timestamp_and_quotes() {
        assert_eq!(
            patterns().clean_path("a/sample.js\t2002-02-21 23:30:39.942229878 -0800", ""),
            "sample.js"
        );
        assert_eq!(
            patterns().clean_path("sample.js 2016-10-25 11:37:14 +0200", ""),
            "sample.js"
        );
        assert_eq!(patterns().clean_path("\"a/with space\"", ""), "with space");
    }

    #[test]
    fn clean_path_drops_trailing_tab() {
        assert_eq!(patterns().clean_path("a/my file.txt\t", ""), "my file.txt");
        assert_eq!(patterns().clean_path("\"b/tab\\there\"\t", ""), "tab\\there");
    }

    #[test]
    fn git_diff_paths_plain_tokens() {
        assert_eq!(
            patterns().git_diff_paths("diff --git a/s b/s"),
            Some(("a/s", "b/s"))
        );
        assert_eq!(patterns().git_diff_paths("diff --cc merged.txt"), None);
    }

    #[test]
    fn git_diff_paths_quoted_with_spaces() {
        assert_eq!(
            patterns().git_diff_paths(r#"diff --git "a/my file.txt" "b/my file.txt""#),
            Some(("a/my file.txt", "b/my file.txt"))
        );
        assert_eq!(
            patterns().git_diff_paths(r#"diff --git "a/my file.txt" b/plain.txt"#),
            Some(("a/my file.txt", "b/plain.txt"))
        );
    }

    #[test]
    fn git_diff_paths_unquoted_with_spaces() {
        assert_eq!(
            patterns().git_diff_paths("diff --git a/my file.txt b/my file.txt"),
            Some(("a/my file.txt", "b/my file.txt"))
        );
    }
}
