//! Two-column layout of hunks.
//!
//! Context lines sit on both columns. Runs of deletions followed by
//! insertions are buffered in a [`ChangeRun`] and paired row by row when the
//! run ends; paired rows are highlighted against each other, leftovers get a
//! blank cell opposite them.

use crate::config::HighlightConfig;
use crate::diff_file::{Block, DiffFile, DiffLine, LineType};
use crate::highlight::{HighlightedLine, diff_highlight, split_prefix};

const EMPTY_FILE_MESSAGE: &str = "File without changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Context,
    Insert,
    Delete,
    /// Blank filler opposite an unpaired line.
    Empty,
    /// Block header or placeholder text, not a line of the file.
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    /// Line number on this column's side; 0 for fillers and info cells.
    pub number: u32,
    pub line: HighlightedLine,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            kind: CellKind::Empty,
            number: 0,
            line: HighlightedLine::default(),
        }
    }

    pub fn info(text: &str) -> Self {
        Self {
            kind: CellKind::Info,
            number: 0,
            line: HighlightedLine::plain("", text),
        }
    }

    fn from_line(kind: CellKind, number: u32, raw: &str, is_combined: bool) -> Self {
        let (prefix, body) = split_prefix(raw, is_combined);
        Self {
            kind,
            number,
            line: HighlightedLine::plain(prefix, body),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.kind == CellKind::Empty
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub old: Cell,
    pub new: Cell,
}

impl Row {
    fn context(line: &DiffLine, is_combined: bool) -> Self {
        Self {
            old: Cell::from_line(CellKind::Context, line.old_number, &line.content, is_combined),
            new: Cell::from_line(CellKind::Context, line.new_number, &line.content, is_combined),
        }
    }

    fn deleted(line: &DiffLine, is_combined: bool) -> Self {
        Self {
            old: Cell::from_line(CellKind::Delete, line.old_number, &line.content, is_combined),
            new: Cell::empty(),
        }
    }

    fn inserted(line: &DiffLine, is_combined: bool) -> Self {
        Self {
            old: Cell::empty(),
            new: Cell::from_line(CellKind::Insert, line.new_number, &line.content, is_combined),
        }
    }

    fn header(text: &str) -> Self {
        Self {
            old: Cell::info(text),
            new: Cell::info(""),
        }
    }
}

/// Pending deletions and the insertions that follow them.
#[derive(Debug, Default)]
pub struct ChangeRun<'a> {
    deletes: Vec<&'a DiffLine>,
    inserts: Vec<&'a DiffLine>,
}

impl<'a> ChangeRun<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty()
    }

    pub fn has_deletes(&self) -> bool {
        !self.deletes.is_empty()
    }

    pub fn has_inserts(&self) -> bool {
        !self.inserts.is_empty()
    }

    pub fn push_delete(&mut self, line: &'a DiffLine) {
        self.deletes.push(line);
    }

    pub fn push_insert(&mut self, line: &'a DiffLine) {
        self.inserts.push(line);
    }

    /// Emits `max(deletes, inserts)` rows and clears the run. The first
    /// `min` rows pair a deletion with an insertion.
    pub fn flush(&mut self, rows: &mut Vec<Row>, is_combined: bool, config: &HighlightConfig) {
        let common = self.deletes.len().min(self.inserts.len());

        for (old, new) in self.deletes.iter().zip(&self.inserts) {
            let highlight = diff_highlight(&old.content, &new.content, is_combined, config);
            rows.push(Row {
                old: Cell {
                    kind: CellKind::Delete,
                    number: old.old_number,
                    line: highlight.old,
                },
                new: Cell {
                    kind: CellKind::Insert,
                    number: new.new_number,
                    line: highlight.new,
                },
            });
        }

        for old in &self.deletes[common..] {
            rows.push(Row::deleted(old, is_combined));
        }
        for new in &self.inserts[common..] {
            rows.push(Row::inserted(new, is_combined));
        }

        self.deletes.clear();
        self.inserts.clear();
    }
}

/// Lays out one block's lines as two columns of equal height.
pub fn align_block(block: &Block, is_combined: bool, config: &HighlightConfig) -> Vec<Row> {
    let mut rows = Vec::with_capacity(block.lines.len());
    let mut run = ChangeRun::new();

    for line in &block.lines {
        // A context line ends the run; so does a deletion arriving after the
        // run has already collected insertions.
        let ends_run = match line.line_type {
            LineType::Context => !run.is_empty(),
            LineType::Delete => run.has_inserts(),
            LineType::Insert => false,
        };
        if ends_run {
            run.flush(&mut rows, is_combined, config);
        }

        match line.line_type {
            LineType::Context => rows.push(Row::context(line, is_combined)),
            LineType::Delete => run.push_delete(line),
            LineType::Insert if run.has_deletes() => run.push_insert(line),
            LineType::Insert => rows.push(Row::inserted(line, is_combined)),
        }
    }

    run.flush(&mut rows, is_combined, config);
    rows
}

/// All rows for a file: each block starts with a header row. A file with
/// no blocks gets a single placeholder row.
pub fn side_by_side(file: &DiffFile, config: &HighlightConfig) -> Vec<Row> {
    if file.blocks.is_empty() {
        return vec![Row::header(EMPTY_FILE_MESSAGE)];
    }

    let mut rows = Vec::with_capacity(file.line_count() + file.blocks.len());
    for block in &file.blocks {
        rows.push(Row::header(&block.header));
        rows.extend(align_block(block, file.is_combined, config));
    }
    rows
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn block(lines: Vec<DiffLine>) -> Block {
        Block {
            header: "@@ -1 +1 @@".to_string(),
            old_start_line: 1,
            old_start_line2: 0,
            new_start_line: 1,
            lines,
        }
    }

    fn kinds(rows: &[Row]) -> Vec<(CellKind, CellKind)> {
        rows.iter().map(|r| (r.old.kind, r.new.kind)).collect()
    }

    #[test]
    fn context_only_rows_are_identical() {
        let rows = align_block(
            &block(vec![
                DiffLine::new_context(" a", 1, 1),
                DiffLine::new_context(" b", 2, 2),
            ]),
            false,
            &HighlightConfig::default(),
        );

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.old.line, row.new.line);
            assert_eq!(row.old.kind, CellKind::Context);
        }
        assert_eq!(rows[1].old.number, 2);
        assert_eq!(rows[1].new.line.text(), "b");
    }

    #[test]
    fn pairs_then_pads_longer_side() {
        let rows = align_block(
            &block(vec![
                DiffLine::new_delete("-test", 1),
                DiffLine::new_insert("+test1r", 1),
                DiffLine::new_insert("+test2r", 2),
            ]),
            false,
            &HighlightConfig::default(),
        );

        assert_eq!(
            kinds(&rows),
            vec![
                (CellKind::Delete, CellKind::Insert),
                (CellKind::Empty, CellKind::Insert),
            ]
        );
        assert_eq!(rows[0].old.line.markup(), "test");
        assert_eq!(rows[0].new.line.markup(), "test<ins>1r</ins>");
        assert_eq!(rows[1].new.line.markup(), "test2r");
        assert_eq!(rows[1].new.number, 2);
        assert_eq!(rows[1].old.number, 0);
    }

    #[test]
    fn leftover_deletes_get_blank_new_cells() {
        let rows = align_block(
            &block(vec![
                DiffLine::new_delete("-a", 1),
                DiffLine::new_delete("-b", 2),
                DiffLine::new_delete("-c", 3),
                DiffLine::new_insert("+A", 1),
                DiffLine::new_context(" d", 4, 2),
            ]),
            false,
            &HighlightConfig::default(),
        );

        assert_eq!(
            kinds(&rows),
            vec![
                (CellKind::Delete, CellKind::Insert),
                (CellKind::Delete, CellKind::Empty),
                (CellKind::Delete, CellKind::Empty),
                (CellKind::Context, CellKind::Context),
            ]
        );
        assert_eq!(rows[2].old.line.text(), "c");
        assert!(rows[2].new.is_blank());
    }

    #[test]
    fn insert_without_pending_delete_is_emitted_immediately() {
        let rows = align_block(
            &block(vec![
                DiffLine::new_context(" a", 1, 1),
                DiffLine::new_insert("+new", 2),
                DiffLine::new_context(" b", 2, 3),
            ]),
            false,
            &HighlightConfig::default(),
        );

        assert_eq!(
            kinds(&rows),
            vec![
                (CellKind::Context, CellKind::Context),
                (CellKind::Empty, CellKind::Insert),
                (CellKind::Context, CellKind::Context),
            ]
        );
    }

    #[test]
    fn delete_after_inserts_starts_a_new_run() {
        let rows = align_block(
            &block(vec![
                DiffLine::new_delete("-a", 1),
                DiffLine::new_insert("+b", 1),
                DiffLine::new_delete("-c", 2),
                DiffLine::new_insert("+d", 2),
            ]),
            false,
            &HighlightConfig::default(),
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].old.line.text(), "a");
        assert_eq!(rows[0].new.line.text(), "b");
        assert_eq!(rows[1].old.line.text(), "c");
        assert_eq!(rows[1].new.line.text(), "d");
    }

    #[test]
    fn run_emits_max_rows() {
        let deletes: Vec<DiffLine> = (1..=2)
            .map(|n| DiffLine::new_delete(&format!("-old {n}"), n))
            .collect();
        let inserts: Vec<DiffLine> = (1..=5)
            .map(|n| DiffLine::new_insert(&format!("+new {n}"), n))
            .collect();

        let mut run = ChangeRun::new();
        deletes.iter().for_each(|l| run.push_delete(l));
        inserts.iter().for_each(|l| run.push_insert(l));

        let mut rows = Vec::new();
        run.flush(&mut rows, false, &HighlightConfig::default());

        assert!(run.is_empty());
        assert_eq!(rows.len(), 5);
        assert_eq!(rows.iter().filter(|r| !r.old.is_blank() && !r.new.is_blank()).count(), 2);
        assert_eq!(rows.iter().filter(|r| r.old.is_blank()).count(), 3);
    }

    #[test]
    fn file_rows_start_with_block_headers() {
        let file = DiffFile {
            new_name: "x".to_string(),
            blocks: vec![block(vec![DiffLine::new_context(" a", 1, 1)])],
            ..DiffFile::default()
        };
        let rows = side_by_side(&file, &HighlightConfig::default());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].old.kind, CellKind::Info);
        assert_eq!(rows[0].old.line.text(), "@@ -1 +1 @@");
        assert_eq!(rows[0].new.line.text(), "");
    }

    #[test]
    fn file_without_blocks_gets_placeholder() {
        let file = DiffFile {
            new_name: "x".to_string(),
            is_rename: true,
            ..DiffFile::default()
        };
        let rows = side_by_side(&file, &HighlightConfig::default());

        assert_eq!(rows, vec![Row::header("File without changes")]);
    }
}
