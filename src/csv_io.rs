//! CSV import/export
//!
//! One row per node in pre-order, parents before children:
//!
//! ```text
//! id,parent_id,text,origin
//! root,,Increase company revenue,manual
//! node-1,root,Raise prices,manual
//! node-2,root,Win new customers,ai
//! ```
//!
//! The root is the single row with an empty `parent_id`. `origin` may be
//! left out entirely and defaults to `manual`.

use std::collections::HashMap;
use std::io::{Read, Write};

use thiserror::Error;

use crate::tree::{LogicTree, NodeId, NodeOrigin, TreeError, TreeNode};

const BOM: &str = "\u{feff}";

pub const HEADER: [&str; 4] = ["id", "parent_id", "text", "origin"];

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("malformed CSV: {0}")]
    Malformed(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: node id is blank")]
    BlankId { line: u64 },

    #[error("line {line}: text of '{id}' is blank")]
    BlankText { line: u64, id: String },

    #[error("line {line}: duplicate node id '{id}' (first seen on line {first})")]
    DuplicateId { line: u64, id: String, first: u64 },

    #[error("line {line}: {reason}")]
    UnknownOrigin { line: u64, reason: String },

    #[error("no root row (a row with an empty parent_id)")]
    NoRoot,

    #[error("line {line}: second root row '{id}' (the root is on line {first})")]
    MultipleRoots { line: u64, id: String, first: u64 },

    #[error("line {line}: parent '{parent}' of '{id}' does not exist")]
    UnknownParent { line: u64, id: String, parent: String },

    #[error("line {line}: node '{id}' is not reachable from the root (its parent_id chain forms a cycle)")]
    Unreachable { line: u64, id: String },

    #[error("imported tree is invalid: {0}")]
    InvalidTree(#[from] TreeError),

    #[error("failed to read or write CSV: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CsvError>;

/// Export options
#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    /// Prefix output with a UTF-8 byte order mark (spreadsheet apps like it)
    pub bom: bool,
}

/// Write a tree as CSV
pub fn write_tree<W: Write>(tree: &LogicTree, mut writer: W, options: &CsvOptions) -> Result<()> {
    if options.bom {
        writer.write_all(BOM.as_bytes())?;
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    let mut stack: Vec<(Option<&NodeId>, &TreeNode)> = vec![(None, tree.root())];
    while let Some((parent, node)) = stack.pop() {
        wtr.write_record([
            node.id.as_str(),
            parent.map(NodeId::as_str).unwrap_or(""),
            node.text.as_str(),
            node.origin.as_str(),
        ])?;
        for child in node.children.iter().rev() {
            stack.push((Some(&node.id), child));
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Render a tree as a CSV string
pub fn tree_to_csv(tree: &LogicTree, options: &CsvOptions) -> Result<String> {
    let mut buf = Vec::new();
    write_tree(tree, &mut buf, options)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

struct Row {
    line: u64,
    id: String,
    parent: Option<String>,
    text: String,
    origin: NodeOrigin,
}

/// Parse a tree from CSV
pub fn read_tree<R: Read>(mut reader: R) -> Result<LogicTree> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    tree_from_csv(&raw)
}

/// Parse a tree from CSV text
pub fn tree_from_csv(input: &str) -> Result<LogicTree> {
    let input = input.strip_prefix(BOM).unwrap_or(input);
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let id_col = column("id").ok_or(CsvError::MissingColumn("id"))?;
    let parent_col = column("parent_id").ok_or(CsvError::MissingColumn("parent_id"))?;
    let text_col = column("text").ok_or(CsvError::MissingColumn("text"))?;
    let origin_col = column("origin");

    let rows = parse_rows(&mut rdr, id_col, parent_col, text_col, origin_col)?;
    build_tree(rows)
}

fn parse_rows(
    rdr: &mut csv::Reader<&[u8]>,
    id_col: usize,
    parent_col: usize,
    text_col: usize,
    origin_col: Option<usize>,
) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let mut seen: HashMap<String, u64> = HashMap::new();

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cell = |i: usize| record.get(i).unwrap_or("").trim();

        // tolerate blank trailing lines
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let id = cell(id_col).to_string();
        if id.is_empty() {
            return Err(CsvError::BlankId { line });
        }
        if let Some(&first) = seen.get(&id) {
            return Err(CsvError::DuplicateId { line, id, first });
        }
        seen.insert(id.clone(), line);

        let text = cell(text_col).to_string();
        if text.is_empty() {
            return Err(CsvError::BlankText { line, id });
        }

        let parent = Some(cell(parent_col)).filter(|p| !p.is_empty()).map(str::to_string);

        let origin = match origin_col.map(cell) {
            None | Some("") => NodeOrigin::Manual,
            Some(value) => value
                .parse()
                .map_err(|reason| CsvError::UnknownOrigin { line, reason })?,
        };

        rows.push(Row {
            line,
            id,
            parent,
            text,
            origin,
        });
    }

    Ok(rows)
}

fn build_tree(rows: Vec<Row>) -> Result<LogicTree> {
    let mut root: Option<usize> = None;
    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let index: HashMap<&str, usize> = rows.iter().enumerate().map(|(i, r)| (r.id.as_str(), i)).collect();

    for (i, row) in rows.iter().enumerate() {
        match &row.parent {
            None => {
                if let Some(first) = root {
                    return Err(CsvError::MultipleRoots {
                        line: row.line,
                        id: row.id.clone(),
                        first: rows[first].line,
                    });
                }
                root = Some(i);
            }
            Some(parent) => {
                if !index.contains_key(parent.as_str()) {
                    return Err(CsvError::UnknownParent {
                        line: row.line,
                        id: row.id.clone(),
                        parent: parent.clone(),
                    });
                }
                children.entry(parent.as_str()).or_default().push(i);
            }
        }
    }

    let root = root.ok_or(CsvError::NoRoot)?;

    // Every row has exactly one existing parent, so anything the walk from
    // the root misses sits on a parent cycle.
    let mut visited = vec![false; rows.len()];
    let root_node = assemble(root, &rows, &children, &mut visited);

    if let Some(orphan) = visited.iter().position(|v| !v) {
        return Err(CsvError::Unreachable {
            line: rows[orphan].line,
            id: rows[orphan].id.clone(),
        });
    }

    Ok(LogicTree::from_root(root_node)?)
}

fn assemble(i: usize, rows: &[Row], children: &HashMap<&str, Vec<usize>>, visited: &mut [bool]) -> TreeNode {
    visited[i] = true;
    let row = &rows[i];
    let mut node = TreeNode::new(NodeId::new(row.id.clone()), row.text.clone(), row.origin);
    if let Some(kids) = children.get(row.id.as_str()) {
        node.children = kids
            .iter()
            .map(|&k| assemble(k, rows, children, visited))
            .collect();
    }
    node
}
