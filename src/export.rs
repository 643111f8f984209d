//! Export utilities for logic trees
//!
//! Provides DOT graph export, Markdown outlines and the ASCII tree used by
//! `logictree show`. CSV lives in [`crate::csv_io`].

use std::fmt::Write;
use std::str::FromStr;

use crate::csv_io::{self, CsvOptions};
use crate::tree::{LogicTree, NodeId, TreeError, TreeNode};

/// Output format for `logictree export`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Dot,
    Markdown,
    Text,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Dot => "text/vnd.graphviz; charset=utf-8",
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "txt" | "text" => Ok(ExportFormat::Text),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// Configuration for DOT export
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Title for the graph
    pub title: Option<String>,
    /// Include node IDs in labels
    pub show_ids: bool,
    /// Orientation: "LR" (left-right, like the editor) or "TB" (top-bottom)
    pub rankdir: String,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            title: None,
            show_ids: false,
            rankdir: "LR".to_string(),
        }
    }
}

/// Everything `render` needs besides the tree
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub dot: DotConfig,
    pub csv: CsvOptions,
    /// Export only the subtree under this node
    pub root: Option<NodeId>,
}

const AI_MARK: &str = "✨";

fn node_color(node: &TreeNode) -> &'static str {
    if node.is_ai() {
        "#EDE7F6" // Lavender, AI suggestion
    } else {
        "#FFFFFF"
    }
}

fn border_color(node: &TreeNode) -> &'static str {
    if node.is_ai() {
        "#8E44AD"
    } else {
        "#94A3B8"
    }
}

/// Escape a string for DOT labels
fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Truncate a string to max length (in characters)
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Copy of the subtree rooted at `id`, as a tree of its own
pub fn subtree(tree: &LogicTree, id: &NodeId) -> Result<LogicTree, TreeError> {
    let node = tree.find(id).ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
    Ok(LogicTree { root: node.clone() })
}

/// Convert a logic tree to DOT format
pub fn tree_to_dot(tree: &LogicTree, config: &DotConfig) -> String {
    let mut dot = String::new();

    // DOT ids are quoted, so any node id is fine
    writeln!(dot, "digraph LogicTree {{").unwrap();
    writeln!(dot, "  rankdir={};", config.rankdir).unwrap();
    writeln!(dot, "  node [shape=box style=\"rounded,filled\" fontname=\"Arial\" fontsize=10];").unwrap();
    writeln!(dot, "  edge [color=\"#CBD5E1\" arrowhead=none];").unwrap();

    if let Some(title) = &config.title {
        writeln!(dot, "  label=\"{}\";", escape_dot(title)).unwrap();
        writeln!(dot, "  labelloc=t;").unwrap();
        writeln!(dot, "  fontsize=14;").unwrap();
    }
    writeln!(dot).unwrap();

    for (_, node) in tree.iter() {
        let mut label = String::new();
        if config.show_ids {
            write!(label, "[{}] ", node.id).unwrap();
        }
        label.push_str(&truncate(&node.text, 40));
        if node.is_ai() {
            write!(label, " {}", AI_MARK).unwrap();
        }

        writeln!(
            dot,
            "  \"{}\" [label=\"{}\" fillcolor=\"{}\" color=\"{}\"];",
            escape_dot(node.id.as_str()),
            escape_dot(&label),
            node_color(node),
            border_color(node)
        )
        .unwrap();
    }

    writeln!(dot).unwrap();

    for (_, node) in tree.iter() {
        for child in &node.children {
            writeln!(
                dot,
                "  \"{}\" -> \"{}\";",
                escape_dot(node.id.as_str()),
                escape_dot(child.id.as_str())
            )
            .unwrap();
        }
    }

    writeln!(dot, "}}").unwrap();

    dot
}

/// Nested bullet outline; the root becomes the heading
pub fn tree_to_markdown(tree: &LogicTree) -> String {
    let mut md = String::new();
    writeln!(md, "# {}", tree.root().text).unwrap();
    writeln!(md).unwrap();

    for (depth, node) in tree.iter().skip(1) {
        let indent = "  ".repeat(depth - 1);
        let mark = if node.is_ai() { format!(" {}", AI_MARK) } else { String::new() };
        writeln!(md, "{}- {}{}", indent, node.text, mark).unwrap();
    }
    md
}

/// One row of the ASCII rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine<'a> {
    /// Box-drawing prefix such as `│   ├── `
    pub prefix: String,
    pub node: &'a TreeNode,
}

/// Lay out a tree as box-drawing lines, one per node
pub fn text_lines(tree: &LogicTree) -> Vec<TextLine<'_>> {
    fn walk<'a>(node: &'a TreeNode, indent: &str, out: &mut Vec<TextLine<'a>>) {
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            let last = i + 1 == count;
            let branch = if last { "└── " } else { "├── " };
            out.push(TextLine {
                prefix: format!("{}{}", indent, branch),
                node: child,
            });
            let next_indent = format!("{}{}", indent, if last { "    " } else { "│   " });
            walk(child, &next_indent, out);
        }
    }

    let mut out = vec![TextLine {
        prefix: String::new(),
        node: tree.root(),
    }];
    walk(tree.root(), "", &mut out);
    out
}

/// Plain ASCII tree
pub fn tree_to_text(tree: &LogicTree, show_ids: bool) -> String {
    let mut text = String::new();
    for line in text_lines(tree) {
        write!(text, "{}{}", line.prefix, line.node.text).unwrap();
        if line.node.is_ai() {
            write!(text, " {}", AI_MARK).unwrap();
        }
        if show_ids {
            write!(text, "  ({})", line.node.id).unwrap();
        }
        writeln!(text).unwrap();
    }
    text
}

/// Render a tree in any supported format
pub fn render(tree: &LogicTree, format: ExportFormat, options: &ExportOptions) -> crate::Result<String> {
    let owned;
    let tree = match &options.root {
        Some(id) => {
            owned = subtree(tree, id)?;
            &owned
        }
        None => tree,
    };

    let out = match format {
        ExportFormat::Csv => csv_io::tree_to_csv(tree, &options.csv)?,
        ExportFormat::Json => serde_json::to_string_pretty(tree)?,
        ExportFormat::Dot => tree_to_dot(tree, &options.dot),
        ExportFormat::Markdown => tree_to_markdown(tree),
        ExportFormat::Text => tree_to_text(tree, true),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeOrigin;

    fn sample() -> LogicTree {
        let mut tree = LogicTree::new("Revenue").unwrap();
        let price = tree.add_child(&NodeId::root(), "Price", NodeOrigin::Manual).unwrap();
        tree.add_child(&price, "Premium \"gold\" tier", NodeOrigin::Ai).unwrap();
        tree.add_child(&NodeId::root(), "Volume", NodeOrigin::Ai).unwrap();
        tree
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("graphviz".parse::<ExportFormat>().unwrap(), ExportFormat::Dot);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Markdown.extension(), "md");
    }

    #[test]
    fn test_dot_has_every_node_and_edge() {
        let tree = sample();
        let dot = tree_to_dot(&tree, &DotConfig::default());
        assert!(dot.starts_with("digraph LogicTree {"));
        assert!(dot.contains("rankdir=LR;"));
        assert!(dot.contains("label=\"Premium \\\"gold\\\" tier ✨\""));
        assert_eq!(dot.matches(" -> ").count(), 3);
        assert!(dot.contains("\"root\" -> "));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_title_and_ids() {
        let config = DotConfig {
            title: Some("Plan".to_string()),
            show_ids: true,
            rankdir: "TB".to_string(),
        };
        let dot = tree_to_dot(&sample(), &config);
        assert!(dot.contains("label=\"Plan\";"));
        assert!(dot.contains("[root] Revenue"));
        assert!(dot.contains("rankdir=TB;"));
    }

    #[test]
    fn test_markdown_outline() {
        let md = tree_to_markdown(&sample());
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "# Revenue");
        assert_eq!(lines[2], "- Price");
        assert_eq!(lines[3], "  - Premium \"gold\" tier ✨");
        assert_eq!(lines[4], "- Volume ✨");
    }

    #[test]
    fn test_text_tree_layout() {
        let text = tree_to_text(&sample(), false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Revenue",
                "├── Price",
                "│   └── Premium \"gold\" tier ✨",
                "└── Volume ✨",
            ]
        );
    }

    #[test]
    fn test_text_tree_with_ids() {
        let text = tree_to_text(&LogicTree::new("Solo").unwrap(), true);
        assert_eq!(text, "Solo  (root)\n");
    }

    #[test]
    fn test_render_subtree() {
        let tree = sample();
        let price = tree.root().children[0].id.clone();
        let options = ExportOptions {
            root: Some(price),
            ..ExportOptions::default()
        };
        let md = render(&tree, ExportFormat::Markdown, &options).unwrap();
        assert!(md.starts_with("# Price"));
        assert!(!md.contains("Volume"));
    }

    #[test]
    fn test_render_text_includes_ids() {
        let tree = sample();
        let text = render(&tree, ExportFormat::Text, &ExportOptions::default()).unwrap();
        for (_, node) in tree.iter() {
            assert!(text.contains(&format!("  ({})", node.id)));
        }
    }

    #[test]
    fn test_render_unknown_subtree_root() {
        let options = ExportOptions {
            root: Some(NodeId::from("ghost")),
            ..ExportOptions::default()
        };
        assert!(matches!(
            render(&sample(), ExportFormat::Json, &options),
            Err(crate::Error::Tree(TreeError::NodeNotFound(_)))
        ));
    }

    #[test]
    fn test_render_json_is_the_tree() {
        let tree = sample();
        let json = render(&tree, ExportFormat::Json, &ExportOptions::default()).unwrap();
        let back: LogicTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
