//! LogicTree - Logic tree editor with AI-assisted decomposition
//!
//! Break a topic down into a hierarchy of sub-topics, by hand or by asking a
//! language model for ideas.
//!
//! # Overview
//!
//! A logic tree is a single root topic with ordered children. Every node
//! remembers whether a person typed it or the model suggested it, so a new
//! expansion can replace stale suggestions without touching manual work.
//!
//! | Surface | Entry point |
//! |---------|-------------|
//! | CLI | `logictree <command>` |
//! | Terminal editor | [`tui::run`] |
//! | Browser editor | [`serve::start_server`] |
//!
//! # Quick Start
//!
//! ```
//! use logictree::{LogicTree, NodeId, NodeOrigin, DropPosition};
//!
//! let mut tree = LogicTree::new("Increase company revenue").unwrap();
//! let price = tree.add_child(&NodeId::root(), "Raise prices", NodeOrigin::Manual).unwrap();
//! let volume = tree.add_child(&NodeId::root(), "Sell more", NodeOrigin::Manual).unwrap();
//!
//! // Drag "Sell more" in front of "Raise prices"
//! tree.move_node(&volume, &price, DropPosition::Before).unwrap();
//! assert_eq!(tree.root().children[0].text, "Sell more");
//!
//! // Round-trip through CSV
//! let csv = logictree::csv_io::tree_to_csv(&tree, &Default::default()).unwrap();
//! assert_eq!(logictree::csv_io::tree_from_csv(&csv).unwrap(), tree);
//! ```

pub mod ai;
pub mod config;
pub mod csv_io;
pub mod error;
pub mod export;
pub mod init;
pub mod serve;
pub mod store;
pub mod tree;
pub mod tui;

pub use ai::{expand_node, AiError, ExpandMode, GeminiClient, IdeaSource};
pub use config::Config;
pub use csv_io::CsvError;
pub use error::{Error, Result};
pub use export::{render, DotConfig, ExportFormat, ExportOptions};
pub use store::{StoreError, TreeDocument, TreeStore};
pub use tree::{Direction, DropPosition, LogicTree, NodeId, NodeOrigin, TreeError, TreeNode};
