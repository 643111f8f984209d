//! JSON document store for a logic tree
//!
//! The tree lives in `.logictree/tree.json`, found by walking up from the
//! current directory the way git finds `.git`. Saves go through a temp file
//! and a rename so a crash never leaves half a document behind.

use crate::tree::{LogicTree, TreeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory holding the tree document and its config
pub const STORE_DIR: &str = ".logictree";

/// Tree document file name inside [`STORE_DIR`]
pub const TREE_FILE: &str = "tree.json";

/// Overrides the document location when set
pub const PATH_ENV: &str = "LOGICTREE_PATH";

/// Current on-disk document version
pub const DOCUMENT_VERSION: u32 = 1;

/// On-disk wrapper around a tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDocument {
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
    pub tree: LogicTree,
}

impl TreeDocument {
    pub fn new(tree: LogicTree) -> Self {
        let now = chrono::Local::now().to_rfc3339();
        Self {
            version: DOCUMENT_VERSION,
            created_at: now.clone(),
            updated_at: now,
            tree,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no logic tree found at {0} (run 'logictree init' first)")]
    NotFound(PathBuf),

    #[error("a logic tree already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create tree: {0}")]
    InvalidTree(#[from] TreeError),

    #[error("tree document {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("unsupported tree document version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Walk up directory tree to find .logictree folder.
/// Can be overridden with LOGICTREE_PATH env var.
fn find_tree_path() -> PathBuf {
    if let Ok(path) = std::env::var(PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let store_dir = dir.join(STORE_DIR);
            if store_dir.is_dir() {
                return store_dir.join(TREE_FILE);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    // Nothing found: `logictree init` creates it here
    PathBuf::from(STORE_DIR).join(TREE_FILE)
}

/// File-backed tree store
#[derive(Debug, Clone)]
pub struct TreeStore {
    path: PathBuf,
}

impl TreeStore {
    /// Path that [`TreeStore::open`] would use
    pub fn default_path() -> PathBuf {
        find_tree_path()
    }

    /// Store at the discovered default location
    pub fn open() -> Self {
        Self::at(find_tree_path())
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load_document(&self) -> Result<TreeDocument> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(self.path.clone())
            } else {
                self.io_error(e)
            }
        })?;

        let doc: TreeDocument = serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        if doc.version != DOCUMENT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: doc.version,
                expected: DOCUMENT_VERSION,
            });
        }

        doc.tree.validate().map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        Ok(doc)
    }

    pub fn load(&self) -> Result<LogicTree> {
        self.load_document().map(|doc| doc.tree)
    }

    /// Write the tree, keeping the original creation timestamp
    pub fn save(&self, tree: &LogicTree) -> Result<()> {
        let mut doc = TreeDocument::new(tree.clone());
        if let Ok(existing) = self.load_document() {
            doc.created_at = existing.created_at;
        }
        self.write_document(&doc)?;
        tracing::debug!(path = %self.path.display(), nodes = tree.node_count(), "saved tree");
        Ok(())
    }

    /// Create a fresh single-root tree
    pub fn init(&self, root_text: &str, force: bool) -> Result<LogicTree> {
        if self.exists() && !force {
            return Err(StoreError::AlreadyExists(self.path.clone()));
        }
        let tree = LogicTree::new(root_text)?;
        self.write_document(&TreeDocument::new(tree.clone()))?;
        tracing::info!(path = %self.path.display(), "initialized tree");
        Ok(tree)
    }

    /// Load, mutate, save. Nothing is written when `f` fails.
    pub fn update<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut LogicTree) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let mut tree = self.load()?;
        let out = f(&mut tree)?;
        self.save(&tree)?;
        Ok(out)
    }

    fn write_document(&self, doc: &TreeDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(doc).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
