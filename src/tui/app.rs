//! Application state for the TUI

use std::fmt::Display;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tui_tree_widget::TreeState;

use super::msg::{is_mutation, InputMode, Msg};
use crate::ai::{self, AiError, ExpandMode, GeminiClient, IdeaSource};
use crate::config::Config;
use crate::store::TreeStore;
use crate::tree::{Direction, DropPosition, LogicTree, NodeId, NodeOrigin, TreeError};

/// How long a status message stays on screen
pub const STATUS_TTL: Duration = Duration::from_secs(5);

/// Input mode, with the data each mode needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Editing {
        node: NodeId,
        buffer: String,
        /// Node was just created; an empty commit keeps the placeholder
        is_new: bool,
    },
    /// A node is picked up and waits for a drop target
    Moving { node: NodeId },
    ConfirmDelete { node: NodeId },
    Help,
}

impl Mode {
    pub fn input_mode(&self) -> InputMode {
        match self {
            Mode::Normal => InputMode::Normal,
            Mode::Editing { .. } => InputMode::Editing,
            Mode::Moving { .. } => InputMode::Moving,
            Mode::ConfirmDelete { .. } => InputMode::Confirming,
            Mode::Help => InputMode::Help,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

/// Result of a background expansion
struct ExpandDone {
    node: NodeId,
    mode: ExpandMode,
    result: Result<Vec<String>, AiError>,
}

/// Main application state
pub struct App {
    store: TreeStore,
    config: Config,
    ideas: Option<Arc<dyn IdeaSource>>,

    pub tree: LogicTree,
    pub state: TreeState<NodeId>,
    pub mode: Mode,
    pub status: Option<Status>,

    /// Node whose ideas are being fetched; one request at a time
    pub loading: Option<NodeId>,
    worker_tx: Sender<ExpandDone>,
    worker_rx: Receiver<ExpandDone>,

    reload_pending: bool,
    pub should_quit: bool,
}

impl App {
    /// Load the tree from `store`. `ideas` overrides the configured model.
    pub fn new(store: TreeStore, config: Config, ideas: Option<Arc<dyn IdeaSource>>) -> crate::Result<Self> {
        let tree = store.load()?;
        let (worker_tx, worker_rx) = mpsc::channel();

        let mut app = Self {
            store,
            config,
            ideas,
            tree,
            state: TreeState::default(),
            mode: Mode::Normal,
            status: None,
            loading: None,
            worker_tx,
            worker_rx,
            reload_pending: false,
            should_quit: false,
        };
        let root = app.tree.root().id.clone();
        app.state.open(vec![root.clone()]);
        app.select_node(&root);
        Ok(app)
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    /// Currently highlighted node (the root when nothing is selected)
    pub fn selected_id(&self) -> NodeId {
        self.state
            .selected()
            .last()
            .filter(|id| self.tree.contains(id))
            .cloned()
            .unwrap_or_else(|| self.tree.root().id.clone())
    }

    /// Select a node and open every branch above it
    pub fn select_node(&mut self, id: &NodeId) {
        let path = self.tree.id_path(id);
        if path.is_empty() {
            return;
        }
        for end in 1..path.len() {
            self.state.open(path[..end].to_vec());
        }
        self.state.select(path);
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    pub fn set_error(&mut self, err: impl Display) {
        let text = err.to_string();
        tracing::warn!(error = %text, "tui action failed");
        self.status = Some(Status {
            text,
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    /// Apply one message
    pub fn update(&mut self, msg: Msg) {
        if is_mutation(&msg) {
            tracing::debug!(?msg, "tree mutation");
        }

        match msg {
            Msg::MoveUp => {
                self.state.key_up();
            }
            Msg::MoveDown => {
                self.state.key_down();
            }
            Msg::JumpToTop => {
                self.state.select_first();
            }
            Msg::JumpToBottom => {
                self.state.select_last();
            }
            Msg::Fold => {
                self.state.key_left();
            }
            Msg::Unfold => {
                self.state.key_right();
            }

            Msg::AddChild => self.add_child(),
            Msg::StartEdit => self.start_edit(),
            Msg::Input(c) => {
                if let Mode::Editing { buffer, .. } = &mut self.mode {
                    buffer.push(c);
                }
            }
            Msg::Backspace => {
                if let Mode::Editing { buffer, .. } = &mut self.mode {
                    buffer.pop();
                }
            }
            Msg::Commit => self.commit_edit(),
            Msg::Cancel => self.leave_mode(),

            Msg::RequestDelete => self.request_delete(),
            Msg::ConfirmDelete => self.confirm_delete(),
            Msg::Reorder(direction) => self.reorder(direction),
            Msg::PickUp => self.pick_up(),
            Msg::Drop(position) => self.drop_at(position),

            Msg::ExpandIdeas => self.start_expansion(ExpandMode::Replace),
            Msg::AppendIdeas => self.start_expansion(ExpandMode::Append),

            Msg::ToggleHelp => {
                self.mode = if self.mode == Mode::Help { Mode::Normal } else { Mode::Help };
            }
            Msg::Reload => match self.reload() {
                Ok(true) => self.set_status("Reloaded from disk"),
                Ok(false) => self.set_status("Already up to date"),
                Err(e) => self.set_error(e),
            },
            Msg::Quit => self.should_quit = true,
            Msg::Noop => {}
        }
    }

    /// Run a tree mutation against the file on disk and persist it. Changes
    /// saved by someone else since the last reload are kept. Failed mutations
    /// leave the tree as it was.
    fn mutate<T, E: Display>(&mut self, f: impl FnOnce(&mut LogicTree) -> Result<T, E>) -> Option<T> {
        let mut tree = match self.store.load() {
            Ok(tree) => tree,
            Err(e) => {
                self.set_error(e);
                return None;
            }
        };
        match f(&mut tree) {
            Ok(out) => {
                if let Err(e) = self.store.save(&tree) {
                    self.set_error(e);
                }
                self.tree = tree;
                self.reload_pending = false;
                Some(out)
            }
            Err(e) => {
                self.set_error(e);
                None
            }
        }
    }

    fn add_child(&mut self) {
        let parent = self.selected_id();
        let placeholder = self.config.tree.new_node_text.clone();
        if let Some(id) = self.mutate(|tree| tree.add_child(&parent, &placeholder, NodeOrigin::Manual)) {
            self.select_node(&id);
            self.mode = Mode::Editing {
                node: id,
                buffer: String::new(),
                is_new: true,
            };
        }
    }

    fn start_edit(&mut self) {
        let id = self.selected_id();
        if let Some(node) = self.tree.find(&id) {
            self.mode = Mode::Editing {
                buffer: node.text.clone(),
                node: id,
                is_new: false,
            };
        }
    }

    fn commit_edit(&mut self) {
        let Mode::Editing { node, buffer, is_new } = self.mode.clone() else {
            return;
        };
        if is_new && buffer.trim().is_empty() {
            self.leave_mode();
            return;
        }
        if self.mutate(|tree| tree.edit_text(&node, &buffer)).is_some() {
            self.leave_mode();
        }
    }

    fn request_delete(&mut self) {
        let id = self.selected_id();
        if self.tree.is_root(&id) {
            self.set_error(TreeError::RootImmutable);
            return;
        }
        self.mode = Mode::ConfirmDelete { node: id };
    }

    fn confirm_delete(&mut self) {
        let Mode::ConfirmDelete { node } = self.mode.clone() else {
            return;
        };
        let parent = self.tree.parent_of(&node).map(|p| p.id.clone());
        self.mode = Mode::Normal;
        if let Some(removed) = self.mutate(|tree| tree.delete(&node)) {
            let count = removed.subtree_size();
            self.set_status(format!("Deleted {} node(s)", count));
            if let Some(parent) = parent {
                self.select_node(&parent);
            }
        }
    }

    fn reorder(&mut self, direction: Direction) {
        let id = self.selected_id();
        if self.mutate(|tree| tree.reorder(&id, direction)).is_some() {
            self.select_node(&id);
        }
    }

    fn pick_up(&mut self) {
        let id = self.selected_id();
        if self.tree.is_root(&id) {
            self.set_error(TreeError::RootImmutable);
            return;
        }
        self.mode = Mode::Moving { node: id };
    }

    fn drop_at(&mut self, position: DropPosition) {
        let Mode::Moving { node } = self.mode.clone() else {
            return;
        };
        let target = self.selected_id();
        // Stay in moving mode on failure so another target can be tried
        if self.mutate(|tree| tree.move_node(&node, &target, position)).is_some() {
            self.mode = Mode::Normal;
            self.select_node(&node);
            self.set_status("Moved");
        }
    }

    fn leave_mode(&mut self) {
        let was_editing = matches!(self.mode, Mode::Editing { .. });
        self.mode = Mode::Normal;
        if was_editing && self.reload_pending {
            self.reload_pending = false;
            if let Err(e) = self.reload() {
                self.set_error(e);
            }
        }
    }

    fn idea_source(&mut self) -> Result<Arc<dyn IdeaSource>, AiError> {
        if let Some(source) = &self.ideas {
            return Ok(Arc::clone(source));
        }
        let source: Arc<dyn IdeaSource> = Arc::new(GeminiClient::from_config(&self.config.ai)?);
        self.ideas = Some(Arc::clone(&source));
        Ok(source)
    }

    /// Fetch ideas for the selection on a worker thread
    fn start_expansion(&mut self, mode: ExpandMode) {
        if let Some(busy) = &self.loading {
            let text = self.tree.find(busy).map(|n| n.text.clone()).unwrap_or_default();
            self.set_error(format!("Already expanding \"{}\"", text));
            return;
        }

        let node = self.selected_id();
        let Some(topic) = self.tree.find(&node).map(|n| n.text.clone()) else {
            return;
        };
        let source = match self.idea_source() {
            Ok(source) => source,
            Err(e) => {
                self.set_error(e);
                return;
            }
        };

        self.set_status(format!("Asking for ideas about \"{}\"...", topic));
        self.loading = Some(node.clone());
        let tx = self.worker_tx.clone();
        std::thread::spawn(move || {
            let result = source.suggest(&topic);
            let _ = tx.send(ExpandDone { node, mode, result });
        });
    }

    fn finish_expansion(&mut self, done: ExpandDone) {
        if self.loading.as_ref() == Some(&done.node) {
            self.loading = None;
        }
        let ideas = match done.result {
            Ok(ideas) => ideas,
            Err(e) => {
                self.set_error(e);
                return;
            }
        };

        let node = done.node;
        let mode = done.mode;
        if let Some(ids) = self.mutate(|tree| ai::apply_ideas(tree, &node, &ideas, mode)) {
            let path = self.tree.id_path(&node);
            if !path.is_empty() {
                self.state.open(path);
            }
            self.set_status(format!("Added {} idea(s)", ids.len()));
        }
    }

    /// Block until the running expansion finishes. Test helper for the worker.
    #[cfg(test)]
    fn wait_for_expansion(&mut self) {
        if let Ok(done) = self.worker_rx.recv_timeout(Duration::from_secs(5)) {
            self.finish_expansion(done);
        }
    }

    /// Periodic housekeeping: collect worker results, expire the status line
    pub fn tick(&mut self) {
        while let Ok(done) = self.worker_rx.try_recv() {
            self.finish_expansion(done);
        }
        if let Some(status) = &self.status {
            if status.shown_at.elapsed() >= STATUS_TTL {
                self.status = None;
            }
        }
    }

    /// Re-read the tree file. Returns whether anything changed.
    pub fn reload(&mut self) -> crate::Result<bool> {
        if matches!(self.mode, Mode::Editing { .. }) {
            self.reload_pending = true;
            return Ok(false);
        }

        let tree = self.store.load()?;
        if tree == self.tree {
            return Ok(false);
        }

        let selected = self.selected_id();
        self.tree = tree;
        if self.tree.contains(&selected) {
            self.select_node(&selected);
        } else {
            let root = self.tree.root().id.clone();
            self.select_node(&root);
        }

        let stale = match &self.mode {
            Mode::Moving { node } | Mode::ConfirmDelete { node } => !self.tree.contains(node),
            _ => false,
        };
        if stale {
            self.mode = Mode::Normal;
        }
        tracing::debug!(nodes = self.tree.node_count(), "reloaded tree");
        Ok(true)
    }
}
