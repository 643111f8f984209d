//! Terminal editor for logic trees
//!
//! Features:
//! - Collapsible tree view with vim-style navigation
//! - Inline editing, keyboard moves and sibling reordering
//! - Background AI expansion
//! - Auto-reload when the tree file changes on disk

pub mod app;
pub mod msg;
pub mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::prelude::*;

use crate::ai::IdeaSource;
use crate::config::Config;
use crate::store::TreeStore;
use app::App;
use msg::key_to_msg;

type TuiResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Redraw and housekeeping interval
const TICK: Duration = Duration::from_millis(100);

/// Open the terminal editor on `store` until the user quits
pub fn run(store: TreeStore, config: Config, ideas: Option<Arc<dyn IdeaSource>>) -> TuiResult<()> {
    // A missing tree is reported on the normal screen
    let mut app = App::new(store, config, ideas)?;

    terminal::enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut term = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let outcome = watch_tree(app.store().path()).and_then(|(_watcher, reloads)| event_loop(&mut term, &mut app, reloads));

    // Always hand the terminal back, even after an error
    let _ = terminal::disable_raw_mode();
    let _ = execute!(term.backend_mut(), LeaveAlternateScreen);
    let _ = term.show_cursor();

    outcome
}

/// Watch the tree file. The watcher must stay alive as long as the receiver is used.
fn watch_tree(path: &Path) -> TuiResult<(RecommendedWatcher, Receiver<()>)> {
    let tree_path = std::fs::canonicalize(path)?;
    let dir = tree_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let (tx, rx) = mpsc::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else { return };
            // Saves rename a temp file over the tree, so the directory is watched
            let relevant = event.kind.is_modify() || event.kind.is_create();
            if relevant && event.paths.iter().any(|p| *p == tree_path) {
                let _ = tx.send(());
            }
        },
        notify::Config::default(),
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::debug!(dir = %dir.display(), "watching tree directory");

    Ok((watcher, rx))
}

fn event_loop<B: Backend>(term: &mut Terminal<B>, app: &mut App, reloads: Receiver<()>) -> TuiResult<()> {
    let mut next_tick = Instant::now() + TICK;

    while !app.should_quit {
        term.draw(|frame| ui::draw(frame, app))?;

        if event::poll(next_tick.saturating_duration_since(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.update(key_to_msg(app.mode.input_mode(), key.code, key.modifiers));
                }
            }
        }

        // One reload per burst of file events
        if reloads.try_iter().count() > 0 {
            match app.reload() {
                Ok(true) => app.set_status("Tree changed on disk, reloaded"),
                Ok(false) => {}
                Err(e) => app.set_error(e),
            }
        }

        if Instant::now() >= next_tick {
            app.tick();
            next_tick = Instant::now() + TICK;
        }
    }
    Ok(())
}
