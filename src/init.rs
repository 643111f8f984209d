//! Project initialization for logictree
//!
//! `logictree init` creates the tree document, a default config and a
//! `.gitignore` entry for the TUI log file.

use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};
use crate::store::TreeStore;
use crate::tree::LogicTree;

/// Log file written by the TUI, next to the tree document
pub const LOG_FILE: &str = "logictree.log";

/// What `init_project` touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub tree_path: PathBuf,
    pub config_created: bool,
    pub gitignore_updated: bool,
}

/// Create a fresh tree at `store`, plus its config if missing
pub fn init_project(store: &TreeStore, root_text: &str, force: bool) -> crate::Result<(LogicTree, InitReport)> {
    let tree_path = store.path().to_path_buf();
    let store_dir = tree_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    println!("\n{}", "Initializing LogicTree...".cyan().bold());
    println!("   Directory: {}\n", store_dir.display());

    create_dir_if_missing(&store_dir)?;

    let tree = store.init(root_text, force)?;
    println!("   {} {} (root: \"{}\")", "Creating".green(), tree_path.display(), tree.root().text);

    let config_path = store_dir.join(CONFIG_FILE);
    let config_created = write_file_if_missing(&config_path, &Config::default_toml())?;

    let gitignore_updated = match store_dir.parent() {
        Some(project) if !project.as_os_str().is_empty() => add_to_gitignore(project, &store_dir)?,
        _ => false,
    };

    println!("\n{}", "LogicTree initialized!".green().bold());
    println!("\nNext steps:");
    println!("  1. Run {} to edit in the terminal", "logictree tui".cyan());
    println!("  2. Run {} to edit in the browser", "logictree serve".cyan());
    println!(
        "  3. Export {} to enable AI expansion",
        Config::default().ai.api_key_env.cyan()
    );
    println!();

    Ok((
        tree,
        InitReport {
            tree_path,
            config_created,
            gitignore_updated,
        },
    ))
}

fn create_dir_if_missing(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        println!("   {} {}", "Creating".green(), path.display());
    }
    Ok(())
}

fn write_file_if_missing(path: &Path, content: &str) -> std::io::Result<bool> {
    if path.exists() {
        println!("   {} {} (already exists)", "Skipping".yellow(), path.display());
        Ok(false)
    } else {
        fs::write(path, content)?;
        println!("   {} {}", "Creating".green(), path.display());
        Ok(true)
    }
}

/// Ignore the TUI log in an existing `.gitignore`. Never creates one.
fn add_to_gitignore(project: &Path, store_dir: &Path) -> std::io::Result<bool> {
    let gitignore_path = project.join(".gitignore");
    if !gitignore_path.exists() {
        return Ok(false);
    }

    let dir_name = store_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let entry = format!("{}/{}", dir_name, LOG_FILE);

    let existing = fs::read_to_string(&gitignore_path)?;
    if existing.lines().any(|line| line.trim() == entry) {
        return Ok(false);
    }

    let new_content = format!("{}\n\n# LogicTree TUI log (local)\n{}\n", existing.trim_end(), entry);
    fs::write(&gitignore_path, new_content)?;
    println!("   {} .gitignore (added {})", "Updated".green(), entry);
    Ok(true)
}
