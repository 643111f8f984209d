use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use logictree::ai::{self, ExpandMode, GeminiClient, IdeaSource};
use logictree::csv_io::{self, CsvOptions};
use logictree::export::{self, DotConfig, ExportFormat, ExportOptions};
use logictree::init::{self, LOG_FILE};
use logictree::serve::{self, ServerContext};
use logictree::{Config, Direction, DropPosition, LogicTree, NodeId, NodeOrigin, StoreError, TreeError, TreeStore};

#[derive(Parser, Debug)]
#[command(name = "logictree")]
#[command(author, version, about = "Build logic trees by hand or with AI-suggested branches")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new tree in .logictree/
    Init {
        /// Text of the root node (defaults to the configured root text)
        #[arg(long)]
        root_text: Option<String>,

        /// Overwrite an existing tree
        #[arg(long)]
        force: bool,
    },

    /// Print the tree
    Show {
        /// Print the raw JSON tree instead
        #[arg(long)]
        json: bool,
    },

    /// Add a child node; prints the new id
    Add {
        /// Parent node id
        parent: String,

        /// Node text (defaults to the configured placeholder)
        text: Option<String>,
    },

    /// Change a node's text
    Edit { id: String, text: String },

    /// Delete a node and its whole subtree
    Delete { id: String },

    /// Move a node relative to another one
    Move {
        id: String,

        /// Drop target
        target: String,

        /// into, before or after the target
        #[arg(long, default_value = "into")]
        position: DropPosition,
    },

    /// Swap a node with its previous or next sibling
    Reorder {
        id: String,

        /// up or down
        direction: Direction,
    },

    /// Ask the model for sub-topics of a node
    Expand {
        id: String,

        /// Keep existing AI children and append the new ideas
        #[arg(long)]
        append: bool,

        /// Print the ideas without changing the tree
        #[arg(long)]
        dry_run: bool,
    },

    /// Replace the tree with one read from CSV ('-' reads stdin)
    Import {
        file: PathBuf,

        /// Overwrite an existing tree
        #[arg(long)]
        force: bool,
    },

    /// Write the tree as csv, json, dot, markdown or text
    Export {
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export only the subtree under this node
        #[arg(long)]
        root: Option<String>,

        /// Prefix CSV output with a UTF-8 byte order mark
        #[arg(long)]
        bom: bool,

        /// Graph title (dot only)
        #[arg(long)]
        title: Option<String>,
    },

    /// Start the browser editor
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Open the terminal editor
    Tui,

    /// Print a shell completion script
    Completion { shell: Shell },
}

fn main() {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its logs go to a file
    let log_file = match cli.command {
        Command::Tui => open_tui_log(&TreeStore::open()),
        _ => None,
    };
    setup_logging(cli.verbose, log_file);

    if let Err(e) = run(cli.command) {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn open_tui_log(store: &TreeStore) -> Option<std::fs::File> {
    let dir = store.path().parent()?;
    OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE)).ok()
}

fn setup_logging(verbosity: u8, log_file: Option<std::fs::File>) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer().with_target(true).with_thread_names(false);

    let result = match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(fmt_layer.with_writer(Mutex::new(file)).with_ansi(false).with_filter(filter))
            .try_init(),
        None => tracing_subscriber::registry()
            .with(fmt_layer.with_writer(io::stderr).with_filter(filter))
            .try_init(),
    };
    if result.is_ok() {
        tracing::debug!(level, "logging initialized");
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    let store = TreeStore::open();
    let config = Config::load_for(store.path());

    match command {
        Command::Init { root_text, force } => {
            let root_text = root_text.unwrap_or_else(|| config.tree.root_text.clone());
            init::init_project(&store, &root_text, force)?;
        }

        Command::Show { json } => {
            let tree = store.load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print_tree(&tree);
            }
        }

        Command::Add { parent, text } => {
            let text = text.unwrap_or_else(|| config.tree.new_node_text.clone());
            let parent = NodeId::from(parent);
            let id = store.update(|tree| tree.add_child(&parent, &text, NodeOrigin::Manual).map_err(logictree::Error::from))?;
            eprintln!("{} {} under {}", "Added".green(), text.trim(), parent);
            println!("{}", id);
        }

        Command::Edit { id, text } => {
            let id = NodeId::from(id);
            store.update(|tree| tree.edit_text(&id, &text).map_err(logictree::Error::from))?;
            eprintln!("{} {}", "Updated".green(), id);
        }

        Command::Delete { id } => {
            let id = NodeId::from(id);
            let removed = store.update(|tree| tree.delete(&id).map_err(logictree::Error::from))?;
            eprintln!(
                "{} {} ({} node(s))",
                "Deleted".green(),
                removed.text,
                removed.subtree_size()
            );
        }

        Command::Move { id, target, position } => {
            let id = NodeId::from(id);
            let target = NodeId::from(target);
            store.update(|tree| tree.move_node(&id, &target, position).map_err(logictree::Error::from))?;
            eprintln!("{} {} {:?} {}", "Moved".green(), id, position, target);
        }

        Command::Reorder { id, direction } => {
            let id = NodeId::from(id);
            store.update(|tree| tree.reorder(&id, direction).map_err(logictree::Error::from))?;
            eprintln!("{} {} {:?}", "Reordered".green(), id, direction);
        }

        Command::Expand { id, append, dry_run } => {
            let id = NodeId::from(id);
            let client = GeminiClient::from_config(&config.ai)?;
            let mode = if append { ExpandMode::Append } else { ExpandMode::Replace };
            expand(&store, &client, &id, mode, dry_run)?;
        }

        Command::Import { file, force } => {
            if store.exists() && !force {
                return Err(StoreError::AlreadyExists(store.path().to_path_buf()).into());
            }
            let tree = if file.as_os_str() == "-" {
                let mut input = String::new();
                io::stdin().read_to_string(&mut input)?;
                csv_io::tree_from_csv(&input)?
            } else {
                csv_io::read_tree(std::fs::File::open(&file)?)?
            };
            store.save(&tree)?;
            eprintln!(
                "{} {} node(s) into {}",
                "Imported".green(),
                tree.node_count(),
                store.path().display()
            );
        }

        Command::Export {
            format,
            output,
            root,
            bom,
            title,
        } => {
            let tree = store.load()?;
            let options = ExportOptions {
                dot: DotConfig {
                    title,
                    ..DotConfig::default()
                },
                csv: CsvOptions { bom },
                root: root.map(NodeId::from),
            };
            let rendered = export::render(&tree, format, &options)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    eprintln!("{} {}", "Exported to".green(), path.display());
                }
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(rendered.as_bytes())?;
                    stdout.flush()?;
                }
            }
        }

        Command::Serve { port } => {
            if !store.exists() {
                store.init(&config.tree.root_text, false)?;
                eprintln!("{} {}", "Created".green(), store.path().display());
            }
            let port = port.unwrap_or(config.serve.port);
            serve::start_server(ServerContext::new(store, config), port)?;
        }

        Command::Tui => {
            logictree::tui::run(store, config, None)?;
        }

        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}

fn expand(
    store: &TreeStore,
    source: &dyn IdeaSource,
    id: &NodeId,
    mode: ExpandMode,
    dry_run: bool,
) -> Result<(), Box<dyn Error>> {
    if dry_run {
        let tree = store.load()?;
        let node = tree.find(id).ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        for idea in source.suggest(&node.text)? {
            println!("{} {}", "✨".magenta(), idea);
        }
        return Ok(());
    }

    let (ids, tree) = store.update(|tree| {
        let ids = ai::expand_node(tree, id, source, mode)?;
        Ok::<_, logictree::Error>((ids, tree.clone()))
    })?;
    for new_id in &ids {
        if let Some(node) = tree.find(new_id) {
            println!("{} {}  {}", "✨".magenta(), node.text, new_id.as_str().dimmed());
        }
    }
    eprintln!("{} {} idea(s) under {}", "Added".green(), ids.len(), id);
    Ok(())
}

fn print_tree(tree: &LogicTree) {
    for line in export::text_lines(tree) {
        let text = if line.node.is_ai() {
            format!("{} ✨", line.node.text).magenta().to_string()
        } else if tree.is_root(&line.node.id) {
            line.node.text.bold().to_string()
        } else {
            line.node.text.clone()
        };
        println!("{}{}  {}", line.prefix.dimmed(), text, line.node.id.as_str().dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move_position() {
        let cli = Cli::try_parse_from(["logictree", "move", "a", "b", "--position", "before"]).unwrap();
        match cli.command {
            Command::Move { position, .. } => assert_eq!(position, DropPosition::Before),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_direction() {
        assert!(Cli::try_parse_from(["logictree", "reorder", "a", "sideways"]).is_err());
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["logictree", "show", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
