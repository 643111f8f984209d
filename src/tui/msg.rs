//! TEA message types for the TUI
//!
//! Messages describe what the user did, never how to handle it. Keys are
//! mapped to messages by a pure function so the bindings are testable
//! without a terminal.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::tree::{Direction, DropPosition};

/// All possible messages/actions in the TUI
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    // === Navigation ===
    MoveUp,
    MoveDown,
    JumpToTop,
    JumpToBottom,
    /// Collapse the selected branch, or jump to its parent
    Fold,
    /// Open the selected branch
    Unfold,

    // === Editing ===
    /// Add a child under the selection and start editing it
    AddChild,
    /// Edit the selected node's text
    StartEdit,
    Input(char),
    Backspace,
    /// Save the text being edited
    Commit,
    /// Leave the current mode without changing anything
    Cancel,

    // === Structure ===
    /// Ask to delete the selected subtree
    RequestDelete,
    ConfirmDelete,
    Reorder(Direction),
    /// Pick up the selected node for a move
    PickUp,
    /// Drop the picked-up node relative to the selection
    Drop(DropPosition),

    // === Ideas ===
    /// Replace the selection's AI children with fresh ideas
    ExpandIdeas,
    /// Add fresh ideas after the existing children
    AppendIdeas,

    // === Misc ===
    ToggleHelp,
    Reload,
    Quit,
    Noop,
}

/// What the keyboard currently drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Moving,
    Confirming,
    Help,
}

/// Convert a key event to a message
pub fn key_to_msg(mode: InputMode, code: KeyCode, modifiers: KeyModifiers) -> Msg {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Msg::Quit;
    }

    match mode {
        InputMode::Editing => match code {
            KeyCode::Enter => Msg::Commit,
            KeyCode::Esc => Msg::Cancel,
            KeyCode::Backspace => Msg::Backspace,
            KeyCode::Char(c) => Msg::Input(c),
            _ => Msg::Noop,
        },

        InputMode::Confirming => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Msg::ConfirmDelete,
            _ => Msg::Cancel,
        },

        InputMode::Help => match code {
            KeyCode::Char('q') => Msg::Quit,
            _ => Msg::ToggleHelp,
        },

        InputMode::Moving => match code {
            KeyCode::Enter => Msg::Drop(DropPosition::Into),
            KeyCode::Char('b') => Msg::Drop(DropPosition::Before),
            KeyCode::Char('A') => Msg::Drop(DropPosition::After),
            KeyCode::Esc | KeyCode::Char('m') => Msg::Cancel,
            _ => navigation(code).unwrap_or(Msg::Noop),
        },

        InputMode::Normal => {
            if let Some(msg) = navigation(code) {
                return msg;
            }
            match code {
                KeyCode::Char('q') => Msg::Quit,
                KeyCode::Char('a') => Msg::AddChild,
                KeyCode::Char('e') | KeyCode::Enter => Msg::StartEdit,
                KeyCode::Char('d') | KeyCode::Delete => Msg::RequestDelete,
                KeyCode::Char('x') => Msg::ExpandIdeas,
                KeyCode::Char('X') => Msg::AppendIdeas,
                KeyCode::Char('K') => Msg::Reorder(Direction::Up),
                KeyCode::Char('J') => Msg::Reorder(Direction::Down),
                KeyCode::Char('m') => Msg::PickUp,
                KeyCode::Char('r') => Msg::Reload,
                KeyCode::Char('?') => Msg::ToggleHelp,
                KeyCode::Esc => Msg::Cancel,
                _ => Msg::Noop,
            }
        }
    }
}

/// Keys that move the cursor in both normal and moving mode
fn navigation(code: KeyCode) -> Option<Msg> {
    let msg = match code {
        KeyCode::Char('j') | KeyCode::Down => Msg::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Msg::MoveUp,
        KeyCode::Char('h') | KeyCode::Left => Msg::Fold,
        KeyCode::Char('l') | KeyCode::Right => Msg::Unfold,
        KeyCode::Char('g') | KeyCode::Home => Msg::JumpToTop,
        KeyCode::Char('G') | KeyCode::End => Msg::JumpToBottom,
        _ => return None,
    };
    Some(msg)
}

/// Check if a message changes the tree
pub fn is_mutation(msg: &Msg) -> bool {
    matches!(
        msg,
        Msg::Commit | Msg::ConfirmDelete | Msg::Reorder(_) | Msg::Drop(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(mode: InputMode, code: KeyCode) -> Msg {
        key_to_msg(mode, code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_to_msg_navigation() {
        assert_eq!(key(InputMode::Normal, KeyCode::Char('j')), Msg::MoveDown);
        assert_eq!(key(InputMode::Normal, KeyCode::Up), Msg::MoveUp);
        assert_eq!(key(InputMode::Normal, KeyCode::Char('h')), Msg::Fold);
        assert_eq!(key(InputMode::Normal, KeyCode::Right), Msg::Unfold);
        assert_eq!(key(InputMode::Normal, KeyCode::Char('G')), Msg::JumpToBottom);
    }

    #[test]
    fn test_key_to_msg_editing_actions() {
        assert_eq!(key(InputMode::Normal, KeyCode::Char('a')), Msg::AddChild);
        assert_eq!(key(InputMode::Normal, KeyCode::Char('e')), Msg::StartEdit);
        assert_eq!(key(InputMode::Normal, KeyCode::Enter), Msg::StartEdit);
        assert_eq!(key(InputMode::Normal, KeyCode::Char('d')), Msg::RequestDelete);
        assert_eq!(key(InputMode::Normal, KeyCode::Char('K')), Msg::Reorder(Direction::Up));
        assert_eq!(key(InputMode::Normal, KeyCode::Char('J')), Msg::Reorder(Direction::Down));
        assert_eq!(key(InputMode::Normal, KeyCode::Char('x')), Msg::ExpandIdeas);
        assert_eq!(key(InputMode::Normal, KeyCode::Char('X')), Msg::AppendIdeas);
    }

    #[test]
    fn test_key_to_msg_edit_mode_captures_text() {
        // 'q' and 'j' are text while editing
        assert_eq!(key(InputMode::Editing, KeyCode::Char('q')), Msg::Input('q'));
        assert_eq!(key(InputMode::Editing, KeyCode::Char('j')), Msg::Input('j'));
        assert_eq!(key(InputMode::Editing, KeyCode::Enter), Msg::Commit);
        assert_eq!(key(InputMode::Editing, KeyCode::Esc), Msg::Cancel);
        assert_eq!(key(InputMode::Editing, KeyCode::Backspace), Msg::Backspace);
    }

    #[test]
    fn test_key_to_msg_moving_mode() {
        assert_eq!(key(InputMode::Moving, KeyCode::Enter), Msg::Drop(DropPosition::Into));
        assert_eq!(key(InputMode::Moving, KeyCode::Char('b')), Msg::Drop(DropPosition::Before));
        assert_eq!(key(InputMode::Moving, KeyCode::Char('A')), Msg::Drop(DropPosition::After));
        assert_eq!(key(InputMode::Moving, KeyCode::Esc), Msg::Cancel);
        assert_eq!(key(InputMode::Moving, KeyCode::Char('j')), Msg::MoveDown);
        assert_eq!(key(InputMode::Moving, KeyCode::Char('d')), Msg::Noop);
    }

    #[test]
    fn test_key_to_msg_confirm_mode() {
        assert_eq!(key(InputMode::Confirming, KeyCode::Char('y')), Msg::ConfirmDelete);
        assert_eq!(key(InputMode::Confirming, KeyCode::Char('n')), Msg::Cancel);
        assert_eq!(key(InputMode::Confirming, KeyCode::Esc), Msg::Cancel);
    }

    #[test]
    fn test_key_to_msg_help_and_quit() {
        assert_eq!(key(InputMode::Normal, KeyCode::Char('?')), Msg::ToggleHelp);
        assert_eq!(key(InputMode::Help, KeyCode::Esc), Msg::ToggleHelp);
        assert_eq!(key(InputMode::Normal, KeyCode::Char('q')), Msg::Quit);
        assert_eq!(
            key_to_msg(InputMode::Editing, KeyCode::Char('c'), KeyModifiers::CONTROL),
            Msg::Quit
        );
    }

    #[test]
    fn test_key_to_msg_unhandled() {
        assert_eq!(key(InputMode::Normal, KeyCode::Char('z')), Msg::Noop);
        assert_eq!(key(InputMode::Normal, KeyCode::Tab), Msg::Noop);
    }

    #[test]
    fn test_is_mutation() {
        assert!(is_mutation(&Msg::Commit));
        assert!(is_mutation(&Msg::Drop(DropPosition::Before)));
        assert!(!is_mutation(&Msg::MoveDown));
        assert!(!is_mutation(&Msg::ExpandIdeas));
    }
}
