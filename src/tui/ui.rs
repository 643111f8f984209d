//! Rendering of the terminal editor: header, tree, footer and overlays

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tui_tree_widget::{Tree, TreeItem};

use super::app::{App, Mode};
use crate::tree::{NodeId, TreeNode};

/// Draw one frame. Takes `&mut App` because the tree widget updates its state.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let [header, body, footer] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)]).areas(area);

    draw_header(frame, app, header);
    draw_tree(frame, app, body);
    draw_footer(frame, app, footer);

    match &app.mode {
        Mode::Help => draw_help_overlay(frame, area),
        Mode::ConfirmDelete { node } => {
            if let Some(node) = app.tree.find(node) {
                draw_confirm_delete(frame, node, area);
            }
        }
        _ => {}
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let ai_count = app.tree.iter().filter(|(_, n)| n.is_ai()).count();
    let mode = match &app.mode {
        Mode::Normal | Mode::Help => "",
        Mode::Editing { .. } => " │ EDIT",
        Mode::Moving { .. } => " │ MOVE",
        Mode::ConfirmDelete { .. } => " │ DELETE?",
    };
    let loading = if app.loading.is_some() { " │ ✨ thinking..." } else { "" };

    let title = format!(
        " LogicTree │ {} │ [{} nodes, {} AI]{}{}",
        app.store().path().display(),
        app.tree.node_count(),
        ai_count,
        mode,
        loading
    );

    let bar = Paragraph::new(title).style(Style::new().white().on_blue().bold());
    frame.render_widget(bar, area);
}

/// One tree row: text, AI marker, and edit/move/loading decorations
fn node_line(node: &TreeNode, app: &App) -> Line<'static> {
    if let Mode::Editing { node: editing, buffer, .. } = &app.mode {
        if *editing == node.id {
            return Line::from(vec![
                Span::styled(buffer.clone(), Style::default().fg(Color::Yellow)),
                Span::styled("▏", Style::default().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK)),
            ]);
        }
    }

    let mut style = Style::default();
    if node.is_ai() {
        style = style.fg(Color::Magenta);
    }
    if app.tree.is_root(&node.id) {
        style = style.bold();
    }

    let mut spans = vec![Span::styled(node.text.clone(), style)];
    if node.is_ai() {
        spans.push(Span::raw(" ✨"));
    }
    if app.loading.as_ref() == Some(&node.id) {
        spans.push(Span::styled(" ⏳", Style::default().fg(Color::Cyan)));
    }
    if let Mode::Moving { node: moving } = &app.mode {
        if *moving == node.id {
            spans.push(Span::styled(" [moving]", Style::default().fg(Color::Yellow).italic()));
        }
    }
    Line::from(spans)
}

/// Build widget items mirroring the logic tree
pub fn tree_items(app: &App) -> std::io::Result<Vec<TreeItem<'static, NodeId>>> {
    fn build(node: &TreeNode, app: &App) -> std::io::Result<TreeItem<'static, NodeId>> {
        let line = node_line(node, app);
        if node.children.is_empty() {
            return Ok(TreeItem::new_leaf(node.id.clone(), line));
        }
        let children = node
            .children
            .iter()
            .map(|child| build(child, app))
            .collect::<std::io::Result<Vec<_>>>()?;
        TreeItem::new(node.id.clone(), line, children)
    }

    Ok(vec![build(app.tree.root(), app)?])
}

fn draw_tree(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = match &app.mode {
        Mode::Moving { .. } => " Pick a target: Enter=into  b=before  A=after  Esc=cancel ",
        _ => " Tree ",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let widget = tree_items(app).and_then(|items| {
        let tree = Tree::new(&items)?
            .block(block.clone())
            .highlight_style(Style::default().bg(Color::DarkGray).bold())
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(tree, area, &mut app.state);
        Ok(())
    });

    if let Err(e) = widget {
        let error = Paragraph::new(format!("Cannot render tree: {}", e))
            .style(Style::default().fg(Color::Red))
            .block(block);
        frame.render_widget(error, area);
    }
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keybinds = match &app.mode {
        Mode::Normal => "j/k:move  h/l:fold  a:add  e:edit  d:delete  x:ideas  K/J:reorder  m:move  ?:help  q:quit",
        Mode::Editing { .. } => "Enter:save  Esc:cancel",
        Mode::Moving { .. } => "j/k:choose target  Enter:into  b:before  A:after  Esc:cancel",
        Mode::ConfirmDelete { .. } => "y:delete  any other key:cancel",
        Mode::Help => "any key:close",
    };

    let (text, style) = match &app.status {
        Some(status) if status.is_error => (
            status.text.clone(),
            Style::default().bg(Color::Red).fg(Color::White),
        ),
        Some(status) => (
            status.text.clone(),
            Style::default().bg(Color::DarkGray).fg(Color::Green),
        ),
        None => (
            keybinds.to_string(),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
    };

    frame.render_widget(Paragraph::new(format!(" {}", text)).style(style), area);
}

/// Centered popup rect, clamped to the screen
fn popup(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn draw_confirm_delete(frame: &mut Frame, node: &TreeNode, area: Rect) {
    let popup_area = popup(area, 50, 7);
    frame.render_widget(Clear, popup_area);

    let descendants = node.subtree_size() - 1;
    let mut lines = vec![Line::from(Span::styled(node.text.clone(), Style::default().bold()))];
    if descendants > 0 {
        lines.push(Line::from(format!("and {} descendant(s)", descendants)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Press y to delete, any other key to cancel"));

    let confirm = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Delete? ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(confirm, popup_area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = popup(area, 56, 26);
    frame.render_widget(Clear, popup_area);

    let help_text = r#"
  Navigation
  ─────────────────────────────────
  j/k, ↑/↓     Move up/down
  h/l, ←/→     Collapse/expand branch
  g/G          Jump to top/bottom

  Editing
  ─────────────────────────────────
  a            Add child and edit it
  e, Enter     Edit text (Enter saves, Esc cancels)
  d            Delete node and its subtree
  K/J          Move node up/down among siblings
  m            Pick up node, then Enter/b/A to drop
               into, before or after the selection

  Ideas
  ─────────────────────────────────
  x            Replace AI children with new ideas
  X            Append new ideas

  r            Reload from disk
  q            Quit

  Press any key to close
"#;

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(help, popup_area);
}
