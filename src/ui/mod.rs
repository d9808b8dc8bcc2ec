use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};

const SYSTEM_NICK: &str = "charla";
const PENDING_MARK: &str = " ⌛";

pub fn draw(f: &mut Frame<'_>, app: &App) {
    let size = f.size();

    // Create main layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Input area
        ])
        .split(size);

    // Draw title bar
    draw_title_bar(f, app, chunks[0]);

    // Draw main content
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(70), // Conversation
            Constraint::Percentage(30), // Info panel
        ])
        .split(chunks[1]);

    draw_chat_area(f, app, main_chunks[0]);
    draw_info_panel(f, app, main_chunks[1]);

    // Draw input area
    draw_input_area(f, app, chunks[2]);
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let signing = if app.fingerprint.is_some() {
        "signed"
    } else {
        "unsigned"
    };
    let title = format!(
        " Charla v{} | {} | {} ",
        env!("CARGO_PKG_VERSION"),
        app.display_name(),
        signing
    );

    let title_style = if app.fingerprint.is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };

    let title_block = Block::default()
        .borders(Borders::ALL)
        .style(title_style)
        .title(" Charla ");

    let title_paragraph = Paragraph::new(title)
        .block(title_block)
        .alignment(Alignment::Center);

    f.render_widget(title_paragraph, area);
}

fn draw_chat_area(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Conversación ")
        .style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();

    // Newest messages fill the bottom of the pane
    for message in app.get_visible_messages(inner.height as usize) {
        let (nick, nick_color) = if message.is_own() {
            (app.display_name(), Color::Green)
        } else {
            (SYSTEM_NICK, Color::Magenta)
        };

        let mut spans = vec![
            Span::styled(
                format!("[{}] ", message.formatted_time()),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(format!("<{}> ", nick), Style::default().fg(nick_color)),
            Span::raw(message.content()),
        ];
        // Own message not yet delivered
        if message.is_own() && !message.is_sent() {
            spans.push(Span::styled(PENDING_MARK, Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(spans));
    }

    // Show hint if no messages at all
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No messages yet. Press 'i', type a message and press Enter. /username <name> sets your name.",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    let messages_widget = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(messages_widget, inner);
}

fn draw_info_panel(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Identity
            Constraint::Length(5), // Storage
            Constraint::Min(0),    // Status notices
        ])
        .split(area);

    // Identity info
    let identity_block = Block::default()
        .borders(Borders::ALL)
        .title(" Identity ")
        .style(Style::default().fg(Color::Blue));

    let identity_text = vec![
        Line::from(vec![
            Span::raw("Name: "),
            Span::styled(app.display_name(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::raw("Key: "),
            match &app.fingerprint {
                Some(fingerprint) => Span::styled(fingerprint.as_str(), Style::default().fg(Color::Gray)),
                None => Span::styled("none", Style::default().fg(Color::Yellow)),
            },
        ]),
    ];

    let identity_paragraph = Paragraph::new(identity_text).block(identity_block);
    f.render_widget(identity_paragraph, chunks[0]);

    // Storage info
    let storage_block = Block::default()
        .borders(Borders::ALL)
        .title(" Storage ")
        .style(Style::default().fg(Color::Blue));

    let storage_text = vec![
        Line::from(vec![
            Span::raw("Messages: "),
            Span::styled(app.message_count.to_string(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("Database: "),
            Span::styled(
                app.database_path.display().to_string(),
                Style::default().fg(Color::Gray),
            ),
        ]),
    ];

    let storage_paragraph = Paragraph::new(storage_text)
        .block(storage_block)
        .wrap(Wrap { trim: true });
    f.render_widget(storage_paragraph, chunks[1]);

    // Status notices, most recent at the bottom
    let status_block = Block::default()
        .borders(Borders::ALL)
        .title(" Status ")
        .style(Style::default().fg(Color::Blue));

    let visible = chunks[2].height.saturating_sub(2) as usize;
    let skip = app.status_messages.len().saturating_sub(visible);
    let notices: Vec<ListItem> = app
        .status_messages
        .iter()
        .skip(skip)
        .map(|notice| {
            let style = if notice.contains("Error") || notice.contains("Could not") {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(notice.as_str()).style(style)
        })
        .collect();

    let status_list = List::new(notices).block(status_block);
    f.render_widget(status_list, chunks[2]);
}

fn draw_input_area(f: &mut Frame, app: &App, area: Rect) {
    let input_style = match app.input_mode {
        InputMode::Normal => Style::default().fg(Color::White),
        InputMode::Editing => Style::default().fg(Color::Green),
    };

    let mode_indicator = match app.input_mode {
        InputMode::Normal => "[NORMAL] i=input, q=quit, arrows=scroll",
        InputMode::Editing => "[INPUT] ESC=normal, ENTER=send",
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .title(mode_indicator)
        .style(input_style);

    let input_text = if app.input_mode == InputMode::Editing {
        app.input.as_str()
    } else {
        ""
    };

    let input_paragraph = Paragraph::new(input_text)
        .block(input_block)
        .wrap(Wrap { trim: false });

    f.render_widget(input_paragraph, area);

    // Set cursor position when in editing mode
    if app.input_mode == InputMode::Editing {
        f.set_cursor(area.x + app.cursor_position as u16 + 1, area.y + 1);
    }
}
