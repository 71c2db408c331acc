use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, LoginField, Role, Screen};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Login => render_login_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let user_indicator = if app.screen == Screen::Chat && !app.username.is_empty() {
        format!(" [{}]", app.username)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" Chatbot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(user_indicator, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match (app.screen, app.busy()) {
        (Screen::Login, _) => (" LOGIN ", Style::default().bg(Color::Blue).fg(Color::White)),
        (Screen::Chat, false) => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        (Screen::Chat, true) => (
            " WAITING ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.screen {
        Screen::Login => vec![
            Span::styled(" Tab ", key_style),
            Span::styled(" switch field ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" sign in ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ],
        Screen::Chat => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Up/Dn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" ^L ", key_style),
            Span::styled(" log out ", label_style),
            Span::styled(" ^C ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);

    let footer = Paragraph::new(Line::from(spans));
    frame.render_widget(footer, area);
}

fn render_login_screen(app: &App, frame: &mut Frame, area: Rect) {
    // Center a fixed-size form
    let form_width = 44.min(area.width.saturating_sub(2));
    let form_height = 9;

    let [_, middle, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(form_height),
        Constraint::Min(0),
    ])
    .areas(area);
    let [_, form_area, _] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(form_width),
        Constraint::Min(0),
    ])
    .areas(middle);

    let [title_area, username_area, password_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(2),
    ])
    .areas(form_area);

    let title = Paragraph::new(Span::styled(
        "Sign in",
        Style::default().fg(Color::Cyan).bold(),
    ));
    frame.render_widget(title, title_area);

    let field_border = |field: LoginField| {
        if app.login_field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let username = Paragraph::new(app.username.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(field_border(LoginField::Username))
                .title(" Username "),
        );
    frame.render_widget(username, username_area);

    // Never echo the password itself
    let masked = "\u{2022}".repeat(app.password.chars().count());
    let password = Paragraph::new(masked)
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(field_border(LoginField::Password))
                .title(" Password "),
        );
    frame.render_widget(password, password_area);

    let status = if app.login_busy {
        Paragraph::new("Signing in...").style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )
    } else if let Some(error) = &app.login_error {
        Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
    } else {
        Paragraph::new("Press Enter to sign in").style(Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(status, status_area);

    // Cursor at the end of the focused field
    if !app.login_busy {
        let (field_area, len) = match app.login_field {
            LoginField::Username => (username_area, app.username.chars().count()),
            LoginField::Password => (password_area, app.password.chars().count()),
        };
        let inner_width = field_area.width.saturating_sub(2) as usize;
        let cursor_x = len.min(inner_width) as u16;
        frame.set_cursor_position((field_area.x + cursor_x + 1, field_area.y + 1));
    }
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store transcript dimensions for scroll calculations (inner size minus borders)
    app.chat_height = transcript_area.height.saturating_sub(2);
    app.chat_width = transcript_area.width.saturating_sub(2);

    let transcript_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let transcript_text = if app.messages.is_empty() && !app.busy() {
        Text::from(Span::styled(
            "Type a message to start chatting...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &app.messages {
            match msg.role {
                Role::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                }
                Role::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )));
                }
            }
            for line in msg.text.lines() {
                lines.push(Line::from(line));
            }
            lines.push(Line::default());
        }

        if app.busy() {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let transcript = Paragraph::new(transcript_text)
        .block(transcript_block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(transcript, transcript_area);

    // Input box; dimmed while a send is in flight
    let input_border_color = if app.busy() {
        Color::DarkGray
    } else {
        Color::Yellow
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Message ");

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() && !app.busy() {
        Paragraph::new("Type a message...")
            .style(Style::default().fg(Color::DarkGray))
            .block(input_block)
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text)
            .style(Style::default().fg(Color::Cyan))
            .block(input_block)
    };

    frame.render_widget(input, input_area);

    // Hide the cursor while the send affordance is disabled
    if !app.busy() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}
