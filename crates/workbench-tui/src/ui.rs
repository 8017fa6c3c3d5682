use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};
use unicode_width::UnicodeWidthChar;
use workbench_core::{Message, Mode, Role, UploadStatus};

use crate::app::{App, InputMode};

/// Static labels for the backend stack, shown in the status panel
const BACKEND_STACK: [(&str, &str); 3] = [
    ("Vector DB", "Chroma"),
    ("Embedding", "Gemini-001"),
    ("LLM", "Gemini-2.5-Flash"),
];

const CONTEXT_PREVIEW_CHARS: usize = 160;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Screen regions, shared by `render` and `max_scroll`
struct Areas {
    header: Rect,
    sidebar: Rect,
    tabs: Rect,
    chat: Rect,
    input: Rect,
    footer: Rect,
}

fn split(area: Rect) -> Areas {
    // Main layout: header, body, footer
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [sidebar, main] = Layout::horizontal([
        Constraint::Length(36),
        Constraint::Min(0),
    ])
    .areas(body);

    let [tabs, chat, input] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(main);

    Areas { header, sidebar, tabs, chat, input, footer }
}

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let areas = split(area);

    render_header(app, frame, areas.header);
    render_sidebar(app, frame, areas.sidebar);
    render_chat(app, frame, &areas);
    render_footer(app, frame, areas.footer);

    if app.show_file_picker {
        render_file_picker(app, frame, area);
    }
}

/// Transcript rows hidden above the view when it follows the newest message,
/// i.e. the furthest the user can scroll up on a screen of this size.
pub fn max_scroll(app: &App, area: Rect) -> u16 {
    let chat = split(area).chat;
    let lines = transcript_lines(app);
    wrapped_height(&lines, chat.width.saturating_sub(2))
        .saturating_sub(chat.height.saturating_sub(2))
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" RAG Evaluation Workbench ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" Server: {} ", app.client.base_url()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.show_file_picker {
        (" FILE ", Style::default().bg(Color::Magenta).fg(Color::White))
    } else {
        match app.input_mode {
            InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
            InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = if app.show_file_picker {
        &[(" Enter ", " select "), (" Esc ", " cancel ")]
    } else {
        match app.input_mode {
            InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " commands ")],
            InputMode::Normal => &[
                (" o ", " open PDF "),
                (" u ", " ingest "),
                (" m ", " mode "),
                (" c ", if app.show_contexts { " hide contexts " } else { " contexts " }),
                (" j/k ", " scroll "),
                (" i ", " type "),
                (" q ", " quit "),
            ],
        }
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    for (key, label) in pairs {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_sidebar(app: &App, frame: &mut Frame, area: Rect) {
    let [ingest_area, status_area] = Layout::vertical([
        Constraint::Min(10),
        Constraint::Length(7),
    ])
    .areas(area);

    render_ingestion(app, frame, ingest_area);
    render_system_status(app, frame, status_area);
}

fn render_ingestion(app: &App, frame: &mut Frame, area: Rect) {
    let upload = app.workbench.upload();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Document Ingestion ");

    let mut lines = vec![
        Line::from(Span::styled(
            "Upload PDF to RAG system",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
    ];

    let file_line = match upload.selected_name() {
        Some(name) => Line::from(vec![
            Span::raw("File: "),
            Span::styled(name, Style::default().fg(Color::White).bold()),
        ]),
        None => Line::from(vec![
            Span::raw("File: "),
            Span::styled("none (press o)", Style::default().fg(Color::DarkGray)),
        ]),
    };
    lines.push(file_line);

    let button = if upload.is_uploading() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Span::styled(
            format!("Ingesting{}", dots),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )
    } else if upload.selected_file.is_some() {
        Span::styled("[u] Ingest Document", Style::default().fg(Color::Cyan).bold())
    } else {
        Span::styled("[u] Ingest Document", Style::default().fg(Color::DarkGray))
    };
    lines.push(Line::from(button));
    lines.push(Line::default());

    match upload.status {
        UploadStatus::Success => lines.push(Line::from(Span::styled(
            format!("✔ {}", upload.status_message),
            Style::default().fg(Color::Green),
        ))),
        UploadStatus::Error => lines.push(Line::from(Span::styled(
            format!("✖ {}", upload.status_message),
            Style::default().fg(Color::Red),
        ))),
        UploadStatus::Idle | UploadStatus::InProgress => {}
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_system_status(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" System Status ");

    let value_style = Style::default().fg(Color::White).bold();
    let label_style = Style::default().fg(Color::DarkGray);

    let mut lines = vec![Line::from(vec![
        Span::styled("Mode: ", label_style),
        Span::styled(format!("{} RAG", app.workbench.mode().title()), value_style),
    ])];
    for (label, value) in BACKEND_STACK {
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", label), label_style),
            Span::styled(value, value_style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_chat(app: &App, frame: &mut Frame, areas: &Areas) {
    // Mode tabs
    let modes = Mode::all();
    let selected = modes
        .iter()
        .position(|m| *m == app.workbench.mode())
        .unwrap_or(0);
    let tabs = Tabs::new(modes.iter().map(|m| m.display_name()).collect::<Vec<_>>())
        .select(selected)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Mode (m to switch) "),
        )
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, areas.tabs);

    // Transcript
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let lines = transcript_lines(app);
    let inner_width = areas.chat.width.saturating_sub(2);
    let inner_height = areas.chat.height.saturating_sub(2);
    let hidden = wrapped_height(&lines, inner_width).saturating_sub(inner_height);
    let top = hidden.saturating_sub(app.scroll_from_bottom);

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((top, 0));
    frame.render_widget(chat, areas.chat);

    render_input(app, frame, areas.input);
}

/// Transcript as styled lines: placeholder when empty, one block per
/// message in order, then the transient "Thinking" indicator while loading.
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let workbench = &app.workbench;

    if workbench.transcript().is_empty() && !workbench.is_loading() {
        return vec![Line::from(Span::styled(
            "Upload a document and start chatting!",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in workbench.transcript() {
        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    if msg.error {
                        lines.push(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(Color::Red),
                        )));
                    } else {
                        lines.push(parse_markdown_line(line));
                    }
                }
                push_sources(&mut lines, msg);
                if app.show_contexts {
                    push_contexts(&mut lines, msg);
                }
            }
        }
        lines.push(Line::default());
    }

    if workbench.is_loading() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn push_sources(lines: &mut Vec<Line<'static>>, msg: &Message) {
    if msg.sources.is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled(
        "Sources:",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
    )));
    for src in &msg.sources {
        lines.push(Line::from(vec![
            Span::styled("  • ", Style::default().fg(Color::DarkGray)),
            Span::styled(src.source.clone(), Style::default().fg(Color::White).bold()),
            Span::styled(format!(" (p.{})", src.page), Style::default().fg(Color::DarkGray)),
        ]));
    }
}

fn push_contexts(lines: &mut Vec<Line<'static>>, msg: &Message) {
    if msg.contexts.is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled(
        "Contexts:",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
    )));
    for (i, context) in msg.contexts.iter().enumerate() {
        let flat = context.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut preview: String = flat.chars().take(CONTEXT_PREVIEW_CHARS).collect();
        if flat.chars().count() > CONTEXT_PREVIEW_CHARS {
            preview.push_str("...");
        }
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", i + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(preview, Style::default().fg(Color::Gray)),
        ]));
    }
}

/// Rows the lines occupy once wrapped to `width` (approximate for word wrap)
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

/// Slice of `text` that fits in `width` columns with the cursor (a char
/// index) in view. Returns the slice and the cursor's column within it.
fn input_window(text: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let columns = |c: char| c.width().unwrap_or(0);

    // One column stays free for the cursor itself
    let budget = width.saturating_sub(1);
    let mut start = cursor;
    let mut before = 0;
    while start > 0 {
        let w = columns(chars[start - 1]);
        if before + w > budget {
            break;
        }
        before += w;
        start -= 1;
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|c| {
            used += columns(**c);
            used <= width
        })
        .collect();

    (visible, before as u16)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && !app.show_file_picker;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask a question about your documents ");

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) =
        input_window(&app.workbench.input, app.input_cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_file_picker(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Select PDF ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    if inner.height < 3 {
        return;
    }

    let instructions = Paragraph::new("Path to a .pdf file. Enter to select, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    // Path field, scrolled so the cursor stays visible
    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let (visible, cursor_x) = input_window(
        &app.file_input,
        app.file_input_cursor,
        input_area.width as usize,
    );
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        input_area,
    );
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    if let Some(error) = &app.file_picker_error {
        if inner.height > 4 {
            let status = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
            frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
    use tokio::sync::mpsc;
    use workbench_core::{ApiError, ChatResponse, IngestResponse, RagClient, Source};

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(RagClient::new("http://localhost:8000"), Mode::Simple, tx)
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn buffer_text(buffer: &Buffer) -> String {
        let width = buffer.area.width.max(1) as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 32)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn answered(app: &mut App, question: &str, response: ChatResponse) {
        let ticket = app.workbench.submit_query(question).unwrap();
        app.workbench.finish_query(&ticket, Ok(response));
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("a **b** c");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "b");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));

        let unclosed = parse_markdown_line("a **b");
        assert_eq!(line_text(&unclosed), "a **b");
    }

    #[test]
    fn test_empty_transcript_shows_placeholder() {
        let app = test_app();
        let lines = transcript_lines(&app);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "Upload a document and start chatting!");
        assert!(draw(&app).contains("Upload a document and start chatting!"));
    }

    #[test]
    fn test_loading_indicator_follows_last_message() {
        let mut app = test_app();
        let ticket = app.workbench.submit_query("hello").unwrap();

        let lines = transcript_lines(&app);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts[0], "You:");
        assert_eq!(texts[1], "hello");
        assert!(texts.last().unwrap().starts_with("Thinking"));

        app.workbench.finish_query(&ticket, Err(ApiError::Malformed("x".into())));
        let lines = transcript_lines(&app);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(!texts.iter().any(|t| t.starts_with("Thinking")));
        let error_at = texts.iter().position(|t| t.starts_with("Error:")).unwrap();
        assert_eq!(lines[error_at].spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn test_sources_render_name_then_page() {
        let mut app = test_app();
        answered(
            &mut app,
            "what?",
            ChatResponse {
                answer: "this".into(),
                sources: vec![
                    Source { source: "doc.pdf".into(), page: 3, content: "...".into() },
                    Source { source: "other.pdf".into(), page: 12, content: "...".into() },
                ],
                contexts: Vec::new(),
            },
        );

        let texts: Vec<String> = transcript_lines(&app).iter().map(line_text).collect();
        let first = texts.iter().position(|t| t.contains("doc.pdf")).unwrap();
        let second = texts.iter().position(|t| t.contains("other.pdf")).unwrap();
        assert!(first < second);

        let citation = &texts[first];
        let name_at = citation.find("doc.pdf").unwrap();
        let page_at = citation.rfind('3').unwrap();
        assert!(name_at < page_at);

        assert!(draw(&app).contains("doc.pdf (p.3)"));
    }

    #[test]
    fn test_contexts_hidden_until_toggled() {
        let mut app = test_app();
        answered(
            &mut app,
            "what?",
            ChatResponse {
                answer: "this".into(),
                sources: Vec::new(),
                contexts: vec!["retrieved   passage\ntext".into()],
            },
        );

        let hidden: Vec<String> = transcript_lines(&app).iter().map(line_text).collect();
        assert!(!hidden.iter().any(|t| t.contains("retrieved passage text")));

        app.show_contexts = true;
        let shown: Vec<String> = transcript_lines(&app).iter().map(line_text).collect();
        assert!(shown.iter().any(|t| t == "  [1] retrieved passage text"));
    }

    #[test]
    fn test_upload_banners() {
        let mut app = test_app();
        app.workbench.select_file("/tmp/a.pdf");
        assert!(draw(&app).contains("File: a.pdf"));

        app.workbench.begin_ingestion().unwrap();
        app.workbench.finish_ingestion(Ok(IngestResponse {
            filename: "a.pdf".into(),
            chunks_count: 5,
            status: None,
            message: None,
        }));
        assert!(draw(&app).contains("Successfully ingested: a.pdf"));

        app.workbench.select_file("/tmp/b.pdf");
        let screen = draw(&app);
        assert!(!screen.contains("Successfully ingested"));
        assert!(screen.contains("File: b.pdf"));
    }

    #[test]
    fn test_header_and_status_panel() {
        let mut app = test_app();
        app.set_mode(Mode::Agentic);
        let screen = draw(&app);
        assert!(screen.contains("Server: http://localhost:8000"));
        assert!(screen.contains("Mode: Agentic RAG"));
        assert!(screen.contains("Vector DB: Chroma"));
    }

    #[test]
    fn test_input_window_counts_display_columns() {
        assert_eq!(input_window("hello", 5, 10), ("hello".to_string(), 5));
        assert_eq!(input_window("hello world", 11, 5), ("orld".to_string(), 4));

        // CJK characters take two columns each
        assert_eq!(input_window("你好世界", 4, 5), ("世界".to_string(), 4));
        assert_eq!(input_window("你好世界", 1, 5), ("你好".to_string(), 2));
        assert_eq!(input_window("ab你好", 4, 20), ("ab你好".to_string(), 6));
    }

    #[test]
    fn test_max_scroll_tracks_transcript_height() {
        let mut app = test_app();
        let area = Rect::new(0, 0, 120, 32);
        assert_eq!(max_scroll(&app, area), 0);

        for i in 0..30 {
            answered(
                &mut app,
                &format!("question {}", i),
                ChatResponse {
                    answer: "answer".into(),
                    sources: Vec::new(),
                    contexts: Vec::new(),
                },
            );
        }
        // 30 rounds of 6 rows against a 22 row viewport
        assert_eq!(max_scroll(&app, area), 30 * 6 - 22);
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("abcdefghij"), Line::default(), Line::from("abc")];
        assert_eq!(wrapped_height(&lines, 4), 3 + 1 + 1);
        assert_eq!(wrapped_height(&lines, 0), 10 + 1 + 3);
    }
}
