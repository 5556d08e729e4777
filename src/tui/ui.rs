//! Drawing and widgets for the CCA Finder TUI

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::app::App;
use crate::finder::{EntryLink, ResultsPanel, RESULTS_HEADING, TITLE};

/// Common UI styles
pub struct Styles;

impl Styles {
    pub fn title() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn link() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn inactive() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn active_border() -> Style {
        Style::default().fg(Color::Yellow)
    }
}

/// Single-line text input with a character cursor
#[derive(Debug, Clone, Default)]
pub struct InputField {
    pub value: String,
    pub placeholder: String,
    /// Cursor position in characters, not bytes
    pub cursor_position: usize,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self.cursor_position = value.chars().count();
        self
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let index = self.byte_index(self.cursor_position);
        self.value.insert(index, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.byte_index(self.cursor_position);
            self.value.remove(index);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor_position < self.char_count() {
            let index = self.byte_index(self.cursor_position);
            self.value.remove(index);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.char_count() {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor_position = self.char_count();
    }

    /// Display width up to the cursor, for placing the terminal cursor
    pub fn cursor_offset(&self) -> u16 {
        let before: String = self.value.chars().take(self.cursor_position).collect();
        unicode_width::UnicodeWidthStr::width(before.as_str()) as u16
    }
}

/// Draw the whole screen
pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    let title = Paragraph::new(TITLE)
        .style(Styles::title())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    draw_address_input(f, app, chunks[1]);
    draw_error(f, app, chunks[2]);
    draw_results(f, app, chunks[3]);
    draw_status_bar(f, app, chunks[4]);
}

fn draw_address_input(f: &mut Frame, app: &App, area: Rect) {
    let display = app.view.display();
    let button = format!("[ {} ]", display.submit_label);

    let text = if app.input.value.is_empty() {
        Span::styled(app.input.placeholder.as_str(), Styles::inactive())
    } else {
        Span::raw(app.input.value.as_str())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Styles::active_border())
        .title("Address")
        .title(
            ratatui::widgets::block::Title::from(Span::styled(
                button,
                if display.submit_enabled { Styles::title() } else { Styles::inactive() },
            ))
            .alignment(Alignment::Right),
        );

    f.render_widget(Paragraph::new(Line::from(text)).block(block), area);
    f.set_cursor(area.x + 1 + app.input.cursor_offset(), area.y + 1);
}

fn draw_error(f: &mut Frame, app: &App, area: Rect) {
    if let Some(error) = app.view.display().error {
        let notice = Paragraph::new(error)
            .style(Styles::error())
            .alignment(Alignment::Center);
        f.render_widget(notice, area);
    }
}

fn draw_results(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(RESULTS_HEADING);

    let items: Vec<ListItem> = match app.view.display().results {
        ResultsPanel::Hidden => {
            f.render_widget(block, area);
            return;
        }
        ResultsPanel::Empty(notice) => {
            let empty = Paragraph::new(notice)
                .style(Styles::inactive())
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(empty, area);
            return;
        }
        ResultsPanel::Entries(entries) => entries
            .iter()
            .map(|entry| {
                let link = match entry.link {
                    EntryLink::Signup(url) => Line::from(vec![
                        Span::raw("  Signup: "),
                        Span::styled(url.to_string(), Styles::link()),
                    ]),
                    EntryLink::Missing(placeholder) => {
                        Line::from(Span::styled(format!("  {}", placeholder), Styles::inactive()))
                    }
                };
                ListItem::new(vec![
                    Line::from(Span::styled(
                        entry.name.to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    link,
                ])
            })
            .collect(),
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Styles::selected())
        .highlight_symbol(">> ");

    let mut list_state: ListState = app.list_state.clone();
    f.render_stateful_widget(list, area, &mut list_state);
    app.list_state = list_state;
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let text = match app.status_message {
        Some(ref msg) => format!("Status: {}", msg),
        None => "Enter: Search | ↑/↓: Select | Ctrl-O: Open signup link | Esc: Quit".to_string(),
    };

    let status_bar = Paragraph::new(text)
        .style(Styles::inactive())
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status_bar, area);
}
