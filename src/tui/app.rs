//! Main TUI application state and logic

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    widgets::ListState,
    Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

use super::events::AppEvent;
use super::ui::{self, InputField};
use crate::client::EligibilitySource;
use crate::finder::{FinderView, ADDRESS_PLACEHOLDER};

const TICK: Duration = Duration::from_millis(100);

/// Main TUI application state
pub struct App {
    pub view: FinderView,
    pub input: InputField,
    pub list_state: ListState,
    pub status_message: Option<String>,
    pub should_quit: bool,
    source: Arc<dyn EligibilitySource>,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(source: Arc<dyn EligibilitySource>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            view: FinderView::new(),
            input: InputField::new().with_placeholder(ADDRESS_PLACEHOLDER),
            list_state: ListState::default(),
            status_message: None,
            should_quit: false,
            source,
            events_tx,
            events_rx,
        }
    }

    /// Run the main application loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, self))?;

            while let Ok(app_event) = self.events_rx.try_recv() {
                self.handle_app_event(app_event);
            }

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key_event(key);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Handle keyboard input events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('o') if ctrl => self.open_selected_link(),
            KeyCode::Enter => self.submit_search(),
            KeyCode::Up => self.previous_result(),
            KeyCode::Down => self.next_result(),
            KeyCode::Char(c) if !ctrl => self.input.insert_char(c),
            KeyCode::Backspace => self.input.delete_char(),
            KeyCode::Delete => self.input.delete_char_forward(),
            KeyCode::Left => self.input.move_cursor_left(),
            KeyCode::Right => self.input.move_cursor_right(),
            KeyCode::Home => self.input.move_cursor_to_start(),
            KeyCode::End => self.input.move_cursor_to_end(),
            _ => {}
        }
    }

    /// Start a background search for the typed address
    pub fn submit_search(&mut self) {
        self.view.set_address(self.input.value.clone());
        let Some(request) = self.view.submit() else {
            return;
        };

        info!("Searching eligible CCAs for '{}'", request.address);
        self.list_state.select(None);
        self.status_message = None;

        let source = Arc::clone(&self.source);
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let app_event = match source.eligible_ccas(&request.address).await {
                Ok(results) => AppEvent::SearchComplete(results),
                Err(e) => AppEvent::SearchFailed(e.to_string()),
            };
            if events_tx.send(app_event).is_err() {
                warn!("Search finished after the TUI closed");
            }
        });
    }

    pub fn handle_app_event(&mut self, app_event: AppEvent) {
        match app_event {
            AppEvent::SearchComplete(results) => {
                let count = results.len();
                self.view.finish_with_results(results);
                self.list_state.select(if count > 0 { Some(0) } else { None });
                self.status_message = Some(format!("Found {} eligible programs", count));
            }
            AppEvent::SearchFailed(reason) => {
                self.view.finish_with_failure(reason);
                self.list_state.select(None);
            }
        }
    }

    /// Wait for the next background event; used by tests and scripted runs
    pub async fn next_app_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    fn next_result(&mut self) {
        let count = self.view.results().len();
        if count == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % count,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous_result(&mut self) {
        let count = self.view.results().len();
        if count == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn open_selected_link(&mut self) {
        let link = self
            .list_state
            .selected()
            .and_then(|i| self.view.results().get(i))
            .and_then(|result| result.link().map(str::to_string));

        match link {
            Some(link) => match open::that(&link) {
                Ok(()) => self.status_message = Some(format!("Opened {}", link)),
                Err(e) => {
                    error!("Failed to open {}: {}", link, e);
                    self.status_message = Some(format!("Could not open {}", link));
                }
            },
            None => self.status_message = Some("No signup link available".to_string()),
        }
    }
}

/// Set up the terminal, run the app, and restore the terminal
pub async fn run_tui(source: Arc<dyn EligibilitySource>) -> Result<()> {
    info!("Starting TUI interface");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(source);
    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
