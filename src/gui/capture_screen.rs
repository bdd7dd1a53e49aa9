//! The experimenter's screen: three input fields, start and stop, five
//! response buttons, a status line, and the "another participant?" question
//! after every stop.
//!
//! All of the session logic lives in the [SessionController]; this only
//! turns key presses into calls on it and draws what it reports.

use std::{io::stdout, time::Instant};

use crate::{
    clock::format_timestamp,
    gui::error::GuiError,
    response::{LikertValue, ResponseRecord},
    session::{Field, SessionController},
    ticker::Ticker,
    transport::DeviceConnector,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::info;
use ratatui::{
    prelude::*,
    widgets::{
        block::{Position, Title},
        *,
    },
    Terminal,
};

/// Runs the capture screen until the experimenter quits. A session that is
/// still collecting at that point is stopped first.
pub fn capture_screen<C: DeviceConnector>(
    controller: SessionController<C>,
) -> Result<(), GuiError> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let mut app = CaptureApp::new(controller, Instant::now());
    let res = Terminal::new(CrosstermBackend::new(stdout()))
        .map_err(GuiError::from)
        .and_then(|mut terminal| app.run(&mut terminal));

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    res?;
    app.controller.stop()?;
    Ok(())
}

struct CaptureApp<C: DeviceConnector> {
    controller: SessionController<C>,
    ticker: Ticker,
    focus: Field,
    status: String,
    status_is_error: bool,
    last_response: Option<LikertValue>,
    quit: bool,
}

impl<C: DeviceConnector> CaptureApp<C> {
    fn new(controller: SessionController<C>, now: Instant) -> Self {
        let ticker = Ticker::new(controller.config().tick_interval(), now);
        let focus = Field::ALL
            .into_iter()
            .find(|&f| controller.field(f).is_empty())
            .unwrap_or(Field::Filename);
        Self {
            controller,
            ticker,
            focus,
            status: "Fill in the fields and press <Enter> to start.".to_owned(),
            status_is_error: false,
            last_response: None,
            quit: false,
        }
    }

    fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), GuiError> {
        terminal.clear()?;
        while !self.quit {
            terminal.draw(|frame| self.ui(frame))?;

            let timeout = self.ticker.time_until_due(Instant::now());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.on_key(key);
                    }
                }
            }
            if self.ticker.take_tick(Instant::now()) {
                self.on_tick();
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        match self.controller.tick() {
            Ok(Some(record)) => self.show_record(&record),
            Ok(None) => {}
            Err(e) => self.show_error(e),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        if self.controller.awaiting_continuation() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.answer(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.answer(false),
                _ => {}
            }
            return;
        }

        if self.controller.is_collecting() {
            match key.code {
                KeyCode::Char(c @ '1'..='5') => self.press(c as u8 - b'0'),
                KeyCode::Esc => self.stop(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Enter => self.start(),
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab | KeyCode::Down => self.cycle_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.cycle_focus(Field::ALL.len() - 1),
            KeyCode::Backspace => self.edit(|value| {
                value.pop();
            }),
            KeyCode::Char(c) => self.edit(|value| value.push(c)),
            _ => {}
        }
    }

    fn start(&mut self) {
        match self.controller.start_from_fields() {
            Ok(()) => {
                self.last_response = None;
                self.show("Experiment started. Collecting data...".to_owned());
            }
            Err(e) => self.show_error(e),
        }
    }

    fn stop(&mut self) {
        match self.controller.stop() {
            Ok(()) => self.show("Experiment stopped. Data collection is paused.".to_owned()),
            Err(e) => self.show_error(e),
        }
    }

    fn press(&mut self, point: u8) {
        let Some(value) = LikertValue::new(point) else {
            return;
        };
        match self.controller.record(value) {
            Ok(Some(record)) => {
                self.last_response = Some(value);
                self.show_record(&record);
            }
            Ok(None) => {}
            Err(e) => self.show_error(e),
        }
    }

    fn answer(&mut self, another_participant: bool) {
        if let Err(e) = self.controller.continue_study(another_participant) {
            self.show_error(e);
            return;
        }
        if another_participant {
            self.focus = Field::Filename;
            self.show("Enter the next participant's filename and press <Enter> to start.".to_owned());
        } else {
            self.focus = Field::Study;
            self.show("Study ended. Enter a new study name and filename to begin.".to_owned());
        }
    }

    fn edit(&mut self, change: impl FnOnce(&mut String)) {
        if self.controller.is_locked(self.focus) {
            return;
        }
        let mut value = self.controller.field(self.focus).to_owned();
        change(&mut value);
        if let Err(e) = self.controller.set_field(self.focus, &value) {
            self.show_error(e);
        }
    }

    // Moves focus `step` places around the form, skipping locked fields
    fn cycle_focus(&mut self, step: usize) {
        let n = Field::ALL.len();
        let mut idx = Field::ALL.iter().position(|&f| f == self.focus).unwrap_or(0);
        for _ in 0..n {
            idx = (idx + step) % n;
            if !self.controller.is_locked(Field::ALL[idx]) {
                self.focus = Field::ALL[idx];
                return;
            }
        }
    }

    fn show(&mut self, status: String) {
        self.status = status;
        self.status_is_error = false;
    }

    fn show_record(&mut self, record: &ResponseRecord) {
        self.show(format!(
            "Response Recorded: {} at {}",
            record.value,
            format_timestamp(&record.timestamp)
        ));
    }

    fn show_error(&mut self, error: impl std::fmt::Display) {
        info!("Showing error to the experimenter: {}", error);
        self.status = format!("Error: {}", error);
        self.status_is_error = true;
    }

    fn ui(&self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        frame.render_widget(self.fields_widget(), rows[0]);
        self.render_buttons(frame, rows[1]);
        frame.render_widget(self.status_widget(), rows[2]);

        if self.controller.awaiting_continuation() {
            let popup = centered_rect(70, 5, area);
            frame.render_widget(Clear, popup);
            frame.render_widget(continuation_widget(), popup);
        }
    }

    fn fields_widget(&self) -> Paragraph<'_> {
        let lines: Vec<Line> = Field::ALL
            .into_iter()
            .map(|field| {
                let label = match field {
                    Field::Port => "COM Port:",
                    Field::Study => "Study Name:",
                    Field::Filename => "Filename:",
                };
                let locked = self.controller.is_locked(field);
                let focused = field == self.focus && !locked;
                let value_style = if locked {
                    Style::default().fg(Color::DarkGray)
                } else if focused {
                    Style::default().fg(Color::Magenta)
                } else {
                    Style::default().fg(Color::White)
                };
                let mut spans = vec![
                    Span::raw(format!(" {:<12}", label)),
                    Span::styled(self.controller.field(field).to_owned(), value_style),
                ];
                if focused {
                    spans.push("_".magenta().slow_blink());
                }
                if locked {
                    spans.push(" (locked)".dark_gray());
                }
                Line::from(spans)
            })
            .collect();

        let instructions = if self.controller.is_collecting() {
            Title::from(Line::from(vec![
                " Respond ".into(),
                "<1>-<5>".magenta().bold(),
                " Stop ".into(),
                "<Esc> ".magenta().bold(),
            ]))
        } else {
            Title::from(Line::from(vec![
                " Next field ".into(),
                "<Tab>".magenta().bold(),
                " Start ".into(),
                "<Enter>".magenta().bold(),
                " Quit ".into(),
                "<Esc> ".magenta().bold(),
            ]))
        };
        let block = Block::default()
            .title(
                Title::from(" Likert Scale Experiment ".magenta().bold())
                    .alignment(Alignment::Center),
            )
            .title(
                instructions
                    .alignment(Alignment::Center)
                    .position(Position::Bottom),
            )
            .borders(Borders::ALL);
        Paragraph::new(lines).block(block)
    }

    fn render_buttons(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(LikertValue::all().map(|_| Constraint::Ratio(1, 5)))
            .split(area);

        for (value, column) in LikertValue::all().zip(columns.iter()) {
            let style = if !self.controller.is_collecting() {
                Style::default().fg(Color::DarkGray)
            } else if self.last_response == Some(value) {
                Style::default().fg(Color::Black).bg(Color::Magenta)
            } else {
                Style::default().fg(Color::White)
            };
            let label = Span::styled(value.to_string(), Style::default().add_modifier(Modifier::BOLD));
            let button = Paragraph::new(Line::from(label))
                .alignment(Alignment::Center)
                .style(style)
                .block(Block::default().borders(Borders::ALL).padding(Padding::vertical(1)));
            frame.render_widget(button, *column);
        }
    }

    fn status_widget(&self) -> Paragraph<'_> {
        let style = if self.status_is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };
        let title = match self.controller.output_path() {
            Some(path) => format!(
                " {} - {} responses ",
                path.display(),
                self.controller.responses()
            ),
            None => " Status ".to_owned(),
        };
        Paragraph::new(self.status.as_str())
            .style(style)
            .block(Block::default().title(title).borders(Borders::ALL))
    }
}

fn continuation_widget() -> Paragraph<'static> {
    let block = Block::default()
        .title(Title::from(" Continue ".magenta().bold()).alignment(Alignment::Center))
        .borders(Borders::ALL);
    Paragraph::new(vec![
        Line::from("Do you want to add another participant to the same study?"),
        Line::from(""),
        Line::from(vec![
            "<Y>".magenta().bold(),
            " Yes   ".into(),
            "<N>".magenta().bold(),
            " No".into(),
        ]),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(block)
}

/// A rectangle `percent_x` wide and `height` tall in the middle of `area`.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (area.width as u32 * percent_x as u32 / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
