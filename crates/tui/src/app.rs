use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use eventglobe_core::{
    config::NavigationSettings,
    display::{self, CardDate, SportColor},
    popup::{PopupView, Portrait},
    AppConfig, CameraPose, Dashboard, EventRecord, EventRepository, Interaction, Navigator,
    SceneCamera, Signal,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution},
        Block, Borders, Clear, Paragraph, Wrap,
    },
    Frame, Terminal,
};
use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant},
};
use tracing::{debug, error, info};

use crate::globe::{contains, MapViewport, SimulatedCamera};

const TICK_RATE: Duration = Duration::from_millis(250);
const TICKER_HEIGHT: u16 = 8;
const STATUS_HEIGHT: u16 = 3;
const MIN_PANEL_WIDTH: u16 = 30;
/// The intro flight starts this many times further out than the home view.
const INTRO_ALTITUDE_FACTOR: f64 = 3.0;

#[derive(Debug, Clone)]
struct Theme {
    primary_bg: Color,
    primary_fg: Color,
    accent: Color,
    muted: Color,
    land: Color,
    on_accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_bg: Color::Black,
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            land: Color::Rgb(70, 110, 95),
            on_accent: Color::Black,
        }
    }
}

fn sport_style(color: SportColor) -> Style {
    Style::default().fg(Color::Rgb(color.r, color.g, color.b))
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Regions computed during the last draw, used to route mouse input.
#[derive(Debug, Default, Clone, Copy)]
struct ScreenAreas {
    globe: Rect,
    ticker: Rect,
    panel: Option<Rect>,
}

/// Left-button press on the ticker, distinguishing clicks from drags.
#[derive(Debug, Clone, Copy)]
struct Press {
    x: f64,
    dragged: bool,
}

/// Interactive globe dashboard.
pub struct GlobeApp {
    dashboard: Dashboard<SimulatedCamera>,
    signals_tx: mpsc::UnboundedSender<Signal>,
    signals_rx: Option<mpsc::UnboundedReceiver<Signal>>,
    settings: NavigationSettings,
    auto_start: bool,
    splash_timeout: Duration,
    splash_until: Option<Instant>,
    areas: ScreenAreas,
    press: Option<Press>,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl GlobeApp {
    pub fn new(repository: Arc<EventRepository>, config: AppConfig) -> Self {
        let settings = config.navigation.clone();
        let home = settings.home;
        let camera = SimulatedCamera::new(CameraPose {
            center: home.point(),
            altitude: home.altitude * INTRO_ALTITUDE_FACTOR,
            tilt: 0.0,
            heading: 0.0,
        });
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let navigator = Navigator::new(
            repository,
            camera,
            settings.clone(),
            config.ticker,
            0.0,
            signals_tx.clone(),
        );
        Self {
            dashboard: Dashboard::new(navigator),
            signals_tx,
            signals_rx: Some(signals_rx),
            settings,
            auto_start: config.auto_start,
            splash_timeout: Duration::from_millis(config.splash_timeout_ms),
            splash_until: None,
            areas: ScreenAreas::default(),
            press: None,
            status: "Loading scene".to_string(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);
        spawn_pose_forwarder(
            self.dashboard.navigator().camera().watch_pose(),
            self.signals_tx.clone(),
        );
        let mut signals_rx = self
            .signals_rx
            .take()
            .context("dashboard is already running")?;

        // The scene counts as ready once the intro flight lands.
        self.splash_until = Some(Instant::now() + self.splash_timeout);
        self.dashboard.navigator_mut().go_global();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            let splash_deadline = self.splash_until;
            tokio::select! {
                maybe_event = event_rx.recv() => {
                    if !self.process_app_event(maybe_event) {
                        break;
                    }
                }
                Some(signal) = signals_rx.recv() => self.process_signal(signal),
                _ = splash_expiry(splash_deadline), if splash_deadline.is_some() => {
                    self.dismiss_splash("timeout");
                }
            }

            if self.should_quit {
                break;
            }
        }

        self.dashboard.navigator_mut().stop_auto();
        restore_terminal(&mut terminal)?;
        info!("Dashboard closed");
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "Input handling failed");
                    self.status = format!("Error: {err}");
                }
                true
            }
            Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn process_signal(&mut self, signal: Signal) {
        let landed = matches!(signal, Signal::FlightSettled { .. });
        self.dashboard.handle_signal(signal);
        if landed && self.splash_until.is_some() {
            self.dismiss_splash("scene ready");
        }
    }

    fn dismiss_splash(&mut self, reason: &str) {
        if self.splash_until.take().is_none() {
            return;
        }
        info!(reason, "Splash dismissed");
        if self.auto_start && !self.dashboard.navigator().state().auto_enabled() {
            self.dashboard.navigator_mut().start_auto();
            self.status = "Auto-advance on".to_string();
        } else {
            self.status = "Ready".to_string();
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => {
                debug!(width, height, "Terminal resized");
            }
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let quit = matches!(key.code, KeyCode::Char('q'))
            || (key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c'));
        if quit {
            self.should_quit = true;
            return;
        }
        if self.splash_until.is_some() {
            self.dismiss_splash("skipped");
            return;
        }

        let interaction = match key.code {
            KeyCode::Char('a') | KeyCode::Char(' ') => Interaction::ToggleAuto,
            KeyCode::Char('g') | KeyCode::Char('r') => Interaction::Recenter,
            KeyCode::Esc => Interaction::Escape,
            KeyCode::Left | KeyCode::Char('h') => Interaction::Previous,
            KeyCode::Right | KeyCode::Char('l') => Interaction::Next,
            KeyCode::Enter => Interaction::SelectCard(self.dashboard.navigator().current()),
            _ => return,
        };
        self.apply(interaction);
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.splash_until.is_some() {
            return;
        }
        let (column, row) = (mouse.column, mouse.row);
        let ticker = self.areas.ticker;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let on_panel = self
                    .areas
                    .panel
                    .is_some_and(|panel| contains(panel, column, row));
                if contains(ticker, column, row) {
                    let x = strip_x(column, ticker);
                    self.press = Some(Press { x, dragged: false });
                    self.dashboard.handle(Interaction::PointerDown { x });
                } else if !on_panel && contains(self.areas.globe, column, row) {
                    self.click_globe(column, row);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(press) = self.press.as_mut() {
                    let x = strip_x(column, ticker);
                    if (x - press.x).abs() >= 1.0 {
                        press.dragged = true;
                    }
                    self.dashboard.handle(Interaction::PointerMove { x });
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(press) = self.press.take() {
                    self.dashboard.handle(Interaction::PointerUp);
                    if !press.dragged {
                        let card = self.dashboard.navigator().state().ticker().card_at(press.x);
                        if let Some(index) = card {
                            self.apply(Interaction::SelectCard(index));
                        }
                    }
                }
            }
            MouseEventKind::ScrollDown if contains(ticker, column, row) => {
                self.apply(Interaction::Next);
            }
            MouseEventKind::ScrollUp if contains(ticker, column, row) => {
                self.apply(Interaction::Previous);
            }
            _ => {}
        }
    }

    fn click_globe(&mut self, column: u16, row: u16) {
        let viewport = self.viewport();
        let repository = Arc::clone(self.dashboard.navigator().repository());
        let hit = viewport.pick(repository.located(), column, row);
        if hit.is_none() {
            if let Some(point) = viewport.unproject(column, row) {
                self.status = format!("No event at {:.1}, {:.1}", point.lat, point.lon);
            }
        }
        self.apply(Interaction::SelectFeature(hit));
    }

    fn apply(&mut self, interaction: Interaction) {
        self.dashboard.handle(interaction);
        match interaction {
            Interaction::ToggleAuto => {
                self.status = if self.dashboard.navigator().state().auto_enabled() {
                    "Auto-advance on".to_string()
                } else {
                    "Auto-advance off".to_string()
                };
            }
            Interaction::Recenter => self.status = "Global view".to_string(),
            Interaction::Escape => self.status = "Panel closed".to_string(),
            Interaction::SelectCard(_)
            | Interaction::SelectFeature(Some(_))
            | Interaction::Previous
            | Interaction::Next => {
                if let Some(view) = self.dashboard.popup().view() {
                    self.status = format!("Showing {}", view.title);
                }
            }
            _ => {}
        }
    }

    fn viewport(&self) -> MapViewport {
        MapViewport::new(
            self.areas.globe,
            &self.dashboard.pose(),
            self.settings.home.altitude,
        )
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),
                Constraint::Length(TICKER_HEIGHT),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .split(area);

        let main = layout[0];
        let reserved = self.dashboard.navigator().camera().padding();
        self.areas.globe = Rect {
            x: main.x + reserved.left.min(main.width),
            y: main.y + reserved.top.min(main.height),
            width: main
                .width
                .saturating_sub(reserved.left)
                .saturating_sub(reserved.right),
            height: main
                .height
                .saturating_sub(reserved.top)
                .saturating_sub(reserved.bottom),
        };
        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.primary_bg)),
            main,
        );
        self.render_globe(frame);

        self.areas.panel = None;
        if let Some(view) = self.dashboard.popup().view() {
            let width = self
                .settings
                .panel_padding
                .right
                .max(MIN_PANEL_WIDTH)
                .min(main.width);
            let panel = Rect::new(main.right() - width, main.y, width, main.height);
            self.render_panel(frame, panel, view);
            self.areas.panel = Some(panel);
        }

        self.render_ticker(frame, layout[1]);
        self.render_status(frame, layout[2]);

        if self.splash_until.is_some() {
            self.render_splash(frame, area);
        }
    }

    fn render_globe(&self, frame: &mut Frame) {
        let area = self.areas.globe;
        if area.width == 0 || area.height == 0 {
            return;
        }
        let viewport = self.viewport();
        let navigator = self.dashboard.navigator();
        let repository = navigator.repository();
        let current = navigator.current();
        let labels = self.dashboard.labels_visible();
        let theme = &self.theme;
        let label_offset = viewport.lon_per_col() * 2.0;

        let canvas = Canvas::default()
            .background_color(theme.primary_bg)
            .marker(Marker::Braille)
            .x_bounds(viewport.x_bounds())
            .y_bounds(viewport.y_bounds())
            .paint(|ctx| {
                ctx.draw(&Map {
                    resolution: MapResolution::High,
                    color: theme.land,
                });
                ctx.layer();
                for (index, event) in repository.located() {
                    let Some(point) = event.location() else {
                        continue;
                    };
                    let x = viewport.canvas_x(point.lon);
                    let style = sport_style(display::sport_color(&event.sport));
                    let symbol = if index == current { "◉" } else { "●" };
                    ctx.print(x, point.lat, Span::styled(symbol, style));
                    if labels {
                        ctx.print(
                            x + label_offset,
                            point.lat,
                            Span::styled(
                                display::label_text(&event.title),
                                Style::default().fg(theme.primary_fg),
                            ),
                        );
                    }
                }
            });
        frame.render_widget(canvas, area);
    }

    fn render_ticker(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Upcoming Events ");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.areas.ticker = inner;

        let width = f64::from(inner.width);
        if self.dashboard.navigator().state().ticker().viewport_width() != width {
            self.dashboard.handle(Interaction::Resize {
                ticker_width: width,
            });
        }

        let navigator = self.dashboard.navigator();
        let ticker = navigator.state().ticker();
        let card_width = ticker.layout().card_width;
        for (index, x) in ticker.visible_cards() {
            let Some(event) = navigator.repository().event(index) else {
                continue;
            };
            let left = x.max(0.0);
            let right = (x + card_width).min(width);
            let card = Rect::new(
                inner.x + left as u16,
                inner.y,
                (right - left) as u16,
                inner.height,
            );
            if card.width < 2 {
                continue;
            }
            self.render_card(frame, card, event, ticker.active() == Some(index));
        }
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, event: &EventRecord, active: bool) {
        let color = sport_style(display::sport_color(&event.sport));
        let border = if active {
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let date = CardDate::new(event.start(), event.end());
        let lines = vec![
            Line::from(Span::styled(
                format!("{} {} {}", date.month, date.day, date.year),
                color.add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                event.title.clone(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(event.sport.to_uppercase(), color)),
            Line::from(Span::styled(
                format!("ATTENDANCE: {}", display::thousands(event.attendance)),
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border),
        );
        frame.render_widget(paragraph, area);
    }

    fn render_panel(&self, frame: &mut Frame, area: Rect, view: &PopupView) {
        let accent = sport_style(view.color);
        let muted = Style::default().fg(self.theme.muted);
        let bar_width = usize::from(area.width.saturating_sub(4));

        let mut lines = vec![
            Line::from(Span::styled(
                view.sport.clone(),
                accent.add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                view.title.clone(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("When   {}", view.dates)),
        ];
        if !view.location.is_empty() {
            lines.push(Line::from(format!("Where  {}", view.location)));
        }
        lines.push(Line::from(view.attendance.clone()));
        if let Some(description) = &view.description {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(description.clone(), muted)));
        }

        if !view.athletes.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("ATHLETES", accent)));
            for athlete in &view.athletes {
                let portrait = match athlete.portrait {
                    Portrait::Image(_) => "[◎]".to_string(),
                    Portrait::Initial(initial) => format!("[{initial}]"),
                };
                lines.push(Line::from(vec![
                    Span::styled(portrait, accent),
                    Span::raw(" "),
                    Span::raw(athlete.name.clone()),
                ]));
                if !athlete.detail.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", athlete.detail),
                        muted,
                    )));
                }
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("TOP OPPORTUNITY FACTORS", accent)));
        for (rank, factor) in view.factors.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("#{} ", rank + 1), muted),
                Span::styled(
                    factor.label(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  {}", factor.score)),
            ]));
            let filled = usize::from(factor.score) * bar_width / 100;
            lines.push(Line::from(vec![
                Span::styled("█".repeat(filled), accent),
                Span::styled("░".repeat(bar_width - filled), muted),
            ]));
            lines.push(Line::from(Span::styled(factor.rationale.clone(), muted)));
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Details ")
                    .title_style(accent),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let navigator = self.dashboard.navigator();
        let state = navigator.state();
        let mode = if state.auto_enabled() {
            Span::styled(
                " AUTO ",
                Style::default()
                    .bg(self.theme.accent)
                    .fg(self.theme.on_accent),
            )
        } else {
            Span::styled(" MANUAL ", Style::default().fg(self.theme.muted))
        };
        let title = navigator
            .repository()
            .event(state.current())
            .map(|event| event.title.as_str())
            .unwrap_or_default();
        let altitude_km = (self.dashboard.pose().altitude / 1_000.0).round() as u64;
        let line = Line::from(vec![
            mode,
            Span::raw(format!(
                " {}/{} {}  ",
                state.current() + 1,
                navigator.repository().len(),
                title
            )),
            Span::styled(
                format!("alt {} km  ", display::thousands(altitude_km)),
                Style::default().fg(self.theme.muted),
            ),
            Span::raw(self.status.clone()),
            Span::styled(
                "   ←/→ events · enter open · a auto · g globe · esc close · q quit",
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let paragraph =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(paragraph, area);
    }

    fn render_splash(&self, frame: &mut Frame, area: Rect) {
        let splash = centered_rect(44, 7, area);
        let lines = vec![
            Line::from(Span::styled(
                "EVENT GLOBE",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Loading scene..."),
            Line::from(Span::styled(
                "press any key to skip",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(Clear, splash);
        frame.render_widget(paragraph, splash);
    }
}

async fn splash_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

/// Relay scene pose changes into the dashboard loop.
fn spawn_pose_forwarder(
    mut poses: watch::Receiver<CameraPose>,
    signals: mpsc::UnboundedSender<Signal>,
) {
    tokio::spawn(async move {
        while poses.changed().await.is_ok() {
            let pose = *poses.borrow_and_update();
            if signals.send(Signal::CameraMoved(pose)).is_err() {
                break;
            }
        }
    });
}

/// Pointer column relative to the strip's left edge. Negative once a drag
/// leaves the strip on the left.
fn strip_x(column: u16, strip: Rect) -> f64 {
    f64::from(column) - f64::from(strip.x)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_x_goes_negative_left_of_the_strip() {
        let strip = Rect::new(5, 20, 60, 4);
        assert_eq!(strip_x(25, strip), 20.0);
        assert_eq!(strip_x(5, strip), 0.0);
        assert_eq!(strip_x(0, strip), -5.0);
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered_rect(40, 10, area), Rect::new(20, 7, 40, 10));
        assert_eq!(centered_rect(100, 30, area), area);
    }
}
