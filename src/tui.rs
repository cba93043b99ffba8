//! Terminal adapter: draws a [`Scene`] on a ratatui canvas and maps key
//! presses to dashboard actions.

use std::io::{stdout, Stdout};
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, BorderType, Borders, List, ListItem, Paragraph, Wrap,
    },
    Frame, Terminal,
};

use crate::activity::{ActivityEntry, Severity};
use crate::dashboard::Dashboard;
use crate::scene::{Bounds, LoadCategory, Scene};
use crate::view::Connection;

const REDRAW_EVERY: Duration = Duration::from_millis(250);
const INTERVAL_STEP: Duration = Duration::from_millis(500);
const EDGE_COLOR: Color = Color::Rgb(0x95, 0xa5, 0xa6);
const ACCENT: Color = Color::Rgb(0x00, 0xea, 0xff);

fn category_color(category: LoadCategory) -> Color {
    let (r, g, b) = category.rgb();
    Color::Rgb(r, g, b)
}

/// Everything one frame needs, copied out of the shared state so no lock is
/// held while drawing.
struct FrameData {
    scene: Scene,
    bounds: Bounds,
    connection: Connection,
    last_update: Option<DateTime<Local>>,
    auto_refresh: bool,
    interval: Duration,
    intensity: u32,
    bulk_count: usize,
    log: Vec<ActivityEntry>,
}

impl FrameData {
    async fn capture(dashboard: &Dashboard) -> Self {
        let shared = dashboard.shared();
        let (scene, bounds, connection, last_update) = {
            let view = shared.view.read().await;
            let scene = view.scene();
            let bounds = view.bounds(&scene);
            (scene, bounds, view.connection(), view.last_update())
        };
        let log = shared.activity.read().await.entries().cloned().collect();
        Self {
            scene,
            bounds,
            connection,
            last_update,
            auto_refresh: dashboard.is_auto_refreshing(),
            interval: dashboard.refresh_interval(),
            intensity: dashboard.intensity(),
            bulk_count: dashboard.bulk_count(),
            log,
        }
    }
}

#[derive(Default)]
struct UiState {
    /// Index into the scene's nodes; stands in for mouse hover.
    selected: Option<usize>,
}

impl UiState {
    fn step(&mut self, len: usize, forward: bool) {
        if len == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match (self.selected, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        });
    }
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Takes over the terminal until the user quits.
pub async fn run(dashboard: &mut Dashboard) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;

    let res = run_app(&mut terminal, dashboard).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    dashboard: &mut Dashboard,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(REDRAW_EVERY);
    let mut ui = UiState::default();

    loop {
        let frame = FrameData::capture(dashboard).await;
        if let Some(i) = ui.selected {
            if i >= frame.scene.nodes.len() {
                ui.selected = None;
            }
        }
        terminal.draw(|f| draw(f, &frame, &ui))?;

        tokio::select! {
            _ = redraw.tick() => {}
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if handle_key(key, dashboard, &mut ui, &frame).await == Flow::Quit {
                        return Ok(());
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
        }
    }
}

async fn handle_key(
    key: KeyEvent,
    dashboard: &mut Dashboard,
    ui: &mut UiState,
    frame: &FrameData,
) -> Flow {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Char('a') => dashboard.toggle_auto_refresh().await,
        KeyCode::Char('w') => {
            let actions = dashboard.actions().clone();
            let intensity = dashboard.intensity();
            tokio::spawn(async move {
                actions.send_work(intensity).await;
            });
        }
        KeyCode::Char('b') => {
            let actions = dashboard.actions().clone();
            let (intensity, count) = (dashboard.intensity(), dashboard.bulk_count());
            tokio::spawn(async move {
                actions.send_bulk_work(intensity, count).await;
            });
        }
        KeyCode::Char('u') => {
            let actions = dashboard.actions().clone();
            tokio::spawn(async move {
                actions.refresh_now().await;
            });
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            dashboard.set_intensity(dashboard.intensity().saturating_add(1))
        }
        KeyCode::Char('-') => dashboard.set_intensity(dashboard.intensity().saturating_sub(1)),
        KeyCode::Char('>') => dashboard.set_bulk_count(dashboard.bulk_count() + 1),
        KeyCode::Char('<') => dashboard.set_bulk_count(dashboard.bulk_count().saturating_sub(1)),
        KeyCode::Char(']') => {
            let next = dashboard.refresh_interval() + INTERVAL_STEP;
            dashboard.set_refresh_interval(next).await;
        }
        KeyCode::Char('[') => {
            let current = dashboard.refresh_interval();
            if current > INTERVAL_STEP {
                dashboard.set_refresh_interval(current - INTERVAL_STEP).await;
            }
        }
        KeyCode::Char('f') => dashboard.actions().fit_view().await,
        KeyCode::Char('r') => dashboard.actions().reset_layout().await,
        KeyCode::Char('c') => dashboard.actions().clear_log().await,
        KeyCode::Tab => ui.step(frame.scene.nodes.len(), true),
        KeyCode::BackTab => ui.step(frame.scene.nodes.len(), false),
        _ => {}
    }
    Flow::Continue
}

fn draw(f: &mut Frame, frame: &FrameData, ui: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(10),
        ])
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(rows[1]);

    draw_header(f, rows[0], frame);
    draw_graph(f, body[0], frame, ui);
    draw_sidebar(f, body[1], frame, ui);
    draw_log(f, rows[2], frame);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT))
}

fn draw_header(f: &mut Frame, area: Rect, frame: &FrameData) {
    let (dot_color, status) = match frame.connection {
        Connection::Connected => (Color::Green, "Connected"),
        Connection::Disconnected => (Color::Red, "Disconnected"),
    };
    let dot = Span::styled("●", Style::default().fg(dot_color));
    let refresh = if frame.auto_refresh {
        format!("auto-refresh {}s", frame.interval.as_secs_f64())
    } else {
        "auto-refresh off".to_string()
    };
    let updated = frame
        .last_update
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let line = Line::from(vec![
        dot,
        Span::raw(format!(" {}  |  {}  |  last update {}", status, refresh, updated)),
    ]);
    f.render_widget(
        Paragraph::new(line).block(panel(" Container Network Monitoring ")),
        area,
    );
}

fn draw_graph(f: &mut Frame, area: Rect, frame: &FrameData, ui: &UiState) {
    let scene = &frame.scene;
    let bounds = frame.bounds;
    // Layout y grows downwards, canvas y grows upwards.
    let flip = move |y: f64| bounds.y[0] + bounds.y[1] - y;
    let selected = ui.selected.and_then(|i| scene.nodes.get(i)).map(|n| n.id.as_str());

    let canvas = Canvas::default()
        .block(panel(" Graph "))
        .marker(Marker::Braille)
        .x_bounds(bounds.x)
        .y_bounds(bounds.y)
        .paint(|ctx| {
            for edge in &scene.edges {
                ctx.draw(&CanvasLine {
                    x1: edge.from.0,
                    y1: flip(edge.from.1),
                    x2: edge.to.0,
                    y2: flip(edge.to.1),
                    color: EDGE_COLOR,
                });
            }
            ctx.layer();
            for node in &scene.nodes {
                let color = if Some(node.id.as_str()) == selected {
                    Color::White
                } else {
                    category_color(node.category)
                };
                ctx.draw(&Circle {
                    x: node.x,
                    y: flip(node.y),
                    radius: node.radius,
                    color,
                });
            }
            ctx.layer();
            for node in &scene.nodes {
                ctx.print(
                    node.x,
                    flip(node.y),
                    Span::styled(
                        node.label.clone(),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                );
            }
        });
    f.render_widget(canvas, area);
}

fn draw_sidebar(f: &mut Frame, area: Rect, frame: &FrameData, ui: &UiState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(7),
        ])
        .split(area);

    let info = vec![
        Line::from(format!("Total Containers: {}", frame.scene.info.total_containers)),
        Line::from(format!("Total Load: {}", frame.scene.info.total_load)),
    ];
    f.render_widget(Paragraph::new(info).block(panel(" Info ")), parts[0]);

    let legend: Vec<Line> = frame
        .scene
        .legend
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled("● ", Style::default().fg(category_color(entry.category))),
                Span::raw(entry.label.clone()),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(legend).block(panel(" Load Status ")), parts[1]);

    let details: Vec<Line> = match ui.selected.and_then(|i| frame.scene.nodes.get(i)) {
        Some(node) => node.tooltip.lines().map(|l| Line::from(l.to_string())).collect(),
        None => vec![Line::from("Tab to select a container")],
    };
    f.render_widget(
        Paragraph::new(details)
            .wrap(Wrap { trim: true })
            .block(panel(" Container ")),
        parts[2],
    );

    let controls = vec![
        Line::from(format!(
            "w send  b bulk x{}  intensity {} (+/-)",
            frame.bulk_count, frame.intensity
        )),
        Line::from("a auto-refresh  [ ] interval  u refresh"),
        Line::from("f fit  r reset  c clear log"),
        Line::from("Tab select  q quit"),
    ];
    f.render_widget(Paragraph::new(controls).block(panel(" Controls ")), parts[3]);
}

fn draw_log(f: &mut Frame, area: Rect, frame: &FrameData) {
    let visible = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = frame
        .log
        .iter()
        .rev()
        .take(visible)
        .map(|entry| {
            let color = match entry.severity {
                Severity::Info => Color::Gray,
                Severity::Success => Color::Green,
                Severity::Error => Color::Red,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    entry.at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.message.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();
    f.render_widget(List::new(items).block(panel(" Activity ")), area);
}
