// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the session's preview to the terminal using Unicode half-block
//! characters, with recognition boxes drawn on top and a status bar below.
//! The preview is shown through the 1280x720 reference frame, so overlay
//! coordinates line up with the picture whatever the camera resolution.

use crate::app::frame_processor::DetectionKind;
use crate::app::{
    CameraSession, CaptureMode, DrawPrimitive, NoticeLevel, OverlayFrame, ProcessorKind, UiEvent,
};
use crate::backends::camera::CameraFrame;
use crate::config::Config;
use crate::constants::{QR_RESULT_DISPLAY, REFERENCE_HEIGHT, REFERENCE_WIDTH};
use crate::gallery::Gallery;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

/// Preview refresh period (~15 fps)
const REDRAW_INTERVAL: Duration = Duration::from_millis(66);
/// How long a notice stays in the status bar
const NOTICE_DISPLAY: Duration = Duration::from_secs(3);

/// Run the terminal viewer until the user quits
pub async fn run(config: Config, gallery: Arc<dyn Gallery>) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, events) = CameraSession::builder(config).gallery(gallery).build();
    session.start().await;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut session, events).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    session.shutdown();
    result
}

/// What a key press asks the loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut CameraSession,
    mut events: mpsc::UnboundedReceiver<UiEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut view = ViewState::default();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    redraw.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(message) = session.next_message() => session.handle_message(message),
            Some(event) = events.recv() => view.apply(event),
            _ = redraw.tick() => {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()?
                        && key.kind == KeyEventKind::Press
                        && handle_key(session, key).await == KeyOutcome::Quit
                    {
                        info!("Quitting terminal viewer");
                        return Ok(());
                    }
                }

                view.frame = session.preview_frame().ok();
                let status = view.status_line(session);
                terminal.draw(|f| {
                    let area = f.area();
                    let preview_area = Rect {
                        height: area.height.saturating_sub(1),
                        ..area
                    };
                    let status_area = Rect {
                        y: area.y + area.height.saturating_sub(1),
                        height: 1,
                        ..area
                    };
                    f.render_widget(
                        PreviewWidget {
                            frame: view.frame.as_ref(),
                            overlay: &view.overlay,
                        },
                        preview_area,
                    );
                    f.render_widget(StatusBar { message: &status }, status_area);
                })?;
            }
        }
    }
}

async fn handle_key(session: &mut CameraSession, key: KeyEvent) -> KeyOutcome {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return KeyOutcome::Quit;
        }
        KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
        KeyCode::Char(' ') | KeyCode::Enter => {
            session.capture().await;
        }
        KeyCode::Char('c') => {
            session.switch_facing().await;
        }
        KeyCode::Char('f') => {
            session.toggle_flash();
        }
        KeyCode::Char('1') => session.set_mode(CaptureMode::Photo),
        KeyCode::Char('2') => session.set_mode(CaptureMode::Video),
        KeyCode::Char('3') => session.set_mode(CaptureMode::Scanner),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            session.zoom_in();
        }
        KeyCode::Char('-') => {
            session.zoom_out();
        }
        KeyCode::Char('d') => {
            session.toggle_processor(ProcessorKind::FaceDetection);
        }
        KeyCode::Char('o') => {
            session.toggle_processor(ProcessorKind::ObjectDetection);
        }
        KeyCode::Char('t') => {
            session.toggle_processor(ProcessorKind::TextRecognition);
        }
        KeyCode::Char('r') => {
            session.retry_acquire().await;
        }
        _ => {}
    }
    KeyOutcome::Continue
}

/// What the viewer shows besides the live frame
#[derive(Default)]
struct ViewState {
    frame: Option<CameraFrame>,
    overlay: OverlayFrame,
    notice: Option<(String, Instant)>,
    qr: Option<(String, Instant)>,
    recording: Option<String>,
}

impl ViewState {
    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::OverlayUpdated(overlay) => self.overlay = overlay,
            UiEvent::Notice { level, message } => {
                let prefix = match level {
                    NoticeLevel::Error => "Error: ",
                    NoticeLevel::Warning => "Warning: ",
                    NoticeLevel::Info | NoticeLevel::Success => "",
                };
                self.notice = Some((format!("{prefix}{message}"), Instant::now()));
            }
            UiEvent::QrDetected(detection) => {
                self.qr = Some((
                    format!("{} [{}]", detection.content, detection.action.action_label()),
                    Instant::now(),
                ));
            }
            UiEvent::RecordingStarted { .. } => self.recording = Some("00:00".to_string()),
            UiEvent::RecordingElapsed { display } => self.recording = Some(display),
            UiEvent::RecordingStopped { .. } => self.recording = None,
            UiEvent::ModeChanged { .. } => self.qr = None,
            _ => {}
        }
    }

    fn status_line(&mut self, session: &CameraSession) -> String {
        let now = Instant::now();
        if self.notice.as_ref().is_some_and(|(_, at)| now - *at > NOTICE_DISPLAY) {
            self.notice = None;
        }
        if self.qr.as_ref().is_some_and(|(_, at)| now - *at > QR_RESULT_DISPLAY) {
            self.qr = None;
        }

        let processors = session.processors();
        let flag = |on: bool, c: char| if on { c.to_ascii_uppercase() } else { c };
        let mut parts = vec![
            session.mode().display_name().to_string(),
            session.camera_label(),
            format!("{:.1}x", session.zoom()),
            format!("flash {}", if session.flash_on() { "on" } else { "off" }),
            format!(
                "{}{}{}",
                flag(processors.face_detection, 'd'),
                flag(processors.object_detection, 'o'),
                flag(processors.text_recognition, 't')
            ),
        ];
        if let Some(elapsed) = &self.recording {
            parts.push(format!("REC {elapsed}"));
        }
        if let Some((qr, _)) = &self.qr {
            parts.push(format!("QR {qr}"));
        }
        match &self.notice {
            Some((notice, _)) => parts.push(notice.clone()),
            None => parts.push(
                "space capture | c camera | f flash | 1/2/3 mode | +/- zoom | d/o/t detect | r retry | q quit"
                    .to_string(),
            ),
        }
        parts.join(" | ")
    }
}

/// Renders the letterboxed reference view with overlay boxes
struct PreviewWidget<'a> {
    frame: Option<&'a CameraFrame>,
    overlay: &'a OverlayFrame,
}

impl Widget for PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        let view = ViewGeometry::fit(area, REFERENCE_WIDTH, REFERENCE_HEIGHT);
        if view.width == 0 || view.height == 0 {
            return;
        }
        let letterbox = Letterbox::new(frame.width, frame.height);

        // Each cell shows two vertical pixels: fg is the upper, bg the lower
        for ty in 0..view.height {
            for tx in 0..view.width {
                let (rx, ry_top) = view.to_reference(tx, ty * 2);
                let (_, ry_bottom) = view.to_reference(tx, ty * 2 + 1);
                let top = letterbox.sample(frame, rx, ry_top);
                let bottom = letterbox.sample(frame, rx, ry_bottom);

                if let Some(cell) = buf.cell_mut((view.x + tx, view.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }

        for primitive in &self.overlay.primitives {
            draw_primitive(buf, &view, primitive);
        }
    }
}

/// Where the reference frame sits inside the terminal area
struct ViewGeometry {
    x: u16,
    y: u16,
    /// Cells
    width: u16,
    /// Cells (two pixels each)
    height: u16,
}

impl ViewGeometry {
    fn fit(area: Rect, ref_width: u32, ref_height: u32) -> Self {
        let term_width = area.width as f64;
        let term_height = (area.height as f64) * 2.0;

        // Fit to height when the terminal is wider than the frame
        let (width, pixel_height) = if term_width * ref_height as f64 > term_height * ref_width as f64 {
            (term_height * ref_width as f64 / ref_height as f64, term_height)
        } else {
            (term_width, term_width * ref_height as f64 / ref_width as f64)
        };
        let width = width as u16;
        let height = (pixel_height / 2.0) as u16;

        Self {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        }
    }

    /// Reference pixel for a view pixel (cell column, half-cell row)
    fn to_reference(&self, px: u16, py: u16) -> (f32, f32) {
        (
            px as f32 * REFERENCE_WIDTH as f32 / self.width as f32,
            py as f32 * REFERENCE_HEIGHT as f32 / (self.height as f32 * 2.0),
        )
    }

    /// Cell for a reference pixel, `None` when outside the view
    fn to_cell(&self, rx: f32, ry: f32) -> Option<(u16, u16)> {
        if rx < 0.0 || ry < 0.0 || rx >= REFERENCE_WIDTH as f32 || ry >= REFERENCE_HEIGHT as f32 {
            return None;
        }
        let cx = (rx * self.width as f32 / REFERENCE_WIDTH as f32) as u16;
        let cy = (ry * self.height as f32 / REFERENCE_HEIGHT as f32) as u16;
        Some((self.x + cx.min(self.width - 1), self.y + cy.min(self.height - 1)))
    }
}

/// Maps reference coordinates back into a frame of any size
struct Letterbox {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl Letterbox {
    fn new(width: u32, height: u32) -> Self {
        let scale = (REFERENCE_WIDTH as f32 / width as f32).min(REFERENCE_HEIGHT as f32 / height as f32);
        Self {
            scale,
            offset_x: (REFERENCE_WIDTH as f32 - width as f32 * scale) / 2.0,
            offset_y: (REFERENCE_HEIGHT as f32 - height as f32 * scale) / 2.0,
        }
    }

    fn sample(&self, frame: &CameraFrame, rx: f32, ry: f32) -> Color {
        let fx = (rx - self.offset_x) / self.scale;
        let fy = (ry - self.offset_y) / self.scale;
        if fx < 0.0 || fy < 0.0 || fx >= frame.width as f32 || fy >= frame.height as f32 {
            return Color::Black;
        }
        let [r, g, b, _] = frame.pixel(fx as u32, fy as u32);
        Color::Rgb(r, g, b)
    }
}

fn draw_primitive(buf: &mut Buffer, view: &ViewGeometry, primitive: &DrawPrimitive) {
    let color = kind_color(primitive.kind());
    match primitive {
        DrawPrimitive::Box { rect, label, .. } => {
            let corners = (
                view.to_cell(rect.x.max(0.0), rect.y.max(0.0)),
                view.to_cell(
                    (rect.x + rect.width).min(REFERENCE_WIDTH as f32 - 1.0),
                    (rect.y + rect.height).min(REFERENCE_HEIGHT as f32 - 1.0),
                ),
            );
            let (Some((left, top)), Some((right, bottom))) = corners else {
                return;
            };
            for x in left..=right {
                paint(buf, x, top, '─', color);
                paint(buf, x, bottom, '─', color);
            }
            for y in top..=bottom {
                paint(buf, left, y, '│', color);
                paint(buf, right, y, '│', color);
            }
            paint(buf, left, top, '┌', color);
            paint(buf, right, top, '┐', color);
            paint(buf, left, bottom, '└', color);
            paint(buf, right, bottom, '┘', color);

            if let Some(label) = label {
                let max = right.saturating_sub(left) as usize;
                let text: String = label.chars().take(max.max(1)).collect();
                buf.set_string(
                    left + 1,
                    top,
                    text,
                    ratatui::style::Style::default().fg(Color::Black).bg(color),
                );
            }
        }
        DrawPrimitive::Label { x, y, text, .. } => {
            if let Some((cx, cy)) = view.to_cell(*x, *y) {
                let max = (view.x + view.width).saturating_sub(cx) as usize;
                let text: String = text.replace('\n', " ").chars().take(max).collect();
                buf.set_string(
                    cx,
                    cy,
                    text,
                    ratatui::style::Style::default().fg(Color::White).bg(color),
                );
            }
        }
    }
}

fn kind_color(kind: DetectionKind) -> Color {
    match kind {
        DetectionKind::Face => Color::Green,
        DetectionKind::Object => Color::Yellow,
        DetectionKind::Text => Color::Cyan,
    }
}

fn paint(buf: &mut Buffer, x: u16, y: u16, symbol: char, color: Color) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_char(symbol);
        cell.set_fg(color);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}
