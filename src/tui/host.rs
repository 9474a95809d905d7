use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::Rect;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::render::{self, View};
use super::theme::Theme;
use hitscreen::calibrate::{self, Calibrator};
use hitscreen::controllers::hunt;
use hitscreen::document::lock_document;
use hitscreen::events::{ListenerHandle, ScreenTransition};
use hitscreen::hitregion;
use hitscreen::input::{Dispatch, PointerKind};
use hitscreen::router::RouteOutcome;
use hitscreen::screen::ShowOutcome;
use hitscreen::session::Session;

/// Terminal host: draws the active screen and turns terminal input into
/// pointer events for the session
pub struct ScreenHost {
    session: Arc<Session>,
    theme: Theme,
    calibrator: Option<Calibrator>,
    overlay: bool,
    screen_area: Rect,
    status: String,
    transitions: mpsc::UnboundedReceiver<ScreenTransition>,
    _subscription: ListenerHandle,
}

impl ScreenHost {
    /// `debug` makes the calibrator available behind F2
    pub fn new(session: Arc<Session>, debug: bool) -> Self {
        let (subscription, transitions) = session.transitions().subscribe_channel();
        let calibrator = debug.then(|| Calibrator::new(Arc::clone(session.manager())));
        Self {
            session,
            theme: Theme::default(),
            calibrator,
            overlay: false,
            screen_area: Rect::default(),
            status: "q: quit".to_string(),
            transitions,
            _subscription: subscription,
        }
    }

    /// Returns false when the host should exit
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(false),
            KeyCode::F(2) => match self.calibrator.as_mut() {
                Some(calibrator) => {
                    self.overlay = !self.overlay;
                    if !self.overlay {
                        calibrator.set_draw_mode(false);
                    }
                    self.status = format!("Calibrator {}", if self.overlay { "open" } else { "closed" });
                }
                None => self.status = "Calibrator needs --debug".to_string(),
            },
            _ => {}
        }

        let Some(calibrator) = self.calibrator.as_mut().filter(|_| self.overlay) else {
            return Ok(true);
        };
        match key.code {
            KeyCode::Char('d') => calibrator.toggle_draw(),
            KeyCode::Char('x') => calibrator.clear(),
            KeyCode::Char('r') => calibrator.refresh(),
            KeyCode::Tab => calibrator.select_next(),
            KeyCode::Char('p') => {
                calibrator.preview();
            }
            KeyCode::Char('c') => {
                if let Some(snippet) = calibrator.snippet() {
                    let json = snippet.to_json();
                    log::info!("Calibrated hitbox:\n{}", json);
                    self.status = serde_json::to_string(&snippet).unwrap_or(json);
                    return Ok(true);
                }
            }
            _ => return Ok(true),
        }
        self.status = calibrator.note().to_string();
        Ok(true)
    }

    /// Returns false when the host should exit
    pub async fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<bool> {
        let (column, row) = (mouse.column, mouse.row);

        if let Some(calibrator) = self.calibrator.as_mut().filter(|c| self.overlay && c.draw_mode()) {
            let screen = calibrate::Rect::new(
                self.screen_area.x as f64,
                self.screen_area.y as f64,
                self.screen_area.width as f64,
                self.screen_area.height as f64,
            );
            let (x, y) = (column as f64, row as f64);
            match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    calibrator.pointer_down(x, y, screen);
                }
                MouseEventKind::Drag(MouseButton::Left) => {
                    if let Some(p) = calibrator.pointer_move(x, y, screen) {
                        self.status = format!("x={} y={} w={} h={}", p.x, p.y, p.w, p.h);
                    }
                }
                MouseEventKind::Up(MouseButton::Left) => {
                    calibrator.pointer_up();
                }
                _ => {}
            }
            return Ok(true);
        }

        let kind = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => PointerKind::Down,
            MouseEventKind::Up(MouseButton::Left) => PointerKind::Click,
            _ => return Ok(true),
        };
        let Some((x, y)) = render::cell_to_percent(self.screen_area, column, row) else {
            return Ok(true);
        };
        let Some(mut event) = self.session.input().pointer_at(kind, x, y) else {
            return Ok(true);
        };

        match self.session.input().handle(&mut event).await {
            Dispatch::Routed(RouteOutcome::Rejected(rejection)) => {
                self.status = format!("Navigation rejected: {:?}", rejection);
            }
            Dispatch::Routed(RouteOutcome::Delegated(ShowOutcome::Missing(id))) => {
                self.status = format!("Screen '{}' has no container", id);
            }
            Dispatch::Invalid(e) => self.status = format!("Ignored hitbox: {}", e),
            Dispatch::Claimed => self.status = "Hit!".to_string(),
            _ => {}
        }
        Ok(true)
    }

    /// Pick up transitions that happened since the last frame
    pub fn poll(&mut self) {
        while let Ok(transition) = self.transitions.try_recv() {
            self.status = match transition.previous.as_deref() {
                Some(previous) => format!("{} -> {}", previous, transition.screen_id),
                None => format!("-> {}", transition.screen_id),
            };
        }
        if let Some(calibrator) = self.calibrator.as_mut() {
            calibrator.poll_transitions();
        }
    }

    fn view(&self) -> View {
        let manager = self.session.manager();
        let screen_id = manager.get_active();
        let container = screen_id.as_deref().and_then(|id| manager.container(id));

        let (regions, targets) = match container {
            Some(container) => {
                let doc = lock_document(manager.document());
                (hitregion::read_regions(&doc, container), hunt::read_targets(&doc, container))
            }
            None => Default::default(),
        };

        let calibrator = self.calibrator.as_ref().filter(|_| self.overlay);
        View {
            screen_id,
            regions,
            targets,
            selected: calibrator.and_then(|c| c.selected_target()).map(|t| t.node),
            draft: calibrator.and_then(|c| c.drawn()).map(|d| {
                Rect::new(d.left as u16, d.top as u16, d.width.round() as u16, d.height.round() as u16)
            }),
            panel: calibrator.map(|c| {
                let p = c.percent();
                vec![
                    format!("draw: {}", if c.draw_mode() { "on" } else { "off" }),
                    format!("x={} y={} w={} h={}", p.x, p.y, p.w, p.h),
                    format!(
                        "selected: {}",
                        c.selected_target().map(|t| t.key.as_str()).unwrap_or("(none)")
                    ),
                    "d draw  x clear  Tab select".to_string(),
                    "p preview  c copy JSON  r refresh".to_string(),
                ]
            }),
            status: self.status.clone(),
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let view = self.view();
        self.screen_area = render::draw(frame, &view, &self.theme);
    }
}
