use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::theme::Theme;
use hitscreen::controllers::hunt::TargetMarker;
use hitscreen::document::NodeId;
use hitscreen::hitregion::HitRegion;

/// Everything one frame draws, collected while the document is locked
#[derive(Debug, Default)]
pub struct View {
    pub screen_id: Option<String>,
    pub regions: Vec<(NodeId, HitRegion)>,
    pub targets: Vec<TargetMarker>,
    pub selected: Option<NodeId>,
    /// Calibrator rectangle in cells
    pub draft: Option<Rect>,
    /// Calibrator panel lines, when the overlay is open
    pub panel: Option<Vec<String>>,
    pub status: String,
}

/// Cells covered by a percentage rectangle of `area`, clipped to it
pub fn percent_to_cells(area: Rect, x: f64, y: f64, w: f64, h: f64) -> Option<Rect> {
    let left = area.x as f64 + x / 100.0 * area.width as f64;
    let top = area.y as f64 + y / 100.0 * area.height as f64;
    let right = left + w / 100.0 * area.width as f64;
    let bottom = top + h / 100.0 * area.height as f64;

    // Tolerate rounding noise so 10% of 100 cells is exactly 10 cells
    const EPS: f64 = 1e-9;
    let clip = |v: f64, lo: u16, hi: u16| v.clamp(lo as f64, hi as f64) as u16;
    let x0 = clip((left + EPS).floor(), area.x, area.right());
    let y0 = clip((top + EPS).floor(), area.y, area.bottom());
    let x1 = clip((right - EPS).ceil(), area.x, area.right());
    let y1 = clip((bottom - EPS).ceil(), area.y, area.bottom());

    (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
}

/// Percentage point at the center of a cell, if the cell is inside `area`
pub fn cell_to_percent(area: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
    if !area.contains(Position::new(column, row)) {
        return None;
    }
    let x = (column - area.x) as f64 + 0.5;
    let y = (row - area.y) as f64 + 0.5;
    Some((x / area.width as f64 * 100.0, y / area.height as f64 * 100.0))
}

fn target_glyph(kind: &str) -> &'static str {
    match kind {
        "squirrel" => "s",
        "rabbit" => "r",
        "deer" => "D",
        "bear" => "B",
        "bear_attack" => "!B!",
        _ => "?",
    }
}

/// Draw the frame; returns the cells the active screen occupies
pub fn draw(frame: &mut Frame, view: &View, theme: &Theme) -> Rect {
    let [body, footer] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());

    let title = view.screen_id.as_deref().unwrap_or("no screen");
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.frame())
        .title(Span::styled(format!(" {} ", title), theme.title()));
    let screen = block.inner(body);
    frame.render_widget(block, body);

    for (node, region) in &view.regions {
        let Some(cells) = percent_to_cells(screen, region.x, region.y, region.w, region.h) else {
            continue;
        };
        let style = theme.region(view.selected == Some(*node));
        let widget = Paragraph::new(Line::from(region.accessible_name().to_string()))
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_style(style));
        frame.render_widget(widget, cells);
    }

    for target in &view.targets {
        let (cx, cy) = target.center();
        if let Some(cells) = percent_to_cells(screen, cx, cy, 0.01, 0.01) {
            let glyph = Paragraph::new(target_glyph(&target.kind)).style(theme.target(&target.kind));
            frame.render_widget(glyph, Rect::new(cells.x, cells.y, 3, 1).intersection(screen));
        }
    }

    if let Some(draft) = view.draft.map(|d| d.intersection(screen)).filter(|d| !d.is_empty()) {
        frame.render_widget(Block::default().borders(Borders::ALL).border_style(theme.draft()), draft);
    }

    if let Some(lines) = &view.panel {
        let width = lines.iter().map(|l| l.len() as u16).max().unwrap_or(0).saturating_add(4).min(screen.width);
        let height = (lines.len() as u16).saturating_add(2).min(screen.height);
        let panel = Rect::new(screen.right().saturating_sub(width), screen.y, width, height);
        let text: Vec<Line> = lines.iter().map(|l| Line::from(l.as_str())).collect();
        frame.render_widget(Clear, panel);
        frame.render_widget(
            Paragraph::new(text)
                .style(theme.panel())
                .block(Block::default().borders(Borders::ALL).title(" calibrator ")),
            panel,
        );
    }

    frame.render_widget(Paragraph::new(view.status.as_str()).style(theme.status()), footer);
    screen
}
