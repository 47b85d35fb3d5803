use crate::app::App;
use crate::braille::BrailleCanvas;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Route Map ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cursor_pos = app.mouse_pixel_pos().and_then(|p| {
        // Braille dots -> character position
        let cx = (p.x / 2.0) as u16;
        let cy = (p.y / 4.0) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    let map_widget = MapWidget {
        app,
        cursor_pos,
        dragging: app.controller.is_panning(),
    };
    frame.render_widget(map_widget, inner);
}

/// Braille tile grid and route layers with their text overlaid
struct MapWidget<'a> {
    app: &'a App,
    cursor_pos: Option<(u16, u16)>,
    dragging: bool,
}

impl MapWidget<'_> {
    /// Render a braille canvas layer with a specific color
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }

    fn render_labels(
        &self,
        labels: &[(u16, u16, String)],
        style: Style,
        area: Rect,
        buf: &mut Buffer,
    ) {
        for (lx, ly, text) in labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = area.width.saturating_sub(*lx) as usize;
            for (i, ch) in text.chars().take(max_len).enumerate() {
                buf[(area.x + *lx + i as u16, area.y + *ly)].set_char(ch).set_style(style);
            }
        }
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;

        // Back to front: tile grid, tile paths, route, marker labels
        self.render_layer(&app.tile_layer.canvas, Color::DarkGray, area, buf);
        self.render_labels(&app.tile_layer.labels, Style::default().fg(Color::DarkGray), area, buf);

        self.render_layer(&app.route_layer.canvas, Color::LightBlue, area, buf);
        let marker_style = Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD);
        self.render_labels(&app.route_layer.labels, marker_style, area, buf);

        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            let color = if self.dragging { Color::Yellow } else { Color::Red };
            buf[(x, y)].set_char('╋').set_fg(color);
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" Scale: ", dim),
        Span::styled(app.scale_label(), Style::default().fg(Color::Yellow)),
        Span::styled(" Tiles: ", dim),
        Span::styled(app.tile_label(), Style::default().fg(Color::Magenta)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | Waypoints: ", dim),
        Span::styled(app.route.len().to_string(), Style::default().fg(Color::Green)),
    ];

    match &app.status {
        Some(message) => {
            spans.push(Span::styled(" | ", dim));
            spans.push(Span::styled(message.clone(), Style::default().fg(Color::White)));
        }
        None => spans.push(Span::styled(
            " | drag:pan scroll:zoom click:add ⌫:undo c:clear w:save r:reset q:quit",
            dim,
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
