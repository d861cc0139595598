//! Market treemap widget - one tile per coin, sized by market cap

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::application::visualizer::App;
use crate::domain::{LayoutRect, TreemapLayout};

/// Draw the treemap for the whole market
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Market ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let target = TreemapLayout::new(
        inner.x as f64,
        inner.y as f64,
        inner.width as f64,
        inner.height as f64,
    );
    let rects = app.market.layout(target);

    if rects.is_empty() {
        let empty = Paragraph::new(" No market data");
        frame.render_widget(empty, inner);
        return;
    }

    let selected = app.session.symbol();
    for rect in &rects {
        let Some(cell) = to_cells(rect, inner) else {
            continue;
        };
        let is_selected = rect.item.symbol == selected;
        draw_tile(frame, rect, cell, is_selected);
    }
}

fn draw_tile(frame: &mut Frame, rect: &LayoutRect, cell: Rect, is_selected: bool) {
    let mut style = Style::default().bg(change_color(rect.item.change_pct)).fg(Color::White);
    if is_selected {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }

    let mut lines = vec![Line::from(rect.item.symbol.clone())];
    if cell.height > 1 {
        lines.push(Line::from(format!("{:+.1}%", rect.item.change_pct)));
    }

    let tile = Paragraph::new(lines).style(style);
    frame.render_widget(tile, cell);
}

/// Snap a layout rectangle to terminal cells
///
/// Both edges are rounded independently so neighbouring tiles share an edge.
fn to_cells(rect: &LayoutRect, bounds: Rect) -> Option<Rect> {
    let x0 = rect.x.round().max(bounds.x as f64) as u16;
    let y0 = rect.y.round().max(bounds.y as f64) as u16;
    let x1 = (rect.x + rect.width).round().min(bounds.right() as f64) as u16;
    let y1 = (rect.y + rect.height).round().min(bounds.bottom() as f64) as u16;

    (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
}

fn change_color(change_pct: f64) -> Color {
    match change_pct {
        c if c >= 10.0 => Color::Rgb(0, 150, 60),
        c if c > 0.0 => Color::Rgb(20, 100, 50),
        c if c <= -10.0 => Color::Rgb(170, 30, 30),
        c if c < 0.0 => Color::Rgb(110, 35, 35),
        _ => Color::DarkGray,
    }
}
