//! Price chart widget - closes of the candle series

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::price;
use crate::application::visualizer::App;
use crate::domain::CandleAggregator;

/// Draw the selected coin's price history
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let title = match session.snapshot() {
        Some(snapshot) => format!(
            " {} ({}) ${} {:+.2}% ",
            snapshot.symbol,
            snapshot.name,
            price(session.last_price().unwrap_or(snapshot.price)),
            snapshot.change_24h
        ),
        None => format!(" {} ", session.symbol()),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let candles = session.candles();
    let Some((low, high)) = candles.price_range() else {
        let empty = Paragraph::new(" Waiting for trades...").block(block);
        frame.render_widget(empty, area);
        return;
    };

    let points = close_points(candles);
    let (y_min, y_max) = padded_bounds(low, high);
    let color = match (candles.candles().front(), candles.last()) {
        (Some(first), Some(last)) if last.close < first.open => Color::Red,
        _ => Color::Green,
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, (points.len().max(2) - 1) as f64]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(price(y_min)),
                    Span::raw(price((y_min + y_max) / 2.0)),
                    Span::raw(price(y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

fn close_points(candles: &CandleAggregator) -> Vec<(f64, f64)> {
    candles
        .candles()
        .iter()
        .enumerate()
        .map(|(i, c)| (i as f64, c.close))
        .collect()
}

/// Flat series still get a visible band
fn padded_bounds(low: f64, high: f64) -> (f64, f64) {
    let span = high - low;
    let pad = if span > 0.0 { span * 0.05 } else { high.abs() * 0.01 + f64::EPSILON };
    ((low - pad).max(0.0), high + pad)
}
