//! UI widgets for the terminal

pub mod chart;
pub mod trades;
pub mod treemap;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::App;
use crate::application::MarketOverview;
use crate::domain::CoinSnapshot;

/// Gainers and losers listed in the header
const HEADER_MOVERS: usize = 2;

/// Draw the main UI layout
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_main(frame, app, chunks[1]);
    draw_footer(frame, app, chunks[2]);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let status_color = match app.connection {
        _ if app.suspended => Color::DarkGray,
        hypersockets::ConnectionState::Open => Color::Green,
        hypersockets::ConnectionState::Closed => Color::Red,
        _ => Color::Yellow,
    };
    let status = if app.suspended {
        "paused".to_string()
    } else {
        app.connection.to_string()
    };

    let mut header_text = format!(
        " Stream: {} | Coins: {} | Market cap: ${} | 24h volume: ${}",
        status,
        app.market.len(),
        compact(app.market.total_market_cap()),
        compact(app.market.total_volume()),
    );
    if let Some(movers) = movers_summary(&app.market, HEADER_MOVERS) {
        header_text.push_str(" | ");
        header_text.push_str(&movers);
    }

    let header = Paragraph::new(header_text)
        .style(Style::default().fg(status_color))
        .block(Block::default().borders(Borders::ALL).title(" Coin Market "));

    frame.render_widget(header, area);
}

fn draw_main(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    treemap::draw(frame, app, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    chart::draw(frame, app, right[0]);
    trades::draw(frame, app, right[1]);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let size = format!("size ${:.0}", app.trade_size_usd);
    let footer_text = match app.status_message.as_deref() {
        Some(status) if !status.is_empty() => format!(" {} | {}", size, status),
        _ => format!(" {} | q=quit j/k=coin b=buy s=sell +/-=size r=refresh", size),
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

/// "Up: A +12.0% B +3.1% | Down: C -8.0%", `None` when nothing moved
pub(crate) fn movers_summary(market: &MarketOverview, n: usize) -> Option<String> {
    let (gainers, losers) = market.top_movers(n);
    let list = |coins: &[&CoinSnapshot]| {
        coins
            .iter()
            .map(|c| format!("{} {:+.1}%", c.symbol, c.change_24h))
            .collect::<Vec<_>>()
            .join(" ")
    };

    match (gainers.is_empty(), losers.is_empty()) {
        (true, true) => None,
        (false, true) => Some(format!("Up: {}", list(&gainers))),
        (true, false) => Some(format!("Down: {}", list(&losers))),
        (false, false) => Some(format!("Up: {} | Down: {}", list(&gainers), list(&losers))),
    }
}

/// 1234567 -> "1.23M"
pub(crate) fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{:.2}", value)
    }
}

/// Adaptive precision for sub-cent prices
pub(crate) fn price(value: f64) -> String {
    if value >= 1.0 {
        format!("{:.4}", value)
    } else {
        format!("{:.8}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact() {
        assert_eq!(compact(1_234_567.0), "1.23M");
        assert_eq!(compact(999.0), "999.00");
        assert_eq!(compact(2_500_000_000.0), "2.50B");
    }

    fn coin(symbol: &str, change_24h: f64) -> CoinSnapshot {
        CoinSnapshot {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price: 1.0,
            pool_base: 100.0,
            pool_token: 100.0,
            volume_24h: 0.0,
            change_24h,
            circulating_supply: 1000.0,
            market_cap: None,
        }
    }

    #[test]
    fn test_movers_summary() {
        let mut market = MarketOverview::new();
        assert_eq!(movers_summary(&market, 2), None);

        market.update(vec![
            coin("FLAT", 0.0),
            coin("MOON", 12.0),
            coin("DUD", -8.0),
            coin("UP", 3.14),
            coin("MEH", 0.5),
        ]);
        assert_eq!(
            movers_summary(&market, 2).as_deref(),
            Some("Up: MOON +12.0% UP +3.1% | Down: DUD -8.0%")
        );

        market.update(vec![coin("DUD", -8.0)]);
        assert_eq!(movers_summary(&market, 2).as_deref(), Some("Down: DUD -8.0%"));
    }

    #[test]
    fn test_price_precision() {
        assert_eq!(price(12.5), "12.5000");
        assert_eq!(price(0.00012), "0.00012000");
    }
}
