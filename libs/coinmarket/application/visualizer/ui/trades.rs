//! Quote and recent trades panel

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{compact, price};
use crate::application::visualizer::App;
use crate::domain::TradeSide;

pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    draw_quote(frame, app, chunks[0]);
    draw_recent(frame, app, chunks[1]);
}

fn draw_quote(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    match app.buy_quote() {
        Some(q) => lines.push(Line::from(format!(
            " Buy  ${:.2} -> ~{} tokens (fee ${:.4}, impact {:+.2}%)",
            q.usd_in,
            compact(q.tokens_out),
            q.fee_paid,
            q.price_impact_pct
        ))),
        None => lines.push(Line::from(" Buy  unavailable")),
    }

    match app.sell_quote() {
        Some(q) => lines.push(Line::from(format!(
            " Sell {} tokens -> ~${:.2} (fee ${:.4}, impact {:+.2}%)",
            compact(q.token_in),
            q.usd_out,
            q.fee_paid,
            q.price_impact_pct
        ))),
        None => lines.push(Line::from(" Sell unavailable")),
    }

    if let Some(pool) = app.session.pool() {
        lines.push(Line::from(Span::styled(
            format!(
                " Pool ${} / {} tokens",
                compact(pool.base_reserve),
                compact(pool.token_reserve)
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let quote = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Estimate "));
    frame.render_widget(quote, area);
}

fn draw_recent(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .session
        .recent_trades()
        .iter()
        .map(|trade| {
            let color = match trade.side {
                TradeSide::Buy => Color::Green,
                TradeSide::Sell => Color::Red,
            };
            let text = format!(
                " {} {:<4} {:>10} @ {} (${:.2})",
                trade.timestamp.format("%H:%M:%S"),
                trade.side,
                compact(trade.token_amount),
                price(trade.price),
                trade.usd_amount
            );
            ListItem::new(Line::from(Span::styled(text, Style::default().fg(color))))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Trades "));
    frame.render_widget(list, area);
}
