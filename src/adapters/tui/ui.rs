use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::application::token_table::{
    auto_refresh_note, buy_button_label, refresh_button_label, TokenTableView, TABLE_TITLE, UPDATING_LABEL,
};
use crate::application::wallet_widget::{VERIFIED_LABEL, VERIFY_PROMPT};
use crate::domain::ChangeDirection;
use super::app::{App, MenuItem};

const HEADER_HEIGHT: u16 = 3;
const MENU_WIDTH: u16 = 48;
const ACCENT: Color = Color::Rgb(71, 252, 40);

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // Title, refresh state, wallet button
            Constraint::Min(10),               // Table + wallet panel
            Constraint::Length(1),             // Help
        ])
        .split(f.area());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(chunks[1]);

    render_tokens(f, body[0], app);
    render_wallet_panel(f, body[1], app);
    render_help(f, chunks[2], app);

    if app.is_menu_open() {
        render_menu(f, menu_area(f.area(), app.menu_items().len()), app);
    }

    if let Some(alert) = app.alert() {
        render_alert(f, alert);
    }
}

/// Where the wallet menu is drawn for a given terminal size
pub fn menu_area(area: Rect, item_count: usize) -> Rect {
    let width = MENU_WIDTH.min(area.width);
    // borders + title line + error line + items
    let height = (item_count as u16 + 4).min(area.height.saturating_sub(HEADER_HEIGHT));
    Rect::new(
        area.x + area.width.saturating_sub(width),
        area.y + HEADER_HEIGHT.min(area.height),
        width,
        height,
    )
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let view = app.table_view();

    let mut title = vec![Span::styled(
        TABLE_TITLE,
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if view.is_refreshing {
        title.push(Span::styled(format!("  {}", UPDATING_LABEL), Style::default().fg(ACCENT)));
    }

    let mut status = Vec::new();
    if let Some(updated) = &view.last_updated {
        status.push(Span::styled(
            format!("Last updated: {} • {}  ", updated, auto_refresh_note(app.refresh_interval_secs())),
            Style::default().fg(Color::Gray),
        ));
    }
    status.push(Span::styled(
        format!("[r] {}", refresh_button_label(view.is_refreshing)),
        Style::default().fg(ACCENT),
    ));
    status.push(Span::raw("   "));
    status.push(Span::styled(
        format!("[w] {}", app.address_label()),
        Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD),
    ));

    let header = Paragraph::new(vec![Line::from(title), Line::from(status)])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, area);
}

fn render_tokens(f: &mut Frame, area: Rect, app: &App) {
    let view: TokenTableView = app.table_view();
    let block = Block::default().borders(Borders::ALL).title("Tokens");

    if let Some(message) = view.message() {
        let color = if view.rows.is_empty() && message.starts_with("Error") { Color::Red } else { Color::White };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let table_area = match &view.banner {
        Some(banner) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(inner);
            let line = Paragraph::new(format!("Refresh failed: {} (showing last data)", banner))
                .style(Style::default().fg(Color::Red));
            f.render_widget(line, split[0]);
            split[1]
        }
        None => inner,
    };

    let action = buy_button_label(&app.session());
    let header = Row::new(["#", "Token", "Price", "24h", "Market Cap", "Volume", "Supply", ""])
        .style(Style::default().fg(Color::Green));

    let rows: Vec<Row> = view
        .rows
        .iter()
        .map(|row| {
            let change_color = match row.direction {
                ChangeDirection::Up => Color::Green,
                ChangeDirection::Down => Color::Red,
            };
            Row::new(vec![
                Cell::from(row.rank.clone()).style(Style::default().fg(ACCENT)),
                Cell::from(Line::from(vec![
                    Span::styled(row.symbol.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {}", row.name), Style::default().fg(Color::Gray)),
                ])),
                Cell::from(row.price.clone()),
                Cell::from(format!("{} {}", row.direction.arrow(), row.change)).style(Style::default().fg(change_color)),
                Cell::from(row.market_cap.clone()),
                Cell::from(row.volume.clone()),
                Cell::from(row.supply.clone()),
                Cell::from(action).style(Style::default().fg(ACCENT)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(18),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(9),
        Constraint::Length(15),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .highlight_style(Style::default().bg(Color::Rgb(10, 31, 6)).add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    state.select(Some(app.selected_row()));
    f.render_stateful_widget(table, table_area, &mut state);
}

fn render_wallet_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Wallet");

    let Some(view) = app.wallet_view() else {
        let text = if app.session().is_connecting() {
            "Connecting..."
        } else {
            "Not connected. Press [w] to choose a wallet."
        };
        f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Gray);
    let mut lines = vec![
        Line::from(Span::styled("Address", label)),
        Line::from(view.address.clone()),
        Line::from(""),
        Line::from(vec![Span::styled("Network: ", label), Span::raw(view.network.clone())]),
    ];

    if let Some(offer) = &view.switch_offer {
        let text = if view.is_switching { "Switching...".to_string() } else { format!("[s] {}", offer) };
        lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Yellow))));
    }
    if let Some(error) = &view.switch_error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }
    lines.push(Line::from(""));

    if view.verified {
        lines.push(Line::from(Span::styled(format!("✓ {}", VERIFIED_LABEL), Style::default().fg(Color::Green))));
    } else if view.is_signing {
        lines.push(Line::from("Waiting for signature..."));
    } else {
        lines.push(Line::from(VERIFY_PROMPT));
        lines.push(Line::from(Span::styled("[v] Verify Address", Style::default().fg(ACCENT))));
    }
    if let Some(error) = &view.verification_error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }

    if let Some(balance) = &view.balance {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled("Balance: ", label), Span::raw(balance.clone())]));
    }
    if let Some(signature) = &view.signature_preview {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Signature", label)));
        lines.push(Line::from(signature.clone()));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn render_menu(f: &mut Frame, area: Rect, app: &App) {
    let session = app.session();
    let (title, first_line) = match session.account() {
        Some(address) => ("Account", Line::from(address.to_string())),
        None => (
            "Choose Wallet",
            Line::from(Span::styled(
                app.last_connect_error().unwrap_or_default().to_string(),
                Style::default().fg(Color::Red),
            )),
        ),
    };

    let items: Vec<ListItem> = app
        .menu_items()
        .into_iter()
        .map(|item| match item {
            MenuItem::Connector(connector) => ListItem::new(connector.name),
            MenuItem::Disconnect => ListItem::new("Disconnect").style(Style::default().fg(Color::Red)),
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(ACCENT));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    f.render_widget(Paragraph::new(first_line), split[0]);

    let list = List::new(items)
        .highlight_style(Style::default().fg(Color::Black).bg(ACCENT))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.menu_selected()));
    f.render_stateful_widget(list, split[1], &mut state);
}

fn render_alert(f: &mut Frame, text: &str) {
    let area = centered_rect(60, 7, f.area());
    let alert = Paragraph::new(vec![
        Line::from(text.to_string()),
        Line::from(""),
        Line::from(Span::styled("Press any key", Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Notice"));
    f.render_widget(Clear, area);
    f.render_widget(alert, area);
}

fn render_help(f: &mut Frame, area: Rect, app: &App) {
    let help = if app.is_menu_open() {
        "↑/↓: Select | Enter: Confirm | Esc: Close"
    } else {
        "↑/↓: Select | Enter: Buy | w: Wallet | v: Verify | s: Switch network | r: Refresh | q: Quit"
    };
    let paragraph = Paragraph::new(help)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_area_sits_below_header_on_the_right() {
        let area = menu_area(Rect::new(0, 0, 120, 40), 2);
        assert_eq!(area, Rect::new(72, 3, 48, 6));
    }

    #[test]
    fn test_menu_area_fits_small_terminal() {
        let area = menu_area(Rect::new(0, 0, 30, 5), 5);
        assert_eq!(area.width, 30);
        assert_eq!(area.x, 0);
        assert!(area.y + area.height <= 5);
    }

    #[test]
    fn test_centered_rect() {
        let area = centered_rect(50, 4, Rect::new(0, 0, 100, 20));
        assert_eq!(area, Rect::new(25, 8, 50, 4));
    }
}
