use crate::client::{
    AppHeader,
    Command,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEvent,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use tokio::sync::mpsc;
use wallet_gateway::{
    amount::required_payment,
    view::{
        Action,
        CardSide,
        GameKind,
        GameView,
        NoticeLevel,
        RoundPhase,
        ViewState,
    },
};

pub type InputEventReceiver = mpsc::UnboundedReceiver<std::io::Result<Event>>;

pub enum UserEvent {
    Quit,
    Redraw,
    Dispatch(Command),
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    MintModal {
        input: String,
    },
    QuitModal,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    state.terminal = Some(Terminal::new(backend)?);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

/// Reads terminal events on a dedicated thread so the async loop never
/// blocks on `event::read`.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            let event = event::read();
            let failed = event.is_err();
            if tx.send(event).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    match events.recv().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input closed")),
    }
}

pub fn draw(state: &mut UiState, header: &AppHeader, view: &ViewState) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        let res = render(&mut term, state, header, view);
        state.terminal = Some(term);
        res?;
    }
    Ok(())
}

fn render<B: Backend>(
    term: &mut Terminal<B>,
    state: &UiState,
    header: &AppHeader,
    view: &ViewState,
) -> Result<()> {
    term.draw(|f| ui(f, state, header, view))?;
    Ok(())
}

/// Maps a key press to a UI event. Keys for controls that are not on screen
/// are ignored.
pub fn interpret_event(
    state: &mut UiState,
    view: &ViewState,
    event: Event,
) -> Option<UserEvent> {
    let Event::Key(key) = event else {
        return matches!(event, Event::Resize(..)).then_some(UserEvent::Redraw);
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match state.mode.clone() {
        Mode::MintModal { input } => mint_modal_key(&mut state.mode, key, input),
        Mode::QuitModal => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Normal => normal_key(state, view, key),
    }
}

fn mint_modal_key(mode: &mut Mode, key: KeyEvent, mut input: String) -> Option<UserEvent> {
    let event = match key.code {
        KeyCode::Esc => {
            *mode = Mode::Normal;
            return Some(UserEvent::Redraw);
        }
        KeyCode::Enter => {
            *mode = Mode::Normal;
            return Some(UserEvent::Dispatch(Command::Purchase(input)));
        }
        KeyCode::Backspace => {
            input.pop();
            UserEvent::Dispatch(Command::UpdateMintAmount(input.clone()))
        }
        KeyCode::Char(c) if !c.is_control() && input.len() < 18 => {
            input.push(c);
            UserEvent::Dispatch(Command::UpdateMintAmount(input.clone()))
        }
        _ => return None,
    };
    *mode = Mode::MintModal { input };
    Some(event)
}

fn normal_key(state: &mut UiState, view: &ViewState, key: KeyEvent) -> Option<UserEvent> {
    let command = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char('c') if view.connect_button_visible => Command::Connect,
        KeyCode::Char('s') => Command::LoadSupply,
        KeyCode::Char('r') => Command::RefreshBalances,
        KeyCode::Char('w') => Command::RegisterToken,
        KeyCode::Char('m') => {
            state.mode = Mode::MintModal {
                input: view.mint_amount_input.clone(),
            };
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char('b') if view.random_box.shows_start() => Command::StartBoxGame,
        KeyCode::Char(c @ '1'..='4') if !view.random_box.shows_start() => {
            Command::ChooseBox(c as u8 - b'0')
        }
        KeyCode::Char('g') if view.card_game.shows_start() => Command::StartCardGame,
        KeyCode::Char('z') if !view.card_game.shows_start() => {
            Command::PlayCard(CardSide::Blue)
        }
        KeyCode::Char('x') if !view.card_game.shows_start() => {
            Command::PlayCard(CardSide::Red)
        }
        _ => return None,
    };
    Some(UserEvent::Dispatch(command))
}

fn ui(f: &mut Frame, state: &UiState, header: &AppHeader, view: &ViewState) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(4),
            Constraint::Length(9),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_status(f, chunks[0], header, view);
    draw_wallet_row(f, chunks[1], header, view);
    draw_mint(f, chunks[2], header, view);
    draw_games(f, chunks[3], view);
    draw_notices(f, chunks[4], view);
    draw_help(f, chunks[5], view);
    draw_modals(f, state, header);
}

fn draw_status(f: &mut Frame, area: Rect, header: &AppHeader, view: &ViewState) {
    let wallet = if header.wallet_detected {
        Span::styled("wallet detected", Style::default().fg(Color::Green))
    } else {
        Span::styled("no wallet detected", Style::default().fg(Color::Red))
    };
    let busy = if view.busy.is_empty() {
        String::new()
    } else {
        let names: Vec<String> = view.busy.iter().map(ToString::to_string).collect();
        format!(" | pending: {}", names.join(", "))
    };
    let line = Line::from(vec![
        Span::raw(format!("Network: {} | RPC: {} | ", view.network_name, header.rpc_url)),
        wallet,
        Span::styled(busy, Style::default().fg(Color::Yellow)),
    ]);
    let status = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, area);
}

fn draw_wallet_row(f: &mut Frame, area: Rect, header: &AppHeader, view: &ViewState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let lines = if view.wallet_panel_visible {
        vec![
            Line::from(format!("Address: {}", view.wallet_address)),
            Line::from(format!(
                "Balance: {} {}",
                view.wallet_balance, header.native_symbol
            )),
            Line::from(format!(
                "Tokens:  {} {}",
                view.token_balance, header.token_symbol
            )),
        ]
    } else if view.connect_button_visible {
        vec![Line::styled(
            "[c] Connect Wallet",
            action_style(view, Action::Connect),
        )]
    } else {
        vec![Line::from("Not connected")]
    };
    let wallet = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Wallet"));
    f.render_widget(wallet, cols[0]);

    let supply = Paragraph::new(vec![
        Line::from(format!("Total supply: {}", or_dash(&view.total_supply))),
        Line::from(format!("Max supply:   {}", or_dash(&view.max_supply))),
    ])
    .style(action_style(view, Action::LoadSupply))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} Supply", header.token_symbol)),
    );
    f.render_widget(supply, cols[1]);
}

fn draw_mint(f: &mut Frame, area: Rect, header: &AppHeader, view: &ViewState) {
    let label = if view.required_payment.is_empty() {
        format!("Required {}:", header.native_symbol)
    } else {
        view.required_payment.clone()
    };
    let mint = Paragraph::new(vec![
        Line::from(format!("Amount: {}", or_dash(&view.mint_amount_input))),
        Line::from(label),
    ])
    .style(action_style(view, Action::Purchase))
    .block(Block::default().borders(Borders::ALL).title("Mint"));
    f.render_widget(mint, area);
}

fn draw_games(f: &mut Frame, area: Rect, view: &ViewState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    draw_game(f, cols[0], view, &view.random_box, "[b]", |i| format!("[{}]", i + 1));
    draw_game(f, cols[1], view, &view.card_game, "[g]", |i| {
        (if i == 0 { "[z]" } else { "[x]" }).to_string()
    });
}

fn draw_game(
    f: &mut Frame,
    area: Rect,
    view: &ViewState,
    game: &GameView,
    start_key: &str,
    choice_key: impl Fn(usize) -> String,
) {
    let mut lines = Vec::new();
    if game.shows_start() {
        lines.push(Line::from(format!("{start_key} {}", game.start_label())));
    } else {
        for (i, control) in game.controls.iter().enumerate() {
            lines.push(Line::from(format!("{} {}", choice_key(i), control.label)));
        }
    }
    lines.push(Line::from(""));
    let phase = match game.phase {
        RoundPhase::Idle => "idle",
        RoundPhase::EntryFeePaid => "entry fee paid, make a choice",
        RoundPhase::AwaitingResolution => "waiting for the result...",
        RoundPhase::Won => "won",
        RoundPhase::Lost => "lost",
    };
    lines.push(Line::styled(
        format!("Round: {phase}"),
        Style::default().fg(Color::DarkGray),
    ));
    if let Some(result) = &game.last_result {
        let (text, color) = if result.won {
            ("Last round: won", Color::Green)
        } else {
            ("Last round: lost", Color::Red)
        };
        let revealed = result
            .revealed
            .map(|(a, b)| format!(" ({a} / {b})"))
            .unwrap_or_default();
        lines.push(Line::styled(
            format!("{text}{revealed} | rounds played: {}", game.rounds_played),
            Style::default().fg(color),
        ));
    }
    let pending = view.busy.iter().any(|a| {
        matches!(
            (game.kind, a),
            (
                GameKind::RandomBox,
                Action::StartBoxGame | Action::ChooseBox
            ) | (
                GameKind::Card,
                Action::StartCardGame | Action::PlayCard
            )
        )
    });
    let style = if pending {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let title = match game.kind {
        GameKind::RandomBox => "Random Box",
        GameKind::Card => "Card Game",
    };
    let panel = Paragraph::new(lines)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(panel, area);
}

fn draw_notices(f: &mut Frame, area: Rect, view: &ViewState) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = if view.notices.is_empty() {
        vec![Line::styled("Nothing yet", Style::default().fg(Color::DarkGray))]
    } else {
        view.notices
            .iter()
            .rev()
            .take(visible)
            .map(|n| {
                let color = match n.level {
                    NoticeLevel::Info => Color::White,
                    NoticeLevel::Success => Color::Green,
                    NoticeLevel::Warning => Color::Yellow,
                    NoticeLevel::Error => Color::Red,
                };
                Line::styled(
                    format!("{} {}", n.at.format("%H:%M:%S"), n.message),
                    Style::default().fg(color),
                )
            })
            .collect()
    };
    let notices = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Notices"));
    f.render_widget(notices, area);
}

fn draw_help(f: &mut Frame, area: Rect, view: &ViewState) {
    let connect = if view.connect_button_visible {
        "c connect | "
    } else {
        ""
    };
    let help = Paragraph::new(format!(
        "{connect}s supply | r balances | m mint | w add token | b/1-4 random box | g/z/x cards | q quit"
    ))
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState, header: &AppHeader) {
    match &state.mode {
        Mode::MintModal { input } => {
            let area = centered_rect(50, 30, f.area());
            let payment = required_payment(input, header.unit_price);
            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!("Mint {}", header.token_symbol));
            let p = Paragraph::new(vec![
                Line::from(format!("Amount: {input}_")),
                Line::from(format!("Required {}: {payment}", header.native_symbol)),
                Line::from(""),
                Line::from("Enter=purchase Esc=cancel"),
            ]);
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(Paragraph::new("Quit? (Y/N)"), block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn action_style(view: &ViewState, action: Action) -> Style {
    if view.is_busy(action) {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(rows[1])[1]
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use wallet_gateway::amount::{
        Amount,
        ETHER_DECIMALS,
    };

    fn header() -> AppHeader {
        AppHeader {
            rpc_url: "http://localhost:8545".to_string(),
            wallet_detected: true,
            native_symbol: "ETH".to_string(),
            token_symbol: "SABU".to_string(),
            unit_price: Amount::parse("0.0001", ETHER_DECIMALS).unwrap(),
        }
    }

    fn screen_text(term: &Terminal<TestBackend>) -> String {
        term.backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn render__draws_status_and_keeps_terminal_usable() {
        // given
        let mut term = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let state = UiState::default();
        let view = ViewState::new("Polygon Mumbai");

        // when
        render(&mut term, &state, &header(), &view).unwrap();
        render(&mut term, &state, &header(), &view).unwrap();

        // then
        let text = screen_text(&term);
        assert!(text.contains("Network: Polygon Mumbai"));
        assert!(text.contains("wallet detected"));
    }
}
