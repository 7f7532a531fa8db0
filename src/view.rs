//! Display state bound to the front-end: what the page elements show, the
//! per-game round machine and the busy flags of in-flight actions.

use crate::error::{
    GatewayError,
    Result,
};
use alloy_primitives::U256;
use chrono::{
    DateTime,
    Utc,
};
use std::{
    collections::BTreeSet,
    fmt,
};
use tracing::{
    error,
    info,
    warn,
};

pub const ADDRESS_SEPARATOR: &str = " . . . . . . ";
const MAX_NOTICES: usize = 50;
const BOX_COUNT: u8 = 4;

/// First five and last five characters of an address.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{head}{ADDRESS_SEPARATOR}{tail}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Connect,
    LoadSupply,
    RefreshBalances,
    Purchase,
    WatchAsset,
    StartBoxGame,
    ChooseBox,
    StartCardGame,
    PlayCard,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Connect => "Connect",
            Action::LoadSupply => "Supply refresh",
            Action::RefreshBalances => "Balance refresh",
            Action::Purchase => "Purchase",
            Action::WatchAsset => "Add token",
            Action::StartBoxGame => "Random box start",
            Action::ChooseBox => "Box selection",
            Action::StartCardGame => "Card game start",
            Action::PlayCard => "Card play",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKind {
    RandomBox,
    Card,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardSide {
    Blue,
    Red,
}

impl CardSide {
    /// Argument passed to `playCard`.
    pub fn as_bool(self) -> bool {
        matches!(self, CardSide::Blue)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Box(u8),
    Card(CardSide),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceControl {
    pub label: String,
    pub choice: Choice,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoundPhase {
    #[default]
    Idle,
    EntryFeePaid,
    AwaitingResolution,
    Won,
    Lost,
}

impl RoundPhase {
    fn can_move_to(self, next: RoundPhase) -> bool {
        use RoundPhase::*;
        matches!(
            (self, next),
            (Idle, EntryFeePaid)
                | (EntryFeePaid, AwaitingResolution)
                | (AwaitingResolution, EntryFeePaid)
                | (AwaitingResolution, Won)
                | (AwaitingResolution, Lost)
                | (Won, Idle)
                | (Lost, Idle)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRoundResult {
    pub won: bool,
    pub revealed: Option<(U256, U256)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameView {
    pub kind: GameKind,
    pub phase: RoundPhase,
    pub controls: Vec<ChoiceControl>,
    pub last_result: Option<GameRoundResult>,
    pub rounds_played: u64,
}

impl GameView {
    pub fn new(kind: GameKind) -> Self {
        Self {
            kind,
            phase: RoundPhase::Idle,
            controls: Vec::new(),
            last_result: None,
            rounds_played: 0,
        }
    }

    pub fn start_label(&self) -> &'static str {
        match self.kind {
            GameKind::RandomBox => "Start Random Box",
            GameKind::Card => "Start Card Game",
        }
    }

    /// The start control is shown while no choice controls exist.
    pub fn shows_start(&self) -> bool {
        self.controls.is_empty()
    }

    /// Checks `next` is reachable without moving.
    pub fn ensure_can_move_to(&self, next: RoundPhase) -> Result<()> {
        if !self.phase.can_move_to(next) {
            return Err(GatewayError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        Ok(())
    }

    pub fn transition(&mut self, next: RoundPhase) -> Result<()> {
        self.ensure_can_move_to(next)?;
        self.phase = next;
        Ok(())
    }

    /// Replaces the start control with one control per choice.
    pub fn render_controls(&mut self, token_symbol: &str) {
        self.controls = match self.kind {
            GameKind::RandomBox => (1..=BOX_COUNT)
                .map(|i| ChoiceControl {
                    label: format!("{token_symbol} Token Random Box {i}"),
                    choice: Choice::Box(i),
                })
                .collect(),
            GameKind::Card => [CardSide::Blue, CardSide::Red]
                .into_iter()
                .map(|side| ChoiceControl {
                    label: format!("{side:?}"),
                    choice: Choice::Card(side),
                })
                .collect(),
        };
    }

    pub fn has_choice(&self, choice: Choice) -> bool {
        self.controls.iter().any(|c| c.choice == choice)
    }

    /// Records the outcome and returns the round to `Idle`, restoring the
    /// start control.
    pub fn finish(&mut self, result: GameRoundResult) -> Result<()> {
        let terminal = if result.won {
            RoundPhase::Won
        } else {
            RoundPhase::Lost
        };
        self.transition(terminal)?;
        self.last_result = Some(result);
        self.rounds_played += 1;
        self.transition(RoundPhase::Idle)?;
        self.controls.clear();
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewState {
    pub network_name: String,
    pub connect_button_visible: bool,
    pub wallet_panel_visible: bool,
    pub wallet_address: String,
    pub wallet_balance: String,
    pub token_balance: String,
    pub total_supply: String,
    pub max_supply: String,
    pub mint_amount_input: String,
    pub required_payment: String,
    pub random_box: GameView,
    pub card_game: GameView,
    pub busy: BTreeSet<Action>,
    pub notices: Vec<Notice>,
}

impl ViewState {
    pub fn new(network_name: impl Into<String>) -> Self {
        Self {
            network_name: network_name.into(),
            connect_button_visible: true,
            wallet_panel_visible: false,
            wallet_address: String::new(),
            wallet_balance: String::new(),
            token_balance: String::new(),
            total_supply: String::new(),
            max_supply: String::new(),
            mint_amount_input: String::new(),
            required_payment: String::new(),
            random_box: GameView::new(GameKind::RandomBox),
            card_game: GameView::new(GameKind::Card),
            busy: BTreeSet::new(),
            notices: Vec::new(),
        }
    }

    pub fn game(&self, kind: GameKind) -> &GameView {
        match kind {
            GameKind::RandomBox => &self.random_box,
            GameKind::Card => &self.card_game,
        }
    }

    pub fn game_mut(&mut self, kind: GameKind) -> &mut GameView {
        match kind {
            GameKind::RandomBox => &mut self.random_box,
            GameKind::Card => &mut self.card_game,
        }
    }

    /// Marks `action` in flight; a second trigger is refused until
    /// [`ViewState::settle`].
    pub fn begin(&mut self, action: Action) -> Result<()> {
        if !self.busy.insert(action) {
            return Err(GatewayError::Busy(action));
        }
        Ok(())
    }

    pub fn settle(&mut self, action: Action) {
        self.busy.remove(&action);
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.busy.contains(&action)
    }

    pub fn show_connected(
        &mut self,
        address: &str,
        wallet_balance: String,
        token_balance: String,
    ) {
        self.wallet_panel_visible = true;
        self.connect_button_visible = false;
        self.wallet_address = shorten_address(address);
        self.wallet_balance = wallet_balance;
        self.token_balance = token_balance;
    }

    pub fn show_disconnected(&mut self) {
        self.wallet_panel_visible = false;
        self.connect_button_visible = true;
        self.wallet_address.clear();
        self.wallet_balance.clear();
        self.token_balance.clear();
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Info | NoticeLevel::Success => info!(%message, "notice"),
            NoticeLevel::Warning => warn!(%message, "notice"),
            NoticeLevel::Error => error!(%message, "notice"),
        }
        self.notices.push(Notice {
            level,
            message,
            at: Utc::now(),
        });
        if self.notices.len() > MAX_NOTICES {
            let drain = self.notices.len() - MAX_NOTICES;
            self.notices.drain(0..drain);
        }
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }
}
