//! The wallet gateway: connects the wallet, guards the network and drives the
//! token sale and both games.
//!
//! Every public operation follows the same shape: mark the action busy, run
//! the flow, settle the action, and turn a failure into a notice before
//! handing the typed error back. Each flow starts by checking the network and
//! re-reading the active account, so no transaction is built from stale
//! state.

use crate::{
    amount::{
        Amount,
        DISPLAY_PLACES,
        parse_unit_count,
        required_payment,
    },
    config::GatewayConfig,
    contracts::{
        CardGameContract,
        RandomBoxContract,
        TokenContract,
    },
    error::{
        GatewayError,
        Result,
    },
    provider::{
        TxReceipt,
        WalletProvider,
        WatchAsset,
    },
    view::{
        Action,
        CardSide,
        Choice,
        GameKind,
        GameRoundResult,
        NoticeLevel,
        RoundPhase,
        ViewState,
    },
};
use alloy_primitives::{
    Address,
    B256,
    U256,
};
use std::time::Duration;
use tracing::{
    debug,
    error,
    info,
    warn,
};

/// The connected account and its balances in base units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Address,
    pub native_balance: U256,
    pub token_balance: U256,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Nothing answered as a wallet; the view is untouched.
    NoProvider,
    /// Connected, but the native balance is below the spendable minimum.
    LowBalance,
    Connected,
}

/// Per-flow context, rebuilt from the provider at the start of each flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FlowContext {
    account: Address,
}

pub struct WalletGateway<P> {
    provider: Option<P>,
    config: GatewayConfig,
    session: Option<WalletSession>,
    view: ViewState,
}

impl<P: WalletProvider> WalletGateway<P> {
    pub fn new(provider: Option<P>, config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let view = ViewState::new(config.network_name.clone());
        Ok(Self {
            provider,
            config,
            session: None,
            view,
        })
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn session(&self) -> Option<&WalletSession> {
        self.session.as_ref()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    /// Authorizes the wallet, reads balances and reveals the wallet panel.
    pub async fn connect(&mut self) -> Result<ConnectOutcome> {
        let Some(provider) = self.provider.as_ref() else {
            debug!("connect ignored: no wallet provider");
            return Ok(ConnectOutcome::NoProvider);
        };
        self.view.begin(Action::Connect)?;
        let result = open_session(provider, &self.config).await;
        self.view.settle(Action::Connect);

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                self.report(Action::Connect, &e);
                return Err(e);
            }
        };
        let minimum = self.config.min_balance()?;
        let native = Amount::ether(session.native_balance);
        let outcome = if native < minimum {
            warn!(account = %session.address, balance = %native, "balance below minimum");
            self.view.notify(
                NoticeLevel::Warning,
                format!("You need more {}", self.config.native_symbol),
            );
            ConnectOutcome::LowBalance
        } else {
            let token = Amount::from_base(session.token_balance, self.config.token.decimals);
            self.view.show_connected(
                &session.address.to_checksum(None),
                native.truncated(DISPLAY_PLACES),
                token.to_display(),
            );
            info!(account = %session.address, balance = %native, tokens = %token, "wallet connected");
            ConnectOutcome::Connected
        };
        self.session = Some(session);
        Ok(outcome)
    }

    /// Returns `true` when the wallet is attached to a different network than
    /// the one this deployment expects.
    pub async fn check_network(&mut self) -> Result<bool> {
        let provider = self.provider.as_ref().ok_or(GatewayError::ProviderMissing)?;
        match guard_network(provider, &self.config).await {
            Ok(()) => Ok(false),
            Err(e @ GatewayError::WrongNetwork { .. }) => {
                self.report(Action::Connect, &e);
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Stores the typed unit count and recomputes the payment label.
    pub fn update_mint_amount(&mut self, input: &str) {
        self.view.mint_amount_input = input.to_string();
        let payment = self
            .config
            .unit_price()
            .map(|price| required_payment(input, price))
            .unwrap_or_default();
        self.view.required_payment = if payment.is_empty() {
            format!("Required {}:", self.config.native_symbol)
        } else {
            format!("Required {}: {payment} + gas fee", self.config.native_symbol)
        };
    }

    /// Reads circulating and maximum token supply.
    pub async fn load_supply(&mut self) -> Result<()> {
        let provider = self.provider.as_ref().ok_or(GatewayError::ProviderMissing)?;
        self.view.begin(Action::LoadSupply)?;
        let result = async {
            guard_network(provider, &self.config).await?;
            let token = TokenContract::new(provider, self.config.token.address, Address::ZERO);
            let supply = token.total_supply_in_token().await?;
            let cap = token.total_max_supply_in_token().await?;
            Ok::<_, GatewayError>((supply, cap))
        }
        .await;
        self.view.settle(Action::LoadSupply);

        match result {
            Ok((supply, cap)) => {
                debug!(%supply, %cap, "token supply");
                self.view.total_supply = supply.to_string();
                self.view.max_supply = cap.to_string();
                Ok(())
            }
            Err(e) => {
                self.report(Action::LoadSupply, &e);
                Err(e)
            }
        }
    }

    /// Re-reads native and token balances of the connected account.
    pub async fn refresh_balances(&mut self) -> Result<()> {
        let provider = self.provider.as_ref().ok_or(GatewayError::ProviderMissing)?;
        self.view.begin(Action::RefreshBalances)?;
        let result = async {
            let ctx = flow_context(provider, &self.config).await?;
            let native = provider.balance(ctx.account).await?;
            let token = TokenContract::new(provider, self.config.token.address, ctx.account);
            let tokens = token.balance_of(ctx.account).await?;
            Ok::<_, GatewayError>(WalletSession {
                address: ctx.account,
                native_balance: native,
                token_balance: tokens,
            })
        }
        .await;
        self.view.settle(Action::RefreshBalances);

        match result {
            Ok(fresh) => {
                self.reconcile_account(fresh.address);
                let Some(session) = self.session.as_mut() else {
                    let e = GatewayError::NotConnected;
                    self.report(Action::RefreshBalances, &e);
                    return Err(e);
                };
                *session = fresh;
                if self.view.wallet_panel_visible {
                    self.view.wallet_balance =
                        Amount::ether(session.native_balance).truncated(DISPLAY_PLACES);
                    self.view.token_balance =
                        Amount::from_base(session.token_balance, self.config.token.decimals)
                            .to_display();
                }
                Ok(())
            }
            Err(e) => {
                self.report(Action::RefreshBalances, &e);
                Err(e)
            }
        }
    }

    /// Buys `input` units from the token contract, paying
    /// `units * unit_price` in the native currency.
    pub async fn purchase_tokens(&mut self, input: &str) -> Result<B256> {
        let provider = self.provider.as_ref().ok_or(GatewayError::ProviderMissing)?;
        self.view.begin(Action::Purchase)?;
        let mut switched_to = None;
        let result = async {
            let count = parse_unit_count(input)
                .filter(|&count| count > 0)
                .ok_or_else(|| GatewayError::invalid_amount(input))?;
            let payment = self
                .config
                .unit_price()?
                .checked_mul(count)
                .ok_or_else(|| GatewayError::invalid_amount(input))?;
            let ctx = flow_context(provider, &self.config).await?;
            if self.session.as_ref().map(|s| s.address) != Some(ctx.account) {
                switched_to = Some(ctx.account);
                return Err(GatewayError::NotConnected);
            }
            let token = TokenContract::new(provider, self.config.token.address, ctx.account);
            info!(account = %ctx.account, %count, payment = %payment, "purchasing tokens");
            let hash = token.purchase_tokens(U256::from(count), payment.base()).await?;
            let receipt = await_receipt(provider, &self.config, hash).await?;
            Ok::<_, GatewayError>(receipt.transaction_hash)
        }
        .await;
        self.view.settle(Action::Purchase);
        if let Some(account) = switched_to {
            self.reconcile_account(account);
        }

        match result {
            Ok(hash) => {
                info!(%hash, "purchase confirmed");
                self.view.notify(NoticeLevel::Success, "Mint Success!");
                Ok(hash)
            }
            Err(e) => {
                self.report(Action::Purchase, &e);
                Err(e)
            }
        }
    }

    /// Asks the wallet to list the token. Failures are reported, never fatal.
    pub async fn register_token(&mut self) -> Result<()> {
        let provider = self.provider.as_ref().ok_or(GatewayError::ProviderMissing)?;
        self.view.begin(Action::WatchAsset)?;
        let asset = WatchAsset {
            address: self.config.token.address,
            symbol: self.config.token.symbol.clone(),
            decimals: self.config.token.decimals,
        };
        let result = provider.watch_asset(asset).await;
        self.view.settle(Action::WatchAsset);

        match result {
            Ok(true) => {
                info!(token = %self.config.token.address, "token registered with wallet");
                self.view.notify(NoticeLevel::Success, "Token added to wallet.");
                Ok(())
            }
            Ok(false) => {
                self.view.notify(
                    NoticeLevel::Warning,
                    "Failed to add token. Check your wallet settings.",
                );
                Ok(())
            }
            Err(e) => {
                let e = GatewayError::from(e);
                self.report(Action::WatchAsset, &e);
                Err(e)
            }
        }
    }

    /// Pays the entry fee and offers the four boxes.
    pub async fn start_random_box(&mut self) -> Result<()> {
        self.start_round(GameKind::RandomBox).await
    }

    /// Pays the entry fee and offers the blue and red cards.
    pub async fn start_card_game(&mut self) -> Result<()> {
        self.start_round(GameKind::Card).await
    }

    /// Opens box `index` (1-based). The outcome comes from `hasWonBox`, not
    /// from the selection transaction.
    pub async fn choose_box(&mut self, index: u8) -> Result<GameRoundResult> {
        self.play_round(Choice::Box(index)).await
    }

    pub async fn play_card(&mut self, side: CardSide) -> Result<GameRoundResult> {
        self.play_round(Choice::Card(side)).await
    }

    async fn start_round(&mut self, kind: GameKind) -> Result<()> {
        let action = match kind {
            GameKind::RandomBox => Action::StartBoxGame,
            GameKind::Card => Action::StartCardGame,
        };
        let provider = self.provider.as_ref().ok_or(GatewayError::ProviderMissing)?;
        self.view.game(kind).ensure_can_move_to(RoundPhase::EntryFeePaid)?;
        let fee = self.config.entry_fee()?;
        self.view.begin(action)?;
        self.view.notify(
            NoticeLevel::Info,
            format!(
                "Check your wallet. Sending {} {} to start the game.",
                fee, self.config.token.symbol
            ),
        );
        let result = async {
            let ctx = flow_context(provider, &self.config).await?;
            let token = TokenContract::new(provider, self.config.token.address, ctx.account);
            info!(account = %ctx.account, fee = %fee, ?kind, "paying entry fee");
            let hash = token
                .transfer(self.config.entry_fee_recipient, fee.base())
                .await?;
            await_receipt(provider, &self.config, hash).await?;
            Ok::<_, GatewayError>(ctx)
        }
        .await;
        self.view.settle(action);

        match result {
            Ok(ctx) => {
                self.reconcile_account(ctx.account);
                let symbol = self.config.token.symbol.clone();
                let game = self.view.game_mut(kind);
                game.transition(RoundPhase::EntryFeePaid)?;
                game.render_controls(&symbol);
                info!(?kind, "game round started");
                Ok(())
            }
            Err(e) => {
                self.report(action, &e);
                Err(e)
            }
        }
    }

    async fn play_round(&mut self, choice: Choice) -> Result<GameRoundResult> {
        let (kind, action) = match choice {
            Choice::Box(_) => (GameKind::RandomBox, Action::ChooseBox),
            Choice::Card(_) => (GameKind::Card, Action::PlayCard),
        };
        let provider = self.provider.as_ref().ok_or(GatewayError::ProviderMissing)?;
        let game = self.view.game(kind);
        game.ensure_can_move_to(RoundPhase::AwaitingResolution)?;
        if !game.has_choice(choice) {
            return Err(GatewayError::InvalidChoice(format!("{choice:?}")));
        }
        self.view.begin(action)?;
        self.view.game_mut(kind).transition(RoundPhase::AwaitingResolution)?;

        let result = async {
            let ctx = flow_context(provider, &self.config).await?;
            let round = match choice {
                Choice::Box(index) => {
                    let boxes = RandomBoxContract::new(
                        provider,
                        self.config.random_box_address,
                        ctx.account,
                        self.config.choose_box_gas,
                    );
                    info!(account = %ctx.account, index, "choosing box");
                    let hash = boxes.choose_box(ctx.account).await?;
                    await_receipt(provider, &self.config, hash).await?;
                    GameRoundResult {
                        won: boxes.has_won_box(ctx.account).await?,
                        revealed: None,
                    }
                }
                Choice::Card(side) => {
                    let cards = CardGameContract::new(
                        provider,
                        self.config.card_game_address,
                        ctx.account,
                    );
                    info!(account = %ctx.account, ?side, "playing card");
                    let hash = cards.play_card(side.as_bool()).await?;
                    await_receipt(provider, &self.config, hash).await?;
                    let won = cards.has_won_address(ctx.account).await?;
                    let revealed = cards.previous_results().await?;
                    GameRoundResult {
                        won,
                        revealed: Some(revealed),
                    }
                }
            };
            Ok::<_, GatewayError>((ctx, round))
        }
        .await;
        self.view.settle(action);

        match result {
            Ok((ctx, round)) => {
                self.reconcile_account(ctx.account);
                let message = self.outcome_message(kind, &round)?;
                let level = if round.won {
                    NoticeLevel::Success
                } else {
                    NoticeLevel::Info
                };
                info!(?kind, won = round.won, "round resolved");
                self.view.game_mut(kind).finish(round.clone())?;
                self.view.notify(level, message);
                Ok(round)
            }
            Err(e) => {
                // The fee is already paid; keep the choices on screen.
                self.view.game_mut(kind).transition(RoundPhase::EntryFeePaid)?;
                self.report(action, &e);
                Err(e)
            }
        }
    }

    fn outcome_message(&self, kind: GameKind, round: &GameRoundResult) -> Result<String> {
        let symbol = &self.config.token.symbol;
        let message = match (kind, round.won) {
            (GameKind::RandomBox, true) => format!(
                "Congratulations! You won. {} {symbol} has been sent!",
                self.config.box_payout()?
            ),
            (GameKind::RandomBox, false) => "Unfortunately, you did not win.".to_string(),
            (GameKind::Card, won) => {
                let verdict = if won { "You won!" } else { "You lost." };
                match round.revealed {
                    Some((first, second)) => {
                        format!("{verdict} Revealed cards: {first} and {second}.")
                    }
                    None => verdict.to_string(),
                }
            }
        };
        Ok(message)
    }

    /// Drops the session when the wallet now exposes a different account.
    fn reconcile_account(&mut self, account: Address) {
        let Some(previous) = self.session.as_ref().map(|s| s.address) else {
            return;
        };
        if previous != account {
            info!(%previous, current = %account, "wallet account changed");
            self.session = None;
            self.view.show_disconnected();
        }
    }

    fn report(&mut self, action: Action, err: &GatewayError) {
        let (level, message) = match err {
            GatewayError::UnsupportedWallet(brand) => (
                NoticeLevel::Warning,
                format!("{brand} is not supported. Please use another wallet."),
            ),
            GatewayError::WrongNetwork { .. } => (
                NoticeLevel::Warning,
                format!(
                    "Please connect to the correct network ({}).",
                    self.config.network_name
                ),
            ),
            GatewayError::ProviderMissing => {
                (NoticeLevel::Warning, "No wallet detected.".to_string())
            }
            GatewayError::Busy(_) => return,
            GatewayError::InvalidAmount { .. } => (
                NoticeLevel::Warning,
                "Enter a whole number of tokens to purchase.".to_string(),
            ),
            GatewayError::NotConnected => (
                NoticeLevel::Warning,
                "Please connect your wallet first".to_string(),
            ),
            e if e.is_rejection() => {
                error!(%action, error = %e, "wallet call failed");
                let message = match action {
                    Action::Purchase => "Please connect your wallet first",
                    Action::WatchAsset => "Failed to add token. Check your wallet settings.",
                    Action::StartBoxGame | Action::StartCardGame => "Token sending failed.",
                    Action::ChooseBox | Action::PlayCard => {
                        "The game call failed. Please try again."
                    }
                    Action::Connect | Action::LoadSupply | Action::RefreshBalances => {
                        "Could not read from the wallet."
                    }
                };
                let level = if action == Action::Purchase {
                    NoticeLevel::Warning
                } else {
                    NoticeLevel::Error
                };
                (level, message.to_string())
            }
            e => (NoticeLevel::Error, format!("{action} failed: {e}")),
        };
        self.view.notify(level, message);
    }
}

/// Fails with `WrongNetwork` unless the wallet reports the expected chain.
async fn guard_network<P: WalletProvider>(provider: &P, config: &GatewayConfig) -> Result<()> {
    let actual = provider.chain_id().await?;
    if actual != config.chain_id {
        warn!(expected = config.chain_id, actual, "wallet on wrong network");
        return Err(GatewayError::WrongNetwork {
            expected: config.chain_id,
            actual,
        });
    }
    Ok(())
}

async fn flow_context<P: WalletProvider>(
    provider: &P,
    config: &GatewayConfig,
) -> Result<FlowContext> {
    guard_network(provider, config).await?;
    let account = provider
        .request_accounts()
        .await?
        .into_iter()
        .next()
        .ok_or(GatewayError::NoAccounts)?;
    Ok(FlowContext { account })
}

async fn open_session<P: WalletProvider>(
    provider: &P,
    config: &GatewayConfig,
) -> Result<WalletSession> {
    let version = provider.client_version().await?;
    if let Some(brand) = config.unsupported_wallet(&version) {
        warn!(%version, "unsupported wallet");
        return Err(GatewayError::UnsupportedWallet(format!("{brand} Wallet")));
    }
    let ctx = flow_context(provider, config).await?;
    let native_balance = provider.balance(ctx.account).await?;
    let token = TokenContract::new(provider, config.token.address, ctx.account);
    let token_balance = token.balance_of(ctx.account).await?;
    Ok(WalletSession {
        address: ctx.account,
        native_balance,
        token_balance,
    })
}

async fn await_receipt<P: WalletProvider>(
    provider: &P,
    config: &GatewayConfig,
    hash: B256,
) -> Result<TxReceipt> {
    let interval = Duration::from_millis(config.receipt_poll_interval_ms);
    for attempt in 1..=config.receipt_attempts {
        if let Some(receipt) = provider.transaction_receipt(hash).await? {
            if !receipt.success {
                return Err(GatewayError::Reverted(hash));
            }
            debug!(%hash, attempt, block = ?receipt.block_number, "transaction mined");
            return Ok(receipt);
        }
        tokio::time::sleep(interval).await;
    }
    Err(GatewayError::ReceiptTimeout {
        hash,
        attempts: config.receipt_attempts,
    })
}
