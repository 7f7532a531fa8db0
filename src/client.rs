use crate::ui;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    collections::VecDeque,
    path::PathBuf,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time,
};
use tracing::{
    debug,
    info,
    warn,
};
use wallet_gateway::{
    Amount,
    GatewayConfig,
    JsonRpcProvider,
    WalletGateway,
    deployment::{
        DeploymentEnv,
        DeploymentStore,
    },
    view::{
        Action,
        CardSide,
        ViewState,
    },
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub env: DeploymentEnv,
    pub rpc_url: String,
    pub config_path: Option<String>,
}

/// Fixed facts about the session shown next to the live view.
#[derive(Clone, Debug)]
pub struct AppHeader {
    pub rpc_url: String,
    pub wallet_detected: bool,
    pub native_symbol: String,
    pub token_symbol: String,
    pub unit_price: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Connect,
    LoadSupply,
    RefreshBalances,
    UpdateMintAmount(String),
    Purchase(String),
    RegisterToken,
    StartBoxGame,
    ChooseBox(u8),
    StartCardGame,
    PlayCard(CardSide),
    Shutdown,
}

impl Command {
    /// The busy flag this command raises, if any.
    fn action(&self) -> Option<Action> {
        match self {
            Command::Connect => Some(Action::Connect),
            Command::LoadSupply => Some(Action::LoadSupply),
            Command::RefreshBalances => Some(Action::RefreshBalances),
            Command::Purchase(_) => Some(Action::Purchase),
            Command::RegisterToken => Some(Action::WatchAsset),
            Command::StartBoxGame => Some(Action::StartBoxGame),
            Command::ChooseBox(_) => Some(Action::ChooseBox),
            Command::StartCardGame => Some(Action::StartCardGame),
            Command::PlayCard(_) => Some(Action::PlayCard),
            Command::UpdateMintAmount(_) | Command::Shutdown => None,
        }
    }
}

/// Resolves the gateway configuration: an explicit file wins over the
/// recorded deployment of the selected network.
pub fn load_gateway_config(config: &AppConfig) -> Result<GatewayConfig> {
    if let Some(raw) = &config.config_path {
        let path = PathBuf::from(shellexpand::tilde(raw).into_owned());
        let loaded = GatewayConfig::load(&path)
            .wrap_err_with(|| format!("Failed to load config {}", path.display()))?;
        if loaded.chain_id != config.env.chain_id() {
            warn!(
                file = loaded.chain_id,
                network = config.env.chain_id(),
                "config chain id differs from the selected network"
            );
        }
        return Ok(loaded);
    }

    let store = DeploymentStore::new(config.env)?;
    let record = store.load()?.ok_or_else(|| {
        eyre!(
            "No {} deployment recorded in {}; pass --config <path>",
            config.env,
            store.path().display()
        )
    })?;
    let gateway_config = GatewayConfig::for_deployment(config.env, &record);
    gateway_config
        .validate()
        .wrap_err("Recorded deployment is incomplete")?;
    Ok(gateway_config)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let gateway_config = load_gateway_config(&config)?;
    let provider = JsonRpcProvider::detect(config.rpc_url.clone()).await;
    if provider.is_none() {
        warn!(url = %config.rpc_url, "no wallet answered; connect is disabled");
    }
    let header = AppHeader {
        rpc_url: config.rpc_url.clone(),
        wallet_detected: provider.is_some(),
        native_symbol: gateway_config.native_symbol.clone(),
        token_symbol: gateway_config.token.symbol.clone(),
        unit_price: gateway_config.unit_price()?,
    };
    let gateway = WalletGateway::new(provider, gateway_config)?;
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    info!(env = %config.env, "starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(gateway, &header, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

async fn gateway_worker(
    mut gateway: WalletGateway<JsonRpcProvider>,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    view_tx: mpsc::UnboundedSender<ViewState>,
) -> Result<()> {
    while let Some(cmd) = cmd_rx.recv().await {
        debug!(?cmd, "gateway command");
        // Failures are already on the notice log; the result only matters
        // for tracing.
        let outcome = match cmd {
            Command::Connect => gateway.connect().await.map(|o| debug!(?o, "connect")),
            Command::LoadSupply => gateway.load_supply().await,
            Command::RefreshBalances => gateway.refresh_balances().await,
            Command::UpdateMintAmount(input) => {
                gateway.update_mint_amount(&input);
                Ok(())
            }
            Command::Purchase(input) => {
                gateway.update_mint_amount(&input);
                gateway.purchase_tokens(&input).await.map(|_| ())
            }
            Command::RegisterToken => gateway.register_token().await,
            Command::StartBoxGame => gateway.start_random_box().await,
            Command::ChooseBox(index) => gateway.choose_box(index).await.map(|_| ()),
            Command::StartCardGame => gateway.start_card_game().await,
            Command::PlayCard(side) => gateway.play_card(side).await.map(|_| ()),
            Command::Shutdown => break,
        };
        if let Err(err) = outcome {
            debug!(error = %err, "gateway command failed");
        }
        view_tx
            .send(gateway.view().clone())
            .map_err(|_| eyre!("view receiver dropped"))?;
    }
    Ok(())
}

async fn run_loop(
    gateway: WalletGateway<JsonRpcProvider>,
    header: &AppHeader,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    let wallet_detected = gateway.provider().is_some();
    let mut view = gateway.view().clone();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (view_tx, mut view_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(gateway_worker(gateway, cmd_rx, view_tx));

    // One entry per command sent; the worker answers each with one view.
    let mut in_flight: VecDeque<Option<Action>> = VecDeque::new();
    let mut startup = vec![Command::UpdateMintAmount(String::new())];
    if wallet_detected {
        startup.push(Command::LoadSupply);
    }
    for cmd in startup {
        in_flight.push_back(cmd.action());
        cmd_tx
            .send(cmd)
            .map_err(|_| eyre!("gateway worker stopped"))?;
    }
    view.busy.extend(in_flight.iter().flatten().copied());
    ui::draw(ui_state, header, &view).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            maybe_view = view_rx.recv() => {
                let Some(fresh) = maybe_view else {
                    warn!("gateway worker channel closed");
                    break;
                };
                in_flight.pop_front();
                view = fresh;
                view.busy.extend(in_flight.iter().flatten().copied());
                ui::draw(ui_state, header, &view).wrap_err("draw after view update failed")?;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, &view, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::Dispatch(cmd) => {
                        let action = cmd.action();
                        if let Some(action) = action {
                            if view.is_busy(action) {
                                debug!(%action, "ignored while pending");
                                continue;
                            }
                            view.busy.insert(action);
                        }
                        in_flight.push_back(action);
                        cmd_tx
                            .send(cmd)
                            .map_err(|_| eyre!("gateway worker stopped"))?;
                    }
                }
                ui::draw(ui_state, header, &view).wrap_err("draw after input failed")?;
            }
        }
    }

    let _ = cmd_tx.send(Command::Shutdown);
    match time::timeout(SHUTDOWN_GRACE, worker).await {
        Ok(joined) => joined.wrap_err("gateway worker panicked")??,
        Err(_) => warn!("gateway worker still busy at exit; abandoning it"),
    }
    Ok(())
}
