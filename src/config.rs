use crate::{
    amount::{
        Amount,
        ETHER_DECIMALS,
    },
    deployment::{
        DeploymentEnv,
        DeploymentRecord,
    },
    error::{
        GatewayError,
        Result,
    },
};
use alloy_primitives::{
    Address,
    address,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::Path,
};

pub const DEFAULT_ENTRY_FEE_RECIPIENT: Address =
    address!("f4F2AF207618Bd639aA70eD9498A98CB8391BC26");
pub const DEFAULT_CHOOSE_BOX_GAS: u64 = 4_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            address: Address::ZERO,
            symbol: "SABU".to_string(),
            decimals: ETHER_DECIMALS,
        }
    }
}

/// Everything that differs between deployments of the front-end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub chain_id: u64,
    pub network_name: String,
    pub native_symbol: String,
    pub token: TokenConfig,
    pub random_box_address: Address,
    pub card_game_address: Address,
    /// Native-currency price of one purchasable unit, display form.
    pub unit_price: String,
    /// Native balance below which the wallet panel is withheld.
    pub min_balance: String,
    /// Token amount paid to start a game round, display form.
    pub entry_fee: String,
    pub entry_fee_recipient: Address,
    /// Token amount announced to a random box winner.
    pub box_payout: String,
    pub choose_box_gas: u64,
    /// Client-version fragments of wallets that are turned away.
    pub unsupported_wallets: Vec<String>,
    pub receipt_poll_interval_ms: u64,
    pub receipt_attempts: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let env = DeploymentEnv::Mumbai;
        Self {
            chain_id: env.chain_id(),
            network_name: env.to_string(),
            native_symbol: "ETH".to_string(),
            token: TokenConfig::default(),
            random_box_address: Address::ZERO,
            card_game_address: Address::ZERO,
            unit_price: "0.0001".to_string(),
            min_balance: "0.0001".to_string(),
            entry_fee: "1".to_string(),
            entry_fee_recipient: DEFAULT_ENTRY_FEE_RECIPIENT,
            box_payout: "4".to_string(),
            choose_box_gas: DEFAULT_CHOOSE_BOX_GAS,
            unsupported_wallets: vec!["Trust".to_string()],
            receipt_poll_interval_ms: 1_000,
            receipt_attempts: 120,
        }
    }
}

impl GatewayConfig {
    pub fn for_deployment(env: DeploymentEnv, record: &DeploymentRecord) -> Self {
        let defaults = Self::default();
        Self {
            chain_id: env.chain_id(),
            network_name: env.to_string(),
            token: TokenConfig {
                address: record.token_address,
                symbol: record
                    .token_symbol
                    .clone()
                    .unwrap_or(defaults.token.symbol.clone()),
                decimals: defaults.token.decimals,
            },
            random_box_address: record.random_box_address,
            card_game_address: record.card_game_address,
            unit_price: record.unit_price.clone().unwrap_or(defaults.unit_price.clone()),
            entry_fee_recipient: record
                .entry_fee_recipient
                .unwrap_or(defaults.entry_fee_recipient),
            ..defaults
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            GatewayError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_slice(&data).map_err(|e| {
            GatewayError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.unit_price()?;
        self.min_balance()?;
        self.entry_fee()?;
        self.box_payout()?;
        for (name, address) in [
            ("token", self.token.address),
            ("random box", self.random_box_address),
            ("card game", self.card_game_address),
        ] {
            if address.is_zero() {
                return Err(GatewayError::Config(format!(
                    "{name} contract address is not set"
                )));
            }
        }
        if self.receipt_attempts == 0 {
            return Err(GatewayError::Config(
                "receipt_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn unit_price(&self) -> Result<Amount> {
        parse_setting("unit_price", &self.unit_price, ETHER_DECIMALS)
    }

    pub fn min_balance(&self) -> Result<Amount> {
        parse_setting("min_balance", &self.min_balance, ETHER_DECIMALS)
    }

    pub fn entry_fee(&self) -> Result<Amount> {
        parse_setting("entry_fee", &self.entry_fee, self.token.decimals)
    }

    pub fn box_payout(&self) -> Result<Amount> {
        parse_setting("box_payout", &self.box_payout, self.token.decimals)
    }

    /// True when the wallet's client string names an unsupported brand.
    pub fn unsupported_wallet(&self, client_version: &str) -> Option<&str> {
        let version = client_version.to_lowercase();
        self.unsupported_wallets
            .iter()
            .find(|brand| version.contains(&brand.to_lowercase()))
            .map(String::as_str)
    }
}

fn parse_setting(name: &str, raw: &str, decimals: u8) -> Result<Amount> {
    Amount::parse(raw, decimals)
        .map_err(|e| GatewayError::Config(format!("{name} {raw:?}: {e}")))
}
