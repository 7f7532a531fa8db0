//! Scriptable in-memory wallet for exercising the gateway without a node.

use crate::{
    config::{
        GatewayConfig,
        TokenConfig,
    },
    contracts::{
        ICardGame,
        IRandomBox,
        ITokenSale,
    },
    gateway::WalletGateway,
    provider::{
        CallRequest,
        ProviderError,
        TxReceipt,
        TxRequest,
        WalletProvider,
        WatchAsset,
    },
};
use alloy_primitives::{
    Address,
    B256,
    Bytes,
    U256,
};
use alloy_sol_types::{
    SolCall,
    SolValue,
};
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        MutexGuard,
    },
};

pub const MUMBAI_CHAIN_ID: u64 = 80001;

pub fn one_ether() -> U256 {
    U256::from(10u64).pow(U256::from(18u64))
}

pub fn player() -> Address {
    Address::repeat_byte(0xab)
}

pub fn token_address() -> Address {
    Address::repeat_byte(0x01)
}

pub fn random_box_address() -> Address {
    Address::repeat_byte(0x02)
}

pub fn card_game_address() -> Address {
    Address::repeat_byte(0x03)
}

/// A Mumbai configuration with fast receipt polling.
pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        token: TokenConfig {
            address: token_address(),
            ..TokenConfig::default()
        },
        random_box_address: random_box_address(),
        card_game_address: card_game_address(),
        receipt_poll_interval_ms: 1,
        receipt_attempts: 3,
        ..GatewayConfig::default()
    }
}

pub fn gateway(provider: MockProvider) -> WalletGateway<MockProvider> {
    WalletGateway::new(Some(provider), test_config())
        .unwrap_or_else(|e| panic!("test config rejected: {e}"))
}

/// A gateway whose wallet is already connected.
pub async fn connected_gateway(provider: MockProvider) -> WalletGateway<MockProvider> {
    let mut gateway = gateway(provider);
    if let Err(e) = gateway.connect().await {
        panic!("connect failed: {e}");
    }
    gateway
}

struct MockState {
    client_version: String,
    accounts: Vec<Address>,
    chain_id: u64,
    balances: HashMap<Address, U256>,
    responses: HashMap<[u8; 4], Bytes>,
    failures: HashMap<&'static str, ProviderError>,
    receipt_success: bool,
    pending_polls: u32,
    watch_asset_accepted: bool,
    sent: Vec<TxRequest>,
    calls: Vec<CallRequest>,
    watched: Vec<WatchAsset>,
}

pub struct MockProvider {
    state: Mutex<MockState>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// A MetaMask-like wallet on Mumbai exposing [`player`] with one ether and
    /// no tokens.
    pub fn new() -> Self {
        let account = player();
        let state = MockState {
            client_version: "MetaMask/v11.16.0".to_string(),
            accounts: vec![account],
            chain_id: MUMBAI_CHAIN_ID,
            balances: HashMap::from([(account, one_ether())]),
            responses: HashMap::new(),
            failures: HashMap::new(),
            receipt_success: true,
            pending_polls: 0,
            watch_asset_accepted: true,
            sent: Vec::new(),
            calls: Vec::new(),
            watched: Vec::new(),
        };
        let provider = Self {
            state: Mutex::new(state),
        };
        provider.set_token_balance(U256::ZERO);
        provider
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_client_version(&self, version: &str) {
        self.state().client_version = version.to_string();
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state().accounts = accounts;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state().chain_id = chain_id;
    }

    pub fn set_balance(&self, account: Address, balance: U256) {
        self.state().balances.insert(account, balance);
    }

    /// Scripts the raw return data of every call with `selector`.
    pub fn respond(&self, selector: [u8; 4], data: Vec<u8>) {
        self.state().responses.insert(selector, Bytes::from(data));
    }

    pub fn set_token_balance(&self, balance: U256) {
        self.respond(ITokenSale::balanceOfCall::SELECTOR, balance.abi_encode());
    }

    pub fn set_supply(&self, supply: U256, cap: U256) {
        self.respond(ITokenSale::totalSupplyInTokenCall::SELECTOR, supply.abi_encode());
        self.respond(ITokenSale::totalMaxSupplyInTokenCall::SELECTOR, cap.abi_encode());
    }

    pub fn set_box_outcome(&self, won: bool) {
        self.respond(IRandomBox::hasWonBoxCall::SELECTOR, won.abi_encode());
    }

    pub fn set_card_outcome(&self, won: bool, revealed: (U256, U256)) {
        self.respond(ICardGame::hasWonAddressCall::SELECTOR, won.abi_encode());
        self.respond(
            ICardGame::getPreviousResultsCall::SELECTOR,
            revealed.abi_encode(),
        );
    }

    /// Makes every request for the JSON-RPC `method` fail with `err`.
    pub fn fail(&self, method: &'static str, err: ProviderError) {
        self.state().failures.insert(method, err);
    }

    pub fn recover(&self, method: &'static str) {
        self.state().failures.remove(method);
    }

    pub fn set_receipt_success(&self, success: bool) {
        self.state().receipt_success = success;
    }

    /// Number of receipt polls answered with "not mined yet" before the
    /// receipt appears.
    pub fn set_pending_polls(&self, polls: u32) {
        self.state().pending_polls = polls;
    }

    pub fn set_watch_asset_accepted(&self, accepted: bool) {
        self.state().watch_asset_accepted = accepted;
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.state().sent.clone()
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.state().calls.clone()
    }

    pub fn watched(&self) -> Vec<WatchAsset> {
        self.state().watched.clone()
    }

    fn check(&self, method: &'static str) -> Result<(), ProviderError> {
        match self.state().failures.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl WalletProvider for MockProvider {
    async fn client_version(&self) -> Result<String, ProviderError> {
        self.check("web3_clientVersion")?;
        Ok(self.state().client_version.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.check("eth_requestAccounts")?;
        Ok(self.state().accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.check("eth_chainId")?;
        Ok(self.state().chain_id)
    }

    async fn balance(&self, account: Address) -> Result<U256, ProviderError> {
        self.check("eth_getBalance")?;
        Ok(self
            .state()
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default())
    }

    async fn call(&self, request: CallRequest) -> Result<Bytes, ProviderError> {
        self.check("eth_call")?;
        let mut state = self.state();
        let selector: Option<[u8; 4]> =
            request.data.get(..4).and_then(|s| s.try_into().ok());
        state.calls.push(request);
        selector
            .and_then(|s| state.responses.get(&s).cloned())
            .ok_or_else(|| ProviderError::Rejected {
                code: -32000,
                message: "execution reverted".to_string(),
            })
    }

    async fn send_transaction(&self, request: TxRequest) -> Result<B256, ProviderError> {
        self.check("eth_sendTransaction")?;
        let mut state = self.state();
        state.sent.push(request);
        Ok(B256::with_last_byte(state.sent.len() as u8))
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TxReceipt>, ProviderError> {
        self.check("eth_getTransactionReceipt")?;
        let mut state = self.state();
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(None);
        }
        Ok(Some(TxReceipt {
            transaction_hash: hash,
            success: state.receipt_success,
            block_number: Some(1),
        }))
    }

    async fn watch_asset(&self, asset: WatchAsset) -> Result<bool, ProviderError> {
        self.check("wallet_watchAsset")?;
        let mut state = self.state();
        state.watched.push(asset);
        Ok(state.watch_asset_accepted)
    }
}
