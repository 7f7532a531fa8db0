//! Typed bindings for the three deployed contracts.

use crate::{
    error::{
        GatewayError,
        Result,
    },
    provider::{
        CallRequest,
        TxRequest,
        WalletProvider,
    },
};
use alloy_primitives::{
    Address,
    B256,
    Bytes,
    U64,
    U256,
};
use alloy_sol_types::{
    SolCall,
    sol,
};
use tracing::debug;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ITokenSale {
        function balanceOf(address owner) external view returns (uint256 balance);
        function totalSupplyInToken() external view returns (uint256 supply);
        function totalMaxSupplyInToken() external view returns (uint256 cap);
        function purchaseTokens(uint256 count) external payable;
        function transfer(address to, uint256 amount) external returns (bool ok);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRandomBox {
        function chooseBox(address player) external;
        function hasWonBox(address player) external view returns (bool won);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ICardGame {
        function playCard(bool side) external;
        function hasWonAddress(address player) external view returns (bool won);
        function getPreviousResults() external view returns (uint256 first, uint256 second);
    }
}

/// Binding of one contract address to a provider and a sending account.
pub struct ContractHandle<'a, P> {
    provider: &'a P,
    address: Address,
    from: Address,
}

impl<'a, P: WalletProvider> ContractHandle<'a, P> {
    pub fn new(provider: &'a P, address: Address, from: Address) -> Self {
        Self {
            provider,
            address,
            from,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Runs a read-only call and decodes its return values.
    pub async fn query<C>(&self, call: C) -> Result<C::Return>
    where
        C: SolCall + Send,
    {
        let data = Bytes::from(call.abi_encode());
        debug!(contract = %self.address, method = C::SIGNATURE, "query");
        let raw = self
            .provider
            .call(CallRequest {
                from: Some(self.from),
                to: self.address,
                data,
            })
            .await?;
        C::abi_decode_returns(&raw, true).map_err(|e| GatewayError::Decode {
            method: C::SIGNATURE,
            reason: e.to_string(),
        })
    }

    /// Submits a state-changing call; returns the transaction hash.
    pub async fn submit<C>(
        &self,
        call: C,
        value: Option<U256>,
        gas: Option<u64>,
    ) -> Result<B256>
    where
        C: SolCall + Send,
    {
        let request = TxRequest {
            from: self.from,
            to: self.address,
            value,
            data: Bytes::from(call.abi_encode()),
            gas: gas.map(U64::from),
        };
        debug!(contract = %self.address, method = C::SIGNATURE, "submit");
        Ok(self.provider.send_transaction(request).await?)
    }
}

pub struct TokenContract<'a, P>(ContractHandle<'a, P>);

impl<'a, P: WalletProvider> TokenContract<'a, P> {
    pub fn new(provider: &'a P, address: Address, from: Address) -> Self {
        Self(ContractHandle::new(provider, address, from))
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        let ret = self.0.query(ITokenSale::balanceOfCall { owner }).await?;
        Ok(ret.balance)
    }

    pub async fn total_supply_in_token(&self) -> Result<U256> {
        let ret = self.0.query(ITokenSale::totalSupplyInTokenCall {}).await?;
        Ok(ret.supply)
    }

    pub async fn total_max_supply_in_token(&self) -> Result<U256> {
        let ret = self
            .0
            .query(ITokenSale::totalMaxSupplyInTokenCall {})
            .await?;
        Ok(ret.cap)
    }

    /// `payment` is attached as the transaction value, in base units.
    pub async fn purchase_tokens(&self, count: U256, payment: U256) -> Result<B256> {
        self.0
            .submit(ITokenSale::purchaseTokensCall { count }, Some(payment), None)
            .await
    }

    pub async fn transfer(&self, to: Address, amount: U256) -> Result<B256> {
        self.0
            .submit(ITokenSale::transferCall { to, amount }, None, None)
            .await
    }
}

pub struct RandomBoxContract<'a, P> {
    handle: ContractHandle<'a, P>,
    gas: u64,
}

impl<'a, P: WalletProvider> RandomBoxContract<'a, P> {
    pub fn new(provider: &'a P, address: Address, from: Address, gas: u64) -> Self {
        Self {
            handle: ContractHandle::new(provider, address, from),
            gas,
        }
    }

    pub async fn choose_box(&self, player: Address) -> Result<B256> {
        self.handle
            .submit(IRandomBox::chooseBoxCall { player }, None, Some(self.gas))
            .await
    }

    pub async fn has_won_box(&self, player: Address) -> Result<bool> {
        let ret = self.handle.query(IRandomBox::hasWonBoxCall { player }).await?;
        Ok(ret.won)
    }
}

pub struct CardGameContract<'a, P>(ContractHandle<'a, P>);

impl<'a, P: WalletProvider> CardGameContract<'a, P> {
    pub fn new(provider: &'a P, address: Address, from: Address) -> Self {
        Self(ContractHandle::new(provider, address, from))
    }

    pub async fn play_card(&self, side: bool) -> Result<B256> {
        self.0
            .submit(ICardGame::playCardCall { side }, None, None)
            .await
    }

    pub async fn has_won_address(&self, player: Address) -> Result<bool> {
        let ret = self.0.query(ICardGame::hasWonAddressCall { player }).await?;
        Ok(ret.won)
    }

    pub async fn previous_results(&self) -> Result<(U256, U256)> {
        let ret = self.0.query(ICardGame::getPreviousResultsCall {}).await?;
        Ok((ret.first, ret.second))
    }
}
