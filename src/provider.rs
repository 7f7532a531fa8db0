use alloy_primitives::{
    Address,
    B256,
    Bytes,
    U64,
    U256,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use serde_json::{
    Value,
    json,
};
use std::{
    future::Future,
    sync::atomic::{
        AtomicU64,
        Ordering,
    },
    time::Duration,
};
use tracing::debug;

/// EIP-1193 code for a request the user declined in the wallet.
pub const USER_REJECTED: i64 = 4001;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("wallet rejected the request ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("provider unreachable: {0}")]
    Transport(String),
    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn user_rejected() -> Self {
        ProviderError::Rejected {
            code: USER_REJECTED,
            message: "User rejected the request.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// Read-only `eth_call` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

/// State-changing `eth_sendTransaction` request. The wallet fills in nonce,
/// fees and the signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    status: Option<U64>,
    block_number: Option<U64>,
}

impl From<RpcReceipt> for TxReceipt {
    fn from(raw: RpcReceipt) -> Self {
        TxReceipt {
            transaction_hash: raw.transaction_hash,
            success: raw.status.is_none_or(|s| s == U64::from(1u64)),
            block_number: raw.block_number.map(|n| n.to::<u64>()),
        }
    }
}

/// Token metadata handed to `wallet_watchAsset`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchAsset {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl WatchAsset {
    fn params(&self) -> Value {
        json!({
            "type": "ERC20",
            "options": {
                "address": self.address,
                "symbol": self.symbol,
                "decimals": self.decimals,
            },
        })
    }
}

/// The wallet as seen by the gateway: account authorization, chain identity,
/// transaction submission, read-only calls and asset registration.
pub trait WalletProvider: Send + Sync {
    /// Self-reported client string, used to recognise the wallet brand.
    fn client_version(
        &self,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    /// Asks the wallet to authorize this front-end; returns the exposed
    /// accounts, active account first.
    fn request_accounts(
        &self,
    ) -> impl Future<Output = Result<Vec<Address>, ProviderError>> + Send;

    fn chain_id(&self) -> impl Future<Output = Result<u64, ProviderError>> + Send;

    fn balance(
        &self,
        account: Address,
    ) -> impl Future<Output = Result<U256, ProviderError>> + Send;

    fn call(
        &self,
        request: CallRequest,
    ) -> impl Future<Output = Result<Bytes, ProviderError>> + Send;

    fn send_transaction(
        &self,
        request: TxRequest,
    ) -> impl Future<Output = Result<B256, ProviderError>> + Send;

    fn transaction_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<Option<TxReceipt>, ProviderError>> + Send;

    /// Returns whether the wallet accepted the asset.
    fn watch_asset(
        &self,
        asset: WatchAsset,
    ) -> impl Future<Output = Result<bool, ProviderError>> + Send;
}

/// Ethereum JSON-RPC over HTTP, pointed at a wallet node that holds the
/// user's accounts.
#[derive(Debug)]
pub struct JsonRpcProvider {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(url: impl Into<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Returns a provider only when something answers at `url`.
    pub async fn detect(url: impl Into<String>) -> Option<Self> {
        let provider = Self::new(url).ok()?;
        match provider.client_version().await {
            Ok(version) => {
                debug!(url = %provider.url, %version, "wallet provider detected");
                Some(provider)
            }
            Err(e) => {
                debug!(url = %provider.url, error = %e, "no wallet provider");
                None
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(%method, %id, "rpc request");
        let response: Value = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        decode_response(method, response)
    }
}

fn decode_response<T: DeserializeOwned>(
    method: &str,
    mut response: Value,
) -> Result<T, ProviderError> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(ProviderError::Rejected { code, message });
    }
    let result = response
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|e| ProviderError::Decode(format!("{method}: {e}")))
}

fn parse_quantity(raw: &str) -> Result<u64, ProviderError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| ProviderError::Decode(format!("{raw:?} is not a hex quantity")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::Decode(format!("{raw:?}: {e}")))
}

impl WalletProvider for JsonRpcProvider {
    async fn client_version(&self) -> Result<String, ProviderError> {
        self.request("web3_clientVersion", json!([])).await
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.request("eth_requestAccounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&raw)
    }

    async fn balance(
        &self,
        account: Address,
    ) -> Result<U256, ProviderError> {
        self.request("eth_getBalance", json!([account, "latest"]))
            .await
    }

    async fn call(&self, request: CallRequest) -> Result<Bytes, ProviderError> {
        self.request("eth_call", json!([request, "latest"])).await
    }

    async fn send_transaction(&self, request: TxRequest) -> Result<B256, ProviderError> {
        self.request("eth_sendTransaction", json!([request])).await
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TxReceipt>, ProviderError> {
        let raw: Option<RpcReceipt> = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        Ok(raw.map(TxReceipt::from))
    }

    async fn watch_asset(&self, asset: WatchAsset) -> Result<bool, ProviderError> {
        self.request("wallet_watchAsset", asset.params()).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn decode_response__maps_error_object_to_rejection() {
        // given
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4001, "message": "User rejected the request." },
        });

        // when
        let result: Result<String, _> = decode_response("eth_sendTransaction", response);

        // then
        assert_eq!(result, Err(ProviderError::user_rejected()));
    }

    #[test]
    fn decode_response__reads_null_result_as_none() {
        let response = json!({ "jsonrpc": "2.0", "id": 7, "result": null });
        let result: Option<TxReceipt> =
            decode_response::<Option<RpcReceipt>>("eth_getTransactionReceipt", response)
                .unwrap()
                .map(TxReceipt::from);
        assert_eq!(result, None);
    }

    #[test]
    fn decode_response__parses_receipt_status() {
        // given
        let hash = B256::repeat_byte(0xab);
        let response = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "result": {
                "transactionHash": hash,
                "status": "0x0",
                "blockNumber": "0x1b4",
            },
        });

        // when
        let receipt: TxReceipt =
            decode_response::<RpcReceipt>("eth_getTransactionReceipt", response)
                .unwrap()
                .into();

        // then
        assert_eq!(receipt.transaction_hash, hash);
        assert!(!receipt.success);
        assert_eq!(receipt.block_number, Some(436));
    }

    #[test]
    fn parse_quantity__reads_hex_chain_ids() {
        assert_eq!(parse_quantity("0x13881").unwrap(), 80001);
        assert_eq!(parse_quantity("0x89").unwrap(), 137);
        assert!(parse_quantity("80001").is_err());
    }

    #[test]
    fn tx_request__serializes_as_rpc_object() {
        let request = TxRequest {
            from: Address::repeat_byte(0x11),
            to: Address::repeat_byte(0x22),
            value: Some(U256::from(255u64)),
            data: Bytes::from(vec![0xde, 0xad]),
            gas: Some(U64::from(4_000_000u64)),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["value"], "0xff");
        assert_eq!(value["gas"], "0x3d0900");
        assert_eq!(value["data"], "0xdead");
    }

    #[test]
    fn watch_asset__builds_erc20_params() {
        let asset = WatchAsset {
            address: Address::repeat_byte(0x33),
            symbol: "SABU".to_string(),
            decimals: 18,
        };
        let params = asset.params();
        assert_eq!(params["type"], "ERC20");
        assert_eq!(params["options"]["symbol"], "SABU");
        assert_eq!(params["options"]["decimals"], 18);
    }
}
