pub mod amount;
pub mod config;
pub mod contracts;
pub mod deployment;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod view;

pub mod test_helpers;

pub use amount::Amount;
pub use config::GatewayConfig;
pub use error::{
    GatewayError,
    Result,
};
pub use gateway::{
    ConnectOutcome,
    WalletGateway,
    WalletSession,
};
pub use provider::{
    JsonRpcProvider,
    WalletProvider,
};
pub use view::ViewState;
