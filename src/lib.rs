//! A spell-checking broker: discovers provider engines, resolves language
//! tags to dictionaries and layers personal word lists and session
//! overrides on top of them.

pub mod broker;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod provider;

pub use broker::Broker;
pub use config::Config;
pub use dictionary::Dictionary;
pub use error::{BrokerError, ProviderError, Result};
pub use provider::{DictionaryInfo, Provider, ProviderDictionary, ProviderInfo, ProviderRegistry};
