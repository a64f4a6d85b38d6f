use std::{
    fs, io,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use openst_contract::{Connection, SigningPolicy};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DEFAULT_PASSPHRASE: &str = "testtest";
const CONTRACTS_SUBDIR: &str = "contracts";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Invalid Config File Path: {path:?} ({source})\n\
         Please provide openst-setup/config.json path using -c or --config flag"
    )]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "Invalid Config File: {path:?} ({source})\n\
         Please provide openst-setup/config.json path using -c or --config flag"
    )]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Missing `{0}` in config file")]
    MissingKey(&'static str),
}

/// Accounts and node settings produced by the openst-setup tool.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupConfig {
    pub geth_rpc_end_point: String,
    #[serde(default, deserialize_with = "quantity::deserialize")]
    pub gas_price: Option<u128>,
    #[serde(default, deserialize_with = "quantity::deserialize")]
    pub gas: Option<u64>,
    pub deployer_address: Option<Address>,
    pub organization_address: Option<Address>,
    pub facilitator: Option<Address>,
    pub chain_owner_address: Option<Address>,
    #[serde(default = "default_passphrase")]
    pub passphrase: String,
    pub keystore_dir: Option<PathBuf>,
    pub contracts_dir: Option<PathBuf>,
}

fn default_passphrase() -> String {
    DEFAULT_PASSPHRASE.to_string()
}

impl SetupConfig {
    /// Read the config from `path`. Relative directories inside are resolved against the
    /// directory containing the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(?path, "Reading setup config");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: SetupConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        if config.geth_rpc_end_point.trim().is_empty() {
            return Err(ConfigError::MissingKey("gethRpcEndPoint"));
        }

        let base = path.parent().unwrap_or(Path::new("."));
        config.keystore_dir = config.keystore_dir.map(|dir| base.join(dir));
        config.contracts_dir = Some(match config.contracts_dir {
            Some(dir) => base.join(dir),
            None => base.join(CONTRACTS_SUBDIR),
        });
        Ok(config)
    }

    pub fn deployer(&self) -> Result<Address, ConfigError> {
        self.deployer_address
            .ok_or(ConfigError::MissingKey("deployerAddress"))
    }

    pub fn organization(&self) -> Result<Address, ConfigError> {
        self.organization_address
            .ok_or(ConfigError::MissingKey("organizationAddress"))
    }

    pub fn facilitator(&self) -> Result<Address, ConfigError> {
        self.facilitator.ok_or(ConfigError::MissingKey("facilitator"))
    }

    pub fn chain_owner(&self) -> Result<Address, ConfigError> {
        self.chain_owner_address
            .ok_or(ConfigError::MissingKey("chainOwnerAddress"))
    }

    /// Default location of `<contract>.bin`.
    pub fn contract_bin(&self, contract: &str) -> PathBuf {
        self.contracts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONTRACTS_SUBDIR))
            .join(format!("{contract}.bin"))
    }

    /// Sign locally when a keystore directory is configured, let the node sign otherwise.
    pub fn signing_policy(&self) -> SigningPolicy {
        match &self.keystore_dir {
            Some(dir) => SigningPolicy::Keystore {
                dir: dir.clone(),
                passphrase: self.passphrase.clone(),
            },
            None => SigningPolicy::NodeUnlock {
                passphrase: self.passphrase.clone(),
            },
        }
    }

    pub fn connection(&self) -> Connection {
        Connection::new(self.geth_rpc_end_point.clone(), self.signing_policy())
            .with_gas(self.gas, self.gas_price)
    }
}

/// Quantities are written either as JSON numbers or as decimal / `0x` hex strings.
mod quantity {
    use std::str::FromStr;

    use alloy_primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<U256>,
    {
        Option::<Raw>::deserialize(deserializer)?
            .map(|raw| {
                let value = match raw {
                    Raw::Number(number) => U256::from(number),
                    Raw::Text(text) => U256::from_str(text.trim()).map_err(D::Error::custom)?,
                };
                T::try_from(value).map_err(|_| D::Error::custom(format!("{value} is out of range")))
            })
            .transpose()
    }
}
