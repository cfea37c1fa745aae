use anyhow::{Context, Result};
use serde::Deserialize;
use soroban_tx_core::{Network, NetworkConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    network: Option<String>,
    rpc_url: Option<String>,
}

/// Where each network setting may come from, highest priority first
#[derive(Debug, Default)]
pub struct Sources {
    pub flag_network: Option<String>,
    pub flag_rpc_url: Option<String>,
    pub env_network: Option<String>,
    pub env_rpc_url: Option<String>,
    pub env_passphrase: Option<String>,
    pub config_file: Option<PathBuf>,
}

impl Sources {
    pub fn from_cli(network: Option<String>, rpc_url: Option<String>) -> Self {
        Sources {
            flag_network: network,
            flag_rpc_url: rpc_url,
            env_network: env::var("STELLAR_NETWORK").ok(),
            env_rpc_url: env::var("STELLAR_RPC_URL").ok(),
            env_passphrase: env::var("STELLAR_NETWORK_PASSPHRASE").ok(),
            config_file: config_file_path(),
        }
    }
}

pub fn resolve_network(sources: Sources) -> Result<NetworkConfig> {
    let file = match &sources.config_file {
        Some(path) if path.exists() => read_config_file(path)?,
        _ => ConfigFile::default(),
    };

    // 1. CLI flag, 2. environment, 3. config file, 4. testnet
    let network_from_flag = sources.flag_network.is_some();
    let network = match sources
        .flag_network
        .or(sources.env_network)
        .or(file.network)
    {
        Some(net_str) => net_str.parse::<Network>()?,
        None => Network::Testnet,
    };

    let mut config = NetworkConfig::for_network(network);
    if let Some(url) = sources.flag_rpc_url.or(sources.env_rpc_url).or(file.rpc_url) {
        config.rpc_url = url;
    }

    // An explicit --network keeps its own passphrase
    match sources.env_passphrase {
        Some(passphrase) if network_from_flag && passphrase != network.passphrase() => {
            warn!(
                network = %network,
                "Ignoring STELLAR_NETWORK_PASSPHRASE, it does not match the --network flag"
            );
        }
        Some(passphrase) => config.passphrase = passphrase,
        None => {}
    }

    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;

    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".soroban-tx.toml");
        p
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_tx_core::{
        FUTURENET_RPC, MAINNET_PASSPHRASE, MAINNET_RPC, TESTNET_PASSPHRASE, TESTNET_RPC,
    };
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_defaults_to_testnet() {
        let config = resolve_network(Sources::default()).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.rpc_url, TESTNET_RPC);
    }

    #[test]
    fn test_flag_beats_env_and_file() {
        let file = config_file("network = \"futurenet\"\n");
        let config = resolve_network(Sources {
            flag_network: Some("mainnet".into()),
            env_network: Some("testnet".into()),
            config_file: Some(file.path().to_path_buf()),
            ..Sources::default()
        })
        .unwrap();

        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.passphrase, MAINNET_PASSPHRASE);
    }

    #[test]
    fn test_config_file_network_and_url() {
        let file = config_file("network = \"futurenet\"\nrpc_url = \"http://localhost:8000/rpc\"\n");
        let config = resolve_network(Sources {
            config_file: Some(file.path().to_path_buf()),
            ..Sources::default()
        })
        .unwrap();

        assert_eq!(config.network, Network::Futurenet);
        assert_eq!(config.rpc_url, "http://localhost:8000/rpc");
    }

    #[test]
    fn test_env_network_beats_file() {
        let file = config_file("network = \"mainnet\"\n");
        let config = resolve_network(Sources {
            env_network: Some("futurenet".into()),
            config_file: Some(file.path().to_path_buf()),
            ..Sources::default()
        })
        .unwrap();

        assert_eq!(config.network, Network::Futurenet);
        assert_eq!(config.rpc_url, FUTURENET_RPC);
    }

    #[test]
    fn test_flag_network_keeps_its_passphrase() {
        let config = resolve_network(Sources {
            flag_network: Some("mainnet".into()),
            env_network: Some("testnet".into()),
            env_passphrase: Some(TESTNET_PASSPHRASE.into()),
            ..Sources::default()
        })
        .unwrap();

        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.rpc_url, MAINNET_RPC);
        assert_eq!(config.passphrase, MAINNET_PASSPHRASE);
    }

    #[test]
    fn test_env_passphrase_applies_without_flag() {
        let config = resolve_network(Sources {
            env_network: Some("testnet".into()),
            env_passphrase: Some("Standalone Network ; February 2017".into()),
            ..Sources::default()
        })
        .unwrap();

        assert_eq!(config.passphrase, "Standalone Network ; February 2017");
    }

    #[test]
    fn test_invalid_rpc_url_is_error() {
        let result = resolve_network(Sources {
            flag_rpc_url: Some("localhost:8000".into()),
            ..Sources::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file_is_ignored() {
        let config = resolve_network(Sources {
            config_file: Some(PathBuf::from("/nonexistent/.soroban-tx.toml")),
            ..Sources::default()
        })
        .unwrap();
        assert_eq!(config.network, Network::Testnet);
    }

    #[test]
    fn test_invalid_network_is_error() {
        let result = resolve_network(Sources {
            flag_network: Some("devnet".into()),
            ..Sources::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_config_file() {
        let file = config_file("network = [");
        let result = resolve_network(Sources {
            config_file: Some(file.path().to_path_buf()),
            ..Sources::default()
        });
        assert!(result.is_err());
    }
}
