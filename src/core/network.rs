//! Network identifiers (EIP-155 chain ids)

use std::str::FromStr;

use crate::error::DappError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    Mainnet,
    Ropsten,
    #[default]
    Rinkeby,
    Goerli,
    Sepolia,
    Hardhat,
    Other(u64),
}

impl Network {
    pub fn from_chain_id(id: u64) -> Self {
        match id {
            1 => Network::Mainnet,
            3 => Network::Ropsten,
            4 => Network::Rinkeby,
            5 => Network::Goerli,
            11_155_111 => Network::Sepolia,
            31_337 => Network::Hardhat,
            other => Network::Other(other),
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Ropsten => 3,
            Network::Rinkeby => 4,
            Network::Goerli => 5,
            Network::Sepolia => 11_155_111,
            Network::Hardhat => 31_337,
            Network::Other(id) => *id,
        }
    }

    /// Human name, used in the wrong-network alert.
    pub fn name(&self) -> String {
        match self {
            Network::Mainnet => "Mainnet".into(),
            Network::Ropsten => "Ropsten".into(),
            Network::Rinkeby => "Rinkeby".into(),
            Network::Goerli => "Goerli".into(),
            Network::Sepolia => "Sepolia".into(),
            Network::Hardhat => "Hardhat".into(),
            Network::Other(id) => format!("chain {}", id),
        }
    }

    pub fn switch_prompt(&self) -> String {
        format!("Change the network to {}", self.name())
    }
}

/// Names (`rinkeby`, `hardhat`, ...) or decimal chain ids.
impl FromStr for Network {
    type Err = DappError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "ethereum" => Ok(Network::Mainnet),
            "ropsten" => Ok(Network::Ropsten),
            "rinkeby" => Ok(Network::Rinkeby),
            "goerli" => Ok(Network::Goerli),
            "sepolia" => Ok(Network::Sepolia),
            "hardhat" | "localhost" => Ok(Network::Hardhat),
            other => other
                .parse::<u64>()
                .map(Network::from_chain_id)
                .map_err(|_| DappError::Config(format!("unknown network '{}'", value))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids_round_trip_through_known_names() {
        for id in [1, 3, 4, 5, 11_155_111, 31_337, 42] {
            assert_eq!(Network::from_chain_id(id).chain_id(), id);
        }
        assert_eq!(Network::default().chain_id(), 4);
    }

    #[test]
    fn parses_names_and_numbers() {
        assert_eq!("Rinkeby".parse(), Ok(Network::Rinkeby));
        assert_eq!("31337".parse(), Ok(Network::Hardhat));
        assert_eq!(" 137 ".parse(), Ok(Network::Other(137)));
        assert!(matches!("nope".parse::<Network>(), Err(DappError::Config(msg)) if msg.contains("nope")));
    }

    #[test]
    fn switch_prompt_names_target() {
        assert_eq!(Network::Rinkeby.switch_prompt(), "Change the network to Rinkeby");
    }
}
