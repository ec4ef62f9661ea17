use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::error::XpcError;
use crate::script::Destination;
use crate::types::{Amount, Height, Timestamp};

/// Which chain the node follows. Selects the phase length and start height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Test,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Main => write!(f, "main"),
            Network::Test => write!(f, "test"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Test),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// Consensus parameters the stake core reads.
///
/// Loaded from JSON by node tooling; `for_network` gives the built-in values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub network: Network,
    /// Mainnet activation height of phase-indexed staking. Ignored on testnet,
    /// which always starts at `TEST_PHASE_START_HEIGHT`.
    pub abpos_height: Height,
    /// Minimum coin age (seconds) before an output carries stake weight.
    pub stake_min_age: Timestamp,
    /// Coin age (seconds) at which stake weight stops growing.
    pub stake_max_age: Timestamp,
    /// Satoshis per whole coin.
    #[serde(default = "default_coin")]
    pub coin: Amount,
    pub pubkey_address_prefix: u8,
    pub script_address_prefix: u8,
    /// Segwit address prefix. Defaults per network when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bech32_hrp: Option<String>,
}

fn default_coin() -> Amount {
    COIN
}

impl ConsensusParams {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Test => Self::test(),
        }
    }

    pub fn main() -> Self {
        Self {
            network: Network::Main,
            abpos_height: MAIN_PHASE_START_HEIGHT,
            stake_min_age: DEFAULT_STAKE_MIN_AGE_SECS,
            stake_max_age: DEFAULT_STAKE_MAX_AGE_SECS,
            coin: COIN,
            pubkey_address_prefix: MAIN_PUBKEY_ADDRESS_PREFIX,
            script_address_prefix: MAIN_SCRIPT_ADDRESS_PREFIX,
            bech32_hrp: None,
        }
    }

    pub fn test() -> Self {
        Self {
            network: Network::Test,
            abpos_height: TEST_PHASE_START_HEIGHT,
            stake_min_age: TEST_STAKE_MIN_AGE_SECS,
            stake_max_age: DEFAULT_STAKE_MAX_AGE_SECS,
            coin: COIN,
            pubkey_address_prefix: TEST_PUBKEY_ADDRESS_PREFIX,
            script_address_prefix: TEST_SCRIPT_ADDRESS_PREFIX,
            bech32_hrp: None,
        }
    }

    /// Reject parameter sets the reward and probability math cannot run on.
    pub fn validate(&self) -> Result<(), XpcError> {
        if self.coin <= 0 {
            return Err(XpcError::InvalidParams("coin must be positive"));
        }
        if self.stake_min_age < 0 {
            return Err(XpcError::InvalidParams("stake_min_age must not be negative"));
        }
        if self.stake_max_age < self.stake_min_age {
            return Err(XpcError::InvalidParams(
                "stake_max_age must not be below stake_min_age",
            ));
        }
        if bech32::Hrp::parse(self.segwit_hrp()).is_err() {
            return Err(XpcError::InvalidParams("bech32_hrp is not a valid prefix"));
        }
        Ok(())
    }

    pub fn segwit_hrp(&self) -> &str {
        match (&self.bech32_hrp, self.network) {
            (Some(hrp), _) => hrp.as_str(),
            (None, Network::Main) => MAIN_BECH32_HRP,
            (None, Network::Test) => TEST_BECH32_HRP,
        }
    }

    /// Render a destination as an address on this network.
    pub fn encode_destination(&self, dest: &Destination) -> Option<String> {
        dest.to_address(
            self.pubkey_address_prefix,
            self.script_address_prefix,
            self.segwit_hrp(),
        )
    }

    pub fn is_mainnet(&self) -> bool {
        self.network == Network::Main
    }

    /// Blocks per reward phase.
    pub fn year_blocks(&self) -> u32 {
        match self.network {
            Network::Main => MAIN_YEAR_BLOCKS,
            Network::Test => TEST_YEAR_BLOCKS,
        }
    }

    /// Height after which the first reward phase begins.
    pub fn phase_start_height(&self) -> Height {
        match self.network {
            Network::Main => self.abpos_height,
            Network::Test => TEST_PHASE_START_HEIGHT,
        }
    }
}
