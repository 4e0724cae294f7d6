use serde::{Deserialize, Serialize};

/// Marker height for a fork that never activates.
pub const NOT_ACTIVATED: u64 = u64::MAX;

/// Protocol upgrades, in activation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fork {
    Homestead,
    Eip150,
    /// Replay-protected signatures (chain id in the signing preimage).
    Eip155,
    Eip158,
    Byzantium,
    Constantinople,
}

impl Fork {
    pub const ALL: [Fork; 6] = [
        Fork::Homestead,
        Fork::Eip150,
        Fork::Eip155,
        Fork::Eip158,
        Fork::Byzantium,
        Fork::Constantinople,
    ];
}

/// Hardfork activation heights for a given network.
/// A value of `u64::MAX` means "not yet activated".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivationHeights {
    pub homestead: u64,
    pub eip150: u64,
    pub eip155: u64,
    pub eip158: u64,
    pub byzantium: u64,
    pub constantinople: u64,
}

impl Default for ActivationHeights {
    fn default() -> Self {
        Self {
            homestead: NOT_ACTIVATED,
            eip150: NOT_ACTIVATED,
            eip155: NOT_ACTIVATED,
            eip158: NOT_ACTIVATED,
            byzantium: NOT_ACTIVATED,
            constantinople: NOT_ACTIVATED,
        }
    }
}

impl ActivationHeights {
    pub fn mainnet() -> Self {
        Self {
            homestead: 1_150_000,
            eip150: 2_463_000,
            eip155: 2_675_000,
            eip158: 2_675_000,
            byzantium: 4_370_000,
            constantinople: 7_280_000,
        }
    }

    pub fn ropsten() -> Self {
        Self {
            homestead: 0,
            eip150: 0,
            eip155: 10,
            eip158: 10,
            byzantium: 1_700_000,
            constantinople: 4_230_000,
        }
    }

    /// Every fork up to and including `last` active from genesis, the rest never.
    pub fn from_genesis_through(last: Option<Fork>) -> Self {
        let mut heights = Self::default();
        if let Some(last) = last {
            for fork in Fork::ALL {
                heights.set(fork, 0);
                if fork == last {
                    break;
                }
            }
        }
        heights
    }

    pub fn get(&self, fork: Fork) -> u64 {
        match fork {
            Fork::Homestead => self.homestead,
            Fork::Eip150 => self.eip150,
            Fork::Eip155 => self.eip155,
            Fork::Eip158 => self.eip158,
            Fork::Byzantium => self.byzantium,
            Fork::Constantinople => self.constantinople,
        }
    }

    fn set(&mut self, fork: Fork, height: u64) {
        let slot = match fork {
            Fork::Homestead => &mut self.homestead,
            Fork::Eip150 => &mut self.eip150,
            Fork::Eip155 => &mut self.eip155,
            Fork::Eip158 => &mut self.eip158,
            Fork::Byzantium => &mut self.byzantium,
            Fork::Constantinople => &mut self.constantinople,
        };
        *slot = height;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    #[serde(default)]
    pub activation_heights: ActivationHeights,
}

impl ChainConfig {
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            activation_heights: ActivationHeights::mainnet(),
        }
    }

    pub fn ropsten() -> Self {
        Self {
            chain_id: 3,
            activation_heights: ActivationHeights::ropsten(),
        }
    }

    /// Chain id 1 with no fork ever activated.
    pub fn frontier() -> Self {
        Self {
            chain_id: 1,
            activation_heights: ActivationHeights::default(),
        }
    }

    /// Rule set used by the transaction test suites: chain id 1, with every
    /// fork up to the named one active from genesis.
    pub fn for_fork(name: &str) -> Option<Self> {
        let last = match name {
            "Frontier" => None,
            "Homestead" => Some(Fork::Homestead),
            "EIP150" => Some(Fork::Eip150),
            "EIP158" => Some(Fork::Eip158),
            "Byzantium" => Some(Fork::Byzantium),
            "Constantinople" => Some(Fork::Constantinople),
            _ => return None,
        };
        Some(Self {
            chain_id: 1,
            activation_heights: ActivationHeights::from_genesis_through(last),
        })
    }

    /// Looks up a network preset by name.
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "mainnet" => Some(Self::mainnet()),
            "ropsten" => Some(Self::ropsten()),
            "frontier" => Some(Self::frontier()),
            _ => None,
        }
    }

    pub fn activation_height(&self, fork: Fork) -> u64 {
        self.activation_heights.get(fork)
    }

    /// `NOT_ACTIVATED` is never reached, not even at height `u64::MAX`.
    pub fn is_active(&self, fork: Fork, block_number: u64) -> bool {
        let height = self.activation_height(fork);
        height != NOT_ACTIVATED && block_number >= height
    }
}
