/* This file is part of Sovereign Seas
 *
 * Copyright (C) 2024-2026 Sovereign Seas developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use ethers::types::U256;

use crate::{Error, Result};

/// Basis points in one whole
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Slippage tolerance in basis points, validated to `0..=10000`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlippageBps(u32);

impl SlippageBps {
    pub fn new(bps: u32) -> Result<Self> {
        if bps > BPS_DENOMINATOR {
            return Err(Error::SlippageOutOfRange(bps))
        }
        Ok(Self(bps))
    }

    pub fn bps(self) -> u32 {
        self.0
    }

    /// Local mirror of the swapper's minimum-output formula,
    /// `expected * (10000 - bps) / 10000`. The client asks the contract
    /// for the authoritative value; this is for checking it.
    pub fn apply(self, expected: U256) -> U256 {
        let keep = U256::from(BPS_DENOMINATOR - self.0);
        let denominator = U256::from(BPS_DENOMINATOR);

        match expected.checked_mul(keep) {
            Some(scaled) => scaled / denominator,
            None => expected / denominator * keep,
        }
    }
}

impl From<SlippageBps> for U256 {
    fn from(slippage: SlippageBps) -> Self {
        U256::from(slippage.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_enforced() {
        assert!(SlippageBps::new(0).is_ok());
        assert!(SlippageBps::new(10_000).is_ok());
        assert!(matches!(SlippageBps::new(10_001), Err(Error::SlippageOutOfRange(10_001))));
    }

    #[test]
    fn minimum_output() {
        let expected = U256::from(1000);
        assert_eq!(SlippageBps::new(0).unwrap().apply(expected), expected);
        assert_eq!(SlippageBps::new(500).unwrap().apply(expected), U256::from(950));
        assert_eq!(SlippageBps::new(10_000).unwrap().apply(expected), U256::zero());

        // Rounds down like the contract's integer division
        assert_eq!(SlippageBps::new(1).unwrap().apply(U256::from(999)), U256::from(998));

        // No overflow near the top of the range
        let huge = U256::MAX;
        assert!(SlippageBps::new(500).unwrap().apply(huge) < huge);
    }
}
