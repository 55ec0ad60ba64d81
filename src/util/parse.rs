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

use std::str::FromStr;

use ethers::types::{Address, U256};

use crate::{Error, Result};

/// Split a decimal string into its integer and fractional digit runs,
/// rejecting anything that isn't `[0-9]*(.[0-9]*)?` with at least one digit.
fn split_decimal(amount: &str) -> Result<(&str, &str)> {
    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(Error::InvalidAmount(format!("\"{amount}\" has no digits")))
    }

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !is_digits(int_part) || !is_digits(frac_part) {
        return Err(Error::InvalidAmount(format!("\"{amount}\" is not a decimal number")))
    }

    Ok((int_part, frac_part))
}

/// Decode a human-readable decimal string into an integer amount with
/// `decimal_places` fractional digits. With `strict`, excess fractional
/// precision is an error, otherwise it is truncated.
pub fn decode_base10(amount: &str, decimal_places: usize, strict: bool) -> Result<U256> {
    let amount = amount.trim();
    let (int_part, frac_part) = split_decimal(amount)?;

    let frac_part = if frac_part.len() > decimal_places {
        if strict {
            return Err(Error::InvalidAmount(format!(
                "\"{amount}\" has more than {decimal_places} decimal places"
            )))
        }
        &frac_part[..decimal_places]
    } else {
        frac_part
    };

    let mut digits = String::with_capacity(int_part.len() + decimal_places);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    digits.extend(std::iter::repeat('0').take(decimal_places - frac_part.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero())
    }

    U256::from_dec_str(digits)
        .map_err(|_| Error::InvalidAmount(format!("\"{amount}\" overflows 256 bits")))
}

/// Encode an integer amount with `decimal_places` fractional digits into
/// a decimal string. Trailing fractional zeros are dropped.
pub fn encode_base10(amount: U256, decimal_places: usize) -> String {
    let mut s = amount.to_string();
    if decimal_places == 0 {
        return s
    }

    if s.len() <= decimal_places {
        s = format!("{}{s}", "0".repeat(decimal_places - s.len() + 1));
    }

    let (int_part, frac_part) = s.split_at(s.len() - decimal_places);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// Check that a human-readable amount is a well-formed, strictly positive
/// decimal number. Needs no token metadata, so it can run before any
/// network call.
pub fn check_positive_amount(amount: &str) -> Result<()> {
    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(Error::NonPositiveAmount)
    }

    let (int_part, frac_part) = split_decimal(amount)?;
    if int_part.chars().chain(frac_part.chars()).all(|c| c == '0') {
        return Err(Error::NonPositiveAmount)
    }

    Ok(())
}

/// Convert a human-readable, strictly positive amount into the token's
/// smallest unit using its resolved decimals.
pub fn parse_positive_amount(amount: &str, decimals: u8) -> Result<U256> {
    check_positive_amount(amount)?;
    let units = decode_base10(amount, decimals as usize, true)?;
    if units.is_zero() {
        return Err(Error::NonPositiveAmount)
    }
    Ok(units)
}

/// Parse a hex EVM address, with or without the `0x` prefix.
pub fn parse_address(address: &str) -> Result<Address> {
    let address = address.trim();
    let hex = address.strip_prefix("0x").unwrap_or(address);
    if hex.len() != 40 {
        return Err(Error::InvalidAddress(address.to_string()))
    }

    Address::from_str(hex).map_err(|_| Error::InvalidAddress(address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_amounts() {
        assert_eq!(decode_base10("1", 18, true).unwrap(), U256::exp10(18));
        assert_eq!(decode_base10("1.5", 6, true).unwrap(), U256::from(1_500_000));
        assert_eq!(decode_base10(".25", 2, true).unwrap(), U256::from(25));
        assert_eq!(decode_base10("0042.", 0, true).unwrap(), U256::from(42));
        assert_eq!(decode_base10("0.000", 3, true).unwrap(), U256::zero());

        assert!(decode_base10("1.2345", 2, true).is_err());
        assert_eq!(decode_base10("1.2345", 2, false).unwrap(), U256::from(123));

        assert!(decode_base10("", 18, true).is_err());
        assert!(decode_base10(".", 18, true).is_err());
        assert!(decode_base10("1e18", 18, true).is_err());
        assert!(decode_base10("-1", 18, true).is_err());
        assert!(decode_base10("1.2.3", 18, true).is_err());
    }

    #[test]
    fn encode_amounts() {
        assert_eq!(encode_base10(U256::exp10(18), 18), "1");
        assert_eq!(encode_base10(U256::from(1_500_000), 6), "1.5");
        assert_eq!(encode_base10(U256::from(5), 3), "0.005");
        assert_eq!(encode_base10(U256::zero(), 18), "0");
        assert_eq!(encode_base10(U256::from(1234), 0), "1234");
    }

    #[test]
    fn positive_amounts() {
        assert!(check_positive_amount("0.01").is_ok());
        assert!(matches!(check_positive_amount("0"), Err(Error::NonPositiveAmount)));
        assert!(matches!(check_positive_amount("0.000"), Err(Error::NonPositiveAmount)));
        assert!(matches!(check_positive_amount("-1"), Err(Error::NonPositiveAmount)));
        assert!(matches!(check_positive_amount("abc"), Err(Error::InvalidAmount(_))));

        assert_eq!(parse_positive_amount("2.5", 18).unwrap(), U256::from(25) * U256::exp10(17));
        assert!(parse_positive_amount("0.0000001", 6).is_err());
    }

    #[test]
    fn addresses() {
        let a = parse_address("0x765DE816845861e75A25fCA122bb6898B8B1282a").unwrap();
        let b = parse_address("765de816845861e75a25fca122bb6898b8b1282a").unwrap();
        assert_eq!(a, b);

        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("0xZZ5DE816845861e75A25fCA122bb6898B8B1282a").is_err());
    }
}
