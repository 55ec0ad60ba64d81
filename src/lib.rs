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

pub mod error;
pub use error::{Error, Result};

/// Client configuration file
pub mod config;

/// Voting, swapper and ERC-20 contract access
pub mod contract;

/// Token swap client
pub mod swap;

/// Ad event tracking
pub mod track;

/// Utility functions
pub mod util;

/// Vote aggregation client
pub mod vote;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;
