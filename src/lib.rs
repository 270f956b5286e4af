//! # ipv4set
//!
//! Exact membership and deduplication over the full 32-bit IPv4 address space.
//!
//! Two backings implement the same [`MembershipSet`] contract:
//!
//! - [`DenseBitVectorSet`]: one bit per possible address, allocated up front
//!   (512 MiB regardless of how many addresses are inserted). Constant-time
//!   operations; the right choice for high fill ratios or full-space
//!   enumeration.
//! - [`BinaryTrieSet`]: a depth-32 binary trie that only allocates nodes for
//!   the prefixes actually inserted. Cheap for sparse inputs, impractical when
//!   the space saturates.
//!
//! ## Example
//!
//! ```rust
//! use ipv4set::{BinaryTrieSet, MembershipSet};
//!
//! let mut set = BinaryTrieSet::new();
//! set.insert("192.168.0.1").unwrap();
//! set.insert("192.168.0.1").unwrap();
//! set.insert("8.8.8.8").unwrap();
//!
//! assert_eq!(set.unique_count(), 2);
//! assert_eq!(set.search("8.8.8.8"), Ok(true));
//! assert_eq!(set.search("8.8.8.1"), Ok(false));
//! assert!(set.insert("256.0.0.1").is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod codec;
pub mod dense;
pub mod trie;

pub use codec::{format_address, parse_address, AddressKey, InvalidAddressFormat, ADDRESS_BITS};
pub use dense::DenseBitVectorSet;
pub use trie::BinaryTrieSet;

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use thiserror::Error;

/// Number of distinct IPv4 addresses (`2^32`).
pub const ADDRESS_SPACE: u64 = 1u64 << ADDRESS_BITS;

// =============================================================================
// Membership contract
// =============================================================================

/// An exact set of IPv4 addresses with a running count of distinct members.
///
/// Only [`insert_key`](Self::insert_key), [`search_key`](Self::search_key),
/// [`unique_count`](Self::unique_count) and
/// [`memory_usage`](Self::memory_usage) are required; the text entry points
/// parse with [`parse_address`] and forward to the raw-key operations.
pub trait MembershipSet {
    /// Insert a key. Returns `true` if it was not already present.
    ///
    /// Total over the whole `u32` domain.
    fn insert_key(&mut self, key: AddressKey) -> bool;

    /// Whether `key` has been inserted.
    fn search_key(&self, key: AddressKey) -> bool;

    /// Number of distinct keys inserted so far.
    fn unique_count(&self) -> u64;

    /// Bytes held by this instance's backing storage.
    fn memory_usage(&self) -> usize;

    /// Parse and insert a dotted-quad address.
    ///
    /// A malformed address is rejected before the set is touched.
    fn insert(&mut self, address: &str) -> Result<bool, InvalidAddressFormat> {
        let key = parse_address(address).inspect_err(|err| log::trace!("rejected insert: {err}"))?;
        Ok(self.insert_key(key))
    }

    /// Parse a dotted-quad address and test for membership.
    fn search(&self, address: &str) -> Result<bool, InvalidAddressFormat> {
        let key = parse_address(address).inspect_err(|err| log::trace!("rejected search: {err}"))?;
        Ok(self.search_key(key))
    }

    /// Insert every key in `range`, returning how many were newly added.
    ///
    /// `0..=u32::MAX` enumerates the whole address space.
    fn insert_range(&mut self, range: RangeInclusive<AddressKey>) -> u64 {
        range.map(|key| u64::from(self.insert_key(key))).sum()
    }

    /// Parse a batch of addresses and insert them all, or none of them.
    ///
    /// Returns how many were newly added.
    fn insert_all<'a, I>(&mut self, addresses: I) -> Result<u64, InvalidAddressFormat>
    where
        I: IntoIterator<Item = &'a str>,
        Self: Sized,
    {
        let keys = addresses
            .into_iter()
            .map(parse_address)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|err| log::debug!("rejected batch: {err}"))?;
        Ok(keys.into_iter().map(|key| u64::from(self.insert_key(key))).sum())
    }

    /// Whether nothing has been inserted.
    fn is_empty(&self) -> bool {
        self.unique_count() == 0
    }

    /// Fraction of the address space present in the set.
    fn fill_ratio(&self) -> f64 {
        self.unique_count() as f64 / ADDRESS_SPACE as f64
    }
}

impl<S: MembershipSet + ?Sized> MembershipSet for Box<S> {
    fn insert_key(&mut self, key: AddressKey) -> bool {
        (**self).insert_key(key)
    }

    fn search_key(&self, key: AddressKey) -> bool {
        (**self).search_key(key)
    }

    fn unique_count(&self) -> u64 {
        (**self).unique_count()
    }

    fn memory_usage(&self) -> usize {
        (**self).memory_usage()
    }

    fn insert_range(&mut self, range: RangeInclusive<AddressKey>) -> u64 {
        (**self).insert_range(range)
    }
}

// =============================================================================
// Backing selection
// =============================================================================

/// Which representation backs a [`MembershipSet`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Backing {
    /// [`DenseBitVectorSet`].
    #[default]
    Dense,
    /// [`BinaryTrieSet`].
    Trie,
}

/// A backing name that [`Backing::from_str`] does not recognise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown backing {0:?}: expected \"dense\" or \"trie\"")]
pub struct UnknownBacking(pub String);

impl FromStr for Backing {
    type Err = UnknownBacking;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dense" | "bitset" => Ok(Backing::Dense),
            "trie" => Ok(Backing::Trie),
            _ => Err(UnknownBacking(s.to_owned())),
        }
    }
}

impl fmt::Display for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backing::Dense => "dense",
            Backing::Trie => "trie",
        })
    }
}

/// Construct an empty set with the chosen backing.
pub fn new_set(backing: Backing) -> Box<dyn MembershipSet> {
    match backing {
        Backing::Dense => Box::new(DenseBitVectorSet::new()),
        Backing::Trie => Box::new(BinaryTrieSet::new()),
    }
}


#[cfg(test)]
mod proptests;
