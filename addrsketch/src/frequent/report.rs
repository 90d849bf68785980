// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Reporting rows over the sketch's trie contents.

use std::fmt;
use std::net::Ipv4Addr;

/// One reportable trie node: an address prefix with its occurrence counts.
///
/// `count` is the traffic attributed to the node itself (for a full address,
/// its exact tracked count; for a shared prefix, the traffic folded into it
/// by evictions). `subtree_count` additionally includes every more specific
/// prefix beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRow {
    address: Ipv4Addr,
    prefix_len: u8,
    count: u64,
    subtree_count: u64,
}

impl PrefixRow {
    pub(super) fn new(address: u32, prefix_len: u8, count: u64, subtree_count: u64) -> Self {
        Self {
            address: Ipv4Addr::from(address),
            prefix_len,
            count,
            subtree_count,
        }
    }

    /// Returns the prefix address.
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Returns the prefix length in bits (32 for a full address).
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns whether the row describes a full address rather than a
    /// shared prefix.
    pub fn is_full_address(&self) -> bool {
        self.prefix_len == 32
    }

    /// Returns the count attributed to this node itself.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the count summed over this node and its entire subtree.
    pub fn subtree_count(&self) -> u64 {
        self.subtree_count
    }
}

impl fmt::Display for PrefixRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_full_address() {
            write!(f, "{} {}", self.address, self.count)
        } else {
            write!(f, "{}/{} {}", self.address, self.prefix_len, self.count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_address_renders_without_length() {
        let row = PrefixRow::new(0x7f00_0001, 32, 5, 5);
        assert_eq!(row.to_string(), "127.0.0.1 5");
        assert!(row.is_full_address());
    }

    #[test]
    fn prefix_renders_with_length() {
        let row = PrefixRow::new(0x0a00_0000, 8, 3, 12);
        assert_eq!(row.to_string(), "10.0.0.0/8 3");
        assert_eq!(row.subtree_count(), 12);
        assert!(!row.is_full_address());
    }
}
