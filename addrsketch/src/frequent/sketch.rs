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

//! Frequent-address sketch implementation.

use std::net::Ipv4Addr;

use crate::error::Error;
use crate::frequent::recency::RecencyList;
use crate::frequent::report::PrefixRow;
use crate::frequent::serialization::*;
use crate::frequent::trie::PrefixTrie;

/// Default bound on tracked distinct addresses.
pub const DEFAULT_CAPACITY: usize = 256;
/// Default exemption fraction.
pub const DEFAULT_EXEMPTION_FRACTION: f64 = 1.0 / 32.0;

/// Bounded-memory approximate frequency counter for 32-bit addresses.
///
/// Tracks at most `capacity` distinct addresses. Every observation is
/// counted in a path-compressed trie; a recency index decides which
/// addresses remain tracked, and addresses whose trie-derived importance
/// exceeds `exemption_fraction` of total traffic are exempt from eviction.
///
/// See [`crate::frequent`] for an overview of the eviction policy and
/// accuracy characteristics.
#[derive(Debug, Clone)]
pub struct FrequentAddressSketch {
    capacity: usize,
    exemption_fraction: f64,
    total_observed: u64,
    trie: PrefixTrie,
    recency: RecencyList,
}

impl Default for FrequentAddressSketch {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_EXEMPTION_FRACTION)
    }
}

impl FrequentAddressSketch {
    /// Creates a sketch tracking at most `capacity` distinct addresses.
    ///
    /// A tracked address is exempt from eviction while its importance
    /// exceeds `exemption_fraction * total_observed`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `exemption_fraction` is outside
    /// `(0, 1]`.
    pub fn new(capacity: usize, exemption_fraction: f64) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        assert!(
            exemption_fraction.is_finite()
                && exemption_fraction > 0.0
                && exemption_fraction <= 1.0,
            "exemption_fraction must be in (0, 1]"
        );
        Self {
            capacity,
            exemption_fraction,
            total_observed: 0,
            trie: PrefixTrie::new(),
            recency: RecencyList::new(capacity),
        }
    }

    /// Returns true if nothing has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.total_observed == 0
    }

    /// Returns the total number of observations.
    pub fn total_observed(&self) -> u64 {
        self.total_observed
    }

    /// Returns the bound on tracked distinct addresses.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configured exemption fraction.
    pub fn exemption_fraction(&self) -> f64 {
        self.exemption_fraction
    }

    /// Returns the number of currently tracked addresses.
    pub fn num_tracked(&self) -> usize {
        self.recency.len()
    }

    /// Records one occurrence of `address`.
    pub fn observe(&mut self, address: u32) {
        self.total_observed += 1;
        self.trie.increment(address);

        if self.recency.contains(address) {
            // Pure recency touch; never evicts.
            let evicted = self.recency.touch_or_admit(address);
            debug_assert!(evicted.is_none());
            return;
        }
        if !self.recency.is_full() {
            self.admit(address);
            return;
        }
        match self.select_victim() {
            Some(victim) => {
                self.recency.remove(victim);
                self.trie.delete(victim);
                self.admit(address);
            }
            None => {
                // Every tracked address is exempt. Drop the newcomer rather
                // than sacrifice a heavy hitter; its fresh leaf is removed
                // so the trie stays bounded.
                self.trie.delete(address);
            }
        }
    }

    /// Records one occurrence of an [`Ipv4Addr`].
    pub fn observe_addr(&mut self, address: Ipv4Addr) {
        self.observe(u32::from(address));
    }

    /// Returns the current exact count for a full address, whether or not
    /// it is presently tracked, or `None` if the address has been forgotten
    /// (or never observed).
    pub fn query(&self, address: u32) -> Option<u64> {
        self.trie.lookup(address, 32)
    }

    /// [`Ipv4Addr`] form of [`FrequentAddressSketch::query`].
    pub fn query_addr(&self, address: Ipv4Addr) -> Option<u64> {
        self.query(u32::from(address))
    }

    /// Returns the count stored at the trie node matching exactly
    /// `prefix_len` leading bits of `address` (32 queries the full address).
    ///
    /// A prefix node exists only where observed addresses diverge, or where
    /// evictions folded counts into a shared prefix.
    ///
    /// # Panics
    ///
    /// Panics if `prefix_len` exceeds 32.
    pub fn query_prefix(&self, address: u32, prefix_len: u8) -> Option<u64> {
        assert!(prefix_len <= 32, "prefix_len must be at most 32");
        self.trie.lookup(address, prefix_len)
    }

    /// Returns the summed count of the prefix node and its entire subtree.
    ///
    /// # Panics
    ///
    /// Panics if `prefix_len` exceeds 32.
    pub fn aggregate_prefix(&self, address: u32, prefix_len: u8) -> Option<u64> {
        assert!(prefix_len <= 32, "prefix_len must be at most 32");
        self.trie.aggregate(address, prefix_len)
    }

    /// Returns the tracked addresses from most to least recently observed,
    /// without mutating recency order.
    pub fn tracked_addresses(&self) -> Vec<u32> {
        self.recency.iter().collect()
    }

    /// Returns the summed exact counts of all currently tracked addresses.
    pub fn tracked_weight(&self) -> u64 {
        self.recency
            .iter()
            .map(|key| {
                self.query(key)
                    .expect("tracked address missing from trie")
            })
            .sum()
    }

    /// Returns reporting rows for every trie node whose own count exceeds
    /// `min_share` of total observations, sorted by descending count.
    pub fn prefix_rows(&self, min_share: f64) -> Vec<PrefixRow> {
        let floor = min_share * self.total_observed as f64;
        let mut rows: Vec<PrefixRow> = self
            .trie
            .entries()
            .into_iter()
            .filter(|entry| entry.count > 0 && entry.count as f64 > floor)
            .map(|entry| {
                PrefixRow::new(
                    entry.address,
                    entry.prefix_len,
                    entry.count,
                    entry.subtree_count,
                )
            })
            .collect();
        rows.sort_by(|a, b| {
            b.count()
                .cmp(&a.count())
                .then_with(|| a.address().cmp(&b.address()))
        });
        rows
    }

    /// Serializes this sketch into a byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        if self.is_empty() {
            let mut out = vec![0u8; TOTAL_OBSERVED_LONG];
            out[PREAMBLE_LONGS_BYTE] = PREAMBLE_LONGS_EMPTY;
            out[SER_VER_BYTE] = SER_VER;
            out[FAMILY_BYTE] = FAMILY_ID;
            out[FLAGS_BYTE] = EMPTY_FLAG_MASK;
            write_u32_le(&mut out, CAPACITY_INT, self.capacity as u32);
            write_u64_le(
                &mut out,
                EXEMPTION_FRACTION_DOUBLE,
                self.exemption_fraction.to_bits(),
            );
            return out;
        }
        let mut out = vec![0u8; NODE_STREAM_OFFSET];
        out[PREAMBLE_LONGS_BYTE] = PREAMBLE_LONGS_NONEMPTY;
        out[SER_VER_BYTE] = SER_VER;
        out[FAMILY_BYTE] = FAMILY_ID;
        out[FLAGS_BYTE] = 0;
        write_u32_le(&mut out, CAPACITY_INT, self.capacity as u32);
        write_u64_le(
            &mut out,
            EXEMPTION_FRACTION_DOUBLE,
            self.exemption_fraction.to_bits(),
        );
        write_u64_le(&mut out, TOTAL_OBSERVED_LONG, self.total_observed);
        write_u32_le(&mut out, NUM_NODES_INT, self.trie.num_nodes() as u32);
        write_u32_le(&mut out, NUM_TRACKED_INT, self.recency.len() as u32);
        self.trie.serialize_into(&mut out);
        let mut tracked = self.tracked_addresses();
        tracked.reverse(); // least-recent first, so replayed admissions restore order
        for key in tracked {
            out.extend_from_slice(&key.to_le_bytes());
        }
        out
    }

    /// Deserializes a sketch from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < TOTAL_OBSERVED_LONG {
            return Err(Error::insufficient_data("preamble"));
        }
        let pre_longs = bytes[PREAMBLE_LONGS_BYTE];
        let ser_ver = bytes[SER_VER_BYTE];
        let family = bytes[FAMILY_BYTE];
        let flags = bytes[FLAGS_BYTE];
        if ser_ver != SER_VER {
            return Err(Error::unsupported_serial_version(SER_VER, ser_ver));
        }
        if family != FAMILY_ID {
            return Err(Error::invalid_family(
                FAMILY_ID,
                family,
                "FrequentAddressSketch",
            ));
        }
        let capacity = read_u32_le(bytes, CAPACITY_INT) as usize;
        let fraction = f64::from_bits(read_u64_le(bytes, EXEMPTION_FRACTION_DOUBLE));
        if capacity == 0 {
            return Err(Error::deserial("capacity must be at least 1"));
        }
        if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
            return Err(Error::deserial("exemption fraction outside (0, 1]"));
        }
        let is_empty = (flags & EMPTY_FLAG_MASK) != 0;
        if is_empty {
            if pre_longs != PREAMBLE_LONGS_EMPTY {
                return Err(Error::invalid_preamble_longs(PREAMBLE_LONGS_EMPTY, pre_longs));
            }
            return Ok(Self::new(capacity, fraction));
        }
        if pre_longs != PREAMBLE_LONGS_NONEMPTY {
            return Err(Error::invalid_preamble_longs(
                PREAMBLE_LONGS_NONEMPTY,
                pre_longs,
            ));
        }
        if bytes.len() < NODE_STREAM_OFFSET {
            return Err(Error::insufficient_data("full preamble"));
        }
        let total_observed = read_u64_le(bytes, TOTAL_OBSERVED_LONG);
        if total_observed == 0 {
            return Err(Error::deserial("non-empty sketch with zero observations"));
        }
        let num_nodes = read_u32_le(bytes, NUM_NODES_INT) as usize;
        let num_tracked = read_u32_le(bytes, NUM_TRACKED_INT) as usize;
        if num_tracked > capacity {
            return Err(Error::deserial("tracked key count exceeds capacity"));
        }

        let mut cursor = NODE_STREAM_OFFSET;
        let trie = PrefixTrie::deserialize(bytes, &mut cursor)?;
        if trie.num_nodes() != num_nodes {
            return Err(Error::deserial("trie node count mismatch"));
        }

        let keys_bytes = num_tracked
            .checked_mul(4)
            .ok_or_else(|| Error::deserial("tracked key size overflow"))?;
        if bytes.len() - cursor < keys_bytes {
            return Err(Error::insufficient_data("tracked keys"));
        }
        let mut recency = RecencyList::new(capacity);
        for i in 0..num_tracked {
            let key = read_u32_le(bytes, cursor + i * 4);
            if recency.contains(key) {
                return Err(Error::deserial("duplicate tracked key"));
            }
            if trie.lookup(key, 32).is_none() {
                return Err(Error::deserial("tracked key missing from trie"));
            }
            let evicted = recency.touch_or_admit(key);
            debug_assert!(evicted.is_none());
        }
        Ok(Self {
            capacity,
            exemption_fraction: fraction,
            total_observed,
            trie,
            recency,
        })
    }

    fn admit(&mut self, address: u32) {
        if let Some(evicted) = self.recency.touch_or_admit(address) {
            // Room was guaranteed before admission; an eviction here means
            // the index and coordinator disagree about occupancy.
            panic!("recency index unexpectedly evicted {evicted}");
        }
    }

    /// Scans eviction candidates from the least-recently-used end, skipping
    /// addresses whose importance exceeds the exemption threshold. `None`
    /// when every tracked address is exempt.
    fn select_victim(&self) -> Option<u32> {
        let threshold = self.exemption_fraction * self.total_observed as f64;
        let mut offset = 0;
        while let Some(candidate) = self.recency.peek_from_tail(offset) {
            let importance = self
                .trie
                .importance(candidate)
                .expect("tracked address missing from trie");
            if importance as f64 <= threshold {
                return Some(candidate);
            }
            offset += 1;
        }
        None
    }
}
