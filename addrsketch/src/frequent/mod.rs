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

//! Frequent-address sketch for summarizing high-volume address traffic.
//!
//! # Overview
//!
//! This sketch answers "how often has address K been observed" while holding
//! per-address state for at most `capacity` distinct 32-bit addresses. Two
//! structures cooperate:
//!
//! * a path-compressed binary trie storing an occurrence count per address
//!   and per shared prefix, and
//! * a bounded most-recent-first recency index over the tracked addresses.
//!
//! Every observation increments the trie. When the recency index is full and
//! a new address arrives, eviction candidates are scanned from the
//! least-recently-used end, and any candidate whose trie-derived importance
//! (its own count plus its immediate parent's count) exceeds
//! `exemption_fraction * total_observed` is exempt from reclamation. The
//! first non-exempt candidate is forgotten from both structures. If every
//! tracked address is exempt, the newcomer is dropped instead of displacing
//! a heavy hitter.
//!
//! # Accuracy
//!
//! While fewer than `capacity` distinct addresses have been observed, every
//! count returned by [`FrequentAddressSketch::query`] is exact. Once
//! eviction begins, counts for evicted addresses are deliberately lost;
//! counts for retained addresses remain exact for the span of their
//! residency. Eviction-time absorption folds sibling counts into coarser
//! prefix nodes, so prefix-level aggregates remain informative even after
//! individual addresses are forgotten.
//!
//! # Examples
//!
//! ```
//! # use addrsketch::frequent::FrequentAddressSketch;
//! let mut sketch = FrequentAddressSketch::new(64, 1.0 / 32.0);
//! for _ in 0..10 {
//!     sketch.observe(0xc0a8_0001);
//! }
//! sketch.observe(0xc0a8_0002);
//! assert_eq!(sketch.query(0xc0a8_0001), Some(10));
//! assert_eq!(sketch.query(0xc0a8_0002), Some(1));
//! ```
//!
//! # Serialization
//!
//! ```
//! # use addrsketch::frequent::FrequentAddressSketch;
//! let mut sketch = FrequentAddressSketch::default();
//! sketch.observe(0x0a00_0001);
//!
//! let bytes = sketch.serialize();
//! let decoded = FrequentAddressSketch::deserialize(&bytes).unwrap();
//! assert_eq!(decoded.query(0x0a00_0001), Some(1));
//! ```

mod recency;
mod report;
mod serialization;
mod sketch;
mod trie;

pub use self::report::PrefixRow;
pub use self::sketch::DEFAULT_CAPACITY;
pub use self::sketch::DEFAULT_EXEMPTION_FRACTION;
pub use self::sketch::FrequentAddressSketch;
