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

//! Bounded-memory frequency sketching for IPv4 address streams.
//!
//! The [`frequent`] module provides [`frequent::FrequentAddressSketch`], an
//! approximate per-address occurrence counter that holds state for at most a
//! fixed number of distinct addresses and preferentially retains heavy
//! hitters when that bound is reached.
//!
//! ```
//! use addrsketch::frequent::FrequentAddressSketch;
//!
//! let mut sketch = FrequentAddressSketch::default();
//! sketch.observe(0x7f00_0001);
//! sketch.observe(0x7f00_0001);
//! assert_eq!(sketch.query(0x7f00_0001), Some(2));
//! ```

pub mod error;
pub mod frequent;
