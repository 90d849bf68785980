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

use addrsketch::error::ErrorKind;
use addrsketch::frequent::FrequentAddressSketch;
use rand::prelude::*;

#[test]
fn test_empty_round_trip() {
    let sketch = FrequentAddressSketch::new(64, 0.25);
    let bytes = sketch.serialize();
    let restored = FrequentAddressSketch::deserialize(&bytes).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.capacity(), 64);
    assert_eq!(restored.exemption_fraction(), 0.25);
    assert_eq!(restored.num_tracked(), 0);
}

#[test]
fn test_populated_round_trip() {
    let mut sketch = FrequentAddressSketch::new(32, 1.0 / 32.0);
    for i in 1..=100u32 {
        for _ in 0..(i % 7 + 1) {
            sketch.observe(0x0a00_0000 | i);
        }
    }
    let bytes = sketch.serialize();
    let restored = FrequentAddressSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored.total_observed(), sketch.total_observed());
    assert_eq!(restored.num_tracked(), sketch.num_tracked());
    assert_eq!(restored.tracked_addresses(), sketch.tracked_addresses());
    for i in 1..=100u32 {
        let key = 0x0a00_0000 | i;
        assert_eq!(restored.query(key), sketch.query(key));
    }
}

#[test]
fn test_round_trip_preserves_folded_prefix_counts() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut sketch = FrequentAddressSketch::new(16, 1.0 / 8.0);
    for _ in 0..2_000 {
        sketch.observe(rng.random::<u32>() & 0x0000_00ff | 0xc0a8_0000);
    }
    let bytes = sketch.serialize();
    let restored = FrequentAddressSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored.total_observed(), sketch.total_observed());
    assert_eq!(restored.tracked_addresses(), sketch.tracked_addresses());
    for key in sketch.tracked_addresses() {
        assert_eq!(restored.query(key), sketch.query(key));
    }
    // Prefix-level state survives, including counts folded by evictions.
    for prefix_len in [0u8, 16, 24, 28, 32] {
        assert_eq!(
            restored.aggregate_prefix(0xc0a8_0000, prefix_len),
            sketch.aggregate_prefix(0xc0a8_0000, prefix_len)
        );
    }
}

#[test]
fn test_restored_sketch_keeps_counting() {
    let mut sketch = FrequentAddressSketch::new(8, 0.5);
    for _ in 0..5 {
        sketch.observe(0x0102_0304);
    }
    let bytes = sketch.serialize();
    let mut restored = FrequentAddressSketch::deserialize(&bytes).unwrap();
    restored.observe(0x0102_0304);
    restored.observe(0x0102_0305);
    assert_eq!(restored.query(0x0102_0304), Some(6));
    assert_eq!(restored.query(0x0102_0305), Some(1));
    assert_eq!(restored.total_observed(), 7);
}

#[test]
fn test_truncated_preamble_rejected() {
    let err = FrequentAddressSketch::deserialize(&[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.message().contains("insufficient data"));

    let sketch = FrequentAddressSketch::default();
    let bytes = sketch.serialize();
    let err = FrequentAddressSketch::deserialize(&bytes[..8]).unwrap_err();
    assert!(err.message().contains("insufficient data"));
}

#[test]
fn test_unsupported_serial_version_rejected() {
    let mut bytes = FrequentAddressSketch::default().serialize();
    bytes[1] = 99;
    let err = FrequentAddressSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.message().contains("unsupported serial version"));
}

#[test]
fn test_invalid_family_rejected() {
    let mut bytes = FrequentAddressSketch::default().serialize();
    bytes[2] = 0;
    let err = FrequentAddressSketch::deserialize(&bytes).unwrap_err();
    assert!(err.message().contains("invalid family id"));
}

#[test]
fn test_invalid_preamble_longs_rejected() {
    let mut bytes = FrequentAddressSketch::default().serialize();
    bytes[0] = 7;
    let err = FrequentAddressSketch::deserialize(&bytes).unwrap_err();
    assert!(err.message().contains("invalid preamble longs"));
}

#[test]
fn test_zero_capacity_bytes_rejected() {
    let mut bytes = FrequentAddressSketch::default().serialize();
    bytes[4..8].copy_from_slice(&0u32.to_le_bytes());
    let err = FrequentAddressSketch::deserialize(&bytes).unwrap_err();
    assert!(err.message().contains("capacity"));
}

#[test]
fn test_invalid_fraction_bytes_rejected() {
    let mut bytes = FrequentAddressSketch::default().serialize();
    bytes[8..16].copy_from_slice(&2.0f64.to_bits().to_le_bytes());
    let err = FrequentAddressSketch::deserialize(&bytes).unwrap_err();
    assert!(err.message().contains("exemption fraction"));
}

#[test]
fn test_truncated_node_stream_rejected() {
    let mut sketch = FrequentAddressSketch::default();
    sketch.observe(0x0a00_0001);
    sketch.observe(0x0a00_0002);
    let bytes = sketch.serialize();
    let err = FrequentAddressSketch::deserialize(&bytes[..bytes.len() - 20]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.message().contains("insufficient data"));
}

#[test]
fn test_truncated_tracked_keys_rejected() {
    let mut sketch = FrequentAddressSketch::default();
    sketch.observe(0x0a00_0001);
    let bytes = sketch.serialize();
    let err = FrequentAddressSketch::deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(err.message().contains("insufficient data"));
}

#[test]
fn test_tracked_key_must_resolve_in_trie() {
    let mut sketch = FrequentAddressSketch::default();
    sketch.observe(0x0a00_0001);
    let mut bytes = sketch.serialize();
    let len = bytes.len();
    bytes[len - 4..].copy_from_slice(&0xffff_ffffu32.to_le_bytes());
    let err = FrequentAddressSketch::deserialize(&bytes).unwrap_err();
    assert!(err.message().contains("tracked key missing from trie"));
}
