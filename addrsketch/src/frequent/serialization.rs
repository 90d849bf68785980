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

//! Serialization constants and helpers for the frequent-address sketch.

/// Family ID for frequent-address sketches.
pub const FAMILY_ID: u8 = 21;
/// Serialization version.
pub const SER_VER: u8 = 1;

/// Preamble longs for an empty sketch.
pub const PREAMBLE_LONGS_EMPTY: u8 = 2;
/// Preamble longs for a non-empty sketch.
pub const PREAMBLE_LONGS_NONEMPTY: u8 = 3;

/// Empty flag mask.
pub const EMPTY_FLAG_MASK: u8 = 4;

/// Offset of preamble longs byte.
pub const PREAMBLE_LONGS_BYTE: usize = 0;
/// Offset of serialization version byte.
pub const SER_VER_BYTE: usize = 1;
/// Offset of family ID byte.
pub const FAMILY_BYTE: usize = 2;
/// Offset of flags byte.
pub const FLAGS_BYTE: usize = 3;
/// Offset of capacity int (high 32 bits of first pre-long).
pub const CAPACITY_INT: usize = 4;
/// Offset of exemption fraction bits (second pre-long).
pub const EXEMPTION_FRACTION_DOUBLE: usize = 8;
/// Offset of total observation count (third pre-long).
pub const TOTAL_OBSERVED_LONG: usize = 16;
/// Offset of trie node count int (low 32 bits of fourth long).
pub const NUM_NODES_INT: usize = 24;
/// Offset of tracked key count int (high 32 bits of fourth long).
pub const NUM_TRACKED_INT: usize = 28;
/// Offset of the preorder trie node stream.
pub const NODE_STREAM_OFFSET: usize = 32;

/// Bytes per serialized trie node record
/// (segment_len u8, segment u32, count u64, child mask u8).
pub const NODE_RECORD_BYTES: usize = 14;

/// Read a u32 value from bytes at the given offset (little-endian).
#[inline]
pub fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Read a u64 value from bytes at the given offset (little-endian).
#[inline]
pub fn read_u64_le(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
        bytes[offset + 4],
        bytes[offset + 5],
        bytes[offset + 6],
        bytes[offset + 7],
    ])
}

/// Write a u32 value to bytes at the given offset (little-endian).
#[inline]
pub fn write_u32_le(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Write a u64 value to bytes at the given offset (little-endian).
#[inline]
pub fn write_u64_le(bytes: &mut [u8], offset: usize, value: u64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
