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

//! Path-compressed binary trie over 32-bit address keys.
//!
//! Each node carries a multi-bit segment, so chains of single-child nodes
//! never exist at rest: inserting a diverging key splits a segment, and
//! deleting a leaf merges the parent with its sole surviving child. Nodes
//! live in a slot arena addressed by `u32` indices with free-list reuse,
//! which keeps parent back-references plain index rewrites.

use crate::error::Error;
use crate::frequent::serialization::NODE_RECORD_BYTES;
use crate::frequent::serialization::read_u32_le;
use crate::frequent::serialization::read_u64_le;

pub(super) const NIL: u32 = u32::MAX;
const ROOT: u32 = 0;
const KEY_BITS: u8 = 32;

#[derive(Debug, Clone, Copy)]
struct Node {
    parent: u32,
    children: [u32; 2],
    /// Bit string contributed along the root-to-node path; only the low
    /// `segment_len` bits are meaningful, most significant bit first.
    segment: u32,
    segment_len: u8,
    count: u64,
}

impl Node {
    fn new(parent: u32, segment: u32, segment_len: u8, count: u64) -> Self {
        Self {
            parent,
            children: [NIL, NIL],
            segment,
            segment_len,
            count,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children[0] == NIL && self.children[1] == NIL
    }
}

/// Path-compressed counting trie.
///
/// Invariants maintained across every mutation:
/// * the root is the only node with an empty segment and never absorbs;
/// * no non-root node has exactly one child at rest;
/// * every leaf sits at cumulative path length 32 (a full address).
#[derive(Debug, Clone)]
pub(super) struct PrefixTrie {
    nodes: Vec<Node>,
    free: Vec<u32>,
}

impl PrefixTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NIL, 0, 0, 0)],
            free: Vec::new(),
        }
    }

    /// Number of live nodes, root included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Records one occurrence of `key`, growing or splitting the trie as
    /// needed. Never fails.
    pub fn increment(&mut self, key: u32) {
        let mut cur = ROOT;
        let mut depth: u8 = 0;
        loop {
            if depth == KEY_BITS {
                self.nodes[cur as usize].count += 1;
                return;
            }
            let slot = bit(key, depth);
            let child = self.nodes[cur as usize].children[slot];
            if child == NIL {
                let len = KEY_BITS - depth;
                let leaf = self.alloc(Node::new(cur, low_bits(key, len), len, 1));
                self.nodes[cur as usize].children[slot] = leaf;
                return;
            }
            let child_len = self.nodes[child as usize].segment_len;
            let matched = self.matched_bits(child, key, depth);
            if matched == child_len {
                depth += child_len;
                cur = child;
                continue;
            }
            self.split(cur, slot, child, key, depth, matched);
            return;
        }
    }

    /// Returns the count stored at the node whose cumulative matched length
    /// is exactly `prefix_len` leading bits of `key` (32 = full address).
    ///
    /// A path that exists but lands inside a node's segment is absent.
    pub fn lookup(&self, key: u32, prefix_len: u8) -> Option<u64> {
        self.find_node(key, prefix_len)
            .map(|idx| self.nodes[idx as usize].count)
    }

    /// Count of the full-key node plus its immediate parent's count, an
    /// approximation of the traffic folded into the key's region. Used only
    /// for eviction-safety decisions.
    pub fn importance(&self, key: u32) -> Option<u64> {
        let idx = self.find_node(key, KEY_BITS)?;
        let node = &self.nodes[idx as usize];
        Some(node.count + self.nodes[node.parent as usize].count)
    }

    /// Sums the counts of the entire subtree rooted at the prefix node.
    pub fn aggregate(&self, key: u32, prefix_len: u8) -> Option<u64> {
        self.find_node(key, prefix_len)
            .map(|idx| self.subtree_count(idx))
    }

    /// Forgets `key`: removes its leaf and discards the leaf's count, then
    /// re-compresses by letting the (non-root) parent absorb its sole
    /// surviving child. A missing or non-leaf node is a no-op.
    pub fn delete(&mut self, key: u32) {
        let Some(idx) = self.find_node(key, KEY_BITS) else {
            return;
        };
        if !self.nodes[idx as usize].is_leaf() {
            return;
        }
        let parent = self.nodes[idx as usize].parent;
        let slot = if self.nodes[parent as usize].children[0] == idx {
            0
        } else {
            1
        };
        self.nodes[parent as usize].children[slot] = NIL;
        self.release(idx);
        if parent == ROOT {
            // Only the root may rest with a single child; absorbing into it
            // would give the root a segment that descents never match.
            return;
        }
        let survivor = self.nodes[parent as usize].children[slot ^ 1];
        assert!(
            survivor != NIL,
            "interior node held a single child before deletion"
        );
        self.absorb(parent, survivor);
    }

    /// Preorder walk over live nodes for reporting.
    pub fn entries(&self) -> Vec<TrieEntry> {
        let mut out = Vec::with_capacity(self.num_nodes());
        self.visit(ROOT, 0, 0, &mut out);
        out
    }

    fn find_node(&self, key: u32, prefix_len: u8) -> Option<u32> {
        debug_assert!(prefix_len <= KEY_BITS);
        let mut cur = ROOT;
        let mut depth: u8 = 0;
        while depth < prefix_len {
            let child = self.nodes[cur as usize].children[bit(key, depth)];
            if child == NIL {
                return None;
            }
            let child_len = self.nodes[child as usize].segment_len;
            if child_len > prefix_len - depth {
                // Would terminate inside the child's segment.
                return None;
            }
            if self.matched_bits(child, key, depth) != child_len {
                return None;
            }
            depth += child_len;
            cur = child;
        }
        Some(cur)
    }

    /// Length of the common prefix between `key` (starting `depth` bits in)
    /// and the segment of `child`. At least 1, because the child slot was
    /// selected by the first segment bit.
    fn matched_bits(&self, child: u32, key: u32, depth: u8) -> u8 {
        let node = &self.nodes[child as usize];
        let len = node.segment_len;
        let key_bits = (key >> (KEY_BITS - depth - len)) & mask(len);
        let diff = node.segment ^ key_bits;
        if diff == 0 {
            return len;
        }
        ((diff << (KEY_BITS - len)).leading_zeros() as u8).min(len)
    }

    /// Replaces `child` with a branch node carrying the matched head of its
    /// segment; `child` keeps the unmatched tail and a fresh leaf takes the
    /// diverging remainder of `key`.
    fn split(&mut self, parent: u32, slot: usize, child: u32, key: u32, depth: u8, matched: u8) {
        let child_seg = self.nodes[child as usize].segment;
        let child_len = self.nodes[child as usize].segment_len;
        debug_assert!(matched >= 1 && matched < child_len);

        let head = child_seg >> (child_len - matched);
        let branch = self.alloc(Node::new(parent, head, matched, 0));

        let tail_len = child_len - matched;
        let shortened = &mut self.nodes[child as usize];
        shortened.segment = low_bits(child_seg, tail_len);
        shortened.segment_len = tail_len;
        shortened.parent = branch;

        let leaf_len = KEY_BITS - depth - matched;
        let leaf = self.alloc(Node::new(branch, low_bits(key, leaf_len), leaf_len, 1));

        let leaf_slot = bit(key, depth + matched);
        self.nodes[branch as usize].children[leaf_slot] = leaf;
        self.nodes[branch as usize].children[leaf_slot ^ 1] = child;
        self.nodes[parent as usize].children[slot] = branch;
    }

    /// Merges `child` into `parent`: counts accumulate, grandchildren are
    /// re-parented and the segments concatenate, restoring the compression
    /// invariant after a deletion.
    fn absorb(&mut self, parent: u32, child: u32) {
        let absorbed = self.nodes[child as usize];
        let node = &mut self.nodes[parent as usize];
        debug_assert!(node.segment_len + absorbed.segment_len <= KEY_BITS);
        node.count += absorbed.count;
        node.segment = (node.segment << absorbed.segment_len) | absorbed.segment;
        node.segment_len += absorbed.segment_len;
        node.children = absorbed.children;
        for kid in absorbed.children {
            if kid != NIL {
                self.nodes[kid as usize].parent = parent;
            }
        }
        self.release(child);
    }

    fn subtree_count(&self, idx: u32) -> u64 {
        let node = &self.nodes[idx as usize];
        let mut total = node.count;
        for child in node.children {
            if child != NIL {
                total += self.subtree_count(child);
            }
        }
        total
    }

    fn visit(&self, idx: u32, mut address: u32, depth: u8, out: &mut Vec<TrieEntry>) -> u64 {
        let node = self.nodes[idx as usize];
        let depth = depth + node.segment_len;
        if node.segment_len > 0 {
            address |= node.segment << (KEY_BITS - depth);
        }
        let pos = out.len();
        out.push(TrieEntry {
            address,
            prefix_len: depth,
            count: node.count,
            subtree_count: 0,
        });
        let mut subtree = node.count;
        for child in node.children {
            if child != NIL {
                subtree += self.visit(child, address, depth, out);
            }
        }
        out[pos].subtree_count = subtree;
        subtree
    }

    fn alloc(&mut self, node: Node) -> u32 {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx as usize] = node;
            idx
        } else {
            let idx = self.nodes.len() as u32;
            self.nodes.push(node);
            idx
        }
    }

    fn release(&mut self, idx: u32) {
        debug_assert!(idx != ROOT);
        self.free.push(idx);
    }

    /// Appends the live nodes in preorder, 14 bytes per record.
    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        self.write_node(ROOT, out);
    }

    fn write_node(&self, idx: u32, out: &mut Vec<u8>) {
        let node = &self.nodes[idx as usize];
        out.push(node.segment_len);
        out.extend_from_slice(&node.segment.to_le_bytes());
        out.extend_from_slice(&node.count.to_le_bytes());
        let mut child_mask = 0u8;
        if node.children[0] != NIL {
            child_mask |= 1;
        }
        if node.children[1] != NIL {
            child_mask |= 2;
        }
        out.push(child_mask);
        for child in node.children {
            if child != NIL {
                self.write_node(child, out);
            }
        }
    }

    /// Rebuilds a trie from a preorder node stream, advancing `cursor` past
    /// the consumed bytes. Structural invariants are validated as records
    /// are read.
    pub fn deserialize(bytes: &[u8], cursor: &mut usize) -> Result<Self, Error> {
        let mut trie = Self::new();
        let (segment, segment_len, count, child_mask) = read_record(bytes, cursor)?;
        if segment_len != 0 || segment != 0 {
            return Err(Error::deserial("root node carries a segment"));
        }
        trie.nodes[ROOT as usize].count = count;
        for slot in 0..2usize {
            if child_mask & (1 << slot) != 0 {
                trie.read_subtree(bytes, cursor, ROOT, slot, 0)?;
            }
        }
        Ok(trie)
    }

    fn read_subtree(
        &mut self,
        bytes: &[u8],
        cursor: &mut usize,
        parent: u32,
        slot: usize,
        depth: u8,
    ) -> Result<(), Error> {
        let (segment, segment_len, count, child_mask) = read_record(bytes, cursor)?;
        if segment_len == 0 || depth + segment_len > KEY_BITS {
            return Err(Error::deserial("node segment length out of range"));
        }
        if segment != low_bits(segment, segment_len) {
            return Err(Error::deserial("node segment wider than its length"));
        }
        if (segment >> (segment_len - 1)) as usize & 1 != slot {
            return Err(Error::deserial("node segment disagrees with child slot"));
        }
        let depth = depth + segment_len;
        match child_mask {
            0 => {
                if depth != KEY_BITS {
                    return Err(Error::deserial("leaf node at partial depth"));
                }
            }
            3 => {
                if depth == KEY_BITS {
                    return Err(Error::deserial("full-depth node with children"));
                }
            }
            1 | 2 => return Err(Error::deserial("single-child node violates compression")),
            _ => return Err(Error::deserial("invalid child mask")),
        }
        let idx = self.alloc(Node::new(parent, segment, segment_len, count));
        self.nodes[parent as usize].children[slot] = idx;
        for slot in 0..2usize {
            if child_mask & (1 << slot) != 0 {
                self.read_subtree(bytes, cursor, idx, slot, depth)?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let mut live = 0usize;
        let mut stack = vec![(ROOT, 0u8)];
        while let Some((idx, depth)) = stack.pop() {
            live += 1;
            let node = &self.nodes[idx as usize];
            let depth = depth + node.segment_len;
            assert!(depth <= KEY_BITS);
            assert_eq!(node.segment, low_bits(node.segment, node.segment_len));
            if idx == ROOT {
                assert_eq!(node.segment_len, 0);
            } else {
                assert!(node.segment_len >= 1);
                let kids = node.children.iter().filter(|&&c| c != NIL).count();
                assert!(kids != 1, "non-root node with exactly one child");
            }
            if node.is_leaf() && idx != ROOT {
                assert_eq!(depth, KEY_BITS, "leaf at partial depth");
            }
            for (slot, &child) in node.children.iter().enumerate() {
                if child != NIL {
                    let seg = self.nodes[child as usize].segment;
                    let len = self.nodes[child as usize].segment_len;
                    assert_eq!((seg >> (len - 1)) as usize & 1, slot);
                    assert_eq!(self.nodes[child as usize].parent, idx);
                    stack.push((child, depth));
                }
            }
        }
        assert_eq!(live, self.num_nodes());
    }
}

/// One live trie node, addressed as a CIDR-style prefix.
#[derive(Debug, Clone, Copy)]
pub(super) struct TrieEntry {
    pub address: u32,
    pub prefix_len: u8,
    pub count: u64,
    pub subtree_count: u64,
}

#[inline]
fn bit(key: u32, depth: u8) -> usize {
    ((key >> (31 - depth)) & 1) as usize
}

#[inline]
fn mask(len: u8) -> u32 {
    if len == 32 { u32::MAX } else { (1 << len) - 1 }
}

#[inline]
fn low_bits(value: u32, len: u8) -> u32 {
    value & mask(len)
}

fn read_record(bytes: &[u8], cursor: &mut usize) -> Result<(u32, u8, u64, u8), Error> {
    if bytes.len() - *cursor < NODE_RECORD_BYTES {
        return Err(Error::insufficient_data("trie node record"));
    }
    let segment_len = bytes[*cursor];
    let segment = read_u32_le(bytes, *cursor + 1);
    let count = read_u64_le(bytes, *cursor + 5);
    let child_mask = bytes[*cursor + 13];
    *cursor += NODE_RECORD_BYTES;
    Ok((segment, segment_len, count, child_mask))
}
