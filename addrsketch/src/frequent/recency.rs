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

//! Bounded most-recent-first recency index over tracked addresses.
//!
//! An intrusive doubly-linked list over arena slots, with a hash index for
//! O(1) membership and removal. The head is the most recently touched
//! address, the tail the least.

use std::collections::HashMap;

const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: u32,
    /// Toward the head (more recent).
    prev: u32,
    /// Toward the tail (less recent).
    next: u32,
}

#[derive(Debug, Clone)]
pub(super) struct RecencyList {
    capacity: usize,
    entries: Vec<Entry>,
    free: Vec<u32>,
    head: u32,
    tail: u32,
    index: HashMap<u32, u32>,
}

impl RecencyList {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn contains(&self, key: u32) -> bool {
        self.index.contains_key(&key)
    }

    /// Moves `key` to the front if tracked, otherwise inserts it at the
    /// front. Returns the least-recently-used key if the insertion pushed
    /// the list over capacity.
    pub fn touch_or_admit(&mut self, key: u32) -> Option<u32> {
        if let Some(&slot) = self.index.get(&key) {
            self.unlink(slot);
            self.link_front(slot);
            return None;
        }
        let slot = self.alloc(key);
        self.link_front(slot);
        self.index.insert(key, slot);
        if self.len() > self.capacity {
            let tail = self.tail;
            let evicted = self.entries[tail as usize].key;
            self.unlink(tail);
            self.index.remove(&evicted);
            self.free.push(tail);
            return Some(evicted);
        }
        None
    }

    /// Removes `key` from the list. Returns whether it was tracked.
    pub fn remove(&mut self, key: u32) -> bool {
        match self.index.remove(&key) {
            Some(slot) => {
                self.unlink(slot);
                self.free.push(slot);
                true
            }
            None => false,
        }
    }

    /// Key at `offset` positions from the least-recently-used end, without
    /// mutating recency order. `None` past the end of the list.
    pub fn peek_from_tail(&self, offset: usize) -> Option<u32> {
        let mut cursor = self.tail;
        for _ in 0..offset {
            if cursor == NIL {
                return None;
            }
            cursor = self.entries[cursor as usize].prev;
        }
        if cursor == NIL {
            return None;
        }
        Some(self.entries[cursor as usize].key)
    }

    /// Iterates tracked keys from most to least recently used.
    pub fn iter(&self) -> RecencyIter<'_> {
        RecencyIter {
            list: self,
            cursor: self.head,
        }
    }

    fn alloc(&mut self, key: u32) -> u32 {
        let entry = Entry {
            key,
            prev: NIL,
            next: NIL,
        };
        if let Some(slot) = self.free.pop() {
            self.entries[slot as usize] = entry;
            slot
        } else {
            let slot = self.entries.len() as u32;
            self.entries.push(entry);
            slot
        }
    }

    fn link_front(&mut self, slot: u32) {
        let old_head = self.head;
        self.entries[slot as usize].prev = NIL;
        self.entries[slot as usize].next = old_head;
        if old_head != NIL {
            self.entries[old_head as usize].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }

    fn unlink(&mut self, slot: u32) {
        let Entry { prev, next, .. } = self.entries[slot as usize];
        if prev != NIL {
            self.entries[prev as usize].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.entries[next as usize].prev = prev;
        } else {
            self.tail = prev;
        }
        self.entries[slot as usize].prev = NIL;
        self.entries[slot as usize].next = NIL;
    }
}

pub(super) struct RecencyIter<'a> {
    list: &'a RecencyList,
    cursor: u32,
}

impl Iterator for RecencyIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let entry = &self.list.entries[self.cursor as usize];
        self.cursor = entry.next;
        Some(entry.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_orders_most_recent_first() {
        let mut list = RecencyList::new(4);
        for key in [1u32, 2, 3] {
            assert_eq!(list.touch_or_admit(key), None);
        }
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(list.len(), 3);
        assert!(!list.is_full());
    }

    #[test]
    fn touch_moves_to_front_without_eviction() {
        let mut list = RecencyList::new(2);
        list.touch_or_admit(1);
        list.touch_or_admit(2);
        assert!(list.is_full());
        assert_eq!(list.touch_or_admit(1), None);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn overflow_evicts_least_recently_used() {
        let mut list = RecencyList::new(2);
        list.touch_or_admit(1);
        list.touch_or_admit(2);
        assert_eq!(list.touch_or_admit(3), Some(1));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn peek_from_tail_walks_toward_head() {
        let mut list = RecencyList::new(4);
        for key in [10u32, 20, 30] {
            list.touch_or_admit(key);
        }
        assert_eq!(list.peek_from_tail(0), Some(10));
        assert_eq!(list.peek_from_tail(1), Some(20));
        assert_eq!(list.peek_from_tail(2), Some(30));
        assert_eq!(list.peek_from_tail(3), None);
        // Peeking never disturbs recency order.
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![30, 20, 10]);
    }

    #[test]
    fn remove_unlinks_and_reports_membership() {
        let mut list = RecencyList::new(4);
        for key in [1u32, 2, 3] {
            list.touch_or_admit(key);
        }
        assert!(list.remove(2));
        assert!(!list.remove(2));
        assert!(!list.contains(2));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(list.peek_from_tail(0), Some(1));
        assert_eq!(list.peek_from_tail(1), Some(3));
    }

    #[test]
    fn remove_head_and_tail_maintain_links() {
        let mut list = RecencyList::new(4);
        for key in [1u32, 2, 3] {
            list.touch_or_admit(key);
        }
        assert!(list.remove(3));
        assert!(list.remove(1));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![2]);
        list.touch_or_admit(4);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![4, 2]);
    }

    #[test]
    fn slots_are_reused_after_removal() {
        let mut list = RecencyList::new(3);
        for key in [1u32, 2, 3] {
            list.touch_or_admit(key);
        }
        list.remove(2);
        list.touch_or_admit(4);
        assert_eq!(list.entries.len(), 3);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![4, 3, 1]);
    }

    #[test]
    fn empty_list_peeks_nothing() {
        let list = RecencyList::new(1);
        assert_eq!(list.peek_from_tail(0), None);
        assert_eq!(list.iter().count(), 0);
    }
}
