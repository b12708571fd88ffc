//! Open-addressing table with quadratic probing and lazy deletion.
//!
//! Keys are strings borrowed from the stored value through [`Keyed`]. The
//! table keeps a prime capacity and rebuilds itself into the next prime at
//! least twice as large once more than half of the slots are live.
//! Removal leaves a [`Slot::Tombstone`] so probe chains that pass through the
//! removed entry stay intact until the next rebuild.

use crate::person::PersonRecord;

/// Capacity of a table created with [`ProbeTable::new`].
pub const DEFAULT_CAPACITY: usize = 11;

/// Smallest capacity a table will be created with.
const MIN_CAPACITY: usize = 3;

/// Multiplier of the polynomial rolling hash.
const HASH_BASE: i32 = 27;

/// Values stored in a [`ProbeTable`] expose their own key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for PersonRecord {
    #[inline]
    fn key(&self) -> &str {
        self.id()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Slot<V> {
    Empty,
    /// Logically deleted; still part of every probe chain through it.
    Tombstone,
    Occupied(V),
}

impl<V> Slot<V> {
    #[inline]
    pub fn occupied(&self) -> Option<&V> {
        match self {
            Slot::Occupied(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// Hashing and probing
// =============================================================================

/// Home slot of `key`: base-27 rolling hash over UTF-16 code units with
/// 32-bit wrapping arithmetic, reduced into `0..capacity`.
pub fn home_slot(key: &str, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    let mut h: i32 = 0;
    for unit in key.encode_utf16() {
        h = h.wrapping_mul(HASH_BASE).wrapping_add(i32::from(unit));
    }
    i64::from(h).rem_euclid(capacity as i64) as usize
}

/// Quadratic probe positions `home + i²` generated with odd increments
/// `1, 3, 5, ...`.
#[derive(Clone, Debug)]
pub(crate) struct ProbeSeq {
    pos: usize,
    step: usize,
    capacity: usize,
}

impl ProbeSeq {
    pub(crate) fn new(home: usize, capacity: usize) -> Self {
        Self {
            pos: home,
            step: 1,
            capacity,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let cur = self.pos;
        self.pos = (self.pos + self.step) % self.capacity;
        self.step = (self.step + 2) % (2 * self.capacity);
        Some(cur)
    }
}

/// Smallest prime `>= n`, after first rounding `n` up to odd.
pub fn next_prime(mut n: usize) -> usize {
    if n % 2 == 0 {
        n += 1;
    }
    while !is_prime(n) {
        n += 2;
    }
    n
}

fn is_prime(n: usize) -> bool {
    if n == 2 || n == 3 {
        return true;
    }
    if n < 2 || n % 2 == 0 {
        return false;
    }
    let mut i = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

enum Probe {
    Found(usize),
    /// First reusable slot on the chain (tombstone or empty).
    Vacant(usize),
    Exhausted,
}

// =============================================================================
// Table
// =============================================================================

#[derive(Clone, Debug)]
pub struct ProbeTable<V> {
    slots: Vec<Slot<V>>,
    len: usize,
    tombstones: usize,
}

/// The person store.
pub type PeopleTable = ProbeTable<PersonRecord>;

impl<V: Keyed> ProbeTable<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a table whose capacity is the next prime `>= capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: empty_slots(next_prime(capacity.max(MIN_CAPACITY))),
            len: 0,
            tombstones: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    fn probe(&self, key: &str) -> Probe {
        let capacity = self.capacity();
        let mut first_free = None;
        for pos in ProbeSeq::new(home_slot(key, capacity), capacity).take(capacity) {
            match &self.slots[pos] {
                Slot::Empty => return Probe::Vacant(first_free.unwrap_or(pos)),
                Slot::Tombstone => {
                    first_free.get_or_insert(pos);
                }
                Slot::Occupied(v) if v.key() == key => return Probe::Found(pos),
                Slot::Occupied(_) => {}
            }
        }
        match first_free {
            Some(pos) => Probe::Vacant(pos),
            None => Probe::Exhausted,
        }
    }

    #[inline]
    fn position(&self, key: &str) -> Option<usize> {
        match self.probe(key) {
            Probe::Found(pos) => Some(pos),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let pos = self.position(key)?;
        self.slots[pos].occupied()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let pos = self.position(key)?;
        match &mut self.slots[pos] {
            Slot::Occupied(v) => Some(v),
            _ => None,
        }
    }

    /// Two distinct live entries borrowed mutably at once, in argument order.
    ///
    /// Returns `None` if either key is absent or both keys are the same.
    pub fn get_pair_mut(&mut self, a: &str, b: &str) -> Option<(&mut V, &mut V)> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        if i == j {
            return None;
        }
        let (lo, hi) = (i.min(j), i.max(j));
        let (left, right) = self.slots.split_at_mut(hi);
        match (&mut left[lo], &mut right[0]) {
            (Slot::Occupied(x), Slot::Occupied(y)) => {
                if i < j {
                    Some((x, y))
                } else {
                    Some((y, x))
                }
            }
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Inserts `value` unless its key is already live.
    ///
    /// The first write wins: a duplicate key is dropped and `false` is
    /// returned. Rebuilds the table when more than half the slots are live.
    pub fn insert(&mut self, value: V) -> bool {
        if !self.place(value) {
            return false;
        }
        if self.len > self.capacity() / 2 {
            self.rehash();
        }
        true
    }

    fn place(&mut self, value: V) -> bool {
        match self.probe(value.key()) {
            Probe::Found(_) => false,
            Probe::Vacant(pos) => {
                if matches!(self.slots[pos], Slot::Tombstone) {
                    self.tombstones -= 1;
                }
                self.slots[pos] = Slot::Occupied(value);
                self.len += 1;
                true
            }
            Probe::Exhausted => panic!(
                "probe sequence exhausted (len={}, tombstones={}, capacity={})",
                self.len,
                self.tombstones,
                self.capacity()
            ),
        }
    }

    /// Marks the entry for `key` as deleted and returns it.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let pos = self.position(key)?;
        let old = std::mem::replace(&mut self.slots[pos], Slot::Tombstone);
        self.len -= 1;
        self.tombstones += 1;
        match old {
            Slot::Occupied(v) => Some(v),
            _ => None,
        }
    }

    /// Rebuilds into capacity `next_prime(2 * capacity)`, dropping tombstones.
    ///
    /// Live entries are reinserted in old slot order.
    pub fn rehash(&mut self) {
        let old_capacity = self.capacity();
        let new_capacity = next_prime(2 * old_capacity);
        let old = std::mem::replace(&mut self.slots, empty_slots(new_capacity));
        let dropped = self.tombstones;
        self.len = 0;
        self.tombstones = 0;
        for slot in old {
            if let Slot::Occupied(v) = slot {
                self.place(v);
            }
        }
        tracing::debug!(
            old_capacity,
            new_capacity,
            len = self.len,
            dropped_tombstones = dropped,
            "rehashed table"
        );
    }

    /// Live entry at a slot index, if any.
    #[inline]
    pub fn occupied_at(&self, index: usize) -> Option<&V> {
        self.slots.get(index).and_then(Slot::occupied)
    }

    /// Every slot with its index, for dumps.
    pub fn slots(&self) -> impl Iterator<Item = (usize, &Slot<V>)> + '_ {
        self.slots.iter().enumerate()
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        self.slots.iter().filter_map(Slot::occupied)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Occupied(v) => Some(v),
            _ => None,
        })
    }
}

impl<V: Keyed> Default for ProbeTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_slots<V>(capacity: usize) -> Vec<Slot<V>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || Slot::Empty);
    slots
}
