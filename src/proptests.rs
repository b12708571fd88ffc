use super::*;

use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    key: String,
    value: u32,
}

impl Keyed for Entry {
    fn key(&self) -> &str {
        &self.key
    }
}

fn validate_table<V: Keyed>(t: &ProbeTable<V>) {
    let mut live = 0usize;
    let mut dead = 0usize;
    for (_, slot) in t.slots() {
        match slot {
            Slot::Occupied(v) => {
                live += 1;
                assert!(t.contains(v.key()), "live entry must be reachable");
            }
            Slot::Tombstone => dead += 1,
            Slot::Empty => {}
        }
    }
    assert_eq!(live, t.len(), "live slot count must match len");
    assert_eq!(dead, t.tombstones(), "tombstone count must match");
    assert!(t.len() <= t.capacity() / 2, "load factor above one half");
    assert_eq!(next_prime(t.capacity()), t.capacity(), "capacity must be prime");
}

#[derive(Clone, Debug)]
enum Op {
    Insert(String, u32),
    Remove(String),
    Get(String),
    Rehash,
}

fn key_strategy() -> impl Strategy<Value = String> + Clone {
    // A small alphabet keeps collisions and repeated keys frequent.
    "[a-e@.]{0,6}"
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key.clone().prop_map(Op::Remove),
        24 => key.clone().prop_map(Op::Get),
        1 => Just(Op::Rehash),
    ];
    prop::collection::vec(op, 0..=1000)
}

const PEOPLE: usize = 6;
const CODES: [&str; PEOPLE] = ["ENFP", "ISTJ", "INTP", "ESFJ", "NA", "ENTJ"];

fn person(i: usize) -> PersonRecord {
    PersonRecord::new(format!("p{i}"), format!("Person {i}")).with_type_code(CODES[i])
}

#[derive(Clone, Debug)]
enum Action {
    Like(usize, usize, bool),
    Remove(usize),
    Register(usize),
}

fn actions_strategy() -> impl Strategy<Value = Vec<Action>> {
    let action = prop_oneof![
        16 => (0..PEOPLE, 0..PEOPLE, any::<bool>()).prop_map(|(s, d, r)| Action::Like(s, d, r)),
        2 => (0..PEOPLE).prop_map(Action::Remove),
        2 => (0..PEOPLE).prop_map(Action::Register),
    ];
    prop::collection::vec(action, 0..=200)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_first_write_wins(ops in ops_strategy()) {
        let mut t: ProbeTable<Entry> = ProbeTable::new();
        let mut m: HashMap<String, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let inserted = t.insert(Entry { key: key.clone(), value });
                    let fresh = !m.contains_key(&key);
                    if fresh {
                        m.insert(key, value);
                    }
                    prop_assert_eq!(inserted, fresh);
                    prop_assert!(t.len() <= t.capacity() / 2);
                }
                Op::Remove(key) => {
                    let got_t = t.remove(&key).map(|e| e.value);
                    let got_m = m.remove(&key);
                    prop_assert_eq!(got_t, got_m);
                }
                Op::Get(key) => {
                    let got_t = t.get(&key).map(|e| e.value);
                    let got_m = m.get(&key).copied();
                    prop_assert_eq!(got_t, got_m);
                }
                // Forced rebuilds double the capacity; stop before it gets large.
                Op::Rehash if t.capacity() > 1 << 12 => {}
                Op::Rehash => {
                    let before = t.capacity();
                    t.rehash();
                    prop_assert_eq!(t.capacity(), next_prime(2 * before));
                    prop_assert_eq!(t.tombstones(), 0);
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_table(&t);
        let mut got: Vec<(String, u32)> = t.iter().map(|e| (e.key.clone(), e.value)).collect();
        let mut expected: Vec<(String, u32)> = m.into_iter().collect();
        got.sort();
        expected.sort();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_reciprocity_is_symmetric(actions in actions_strategy()) {
        let mut t = PeopleTable::new();
        for i in 0..PEOPLE {
            t.insert(person(i));
        }

        for action in actions {
            match action {
                Action::Like(s, d, romantic) => {
                    let kind = if romantic { RelationKind::Romantic } else { RelationKind::Friend };
                    let (src, dst) = (format!("p{s}"), format!("p{d}"));
                    let expect_err = s == d || !t.contains(&src) || !t.contains(&dst);
                    let res = interact(&mut t, &src, &dst, kind);
                    prop_assert_eq!(res.is_err(), expect_err);
                }
                Action::Remove(i) => {
                    let id = format!("p{i}");
                    let present = t.contains(&id);
                    prop_assert_eq!(remove_person(&mut t, &id).is_some(), present);
                }
                Action::Register(i) => {
                    let present = t.contains(&format!("p{i}"));
                    prop_assert_eq!(t.insert(person(i)), !present);
                }
            }
        }

        for kind in [RelationKind::Romantic, RelationKind::Friend] {
            for p in t.iter() {
                for other in p.pending(kind) {
                    prop_assert!(t.contains(other), "pending link to removed {}", other);
                }
                for other in p.matched(kind) {
                    let q = t.get(other);
                    prop_assert!(q.is_some(), "matched link to removed {}", other);
                    let q = q.unwrap();
                    prop_assert!(q.matched(kind).contains(p.id()));
                    prop_assert!(!p.pending(kind).contains(other));
                    prop_assert!(!q.pending(kind).contains(p.id()));
                }
            }
        }
    }
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = ["a", "l", "w", "b", "m"];

    let mut base: ProbeTable<Entry> = ProbeTable::new();
    for (i, k) in keys.iter().enumerate() {
        assert!(base.insert(Entry { key: k.to_string(), value: i as u32 }));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut remaining: Vec<&str> = keys.to_vec();
        for k in perm {
            assert!(t.remove(k).is_some());
            remaining.retain(|r| *r != k);
            for r in &remaining {
                assert!(t.contains(r), "{r} lost after removing {k}");
            }
            validate_table(&t);
        }
        assert!(t.is_empty());
    });
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &mut Vec<T>, k: usize, f: &mut impl FnMut(Vec<T>)) {
        if k == items.len() {
            f(items.clone());
            return;
        }
        for i in k..items.len() {
            items.swap(k, i);
            rec(items, k + 1, f);
            items.swap(k, i);
        }
    }

    let mut items = items.to_vec();
    rec(&mut items, 0, &mut f);
}
