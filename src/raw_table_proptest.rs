#![cfg(test)]

// Property tests for RawTable kept inside the crate so they can reach the
// core directly rather than through the set/table wrappers.

use crate::adapter::{bytes_equal, Bytes};
use crate::error::InsertError;
use crate::raw_table::{RawTable, MIN_CAPACITY};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Add(usize, i32),
    QuickAdd(usize, i32),
    Upsert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Grow,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Add(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::QuickAdd(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Upsert(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Find),
            prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            Just(OpI::Grow),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Runs one scenario against `sut`, checking it against a std HashMap model:
// - Duplicate adds are rejected and never change the stored value.
// - `find`/`contains` parity with the model for pool and random keys.
// - `remove` returns the owned pair and turns the slot into a tombstone.
// - `iter` yields each live key exactly once.
// - `len` parity, `len + tombstones <= capacity`, capacity floor and growth
//   never shrinking capacity, after every op.
fn check_scenario(
    mut sut: RawTable<Bytes<String>, i32>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut last_capacity = sut.capacity();

    for op in ops {
        match op {
            OpI::Add(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                match sut.add(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "add must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                    Err(e) => prop_assert!(false, "unexpected error {e}"),
                }
            }
            OpI::QuickAdd(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                let hash = sut.hash(k.as_bytes());
                let res = sut.quick_add(hash, k.clone(), v);
                prop_assert_eq!(res.is_ok(), !already);
                if res.is_ok() {
                    model.insert(k, v);
                }
            }
            OpI::Upsert(i, v) => {
                let k = pool[i].clone();
                let prev = sut.upsert(k.clone(), v).expect("upsert never exhausts");
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let tombstones = sut.tombstones();
                match sut.remove(k.as_bytes()) {
                    Some((kk, vv)) => {
                        prop_assert_eq!(&kk, k);
                        prop_assert_eq!(Some(vv), model.remove(k));
                        prop_assert_eq!(sut.tombstones(), tombstones + 1);
                    }
                    None => {
                        prop_assert!(!model.contains_key(k));
                        prop_assert_eq!(sut.tombstones(), tombstones);
                    }
                }
            }
            OpI::Find(i) => {
                let k = &pool[i];
                let found = sut.find(k.as_bytes()).map(|e| (e.key.clone(), *e.value));
                prop_assert_eq!(found, model.get(k).map(|v| (k.clone(), *v)));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains(s.as_bytes()), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k.as_bytes()), model.get_mut(k)) {
                    (Some(v), Some(mv)) => {
                        *v = v.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "get_mut parity"),
                }
            }
            OpI::Grow => {
                sut.grow().expect("small grow succeeds");
                prop_assert_eq!(sut.tombstones(), 0);
            }
            OpI::Iterate => {
                let keys: Vec<String> = sut.iter().map(|e| e.key.clone()).collect();
                let unique: BTreeSet<String> = keys.iter().cloned().collect();
                prop_assert_eq!(keys.len(), unique.len());
                let m_keys: BTreeSet<String> = model.keys().cloned().collect();
                prop_assert_eq!(unique, m_keys);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() + sut.tombstones() <= sut.capacity());
        prop_assert!(sut.capacity() >= MIN_CAPACITY);
        prop_assert!(sut.capacity() >= last_capacity, "capacity never shrinks");
        last_capacity = sut.capacity();
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_model_equivalence((pool, ops) in arb_scenario()) {
        let sut = RawTable::with_capacity(Bytes::new(), 0).unwrap();
        check_scenario(sut, &pool, ops)?;
    }

    // Same invariants with every key hashing identically, which stresses
    // equality probing, long chains and tombstones inside them.
    #[test]
    fn prop_model_equivalence_with_collisions((pool, ops) in arb_scenario()) {
        let adapter = Bytes::with_callables(|_| 0, bytes_equal);
        let sut = RawTable::with_capacity(adapter, 0).unwrap();
        check_scenario(sut, &pool, ops)?;
    }
}
