/*!
 * Child Set Tests
 * Model-based checks of the tracked worker set
 */

use procwarden::{ChildSet, Pid};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(i32),
    Remove(i32),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    // Small pid range so removes and duplicate inserts actually hit
    prop_oneof![
        5 => (1..20i32).prop_map(Op::Insert),
        4 => (1..20i32).prop_map(Op::Remove),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn child_set_matches_ordered_model(ops in prop::collection::vec(op(), 0..64)) {
        let mut set = ChildSet::new();
        let mut model: Vec<i32> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(n) => {
                    let fresh = !model.contains(&n);
                    if fresh {
                        model.push(n);
                    }
                    prop_assert_eq!(set.insert(Pid::from_raw(n)), fresh);
                }
                Op::Remove(n) => {
                    let present = model.contains(&n);
                    model.retain(|&m| m != n);
                    prop_assert_eq!(set.remove(Pid::from_raw(n)), present);
                }
                Op::Clear => {
                    prop_assert_eq!(set.clear(), model.len());
                    model.clear();
                }
            }

            let tracked: Vec<i32> = set.iter().map(Pid::as_raw).collect();
            prop_assert_eq!(&tracked, &model);
            prop_assert_eq!(set.len(), model.len());
        }
    }
}

#[test]
fn test_pids_slice_matches_iteration() {
    let mut set = ChildSet::new();
    for n in [5, 3, 9] {
        set.insert(Pid::from_raw(n));
    }

    let collected: Vec<Pid> = set.iter().collect();
    assert_eq!(set.pids(), collected.as_slice());
    assert!(set.contains(Pid::from_raw(3)));
    assert!(!set.contains(Pid::from_raw(4)));
}
