//! Property tests for parsing invariants

use proptest::prelude::*;
use shapeguard::{
    boolean, float, int, object, string, union, PathSegment, Pointer, SchemaExt, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

proptest! {
    #[test]
    fn prop_valid_leaves_round_trip(s in ".*", i in any::<i64>(), b in any::<bool>(), f in -1e12f64..1e12) {
        prop_assert_eq!(string().parse(s.as_str()).unwrap(), Value::from(s.as_str()));
        prop_assert_eq!(int().parse(i).unwrap(), Value::Int(i));
        prop_assert_eq!(boolean().parse(b).unwrap(), Value::Bool(b));
        prop_assert_eq!(float().parse(f).unwrap(), Value::Float(f));
    }

    #[test]
    fn prop_pointer_identity_round_trips(s in "[a-z]{0,12}") {
        let cell = Pointer::new(s.as_str());
        match string().parse(Value::Pointer(cell.clone())).unwrap() {
            Value::Pointer(out) => prop_assert!(out.ptr_eq(&cell)),
            other => prop_assert!(false, "expected pointer, got {:?}", other),
        }
        prop_assert_eq!(cell.get(), Value::from(s.as_str()));
    }

    #[test]
    fn prop_modifiers_leave_receiver_unchanged(min in 0usize..8, input in "[a-z]{0,10}") {
        let base = string().min(min);
        let before = base.parse(input.as_str());
        let _derived = base.max(min).optional().default("x").refine(|_| false);
        prop_assert_eq!(base.parse(input.as_str()), before);
        prop_assert!(base.parse(Value::Nil).is_err());
    }

    #[test]
    fn prop_default_short_circuits(d in "[a-z]{1,8}") {
        let calls = Arc::new(AtomicUsize::new(0));
        let (t, r) = (calls.clone(), calls.clone());
        let schema = string()
            .default(d.as_str())
            .transform(move |v, _| { t.fetch_add(1, Ordering::SeqCst); Ok(v) })
            .refine(move |_| { r.fetch_add(1, Ordering::SeqCst); false });
        prop_assert_eq!(schema.parse(Value::Nil).unwrap(), Value::from(d.as_str()));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prop_prefault_is_validated(p in "[a-z]{0,8}", min in 0usize..8) {
        let schema = string().prefault(p.as_str()).min(min);
        prop_assert_eq!(schema.parse(Value::Nil).is_ok(), p.len() >= min);
    }

    #[test]
    fn prop_successful_union_has_no_issues(i in any::<i64>(), s in "[a-z]{1,6}") {
        let schema = union(vec![
            boolean().into_ref(),
            string().min(100).into_ref(),
            int().into_ref(),
            string().into_ref(),
        ]);
        prop_assert_eq!(schema.parse(i).unwrap(), Value::Int(i));
        prop_assert_eq!(schema.parse(s.as_str()).unwrap(), Value::from(s.as_str()));
    }

    #[test]
    fn prop_issue_paths_point_at_the_fault(keys in proptest::collection::vec("[a-z]{1,4}", 1..4)) {
        let mut schema = int().into_ref();
        for key in keys.iter().rev() {
            schema = object().field(key.as_str(), schema).into_ref();
        }
        let mut input = Value::from("bad");
        for key in keys.iter().rev() {
            let mut map = indexmap::IndexMap::new();
            map.insert(key.clone(), input);
            input = Value::Object(map);
        }

        let err = schema.parse(input).unwrap_err();
        let expected: Vec<PathSegment> = keys.iter().map(|k| PathSegment::from(k.as_str())).collect();
        prop_assert_eq!(err.issues.len(), 1);
        prop_assert_eq!(&err.issues[0].path, &expected);
    }
}
