use proptest::prelude::*;

use ntable::{
    broadcast_tables, count, sblank, tabularize, Coords, ElementError, Fill, Func, Label, NTable,
    Selector, Value,
};

fn in_bounds(t: &NTable) -> bool {
    let n = t.element_list().read().len();
    t.index().iter().all(|r| r < n)
}

fn keyed(labels: &[u8], start: i64) -> NTable {
    let coords = Coords::one("k", labels.iter().map(|&l| i64::from(l))).unwrap();
    NTable::from_vec(coords, (0..labels.len() as i64).map(|i| Value::Int(start + i)).collect()).unwrap()
}

fn unique(labels: Vec<u8>) -> Vec<u8> {
    let mut seen = Vec::new();
    for l in labels { if !seen.contains(&l) { seen.push(l); } }
    seen
}

proptest! {
    #[test]
    fn structural_operations_stay_in_bounds(
        shape in prop::collection::vec(1usize..4, 1..4),
        pick in 0i64..3,
    ) {
        let t = count(&sblank(&shape, None).unwrap()).unwrap();
        prop_assert!(in_bounds(&t));
        let picked = t.isel(&[Selector::One(pick % shape[0] as i64)]).unwrap();
        prop_assert!(in_bounds(&picked));
        let flipped = t.t().unwrap();
        prop_assert!(in_bounds(&flipped));
        let stacked = NTable::concat(&[t.clone(), flipped], "stack", Some(vec![Label::from("a"), Label::from("b")])).unwrap();
        prop_assert!(in_bounds(&stacked));
        prop_assert_eq!(stacked.len(), t.len() * 2);
    }

    #[test]
    fn broadcast_is_the_ordered_union(
        a in prop::collection::vec(0u8..8, 1..6).prop_map(unique),
        b in prop::collection::vec(0u8..8, 1..6).prop_map(unique),
    ) {
        let expected: Vec<Label> = unique(a.iter().chain(&b).copied().collect())
            .into_iter().map(|l| Label::from(i64::from(l))).collect();
        let out = broadcast_tables(&[keyed(&a, 0).into(), keyed(&b, 100).into()], Fill::Lite).unwrap();
        for (t, own, start) in [(&out[0], &a, 0), (&out[1], &b, 100)] {
            prop_assert_eq!(&t.dims()[0].labels, &expected);
            prop_assert!(in_bounds(t));
            for (label, value) in expected.iter().zip(t.values()) {
                match own.iter().position(|&l| Label::from(i64::from(l)) == *label) {
                    Some(i) => prop_assert_eq!(value, Value::Int(start + i as i64)),
                    None => prop_assert!(value.is_null()),
                }
            }
        }
    }

    #[test]
    fn plain_calls_are_unchanged(x in any::<i64>(), y in any::<i64>(), s in "[a-z]{0,8}") {
        let f = Func::new("mix", |args| {
            let sum = args[0].as_int().zip(args[1].as_int()).and_then(|(a, b)| a.checked_add(b))
                .ok_or_else(|| ElementError::value("overflow"))?;
            Ok(Value::tuple([Value::Int(sum), args[2].clone()]))
        });
        let args = [Value::Int(x), Value::Int(y), Value::from(s)];
        let direct = f.call(&args);
        let wrapped = tabularize(f).call(&args);
        match direct {
            Ok(v) => prop_assert_eq!(wrapped.unwrap(), v),
            Err(e) => prop_assert_eq!(wrapped.unwrap_err().to_string(), ntable::Error::from(e).to_string()),
        }
    }
}
