//! Result ordering: collation, direction, null placement and ties

mod common;

use boxquery::OrderFlags;
use common::{ids, Fixture, INDEXED_ENTITY, TEST_ENTITY};

fn owned(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_string)).collect()
}

#[test]
fn test_order_case_insensitive_ascending() {
    let f = Fixture::new(TEST_ENTITY);
    f.put_strings();
    f.put(Some("BAR"), 100);

    let result = f.entities.query().order(&f.props.string).build().unwrap().find().unwrap();
    assert_eq!(
        f.strings_of(&result),
        owned(&[
            Some("apple"),
            Some("banana"),
            Some("banana milk shake"),
            Some("bar"),
            Some("BAR"),
            Some("foo bar"),
        ])
    );
}

#[test]
fn test_order_desc_case_sensitive_nulls_last() {
    let f = Fixture::new(TEST_ENTITY);
    f.put(None, 1000);
    f.put(Some("BAR"), 100);
    f.put_strings();

    let flags = OrderFlags::CASE_SENSITIVE | OrderFlags::NULLS_LAST | OrderFlags::DESCENDING;
    let result = f
        .entities
        .query()
        .order_flags(&f.props.string, flags)
        .build()
        .unwrap()
        .find()
        .unwrap();
    assert_eq!(
        f.strings_of(&result),
        owned(&[
            Some("foo bar"),
            Some("bar"),
            Some("banana milk shake"),
            Some("banana"),
            Some("apple"),
            Some("BAR"),
            None,
        ])
    );
}

#[test]
fn test_nulls_first_by_default_in_both_directions() {
    let f = Fixture::new(TEST_ENTITY);
    f.put(Some("b"), 1);
    f.put(None, 2);
    f.put(Some("a"), 3);

    let asc = f.entities.query().order(&f.props.string).build().unwrap();
    assert_eq!(asc.find_ids().unwrap(), vec![2, 3, 1]);

    let desc = f
        .entities
        .query()
        .order_flags(&f.props.string, OrderFlags::DESCENDING)
        .build()
        .unwrap();
    assert_eq!(desc.find_ids().unwrap(), vec![2, 1, 3]);
}

#[test]
fn test_secondary_key_and_id_tie_break() {
    let f = Fixture::new(TEST_ENTITY);
    // equal strings, distinct ints in reverse insertion order
    for nr in [5, 3, 9] {
        f.put(Some("same"), nr);
    }
    f.put(Some("same"), 3);

    let by_string = f.entities.query().order(&f.props.string).build().unwrap();
    assert_eq!(by_string.find_ids().unwrap(), vec![1, 2, 3, 4]);

    let by_string_then_int = f
        .entities
        .query()
        .order(&f.props.string)
        .order_flags(&f.props.int, OrderFlags::DESCENDING)
        .build()
        .unwrap();
    assert_eq!(by_string_then_int.find_ids().unwrap(), vec![3, 1, 2, 4]);
}

#[test]
fn test_order_with_window_and_index() {
    let f = Fixture::new(INDEXED_ENTITY);
    f.put_scalars();

    let query = f
        .entities
        .query()
        .greater(&f.props.int, 2002)
        .order_flags(&f.props.float, OrderFlags::DESCENDING)
        .build()
        .unwrap();
    let page = query.find_range(1, 3).unwrap();
    assert_eq!(f.ints_of(&page), vec![2008, 2007, 2006]);

    // unordered keys ignore the order
    assert_eq!(query.find_keys_unordered().unwrap(), vec![4, 5, 6, 7, 8, 9, 10]);
}

#[test]
fn test_for_each_streams_in_order_and_stops() {
    let f = Fixture::new(TEST_ENTITY);
    f.put_scalars();

    let query = f
        .entities
        .query()
        .order_flags(&f.props.int, OrderFlags::DESCENDING)
        .build()
        .unwrap();
    let mut seen = Vec::new();
    query
        .for_each(|entity| {
            seen.push(entity.id());
            seen.len() < 3
        })
        .unwrap();
    assert_eq!(seen, vec![10, 9, 8]);

    let all = query.find().unwrap();
    assert_eq!(ids(&all), (1..=10).rev().collect::<Vec<_>>());
}
