//! Condition evaluation through the public query API
//!
//! Every scenario runs twice: against an entity without indexes and
//! against one with indexes on simpleInt, simpleLong, simpleFloat and
//! simpleString. Both must produce identical results.

mod common;

use boxquery::StringOrder;
use common::{ids, Fixture, INDEXED_ENTITY, TEST_ENTITY};

fn both() -> [Fixture; 2] {
    [Fixture::new(TEST_ENTITY), Fixture::new(INDEXED_ENTITY)]
}

// =============================================================================
// Scalars
// =============================================================================

#[test]
fn test_scalar_equal() {
    for f in both() {
        f.put_scalars();
        let query = f.entities.query().equal(&f.props.int, 2007).build().unwrap();
        assert_eq!(query.count().unwrap(), 1);
        assert_eq!(query.find_first().unwrap().unwrap().id(), 8);
        assert_eq!(query.find_unique().unwrap().unwrap().id(), 8);
        assert_eq!(ids(&query.find().unwrap()), vec![8]);
    }
}

#[test]
fn test_no_conditions() {
    for f in both() {
        let entities = f.put_scalars();
        let query = f.entities.query().build().unwrap();
        assert_eq!(query.find().unwrap().len(), entities.len());
        assert_eq!(query.count().unwrap(), entities.len());
    }
}

#[test]
fn test_scalar_not_equal() {
    for f in both() {
        let entities = f.put_scalars();
        let query = f
            .entities
            .query()
            .not_equal(&f.props.int, 2007)
            .not_equal(&f.props.int, 2002)
            .build()
            .unwrap();
        assert_eq!(query.count().unwrap(), entities.len() - 2);
    }
}

#[test]
fn test_scalar_less_and_greater() {
    for f in both() {
        f.put_scalars();
        let query = f
            .entities
            .query()
            .greater(&f.props.int, 2003)
            .less(&f.props.short, 207)
            .build()
            .unwrap();
        assert_eq!(query.count().unwrap(), 3);
    }
}

#[test]
fn test_scalar_between() {
    for f in both() {
        f.put_scalars();
        let query = f.entities.query().between(&f.props.int, 2003, 2006).build().unwrap();
        assert_eq!(query.count().unwrap(), 4);

        let inverted = f.entities.query().between(&f.props.int, 2006, 2003).build().unwrap();
        assert_eq!(inverted.count().unwrap(), 0);
    }
}

#[test]
fn test_scalar_in() {
    for f in both() {
        f.put_scalars();
        let query = f
            .entities
            .query()
            .in_values(&f.props.int, &[1, 1, 2, 3, 2003, 2007, 2002, -1])
            .build()
            .unwrap();
        assert_eq!(query.count().unwrap(), 3);

        let query = f
            .entities
            .query()
            .in_values(&f.props.long, &[1i64, 1, 2, 3, 203, 207, 202, -1])
            .build()
            .unwrap();
        assert_eq!(query.count().unwrap(), 3);

        let empty: [i32; 0] = [];
        let query = f.entities.query().in_values(&f.props.int, &empty).build().unwrap();
        assert_eq!(query.count().unwrap(), 0);
    }
}

#[test]
fn test_offset_limit() {
    for f in both() {
        f.put_scalars();
        let query = f
            .entities
            .query()
            .greater(&f.props.int, 2002)
            .less(&f.props.short, 208)
            .build()
            .unwrap();
        assert_eq!(query.count().unwrap(), 5);
        assert_eq!(query.find_range(1, 0).unwrap().len(), 4);
        assert_eq!(query.find_range(4, 0).unwrap().len(), 1);
        assert_eq!(query.find_range(0, 2).unwrap().len(), 2);
        assert!(query.find_range(9, 0).unwrap().is_empty());

        let window = query.find_range(1, 2).unwrap();
        assert_eq!(f.ints_of(&window), vec![2004, 2005]);
    }
}

#[test]
fn test_float_less_and_greater() {
    for f in both() {
        f.put_scalars();
        let query = f
            .entities
            .query()
            .greater(&f.props.float, 20000.29f32)
            .less(&f.props.float, 20000.51f32)
            .build()
            .unwrap();
        assert_eq!(query.count().unwrap(), 3);

        // integer literal widened to the float domain
        let query = f.entities.query().less(&f.props.float, 20000).build().unwrap();
        assert_eq!(query.count().unwrap(), 0);
    }
}

#[test]
fn test_find_keys_unordered() {
    for f in both() {
        f.put_scalars();
        assert_eq!(f.entities.query().build().unwrap().find_keys_unordered().unwrap().len(), 10);

        let query = f.entities.query().greater(&f.props.int, 2006).build().unwrap();
        assert_eq!(query.find_keys_unordered().unwrap(), vec![8, 9, 10]);
    }
}

// =============================================================================
// Strings
// =============================================================================

#[test]
fn test_null_and_not_null() {
    for f in both() {
        let scalars = f.put_scalars();
        let strings = f.put_strings();
        let not_null = f.entities.query().not_null(&f.props.string).build().unwrap();
        let is_null = f.entities.query().is_null(&f.props.string).build().unwrap();
        assert_eq!(not_null.count().unwrap(), strings.len());
        assert_eq!(is_null.count().unwrap(), scalars.len());

        // null never satisfies a comparison, not even !=
        let ne = f.entities.query().not_equal(&f.props.string, "banana").build().unwrap();
        assert_eq!(ne.count().unwrap(), strings.len() - 1);
    }
}

#[test]
fn test_string_conditions() {
    for f in both() {
        let entities = f.put_strings();
        let count = entities.len();

        let banana = f.entities.query().equal(&f.props.string, "banana").build().unwrap();
        assert_eq!(banana.find_unique().unwrap().unwrap().id(), 1);

        let not_banana = f.entities.query().not_equal(&f.props.string, "banana").build().unwrap();
        assert_eq!(not_banana.count().unwrap(), count - 1);

        let shake = f
            .entities
            .query()
            .starts_with(&f.props.string, "ba")
            .ends_with(&f.props.string, "shake")
            .build()
            .unwrap();
        assert_eq!(shake.find_unique().unwrap().unwrap().id(), 4);

        let nana = f.entities.query().contains(&f.props.string, "nana").build().unwrap();
        assert_eq!(nana.count().unwrap(), 2);
    }
}

#[test]
fn test_equal_string_order() {
    for f in both() {
        f.put_strings();
        f.put(Some("BAR"), 100);

        let folded = f.entities.query().equal(&f.props.string, "bar").build().unwrap();
        assert_eq!(folded.count().unwrap(), 2);

        let exact = f
            .entities
            .query()
            .equal_str(&f.props.string, "bar", StringOrder::CaseSensitive)
            .build()
            .unwrap();
        assert_eq!(exact.count().unwrap(), 1);
    }
}

#[test]
fn test_string_in_and_range() {
    for f in both() {
        f.put_strings();
        f.put(Some("BAR"), 100);

        let folded = f
            .entities
            .query()
            .in_strings(&f.props.string, &["APPLE", "bar"], StringOrder::CaseInsensitive)
            .build()
            .unwrap();
        assert_eq!(folded.find_ids().unwrap(), vec![2, 3, 6]);

        let exact = f
            .entities
            .query()
            .in_strings(&f.props.string, &["APPLE", "bar"], StringOrder::CaseSensitive)
            .build()
            .unwrap();
        assert_eq!(exact.find_ids().unwrap(), vec![3]);

        let below = f
            .entities
            .query()
            .less_str(&f.props.string, "banana", StringOrder::CaseSensitive)
            .build()
            .unwrap();
        // "BAR" < "apple" in byte order
        assert_eq!(below.find_ids().unwrap(), vec![2, 6]);
    }
}

#[test]
fn test_big_result_list() {
    let f = Fixture::new(TEST_ENTITY);
    let mut entities: Vec<_> = (0..10_000).map(|nr| f.create(Some("schrodinger"), nr)).collect();
    f.entities.put_many(&mut entities).unwrap();

    let query = f.entities.query().equal(&f.props.string, "schrodinger").build().unwrap();
    assert_eq!(query.find().unwrap().len(), entities.len());
}

// =============================================================================
// Combinators
// =============================================================================

#[test]
fn test_or_combines_previous_condition() {
    for f in both() {
        f.put_scalars();
        let query = f
            .entities
            .query()
            .equal(&f.props.int, 2001)
            .or()
            .equal(&f.props.int, 2008)
            .build()
            .unwrap();
        assert_eq!(query.find_ids().unwrap(), vec![2, 9]);
    }
}

#[test]
fn test_or_then_and_groups_left_to_right() {
    for f in both() {
        f.put_scalars();
        // (int == 2001 OR int == 2008) AND short > 205
        let query = f
            .entities
            .query()
            .equal(&f.props.int, 2001)
            .or()
            .equal(&f.props.int, 2008)
            .and()
            .greater(&f.props.short, 205)
            .build()
            .unwrap();
        assert_eq!(query.find_ids().unwrap(), vec![9]);

        // short > 207 AND (implicit) (int == 2001 OR int == 2009)
        let query = f
            .entities
            .query()
            .greater(&f.props.short, 207)
            .equal(&f.props.int, 2001)
            .or()
            .equal(&f.props.int, 2009)
            .build()
            .unwrap();
        assert_eq!(query.find_ids().unwrap(), vec![10]);
    }
}

#[test]
fn test_explicit_and_matches_implicit() {
    let f = Fixture::new(INDEXED_ENTITY);
    f.put_scalars();
    let explicit = f
        .entities
        .query()
        .greater(&f.props.int, 2003)
        .and()
        .less(&f.props.short, 207)
        .build()
        .unwrap();
    assert_eq!(explicit.find_ids().unwrap(), vec![5, 6, 7]);
}

#[test]
fn test_string_order_on_not_equal_and_greater() {
    for f in both() {
        f.put_strings();
        f.put(Some("BAR"), 100);

        let folded = f.entities.query().not_equal(&f.props.string, "bar").build().unwrap();
        assert_eq!(folded.count().unwrap(), 4);
        let exact = f
            .entities
            .query()
            .not_equal_str(&f.props.string, "bar", StringOrder::CaseSensitive)
            .build()
            .unwrap();
        assert_eq!(exact.count().unwrap(), 5);

        let above = f
            .entities
            .query()
            .greater_str(&f.props.string, "banana", StringOrder::CaseSensitive)
            .build()
            .unwrap();
        assert_eq!(above.find_ids().unwrap(), vec![3, 4, 5]);
    }
}
