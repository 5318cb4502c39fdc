//! Aggregates over query matches

mod common;

use common::{Fixture, INDEXED_ENTITY, TEST_ENTITY};

fn assert_close(actual: f64, expected: f64, delta: f64) {
    assert!(
        (actual - expected).abs() <= delta,
        "expected {} within {}, got {}",
        expected,
        delta,
        actual
    );
}

#[test]
fn test_aggregates() {
    for entity in [TEST_ENTITY, INDEXED_ENTITY] {
        let f = Fixture::new(entity);
        f.put_scalars();
        let query = f.entities.query().less(&f.props.int, 2002).build().unwrap();

        assert_close(query.avg(&f.props.int).unwrap(), 2000.5, 0.0001);
        assert_eq!(query.min(&f.props.int).unwrap(), 2000);
        assert_eq!(query.max(&f.props.int).unwrap(), 2001);
        assert_eq!(query.sum(&f.props.int).unwrap(), 4001);
        assert_close(query.min_double(&f.props.float).unwrap(), 20000.0, 0.001);
        assert_close(query.max_double(&f.props.float).unwrap(), 20000.1, 0.001);
        assert_close(query.sum_double(&f.props.float).unwrap(), 40000.1, 0.001);
    }
}

#[test]
fn test_aggregates_over_empty_result() {
    let f = Fixture::new(TEST_ENTITY);
    f.put_scalars();
    let query = f.entities.query().greater(&f.props.int, 9999).build().unwrap();

    assert_eq!(query.min(&f.props.long).unwrap(), 0);
    assert_eq!(query.max(&f.props.long).unwrap(), 0);
    assert_eq!(query.sum(&f.props.long).unwrap(), 0);
    assert_eq!(query.avg(&f.props.long).unwrap(), 0.0);
    assert_eq!(query.sum_double(&f.props.double).unwrap(), 0.0);
}

#[test]
fn test_avg_of_float_property() {
    let f = Fixture::new(TEST_ENTITY);
    f.put_scalars();
    let query = f.entities.query().build().unwrap();
    assert_close(query.avg(&f.props.float).unwrap(), 20000.45, 0.01);
    assert_eq!(query.sum(&f.props.short).unwrap(), 2045);
}

#[test]
fn test_aggregate_type_checks() {
    let f = Fixture::new(TEST_ENTITY);
    let query = f.entities.query().build().unwrap();

    let err = query.sum(&f.props.float).unwrap_err();
    assert_eq!(err.code(), "BOX_QUERY_TYPE_MISMATCH");
    let err = query.max_double(&f.props.int).unwrap_err();
    assert_eq!(err.code(), "BOX_QUERY_TYPE_MISMATCH");
    let err = query.avg(&f.props.string).unwrap_err();
    assert_eq!(err.code(), "BOX_QUERY_TYPE_MISMATCH");
}

#[test]
fn test_sum_overflow() {
    let f = Fixture::new(TEST_ENTITY);
    let mut a = f.create(None, 0);
    a.set(&f.props.long, i64::MAX);
    let mut b = f.create(None, 1);
    b.set(&f.props.long, 1i64);
    f.entities.put(&mut a).unwrap();
    f.entities.put(&mut b).unwrap();

    let query = f.entities.query().build().unwrap();
    let err = query.sum(&f.props.long).unwrap_err();
    assert_eq!(err.code(), "BOX_AGGREGATE_OVERFLOW");
    // max is unaffected
    assert_eq!(query.max(&f.props.long).unwrap(), i64::MAX);
}
