//! Aggregates over one property of the matching records
//!
//! Null slots are skipped. Over an empty set every aggregate yields zero
//! of its result type.

use std::fmt;

use crate::entity::Value;
use crate::query::{QueryError, QueryResult};
use crate::schema::PropertyDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Sum,
    Avg,
    MinDouble,
    MaxDouble,
    SumDouble,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::MinDouble => "min_double",
            Aggregate::MaxDouble => "max_double",
            Aggregate::SumDouble => "sum_double",
        }
    }

    /// Rejects property types the aggregate is not defined for
    pub fn check(&self, property: &PropertyDescriptor) -> QueryResult<()> {
        let value_type = property.value_type;
        let (ok, needs) = match self {
            Aggregate::Min | Aggregate::Max | Aggregate::Sum => {
                (value_type.is_integer(), "an integer")
            }
            Aggregate::Avg => (value_type.is_numeric(), "a numeric"),
            Aggregate::MinDouble | Aggregate::MaxDouble | Aggregate::SumDouble => {
                (value_type.is_floating(), "a floating")
            }
        };
        if ok {
            Ok(())
        } else {
            Err(QueryError::type_mismatch(
                &property.name,
                format!(
                    "{} needs {} property, found {}",
                    self.as_str(),
                    needs,
                    value_type.type_name()
                ),
            ))
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateValue {
    Long(i64),
    Double(f64),
}

impl AggregateValue {
    pub fn as_i64(&self) -> i64 {
        match self {
            AggregateValue::Long(v) => *v,
            AggregateValue::Double(v) => *v as i64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            AggregateValue::Long(v) => *v as f64,
            AggregateValue::Double(v) => *v,
        }
    }
}

/// Running state of one aggregate
#[derive(Debug, Clone)]
pub struct Accumulator {
    aggregate: Aggregate,
    count: u64,
    int_sum: i128,
    int_min: Option<i64>,
    int_max: Option<i64>,
    float_sum: f64,
    float_min: Option<f64>,
    float_max: Option<f64>,
}

impl Accumulator {
    pub fn new(aggregate: Aggregate) -> Self {
        Self {
            aggregate,
            count: 0,
            int_sum: 0,
            int_min: None,
            int_max: None,
            float_sum: 0.0,
            float_min: None,
            float_max: None,
        }
    }

    pub fn feed(&mut self, value: Option<&Value>) {
        let value = match value {
            Some(v) => v,
            None => return,
        };
        if let Some(v) = value.as_i64() {
            self.count += 1;
            self.int_sum += i128::from(v);
            self.int_min = Some(self.int_min.map_or(v, |m| m.min(v)));
            self.int_max = Some(self.int_max.map_or(v, |m| m.max(v)));
        } else if let Some(v) = value.as_f64() {
            self.count += 1;
            self.float_sum += v;
            self.float_min = Some(self.float_min.map_or(v, |m| m.min(v)));
            self.float_max = Some(self.float_max.map_or(v, |m| m.max(v)));
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn finish(&self, property: &PropertyDescriptor) -> QueryResult<AggregateValue> {
        let value = match self.aggregate {
            Aggregate::Min => AggregateValue::Long(self.int_min.unwrap_or(0)),
            Aggregate::Max => AggregateValue::Long(self.int_max.unwrap_or(0)),
            Aggregate::Sum => AggregateValue::Long(
                i64::try_from(self.int_sum)
                    .map_err(|_| QueryError::aggregate_overflow(&property.name))?,
            ),
            Aggregate::Avg if self.count == 0 => AggregateValue::Double(0.0),
            Aggregate::Avg if property.value_type.is_integer() => {
                AggregateValue::Double(self.int_sum as f64 / self.count as f64)
            }
            Aggregate::Avg => AggregateValue::Double(self.float_sum / self.count as f64),
            Aggregate::MinDouble => AggregateValue::Double(self.float_min.unwrap_or(0.0)),
            Aggregate::MaxDouble => AggregateValue::Double(self.float_max.unwrap_or(0.0)),
            Aggregate::SumDouble => AggregateValue::Double(self.float_sum),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueType;

    fn prop(value_type: ValueType) -> PropertyDescriptor {
        PropertyDescriptor {
            entity_id: 1,
            id: 1,
            name: "p".into(),
            value_type,
            indexed: false,
            ordinal: 0,
        }
    }

    fn run(
        aggregate: Aggregate,
        p: &PropertyDescriptor,
        values: &[Option<Value>],
    ) -> QueryResult<AggregateValue> {
        aggregate.check(p)?;
        let mut acc = Accumulator::new(aggregate);
        for v in values {
            acc.feed(v.as_ref());
        }
        acc.finish(p)
    }

    #[test]
    fn test_integer_aggregates_skip_nulls() {
        let p = prop(ValueType::Int);
        let values = [Some(Value::Int(2000)), None, Some(Value::Int(2001))];
        assert_eq!(run(Aggregate::Min, &p, &values).unwrap(), AggregateValue::Long(2000));
        assert_eq!(run(Aggregate::Max, &p, &values).unwrap(), AggregateValue::Long(2001));
        assert_eq!(run(Aggregate::Sum, &p, &values).unwrap(), AggregateValue::Long(4001));
        assert_eq!(run(Aggregate::Avg, &p, &values).unwrap(), AggregateValue::Double(2000.5));
    }

    #[test]
    fn test_empty_set_is_zero() {
        let p = prop(ValueType::Long);
        assert_eq!(run(Aggregate::Max, &p, &[]).unwrap(), AggregateValue::Long(0));
        assert_eq!(run(Aggregate::Avg, &p, &[None]).unwrap(), AggregateValue::Double(0.0));
        let f = prop(ValueType::Double);
        assert_eq!(run(Aggregate::MinDouble, &f, &[]).unwrap(), AggregateValue::Double(0.0));
    }

    #[test]
    fn test_sum_overflow() {
        let p = prop(ValueType::Long);
        let values = [Some(Value::Long(i64::MAX)), Some(Value::Long(1))];
        let err = run(Aggregate::Sum, &p, &values).unwrap_err();
        assert_eq!(err.code().code(), "BOX_AGGREGATE_OVERFLOW");
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert!(Aggregate::Sum.check(&prop(ValueType::Float)).is_err());
        assert!(Aggregate::SumDouble.check(&prop(ValueType::Int)).is_err());
        assert!(Aggregate::Avg.check(&prop(ValueType::String)).is_err());
        assert!(Aggregate::Avg.check(&prop(ValueType::Float)).is_ok());
    }

    #[test]
    fn test_float_aggregates() {
        let p = prop(ValueType::Float);
        let values = [Some(Value::Float(20000.0)), Some(Value::Float(20000.1))];
        let sum = run(Aggregate::SumDouble, &p, &values).unwrap().as_f64();
        assert!((sum - 40000.1).abs() < 0.001);
        let max = run(Aggregate::MaxDouble, &p, &values).unwrap().as_f64();
        assert!((max - 20000.1).abs() < 0.001);
    }
}
