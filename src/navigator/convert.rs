//! Metric value coercion

use num_traits::NumCast;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::{AggError, AggResult};

/// Conversion of a metric `value` into a caller type.
///
/// Numeric targets go through `NumCast`; a value that does not fit the
/// target is a coercion error. Integer targets also reject floats with a
/// fractional part (`5.5` into `i64`), while whole floats (`55.0`) convert.
/// `null` (an empty `avg`, `min` or `max`) only converts into `Option<T>`.
pub trait FromMetricValue: Sized {
    /// Converts the value stored under aggregation `name`
    fn from_metric(name: &str, value: &Value) -> AggResult<Self>;
}

fn cast<T: NumCast>(
    name: &str,
    value: &Value,
    target: &'static str,
    integral: bool,
) -> AggResult<T> {
    let cast = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                <T as NumCast>::from(i)
            } else if let Some(u) = n.as_u64() {
                <T as NumCast>::from(u)
            } else {
                n.as_f64()
                    .filter(|f| !integral || f.fract() == 0.0)
                    .and_then(<T as NumCast>::from)
            }
        }
        _ => None,
    };
    cast.ok_or_else(|| AggError::coercion(name, value, target))
}

macro_rules! impl_from_metric {
    ($integral:literal: $($ty:ty),*) => {
        $(
            impl FromMetricValue for $ty {
                fn from_metric(name: &str, value: &Value) -> AggResult<Self> {
                    cast(name, value, stringify!($ty), $integral)
                }
            }
        )*
    };
}

impl_from_metric!(true: i32, i64, u32, u64, usize);
impl_from_metric!(false: f32, f64);

impl FromMetricValue for Decimal {
    fn from_metric(name: &str, value: &Value) -> AggResult<Self> {
        let decimal = match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Decimal::from(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Decimal::from(u))
                } else {
                    n.as_f64().and_then(|f| Decimal::try_from(f).ok())
                }
            }
            _ => None,
        };
        decimal.ok_or_else(|| AggError::coercion(name, value, "Decimal"))
    }
}

impl<T: FromMetricValue> FromMetricValue for Option<T> {
    fn from_metric(name: &str, value: &Value) -> AggResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_metric(name, other).map(Some),
        }
    }
}
