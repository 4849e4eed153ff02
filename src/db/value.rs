// 数据库值 -> json 值

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::{Value, json};

// decimal 转为普通浮点数，避免序列化出 decimal 字符串
pub fn decimal_to_json(value: &BigDecimal) -> Value {
    value.to_f64().map(Value::from).unwrap_or(Value::Null)
}

// 时间编码为 [年, 月, 日, 时, 分, 秒]
pub fn datetime_to_json(value: &NaiveDateTime) -> Value {
    json!([
        value.year(),
        value.month(),
        value.day(),
        value.hour(),
        value.minute(),
        value.second()
    ])
}

pub fn date_to_json(value: &NaiveDate) -> Value {
    Value::String(value.format("%Y-%m-%d").to_string())
}

pub fn time_to_json(value: &NaiveTime) -> Value {
    Value::String(value.format("%H:%M:%S").to_string())
}

pub fn as_coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod test_value {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_decimal_is_plain_number() {
        let d = BigDecimal::from_str("12.50").unwrap();
        let value = decimal_to_json(&d);
        assert_eq!(value, json!(12.5));
        assert_eq!(serde_json::to_string(&value).unwrap(), "12.5");
    }

    #[test]
    fn test_datetime_array() {
        let dt = NaiveDate::from_ymd_opt(2014, 6, 3)
            .unwrap()
            .and_hms_opt(13, 4, 5)
            .unwrap();
        assert_eq!(datetime_to_json(&dt), json!([2014, 6, 3, 13, 4, 5]));
    }

    #[test]
    fn test_date_and_time_strings() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 9).unwrap();
        assert_eq!(date_to_json(&d), json!("2020-01-09"));
        let t = NaiveTime::from_hms_opt(7, 8, 9).unwrap();
        assert_eq!(time_to_json(&t), json!("07:08:09"));
    }

    #[test]
    fn test_coordinate() {
        assert_eq!(as_coordinate(&json!(1.5)), Some(1.5));
        assert_eq!(as_coordinate(&json!(3)), Some(3.0));
        assert_eq!(as_coordinate(&json!("2.25")), Some(2.25));
        assert_eq!(as_coordinate(&Value::Null), None);
    }
}
