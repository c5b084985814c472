//! 截止日期解析
//!
//! 截止日期是日历日期，输出格式固定为 `YYYY-MM-DD`；输入同时接受
//! `YYYY-MM-DD` 与后端 `Date` 字段序列化出的 RFC 3339 时间戳。

use crate::error::{Result, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| {
            ValidationError::InvalidValue {
                field: "dueDate".to_string(),
                message: format!("无法解析日期 '{}'", raw),
            }
            .into()
        })
}

pub(crate) mod due_date {
    use super::{DATE_FORMAT, parse_due_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse_due_date(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod optional_due_date {
    use super::{DATE_FORMAT, parse_due_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => s.serialize_some(&date.format(DATE_FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => parse_due_date(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_rfc3339() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        assert_eq!(parse_due_date("2024-03-25").unwrap(), expected);
        assert_eq!(parse_due_date(" 2024-03-25T08:30:00.000Z ").unwrap(), expected);
        assert_eq!(parse_due_date("2024-03-25T23:30:00-02:00").unwrap(), expected.succ_opt().unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_due_date("next friday").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
