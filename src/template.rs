use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::collections::HashMap;
use tera::{to_value, Function, Value};

pub fn ts_to_date(ts: i64, offset: Option<i64>, format: Option<String>) -> String {
    let offset = offset.unwrap_or(0);
    let tz = FixedOffset::east_opt(offset as i32).unwrap_or_else(|| Utc.fix());
    let dt = match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(dt) => dt.with_timezone(&tz),
        None => return ts.to_string(),
    };
    match format {
        Some(f) => dt.format(&f).to_string(),
        None => dt.format("%Y-%m-%d").to_string(),
    }
}

fn optional_arg<T: serde::de::DeserializeOwned>(args: &HashMap<String, Value>, name: &str) -> Option<T> {
    match args.get(name) {
        Some(v) => tera::from_value(v.clone()).ok(),
        _ => None,
    }
}

pub struct TsDateFn;
impl Function for TsDateFn {
    fn call(&self, args: &HashMap<String, Value>) -> Result<Value, tera::Error> {
        let ts: i64 = match optional_arg(args, "ts") {
            Some(ts) => ts,
            None => return Err(tera::Error::msg("ts_to_date missing a `ts` argument")),
        };
        let tz: Option<i64> = optional_arg(args, "tz");
        let fmt: Option<String> = optional_arg(args, "fmt");
        Ok(to_value(ts_to_date(ts, tz, fmt))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_timestamps_in_their_offset() {
        assert_eq!(ts_to_date(1_609_718_400, None, None), "2021-01-04");
        assert_eq!(
            ts_to_date(1_609_718_400, Some(-3600), Some("%Y-%m-%d %H:%M %z".into())),
            "2021-01-03 23:00 -0100"
        );
    }

    #[test]
    fn function_requires_ts() {
        let mut args = HashMap::new();
        assert!(TsDateFn.call(&args).is_err());
        args.insert("ts".to_string(), to_value(0).unwrap());
        args.insert("fmt".to_string(), to_value("%Y").unwrap());
        assert_eq!(TsDateFn.call(&args).unwrap(), to_value("1970").unwrap());
    }
}
