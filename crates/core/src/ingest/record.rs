use serde::Deserialize;
use serde_json::{Map, Value};

/// A number that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Numeric {
    /// Finite value, or `None` if the field cannot be read as a number.
    pub(crate) fn to_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Non-negative integral value, for `pid`/`tid`.
    pub(crate) fn to_id(&self) -> Option<u64> {
        if let Self::Text(s) = self
            && let Ok(id) = s.trim().parse::<u64>()
        {
            return Some(id);
        }
        let value = self.to_f64()?;
        (value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64).then_some(value as u64)
    }
}

/// One record as found in the input, before validation.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawEvent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cat: Option<String>,
    #[serde(default)]
    pub ph: String,
    #[serde(default)]
    pub ts: Option<Numeric>,
    #[serde(default)]
    pub dur: Option<Numeric>,
    #[serde(default)]
    pub pid: Option<Numeric>,
    #[serde(default)]
    pub tid: Option<Numeric>,
    #[serde(default)]
    pub args: Option<Value>,
}

impl RawEvent {
    pub(crate) fn process_id(&self) -> Option<u64> {
        self.pid.as_ref().and_then(Numeric::to_id)
    }

    pub(crate) fn thread_id(&self) -> Option<u64> {
        self.tid.as_ref().and_then(Numeric::to_id)
    }

    /// `args` if it is a JSON object; anything else is discarded.
    pub(crate) fn take_args(&mut self) -> Option<Map<String, Value>> {
        match self.args.take() {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// `args.name` for metadata naming records.
    pub(crate) fn args_name(&self) -> Option<&str> {
        self.args.as_ref()?.get("name")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawEvent {
        serde_json::from_str(json).expect("record")
    }

    #[test]
    fn numeric_strings_coerce() {
        let e = raw(r#"{"name":"a","ph":"X","ts":"42","dur":" 7.5 ","pid":"3","tid":4}"#);
        assert_eq!(e.ts.as_ref().and_then(Numeric::to_f64), Some(42.0));
        assert_eq!(e.dur.as_ref().and_then(Numeric::to_f64), Some(7.5));
        assert_eq!(e.process_id(), Some(3));
        assert_eq!(e.thread_id(), Some(4));
    }

    #[test]
    fn garbage_numbers_do_not_coerce() {
        let e = raw(r#"{"name":"a","ts":"abc","dur":true,"pid":-1,"tid":1.5}"#);
        assert_eq!(e.ts.as_ref().and_then(Numeric::to_f64), None);
        assert_eq!(e.dur.as_ref().and_then(Numeric::to_f64), None);
        assert_eq!(e.process_id(), None);
        assert_eq!(e.thread_id(), None);
    }

    #[test]
    fn nan_text_is_rejected() {
        let e = raw(r#"{"ts":"NaN","dur":"inf"}"#);
        assert_eq!(e.ts.as_ref().and_then(Numeric::to_f64), None);
        assert_eq!(e.dur.as_ref().and_then(Numeric::to_f64), None);
    }

    #[test]
    fn missing_fields_default() {
        let e = raw("{}");
        assert!(e.name.is_empty());
        assert!(e.ph.is_empty());
        assert!(e.ts.is_none());
        assert!(e.process_id().is_none());
    }

    #[test]
    fn non_object_args_are_dropped() {
        let mut e = raw(r#"{"args":"oops"}"#);
        assert!(e.take_args().is_none());
        let mut e = raw(r#"{"args":{"name":"Main","n":1}}"#);
        assert_eq!(e.args_name(), Some("Main"));
        assert_eq!(e.take_args().map(|m| m.len()), Some(2));
    }
}
