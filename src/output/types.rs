use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const SCHEMA_VERSION: &str = "kpi.v1";

#[derive(Debug, Clone, Serialize, Default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub schema_version: &'static str,
    pub time: DateTime<Utc>,
    pub request_id: Uuid,
    pub op: &'static str,
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    fn new(op: &'static str, apply: bool, plan: Option<Value>, result: Option<Value>, meta: Option<Meta>) -> Self {
        Envelope { schema_version: SCHEMA_VERSION, time: Utc::now(), request_id: Uuid::new_v4(), op, apply, plan, result, meta }
    }

    pub fn plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Self::new(op, false, Some(serde_json::to_value(plan)?), None, meta))
    }

    pub fn result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Self::new(op, true, None, Some(serde_json::to_value(result)?), meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_plan_envelope() {
        let env = Envelope::plan("collect", &json!({"keywords": 2}), None).expect("to serialize plan");
        let s = serde_json::to_string(&env).unwrap();
        assert!(s.contains("\"schema_version\":\"kpi.v1\""));
        assert!(s.contains("\"plan\""));
        assert!(s.contains("\"apply\":false"));
        assert!(!s.contains("\"meta\""));
    }

    #[test]
    fn serialize_result_envelope_with_meta() {
        let meta = Meta { duration_ms: Some(42) };
        let env = Envelope::result("detail", &json!({"success": 3}), Some(meta)).expect("to serialize result");
        let s = serde_json::to_string(&env).unwrap();
        assert!(s.contains("\"result\""));
        assert!(s.contains("\"apply\":true"));
        assert!(s.contains("\"duration_ms\":42"));
    }
}
