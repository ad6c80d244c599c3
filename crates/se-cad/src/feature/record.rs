//! Uniform result records

use serde_json::{Map, Value, json};

use super::FeatureFamily;
use crate::error::SessionError;
use crate::kernel::FeatureId;

/// A feature the engine created
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCreated {
    pub family: FeatureFamily,
    pub method: &'static str,
    pub feature_id: FeatureId,
    /// Accumulated profiles read, for multi-profile variants
    pub num_profiles: Option<usize>,
    /// Resolved parameters of the selected variant
    pub params: Map<String, Value>,
}

impl FeatureCreated {
    /// Render as a `{"status": "created", ...}` record
    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("status".into(), json!("created"));
        record.insert("family".into(), json!(self.family.as_str()));
        record.insert(self.family.discriminator().into(), json!(self.method));
        record.insert("feature_id".into(), json!(self.feature_id));
        for (key, value) in &self.params {
            record.insert(key.clone(), value.clone());
        }
        if let Some(count) = self.num_profiles {
            record.insert("num_profiles".into(), json!(count));
        }
        Value::Object(record)
    }
}

/// Render an error as a `{"error": ..., "kind": ...}` record
pub fn error_record(error: &SessionError) -> Value {
    let mut record = Map::new();
    record.insert("error".into(), json!(error.to_string()));
    record.insert("kind".into(), json!(error.kind().as_str()));
    if let Some(diagnostic) = error.diagnostic() {
        record.insert("diagnostic".into(), json!(diagnostic));
    }
    match error {
        SessionError::InvalidParameter { name, .. } => {
            record.insert("parameter".into(), json!(name));
        }
        SessionError::InsufficientProfiles {
            required,
            available,
            ..
        } => {
            record.insert("required".into(), json!(required));
            record.insert("available".into(), json!(available));
        }
        SessionError::UnknownMethod { family, method } => {
            record.insert("family".into(), json!(family));
            record.insert("method".into(), json!(method));
        }
        _ => {}
    }
    Value::Object(record)
}
