//! Audit event names and payload redaction.

// ---------------------------------------------------------------------------
// Action constants
// ---------------------------------------------------------------------------

/// Known action names for audit log entries.
pub mod actions {
    pub const LOGIN: &str = "auth.login";
    pub const CREATE: &str = "entity.create";
    pub const UPDATE: &str = "entity.update";
    pub const DELETE: &str = "entity.delete";
    pub const CONTRACT_RENEW: &str = "contract.renew";
    pub const CONTRACT_TERMINATE: &str = "contract.terminate";
}

/// Entity type labels recorded alongside an action.
pub mod entities {
    pub const CLIENT: &str = "client";
    pub const CONTRACT: &str = "contract";
    pub const INDUSTRY: &str = "industry";
    pub const KPI: &str = "kpi";
    pub const SERVICE_ASSIGNMENT: &str = "service_assignment";
    pub const ROLE: &str = "role";
    pub const USER: &str = "user";
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Key fragments whose values never reach the audit log.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "apikey",
    "authorization",
    "credential",
];

/// Replace the value of any key containing a [`SENSITIVE_FIELDS`] fragment
/// with `"[REDACTED]"`, recursing into nested objects and arrays.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}
