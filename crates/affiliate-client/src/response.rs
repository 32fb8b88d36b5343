//! Upstream response shapes.
//!
//! The clients report has a stable `data` list. The affiliation endpoint
//! does not: affiliation may be stated outright, as a string, or only implied
//! by the presence of accounts or a link code. [`AffiliationSignal`] names
//! each of those interpretations and [`AffiliationSignal::detect`] picks the
//! first that applies.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Body of the clients report endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientsReport {
    /// Matching clients; `null` and absent both mean none.
    #[serde(default)]
    pub data: Option<Vec<ClientRecord>>,
}

impl ClientsReport {
    /// Parse a report body.
    pub fn parse(body: &str) -> Result<Self, String> {
        serde_json::from_str(body).map_err(|e| format!("Failed to parse API response: {}", e))
    }

    /// First matching client, if any.
    pub fn into_first(self) -> Option<ClientRecord> {
        self.data.and_then(|data| data.into_iter().next())
    }
}

/// One client row of the clients report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Client account id.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub client_account: Option<String>,

    /// Account type label.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub client_account_type: Option<String>,

    /// Registration date as sent by the upstream.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub reg_date: Option<String>,

    /// Traded volume in lots.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub volume_lots: Option<f64>,

    /// Traded volume in millions of USD.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub volume_mln_usd: Option<f64>,

    /// Reward in account currency.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,

    /// Reward in USD.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub reward_usd: Option<f64>,

    /// Every other field, kept for display.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept a string or a number; blank strings become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept a number or a numeric string.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Interpretation of an affiliation body, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum AffiliationSignal {
    /// `is_affiliated` is a boolean.
    Flag(bool),
    /// `is_affiliated` is a string; only "true" (any case) counts.
    FlagText(String),
    /// `is_affiliated` is present with some other type.
    Unrecognized(Value),
    /// A non-empty `accounts` list.
    Accounts(usize),
    /// A non-empty `link_code`.
    LinkCode(Value),
    /// None of the above.
    Absent,
}

impl AffiliationSignal {
    /// Pick the first interpretation that applies to `body`.
    pub fn detect(body: &Map<String, Value>) -> Self {
        if let Some(flag) = body.get("is_affiliated") {
            return match flag {
                Value::Bool(b) => AffiliationSignal::Flag(*b),
                Value::String(s) => AffiliationSignal::FlagText(s.clone()),
                other => AffiliationSignal::Unrecognized(other.clone()),
            };
        }

        if let Some(Value::Array(accounts)) = body.get("accounts") {
            if !accounts.is_empty() {
                return AffiliationSignal::Accounts(accounts.len());
            }
        }

        match body.get("link_code") {
            Some(code) if is_truthy(code) => AffiliationSignal::LinkCode(code.clone()),
            _ => AffiliationSignal::Absent,
        }
    }

    /// Whether this interpretation means "affiliated".
    pub fn is_affiliated(&self) -> bool {
        match self {
            AffiliationSignal::Flag(b) => *b,
            AffiliationSignal::FlagText(s) => s.eq_ignore_ascii_case("true"),
            AffiliationSignal::Unrecognized(_) => false,
            AffiliationSignal::Accounts(_) | AffiliationSignal::LinkCode(_) => true,
            AffiliationSignal::Absent => false,
        }
    }
}

/// Parsed affiliation body.
#[derive(Debug, Clone, PartialEq)]
pub struct AffiliationBody {
    /// How affiliation was decided.
    pub signal: AffiliationSignal,
    /// Link code, empty when absent.
    pub link_code: String,
    /// Accounts list, empty when absent or not a list.
    pub accounts: Vec<Value>,
}

impl AffiliationBody {
    /// Parse an affiliation body. Only JSON objects are accepted.
    pub fn parse(body: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| format!("Failed to parse API response: {}", e))?;

        let Value::Object(map) = value else {
            return Err("Failed to parse API response: expected a JSON object".to_string());
        };

        let link_code = match map.get("link_code") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        let accounts = match map.get("accounts") {
            Some(Value::Array(accounts)) => accounts.clone(),
            _ => Vec::new(),
        };

        Ok(Self {
            signal: AffiliationSignal::detect(&map),
            link_code,
            accounts,
        })
    }
}

/// Render an account entry as an id string.
///
/// Strings and numbers are used as-is; objects are searched for a
/// `client_account` or `id` field.
pub fn account_id(account: &Value) -> Option<String> {
    match account {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => ["client_account", "account", "id"]
            .iter()
            .find_map(|key| map.get(*key).and_then(account_id)),
        _ => None,
    }
}

/// JSON truthiness: null, false, zero and empty values are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
