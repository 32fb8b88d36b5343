//! Validation outcomes.
//!
//! Both checks collapse into one [`ValidationOutcome`]: registration and
//! affiliation become a single `is_registered` flag, and the record key is
//! chosen from the supplied client id, the resolved account id, or the email,
//! in that order.

use affiliate_client::{
    account_id, AffiliationCheck, ClientLookup, ClientRecord, RegistrationCheck,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Account type recorded for clients known only through the affiliation endpoint.
pub const AFFILIATED_ACCOUNT_TYPE: &str = "Affiliated";

/// Upstream date format for `reg_date`.
const REG_DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalized result of one validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Key the record is stored under.
    pub client_key: String,

    pub is_registered: bool,

    #[serde(default)]
    pub reg_date: Option<NaiveDate>,

    #[serde(default)]
    pub account_id: Option<String>,

    #[serde(default)]
    pub account_type: Option<String>,

    #[serde(default)]
    pub volume_lots: f64,

    #[serde(default)]
    pub volume_mln_usd: f64,

    /// Reward in account currency, to the cent.
    #[serde(default)]
    pub reward: f64,

    /// Reward in USD, to the cent.
    #[serde(default)]
    pub reward_usd: f64,
}

impl ValidationOutcome {
    /// Outcome for a client the upstream does not know.
    pub fn unregistered(client_key: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
            is_registered: false,
            reg_date: None,
            account_id: None,
            account_type: None,
            volume_lots: 0.0,
            volume_mln_usd: 0.0,
            reward: 0.0,
            reward_usd: 0.0,
        }
    }

    /// Normalize a registration check made with `lookup`.
    pub fn from_registration(lookup: &ClientLookup, check: &RegistrationCheck) -> Self {
        match (&check.client_data, check.is_registered) {
            (Some(data), true) => Self::from_client_data(lookup, data),
            _ => Self::unregistered(lookup.value()),
        }
    }

    fn from_client_data(lookup: &ClientLookup, data: &ClientRecord) -> Self {
        let client_key = match lookup {
            ClientLookup::ClientId(id) => id.clone(),
            ClientLookup::Email(email) => {
                data.client_account.clone().unwrap_or_else(|| email.clone())
            }
        };

        Self {
            client_key,
            is_registered: true,
            reg_date: data.reg_date.as_deref().and_then(parse_reg_date),
            account_id: data.client_account.clone(),
            account_type: data.client_account_type.clone(),
            volume_lots: data.volume_lots.unwrap_or_default(),
            volume_mln_usd: data.volume_mln_usd.unwrap_or_default(),
            reward: to_cents(data.reward.unwrap_or_default()),
            reward_usd: to_cents(data.reward_usd.unwrap_or_default()),
        }
    }

    /// Normalize an affiliation check made for `email`.
    ///
    /// Degraded checks normalize to "not registered".
    pub fn from_affiliation(email: &str, check: &AffiliationCheck) -> Self {
        if !check.is_affiliated {
            return Self::unregistered(email);
        }

        let account = check.accounts.first().and_then(account_id);
        Self {
            client_key: account.clone().unwrap_or_else(|| email.to_string()),
            is_registered: true,
            account_id: account,
            account_type: Some(AFFILIATED_ACCOUNT_TYPE.to_string()),
            ..Self::unregistered(email)
        }
    }
}

/// Parse an upstream registration date; a datetime is cut to its date.
pub fn parse_reg_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let parsed = NaiveDate::parse_from_str(raw, REG_DATE_FORMAT).or_else(|e| {
        raw.get(..10)
            .ok_or(e)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, REG_DATE_FORMAT))
    });

    match parsed {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(reg_date = raw, "Could not parse reg_date");
            None
        }
    }
}

fn to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use affiliate_auth::ApiVersion;
    use affiliate_client::CheckStatus;
    use serde_json::json;

    fn registration(data: Option<ClientRecord>) -> RegistrationCheck {
        RegistrationCheck {
            is_registered: data.is_some(),
            client_data: data,
            api_version: ApiVersion::V1,
        }
    }

    fn affiliation(is_affiliated: bool, accounts: Vec<serde_json::Value>) -> AffiliationCheck {
        AffiliationCheck {
            status: CheckStatus::Success,
            is_affiliated,
            link_code: String::new(),
            accounts,
            code: None,
            message: None,
            failure: None,
        }
    }

    #[test]
    fn test_registered_by_client_id() {
        let data = ClientRecord {
            client_account: Some("98765".to_string()),
            client_account_type: Some("Standard".to_string()),
            reg_date: Some("2024-03-01".to_string()),
            volume_lots: Some(1.5),
            reward: Some(10.456),
            ..ClientRecord::default()
        };
        let lookup = ClientLookup::ClientId("12345".to_string());
        let outcome = ValidationOutcome::from_registration(&lookup, &registration(Some(data)));

        assert_eq!(outcome.client_key, "12345");
        assert!(outcome.is_registered);
        assert_eq!(outcome.reg_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(outcome.account_id.as_deref(), Some("98765"));
        assert_eq!(outcome.account_type.as_deref(), Some("Standard"));
        assert_eq!(outcome.volume_lots, 1.5);
        assert_eq!(outcome.volume_mln_usd, 0.0);
        assert_eq!(outcome.reward, 10.46);
    }

    #[test]
    fn test_registered_by_email_uses_account() {
        let data = ClientRecord {
            client_account: Some("98765".to_string()),
            ..ClientRecord::default()
        };
        let lookup = ClientLookup::Email("a@b.com".to_string());
        let outcome = ValidationOutcome::from_registration(&lookup, &registration(Some(data)));
        assert_eq!(outcome.client_key, "98765");

        let outcome = ValidationOutcome::from_registration(
            &lookup,
            &registration(Some(ClientRecord::default())),
        );
        assert_eq!(outcome.client_key, "a@b.com");
    }

    #[test]
    fn test_not_registered() {
        let lookup = ClientLookup::ClientId("12345".to_string());
        let outcome = ValidationOutcome::from_registration(&lookup, &registration(None));
        assert_eq!(outcome, ValidationOutcome::unregistered("12345"));
    }

    #[test]
    fn test_affiliated_with_accounts() {
        let check = affiliation(true, vec![json!("A1"), json!("A2")]);
        let outcome = ValidationOutcome::from_affiliation("a@b.com", &check);

        assert_eq!(outcome.client_key, "A1");
        assert!(outcome.is_registered);
        assert_eq!(outcome.account_id.as_deref(), Some("A1"));
        assert_eq!(outcome.account_type.as_deref(), Some(AFFILIATED_ACCOUNT_TYPE));
        assert_eq!(outcome.reward_usd, 0.0);
    }

    #[test]
    fn test_affiliated_without_accounts() {
        let outcome = ValidationOutcome::from_affiliation("a@b.com", &affiliation(true, vec![]));
        assert_eq!(outcome.client_key, "a@b.com");
        assert!(outcome.is_registered);
        assert!(outcome.account_id.is_none());
        assert_eq!(outcome.account_type.as_deref(), Some(AFFILIATED_ACCOUNT_TYPE));
    }

    #[test]
    fn test_not_affiliated() {
        let outcome =
            ValidationOutcome::from_affiliation("c@d.com", &affiliation(false, vec![json!("A1")]));
        assert_eq!(outcome, ValidationOutcome::unregistered("c@d.com"));
    }

    #[test]
    fn test_parse_reg_date() {
        assert_eq!(parse_reg_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            parse_reg_date("2024-03-01T10:20:30Z"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_reg_date("01/03/2024"), None);
        assert_eq!(parse_reg_date(""), None);
    }
}
