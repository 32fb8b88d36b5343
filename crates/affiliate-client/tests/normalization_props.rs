//! Property tests for affiliation body normalization.
//!
//! Randomized bodies mix every field shape the upstream has been seen to
//! send. The expected flag is computed independently, one priority rule at a
//! time, and compared with the parser's verdict.

use affiliate_client::{AffiliationBody, AffiliationSignal};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// `is_affiliated` shapes: booleans, strings close to "true", and other types.
fn flag_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        any::<bool>().prop_map(|b| Some(json!(b))),
        prop::sample::select(vec!["true", "TRUE", "True", "false", "yes", "1", "", " true"])
            .prop_map(|s| Some(json!(s))),
        "[a-z]{0,6}".prop_map(|s| Some(json!(s))),
        Just(Some(Value::Null)),
        (0i64..3).prop_map(|n| Some(json!(n))),
    ]
}

fn accounts_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        prop::collection::vec("[A-Z][0-9]{1,4}", 0..3).prop_map(|v| Some(json!(v))),
        Just(Some(Value::Null)),
        Just(Some(json!("A1"))),
    ]
}

fn link_code_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        "[A-Z0-9]{0,4}".prop_map(|s| Some(json!(s))),
        Just(Some(Value::Null)),
    ]
}

fn body_strategy() -> impl Strategy<Value = Map<String, Value>> {
    (flag_strategy(), accounts_strategy(), link_code_strategy()).prop_map(
        |(flag, accounts, link_code)| {
            let mut body = Map::new();
            if let Some(flag) = flag {
                body.insert("is_affiliated".to_string(), flag);
            }
            if let Some(accounts) = accounts {
                body.insert("accounts".to_string(), accounts);
            }
            if let Some(link_code) = link_code {
                body.insert("link_code".to_string(), link_code);
            }
            body
        },
    )
}

/// The five priority rules, stated directly.
fn expected(body: &Map<String, Value>) -> bool {
    if let Some(flag) = body.get("is_affiliated") {
        return match flag {
            Value::Bool(b) => *b,
            Value::String(s) => s.to_lowercase() == "true",
            _ => false,
        };
    }
    if let Some(Value::Array(accounts)) = body.get("accounts") {
        if !accounts.is_empty() {
            return true;
        }
    }
    matches!(body.get("link_code"), Some(Value::String(s)) if !s.is_empty())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: the parsed flag follows the documented priority order
    #[test]
    fn prop_affiliation_priority(body in body_strategy()) {
        let text = Value::Object(body.clone()).to_string();
        let parsed = AffiliationBody::parse(&text).expect("Objects always parse");

        prop_assert_eq!(parsed.signal.is_affiliated(), expected(&body));
    }

    /// Property: an explicit flag is never overridden by implied affiliation
    #[test]
    fn prop_explicit_flag_wins(body in body_strategy()) {
        let parsed = AffiliationBody::parse(&Value::Object(body.clone()).to_string())
            .expect("Objects always parse");

        if body.contains_key("is_affiliated") {
            prop_assert!(matches!(
                parsed.signal,
                AffiliationSignal::Flag(_)
                    | AffiliationSignal::FlagText(_)
                    | AffiliationSignal::Unrecognized(_)
            ));
        }
    }

    /// Property: bodies without any signal fall through to not affiliated
    #[test]
    fn prop_empty_signals_not_affiliated(link_code in prop::option::of(Just(""))) {
        let mut body = Map::new();
        body.insert("accounts".to_string(), json!([]));
        if let Some(code) = link_code {
            body.insert("link_code".to_string(), json!(code));
        }

        let parsed = AffiliationBody::parse(&Value::Object(body).to_string())
            .expect("Objects always parse");
        prop_assert!(!parsed.signal.is_affiliated());
        prop_assert_eq!(&parsed.signal, &AffiliationSignal::Absent);
    }
}
