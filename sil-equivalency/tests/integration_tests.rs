//! Integration tests for sil-equivalency

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use serde::Serialize;
use serde_json::json;
use sil_equivalency::prelude::*;
use sil_equivalency::{
    ConfigError, DefaultFormatter, FailureKind, FailureScope, FormatterConfig, MatchingRule, RuleError,
    SelectedMember, SelectionContext, SelectionRule,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Order {
    id: u64,
    customer: Customer,
    lines: Vec<OrderLine>,
    tags: HashMap<String, String>,
    note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Customer {
    name: String,
    email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OrderLine {
    sku: String,
    quantity: u32,
    price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OrderDto {
    id: u64,
    customer: CustomerDto,
    lines: Vec<OrderLine>,
    tags: HashMap<String, String>,
    note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CustomerDto {
    name: String,
    email: String,
}

fn line(sku: &str, quantity: u32, price: f64) -> OrderLine {
    OrderLine {
        sku: sku.to_string(),
        quantity,
        price,
    }
}

fn order() -> Order {
    Order {
        id: 42,
        customer: Customer {
            name: "Jane".into(),
            email: "jane@example.com".into(),
        },
        lines: vec![line("A-1", 2, 9.99), line("B-7", 1, 120.0)],
        tags: [("channel".to_string(), "web".to_string())].into_iter().collect(),
        note: None,
    }
}

fn dto() -> OrderDto {
    let order = order();
    OrderDto {
        id: order.id,
        customer: CustomerDto {
            name: order.customer.name,
            email: order.customer.email,
        },
        lines: order.lines.into_iter().rev().collect(),
        tags: order.tags,
        note: None,
    }
}

#[test]
fn test_dto_is_equivalent_to_domain_object() {
    assert_equivalent(&dto(), &order());
}

#[test]
fn test_every_divergence_is_reported() {
    let mut subject = dto();
    subject.customer.email = "jane@old.example.com".into();
    subject.lines[0].quantity = 3;
    subject.note = Some("gift".into());

    let error = check_equivalent(&subject, &order()).unwrap_err();
    let report = error.to_string();

    assert!(report.starts_with("Found 3 failure(s):"), "{report}");
    assert!(report.contains("Customer.Email"));
    assert!(report.contains("Expected Note to be <null>, but found \"gift\"."));
    assert!(report.contains("[0].Quantity"));
}

#[test]
fn test_tag_dictionary_missing_key() {
    let mut subject = dto();
    subject.tags.clear();

    let error = check_equivalent(&subject, &order()).unwrap_err();
    assert_eq!(error.failures().len(), 1);
    assert_eq!(error.failures()[0].kind(), FailureKind::Missing);
    assert_eq!(error.failures()[0].message(), "Expected Tags to contain key \"channel\".");
}

#[test]
fn test_strict_ordering_for_lines() {
    let error = check_equivalent_with(&dto(), &order(), |o| o.with_strict_ordering_for("Lines")).unwrap_err();
    assert!(error.failures().iter().all(|f| f.path().to_string().starts_with("Lines[")));
}

#[test]
fn test_tolerance_for_prices() {
    let mut subject = dto();
    for line in &mut subject.lines {
        line.price += 0.001;
    }

    assert!(check_equivalent(&subject, &order()).is_err());
    assert_equivalent_with(&subject, &order(), |o| o.using_tolerance("Lines[].Price", 0.01));
}

struct EmailDomainOnly;

impl ComparisonRule for EmailDomainOnly {
    fn name(&self) -> &str {
        "email domain"
    }

    fn applies_to(&self, context: &RuleContext<'_>) -> bool {
        context.path.last_member() == Some("Email")
    }

    fn compare(&self, context: &RuleContext<'_>, scope: &mut FailureScope) -> Result<bool, RuleError> {
        let (Some(subject), Some(expectation)) = (context.subject.as_str(), context.expectation.as_str()) else {
            return Err(RuleError::new("email must be a string"));
        };
        let domain = |email: &str| email.rsplit('@').next().map(str::to_string);
        if domain(subject) != domain(expectation) {
            context.fail_mismatch(scope);
        }
        Ok(true)
    }
}

#[test]
fn test_custom_rule_object() {
    let mut subject = dto();
    subject.customer.email = "j.doe@example.com".into();
    assert_equivalent_with(&subject, &order(), |o| o.with_rule(EmailDomainOnly));

    subject.customer.email = "jane@other.org".into();
    let error = check_equivalent_with(&subject, &order(), |o| o.with_rule(EmailDomainOnly)).unwrap_err();
    assert_eq!(error.failures()[0].path().to_string(), "Customer.Email");
}

#[test]
fn test_rule_error_is_recorded() {
    let subject = Value::from(json!({"Email": 5}));
    let expectation = Value::from(json!({"Email": "a@b.c"}));
    let error = check_values_equivalent(&subject, &expectation, |o| o.with_rule(EmailDomainOnly)).unwrap_err();
    assert_eq!(
        error.failures()[0].message(),
        "comparison rule for Email failed: email must be a string"
    );
}

struct SkipAuditFields;

impl SelectionRule for SkipAuditFields {
    fn select_members(&self, mut selected: Vec<SelectedMember>, _context: &SelectionContext<'_>) -> Vec<SelectedMember> {
        selected.retain(|member| !member.name.starts_with("Audit"));
        selected
    }
}

#[test]
fn test_custom_selection_rule() {
    let subject = Value::from(json!({"Name": "x", "AuditUser": "root"}));
    let expectation = Value::from(json!({"Name": "x", "AuditUser": "admin"}));

    assert!(check_values_equivalent(&subject, &expectation, |o| o).is_err());
    assert_values_equivalent(&subject, &expectation, |o| o.with_selection_rule(SkipAuditFields));
}

struct SnakeToPascal;

impl MatchingRule for SnakeToPascal {
    fn match_member(&self, member: &SelectedMember, expectation: &Record, _path: &MemberPath) -> Option<String> {
        let pascal: String = member
            .name
            .split('_')
            .map(|part| {
                let mut chars = part.chars();
                chars
                    .next()
                    .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                    .unwrap_or_default()
            })
            .collect();
        expectation.member(&pascal).map(|m| m.name.clone())
    }
}

#[test]
fn test_custom_matching_rule() {
    let subject = Value::from(json!({"first_name": "Jane", "last_name": "Doe"}));
    let expectation = Value::from(json!({"FirstName": "Jane", "LastName": "Doe"}));
    assert_values_equivalent(&subject, &expectation, |o| o.with_matching_rule(SnakeToPascal));
}

#[test]
fn test_invalid_path_is_a_configuration_error() {
    let error = check_equivalent_with(&dto(), &order(), |o| o.excluding("Lines[x]")).unwrap_err();
    assert!(error.is_config());
    assert!(matches!(error, EquivalencyError::Config(ConfigError::InvalidPath { .. })));
}

#[test]
fn test_custom_formatter() {
    let formatter = Arc::new(DefaultFormatter::new(FormatterConfig::shallow()));
    let subject = Value::from(json!({"Inner": {"Deep": {"X": 1}}}));
    let expectation = Value::from(json!({"Inner": [1]}));

    let error = check_values_equivalent(&subject, &expectation, |o| o.with_formatter(formatter)).unwrap_err();
    assert_eq!(
        error.failures()[0].message(),
        "Expected Inner to be a sequence, but found object object { Deep = object {…} }."
    );
}

#[test]
fn test_shared_options_across_threads() {
    let engine = Arc::new(EquivalencyEngine::new(
        EquivalencyOptions::default().with_strict_ordering().because("threads share configuration"),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let subject = Value::seq([i, i + 1]);
                let expectation = Value::seq([i + 1, i]);
                engine.compare(&subject, &expectation).map(|scope| scope.failure_count())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 2);
    }
}

#[test]
fn test_engine_reuse_with_settings() {
    let settings = EquivalencySettings {
        exclude_missing_members: true,
        ..Default::default()
    };
    let engine = EquivalencyEngine::new(settings.to_options());

    let subject = Value::from(json!({"Name": "x", "Extra": 1}));
    let expectation = Value::from(json!({"Name": "x"}));
    assert!(engine.assert(&subject, &expectation).is_ok());
    assert!(engine.assert(&subject, &expectation).is_ok());
}
