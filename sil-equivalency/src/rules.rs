//! # ⚖️ ComparisonRuleSet — regras de sobrescrita
//!
//! Uma regra assume sozinha a comparação de um nó (sem recursão estrutural
//! abaixo dele). As regras formam uma pilha: a registrada por último é
//! consultada primeiro e pré-empta as anteriores.
//!
//! Resultado de [`ComparisonRule::compare`]:
//!
//! | Retorno | Efeito |
//! |---------|--------|
//! | `Ok(true)` | tratado; falhas que a regra escreveu no escopo ficam |
//! | `Ok(false)` | o motor registra a divergência padrão no caminho |
//! | `Err(e)` | falha `comparison rule for {path} failed: {e}` |
//! | pânico | capturado e registrado como o `Err` acima |

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::error::RuleError;
use crate::format::ValueFormatter;
use crate::path::{MemberPath, PathPattern, PathPredicate};
use crate::scope::{FailureKind, FailureScope};
use crate::value::Value;

/// Comparador de valores usado por [`PredicateRule`]
pub type ValueComparator = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// O que uma regra enxerga de um nó
pub struct RuleContext<'a> {
    pub path: &'a MemberPath,
    /// Tipo declarado do nó (o da expectativa)
    pub type_name: &'a str,
    pub subject: &'a Value,
    pub expectation: &'a Value,
    pub formatter: &'a dyn ValueFormatter,
}

impl RuleContext<'_> {
    /// Registra a divergência padrão para este nó
    pub fn fail_mismatch(&self, scope: &mut FailureScope) {
        let expectation = self.formatter.format(self.expectation);
        let subject = self.formatter.format(self.subject);
        scope.fail_with(
            self.path,
            FailureKind::Mismatch,
            "Expected {path} to be {expectation}, but found {subject}.",
            &[("expectation", expectation.as_str()), ("subject", subject.as_str())],
        );
    }
}

/// Regra de comparação sobrescrita
pub trait ComparisonRule: Send + Sync {
    /// Nome curto para logs
    fn name(&self) -> &str {
        "custom"
    }

    fn applies_to(&self, context: &RuleContext<'_>) -> bool;

    fn compare(&self, context: &RuleContext<'_>, scope: &mut FailureScope) -> Result<bool, RuleError>;
}

/// `(predicado(caminho, tipo), comparador(sujeito, expectativa))`
pub struct PredicateRule {
    predicate: PathPredicate,
    comparator: ValueComparator,
}

impl PredicateRule {
    pub fn new<P, C>(predicate: P, comparator: C) -> Self
    where
        P: Fn(&MemberPath, &str) -> bool + Send + Sync + 'static,
        C: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            comparator: Arc::new(comparator),
        }
    }
}

impl ComparisonRule for PredicateRule {
    fn name(&self) -> &str {
        "predicate"
    }

    fn applies_to(&self, context: &RuleContext<'_>) -> bool {
        (self.predicate)(context.path, context.type_name)
    }

    fn compare(&self, context: &RuleContext<'_>, _scope: &mut FailureScope) -> Result<bool, RuleError> {
        Ok((self.comparator)(context.subject, context.expectation))
    }
}

/// Compara números em um caminho com tolerância absoluta
#[derive(Debug, Clone)]
pub struct ToleranceRule {
    pattern: PathPattern,
    epsilon: f64,
}

impl ToleranceRule {
    pub fn new(pattern: PathPattern, epsilon: f64) -> Self {
        Self { pattern, epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl ComparisonRule for ToleranceRule {
    fn name(&self) -> &str {
        "tolerance"
    }

    fn applies_to(&self, context: &RuleContext<'_>) -> bool {
        self.pattern.matches(context.path)
    }

    fn compare(&self, context: &RuleContext<'_>, scope: &mut FailureScope) -> Result<bool, RuleError> {
        let (Some(subject), Some(expectation)) = (context.subject.as_f64(), context.expectation.as_f64()) else {
            return Ok(false);
        };
        let difference = (subject - expectation).abs();
        if difference <= self.epsilon {
            return Ok(true);
        }
        scope.fail_with(
            context.path,
            FailureKind::Mismatch,
            "Expected {path} to approximate {expectation} +/- {epsilon}, but {subject} differed by {difference}.",
            &[
                ("expectation", context.formatter.format(context.expectation).as_str()),
                ("epsilon", self.epsilon.to_string().as_str()),
                ("subject", context.formatter.format(context.subject).as_str()),
                ("difference", difference.to_string().as_str()),
            ],
        );
        Ok(true)
    }
}

/// Pilha de regras; a busca vai do topo para a base
#[derive(Clone, Default)]
pub struct ComparisonRuleSet {
    rules: Vec<Arc<dyn ComparisonRule>>,
}

impl ComparisonRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Arc<dyn ComparisonRule>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Regra mais recente que se aplica ao nó
    pub fn find(&self, context: &RuleContext<'_>) -> Option<&Arc<dyn ComparisonRule>> {
        self.rules.iter().rev().find(|rule| rule.applies_to(context))
    }

    /// Aplica a regra encontrada. `false` se nenhuma regra assumiu o nó.
    pub fn evaluate(&self, context: &RuleContext<'_>, scope: &mut FailureScope) -> bool {
        let Some(rule) = self.find(context) else {
            return false;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.compare(context, scope)));
        match outcome {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => context.fail_mismatch(scope),
            Ok(Err(error)) => report_rule_error(context, scope, error.message()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(rule = rule.name(), path = %context.path, "comparison rule panicked: {}", message);
                report_rule_error(context, scope, &message);
            }
        }
        true
    }
}

impl fmt::Debug for ComparisonRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|rule| rule.name())).finish()
    }
}

fn report_rule_error(context: &RuleContext<'_>, scope: &mut FailureScope, message: &str) {
    scope.fail_with(
        context.path,
        FailureKind::Rule,
        "comparison rule for {path} failed: {error}",
        &[("error", message)],
    );
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "comparator panicked".to_string()
    }
}
