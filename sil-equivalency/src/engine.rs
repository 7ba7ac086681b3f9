//! # 🧭 EquivalencyEngine — orquestrador da comparação
//!
//! Percorre o par (sujeito, expectativa) em profundidade. Em cada nó, nesta
//! ordem:
//!
//! 1. nulos: ambos nulos é sucesso; um só nulo é divergência;
//! 2. valores ilegíveis viram falha de introspecção restrita ao membro;
//! 3. regras de sobrescrita (a mais recente primeiro), com a palavra final;
//! 4. expectativa dicionário → pareamento por chave;
//! 5. expectativa coleção → [`collections`](crate::collections);
//! 6. folha (ou tipo comparado por valor) → igualdade e conversão;
//! 7. objeto composto → ciclo, limite de profundidade, seleção, pareamento
//!    e recursão por membro.
//!
//! Divergências nunca são `Err`: tudo vai para o [`FailureScope`]. Só
//! configuração inválida interrompe antes da travessia.

use tracing::{debug, trace};

use crate::collections;
use crate::convert;
use crate::cycle::CycleTracker;
use crate::error::{EquivalencyError, EquivalencyResult};
use crate::options::{CyclicReferenceHandling, EquivalencyOptions};
use crate::path::MemberPath;
use crate::rules::RuleContext;
use crate::scope::{FailureKind, FailureScope};
use crate::selection::SelectionContext;
use crate::value::{ObjectRef, Value};

/// Um passo da travessia
///
/// Criado por passo e nunca alterado: cada filho ganha um nó novo, com o
/// caminho do pai acrescido de um segmento.
#[derive(Debug)]
pub struct ComparisonNode<'v> {
    pub subject: &'v Value,
    pub expectation: &'v Value,
    pub path: MemberPath,
    /// Tipo declarado: o da expectativa (ou do sujeito, se ela for nula)
    pub type_name: String,
    pub depth: usize,
}

impl<'v> ComparisonNode<'v> {
    pub fn root(subject: &'v Value, expectation: &'v Value) -> Self {
        Self::new(subject, expectation, MemberPath::root(), 0)
    }

    fn new(subject: &'v Value, expectation: &'v Value, path: MemberPath, depth: usize) -> Self {
        let type_name = if expectation.is_null() {
            subject.type_name()
        } else {
            expectation.type_name()
        };
        Self {
            subject,
            expectation,
            path,
            type_name,
            depth,
        }
    }

    /// `self.name`
    pub fn member<'c>(&self, name: &str, subject: &'c Value, expectation: &'c Value) -> ComparisonNode<'c> {
        ComparisonNode::new(subject, expectation, self.path.child(name), self.depth + 1)
    }

    /// `self[index]`
    pub fn item<'c>(&self, index: usize, subject: &'c Value, expectation: &'c Value) -> ComparisonNode<'c> {
        ComparisonNode::new(subject, expectation, self.path.index(index), self.depth + 1)
    }

    /// `self[key]`
    pub fn entry<'c>(&self, key: &str, subject: &'c Value, expectation: &'c Value) -> ComparisonNode<'c> {
        ComparisonNode::new(subject, expectation, self.path.key(key), self.depth + 1)
    }
}

/// Motor de equivalência para um conjunto de opções
#[derive(Debug, Clone, Default)]
pub struct EquivalencyEngine {
    options: EquivalencyOptions,
}

impl EquivalencyEngine {
    pub fn new(options: EquivalencyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EquivalencyOptions {
        &self.options
    }

    /// Compara e devolve o escopo raiz com as falhas coletadas
    ///
    /// `Err` só para configuração inválida; divergências ficam no escopo.
    pub fn compare(&self, subject: &Value, expectation: &Value) -> Result<FailureScope, EquivalencyError> {
        self.options.validate()?;

        let mut scope = match self.options.reason() {
            Some(reason) => FailureScope::with_reason(reason),
            None => FailureScope::new(),
        };
        let mut tracker = CycleTracker::new();

        debug!(
            subject = %subject.type_name(),
            expectation = %expectation.type_name(),
            "starting equivalency comparison"
        );
        self.compare_node(&ComparisonNode::root(subject, expectation), &mut tracker, &mut scope);
        debug!(failures = scope.failure_count(), "equivalency comparison finished");

        Ok(scope)
    }

    /// Compara e converte as falhas em erro
    pub fn assert(&self, subject: &Value, expectation: &Value) -> EquivalencyResult<()> {
        self.compare(subject, expectation)?.into_result()?;
        Ok(())
    }

    pub(crate) fn compare_node(&self, node: &ComparisonNode<'_>, tracker: &mut CycleTracker, scope: &mut FailureScope) {
        trace!(path = %node.path, depth = node.depth, type_name = %node.type_name, "comparing node");

        match (node.subject, node.expectation) {
            (Value::Null, Value::Null) => return,
            (Value::Null, _) | (_, Value::Null) => {
                self.fail_mismatch(node, scope);
                return;
            }
            (Value::Inaccessible(reason), _) | (_, Value::Inaccessible(reason)) => {
                scope.fail_with(
                    &node.path,
                    FailureKind::Introspection,
                    "Could not read {path}: {reason}.",
                    &[("reason", reason.as_str())],
                );
                return;
            }
            _ => {}
        }

        let context = RuleContext {
            path: &node.path,
            type_name: &node.type_name,
            subject: node.subject,
            expectation: node.expectation,
            formatter: self.options.formatter(),
        };
        if self.options.rules().evaluate(&context, scope) {
            return;
        }

        match node.expectation {
            Value::Map(_) => collections::compare_dictionaries(self, node, tracker, scope),
            _ if node.subject.is_dictionary() => self.fail_non_dictionary_expectation(node, scope),
            Value::Seq(_) | Value::Bytes(_) => collections::compare_collections(self, node, tracker, scope),
            Value::Object(expectation) if !self.options.is_value_type(&node.type_name) => {
                self.compare_objects(node, expectation, tracker, scope)
            }
            _ => self.compare_leaves(node, scope),
        }
    }

    fn compare_leaves(&self, node: &ComparisonNode<'_>, scope: &mut FailureScope) {
        if node.subject.strict_eq(node.expectation) {
            return;
        }
        if self.options.auto_conversion() && convert::equal_after_conversion(node.subject, node.expectation) {
            trace!(path = %node.path, "equal after conversion");
            return;
        }
        self.fail_mismatch(node, scope);
    }

    fn compare_objects(
        &self,
        node: &ComparisonNode<'_>,
        expectation: &ObjectRef,
        tracker: &mut CycleTracker,
        scope: &mut FailureScope,
    ) {
        let Value::Object(subject) = node.subject else {
            let subject = self.options.formatter().format(node.subject);
            scope.fail_with(
                &node.path,
                FailureKind::Mismatch,
                "Expected {path} to be {type}, but found {subject}.",
                &[("type", node.type_name.as_str()), ("subject", subject.as_str())],
            );
            return;
        };

        let Some(mut tracker) = tracker.enter(subject, expectation) else {
            match self.options.cyclic_reference_handling() {
                CyclicReferenceHandling::Ignore => {
                    debug!(path = %node.path, "skipping cyclic reference");
                }
                CyclicReferenceHandling::Fail => {
                    let formatted = self.options.formatter().format(node.expectation);
                    scope.fail_with(
                        &node.path,
                        FailureKind::CyclicReference,
                        "Expected {path} to be {expectation}, but it contains a cyclic reference.",
                        &[("expectation", formatted.as_str())],
                    );
                }
            }
            return;
        };

        if self.options.recursion_limit().is_exceeded(node.depth) {
            debug!(path = %node.path, depth = node.depth, "recursion depth limit reached, not descending");
            return;
        }

        let subject_record = subject.borrow();
        let expectation_record = expectation.borrow();

        let selected = self.options.selector().select(&SelectionContext {
            path: &node.path,
            type_name: &node.type_name,
            record: &subject_record,
        });

        for member in selected {
            let Some(subject_value) = subject_record.get(&member.name) else {
                continue;
            };
            let counterpart = self
                .options
                .matcher()
                .match_member(&member, &expectation_record, &node.path);
            let Some(expectation_value) = counterpart.as_deref().and_then(|name| expectation_record.get(name)) else {
                if !self.options.excludes_missing_members() {
                    scope.fail_with(
                        &member.path,
                        FailureKind::Missing,
                        "Subject has property {path} that the other object does not have.",
                        &[],
                    );
                }
                continue;
            };

            let child = node.member(&member.name, subject_value, expectation_value);
            self.compare_node(&child, &mut tracker, scope);
        }
    }

    fn fail_non_dictionary_expectation(&self, node: &ComparisonNode<'_>, scope: &mut FailureScope) {
        let expectation = self.options.formatter().format(node.expectation);
        let subject = self.options.formatter().format(node.subject);
        scope.fail_with(
            &node.path,
            FailureKind::Dictionary,
            "Expected {path} to be a non-dictionary {expectation}, but found a dictionary {subject}.",
            &[("expectation", expectation.as_str()), ("subject", subject.as_str())],
        );
    }

    pub(crate) fn fail_mismatch(&self, node: &ComparisonNode<'_>, scope: &mut FailureScope) {
        RuleContext {
            path: &node.path,
            type_name: &node.type_name,
            subject: node.subject,
            expectation: node.expectation,
            formatter: self.options.formatter(),
        }
        .fail_mismatch(scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn compare(options: EquivalencyOptions, subject: impl Into<Value>, expectation: impl Into<Value>) -> Vec<String> {
        EquivalencyEngine::new(options)
            .compare(&subject.into(), &expectation.into())
            .unwrap()
            .into_failures()
            .into_iter()
            .map(|f| f.message().to_string())
            .collect()
    }

    #[test]
    fn test_null_handling() {
        assert!(compare(EquivalencyOptions::default(), Value::Null, Value::Null).is_empty());
        assert_eq!(
            compare(EquivalencyOptions::default(), Value::Null, "John"),
            vec!["Expected root to be \"John\", but found <null>."]
        );
    }

    #[test]
    fn test_node_paths_grow_from_parent() {
        let root_s = Value::Null;
        let root = ComparisonNode::root(&root_s, &root_s);
        let child = root.member("Level", &root_s, &root_s);
        let item = child.item(2, &root_s, &root_s);
        assert_eq!(item.path.to_string(), "Level[2]");
        assert_eq!(item.depth, 2);
        assert!(child.path.is_prefix_of(&item.path));
    }

    #[test]
    fn test_missing_member() {
        let subject = Record::new("Customer").with("Name", "John").with("Age", 36);
        let expectation = Record::new("Customer").with("Name", "John");
        assert_eq!(
            compare(EquivalencyOptions::default(), subject.clone(), expectation.clone()),
            vec!["Subject has property Age that the other object does not have."]
        );
        assert!(compare(EquivalencyOptions::default().excluding_missing_members(), subject, expectation).is_empty());
    }

    #[test]
    fn test_runtime_types_may_differ() {
        let subject = Record::new("CustomerDto").with("Name", "John");
        let expectation = Record::new("Customer").with("Name", "John");
        assert!(compare(EquivalencyOptions::default(), subject, expectation).is_empty());
    }

    #[test]
    fn test_inaccessible_member_does_not_stop_siblings() {
        let subject = Record::new("Customer")
            .with("Secret", Value::Inaccessible("getter panicked".into()))
            .with("Name", "Jane");
        let expectation = Record::new("Customer").with("Secret", "x").with("Name", "John");
        assert_eq!(
            compare(EquivalencyOptions::default(), subject, expectation),
            vec![
                "Could not read Secret: getter panicked.",
                "Expected Name to be \"John\", but found \"Jane\".",
            ]
        );
    }

    #[test]
    fn test_object_expected_but_leaf_found() {
        let expectation = Record::new("Address").with("City", "Recife");
        assert_eq!(
            compare(EquivalencyOptions::default(), "Recife", expectation),
            vec!["Expected root to be Address, but found \"Recife\"."]
        );
    }

    #[test]
    fn test_value_type_compares_by_equality() {
        let subject = Record::new("Money").with("Amount", 10).with("Currency", "BRL");
        let expectation = Record::new("Money").with("Amount", 10);
        let options = EquivalencyOptions::default().comparing_by_value("Money");
        assert_eq!(compare(options, subject, expectation).len(), 1);
    }

    #[test]
    fn test_invalid_configuration_stops_before_traversal() {
        let engine = EquivalencyEngine::new(EquivalencyOptions::default().including("A..B"));
        let error = engine.compare(&Value::from(1), &Value::from(2)).unwrap_err();
        assert!(error.is_config());
    }
}
