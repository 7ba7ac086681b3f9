//! # 📚 CollectionEquivalence — sequências, bytes e dicionários
//!
//! ## Sequências
//!
//! O tamanho é verificado primeiro; com tamanhos diferentes nenhum elemento
//! é comparado.
//!
//! - **Ordem estrita**: elemento `i` contra elemento `i`.
//! - **Ordem livre** (padrão), em duas fases:
//!   1. para cada elemento da expectativa, em ordem, o primeiro elemento
//!      livre do sujeito que casa sem nenhuma falha;
//!   2. cada elemento da expectativa que sobrou fica com o elemento livre
//!      do sujeito de menor número de falhas (empate: menor índice), e as
//!      falhas desse candidato são reportadas com o índice do sujeito.
//!
//! Cada tentativa roda em um [`FailureScope`] aninhado e descartado, então
//! candidatos rejeitados não vazam falhas. O resultado é determinístico para
//! as mesmas entradas.
//!
//! ## Bytes
//!
//! Sempre em ordem, independente da política de ordenação.
//!
//! ## Dicionários
//!
//! Pareamento por igualdade de chave, nunca por posição.

use std::collections::HashMap;

use tracing::trace;

use crate::cycle::CycleTracker;
use crate::engine::{ComparisonNode, EquivalencyEngine};
use crate::options::OrderingMode;
use crate::scope::{Failure, FailureKind, FailureScope};
use crate::value::Value;

/// Hipótese de pareamento de um elemento do sujeito com um da expectativa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub subject_index: usize,
    pub expectation_index: usize,
    pub mismatch_score: usize,
    pub failures: Vec<Failure>,
}

impl MatchCandidate {
    pub fn is_exact(&self) -> bool {
        self.mismatch_score == 0
    }
}

pub(crate) fn compare_collections(
    engine: &EquivalencyEngine,
    node: &ComparisonNode<'_>,
    tracker: &mut CycleTracker,
    scope: &mut FailureScope,
) {
    let options = engine.options();
    let formatter = options.formatter();

    let Some(actual_len) = node.subject.len().filter(|_| node.subject.is_collection()) else {
        scope.fail_with(
            &node.path,
            FailureKind::Collection,
            "Expected {path} to be a {expected}, but found {actual} {subject}.",
            &[
                ("expected", node.expectation.type_name().as_str()),
                ("actual", node.subject.type_name().as_str()),
                ("subject", formatter.format(node.subject).as_str()),
            ],
        );
        return;
    };
    let expected_len = node.expectation.len().unwrap_or(0);

    if actual_len != expected_len {
        scope.fail_with(
            &node.path,
            FailureKind::Collection,
            "Expected {path} to be a collection with {expected} item(s), but found {actual}.",
            &[
                ("expected", expected_len.to_string().as_str()),
                ("actual", actual_len.to_string().as_str()),
            ],
        );
        return;
    }

    match (node.subject, node.expectation) {
        (Value::Bytes(subject), Value::Bytes(expectation)) => {
            compare_bytes(engine, node, subject, expectation, scope);
        }
        (Value::Bytes(_), _) | (_, Value::Bytes(_)) => {
            let subject_items = as_items(node.subject);
            let expectation_items = as_items(node.expectation);
            let subject: Vec<&Value> = subject_items.iter().collect();
            let expectation: Vec<&Value> = expectation_items.iter().collect();
            compare_strict(engine, node, &subject, &expectation, tracker, scope);
        }
        (Value::Seq(subject), Value::Seq(expectation)) => {
            let subject: Vec<&Value> = subject.iter().collect();
            let expectation: Vec<&Value> = expectation.iter().collect();
            match options.ordering_for(&node.path, &node.type_name) {
                OrderingMode::Strict => compare_strict(engine, node, &subject, &expectation, tracker, scope),
                OrderingMode::Loose => compare_loose(engine, node, &subject, &expectation, tracker, scope),
            }
        }
        _ => engine.fail_mismatch(node, scope),
    }
}

// Bytes viram valores para a comparação elemento a elemento com uma sequência
fn as_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Bytes(bytes) => bytes.iter().map(|b| Value::UInt(u64::from(*b))).collect(),
        Value::Seq(items) => items.clone(),
        _ => Vec::new(),
    }
}

fn compare_bytes(
    engine: &EquivalencyEngine,
    node: &ComparisonNode<'_>,
    subject: &[u8],
    expectation: &[u8],
    scope: &mut FailureScope,
) {
    let Some(index) = subject.iter().zip(expectation).position(|(s, e)| s != e) else {
        return;
    };
    let formatter = engine.options().formatter();
    scope.fail_with(
        &node.path,
        FailureKind::Collection,
        "Expected {path} to be {expectation}, but found {subject} (first difference at index {index}).",
        &[
            ("expectation", formatter.format(node.expectation).as_str()),
            ("subject", formatter.format(node.subject).as_str()),
            ("index", index.to_string().as_str()),
        ],
    );
}

fn compare_strict(
    engine: &EquivalencyEngine,
    node: &ComparisonNode<'_>,
    subject: &[&Value],
    expectation: &[&Value],
    tracker: &mut CycleTracker,
    scope: &mut FailureScope,
) {
    for (index, (s, e)) in subject.iter().zip(expectation).enumerate() {
        let child = node.item(index, s, e);
        engine.compare_node(&child, tracker, scope);
    }
}

fn compare_loose(
    engine: &EquivalencyEngine,
    node: &ComparisonNode<'_>,
    subject: &[&Value],
    expectation: &[&Value],
    tracker: &mut CycleTracker,
    scope: &mut FailureScope,
) {
    let mut taken = vec![false; subject.len()];
    let mut trials: HashMap<(usize, usize), MatchCandidate> = HashMap::new();
    let mut unmatched = Vec::new();

    let mut trial = |s: usize, e: usize, tracker: &mut CycleTracker, scope: &mut FailureScope| -> MatchCandidate {
        trials
            .entry((s, e))
            .or_insert_with(|| {
                let child = node.item(s, subject[s], expectation[e]);
                let mut nested = scope.open();
                engine.compare_node(&child, tracker, &mut nested);
                let failures = nested.discard();
                MatchCandidate {
                    subject_index: s,
                    expectation_index: e,
                    mismatch_score: failures.len(),
                    failures,
                }
            })
            .clone()
    };

    // Fase 1: primeiro casamento exato
    for e in 0..expectation.len() {
        let exact = (0..subject.len())
            .filter(|&s| !taken[s])
            .find(|&s| trial(s, e, tracker, scope).is_exact());
        match exact {
            Some(s) => taken[s] = true,
            None => unmatched.push(e),
        }
    }

    // Fase 2: o candidato mais próximo leva as falhas
    for e in unmatched {
        let closest = (0..subject.len())
            .filter(|&s| !taken[s])
            .map(|s| trial(s, e, tracker, scope))
            .min_by_key(|candidate| (candidate.mismatch_score, candidate.subject_index));
        let Some(candidate) = closest else {
            continue;
        };
        trace!(
            path = %node.path,
            expectation_index = candidate.expectation_index,
            subject_index = candidate.subject_index,
            score = candidate.mismatch_score,
            "closest match"
        );
        taken[candidate.subject_index] = true;
        for failure in candidate.failures {
            scope.fail(failure);
        }
    }
}

pub(crate) fn compare_dictionaries(
    engine: &EquivalencyEngine,
    node: &ComparisonNode<'_>,
    tracker: &mut CycleTracker,
    scope: &mut FailureScope,
) {
    let options = engine.options();
    let formatter = options.formatter();

    let Value::Map(expectation) = node.expectation else {
        return;
    };
    let Value::Map(subject) = node.subject else {
        scope.fail_with(
            &node.path,
            FailureKind::Dictionary,
            "Expected {path} to be a dictionary with {count} item(s), but found a non-dictionary {subject}.",
            &[
                ("count", expectation.len().to_string().as_str()),
                ("subject", formatter.format(node.subject).as_str()),
            ],
        );
        return;
    };

    let key_label = |key: &Value| match key {
        Value::Str(text) => text.clone(),
        other => formatter.format(other),
    };

    // `excluding` também vale para entradas: `Scores.alice` casa `Scores[alice]`
    let excluded = |key: &Value, value: &Value| {
        options
            .selector()
            .is_excluded(&node.path.key(key_label(key)), &value.type_name())
    };

    for (key, expected_value) in expectation {
        if excluded(key, expected_value) {
            continue;
        }
        match subject.iter().find(|(k, _)| k.strict_eq(key)) {
            Some((_, actual_value)) => {
                let child = node.entry(&key_label(key), actual_value, expected_value);
                engine.compare_node(&child, tracker, scope);
            }
            None => scope.fail_with(
                &node.path,
                FailureKind::Missing,
                "Expected {path} to contain key {key}.",
                &[("key", formatter.format(key).as_str())],
            ),
        }
    }

    if options.excludes_missing_members() {
        return;
    }
    for (key, actual_value) in subject {
        if excluded(key, actual_value) {
            continue;
        }
        if !expectation.iter().any(|(k, _)| k.strict_eq(key)) {
            scope.fail_with(
                &node.path,
                FailureKind::Missing,
                "Expected {path} to not contain key {key}, but the subject has it.",
                &[("key", formatter.format(key).as_str())],
            );
        }
    }
}
