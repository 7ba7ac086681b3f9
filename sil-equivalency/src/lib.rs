//! # 🪞 sil-equivalency — Validador de Equivalência Estrutural
//!
//! Dado um *sujeito* (produzido pelo código sob teste) e uma *expectativa*
//! (a forma desejada), decide se os grafos de objetos são estruturalmente
//! equivalentes: mesmos nomes de membros e mesmos valores,
//! independentemente do tipo exato em tempo de execução. Em caso de
//! divergência, reporta **todas** as diferenças, cada uma com o caminho no
//! grafo (`Level.Collection[1].Text`).
//!
//! ## Computational Complexity
//!
//! **Objetos e ordem estrita — O(n):**
//! - Cada nó é visitado uma vez; seleção e pareamento são lineares no
//!   número de membros do nó
//!
//! **Coleções em ordem livre — O(k² · m):**
//! - k elementos, m o custo de comparar um par; cada par é avaliado no
//!   máximo uma vez (tentativas ficam em cache durante a comparação)
//!
//! **Ciclos — O(d) por objeto:**
//! - Busca linear na pilha de ancestrais de profundidade d
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │         EquivalencyEngine                       │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  ComparisonRuleSet (sobrescritas)         │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  CollectionEquivalence (seq/bytes/dict)   │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  MemberSelector + MemberMatcher           │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  CycleTracker        FailureScope         │  │
//! │  └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use sil_equivalency::prelude::*;
//!
//! #[derive(Serialize)]
//! struct Customer { name: String, age: u32 }
//!
//! let subject = Customer { name: "John".into(), age: 36 };
//! let expectation = Customer { name: "Dennis".into(), age: 36 };
//!
//! // Só `age` participa
//! assert_equivalent_with(&subject, &expectation, |o| o.including("age"));
//!
//! // Falha com o relatório agregado
//! let error = check_equivalent(&subject, &expectation).unwrap_err();
//! assert!(error.to_string().contains("Expected name to be \"Dennis\""));
//! ```
//!
//! ## JSON como expectativa
//!
//! Um `serde_json::Value` passado por [`check_equivalent`] é serializado
//! como mapa e vira **dicionário**, enquanto uma struct vira **objeto**:
//! struct contra `json!({...})` falha sempre com divergência de dicionário.
//! Para comparar uma struct com JSON, converta o JSON em objeto com
//! `Value::from(json!(..))` e use [`check_values_equivalent`]:
//!
//! ```ignore
//! let expectation = Value::from(json!({"Name": "John", "Age": 36}));
//! check_values_equivalent(&Value::from_serialize(&person), &expectation, |o| o)?;
//! ```

use serde::Serialize;

pub mod collections;
pub mod config;
pub mod convert;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod format;
pub mod matching;
pub mod options;
pub mod path;
pub mod rules;
pub mod scope;
pub mod selection;
pub mod ser;
pub mod value;

pub use collections::MatchCandidate;
pub use config::EquivalencySettings;
pub use cycle::{CycleGuard, CycleTracker, ObjectReference};
pub use engine::{ComparisonNode, EquivalencyEngine};
pub use error::{
    AssertionFailure, ConfigError, EquivalencyError, EquivalencyResult, Failure, FailureKind,
    RuleError, SettingsError,
};
pub use format::{DefaultFormatter, FormatterConfig, ValueFormatter};
pub use matching::{CaseInsensitiveNameRule, ExactNameRule, MappingRule, MatchingRule, MemberMatcher};
pub use options::{
    CyclicReferenceHandling, EquivalencyOptions, OrderingMode, RecursionLimit,
    DEFAULT_MAX_RECURSION_DEPTH,
};
pub use path::{MemberPath, PathPattern, PathSegment, PathSelector};
pub use rules::{ComparisonRule, ComparisonRuleSet, PredicateRule, RuleContext, ToleranceRule};
pub use scope::{FailureScope, ScopeGuard};
pub use selection::{MemberSelector, SelectedMember, SelectionContext, SelectionRule};
pub use ser::to_value;
pub use value::{Member, MemberKind, ObjectRef, Record, Value};

/// Prelude com os itens mais usados
pub mod prelude {
    pub use crate::{
        assert_equivalent, assert_equivalent_with, assert_values_equivalent, check_equivalent,
        check_equivalent_with, check_values_equivalent,
    };
    pub use crate::{
        ComparisonRule, EquivalencyEngine, EquivalencyError, EquivalencyOptions, EquivalencySettings,
        MemberPath, ObjectRef, Record, RuleContext, Value,
    };
    pub use serde::Serialize;
}

/// Verifica equivalência com as opções padrão, devolvendo o relatório
///
/// Os dois lados passam pelo serde: structs viram objetos, mapas (inclusive
/// `serde_json::Value` de objeto) viram dicionários. Para JSON contra struct,
/// veja [`check_values_equivalent`] com `Value::from(json!(..))`.
pub fn check_equivalent<S, E>(subject: &S, expectation: &E) -> EquivalencyResult<()>
where
    S: Serialize + ?Sized,
    E: Serialize + ?Sized,
{
    check_equivalent_with(subject, expectation, |options| options)
}

/// Verifica equivalência; `configure` recebe as opções padrão
pub fn check_equivalent_with<S, E, F>(subject: &S, expectation: &E, configure: F) -> EquivalencyResult<()>
where
    S: Serialize + ?Sized,
    E: Serialize + ?Sized,
    F: FnOnce(EquivalencyOptions) -> EquivalencyOptions,
{
    check_values_equivalent(
        &Value::from_serialize(subject),
        &Value::from_serialize(expectation),
        configure,
    )
}

/// Verifica equivalência de valores já montados (grafos cíclicos, por exemplo)
///
/// `Value::from(serde_json::Value)` transforma objetos JSON em objetos (tipo
/// `object`), comparáveis membro a membro com `Value::from_serialize(&struct)`.
pub fn check_values_equivalent<F>(subject: &Value, expectation: &Value, configure: F) -> EquivalencyResult<()>
where
    F: FnOnce(EquivalencyOptions) -> EquivalencyOptions,
{
    EquivalencyEngine::new(configure(EquivalencyOptions::default())).assert(subject, expectation)
}

/// Asserção de teste: entra em pânico com o relatório agregado
#[track_caller]
pub fn assert_equivalent<S, E>(subject: &S, expectation: &E)
where
    S: Serialize + ?Sized,
    E: Serialize + ?Sized,
{
    if let Err(error) = check_equivalent(subject, expectation) {
        panic!("{error}");
    }
}

#[track_caller]
pub fn assert_equivalent_with<S, E, F>(subject: &S, expectation: &E, configure: F)
where
    S: Serialize + ?Sized,
    E: Serialize + ?Sized,
    F: FnOnce(EquivalencyOptions) -> EquivalencyOptions,
{
    if let Err(error) = check_equivalent_with(subject, expectation, configure) {
        panic!("{error}");
    }
}

#[track_caller]
pub fn assert_values_equivalent<F>(subject: &Value, expectation: &Value, configure: F)
where
    F: FnOnce(EquivalencyOptions) -> EquivalencyOptions,
{
    if let Err(error) = check_values_equivalent(subject, expectation, configure) {
        panic!("{error}");
    }
}
