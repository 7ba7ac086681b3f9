//! # ⚙️ EquivalencyOptions — configuração imutável de uma comparação
//!
//! Construída por um builder fluente (por valor) antes da comparação e
//! somente lida durante ela. Clonar é barato: regras e formatador são
//! compartilhados por `Arc`.
//!
//! ```text
//! EquivalencyOptions::default()
//!     .excluding("Level.Level.Text")
//!     .with_strict_ordering_for("Items")
//!     .ignoring_cyclic_references()
//! ```
//!
//! Expressões de caminho inválidas não entram em pânico no builder: ficam
//! registradas e [`EquivalencyOptions::validate`] devolve o primeiro erro
//! antes de qualquer travessia.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::format::{DefaultFormatter, ValueFormatter};
use crate::matching::{MappingRule, MatchingRule, MemberMatcher};
use crate::path::{MemberPath, PathPattern, PathSelector};
use crate::rules::{ComparisonRule, ComparisonRuleSet, PredicateRule, ToleranceRule};
use crate::selection::{MemberSelector, SelectionRule};
use crate::value::Value;

/// Profundidade padrão de recursão
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 10;

/// A ordem dos elementos de uma coleção importa?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingMode {
    Strict,
    #[default]
    Loose,
}

/// O que fazer ao encontrar uma referência cíclica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclicReferenceHandling {
    #[default]
    Fail,
    Ignore,
}

/// Limite de profundidade da travessia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionLimit {
    Bounded(usize),
    Unbounded,
}

impl Default for RecursionLimit {
    fn default() -> Self {
        RecursionLimit::Bounded(DEFAULT_MAX_RECURSION_DEPTH)
    }
}

impl RecursionLimit {
    /// `depth` passou do limite?
    pub fn is_exceeded(&self, depth: usize) -> bool {
        match self {
            RecursionLimit::Bounded(limit) => depth > *limit,
            RecursionLimit::Unbounded => false,
        }
    }
}

/// Política de ordenação: padrão global + sobrescritas por caminho
#[derive(Debug, Clone, Default)]
pub struct OrderingRules {
    default: OrderingMode,
    overrides: Vec<(PathSelector, OrderingMode)>,
}

impl OrderingRules {
    /// A sobrescrita mais recente que casa vence
    pub fn mode_for(&self, path: &MemberPath, type_name: &str) -> OrderingMode {
        self.overrides
            .iter()
            .rev()
            .find(|(selector, _)| selector.matches(path, type_name))
            .map_or(self.default, |(_, mode)| *mode)
    }
}

/// Opções de uma comparação de equivalência
#[derive(Clone)]
pub struct EquivalencyOptions {
    selector: MemberSelector,
    matcher: MemberMatcher,
    exclude_missing_members: bool,
    ordering: OrderingRules,
    cyclic_references: CyclicReferenceHandling,
    recursion_limit: RecursionLimit,
    rules: ComparisonRuleSet,
    value_types: Vec<String>,
    auto_conversion: bool,
    formatter: Arc<dyn ValueFormatter>,
    reason: Option<String>,
    config_errors: Vec<ConfigError>,
}

impl Default for EquivalencyOptions {
    fn default() -> Self {
        Self {
            selector: MemberSelector::new(),
            matcher: MemberMatcher::new(),
            exclude_missing_members: false,
            ordering: OrderingRules::default(),
            cyclic_references: CyclicReferenceHandling::default(),
            recursion_limit: RecursionLimit::default(),
            rules: ComparisonRuleSet::new(),
            value_types: Vec::new(),
            auto_conversion: true,
            formatter: Arc::new(DefaultFormatter::default()),
            reason: None,
            config_errors: Vec::new(),
        }
    }
}

impl EquivalencyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    fn selector_or_error(&mut self, expression: &str) -> Option<PathSelector> {
        match PathSelector::parse(expression) {
            Ok(selector) => Some(selector),
            Err(error) => {
                self.config_errors.push(error);
                None
            }
        }
    }

    // =========================================================================
    // Seleção de membros
    // =========================================================================

    /// Compara só o caminho indicado (e o que estiver acima/abaixo dele)
    pub fn including(mut self, path: &str) -> Self {
        if let Some(selector) = self.selector_or_error(path) {
            self.selector.include(selector);
        }
        self
    }

    pub fn including_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&MemberPath, &str) -> bool + Send + Sync + 'static,
    {
        self.selector.include(PathSelector::predicate(predicate));
        self
    }

    pub fn excluding(mut self, path: &str) -> Self {
        if let Some(selector) = self.selector_or_error(path) {
            self.selector.exclude(selector);
        }
        self
    }

    pub fn excluding_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&MemberPath, &str) -> bool + Send + Sync + 'static,
    {
        self.selector.exclude(PathSelector::predicate(predicate));
        self
    }

    /// Membros do sujeito sem correspondente na expectativa não falham
    pub fn excluding_missing_members(mut self) -> Self {
        self.exclude_missing_members = true;
        self
    }

    pub fn excluding_nested_objects(mut self) -> Self {
        self.selector.exclude_nested_objects();
        self
    }

    pub fn excluding_fields(mut self) -> Self {
        self.selector.exclude_fields();
        self
    }

    pub fn excluding_properties(mut self) -> Self {
        self.selector.exclude_properties();
        self
    }

    pub fn with_selection_rule(mut self, rule: impl SelectionRule + 'static) -> Self {
        self.selector.add_rule(Arc::new(rule));
        self
    }

    // =========================================================================
    // Pareamento
    // =========================================================================

    pub fn with_matching_rule(mut self, rule: impl MatchingRule + 'static) -> Self {
        self.matcher.add_rule(Arc::new(rule));
        self
    }

    /// Compara `subject.<subject>` com `expectation.<expectation>`
    pub fn with_mapping(mut self, subject: &str, expectation: &str) -> Self {
        if subject.trim().is_empty() || expectation.trim().is_empty() {
            self.config_errors.push(ConfigError::EmptyMapping {
                subject: subject.to_string(),
                expectation: expectation.to_string(),
            });
        } else {
            self.matcher.add_mapping(MappingRule::new(subject.trim(), expectation.trim()));
        }
        self
    }

    pub fn matching_names_case_insensitively(mut self) -> Self {
        self.matcher.case_insensitive();
        self
    }

    // =========================================================================
    // Ordenação
    // =========================================================================

    /// Ordem estrita em todas as coleções
    pub fn with_strict_ordering(mut self) -> Self {
        self.ordering = OrderingRules {
            default: OrderingMode::Strict,
            overrides: Vec::new(),
        };
        self
    }

    /// Ordem livre em todas as coleções (padrão)
    pub fn without_strict_ordering(mut self) -> Self {
        self.ordering = OrderingRules::default();
        self
    }

    pub fn with_strict_ordering_for(mut self, path: &str) -> Self {
        if let Some(selector) = self.selector_or_error(path) {
            self.ordering.overrides.push((selector, OrderingMode::Strict));
        }
        self
    }

    pub fn with_strict_ordering_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&MemberPath, &str) -> bool + Send + Sync + 'static,
    {
        self.ordering
            .overrides
            .push((PathSelector::predicate(predicate), OrderingMode::Strict));
        self
    }

    pub fn without_strict_ordering_for(mut self, path: &str) -> Self {
        if let Some(selector) = self.selector_or_error(path) {
            self.ordering.overrides.push((selector, OrderingMode::Loose));
        }
        self
    }

    // =========================================================================
    // Ciclos e profundidade
    // =========================================================================

    pub fn ignoring_cyclic_references(mut self) -> Self {
        self.cyclic_references = CyclicReferenceHandling::Ignore;
        self
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        if depth == 0 {
            self.config_errors.push(ConfigError::ZeroDepthLimit);
        } else {
            self.recursion_limit = RecursionLimit::Bounded(depth);
        }
        self
    }

    pub fn allowing_infinite_recursion(mut self) -> Self {
        self.recursion_limit = RecursionLimit::Unbounded;
        self
    }

    // =========================================================================
    // Regras de sobrescrita
    // =========================================================================

    /// `(predicado(caminho, tipo), comparador(sujeito, expectativa))`
    pub fn with_comparer<P, C>(self, predicate: P, comparator: C) -> Self
    where
        P: Fn(&MemberPath, &str) -> bool + Send + Sync + 'static,
        C: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.with_rule(PredicateRule::new(predicate, comparator))
    }

    pub fn with_rule(mut self, rule: impl ComparisonRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Números em `path` são iguais se diferirem no máximo `epsilon`
    pub fn using_tolerance(mut self, path: &str, epsilon: f64) -> Self {
        if !epsilon.is_finite() || epsilon < 0.0 {
            self.config_errors.push(ConfigError::InvalidTolerance {
                path: path.to_string(),
                value: epsilon,
            });
            return self;
        }
        match PathPattern::parse(path) {
            Ok(pattern) => self.rules.push(Arc::new(ToleranceRule::new(pattern, epsilon))),
            Err(error) => self.config_errors.push(error),
        }
        self
    }

    /// Registros desse tipo são comparados como folhas (igualdade profunda)
    pub fn comparing_by_value(mut self, type_name: &str) -> Self {
        if type_name.trim().is_empty() {
            self.config_errors.push(ConfigError::EmptyTypeName);
        } else {
            self.value_types.push(type_name.trim().to_string());
        }
        self
    }

    // =========================================================================
    // Diversos
    // =========================================================================

    pub fn without_auto_conversion(mut self) -> Self {
        self.auto_conversion = false;
        self
    }

    pub fn with_auto_conversion(mut self) -> Self {
        self.auto_conversion = true;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn ValueFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Motivo anexado ao relatório de falha
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    // =========================================================================
    // Leitura
    // =========================================================================

    /// Primeiro erro de configuração registrado pelo builder
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.config_errors.first() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    pub fn config_errors(&self) -> &[ConfigError] {
        &self.config_errors
    }

    pub fn selector(&self) -> &MemberSelector {
        &self.selector
    }

    pub fn matcher(&self) -> &MemberMatcher {
        &self.matcher
    }

    pub fn excludes_missing_members(&self) -> bool {
        self.exclude_missing_members
    }

    pub fn ordering(&self) -> &OrderingRules {
        &self.ordering
    }

    pub fn ordering_for(&self, path: &MemberPath, type_name: &str) -> OrderingMode {
        self.ordering.mode_for(path, type_name)
    }

    pub fn cyclic_reference_handling(&self) -> CyclicReferenceHandling {
        self.cyclic_references
    }

    pub fn recursion_limit(&self) -> RecursionLimit {
        self.recursion_limit
    }

    pub fn rules(&self) -> &ComparisonRuleSet {
        &self.rules
    }

    pub fn is_value_type(&self, type_name: &str) -> bool {
        self.value_types.iter().any(|t| t == type_name)
    }

    pub fn auto_conversion(&self) -> bool {
        self.auto_conversion
    }

    pub fn formatter(&self) -> &dyn ValueFormatter {
        self.formatter.as_ref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl fmt::Debug for EquivalencyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquivalencyOptions")
            .field("selector", &self.selector)
            .field("matcher", &self.matcher)
            .field("exclude_missing_members", &self.exclude_missing_members)
            .field("ordering", &self.ordering)
            .field("cyclic_references", &self.cyclic_references)
            .field("recursion_limit", &self.recursion_limit)
            .field("rules", &self.rules)
            .field("value_types", &self.value_types)
            .field("auto_conversion", &self.auto_conversion)
            .field("reason", &self.reason)
            .field("config_errors", &self.config_errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(expr: &str) -> MemberPath {
        expr.split('.').fold(MemberPath::root(), |p, name| p.child(name))
    }

    #[test]
    fn test_defaults() {
        let options = EquivalencyOptions::default();
        assert_eq!(options.recursion_limit(), RecursionLimit::Bounded(10));
        assert_eq!(options.cyclic_reference_handling(), CyclicReferenceHandling::Fail);
        assert_eq!(options.ordering_for(&path("Items"), "sequence"), OrderingMode::Loose);
        assert!(options.auto_conversion());
        assert!(!options.excludes_missing_members());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_last_ordering_rule_wins() {
        let options = EquivalencyOptions::default()
            .with_strict_ordering_for("Items")
            .without_strict_ordering_for("Items");
        assert_eq!(options.ordering_for(&path("Items"), "sequence"), OrderingMode::Loose);

        let options = EquivalencyOptions::default()
            .with_strict_ordering()
            .without_strict_ordering_for("Tags");
        assert_eq!(options.ordering_for(&path("Items"), "sequence"), OrderingMode::Strict);
        assert_eq!(options.ordering_for(&path("Tags"), "sequence"), OrderingMode::Loose);
    }

    #[test]
    fn test_invalid_configuration_is_recorded() {
        let options = EquivalencyOptions::default()
            .excluding("Level..Text")
            .with_max_recursion_depth(0)
            .using_tolerance("Price", f64::NAN);
        assert_eq!(options.config_errors().len(), 3);
        assert!(matches!(options.validate(), Err(ConfigError::InvalidPath { .. })));
    }

    #[test]
    fn test_builder_does_not_mutate_original() {
        let base = EquivalencyOptions::default();
        let strict = base.clone().with_strict_ordering().ignoring_cyclic_references();
        assert_eq!(base.ordering_for(&MemberPath::root(), "sequence"), OrderingMode::Loose);
        assert_eq!(strict.ordering_for(&MemberPath::root(), "sequence"), OrderingMode::Strict);
        assert_eq!(base.cyclic_reference_handling(), CyclicReferenceHandling::Fail);
    }

    #[test]
    fn test_recursion_limit() {
        assert!(!RecursionLimit::Bounded(2).is_exceeded(2));
        assert!(RecursionLimit::Bounded(2).is_exceeded(3));
        assert!(!RecursionLimit::Unbounded.is_exceeded(usize::MAX));
    }

    #[test]
    fn test_options_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EquivalencyOptions>();
    }
}
