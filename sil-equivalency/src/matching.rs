//! # 🔗 MemberMatcher — pareamento de membros
//!
//! Encontra, para um membro selecionado do sujeito, o membro correspondente
//! no registro da expectativa. Ordem de consulta:
//!
//! 1. regras customizadas, na ordem de registro;
//! 2. mapeamentos explícitos (`with_mapping`);
//! 3. nome exato, sensível a maiúsculas;
//! 4. nome sem distinção de maiúsculas, se habilitado.
//!
//! A primeira resposta `Some` vence.

use std::fmt;
use std::sync::Arc;

use crate::path::MemberPath;
use crate::selection::SelectedMember;
use crate::value::Record;

/// Estratégia plugável de pareamento
pub trait MatchingRule: Send + Sync {
    fn name(&self) -> &str {
        "custom"
    }

    /// Nome do membro correspondente na expectativa, se houver
    fn match_member(&self, member: &SelectedMember, expectation: &Record, path: &MemberPath) -> Option<String>;
}

/// Nome idêntico
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactNameRule;

impl MatchingRule for ExactNameRule {
    fn name(&self) -> &str {
        "exact name"
    }

    fn match_member(&self, member: &SelectedMember, expectation: &Record, _path: &MemberPath) -> Option<String> {
        expectation.member(&member.name).map(|m| m.name.clone())
    }
}

/// Nome igual ignorando maiúsculas/minúsculas
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveNameRule;

impl MatchingRule for CaseInsensitiveNameRule {
    fn name(&self) -> &str {
        "case-insensitive name"
    }

    fn match_member(&self, member: &SelectedMember, expectation: &Record, _path: &MemberPath) -> Option<String> {
        expectation
            .members()
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(&member.name))
            .map(|m| m.name.clone())
    }
}

/// `subject.Name` ↔ `expectation.FullName`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    subject: String,
    expectation: String,
}

impl MappingRule {
    pub fn new(subject: impl Into<String>, expectation: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            expectation: expectation.into(),
        }
    }
}

impl MatchingRule for MappingRule {
    fn name(&self) -> &str {
        "mapping"
    }

    fn match_member(&self, member: &SelectedMember, expectation: &Record, _path: &MemberPath) -> Option<String> {
        if member.name != self.subject {
            return None;
        }
        expectation.member(&self.expectation).map(|m| m.name.clone())
    }
}

/// Pipeline de pareamento de um conjunto de opções
#[derive(Clone, Default)]
pub struct MemberMatcher {
    custom: Vec<Arc<dyn MatchingRule>>,
    mappings: Vec<MappingRule>,
    case_insensitive: bool,
}

impl MemberMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Arc<dyn MatchingRule>) {
        self.custom.push(rule);
    }

    pub fn add_mapping(&mut self, mapping: MappingRule) {
        self.mappings.push(mapping);
    }

    pub fn case_insensitive(&mut self) {
        self.case_insensitive = true;
    }

    pub fn match_member(&self, member: &SelectedMember, expectation: &Record, path: &MemberPath) -> Option<String> {
        self.custom
            .iter()
            .find_map(|rule| rule.match_member(member, expectation, path))
            .or_else(|| {
                self.mappings
                    .iter()
                    .find_map(|mapping| mapping.match_member(member, expectation, path))
            })
            .or_else(|| ExactNameRule.match_member(member, expectation, path))
            .or_else(|| {
                if self.case_insensitive {
                    CaseInsensitiveNameRule.match_member(member, expectation, path)
                } else {
                    None
                }
            })
    }
}

impl fmt::Debug for MemberMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMatcher")
            .field("custom", &self.custom.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("mappings", &self.mappings)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Member;
    use crate::value::MemberKind;

    fn selected(name: &str) -> SelectedMember {
        let member = Member {
            name: name.to_string(),
            kind: MemberKind::Property,
            value: 1.into(),
        };
        SelectedMember::from_member(&member, &MemberPath::root())
    }

    fn expectation() -> Record {
        Record::new("Person").with("FullName", "John").with("age", 36).with("Name", "J")
    }

    #[test]
    fn test_exact_name_is_case_sensitive() {
        let matcher = MemberMatcher::new();
        let record = expectation();
        let path = MemberPath::root();
        assert_eq!(matcher.match_member(&selected("Name"), &record, &path), Some("Name".into()));
        assert_eq!(matcher.match_member(&selected("Age"), &record, &path), None);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let mut matcher = MemberMatcher::new();
        matcher.case_insensitive();
        let record = expectation();
        assert_eq!(
            matcher.match_member(&selected("Age"), &record, &MemberPath::root()),
            Some("age".into())
        );
    }

    #[test]
    fn test_mapping_precedes_exact_name() {
        let mut matcher = MemberMatcher::new();
        matcher.add_mapping(MappingRule::new("Name", "FullName"));
        let record = expectation();
        assert_eq!(
            matcher.match_member(&selected("Name"), &record, &MemberPath::root()),
            Some("FullName".into())
        );
    }

    struct Prefixed;

    impl MatchingRule for Prefixed {
        fn match_member(&self, member: &SelectedMember, expectation: &Record, _: &MemberPath) -> Option<String> {
            let name = format!("Full{}", member.name);
            expectation.member(&name).map(|m| m.name.clone())
        }
    }

    #[test]
    fn test_custom_rule_runs_first() {
        let mut matcher = MemberMatcher::new();
        matcher.add_mapping(MappingRule::new("Name", "age"));
        matcher.add_rule(Arc::new(Prefixed));
        let record = expectation();
        assert_eq!(
            matcher.match_member(&selected("Name"), &record, &MemberPath::root()),
            Some("FullName".into())
        );
    }
}
