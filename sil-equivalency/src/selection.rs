//! # 🎯 MemberSelector — quais membros participam
//!
//! Para cada nó composto, o seletor parte dos membros do registro do sujeito
//! e aplica as regras embutidas nesta ordem:
//!
//! 1. todos os membros, ou só os incluídos por caminho ([`IncludeMembersRule`]);
//! 2. exclusão por caminho ([`ExcludeMembersRule`]);
//! 3. exclusão de objetos aninhados ([`ExcludeNestedObjectsRule`]);
//! 4. filtro por tipo de membro ([`MemberKindRule`]).
//!
//! Regras customizadas rodam depois, na ordem em que foram adicionadas.
//! Nada é cacheado: o mesmo tipo pode ter seleções diferentes em caminhos
//! diferentes.

use std::fmt;
use std::sync::Arc;

use crate::path::{MemberPath, PathSelector};
use crate::value::{Member, MemberKind, Record};

/// Membro candidato à comparação
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedMember {
    pub name: String,
    pub kind: MemberKind,
    /// Caminho do membro (pai + nome)
    pub path: MemberPath,
    /// Tipo em tempo de execução do valor do membro
    pub type_name: String,
    pub is_object: bool,
}

impl SelectedMember {
    pub fn from_member(member: &Member, parent: &MemberPath) -> Self {
        Self {
            name: member.name.clone(),
            kind: member.kind,
            path: parent.child(&member.name),
            type_name: member.value.type_name(),
            is_object: member.value.is_object(),
        }
    }
}

/// Nó composto sendo selecionado
pub struct SelectionContext<'a> {
    pub path: &'a MemberPath,
    pub type_name: &'a str,
    /// Registro do sujeito
    pub record: &'a Record,
}

impl SelectionContext<'_> {
    /// Todos os membros do registro
    pub fn all_members(&self) -> Vec<SelectedMember> {
        self.record
            .members()
            .iter()
            .map(|member| SelectedMember::from_member(member, self.path))
            .collect()
    }
}

/// Estratégia plugável de seleção
pub trait SelectionRule: Send + Sync {
    fn name(&self) -> &str {
        "custom"
    }

    fn select_members(&self, selected: Vec<SelectedMember>, context: &SelectionContext<'_>) -> Vec<SelectedMember>;
}

/// Ponto de partida padrão: todos os membros legíveis
#[derive(Debug, Clone, Copy, Default)]
pub struct AllMembersRule;

impl SelectionRule for AllMembersRule {
    fn name(&self) -> &str {
        "all members"
    }

    fn select_members(&self, mut selected: Vec<SelectedMember>, context: &SelectionContext<'_>) -> Vec<SelectedMember> {
        for member in context.all_members() {
            if !selected.iter().any(|m| m.name == member.name) {
                selected.push(member);
            }
        }
        selected
    }
}

/// Modo "só incluídos": mantém o membro incluído, seus ancestrais e seus
/// descendentes
#[derive(Debug, Clone, Default)]
pub struct IncludeMembersRule {
    selectors: Vec<PathSelector>,
}

impl IncludeMembersRule {
    pub fn new(selectors: Vec<PathSelector>) -> Self {
        Self { selectors }
    }

    pub fn push(&mut self, selector: PathSelector) {
        self.selectors.push(selector);
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    fn includes(&self, member: &SelectedMember) -> bool {
        self.selectors.iter().any(|selector| match selector {
            PathSelector::Pattern(pattern) => {
                pattern.matches(&member.path)
                    || pattern.is_ancestor_of(&member.path)
                    || pattern.is_descendant_of(&member.path)
            }
            PathSelector::Predicate(predicate) => predicate(&member.path, &member.type_name),
        })
    }
}

impl SelectionRule for IncludeMembersRule {
    fn name(&self) -> &str {
        "include by path"
    }

    fn select_members(&self, _selected: Vec<SelectedMember>, context: &SelectionContext<'_>) -> Vec<SelectedMember> {
        context
            .all_members()
            .into_iter()
            .filter(|member| self.includes(member))
            .collect()
    }
}

/// Remove membros cujo caminho casa algum seletor
#[derive(Debug, Clone, Default)]
pub struct ExcludeMembersRule {
    selectors: Vec<PathSelector>,
}

impl ExcludeMembersRule {
    pub fn new(selectors: Vec<PathSelector>) -> Self {
        Self { selectors }
    }

    pub fn push(&mut self, selector: PathSelector) {
        self.selectors.push(selector);
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn excludes(&self, path: &MemberPath, type_name: &str) -> bool {
        self.selectors.iter().any(|selector| selector.matches(path, type_name))
    }
}

impl SelectionRule for ExcludeMembersRule {
    fn name(&self) -> &str {
        "exclude by path"
    }

    fn select_members(&self, mut selected: Vec<SelectedMember>, _context: &SelectionContext<'_>) -> Vec<SelectedMember> {
        selected.retain(|member| !self.excludes(&member.path, &member.type_name));
        selected
    }
}

/// Remove membros cujo valor é um objeto composto
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcludeNestedObjectsRule;

impl SelectionRule for ExcludeNestedObjectsRule {
    fn name(&self) -> &str {
        "exclude nested objects"
    }

    fn select_members(&self, mut selected: Vec<SelectedMember>, _context: &SelectionContext<'_>) -> Vec<SelectedMember> {
        selected.retain(|member| !member.is_object);
        selected
    }
}

/// Mantém só propriedades e/ou campos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberKindRule {
    pub properties: bool,
    pub fields: bool,
}

impl Default for MemberKindRule {
    fn default() -> Self {
        Self {
            properties: true,
            fields: true,
        }
    }
}

impl SelectionRule for MemberKindRule {
    fn name(&self) -> &str {
        "member kind"
    }

    fn select_members(&self, mut selected: Vec<SelectedMember>, _context: &SelectionContext<'_>) -> Vec<SelectedMember> {
        selected.retain(|member| match member.kind {
            MemberKind::Property => self.properties,
            MemberKind::Field => self.fields,
        });
        selected
    }
}

/// Pipeline de seleção de um conjunto de opções
#[derive(Clone, Default)]
pub struct MemberSelector {
    include: IncludeMembersRule,
    exclude: ExcludeMembersRule,
    exclude_nested_objects: bool,
    kinds: MemberKindRule,
    custom: Vec<Arc<dyn SelectionRule>>,
}

impl MemberSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, selector: PathSelector) {
        self.include.push(selector);
    }

    pub fn exclude(&mut self, selector: PathSelector) {
        self.exclude.push(selector);
    }

    pub fn exclude_nested_objects(&mut self) {
        self.exclude_nested_objects = true;
    }

    pub fn exclude_fields(&mut self) {
        self.kinds.fields = false;
    }

    pub fn exclude_properties(&mut self) {
        self.kinds.properties = false;
    }

    pub fn add_rule(&mut self, rule: Arc<dyn SelectionRule>) {
        self.custom.push(rule);
    }

    pub fn is_include_only(&self) -> bool {
        !self.include.is_empty()
    }

    /// Entrada de dicionário fora da comparação (`excluding("Scores.alice")`)
    pub fn is_excluded(&self, path: &MemberPath, type_name: &str) -> bool {
        self.exclude.excludes(path, type_name)
    }

    /// Membros a comparar neste nó, em ordem de declaração
    pub fn select(&self, context: &SelectionContext<'_>) -> Vec<SelectedMember> {
        let mut selected = if self.include.is_empty() {
            AllMembersRule.select_members(Vec::new(), context)
        } else {
            self.include.select_members(Vec::new(), context)
        };
        if !self.exclude.is_empty() {
            selected = self.exclude.select_members(selected, context);
        }
        if self.exclude_nested_objects {
            selected = ExcludeNestedObjectsRule.select_members(selected, context);
        }
        selected = self.kinds.select_members(selected, context);

        for rule in &self.custom {
            selected = rule.select_members(selected, context);
        }
        selected
    }
}

impl fmt::Debug for MemberSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberSelector")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("exclude_nested_objects", &self.exclude_nested_objects)
            .field("kinds", &self.kinds)
            .field("custom", &self.custom.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Record {
        Record::new("Customer")
            .with("Name", "John")
            .with("Age", 36)
            .with_field("Id", 7)
            .with("Address", Record::new("Address").with("City", "Recife"))
    }

    fn names(selected: &[SelectedMember]) -> Vec<&str> {
        selected.iter().map(|m| m.name.as_str()).collect()
    }

    fn select(selector: &MemberSelector, record: &Record, path: &MemberPath) -> Vec<SelectedMember> {
        selector.select(&SelectionContext {
            path,
            type_name: record.type_name(),
            record,
        })
    }

    #[test]
    fn test_all_members_by_default() {
        let record = customer();
        let selected = select(&MemberSelector::new(), &record, &MemberPath::root());
        assert_eq!(names(&selected), vec!["Name", "Age", "Id", "Address"]);
        assert_eq!(selected[3].path.to_string(), "Address");
        assert!(selected[3].is_object);
    }

    #[test]
    fn test_include_keeps_ancestors_and_descendants() {
        let mut selector = MemberSelector::new();
        selector.include(PathSelector::parse("Address.City").unwrap());
        let record = customer();
        assert_eq!(names(&select(&selector, &record, &MemberPath::root())), vec!["Address"]);

        let address = Record::new("Address").with("City", "Recife").with("Zip", "50000");
        let at_address = MemberPath::root().child("Address");
        assert_eq!(names(&select(&selector, &address, &at_address)), vec!["City"]);
    }

    #[test]
    fn test_exclude_by_path_and_predicate() {
        let mut selector = MemberSelector::new();
        selector.exclude(PathSelector::parse("Name").unwrap());
        selector.exclude(PathSelector::predicate(|_, ty| ty == "Address"));
        let record = customer();
        assert_eq!(names(&select(&selector, &record, &MemberPath::root())), vec!["Age", "Id"]);
    }

    #[test]
    fn test_exclude_nested_objects_and_kinds() {
        let mut selector = MemberSelector::new();
        selector.exclude_nested_objects();
        selector.exclude_fields();
        let record = customer();
        assert_eq!(names(&select(&selector, &record, &MemberPath::root())), vec!["Name", "Age"]);
    }

    struct DropAge;

    impl SelectionRule for DropAge {
        fn select_members(&self, mut selected: Vec<SelectedMember>, _: &SelectionContext<'_>) -> Vec<SelectedMember> {
            selected.retain(|m| m.name != "Age");
            selected
        }
    }

    #[test]
    fn test_custom_rule_runs_after_builtins() {
        let mut selector = MemberSelector::new();
        selector.include(PathSelector::parse("Age").unwrap());
        selector.include(PathSelector::parse("Name").unwrap());
        selector.add_rule(Arc::new(DropAge));
        let record = customer();
        assert_eq!(names(&select(&selector, &record, &MemberPath::root())), vec!["Name"]);
    }
}
