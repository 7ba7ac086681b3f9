//! Caminhos de membros e seletores de caminho
//!
//! [`MemberPath`] localiza um nó no grafo comparado
//! (`Level.Collection[1].Text`). Cada filho é construído anexando um
//! segmento ao caminho do pai.
//!
//! [`PathSelector`] é o lado da configuração: uma expressão textual
//! (`Collection[].Text`, onde `[]` casa qualquer índice) ou um predicado
//! sobre `(caminho, tipo)`.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

/// Segmento de um caminho
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Member(String),
    Index(usize),
    Key(String),
}

/// Caminho de um nó a partir da raiz
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MemberPath {
    segments: Vec<PathSegment>,
}

impl MemberPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn appended(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// `parent.name`
    pub fn child(&self, name: &str) -> Self {
        self.appended(PathSegment::Member(name.to_string()))
    }

    /// `parent[index]`
    pub fn index(&self, index: usize) -> Self {
        self.appended(PathSegment::Index(index))
    }

    /// `parent[key]`
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.appended(PathSegment::Key(key.into()))
    }

    /// Nome do último membro, se o último segmento for um membro
    pub fn last_member(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Member(name)) => Some(name),
            _ => None,
        }
    }

    /// Verifica se `self` é prefixo (não necessariamente estrito) de `other`
    pub fn is_prefix_of(&self, other: &MemberPath) -> bool {
        other.segments.len() >= self.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "root");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Member(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Member(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Member(String),
    Index(usize),
    AnyIndex,
}

impl PatternSegment {
    fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (PatternSegment::Member(a), PathSegment::Member(b)) => a == b,
            (PatternSegment::Member(a), PathSegment::Key(b)) => a == b,
            (PatternSegment::Index(a), PathSegment::Index(b)) => a == b,
            (PatternSegment::AnyIndex, PathSegment::Index(_) | PathSegment::Key(_)) => true,
            _ => false,
        }
    }
}

/// Expressão de caminho já validada
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Analisa `Level.Collection[1].Text` / `Collection[].Text`
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPath {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        let source = expression.trim();
        if source.is_empty() {
            return Err(invalid("expression is empty"));
        }

        let mut segments = Vec::new();
        let mut name = String::new();
        let mut chars = source.chars().peekable();
        // true logo após `]`, quando um nome vazio é aceitável
        let mut after_bracket = false;

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if name.is_empty() && !after_bracket {
                        return Err(invalid("empty member name"));
                    }
                    if !name.is_empty() {
                        segments.push(PatternSegment::Member(std::mem::take(&mut name)));
                    }
                    if chars.peek().is_none() {
                        return Err(invalid("trailing '.'"));
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !name.is_empty() {
                        segments.push(PatternSegment::Member(std::mem::take(&mut name)));
                    }
                    let mut index = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == ']' {
                            closed = true;
                            break;
                        }
                        index.push(inner);
                    }
                    if !closed {
                        return Err(invalid("unclosed '['"));
                    }
                    let index = index.trim();
                    if index.is_empty() {
                        segments.push(PatternSegment::AnyIndex);
                    } else {
                        let parsed = index
                            .parse::<usize>()
                            .map_err(|_| invalid("index must be a non-negative integer"))?;
                        segments.push(PatternSegment::Index(parsed));
                    }
                    match chars.peek() {
                        None | Some('.') | Some('[') => {}
                        Some(_) => return Err(invalid("expected '.' or '[' after ']'")),
                    }
                    after_bracket = true;
                }
                ']' => return Err(invalid("unexpected ']'")),
                c if c.is_whitespace() => return Err(invalid("whitespace inside member name")),
                c => {
                    name.push(c);
                    after_bracket = false;
                }
            }
        }
        if !name.is_empty() {
            segments.push(PatternSegment::Member(name));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Casa exatamente o caminho
    pub fn matches(&self, path: &MemberPath) -> bool {
        let segments = self.relative(path);
        self.segments.len() == segments.len() && self.prefix_matches(segments)
    }

    /// O caminho está abaixo do padrão (descendente estrito)
    pub fn is_ancestor_of(&self, path: &MemberPath) -> bool {
        let segments = self.relative(path);
        segments.len() > self.segments.len() && self.prefix_matches(segments)
    }

    /// O caminho é um ancestral estrito do padrão
    pub fn is_descendant_of(&self, path: &MemberPath) -> bool {
        let segments = self.relative(path);
        segments.len() < self.segments.len()
            && self.segments.iter().zip(segments).all(|(p, s)| p.matches(s))
    }

    fn prefix_matches(&self, segments: &[PathSegment]) -> bool {
        self.segments.iter().zip(segments).all(|(p, s)| p.matches(s))
    }

    // Um padrão que começa por nome vale para cada item de uma coleção raiz:
    // `Name` casa `[3].Name`.
    fn relative<'p>(&self, path: &'p MemberPath) -> &'p [PathSegment] {
        let segments = path.segments();
        match self.segments.first() {
            Some(PatternSegment::Index(_) | PatternSegment::AnyIndex) => segments,
            _ => {
                let skip = segments
                    .iter()
                    .take_while(|s| matches!(s, PathSegment::Index(_)))
                    .count();
                &segments[skip..]
            }
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Predicado sobre `(caminho, nome do tipo)`
pub type PathPredicate = Arc<dyn Fn(&MemberPath, &str) -> bool + Send + Sync>;

/// Seleciona nós por caminho ou por predicado
#[derive(Clone)]
pub enum PathSelector {
    Pattern(PathPattern),
    Predicate(PathPredicate),
}

impl PathSelector {
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        PathPattern::parse(expression).map(PathSelector::Pattern)
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&MemberPath, &str) -> bool + Send + Sync + 'static,
    {
        PathSelector::Predicate(Arc::new(predicate))
    }

    /// Casa o nó exato
    pub fn matches(&self, path: &MemberPath, type_name: &str) -> bool {
        match self {
            PathSelector::Pattern(pattern) => pattern.matches(path),
            PathSelector::Predicate(predicate) => predicate(path, type_name),
        }
    }
}

impl fmt::Debug for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSelector::Pattern(pattern) => write!(f, "Pattern({})", pattern),
            PathSelector::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}
