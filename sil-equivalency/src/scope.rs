//! # 📋 FailureScope — coleta de falhas
//!
//! Pilha de coletores. Só o coletor mais interno aceita falhas novas.
//! Ao fechar, um coletor aninhado funde suas falhas no pai (fechamento
//! normal) ou as descarta ([`ScopeGuard::discard`]). O fechamento da raiz
//! ([`FailureScope::into_result`]) transforma as falhas acumuladas em um
//! único [`AssertionFailure`].
//!
//! ```text
//! root ─┬─ fail("a")
//!       └─ open() ── fail("b") ── discard()   → root = ["a"]
//!       └─ open() ── fail("a") ── drop        → root = ["a"] (dedup)
//! ```
//!
//! O guard é RAII: o escopo aninhado fecha em qualquer caminho de saída,
//! inclusive durante unwinding.

use std::fmt;
use std::ops::{Deref, DerefMut};

use thiserror::Error;

use crate::path::MemberPath;

/// Categoria de uma falha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Valores diferentes
    Mismatch,
    /// Membro ou chave ausente de um dos lados
    Missing,
    /// Cardinalidade ou forma de coleção
    Collection,
    /// Dicionário comparado com não-dicionário
    Dictionary,
    /// Referência cíclica no caminho ativo
    CyclicReference,
    /// Regra de comparação customizada
    Rule,
    /// Membro cujo valor não pôde ser lido
    Introspection,
}

/// Uma falha com caminho
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    path: MemberPath,
    kind: FailureKind,
    message: String,
}

impl Failure {
    pub fn new(path: MemberPath, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    pub fn path(&self) -> &MemberPath {
        &self.path
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Texto final; é o que a deduplicação compara
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Substitui `{path}` e `{nome}` em um template de mensagem
pub fn render_template(template: &str, path: &MemberPath, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        if name == "path" {
            out.push_str(&path.to_string());
        } else if let Some((_, value)) = args.iter().find(|(key, _)| *key == name) {
            out.push_str(value);
        } else {
            out.push('{');
            out.push_str(name);
            out.push('}');
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Default)]
struct Frame {
    failures: Vec<Failure>,
}

impl Frame {
    fn push(&mut self, failure: Failure) {
        if !self.failures.iter().any(|f| f.message == failure.message) {
            self.failures.push(failure);
        }
    }
}

/// Pilha de coletores de falhas de uma comparação
#[derive(Debug)]
pub struct FailureScope {
    root: Frame,
    nested: Vec<Frame>,
    reason: Option<String>,
}

impl Default for FailureScope {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureScope {
    /// Cria o escopo raiz
    pub fn new() -> Self {
        Self {
            root: Frame::default(),
            nested: Vec::new(),
            reason: None,
        }
    }

    /// Raiz com motivo anexado ao relatório final ("because ...")
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            root: Frame::default(),
            nested: Vec::new(),
            reason: Some(reason.into()),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Registra uma falha no coletor mais interno
    pub fn fail(&mut self, failure: Failure) {
        self.current_mut().push(failure);
    }

    /// Primitiva de falha formatada: `{path}` e os argumentos nomeados
    pub fn fail_with(
        &mut self,
        path: &MemberPath,
        kind: FailureKind,
        template: &str,
        args: &[(&str, &str)],
    ) {
        let message = render_template(template, path, args);
        self.fail(Failure::new(path.clone(), kind, message));
    }

    /// Número de coletores aninhados abertos (0 = só a raiz)
    pub fn depth(&self) -> usize {
        self.nested.len()
    }

    /// Falhas do coletor mais interno
    pub fn failures(&self) -> &[Failure] {
        &self.current().failures
    }

    pub fn failure_count(&self) -> usize {
        self.current().failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.current().failures.is_empty()
    }

    /// Abre um coletor aninhado
    pub fn open(&mut self) -> ScopeGuard<'_> {
        self.nested.push(Frame::default());
        ScopeGuard {
            scope: self,
            closed: false,
        }
    }

    /// Fecha a raiz: `Ok` sem falhas, senão o relatório agregado
    pub fn into_result(self) -> Result<(), AssertionFailure> {
        let reason = self.reason.clone();
        let failures = self.into_failures();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AssertionFailure { failures, reason })
        }
    }

    pub fn into_failures(self) -> Vec<Failure> {
        // Guards emprestam &mut: aqui não há coletor aninhado aberto
        self.root.failures
    }

    fn current(&self) -> &Frame {
        self.nested.last().unwrap_or(&self.root)
    }

    fn current_mut(&mut self) -> &mut Frame {
        match self.nested.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    fn pop_child(&mut self) -> Vec<Failure> {
        self.nested.pop().map(|frame| frame.failures).unwrap_or_default()
    }
}

/// Coletor aninhado; fecha (funde no pai) ao sair de escopo
pub struct ScopeGuard<'a> {
    scope: &'a mut FailureScope,
    closed: bool,
}

impl ScopeGuard<'_> {
    /// Descarta as falhas deste coletor e as devolve ao chamador
    pub fn discard(mut self) -> Vec<Failure> {
        self.closed = true;
        self.scope.pop_child()
    }

    /// Fecha explicitamente, fundindo no pai
    pub fn close(self) {}
}

impl Deref for ScopeGuard<'_> {
    type Target = FailureScope;

    fn deref(&self) -> &FailureScope {
        self.scope
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut FailureScope {
        self.scope
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let failures = self.scope.pop_child();
        let parent = self.scope.current_mut();
        for failure in failures {
            parent.push(failure);
        }
    }
}

/// Relatório agregado de uma comparação que falhou
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct AssertionFailure {
    failures: Vec<Failure>,
    reason: Option<String>,
}

impl AssertionFailure {
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Alguma falha menciona o trecho?
    pub fn mentions(&self, text: &str) -> bool {
        self.failures.iter().any(|f| f.message.contains(text))
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Found {} failure(s)", self.failures.len())?;
        if let Some(reason) = &self.reason {
            write!(f, " because {}", reason)?;
        }
        writeln!(f, ":")?;
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "\n[{}] {}", i + 1, failure)?;
        }
        Ok(())
    }
}
