//! # 🔁 CycleTracker — detecção de referências cíclicas
//!
//! Mantém a cadeia de ancestrais `(identidade, tipo)` do caminho de descida
//! ativo, uma pilha para o sujeito e outra para a expectativa. Um objeto é
//! cíclico quando já está na pilha do seu lado.
//!
//! A identidade só é rastreada ao longo do caminho ativo: o mesmo objeto
//! alcançado por dois ramos irmãos não é um ciclo.
//!
//! A pilha é independente da profundidade de recursão: o limite de
//! profundidade (`RecursionLimit`) é outro mecanismo.

use std::ops::{Deref, DerefMut};

use crate::value::ObjectRef;

/// Referência a um objeto no caminho ativo
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectReference {
    identity: usize,
    type_name: String,
}

impl ObjectReference {
    pub fn of(object: &ObjectRef) -> Self {
        Self {
            identity: object.identity(),
            type_name: object.type_name(),
        }
    }

    pub fn identity(&self) -> usize {
        self.identity
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Pilhas de ancestrais de uma comparação
#[derive(Debug, Default)]
pub struct CycleTracker {
    subject: Vec<ObjectReference>,
    expectation: Vec<ObjectReference>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profundidade de descida em objetos compostos
    pub fn depth(&self) -> usize {
        self.subject.len()
    }

    /// Algum dos dois objetos já está no caminho ativo?
    pub fn is_cyclic(&self, subject: &ObjectRef, expectation: &ObjectRef) -> bool {
        let subject = ObjectReference::of(subject);
        let expectation = ObjectReference::of(expectation);
        self.subject.contains(&subject) || self.expectation.contains(&expectation)
    }

    /// Empilha o par; `None` se formaria um ciclo (nada é empilhado)
    pub fn enter(&mut self, subject: &ObjectRef, expectation: &ObjectRef) -> Option<CycleGuard<'_>> {
        if self.is_cyclic(subject, expectation) {
            return None;
        }
        self.subject.push(ObjectReference::of(subject));
        self.expectation.push(ObjectReference::of(expectation));
        Some(CycleGuard { tracker: self })
    }

    fn leave(&mut self) {
        self.subject.pop();
        self.expectation.pop();
    }
}

/// Desempilha ao sair de escopo, em qualquer caminho de saída
pub struct CycleGuard<'a> {
    tracker: &'a mut CycleTracker,
}

impl Deref for CycleGuard<'_> {
    type Target = CycleTracker;

    fn deref(&self) -> &CycleTracker {
        self.tracker
    }
}

impl DerefMut for CycleGuard<'_> {
    fn deref_mut(&mut self) -> &mut CycleTracker {
        self.tracker
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn node(name: &str) -> ObjectRef {
        ObjectRef::new(Record::new("Node").with("Name", name))
    }

    #[test]
    fn test_enter_and_leave() {
        let mut tracker = CycleTracker::new();
        let (a, b) = (node("a"), node("b"));
        {
            let guard = tracker.enter(&a, &b).unwrap();
            assert_eq!(guard.depth(), 1);
        }
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_ancestor_is_cycle() {
        let mut tracker = CycleTracker::new();
        let (a, b) = (node("a"), node("b"));
        let (c, d) = (node("c"), node("d"));

        let mut outer = tracker.enter(&a, &b).unwrap();
        {
            let mut inner = outer.enter(&c, &d).unwrap();
            assert_eq!(inner.depth(), 2);
            assert!(inner.enter(&a, &d).is_none());
            assert!(inner.enter(&c, &b).is_none());
            assert_eq!(inner.depth(), 2);
        }
        assert_eq!(outer.depth(), 1);
    }

    #[test]
    fn test_sibling_reuse_is_not_cycle() {
        let mut tracker = CycleTracker::new();
        let (root_s, root_e) = (node("root"), node("root"));
        let (shared_s, shared_e) = (node("shared"), node("shared"));

        let mut root = tracker.enter(&root_s, &root_e).unwrap();
        {
            let first = root.enter(&shared_s, &shared_e);
            assert!(first.is_some());
        }
        let second = root.enter(&shared_s, &shared_e);
        assert!(second.is_some());
    }

    #[test]
    fn test_guard_pops_on_unwind() {
        let mut tracker = CycleTracker::new();
        let (a, b) = (node("a"), node("b"));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = tracker.enter(&a, &b).unwrap();
            panic!("comparator blew up");
        }));
        assert!(result.is_err());
        assert_eq!(tracker.depth(), 0);
    }
}
