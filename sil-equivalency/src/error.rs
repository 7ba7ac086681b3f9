//! Tipos de erro para sil-equivalency
//!
//! Divergências estruturais nunca são erros: elas viram [`Failure`]s dentro
//! do [`FailureScope`](crate::scope::FailureScope). Os tipos abaixo cobrem o
//! que sobra: configuração inválida, regras que falham e o relatório final.

use thiserror::Error;

pub use crate::scope::{AssertionFailure, Failure, FailureKind};

/// Resultado customizado para operações de equivalência
pub type EquivalencyResult<T> = Result<T, EquivalencyError>;

/// Erros de configuração, detectados antes da travessia começar
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid member path '{expression}': {reason}")]
    InvalidPath { expression: String, reason: String },

    #[error("recursion depth limit must be at least 1")]
    ZeroDepthLimit,

    #[error("tolerance for '{path}' must be finite and non-negative, got {value}")]
    InvalidTolerance { path: String, value: f64 },

    #[error("member mapping requires non-empty names (got '{subject}' -> '{expectation}')")]
    EmptyMapping { subject: String, expectation: String },

    #[error("value-semantics type name must not be empty")]
    EmptyTypeName,
}

/// Erro levantado por uma regra de comparação customizada
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuleError {
    message: String,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Erros ao carregar `EquivalencySettings`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Failed to parse equivalency settings: {0}")]
    Parse(String),

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: String, value: String },
}

/// Erro de topo devolvido pelos pontos de entrada
#[derive(Debug, Error)]
pub enum EquivalencyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl EquivalencyError {
    /// Falhas coletadas, se o erro for uma asserção
    pub fn failures(&self) -> &[Failure] {
        match self {
            EquivalencyError::Assertion(failure) => failure.failures(),
            _ => &[],
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, EquivalencyError::Config(_))
    }
}
