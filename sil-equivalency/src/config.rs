//! Configuração de equivalência por arquivo (`equivalency.toml`) ou ambiente
//!
//! As configurações carregadas viram um [`EquivalencyOptions`] imutável que o
//! chamador cria uma vez (por exemplo, no início da suíte de testes) e passa
//! explicitamente para cada comparação. Não há padrão global mutável.
//!
//! ```toml
//! strict_ordering = true
//! ignore_cyclic_references = false
//! max_recursion_depth = 16   # 0 = sem limite
//! exclude_missing_members = false
//! exclude_nested_objects = false
//! auto_conversion = true
//! ```
//!
//! Variáveis de ambiente (um `.env` é carregado na primeira leitura):
//! `EQUIVALENCY_STRICT_ORDERING`, `EQUIVALENCY_IGNORE_CYCLIC_REFERENCES`,
//! `EQUIVALENCY_MAX_RECURSION_DEPTH` (`0` ou `unbounded` = sem limite),
//! `EQUIVALENCY_EXCLUDE_MISSING_MEMBERS`, `EQUIVALENCY_EXCLUDE_NESTED_OBJECTS`,
//! `EQUIVALENCY_AUTO_CONVERSION`.

use std::env;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SettingsError;
use crate::options::{DEFAULT_MAX_RECURSION_DEPTH, EquivalencyOptions};

// Carrega o .env na primeira leitura do ambiente
static DOTENV_INIT: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

#[inline]
fn ensure_loaded() {
    let _ = &*DOTENV_INIT;
}

pub const ENV_STRICT_ORDERING: &str = "EQUIVALENCY_STRICT_ORDERING";
pub const ENV_IGNORE_CYCLIC_REFERENCES: &str = "EQUIVALENCY_IGNORE_CYCLIC_REFERENCES";
pub const ENV_MAX_RECURSION_DEPTH: &str = "EQUIVALENCY_MAX_RECURSION_DEPTH";
pub const ENV_EXCLUDE_MISSING_MEMBERS: &str = "EQUIVALENCY_EXCLUDE_MISSING_MEMBERS";
pub const ENV_EXCLUDE_NESTED_OBJECTS: &str = "EQUIVALENCY_EXCLUDE_NESTED_OBJECTS";
pub const ENV_AUTO_CONVERSION: &str = "EQUIVALENCY_AUTO_CONVERSION";

/// Configurações serializáveis de equivalência
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivalencySettings {
    /// Ordem estrita em todas as coleções
    pub strict_ordering: bool,

    /// Pular subárvores cíclicas em vez de falhar
    pub ignore_cyclic_references: bool,

    /// `0` = sem limite
    pub max_recursion_depth: usize,

    pub exclude_missing_members: bool,

    pub exclude_nested_objects: bool,

    /// Conversão de folhas (`"36"` ↔ `36`)
    pub auto_conversion: bool,
}

impl Default for EquivalencySettings {
    fn default() -> Self {
        Self {
            strict_ordering: false,
            ignore_cyclic_references: false,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            exclude_missing_members: false,
            exclude_nested_objects: false,
            auto_conversion: true,
        }
    }
}

impl EquivalencySettings {
    /// Parse de conteúdo TOML
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Lê um arquivo TOML
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let settings = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded equivalency settings");
        Ok(settings)
    }

    /// Serializa para TOML
    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Lê `EQUIVALENCY_*` do ambiente (e do `.env`)
    pub fn from_env() -> Result<Self, SettingsError> {
        ensure_loaded();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Lê as variáveis por uma função de consulta; ausentes ficam no padrão
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(value) = lookup(ENV_STRICT_ORDERING) {
            settings.strict_ordering = parse_flag(ENV_STRICT_ORDERING, &value)?;
        }
        if let Some(value) = lookup(ENV_IGNORE_CYCLIC_REFERENCES) {
            settings.ignore_cyclic_references = parse_flag(ENV_IGNORE_CYCLIC_REFERENCES, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_RECURSION_DEPTH) {
            settings.max_recursion_depth = parse_depth(&value)?;
        }
        if let Some(value) = lookup(ENV_EXCLUDE_MISSING_MEMBERS) {
            settings.exclude_missing_members = parse_flag(ENV_EXCLUDE_MISSING_MEMBERS, &value)?;
        }
        if let Some(value) = lookup(ENV_EXCLUDE_NESTED_OBJECTS) {
            settings.exclude_nested_objects = parse_flag(ENV_EXCLUDE_NESTED_OBJECTS, &value)?;
        }
        if let Some(value) = lookup(ENV_AUTO_CONVERSION) {
            settings.auto_conversion = parse_flag(ENV_AUTO_CONVERSION, &value)?;
        }

        Ok(settings)
    }

    /// Opções equivalentes a estas configurações
    pub fn to_options(&self) -> EquivalencyOptions {
        EquivalencyOptions::from_settings(self)
    }
}

impl EquivalencyOptions {
    /// Opções a partir de configurações carregadas
    pub fn from_settings(settings: &EquivalencySettings) -> Self {
        let mut options = EquivalencyOptions::default();
        if settings.strict_ordering {
            options = options.with_strict_ordering();
        }
        if settings.ignore_cyclic_references {
            options = options.ignoring_cyclic_references();
        }
        options = match settings.max_recursion_depth {
            0 => options.allowing_infinite_recursion(),
            depth => options.with_max_recursion_depth(depth),
        };
        if settings.exclude_missing_members {
            options = options.excluding_missing_members();
        }
        if settings.exclude_nested_objects {
            options = options.excluding_nested_objects();
        }
        if !settings.auto_conversion {
            options = options.without_auto_conversion();
        }
        options
    }
}

fn parse_flag(var: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::Env {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_depth(value: &str) -> Result<usize, SettingsError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("unbounded") {
        return Ok(0);
    }
    trimmed.parse::<usize>().map_err(|_| SettingsError::Env {
        var: ENV_MAX_RECURSION_DEPTH.to_string(),
        value: value.to_string(),
    })
}
