//! Symbol definitions and the unique symbol set

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Symbol identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub String);

impl SymbolId {
    /// Create a new symbol ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SymbolId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID (e.g., "Bell", "Cherry")
    pub id: SymbolId,
    /// Opaque visual key handed to the renderer, ignored by the core
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
}

impl Symbol {
    /// Create a symbol without a visual key
    pub fn new(id: impl Into<SymbolId>) -> Self {
        Self {
            id: id.into(),
            sprite: None,
        }
    }

    /// Attach a visual key
    pub fn with_sprite(mut self, sprite: impl Into<String>) -> Self {
        self.sprite = Some(sprite.into());
        self
    }
}

/// Unique symbols available to reel strips
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolSet {
    pub symbols: Vec<Symbol>,
}

impl SymbolSet {
    /// Create from a list of symbols
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    /// Fruit symbols of the reference machine
    pub fn reference() -> Self {
        Self::new(vec![
            Symbol::new("Bell").with_sprite("bell"),
            Symbol::new("Plum").with_sprite("plum"),
            Symbol::new("Cherry").with_sprite("cherry"),
            Symbol::new("Watermelon").with_sprite("watermelon"),
            Symbol::new("Orange").with_sprite("orange"),
            Symbol::new("Grapes").with_sprite("grapes"),
            Symbol::new("Lemon").with_sprite("lemon"),
        ])
    }

    /// Get symbol by ID
    pub fn get(&self, id: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id.as_str() == id)
    }

    /// Check if the set defines a symbol
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Reject duplicate identifiers
    pub fn validate(&self) -> ConfigResult<()> {
        for (i, symbol) in self.symbols.iter().enumerate() {
            if self.symbols[..i].iter().any(|s| s.id == symbol.id) {
                return Err(ConfigError::DuplicateSymbol(symbol.id.to_string()));
            }
        }
        Ok(())
    }
}
