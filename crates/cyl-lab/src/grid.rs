//! Grid snapshot: the flattened active symbols of every reel

use serde::{Deserialize, Serialize};

use crate::collaborators::VisualHandle;
use crate::symbols::SymbolId;

/// One cell of the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub symbol: SymbolId,
    pub handle: VisualHandle,
}

impl GridCell {
    pub fn new(symbol: impl Into<SymbolId>, handle: VisualHandle) -> Self {
        Self {
            symbol: symbol.into(),
            handle,
        }
    }
}

/// Cells in reel order, then display order within each reel
///
/// Built once per cycle after every reel settled. The sequencer owns it and
/// hands a copy to the host inside the cycle result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub cells: Vec<GridCell>,
}

impl GridSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot from symbol identifiers only, handles numbered by position
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SymbolId>,
    {
        let cells = symbols
            .into_iter()
            .enumerate()
            .map(|(i, s)| GridCell::new(s, VisualHandle(i as u64)))
            .collect();
        Self { cells }
    }

    /// Append the active cells of one reel
    pub fn extend_reel<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = GridCell>,
    {
        self.cells.extend(cells);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Symbol at a grid index
    pub fn symbol(&self, index: usize) -> Option<&SymbolId> {
        self.cells.get(index).map(|c| &c.symbol)
    }

    /// Visual handle at a grid index
    pub fn handle(&self, index: usize) -> Option<VisualHandle> {
        self.cells.get(index).map(|c| c.handle)
    }

    /// Symbol identifiers in grid order
    pub fn symbol_names(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.symbol.to_string()).collect()
    }
}
