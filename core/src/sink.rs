use crate::*;

/// Receives the cells whose visible state changed, once per mutating engine call.
pub trait ChangeSink {
    fn cells_changed(&mut self, cells: &[CellSnapshot]);
}

impl<F> ChangeSink for F
where
    F: FnMut(&[CellSnapshot]),
{
    fn cells_changed(&mut self, cells: &[CellSnapshot]) {
        self(cells)
    }
}

/// Drops every notification, for callers that redraw from [`GameEngine::all_cells`].
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn cells_changed(&mut self, _cells: &[CellSnapshot]) {}
}

/// Keeps every notification batch in arrival order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSink {
    pub batches: Vec<Vec<CellSnapshot>>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&[CellSnapshot]> {
        self.batches.last().map(Vec::as_slice)
    }

    pub fn take(&mut self) -> Vec<Vec<CellSnapshot>> {
        core::mem::take(&mut self.batches)
    }
}

impl ChangeSink for RecordingSink {
    fn cells_changed(&mut self, cells: &[CellSnapshot]) {
        self.batches.push(cells.to_vec());
    }
}
