// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;

/// Cell grid with per-cell dirty tracking so the terminal writer can
/// diff consecutive frames and only emit the runs that changed.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<crossterm::style::Color>) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(bg); len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }

        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells[i]
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            if self.cells[i] == cell {
                return;
            }
            self.cells[i] = cell;
            if !self.dirty_all && !self.dirty_map[i] {
                self.dirty_map[i] = true;
                self.dirty.push(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_marks_only_changed_cells_dirty() {
        let mut f = Frame::new(4, 2, None);
        f.clear_dirty();

        let cell = Cell::glyph('x', None, None);
        f.set(1, 0, cell);
        f.set(1, 0, cell);
        assert_eq!(f.dirty_indices(), &[1]);

        f.set(1, 0, Cell::blank_with_bg(None));
        assert_eq!(f.dirty_indices().len(), 1);
    }

    #[test]
    fn out_of_bounds_set_is_ignored() {
        let mut f = Frame::new(2, 2, None);
        f.clear_dirty();
        f.set(2, 0, Cell::glyph('x', None, None));
        f.set(0, 2, Cell::glyph('x', None, None));
        assert!(f.dirty_indices().is_empty());
    }

    #[test]
    fn new_frame_starts_fully_dirty() {
        let f = Frame::new(3, 3, None);
        assert!(f.is_dirty_all());
    }
}
