//! Grid layout for multi-source composition.

use crate::geometry::Rect;

/// Side length of the smallest square grid holding `count` cells.
///
/// `0` for no sources.
pub fn grid_side(count: usize) -> usize {
    let mut side = (count as f64).sqrt().ceil() as usize;
    // Float rounding can be off by one for large counts
    while side * side < count {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= count {
        side -= 1;
    }
    side
}

/// Cell rectangles for `count` sources on a `width` x `height` surface.
///
/// Cells are `width/side` by `height/side` and assigned row-major, so cell
/// `i` sits at column `i % side` and row `i / side`. Only the first `count`
/// cells are returned; any remaining cells of the square stay empty.
pub fn grid_cells(count: usize, width: u32, height: u32) -> Vec<Rect> {
    let side = grid_side(count);
    if side == 0 {
        return Vec::new();
    }
    let cell_w = f64::from(width) / side as f64;
    let cell_h = f64::from(height) / side as f64;
    (0..count)
        .map(|i| {
            let col = (i % side) as f64;
            let row = (i / side) as f64;
            Rect::new(col * cell_w, row * cell_h, cell_w, cell_h)
        })
        .collect()
}

/// Grid cells cached for one `(count, width, height)` combination.
///
/// The render loop recomputes cells only when one of the three changes.
#[derive(Debug, Clone, Default)]
pub struct GridLayout {
    key: (usize, u32, u32),
    cells: Vec<Rect>,
}

impl GridLayout {
    /// Returns cells for the inputs, recomputing only if they changed.
    pub fn cells(&mut self, count: usize, width: u32, height: u32) -> &[Rect] {
        let key = (count, width, height);
        if key != self.key || self.cells.len() != count {
            self.key = key;
            self.cells = grid_cells(count, width, height);
        }
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_side() {
        assert_eq!(grid_side(0), 0);
        assert_eq!(grid_side(1), 1);
        assert_eq!(grid_side(2), 2);
        assert_eq!(grid_side(4), 2);
        assert_eq!(grid_side(5), 3);
        assert_eq!(grid_side(9), 3);
        assert_eq!(grid_side(10), 4);
    }

    #[test]
    fn test_three_sources_on_2x2() {
        let cells = grid_cells(3, 800, 600);
        assert_eq!(
            cells,
            vec![
                Rect::new(0.0, 0.0, 400.0, 300.0),
                Rect::new(400.0, 0.0, 400.0, 300.0),
                Rect::new(0.0, 300.0, 400.0, 300.0),
            ]
        );
    }

    #[test]
    fn test_single_source_fills_surface() {
        assert_eq!(grid_cells(1, 640, 480), vec![Rect::new(0.0, 0.0, 640.0, 480.0)]);
    }

    #[test]
    fn test_no_sources_no_cells() {
        assert!(grid_cells(0, 640, 480).is_empty());
    }

    #[test]
    fn test_cells_tile_without_overlap() {
        for count in 1..=16 {
            let cells = grid_cells(count, 900, 600);
            for (i, a) in cells.iter().enumerate() {
                assert!(a.x + a.width <= 900.0 + 1e-9);
                assert!(a.y + a.height <= 600.0 + 1e-9);
                for b in &cells[i + 1..] {
                    let overlap_x = a.x < b.x + b.width && b.x < a.x + a.width;
                    let overlap_y = a.y < b.y + b.height && b.y < a.y + a.height;
                    assert!(!(overlap_x && overlap_y), "{a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_layout_cache_recomputes_on_change() {
        let mut layout = GridLayout::default();
        assert_eq!(layout.cells(2, 800, 600).len(), 2);
        assert_eq!(layout.cells(2, 800, 600)[1], Rect::new(400.0, 0.0, 400.0, 300.0));
        assert_eq!(layout.cells(2, 400, 600)[1], Rect::new(200.0, 0.0, 200.0, 300.0));
        assert_eq!(layout.cells(5, 400, 600).len(), 5);
    }
}
