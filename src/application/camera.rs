/// Camera holds the per-instance view settings a renderer draws with.
///
/// Screen position of a cell is `cell * cell_size - offset`. The engine
/// bumps the offsets whenever it prepends rows or columns so drawn content
/// stays put; the renderer polls [`Camera::take_changed`] instead of
/// subscribing to notifications.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub cell_size: f32,
    pub offset_left: f32,
    pub offset_top: f32,
    changed: bool,
}

impl Camera {
    pub fn new(cell_size: f32) -> Self {
        Self { cell_size, offset_left: 0.0, offset_top: 0.0, changed: false }
    }

    /// Pan camera
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_left += dx;
        self.offset_top += dy;
        self.changed = true;
    }

    /// Account for `left_cells` columns and `top_rows` rows inserted before
    /// the local origin.
    pub fn shift_origin(&mut self, left_cells: usize, top_rows: usize) {
        if left_cells == 0 && top_rows == 0 {
            return;
        }
        self.offset_left += left_cells as f32 * self.cell_size;
        self.offset_top += top_rows as f32 * self.cell_size;
        self.changed = true;
    }

    /// Set the cell size, keeping the cell under the screen origin fixed.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        let scale = cell_size / self.cell_size;
        self.offset_left *= scale;
        self.offset_top *= scale;
        self.cell_size = cell_size;
        self.changed = true;
    }

    /// Whether the view changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Convert screen coordinates to grid coordinates
    pub fn screen_to_grid(&self, screen_x: f32, screen_y: f32) -> (i64, i64) {
        let grid_x = ((screen_x + self.offset_left) / self.cell_size).floor() as i64;
        let grid_y = ((screen_y + self.offset_top) / self.cell_size).floor() as i64;
        (grid_x, grid_y)
    }

    /// Convert grid coordinates to screen coordinates
    pub fn grid_to_screen(&self, grid_x: i64, grid_y: i64) -> (f32, f32) {
        let screen_x = grid_x as f32 * self.cell_size - self.offset_left;
        let screen_y = grid_y as f32 * self.cell_size - self.offset_top;
        (screen_x, screen_y)
    }

    /// Get visible grid bounds for culling
    pub fn visible_bounds(
        &self,
        viewport_width: f32,
        viewport_height: f32,
    ) -> (i64, i64, i64, i64) {
        let (min_x, min_y) = self.screen_to_grid(0.0, 0.0);
        let (max_x, max_y) = self.screen_to_grid(viewport_width, viewport_height);
        (min_x, min_y, max_x, max_y)
    }

    /// Reset offsets to the origin
    pub fn reset(&mut self) {
        self.offset_left = 0.0;
        self.offset_top = 0.0;
        self.changed = true;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_keeps_content_in_place() {
        let mut camera = Camera::new(4.0);
        let before = camera.grid_to_screen(3, 2);
        camera.shift_origin(64, 10);
        assert_eq!(camera.grid_to_screen(3 + 64, 2 + 10), before);
        assert!(camera.take_changed());
        assert!(!camera.take_changed());
    }

    #[test]
    fn test_empty_shift_is_not_a_change() {
        let mut camera = Camera::new(4.0);
        camera.shift_origin(0, 0);
        assert!(!camera.take_changed());
    }

    #[test]
    fn test_screen_grid_round_trip() {
        let mut camera = Camera::new(5.0);
        camera.pan(12.0, -7.0);
        let (sx, sy) = camera.grid_to_screen(-4, 9);
        assert_eq!(camera.screen_to_grid(sx + 1.0, sy + 1.0), (-4, 9));
    }

    #[test]
    fn test_visible_bounds() {
        let camera = Camera::new(10.0);
        assert_eq!(camera.visible_bounds(100.0, 50.0), (0, 0, 10, 5));
    }

    #[test]
    fn test_cell_size_change_scales_offsets() {
        let mut camera = Camera::new(2.0);
        camera.pan(20.0, 10.0);
        camera.set_cell_size(4.0);
        assert_eq!((camera.offset_left, camera.offset_top), (40.0, 20.0));
        assert_eq!(camera.screen_to_grid(0.0, 0.0), (10, 5));
    }
}
