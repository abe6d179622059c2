use ratatui::prelude::*;

/// Character grid the real-time games paint into before handing it to a
/// `Paragraph`.
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<Vec<(char, Style)>>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, background: Style) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![(' ', background); width]; height],
        }
    }

    pub fn put(&mut self, x: i32, y: i32, ch: char, style: Style) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.cells[y][x] = (ch, style);
        }
    }

    /// Fills the half-open cell rectangle `[x0, x1) x [y0, y1)`.
    pub fn fill(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, ch: char, style: Style) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, ch, style);
            }
        }
    }

    pub fn text(&mut self, x: i32, y: i32, s: &str, style: Style) {
        for (i, ch) in s.chars().enumerate() {
            self.put(x + i as i32, y, ch, style);
        }
    }

    /// Converts the canvas into one styled `Line` per row.
    pub fn into_lines(self) -> Vec<Line<'static>> {
        self.cells
            .into_iter()
            .map(|row| {
                let spans: Vec<Span<'static>> = row
                    .into_iter()
                    .map(|(ch, style)| Span::styled(String::from(ch), style))
                    .collect();
                Line::from(spans)
            })
            .collect()
    }
}

/// Maps world coordinates (the game's pixel space) onto canvas cells.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    sx: f32,
    sy: f32,
}

impl Viewport {
    pub fn new(world_w: f32, world_h: f32, cells_w: usize, cells_h: usize) -> Self {
        Self {
            sx: cells_w as f32 / world_w,
            sy: cells_h as f32 / world_h,
        }
    }

    pub fn x(&self, wx: f32) -> i32 {
        (wx * self.sx).floor() as i32
    }

    pub fn y(&self, wy: f32) -> i32 {
        (wy * self.sy).floor() as i32
    }

    /// Cell rectangle covering a world rectangle, at least one cell in size.
    pub fn rect(&self, wx: f32, wy: f32, ww: f32, wh: f32) -> (i32, i32, i32, i32) {
        let x0 = self.x(wx);
        let y0 = self.y(wy);
        let x1 = self.x(wx + ww).max(x0 + 1);
        let y1 = self.y(wy + wh).max(y0 + 1);
        (x0, y0, x1, y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_ignores_out_of_range() {
        let mut canvas = Canvas::new(3, 2, Style::default());
        canvas.put(-1, 0, 'x', Style::default());
        canvas.put(3, 1, 'x', Style::default());
        canvas.put(1, 1, 'o', Style::default());
        let lines = canvas.into_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].spans[1].content, "o");
    }

    #[test]
    fn viewport_rect_is_never_empty() {
        let vp = Viewport::new(450.0, 500.0, 45, 25);
        let (x0, y0, x1, y1) = vp.rect(100.0, 100.0, 4.0, 4.0);
        assert_eq!((x0, y0), (10, 5));
        assert!(x1 > x0 && y1 > y0);
    }
}
