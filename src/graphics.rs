use crate::state::RenderParams;

/// Ink value of an empty pixel
pub const BACKGROUND: u8 = 0;
/// Ink value of a link pixel
pub const LINK_INK: u8 = 1;
/// Ink value of a bob pixel
pub const BOB_INK: u8 = 2;

/// Drawing primitives the pendulum is rendered with
///
/// Coordinates are in pixels with y growing downward.
pub trait Surface {
    /// Clears the whole surface
    fn background(&mut self);
    /// Draws a straight segment between two points
    fn line(&mut self, from: [f64; 2], to: [f64; 2]);
    /// Draws a filled ellipse with the given diameters around `center`
    fn ellipse(&mut self, center: [f64; 2], width: f64, height: f64);
}

/// Draws both links and both bobs for the given angles
///
/// Order: anchor→bob1 segment, bob1 circle, bob1→bob2 segment, bob2 circle.
pub fn draw_pendulums<S: Surface + ?Sized>(
    surface: &mut S,
    render: &RenderParams,
    theta1: f64,
    theta2: f64,
) {
    let bobs = render.bobs(theta1, theta2);
    surface.line(render.anchor, bobs.first);
    surface.ellipse(bobs.first, render.r, render.r);
    surface.line(bobs.first, bobs.second);
    surface.ellipse(bobs.second, render.r, render.r);
}

/// In-memory raster holding one ink value per pixel
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Creates a blank canvas
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![BACKGROUND; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Ink at `(x, y)`, or background when out of bounds
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            BACKGROUND
        }
    }

    /// Strongest ink inside the block starting at `(x0, y0)`
    ///
    /// Used to downsample the raster onto terminal cells.
    pub fn block(&self, x0: usize, y0: usize, w: usize, h: usize) -> u8 {
        let mut ink = BACKGROUND;
        for y in y0..(y0 + h).min(self.height) {
            for x in x0..(x0 + w).min(self.width) {
                ink = ink.max(self.pixels[y * self.width + x]);
            }
        }
        ink
    }

    /// Sets a pixel, keeping the stronger ink; ignores out-of-bounds points
    fn plot(&mut self, x: isize, y: isize, ink: u8) {
        if x >= 0 && x < self.width as isize && y >= 0 && y < self.height as isize {
            let offset = y as usize * self.width + x as usize;
            self.pixels[offset] = self.pixels[offset].max(ink);
        }
    }

    /// Clips a segment to the canvas rectangle (Cohen-Sutherland)
    ///
    /// Clipped endpoints land exactly on the canvas edge, which keeps the
    /// result precise even for segments many orders of magnitude larger
    /// than the canvas. Returns `None` when nothing of it is visible.
    fn clip_segment(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Option<[f64; 4]> {
        const LEFT: u8 = 1;
        const RIGHT: u8 = 2;
        const TOP: u8 = 4;
        const BOTTOM: u8 = 8;

        if self.width == 0 || self.height == 0 {
            return None;
        }
        let (x_max, y_max) = (self.width as f64 - 1.0, self.height as f64 - 1.0);
        let outcode = |x: f64, y: f64| {
            let mut code = 0;
            if x < 0.0 {
                code |= LEFT;
            } else if x > x_max {
                code |= RIGHT;
            }
            if y < 0.0 {
                code |= TOP;
            } else if y > y_max {
                code |= BOTTOM;
            }
            code
        };

        let mut p = [x0, y0, x1, y1];
        let mut codes = [outcode(x0, y0), outcode(x1, y1)];
        // Each pass pins one coordinate of one endpoint to an edge.
        for _ in 0..8 {
            if codes[0] | codes[1] == 0 {
                return Some(p);
            }
            if codes[0] & codes[1] != 0 {
                return None;
            }
            let end = if codes[0] != 0 { 0 } else { 1 };
            let code = codes[end];
            let [x0, y0, x1, y1] = p;
            let (x, y) = if code & TOP != 0 {
                (x0 + (x1 - x0) * -y0 / (y1 - y0), 0.0)
            } else if code & BOTTOM != 0 {
                (x0 + (x1 - x0) * (y_max - y0) / (y1 - y0), y_max)
            } else if code & RIGHT != 0 {
                (x_max, y0 + (y1 - y0) * (x_max - x0) / (x1 - x0))
            } else {
                (0.0, y0 + (y1 - y0) * -x0 / (x1 - x0))
            };
            p[2 * end] = x;
            p[2 * end + 1] = y;
            codes[end] = outcode(x, y);
        }

        // Rounding kept an endpoint a hair outside; pin it.
        Some([
            p[0].clamp(0.0, x_max),
            p[1].clamp(0.0, y_max),
            p[2].clamp(0.0, x_max),
            p[3].clamp(0.0, y_max),
        ])
    }

    /// Draws a line between two points using Bresenham's algorithm
    ///
    /// The segment is clipped to the canvas first, so endpoints far outside
    /// cost nothing extra.
    pub fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, ink: u8) {
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        let Some([x0, y0, x1, y1]) = self.clip_segment(x0, y0, x1, y1) else {
            return;
        };
        let (mut x0, mut y0, x1, y1) = (
            x0.round() as isize,
            y0.round() as isize,
            x1.round() as isize,
            y1.round() as isize,
        );
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy; // error value e_xy

        loop {
            self.plot(x0, y0, ink);

            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Fills the axis-aligned ellipse with diameters `width` and `height`
    pub fn fill_ellipse(&mut self, cx: f64, cy: f64, width: f64, height: f64, ink: u8) {
        if !(cx.is_finite() && cy.is_finite()) || width <= 0.0 || height <= 0.0 {
            return;
        }
        let (rx, ry) = (width / 2.0, height / 2.0);

        // Bounding box, clamped to the canvas
        let min_x = (cx - rx).floor().max(0.0) as isize;
        let max_x = (cx + rx).ceil().min(self.width as f64 - 1.0) as isize;
        let min_y = (cy - ry).floor().max(0.0) as isize;
        let max_y = (cy + ry).ceil().min(self.height as f64 - 1.0) as isize;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let nx = (x as f64 - cx) / rx;
                let ny = (y as f64 - cy) / ry;
                if nx * nx + ny * ny <= 1.0 {
                    self.plot(x, y, ink);
                }
            }
        }
    }
}

impl Surface for Canvas {
    fn background(&mut self) {
        self.pixels.fill(BACKGROUND);
    }

    fn line(&mut self, from: [f64; 2], to: [f64; 2]) {
        self.draw_line(from[0], from[1], to[0], to[1], LINK_INK);
    }

    fn ellipse(&mut self, center: [f64; 2], width: f64, height: f64) {
        self.fill_ellipse(center[0], center[1], width, height, BOB_INK);
    }
}
