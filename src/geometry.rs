use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Negative extents collapse to zero.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(0),
            height: self.height.max(0),
        }
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(position: Point, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Grows the rectangle to the right and downwards.
    pub fn pad(self, right: i32, bottom: i32) -> Self {
        Self {
            width: self.width + right,
            height: self.height + bottom,
            ..self
        }
    }

    pub fn union(self, other: Rect) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    /// True when the two rectangles share an area larger than zero. Touching
    /// edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        let overlap_x = self.right().min(other.right()) - self.x.max(other.x);
        let overlap_y = self.bottom().min(other.bottom()) - self.y.max(other.y);
        overlap_x > 0 && overlap_y > 0
    }
}

/// Per-axis scale factor applied to design geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    pub x: f64,
    pub y: f64,
}

impl Ratio {
    pub const IDENTITY: Ratio = Ratio { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn uniform(value: f64) -> Self {
        Self { x: value, y: value }
    }

    /// Never enlarges: each axis is capped at 1.
    pub fn capped(self) -> Self {
        Self {
            x: self.x.min(1.0),
            y: self.y.min(1.0),
        }
    }

    pub fn scale_point(self, point: Point) -> Point {
        Point::new(scale_floor(point.x, self.x), scale_floor(point.y, self.y))
    }

    pub fn scale_size(self, size: Size) -> Size {
        Size::new(
            scale_floor(size.width, self.x),
            scale_floor(size.height, self.y),
        )
        .clamped()
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Multiplies a pixel value by a ratio and floors the result.
pub fn scale_floor(value: i32, ratio: f64) -> i32 {
    (f64::from(value) * ratio).floor() as i32
}

/// Bounding box of a set of rectangles, `None` when the iterator is empty.
pub fn bounding_box<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    rects.into_iter().reduce(Rect::union)
}
