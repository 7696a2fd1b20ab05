use serde::{Deserialize, Serialize};

/// Integer screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// A cursor position stamped with the elapsed time since movement start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPoint {
    pub x: i32,
    pub y: i32,
    pub elapsed_ms: u64,
}

impl TimedPoint {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One simulated cursor movement. Produced for a single move call and then
/// consumed; never persisted.
#[derive(Debug, Clone)]
pub struct Trajectory {
    points: Vec<TimedPoint>,
}

impl Trajectory {
    pub(crate) fn new(points: Vec<TimedPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[TimedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().map(TimedPoint::point)
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.points.last().map(|p| p.elapsed_ms).unwrap_or(0)
    }

    pub fn into_points(self) -> Vec<TimedPoint> {
        self.points
    }
}

impl IntoIterator for Trajectory {
    type Item = TimedPoint;
    type IntoIter = std::vec::IntoIter<TimedPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyState {
    Pressed,
    Released,
}

/// A key the transport can press: either a printable character (the
/// transport resolves shift state from the character itself) or a named
/// editing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum KeySpec {
    Char(char),
    Backspace,
    Enter,
}

/// Primitive accepted by the input transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputAction {
    Wait {
        ms: u64,
    },
    MoveTo {
        x: i32,
        y: i32,
    },
    Button {
        button: MouseButton,
        state: ButtonState,
    },
    Key {
        key: KeySpec,
        state: KeyState,
    },
}
