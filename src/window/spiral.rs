/// Iterative square-spiral over coordinate offsets, innermost ring first.
///
/// Ring `r` covers the `8r` cells at Chebyshev distance exactly `r`,
/// starting at the top-right corner and walking the perimeter clockwise:
/// right edge down, bottom edge leftward, left edge up, top edge rightward.
/// Across all rings `0..=radius` every offset with Chebyshev distance at
/// most `radius` is emitted exactly once, `(2*radius+1)^2` in total, so
/// consumers see near offsets before far ones.
#[derive(Debug, Clone)]
pub struct SpiralIter {
    radius: u64,
    ring: u64,
    step: u64,
}

impl SpiralIter {
    pub fn new(radius: u64) -> Self {
        Self { radius, ring: 0, step: 0 }
    }
}

impl Iterator for SpiralIter {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<(i64, i64)> {
        if self.ring > self.radius {
            return None;
        }
        if self.ring == 0 {
            self.ring = 1;
            return Some((0, 0));
        }

        let r = self.ring as i64;
        let edge = 2 * self.ring;
        let leg = self.step / edge;
        let pos = (self.step % edge) as i64;

        let offset = match leg {
            0 => (r, -r + pos),
            1 => (r - pos, r),
            2 => (-r, r - pos),
            _ => (-r + pos, -r),
        };

        self.step += 1;
        if self.step == 4 * edge {
            self.step = 0;
            self.ring += 1;
        }
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let side = 2 * self.radius + 1;
        let total = (side * side) as usize;
        let emitted = if self.ring == 0 {
            0
        } else {
            let inner = 2 * (self.ring - 1) + 1;
            (inner * inner) as usize + self.step as usize
        };
        let remaining = total.saturating_sub(emitted);
        (remaining, Some(remaining))
    }
}
