use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Address of one chunk on the infinite canvas grid. Any integer pair is a
/// valid address; two chunks never share a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i64,
    pub y: i64,
}

impl ChunkCoord {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Storage key for any key/value backend: `"{x},{y}"`, decimal, no
    /// padding. This exact format must be preserved to interoperate with
    /// previously persisted data.
    pub fn storage_key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// Chebyshev distance to `other`: `max(|dx|, |dy|)`.
    pub fn chebyshev(&self, other: ChunkCoord) -> u64 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    pub fn offset(&self, dx: i64, dy: i64) -> ChunkCoord {
        ChunkCoord::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl FromStr for ChunkCoord {
    type Err = ParseCoordError;

    /// Parses the storage-key form `"{x},{y}"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s.split_once(',').ok_or(ParseCoordError)?;
        let x = x.parse().map_err(|_| ParseCoordError)?;
        let y = y.parse().map_err(|_| ParseCoordError)?;
        Ok(ChunkCoord::new(x, y))
    }
}

impl From<(i64, i64)> for ChunkCoord {
    fn from((x, y): (i64, i64)) -> Self {
        ChunkCoord::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCoordError;

impl fmt::Display for ParseCoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a coordinate of the form \"x,y\"")
    }
}

impl std::error::Error for ParseCoordError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_format() {
        assert_eq!(ChunkCoord::new(0, 0).storage_key(), "0,0");
        assert_eq!(ChunkCoord::new(-3, 12).storage_key(), "-3,12");
        assert_eq!(ChunkCoord::new(i64::MAX, i64::MIN).storage_key(), format!(
            "{},{}",
            i64::MAX,
            i64::MIN
        ));
    }

    #[test]
    fn test_storage_key_round_trip() {
        for coord in [
            ChunkCoord::new(0, 0),
            ChunkCoord::new(-1, 1),
            ChunkCoord::new(42, -17),
            ChunkCoord::new(i64::MIN, i64::MAX),
        ] {
            let parsed: ChunkCoord = coord.storage_key().parse().unwrap();
            assert_eq!(parsed, coord);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<ChunkCoord>().is_err());
        assert!("1".parse::<ChunkCoord>().is_err());
        assert!("a,b".parse::<ChunkCoord>().is_err());
        assert!("1,2,3".parse::<ChunkCoord>().is_err());
    }

    #[test]
    fn test_chebyshev() {
        let origin = ChunkCoord::new(0, 0);
        assert_eq!(origin.chebyshev(origin), 0);
        assert_eq!(origin.chebyshev(ChunkCoord::new(3, -2)), 3);
        assert_eq!(origin.chebyshev(ChunkCoord::new(-1, 5)), 5);
        assert_eq!(ChunkCoord::new(-4, -4).chebyshev(ChunkCoord::new(-6, 1)), 5);
    }

    #[test]
    fn test_chebyshev_extremes() {
        // abs_diff keeps i64::MIN..i64::MAX spans from overflowing.
        let a = ChunkCoord::new(i64::MIN, 0);
        let b = ChunkCoord::new(i64::MAX, 0);
        assert_eq!(a.chebyshev(b), u64::MAX);
    }
}
