//! Rectangular clipping for tile-local geometry.
//!
//! Encoding re-tiles geometry for exactly one tile, so everything is
//! clipped to the extent-plus-buffer window. Rings use Sutherland-Hodgman
//! against the four window edges; lines are clipped per segment and
//! stitched back into runs.

/// One boundary of the clip window.
#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Top(f64),
    Bottom(f64),
}

impl Edge {
    fn inside(&self, p: (f64, f64)) -> bool {
        match *self {
            Edge::Left(x) => p.0 >= x,
            Edge::Right(x) => p.0 <= x,
            Edge::Top(y) => p.1 >= y,
            Edge::Bottom(y) => p.1 <= y,
        }
    }

    fn intersect(&self, a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
        match *self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a.0) / (b.0 - a.0);
                (x, a.1 + t * (b.1 - a.1))
            }
            Edge::Top(y) | Edge::Bottom(y) => {
                let t = (y - a.1) / (b.1 - a.1);
                (a.0 + t * (b.0 - a.0), y)
            }
        }
    }
}

/// Clips a closed ring to the square window `[lo, hi]²`.
///
/// The input ring must not repeat its first point at the end. Returns an
/// empty vector when the ring lies entirely outside.
pub fn clip_ring(ring: &[(f64, f64)], lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let edges = [Edge::Left(lo), Edge::Right(hi), Edge::Top(lo), Edge::Bottom(hi)];
    let mut current = ring.to_vec();
    for edge in edges {
        if current.is_empty() {
            return current;
        }
        let mut next = Vec::with_capacity(current.len() + 4);
        for i in 0..current.len() {
            let a = current[i];
            let b = current[(i + 1) % current.len()];
            let a_in = edge.inside(a);
            let b_in = edge.inside(b);
            if a_in {
                next.push(a);
                if !b_in {
                    next.push(edge.intersect(a, b));
                }
            } else if b_in {
                next.push(edge.intersect(a, b));
            }
        }
        current = next;
    }
    current
}

/// Clips a polyline to the square window `[lo, hi]²`, splitting it where
/// it leaves the window.
pub fn clip_line(line: &[(f64, f64)], lo: f64, hi: f64) -> Vec<Vec<(f64, f64)>> {
    let mut parts: Vec<Vec<(f64, f64)>> = Vec::new();
    for window in line.windows(2) {
        let Some((a, b)) = clip_segment(window[0], window[1], lo, hi) else {
            continue;
        };
        match parts.last_mut() {
            Some(part) if part.last() == Some(&a) => part.push(b),
            _ => parts.push(vec![a, b]),
        }
    }
    parts
}

/// True when a point lies within the window.
pub fn point_in(p: (f64, f64), lo: f64, hi: f64) -> bool {
    p.0 >= lo && p.0 <= hi && p.1 >= lo && p.1 <= hi
}

/// Liang-Barsky segment clip.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    lo: f64,
    hi: f64,
) -> Option<((f64, f64), (f64, f64))> {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let checks = [
        (-dx, a.0 - lo),
        (dx, hi - a.0),
        (-dy, a.1 - lo),
        (dy, hi - a.1),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_fully_inside_unchanged() {
        let ring = vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)];
        assert_eq!(clip_ring(&ring, 0.0, 4.0), ring);
    }

    #[test]
    fn test_ring_fully_outside_empty() {
        let ring = vec![(10.0, 10.0), (12.0, 10.0), (12.0, 12.0)];
        assert!(clip_ring(&ring, 0.0, 4.0).is_empty());
    }

    #[test]
    fn test_ring_straddling_gets_trimmed() {
        let ring = vec![(-2.0, 1.0), (2.0, 1.0), (2.0, 3.0), (-2.0, 3.0)];
        let clipped = clip_ring(&ring, 0.0, 4.0);
        assert!(!clipped.is_empty());
        for (x, y) in &clipped {
            assert!(*x >= 0.0 && *x <= 4.0);
            assert!(*y >= 0.0 && *y <= 4.0);
        }
        // Left edge crossings land exactly on the boundary
        assert!(clipped.iter().any(|(x, _)| *x == 0.0));
    }

    #[test]
    fn test_line_split_into_parts() {
        // W-shaped line that leaves and re-enters the window
        let line = vec![(1.0, 1.0), (5.0, 1.0), (5.0, 3.0), (1.0, 3.0)];
        let parts = clip_line(&line, 0.0, 4.0);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], vec![(1.0, 1.0), (4.0, 1.0)]);
        assert_eq!(parts[1], vec![(4.0, 3.0), (1.0, 3.0)]);
    }

    #[test]
    fn test_line_contiguous_segments_stitched() {
        let line = vec![(1.0, 1.0), (2.0, 2.0), (3.0, 1.0)];
        let parts = clip_line(&line, 0.0, 4.0);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].len(), 3);
    }

    #[test]
    fn test_point_window_membership() {
        assert!(point_in((0.0, 4.0), 0.0, 4.0));
        assert!(!point_in((-0.1, 2.0), 0.0, 4.0));
        assert!(!point_in((2.0, 4.1), 0.0, 4.0));
    }

    #[test]
    fn test_segment_outside_is_rejected() {
        assert!(clip_segment((5.0, 5.0), (6.0, 6.0), 0.0, 4.0).is_none());
    }
}
