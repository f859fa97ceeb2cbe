// THEORY:
// The `ObjectTracker` turns a binary mask into a single, temporally smoothed
// point: where the hand is. It is the only stage besides the debouncer that
// carries memory between frames, and that memory is deliberately short.
//
// Key architectural principles:
// 1.  **External Regions Only**: Connected components are described by their
//     outermost boundary. Holes inside a hand, and anything inside those holes,
//     are part of the hand, not separate objects.
// 2.  **Dominant Region**: Only the region with the largest enclosed area is
//     tracked, and only if that area clears a noise floor. This system follows a
//     single object; everything else is treated as clutter.
// 3.  **Boundary Moments**: The centroid comes from the first-order area moments
//     of the boundary polygon (Green's theorem), the same quantity contour
//     moments report. A degenerate polygon with zero area has no centroid.
// 4.  **Gap Resets Memory**: The exponential moving average is only carried while
//     detections are continuous. A single frame without a region drops the
//     smoothed position entirely, so a hand re-entering the scene is reported
//     where it is, not dragged from where it left.

use crate::core_modules::foreground_segmenter::ForegroundMask;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

/// A position in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

impl Centroid {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Zeroth and first-order area moments of a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Moments of the polygon traced by `points`, normalised to a non-negative area
    /// regardless of winding direction.
    pub fn of_polygon(points: &[Point<i32>]) -> Self {
        if points.len() < 3 {
            return Self::default();
        }

        let mut twice_area = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        for (i, current) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            let (x0, y0) = (f64::from(current.x), f64::from(current.y));
            let (x1, y1) = (f64::from(next.x), f64::from(next.y));
            let cross = x0 * y1 - x1 * y0;
            twice_area += cross;
            sum_x += (x0 + x1) * cross;
            sum_y += (y0 + y1) * cross;
        }

        let moments = Self {
            m00: twice_area / 2.0,
            m10: sum_x / 6.0,
            m01: sum_y / 6.0,
        };
        if moments.m00 < 0.0 {
            Self {
                m00: -moments.m00,
                m10: -moments.m10,
                m01: -moments.m01,
            }
        } else {
            moments
        }
    }

    /// `m10/m00, m01/m00` truncated to whole pixels; `None` when the area is zero.
    pub fn centroid(&self) -> Option<Centroid> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Centroid {
            x: truncate_pixel(self.m10 / self.m00),
            y: truncate_pixel(self.m01 / self.m00),
        })
    }
}

/// Drops the fractional part, treating values within float noise of a whole pixel as that pixel.
fn truncate_pixel(value: f64) -> i32 {
    let nearest = value.round();
    if (value - nearest).abs() < 1e-9 {
        nearest as i32
    } else {
        value.trunc() as i32
    }
}

/// One connected foreground component, described by its outer boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    boundary: Vec<Point<i32>>,
    moments: Moments,
}

impl Region {
    pub fn from_boundary(boundary: Vec<Point<i32>>) -> Self {
        let moments = Moments::of_polygon(&boundary);
        Self { boundary, moments }
    }

    pub fn boundary(&self) -> &[Point<i32>] {
        &self.boundary
    }

    /// Area enclosed by the boundary polygon, in square pixels.
    pub fn area(&self) -> f64 {
        self.moments.m00
    }

    pub fn moments(&self) -> Moments {
        self.moments
    }

    pub fn raw_centroid(&self) -> Option<Centroid> {
        self.moments.centroid()
    }
}

/// Outer boundaries of every top-level connected component of the mask.
pub fn extract_regions(mask: &ForegroundMask) -> Vec<Region> {
    find_contours::<i32>(mask.as_image())
        .into_iter()
        .filter(|contour| {
            matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
        })
        .map(|contour| Region::from_boundary(contour.points))
        .collect()
}

/// The region with the largest area, provided that area exceeds `min_area`.
/// Ties go to the region that comes first.
pub fn select_primary(regions: Vec<Region>, min_area: f64) -> Option<Region> {
    regions
        .into_iter()
        .rev()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .filter(|region| region.area() > min_area)
}

/// First-order exponential moving average of a centroid.
///
/// - no measurement: `None`, forgetting the previous estimate
/// - first measurement after a gap: the measurement itself
/// - otherwise: `round(alpha * raw + (1 - alpha) * previous)` per axis
pub fn smooth(raw: Option<Centroid>, previous: Option<Centroid>, alpha: f64) -> Option<Centroid> {
    match (raw, previous) {
        (None, _) => None,
        (Some(raw), None) => Some(raw),
        (Some(raw), Some(previous)) => Some(Centroid {
            x: blend(raw.x, previous.x, alpha),
            y: blend(raw.y, previous.y, alpha),
        }),
    }
}

fn blend(new: i32, old: i32, alpha: f64) -> i32 {
    (alpha * f64::from(new) + (1.0 - alpha) * f64::from(old)).round() as i32
}

/// Everything the tracker learned from one mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// The tracked region, if one cleared the area floor.
    pub region: Option<Region>,
    /// This frame's unsmoothed centroid.
    pub raw: Option<Centroid>,
    /// The centroid after temporal smoothing.
    pub smoothed: Option<Centroid>,
}

/// Stateful single-object tracker.
#[derive(Debug, Clone)]
pub struct ObjectTracker {
    min_region_area: f64,
    smoothing_alpha: f64,
    /// The smoothed centroid of the previous frame.
    previous: Option<Centroid>,
}

impl ObjectTracker {
    pub fn new(min_region_area: f64, smoothing_alpha: f64) -> Self {
        Self {
            min_region_area,
            smoothing_alpha,
            previous: None,
        }
    }

    /// Extracts, selects, measures and smooths in one step.
    pub fn update(&mut self, mask: &ForegroundMask) -> Detection {
        let region = select_primary(extract_regions(mask), self.min_region_area);
        let raw = region.as_ref().and_then(Region::raw_centroid);
        let smoothed = self.track(raw);
        Detection {
            region,
            raw,
            smoothed,
        }
    }

    /// Advances the moving average with a raw measurement.
    pub fn track(&mut self, raw: Option<Centroid>) -> Option<Centroid> {
        let smoothed = smooth(raw, self.previous, self.smoothing_alpha);
        self.previous = smoothed;
        smoothed
    }

    pub fn last_smoothed(&self) -> Option<Centroid> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn mask_with_blocks(
        width: u32,
        height: u32,
        blocks: &[(u32, u32, u32, u32)],
    ) -> ForegroundMask {
        let image = GrayImage::from_fn(width, height, |x, y| {
            let inside = blocks
                .iter()
                .any(|&(x0, y0, x1, y1)| (x0..=x1).contains(&x) && (y0..=y1).contains(&y));
            Luma([u8::from(inside)])
        });
        ForegroundMask::from_gray(&image)
    }

    #[test]
    fn rectangle_centroid_is_its_geometric_center() {
        let region = Region::from_boundary(vec![
            Point::new(10, 20),
            Point::new(50, 20),
            Point::new(50, 60),
            Point::new(10, 60),
        ]);

        assert_eq!(region.area(), 1600.0);
        assert_eq!(region.raw_centroid(), Some(Centroid::new(30, 40)));
    }

    #[test]
    fn winding_direction_does_not_change_moments() {
        let clockwise = Moments::of_polygon(&[
            Point::new(0, 0),
            Point::new(0, 10),
            Point::new(20, 10),
            Point::new(20, 0),
        ]);
        let counter_clockwise = Moments::of_polygon(&[
            Point::new(0, 0),
            Point::new(20, 0),
            Point::new(20, 10),
            Point::new(0, 10),
        ]);
        assert_eq!(clockwise, counter_clockwise);
        assert_eq!(clockwise.centroid(), Some(Centroid::new(10, 5)));
    }

    #[test]
    fn degenerate_region_has_no_centroid() {
        let line = Region::from_boundary(vec![
            Point::new(3, 3),
            Point::new(9, 3),
            Point::new(6, 3),
        ]);
        assert_eq!(line.area(), 0.0);
        assert_eq!(line.raw_centroid(), None);

        let single = Region::from_boundary(vec![Point::new(4, 4)]);
        assert_eq!(single.raw_centroid(), None);
    }

    #[test]
    fn traced_rectangle_yields_exact_center() {
        let mask = mask_with_blocks(100, 100, &[(10, 20, 50, 60)]);

        let regions = extract_regions(&mask);

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area(), 1600.0);
        assert_eq!(regions[0].raw_centroid(), Some(Centroid::new(30, 40)));
    }

    #[test]
    fn separate_components_become_separate_regions() {
        let mask = mask_with_blocks(120, 60, &[(5, 5, 20, 20), (60, 10, 110, 50)]);
        assert_eq!(extract_regions(&mask).len(), 2);
    }

    #[test]
    fn blobs_inside_holes_are_not_external() {
        // A ring with a solid island in its hole.
        let image = GrayImage::from_fn(100, 100, |x, y| {
            let ring = (10..=90).contains(&x)
                && (10..=90).contains(&y)
                && !((20..=80).contains(&x) && (20..=80).contains(&y));
            let island = (40..=60).contains(&x) && (40..=60).contains(&y);
            Luma([u8::from(ring || island)])
        });

        let regions = extract_regions(&ForegroundMask::from_gray(&image));

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area(), 6400.0);
    }

    #[test]
    fn primary_region_is_the_largest_above_the_floor() {
        let mask = mask_with_blocks(200, 100, &[(5, 5, 25, 25), (60, 10, 160, 90)]);

        let primary = select_primary(extract_regions(&mask), 1200.0).unwrap();

        assert_eq!(primary.raw_centroid(), Some(Centroid::new(110, 50)));
    }

    #[test]
    fn half_pixel_centroid_is_truncated() {
        let region = Region::from_boundary(vec![
            Point::new(320, 200),
            Point::new(381, 200),
            Point::new(381, 280),
            Point::new(320, 280),
        ]);

        assert_eq!(region.raw_centroid(), Some(Centroid::new(350, 240)));
    }

    #[test]
    fn equal_areas_keep_the_first_region() {
        let square = |x: i32| {
            Region::from_boundary(vec![
                Point::new(x, 0),
                Point::new(x + 40, 0),
                Point::new(x + 40, 40),
                Point::new(x, 40),
            ])
        };

        let primary = select_primary(vec![square(0), square(100), square(200)], 1200.0).unwrap();

        assert_eq!(primary.raw_centroid(), Some(Centroid::new(20, 20)));
    }

    #[test]
    fn regions_below_the_floor_are_ignored() {
        let mask = mask_with_blocks(100, 100, &[(10, 10, 40, 40)]);
        // 30 x 30 = 900 square pixels.
        assert!(select_primary(extract_regions(&mask), 1200.0).is_none());
        assert!(select_primary(Vec::new(), 0.0).is_none());
    }

    #[test]
    fn smoothing_blends_toward_new_measurement() {
        let smoothed = smooth(Some(Centroid::new(100, 50)), Some(Centroid::new(0, 0)), 0.6);
        assert_eq!(smoothed, Some(Centroid::new(60, 30)));
    }

    #[test]
    fn first_detection_is_not_smoothed() {
        assert_eq!(smooth(Some(Centroid::new(7, 9)), None, 0.6), Some(Centroid::new(7, 9)));
        assert_eq!(smooth(None, Some(Centroid::new(7, 9)), 0.6), None);
    }

    #[test]
    fn constant_input_converges_immediately_and_resets_on_gap() {
        let mut tracker = ObjectTracker::new(1200.0, 0.6);
        let c = Centroid::new(317, 233);

        assert_eq!(tracker.track(None), None);
        for _ in 0..8 {
            assert_eq!(tracker.track(Some(c)), Some(c));
        }
        assert_eq!(tracker.track(None), None);
        assert_eq!(tracker.last_smoothed(), None);

        // After the gap the next detection is taken as-is.
        let moved = Centroid::new(10, 10);
        assert_eq!(tracker.track(Some(moved)), Some(moved));
    }

    #[test]
    fn update_reports_region_raw_and_smoothed() {
        let mut tracker = ObjectTracker::new(1200.0, 0.6);

        let first = tracker.update(&mask_with_blocks(200, 200, &[(20, 20, 80, 80)]));
        assert_eq!(first.raw, Some(Centroid::new(50, 50)));
        assert_eq!(first.smoothed, Some(Centroid::new(50, 50)));

        let second = tracker.update(&mask_with_blocks(200, 200, &[(120, 20, 180, 80)]));
        assert_eq!(second.raw, Some(Centroid::new(150, 50)));
        assert_eq!(second.smoothed, Some(Centroid::new(110, 50)));

        let empty = tracker.update(&ForegroundMask::empty(200, 200));
        assert_eq!(empty.region, None);
        assert_eq!(empty.smoothed, None);
    }
}
