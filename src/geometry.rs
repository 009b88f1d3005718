use geo::{Coord, Point, Polygon, Rect};

#[derive(PartialEq, Debug, Clone)]
pub struct Point2d {
    pub x_coord: f64,
    pub y_coord: f64,
}

impl Point2d {
    pub fn new(x_coord: f64, y_coord: f64) -> Point2d {
        Point2d{x_coord, y_coord}
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.x_coord, self.y_coord]
    }

    pub fn to_coord(&self) -> Coord<f64> {
        Coord {x: self.x_coord, y: self.y_coord}
    }
}


/// Builds a region from its ring of vertices.  The ring is closed if it isn't already.
pub fn polygon_from_points(vertices: &[Point2d]) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = vertices.iter().map(|vv| vv.to_coord()).collect();
    Polygon::new(ring.into(), vec![])
}

/// Shrinks `rect` by `fraction` of its width and height on every side.
pub fn shrink_rect(rect: &Rect<f64>, fraction: f64) -> Rect<f64> {
    let dx = rect.width() * fraction;
    let dy = rect.height() * fraction;
    Rect::new(
        Coord {x: rect.min().x + dx, y: rect.min().y + dy},
        Coord {x: rect.max().x - dx, y: rect.max().y - dy},
    )
}

/// strict containment: points on the border are outside.
pub fn strictly_inside(rect: &Rect<f64>, point: &Point<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    min.x < point.x() && point.x() < max.x && min.y < point.y() && point.y() < max.y
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{BoundingRect, Contains};

    fn l_shape() -> Polygon<f64> {
        // an L-shaped region: the square [0, 2] x [0, 2] minus [1, 2] x [1, 2]
        polygon_from_points(&[
            Point2d::new(0., 0.),
            Point2d::new(2., 0.),
            Point2d::new(2., 1.),
            Point2d::new(1., 1.),
            Point2d::new(1., 2.),
            Point2d::new(0., 2.),
        ])
    }

    #[test]
    fn test_polygon_from_points() {
        let poly = l_shape();
        // closed ring
        assert_eq!(poly.exterior().0.len(), 7);
        assert!(poly.contains(&Point::new(0.5, 0.5)));
        assert!(poly.contains(&Point::new(1.5, 0.5)));
        assert!(poly.contains(&Point::new(0.5, 1.5)));
        // the notch is outside
        assert!(!poly.contains(&Point::new(1.5, 1.5)));
        assert!(!poly.contains(&Point::new(-0.5, 0.5)));

        let flat = polygon_from_points(&[Point2d::new(0., 0.), Point2d::new(1., 1.)]);
        assert!(!flat.contains(&Point::new(0.5, 0.5)));
    }

    #[test]
    fn test_shrink_rect() {
        let bbox = l_shape().bounding_rect().unwrap();
        assert_eq!(bbox.min(), Coord {x: 0., y: 0.});
        assert_eq!(bbox.max(), Coord {x: 2., y: 2.});

        let inner = shrink_rect(&bbox, 0.05);
        assert_relative_eq!(inner.min().x, 0.1);
        assert_relative_eq!(inner.max().y, 1.9);
        assert!(strictly_inside(&inner, &Point::new(1., 1.)));
        assert!(!strictly_inside(&inner, &Point::new(0.05, 1.)));
        // the border itself is outside
        assert!(!strictly_inside(&inner, &Point::new(0.1, 1.)));
        assert!(!strictly_inside(&bbox, &Point::new(2., 1.)));
    }
}
