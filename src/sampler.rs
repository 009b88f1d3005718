use std::sync::Arc;

use geo::{BoundingRect, Contains, MultiPoint, Point, Polygon, Rect};
use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use rand::Rng;
use rand::SeedableRng;
use rand_isaac::Isaac64Rng;

use super::error::{ModelError, Result};
use super::geometry::{shrink_rect, strictly_inside};
use super::road_network::{NodeId, RoadNetwork};


pub static DEFAULT_MARGIN_FRACTION: f64 = 0.05;
pub static DEFAULT_MAX_ATTEMPTS: usize = 10000;


/// Picks origins and destinations: random points in each region, snapped to the nearest
/// intersection.
#[derive(Debug, Clone)]
pub struct OdSampler {
    regions: Vec<Polygon<f64>>,
    // points this close to the edge of the network, as a fraction of its extent, are rejected
    margin_fraction: f64,
    max_attempts: usize,
    extent: Rect<f64>,
    // read-only once built, so clones share it
    node_tree: Arc<KdTree<f64, NodeId, [f64; 2]>>,
    // the seed and count that produced `points`
    last_draw: Option<(u64, usize)>,
    points: Vec<NodeId>,
}

impl OdSampler {
    pub fn new(network: &RoadNetwork, regions: Vec<Polygon<f64>>) -> Result<OdSampler> {
        OdSampler::with_limits(network, regions, DEFAULT_MARGIN_FRACTION, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_limits(network: &RoadNetwork, regions: Vec<Polygon<f64>>, margin_fraction: f64,
                       max_attempts: usize) -> Result<OdSampler> {
        if !(0. ..0.5).contains(&margin_fraction) {
            return Err(ModelError::InvalidParameter {
                name: "margin_fraction",
                value: margin_fraction,
                reason: "must be at least 0 and less than 0.5",
            });
        }
        let extent = network.nodes().
            map(|node| Point::from(node.pos.to_coord())).
            collect::<MultiPoint<f64>>().
            bounding_rect().
            ok_or_else(|| ModelError::Sampling(String::from("the network has no nodes")))?;

        let mut node_tree = KdTree::new(2);
        for node in network.nodes() {
            node_tree.add(node.pos.as_array(), node.id).
                map_err(|err| ModelError::Sampling(format!("can't index node {}: {:?}",
                                                           node.id, err)))?;
        }

        Ok(OdSampler {
            regions,
            margin_fraction,
            max_attempts,
            extent,
            node_tree: Arc::new(node_tree),
            last_draw: None,
            points: vec![],
        })
    }

    /// Draws `points_per_polygon` points in every region, each snapped to its nearest node,
    /// with duplicates removed.  Asking again with the same seed and count returns the
    /// points already drawn.
    pub fn sample_points(&mut self, seed: u64, points_per_polygon: usize)
                         -> Result<&Vec<NodeId>> {
        if self.last_draw == Some((seed, points_per_polygon)) {
            return Ok(&self.points);
        }
        if points_per_polygon == 0 {
            return Err(ModelError::InvalidParameter {
                name: "points_per_polygon",
                value: 0.,
                reason: "at least one point per polygon is needed",
            });
        }

        let mut rng = Isaac64Rng::seed_from_u64(seed);
        let inner_extent = shrink_rect(&self.extent, self.margin_fraction);
        let mut points = vec![];
        for (ii, region) in self.regions.iter().enumerate() {
            let bounds = match region.bounding_rect() {
                Some(bounds) if bounds.width() > 0. && bounds.height() > 0. => bounds,
                _ => return Err(ModelError::Sampling(
                    format!("region {} has no area to sample from", ii))),
            };
            for _ in 0..points_per_polygon {
                let point = self.draw_point(&mut rng, region, &bounds, &inner_extent).
                    ok_or_else(|| ModelError::Sampling(
                        format!("no point found in region {} after {} attempts", ii,
                                self.max_attempts)))?;
                let node = self.nearest_node(&point)?;
                if !points.contains(&node) {
                    points.push(node);
                }
            }
        }
        log::info!("sampled {} distinct points from {} regions with seed {}", points.len(),
                   self.regions.len(), seed);

        self.points = points;
        self.last_draw = Some((seed, points_per_polygon));
        Ok(&self.points)
    }

    fn draw_point(&self, rng: &mut Isaac64Rng, region: &Polygon<f64>, bounds: &Rect<f64>,
                  inner_extent: &Rect<f64>) -> Option<Point<f64>> {
        for _ in 0..self.max_attempts {
            let x_coord = rng.gen_range(bounds.min().x..bounds.max().x);
            let y_coord = rng.gen_range(bounds.min().y..bounds.max().y);
            let point = Point::new(x_coord, y_coord);
            if region.contains(&point) && strictly_inside(inner_extent, &point) {
                return Some(point);
            }
        }
        None
    }

    fn nearest_node(&self, point: &Point<f64>) -> Result<NodeId> {
        let nearest = self.node_tree.nearest(&[point.x(), point.y()], 1, &squared_euclidean).
            map_err(|err| ModelError::Sampling(format!("nearest node search failed: {:?}",
                                                       err)))?;
        match nearest.first() {
            Some((_, node)) => Ok(**node),
            None => Err(ModelError::Sampling(String::from("no nodes to snap to"))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::super::geometry::{polygon_from_points, Point2d};
    use super::super::test_utils::grid_network;

    fn square(min: f64, max: f64) -> Polygon<f64> {
        polygon_from_points(&[
            Point2d::new(min, min),
            Point2d::new(max, min),
            Point2d::new(max, max),
            Point2d::new(min, max),
        ])
    }

    #[test]
    fn test_same_seed_same_points() {
        // a 10x10 grid spans 0 to 900
        let network = grid_network(10);
        let regions = vec![square(0., 450.), square(450., 900.)];
        let mut sampler = OdSampler::new(&network, regions.clone()).unwrap();
        let first = sampler.sample_points(42, 3).unwrap().clone();
        assert!(!first.is_empty());
        assert!(first.len() <= 6);

        let mut other = OdSampler::new(&network, regions).unwrap();
        assert_eq!(other.sample_points(42, 3).unwrap(), &first);
        assert_eq!(other.last_draw, Some((42, 3)));

        // the same seed and count hand back the stored draw without sampling again
        other.points = vec![999];
        assert_eq!(other.sample_points(42, 3).unwrap(), &vec![999]);
        // a new count draws afresh
        assert_ne!(other.sample_points(42, 2).unwrap(), &vec![999]);
        assert_eq!(other.last_draw, Some((42, 2)));

        let mut seen = std::collections::HashSet::new();
        for node in &first {
            assert!(seen.insert(*node));
            assert!(network.node_index(*node).is_some());
        }
    }

    #[test]
    fn test_points_stay_off_the_edge() {
        let network = grid_network(10);
        // a region covering the whole grid; a 20% margin keeps points in 180-720
        let mut sampler = OdSampler::with_limits(&network, vec![square(0., 900.)], 0.2, 1000).
            unwrap();
        let points = sampler.sample_points(7, 20).unwrap().clone();
        for node in points {
            let pos = network.node_position(node).unwrap();
            assert!(pos.x_coord >= 100. && pos.x_coord <= 800.);
            assert!(pos.y_coord >= 100. && pos.y_coord <= 800.);
        }
    }

    #[test]
    fn test_points_snap_into_region() {
        let network = grid_network(10);
        let mut sampler = OdSampler::new(&network, vec![square(410., 490.)]).unwrap();
        let points = sampler.sample_points(3, 5).unwrap();
        // every point in 410-490 snaps to the intersections at 400 or 500
        for node in points {
            let pos = network.node_position(*node).unwrap();
            assert!(pos.x_coord == 400. || pos.x_coord == 500.);
            assert!(pos.y_coord == 400. || pos.y_coord == 500.);
        }
    }

    #[test]
    fn test_degenerate_regions() {
        let network = grid_network(5);
        let flat = polygon_from_points(&[Point2d::new(0., 0.), Point2d::new(400., 0.),
                                         Point2d::new(200., 0.)]);
        let mut sampler = OdSampler::new(&network, vec![flat]).unwrap();
        assert!(matches!(sampler.sample_points(1, 1), Err(ModelError::Sampling(_))));

        // a region entirely inside the margin can never produce a point
        let mut sampler = OdSampler::with_limits(&network, vec![square(0., 5.)], 0.05, 100).
            unwrap();
        assert!(matches!(sampler.sample_points(1, 1), Err(ModelError::Sampling(_))));

        let mut sampler = OdSampler::new(&network, vec![square(0., 400.)]).unwrap();
        assert!(sampler.sample_points(1, 0).is_err());
        assert!(OdSampler::with_limits(&network, vec![], 0.6, 10).is_err());
    }

    #[test]
    fn test_clones_share_the_node_index() {
        let network = grid_network(5);
        let mut sampler = OdSampler::new(&network, vec![square(0., 400.)]).unwrap();
        let mut copy = sampler.clone();
        assert!(Arc::ptr_eq(&sampler.node_tree, &copy.node_tree));

        let drawn = sampler.sample_points(11, 2).unwrap().clone();
        // the copy keeps its own draw state
        assert_eq!(copy.last_draw, None);
        assert_eq!(copy.sample_points(11, 2).unwrap(), &drawn);
    }
}
