use itertools::iproduct;

use super::geometry::Point2d;
use super::road_network::{NodeId, RoadNetwork, RoadSegment, SpeedSpec};


/// A -> B -> D and A -> C -> D, with ids 1 to 4.  The A-C-D side is residential and slower.
///
/// ```text
///     A(1) ---100m, 50---> B(2)
///      |                    |
///   50m, 30            100m, 50
///      v                    v
///     C(3) ---50m, 30----> D(4)
/// ```
pub fn diamond_network() -> RoadNetwork {
    let mut network = RoadNetwork::new();
    network.add_node(1, Point2d::new(0., 0.));
    network.add_node(2, Point2d::new(100., 0.));
    network.add_node(3, Point2d::new(0., -50.));
    network.add_node(4, Point2d::new(100., -50.));

    let fast = RoadSegment::new(100., SpeedSpec::Single(50.));
    let mut residential = RoadSegment::new(50., SpeedSpec::Single(30.));
    residential.highway = vec![String::from("residential")];

    network.add_segment(1, 2, fast.clone()).unwrap();
    network.add_segment(2, 4, fast).unwrap();
    network.add_segment(1, 3, residential.clone()).unwrap();
    network.add_segment(3, 4, residential).unwrap();
    return network;
}

/// A two-way grid of `size` x `size` intersections 100m apart, ids `y * size + x`.
pub fn grid_network(size: u64) -> RoadNetwork {
    let mut network = RoadNetwork::new();
    for (y_idx, x_idx) in iproduct!(0..size, 0..size) {
        network.add_node(y_idx * size + x_idx,
                         Point2d::new(x_idx as f64 * 100., y_idx as f64 * 100.));
    }
    let segment = RoadSegment::new(100., SpeedSpec::Absent);
    for (y_idx, x_idx) in iproduct!(0..size, 0..size) {
        let this_id: NodeId = y_idx * size + x_idx;
        if x_idx + 1 < size {
            network.add_segment(this_id, this_id + 1, segment.clone()).unwrap();
            network.add_segment(this_id + 1, this_id, segment.clone()).unwrap();
        }
        if y_idx + 1 < size {
            network.add_segment(this_id, this_id + size, segment.clone()).unwrap();
            network.add_segment(this_id + size, this_id, segment.clone()).unwrap();
        }
    }
    return network;
}
