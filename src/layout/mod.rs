mod ranking;
mod routing;
mod text;
pub(crate) mod types;
pub use types::*;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::ir::{DiagramInput, Direction};
use ranking::{bucket_by_rank, compute_ranks, order_rank_nodes, rankable_edges};
use routing::{RankBand, RouteContext, route_edge};
use text::measure_label;

/// Places every node and routes every edge of `input`.
///
/// The work happens in flow/cross space (flow runs from rank to rank) and is
/// mapped to x/y at the end, so all four directions share one code path.
/// Identical input always yields identical coordinates.
pub fn compute_layout(input: &DiagramInput, config: &LayoutConfig) -> Layout {
    let direction = input.layout;

    let mut seen = HashSet::new();
    let node_ids: Vec<String> = input
        .nodes
        .iter()
        .filter(|node| seen.insert(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect();
    let node_order: HashMap<String, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();

    let mut labels: HashMap<String, TextBlock> = HashMap::new();
    for node in &input.nodes {
        labels
            .entry(node.id.clone())
            .or_insert_with(|| measure_label(&node.label, config));
    }

    let rankable = rankable_edges(&node_ids, &input.edges);
    let ranks = compute_ranks(&node_ids, &rankable, &node_order);
    let mut buckets = bucket_by_rank(&node_ids, &ranks);
    order_rank_nodes(&mut buckets, &rankable, config.order_passes);
    tracing::debug!(
        nodes = node_ids.len(),
        ranks = buckets.len(),
        "ranked diagram nodes"
    );

    let extent = |id: &str| -> (f64, f64) {
        let block = labels.get(id);
        let width = block.map(|b| b.width).unwrap_or(config.min_node_width);
        let height = block.map(|b| b.height).unwrap_or(config.min_node_height);
        if direction.is_horizontal() {
            (width, height)
        } else {
            (height, width)
        }
    };

    // Flow bands: one per rank, as deep as the rank's largest node.
    let mut bands: Vec<RankBand> = Vec::with_capacity(buckets.len());
    let mut cursor = config.margin;
    for bucket in &buckets {
        let len = bucket
            .iter()
            .map(|id| extent(id).0)
            .fold(0.0_f64, f64::max);
        bands.push(RankBand { start: cursor, len });
        cursor += len + config.rank_spacing;
    }

    // Cross stacking: each rank is centred against the widest one.
    let rank_cross_totals: Vec<f64> = buckets
        .iter()
        .map(|bucket| {
            let sum: f64 = bucket.iter().map(|id| extent(id).1).sum();
            sum + config.node_spacing * bucket.len().saturating_sub(1) as f64
        })
        .collect();
    let widest = rank_cross_totals.iter().copied().fold(0.0_f64, f64::max);

    let mut boxes: HashMap<String, RankBox> = HashMap::new();
    let mut orders: HashMap<String, usize> = HashMap::new();
    let mut members: Vec<Vec<RankBox>> = Vec::with_capacity(buckets.len());
    for (rank, bucket) in buckets.iter().enumerate() {
        let band = bands[rank];
        let mut cross = config.margin + (widest - rank_cross_totals[rank]) / 2.0;
        let mut rank_members = Vec::with_capacity(bucket.len());
        for (order, id) in bucket.iter().enumerate() {
            let (flow_len, cross_len) = extent(id);
            let rank_box = RankBox {
                flow: band.start + (band.len - flow_len) / 2.0,
                cross,
                flow_len,
                cross_len,
            };
            cross += cross_len + config.node_spacing;
            boxes.insert(id.clone(), rank_box);
            orders.insert(id.clone(), order);
            rank_members.push(rank_box);
        }
        members.push(rank_members);
    }

    let ctx = RouteContext {
        boxes: &boxes,
        ranks: &ranks,
        orders: &orders,
        bands: &bands,
        members: &members,
        node_spacing: config.node_spacing,
        rank_spacing: config.rank_spacing,
    };
    let routes: Vec<Vec<(f64, f64)>> = input
        .edges
        .iter()
        .map(|edge| {
            route_edge(&ctx, &edge.from, &edge.to).unwrap_or_else(|| {
                tracing::debug!(from = %edge.from, to = %edge.to, "edge endpoint has no layout");
                Vec::new()
            })
        })
        .collect();

    let content_flow = boxes
        .values()
        .map(RankBox::flow_end)
        .chain(routes.iter().flatten().map(|point| point.0))
        .fold(config.margin, f64::max);
    let content_cross = boxes
        .values()
        .map(RankBox::cross_end)
        .chain(routes.iter().flatten().map(|point| point.1))
        .fold(config.margin, f64::max);
    let total_flow = content_flow + config.margin;
    let total_cross = content_cross + config.margin;

    let frame = Frame {
        direction,
        total_flow,
    };

    let mut nodes = BTreeMap::new();
    for (rank, bucket) in buckets.iter().enumerate() {
        for (order, id) in bucket.iter().enumerate() {
            let Some(rank_box) = boxes.get(id) else {
                continue;
            };
            let (x, y, width, height) = frame.place_box(rank_box);
            let label = labels.get(id).cloned().unwrap_or_else(|| TextBlock {
                lines: Vec::new(),
                width,
                height,
            });
            nodes.insert(
                id.clone(),
                NodeLayout {
                    id: id.clone(),
                    x,
                    y,
                    width,
                    height,
                    rank,
                    order,
                    label,
                },
            );
        }
    }

    let edges = input
        .edges
        .iter()
        .zip(routes)
        .map(|(edge, route)| EdgeLayout {
            from: edge.from.clone(),
            to: edge.to.clone(),
            points: route.into_iter().map(|p| frame.place_point(p)).collect(),
        })
        .collect();

    let (width, height) = if direction.is_horizontal() {
        (total_flow, total_cross)
    } else {
        (total_cross, total_flow)
    };

    Layout {
        direction,
        nodes,
        edges,
        width,
        height,
        font_size: config.font_size,
    }
}

/// Maps flow/cross coordinates onto the x/y plane for one direction.
struct Frame {
    direction: Direction,
    total_flow: f64,
}

impl Frame {
    fn place_box(&self, rank_box: &RankBox) -> (f64, f64, f64, f64) {
        let flow = if self.direction.is_reversed() {
            self.total_flow - rank_box.flow - rank_box.flow_len
        } else {
            rank_box.flow
        };
        if self.direction.is_horizontal() {
            (flow, rank_box.cross, rank_box.flow_len, rank_box.cross_len)
        } else {
            (rank_box.cross, flow, rank_box.cross_len, rank_box.flow_len)
        }
    }

    fn place_point(&self, (flow, cross): (f64, f64)) -> (f64, f64) {
        let flow = if self.direction.is_reversed() {
            self.total_flow - flow
        } else {
            flow
        };
        if self.direction.is_horizontal() {
            (flow, cross)
        } else {
            (cross, flow)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Edge, Node};

    fn diagram(direction: Direction, nodes: &[&str], edges: &[(&str, &str)]) -> DiagramInput {
        let mut input = DiagramInput::new(direction);
        input.nodes = nodes.iter().map(|id| Node::new(*id, id.to_uppercase())).collect();
        input.edges = edges.iter().map(|(from, to)| Edge::new(*from, *to)).collect();
        input
    }

    fn layout_of(input: &DiagramInput) -> Layout {
        compute_layout(input, &LayoutConfig::default())
    }

    #[test]
    fn two_node_left_right_example() {
        let mut input = diagram(Direction::LeftRight, &["u", "s"], &[("u", "s")]);
        input.nodes[0].label = "User".to_string();
        input.nodes[1].label = "Server".to_string();
        let layout = layout_of(&input);

        let u = &layout.nodes["u"];
        let s = &layout.nodes["s"];
        assert_eq!((u.x, u.y, u.width, u.height), (20.0, 20.0, 150.0, 60.0));
        assert_eq!((s.x, s.y), (250.0, 20.0));
        assert_eq!(layout.edges[0].points, vec![(170.0, 50.0), (250.0, 50.0)]);
        assert_eq!(layout.width, 420.0);
        assert_eq!(layout.height, 100.0);
    }

    #[test]
    fn layout_is_deterministic() {
        let input = diagram(
            Direction::TopBottom,
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("d", "a"), ("a", "e")],
        );
        assert_eq!(layout_of(&input), layout_of(&input));
    }

    #[test]
    fn top_bottom_advances_along_y() {
        let layout = layout_of(&diagram(Direction::TopBottom, &["a", "b"], &[("a", "b")]));
        let a = &layout.nodes["a"];
        let b = &layout.nodes["b"];
        assert_eq!(a.x, b.x);
        assert_eq!(b.y, a.y + a.height + 80.0);
        let points = &layout.edges[0].points;
        assert_eq!(points.first(), Some(&(95.0, 80.0)));
        assert_eq!(points.last(), Some(&(95.0, 160.0)));
    }

    #[test]
    fn reversed_directions_mirror_the_flow_axis() {
        let rl = layout_of(&diagram(Direction::RightLeft, &["a", "b"], &[("a", "b")]));
        assert!(rl.nodes["a"].x > rl.nodes["b"].x);
        assert_eq!(rl.nodes["b"].x, 20.0);

        let bt = layout_of(&diagram(Direction::BottomTop, &["a", "b"], &[("a", "b")]));
        assert!(bt.nodes["a"].y > bt.nodes["b"].y);
        let points = &bt.edges[0].points;
        assert!(points[0].1 > points[1].1);
    }

    #[test]
    fn siblings_stack_on_the_cross_axis() {
        let layout = layout_of(&diagram(Direction::LeftRight, &["a", "b", "c"], &[("a", "b"), ("a", "c")]));
        let b = &layout.nodes["b"];
        let c = &layout.nodes["c"];
        assert_eq!(b.x, c.x);
        assert_eq!(c.y, b.y + b.height + 50.0);
        // Single-node rank is centred against the two-node rank.
        let a = &layout.nodes["a"];
        assert_eq!(a.center().1, (b.y + c.y + c.height) / 2.0);
    }

    #[test]
    fn long_edges_get_one_waypoint_per_intervening_rank() {
        let input = diagram(
            Direction::LeftRight,
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")],
        );
        let layout = layout_of(&input);
        let long = &layout.edges[3];
        assert_eq!(long.points.len(), 4);

        for (x, y) in &long.points[1..3] {
            for node in layout.nodes.values() {
                let inside = *x > node.x
                    && *x < node.x + node.width
                    && *y > node.y
                    && *y < node.y + node.height;
                assert!(!inside, "waypoint ({x}, {y}) inside {}", node.id);
            }
        }
    }

    #[test]
    fn self_loop_stays_on_the_downstream_side() {
        let layout = layout_of(&diagram(Direction::LeftRight, &["a"], &[("a", "a")]));
        let a = &layout.nodes["a"];
        let points = &layout.edges[0].points;
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|(x, _)| *x >= a.x + a.width));
        assert!(layout.width >= points.iter().map(|p| p.0).fold(0.0, f64::max));
    }

    #[test]
    fn cycles_and_disconnected_parts_still_lay_out() {
        let input = diagram(
            Direction::LeftRight,
            &["a", "b", "c", "lonely"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
        );
        let layout = layout_of(&input);
        assert_eq!(layout.nodes.len(), 4);
        assert_eq!(layout.nodes["a"].rank, 0);
        assert_eq!(layout.nodes["c"].rank, 2);
        assert_eq!(layout.nodes["lonely"].rank, 0);
        assert!(layout.edges.iter().all(|edge| edge.points.len() >= 2));
    }

    #[test]
    fn unknown_endpoints_yield_empty_routes() {
        let input = diagram(Direction::LeftRight, &["a"], &[("a", "ghost")]);
        let layout = layout_of(&input);
        assert_eq!(layout.edges.len(), 1);
        assert!(layout.edges[0].points.is_empty());
    }

    #[test]
    fn empty_diagram_is_just_margins() {
        let layout = layout_of(&DiagramInput::default());
        assert!(layout.nodes.is_empty());
        assert!(layout.edges.is_empty());
        assert_eq!(layout.width, 40.0);
        assert_eq!(layout.height, 40.0);
    }
}
