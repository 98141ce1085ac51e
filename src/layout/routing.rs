use std::collections::HashMap;

use super::types::RankBox;

// ── Self-loop sizing ────────────────────────────────────────────────
/// Ratio of rank_spacing a self-loop reaches past the node border.
const SELF_LOOP_REACH_RATIO: f64 = 0.4;
/// Fraction of the node's cross extent between the loop's two legs.
const SELF_LOOP_SPREAD_RATIO: f64 = 0.5;

// ── Same-rank detours ───────────────────────────────────────────────
/// Ratio of rank_spacing used when an edge leaves its rank band to go around siblings.
const SAME_RANK_DETOUR_RATIO: f64 = 0.5;

/// Flow-axis band occupied by one rank.
#[derive(Debug, Clone, Copy)]
pub(super) struct RankBand {
    pub start: f64,
    pub len: f64,
}

impl RankBand {
    pub fn center(&self) -> f64 {
        self.start + self.len / 2.0
    }

    pub fn end(&self) -> f64 {
        self.start + self.len
    }
}

pub(super) struct RouteContext<'a> {
    pub boxes: &'a HashMap<String, RankBox>,
    pub ranks: &'a HashMap<String, usize>,
    pub orders: &'a HashMap<String, usize>,
    pub bands: &'a [RankBand],
    /// Boxes of each rank, sorted along the cross axis.
    pub members: &'a [Vec<RankBox>],
    pub node_spacing: f64,
    pub rank_spacing: f64,
}

/// Routes one edge in flow/cross space. `None` when an endpoint is unknown.
pub(super) fn route_edge(ctx: &RouteContext<'_>, from: &str, to: &str) -> Option<Vec<(f64, f64)>> {
    let source = ctx.boxes.get(from)?;
    let target = ctx.boxes.get(to)?;
    if from == to {
        return Some(route_self_loop(source, ctx.rank_spacing));
    }

    let source_rank = ctx.ranks.get(from).copied().unwrap_or(0);
    let target_rank = ctx.ranks.get(to).copied().unwrap_or(0);
    let waypoints = if source_rank == target_rank {
        same_rank_waypoints(ctx, from, to, source, target, source_rank)
    } else {
        rank_span_waypoints(ctx, source, target, source_rank, target_rank)
    };

    let first_aim = waypoints.first().copied().unwrap_or_else(|| target.center());
    let last_aim = waypoints.last().copied().unwrap_or_else(|| source.center());

    let mut points = Vec::with_capacity(waypoints.len() + 2);
    points.push(rect_boundary_point(source, first_aim));
    points.extend(waypoints);
    points.push(rect_boundary_point(target, last_aim));
    Some(points)
}

fn rank_span_waypoints(
    ctx: &RouteContext<'_>,
    source: &RankBox,
    target: &RankBox,
    source_rank: usize,
    target_rank: usize,
) -> Vec<(f64, f64)> {
    let intervening: Vec<usize> = if source_rank < target_rank {
        ((source_rank + 1)..target_rank).collect()
    } else {
        ((target_rank + 1)..source_rank).rev().collect()
    };
    if intervening.is_empty() {
        return Vec::new();
    }

    let (source_flow, source_cross) = source.center();
    let (target_flow, target_cross) = target.center();
    let span = target_flow - source_flow;

    intervening
        .into_iter()
        .filter_map(|rank| {
            let band = ctx.bands.get(rank)?;
            let flow = band.center();
            let t = if span.abs() > f64::EPSILON {
                (flow - source_flow) / span
            } else {
                0.5
            };
            let candidate = source_cross + t * (target_cross - source_cross);
            let members = ctx.members.get(rank).map(Vec::as_slice).unwrap_or(&[]);
            Some((flow, free_cross(members, candidate, ctx.node_spacing)))
        })
        .collect()
}

fn same_rank_waypoints(
    ctx: &RouteContext<'_>,
    from: &str,
    to: &str,
    source: &RankBox,
    target: &RankBox,
    rank: usize,
) -> Vec<(f64, f64)> {
    let source_order = ctx.orders.get(from).copied().unwrap_or(0);
    let target_order = ctx.orders.get(to).copied().unwrap_or(0);
    if source_order.abs_diff(target_order) <= 1 {
        return Vec::new();
    }
    let Some(band) = ctx.bands.get(rank) else {
        return Vec::new();
    };
    let flow = band.end() + ctx.rank_spacing * SAME_RANK_DETOUR_RATIO;
    vec![(flow, source.center().1), (flow, target.center().1)]
}

/// Moves `candidate` off any node body in the rank, into the nearest gap.
pub(super) fn free_cross(members: &[RankBox], candidate: f64, spacing: f64) -> f64 {
    let half_gap = spacing / 2.0;
    for member in members {
        let low = member.cross - half_gap;
        let high = member.cross_end() + half_gap;
        if candidate > low && candidate < high {
            return if candidate - low < high - candidate {
                low
            } else {
                high
            };
        }
    }
    candidate
}

pub(super) fn route_self_loop(node: &RankBox, rank_spacing: f64) -> Vec<(f64, f64)> {
    let reach = rank_spacing * SELF_LOOP_REACH_RATIO;
    let (_, center_cross) = node.center();
    let spread = node.cross_len * SELF_LOOP_SPREAD_RATIO / 2.0;
    let flow_end = node.flow_end();
    vec![
        (flow_end, center_cross - spread),
        (flow_end + reach, center_cross - spread),
        (flow_end + reach, center_cross + spread),
        (flow_end, center_cross + spread),
    ]
}

/// Where the ray from the box centre towards `toward` leaves the box.
pub(super) fn rect_boundary_point(node: &RankBox, toward: (f64, f64)) -> (f64, f64) {
    let (x, y) = node.center();
    let dx = toward.0 - x;
    let dy = toward.1 - y;
    let mut w = node.flow_len / 2.0;
    let mut h = node.cross_len / 2.0;

    if dx == 0.0 && dy == 0.0 {
        return (x, y);
    }

    let (sx, sy) = if dy.abs() * w > dx.abs() * h {
        if dy < 0.0 {
            h = -h;
        }
        (h * dx / dy, h)
    } else {
        if dx < 0.0 {
            w = -w;
        }
        (w, w * dy / dx)
    };
    (x + sx, y + sy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank_box(flow: f64, cross: f64) -> RankBox {
        RankBox {
            flow,
            cross,
            flow_len: 100.0,
            cross_len: 50.0,
        }
    }

    #[test]
    fn boundary_point_on_flow_side() {
        let node = rank_box(0.0, 0.0);
        assert_eq!(rect_boundary_point(&node, (500.0, 25.0)), (100.0, 25.0));
        assert_eq!(rect_boundary_point(&node, (-500.0, 25.0)), (0.0, 25.0));
    }

    #[test]
    fn boundary_point_on_cross_side() {
        let node = rank_box(0.0, 0.0);
        assert_eq!(rect_boundary_point(&node, (50.0, 400.0)), (50.0, 50.0));
        assert_eq!(rect_boundary_point(&node, (50.0, -400.0)), (50.0, 0.0));
    }

    #[test]
    fn boundary_point_at_centre_is_centre() {
        let node = rank_box(0.0, 0.0);
        assert_eq!(rect_boundary_point(&node, (50.0, 25.0)), (50.0, 25.0));
    }

    #[test]
    fn free_cross_leaves_gaps_alone() {
        let members = vec![rank_box(0.0, 0.0), rank_box(0.0, 100.0)];
        assert_eq!(free_cross(&members, 75.0, 50.0), 75.0);
        assert_eq!(free_cross(&members, 300.0, 50.0), 300.0);
    }

    #[test]
    fn free_cross_moves_to_nearest_gap() {
        let members = vec![rank_box(0.0, 0.0), rank_box(0.0, 100.0)];
        assert_eq!(free_cross(&members, 10.0, 50.0), -25.0);
        assert_eq!(free_cross(&members, 140.0, 50.0), 175.0);
    }

    #[test]
    fn free_cross_prefers_the_far_side_on_ties() {
        let members = vec![rank_box(0.0, 0.0)];
        assert_eq!(free_cross(&members, 25.0, 50.0), 75.0);
    }

    #[test]
    fn same_rank_non_neighbours_detour_past_the_band() {
        let boxes: HashMap<String, RankBox> = [
            ("a".to_string(), rank_box(0.0, 0.0)),
            ("b".to_string(), rank_box(0.0, 100.0)),
            ("c".to_string(), rank_box(0.0, 200.0)),
        ]
        .into_iter()
        .collect();
        let ranks: HashMap<String, usize> = boxes.keys().map(|id| (id.clone(), 0)).collect();
        let orders: HashMap<String, usize> = [("a", 0), ("b", 1), ("c", 2)]
            .into_iter()
            .map(|(id, order)| (id.to_string(), order))
            .collect();
        let bands = [RankBand { start: 0.0, len: 100.0 }];
        let members = vec![vec![boxes["a"], boxes["b"], boxes["c"]]];
        let ctx = RouteContext {
            boxes: &boxes,
            ranks: &ranks,
            orders: &orders,
            bands: &bands,
            members: &members,
            node_spacing: 50.0,
            rank_spacing: 80.0,
        };

        let detour = route_edge(&ctx, "a", "c").unwrap();
        assert_eq!(
            detour,
            vec![(100.0, 25.0), (140.0, 25.0), (140.0, 225.0), (100.0, 225.0)]
        );
        let direct = route_edge(&ctx, "a", "b").unwrap();
        assert_eq!(direct, vec![(50.0, 50.0), (50.0, 100.0)]);
        assert!(route_edge(&ctx, "a", "ghost").is_none());
    }

    #[test]
    fn self_loop_has_four_points_past_the_node() {
        let node = rank_box(0.0, 0.0);
        let points = route_self_loop(&node, 80.0);
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|(flow, _)| *flow >= 100.0));
        assert_eq!(points[0].0, 100.0);
        assert_eq!(points[3].0, 100.0);
        assert_eq!(points[1], (132.0, 12.5));
        assert_eq!(points[2], (132.0, 37.5));
    }
}
