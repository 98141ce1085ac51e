use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::ir::Edge;

/// Edges that take part in ranking and ordering: both ends known, no self-loops.
pub(super) fn rankable_edges<'a>(node_ids: &[String], edges: &'a [Edge]) -> Vec<&'a Edge> {
    let known: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
    edges
        .iter()
        .filter(|edge| !edge.is_self_loop())
        .filter(|edge| known.contains(edge.from.as_str()) && known.contains(edge.to.as_str()))
        .collect()
}

pub(super) fn compute_ranks(
    node_ids: &[String],
    edges: &[&Edge],
    node_order: &HashMap<String, usize>,
) -> HashMap<String, usize> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = node_ids.iter().map(|id| (id.as_str(), 0)).collect();

    for edge in edges {
        adj.entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
        if let Some(deg) = indeg.get_mut(edge.to.as_str()) {
            *deg += 1;
        }
    }

    let order_key = |id: &str| -> usize { node_order.get(id).copied().unwrap_or(usize::MAX) };

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for id in node_ids {
        if indeg.get(id.as_str()).copied().unwrap_or(0) == 0 {
            ready.push(Reverse((order_key(id.as_str()), id.as_str())));
        }
    }

    let mut order: Vec<&str> = Vec::with_capacity(node_ids.len());
    let mut processed: HashSet<&str> = HashSet::new();
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
            if let Some(nexts) = adj.get(id) {
                for next in nexts {
                    if processed.contains(next) {
                        continue;
                    }
                    if let Some(deg) = indeg.get_mut(next) {
                        *deg = deg.saturating_sub(1);
                        if *deg == 0 {
                            ready.push(Reverse((order_key(*next), *next)));
                        }
                    }
                }
            }
        }

        if processed.len() >= node_ids.len() {
            break;
        }

        // Cycle: release the earliest declared node still blocked. Its
        // remaining incoming edges become back-edges.
        let blocked = node_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !processed.contains(id))
            .min_by_key(|id| order_key(*id));
        match blocked {
            Some(id) => ready.push(Reverse((order_key(id), id))),
            None => break,
        }
    }

    let order_index: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, id)| (*id, idx))
        .collect();

    let mut ranks: HashMap<String, usize> = HashMap::new();
    for node in &order {
        let rank = ranks.get(*node).copied().unwrap_or(0);
        ranks.entry((*node).to_string()).or_insert(rank);
        let Some(nexts) = adj.get(node) else {
            continue;
        };
        let from_idx = order_index.get(node).copied().unwrap_or(0);
        for next in nexts {
            let to_idx = order_index.get(next).copied().unwrap_or(from_idx);
            if to_idx <= from_idx {
                continue;
            }
            let entry = ranks.entry((*next).to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }

    ranks
}

/// Groups node ids by rank, keeping input order inside each rank.
pub(super) fn bucket_by_rank(node_ids: &[String], ranks: &HashMap<String, usize>) -> Vec<Vec<String>> {
    let max_rank = ranks.values().copied().max().unwrap_or(0);
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
    for id in node_ids {
        let rank = ranks.get(id).copied().unwrap_or(0);
        buckets[rank].push(id.clone());
    }
    if node_ids.is_empty() {
        buckets.clear();
    }
    buckets
}

/// Reorders each rank to reduce crossings: `passes` rounds of a downward
/// sweep (by predecessors) then an upward sweep (by successors), sorting each
/// bucket by the median position of its neighbours.
pub(super) fn order_rank_nodes(buckets: &mut [Vec<String>], edges: &[&Edge], passes: usize) {
    if buckets.len() <= 1 {
        return;
    }
    let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        successors
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
        predecessors
            .entry(edge.to.as_str())
            .or_default()
            .push(edge.from.as_str());
    }

    let mut positions: HashMap<String, usize> = buckets
        .iter()
        .flat_map(|bucket| bucket.iter().enumerate())
        .map(|(idx, id)| (id.clone(), idx))
        .collect();

    for _ in 0..passes {
        for rank in 1..buckets.len() {
            sort_by_median(&mut buckets[rank], &predecessors, &mut positions);
        }
        for rank in (0..buckets.len() - 1).rev() {
            sort_by_median(&mut buckets[rank], &successors, &mut positions);
        }
    }
}

/// Stable sort of one bucket by neighbour median; nodes without placed
/// neighbours keep their current slot as their key.
fn sort_by_median(
    bucket: &mut Vec<String>,
    neighbors: &HashMap<&str, Vec<&str>>,
    positions: &mut HashMap<String, usize>,
) {
    if bucket.len() <= 1 {
        return;
    }
    let mut keyed: Vec<(f64, String)> = bucket
        .drain(..)
        .enumerate()
        .map(|(current, id)| {
            let key = neighbors
                .get(id.as_str())
                .and_then(|list| median_position(list, positions))
                .unwrap_or(current as f64);
            (key, id)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (idx, (_, id)) in keyed.into_iter().enumerate() {
        positions.insert(id.clone(), idx);
        bucket.push(id);
    }
}

fn median_position(neighbors: &[&str], positions: &HashMap<String, usize>) -> Option<f64> {
    let mut values: Vec<usize> = neighbors
        .iter()
        .filter_map(|neighbor| positions.get(*neighbor).copied())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 1 {
        values[mid] as f64
    } else {
        (values[mid - 1] + values[mid]) as f64 / 2.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    fn order_of(node_ids: &[String]) -> HashMap<String, usize> {
        node_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect()
    }

    #[test]
    fn chain_ranks_increase() {
        let nodes = ids(&["a", "b", "c"]);
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c")];
        let rankable = rankable_edges(&nodes, &edges);
        let ranks = compute_ranks(&nodes, &rankable, &order_of(&nodes));
        assert_eq!(ranks["a"], 0);
        assert_eq!(ranks["b"], 1);
        assert_eq!(ranks["c"], 2);
    }

    #[test]
    fn rank_is_longest_path() {
        let nodes = ids(&["a", "b", "c"]);
        let edges = vec![Edge::new("a", "c"), Edge::new("a", "b"), Edge::new("b", "c")];
        let rankable = rankable_edges(&nodes, &edges);
        let ranks = compute_ranks(&nodes, &rankable, &order_of(&nodes));
        assert_eq!(ranks["c"], 2);
    }

    #[test]
    fn cycles_are_broken_by_declaration_order() {
        let nodes = ids(&["a", "b", "c"]);
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("c", "a")];
        let rankable = rankable_edges(&nodes, &edges);
        let ranks = compute_ranks(&nodes, &rankable, &order_of(&nodes));
        assert_eq!(ranks["a"], 0);
        assert_eq!(ranks["b"], 1);
        assert_eq!(ranks["c"], 2);
    }

    #[test]
    fn self_loops_do_not_rank() {
        let nodes = ids(&["a"]);
        let edges = vec![Edge::new("a", "a")];
        let rankable = rankable_edges(&nodes, &edges);
        assert!(rankable.is_empty());
        let ranks = compute_ranks(&nodes, &rankable, &order_of(&nodes));
        assert_eq!(ranks["a"], 0);
    }

    #[test]
    fn ordering_uncrosses_edges() {
        let nodes = ids(&["a", "b", "x", "y"]);
        let edges = vec![Edge::new("a", "y"), Edge::new("b", "x")];
        let rankable = rankable_edges(&nodes, &edges);
        let order = order_of(&nodes);
        let ranks = compute_ranks(&nodes, &rankable, &order);
        let mut buckets = bucket_by_rank(&nodes, &ranks);
        assert_eq!(buckets[1], ids(&["x", "y"]));
        order_rank_nodes(&mut buckets, &rankable, 4);
        assert_eq!(buckets[0], ids(&["a", "b"]));
        assert_eq!(buckets[1], ids(&["y", "x"]));
    }

    #[test]
    fn ordering_keeps_input_order_without_neighbours() {
        let nodes = ids(&["root", "p", "q", "r"]);
        let edges = vec![
            Edge::new("root", "p"),
            Edge::new("root", "q"),
            Edge::new("root", "r"),
        ];
        let rankable = rankable_edges(&nodes, &edges);
        let ranks = compute_ranks(&nodes, &rankable, &order_of(&nodes));
        let mut buckets = bucket_by_rank(&nodes, &ranks);
        order_rank_nodes(&mut buckets, &rankable, 4);
        assert_eq!(buckets[1], ids(&["p", "q", "r"]));
    }

    #[test]
    fn median_of_even_neighbour_count_is_the_midpoint() {
        let positions: HashMap<String, usize> = [("a", 0), ("b", 3), ("c", 5), ("d", 9)]
            .into_iter()
            .map(|(id, pos)| (id.to_string(), pos))
            .collect();
        assert_eq!(median_position(&["a", "b", "c", "d"], &positions), Some(4.0));
        assert_eq!(median_position(&["b"], &positions), Some(3.0));
        assert_eq!(median_position(&["ghost"], &positions), None);
    }
}
