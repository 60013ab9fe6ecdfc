//! Cost-aware hex pathfinding.
//!
//! A* over the hex map where each step costs the entry cost of the terrain
//! being entered. Hex distance is the heuristic; it never overestimates
//! since the cheapest terrain costs one point to enter.
//!
//! Units are not obstacles here. Callers that care about occupancy check it
//! on the returned path.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::hex::HexCoordinate;
use crate::map::HexMap;

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    hex: HexCoordinate,
    /// f_score = g_score + heuristic
    f_score: u32,
    /// Insertion sequence number. Equal f_scores pop in discovery order.
    sequence: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so we reverse the comparison for min-heap behavior.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest path from `start` to `goal`.
///
/// The returned path includes both endpoints. It is empty when either
/// endpoint is off the map or the goal cannot be reached.
#[must_use]
pub fn find_path(map: &HexMap, start: HexCoordinate, goal: HexCoordinate) -> Vec<HexCoordinate> {
    if !map.in_bounds(start) || !map.in_bounds(goal) {
        return Vec::new();
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut closed_set: HashSet<HexCoordinate> = HashSet::new();
    let mut came_from: HashMap<HexCoordinate, HexCoordinate> = HashMap::new();
    let mut g_score: HashMap<HexCoordinate, u32> = HashMap::new();
    let mut sequence = 0u64;

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        hex: start,
        f_score: start.distance_to(goal),
        sequence,
    });

    while let Some(current) = open_set.pop() {
        if current.hex == goal {
            tracing::trace!(
                expanded = closed_set.len(),
                %start,
                %goal,
                "path found"
            );
            return reconstruct_path(&came_from, goal);
        }

        // Stale duplicate of a node that was already finalized.
        if !closed_set.insert(current.hex) {
            continue;
        }

        let current_g = g_score.get(&current.hex).copied().unwrap_or(u32::MAX);

        for neighbor in map.neighbors(current.hex) {
            if closed_set.contains(&neighbor) {
                continue;
            }
            let Some(step_cost) = map.entry_cost(neighbor) else {
                continue;
            };

            let tentative_g = current_g.saturating_add(step_cost);
            let neighbor_g = g_score.get(&neighbor).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.hex);
                g_score.insert(neighbor, tentative_g);
                sequence += 1;
                open_set.push(AStarNode {
                    hex: neighbor,
                    f_score: tentative_g + neighbor.distance_to(goal),
                    sequence,
                });
            }
        }
    }

    tracing::trace!(%start, %goal, "no path");
    Vec::new()
}

/// Reconstruct path from came_from map.
fn reconstruct_path(
    came_from: &HashMap<HexCoordinate, HexCoordinate>,
    goal: HexCoordinate,
) -> Vec<HexCoordinate> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

/// Every hex reachable from `start` for at most `budget` movement points.
///
/// Returns `(hex, cost)` pairs sorted row-major; the start itself is
/// included at cost zero. Empty when `start` is off the map.
#[must_use]
pub fn reachable(map: &HexMap, start: HexCoordinate, budget: u32) -> Vec<(HexCoordinate, u32)> {
    if !map.in_bounds(start) {
        return Vec::new();
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut best: HashMap<HexCoordinate, u32> = HashMap::new();
    let mut sequence = 0u64;

    best.insert(start, 0);
    open_set.push(AStarNode {
        hex: start,
        f_score: 0,
        sequence,
    });

    while let Some(current) = open_set.pop() {
        if best.get(&current.hex).is_some_and(|g| *g < current.f_score) {
            continue;
        }
        for neighbor in map.neighbors(current.hex) {
            let Some(step_cost) = map.entry_cost(neighbor) else {
                continue;
            };
            let cost = current.f_score + step_cost;
            if cost > budget || best.get(&neighbor).is_some_and(|g| *g <= cost) {
                continue;
            }
            best.insert(neighbor, cost);
            sequence += 1;
            open_set.push(AStarNode {
                hex: neighbor,
                f_score: cost,
                sequence,
            });
        }
    }

    let mut result: Vec<_> = best.into_iter().collect();
    result.sort_unstable_by_key(|(hex, _)| *hex);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Terrain;

    fn hex(col: i32, row: i32) -> HexCoordinate {
        HexCoordinate::new(col, row)
    }

    fn assert_connected(path: &[HexCoordinate]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].distance_to(pair[1]), 1, "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_simple_path() {
        let map = HexMap::new(10, 10);
        let path = find_path(&map, hex(0, 0), hex(5, 5));

        assert_eq!(path.first(), Some(&hex(0, 0)));
        assert_eq!(path.last(), Some(&hex(5, 5)));
        assert_eq!(path.len() as u32, hex(0, 0).distance_to(hex(5, 5)) + 1);
        assert_connected(&path);
    }

    #[test]
    fn test_path_to_same_hex() {
        let map = HexMap::new(10, 10);
        assert_eq!(find_path(&map, hex(3, 3), hex(3, 3)), vec![hex(3, 3)]);
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let map = HexMap::new(5, 5);
        assert!(find_path(&map, hex(-1, 0), hex(3, 3)).is_empty());
        assert!(find_path(&map, hex(0, 0), hex(5, 3)).is_empty());
    }

    #[test]
    fn test_path_avoids_expensive_terrain() {
        let mut map = HexMap::new(7, 3);
        // A river wall along the middle row, except the last column.
        for col in 1..6 {
            map.set_terrain(hex(col, 1), Terrain::River);
        }

        let path = find_path(&map, hex(0, 1), hex(6, 1));
        assert_eq!(path.first(), Some(&hex(0, 1)));
        assert_eq!(path.last(), Some(&hex(6, 1)));
        assert_connected(&path);
        assert!(path[1..path.len() - 1]
            .iter()
            .all(|h| map.terrain(*h) != Some(Terrain::River)));
        assert_eq!(map.path_cost(&path), 7);
    }

    #[test]
    fn test_cost_matches_brute_force() {
        let mut map = HexMap::new(6, 6);
        map.set_terrain(hex(2, 2), Terrain::Hills);
        map.set_terrain(hex(3, 2), Terrain::River);
        map.set_terrain(hex(2, 3), Terrain::Forest);

        let start = hex(0, 2);
        let flood = reachable(&map, start, u32::MAX);
        for (target, cost) in flood {
            let path = find_path(&map, start, target);
            assert_eq!(map.path_cost(&path), cost, "cost mismatch to {target}");
        }
    }

    #[test]
    fn test_determinism() {
        let mut map = HexMap::new(20, 20);
        for row in 5..15 {
            map.set_terrain(hex(10, row), Terrain::River);
        }

        let path1 = find_path(&map, hex(5, 10), hex(15, 10));
        let path2 = find_path(&map, hex(5, 10), hex(15, 10));
        let path3 = find_path(&map, hex(5, 10), hex(15, 10));

        assert_eq!(path1, path2);
        assert_eq!(path2, path3);
    }

    #[test]
    fn test_reachable_respects_budget() {
        let mut map = HexMap::new(5, 5);
        map.set_terrain(hex(3, 2), Terrain::River);

        let reach = reachable(&map, hex(2, 2), 2);
        let hexes: Vec<_> = reach.iter().map(|(h, _)| *h).collect();

        assert!(hexes.contains(&hex(2, 2)));
        assert!(hexes.contains(&hex(1, 2)));
        assert!(hexes.contains(&hex(0, 2)));
        assert!(!hexes.contains(&hex(3, 2)));
        assert!(reach.iter().all(|(_, cost)| *cost <= 2));
    }

    #[test]
    fn test_reachable_off_map() {
        let map = HexMap::new(5, 5);
        assert!(reachable(&map, hex(9, 9), 4).is_empty());
    }
}
