//! Office floor navigation over the door connectivity graph.
//!
//! `OfficeGraph` holds an adjacency list built from doors and answers BFS
//! route queries with a small bounded cache. `OfficeWalk` tracks where the
//! student is, which rooms they have visited and which career tracks those
//! rooms unlock.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::wizard::Track;

/// A room on the office floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: u32,
    pub name: String,
    /// Career track whose tasks start in this room.
    pub track: Option<Track>,
}

/// A doorway between two rooms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub room_a: u32,
    pub room_b: u32,
    pub x: f32,
    pub y: f32,
}

/// A single waypoint in a route: walk to this door, enter this room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub door_x: f32,
    pub door_y: f32,
    pub room_id: u32,
}

/// Navigation graph with BFS routing and a route cache.
#[derive(Debug, Clone)]
pub struct OfficeGraph {
    rooms: Vec<Room>,
    /// room_id → list of (neighbor_room_id, door_x, door_y)
    adj: HashMap<u32, Vec<(u32, f32, f32)>>,
    routes: HashMap<(u32, u32), Vec<Waypoint>>,
    /// Cached route keys, oldest first.
    route_order: VecDeque<(u32, u32)>,
    cache_capacity: usize,
}

impl OfficeGraph {
    pub fn new(rooms: Vec<Room>, doors: &[Door]) -> Self {
        Self::with_cache(rooms, doors, 64)
    }

    pub fn with_cache(rooms: Vec<Room>, doors: &[Door], cache_capacity: usize) -> Self {
        let mut adj: HashMap<u32, Vec<(u32, f32, f32)>> = HashMap::new();
        for d in doors {
            adj.entry(d.room_a).or_default().push((d.room_b, d.x, d.y));
            adj.entry(d.room_b).or_default().push((d.room_a, d.x, d.y));
        }
        Self {
            rooms,
            adj,
            routes: HashMap::new(),
            route_order: VecDeque::new(),
            cache_capacity,
        }
    }

    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn room_by_name(&self, name: &str) -> Option<&Room> {
        self.rooms
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn is_adjacent(&self, a: u32, b: u32) -> bool {
        self.neighbors(a).iter().any(|&(n, _, _)| n == b)
    }

    pub fn neighbors(&self, room_id: u32) -> &[(u32, f32, f32)] {
        self.adj.get(&room_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn cache_size(&self) -> usize {
        self.routes.len()
    }

    /// Route from `from` to `to`. Empty when already there, `None` if
    /// unreachable. Found routes are cached; the oldest goes first when
    /// the cache is full.
    pub fn find_route(&mut self, from: u32, to: u32) -> Option<Vec<Waypoint>> {
        if from == to {
            return Some(Vec::new());
        }
        if let Some(route) = self.routes.get(&(from, to)) {
            return Some(route.clone());
        }
        let route = self.shortest_route(from, to)?;
        if self.cache_capacity > 0 {
            while self.routes.len() >= self.cache_capacity {
                match self.route_order.pop_front() {
                    Some(oldest) => self.routes.remove(&oldest),
                    None => break,
                };
            }
            self.routes.insert((from, to), route.clone());
            self.route_order.push_back((from, to));
        }
        Some(route)
    }

    /// Breadth-first search recording how each room was first entered,
    /// then walking those entries back from `to`.
    fn shortest_route(&self, from: u32, to: u32) -> Option<Vec<Waypoint>> {
        let mut entered_via: HashMap<u32, (u32, f32, f32)> = HashMap::new();
        let mut frontier = VecDeque::from([from]);

        while let Some(room) = frontier.pop_front() {
            if room == to {
                break;
            }
            for &(next, x, y) in self.neighbors(room) {
                if next != from && !entered_via.contains_key(&next) {
                    entered_via.insert(next, (room, x, y));
                    frontier.push_back(next);
                }
            }
        }

        let mut route = Vec::new();
        let mut room = to;
        while room != from {
            let &(prev, door_x, door_y) = entered_via.get(&room)?;
            route.push(Waypoint {
                door_x,
                door_y,
                room_id: room,
            });
            room = prev;
        }
        route.reverse();
        Some(route)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    UnknownRoom(u32),
    NotAdjacent { from: u32, to: u32 },
    Unreachable { from: u32, to: u32 },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveError::UnknownRoom(id) => write!(f, "room {} does not exist", id),
            MoveError::NotAdjacent { from, to } => {
                write!(f, "room {} is not next to room {}", to, from)
            }
            MoveError::Unreachable { from, to } => {
                write!(f, "no route from room {} to room {}", from, to)
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// The student's position and history on the floor.
#[derive(Debug, Clone)]
pub struct OfficeWalk {
    graph: OfficeGraph,
    position: u32,
    visited: BTreeSet<u32>,
    steps: u32,
}

impl OfficeWalk {
    pub fn new(graph: OfficeGraph, start: u32) -> Self {
        let mut visited = BTreeSet::new();
        visited.insert(start);
        Self {
            graph,
            position: start,
            visited,
            steps: 0,
        }
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.graph.room(self.position)
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn has_visited(&self, room: u32) -> bool {
        self.visited.contains(&room)
    }

    /// Move through one door.
    pub fn step_to(&mut self, room: u32) -> Result<(), MoveError> {
        if self.graph.room(room).is_none() {
            return Err(MoveError::UnknownRoom(room));
        }
        if !self.graph.is_adjacent(self.position, room) {
            return Err(MoveError::NotAdjacent {
                from: self.position,
                to: room,
            });
        }
        self.position = room;
        self.visited.insert(room);
        self.steps += 1;
        Ok(())
    }

    /// Walk the shortest route to `room`, visiting every room on the way.
    /// Returns the number of doors passed.
    pub fn route_to(&mut self, room: u32) -> Result<usize, MoveError> {
        if self.graph.room(room).is_none() {
            return Err(MoveError::UnknownRoom(room));
        }
        let route = self
            .graph
            .find_route(self.position, room)
            .ok_or(MoveError::Unreachable {
                from: self.position,
                to: room,
            })?;
        for wp in &route {
            self.position = wp.room_id;
            self.visited.insert(wp.room_id);
            self.steps += 1;
        }
        Ok(route.len())
    }

    /// Tracks unlocked by the rooms visited so far, each once, in
    /// [`Track`] order.
    pub fn unlocked_tracks(&self) -> Vec<Track> {
        let tracks: BTreeSet<Track> = self
            .visited
            .iter()
            .filter_map(|id| self.graph.room(*id).and_then(|r| r.track))
            .collect();
        tracks.into_iter().collect()
    }
}

pub mod rooms {
    pub const LOBBY: u32 = 1;
    pub const HALLWAY: u32 = 2;
    pub const MARKETING_SUITE: u32 = 3;
    pub const FINANCE_OFFICE: u32 = 4;
    pub const GOVERNMENT_AFFAIRS: u32 = 5;
    pub const MATERIALS_LAB: u32 = 6;
    pub const BREAK_ROOM: u32 = 7;
}

/// The default office floor.
///
/// ```text
///            Marketing(3)   Finance(4)
///                 |             |
/// Lobby(1) ── Hallway(2) ───────┤
///                 |             |
///          Government(5)    Lab(6) ── Break(7)
/// ```
pub fn standard_office() -> OfficeGraph {
    use rooms::*;
    let room = |id, name: &str, track| Room {
        id,
        name: name.to_string(),
        track,
    };
    let rooms = vec![
        room(LOBBY, "Lobby", None),
        room(HALLWAY, "Hallway", None),
        room(MARKETING_SUITE, "Marketing Suite", Some(Track::Marketing)),
        room(FINANCE_OFFICE, "Finance Office", Some(Track::Finance)),
        room(GOVERNMENT_AFFAIRS, "Government Affairs", Some(Track::Government)),
        room(MATERIALS_LAB, "Materials Lab", Some(Track::MaterialsScience)),
        room(BREAK_ROOM, "Break Room", None),
    ];
    let door = |a, b, x, y| Door {
        room_a: a,
        room_b: b,
        x,
        y,
    };
    let doors = vec![
        door(LOBBY, HALLWAY, 4.0, 6.0),
        door(HALLWAY, MARKETING_SUITE, 8.0, 2.0),
        door(HALLWAY, FINANCE_OFFICE, 14.0, 2.0),
        door(HALLWAY, GOVERNMENT_AFFAIRS, 8.0, 10.0),
        door(HALLWAY, MATERIALS_LAB, 14.0, 10.0),
        door(MATERIALS_LAB, BREAK_ROOM, 18.0, 12.0),
    ];
    OfficeGraph::new(rooms, &doors)
}

#[cfg(test)]
mod tests {
    use super::rooms::*;
    use super::*;

    fn door(room_a: u32, room_b: u32) -> Door {
        Door {
            room_a,
            room_b,
            x: 0.0,
            y: 0.0,
        }
    }

    fn room(id: u32, name: &str, track: Option<Track>) -> Room {
        Room {
            id,
            name: name.to_string(),
            track,
        }
    }

    #[test]
    fn same_room_route_is_empty() {
        let mut g = standard_office();
        assert_eq!(g.find_route(LOBBY, LOBBY), Some(vec![]));
    }

    #[test]
    fn multi_hop_route() {
        let mut g = standard_office();
        let route = g.find_route(LOBBY, BREAK_ROOM).unwrap();
        let ids: Vec<u32> = route.iter().map(|w| w.room_id).collect();
        assert_eq!(ids, vec![HALLWAY, MATERIALS_LAB, BREAK_ROOM]);
    }

    #[test]
    fn route_cache() {
        let mut g = standard_office();
        let a = g.find_route(LOBBY, FINANCE_OFFICE).unwrap();
        assert_eq!(g.cache_size(), 1);
        let b = g.find_route(LOBBY, FINANCE_OFFICE).unwrap();
        assert_eq!(a, b);
        assert_eq!(g.cache_size(), 1);
    }

    #[test]
    fn cache_is_bounded() {
        let rooms = standard_office().rooms().to_vec();
        let doors = vec![
            door(LOBBY, HALLWAY),
            door(HALLWAY, MARKETING_SUITE),
            door(HALLWAY, FINANCE_OFFICE),
        ];
        let mut g = OfficeGraph::with_cache(rooms, &doors, 2);
        g.find_route(LOBBY, HALLWAY);
        g.find_route(LOBBY, MARKETING_SUITE);
        g.find_route(LOBBY, FINANCE_OFFICE);
        assert_eq!(g.cache_size(), 2);
        // the oldest route was evicted, so asking again re-caches it
        g.find_route(LOBBY, HALLWAY);
        assert_eq!(g.cache_size(), 2);
    }

    #[test]
    fn uncached_graph_still_routes() {
        let rooms = standard_office().rooms().to_vec();
        let mut g = OfficeGraph::with_cache(rooms, &[door(LOBBY, HALLWAY)], 0);
        assert_eq!(g.find_route(LOBBY, HALLWAY).map(|r| r.len()), Some(1));
        assert_eq!(g.cache_size(), 0);
    }

    #[test]
    fn unreachable_room() {
        let rooms = standard_office().rooms().to_vec();
        let doors = vec![door(LOBBY, HALLWAY)];
        let mut g = OfficeGraph::new(rooms, &doors);
        assert_eq!(g.find_route(LOBBY, BREAK_ROOM), None);
    }

    #[test]
    fn step_requires_adjacency() {
        let mut walk = OfficeWalk::new(standard_office(), LOBBY);
        assert_eq!(
            walk.step_to(MATERIALS_LAB),
            Err(MoveError::NotAdjacent {
                from: LOBBY,
                to: MATERIALS_LAB
            })
        );
        assert_eq!(walk.step_to(99), Err(MoveError::UnknownRoom(99)));
        walk.step_to(HALLWAY).unwrap();
        walk.step_to(MATERIALS_LAB).unwrap();
        assert_eq!(walk.position(), MATERIALS_LAB);
        assert_eq!(walk.steps(), 2);
    }

    #[test]
    fn route_visits_intermediate_rooms() {
        let mut walk = OfficeWalk::new(standard_office(), LOBBY);
        assert_eq!(walk.route_to(BREAK_ROOM), Ok(3));
        assert!(walk.has_visited(MATERIALS_LAB));
        assert_eq!(walk.unlocked_tracks(), vec![Track::MaterialsScience]);
        assert_eq!(walk.current_room().unwrap().name, "Break Room");
    }

    #[test]
    fn unlocks_accumulate() {
        let mut walk = OfficeWalk::new(standard_office(), LOBBY);
        walk.route_to(MARKETING_SUITE).unwrap();
        walk.route_to(GOVERNMENT_AFFAIRS).unwrap();
        assert_eq!(
            walk.unlocked_tracks(),
            vec![Track::Marketing, Track::Government]
        );
    }

    #[test]
    fn shared_track_unlocked_once() {
        let rooms = vec![
            room(1, "North Finance", Some(Track::Finance)),
            room(2, "Studio", Some(Track::Marketing)),
            room(3, "South Finance", Some(Track::Finance)),
        ];
        let g = OfficeGraph::new(rooms, &[door(1, 2), door(2, 3)]);
        let mut walk = OfficeWalk::new(g, 1);
        assert_eq!(walk.route_to(3), Ok(2));
        assert_eq!(
            walk.unlocked_tracks(),
            vec![Track::Marketing, Track::Finance]
        );
    }

    #[test]
    fn lookup_by_name() {
        let g = standard_office();
        assert_eq!(g.room_by_name("finance office").unwrap().id, FINANCE_OFFICE);
    }
}
