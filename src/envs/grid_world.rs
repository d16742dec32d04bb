use crate::mdps::{Mdp, Transition, Transitions};
use crate::{Continous, Discrete};
use serde::Serialize;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    North,
    South,
    East,
    West,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::North, Action::South, Action::East, Action::West];

    pub fn index(self) -> usize {
        match self {
            Action::North => 0,
            Action::South => 1,
            Action::East => 2,
            Action::West => 3,
        }
    }

    pub fn from_index(i: usize) -> Self {
        Self::ALL[i]
    }

    fn offset(self) -> (i32, i32) {
        match self {
            Action::North => (0, 1),
            Action::South => (0, -1),
            Action::East => (1, 0),
            Action::West => (-1, 0),
        }
    }
}

/// What happens to a move that would leave the grid. The two rules come
/// from different problems and are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryRule {
    /// The move is rejected: the agent stays put and collects -1.
    Bounce,
    /// Coordinates are clipped to the grid with no penalty.
    Clamp,
}

#[derive(Debug, Clone, Copy)]
pub struct Teleport {
    pub from: Point,
    pub to: Point,
    pub reward: Continous,
}

/// One parameterized gridworld covering the teleport, terminal, windy and
/// cliff variants. Teleport cells are checked before movement; wind is
/// applied after the clipped move and clipped again; stepping into a cliff
/// cell resets to the start.
#[derive(Debug, Clone)]
pub struct GridWorld {
    n_x: usize,
    n_y: usize,
    boundary: BoundaryRule,
    step_reward: Continous,
    teleports: Vec<Teleport>,
    terminals: Vec<Point>,
    /// Reward on entering a terminal; `None` means the plain step reward.
    terminal_entry_reward: Option<Continous>,
    wind: Vec<i32>,
    cliff: Vec<Point>,
    cliff_penalty: Continous,
    start: Point,
}

impl GridWorld {
    /// The 5x5 world of Figure 3.2: special cells A and B teleport for +10
    /// and +5, off-grid moves bounce for -1, everything else is free.
    /// (0, 0) is the bottom-left corner.
    pub fn teleport_world(n: usize) -> Self {
        let n = n as i32;
        Self {
            n_x: n as usize,
            n_y: n as usize,
            boundary: BoundaryRule::Bounce,
            step_reward: 0.,
            teleports: vec![
                Teleport {
                    from: Point::new(1, n - 1),
                    to: Point::new(1, 0),
                    reward: 10.,
                },
                Teleport {
                    from: Point::new(3, n - 1),
                    to: Point::new(3, n - 3),
                    reward: 5.,
                },
            ],
            terminals: vec![],
            terminal_entry_reward: None,
            wind: vec![],
            cliff: vec![],
            cliff_penalty: 0.,
            start: Point::new(0, 0),
        }
    }

    /// The small n x n world of Figure 4.1: two absorbing corner terminals,
    /// clipped moves, -1 per step.
    pub fn terminal_world(n: usize) -> Self {
        let last = n as i32 - 1;
        Self {
            n_x: n,
            n_y: n,
            boundary: BoundaryRule::Clamp,
            step_reward: -1.,
            teleports: vec![],
            terminals: vec![Point::new(0, 0), Point::new(last, last)],
            terminal_entry_reward: None,
            wind: vec![],
            cliff: vec![],
            cliff_penalty: 0.,
            start: Point::new(0, 0),
        }
    }

    /// The windy gridworld of Example 6.5: per-column upward wind, -1 per
    /// step, 0 on reaching the goal.
    pub fn windy(n_x: usize, n_y: usize, wind: Vec<i32>, goal: Point) -> Self {
        assert_eq!(wind.len(), n_x, "One wind strength per column.");
        Self {
            n_x,
            n_y,
            boundary: BoundaryRule::Clamp,
            step_reward: -1.,
            teleports: vec![],
            terminals: vec![goal],
            terminal_entry_reward: Some(0.),
            wind,
            cliff: vec![],
            cliff_penalty: 0.,
            start: Point::new(0, 0),
        }
    }

    /// The cliff-walking world of Example 6.6: the bottom row between start
    /// (0, 0) and goal (n_x-1, 0) is a cliff that costs -100 and resets to
    /// the start; every other transition costs -1.
    pub fn cliff(n_x: usize, n_y: usize) -> Self {
        let goal = Point::new(n_x as i32 - 1, 0);
        let cliff = (1..n_x as i32 - 1).map(|x| Point::new(x, 0)).collect();
        Self {
            n_x,
            n_y,
            boundary: BoundaryRule::Clamp,
            step_reward: -1.,
            teleports: vec![],
            terminals: vec![goal],
            terminal_entry_reward: None,
            wind: vec![],
            cliff,
            cliff_penalty: -100.,
            start: Point::new(0, 0),
        }
    }

    pub fn n_x(&self) -> usize {
        self.n_x
    }

    pub fn n_y(&self) -> usize {
        self.n_y
    }

    pub fn n_states(&self) -> usize {
        self.n_x * self.n_y
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn is_terminal(&self, p: Point) -> bool {
        self.terminals.contains(&p)
    }

    pub fn int_to_grid(&self, i: usize) -> Point {
        assert!(i < self.n_states(), "Index must map to a valid grid state.");
        Point::new((i % self.n_x) as i32, (i / self.n_x) as i32)
    }

    pub fn grid_to_int(&self, p: Point) -> usize {
        self.n_x * p.y as usize + p.x as usize
    }

    fn clip(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(0, self.n_x as i32 - 1),
            p.y.clamp(0, self.n_y as i32 - 1),
        )
    }

    fn on_grid(&self, p: Point) -> bool {
        (0..self.n_x as i32).contains(&p.x) && (0..self.n_y as i32).contains(&p.y)
    }

    /// Subsequent state and reward of taking `action` in `p`.
    pub fn step(&self, p: Point, action: Action) -> (Point, Continous) {
        if self.is_terminal(p) {
            return (p, 0.);
        }
        if let Some(t) = self.teleports.iter().find(|t| t.from == p) {
            return (t.to, t.reward);
        }

        let (dx, dy) = action.offset();
        let raw = Point::new(p.x + dx, p.y + dy);
        let mut next = match self.boundary {
            BoundaryRule::Bounce => {
                if !self.on_grid(raw) {
                    return (p, -1.);
                }
                raw
            }
            BoundaryRule::Clamp => self.clip(raw),
        };

        if !self.wind.is_empty() {
            next = self.clip(Point::new(next.x, next.y + self.wind[p.x as usize]));
        }

        if self.cliff.contains(&next) {
            return (self.start, self.cliff_penalty);
        }

        let reward = match self.terminal_entry_reward {
            Some(r) if self.is_terminal(next) => r,
            _ => self.step_reward,
        };
        (next, reward)
    }
}

/// A gridworld enumerated into a tabular MDP so the dynamic-programming
/// solvers can consume it.
pub struct GridMdp {
    world: GridWorld,
    gamma: Continous,
    transitions: Rc<Transitions>,
}

impl GridMdp {
    pub fn new(world: GridWorld, gamma: Continous) -> Self {
        let mut transitions = Transitions::new();
        for i in 0..world.n_states() {
            let p = world.int_to_grid(i);
            if world.is_terminal(p) {
                continue;
            }
            for action in Action::ALL {
                let (next, reward) = world.step(p, action);
                transitions.insert(
                    (i as Discrete, action.index() as Discrete),
                    vec![Transition {
                        next_state: world.grid_to_int(next) as Discrete,
                        probability: 1.,
                        reward,
                        done: world.is_terminal(next),
                    }],
                );
            }
        }

        Self {
            world,
            gamma,
            transitions: Rc::new(transitions),
        }
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }
}

impl Mdp for GridMdp {
    fn n_s(&self) -> usize {
        self.world.n_states()
    }

    fn n_a(&self) -> usize {
        Action::ALL.len()
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }

    fn gamma(&self) -> Continous {
        self.gamma
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use rstest::rstest;

    #[rstest]
    #[case(GridWorld::teleport_world(5))]
    #[case(GridWorld::terminal_world(4))]
    #[case(GridWorld::windy(10, 7, vec![0, 0, 0, 1, 1, 1, 2, 2, 1, 0], Point::new(7, 3)))]
    #[case(GridWorld::cliff(12, 4))]
    fn grid_index_round_trip(#[case] world: GridWorld) {
        for i in 0..world.n_states() {
            assert_eq!(world.grid_to_int(world.int_to_grid(i)), i);
        }
    }

    #[test]
    #[should_panic(expected = "valid grid state")]
    fn out_of_range_index_panics() {
        GridWorld::teleport_world(5).int_to_grid(25);
    }

    #[test]
    fn bounce_boundary_penalizes_and_stays() {
        let w = GridWorld::teleport_world(5);
        let (next, r) = w.step(Point::new(0, 0), Action::South);
        assert_eq!(next, Point::new(0, 0));
        assert_float_eq!(r, -1., abs <= 0.0);

        let (next, r) = w.step(Point::new(0, 0), Action::North);
        assert_eq!(next, Point::new(0, 1));
        assert_float_eq!(r, 0., abs <= 0.0);
    }

    #[test]
    fn teleport_cells_take_precedence_over_movement() {
        let w = GridWorld::teleport_world(5);
        for action in Action::ALL {
            assert_eq!(w.step(Point::new(1, 4), action), (Point::new(1, 0), 10.));
            assert_eq!(w.step(Point::new(3, 4), action), (Point::new(3, 2), 5.));
        }
    }

    #[test]
    fn clamp_boundary_clips_without_penalty_charge() {
        let w = GridWorld::terminal_world(4);
        // off-grid move clips to the same cell but still costs the step
        let (next, r) = w.step(Point::new(0, 1), Action::West);
        assert_eq!(next, Point::new(0, 1));
        assert_float_eq!(r, -1., abs <= 0.0);
    }

    #[test]
    fn terminal_cells_absorb() {
        let w = GridWorld::terminal_world(4);
        for action in Action::ALL {
            assert_eq!(w.step(Point::new(0, 0), action), (Point::new(0, 0), 0.));
            assert_eq!(w.step(Point::new(3, 3), action), (Point::new(3, 3), 0.));
        }
    }

    #[test]
    fn wind_pushes_after_the_move() {
        let wind = vec![0, 0, 0, 1, 1, 1, 2, 2, 1, 0];
        let w = GridWorld::windy(10, 7, wind, Point::new(7, 3));

        // moving east from (3, 0): wind of the source column pushes up by 1
        let (next, r) = w.step(Point::new(3, 0), Action::East);
        assert_eq!(next, Point::new(4, 1));
        assert_float_eq!(r, -1., abs <= 0.0);

        // west from (8, 2) lands on (7, 2), wind 1 lifts it onto the goal
        let (next, r) = w.step(Point::new(8, 2), Action::West);
        assert_eq!(next, Point::new(7, 3));
        assert_float_eq!(r, 0., abs <= 0.0);
    }

    #[test]
    fn cliff_resets_to_start_with_penalty() {
        let w = GridWorld::cliff(12, 4);
        let (next, r) = w.step(Point::new(1, 1), Action::South);
        assert_eq!(next, Point::new(0, 0));
        assert_float_eq!(r, -100., abs <= 0.0);

        // the start cell itself is safe
        let (next, r) = w.step(Point::new(0, 0), Action::North);
        assert_eq!(next, Point::new(0, 1));
        assert_float_eq!(r, -1., abs <= 0.0);
    }
}
