use crate::mdps::solvers::mc_methods::{ImportanceSampling, McControlEs, SparseMc};
use crate::Continous;
use rand::Rng;
use std::collections::HashMap;

/// The player's view of a blackjack hand: the current sum (12-21 once a
/// decision matters), the dealer's showing card (1-10) and whether an ace
/// is counted as 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandState {
    pub sum: i32,
    pub dealer: i32,
    pub usable_ace: bool,
}

impl HandState {
    pub fn new(sum: i32, dealer: i32, usable_ace: bool) -> Self {
        Self {
            sum,
            dealer,
            usable_ace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    Hit,
    Stick,
}

/// Aces count 11 first and are demoted one at a time while the hand busts;
/// returns the sum and whether an ace is still counted as 11.
fn sum_hand(hand: &[i32]) -> (i32, bool) {
    let n_aces = hand.iter().filter(|&&c| c == 1).count();
    let low: i32 = hand.iter().map(|&c| c.min(10)).sum();
    if n_aces > 0 && low + 10 <= 21 {
        (low + 10, true)
    } else {
        (low, false)
    }
}

/// One game of blackjack against the fixed dealer. Cards are drawn with
/// replacement from an infinite deck.
#[derive(Debug, Default)]
pub struct BlackJack {
    dealer_cards: Vec<i32>,
    player_cards: Vec<i32>,
}

impl BlackJack {
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_card<R: Rng + ?Sized>(rng: &mut R) -> i32 {
        rng.gen_range(1..=13)
    }

    pub fn start_game<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.player_cards = vec![Self::draw_card(rng), Self::draw_card(rng)];
        self.dealer_cards = vec![Self::draw_card(rng), Self::draw_card(rng)];
    }

    /// Exploring start: a uniformly random decision state instead of a
    /// dealt one.
    pub fn start_random_state_game<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let sum = rng.gen_range(12..=21);
        let usable_ace = rng.gen::<bool>();
        let dealer = rng.gen_range(1..=10);

        self.player_cards = if usable_ace {
            // an ace plus whatever completes the sum
            vec![1, sum - 11]
        } else {
            match sum {
                20 => vec![10, 10],
                21 => vec![10, 10, 1],
                _ => vec![10, sum - 10],
            }
        };
        self.dealer_cards = vec![dealer, Self::draw_card(rng)];
    }

    /// Fixes the deal for off-policy evaluation of a designated state.
    pub fn force_deal(&mut self, player: Vec<i32>, dealer: Vec<i32>) {
        self.player_cards = player;
        self.dealer_cards = dealer;
    }

    pub fn player_sum(&self) -> i32 {
        sum_hand(&self.player_cards).0
    }

    pub fn dealer_sum(&self) -> i32 {
        sum_hand(&self.dealer_cards).0
    }

    pub fn current_state(&self) -> HandState {
        let (sum, usable_ace) = sum_hand(&self.player_cards);
        HandState::new(sum, self.dealer_cards[0].min(10), usable_ace)
    }

    pub fn player_hit<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.player_cards.push(Self::draw_card(rng));
    }

    /// Hits while the policy says to. Sums of 11 or less hit automatically
    /// since no decision exists there; the returned sequence holds only
    /// decision states. A missing policy entry is a configuration bug.
    pub fn run_player_policy<R: Rng + ?Sized>(
        &mut self,
        policy: &HashMap<HandState, PlayerAction>,
        rng: &mut R,
    ) -> Vec<HandState> {
        let mut sequence = vec![];
        loop {
            let state = self.current_state();
            if state.sum < 12 {
                self.player_hit(rng);
                continue;
            }
            sequence.push(state);
            if state.sum > 21 {
                break;
            }
            match policy
                .get(&state)
                .unwrap_or_else(|| panic!("no policy entry for {state:?}"))
            {
                PlayerAction::Hit => self.player_hit(rng),
                PlayerAction::Stick => break,
            }
        }
        sequence
    }

    /// Plays from an exploring start: `first_action` is forced, play then
    /// continues under `policy`. Returns the state-action sequence.
    pub fn run_player_policy_from<R: Rng + ?Sized>(
        &mut self,
        first_action: PlayerAction,
        policy: &HashMap<HandState, PlayerAction>,
        rng: &mut R,
    ) -> Vec<(HandState, PlayerAction)> {
        let mut sequence = vec![(self.current_state(), first_action)];
        if first_action == PlayerAction::Stick {
            return sequence;
        }
        self.player_hit(rng);

        loop {
            let state = self.current_state();
            if state.sum > 21 {
                break;
            }
            let action = *policy
                .get(&state)
                .unwrap_or_else(|| panic!("no policy entry for {state:?}"));
            sequence.push((state, action));
            match action {
                PlayerAction::Hit => self.player_hit(rng),
                PlayerAction::Stick => break,
            }
        }
        sequence
    }

    /// Plays under the uniform-random behavior policy, recording every
    /// decision (for importance-sampling ratios).
    pub fn run_player_random_policy<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Vec<(HandState, PlayerAction)> {
        let mut sequence = vec![];
        loop {
            let state = self.current_state();
            if state.sum < 12 {
                self.player_hit(rng);
                continue;
            }
            if state.sum > 21 {
                break;
            }
            let action = if rng.gen::<bool>() {
                PlayerAction::Hit
            } else {
                PlayerAction::Stick
            };
            sequence.push((state, action));
            match action {
                PlayerAction::Hit => self.player_hit(rng),
                PlayerAction::Stick => break,
            }
        }
        sequence
    }

    /// Dealer hits below 17.
    pub fn run_dealer_policy<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        while self.dealer_sum() <= 16 {
            self.dealer_cards.push(Self::draw_card(rng));
        }
    }

    /// Terminal reward: +1 win, 0 draw, -1 loss. All intermediate rewards
    /// are zero, so this is also the episode return.
    pub fn reward(&self) -> Continous {
        let player = self.player_sum();
        let dealer = self.dealer_sum();

        if player > 21 {
            -1.
        } else if dealer > 21 || player > dealer {
            1.
        } else if player == dealer {
            0.
        } else {
            -1.
        }
    }
}

/// The fixed evaluation policy of Figure 5.1: stick on 20 or 21, hit
/// otherwise, for every decision sum up to the maximum bust sum.
pub fn stick_on_20_policy() -> HashMap<HandState, PlayerAction> {
    let mut policy = HashMap::new();
    for sum in 12..=30 {
        for dealer in 1..=10 {
            let action = if sum < 20 {
                PlayerAction::Hit
            } else {
                PlayerAction::Stick
            };
            policy.insert(HandState::new(sum, dealer, true), action);
            policy.insert(HandState::new(sum, dealer, false), action);
        }
    }
    policy
}

/// All decision states: sums 12-21, dealer 1-10, ace flag either way.
pub fn decision_states() -> Vec<HandState> {
    let mut states = vec![];
    for sum in 12..=21 {
        for dealer in 1..=10 {
            for usable_ace in [false, true] {
                states.push(HandState::new(sum, dealer, usable_ace));
            }
        }
    }
    states
}

/// First-visit Monte Carlo evaluation of the stick-on-20 policy
/// (Figure 5.1).
pub fn mc_policy_evaluation<R: Rng + ?Sized>(
    n_episodes: usize,
    rng: &mut R,
) -> HashMap<HandState, Continous> {
    let policy = stick_on_20_policy();
    let mut mc = SparseMc::new();

    for _ in 0..n_episodes {
        let mut game = BlackJack::new();
        game.start_game(rng);
        let sequence = game.run_player_policy(&policy, rng);
        game.run_dealer_policy(rng);
        mc.update(&sequence, game.reward());
    }
    mc.into_values()
}

/// Monte Carlo control with exploring starts (Figure 5.2): optimal policy
/// and state values.
pub fn mc_exploring_starts<R: Rng + ?Sized>(
    n_episodes: usize,
    rng: &mut R,
) -> (HashMap<HandState, Continous>, HashMap<HandState, PlayerAction>) {
    let mut es = McControlEs::new(
        decision_states(),
        vec![PlayerAction::Stick, PlayerAction::Hit],
        stick_on_20_policy(),
    );

    for _ in 0..n_episodes {
        let mut game = BlackJack::new();
        game.start_random_state_game(rng);
        let first_action = if rng.gen::<bool>() {
            PlayerAction::Hit
        } else {
            PlayerAction::Stick
        };
        let trace = game.run_player_policy_from(first_action, es.policy(), rng);
        game.run_dealer_policy(rng);
        let g = game.reward();
        es.update(&trace, g);
    }

    (es.state_values(), es.policy().clone())
}

/// Off-policy evaluation of the fixed state (player ace + 2 vs dealer 2)
/// under the stick-on-20 target policy, behavior uniform-random
/// (Figure 5.3). Returns the per-episode ordinary and weighted
/// importance-sampling estimate series.
pub fn off_policy_state_value<R: Rng + ?Sized>(
    n_episodes: usize,
    rng: &mut R,
) -> (Vec<Continous>, Vec<Continous>) {
    let target = stick_on_20_policy();
    let mut is = ImportanceSampling::new();
    let mut ordinary = Vec::with_capacity(n_episodes);
    let mut weighted = Vec::with_capacity(n_episodes);

    for _ in 0..n_episodes {
        let mut game = BlackJack::new();
        game.force_deal(vec![1, 2], vec![2, BlackJack::draw_card(rng)]);
        let sequence = game.run_player_random_policy(rng);
        game.run_dealer_policy(rng);
        let g = game.reward();

        // behavior picks each action with probability 0.5
        let numerator: Continous = sequence
            .iter()
            .map(|(s, a)| if target[s] == *a { 1. } else { 0. })
            .product();
        let rho = numerator / 0.5f64.powi(sequence.len() as i32);

        is.push(rho, g);
        ordinary.push(is.ordinary());
        weighted.push(is.weighted());
    }

    (ordinary, weighted)
}
