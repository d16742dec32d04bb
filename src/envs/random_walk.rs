use crate::mdps::EpisodeEvent;
use crate::Continous;
use rand::Rng;

/// The 5-state random walk of Example 6.2: states A..E, start in the
/// middle, +1 only on stepping off the right edge.
pub const N_STATES: usize = 5;
pub const START: usize = 2;

/// Closed-form state values under the uniform-random policy.
pub fn true_values() -> [Continous; N_STATES] {
    [1. / 6., 2. / 6., 3. / 6., 4. / 6., 5. / 6.]
}

/// One step of an episode: the state occupied and the reward collected on
/// leaving it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateReward {
    pub s: usize,
    pub r: Continous,
}

/// Walks from the centre until either edge is crossed.
pub fn generate_episode<R: Rng + ?Sized>(rng: &mut R) -> Vec<StateReward> {
    let mut seq = vec![];
    let mut s = START as i32;
    while (0..N_STATES as i32).contains(&s) {
        let next = if rng.gen::<bool>() { s + 1 } else { s - 1 };
        let reward = if next == N_STATES as i32 { 1. } else { 0. };
        seq.push(StateReward {
            s: s as usize,
            r: reward,
        });
        s = next;
    }
    seq
}

/// The same walk as an entered-state/reward trace for the Monte Carlo
/// prediction functions. The terminal entry carries the exit reward.
pub fn generate_trace<R: Rng + ?Sized>(rng: &mut R) -> Vec<EpisodeEvent> {
    let seq = generate_episode(rng);
    let mut trace = vec![EpisodeEvent {
        s: seq[0].s as i32,
        r: 0.,
    }];
    for w in seq.windows(2) {
        trace.push(EpisodeEvent {
            s: w[1].s as i32,
            r: w[0].r,
        });
    }
    let last = seq.last().unwrap();
    // terminal sentinel; Monte Carlo never indexes a trace's final state
    trace.push(EpisodeEvent {
        s: N_STATES as i32,
        r: last.r,
    });
    trace
}
