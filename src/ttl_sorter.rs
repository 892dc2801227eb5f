use crate::icmp::v4::RawSocketFactory;
use crate::round::{Round, RoundCoordinator};
use crate::SortConfig;
use crate::SortError;
use crate::SortResult;
use crate::Ttl;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortState {
    Running,
    /// The values came back in ascending order.
    Converged,
    /// A value is larger than the hop distance to the destination, so its probe never expires in
    /// transit. A destination further away is needed.
    RangeConflict { hops: Ttl },
    /// All rounds are used up and the values are still not in order.
    IterationsExhausted,
}

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortOutcome {
    pub state: SortState,
    pub values: Vec<Ttl>,
    pub rounds: usize,
    pub hops_to_destination: Option<Ttl>,
}

impl SortOutcome {
    pub fn is_sorted(&self) -> bool {
        self.state == SortState::Converged
    }
}

/// Sorts values by sending them as TTLs towards `config.destination`.
///
/// Needs the privileges to open raw sockets.
pub struct TtlSorter(ConvergenceLoop<RoundCoordinator<RawSocketFactory>>);

impl TtlSorter {
    pub fn new(config: &SortConfig) -> SortResult<Self> {
        config.validate()?;
        let round = RoundCoordinator::new(
            Arc::new(RawSocketFactory),
            config.destination,
            config.read_timeout,
            config.unexpected_message,
        );
        Ok(TtlSorter(ConvergenceLoop::new(round, config.max_rounds, config.round_delay)))
    }

    pub fn sort(&mut self, values: Vec<Ttl>) -> SortResult<SortOutcome> {
        self.0.run(values)
    }

    pub fn get_states(&self) -> Vec<SortState> {
        self.0.get_states()
    }
}

pub(crate) struct ConvergenceLoop<R> {
    states: Vec<SortState>,
    round: R,
    max_rounds: usize,
    round_delay: Duration,
}

impl<R> ConvergenceLoop<R>
where
    R: Round,
{
    pub(crate) fn new(round: R, max_rounds: usize, round_delay: Duration) -> Self {
        ConvergenceLoop { states: vec![SortState::Running], round, max_rounds, round_delay }
    }

    pub(crate) fn get_states(&self) -> Vec<SortState> {
        self.states.clone()
    }

    pub(crate) fn run(&mut self, mut values: Vec<Ttl>) -> SortResult<SortOutcome> {
        if self.states.last() != Some(&SortState::Running) {
            return Err(SortError::new("sorting already finished").into());
        }

        tracing::info!(
            "Will sort {:?} at most {} times and sleep for {:?} between iterations.",
            values,
            self.max_rounds,
            self.round_delay
        );
        let max_value = values.iter().max().copied();
        let mut hops_to_destination = None;

        for round in 1..=self.max_rounds {
            let result = self.round.run(&values)?;
            values = result.values;
            tracing::info!("Current sorted array: {:?}", values);

            if let Some(hops) = result.hops_to_destination {
                hops_to_destination = Some(hops);
                if max_value.is_some_and(|max_value| max_value > hops) {
                    tracing::error!(
                        "We are sorting elements with values higher than distance to target host ({} hops). \
                         Try a target that is more hops away.",
                        hops
                    );
                    return Ok(self.finish(SortState::RangeConflict { hops }, values, round, hops_to_destination));
                }
            }

            if is_sorted(&values) {
                tracing::info!("Et voilà! {:?}", values);
                return Ok(self.finish(SortState::Converged, values, round, hops_to_destination));
            }

            if round < self.max_rounds {
                tracing::info!("Chilling for {:?} (anti-flood detection)", self.round_delay);
                std::thread::sleep(self.round_delay);
            }
        }

        tracing::info!("Final result (try increasing the number of rounds if you're not satisfied): {:?}", values);
        Ok(self.finish(SortState::IterationsExhausted, values, self.max_rounds, hops_to_destination))
    }

    fn finish(
        &mut self,
        state: SortState,
        values: Vec<Ttl>,
        rounds: usize,
        hops_to_destination: Option<Ttl>,
    ) -> SortOutcome {
        self.states.push(state);
        SortOutcome { state, values, rounds, hops_to_destination }
    }
}

fn is_sorted(values: &[Ttl]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}
