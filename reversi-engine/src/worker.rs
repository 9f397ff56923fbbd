//! Runs a [`Strategy`] off the caller's thread.
//!
//! Each think request moves the strategy into a fresh thread, which hands it
//! back when joined. The answer comes over a single-slot channel. Only one
//! request may be in flight; anything that would invalidate it (a new game,
//! a new strategy) has to wait for it first.

use crate::search::SearchStats;
use crate::strategy::Strategy;
use crossbeam_channel::{Receiver, TryRecvError};
use derive_more::{Display, Error};
use log::{debug, warn};
use reversi_board::{Location, Position};
use std::thread::{self, JoinHandle};

/// The outcome of one think request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thought {
    /// `None` when the side to move had to pass.
    pub mv: Option<Location>,
    pub stats: SearchStats,
    /// Hash of the position the move was chosen for.
    pub position_hash: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
pub enum ThinkerError {
    #[display(fmt = "already thinking about another position")]
    Busy,
    #[display(fmt = "the thinking thread panicked; the strategy is lost")]
    Crashed,
}

struct InFlight {
    handle: JoinHandle<Strategy>,
    rx: Receiver<Thought>,
}

pub struct Thinker {
    strategy: Option<Strategy>,
    in_flight: Option<InFlight>,
}

impl Thinker {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy: Some(strategy),
            in_flight: None,
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The idle strategy, or `None` while it is busy on another thread.
    pub fn strategy(&self) -> Option<&Strategy> {
        self.strategy.as_ref()
    }

    /// Start choosing a move for `position` in the background.
    pub fn think(&mut self, position: Position) -> Result<(), ThinkerError> {
        if self.in_flight.is_some() {
            return Err(ThinkerError::Busy);
        }
        let mut strategy = self.strategy.take().ok_or(ThinkerError::Crashed)?;

        let (tx, rx) = crossbeam_channel::bounded(1);
        let handle = thread::spawn(move || {
            let mv = strategy.choose_move(&position);
            let thought = Thought {
                mv,
                stats: strategy.stats(),
                position_hash: position.hash,
            };
            if tx.send(thought).is_err() {
                debug!("thought for {:016x} discarded", position.hash);
            }
            strategy
        });

        self.in_flight = Some(InFlight { handle, rx });
        Ok(())
    }

    /// Collect the answer if it is ready, without blocking.
    pub fn poll(&mut self) -> Result<Option<Thought>, ThinkerError> {
        let thought = match &self.in_flight {
            None => return Ok(None),
            Some(in_flight) => match in_flight.rx.try_recv() {
                Ok(thought) => Some(thought),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => None,
            },
        };
        self.join(thought)
    }

    /// Block until the in-flight request, if any, has finished.
    pub fn wait(&mut self) -> Result<Option<Thought>, ThinkerError> {
        let thought = match &self.in_flight {
            None => return Ok(None),
            Some(in_flight) => in_flight.rx.recv().ok(),
        };
        self.join(thought)
    }

    /// Swap in a new strategy once any in-flight request is done.
    /// Returns that request's answer, which is usually stale by now.
    pub fn reconfigure(&mut self, strategy: Strategy) -> Result<Option<Thought>, ThinkerError> {
        let pending = self.wait();
        self.strategy = Some(strategy);
        pending
    }

    fn join(&mut self, thought: Option<Thought>) -> Result<Option<Thought>, ThinkerError> {
        let Some(in_flight) = self.in_flight.take() else {
            return Ok(thought);
        };

        match in_flight.handle.join() {
            Ok(strategy) => {
                self.strategy = Some(strategy);
                Ok(thought)
            }
            Err(_) => {
                warn!("thinking thread panicked");
                Err(ThinkerError::Crashed)
            }
        }
    }
}

impl Drop for Thinker {
    fn drop(&mut self) {
        if self.wait().is_err() {
            warn!("dropped a thinker whose thread had panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::strategy::Difficulty;
    use std::time::Duration;

    fn thinker(difficulty: Difficulty) -> Thinker {
        Thinker::new(Strategy::new(&EngineConfig {
            difficulty,
            seed: Some(3),
            ..EngineConfig::default()
        }))
    }

    #[test]
    fn idle_thinker_has_nothing() {
        let mut thinker = thinker(Difficulty::Easy);
        assert!(!thinker.is_thinking());
        assert_eq!(thinker.poll(), Ok(None));
        assert_eq!(thinker.wait(), Ok(None));
    }

    #[test]
    fn think_then_wait() {
        let mut thinker = thinker(Difficulty::Normal);
        let position = Position::new();
        thinker.think(position).unwrap();
        assert!(thinker.is_thinking());
        assert!(thinker.strategy().is_none());

        let thought = thinker.wait().unwrap().unwrap();
        assert_eq!(thought.position_hash, position.hash);
        assert!(position.board.is_legal(thought.mv.unwrap()));
        assert!(!thinker.is_thinking());
        assert!(thinker.strategy().is_some());
    }

    #[test]
    fn one_request_at_a_time() {
        let mut thinker = thinker(Difficulty::Hard);
        thinker.think(Position::new()).unwrap();
        assert_eq!(thinker.think(Position::new()), Err(ThinkerError::Busy));
        assert!(thinker.wait().unwrap().is_some());
        assert!(thinker.think(Position::new()).is_ok());
    }

    #[test]
    fn poll_until_ready() {
        let mut thinker = thinker(Difficulty::Easy);
        thinker.think(Position::new()).unwrap();

        let thought = loop {
            if let Some(thought) = thinker.poll().unwrap() {
                break thought;
            }
            thread::sleep(Duration::from_millis(1));
        };
        assert!(thought.mv.is_some());
        assert!(!thinker.is_thinking());
    }

    #[test]
    fn reconfigure_waits_for_the_current_request() {
        let mut thinker = thinker(Difficulty::Normal);
        thinker.think(Position::new()).unwrap();

        let pending = thinker
            .reconfigure(Strategy::new(&EngineConfig {
                difficulty: Difficulty::Easy,
                ..EngineConfig::default()
            }))
            .unwrap();
        assert!(pending.is_some());
        assert!(!thinker.is_thinking());
        assert_eq!(thinker.strategy().unwrap().difficulty(), Difficulty::Easy);
    }
}
