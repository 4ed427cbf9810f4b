//! Runs the search on a background thread, delivering the result over a channel.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use async_channel::Sender;
use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::position::{Move, Position};
use crate::search;

/// Everything the worker needs. The position is a snapshot, owned by the worker.
#[derive(Clone, Debug)]
pub struct SearchJob {
    pub generation: u64,
    pub position: Position,
    pub depth: u16,
    /// Seed for shuffling the root moves. `None` searches them in generation order.
    pub seed: Option<u64>,
}

/// Sent by the worker when a search completes without being aborted
#[derive(Clone, Debug)]
pub struct SearchReply {
    pub generation: u64,
    pub best_move: Option<Move>,
}

/// The owner's handle to a search in flight
#[derive(Debug)]
pub struct SearchHandle {
    generation: u64,
    abort: Arc<AtomicBool>,
}

impl SearchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Asks the worker to stop. It will not send a reply if it notices in time.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }
}

/// Spawns a search thread, which sends exactly one `SearchReply` on `sender` unless aborted
pub fn spawn_search(job: SearchJob, sender: Sender<SearchReply>) -> io::Result<SearchHandle> {
    let abort = Arc::new(AtomicBool::new(false));
    let handle = SearchHandle {
        generation: job.generation,
        abort: abort.clone(),
    };

    thread::Builder::new()
        .name(format!("search-{}", job.generation))
        .spawn(move || {
            let result = match job.seed {
                Some(seed) => {
                    let mut rng = SmallRng::seed_from_u64(seed);
                    search::search(&job.position, job.depth, Some(&mut rng), Some(&abort))
                }
                None => search::search::<SmallRng>(&job.position, job.depth, None, Some(&abort)),
            };
            if abort.load(Ordering::Relaxed) {
                debug!("Search {} aborted", job.generation);
                return;
            }
            let reply = SearchReply {
                generation: job.generation,
                best_move: result.map(|result| result.best_move),
            };
            if sender.send_blocking(reply).is_err() {
                debug!("Search {} finished after its match was dropped", job.generation);
            }
        })?;

    Ok(handle)
}
