//! A handle the tiled draw path runs jobs through, so this crate never
//! spawns threads on its own; callers choose sequential execution,
//! `std::thread::scope`, or anything else.

/// Runs `job(i)` for every `i in 0..n`, blocking until all have completed.
/// Implementations may run jobs sequentially or fan them out across
/// threads; the rasterizer itself never spawns anything on its own.
pub trait Scheduler: Sync {
	fn run(&self, n: usize, job: &(dyn Fn(usize) + Sync));
}

/// Runs every job on the calling thread, in order.
pub struct SequentialScheduler;

impl Scheduler for SequentialScheduler {
	fn run(&self, n: usize, job: &(dyn Fn(usize) + Sync)) {
		for i in 0..n {
			job(i);
		}
	}
}

/// Spawns one scoped thread per job and joins them all.
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
	fn run(&self, n: usize, job: &(dyn Fn(usize) + Sync)) {
		std::thread::scope(|scope| {
			for i in 0..n {
				scope.spawn(move || job(i));
			}
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[test]
	fn sequential_scheduler_runs_every_job_in_order() {
		let seen = std::sync::Mutex::new(Vec::new());
		SequentialScheduler.run(4, &|i| seen.lock().unwrap().push(i));
		assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
	}

	#[test]
	fn thread_scheduler_runs_every_job() {
		let counter = AtomicUsize::new(0);
		ThreadScheduler.run(8, &|_| {
			counter.fetch_add(1, Ordering::SeqCst);
		});
		assert_eq!(counter.load(Ordering::SeqCst), 8);
	}
}
