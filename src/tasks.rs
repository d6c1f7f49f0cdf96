use std::io;
use std::thread;

use crate::error::Error;

/// Runs every job on its own thread and waits for all of them. Results come
/// back in job order.
pub(crate) fn run_group<J, F>(jobs: &[J], work: F) -> Vec<Result<(), Error>>
where
    J: Sync,
    F: Fn(&J) -> Result<(), Error> + Sync,
{
    let work = &work;
    thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .iter()
            .map(|job| scope.spawn(move || work(job)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::Io(io::Error::other("worker thread panicked"))))
            })
            .collect()
    })
}

/// The error to surface for a finished group: cancellation if any job was
/// cancelled, otherwise the first failure in job order.
pub(crate) fn first_failure(results: Vec<Result<(), Error>>) -> Result<(), Error> {
    let mut first = None;
    for result in results {
        match result {
            Ok(()) => {}
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => {
                first.get_or_insert(err);
            }
        }
    }
    first.map_or(Ok(()), Err)
}
