use crate::api::DiskManager;
use crate::errors::DiskResult;
use page::page_id::PageId;
use page::PageBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A single page I/O request.
///
/// The request owns its page buffer. For writes the buffer carries the bytes
/// to persist; for reads the worker fills it from disk. Either way the
/// buffer travels back to the submitter through the completion channel once
/// the disk manager call has returned.
#[derive(Debug)]
pub struct DiskRequest {
    /// `true` for a write, `false` for a read.
    pub is_write: bool,

    /// The page being read from or written to disk.
    pub page_id: PageId,

    /// The page buffer moved into the request.
    pub data: Box<PageBuf>,

    /// One-shot completion signal consumed by the submitter.
    pub completion: Sender<DiskResult<Box<PageBuf>>>,
}

/// Serializes page I/O onto a background worker thread.
///
/// Requests are executed strictly in enqueue order, so two requests for the
/// same page are never reordered. The scheduler does not merge requests.
#[derive(Debug)]
pub struct DiskScheduler {
    queue: Option<Sender<DiskRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    /// Spawns the worker thread draining the request queue against
    /// `disk_manager`.
    pub fn new<D>(disk_manager: Arc<D>) -> Self
    where
        D: DiskManager + 'static,
    {
        let (queue, requests) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("disk-scheduler".to_string())
            .spawn(move || Self::run_worker(disk_manager, requests))
            .expect("failed to spawn the disk scheduler worker");

        Self {
            queue: Some(queue),
            worker: Some(worker),
        }
    }

    /// Enqueues `request` and returns immediately.
    pub fn schedule(&self, request: DiskRequest) {
        self.queue
            .as_ref()
            .expect("disk scheduler already shut down")
            .send(request)
            .expect("disk scheduler worker exited");
    }

    /// Creates the one-shot channel pair used as a request's completion
    /// signal.
    pub fn create_completion() -> (
        Sender<DiskResult<Box<PageBuf>>>,
        Receiver<DiskResult<Box<PageBuf>>>,
    ) {
        mpsc::channel()
    }

    fn run_worker<D: DiskManager>(disk_manager: Arc<D>, requests: Receiver<DiskRequest>) {
        // The closed queue is the stop signal.
        while let Ok(request) = requests.recv() {
            let DiskRequest {
                is_write,
                page_id,
                mut data,
                completion,
            } = request;

            let outcome = if is_write {
                disk_manager.write_page(page_id, &data[..])
            } else {
                disk_manager.read_page(page_id, &mut data[..])
            };

            // The submitter may have given up on the request; nothing to do
            // then besides dropping the buffer.
            let _ = completion.send(outcome.map(|()| data));
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        drop(self.queue.take());
        if let Some(worker) = self.worker.take() {
            worker.join().expect("disk scheduler worker panicked");
        }
    }
}
