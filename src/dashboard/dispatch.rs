/// Fire-and-forget request dispatch.
///
/// [`Dispatcher::submit`] returns immediately. The blocking backend call runs
/// on a short-lived worker thread and its [`Reply`] is posted to a channel
/// that the page loop drains, so replies are always applied on the loop's
/// thread. In-flight calls are never cancelled; once the dispatcher is
/// dropped their replies simply have nowhere to go.
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::api::{Backend, Reply, Request};

/// How submitted requests are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// One worker thread per request.
    Threaded,
    /// Run on the calling thread; the reply is still only delivered when
    /// drained. Used by one-shot commands and tests.
    Inline,
}

pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    mode: DispatchMode,
    tx: Sender<Reply>,
    rx: Receiver<Reply>,
    in_flight: usize,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>, mode: DispatchMode) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            mode,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn threaded(backend: Arc<dyn Backend>) -> Self {
        Self::new(backend, DispatchMode::Threaded)
    }

    pub fn inline(backend: Arc<dyn Backend>) -> Self {
        Self::new(backend, DispatchMode::Inline)
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Requests submitted whose replies have not been drained yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn submit(&mut self, request: Request) {
        self.in_flight += 1;
        match self.mode {
            DispatchMode::Inline => {
                let reply = request.execute(self.backend.as_ref());
                let _ = self.tx.send(reply);
            }
            DispatchMode::Threaded => {
                let backend = Arc::clone(&self.backend);
                let tx = self.tx.clone();
                let name = request.name();
                let fallback = request.clone();
                let spawned = thread::Builder::new()
                    .name(format!("safevision-{name}"))
                    .spawn(move || {
                        let reply = request.execute(backend.as_ref());
                        let _ = tx.send(reply);
                    });
                if let Err(err) = spawned {
                    let error = anyhow::Error::new(err).context("failed to spawn request worker");
                    let _ = self.tx.send(fallback.into_failure(error));
                }
            }
        }
    }

    /// Next ready reply without waiting.
    pub fn try_next(&mut self) -> Option<Reply> {
        let reply = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(reply)
    }

    /// Next reply, waiting up to `timeout`.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<Reply> {
        match self.rx.recv_timeout(timeout) {
            Ok(reply) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(reply)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}
