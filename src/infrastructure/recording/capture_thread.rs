//! Capture thread with a signalled exit and a bounded join

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::error::PipelineError;
use crate::domain::lifecycle::{RecorderLifecycle, RecorderState};

#[derive(Debug, Default)]
struct Flags {
    stop_requested: bool,
    exited: bool,
}

/// Stop request and exit notification shared with the capture thread
#[derive(Debug, Default)]
pub struct CaptureControl {
    flags: Mutex<Flags>,
    changed: Condvar,
}

impl CaptureControl {
    fn lock(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the capture thread to wind down
    pub fn request_stop(&self) {
        self.lock().stop_requested = true;
        self.changed.notify_all();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.lock().stop_requested
    }

    /// Block until a stop is requested
    pub fn wait_for_stop(&self) {
        let mut flags = self.lock();
        while !flags.stop_requested {
            flags = self
                .changed
                .wait(flags)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Sleep for up to `timeout`, waking early on a stop request.
    ///
    /// Returns true if a stop was requested.
    pub fn wait_for_stop_timeout(&self, timeout: Duration) -> bool {
        let flags = self.lock();
        let (flags, _) = self
            .changed
            .wait_timeout_while(flags, timeout, |f| !f.stop_requested)
            .unwrap_or_else(PoisonError::into_inner);
        flags.stop_requested
    }

    fn mark_exited(&self) {
        self.lock().exited = true;
        self.changed.notify_all();
    }

    pub fn has_exited(&self) -> bool {
        self.lock().exited
    }

    /// Wait until the capture thread has exited or `timeout` passes
    fn wait_for_exit(&self, timeout: Duration) -> bool {
        let flags = self.lock();
        let (flags, _) = self
            .changed
            .wait_timeout_while(flags, timeout, |f| !f.exited)
            .unwrap_or_else(PoisonError::into_inner);
        flags.exited
    }
}

/// Marks the thread as exited however its body returns
struct ExitGuard(Arc<CaptureControl>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.mark_exited();
    }
}

/// A spawned capture thread.
///
/// The body receives the shared control and must return soon after a stop
/// is requested. The body may also request a stop itself to halt delivery.
pub struct CaptureThread {
    control: Arc<CaptureControl>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureThread {
    pub fn spawn<F>(name: &str, body: F) -> Result<Self, PipelineError>
    where
        F: FnOnce(Arc<CaptureControl>) + Send + 'static,
    {
        let control = Arc::new(CaptureControl::default());
        let thread_control = Arc::clone(&control);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let guard = ExitGuard(thread_control);
                body(Arc::clone(&guard.0));
            })
            .map_err(|e| PipelineError::RecordFailure(format!("cannot spawn capture thread: {}", e)))?;

        Ok(Self {
            control,
            handle: Some(handle),
        })
    }

    pub fn control(&self) -> &CaptureControl {
        &self.control
    }

    /// True once the thread stopped delivering frames or exited
    pub fn is_finished(&self) -> bool {
        self.control.is_stop_requested() || self.control.has_exited()
    }

    /// Request a stop and join, waiting at most `timeout`.
    ///
    /// On `Timeout` the thread stays attached so a later `stop` or
    /// `detach` can deal with it.
    pub fn stop(&mut self, timeout: Duration) -> Result<(), PipelineError> {
        self.control.request_stop();

        let started = Instant::now();
        if !self.control.wait_for_exit(timeout) {
            return Err(PipelineError::Timeout(timeout.as_millis() as u64));
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("capture thread panicked");
            }
        }
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "capture thread joined");
        Ok(())
    }

    /// Give up on a thread that did not exit in time
    pub fn detach(mut self) {
        self.control.request_stop();
        if self.handle.take().is_some() && !self.control.has_exited() {
            warn!("detaching capture thread that did not stop");
        }
    }
}

/// Recorder lifecycle paired with the capture thread it governs
pub struct CaptureSlot {
    lifecycle: RecorderLifecycle,
    thread: Option<CaptureThread>,
    stop_timeout: Duration,
}

impl CaptureSlot {
    pub fn new(stop_timeout: Duration) -> Self {
        Self {
            lifecycle: RecorderLifecycle::new(),
            thread: None,
            stop_timeout,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.lifecycle.state()
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    /// CREATED -> READY
    pub fn open(&mut self) -> Result<(), PipelineError> {
        self.lifecycle.open()
    }

    /// Reject a start unless READY, without side effects
    pub fn check_startable(&self) -> Result<(), PipelineError> {
        match self.lifecycle.state() {
            RecorderState::Ready => Ok(()),
            other => Err(PipelineError::NotReady(format!(
                "start recording while {}",
                other
            ))),
        }
    }

    /// READY -> RECORDING with `thread` delivering frames
    pub fn begin(&mut self, thread: CaptureThread) -> Result<(), PipelineError> {
        self.lifecycle.start()?;
        self.thread = Some(thread);
        Ok(())
    }

    /// RECORDING -> STOPPING -> READY, joining the capture thread.
    ///
    /// Stays in STOPPING when the join times out.
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        self.lifecycle.begin_stop()?;
        if let Some(thread) = self.thread.as_mut() {
            thread.stop(self.stop_timeout)?;
        }
        self.thread = None;
        self.lifecycle.finish_stop()
    }

    /// Back to CREATED, stopping first and detaching a thread that would not exit
    pub fn close(&mut self) {
        if self.lifecycle.state() == RecorderState::Recording {
            if let Err(e) = self.stop() {
                warn!(error = %e, "recorder did not stop before close");
            }
        }
        if let Some(thread) = self.thread.take() {
            thread.detach();
        }
        if let Err(e) = self.lifecycle.close() {
            debug!(error = %e, "recorder close rejected");
        }
    }

    pub fn is_capture_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map(CaptureThread::is_finished)
            .unwrap_or(true)
    }
}
