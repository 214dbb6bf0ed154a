//! SamplingLoop: start/stop lifecycle around the tick worker.
//!
//! `start` spawns one worker thread that opens the audio source, reports the
//! outcome back synchronously, then ticks at the configured cadence until
//! stopped. The worker owns the capture handle for its whole life, so
//! providers whose streams cannot cross threads work unchanged.
//!
//! Readings are published on a tokio broadcast channel. Subscribers that fall
//! behind lose the oldest readings rather than slowing the worker.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::cadence::Cadence;
use super::clock::{SystemTimeSource, TimeSource};
use super::ticker::Ticker;
use crate::analysis::{NoisePipeline, Reading};
use crate::audio::AudioSource;
use crate::config::{AppConfig, ModeHandle};
use crate::error::{
    log_acquisition_error, log_analysis_error, AcquisitionError, AnalysisError, MonitorError,
};

/// Buffered readings per subscriber (~2 s at 60 Hz)
pub const READING_CHANNEL_CAPACITY: usize = 128;

struct Worker {
    stop_tx: mpsc::Sender<()>,
    thread: JoinHandle<Result<u64, AnalysisError>>,
}

/// Scheduler tying the sampler to the analysis chain
pub struct SamplingLoop<S: AudioSource + 'static> {
    source: Arc<S>,
    config: AppConfig,
    mode: ModeHandle,
    clock: Arc<dyn TimeSource>,
    readings_tx: broadcast::Sender<Reading>,
    worker: Option<Worker>,
}

impl<S: AudioSource + 'static> SamplingLoop<S> {
    pub fn new(source: S, config: AppConfig, mode: ModeHandle) -> Self {
        let (readings_tx, _) = broadcast::channel(READING_CHANNEL_CAPACITY);
        Self {
            source: Arc::new(source),
            config,
            mode,
            clock: Arc::new(SystemTimeSource::default()),
            readings_tx,
            worker: None,
        }
    }

    /// Replace the clock used for timestamps and throttling
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Shared mode handle; writes apply on the next tick
    pub fn mode(&self) -> &ModeHandle {
        &self.mode
    }

    pub fn cadence(&self) -> Cadence {
        Cadence::from(&self.config.cadence)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Reading> {
        self.readings_tx.subscribe()
    }

    /// Readings as an async stream; lagged gaps are skipped
    pub fn reading_stream(&self) -> impl Stream<Item = Reading> + Send + 'static {
        BroadcastStream::new(self.readings_tx.subscribe()).filter_map(|result| async move {
            match result {
                Ok(reading) => Some(reading),
                Err(err) => {
                    log::debug!("[SamplingLoop] Subscriber lagged: {}", err);
                    None
                }
            }
        })
    }

    /// Whether a worker is alive and ticking
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.thread.is_finished())
    }

    /// Open the source and begin ticking
    ///
    /// # Errors
    /// - `AlreadyRunning` if a worker exists; call `stop` first
    /// - `Acquisition` when the source cannot be opened (no retry)
    /// - `Analysis` when the configured level scale is invalid
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.worker.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let pipeline = NoisePipeline::from_config(&self.config, self.mode.clone())?;
        let cadence = self.cadence();
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        let readings_tx = self.readings_tx.clone();

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), AcquisitionError>>(1);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("noise-sampling".to_string())
            .spawn(move || {
                run_worker(
                    source.as_ref(),
                    pipeline,
                    cadence,
                    clock,
                    readings_tx,
                    ready_tx,
                    stop_rx,
                )
            })
            .map_err(|err| MonitorError::WorkerSpawnFailed {
                reason: err.to_string(),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                tracing::info!(
                    "[SamplingLoop] Started on {} (tick {:?}, throttle {:?})",
                    self.source.describe(),
                    cadence.tick_interval,
                    cadence.throttle
                );
                self.worker = Some(Worker { stop_tx, thread });
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(MonitorError::Acquisition(err))
            }
            Err(_) => {
                // Worker exited without reporting; only a panic gets here
                let _ = thread.join();
                Err(MonitorError::WorkerPanicked)
            }
        }
    }

    /// Cancel further ticks and release the device
    ///
    /// Safe before `start` and when called repeatedly. Returns the analysis
    /// error that stopped the worker early, if any.
    pub fn stop(&mut self) -> Result<(), MonitorError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        // The worker may already have exited; a closed channel is fine.
        let _ = worker.stop_tx.send(());

        match worker.thread.join() {
            Ok(Ok(ticks)) => {
                tracing::info!("[SamplingLoop] Stopped after {} ticks", ticks);
                Ok(())
            }
            Ok(Err(err)) => Err(MonitorError::Analysis(err)),
            Err(_) => {
                tracing::warn!("[SamplingLoop] Worker panicked");
                Err(MonitorError::WorkerPanicked)
            }
        }
    }
}

impl<S: AudioSource + 'static> Drop for SamplingLoop<S> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!("[SamplingLoop] Stop on drop failed: {}", err);
        }
    }
}

fn run_worker<S: AudioSource>(
    source: &S,
    pipeline: NoisePipeline,
    cadence: Cadence,
    clock: Arc<dyn TimeSource>,
    readings_tx: broadcast::Sender<Reading>,
    ready_tx: mpsc::SyncSender<Result<(), AcquisitionError>>,
    stop_rx: mpsc::Receiver<()>,
) -> Result<u64, AnalysisError> {
    let handle = match source.open() {
        Ok(handle) => handle,
        Err(err) => {
            log_acquisition_error(&err, "open");
            let _ = ready_tx.send(Err(err));
            return Ok(0);
        }
    };
    let mut ticker = Ticker::new(handle, pipeline, cadence.throttle_gate(), clock.now());
    let _ = ready_tx.send(Ok(()));

    loop {
        match ticker.tick(clock.now()) {
            Ok(Some(reading)) => {
                // No subscribers is not an error
                let _ = readings_tx.send(reading);
            }
            Ok(None) => {}
            Err(err) => {
                log_analysis_error(&err, "tick");
                ticker.close();
                return Err(err);
            }
        }

        match stop_rx.recv_timeout(cadence.tick_interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::debug!("[SamplingLoop] Worker exiting after {} ticks", ticker.ticks());
    ticker.close();
    Ok(ticker.ticks())
}
