use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::detection::domain::face_detector::{DetectorFactory, FaceDetector};
use crate::imaging::domain::image_reader::ImageReader;
use crate::pipeline::detection_executor::{detect_image, DetectionExecutor, DetectionOutcome};

/// How often the collector wakes up to check for timed-out images.
const TICK: Duration = Duration::from_millis(50);

type Job = (usize, PathBuf);

enum Event {
    Started {
        worker: usize,
        index: usize,
    },
    Finished {
        worker: usize,
        index: usize,
        outcome: DetectionOutcome,
    },
}

/// Runs detection on a pool of worker threads, one detector per worker.
///
/// Layout: `job queue → workers [read + detect] → collector (calling thread)`
///
/// Detector instances are built up front on the calling thread, so a
/// construction failure aborts before any work starts. With a per-image
/// timeout, an image that takes too long is recorded as failed, its worker
/// is detached rather than joined, and a fresh worker takes its place while
/// jobs remain queued.
pub struct ThreadedDetectionExecutor {
    workers: usize,
    per_image_timeout: Option<Duration>,
}

impl ThreadedDetectionExecutor {
    pub fn new(workers: usize, per_image_timeout: Option<Duration>) -> Self {
        Self {
            workers: workers.max(1),
            per_image_timeout,
        }
    }
}

impl DetectionExecutor for ThreadedDetectionExecutor {
    fn execute(
        &self,
        images: &[PathBuf],
        reader: Arc<dyn ImageReader>,
        factory: &DetectorFactory,
        on_progress: Option<&(dyn Fn(f64) + Send)>,
    ) -> Result<Vec<DetectionOutcome>, Box<dyn std::error::Error + Send + Sync>> {
        let total = images.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let worker_count = self.workers.min(total);
        let detectors = (0..worker_count)
            .map(|_| factory())
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Running detection on {total} images with {worker_count} workers");

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        for job in images.iter().cloned().enumerate() {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<Event>();
        let mut pool = WorkerPool::new(reader, job_rx, event_tx);
        for detector in detectors {
            pool.spawn(detector);
        }

        let mut collector = Collector::new(total, self.per_image_timeout);
        collector.run(&event_rx, &mut pool, factory, on_progress);
        pool.shutdown(&collector.stuck);

        Ok(collector.finish())
    }
}

/// Worker threads sharing one job queue and one event channel.
struct WorkerPool {
    reader: Arc<dyn ImageReader>,
    job_rx: Receiver<Job>,
    event_tx: Sender<Event>,
    cancel: Arc<AtomicBool>,
    handles: Vec<(usize, JoinHandle<()>)>,
}

impl WorkerPool {
    fn new(reader: Arc<dyn ImageReader>, job_rx: Receiver<Job>, event_tx: Sender<Event>) -> Self {
        Self {
            reader,
            job_rx,
            event_tx,
            cancel: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    fn spawn(&mut self, detector: Box<dyn FaceDetector>) -> usize {
        let worker = self.handles.len();
        let handle = spawn_worker(
            worker,
            detector,
            Arc::clone(&self.reader),
            self.job_rx.clone(),
            self.event_tx.clone(),
            Arc::clone(&self.cancel),
        );
        self.handles.push((worker, handle));
        worker
    }

    fn has_queued_jobs(&self) -> bool {
        !self.job_rx.is_empty()
    }

    /// True once every worker not known to be stuck has exited.
    fn all_exited(&self, stuck: &HashSet<usize>) -> bool {
        self.handles
            .iter()
            .filter(|(worker, _)| !stuck.contains(worker))
            .all(|(_, handle)| handle.is_finished())
    }

    /// Stops workers from taking further jobs, joins the healthy ones and
    /// detaches those still stuck in a detector call.
    fn shutdown(self, stuck: &HashSet<usize>) {
        self.cancel.store(true, Ordering::SeqCst);
        let mut detached = 0;
        for (worker, handle) in self.handles {
            if stuck.contains(&worker) && !handle.is_finished() {
                detached += 1;
                continue;
            }
            if handle.join().is_err() {
                log::error!("Detection worker {worker} panicked");
            }
        }
        if detached > 0 {
            log::warn!("Detaching {detached} stuck detection worker(s)");
        }
    }
}

fn spawn_worker(
    worker: usize,
    mut detector: Box<dyn FaceDetector>,
    reader: Arc<dyn ImageReader>,
    job_rx: Receiver<Job>,
    event_tx: Sender<Event>,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !cancel.load(Ordering::SeqCst) {
            let Ok((index, path)) = job_rx.try_recv() else {
                break;
            };
            if event_tx.send(Event::Started { worker, index }).is_err() {
                break;
            }
            let outcome = detect_image(&path, reader.as_ref(), detector.as_mut());
            let finished = Event::Finished {
                worker,
                index,
                outcome,
            };
            if event_tx.send(finished).is_err() {
                break;
            }
        }
    })
}

/// Gathers worker events into per-image outcomes on the calling thread.
struct Collector {
    outcomes: Vec<Option<DetectionOutcome>>,
    resolved: usize,
    reported: usize,
    timeout: Option<Duration>,
    /// Image each busy worker is on, and since when.
    in_flight: HashMap<usize, (usize, Instant)>,
    stuck: HashSet<usize>,
}

impl Collector {
    fn new(total: usize, timeout: Option<Duration>) -> Self {
        Self {
            outcomes: (0..total).map(|_| None).collect(),
            resolved: 0,
            reported: 0,
            timeout,
            in_flight: HashMap::new(),
            stuck: HashSet::new(),
        }
    }

    fn run(
        &mut self,
        event_rx: &Receiver<Event>,
        pool: &mut WorkerPool,
        factory: &DetectorFactory,
        on_progress: Option<&(dyn Fn(f64) + Send)>,
    ) {
        while self.resolved < self.outcomes.len() {
            match event_rx.recv_timeout(TICK) {
                Ok(Event::Started { worker, index }) => {
                    self.stuck.remove(&worker);
                    self.in_flight.insert(worker, (index, Instant::now()));
                }
                Ok(Event::Finished {
                    worker,
                    index,
                    outcome,
                }) => {
                    self.in_flight.remove(&worker);
                    self.resolve(index, outcome);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if pool.all_exited(&self.stuck) && event_rx.is_empty() {
                        self.fail_remaining("detection worker exited");
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.fail_remaining("detection worker exited");
                }
            }

            let newly_stuck = self.expire_slow_images();
            if newly_stuck > 0 && pool.has_queued_jobs() {
                self.replace_workers(newly_stuck, pool, factory);
            }
            self.report_progress(on_progress);
        }
    }

    /// Starts `count` fresh workers in place of stuck ones. Without a
    /// detector the queued images cannot be processed and fail.
    fn replace_workers(&mut self, count: usize, pool: &mut WorkerPool, factory: &DetectorFactory) {
        for _ in 0..count {
            match factory() {
                Ok(detector) => {
                    let worker = pool.spawn(detector);
                    log::info!("Started replacement detection worker {worker}");
                }
                Err(e) => {
                    log::error!("Failed to create replacement face detector: {e}");
                    self.fail_remaining("no detection worker available");
                    return;
                }
            }
        }
    }

    /// Fails images that exceeded the timeout and marks their workers stuck.
    /// Returns how many workers became stuck.
    fn expire_slow_images(&mut self) -> usize {
        let Some(timeout) = self.timeout else {
            return 0;
        };
        let expired: Vec<(usize, usize)> = self
            .in_flight
            .iter()
            .filter(|(_, (_, started))| started.elapsed() >= timeout)
            .map(|(&worker, &(index, _))| (worker, index))
            .collect();
        for &(worker, index) in &expired {
            log::warn!(
                "Detection timed out after {:.1}s for image {index}",
                timeout.as_secs_f64()
            );
            self.in_flight.remove(&worker);
            self.stuck.insert(worker);
            self.resolve(
                index,
                DetectionOutcome::Failed(format!(
                    "timed out after {:.1}s",
                    timeout.as_secs_f64()
                )),
            );
        }
        expired.len()
    }

    /// First outcome for an image wins; late results after a timeout are
    /// dropped.
    fn resolve(&mut self, index: usize, outcome: DetectionOutcome) {
        if let Some(slot) = self.outcomes.get_mut(index) {
            if slot.is_none() {
                *slot = Some(outcome);
                self.resolved += 1;
            }
        }
    }

    fn fail_remaining(&mut self, reason: &str) {
        for index in 0..self.outcomes.len() {
            self.resolve(index, DetectionOutcome::Failed(reason.to_string()));
        }
    }

    /// Reports the longest resolved prefix, so progress only moves forward
    /// in input order.
    fn report_progress(&mut self, on_progress: Option<&(dyn Fn(f64) + Send)>) {
        let total = self.outcomes.len();
        while self.reported < total && self.outcomes[self.reported].is_some() {
            self.reported += 1;
            if let Some(cb) = on_progress {
                cb(self.reported as f64 / total as f64);
            }
        }
    }

    fn finish(self) -> Vec<DetectionOutcome> {
        self.outcomes
            .into_iter()
            .map(|o| o.unwrap_or_else(|| DetectionOutcome::Failed("not processed".into())))
            .collect()
    }
}
