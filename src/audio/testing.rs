//! Test doubles for the audio seams
//!
//! Every double is a cheap `Rc` handle, so the test keeps one clone for
//! inspection and hands another to the engine.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::{Future, poll_fn};
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::backend::{
    AssetFetcher, AudioDevice, AudioOutput, Clock, ContextState, FetchResponse, LocalBoxFuture,
    Spawner,
};
use super::catalog::SoundCatalog;
use super::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use super::engine::{AudioEngine, EngineServices};
use super::error::AudioError;

struct DeviceState {
    fail_construction: Cell<bool>,
    start_running: Cell<bool>,
    reject_resume: Cell<bool>,
    resume_held: Cell<bool>,
    fail_playback: Cell<bool>,
    context_state: Cell<ContextState>,
    contexts_created: Cell<u32>,
    resumes: Cell<u32>,
    decodes: Cell<u32>,
    fail_decode: RefCell<HashSet<String>>,
    plays: RefCell<Vec<(String, f32)>>,
}

/// Mock output device. Buffers are the decoded bytes as a string, so the
/// default fetcher body (the URL) identifies which sound played.
#[derive(Clone)]
pub struct MockDevice {
    state: Rc<DeviceState>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            state: Rc::new(DeviceState {
                fail_construction: Cell::new(false),
                start_running: Cell::new(false),
                reject_resume: Cell::new(false),
                resume_held: Cell::new(false),
                fail_playback: Cell::new(false),
                context_state: Cell::new(ContextState::Suspended),
                contexts_created: Cell::new(0),
                resumes: Cell::new(0),
                decodes: Cell::new(0),
                fail_decode: RefCell::new(HashSet::new()),
                plays: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn fail_construction(&self) {
        self.state.fail_construction.set(true);
    }

    /// New contexts start running instead of suspended
    pub fn start_running(&self) {
        self.state.start_running.set(true);
    }

    pub fn reject_resume(&self) {
        self.state.reject_resume.set(true);
    }

    /// Resume flips the context to running at once, but its future stays
    /// pending until `release_resume`
    pub fn hold_resume(&self) {
        self.state.resume_held.set(true);
    }

    pub fn release_resume(&self) {
        self.state.resume_held.set(false);
    }

    /// The platform resumed the context on its own (e.g. a later gesture)
    pub fn set_running(&self) {
        self.state.context_state.set(ContextState::Running);
    }

    pub fn fail_playback(&self) {
        self.state.fail_playback.set(true);
    }

    /// Decoding bytes equal to `body` fails
    pub fn fail_decode(&self, body: &str) {
        self.state.fail_decode.borrow_mut().insert(body.to_owned());
    }

    pub fn contexts_created(&self) -> u32 {
        self.state.contexts_created.get()
    }

    pub fn resumes_requested(&self) -> u32 {
        self.state.resumes.get()
    }

    pub fn decodes(&self) -> u32 {
        self.state.decodes.get()
    }

    /// (buffer, gain) for each started playback
    pub fn plays(&self) -> Vec<(String, f32)> {
        self.state.plays.borrow().clone()
    }
}

pub struct MockOutput {
    state: Rc<DeviceState>,
}

impl AudioDevice for MockDevice {
    type Output = MockOutput;

    fn create_context(&self) -> Result<MockOutput, AudioError> {
        if self.state.fail_construction.get() {
            return Err(AudioError::Unsupported("no AudioContext".into()));
        }
        self.state.contexts_created.set(self.state.contexts_created.get() + 1);
        if self.state.start_running.get() {
            self.state.context_state.set(ContextState::Running);
        }
        Ok(MockOutput {
            state: Rc::clone(&self.state),
        })
    }
}

impl AudioOutput for MockOutput {
    type Buffer = String;

    fn state(&self) -> ContextState {
        self.state.context_state.get()
    }

    fn resume(&self) -> LocalBoxFuture<'static, Result<(), AudioError>> {
        self.state.resumes.set(self.state.resumes.get() + 1);
        if self.state.resume_held.get() {
            self.state.context_state.set(ContextState::Running);
        }
        let state = Rc::clone(&self.state);
        Box::pin(async move {
            poll_fn(|_| {
                if state.resume_held.get() {
                    Poll::Pending
                } else {
                    Poll::Ready(())
                }
            })
            .await;
            if state.reject_resume.get() {
                return Err(AudioError::ResumeRejected("not allowed to start".into()));
            }
            state.context_state.set(ContextState::Running);
            Ok(())
        })
    }

    fn decode(&self, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<String, AudioError>> {
        self.state.decodes.set(self.state.decodes.get() + 1);
        let result = match String::from_utf8(bytes) {
            Ok(body) if self.state.fail_decode.borrow().contains(&body) => {
                Err(AudioError::Decode(format!("unsupported data in {}", body)))
            }
            Ok(body) => Ok(body),
            Err(err) => Err(AudioError::Decode(err.to_string())),
        };
        Box::pin(std::future::ready(result))
    }

    fn play(&self, buffer: &String, gain: f32) -> Result<(), AudioError> {
        if self.state.fail_playback.get() {
            return Err(AudioError::Playback("createBufferSource failed".into()));
        }
        self.state.plays.borrow_mut().push((buffer.clone(), gain));
        Ok(())
    }
}

#[derive(Default)]
struct FetcherState {
    held: Cell<bool>,
    statuses: RefCell<HashMap<String, u16>>,
    network_failures: RefCell<HashSet<String>>,
    counts: RefCell<HashMap<String, usize>>,
}

/// Mock fetcher. Bodies are the URL bytes.
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Rc<FetcherState>,
}

impl MockFetcher {
    /// Keep every fetch pending until `release`
    pub fn hold(&self) {
        self.state.held.set(true);
    }

    pub fn release(&self) {
        self.state.held.set(false);
    }

    pub fn respond_status(&self, url: &str, status: u16) {
        self.state.statuses.borrow_mut().insert(url.to_owned(), status);
    }

    pub fn fail_network(&self, url: &str) {
        self.state.network_failures.borrow_mut().insert(url.to_owned());
    }

    pub fn fetches(&self, url: &str) -> usize {
        self.state.counts.borrow().get(url).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.state.counts.borrow().values().sum()
    }
}

impl AssetFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, AudioError>> {
        *self.state.counts.borrow_mut().entry(url.to_owned()).or_default() += 1;
        let result = if self.state.network_failures.borrow().contains(url) {
            Err(AudioError::Network(format!("connection reset fetching {}", url)))
        } else {
            let status = self.state.statuses.borrow().get(url).copied().unwrap_or(200);
            Ok(FetchResponse {
                status,
                body: url.as_bytes().to_vec(),
            })
        };
        let state = Rc::clone(&self.state);
        Box::pin(async move {
            poll_fn(|_| {
                if state.held.get() {
                    Poll::Pending
                } else {
                    Poll::Ready(())
                }
            })
            .await;
            result
        })
    }
}

/// Spawner that queues tasks until the test drives them
#[derive(Clone, Default)]
pub struct TaskQueue {
    queue: Rc<RefCell<VecDeque<LocalBoxFuture<'static, ()>>>>,
}

impl TaskQueue {
    /// Poll queued tasks (including newly spawned ones) until none can progress
    pub fn run_until_stalled(&self) {
        let mut cx = Context::from_waker(Waker::noop());
        loop {
            let batch = self.queue.borrow().len();
            if batch == 0 {
                return;
            }
            let mut progressed = false;
            for _ in 0..batch {
                let Some(mut task) = self.queue.borrow_mut().pop_front() else {
                    break;
                };
                let poll = task.as_mut().poll(&mut cx);
                match poll {
                    Poll::Ready(()) => progressed = true,
                    Poll::Pending => self.queue.borrow_mut().push_back(task),
                }
            }
            if !progressed {
                return;
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Spawner for TaskQueue {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.queue.borrow_mut().push_back(task);
    }
}

#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.events.borrow().clone()
    }

    pub fn codes(&self) -> Vec<DiagnosticCode> {
        self.events.borrow().iter().map(|d| d.code).collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.events.borrow_mut().push(diagnostic);
    }
}

/// Engine wired to mocks, with handles to every mock
pub struct TestRig {
    pub engine: AudioEngine<MockDevice>,
    pub device: MockDevice,
    pub fetcher: MockFetcher,
    pub tasks: TaskQueue,
    pub clock: ManualClock,
    pub sink: RecordingSink,
}

impl TestRig {
    pub fn new(catalog: SoundCatalog) -> Self {
        let device = MockDevice::new();
        let fetcher = MockFetcher::default();
        let tasks = TaskQueue::default();
        let clock = ManualClock::default();
        let sink = RecordingSink::default();
        let engine = AudioEngine::new(
            device.clone(),
            catalog,
            EngineServices {
                fetcher: Box::new(fetcher.clone()),
                spawner: Box::new(tasks.clone()),
                clock: Box::new(clock.clone()),
                rng: Box::new(Pcg32::seed_from_u64(42)),
                sink: Box::new(sink.clone()),
            },
        );
        Self {
            engine,
            device,
            fetcher,
            tasks,
            clock,
            sink,
        }
    }
}
