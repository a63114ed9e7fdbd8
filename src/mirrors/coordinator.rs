use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use super::{classify, LogRecord, RunRejected, UpdateRequest};
use crate::config::MirrorsConfig;
use crate::lock;
use crate::process::ProcessRunner;
use crate::sink::EventSink;

/// Reported when the helper (or its wrapper) could not be started
pub const SPAWN_FAILURE_CODE: i32 = 127;
/// Reported when the helper's exit status could not be collected
pub const WAIT_FAILURE_CODE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Finished(i32),
}

/// Where the refresh tool lives and where it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    pub program: String,
    pub privilege_wrapper: String,
    pub mirrorlist_path: String,
}

impl RefreshSettings {
    pub fn from_config(config: &MirrorsConfig) -> Self {
        Self {
            program: config.program.clone(),
            privilege_wrapper: config.privilege_wrapper.clone(),
            mirrorlist_path: config.mirrorlist_path.clone(),
        }
    }

    /// Executable and arguments for `request`, wrapper first when configured.
    fn command(&self, request: &UpdateRequest) -> (String, Vec<String>) {
        let args = request.to_args(&self.mirrorlist_path);
        if self.privilege_wrapper.is_empty() {
            (self.program.clone(), args)
        } else {
            let mut wrapped = Vec::with_capacity(args.len() + 1);
            wrapped.push(self.program.clone());
            wrapped.extend(args);
            (self.privilege_wrapper.clone(), wrapped)
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self::from_config(&MirrorsConfig::default())
    }
}

/// Runs at most one mirror refresh at a time.
///
/// Each accepted run gets its own worker thread which spawns the helper,
/// classifies every line and reports to the sink. The sink is only borrowed
/// weakly; if the presentation layer drops it the run still completes.
pub struct UpdateCoordinator {
    settings: RefreshSettings,
    runner: ProcessRunner,
    sink: Weak<dyn EventSink>,
    state: Arc<Mutex<RunState>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl UpdateCoordinator {
    pub fn new(settings: RefreshSettings, runner: ProcessRunner, sink: Weak<dyn EventSink>) -> Self {
        Self {
            settings,
            runner,
            sink,
            state: Arc::new(Mutex::new(RunState::Idle)),
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> RunState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Shell-escaped invocation for display.
    pub fn command_line(&self, request: &UpdateRequest) -> String {
        let (program, args) = self.settings.command(request);
        std::iter::once(program)
            .chain(args)
            .map(|part| shell_escape::escape(part.into()).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Accept `request` and start it in the background.
    ///
    /// Rejected without side effects while another run is active or when the
    /// request is invalid.
    pub fn start(&self, request: &UpdateRequest) -> Result<(), RunRejected> {
        // Held for the whole call so concurrent starts cannot interleave
        // their worker handles.
        let mut worker = lock(&self.worker);

        {
            let mut state = lock(&self.state);
            if *state == RunState::Running {
                let died = worker.as_ref().is_some_and(JoinHandle::is_finished);
                if !died {
                    return Err(RunRejected::AlreadyRunning);
                }
                warn!("Previous mirror refresh worker died without finishing");
            }
            request.validate()?;
            *state = RunState::Running;
        }

        // The previous run is Finished; its worker may still be delivering
        // the completion callback, which must precede our first record.
        if let Some(previous) = worker.take() {
            join_worker(previous);
        }

        let (program, args) = self.settings.command(request);
        info!("Starting mirror refresh: {}", self.command_line(request));

        let tool = self.settings.program.clone();
        let runner = self.runner.clone();
        let sink = self.sink.clone();
        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name("mirror-refresh".to_string())
            .spawn(move || run_refresh(&runner, &tool, &program, &args, &sink, &state));

        match spawned {
            Ok(handle) => *worker = Some(handle),
            Err(e) => {
                error!("Failed to start mirror refresh worker: {}", e);
                let sink = self.sink.clone();
                deliver(&sink, LogRecord::Error(format!("Failed to start worker: {e}")));
                complete(&sink, &self.state, SPAWN_FAILURE_CODE);
            }
        }

        Ok(())
    }

    /// Block until the current run's worker, if any, has exited.
    pub fn wait(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            join_worker(handle);
        }
    }
}

/// Join a finished or finishing worker.
///
/// A sink may call back into the coordinator from `on_run_finished`, i.e. on
/// the worker itself. That thread has nothing left to do but return, so its
/// handle is dropped instead of joined.
fn join_worker(handle: JoinHandle<()>) {
    if handle.thread().id() == thread::current().id() {
        debug!("Called from the mirror refresh worker, not joining itself");
        return;
    }
    if handle.join().is_err() {
        error!("Mirror refresh worker panicked");
    }
}

impl Drop for UpdateCoordinator {
    fn drop(&mut self) {
        if self.is_running() {
            debug!("Waiting for mirror refresh to finish");
        }
        self.wait();
    }
}

fn run_refresh(
    runner: &ProcessRunner,
    tool: &str,
    program: &str,
    args: &[String],
    sink: &Weak<dyn EventSink>,
    state: &Mutex<RunState>,
) {
    deliver(sink, LogRecord::Info(format!("Starting {tool}...")));

    let mut handle = match runner.spawn(program, args) {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}", e);
            deliver(sink, LogRecord::Error(e.to_string()));
            complete(sink, state, SPAWN_FAILURE_CODE);
            return;
        }
    };

    debug!("{} running as pid {}", handle.program(), handle.pid());

    for line in handle.by_ref() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = classify(line);
        debug!("{:?}: {}", record.kind(), record.raw());
        deliver(sink, record);
    }

    let code = match handle.exit_code() {
        Ok(code) => code,
        Err(e) => {
            error!("Failed to collect exit status of {}: {}", program, e);
            WAIT_FAILURE_CODE
        }
    };

    if code == 0 {
        info!("Mirror refresh completed");
        deliver(sink, LogRecord::Info("Update completed successfully!".to_string()));
    } else {
        error!("Mirror refresh failed with code {}", code);
        deliver(sink, LogRecord::Error(format!("Update failed with code {code}")));
    }

    complete(sink, state, code);
}

fn deliver(sink: &Weak<dyn EventSink>, record: LogRecord) {
    match sink.upgrade() {
        Some(sink) => sink.on_log_record(record),
        None => debug!("No event sink, dropping {:?}", record.kind()),
    }
}

fn complete(sink: &Weak<dyn EventSink>, state: &Mutex<RunState>, code: i32) {
    *lock(state) = RunState::Finished(code);
    if let Some(sink) = sink.upgrade() {
        sink.on_run_finished(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirrors::LogKind;
    use std::sync::OnceLock;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Result<LogRecord, i32>>>,
    }

    impl EventSink for Recorder {
        fn on_log_record(&self, record: LogRecord) {
            self.events.lock().unwrap().push(Ok(record));
        }

        fn on_run_finished(&self, exit_code: i32) {
            self.events.lock().unwrap().push(Err(exit_code));
        }
    }

    fn settings(program: &str) -> RefreshSettings {
        RefreshSettings {
            program: program.to_string(),
            privilege_wrapper: String::new(),
            mirrorlist_path: "/tmp/mirrorlist".to_string(),
        }
    }

    #[test]
    fn command_line_puts_wrapper_first() {
        let recorder: Arc<dyn EventSink> = Arc::new(Recorder::default());
        let coordinator = UpdateCoordinator::new(
            RefreshSettings::default(),
            ProcessRunner::default(),
            Arc::downgrade(&recorder),
        );
        let request = UpdateRequest::new(["United States", "Canada"]);

        assert_eq!(
            coordinator.command_line(&request),
            "pkexec reflector --country 'United States,Canada' --protocol https \
             --latest 5 --sort rate --download-timeout 10 \
             --save /etc/pacman.d/mirrorlist --verbose"
        );
    }

    #[test]
    fn empty_country_set_is_rejected_without_running() {
        let recorder = Arc::new(Recorder::default());
        let sink: Arc<dyn EventSink> = recorder.clone();
        let coordinator =
            UpdateCoordinator::new(settings("true"), ProcessRunner::default(), Arc::downgrade(&sink));

        let empty: [&str; 0] = [];
        assert_eq!(
            coordinator.start(&UpdateRequest::new(empty)),
            Err(RunRejected::NoCountries)
        );
        assert_eq!(coordinator.state(), RunState::Idle);
        coordinator.wait();
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[test]
    fn spawn_failure_finishes_with_synthetic_code() {
        let recorder = Arc::new(Recorder::default());
        let sink: Arc<dyn EventSink> = recorder.clone();
        let coordinator = UpdateCoordinator::new(
            settings("/nonexistent/reflector"),
            ProcessRunner::default(),
            Arc::downgrade(&sink),
        );

        coordinator.start(&UpdateRequest::new(["Germany"])).unwrap();
        coordinator.wait();

        assert_eq!(coordinator.state(), RunState::Finished(SPAWN_FAILURE_CODE));
        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Ok(LogRecord::Info(msg)) if msg.starts_with("Starting")));
        assert!(matches!(&events[1], Ok(record) if record.kind() == LogKind::Error));
        assert_eq!(events[2], Err(SPAWN_FAILURE_CODE));
    }

    /// Restarts the coordinator once from its first completion callback.
    #[derive(Default)]
    struct Restarter {
        coordinator: OnceLock<Weak<UpdateCoordinator>>,
        finishes: Mutex<Vec<i32>>,
        restarted: Mutex<Option<Result<(), RunRejected>>>,
    }

    impl EventSink for Restarter {
        fn on_log_record(&self, _record: LogRecord) {}

        fn on_run_finished(&self, exit_code: i32) {
            let first = {
                let mut finishes = self.finishes.lock().unwrap();
                finishes.push(exit_code);
                finishes.len() == 1
            };
            if !first {
                return;
            }
            if let Some(coordinator) = self.coordinator.get().and_then(Weak::upgrade) {
                let result = coordinator.start(&UpdateRequest::new(["Sweden"]));
                *self.restarted.lock().unwrap() = Some(result);
            }
        }
    }

    #[test]
    fn sink_can_restart_from_completion_callback() {
        let restarter = Arc::new(Restarter::default());
        let sink: Arc<dyn EventSink> = restarter.clone();
        let coordinator = Arc::new(UpdateCoordinator::new(
            settings("true"),
            ProcessRunner::default(),
            Arc::downgrade(&sink),
        ));
        restarter.coordinator.set(Arc::downgrade(&coordinator)).unwrap();

        coordinator.start(&UpdateRequest::new(["Norway"])).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while restarter.finishes.lock().unwrap().len() < 2
            || restarter.restarted.lock().unwrap().is_none()
        {
            assert!(Instant::now() < deadline, "restarted run never finished");
            thread::sleep(Duration::from_millis(20));
        }
        coordinator.wait();

        assert_eq!(*restarter.restarted.lock().unwrap(), Some(Ok(())));
        assert_eq!(*restarter.finishes.lock().unwrap(), vec![0, 0]);
        assert_eq!(coordinator.state(), RunState::Finished(0));

        // Not wedged: a further run is still accepted
        coordinator.start(&UpdateRequest::new(["Norway"])).unwrap();
        coordinator.wait();
        assert_eq!(restarter.finishes.lock().unwrap().len(), 3);
    }

    #[test]
    fn dropped_sink_does_not_stop_the_run() {
        let sink: Arc<dyn EventSink> = Arc::new(Recorder::default());
        let weak = Arc::downgrade(&sink);
        drop(sink);

        let coordinator = UpdateCoordinator::new(settings("true"), ProcessRunner::default(), weak);
        coordinator.start(&UpdateRequest::new(["Japan"])).unwrap();
        coordinator.wait();

        assert_eq!(coordinator.state(), RunState::Finished(0));
    }
}
