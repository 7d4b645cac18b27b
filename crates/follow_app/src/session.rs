use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use engine_logging::engine_info;
use follow_core::RunState;
use follow_engine::{EngineHandle, StartAck, SubjectHint};

/// The part of the engine surface a host driver needs.
pub trait EngineControl {
    fn ping(&self) -> bool;
    fn start(&self, hint: SubjectHint) -> StartAck;
    fn poll_status(&self) -> RunState;
}

impl EngineControl for EngineHandle {
    fn ping(&self) -> bool {
        EngineHandle::ping(self)
    }

    fn start(&self, hint: SubjectHint) -> StartAck {
        EngineHandle::start(self, hint)
    }

    fn poll_status(&self) -> RunState {
        EngineHandle::poll_status(self)
    }
}

/// Starts one run and polls it until it ends, logging every new message.
pub struct Session<E> {
    engine: E,
    poll_interval: Duration,
}

impl<E: EngineControl> Session<E> {
    pub fn new(engine: E, poll_interval: Duration) -> Self {
        Self {
            engine,
            poll_interval,
        }
    }

    pub fn run(&self, hint: SubjectHint) -> Result<RunState> {
        if !self.engine.ping() {
            bail!("engine is not responding");
        }
        match self.engine.start(hint) {
            StartAck::Started => {}
            StartAck::AlreadyRunning => bail!("a run is already in progress"),
            StartAck::Unavailable => bail!("engine stopped before the run could start"),
        }

        let mut last_message = String::new();
        loop {
            let state = self.engine.poll_status();
            if state.message() != last_message {
                engine_info!("[{:>3}%] {}", state.view().progress_percent, state.message());
                last_message = state.message().to_string();
            }
            if state.status().is_terminal() {
                return Ok(state);
            }
            thread::sleep(self.poll_interval);
        }
    }
}
