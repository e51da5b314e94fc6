//! Location host backed by a stored consent decision, a terminal prompt, and
//! WiFi-based geolocation.
//!
//! Prompting and geolocation run on worker threads. Their results are queued
//! on a channel and only reach the delegate from [`LocationHost::run_events`],
//! so every callback runs on the thread that polls.

use anyhow::Result;
use std::fs::File;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::config::{self, Config, LocationConfig};
use crate::consent::{self, ConsentStore, Terminal};
use crate::error::WifiLocateError;
use crate::geolocate::GeolocateClient;
use crate::host::{LocationDelegate, LocationHost};
use crate::model::{AuthorizationState, PositionFix};
use crate::scan;

#[derive(Debug)]
enum HostEvent {
    Authorization(AuthorizationState),
    Position(PositionFix),
    Failed(String),
}

/// A prompt still waiting on the terminal.
struct PendingPrompt {
    answered: Arc<AtomicBool>,
    tty: File,
}

pub struct SystemLocationHost {
    location: LocationConfig,
    store: ConsentStore,
    events_tx: Sender<HostEvent>,
    events_rx: Receiver<HostEvent>,
    updates: Option<Arc<AtomicBool>>,
    prompt: Option<PendingPrompt>,
}

impl SystemLocationHost {
    /// Creates a host that keeps its consent file in the user config directory.
    pub fn new(config: &Config) -> Result<Self> {
        let dir = config::config_dir().map_err(|e| WifiLocateError::HostInit(format!("{:#}", e)))?;
        Ok(Self::with_store(config, ConsentStore::in_dir(&dir)))
    }

    pub fn with_store(config: &Config, store: ConsentStore) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        SystemLocationHost {
            location: config.location.clone(),
            store,
            events_tx,
            events_rx,
            updates: None,
            prompt: None,
        }
    }

    fn dispatch(event: HostEvent, delegate: &dyn LocationDelegate) {
        match event {
            HostEvent::Authorization(state) => delegate.authorization_changed(state),
            HostEvent::Position(fix) => delegate.position_updated(fix),
            HostEvent::Failed(reason) => delegate.position_failed(&reason),
        }
    }
}

impl LocationHost for SystemLocationHost {
    fn authorization_status(&self) -> AuthorizationState {
        if !self.location.enabled {
            return AuthorizationState::Restricted;
        }
        self.store
            .load()
            .map(AuthorizationState::from)
            .unwrap_or(AuthorizationState::NotDetermined)
    }

    fn request_authorization(&mut self) -> Result<()> {
        let mut tty = Terminal::open()?;
        let echo = tty.try_clone_writer()?;
        let answered = Arc::new(AtomicBool::new(false));

        let store = self.store.clone();
        let tx = self.events_tx.clone();
        let worker_answered = answered.clone();

        thread::spawn(move || run_prompt(&mut tty, &store, &worker_answered, &tx));

        self.prompt = Some(PendingPrompt { answered, tty: echo });
        Ok(())
    }

    fn start_updates(&mut self) -> Result<()> {
        if self.updates.is_some() {
            return Ok(());
        }

        let stop = Arc::new(AtomicBool::new(false));
        let client = GeolocateClient::new(
            &self.location.endpoint,
            self.location.api_key.as_deref(),
            Duration::from_millis(self.location.request_timeout_ms),
        );
        let rounds = self.location.refinements.max(1);
        let tx = self.events_tx.clone();
        let worker_stop = stop.clone();

        // First round uses cached scan results, later rounds rescan
        let locate = move |rescan: bool| -> Result<PositionFix> {
            let aps = scan::scan_access_points(rescan)?;
            Ok(client.locate(&aps)?)
        };

        thread::Builder::new()
            .name("geolocate".to_string())
            .spawn(move || run_updates(locate, rounds, &worker_stop, &tx))
            .map_err(|e| WifiLocateError::Geolocate(e.to_string()))?;

        self.updates = Some(stop);
        Ok(())
    }

    fn stop_updates(&mut self) {
        if let Some(stop) = self.updates.take() {
            stop.store(true, Ordering::Release);
        }
    }

    fn run_events(&mut self, slice: Duration, delegate: &dyn LocationDelegate) {
        match self.events_rx.recv_timeout(slice) {
            Ok(event) => Self::dispatch(event, delegate),
            Err(RecvTimeoutError::Timeout) => return,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(slice);
                return;
            }
        }

        while let Ok(event) = self.events_rx.try_recv() {
            Self::dispatch(event, delegate);
        }
    }
}

impl Drop for SystemLocationHost {
    fn drop(&mut self) {
        self.stop_updates();

        // Finish the dangling "[y/N] " line of an unanswered prompt
        if let Some(mut prompt) = self.prompt.take() {
            if !prompt.answered.load(Ordering::Acquire) {
                let _ = prompt.tty.write_all(b"\n");
            }
        }
    }
}

/// Prompt thread body. An answer is stored; a prompt that cannot be read
/// counts as a refusal for this run only.
fn run_prompt<T: BufRead + Write>(
    tty: &mut T,
    store: &ConsentStore,
    answered: &AtomicBool,
    tx: &Sender<HostEvent>,
) {
    let state = match consent::ask_on_terminal(tty) {
        Ok(decision) => {
            if let Err(e) = store.save(decision) {
                log::warn!("{:#}", e);
            }
            AuthorizationState::from(decision)
        }
        Err(e) => {
            log::debug!("Permission prompt failed: {:#}", e);
            AuthorizationState::Denied
        }
    };

    answered.store(true, Ordering::Release);
    let _ = tx.send(HostEvent::Authorization(state));
}

/// Worker loop. `locate` runs one round and is told whether to rescan
/// (every round but the first). Each fix is delivered; a failure is
/// reported once, and only if no round produced a fix.
fn run_updates<F>(mut locate: F, rounds: u32, stop: &AtomicBool, tx: &Sender<HostEvent>)
where
    F: FnMut(bool) -> Result<PositionFix>,
{
    let mut delivered = false;
    let mut last_error = String::from("no geolocation attempt made");

    for round in 0..rounds {
        if stop.load(Ordering::Acquire) {
            return;
        }

        match locate(round > 0) {
            Ok(fix) => {
                if stop.load(Ordering::Acquire) || tx.send(HostEvent::Position(fix)).is_err() {
                    return;
                }
                delivered = true;
            }
            Err(e) => last_error = format!("{:#}", e),
        }
    }

    if !delivered && !stop.load(Ordering::Acquire) {
        let _ = tx.send(HostEvent::Failed(last_error));
    }
}
