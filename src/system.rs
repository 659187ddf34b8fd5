//! System controls reachable from the shade: display brightness and
//! speaker volume.
//!
//! Brightness talks to KDE's power-management DBus interface through
//! `busctl`. Volume walks a PipeWire (`wpctl`) -> PulseAudio (`pactl`)
//! -> ALSA (`amixer`) fallback chain and only ever touches the output
//! sink, never a microphone.

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// System settings consumed by the shade. Implementations may block (the
/// production one shells out), so production access goes through
/// [`SettingsService`] and never runs on the UI thread.
pub trait SettingsBackend: Send {
    fn brightness(&self) -> Result<u8>;
    fn set_brightness(&self, level: u8) -> Result<()>;
    fn volume(&self) -> Result<u8>;
    fn set_volume(&self, level: u8) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioBackend {
    PipeWire,
    PulseAudio,
    Alsa,
}

fn probe(cmd: &str) -> bool {
    Command::new(cmd)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn detect_audio_backend() -> AudioBackend {
    if probe("wpctl") {
        return AudioBackend::PipeWire;
    }
    if probe("pactl") {
        return AudioBackend::PulseAudio;
    }
    AudioBackend::Alsa
}

// The installed audio stack does not change while the kiosk is running.
static AUDIO_BACKEND: Lazy<AudioBackend> = Lazy::new(detect_audio_backend);

const BRIGHTNESS_DBUS: [&str; 3] = [
    "org.kde.Solid.PowerManagement",
    "/org/kde/Solid/PowerManagement/Actions/BrightnessControl",
    "org.kde.Solid.PowerManagement.Actions.BrightnessControl",
];

fn busctl_query(method: &str) -> Result<i32> {
    let output = Command::new("busctl")
        .args(["--user", "call"])
        .args(BRIGHTNESS_DBUS)
        .arg(method)
        .output()
        .with_context(|| format!("failed to run busctl {method}"))?;
    if !output.status.success() {
        bail!(
            "busctl {method} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    parse_busctl_value(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("unexpected busctl {method} reply"))
}

/// Replies look like `i 19200`: a type tag, then the value.
fn parse_busctl_value(stdout: &str) -> Result<i32> {
    let value = stdout
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow!("missing value in {stdout:?}"))?;
    Ok(value.parse::<i32>()?)
}

fn parse_wpctl_volume(stdout: &str) -> Result<u8> {
    // "Volume: 0.50" or "Volume: 0.50 [MUTED]"
    for word in stdout.split_whitespace() {
        if let Ok(vol) = word.parse::<f64>() {
            return Ok((vol * 100.0).round().min(100.0) as u8);
        }
    }
    bail!("no volume in wpctl output {stdout:?}")
}

fn parse_pactl_volume(stdout: &str) -> Result<u8> {
    for word in stdout.split_whitespace() {
        if let Some(percent) = word.strip_suffix('%') {
            if let Ok(vol) = percent.parse::<u8>() {
                return Ok(vol.min(100));
            }
        }
    }
    bail!("no volume in pactl output {stdout:?}")
}

fn parse_amixer_volume(stdout: &str) -> Result<u8> {
    // Lines contain "[50%]".
    for line in stdout.lines() {
        if let Some(start) = line.find('[') {
            if let Some(end) = line[start..].find('%') {
                if let Ok(vol) = line[start + 1..start + end].parse::<u8>() {
                    return Ok(vol.min(100));
                }
            }
        }
    }
    bail!("no volume in amixer output")
}

fn run_checked(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {cmd}"))?;
    if !output.status.success() {
        bail!(
            "{cmd} {} failed: {}",
            args.first().copied().unwrap_or_default(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Production backend for the kiosk's Linux image.
#[derive(Debug, Default)]
pub struct DefaultSettingsBackend;

impl SettingsBackend for DefaultSettingsBackend {
    fn brightness(&self) -> Result<u8> {
        let max = busctl_query("brightnessMax")?;
        let current = busctl_query("brightness")?;
        if max <= 0 {
            bail!("invalid max brightness {max}");
        }
        let percent = ((current as f64 / max as f64) * 100.0).round() as i64;
        Ok(percent.clamp(0, 100) as u8)
    }

    fn set_brightness(&self, level: u8) -> Result<()> {
        // Never fully dark: the panel is the only way to get it back up.
        let safe_level = level.clamp(5, 100);
        let max = busctl_query("brightnessMax")?;
        let target = ((safe_level as f64 / 100.0) * max as f64).round() as i32;
        let output = Command::new("busctl")
            .args(["--user", "call"])
            .args(BRIGHTNESS_DBUS)
            .args(["setBrightness", "i", &target.to_string()])
            .output()
            .context("failed to run busctl setBrightness")?;
        if !output.status.success() {
            bail!(
                "busctl setBrightness failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(())
    }

    fn volume(&self) -> Result<u8> {
        match *AUDIO_BACKEND {
            AudioBackend::PipeWire => {
                parse_wpctl_volume(&run_checked("wpctl", &["get-volume", "@DEFAULT_AUDIO_SINK@"])?)
            }
            AudioBackend::PulseAudio => parse_pactl_volume(&run_checked(
                "pactl",
                &["get-sink-volume", "@DEFAULT_SINK@"],
            )?),
            AudioBackend::Alsa => {
                parse_amixer_volume(&run_checked("amixer", &["get", "Master"])?)
            }
        }
    }

    fn set_volume(&self, level: u8) -> Result<()> {
        let safe_level = level.min(100);
        match *AUDIO_BACKEND {
            AudioBackend::PipeWire => {
                let decimal = safe_level as f64 / 100.0;
                run_checked(
                    "wpctl",
                    &["set-volume", "@DEFAULT_AUDIO_SINK@", &format!("{decimal:.2}")],
                )?;
            }
            AudioBackend::PulseAudio => {
                run_checked(
                    "pactl",
                    &["set-sink-volume", "@DEFAULT_SINK@", &format!("{safe_level}%")],
                )?;
            }
            AudioBackend::Alsa => {
                run_checked("amixer", &["set", "Master", &format!("{safe_level}%")])?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct MockSettingsState {
    brightness: Mutex<Option<u8>>,
    volume: Mutex<Option<u8>>,
    brightness_pushes: Mutex<Vec<u8>>,
    volume_pushes: Mutex<Vec<u8>>,
    fail_writes: AtomicBool,
}

/// Scriptable backend for tests: `None` readings fail the read, writes
/// are recorded and can be made to fail wholesale.
#[derive(Clone)]
pub struct MockSettingsBackend {
    state: Arc<MockSettingsState>,
}

impl MockSettingsBackend {
    pub fn new() -> (Self, MockSettingsHandle) {
        let state = Arc::new(MockSettingsState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            MockSettingsHandle { state },
        )
    }
}

impl SettingsBackend for MockSettingsBackend {
    fn brightness(&self) -> Result<u8> {
        self.state
            .brightness
            .lock()
            .map_err(|_| anyhow!("lock"))?
            .ok_or_else(|| anyhow!("no brightness reading"))
    }

    fn set_brightness(&self, level: u8) -> Result<()> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            bail!("brightness write rejected");
        }
        self.state
            .brightness_pushes
            .lock()
            .map_err(|_| anyhow!("lock"))?
            .push(level);
        Ok(())
    }

    fn volume(&self) -> Result<u8> {
        self.state
            .volume
            .lock()
            .map_err(|_| anyhow!("lock"))?
            .ok_or_else(|| anyhow!("no volume reading"))
    }

    fn set_volume(&self, level: u8) -> Result<()> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            bail!("volume write rejected");
        }
        self.state
            .volume_pushes
            .lock()
            .map_err(|_| anyhow!("lock"))?
            .push(level);
        Ok(())
    }
}

pub struct MockSettingsHandle {
    state: Arc<MockSettingsState>,
}

impl MockSettingsHandle {
    pub fn set_brightness_reading(&self, value: Option<u8>) {
        if let Ok(mut guard) = self.state.brightness.lock() {
            *guard = value;
        }
    }

    pub fn set_volume_reading(&self, value: Option<u8>) {
        if let Ok(mut guard) = self.state.volume.lock() {
            *guard = value;
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn brightness_pushes(&self) -> Vec<u8> {
        self.state
            .brightness_pushes
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn volume_pushes(&self) -> Vec<u8> {
        self.state
            .volume_pushes
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug)]
enum SettingsCommand {
    Fetch,
    SetBrightness(u8),
    SetVolume(u8),
    Shutdown,
}

/// Result of one fetch round. A failed read arrives as `None` so the
/// shade can substitute its default for that value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchedSettings {
    pub brightness: Option<u8>,
    pub volume: Option<u8>,
}

/// Owns the backend on a worker thread so reads and writes never stall
/// touch handling. Commands are last-write-wins: every push carries the
/// full target value, so dropped intermediates are harmless.
pub struct SettingsService {
    tx: Sender<SettingsCommand>,
    events: Receiver<FetchedSettings>,
    worker: Option<JoinHandle<()>>,
}

impl SettingsService {
    pub fn spawn() -> Self {
        Self::with_backend(Box::new(DefaultSettingsBackend))
    }

    pub fn with_backend(backend: Box<dyn SettingsBackend>) -> Self {
        let (tx, command_rx) = mpsc::channel();
        let (event_tx, events) = mpsc::channel();
        let worker = thread::spawn(move || worker_loop(backend, command_rx, event_tx));
        Self {
            tx,
            events,
            worker: Some(worker),
        }
    }

    pub fn request_fetch(&self) {
        let _ = self.tx.send(SettingsCommand::Fetch);
    }

    pub fn push_brightness(&self, level: u8) {
        let _ = self.tx.send(SettingsCommand::SetBrightness(level));
    }

    pub fn push_volume(&self, level: u8) {
        let _ = self.tx.send(SettingsCommand::SetVolume(level));
    }

    /// Non-blocking; drained by the UI once per frame.
    pub fn poll_fetched(&self) -> Option<FetchedSettings> {
        self.events.try_recv().ok()
    }
}

impl Drop for SettingsService {
    fn drop(&mut self) {
        let _ = self.tx.send(SettingsCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    backend: Box<dyn SettingsBackend>,
    commands: Receiver<SettingsCommand>,
    events: Sender<FetchedSettings>,
) {
    while let Ok(command) = commands.recv() {
        match command {
            SettingsCommand::Fetch => {
                let brightness = match backend.brightness() {
                    Ok(value) => Some(value),
                    Err(err) => {
                        tracing::warn!(?err, "brightness read failed");
                        None
                    }
                };
                let volume = match backend.volume() {
                    Ok(value) => Some(value),
                    Err(err) => {
                        tracing::warn!(?err, "volume read failed");
                        None
                    }
                };
                if events.send(FetchedSettings { brightness, volume }).is_err() {
                    break;
                }
            }
            SettingsCommand::SetBrightness(level) => {
                if let Err(err) = backend.set_brightness(level) {
                    tracing::warn!(?err, level, "brightness push failed");
                }
            }
            SettingsCommand::SetVolume(level) => {
                if let Err(err) = backend.set_volume(level) {
                    tracing::warn!(?err, level, "volume push failed");
                }
            }
            SettingsCommand::Shutdown => break,
        }
    }
}
