//! Interactive session runner.
//!
//! Drives a [`SessionController`] from tokio's clock: a 100 ms poll feeds
//! `advance_to`, stdin lines become commands, Ctrl-C stops the session.
//! Cue output goes through an unbounded channel to a printer task, so the
//! timeline never waits on the terminal.

use std::time::Duration;

use clap::Args;
use intervalrun_core::{
    AudioBackend, Command, Config, CueError, CueSettings, Event, Haptics, KeepAwake, Phase, Plan,
    Platform, SessionController, SessionInputs, SessionState, SoundAsset, SoundId, Status,
    VibrationPattern,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::{clock, DurationArgs};

const POLL_MS: u64 = 100;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub durations: DurationArgs,
    /// Suppress sound and vibration output
    #[arg(long)]
    pub silent: bool,
    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Requests forwarded from the session to the printer task.
#[derive(Debug)]
enum Output {
    Sound { asset: SoundAsset, looping: bool },
    Release(SoundId),
    Vibrate(VibrationPattern),
    KeepAwake(bool),
}

/// Platform that renders cues as terminal bells and text.
struct TerminalPlatform {
    tx: mpsc::UnboundedSender<Output>,
    next_id: u64,
}

impl TerminalPlatform {
    fn new(tx: mpsc::UnboundedSender<Output>) -> Self {
        Self { tx, next_id: 0 }
    }

    fn send(&self, output: Output) -> Result<(), CueError> {
        self.tx
            .send(output)
            .map_err(|_| CueError::Unavailable("terminal output closed".into()))
    }
}

impl AudioBackend for TerminalPlatform {
    fn play(&mut self, asset: SoundAsset, looping: bool) -> Result<SoundId, CueError> {
        self.send(Output::Sound { asset, looping })?;
        let id = SoundId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn release(&mut self, id: SoundId) -> Result<(), CueError> {
        self.send(Output::Release(id))
    }
}

impl Haptics for TerminalPlatform {
    fn vibrate(&mut self, pattern: VibrationPattern) -> Result<(), CueError> {
        self.send(Output::Vibrate(pattern))
    }
}

impl KeepAwake for TerminalPlatform {
    fn set_keep_awake(&mut self, on: bool) {
        if self.send(Output::KeepAwake(on)).is_err() {
            warn!(on, "keep-awake request dropped");
        }
    }
}

/// Platform for `--silent`: accepts every request and does nothing.
#[derive(Debug, Default)]
struct QuietPlatform {
    next_id: u64,
}

impl AudioBackend for QuietPlatform {
    fn play(&mut self, _asset: SoundAsset, _looping: bool) -> Result<SoundId, CueError> {
        let id = SoundId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn release(&mut self, _id: SoundId) -> Result<(), CueError> {
        Ok(())
    }
}

impl Haptics for QuietPlatform {
    fn vibrate(&mut self, _pattern: VibrationPattern) -> Result<(), CueError> {
        Ok(())
    }
}

impl KeepAwake for QuietPlatform {
    fn set_keep_awake(&mut self, _on: bool) {}
}

fn silent_controller() -> SessionController<QuietPlatform> {
    let muted = CueSettings {
        sound: false,
        vibration: false,
    };
    SessionController::new(QuietPlatform::default(), muted)
}

async fn print_outputs(mut rx: mpsc::UnboundedReceiver<Output>, json: bool) {
    while let Some(output) = rx.recv().await {
        match output {
            Output::Sound { asset, looping: false } => {
                if json {
                    println!("{}", serde_json::json!({ "type": "Sound", "asset": asset }));
                } else {
                    eprintln!("\x07  ♪ {}", asset.file_name());
                }
            }
            Output::Sound { asset, looping: true } => {
                debug!(asset = asset.file_name(), "keep-alive audio started");
            }
            Output::Release(id) => debug!(sound = id.0, "sound released"),
            Output::Vibrate(pattern) => {
                if json {
                    println!(
                        "{}",
                        serde_json::json!({ "type": "Vibrate", "pattern": pattern.timings_ms() })
                    );
                } else {
                    eprintln!("  ~ buzz {:?}", pattern.timings_ms());
                }
            }
            Output::KeepAwake(on) => debug!(on, "keep awake"),
        }
    }
}

/// How events are shown.
struct View {
    json: bool,
    color: bool,
    show_elapsed: bool,
}

impl View {
    /// Green for running, yellow for walking, red when paused or stopped.
    fn paint(&self, text: &str, state: &SessionState, phase: Phase) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match (state.status, phase) {
            (Status::Paused, _) | (Status::Idle | Status::Done, _) => "31",
            (_, Phase::Run) => "32",
            (_, Phase::Walk) => "33",
            _ => "36",
        };
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn render(&self, events: &[Event], state: &SessionState, plan: Option<&Plan>) {
        for event in events {
            if self.json {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "failed to serialize event"),
                }
                continue;
            }
            match event {
                Event::SessionStarted {
                    segments,
                    total_secs,
                    ..
                } => println!("{segments} segments, {} total", clock(*total_secs)),
                Event::PrepStep { step, .. } => {
                    let label = step.phase().label();
                    println!("{}", self.paint(label, state, step.phase()));
                }
                Event::SessionBegan {
                    kind,
                    duration_secs,
                    ..
                } => {
                    let line = format!("{} {}", kind.label(), clock(*duration_secs));
                    println!("{}", self.paint(&line, state, (*kind).into()));
                }
                Event::SegmentStarted {
                    segment_index,
                    kind,
                    duration_secs,
                    ..
                } => {
                    let total = plan.map(|p| p.len()).unwrap_or(0);
                    let line = format!(
                        "{} {}  ({}/{})",
                        kind.label(),
                        clock(*duration_secs),
                        segment_index + 1,
                        total
                    );
                    println!("{}", self.paint(&line, state, (*kind).into()));
                }
                Event::Ticked {
                    segment_index,
                    seconds_left,
                    elapsed_total_secs,
                    ..
                } => {
                    let phase = plan
                        .and_then(|p| p.get(*segment_index))
                        .map(|s| Phase::from(s.kind))
                        .unwrap_or(state.phase);
                    let mut line = format!("{:<5} {}", phase.label(), clock(*seconds_left));
                    if self.show_elapsed {
                        line.push_str(&format!("   elapsed {}", clock(*elapsed_total_secs)));
                    }
                    println!("{}", self.paint(&line, state, phase));
                }
                Event::CountdownWarning { .. } => {}
                Event::SessionPaused { .. } => {
                    println!("{}", self.paint("paused (p to resume)", state, state.phase));
                }
                Event::SessionResumed { .. } => println!("resumed"),
                Event::SessionCompleted {
                    elapsed_total_secs,
                    ..
                } => println!("Done. elapsed {}", clock(*elapsed_total_secs)),
                Event::SessionReset { .. } => println!("stopped"),
                Event::LockToggled { locked, .. } => {
                    println!("{}", if *locked { "locked" } else { "unlocked" });
                }
                Event::CommandRejected { command, reason, .. } => {
                    println!("{command} ignored: {reason}");
                }
                Event::StateSnapshot { .. } => {}
            }
        }
    }
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "p" | "pause" | "resume" => Some(Command::TogglePause),
        "s" | "stop" | "q" | "quit" => Some(Command::Stop),
        "l" | "lock" | "unlock" => Some(Command::ToggleLock),
        _ => None,
    }
}

async fn drive<P: Platform>(
    mut controller: SessionController<P>,
    inputs: SessionInputs,
    view: &View,
) -> Result<SessionState, Box<dyn std::error::Error>> {
    let origin = Instant::now();
    let now_ms = move || origin.elapsed().as_millis() as u64;

    let events = controller.start(inputs, now_ms())?;
    view.render(&events, controller.state(), controller.plan());
    if !view.json {
        println!("keys: p pause/resume, s stop, l lock (then Enter)");
    }

    let mut poll = tokio::time::interval(Duration::from_millis(POLL_MS));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let events = controller.advance_to(now_ms());
                view.render(&events, controller.state(), controller.plan());
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(command) => {
                        let events = controller.handle(command, now_ms())?;
                        view.render(&events, controller.state(), controller.plan());
                    }
                    None if line.trim().is_empty() => {}
                    None => eprintln!("unknown command: {}", line.trim()),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin unreadable, keyboard commands disabled");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => {
                let event = controller.stop();
                view.render(&[event], controller.state(), controller.plan());
                break;
            }
        }
        if matches!(controller.state().status, Status::Done | Status::Idle) {
            break;
        }
    }

    if view.json {
        view.render(&[controller.snapshot()], controller.state(), controller.plan());
    }
    Ok(*controller.state())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let inputs = args.durations.resolve(&config)?;
    let settings = config.cue_settings();
    let view = View {
        json: args.json,
        color: config.display.color && !args.json,
        show_elapsed: config.display.show_elapsed,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async {
        if args.silent {
            drive(silent_controller(), inputs, &view).await
        } else {
            let (tx, rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(print_outputs(rx, view.json));
            let controller = SessionController::new(TerminalPlatform::new(tx), settings);
            let result = drive(controller, inputs, &view).await;
            if let Err(e) = printer.await {
                warn!(error = %e, "cue printer task failed");
            }
            result
        }
    });
    // A pending stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_background();

    let state = result?;
    debug!(?state, "session finished");
    Ok(())
}
