// Fixed-rate drive loop with command and heading watchdogs
// Each tick replays the latest operator command through the drive controller.
// A stale command (or a stale heading for closed-loop modes) clears the `active` flag,
// which zeroes the wheels on that same tick.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::{
    RuntimeConfig, TOPIC_CMD_DRIVE, TOPIC_HEADING, TOPIC_HEALTH, TOPIC_RT_WHEELS, TOPIC_TELEMETRY,
};
use crate::drive::{LatchedMotor, LatestHeading, MecanumDrive, Telemetry, Wheels};
use crate::error::{transport, Result};
use crate::messages::{DriveCommand, HeadingSample, RuntimeHealth, WheelActuation};

type Drive = MecanumDrive<LatchedMotor, LatestHeading, Telemetry>;

pub struct Runtime {
    drive: Drive,
    latest_cmd: Option<DriveCommand>,
    cmd_received_at: Instant,
    heading_received_at: Option<Instant>,
    health: RuntimeHealth,
    cmd_timeout: Duration,
    heading_timeout: Duration,
}

impl Runtime {
    pub fn new(config: &RuntimeConfig) -> Self {
        let mut drive = MecanumDrive::new(
            Wheels::default(),
            LatestHeading::default(),
            Telemetry::new(),
        );
        drive.reset_encoders();

        Self {
            drive,
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            heading_received_at: None,
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
            cmd_timeout: config.cmd_timeout(),
            heading_timeout: config.heading_timeout(),
        }
    }

    /// Process incoming command
    pub fn on_command(&mut self, cmd: DriveCommand, now: Instant) {
        info!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = now;
    }

    /// Process incoming heading sample
    pub fn on_heading(&mut self, sample: HeadingSample, now: Instant) {
        self.drive.sensor_mut().update(sample.degrees);
        self.heading_received_at = Some(now);
    }

    /// Run one control tick and return what was written to the wheels
    pub fn compute_actuation(&mut self, now: Instant) -> WheelActuation {
        self.drive.diagnostics_mut().clear();

        let Some(cmd) = self.latest_cmd else {
            // No command ever received
            self.health = RuntimeHealth::CmdStale;
            self.drive.stop();
            return WheelActuation::default();
        };

        let active = self.watchdog(&cmd, now);
        self.drive.apply(&cmd, active);
        WheelActuation::from(&self.drive.last_powers())
    }

    fn watchdog(&mut self, cmd: &DriveCommand, now: Instant) -> bool {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);
        let heading_fresh = self
            .heading_received_at
            .is_some_and(|at| now.saturating_duration_since(at) <= self.heading_timeout);

        if cmd_age > self.cmd_timeout {
            if self.health != RuntimeHealth::CmdStale {
                warn!("Command stale ({:?} old), stopping robot", cmd_age);
            }
            self.health = RuntimeHealth::CmdStale;
            false
        } else if cmd.needs_heading() && !heading_fresh {
            if self.health != RuntimeHealth::HeadingStale {
                warn!("No fresh heading for {:?}, stopping robot", cmd);
            }
            self.health = RuntimeHealth::HeadingStale;
            false
        } else {
            self.health = RuntimeHealth::Ok;
            true
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn telemetry(&self) -> &Telemetry {
        self.drive.diagnostics()
    }
}

pub async fn run(config: RuntimeConfig) -> Result<()> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await.map_err(transport)?;

    info!("Setting up publishers and subscribers...");
    let sub_cmd = session.declare_subscriber(TOPIC_CMD_DRIVE).await.map_err(transport)?;
    let sub_heading = session.declare_subscriber(TOPIC_HEADING).await.map_err(transport)?;
    let pub_wheels = session.declare_publisher(TOPIC_RT_WHEELS).await.map_err(transport)?;
    let pub_telemetry = session.declare_publisher(TOPIC_TELEMETRY).await.map_err(transport)?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await.map_err(transport)?;

    let mut runtime = Runtime::new(&config);
    let mut tick = interval(config.period());

    info!(
        "Runtime started: {}Hz loop, {}ms command watchdog, {}ms heading watchdog",
        config.loop_hz, config.cmd_timeout_ms, config.heading_timeout_ms
    );
    info!("Subscribed to: {}, {}", TOPIC_CMD_DRIVE, TOPIC_HEADING);
    info!(
        "Publishing to: {}, {}, {}",
        TOPIC_RT_WHEELS, TOPIC_TELEMETRY, TOPIC_HEALTH
    );

    loop {
        tick.tick().await;
        let now = Instant::now();

        // 1. Drain pending heading samples (non-blocking), keep latest
        while let Ok(Some(sample)) = sub_heading.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<HeadingSample>(&payload) {
                Ok(heading) => runtime.on_heading(heading, now),
                Err(e) => warn!("Failed to parse heading: {}", e),
            }
        }

        // 2. Drain pending commands, keep latest
        while let Ok(Some(sample)) = sub_cmd.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<DriveCommand>(&payload) {
                Ok(cmd) => runtime.on_command(cmd, now),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }

        // 3. Run the controller (includes watchdog logic)
        let actuation = runtime.compute_actuation(now);

        // 4. Publish actuation, telemetry, health
        let actuation_json = serde_json::to_string(&actuation)?;
        pub_wheels.put(actuation_json).await.map_err(transport)?;

        let telemetry_json = serde_json::to_string(runtime.telemetry().values())?;
        pub_telemetry.put(telemetry_json).await.map_err(transport)?;

        let health_json = serde_json::to_string(&runtime.health())?;
        pub_health.put(health_json).await.map_err(transport)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide_forward() -> DriveCommand {
        DriveCommand::Slide {
            angle: 0.0,
            speed: 1.0,
            pivot_bias: 0.0,
        }
    }

    fn hold_forward() -> DriveCommand {
        DriveCommand::SlideHold {
            angle: 0.0,
            speed: 1.0,
            target_heading: 0.0,
            heading_gain: 0.02,
        }
    }

    #[test]
    fn test_no_command_stays_stopped() {
        let mut runtime = Runtime::new(&RuntimeConfig::default());
        let actuation = runtime.compute_actuation(Instant::now());
        assert_eq!(actuation, WheelActuation::default());
        assert_eq!(runtime.health(), RuntimeHealth::CmdStale);
    }

    #[test]
    fn test_fresh_command_drives() {
        let mut runtime = Runtime::new(&RuntimeConfig::default());
        let t0 = Instant::now();
        runtime.on_command(slide_forward(), t0);

        let actuation = runtime.compute_actuation(t0 + Duration::from_millis(20));
        assert_eq!(runtime.health(), RuntimeHealth::Ok);
        assert_eq!(actuation.rf, 0.5);
        assert_eq!(actuation.lb, 0.5);
    }

    #[test]
    fn test_stale_command_zeroes() {
        let mut runtime = Runtime::new(&RuntimeConfig::default());
        let t0 = Instant::now();
        runtime.on_command(slide_forward(), t0);
        runtime.compute_actuation(t0);

        let actuation = runtime.compute_actuation(t0 + Duration::from_millis(500));
        assert_eq!(actuation, WheelActuation::default());
        assert_eq!(runtime.health(), RuntimeHealth::CmdStale);
    }

    #[test]
    fn test_closed_loop_waits_for_heading() {
        let mut runtime = Runtime::new(&RuntimeConfig::default());
        let t0 = Instant::now();
        runtime.on_command(hold_forward(), t0);

        let actuation = runtime.compute_actuation(t0);
        assert_eq!(actuation, WheelActuation::default());
        assert_eq!(runtime.health(), RuntimeHealth::HeadingStale);

        runtime.on_heading(HeadingSample { degrees: 0.0 }, t0);
        let actuation = runtime.compute_actuation(t0 + Duration::from_millis(20));
        assert_eq!(runtime.health(), RuntimeHealth::Ok);
        assert_eq!(actuation.rf, 0.5);
    }

    #[test]
    fn test_heading_hold_publishes_telemetry() {
        let mut runtime = Runtime::new(&RuntimeConfig::default());
        let t0 = Instant::now();
        runtime.on_heading(HeadingSample { degrees: -10.0 }, t0);
        runtime.on_command(hold_forward(), t0);

        runtime.compute_actuation(t0);
        assert_eq!(runtime.telemetry().get("slide.heading"), Some(10.0));

        // Stale tick clears the snapshot
        runtime.compute_actuation(t0 + Duration::from_secs(1));
        assert_eq!(runtime.telemetry().get("slide.heading"), None);
    }

    #[test]
    fn test_open_loop_ignores_missing_heading() {
        let mut runtime = Runtime::new(&RuntimeConfig::default());
        let t0 = Instant::now();
        runtime.on_command(slide_forward(), t0);
        runtime.compute_actuation(t0);
        assert_eq!(runtime.health(), RuntimeHealth::Ok);
    }
}
