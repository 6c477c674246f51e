// Keyboard teleop: WASD slide, Z/X pivot bias, J/L snap heading, Space cancel snap,
// H heading hold, R/F speed, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use mecanum_drive_runtime::config::{
    DEFAULT_HEADING_GAIN, DEFAULT_PIVOT_GAIN, DEFAULT_PIVOT_MAX_SPEED, DEFAULT_PIVOT_MIN_SPEED,
    TOPIC_CMD_DRIVE,
};
use mecanum_drive_runtime::drive::kinematics::step_heading;
use mecanum_drive_runtime::messages::DriveCommand;
use std::time::{Duration, Instant};
use tracing::info;

const SPEEDS: [f64; 3] = [0.25, 0.5, 1.0]; // stick magnitude
const PIVOT_BIAS: [f64; 3] = [0.15, 0.3, 0.6];
const SNAP_STEP: f64 = 90.0; // degrees per J/L press
const INPUT_TIMEOUT_MS: u64 = 100; // Reset motion after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_DRIVE).await?;

    info!(
        "Controls: WASD=slide, Z/X=pivot, J/L=snap heading, Space=cancel snap, \
         H=heading hold, R/F=speed, Q=quit"
    );
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;
    let mut hold_heading = false;
    let mut target_heading = 0.0;

    // Persistent motion state
    let mut slide: Option<f64> = None; // slide angle, degrees
    let mut pivot_bias = 0.0;
    let mut snapping = false;
    let mut last_movement_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Slide direction, 0 = forward, clockwise-positive
                    KeyCode::Char('w') if pressed => {
                        slide = Some(0.0);
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        slide = Some(90.0);
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        slide = Some(180.0);
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        slide = Some(-90.0);
                        last_movement_input = Instant::now();
                    }

                    // Open-loop rotation
                    KeyCode::Char('z') if pressed => {
                        pivot_bias = -PIVOT_BIAS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('x') if pressed => {
                        pivot_bias = PIVOT_BIAS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    // Closed-loop heading
                    KeyCode::Char('j') if pressed => {
                        target_heading = step_heading(target_heading, -SNAP_STEP);
                        snapping = true;
                        info!("Target heading: {}", target_heading);
                    }
                    KeyCode::Char('l') if pressed => {
                        target_heading = step_heading(target_heading, SNAP_STEP);
                        snapping = true;
                        info!("Target heading: {}", target_heading);
                    }
                    KeyCode::Char(' ') if pressed => {
                        snapping = false;
                    }
                    KeyCode::Char('h') if pressed => {
                        hold_heading = !hold_heading;
                        info!("Heading hold: {}", if hold_heading { "ON" } else { "OFF" });
                    }

                    // Speed control
                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(2);
                        print_speed(speed_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        print_speed(speed_idx);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Reset motion if no movement input for INPUT_TIMEOUT_MS
        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            slide = None;
            pivot_bias = 0.0;
        }
        if slide.is_some() || pivot_bias != 0.0 {
            snapping = false;
        }

        let cmd = match slide {
            Some(angle) if hold_heading => DriveCommand::SlideHold {
                angle,
                speed: SPEEDS[speed_idx],
                target_heading,
                heading_gain: DEFAULT_HEADING_GAIN,
            },
            _ if snapping => DriveCommand::Pivot {
                desired_angle: target_heading,
                gain: DEFAULT_PIVOT_GAIN,
                max_speed: DEFAULT_PIVOT_MAX_SPEED,
                min_speed: DEFAULT_PIVOT_MIN_SPEED,
            },
            Some(angle) => DriveCommand::Slide {
                angle,
                speed: SPEEDS[speed_idx],
                pivot_bias,
            },
            None if pivot_bias != 0.0 => DriveCommand::Slide {
                angle: 0.0,
                speed: 0.0,
                pivot_bias,
            },
            None => DriveCommand::Stop,
        };

        // Always publish at ~50Hz
        publisher.put(serde_json::to_string(&cmd)?).await?;
    }

    Ok(())
}

fn print_speed(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Speed: {}", label);
}
