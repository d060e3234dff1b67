use std::ffi::OsString;
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use unreal_config::{AssetRoute, ClockConfig, ConfigError, LoggingConfig, TlsConfig};
use unreal_control::{ControlServer, ControlState};
use unreal_core::command::CommandQueue;
use unreal_core::layout::AxisOffset;
use unreal_core::snapshot::SnapshotCell;
use unreal_core::time::real_now;
use unreal_core::{ClockTime, Color, StopBehavior};
use unreal_engine::{run_clock, FrameController};
use unreal_render::{BitmapFont, TerminalBackend, WindowMode};
use unreal_telemetry::{ClockLogger, LogSink, MetricsRecorder};

/// Arguments used when the program is started without any.
const DEMO_ARGS: [&str; 11] = [
    "-d", "1", "-t", "12:59:57", "-T", "12:59:59", "-H", "-S", "2", "-c", "grey",
];

#[derive(Parser, Debug, Clone)]
#[command(name = "unreal-clock", version, about)]
pub struct Cli {
    /// Simulated start time, HH:MM[:SS[.ffffff]] or a full timestamp (default: now)
    #[arg(short = 't', long = "time", value_name = "TIME")]
    pub time: Option<ClockTime>,

    /// Time at which the simulated clock stops; repeatable
    #[arg(short = 'T', long = "stoptime", value_name = "TIME")]
    pub stop_times: Vec<ClockTime>,

    /// Draw inline instead of on the alternate screen
    #[arg(short = 'w', long)]
    pub window: bool,

    /// Display index
    #[arg(short = 'd', long)]
    pub display: Option<u32>,

    /// Font file or built-in font name (block, slim, segment)
    #[arg(short = 'f', long)]
    pub font: Option<String>,

    #[arg(short = 'b', long)]
    pub bold: bool,

    #[arg(short = 'i', long)]
    pub italic: bool,

    #[arg(short = 'u', long)]
    pub underline: bool,

    #[arg(short = 's', long)]
    pub strike: bool,

    #[arg(short = 'a', long)]
    pub antialias: bool,

    /// Foreground color name or #rrggbb
    #[arg(short = 'c', long)]
    pub color: Option<Color>,

    /// Background color name or #rrggbb
    #[arg(short = 'g', long)]
    pub background: Option<Color>,

    /// Number of fractional-second digits
    #[arg(short = 'S', long, value_parser = clap::value_parser!(u8).range(0..=6))]
    pub subseconds: Option<u8>,

    /// 12-hour clock
    #[arg(short = 'H', long)]
    pub halfday: bool,

    /// Keep the leading zero of the hour
    #[arg(short = 'z', long = "zeropadded")]
    pub zero_padded: bool,

    /// Horizontal colon offset, pixels (3) or fraction of the colon width (0.25)
    #[arg(long, allow_hyphen_values = true)]
    pub colonx: Option<AxisOffset>,

    /// Vertical colon offset, pixels or fraction of the line height
    #[arg(long, allow_hyphen_values = true)]
    pub colony: Option<AxisOffset>,

    /// Start with the simulated clock paused
    #[arg(long)]
    pub paused: bool,

    /// Keep running after a stop time instead of holding there
    #[arg(long)]
    pub pass_through: bool,

    /// Initial speed multiplier
    #[arg(long, allow_hyphen_values = true)]
    pub speed: Option<f64>,

    /// Factor applied per speed step
    #[arg(long)]
    pub speed_ratio: Option<f64>,

    #[arg(long)]
    pub max_fps: Option<u32>,

    /// Enable the HTTP control channel on this address
    #[arg(long, value_name = "ADDR")]
    pub control: Option<SocketAddr>,

    /// Static file for the control channel, [path=]file; repeatable
    #[arg(long = "asset", value_name = "ASSET")]
    pub assets: Vec<AssetRoute>,

    /// Title of the control channel's 404 page
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    #[arg(long, requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,

    /// Require client certificates signed by these CAs
    #[arg(long, requires = "tls_cert")]
    pub tls_ca: Option<PathBuf>,

    /// Passphrase of an encrypted PKCS#8 key
    #[arg(long, requires = "tls_key")]
    pub tls_passphrase: Option<String>,

    /// Configuration file replacing config/unreal.yaml
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Substitutes the demo invocation when only the program name is given.
pub fn with_demo_defaults<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    let mut args: Vec<OsString> = args.into_iter().collect();
    if args.len() <= 1 {
        args.extend(DEMO_ARGS.iter().map(OsString::from));
    }
    args
}

impl Cli {
    /// Loads the configured layers and applies the flags on top.
    pub fn load_config(&self) -> Result<ClockConfig> {
        let mut config = match &self.config {
            Some(path) => ClockConfig::load_from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => ClockConfig::load().context("Failed to load configuration")?,
        };
        self.apply(&mut config);
        validator::Validate::validate(&config)
            .map_err(ConfigError::from)
            .context("Invalid options")?;
        Ok(config)
    }

    /// Overrides `config` with every flag that was given.
    pub fn apply(&self, config: &mut ClockConfig) {
        let display = &mut config.display;
        let font = &mut display.font;
        if self.font.is_some() {
            font.name = self.font.clone();
        }
        font.bold |= self.bold;
        font.italic |= self.italic;
        font.underline |= self.underline;
        font.strikethrough |= self.strike;
        display.antialias |= self.antialias;
        display.halfday |= self.halfday;
        display.zero_padded |= self.zero_padded;
        if let Some(color) = self.color {
            display.color = color;
        }
        if let Some(background) = self.background {
            display.background = background;
        }
        if let Some(subseconds) = self.subseconds {
            display.subseconds = subseconds;
        }
        if let Some(x) = self.colonx {
            display.colon_offset.x = x;
        }
        if let Some(y) = self.colony {
            display.colon_offset.y = y;
        }

        let window = &mut config.window;
        if self.window {
            window.fullscreen = false;
        }
        if let Some(index) = self.display {
            window.display = index;
        }
        if let Some(max_fps) = self.max_fps {
            window.max_fps = max_fps;
        }

        let simulation = &mut config.simulation;
        if self.time.is_some() {
            simulation.start = self.time;
        }
        simulation.stop_times.extend(self.stop_times.iter().copied());
        simulation.start_paused |= self.paused;
        if self.pass_through {
            simulation.stop_behavior = StopBehavior::PassThrough;
        }
        if let Some(speed) = self.speed {
            simulation.speed = speed;
        }
        if let Some(ratio) = self.speed_ratio {
            simulation.speed_ratio = ratio;
        }

        let control = &mut config.control;
        if let Some(bind) = self.control {
            control.enabled = true;
            control.bind = bind;
        }
        control.assets.extend(self.assets.iter().cloned());
        if let Some(title) = &self.title {
            control.title = title.clone();
        }
        if let (Some(cert), Some(key)) = (&self.tls_cert, &self.tls_key) {
            control.tls = Some(TlsConfig {
                cert: cert.clone(),
                key: key.clone(),
                client_ca: self.tls_ca.clone(),
                key_passphrase: self.tls_passphrase.clone(),
            });
        }

        if self.log_file.is_some() {
            config.logging.file = self.log_file.clone();
        }
    }
}

/// Where logs go while the terminal backend draws on the controlling tty.
fn log_sink(logging: &LoggingConfig, stderr: &impl IsTerminal) -> LogSink {
    LogSink::for_terminal(logging, stderr.is_terminal())
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    let sink = log_sink(&config.logging, &std::io::stderr());
    ClockLogger::init(&config.logging, &sink).context("Failed to initialise logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting unreal-time clock");

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install signal handler")?;

    let metrics = MetricsRecorder::new().context("Failed to create metrics")?;
    let commands = CommandQueue::new(config.control.queue_capacity);
    let snapshots = SnapshotCell::new();

    let mut control = None;
    if config.control.enabled {
        let state = ControlState::new(
            config.control.title.clone(),
            commands.clone(),
            snapshots.clone(),
            metrics.clone(),
        );
        let mut server = ControlServer::new(config.control.clone(), state);
        server.run().context("Failed to start control server")?;
        control = Some(server);
    }

    let simulator = config
        .simulation
        .simulator(real_now())
        .context("Invalid simulation settings")?;
    let mut controller = FrameController::new(
        simulator,
        config.display.clone(),
        config.simulation.speed_ratio,
        commands,
        snapshots,
        metrics,
    );

    let font = BitmapFont::resolve(&config.display.font);
    let mode = if config.window.fullscreen {
        WindowMode::Fullscreen
    } else {
        WindowMode::Windowed
    };

    // The backend is dropped inside this block so the terminal is restored
    // before any error is reported.
    let result = TerminalBackend::open(mode, config.window.display, font, config.display.antialias)
        .context("Failed to open terminal")
        .and_then(|mut backend| {
            run_clock(&mut backend, &mut controller, &shutdown, config.window.max_fps)
                .context("Clock loop failed")
        });

    if let Some(mut server) = control {
        server.stop();
    }
    result?;
    info!("Clock stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("unreal-clock").chain(args.iter().copied())).unwrap()
    }

    fn configured(args: &[&str]) -> ClockConfig {
        let mut config = ClockConfig::default();
        parse(args).apply(&mut config);
        config
    }

    #[test]
    fn no_arguments_run_the_demo() {
        let args = with_demo_defaults([OsString::from("unreal-clock")]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.display, Some(1));
        assert_eq!(cli.subseconds, Some(2));
        assert!(cli.halfday);
        assert_eq!(cli.stop_times.len(), 1);

        let args = with_demo_defaults(["unreal-clock", "-w"].map(OsString::from));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn flags_override_display_options() {
        let config = configured(&[
            "-f", "slim", "-b", "-u", "-s", "-c", "#102030", "-g", "white", "-S", "0", "-z",
            "--colonx", "-2", "--colony", "0.25",
        ]);
        let display = &config.display;
        assert_eq!(display.font.name.as_deref(), Some("slim"));
        assert!(display.font.bold && display.font.underline && display.font.strikethrough);
        assert!(!display.font.italic);
        assert_eq!(display.color, Color::rgb(0x10, 0x20, 0x30));
        assert_eq!(display.background, Color::WHITE);
        assert_eq!(display.subseconds, 0);
        assert!(display.zero_padded);
        assert_eq!(display.colon_offset.x, AxisOffset::Absolute(-2));
        assert_eq!(display.colon_offset.y, AxisOffset::Relative(0.25));
    }

    #[test]
    fn flags_override_simulation() {
        let config = configured(&[
            "-t", "12:59:57", "-T", "12:59:59", "-T", "13:00:30", "--paused", "--pass-through",
            "--speed", "-2", "--speed-ratio", "2",
        ]);
        let simulation = &config.simulation;
        assert_eq!(simulation.start, Some("12:59:57".parse().unwrap()));
        assert_eq!(simulation.stop_times.len(), 2);
        assert!(simulation.start_paused);
        assert_eq!(simulation.stop_behavior, StopBehavior::PassThrough);
        assert_eq!(simulation.speed, -2.0);
        assert_eq!(simulation.speed_ratio, 2.0);
    }

    #[test]
    fn control_flag_enables_the_server() {
        let config = configured(&[
            "--control", "0.0.0.0:9000", "--asset", "=index.html", "--asset", "app.js",
            "--title", "Clock",
        ]);
        let control = &config.control;
        assert!(control.enabled);
        assert_eq!(control.bind.port(), 9000);
        assert_eq!(control.assets[0].route_path(), "/");
        assert_eq!(control.assets[1].route_path(), "/app.js");
        assert_eq!(control.title, "Clock");
        assert!(control.tls.is_none());
    }

    #[test]
    fn tls_flags_travel_together() {
        let config = configured(&[
            "--tls-cert",
            "c.pem",
            "--tls-key",
            "k.pem",
            "--tls-ca",
            "ca.pem",
            "--tls-passphrase",
            "hunter2",
        ]);
        let tls = config.control.tls.unwrap();
        assert_eq!(tls.client_ca, Some(PathBuf::from("ca.pem")));
        assert_eq!(tls.key_passphrase.as_deref(), Some("hunter2"));

        let lonely = Cli::try_parse_from(["unreal-clock", "--tls-cert", "c.pem"]);
        assert!(lonely.is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        for args in [
            ["unreal-clock", "-S", "7"],
            ["unreal-clock", "-t", "25:00"],
            ["unreal-clock", "-c", "chartreuse-ish"],
            ["unreal-clock", "--colonx", "abc"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn window_flag_disables_fullscreen() {
        let config = configured(&["-w", "--max-fps", "30", "--log-file", "clock.log"]);
        assert!(!config.window.fullscreen);
        assert_eq!(config.window.max_fps, 30);
        assert_eq!(config.logging.file, Some(PathBuf::from("clock.log")));
    }

    #[test]
    fn logs_never_share_the_clock_terminal() {
        let redirected = tempfile::tempfile().unwrap();
        let config = configured(&[]);
        assert_eq!(log_sink(&config.logging, &redirected), LogSink::Stderr);

        let config = configured(&["--log-file", "clock.log"]);
        assert_eq!(
            log_sink(&config.logging, &redirected),
            LogSink::File(PathBuf::from("clock.log"))
        );

        if std::io::stderr().is_terminal() {
            let default = ClockConfig::default();
            assert_eq!(log_sink(&default.logging, &std::io::stderr()), LogSink::Discard);
        }
    }
}
