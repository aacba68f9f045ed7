use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead};
use std::net::Shutdown;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use teleop::config::DEFAULT_ADDRESS;
use teleop::drive::commands::ServoCommand;
use teleop::drive::intent::DEFAULT_PROGRAM;
use teleop::media::FnObserver;
use teleop::{
    CameraSession, ClientConfig, ControllerClient, DisplayHandle, DriveIntent, Intent, Key,
    WheelSpeeds, wheel_speeds,
};

#[derive(Parser)]
#[command(
    name = "txt-teleop",
    about = "Operator console for TXT controller robots"
)]
struct Args {
    /// Controller address (host:port)
    #[arg(long, short, default_value = DEFAULT_ADDRESS)]
    address: String,

    /// API key sent as X-API-KEY
    #[arg(long, env = "TXT_API_KEY")]
    api_key: Option<String>,

    /// Controller index for motor and servo commands
    #[arg(long, default_value_t = 0)]
    controller: u32,

    /// Deadline for each control request, in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the connection and print controller details
    Info,
    /// Receive the camera feed
    Stream {
        /// Write `latest.<ext>` here on every frame
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Also keep every frame as `frame-NNNNNN.<ext>`
        #[arg(long, requires = "dir")]
        numbered: bool,
        /// Stop after this many frames (default: until Enter)
        #[arg(long)]
        frames: Option<u64>,
        #[arg(long, default_value_t = 320)]
        width: u32,
        #[arg(long, default_value_t = 240)]
        height: u32,
        #[arg(long, default_value_t = 15)]
        fps: u32,
        /// Rotate the image by 180 degrees
        #[arg(long)]
        rotate: bool,
    },
    /// Drive with a fixed intent, then stop
    Drive {
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        tx: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        ty: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rot: f64,
        /// How long to hold the intent before stopping
        #[arg(long, default_value_t = 500)]
        hold_ms: u64,
    },
    /// Move a servo
    Servo {
        #[arg(long, default_value_t = 1)]
        id: u32,
        #[arg(long, allow_negative_numbers = true)]
        value: i32,
    },
    /// Print counter values, optionally resetting one first
    Counters {
        #[arg(long)]
        reset: Option<u32>,
    },
    /// Follow a message stream until Enter
    Messages {
        #[arg(value_enum, default_value_t = Feed::Controller)]
        feed: Feed,
    },
    /// Interactive control: camera in the background, key transitions on
    /// stdin (`+w`, `-w`, `blur`, `quit`)
    Teleop {
        /// Write `latest.<ext>` here on every frame
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Program started by the Space key
        #[arg(long, default_value = DEFAULT_PROGRAM)]
        program: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Feed {
    /// Image-recognition results
    Camera,
    /// Program console output
    Controller,
    /// Counter states
    Counters,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = ClientConfig::new(&args.address);
    config.api_key = args.api_key.clone();
    config.controller_id = args.controller;
    config.command_timeout = Duration::from_millis(args.timeout_ms);
    config.connect_timeout = Duration::from_millis(args.timeout_ms);
    let client = Arc::new(ControllerClient::new(config));

    let result = match args.command {
        Command::Info => info(&client),
        Command::Stream {
            dir,
            numbered,
            frames,
            width,
            height,
            fps,
            rotate,
        } => {
            let mut config = client.config().clone();
            config.camera.width = width;
            config.camera.height = height;
            config.camera.fps = fps;
            config.camera.rotate = rotate;
            stream(Arc::new(ControllerClient::new(config)), dir, numbered, frames)
        }
        Command::Drive { tx, ty, rot, hold_ms } => {
            drive(&client, Intent::new(tx, ty, rot), Duration::from_millis(hold_ms))
        }
        Command::Servo { id, value } => client
            .set_servo(args.controller, id, &ServoCommand::position(id, value))
            .map(|()| println!("servo {id} -> {value}")),
        Command::Counters { reset } => counters(&client, reset),
        Command::Messages { feed } => messages(&client, feed),
        Command::Teleop { dir, program } => teleop_loop(client, dir, &program),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn info(client: &ControllerClient) -> teleop::Result<()> {
    let id = client.config().controller_id;
    client.init_controller(id)?;
    println!("connected to {} (controller {id})", client.config().host());

    let info = client.controller(id)?;
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("  name:          {}", field(&info.name));
    println!("  serial:        {}", field(&info.serial_number));
    println!("  firmware:      {}", field(&info.firmware));
    println!("  version:       {}", field(&info.version));
    println!("  api version:   {}", field(&info.api_version));

    match client.discover() {
        Ok(controllers) => println!("  discovered:    {}", controllers.len()),
        Err(e) => tracing::warn!(error = %e, "discovery failed"),
    }
    Ok(())
}

fn counters(client: &ControllerClient, reset: Option<u32>) -> teleop::Result<()> {
    let id = client.config().controller_id;
    if let Some(counter) = reset {
        client.reset_counter(id, counter)?;
        println!("counter {counter} reset");
    }
    for counter in client.counters(id)? {
        println!(
            "  {:<6} count={:<8} state={}",
            counter.name.as_deref().unwrap_or("-"),
            counter.count.unwrap_or_default(),
            counter.state.unwrap_or_default()
        );
    }
    Ok(())
}

fn messages(client: &ControllerClient, feed: Feed) -> teleop::Result<()> {
    let stream = match feed {
        Feed::Camera => client.camera_messages()?,
        Feed::Controller => client.controller_messages()?,
        Feed::Counters => client.counter_messages(client.config().controller_id)?,
    };
    let socket = stream.shutdown_handle()?;
    let stop = enter_pressed();
    thread::spawn(move || {
        if stop.recv().is_ok() {
            let _ = socket.shutdown(Shutdown::Both);
        }
    });
    println!("following messages, press Enter to stop");

    for message in stream {
        match message {
            Ok(message) => println!("{message}"),
            Err(e) => {
                tracing::debug!(error = %e, "message stream ended");
                break;
            }
        }
    }
    Ok(())
}

fn extension(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    }
}

fn save(dir: &Path, name: &str, handle: &DisplayHandle) -> io::Result<()> {
    let Some(bytes) = handle.bytes() else {
        return Ok(());
    };
    let media_type = handle.media_type().unwrap_or_default();
    let path = dir.join(format!("{name}.{}", extension(&media_type)));
    std::fs::write(path, &bytes)
}

/// Resolves once a line (or EOF) arrives on stdin.
fn enter_pressed() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        let _ = tx.send(());
    });
    rx
}

fn stream(
    client: Arc<ControllerClient>,
    dir: Option<PathBuf>,
    numbered: bool,
    limit: Option<u64>,
) -> teleop::Result<()> {
    if let Some(dir) = &dir {
        std::fs::create_dir_all(dir)?;
    }
    client.init_controller(client.config().controller_id)?;

    let mut session = CameraSession::new(client.clone());
    let (tx, rx) = mpsc::channel::<DisplayHandle>();
    session.start(Box::new(tx))?;
    println!("streaming (session {}), press Enter to stop", session.tag());

    let stop = enter_pressed();
    let mut received = 0u64;
    let mut window = (Instant::now(), 0u64);
    // Holds the frame on "screen" until the next one supersedes it.
    let mut on_screen: Option<DisplayHandle> = None;

    loop {
        if stop.try_recv().is_ok() {
            break;
        }
        let handle = match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(handle) => handle,
            Err(RecvTimeoutError::Timeout) if session.is_running() => continue,
            Err(_) => {
                println!("feed stopped: {:?}", session.state());
                break;
            }
        };

        received += 1;
        window.1 += 1;
        if let Some(dir) = &dir {
            save(dir, "latest", &handle)?;
            if numbered {
                save(dir, &format!("frame-{:06}", handle.seq()), &handle)?;
            }
        }
        if window.0.elapsed() >= Duration::from_secs(1) {
            let fps = window.1 as f64 / window.0.elapsed().as_secs_f64();
            tracing::info!(fps = %format!("{fps:.1}"), received, "camera");
            window = (Instant::now(), 0);
        }
        if let Some(previous) = on_screen.replace(handle) {
            previous.release();
        }

        if limit.is_some_and(|limit| received >= limit) {
            break;
        }
    }

    drop(on_screen);
    session.stop();
    if let Err(e) = client.stop_camera() {
        tracing::warn!(error = %e, "camera stop request failed");
    }
    println!("received {received} frames");
    Ok(())
}

fn drive(client: &ControllerClient, intent: Intent, hold: Duration) -> teleop::Result<()> {
    let speeds = wheel_speeds(intent, teleop::drive::DEFAULT_SCALE);
    let delivered = client.drive(&speeds);
    println!("wheels {:?} ({delivered}/4 delivered)", speeds.rounded());

    thread::sleep(hold);
    client.drive(&WheelSpeeds::default());
    println!("stopped ({} commands dropped)", client.dropped_commands());
    Ok(())
}

fn teleop_loop(
    client: Arc<ControllerClient>,
    dir: Option<PathBuf>,
    program: &str,
) -> teleop::Result<()> {
    if let Some(dir) = &dir {
        std::fs::create_dir_all(dir)?;
    }
    client.init_controller(client.config().controller_id)?;

    let mut session = CameraSession::new(client.clone());
    let mut on_screen: Option<DisplayHandle> = None;
    session.start(Box::new(FnObserver(move |handle: DisplayHandle| {
        if let Some(dir) = &dir
            && let Err(e) = save(dir, "latest", &handle)
        {
            tracing::warn!(error = %e, "failed to save frame");
        }
        if let Some(previous) = on_screen.replace(handle) {
            previous.release();
        }
    })))?;

    println!("keys: +<key> / -<key> (w a s d q e Enter Space), blur, quit");
    let mut keys = DriveIntent::new().with_program(program);

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        let actions = match line {
            "quit" => break,
            "blur" => keys.blur(),
            "" => continue,
            _ => {
                let (down, name) = if let Some(name) = line.strip_prefix('+') {
                    (true, name)
                } else if let Some(name) = line.strip_prefix('-') {
                    (false, name)
                } else {
                    eprintln!("expected +<key>, -<key>, blur or quit");
                    continue;
                };
                let key = match name.parse::<Key>() {
                    Ok(key) => key,
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                };
                if down { keys.key_down(key) } else { keys.key_up(key) }
            }
        };

        for action in &actions {
            if let Err(e) = client.apply(action) {
                tracing::warn!(?action, error = %e, "command failed");
            }
        }
        if !session.is_running() {
            println!("feed stopped: {:?}", session.state());
        }
    }

    for action in keys.blur() {
        let _ = client.apply(&action);
    }
    session.stop();
    if let Err(e) = client.stop_camera() {
        tracing::warn!(error = %e, "camera stop request failed");
    }
    Ok(())
}
