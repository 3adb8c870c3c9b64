//! framegrab - capture a window, monitor, or screen region and view it live.

#[cfg(windows)]
mod cli {
    use std::path::PathBuf;

    use anyhow::Result;
    use clap::Parser;
    use log::info;

    use framegrab::capture::enumerate_monitors;
    use framegrab::session::{CaptureConfig, CaptureSession};
    use framegrab::viewer;

    #[derive(Parser, Debug)]
    #[command(name = "framegrab")]
    #[command(version)]
    #[command(about = "Capture a window, monitor, or screen region", long_about = None)]
    pub struct Args {
        /// Exact title of the window to capture
        #[arg(short, long)]
        window: Option<String>,

        /// Monitor index (see --list-monitors)
        #[arg(short, long)]
        monitor: Option<usize>,

        /// Left edge of the explicit capture rectangle
        #[arg(long, default_value = "0")]
        left: i32,

        /// Top edge of the explicit capture rectangle
        #[arg(long, default_value = "0")]
        top: i32,

        /// Width of the explicit capture rectangle
        #[arg(long, default_value = "640")]
        width: u32,

        /// Height of the explicit capture rectangle
        #[arg(long, default_value = "480")]
        height: u32,

        /// Crop window captures to the client area (drop frame and title bar)
        #[arg(long, action)]
        no_border: bool,

        /// Capture a window through its monitor, in screen coordinates
        #[arg(long, action)]
        screen_space: bool,

        /// Convert frames to grayscale instead of color
        #[arg(short, long, action)]
        gray: bool,

        /// Title of the viewer window
        #[arg(short, long, default_value = "Window")]
        name: String,

        /// Capture one frame, save it to this path, and exit
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// List monitors and exit
        #[arg(long, action)]
        list_monitors: bool,

        /// Verbose logging
        #[arg(short, long, action)]
        verbose: bool,
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();

        let log_level = if args.verbose { "debug" } else { "info" };
        env_logger::Builder::new()
            .parse_filters(
                &std::env::var("FRAMEGRAB_LOG").unwrap_or_else(|_| log_level.to_string()),
            )
            .init();

        if args.list_monitors {
            for (i, monitor) in enumerate_monitors()?.iter().enumerate() {
                println!("{}: {}", i, monitor);
            }
            return Ok(());
        }

        info!("framegrab v{}", env!("CARGO_PKG_VERSION"));

        let mut session = CaptureSession::new(CaptureConfig {
            name: args.name,
            left: args.left,
            top: args.top,
            width: args.width,
            height: args.height,
            window: args.window,
            monitor: args.monitor,
            border: !args.no_border,
            screen_space: args.screen_space,
        })?;
        info!("Capture rectangle: {}x{}", session.width(), session.height());

        if let Some(path) = args.output {
            let frame = session.read(!args.gray)?;
            frame.save(&path)?;
            info!(
                "Saved {}x{} frame to {}",
                frame.width,
                frame.height,
                path.display()
            );
            return Ok(());
        }

        viewer::run(session, !args.gray)
    }
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(not(windows))]
fn main() {
    eprintln!("framegrab only runs on Windows.");
    std::process::exit(1);
}
