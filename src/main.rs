use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;

use sysmon::app::App;
use sysmon::clients::status::StatusOptions;
use sysmon::clients::{calc, procmon, scheddemo, status};
use sysmon::config::{Config, load_config, load_config_from_path};
use sysmon::event::{Event, EventHandler};
use sysmon::kernel::{Console, Kernel};
use sysmon::logging::init_tracing;
use sysmon::ui;

#[derive(Parser)]
#[command(
    name = "sysmon",
    version,
    about = "Kernel status telemetry and the tools that read it"
)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON logs (with span timings) to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Number of simulated CPUs
    #[arg(long, global = true)]
    ncpu: Option<usize>,

    /// Milliseconds per clock tick
    #[arg(long, global = true)]
    tick_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show system status
    Status(StatusArgs),
    /// Run a builtin program while watching the process list
    Procmon {
        /// Program and its arguments: spin, sleep, calc, sysinfo
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },
    /// Start a cohort of CPU-bound workloads and report their timing
    Scheddemo {
        /// Number of workloads
        n: Option<usize>,
    },
    /// Integer calculator; interactive without operands
    Calc {
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Kernel-side status dump
    Kstatus {
        /// One-line summary
        #[arg(long)]
        mini: bool,
    },
}

#[derive(Args)]
struct StatusArgs {
    /// Refresh continuously
    #[arg(short, long)]
    watch: bool,
    /// Interactive top view
    #[arg(short, long)]
    top: bool,
    /// Include the process list
    #[arg(short, long)]
    procs: bool,
    /// Include memory detail
    #[arg(short, long)]
    memory: bool,
    /// Include syscall counts
    #[arg(short, long)]
    syscalls: bool,
    /// Everything
    #[arg(short, long)]
    all: bool,
    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
    /// Stop watching after this many frames
    #[arg(long)]
    count: Option<u32>,
    /// Ticks between watch frames
    #[arg(long)]
    interval: Option<u64>,
}

impl StatusArgs {
    fn options(&self, config: &Config) -> StatusOptions {
        let opts = StatusOptions {
            watch: self.watch,
            procs: self.procs,
            memory: self.memory,
            syscalls: self.syscalls,
            json: self.json,
            count: self.count,
            interval_ticks: self
                .interval
                .unwrap_or(config.general.watch_interval_ticks),
        };
        if self.all { opts.all() } else { opts }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);

    let top = matches!(&cli.command, Command::Status(args) if args.top);
    init_tracing(cli.log_file.as_deref(), top)?;

    if let Command::Calc { args } = &cli.command {
        if args.is_empty() {
            calc::repl(io::stdin().lock(), io::stdout())?;
        } else {
            print!("{}", calc::run_args(args));
        }
        return Ok(());
    }

    let kernel = Kernel::boot(&config.kernel, Console::stdout())?;
    let result = run_command(&cli.command, &kernel, &config).await;
    kernel.halt();
    result
}

async fn run_command(command: &Command, kernel: &Arc<Kernel>, config: &Config) -> Result<()> {
    match command {
        Command::Status(args) if args.top => run_top(kernel, config).await,
        Command::Status(args) => {
            let task = kernel.attach("status")?;
            status::run(&task, &args.options(config))?;
            Ok(())
        }
        Command::Procmon { argv } => {
            let task = kernel.attach("procmon")?;
            procmon::run(&task, argv, &config.procmon)?;
            Ok(())
        }
        Command::Scheddemo { n } => {
            let task = kernel.attach("scheddemo")?;
            scheddemo::run(&task, *n, &config.scheddemo, config.kernel.quantum_ticks)?;
            Ok(())
        }
        Command::Kstatus { mini } => {
            // Let the clock run so the dump has an uptime.
            let task = kernel.attach("kstatus")?;
            task.sleep(1)?;
            task.exit();
            kernel.dump_status(*mini);
            Ok(())
        }
        Command::Calc { .. } => Ok(()),
    }
}

async fn run_top(kernel: &Kernel, config: &Config) -> Result<()> {
    let telemetry = kernel.telemetry();
    let mut app = App::new(config, &telemetry);
    let tick_rate = Duration::from_millis(
        config.general.top_interval_ticks.max(1) * config.kernel.tick_ms.max(1),
    );

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut app, tick_rate).await;
    ratatui::restore();
    result
}

async fn run(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App<'_>,
    tick_rate: Duration,
) -> Result<()> {
    let mut events = EventHandler::new(tick_rate);

    terminal.draw(|frame| ui::draw(frame, app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        match event {
            Event::Key(key) => {
                let action = app.map_key(key);
                app.dispatch(action);
            }
            Event::Refresh => app.on_tick(),
            Event::Redraw => {}
        }
        terminal.draw(|frame| ui::draw(frame, app))?;
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ncpu) = cli.ncpu {
        config.kernel.ncpu = ncpu;
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.kernel.tick_ms = tick_ms;
    }

    config
}
