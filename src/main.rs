use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use clap::{Parser, Subcommand, ValueEnum};
use remuneraciones_tools::config::{Catalog, Settings};
use remuneraciones_tools::mode::Mode;
use remuneraciones_tools::worker::{self, WorkerEvent};
use remuneraciones_tools::{Result, ToolError, duplicates, logging, pipeline};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_file.as_deref())?;

    let mut settings = Settings::default();
    if let Some(path) = &cli.catalog {
        settings.catalog = Catalog::load(path)?;
    }

    match cli.command {
        Command::Process(args) => execute_process(args, settings),
        Command::Duplicates(args) => execute_duplicates(args, settings),
    }
}

fn execute_process(args: ProcessArgs, settings: Settings) -> Result<()> {
    let mode = Mode::from(args.mode);
    let output = args.output.clone();
    let (handle, events) = worker::spawn(output, move |progress| {
        pipeline::process(mode, &args.input, &args.output, &settings, progress)
    });
    report_events(events);
    join_worker(handle)
}

fn execute_duplicates(args: DuplicatesArgs, settings: Settings) -> Result<()> {
    let output = args.output.clone();
    let (handle, events) = worker::spawn(output, move |progress| {
        duplicates::process_duplicates(
            &args.input,
            &args.secondary,
            &args.output,
            &settings,
            progress,
        )
    });
    report_events(events);
    join_worker(handle)
}

fn join_worker(handle: JoinHandle<()>) -> Result<()> {
    handle
        .join()
        .map_err(|_| ToolError::Io(std::io::Error::other("worker thread terminated abnormally")))
}

fn report_events(events: Receiver<WorkerEvent>) {
    for event in events {
        match event {
            WorkerEvent::Progress { percent, message } => eprintln!("[{percent:>3}%] {message}"),
            WorkerEvent::Finished(path) => println!("{}", path.display()),
            WorkerEvent::Failed(message) => {
                eprintln!("error: {message}");
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Apportion payroll workbooks by program hours."
)]
struct Cli {
    /// Append log lines to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// JSON column catalog replacing the built-in one.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split salary columns by the hours worked under each program.
    Process(ProcessArgs),
    /// Merge rows that share a DUPLICADOS value.
    Duplicates(DuplicatesArgs),
}

#[derive(clap::Args)]
struct ProcessArgs {
    /// Processing mode: `sep` (single program) or `pie` (dual program).
    #[arg(long, value_enum, ignore_case = true)]
    mode: ModeArg,

    /// Workbook with HORAS and TOTAL sheets.
    #[arg(long)]
    input: PathBuf,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct DuplicatesArgs {
    /// Workbook whose Hoja1 sheet is consolidated.
    #[arg(long)]
    input: PathBuf,

    /// Complementary workbook, validated and loaded.
    #[arg(long)]
    secondary: PathBuf,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    #[value(alias = "single", alias = "single-program")]
    Sep,
    #[value(alias = "dual", alias = "dual-program")]
    Pie,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Sep => Mode::SingleProgram,
            ModeArg::Pie => Mode::DualProgram,
        }
    }
}
