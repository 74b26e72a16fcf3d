//! msh: Muster Shell - build host filters interactively and run commands
//! across the matching fleet.

use std::path::PathBuf;

use clap::Parser;
use roster::{Config, Error, SaltCli};

mod dispatch;
mod render;
mod session;

use session::{Options, Repl, Session, Source};

#[derive(Parser)]
#[command(name = "msh")]
#[command(about = "Muster Shell - build host filters and run commands across a fleet")]
#[command(version)]
struct Cli {
    /// Print the loaded config and each submission's CLI equivalent
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Start an interactive shell after processing all script files
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Don't actually submit anything, just show what would be done.
    /// Job lookups can still be performed.
    #[arg(short = 'n', long = "noop")]
    noop: bool,

    /// Don't load (or validate against) pillars
    #[arg(short = 'p', long = "no-pillars")]
    no_pillars: bool,

    /// Config file to use
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Script files to run before (or instead of) the interactive shell
    files: Vec<PathBuf>,
}

/// Exit code when a non-privileged user attempts live execution. The
/// predecessor shell also reserved 5 for an unknown dispatch method;
/// that state is unrepresentable here, so only 7 remains in use.
const EXIT_PERMISSION: i32 = 7;

extern "C" fn note_interrupt(_: libc::c_int) {
    // Handled (not ignored) so blocking reads and child waits return and
    // the session can print a notice; children exec with the default
    // disposition and still die on Ctrl-C.
}

fn install_sigint_handler() {
    unsafe {
        let handler = note_interrupt as extern "C" fn(libc::c_int);
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }
}

fn invoking_user() -> String {
    std::env::var("SUDO_USER")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn stdin_is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}

/// Initial source stack: script files in argument order on top, the
/// interactive (or piped stdin) source at the bottom.
fn build_sources(cli: &Cli, config: &Config) -> roster::Result<Vec<Source>> {
    let mut sources = Vec::new();
    if cli.files.is_empty() || cli.interactive {
        if stdin_is_tty() {
            sources.push(Source::Interactive(Repl::open(config.history_path())?));
        } else {
            sources.push(Source::stdin());
        }
    }
    for path in cli.files.iter().rev() {
        sources.push(Source::from_path(path)?);
    }
    Ok(sources)
}

fn run(cli: &Cli) -> roster::Result<()> {
    let (config, _config_path) = Config::load(cli.config.as_deref())?;
    let opts = Options {
        verbose: cli.verbose,
        noop: cli.noop,
        use_pillars: !cli.no_pillars,
        privileged: unsafe { libc::geteuid() } == 0,
        user: invoking_user(),
    };
    let sources = build_sources(cli, &config)?;
    let backend = SaltCli::new();
    let mut session = Session::new(&backend, config, opts, sources)?;
    session.run()
}

fn main() {
    install_sigint_handler();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        let code = match e {
            Error::Permission(_) => EXIT_PERMISSION,
            _ => 1,
        };
        std::process::exit(code);
    }
}
