//! Session loop: owns the filter set, the current job handle, and the
//! input-source stack, and drives read -> classify -> dispatch.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use roster::{
    classify, mutate, Backend, Config, Error, FilterSet, LineKind, PillarCatalog, Result,
};

use crate::dispatch;
use crate::render;

/// Run-time options resolved from the command line in `main`.
#[derive(Debug, Clone)]
pub struct Options {
    pub verbose: bool,
    pub noop: bool,
    pub use_pillars: bool,
    pub privileged: bool,
    pub user: String,
}

/// Interactive line editor plus its history file.
///
/// History is written back in `Drop`, so it is saved exactly once on every
/// exit path - normal `exit`, EOF, or an unwinding failure.
pub struct Repl {
    editor: rustyline::DefaultEditor,
    history: PathBuf,
}

impl Repl {
    pub fn open(history: PathBuf) -> Result<Self> {
        let mut editor = rustyline::DefaultEditor::new()
            .map_err(|e| Error::Config(format!("failed to init line editor: {}", e)))?;
        if history.exists() {
            let _ = editor.load_history(&history);
        }
        Ok(Self { editor, history })
    }
}

impl Drop for Repl {
    fn drop(&mut self) {
        let _ = self.editor.save_history(&self.history);
    }
}

/// One entry on the input-source stack.
pub enum Source {
    Interactive(Repl),
    Stream {
        name: String,
        reader: Box<dyn BufRead>,
        line: usize,
    },
}

impl Source {
    /// Open a script file as a source.
    pub fn from_path(path: &Path) -> Result<Source> {
        let file = std::fs::File::open(path).map_err(|_| Error::Resource(path.to_path_buf()))?;
        Ok(Source::Stream {
            name: path.display().to_string(),
            reader: Box::new(BufReader::new(file)),
            line: 0,
        })
    }

    /// Wrap piped stdin as a source, named `-` like a script.
    pub fn stdin() -> Source {
        Source::Stream {
            name: "-".to_string(),
            reader: Box::new(BufReader::new(std::io::stdin())),
            line: 0,
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

pub struct Session<'a> {
    filters: FilterSet,
    job: Option<String>,
    sources: Vec<Source>,
    catalog: PillarCatalog,
    config: Config,
    opts: Options,
    backend: &'a dyn Backend,
    /// `(source name, line number)` of the line being dispatched, for
    /// error prefixes on non-interactive sources.
    cursor: Option<(String, usize)>,
}

impl<'a> Session<'a> {
    /// Build a session and fetch the pillar catalog once.
    ///
    /// `sources` is the initial stack: the top entry is read first, so the
    /// caller pushes the interactive source (if any) before script files.
    pub fn new(
        backend: &'a dyn Backend,
        config: Config,
        opts: Options,
        sources: Vec<Source>,
    ) -> Result<Self> {
        let catalog = load_catalog(backend, &config, &opts)?;
        Ok(Self {
            filters: FilterSet::new(),
            job: None,
            sources,
            catalog,
            config,
            opts,
            backend,
            cursor: None,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        if self.opts.verbose {
            render::config_dump(&self.config, &self.opts.user);
        }

        while let Some(line) = self.next_line()? {
            match self.dispatch_line(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => match &self.cursor {
                    Some((name, line)) => eprintln!("{}:{}: {}", name, line, e),
                    None => eprintln!("Error: {}", e),
                },
            }
        }
        Ok(())
    }

    /// Read the next well-formed line from the top of the source stack.
    ///
    /// Skips comments; a blank line re-prompts interactively but ends a
    /// non-interactive source; EOF pops the stack. Returns `None` when the
    /// stack is empty.
    fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            let Some(top) = self.sources.last_mut() else {
                return Ok(None);
            };

            match top {
                Source::Interactive(repl) => {
                    use rustyline::error::ReadlineError;
                    match repl.editor.readline("msh> ") {
                        Ok(raw) => {
                            let line = raw.trim().to_string();
                            if line.is_empty() || line.starts_with('#') {
                                continue;
                            }
                            let _ = repl.editor.add_history_entry(&line);
                            self.cursor = None;
                            return Ok(Some(line));
                        }
                        Err(ReadlineError::Interrupted) => {
                            eprintln!("Interrupted (use ctrl-d or exit to exit)");
                            continue;
                        }
                        Err(ReadlineError::Eof) => {
                            println!();
                            self.sources.pop();
                            continue;
                        }
                        Err(e) => {
                            return Err(Error::Io(std::io::Error::new(
                                std::io::ErrorKind::Other,
                                e.to_string(),
                            )))
                        }
                    }
                }
                Source::Stream { name, reader, line } => {
                    let mut raw = String::new();
                    let read = match reader.read_line(&mut raw) {
                        Ok(n) => n,
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                            eprintln!("Interrupted");
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    };
                    if read == 0 {
                        self.sources.pop();
                        continue;
                    }
                    *line += 1;
                    let trimmed = raw.trim().to_string();
                    if trimmed.is_empty() {
                        // A blank line ends a non-interactive source.
                        self.sources.pop();
                        continue;
                    }
                    if trimmed.starts_with('#') {
                        continue;
                    }
                    self.cursor = Some((name.clone(), *line));
                    return Ok(Some(trimmed));
                }
            }
        }
    }

    fn dispatch_line(&mut self, line: &str) -> Result<Flow> {
        match classify(line)? {
            LineKind::Source(path) => {
                let source = Source::from_path(&path)?;
                self.sources.push(source);
                Ok(Flow::Continue)
            }
            LineKind::Help => {
                render::help();
                Ok(Flow::Continue)
            }
            LineKind::Reset => {
                self.filters.clear();
                self.job = None;
                println!("Filters and job id (if any) have been reset!");
                Ok(Flow::Continue)
            }
            LineKind::Exit => Ok(Flow::Exit),
            LineKind::Meow => {
                render::meow();
                Ok(Flow::Continue)
            }
            LineKind::CurrentJob => {
                match self.job.clone() {
                    Some(job) => dispatch::lookup(self.backend, &job)?,
                    None => println!("There's no job to look up."),
                }
                Ok(Flow::Continue)
            }
            LineKind::Summary => {
                render::summary(&self.filters, self.job.as_deref());
                Ok(Flow::Continue)
            }
            LineKind::JobLookup(id) => {
                self.job = Some(id.clone());
                dispatch::lookup(self.backend, &id)?;
                Ok(Flow::Continue)
            }
            LineKind::Mutation(tokens) => {
                self.mutate(&tokens);
                Ok(Flow::Continue)
            }
            LineKind::Task(command) => {
                if let Some(job) = dispatch::execute(
                    self.backend,
                    &self.filters,
                    &command,
                    &self.opts,
                )? {
                    self.job = Some(job);
                }
                Ok(Flow::Continue)
            }
        }
    }

    /// Apply one targeting directive; on any error the filter set is left
    /// untouched and the loop continues.
    fn mutate(&mut self, tokens: &[String]) {
        let mutation = match mutate::apply(tokens, &self.catalog, &self.config.pillar_map) {
            Ok(m) => m,
            Err(Error::Validation(msg)) => {
                eprintln!("{}.\nTry one of these:", msg);
                render::pillars(&self.catalog);
                return;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };

        if mutation.match_all {
            render::match_all_warning();
        }
        if mutation.unvalidated {
            if self.catalog.is_disabled() {
                println!("Using pillars was disabled at run time.");
            } else {
                println!("No pillars found.");
            }
        }
        if mutation.replace {
            self.filters.clear();
        }
        self.filters.append(mutation.entry);
    }
}

/// Fetch the pillar catalog once at startup. Fetch failure degrades to an
/// empty catalog with a notice; only a disabled catalog skips the call.
fn load_catalog(backend: &dyn Backend, config: &Config, opts: &Options) -> Result<PillarCatalog> {
    if !opts.use_pillars {
        return Ok(PillarCatalog::disabled());
    }

    print!("Loading available pillars.");
    let _ = std::io::stdout().flush();

    let exclude = config.pillar_exclude_regex()?;
    let catalog = match backend.fetch_pillars(&config.pillar_host) {
        Ok(map) => {
            println!("   Done!");
            PillarCatalog::from_map(map, exclude.as_ref())
        }
        Err(e) => {
            println!();
            eprintln!("Couldn't load pillars: {}", e);
            PillarCatalog::empty()
        }
    };

    if opts.verbose {
        render::padder(" Available pillars and their data types: ");
        render::pillars(&catalog);
        render::padder(" Keep in mind that only str has really been tested. ");
    }
    Ok(catalog)
}
