use clap::{Args, Parser, Subcommand};
use letcalc::*;
use miette::{IntoDiagnostic, WrapErr};
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor};
use std::path::PathBuf;
use tracing::{debug, info, Level};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: Options,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive session on stdin (the default).
    Calc,
    /// Evaluate every statement in a file.
    Run { filename: PathBuf },
    /// Print the tokens of a file.
    Tokenize { filename: PathBuf },
}

#[derive(Args, Debug)]
struct Options {
    /// Statement separator.
    #[arg(long, default_value_t = ';')]
    separator: char,

    /// Keyword that starts a declaration.
    #[arg(long, default_value = "let")]
    let_keyword: String,

    /// Keyword that ends the session.
    #[arg(long, default_value = "quit")]
    quit_keyword: String,

    #[arg(long, default_value = "> ")]
    prompt: String,

    /// Printed before every result.
    #[arg(long, default_value = "= ")]
    result_marker: String,

    /// Start without `pi` and `e`.
    #[arg(long)]
    no_constants: bool,

    /// Do not print prompts.
    #[arg(short, long)]
    quiet: bool,
}

impl Options {
    fn config(&self) -> Config {
        Config {
            syntax: Syntax {
                separator: self.separator,
                declare_keyword: self.let_keyword.clone(),
                quit_keyword: self.quit_keyword.clone(),
            },
            prompt: if self.quiet {
                String::new()
            } else {
                self.prompt.clone()
            },
            result_marker: self.result_marker.clone(),
            seed_constants: !self.no_constants,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn log_symbols(symbols: &SymbolTable) {
    if symbols.is_empty() {
        debug!("no variables declared");
    } else {
        debug!(count = symbols.len(), %symbols, "variables at exit");
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = cli.options.config();

    match cli.command.unwrap_or(Commands::Calc) {
        Commands::Calc => {
            let mut session =
                Session::new(io::stdin().lock(), io::stdout(), io::stderr(), config)?;
            session.run()?;
            log_symbols(session.symbols());
        }
        Commands::Run { filename } => {
            let file = File::open(&filename)
                .into_diagnostic()
                .wrap_err_with(|| format!("opening '{}' failed", filename.display()))?;

            config.prompt.clear();
            let mut session =
                Session::new(BufReader::new(file), io::stdout(), io::stderr(), config)?;
            let outcome = session.run()?;
            info!(?outcome, file = %filename.display(), "run finished");
            log_symbols(session.symbols());
        }
        Commands::Tokenize { filename } => {
            let file_contents = fs::read_to_string(&filename)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading '{}' failed", filename.display()))?;

            config.validate()?;
            let mut tokens = Tokenizer::with_syntax(Cursor::new(file_contents), config.syntax);
            loop {
                match tokens.next_token() {
                    Ok(token) => println!("{token:?}"),
                    Err(CalcError::Eof) => break,
                    Err(e) if e.is_recoverable() => eprintln!("{e}"),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    Ok(())
}
