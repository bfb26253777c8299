use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use hask_syntax::highlight::highlight;
use hask_syntax::lexer::LexErrorKind;
use hask_syntax::span::LineIndex;
use hask_syntax::{cabal, lex, parse_with, EntryPoint, ParseOptions, Token};

#[derive(Parser)]
#[command(name = "hask-syntax")]
#[command(version, about = "Inspect how Haskell and Cabal sources are tokenized and parsed")]
struct Cli {
    /// Source file, or `-` for stdin
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// What to print
    #[arg(long, value_enum, default_value = "tree")]
    emit: Emit,

    /// Production to start parsing from
    #[arg(long, value_enum, default_value = "module")]
    entry: Entry,

    /// Treat the input as a Cabal package description
    #[arg(long)]
    cabal: bool,

    /// Include whitespace and comments in the tree dump
    #[arg(long)]
    trivia: bool,

    /// More logging on stderr (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Emit {
    Tokens,
    Tree,
    Highlight,
    Diagnostics,
}

#[derive(Clone, Copy, ValueEnum)]
enum Entry {
    Module,
    Decl,
    Expr,
    Type,
    Pattern,
    Import,
}

impl From<Entry> for EntryPoint {
    fn from(entry: Entry) -> Self {
        match entry {
            Entry::Module => EntryPoint::Module,
            Entry::Decl => EntryPoint::Declaration,
            Entry::Expr => EntryPoint::Expression,
            Entry::Type => EntryPoint::Type,
            Entry::Pattern => EntryPoint::Pattern,
            Entry::Import => EntryPoint::Import,
        }
    }
}

fn init_logging(verbose: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}: {}", record.level(), record.target(), message))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
}

fn read_input(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
    }
}

fn print_tokens(source: &str, tokens: &[Token]) {
    println!("Lexed {} tokens:", tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let error = token
            .error
            .map(|e: LexErrorKind| format!("  ({})", e))
            .unwrap_or_default();
        println!(
            "{:4}: {:?} @ {}..{} {:?}{}",
            i,
            token.kind,
            token.span.start,
            token.span.end,
            token.text(source),
            error
        );
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Could not set up logging: {}", e);
    }

    let name = cli.input.display().to_string();
    let source = match read_input(&cli.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", name, e);
            return ExitCode::from(1);
        }
    };

    if let Emit::Tokens = cli.emit {
        let tokens = if cli.cabal {
            cabal::lexer::lex(&source)
        } else {
            lex(&source)
        };
        print_tokens(&source, &tokens);
        return ExitCode::SUCCESS;
    }

    let result = if cli.cabal {
        cabal::parse(&source)
    } else {
        let options = ParseOptions {
            entry_point: cli.entry.into(),
            ..ParseOptions::default()
        };
        parse_with(&source, &options)
    };
    let parse = match result {
        Ok(parse) => parse,
        Err(e) => {
            eprintln!("Internal parser error [{}]: {}", e.code(), e);
            return ExitCode::from(1);
        }
    };

    match cli.emit {
        Emit::Tree => print!("{}", parse.tree().debug_tree(cli.trivia)),
        Emit::Highlight => {
            for h in highlight(parse.tree()) {
                println!("{:?} @ {} {:?}", h.tag, h.span, h.span.text(&source));
            }
        }
        Emit::Diagnostics | Emit::Tokens => {}
    }

    let mut diagnostics = parse.diagnostics().to_vec();
    if !cli.cabal {
        diagnostics.extend(parse.resolve_fixities().diagnostics);
    }
    if diagnostics.is_empty() {
        if let Emit::Diagnostics = cli.emit {
            println!("no diagnostics");
        }
        return ExitCode::SUCCESS;
    }
    let index = LineIndex::new(&source);
    for diagnostic in &diagnostics {
        eprintln!("{}:{}: {}", name, index.pos(&source, diagnostic.span.start), diagnostic);
    }
    ExitCode::from(2)
}
