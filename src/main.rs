mod cli;

use std::{
    fs,
    io::{self, BufRead, Write},
    path::Path,
    process,
    time::Instant,
};

use clap::Parser;
use cli::{Cli, Command};
use lox::{
    error::{Error, Phase},
    syntax, Config, Interpreter,
};

const EXIT_USAGE: i32 = 64;
const EXIT_DATA: i32 = 65;
const EXIT_SOFTWARE: i32 = 70;
const EXIT_IO: i32 = 74;

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(why) if why.use_stderr() => {
            let _ = why.print();
            process::exit(EXIT_USAGE);
        }
        Err(why) => {
            let _ = why.print();
            return;
        }
    };

    let config = Config {
        max_call_depth: cli.max_call_depth,
    };

    let code = match cli.command {
        Command::Run { file } => run_file(&file, config),
        Command::Repl => repl(config),
        Command::Tokens { file } => dump_tokens(&file),
        Command::Ast { file } => dump_ast(&file),
    };
    process::exit(code);
}

fn read_source(file_path: &Path) -> Result<String, i32> {
    fs::read_to_string(file_path).map_err(|why| {
        eprintln!("Could not read {file_path:?}: {why}");
        EXIT_IO
    })
}

fn report(errors: &[Error]) -> i32 {
    for error in errors {
        eprintln!("{error}");
    }

    let runtime = errors.iter().any(|e| e.phase() == Phase::Runtime);
    if runtime {
        EXIT_SOFTWARE
    } else {
        EXIT_DATA
    }
}

fn run_file(file_path: &Path, config: Config) -> i32 {
    let src = match read_source(file_path) {
        Ok(src) => src,
        Err(code) => return code,
    };

    let now = Instant::now();

    let mut interpreter = Interpreter::with_config(io::stdout(), config);
    let code = match interpreter.eval(&src) {
        Ok(()) => 0,
        Err(why) => report(&why),
    };

    log::info!("Duration: {:.2?}", now.elapsed());
    code
}

fn repl(config: Config) -> i32 {
    let mut interpreter = Interpreter::with_config(io::stdout(), config);

    match run_prompt(io::stdin().lock(), &mut interpreter) {
        Ok(()) => 0,
        Err(why) => {
            eprintln!("{why}");
            EXIT_IO
        }
    }
}

/// Runs every line of `input` in `interpreter` until the input ends. Errors
/// are reported and the session goes on.
fn run_prompt<R: BufRead, W: Write>(mut input: R, interpreter: &mut Interpreter<W>) -> io::Result<()> {
    let mut line = String::new();

    loop {
        write!(interpreter.output_mut(), "> ")?;
        interpreter.output_mut().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        // A bare expression echoes its value; anything else runs as statements.
        match interpreter.eval_expr_str(&line) {
            Ok(value) => writeln!(interpreter.output_mut(), "{value}")?,
            Err(why) if why.iter().all(|e| e.phase() != Phase::Runtime) => {
                if let Err(why) = interpreter.eval(&line) {
                    report(&why);
                }
            }
            Err(why) => {
                report(&why);
            }
        }
    }
}

fn dump_tokens(file_path: &Path) -> i32 {
    let src = match read_source(file_path) {
        Ok(src) => src,
        Err(code) => return code,
    };

    match syntax::scan(&src) {
        Ok(tokens) => {
            for token in tokens {
                println!("{token}");
            }
            0
        }
        Err(why) => report(&why),
    }
}

fn dump_ast(file_path: &Path) -> i32 {
    let src = match read_source(file_path) {
        Ok(src) => src,
        Err(code) => return code,
    };

    let program = syntax::scan(&src).and_then(|tokens| syntax::parse(tokens).map_err(|e| vec![e]));
    match program {
        Ok(program) => {
            for stmt in program {
                println!("{stmt}");
            }
            0
        }
        Err(why) => report(&why),
    }
}
