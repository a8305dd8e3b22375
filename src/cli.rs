use lox::config::DEFAULT_MAX_CALL_DEPTH;

#[derive(clap::Parser, Debug)]
#[clap(about, long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Maximum nesting of function calls before a stack overflow is reported
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    pub max_call_depth: usize,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Command {
    /// Run a script
    Run { file: std::path::PathBuf },

    /// Start an interactive prompt
    Repl,

    /// Print the tokens of a script
    Tokens { file: std::path::PathBuf },

    /// Print the syntax tree of a script
    Ast { file: std::path::PathBuf },
}
