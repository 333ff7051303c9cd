use anyhow::Result;
use clap::{Parser, Subcommand};
use seekfield_cli::{commands, parse_delimiter, FieldStrategy, LineEndingArg};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "seekfield")]
#[command(about = "Seekfield - Random-access line and field extraction", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Line ending convention of the input
    #[arg(long, global = true, value_enum, default_value = "lf")]
    line_ending: LineEndingArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print lines, optionally starting at a given line
    Lines {
        /// Input file
        #[arg(short, long)]
        input: String,

        /// Output JSON file for the lines
        #[arg(short, long)]
        output: Option<String>,

        /// Zero-based line to start from
        #[arg(long, default_value = "0")]
        from_line: u64,

        /// Stop after this many lines
        #[arg(long)]
        max_lines: Option<usize>,
    },

    /// Split the input into delimited fields
    Fields {
        /// Input file
        #[arg(short, long)]
        input: String,

        /// Output JSON file for the records
        #[arg(short, long)]
        output: Option<String>,

        /// Field delimiter, repeatable; supports \t \r \n \\ escapes
        #[arg(short, long = "delimiter")]
        delimiters: Vec<String>,

        /// Extraction strategy
        #[arg(long, value_enum, default_value = "cursor")]
        strategy: FieldStrategy,
    },

    /// Locate a line by number and print its byte range
    Seek {
        /// Input file
        #[arg(short, long)]
        input: String,

        /// Output JSON file for the location
        #[arg(short, long)]
        output: Option<String>,

        /// Line offset; negative values walk backwards
        #[arg(long, allow_negative_numbers = true)]
        line: i64,

        /// Count from the end of the file instead of the start
        #[arg(long)]
        from_end: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let ending = cli.line_ending.to_line_ending();

    // Execute command
    match cli.command {
        Commands::Lines {
            input,
            output,
            from_line,
            max_lines,
        } => commands::lines::execute(&input, output.as_deref(), ending, from_line, max_lines),

        Commands::Fields {
            input,
            output,
            delimiters,
            strategy,
        } => {
            let delimiters = delimiters
                .iter()
                .map(|d| parse_delimiter(d))
                .collect::<Result<Vec<_>>>()?;
            commands::fields::execute(&input, output.as_deref(), ending, &delimiters, strategy)
        }

        Commands::Seek {
            input,
            output,
            line,
            from_end,
        } => commands::seek::execute(&input, output.as_deref(), ending, line, from_end),
    }
}
