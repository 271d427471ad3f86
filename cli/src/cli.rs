use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "svresults")]
/// Converts SPARQL query results between the CSV and TSV formats
pub struct Args {
    /// Format of the logs written to the standard error
    ///
    /// The log level is set with the RUST_LOG environment variable, "warn" by default.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a query results file from one format to another
    Convert {
        /// File to convert from
        ///
        /// If no file is given, stdin is read.
        /// In this case, the content format must be specified using the --from-format option.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        from_file: Option<PathBuf>,
        /// The format of the file to convert from
        ///
        /// It can be a name like "csv", a file extension like "tab" or a media type like "text/tab-separated-values".
        ///
        /// By default, the format is guessed from the input file extension.
        #[arg(long, required_unless_present = "from_file")]
        from_format: Option<String>,
        /// File to convert to
        ///
        /// If no file is given, stdout is written.
        /// In this case, the output format must be specified using the --to-format option.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        to_file: Option<PathBuf>,
        /// The format of the file to convert to
        ///
        /// It can be a name like "csv", a file extension like "tab" or a media type like "text/tab-separated-values".
        ///
        /// By default, the format is guessed from the target file extension.
        #[arg(long, required_unless_present = "to_file")]
        to_format: Option<String>,
        /// Attempt to keep converting even if the input is slightly invalid
        ///
        /// Stray quotes in CSV fields are kept as data.
        #[arg(long)]
        lenient: bool,
        /// Fail on rows with a number of fields different from the number of variables
        ///
        /// By default, they are padded with empty values or truncated.
        #[arg(long, conflicts_with = "lenient")]
        strict_row_width: bool,
        /// Size in bytes of the chunks read from the input
        #[arg(long)]
        buffer_size: Option<usize>,
    },
    /// List the supported formats
    Formats,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}
