use crate::cli::{Args, Command, LogFormat};
use anyhow::{Context, bail};
use clap::Parser;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write, stdin, stdout};
use std::path::Path;
use svresults::{QueryResultsFormat, QueryResultsParser, QueryResultsSerializer};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

pub fn main() -> anyhow::Result<()> {
    let matches = Args::parse();
    init_logging(matches.log_format)?;
    match matches.command {
        Command::Convert {
            from_file,
            from_format,
            to_file,
            to_format,
            lenient,
            strict_row_width,
            buffer_size,
        } => {
            let from_format = if let Some(format) = from_format {
                format_from_name(&format)?
            } else if let Some(file) = &from_file {
                format_from_path(file)?
            } else {
                bail!("The --from-format option must be set when reading from stdin")
            };
            let mut parser = QueryResultsParser::from_format(from_format);
            if let Some(buffer_size) = buffer_size {
                parser = parser.with_buffer_capacity(buffer_size);
            }
            if lenient {
                parser = parser.lenient();
            }
            if strict_row_width {
                parser = parser.with_strict_row_width();
            }

            let to_format = if let Some(format) = to_format {
                format_from_name(&format)?
            } else if let Some(file) = &to_file {
                format_from_path(file)?
            } else {
                bail!("The --to-format option must be set when writing to stdout")
            };
            let serializer = QueryResultsSerializer::from_format(to_format);

            match (from_file, to_file) {
                (Some(from_file), Some(to_file)) => close_file_writer(do_convert(
                    &parser,
                    File::open(&from_file)
                        .with_context(|| format!("Failed to open {}", from_file.display()))?,
                    serializer,
                    BufWriter::new(File::create(to_file)?),
                )?),
                (Some(from_file), None) => do_convert(
                    &parser,
                    File::open(&from_file)
                        .with_context(|| format!("Failed to open {}", from_file.display()))?,
                    serializer,
                    stdout().lock(),
                )?
                .flush(),
                (None, Some(to_file)) => close_file_writer(do_convert(
                    &parser,
                    stdin().lock(),
                    serializer,
                    BufWriter::new(File::create(to_file)?),
                )?),
                (None, None) => {
                    do_convert(&parser, stdin().lock(), serializer, stdout().lock())?.flush()
                }
            }?;
            Ok(())
        }
        Command::Formats => {
            let mut output = stdout().lock();
            for format in QueryResultsFormat::ALL {
                writeln!(
                    output,
                    "{}\t{}\t{}\t{}\t{}",
                    format.name(),
                    format.file_extension(),
                    format.media_type(),
                    format.iri(),
                    format.label()
                )?;
            }
            Ok(output.flush()?)
        }
    }
}

fn init_logging(log_format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    match log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr),
            )
            .try_init(),
    }
    .context("Failed to initialize logging")
}

fn do_convert<R: Read, W: Write>(
    options: &QueryResultsParser,
    read: R,
    serializer: QueryResultsSerializer,
    write: W,
) -> anyhow::Result<W> {
    let mut parser = options.parse_read(read);
    let variables = parser
        .ensure_variables()
        .context("Failed to read the results header")?
        .to_vec();
    let mut writer = serializer.serialize_solutions_to_write(write, variables)?;
    let mut row_count = 0_u64;
    while let Some(row) = parser
        .read_row()
        .with_context(|| format!("Failed to read the results row {}", row_count + 1))?
    {
        writer.serialize(&row)?;
        row_count += 1;
    }
    let unsupported = writer.unsupported_value_count();
    if unsupported > 0 {
        tracing::warn!(
            unsupported,
            "Some values could not be written and were replaced by empty fields"
        );
    }
    tracing::info!(
        rows = row_count,
        from = options.format().name(),
        to = serializer.format().name(),
        "Conversion done"
    );
    Ok(writer.finish()?)
}

fn format_from_path(path: &Path) -> anyhow::Result<QueryResultsFormat> {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        QueryResultsFormat::from_extension(ext).with_context(|| {
            format!("Not able to guess the file format from file name extension '{ext}'")
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

fn format_from_name(name: &str) -> anyhow::Result<QueryResultsFormat> {
    if let Some(t) = QueryResultsFormat::from_name(name) {
        return Ok(t);
    }
    if let Some(t) = QueryResultsFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = QueryResultsFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}

fn close_file_writer(writer: BufWriter<File>) -> io::Result<()> {
    let mut file = writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;
    file.flush()?;
    file.sync_all()
}
