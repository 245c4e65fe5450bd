use std::io::Write;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::info;
use tagseq::{
    open_writer, Compression, Reader, Selector, Sequence, WriteOptions, Writer, ID_TAG,
    STDIO_SENTINEL,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Fasta,
    Fastq,
    /// Self-describing text serialization, one record per line
    Text,
}

#[derive(Parser)]
struct Args {
    /// Input FASTA/FASTQ file, possibly compressed (`-` for stdin)
    #[clap(default_value = "-")]
    input: String,
    /// Output file (stdout if omitted); compression follows the extension
    #[clap(short, long)]
    output: Option<String>,
    /// Zero-based index of the record to convert
    #[clap(long, conflicts_with = "id")]
    index: Option<usize>,
    /// Identifier of the record to convert
    #[clap(long)]
    id: Option<String>,
    #[clap(short, long, value_enum, default_value_t = OutputFormat::Fasta)]
    format: OutputFormat,
    /// Residues per line (0 for a single line)
    #[clap(short, long)]
    width: Option<usize>,
}

impl Args {
    fn selector(&self) -> Option<Selector> {
        match (self.index, &self.id) {
            (Some(index), _) => Some(Selector::Index(index)),
            (None, Some(id)) => Some(Selector::Id(id.clone())),
            (None, None) => None,
        }
    }

    fn write_options(&self) -> WriteOptions {
        let options = match self.format {
            OutputFormat::Fastq => WriteOptions::fastq(),
            _ => WriteOptions::fasta(),
        };
        let options = match self.width {
            Some(width) => options.with_line_width(width),
            None => options,
        };
        match &self.output {
            Some(path) => options.with_compression(Compression::from_path(path)),
            None => options,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
    let args = Args::parse();

    let mut reader = Reader::from_path(&args.input)?;
    let records: Vec<Sequence> = match args.selector() {
        Some(selector) => {
            let seq = reader.find(selector.clone())?;
            if !seq.has(ID_TAG) {
                bail!("No record matching {:?} in {}", selector, args.input);
            }
            vec![seq]
        }
        None => reader.collect::<tagseq::Result<_>>()?,
    };
    info!("Loaded {} record(s) from {}", records.len(), args.input);

    match args.format {
        OutputFormat::Text => {
            let path = args.output.as_deref().unwrap_or(STDIO_SENTINEL);
            let mut out = open_writer(path, args.write_options().compression)?;
            for seq in &records {
                seq.write_text(&mut out)?;
                out.write_all(b"\n")?;
            }
            out.finish()?;
            info!("Wrote {} record(s) as text", records.len());
        }
        OutputFormat::Fasta | OutputFormat::Fastq => {
            let mut writer = Writer::from_optional_path(args.output.as_deref(), args.write_options())?;
            writer.write_all(&records)?;
            writer.finish()?;
            info!("Wrote {} record(s)", writer.records_written());
        }
    }
    Ok(())
}
