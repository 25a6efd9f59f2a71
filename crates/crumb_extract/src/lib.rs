use std::io::Write;
use std::path::PathBuf;

use poi_core::{extract_breadcrumbs, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_OUT_PATH: &str = "caldera_breadcrumbs.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub usda_path: PathBuf,
    pub out_path: PathBuf,
    pub chunk_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Help,
    Extract(ExtractOptions),
}

pub fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    if args.is_empty() {
        return Err(usage_text());
    }
    let mut out_path = PathBuf::from(DEFAULT_OUT_PATH);
    let mut chunk_size = DEFAULT_CHUNK_SIZE;
    let mut usda_path = None::<PathBuf>;
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--out" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --out".to_string())?;
                out_path = PathBuf::from(value);
                index += 2;
            }
            "--chunk-size" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --chunk-size".to_string())?;
                chunk_size = value
                    .parse::<usize>()
                    .ok()
                    .filter(|size| *size > 0)
                    .ok_or_else(|| {
                        format!("invalid --chunk-size value '{value}' (expected a positive integer)")
                    })?;
                index += 2;
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            path => {
                if usda_path.is_some() {
                    return Err(format!("unexpected extra argument '{path}'"));
                }
                usda_path = Some(PathBuf::from(path));
                index += 1;
            }
        }
    }

    let usda_path = usda_path.ok_or_else(|| "missing <scene.usda> argument".to_string())?;
    Ok(CliCommand::Extract(ExtractOptions {
        usda_path,
        out_path,
        chunk_size,
    }))
}

pub fn run<W: Write>(options: &ExtractOptions, stdout: &mut W) -> Result<(), String> {
    let summary = extract_breadcrumbs(&options.usda_path, &options.out_path, options.chunk_size)
        .map_err(|error| error.to_string())?;
    writeln!(
        stdout,
        "players_found={} players_written={} players_skipped={} rows={} chunks={} out={}",
        summary.players_found,
        summary.players_written,
        summary.players_skipped,
        summary.rows_written,
        summary.chunks_flushed,
        options.out_path.display()
    )
    .map_err(|error| format!("write summary: {error}"))
}

pub fn usage_text() -> String {
    [
        "crumb_extract - export player breadcrumbs from a .usda scene to CSV",
        "",
        "Usage:",
        "  crumb_extract [--out <csv>] [--chunk-size <n>] <scene.usda>",
        "",
        "Defaults:",
        "  --out caldera_breadcrumbs.csv",
        "  --chunk-size 200",
    ]
    .join("\n")
}
