use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;

use marq::conf::Config;
use marq::core::readable::format_readable_size;
use marq::core::{CliArgs, setup_logging};
use marq::io::{Disk, LocalDisk};
use marq::marks::{GranularityInfo, MARK_ENTRY_SIZE, MarkLoader};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    setup_logging();
    info!(args; "Marq started.");

    let config = match &args.config {
        Some(path) => {
            let toml = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            Config::from_str(&toml)?
        }
        None => Config::default(),
    };

    inspect(&config, &args.column)
}

/// Dump the mark table of one column file.
fn inspect(config: &Config, column: &str) -> anyhow::Result<()> {
    let disk = Arc::new(LocalDisk::new(&config.data_dir));
    let info = GranularityInfo::default();

    let data_path = format!("{column}.bin");
    let marks_path = info.marks_file_path(column);
    let file_size = disk.file_size(&data_path)?;
    let marks_size = disk.file_size(&marks_path)?;
    let marks_count = marks_size as usize / MARK_ENTRY_SIZE;

    println!(
        "{data_path}: {} ({marks_count} marks)",
        format_readable_size(file_size)
    );

    let loader = MarkLoader::new(
        disk,
        marks_path,
        marks_count,
        config.reader.save_marks_in_cache,
        None,
    );
    for index in 0..marks_count {
        let mark = loader.get_mark(index)?;
        println!(
            "  mark {index:>6}: file offset {:>12}, block offset {:>8}",
            mark.offset_in_file, mark.offset_in_block
        );
    }
    Ok(())
}
