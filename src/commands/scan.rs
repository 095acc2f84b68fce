use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use crate::scanner::{ToolRecord, TracingSink, extract_image_urls};

#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    /// JSON array of tool-execution records; stdin when omitted or `-`
    pub file: Option<PathBuf>,
    /// Print the URLs as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ScanArgs) -> Result<(), String> {
    let raw = read_input(args.file.as_ref())?;
    let records: Vec<ToolRecord> = serde_json::from_str(&raw)
        .map_err(|err| format!("Failed to parse tool response: {err}"))?;

    let urls = extract_image_urls(&records, &mut TracingSink);
    tracing::debug!(records = records.len(), images = urls.len(), "scan finished");

    if args.json {
        let body = Value::Array(urls.into_iter().map(Value::String).collect());
        println!("{body}");
    } else {
        for url in &urls {
            println!("{url}");
        }
    }
    Ok(())
}

fn read_input(file: Option<&PathBuf>) -> Result<String, String> {
    match file.filter(|path| path.as_os_str() != "-") {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read tool response '{}': {err}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("Failed to read tool response from stdin: {err}"))?;
            Ok(buffer)
        }
    }
}
