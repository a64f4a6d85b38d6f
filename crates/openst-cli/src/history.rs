use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use serde::Serialize;
use time::OffsetDateTime;

pub const RECORD_SEPARATOR: &str = "\n=====\n";

/// Everything a single run leaves in the history file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub cmd: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
    pub logs: Vec<String>,
    pub success: bool,
    pub output: Option<Output>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Success { subject: String, message: String },
    Failure { message: String, error: String },
}

impl HistoryRecord {
    /// Start a record for the command line `args`. The program path is shortened to its file
    /// name.
    pub fn start(args: impl IntoIterator<Item = String>) -> Self {
        let mut args = args.into_iter();
        let program = args
            .next()
            .map(|program| {
                Path::new(&program)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or(program)
            })
            .unwrap_or_default();

        Self {
            cmd: std::iter::once(program)
                .chain(args)
                .collect::<Vec<_>>()
                .join(" "),
            start: OffsetDateTime::now_utc(),
            end: None,
            logs: vec![],
            success: false,
            output: None,
        }
    }

    /// Stamp the end time and append the record to `path`, creating the file if needed.
    pub fn append_to(&mut self, path: &Path) -> io::Result<()> {
        self.end = Some(OffsetDateTime::now_utc());
        let serialized = serde_json::to_string_pretty(self).map_err(io::Error::other)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(format!("{RECORD_SEPARATOR}{serialized}").as_bytes())
    }
}
