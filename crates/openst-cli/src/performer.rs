use std::{
    env,
    fmt::Debug,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Result;
use colored::Colorize;
use openst_contract::{Connection, ReceiptSummary};
use tracing::{debug, warn};

use crate::{
    config::CommonArgs,
    history::{HistoryRecord, Output},
    setup_config::{ConfigError, SetupConfig},
};

/// What a successful operation reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Success {
    pub subject: String,
    pub message: String,
}

impl Success {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn subject(subject: impl Into<String>) -> Self {
        Self::new(subject, "")
    }
}

/// Shared state of a single `openst` run: paths, the lazily loaded setup config and the history
/// record that collects everything printed to the user.
pub struct Performer {
    config_path: PathBuf,
    history_path: PathBuf,
    setup_config: Option<SetupConfig>,
    record: HistoryRecord,
}

impl Performer {
    pub fn new(common: &CommonArgs, raw_args: impl IntoIterator<Item = String>) -> Self {
        Self {
            config_path: absolute(&common.config),
            history_path: absolute(&common.history),
            setup_config: None,
            record: HistoryRecord::start(raw_args),
        }
    }

    /// A performer keeping its config and history in `dir`.
    #[cfg(test)]
    pub fn in_dir(dir: &Path) -> Self {
        let common = CommonArgs {
            config: dir.join("config.json"),
            history: dir.join("history.log"),
            logging_format: crate::config::LoggingFormat::Text,
        };
        Self::new(&common, ["openst".to_string(), "balance-of".to_string()])
    }

    /// The setup config, read on first use.
    pub fn setup_config(&mut self) -> Result<SetupConfig, ConfigError> {
        if let Some(config) = &self.setup_config {
            return Ok(config.clone());
        }
        let config = SetupConfig::load(&self.config_path)?;
        debug!(endpoint = %config.geth_rpc_end_point, "Setup config loaded");
        self.setup_config = Some(config.clone());
        Ok(config)
    }

    pub fn connection(&mut self) -> Result<Connection, ConfigError> {
        Ok(self.setup_config()?.connection())
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        println!("{message}");
        self.record.logs.push(message);
    }

    pub fn log_receipt(&mut self, receipt: &ReceiptSummary) {
        self.record.logs.push("Transaction Receipt".to_string());
        self.record.logs.push(receipt.json.to_string());

        println!("{}", receipt_banner(receipt.status));
        let pretty = serde_json::to_string_pretty(&receipt.json).unwrap_or_default();
        println!("{}", pretty.dimmed());
    }

    pub fn log_event(&mut self, name: &str, event: &impl Debug) {
        self.log(format!("{name} Event:\n{event:#?}"));
    }

    pub fn log_error(&self, message: &str) {
        eprintln!("{}", message.red());
    }

    pub fn log_success(&self, subject: &str, message: &str) {
        println!("{} {}", subject.green(), message.bold());
    }

    /// Report the outcome, write the history record and turn the outcome into the exit code.
    pub fn finish(mut self, result: Result<Success>) -> ExitCode {
        match self.conclude(result) {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        }
    }

    fn conclude(&mut self, result: Result<Success>) -> bool {
        let success = result.is_ok();
        match result {
            Ok(Success { subject, message }) => {
                if !subject.is_empty() || !message.is_empty() {
                    println!("{}", banner("SUCCESS".green()));
                    self.log_success(&subject, &message);
                }
                self.record.output = Some(Output::Success { subject, message });
            }
            Err(err) => {
                println!("{}", banner("ERROR".red()));
                self.log_error(&format!("{err:#}"));
                self.record.output = Some(Output::Failure {
                    message: err.to_string(),
                    error: format!("{err:?}"),
                });
            }
        }
        self.record.success = success;

        if let Err(e) = self.record.append_to(&self.history_path) {
            warn!(path = ?self.history_path, "Failed to write history: {e}");
        }

        println!("{}", banner("END-OF-PROGRAM".bold()));
        success
    }
}

fn absolute(path: &Path) -> PathBuf {
    match path.is_absolute() {
        true => path.to_path_buf(),
        false => env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

fn banner(title: impl std::fmt::Display) -> String {
    format!("\n\n ========== {title} ========== \n\n")
}

fn receipt_banner(status: bool) -> String {
    let title = match status {
        true => "Transaction Successful".green(),
        false => "Transaction Failed".red(),
    };
    format!("\n\n ===== {title} ===== \n\n")
}
