//! Medium description handed to a spawned wmediumd with `-c`.
//!
//! wmediumd reads a libconfig document listing the interface MACs (their
//! position is the index links refer to) and a model section holding the
//! per direction link values.

use crate::config::ConnectorConfig;
use crate::error::config::ConfigError;

use common::ErrorLocation;
use models::MediumMode;

use std::collections::HashMap;
use std::fmt::{Result as FmtResult, Write as _};
use std::io::Write as _;
use std::panic::Location;
use std::path::PathBuf;

use log::{debug, info};

const MEDIUM_FILE_PREFIX: &str = "mn_wmd_config_";
const MEDIUM_FILE_SUFFIX: &str = ".cfg";
const MODEL_TYPE_SNR: &str = "snr";
const MODEL_TYPE_PROB: &str = "prob";

#[derive(Debug, Clone, Copy, PartialEq)]
enum LinkValue {
    Snr(i32),
    ErrorProb(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediumFile {
    contents: String,
}

impl MediumFile {
    /// Render the medium described by `config.medium`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(MediumFile))` - In Snr and ErrorProb mode
    /// * `Ok(None)` - In SpecProb mode, where wmediumd starts without a medium file
    /// * `Err(ConfigError)` - If a link references an unknown interface
    pub fn render(config: &ConnectorConfig) -> Result<Option<Self>, ConfigError> {
        if config.mode == MediumMode::SpecProb {
            return Ok(None);
        }

        let medium = &config.medium;
        let indices: HashMap<String, usize> = medium
            .interfaces
            .iter()
            .enumerate()
            .map(|(index, interface)| (interface.identifier(), index))
            .collect();

        let index_of = |identifier: &str| -> Result<usize, ConfigError> {
            indices.get(identifier).copied().ok_or_else(|| {
                ConfigError::validation(format!(
                    "{identifier} is not part of the managed interfaces"
                ))
            })
        };

        // Insertion ordered; a repeated pair keeps its first slot and takes the new value.
        let mut links: Vec<((usize, usize), LinkValue)> = Vec::new();
        let mut upsert = |pair: (usize, usize), value: LinkValue| {
            match links.iter_mut().find(|(existing, _)| *existing == pair) {
                Some(slot) => slot.1 = value,
                None => links.push((pair, value)),
            }
        };

        match config.mode {
            MediumMode::ErrorProb => {
                for link in &medium.errprob_links {
                    let pair = (index_of(&link.from)?, index_of(&link.to)?);
                    upsert(pair, LinkValue::ErrorProb(link.errprob));
                }
            }
            _ => {
                for link in &medium.snr_links {
                    let pair = (index_of(&link.from)?, index_of(&link.to)?);
                    upsert(pair, LinkValue::Snr(link.snr));
                }
            }
        }

        if medium.auto_add_links {
            let default = match config.mode {
                MediumMode::ErrorProb => LinkValue::ErrorProb(medium.default_auto_errprob),
                _ => LinkValue::Snr(medium.default_auto_snr),
            };
            let count = medium.interfaces.len();
            for from in 0..count {
                for to in (0..count).filter(|to| *to != from) {
                    if !links.iter().any(|(pair, _)| *pair == (from, to)) {
                        links.push(((from, to), default));
                    }
                }
            }
        }

        let model_type = match config.mode {
            MediumMode::ErrorProb => MODEL_TYPE_PROB,
            _ => MODEL_TYPE_SNR,
        };

        let ids = medium
            .interfaces
            .iter()
            .map(|interface| format!("\"{}\"", interface.mac))
            .collect::<Vec<_>>()
            .join(", ");

        let mut contents = String::new();
        write_document(&mut contents, &ids, model_type, &links).map_err(|e| {
            ConfigError::SerializeError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Failed to render medium config: {e}"),
            }
        })?;

        debug!(
            "Rendered {model_type} medium with {} interfaces and {} links",
            medium.interfaces.len(),
            links.len()
        );

        Ok(Some(Self { contents }))
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Persist the document as `mn_wmd_config_*.cfg` in the temp directory.
    ///
    /// The file outlives this call; whoever stops the server removes it.
    pub fn write_temp(&self) -> Result<PathBuf, ConfigError> {
        let mut file = tempfile::Builder::new()
            .prefix(MEDIUM_FILE_PREFIX)
            .suffix(MEDIUM_FILE_SUFFIX)
            .tempfile()
            .map_err(|e| ConfigError::WriteError {
                location: ErrorLocation::from(Location::caller()),
                path: std::env::temp_dir(),
                source: e,
            })?;

        file.write_all(self.contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| ConfigError::WriteError {
                location: ErrorLocation::from(Location::caller()),
                path: file.path().to_path_buf(),
                source: e,
            })?;

        let (_, path) = file.keep().map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: e.file.path().to_path_buf(),
            source: e.error,
        })?;

        info!("Wrote wmediumd medium config {}", path.display());
        Ok(path)
    }
}

fn write_document(
    out: &mut String,
    ids: &str,
    model_type: &str,
    links: &[((usize, usize), LinkValue)],
) -> FmtResult {
    writeln!(out, "ifaces:\n{{\n\tids = [{ids}];\n}};")?;
    write!(
        out,
        "model:\n{{\n\ttype = \"{model_type}\";\n\tdefault_prob = 1.0;\n\tlinks = ("
    )?;

    for (position, ((from, to), value)) in links.iter().enumerate() {
        if position > 0 {
            out.push(',');
        }
        match value {
            LinkValue::Snr(snr) => write!(out, "\n\t\t({from}, {to}, {snr})")?,
            LinkValue::ErrorProb(errprob) => write!(out, "\n\t\t({from}, {to}, {errprob:.6})")?,
        }
    }

    writeln!(out, "\n\t);\n}};")
}
