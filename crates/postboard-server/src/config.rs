use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::ProjectDirs;

use crate::remote::DEFAULT_API_BASE;

/// Key the dataset snapshot is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "data";

#[derive(Parser, Debug)]
#[command(author, version, about = "Server-rendered post board backed by a cached REST dataset")]
pub struct Args {
    /// Address to serve the board on
    #[arg(long, env = "POSTBOARD_LISTEN", default_value = "127.0.0.1:3030")]
    pub listen: SocketAddr,
    /// Base URL of the users/posts/comments API
    #[arg(long, env = "POSTBOARD_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
    /// Directory holding the dataset snapshot (defaults to the platform data dir)
    #[arg(long, env = "POSTBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Storage key of the snapshot
    #[arg(long, env = "POSTBOARD_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY)]
    pub storage_key: String,
    /// Keep the snapshot in memory only
    #[arg(long, env = "POSTBOARD_EPHEMERAL", conflicts_with = "data_dir")]
    pub ephemeral: bool,
}

/// Resolved startup configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub api_base: String,
    /// `None` keeps the snapshot in memory.
    pub data_dir: Option<PathBuf>,
    pub storage_key: String,
}

impl Args {
    pub fn into_config(self) -> Result<Config> {
        if self.storage_key.is_empty()
            || !self
                .storage_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(anyhow!(
                "storage key '{}' must be non-empty and use only [A-Za-z0-9_-]",
                self.storage_key
            ));
        }

        let data_dir = if self.ephemeral {
            None
        } else {
            match self.data_dir {
                Some(dir) => Some(dir),
                None => Some(default_data_dir()?),
            }
        };

        Ok(Config {
            listen: self.listen,
            api_base: self.api_base.trim_end_matches('/').to_string(),
            data_dir,
            storage_key: self.storage_key,
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "postboard", "postboard")
        .ok_or_else(|| anyhow!("could not resolve data dir; pass --data-dir"))?;
    Ok(proj.data_dir().to_path_buf())
}
