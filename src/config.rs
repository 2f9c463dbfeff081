use serde_derive::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_POOL_SIZE: usize = 64;

/// Buffer pool settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub pool_size: usize,
    /// Write back dirty frames when the pool is dropped.
    pub flush_on_drop: bool,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self { pool_size: DEFAULT_POOL_SIZE, flush_on_drop: true }
    }
}

impl BufferPoolConfig {
    /// Loads settings from defaults, then the optional config file, then
    /// `FEATHERBUF_*` environment variables.
    pub fn load(file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("pool_size", DEFAULT_POOL_SIZE as i64)?
            .set_default("flush_on_drop", true)?;
        if let Some(file) = file {
            builder = builder.add_source(config::File::with_name(file));
        }
        builder = builder.add_source(config::Environment::with_prefix("FEATHERBUF"));

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::Config("pool_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "pool_size = 12\nflush_on_drop = false").unwrap();

        let cfg = BufferPoolConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg, BufferPoolConfig { pool_size: 12, flush_on_drop: false });
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        std::fs::write(&path, "pool_size = 0\n").unwrap();

        assert!(matches!(
            BufferPoolConfig::load(Some(path.to_str().unwrap())),
            Err(Error::Config(_))
        ));
    }
}
