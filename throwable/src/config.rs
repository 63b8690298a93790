use envconfig::Envconfig;

use crate::error::Error;

// 16 is deep enough for most call paths, not counting recursion. Deeper stacks
// are handled by growing the buffer.
pub const DEFAULT_INITIAL_DEPTH: usize = 16;

// With 8-byte frame ids the first retry allocates 128 KiB and the second 128 MiB,
// so a stack of practically any depth is captured within two retries.
pub const DEFAULT_GROWTH_FACTOR: usize = 1024;

#[derive(Envconfig, Clone, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    #[envconfig(from = "THROWABLE_INITIAL_CAPTURE_DEPTH", default = "16")]
    pub initial_depth: usize,

    #[envconfig(from = "THROWABLE_CAPTURE_GROWTH_FACTOR", default = "1024")]
    pub growth_factor: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            initial_depth: DEFAULT_INITIAL_DEPTH,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl CaptureConfig {
    pub fn init_validated() -> Result<Self, Error> {
        let config = Self::init_from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.initial_depth == 0 {
            return Err(Error::InvalidConfig(
                "initial_depth must be at least 1".to_string(),
            ));
        }
        if self.growth_factor < 2 {
            return Err(Error::InvalidConfig(format!(
                "growth_factor must be at least 2, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }
}
