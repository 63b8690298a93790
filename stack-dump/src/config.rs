use envconfig::Envconfig;
use throwable::CaptureConfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    // How deep to recurse before throwing, to show recursion being collapsed
    #[envconfig(default = "20")]
    pub recursion_depth: usize,

    // Frame limit used for the bounded capture
    #[envconfig(default = "10")]
    pub depth_limit: usize,

    #[envconfig(default = "false")]
    pub symbolize: bool,

    #[envconfig(nested = true)]
    pub capture: CaptureConfig,
}
