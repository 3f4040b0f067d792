use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use typed_builder::TypedBuilder;

use framepump_chip8::{Chip8App, SCREEN_SCALE};
use framepump_common::app::App;
use framepump_common::{CadenceConfig, ConfigError};
use framepump_sdl2::{SdlContext, SdlInitInfo};

pub const USAGE: &str = "usage: framepump [ROM] [--steps N] [--scale N]";

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct HarnessConfig {
    #[builder(default)]
    pub rom_path: Option<PathBuf>,
    #[builder(default)]
    pub cadence: CadenceConfig,
    #[builder(default = SCREEN_SCALE)]
    pub scale: u32,
}

impl HarnessConfig {
    /// Parse command-line arguments (without the program name).
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut rom_path = None;
        let mut cadence = CadenceConfig::default();
        let mut scale = SCREEN_SCALE;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--steps" => {
                    let steps = parse_number(&arg, args.next())?;
                    cadence = CadenceConfig::new(steps)?;
                }
                "--scale" => {
                    scale = parse_number(&arg, args.next())?;
                    if scale == 0 {
                        return Err(ConfigError::ZeroScale.into());
                    }
                }
                flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
                path if rom_path.is_none() => rom_path = Some(PathBuf::from(path)),
                extra => bail!("unexpected argument '{}'", extra),
            }
        }

        Ok(Self::builder()
            .rom_path(rom_path)
            .cadence(cadence)
            .scale(scale)
            .build())
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let value = value.with_context(|| format!("{} needs a value", flag))?;
    value
        .parse()
        .ok()
        .with_context(|| format!("invalid value '{}' for {}", value, flag))
}

pub fn run(config: HarnessConfig) -> Result<()> {
    let mut app = Chip8App::new(config.cadence, config.scale);
    if let Some(path) = config.rom_path.as_deref() {
        log::info!("Playing ROM path: '{}'", path.display());
        // A bad ROM on the command line is not fatal: the window opens idle.
        if let Err(err) = app.load_program(Some(path)) {
            log::error!("{}", err);
        }
    }

    let init_info = SdlInitInfo::builder()
        .width(app.width())
        .height(app.height())
        .scale(app.scale())
        .title(app.title())
        .build();
    SdlContext::run(init_info, app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<HarnessConfig> {
        HarnessConfig::from_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.rom_path, None);
        assert_eq!(config.cadence.steps_per_frame(), 10);
        assert_eq!(config.scale, SCREEN_SCALE);
        assert_eq!(config, HarnessConfig::builder().build());
    }

    #[test]
    fn rom_and_flags() {
        let config = parse(&["pong.ch8", "--steps", "12", "--scale", "8"]).unwrap();
        assert_eq!(config.rom_path, Some(PathBuf::from("pong.ch8")));
        assert_eq!(config.cadence.steps_per_frame(), 12);
        assert_eq!(config.scale, 8);
    }

    #[test]
    fn zero_values_are_rejected() {
        let err = parse(&["--steps", "0"]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroStepsPerFrame)
        );
        let err = parse(&["--scale", "0"]).unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::ZeroScale));
    }

    #[test]
    fn malformed_arguments() {
        assert!(parse(&["--steps"]).is_err());
        assert!(parse(&["--steps", "ten"]).is_err());
        assert!(parse(&["--fast"]).is_err());
        assert!(parse(&["a.ch8", "b.ch8"]).is_err());
    }
}
