use env_logger::Env;
use log::debug;

use crate::config::LoggerConfig;

const APP_CRATES: &[&str] = &["cryshim", "cryshim_core", "cryshim_abi", "cryshim_probe"];

/// Default filter directive; `RUST_LOG` replaces it entirely when set.
pub fn default_filter(config: &LoggerConfig) -> String {
    let mut filter = config.level_filter.to_string().to_lowercase();
    for krate in APP_CRATES {
        filter.push_str(&format!(",{krate}={}", config.app_level_filter.to_string().to_lowercase()));
    }
    filter
}

pub fn init_logging(config: &LoggerConfig) {
    let env = Env::default().default_filter_or(default_filter(config));
    if env_logger::Builder::from_env(env).format_timestamp_millis().try_init().is_err() {
        debug!("Logger already initialized");
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;

    use super::*;

    #[test]
    fn app_crates_get_their_own_level() {
        let config = LoggerConfig { app_level_filter: LevelFilter::Debug, level_filter: LevelFilter::Warn };
        assert_eq!(
            default_filter(&config),
            "warn,cryshim=debug,cryshim_core=debug,cryshim_abi=debug,cryshim_probe=debug"
        );
    }
}
