//! INI parsing: the single place where key names map to struct fields.

use ini::Ini;
use reqwest::Url;

use super::file::ConfigFileError;
use super::settings::TerraloadConfig;

/// Parses an `Ini` into a [`TerraloadConfig`].
///
/// Starts from `TerraloadConfig::default()` and overlays any values found.
/// Unknown sections and keys are ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<TerraloadConfig, ConfigFileError> {
    let mut config = TerraloadConfig::default();

    // [scheduler] section
    if let Some(section) = ini.section(Some("scheduler")) {
        if let Some(v) = section.get("max_requests") {
            config.scheduler.max_requests = parse_count("scheduler", "max_requests", v)?;
        }
        if let Some(v) = section.get("max_requests_per_server") {
            config.scheduler.max_requests_per_server =
                parse_count("scheduler", "max_requests_per_server", v)?;
        }
        if let Some(v) = section.get("throttle_requests") {
            config.scheduler.throttle_requests = parse_bool("scheduler", "throttle_requests", v)?;
        }
        if let Some(v) = section.get("request_queue_length") {
            config.scheduler.request_queue_length =
                parse_count("scheduler", "request_queue_length", v)?;
        }
        if let Some(v) = section.get("debug_show_statistics") {
            config.scheduler.debug_show_statistics =
                parse_bool("scheduler", "debug_show_statistics", v)?;
        }
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if Url::parse(v).is_err() {
                return Err(ConfigFileError::InvalidValue {
                    section: "scheduler".to_string(),
                    key: "base_url".to_string(),
                    value: v.to_string(),
                    reason: "must be an absolute URL such as 'http://localhost/'".to_string(),
                });
            }
            config.scheduler.base_url = v.to_string();
        }
        if let Some(v) = section.get("completed_event_capacity") {
            config.scheduler.completed_event_capacity =
                parse_count("scheduler", "completed_event_capacity", v)?;
        }
    }

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = section.get("tile_cache_size") {
            config.tiles.tile_cache_size = parse_count("tiles", "tile_cache_size", v)?;
        }
        if let Some(v) = section.get("max_level") {
            config.tiles.max_level =
                v.trim()
                    .parse()
                    .map_err(|_| ConfigFileError::InvalidValue {
                        section: "tiles".to_string(),
                        key: "max_level".to_string(),
                        value: v.to_string(),
                        reason: "must be a non-negative integer".to_string(),
                    })?;
        }
    }

    Ok(config)
}

fn parse_count(section: &str, key: &str, value: &str) -> Result<usize, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a non-negative integer".to_string(),
        })
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<TerraloadConfig, ConfigFileError> {
        parse_ini(&Ini::load_from_str(content).unwrap())
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), TerraloadConfig::default());
    }

    #[test]
    fn test_scheduler_section_overrides_defaults() {
        let config = parse(
            "[scheduler]\n\
             max_requests = 8\n\
             max_requests_per_server = 2\n\
             throttle_requests = false\n\
             request_queue_length = 40\n\
             debug_show_statistics = yes\n\
             base_url = https://maps.example.com/viewer/\n",
        )
        .unwrap();

        assert_eq!(config.scheduler.max_requests, 8);
        assert_eq!(config.scheduler.max_requests_per_server, 2);
        assert!(!config.scheduler.throttle_requests);
        assert_eq!(config.scheduler.request_queue_length, 40);
        assert!(config.scheduler.debug_show_statistics);
        assert_eq!(config.scheduler.base_url, "https://maps.example.com/viewer/");
    }

    #[test]
    fn test_completed_event_capacity() {
        let config = parse("[scheduler]\ncompleted_event_capacity = 16\n").unwrap();
        assert_eq!(config.scheduler.completed_event_capacity, 16);
    }

    #[test]
    fn test_tiles_section() {
        let config = parse("[tiles]\ntile_cache_size = 250\nmax_level = 12\n").unwrap();
        assert_eq!(config.tiles.tile_cache_size, 250);
        assert_eq!(config.tiles.max_level, 12);
    }

    #[test]
    fn test_invalid_count_reports_section_and_key() {
        let err = parse("[scheduler]\nmax_requests = many\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section,
                key,
                value,
                ..
            } => {
                assert_eq!(section, "scheduler");
                assert_eq!(key, "max_requests");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let err = parse("[scheduler]\nthrottle_requests = maybe\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "throttle_requests"
        ));
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let err = parse("[scheduler]\nbase_url = /viewer/\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "base_url"
        ));
    }
}
