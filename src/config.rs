use std::fs;
use std::path::Path;

use yaml_rust::{Yaml, YamlLoader};

use super::config_utils;
use super::error::ConfigError;


/// Global path-finding parameters shared by every search in a run.
#[derive(Clone, Debug, PartialEq)]
pub struct PathfinderConfig {
    /// minutes; width of the departure/arrival window kept in a hyperlink bucket
    pub time_window: f64,
    /// minutes; slack required before a bumped rider's recorded arrival
    pub bump_buffer: f64,
    /// number of randomized walks used to build a hyperpath path set
    pub stochastic_pathset_size: usize,
    /// logit scale parameter (theta)
    pub stochastic_dispersion: f64,
    /// cap on how many times a stop bucket may be processed.  None means no cap.
    pub stochastic_max_stop_process_count: Option<u32>,
    pub min_path_probability: f64,
    /// None means no cap on the number of retained paths
    pub max_num_paths: Option<usize>,
    /// longest walk the enumerator takes before giving up on an attempt
    pub max_path_legs: usize,
}

impl Default for PathfinderConfig {
    fn default() -> PathfinderConfig {
        return PathfinderConfig {
            time_window: 30.,
            bump_buffer: 5.,
            stochastic_pathset_size: 1000,
            stochastic_dispersion: 1.,
            stochastic_max_stop_process_count: None,
            min_path_probability: 0.005,
            max_num_paths: None,
            max_path_legs: 64,
        };
    }
}

impl PathfinderConfig {
    /// Reads the config from a yaml mapping.  Keys that are absent keep their defaults.
    pub fn from_yaml(yaml_cfg: &Yaml) -> Result<PathfinderConfig, ConfigError> {
        let mut cfg = PathfinderConfig::default();
        if let Some(tw) = config_utils::yaml_minutes(yaml_cfg, "time_window")? {
            cfg.time_window = tw;
        }
        if let Some(bb) = config_utils::yaml_minutes(yaml_cfg, "bump_buffer")? {
            cfg.bump_buffer = bb;
        }
        if let Some(size) = config_utils::yaml_usize(yaml_cfg, "stochastic_pathset_size")? {
            cfg.stochastic_pathset_size = size;
        }
        if let Some(theta) = config_utils::yaml_f64(yaml_cfg, "stochastic_dispersion")? {
            cfg.stochastic_dispersion = theta;
        }
        if let Some(count) =
            config_utils::yaml_usize(yaml_cfg, "stochastic_max_stop_process_count")? {
            // non-positive caps mean "unlimited"
            cfg.stochastic_max_stop_process_count = match count {
                0 => None,
                cc => Some(cc as u32),
            };
        }
        if let Some(prob) = config_utils::yaml_f64(yaml_cfg, "min_path_probability")? {
            cfg.min_path_probability = prob;
        }
        if let Some(max_paths) = config_utils::yaml_usize(yaml_cfg, "max_num_paths")? {
            cfg.max_num_paths = match max_paths {
                0 => None,
                mm => Some(mm),
            };
        }
        if let Some(max_legs) = config_utils::yaml_usize(yaml_cfg, "max_path_legs")? {
            cfg.max_path_legs = max_legs;
        }
        cfg.validate()?;
        return Ok(cfg);
    }

    pub fn from_yaml_str(yaml_str: &str) -> Result<PathfinderConfig, ConfigError> {
        let docs = YamlLoader::load_from_str(yaml_str)?;
        match docs.first() {
            Some(doc) => PathfinderConfig::from_yaml(doc),
            None => Err(ConfigError::Empty),
        }
    }

    pub fn from_file(path: &Path) -> Result<PathfinderConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loading path-finding config from {:?}", path);
        return PathfinderConfig::from_yaml_str(&contents);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |ok: bool, key: &str, reason: &str| -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: reason.to_string(),
                })
            }
        };
        check(self.time_window > 0., "time_window", "must be positive")?;
        check(self.bump_buffer >= 0., "bump_buffer", "must not be negative")?;
        check(self.stochastic_dispersion > 0., "stochastic_dispersion", "must be positive")?;
        check(self.stochastic_pathset_size > 0, "stochastic_pathset_size",
              "must be positive")?;
        check(self.min_path_probability > 0. && self.min_path_probability < 1.,
              "min_path_probability", "must lie strictly between 0 and 1")?;
        check(self.max_path_legs > 0, "max_path_legs", "must be positive")?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = PathfinderConfig::default();
        assert_eq!(cfg.time_window, 30.);
        assert_eq!(cfg.bump_buffer, 5.);
        assert_eq!(cfg.stochastic_pathset_size, 1000);
        assert_eq!(cfg.stochastic_max_stop_process_count, None);
        assert_eq!(cfg.max_num_paths, None);
        assert!(cfg.validate().is_ok());

        // an empty mapping gives the defaults back
        let cfg2 = PathfinderConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, cfg2);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = "
time_window: 45
bump_buffer: \"00:02:30\"
stochastic_pathset_size: 200
stochastic_dispersion: 0.5
stochastic_max_stop_process_count: 0
min_path_probability: 0.01
max_num_paths: 5
";
        let cfg = PathfinderConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.time_window, 45.);
        assert_eq!(cfg.bump_buffer, 2.5);
        assert_eq!(cfg.stochastic_pathset_size, 200);
        assert_eq!(cfg.stochastic_dispersion, 0.5);
        assert_eq!(cfg.stochastic_max_stop_process_count, None);
        assert_eq!(cfg.min_path_probability, 0.01);
        assert_eq!(cfg.max_num_paths, Some(5));
        assert_eq!(cfg.max_path_legs, 64);
    }

    #[test]
    fn test_invalid_values() {
        assert!(PathfinderConfig::from_yaml_str("time_window: -3").is_err());
        assert!(PathfinderConfig::from_yaml_str("stochastic_dispersion: fast").is_err());
        assert!(PathfinderConfig::from_yaml_str("min_path_probability: 1.5").is_err());
        assert!(PathfinderConfig::from_yaml_str("time_window: [1, 2").is_err());
        match PathfinderConfig::from_yaml_str("") {
            Err(ConfigError::Empty) => (),
            other => panic!("expected an empty-config error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time_window: 20\nmax_path_legs: 12").unwrap();
        let cfg = PathfinderConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.time_window, 20.);
        assert_eq!(cfg.max_path_legs, 12);

        let missing = Path::new("/nonexistent/pathfinder.yaml");
        match PathfinderConfig::from_file(missing) {
            Err(ConfigError::Io { path, .. }) => assert_eq!(path, missing.to_path_buf()),
            other => panic!("expected an io error, got {:?}", other),
        }
    }
}
