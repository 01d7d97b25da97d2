use yaml_rust::Yaml;

use super::error::ConfigError;


fn invalid_value(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses a clock time of the form "HH:MM" or "HH:MM:SS" into minutes after midnight.
/// Hours past 23 are allowed, since service days run past midnight.
pub fn get_num_minutes_from_time_str(timestr: &str) -> Result<f64, ConfigError> {
    let parts: Vec<&str> = timestr.trim().split(":").collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(invalid_value(timestr, "expected HH:MM or HH:MM:SS"));
    }
    let mut nums = vec![];
    for part in parts.iter() {
        let num: u32 = part.parse().map_err(|_| invalid_value(timestr, "not a number"))?;
        nums.push(num as f64);
    }
    if nums[1] >= 60. || nums.get(2).map_or(false, |ss| *ss >= 60.) {
        return Err(invalid_value(timestr, "minutes and seconds must be below 60"));
    }
    let seconds = nums.get(2).copied().unwrap_or(0.);
    return Ok(nums[0] * 60. + nums[1] + seconds / 60.);
}

/// A floating-point value, accepting yaml integers too.  Missing keys give None.
pub fn yaml_f64(yaml_cfg: &Yaml, key: &str) -> Result<Option<f64>, ConfigError> {
    match &yaml_cfg[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(ii) => Ok(Some(*ii as f64)),
        Yaml::Real(_) => match yaml_cfg[key].as_f64() {
            Some(ff) => Ok(Some(ff)),
            None => Err(invalid_value(key, "unparseable real")),
        },
        _ => Err(invalid_value(key, "expected a number")),
    }
}

/// A duration in minutes, given either as a plain number or as an "HH:MM[:SS]" string.
pub fn yaml_minutes(yaml_cfg: &Yaml, key: &str) -> Result<Option<f64>, ConfigError> {
    match &yaml_cfg[key] {
        Yaml::String(ss) => get_num_minutes_from_time_str(ss).map(Some),
        _ => yaml_f64(yaml_cfg, key),
    }
}

pub fn yaml_usize(yaml_cfg: &Yaml, key: &str) -> Result<Option<usize>, ConfigError> {
    match &yaml_cfg[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(ii) if *ii >= 0 => Ok(Some(*ii as usize)),
        _ => Err(invalid_value(key, "expected a non-negative integer")),
    }
}
