use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static MOBILE_USER_AGENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)android|iphone|ipad|ipod|mobile|silk|opera mini|iemobile").unwrap()
});

/// Pixel allowances used while scaling. The values are empirical; every one
/// of them can be overridden from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// Extra right/bottom extent reserved for scrollbars of charts and tables.
    pub table_edge_padding: i32,
    /// Extra right extent reserved for the thumb of a time slider.
    pub time_slider_edge_padding: i32,
    /// Margin kept free when a data widget is the right-most or bottom-most.
    pub data_offset: i32,
    pub data_offset_mobile: i32,
    /// Margin kept free when a control is the right-most or bottom-most.
    pub control_offset: i32,
    pub scrollbar_width: i32,
    pub scrollbar_width_mobile: i32,
    /// Horizontal room left around a floating widget wider than the viewport.
    pub floating_margin: i32,
    /// Drop-down selection members shorter than this keep their height.
    pub min_row_height: i32,
    pub default_column_width: i32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            table_edge_padding: 10,
            time_slider_edge_padding: 8,
            data_offset: 10,
            data_offset_mobile: 20,
            control_offset: 5,
            scrollbar_width: 17,
            scrollbar_width_mobile: 10,
            floating_margin: 40,
            min_row_height: 18,
            default_column_width: 80,
        }
    }
}

impl ScaleConfig {
    pub fn scrollbar_allowance(&self, mobile: bool) -> i32 {
        if mobile {
            self.scrollbar_width_mobile
        } else {
            self.scrollbar_width
        }
    }

    pub fn data_offset_for(&self, mobile: bool) -> i32 {
        if mobile {
            self.data_offset_mobile
        } else {
            self.data_offset
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: i32,
    pub height: Option<i32>,
    pub mobile: bool,
    pub user_agent: Option<String>,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: Some(800),
            mobile: false,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub scale: ScaleConfig,
    pub viewport: ViewportConfig,
}

/// Mobile browsers overlay thin scrollbars; they get the mobile allowance.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    MOBILE_USER_AGENT_RE.is_match(user_agent)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScaleConfigFile {
    table_edge_padding: Option<i32>,
    time_slider_edge_padding: Option<i32>,
    data_offset: Option<i32>,
    data_offset_mobile: Option<i32>,
    control_offset: Option<i32>,
    scrollbar_width: Option<i32>,
    scrollbar_width_mobile: Option<i32>,
    floating_margin: Option<i32>,
    min_row_height: Option<i32>,
    default_column_width: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewportConfigFile {
    width: Option<i32>,
    height: Option<i32>,
    mobile: Option<bool>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    scale: Option<ScaleConfigFile>,
    viewport: Option<ViewportConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(scale) = parsed.scale {
        let target = &mut config.scale;
        if let Some(v) = scale.table_edge_padding {
            target.table_edge_padding = v;
        }
        if let Some(v) = scale.time_slider_edge_padding {
            target.time_slider_edge_padding = v;
        }
        if let Some(v) = scale.data_offset {
            target.data_offset = v;
        }
        if let Some(v) = scale.data_offset_mobile {
            target.data_offset_mobile = v;
        }
        if let Some(v) = scale.control_offset {
            target.control_offset = v;
        }
        if let Some(v) = scale.scrollbar_width {
            target.scrollbar_width = v;
        }
        if let Some(v) = scale.scrollbar_width_mobile {
            target.scrollbar_width_mobile = v;
        }
        if let Some(v) = scale.floating_margin {
            target.floating_margin = v;
        }
        if let Some(v) = scale.min_row_height {
            target.min_row_height = v;
        }
        if let Some(v) = scale.default_column_width {
            target.default_column_width = v;
        }
    }

    if let Some(viewport) = parsed.viewport {
        if let Some(v) = viewport.width {
            config.viewport.width = v;
        }
        if viewport.height.is_some() {
            config.viewport.height = viewport.height;
        }
        if let Some(v) = viewport.mobile {
            config.viewport.mobile = v;
        }
        if viewport.user_agent.is_some() {
            config.viewport.user_agent = viewport.user_agent;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config = parse_config(
            r#"{ "scale": { "scrollbarWidth": 15 }, "viewport": { "width": 640, "mobile": true } }"#,
        )
        .unwrap();
        assert_eq!(config.scale.scrollbar_width, 15);
        assert_eq!(config.scale.scrollbar_width_mobile, 10);
        assert_eq!(config.viewport.width, 640);
        assert_eq!(config.viewport.height, Some(800));
        assert!(config.viewport.mobile);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn detects_mobile_user_agents() {
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15"
        ));
        assert!(is_mobile_user_agent("Mozilla/5.0 (Linux; Android 14; Pixel 8)"));
        assert!(!is_mobile_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0"
        ));
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_config("{ scale: ").is_err());
    }
}
