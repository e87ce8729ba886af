//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, DispatchBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<DispatchBlueprint, ContractError> {
    let result: Result<DispatchBlueprint, Box<dyn std::error::Error + Send + Sync>> = match format
    {
        ConfigFormat::Toml => toml::from_str(content).map_err(Into::into),
        ConfigFormat::Json => serde_json::from_str(content).map_err(Into::into),
    };

    result.map_err(|e| ContractError::ConfigParse {
        message: format!("{} parse error: {e}", format.label()),
        source: Some(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SmiType;

    #[test]
    fn test_parse_toml_children() {
        let content = r#"
[dispatcher]
capacity = 8

[[children]]
name = "watchdog"
smi_type = "tco_timeout"

[[children]]
name = "thermal"
smi_type = "thrm_sts"
owner = "acpi"
"#;
        let bp = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.dispatcher.capacity, 8);
        assert_eq!(bp.children.len(), 2);
        assert_eq!(bp.children[1].smi_type, SmiType::ThrmSts);
        assert_eq!(bp.children[1].owner.as_ref().unwrap().as_str(), "acpi");
    }

    #[test]
    fn test_parse_json_scenario() {
        let content = r#"{
            "children": [{ "name": "pme", "smi_type": "pme" }],
            "scenario": { "interval_ms": 1, "events": [{ "smi_type": "pme", "status": 4 }] }
        }"#;
        let bp = parse(content, ConfigFormat::Json).unwrap();
        let scenario = bp.scenario.unwrap();
        assert_eq!(scenario.interval_ms, 1);
        assert_eq!(scenario.events[0].status, 4);
    }

    #[test]
    fn test_parse_unknown_smi_type() {
        let content = r#"
[[children]]
name = "bad"
smi_type = "warp_drive"
"#;
        let err = parse(content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
