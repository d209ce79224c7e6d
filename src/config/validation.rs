use crate::config::types::{
    Config, CrawlerConfig, OrchestratorConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_orchestrator_config(&config.orchestrator)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and 10000, got {}",
            config.max_pages
        )));
    }

    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.crawl_timeout_secs < config.page_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "crawl_timeout_secs ({}) must be >= page_timeout_secs ({})",
            config.crawl_timeout_secs, config.page_timeout_secs
        )));
    }

    for ext in &config.excluded_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "excluded extension must look like '.pdf', got '{}'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates orchestrator configuration
fn validate_orchestrator_config(config: &OrchestratorConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1".to_string(),
        ));
    }

    if config.retention_secs < 1 {
        return Err(ConfigError::Validation(
            "retention_secs must be >= 1".to_string(),
        ));
    }

    if config.sweep_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "sweep_interval_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let paths = [
        ("database_path", &config.database_path),
        ("snapshot_dir", &config.snapshot_dir),
        ("site_tree_dir", &config.site_tree_dir),
    ];

    for (name, value) in paths {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ConfigError::Validation(format!("Invalid email format: '{}'", email)))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig {
                crawler_name: "SiteAtlas".to_string(),
                crawler_version: "0.1".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            orchestrator: OrchestratorConfig::default(),
            output: OutputConfig {
                database_path: "./atlas.db".to_string(),
                snapshot_dir: "./snapshots".to_string(),
                site_tree_dir: "./site-trees".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_max_pages_bounds() {
        let mut config = valid_config();
        config.crawler.max_pages = 0;
        assert!(validate(&config).is_err());

        config.crawler.max_pages = 10_001;
        assert!(validate(&config).is_err());

        config.crawler.max_pages = 10_000;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_crawl_timeout_must_cover_page_timeout() {
        let mut config = valid_config();
        config.crawler.page_timeout_secs = 30;
        config.crawler.crawl_timeout_secs = 10;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_page_timeout_rejected() {
        let mut config = valid_config();
        config.crawler.page_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_extension_needs_leading_dot() {
        let mut config = valid_config();
        config.crawler.excluded_extensions = vec!["pdf".to_string()];
        assert!(validate(&config).is_err());

        config.crawler.excluded_extensions = vec![".".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_orchestrator_limits() {
        let mut config = valid_config();
        config.orchestrator.max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.orchestrator.retention_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.orchestrator.sweep_interval_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.orchestrator.retry_delay_ms = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_crawler_name_characters() {
        let mut config = valid_config();
        config.user_agent.crawler_name = "Site Atlas".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = "site-atlas".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_contact_url() {
        let mut config = valid_config();
        config.user_agent.contact_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_output_path() {
        let mut config = valid_config();
        config.output.site_tree_dir = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }
}
