//! Configuration integration tests
//!
//! Loading from files and the environment, then building a working manager.

#[cfg(test)]
mod tests {
    use gateway_balancer::config::{BalancerConfig, ServiceConfig};
    use gateway_balancer::{Algorithm, BalancerError, Config, LoadBalancerManager};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXAMPLE: &str = include_str!("../../config/balancer.example.yaml");

    /// The shipped example file parses and matches the built-in defaults
    #[test]
    fn test_example_config_matches_defaults() {
        let config = Config::from_yaml_str(EXAMPLE).unwrap();
        assert_eq!(config.balancer, BalancerConfig::default());
        assert_eq!(config.services.len(), 2);

        let orders = &config.services[0];
        assert_eq!(orders.name, "orders");
        assert_eq!(orders.algorithm, Some(Algorithm::WeightedRoundRobin));
        assert_eq!(orders.instances[0].weight, 300);

        let carts = &config.services[1];
        assert_eq!(carts.session_affinity, Some(true));
        assert!(!carts.instances[2].enabled);
    }

    /// Services from a config file are routable immediately
    #[tokio::test]
    async fn test_manager_from_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).await.unwrap();
        let manager = LoadBalancerManager::from_config(&config).unwrap();

        assert_eq!(manager.algorithm("orders"), Algorithm::WeightedRoundRobin);
        assert_eq!(manager.algorithm("carts"), Algorithm::LeastConnections);
        assert!(manager.session_affinity_enabled("carts"));
        assert!(!manager.session_affinity_enabled("orders"));

        for _ in 0..20 {
            let instance = manager.select_instance("carts", "").unwrap();
            assert_ne!(instance.host(), "10.0.1.3:8080");
            manager.report_outcome(
                "carts",
                instance.host(),
                true,
                std::time::Duration::from_millis(3),
            );
        }

        let global = manager.get_global_stats();
        assert_eq!(global.total_services, 2);
        assert_eq!(global.total_instances, 5);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = Config::from_file("/nonexistent/balancer.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, BalancerError::Io(_)));
    }

    /// Environment variables override values read from the file
    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::from_yaml_str(EXAMPLE).unwrap();
        config
            .apply_env_overrides([
                ("BALANCER_DEFAULT_ALGORITHM", "health-aware"),
                ("BALANCER_FAILURE_THRESHOLD", "2"),
                ("BALANCER_AFFINITY_ENABLED", "true"),
                ("UNRELATED", "ignored"),
            ])
            .unwrap();
        config.validate().unwrap();

        assert_eq!(config.balancer.default_algorithm, Algorithm::HealthAware);
        assert_eq!(config.balancer.circuit_breaker.failure_threshold, 2);
        assert!(config.balancer.affinity.enabled);
        assert_eq!(config.services.len(), 2);
    }

    #[test]
    fn test_env_rejects_unknown_algorithm() {
        let err = Config::from_env_vars([("BALANCER_DEFAULT_ALGORITHM", "fastest")]).unwrap_err();
        assert!(matches!(err, BalancerError::UnknownAlgorithm(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        assert!(Config::from_env_vars([("BALANCER_HALF_OPEN_WEIGHT", "1.5")]).is_err());
        assert!(Config::from_env_vars([("BALANCER_FAILURE_THRESHOLD", "zero")]).is_err());
    }

    #[test]
    fn test_duplicate_services_rejected() {
        let yaml = r#"
services:
  - name: orders
  - name: orders
"#;
        let err = Config::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate service name"));
    }

    /// A later file overrides services by name and keeps the rest
    #[test]
    fn test_merge_layers_services() {
        let base = Config::from_yaml_str(EXAMPLE).unwrap();
        let overlay = Config {
            services: vec![
                ServiceConfig::new("orders").with_algorithm(Algorithm::RoundRobin),
                ServiceConfig::new("search"),
            ],
            ..Default::default()
        };

        let merged = base.merge(overlay);
        let names: Vec<&str> = merged.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["carts", "orders", "search"]);
        let orders = merged.services.iter().find(|s| s.name == "orders").unwrap();
        assert_eq!(orders.algorithm, Some(Algorithm::RoundRobin));
        assert!(orders.instances.is_empty());
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let config = Config::from_yaml_str(EXAMPLE).unwrap();
        let reparsed = Config::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }
}
