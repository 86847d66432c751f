//! Service settings read from the environment.
use std::net::SocketAddr;

use crate::{ClientConfig, Error, Result};

pub const SERVER_SECRET_KEY_VAR: &str = "STATSIG_SERVER_API_KEY";
pub const CLIENT_KEY_VAR: &str = "STATSIG_CLIENT_KEY";
pub const EDGE_CONFIG_VAR: &str = "EDGE_CONFIG";
pub const EDGE_CONFIG_ITEM_KEY_VAR: &str = "EDGE_CONFIG_ITEM_KEY";
pub const BIND_ADDRESS_VAR: &str = "BIND_ADDRESS";
pub const API_URL_VAR: &str = "STATSIG_API_URL";
pub const LOCAL_MODE_VAR: &str = "STATSIG_LOCAL_MODE";

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Clone)]
pub struct Settings {
    pub server_secret_key: String,
    /// Public key handed to the browser SDK.
    pub client_key: String,
    /// Edge Config connection string.
    pub edge_config: String,
    /// Edge Config item holding the config specs.
    pub edge_config_item_key: String,
    pub bind_address: SocketAddr,
    pub api_url: String,
    pub local_mode: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("client_key", &self.client_key)
            .field("edge_config_item_key", &self.edge_config_item_key)
            .field("bind_address", &self.bind_address)
            .field("api_url", &self.api_url)
            .field("local_mode", &self.local_mode)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Settings> {
        Settings::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Settings> {
        let optional = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let required = |name: &'static str| optional(name).ok_or(Error::MissingEnvVar(name));

        let bind_address = optional(BIND_ADDRESS_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned())
            .parse::<SocketAddr>()
            .map_err(Error::InvalidBindAddress)?;

        Ok(Settings {
            server_secret_key: required(SERVER_SECRET_KEY_VAR)?,
            client_key: required(CLIENT_KEY_VAR)?,
            edge_config: required(EDGE_CONFIG_VAR)?,
            edge_config_item_key: required(EDGE_CONFIG_ITEM_KEY_VAR)?,
            bind_address,
            api_url: optional(API_URL_VAR).unwrap_or_else(|| ClientConfig::DEFAULT_API_URL.to_owned()),
            local_mode: optional(LOCAL_MODE_VAR)
                .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        (SERVER_SECRET_KEY_VAR, "secret-abc"),
        (CLIENT_KEY_VAR, "client-abc"),
        (EDGE_CONFIG_VAR, "edge-config:id=ecfg_1&token=t"),
        (EDGE_CONFIG_ITEM_KEY_VAR, "statsig-config"),
    ];

    #[test]
    fn reads_required_and_defaults() {
        let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(settings.server_secret_key, "secret-abc");
        assert_eq!(settings.client_key, "client-abc");
        assert_eq!(settings.edge_config_item_key, "statsig-config");
        assert_eq!(settings.bind_address, DEFAULT_BIND_ADDRESS.parse::<SocketAddr>().unwrap());
        assert_eq!(settings.api_url, ClientConfig::DEFAULT_API_URL);
        assert!(!settings.local_mode);
    }

    #[test]
    fn reports_each_missing_variable() {
        for skipped in 0..REQUIRED.len() {
            let vars: Vec<_> = REQUIRED
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skipped)
                .map(|(_, var)| *var)
                .collect();

            let err = Settings::from_lookup(lookup(&vars)).unwrap_err();

            assert!(matches!(err, Error::MissingEnvVar(name) if name == REQUIRED[skipped].0));
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[0].1 = "";

        assert!(matches!(
            Settings::from_lookup(lookup(&vars)),
            Err(Error::MissingEnvVar(SERVER_SECRET_KEY_VAR))
        ));
    }

    #[test]
    fn reads_optional_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.push((BIND_ADDRESS_VAR, "127.0.0.1:8080"));
        vars.push((API_URL_VAR, "http://localhost:9000/v1"));
        vars.push((LOCAL_MODE_VAR, "true"));

        let settings = Settings::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(settings.bind_address.port(), 8080);
        assert_eq!(settings.api_url, "http://localhost:9000/v1");
        assert!(settings.local_mode);
    }

    #[test]
    fn rejects_bad_bind_address() {
        let mut vars = REQUIRED.to_vec();
        vars.push((BIND_ADDRESS_VAR, "nowhere"));

        assert!(matches!(
            Settings::from_lookup(lookup(&vars)),
            Err(Error::InvalidBindAddress(_))
        ));
    }

    #[test]
    fn debug_hides_secrets() {
        let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();
        let debug = format!("{:?}", settings);

        assert!(!debug.contains("secret-abc"));
        assert!(!debug.contains("token"));
    }
}
