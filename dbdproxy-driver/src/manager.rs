//! Driver selection by URL

use std::sync::Arc;

use dbdproxy_core::{DbdError, DbdErrorKind, ProxyResult};

use crate::traits::{Credentials, DbConnection, Driver};

/// Ordered list of drivers; the first one accepting a URL wins
#[derive(Clone, Default)]
pub struct DriverManager {
    drivers: Vec<Arc<dyn Driver>>,
}

impl DriverManager {
    /// A manager with no drivers
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager with every driver compiled into this build
    pub fn with_default_drivers() -> Self {
        #[allow(unused_mut)]
        let mut manager = Self::new();
        #[cfg(feature = "sqlite")]
        manager.register(Arc::new(crate::sqlite::SqliteDriver::new()));
        manager
    }

    /// Add a driver after those already registered
    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        log::debug!("registered driver {}", driver.name());
        self.drivers.push(driver);
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// First registered driver accepting `url`
    pub fn driver_for(&self, url: &str) -> Option<&Arc<dyn Driver>> {
        self.drivers.iter().find(|driver| driver.accepts_url(url))
    }

    /// Connect to `url` with the first driver that accepts it
    ///
    /// # Errors
    /// * `NoSuitableDriver` if no registered driver accepts the URL
    /// * The driver's error if the connection fails
    pub fn connect(&self, url: &str, credentials: &Credentials) -> ProxyResult<Box<dyn DbConnection>> {
        let driver = self
            .driver_for(url)
            .ok_or_else(|| DbdError::with_args(DbdErrorKind::NoSuitableDriver, [url]))?;
        log::debug!("connecting to {} with driver {}", url, driver.name());
        Ok(driver.connect(url, credentials)?)
    }
}

impl std::fmt::Debug for DriverManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.drivers.iter().map(|d| d.name()).collect();
        f.debug_struct("DriverManager").field("drivers", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockDriver;
    use dbdproxy_core::{DbError, ProxyError};

    fn declining(name: &'static str) -> MockDriver {
        let mut driver = MockDriver::new();
        driver.expect_name().return_const(name.to_string());
        driver.expect_accepts_url().return_const(false);
        driver.expect_connect().never();
        driver
    }

    #[test]
    fn test_no_suitable_driver() {
        let mut manager = DriverManager::new();
        manager.register(Arc::new(declining("a")));
        let err = manager
            .connect("jdbc:nothing:here", &Credentials::default())
            .err()
            .unwrap();
        match err {
            ProxyError::Dbd(e) => {
                assert_eq!(e.kind(), DbdErrorKind::NoSuitableDriver);
                assert!(e.message().contains("jdbc:nothing:here"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_first_accepting_driver_connects() {
        let mut accepting = MockDriver::new();
        accepting.expect_name().return_const("b".to_string());
        accepting
            .expect_accepts_url()
            .withf(|url| url.starts_with("jdbc:b:"))
            .return_const(true);
        accepting
            .expect_connect()
            .withf(|url, creds| url == "jdbc:b:db" && creds.user.as_deref() == Some("scott"))
            .times(1)
            .returning(|_, _| Err(DbError::new("login refused").with_sql_state("28000")));

        let mut manager = DriverManager::new();
        manager.register(Arc::new(declining("a")));
        manager.register(Arc::new(accepting));
        assert_eq!(manager.len(), 2);

        let creds = Credentials::new(Some("scott".into()), Some("tiger".into()));
        let err = manager.connect("jdbc:b:db", &creds).err().unwrap();
        match err {
            ProxyError::Database(e) => {
                assert_eq!(e.message(), "login refused");
                assert_eq!(e.sql_state(), Some("28000"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_credentials_mode() {
        let props = Credentials::default().with_properties(vec![("Timeout".into(), "5".into())]);
        assert!(props.uses_properties());
        assert_eq!(props.property("timeout"), Some("5"));
        assert!(!Credentials::new(Some("u".into()), None).uses_properties());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_default_drivers_accept_sqlite() {
        let manager = DriverManager::with_default_drivers();
        assert!(manager.driver_for("jdbc:sqlite::memory:").is_some());
        assert!(manager.driver_for("jdbc:oracle:thin:@db").is_none());
    }
}
