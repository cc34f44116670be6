use std::{fmt, sync};

use crate::error::{self, Error, ErrorCode};
use crate::scene;

type ErrorFunction = Box<dyn Fn(ErrorCode, &str) + Send + Sync>;

// Tunables parsed from the device configuration string
#[derive(Clone, Copy, PartialEq)]
#[derive(Debug)]
pub struct DeviceConfig {
    pub verbose: u32,
    pub leaf_size: usize,
    pub split_eps: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            verbose: 0,
            leaf_size: 2,
            split_eps: 0.0000001,
        }
    }
}

impl DeviceConfig {
    /// Parses a comma separated list of `key=value` pairs.
    /// Whitespace around keys and values is ignored, as are empty entries.
    pub fn parse(config: &str) -> error::Result<Self> {
        let mut parsed = Self::default();

        fn value<T: std::str::FromStr>(key: &str, value: &str) -> error::Result<T> {
            value.parse::<T>().map_err(|_| {
                Error::invalid_argument(format!("invalid value for {key}: {value}"))
            })
        }

        for entry in config.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((key, val)) = entry.split_once('=') else {
                return Err(Error::invalid_argument({
                    format!("expected key=value, found {entry}")
                }));
            };

            let (key, val) = (key.trim(), val.trim());

            match key {
                "verbose" => parsed.verbose = value(key, val)?,
                "leaf_size" => match value::<usize>(key, val)? {
                    0 => return Err(Error::invalid_argument("leaf_size must be at least 1")),
                    leaf_size => parsed.leaf_size = leaf_size,
                },
                "split_eps" => match value::<f32>(key, val)? {
                    eps if eps > 0. && eps.is_finite() => parsed.split_eps = eps,
                    _ => return Err(Error::invalid_argument("split_eps must be positive")),
                },
                _ => return Err(Error::invalid_argument({
                    format!("unknown device option {key}")
                })),
            }
        }

        Ok(parsed)
    }
}

struct DeviceInner {
    config: DeviceConfig,
    error_function: sync::RwLock<Option<ErrorFunction>>,
    last_error: sync::Mutex<Option<ErrorCode>>,
}

impl Drop for DeviceInner {
    fn drop(&mut self) {
        log::debug!("releasing device");
    }
}

/// Owns the build settings and the error channel shared by every scene
/// created from it. Cloning is cheap and shares the same device.
#[derive(Clone)]
pub struct Device {
    inner: sync::Arc<DeviceInner>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Device {
    pub fn new(config: Option<&str>) -> error::Result<Self> {
        let config = match config {
            Some(config) => DeviceConfig::parse(config).map_err(|e| {
                log::error!("cannot create device: {e}");
                e
            })?,
            None => DeviceConfig::default(),
        };

        log::debug!("created device {:?}", config);

        Ok(Self {
            inner: sync::Arc::new(DeviceInner {
                config,
                error_function: sync::RwLock::new(None),
                last_error: sync::Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> DeviceConfig {
        self.inner.config
    }

    pub fn set_error_function<F>(&self, f: F)
        where F: Fn(ErrorCode, &str) + Send + Sync + 'static {

        if let Ok(mut error_function) = self.inner.error_function.write() {
            *error_function = Some(Box::new(f));
        }
    }

    /// Returns the oldest error not yet read and clears it.
    pub fn take_error(&self) -> Option<ErrorCode> {
        self.inner.last_error.lock().ok()?.take()
    }

    pub fn create_scene(&self, flags: scene::SceneFlags) -> scene::Scene {
        scene::Scene::new(self.clone(), flags)
    }

    // Hands the error to the registered function and returns it
    // so that call sites can propagate it with `Err(device.report(..))`
    pub(crate) fn report(&self, error: Error) -> Error {
        if let Ok(mut last_error) = self.inner.last_error.lock() {
            last_error.get_or_insert(error.code);
        }

        match self.inner.error_function.read() {
            Ok(guard) => match guard.as_ref() {
                Some(f) => f(error.code, &error.message),
                None => log::error!("{error}"),
            },
            Err(_) => log::error!("{error}"),
        }

        error
    }

    #[cfg(test)]
    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        sync::Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_string() {
        let config = DeviceConfig::parse(" verbose=1, leaf_size = 4,").unwrap();

        assert_eq!(config.verbose, 1);
        assert_eq!(config.leaf_size, 4);
        assert_eq!(config.split_eps, DeviceConfig::default().split_eps);

        assert_eq!(DeviceConfig::parse("").unwrap(), DeviceConfig::default());
    }

    #[test]
    fn reject_bad_config() {
        for config in ["threads=4", "verbose", "leaf_size=0", "verbose=-1", "split_eps=0"] {
            let err = DeviceConfig::parse(config).unwrap_err();

            assert_eq!(err.code, ErrorCode::InvalidArgument, "{config}");
        }

        assert!(Device::new(Some("isa=avx")).is_err());
    }

    #[test]
    fn errors_reach_callback_and_stick() {
        let device = Device::new(None).unwrap();
        let seen = sync::Arc::new(sync::Mutex::new(Vec::new()));

        let sink = seen.clone();
        device.set_error_function(move |code, msg| {
            sink.lock().unwrap().push(format!("error {code}: {msg}"));
        });

        device.report(Error::invalid_operation("first"));
        device.report(Error::invalid_argument("second"));

        assert_eq!(*seen.lock().unwrap(), vec![
            "error 2: first".to_string(),
            "error 1: second".to_string(),
        ]);

        assert_eq!(device.take_error(), Some(ErrorCode::InvalidOperation));
        assert_eq!(device.take_error(), None);
    }

    #[test]
    fn clones_share_state() {
        let device = Device::new(None).unwrap();
        let other = device.clone();

        assert!(device.ptr_eq(&other));

        other.report(Error::new(ErrorCode::Unknown, "shared"));
        assert_eq!(device.take_error(), Some(ErrorCode::Unknown));
    }
}
