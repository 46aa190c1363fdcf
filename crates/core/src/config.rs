//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Core
//! code never reads process-wide environment variables during request handling; binaries call
//! [`CoreConfig::from_lookup`] with `std::env::var` and tests pass a closure over a map.

use crate::constants::{
    DEFAULT_EXPIRY_WINDOW_DAYS, DEFAULT_LOW_STOCK_THRESHOLD, MAX_EXPIRY_WINDOW_DAYS,
};
use crate::queue::QueueMode;
use crate::{FrontDeskError, FrontDeskResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Directory holding the table files. Unset means an in-memory store.
pub const ENV_DATA_DIR: &str = "FRONTDESK_DATA_DIR";
pub const ENV_QUEUE_MODE: &str = "FRONTDESK_QUEUE_MODE";
pub const ENV_APPOINTMENT_PATIENT_LINK: &str = "FRONTDESK_APPOINTMENT_PATIENT_LINK";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "FRONTDESK_LOW_STOCK_THRESHOLD";
pub const ENV_EXPIRY_WINDOW_DAYS: &str = "FRONTDESK_EXPIRY_WINDOW_DAYS";

/// Whether a booked appointment keeps a reference to its patient.
///
/// `Detached` stores no patient id on the appointment. Only the denormalised `patient_name`
/// remains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppointmentPatientLink {
    #[default]
    Enforce,
    Detached,
}

impl FromStr for AppointmentPatientLink {
    type Err = FrontDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforce" => Ok(Self::Enforce),
            "detached" => Ok(Self::Detached),
            other => Err(FrontDeskError::Validation(format!(
                "{ENV_APPOINTMENT_PATIENT_LINK} must be 'enforce' or 'detached', got '{other}'"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: Option<PathBuf>,
    queue_mode: QueueMode,
    patient_link: AppointmentPatientLink,
    low_stock_threshold: u32,
    expiry_window_days: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            queue_mode: QueueMode::default(),
            patient_link: AppointmentPatientLink::default(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        data_dir: Option<PathBuf>,
        queue_mode: QueueMode,
        patient_link: AppointmentPatientLink,
        low_stock_threshold: u32,
        expiry_window_days: u32,
    ) -> FrontDeskResult<Self> {
        if let Some(dir) = &data_dir {
            if dir.as_os_str().is_empty() {
                return Err(FrontDeskError::Validation(
                    "data directory cannot be empty".into(),
                ));
            }
        }

        if expiry_window_days > MAX_EXPIRY_WINDOW_DAYS {
            return Err(FrontDeskError::Validation(format!(
                "expiry window cannot exceed {MAX_EXPIRY_WINDOW_DAYS} days"
            )));
        }

        Ok(Self {
            data_dir,
            queue_mode,
            patient_link,
            low_stock_threshold,
            expiry_window_days,
        })
    }

    /// Builds a configuration from a key lookup, normally `|k| std::env::var(k).ok()`.
    ///
    /// Missing or blank values fall back to defaults. Values that are present but malformed are
    /// rejected so that a typo fails startup instead of silently changing behaviour.
    pub fn from_lookup<F>(lookup: F) -> FrontDeskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = value(ENV_DATA_DIR).map(PathBuf::from);
        let queue_mode = value(ENV_QUEUE_MODE)
            .map(|v| v.parse::<QueueMode>())
            .transpose()?
            .unwrap_or_default();
        let patient_link = value(ENV_APPOINTMENT_PATIENT_LINK)
            .map(|v| v.parse::<AppointmentPatientLink>())
            .transpose()?
            .unwrap_or_default();
        let low_stock_threshold = parse_u32(ENV_LOW_STOCK_THRESHOLD, value(ENV_LOW_STOCK_THRESHOLD))?
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        let expiry_window_days = parse_u32(ENV_EXPIRY_WINDOW_DAYS, value(ENV_EXPIRY_WINDOW_DAYS))?
            .unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);

        Self::new(
            data_dir,
            queue_mode,
            patient_link,
            low_stock_threshold,
            expiry_window_days,
        )
    }

    pub fn with_queue_mode(mut self, queue_mode: QueueMode) -> Self {
        self.queue_mode = queue_mode;
        self
    }

    pub fn with_patient_link(mut self, patient_link: AppointmentPatientLink) -> Self {
        self.patient_link = patient_link;
        self
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn queue_mode(&self) -> QueueMode {
        self.queue_mode
    }

    pub fn patient_link(&self) -> AppointmentPatientLink {
        self.patient_link
    }

    pub fn low_stock_threshold(&self) -> u32 {
        self.low_stock_threshold
    }

    pub fn expiry_window_days(&self) -> u32 {
        self.expiry_window_days
    }
}

fn parse_u32(key: &str, value: Option<String>) -> FrontDeskResult<Option<u32>> {
    value
        .map(|v| {
            v.parse::<u32>().map_err(|_| {
                FrontDeskError::Validation(format!(
                    "{key} must be a non-negative integer, got '{v}'"
                ))
            })
        })
        .transpose()
}
