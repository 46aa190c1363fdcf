//! Constants used throughout the front-desk core crate.

/// Table file for patient rows.
pub const PATIENTS_TABLE_FILENAME: &str = "patients.yaml";

/// Table file for OPD appointment rows.
pub const APPOINTMENTS_TABLE_FILENAME: &str = "appointments.yaml";

/// Table file for bed rows.
pub const BEDS_TABLE_FILENAME: &str = "beds.yaml";

/// Table file for admission rows.
pub const ADMISSIONS_TABLE_FILENAME: &str = "admissions.yaml";

/// Table file for inventory rows.
pub const INVENTORY_TABLE_FILENAME: &str = "inventory.yaml";

/// Items with strictly fewer units than this are reported as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Items expiring within this many days are reported as expiring soon.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 30;

/// Upper bound accepted for the expiry window.
pub const MAX_EXPIRY_WINDOW_DAYS: u32 = 3650;

/// Number of discharges shown in the recent discharges view.
pub const RECENT_DISCHARGES_LIMIT: usize = 10;

/// First queue number handed out when nobody is waiting.
pub const FIRST_QUEUE_NUMBER: u32 = 1;
