//! Read-only projections for the front-desk dashboard.
//!
//! Every function here is a pure filter over rows already fetched from the store. Nothing is
//! cached; callers re-fetch and re-project on every read.

use crate::models::{
    Admission, AdmissionStatus, Appointment, AppointmentStatus, Bed, BedStatus, InventoryItem,
    Patient,
};
use chrono::{Duration, NaiveDate};

fn with_status(rows: &[Appointment], status: AppointmentStatus) -> Vec<&Appointment> {
    let mut rows: Vec<&Appointment> = rows.iter().filter(|a| a.status == status).collect();
    rows.sort_by_key(|a| (a.queue_number, a.created_at));
    rows
}

/// Appointments still waiting, in queue order.
pub fn waiting_queue(appointments: &[Appointment]) -> Vec<&Appointment> {
    with_status(appointments, AppointmentStatus::Waiting)
}

pub fn in_consultation(appointments: &[Appointment]) -> Vec<&Appointment> {
    with_status(appointments, AppointmentStatus::InProgress)
}

/// Appointments completed whose scheduled time falls on `day` (UTC).
pub fn completed_on(appointments: &[Appointment], day: NaiveDate) -> Vec<&Appointment> {
    with_status(appointments, AppointmentStatus::Completed)
        .into_iter()
        .filter(|a| a.appointment_time.date_naive() == day)
        .collect()
}

pub fn available_beds(beds: &[Bed]) -> Vec<&Bed> {
    beds.iter()
        .filter(|b| b.status == BedStatus::Available)
        .collect()
}

pub fn occupied_beds(beds: &[Bed]) -> Vec<&Bed> {
    beds.iter()
        .filter(|b| b.status == BedStatus::Occupied)
        .collect()
}

pub fn current_admissions(admissions: &[Admission]) -> Vec<&Admission> {
    admissions.iter().filter(|a| a.is_admitted()).collect()
}

/// The latest `limit` discharges, most recently discharged first.
pub fn recent_discharges(admissions: &[Admission], limit: usize) -> Vec<&Admission> {
    let mut rows: Vec<&Admission> = admissions
        .iter()
        .filter(|a| a.status == AdmissionStatus::Discharged)
        .collect();
    rows.sort_by(|a, b| b.discharge_date.cmp(&a.discharge_date));
    rows.truncate(limit);
    rows
}

/// Items with strictly fewer than `threshold` units.
pub fn low_stock(items: &[InventoryItem], threshold: u32) -> Vec<&InventoryItem> {
    items
        .iter()
        .filter(|i| i.stock.units() < threshold)
        .collect()
}

/// Items whose expiry date is on or before `today + window_days`. Already expired items are
/// included.
pub fn expiring_soon(
    items: &[InventoryItem],
    today: NaiveDate,
    window_days: u32,
) -> Vec<&InventoryItem> {
    let cutoff = today + Duration::days(i64::from(window_days));
    items.iter().filter(|i| i.expiry_date <= cutoff).collect()
}

/// Sum of units across all items.
pub fn total_units(items: &[InventoryItem]) -> u64 {
    items.iter().map(|i| u64::from(i.stock.units())).sum()
}

/// Headline counts for the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct DashboardSummary {
    pub total_patients: usize,
    pub available_beds: usize,
    pub occupied_beds: usize,
    pub waiting_queue: usize,
    pub current_admissions: usize,
    pub low_stock_items: usize,
    pub expiring_items: usize,
}

impl DashboardSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        patients: &[Patient],
        appointments: &[Appointment],
        beds: &[Bed],
        admissions: &[Admission],
        inventory: &[InventoryItem],
        low_stock_threshold: u32,
        today: NaiveDate,
        expiry_window_days: u32,
    ) -> Self {
        Self {
            total_patients: patients.len(),
            available_beds: available_beds(beds).len(),
            occupied_beds: occupied_beds(beds).len(),
            waiting_queue: waiting_queue(appointments).len(),
            current_admissions: current_admissions(admissions).len(),
            low_stock_items: low_stock(inventory, low_stock_threshold).len(),
            expiring_items: expiring_soon(inventory, today, expiry_window_days).len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordId;
    use chrono::{TimeZone, Utc};
    use frontdesk_types::{NonEmptyText, StockLevel};

    fn item(name: &str, stock: u32, expiry: NaiveDate) -> InventoryItem {
        InventoryItem {
            id: RecordId::new(),
            name: NonEmptyText::new(name).unwrap(),
            stock: StockLevel::from(stock),
            expiry_date: expiry,
            unit: NonEmptyText::new("boxes").unwrap(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        let items = vec![
            item("Gauze", 9, date(2030, 1, 1)),
            item("Saline", 10, date(2030, 1, 1)),
        ];
        let low: Vec<_> = low_stock(&items, 10).iter().map(|i| i.name.as_str()).collect();
        assert_eq!(low, vec!["Gauze"]);
        assert_eq!(total_units(&items), 19);
    }

    #[test]
    fn expiring_soon_includes_boundary_and_expired() {
        let today = date(2026, 10, 19);
        let items = vec![
            item("Expired", 5, date(2026, 9, 1)),
            item("Boundary", 5, date(2026, 11, 18)),
            item("Later", 5, date(2026, 11, 19)),
        ];
        let soon: Vec<_> = expiring_soon(&items, today, 30)
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(soon, vec!["Expired", "Boundary"]);
    }

    #[test]
    fn queue_views_split_by_status() {
        let at = |h| Utc.with_ymd_and_hms(2026, 10, 19, h, 0, 0).unwrap();
        let appt = |n, status, hour| Appointment {
            id: RecordId::new(),
            patient_id: None,
            patient_name: NonEmptyText::new("P").unwrap(),
            appointment_time: at(hour),
            status,
            queue_number: n,
            created_at: at(hour),
        };
        let rows = vec![
            appt(3, AppointmentStatus::Waiting, 9),
            appt(1, AppointmentStatus::Waiting, 8),
            appt(2, AppointmentStatus::InProgress, 8),
            appt(4, AppointmentStatus::Completed, 10),
        ];

        let waiting: Vec<u32> = waiting_queue(&rows).iter().map(|a| a.queue_number).collect();
        assert_eq!(waiting, vec![1, 3]);
        assert_eq!(in_consultation(&rows).len(), 1);
        assert_eq!(completed_on(&rows, date(2026, 10, 19)).len(), 1);
        assert!(completed_on(&rows, date(2026, 10, 20)).is_empty());
    }

    #[test]
    fn recent_discharges_are_capped_and_newest_first() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let rows: Vec<Admission> = (0..12)
            .map(|i| Admission {
                id: RecordId::new(),
                patient_id: RecordId::new(),
                patient_name: NonEmptyText::new("P").unwrap(),
                bed_id: RecordId::new(),
                admission_date: base,
                discharge_date: Some(base + Duration::days(i)),
                opd_reference: None,
                status: AdmissionStatus::Discharged,
            })
            .collect();

        let recent = recent_discharges(&rows, 10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].discharge_date, Some(base + Duration::days(11)));
        assert!(current_admissions(&rows).is_empty());
    }
}
