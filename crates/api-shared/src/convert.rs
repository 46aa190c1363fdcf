//! Conversions between core models and wire messages.
//!
//! Outbound conversions are infallible. Inbound requests are validated through the core's own
//! constructors, so a malformed request fails with the same validation error whichever API it
//! arrives on.

use crate::pb;
use chrono::{DateTime, Utc};
use frontdesk_core::validation::{optional_id, parse_stock, required_id};
use frontdesk_core::{
    Admission, AdmissionOutcome, AdmitRequest, Appointment, AppointmentStatus, Bed,
    DashboardSummary, FrontDeskResult, InventoryItem, NewInventoryItem, NewPatient, Patient,
    RecordId, StockLevel,
};

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn id_or_empty(id: Option<RecordId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

fn phone(value: &str) -> Option<&str> {
    Some(value).filter(|p| !p.trim().is_empty())
}

impl From<Patient> for pb::Patient {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.into_string(),
            age: u32::from(p.age.years()),
            phone: p.phone.map(|p| p.into_string()).unwrap_or_default(),
            created_at: timestamp(p.created_at),
        }
    }
}

impl From<Appointment> for pb::Appointment {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id.to_string(),
            patient_id: id_or_empty(a.patient_id),
            patient_name: a.patient_name.into_string(),
            appointment_time: timestamp(a.appointment_time),
            status: a.status.to_string(),
            queue_number: a.queue_number,
            created_at: timestamp(a.created_at),
        }
    }
}

impl From<Bed> for pb::Bed {
    fn from(b: Bed) -> Self {
        Self {
            id: b.id.to_string(),
            bed_number: b.bed_number.into_string(),
            ward: b.ward.into_string(),
            status: b.status.to_string(),
            patient_id: id_or_empty(b.patient_id),
            updated_at: timestamp(b.updated_at),
        }
    }
}

impl From<Admission> for pb::Admission {
    fn from(a: Admission) -> Self {
        Self {
            id: a.id.to_string(),
            patient_id: a.patient_id.to_string(),
            patient_name: a.patient_name.into_string(),
            bed_id: a.bed_id.to_string(),
            admission_date: timestamp(a.admission_date),
            discharge_date: a.discharge_date.map(timestamp).unwrap_or_default(),
            opd_reference: a
                .opd_reference
                .map(|r| r.into_string())
                .unwrap_or_default(),
            status: a.status.to_string(),
        }
    }
}

impl From<InventoryItem> for pb::InventoryItem {
    fn from(i: InventoryItem) -> Self {
        Self {
            id: i.id.to_string(),
            name: i.name.into_string(),
            stock: i.stock.units(),
            expiry_date: i.expiry_date.format("%Y-%m-%d").to_string(),
            unit: i.unit.into_string(),
            updated_at: timestamp(i.updated_at),
        }
    }
}

impl From<AdmissionOutcome> for pb::AdmitPatientRes {
    fn from(o: AdmissionOutcome) -> Self {
        Self {
            patient: Some(o.patient.into()),
            admission: Some(o.admission.into()),
            bed: Some(o.bed.into()),
        }
    }
}

impl From<DashboardSummary> for pb::DashboardRes {
    fn from(s: DashboardSummary) -> Self {
        let count = |n: usize| n as u64;
        Self {
            total_patients: count(s.total_patients),
            available_beds: count(s.available_beds),
            occupied_beds: count(s.occupied_beds),
            waiting_queue: count(s.waiting_queue),
            current_admissions: count(s.current_admissions),
            low_stock_items: count(s.low_stock_items),
            expiring_items: count(s.expiring_items),
        }
    }
}

/// Converts a list of rows into their wire form.
pub fn to_wire<T, W: From<T>>(rows: Vec<T>) -> Vec<W> {
    rows.into_iter().map(W::from).collect()
}

pub fn inventory_list(items: Vec<InventoryItem>) -> pb::ListInventoryRes {
    let total_units = frontdesk_core::views::total_units(&items);
    pb::ListInventoryRes {
        items: to_wire(items),
        total_units,
    }
}

// ----------------------------------------------------------------------------
// Inbound
// ----------------------------------------------------------------------------

impl pb::RegisterPatientReq {
    pub fn to_new_patient(&self) -> FrontDeskResult<NewPatient> {
        NewPatient::parse(&self.name, self.age, phone(&self.phone))
    }
}

/// Who an OPD booking is for.
#[derive(Debug)]
pub enum BookingTarget {
    Existing(RecordId),
    WalkIn(NewPatient),
}

impl pb::BookAppointmentReq {
    pub fn target(&self) -> FrontDeskResult<BookingTarget> {
        match optional_id("patient id", &self.patient_id)? {
            Some(id) => Ok(BookingTarget::Existing(id)),
            None => NewPatient::parse(&self.name, self.age, phone(&self.phone))
                .map(BookingTarget::WalkIn),
        }
    }
}

impl pb::ListAppointmentsReq {
    /// The status filter, if any.
    pub fn status_filter(&self) -> FrontDeskResult<Option<AppointmentStatus>> {
        if self.status.trim().is_empty() {
            return Ok(None);
        }
        self.status.parse().map(Some)
    }
}

impl pb::UpdateAppointmentStatusReq {
    pub fn parse(&self) -> FrontDeskResult<(RecordId, AppointmentStatus)> {
        Ok((
            required_id("appointment id", &self.id)?,
            self.status.parse()?,
        ))
    }
}

impl pb::AdmitPatientReq {
    pub fn to_request(&self) -> FrontDeskResult<AdmitRequest> {
        let opd_reference = Some(self.opd_reference.as_str());
        if self.patient_id.trim().is_empty() {
            AdmitRequest::new_patient(
                &self.name,
                self.age,
                phone(&self.phone),
                &self.bed_id,
                opd_reference,
            )
        } else {
            AdmitRequest::existing_patient(&self.patient_id, &self.bed_id, opd_reference)
        }
    }
}

/// A parsed discharge request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DischargeTarget {
    Admission { admission_id: RecordId, bed_id: RecordId },
    Pair { patient_id: RecordId, bed_id: RecordId },
}

impl pb::DischargePatientReq {
    pub fn target(&self) -> FrontDeskResult<DischargeTarget> {
        let bed_id = required_id("bed id", &self.bed_id)?;
        match optional_id("admission id", &self.admission_id)? {
            Some(admission_id) => Ok(DischargeTarget::Admission {
                admission_id,
                bed_id,
            }),
            None => Ok(DischargeTarget::Pair {
                patient_id: required_id("patient id", &self.patient_id)?,
                bed_id,
            }),
        }
    }
}

impl pb::AddInventoryItemReq {
    pub fn to_new_item(&self) -> FrontDeskResult<NewInventoryItem> {
        NewInventoryItem::parse(&self.name, self.stock, &self.expiry_date, &self.unit)
    }
}

impl pb::UpdateStockReq {
    pub fn parse(&self) -> FrontDeskResult<(RecordId, StockLevel)> {
        Ok((required_id("item id", &self.id)?, parse_stock(self.stock)?))
    }
}
