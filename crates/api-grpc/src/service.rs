// Re-export the proto module from the shared `api-shared` crate so callers can reference
// `api_grpc::pb`.
pub use api_shared::pb;

use api_shared::auth::{API_KEY_HEADER, ROLE_HEADER};
use api_shared::convert::{inventory_list, to_wire, BookingTarget, DischargeTarget};
use api_shared::pb::front_desk_server::FrontDesk;
use api_shared::{classify, AccessPolicy, Failure, HealthService};
use chrono::Utc;
use frontdesk_core::{Action, AdmitError, FrontDeskError, FrontDeskService, Role, TableStore};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Builds the API-key interceptor for the configured access policy.
#[allow(clippy::result_large_err)]
pub fn auth_interceptor(
    access: Arc<AccessPolicy>,
) -> impl FnMut(Request<()>) -> Result<Request<()>, Status> + Clone {
    move |req: Request<()>| {
        let api_key = req
            .metadata()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        access.validate_api_key(api_key)?;
        Ok(req)
    }
}

/// Maps a core error onto a gRPC status, keeping the core message.
pub fn status_from(err: &FrontDeskError) -> Status {
    let message = err.to_string();
    match classify(err) {
        Failure::Invalid => Status::invalid_argument(message),
        Failure::Forbidden => Status::permission_denied(message),
        Failure::NotFound => Status::not_found(message),
        Failure::Internal => {
            tracing::error!("front desk error: {message}");
            Status::internal(message)
        }
    }
}

fn reject(err: FrontDeskError) -> Status {
    status_from(&err)
}

fn admit_status(err: AdmitError) -> Status {
    let status = status_from(&err.source);
    Status::new(status.code(), err.to_string())
}

#[derive(Clone)]
pub struct FrontDeskGrpc {
    desk: FrontDeskService<TableStore>,
    access: Arc<AccessPolicy>,
}

impl FrontDeskGrpc {
    pub fn new(desk: FrontDeskService<TableStore>, access: Arc<AccessPolicy>) -> Self {
        Self { desk, access }
    }

    #[allow(clippy::result_large_err)]
    fn authorize<T>(&self, req: &Request<T>, action: Action) -> Result<Role, Status> {
        let header = req.metadata().get(ROLE_HEADER).and_then(|v| v.to_str().ok());
        self.access.authorize(header, action).map_err(reject)
    }
}

#[tonic::async_trait]
impl FrontDesk for FrontDeskGrpc {
    async fn health(&self, _req: Request<()>) -> Result<Response<pb::HealthRes>, Status> {
        Ok(Response::new(HealthService::check_health()))
    }

    async fn register_patient(
        &self,
        req: Request<pb::RegisterPatientReq>,
    ) -> Result<Response<pb::Patient>, Status> {
        self.authorize(&req, Action::RegisterPatient)?;
        let new = req.get_ref().to_new_patient().map_err(reject)?;
        let patient = self.desk.patients().register(new).map_err(reject)?;
        Ok(Response::new(patient.into()))
    }

    async fn list_patients(
        &self,
        req: Request<()>,
    ) -> Result<Response<pb::ListPatientsRes>, Status> {
        self.authorize(&req, Action::ReadRecords)?;
        let patients = self.desk.patients().list().map_err(reject)?;
        Ok(Response::new(pb::ListPatientsRes {
            patients: to_wire(patients),
        }))
    }

    async fn book_appointment(
        &self,
        req: Request<pb::BookAppointmentReq>,
    ) -> Result<Response<pb::BookAppointmentRes>, Status> {
        self.authorize(&req, Action::BookAppointment)?;
        let (patient, appointment) = match req.get_ref().target().map_err(reject)? {
            BookingTarget::Existing(id) => self.desk.book_for_patient(id),
            BookingTarget::WalkIn(new) => self.desk.book_opd_visit(new),
        }
        .map_err(reject)?;

        Ok(Response::new(pb::BookAppointmentRes {
            patient: Some(patient.into()),
            appointment: Some(appointment.into()),
        }))
    }

    async fn list_appointments(
        &self,
        req: Request<pb::ListAppointmentsReq>,
    ) -> Result<Response<pb::ListAppointmentsRes>, Status> {
        self.authorize(&req, Action::ReadQueue)?;
        let status = req.get_ref().status_filter().map_err(reject)?;
        let mut appointments = self.desk.opd().list().map_err(reject)?;
        if let Some(status) = status {
            appointments.retain(|a| a.status == status);
        }
        Ok(Response::new(pb::ListAppointmentsRes {
            appointments: to_wire(appointments),
        }))
    }

    async fn next_queue_number(
        &self,
        req: Request<()>,
    ) -> Result<Response<pb::NextQueueNumberRes>, Status> {
        self.authorize(&req, Action::ReadQueue)?;
        let queue_number = self.desk.opd().next_queue_number().map_err(reject)?;
        Ok(Response::new(pb::NextQueueNumberRes { queue_number }))
    }

    async fn update_appointment_status(
        &self,
        req: Request<pb::UpdateAppointmentStatusReq>,
    ) -> Result<Response<pb::Appointment>, Status> {
        self.authorize(&req, Action::UpdateAppointment)?;
        let (id, status) = req.get_ref().parse().map_err(reject)?;
        let appointment = self.desk.opd().update_status(id, status).map_err(reject)?;
        Ok(Response::new(appointment.into()))
    }

    async fn add_bed(&self, req: Request<pb::AddBedReq>) -> Result<Response<pb::Bed>, Status> {
        self.authorize(&req, Action::ManageBeds)?;
        let req = req.into_inner();
        let bed = self
            .desk
            .beds()
            .add_bed(&req.bed_number, &req.ward)
            .map_err(reject)?;
        Ok(Response::new(bed.into()))
    }

    async fn list_beds(&self, req: Request<()>) -> Result<Response<pb::ListBedsRes>, Status> {
        self.authorize(&req, Action::ReadRecords)?;
        let beds = self.desk.beds().list().map_err(reject)?;
        Ok(Response::new(pb::ListBedsRes {
            beds: to_wire(beds),
        }))
    }

    async fn release_bed(
        &self,
        req: Request<pb::ReleaseBedReq>,
    ) -> Result<Response<pb::Bed>, Status> {
        self.authorize(&req, Action::ManageBeds)?;
        let bed_id = frontdesk_core::validation::required_id("bed id", &req.get_ref().bed_id)
            .map_err(reject)?;
        let bed = self.desk.release_bed(bed_id).map_err(reject)?;
        Ok(Response::new(bed.into()))
    }

    async fn admit_patient(
        &self,
        req: Request<pb::AdmitPatientReq>,
    ) -> Result<Response<pb::AdmitPatientRes>, Status> {
        self.authorize(&req, Action::Admit)?;
        let request = req.get_ref().to_request().map_err(reject)?;
        let outcome = self.desk.admit_patient(request).map_err(admit_status)?;
        Ok(Response::new(outcome.into()))
    }

    async fn discharge_patient(
        &self,
        req: Request<pb::DischargePatientReq>,
    ) -> Result<Response<pb::DischargePatientRes>, Status> {
        self.authorize(&req, Action::Discharge)?;
        let outcome = match req.get_ref().target().map_err(reject)? {
            DischargeTarget::Admission {
                admission_id,
                bed_id,
            } => self.desk.discharge_admission(admission_id, bed_id),
            DischargeTarget::Pair { patient_id, bed_id } => {
                self.desk.discharge_patient(patient_id, bed_id)
            }
        };
        let (admission, bed) = outcome.into_result().map_err(reject)?;
        Ok(Response::new(pb::DischargePatientRes {
            admission: admission.map(Into::into),
            bed: Some(bed.into()),
        }))
    }

    async fn list_admissions(
        &self,
        req: Request<()>,
    ) -> Result<Response<pb::ListAdmissionsRes>, Status> {
        self.authorize(&req, Action::ReadRecords)?;
        Ok(Response::new(pb::ListAdmissionsRes {
            current: to_wire(self.desk.current_admissions().map_err(reject)?),
            recent_discharges: to_wire(self.desk.recent_discharges().map_err(reject)?),
            all: to_wire(self.desk.admissions().list().map_err(reject)?),
        }))
    }

    async fn add_inventory_item(
        &self,
        req: Request<pb::AddInventoryItemReq>,
    ) -> Result<Response<pb::InventoryItem>, Status> {
        self.authorize(&req, Action::ManageInventory)?;
        let item = req.get_ref().to_new_item().map_err(reject)?;
        let item = self.desk.inventory().add_item(item).map_err(reject)?;
        Ok(Response::new(item.into()))
    }

    async fn update_stock(
        &self,
        req: Request<pb::UpdateStockReq>,
    ) -> Result<Response<pb::InventoryItem>, Status> {
        self.authorize(&req, Action::ManageInventory)?;
        let (id, stock) = req.get_ref().parse().map_err(reject)?;
        let item = self
            .desk
            .inventory()
            .update_stock(id, stock)
            .map_err(reject)?;
        Ok(Response::new(item.into()))
    }

    async fn list_inventory(
        &self,
        req: Request<()>,
    ) -> Result<Response<pb::ListInventoryRes>, Status> {
        self.authorize(&req, Action::ReadRecords)?;
        let items = self.desk.inventory().list().map_err(reject)?;
        Ok(Response::new(inventory_list(items)))
    }

    async fn low_stock(&self, req: Request<()>) -> Result<Response<pb::ListInventoryRes>, Status> {
        self.authorize(&req, Action::ReadRecords)?;
        let items = self.desk.low_stock().map_err(reject)?;
        Ok(Response::new(inventory_list(items)))
    }

    async fn expiring_soon(
        &self,
        req: Request<()>,
    ) -> Result<Response<pb::ListInventoryRes>, Status> {
        self.authorize(&req, Action::ReadRecords)?;
        let items = self
            .desk
            .expiring_soon(Utc::now().date_naive())
            .map_err(reject)?;
        Ok(Response::new(inventory_list(items)))
    }

    async fn dashboard(&self, req: Request<()>) -> Result<Response<pb::DashboardRes>, Status> {
        self.authorize(&req, Action::ReadRecords)?;
        let summary = self
            .desk
            .dashboard(Utc::now().date_naive())
            .map_err(reject)?;
        Ok(Response::new(summary.into()))
    }
}
