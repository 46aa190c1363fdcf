use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use frontdesk_core::config::ENV_DATA_DIR;
use frontdesk_core::validation::{parse_stock, required_id};
use frontdesk_core::{
    views, Action, AdmitRequest, AppointmentStatus, CoreConfig, FrontDeskService, NewInventoryItem,
    NewPatient, Role, TableStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "frontdesk")]
#[command(about = "Hospital front desk CLI")]
struct Cli {
    /// Directory holding the table files (overrides FRONTDESK_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Role to act as: admin, staff or patient
    #[arg(long, global = true, default_value = "admin")]
    role: Role,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Patient registry
    #[command(subcommand)]
    Patients(PatientCommands),
    /// OPD queue
    #[command(subcommand)]
    Opd(OpdCommands),
    /// Ward beds
    #[command(subcommand)]
    Beds(BedCommands),
    /// Admit a patient into a bed
    Admit(AdmitArgs),
    /// Discharge an admission and free its bed
    Discharge {
        /// Bed to free
        #[arg(long)]
        bed: String,
        /// Patient whose open admission for the bed is discharged
        #[arg(long, required_unless_present = "admission")]
        patient: Option<String>,
        /// Discharge this admission directly
        #[arg(long)]
        admission: Option<String>,
    },
    /// Medicine inventory
    #[command(subcommand)]
    Inventory(InventoryCommands),
    /// Headline counts
    Dashboard,
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List all patients
    List,
    /// Register a patient
    Register(PatientArgs),
}

#[derive(Args)]
struct PatientArgs {
    /// Full name
    name: String,
    /// Age in years
    age: i64,
    /// Phone number (optional)
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Subcommand)]
enum OpdCommands {
    /// Register a walk-in and queue them, or queue a registered patient with --patient
    Book {
        #[arg(long, conflicts_with_all = ["name", "age"])]
        patient: Option<String>,
        #[arg(required_unless_present = "patient")]
        name: Option<String>,
        #[arg(required_unless_present = "patient")]
        age: Option<i64>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show the waiting queue and consultations in progress
    Queue,
    /// Move an appointment to in-progress or completed
    Status {
        /// Appointment id
        id: String,
        /// waiting, in-progress or completed
        status: AppointmentStatus,
    },
    /// Show the number the next booking would receive
    Next,
}

#[derive(Subcommand)]
enum BedCommands {
    /// List all beds
    List,
    /// Add an available bed
    Add {
        bed_number: String,
        ward: String,
    },
    /// Free a bed
    Release {
        /// Bed id
        id: String,
    },
}

#[derive(Args)]
struct AdmitArgs {
    /// Bed id
    #[arg(long)]
    bed: String,
    /// Existing patient id; otherwise --name and --age register a new patient
    #[arg(long, conflicts_with_all = ["name", "age"])]
    patient: Option<String>,
    #[arg(long, required_unless_present = "patient")]
    name: Option<String>,
    #[arg(long, required_unless_present = "patient")]
    age: Option<i64>,
    #[arg(long)]
    phone: Option<String>,
    /// OPD reference to record on the admission
    #[arg(long)]
    opd_ref: Option<String>,
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// List items with total units
    List,
    /// Add an item
    Add {
        name: String,
        stock: i64,
        /// Expiry date (YYYY-MM-DD)
        expiry_date: String,
        unit: String,
    },
    /// Overwrite an item's stock
    Stock {
        /// Item id
        id: String,
        stock: i64,
    },
    /// Low-stock and expiring items
    Alerts,
}

fn action(command: &Commands) -> Action {
    match command {
        Commands::Patients(PatientCommands::Register(_)) => Action::RegisterPatient,
        Commands::Opd(OpdCommands::Book { .. }) => Action::BookAppointment,
        Commands::Opd(OpdCommands::Status { .. }) => Action::UpdateAppointment,
        Commands::Beds(BedCommands::Add { .. } | BedCommands::Release { .. }) => Action::ManageBeds,
        Commands::Admit(_) => Action::Admit,
        Commands::Discharge { .. } => Action::Discharge,
        Commands::Inventory(InventoryCommands::Add { .. } | InventoryCommands::Stock { .. }) => {
            Action::ManageInventory
        }
        Commands::Opd(OpdCommands::Queue | OpdCommands::Next) => Action::ReadQueue,
        _ => Action::ReadRecords,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("frontdesk_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'frontdesk --help' for commands");
        return Ok(());
    };
    cli.role.require(action(&command))?;

    let data_dir = cli.data_dir.map(|d| d.display().to_string());
    let cfg = Arc::new(CoreConfig::from_lookup(|key| {
        if key == ENV_DATA_DIR {
            data_dir.clone().or_else(|| std::env::var(key).ok())
        } else {
            std::env::var(key).ok()
        }
    })?);
    if cfg.data_dir().is_none() {
        eprintln!("warning: no data directory given; changes will not be saved");
    }
    let desk = FrontDeskService::new(Arc::new(TableStore::from_config(&cfg)?), cfg);

    run(&desk, command)
}

fn run(desk: &FrontDeskService<TableStore>, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Patients(PatientCommands::List) => {
            let patients = desk.patients().list()?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            for p in patients {
                println!(
                    "ID: {}, Name: {}, Age: {}, Phone: {}, Registered: {}",
                    p.id,
                    p.name,
                    p.age,
                    p.phone.as_ref().map(|p| p.as_str()).unwrap_or("-"),
                    p.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::Patients(PatientCommands::Register(args)) => {
            let patient = desk
                .patients()
                .register(NewPatient::parse(&args.name, args.age, args.phone.as_deref())?)?;
            println!("Registered patient {} ({})", patient.name, patient.id);
        }
        Commands::Opd(OpdCommands::Book {
            patient,
            name,
            age,
            phone,
        }) => {
            let (patient, appointment) = match patient {
                Some(id) => desk.book_for_patient(required_id("patient id", &id)?)?,
                None => desk.book_opd_visit(NewPatient::parse(
                    name.as_deref().unwrap_or_default(),
                    age.unwrap_or_default(),
                    phone.as_deref(),
                )?)?,
            };
            println!(
                "Queue #{} for {} (appointment {})",
                appointment.queue_number, patient.name, appointment.id
            );
        }
        Commands::Opd(OpdCommands::Queue) => {
            let rows = desk.opd().list()?;
            println!("Waiting:");
            for a in views::waiting_queue(&rows) {
                println!("  #{:<3} {} ({})", a.queue_number, a.patient_name, a.id);
            }
            println!("In consultation:");
            for a in views::in_consultation(&rows) {
                println!("  #{:<3} {} ({})", a.queue_number, a.patient_name, a.id);
            }
            let today = Utc::now().date_naive();
            println!("Completed today: {}", views::completed_on(&rows, today).len());
        }
        Commands::Opd(OpdCommands::Status { id, status }) => {
            let appointment = desk
                .opd()
                .update_status(required_id("appointment id", &id)?, status)?;
            println!(
                "Appointment #{} is now {}",
                appointment.queue_number, appointment.status
            );
        }
        Commands::Opd(OpdCommands::Next) => {
            println!("Next queue number: {}", desk.opd().next_queue_number()?);
        }
        Commands::Beds(BedCommands::List) => {
            for b in desk.beds().list()? {
                let occupant = b.patient_id.map(|id| id.to_string()).unwrap_or_default();
                println!(
                    "{} {} [{}] {} {}",
                    b.id, b.bed_number, b.ward, b.status, occupant
                );
            }
        }
        Commands::Beds(BedCommands::Add { bed_number, ward }) => {
            let bed = desk.beds().add_bed(&bed_number, &ward)?;
            println!("Added bed {} in {} ({})", bed.bed_number, bed.ward, bed.id);
        }
        Commands::Beds(BedCommands::Release { id }) => {
            let bed = desk.release_bed(required_id("bed id", &id)?)?;
            println!("Bed {} is {}", bed.bed_number, bed.status);
        }
        Commands::Admit(args) => {
            let request = match args.patient {
                Some(patient_id) => {
                    AdmitRequest::existing_patient(&patient_id, &args.bed, args.opd_ref.as_deref())?
                }
                None => AdmitRequest::new_patient(
                    args.name.as_deref().unwrap_or_default(),
                    args.age.unwrap_or_default(),
                    args.phone.as_deref(),
                    &args.bed,
                    args.opd_ref.as_deref(),
                )?,
            };
            let outcome = desk.admit_patient(request)?;
            println!(
                "Admitted {} to bed {} (admission {})",
                outcome.patient.name, outcome.bed.bed_number, outcome.admission.id
            );
        }
        Commands::Discharge {
            bed,
            patient,
            admission,
        } => {
            let bed_id = required_id("bed id", &bed)?;
            let outcome = match admission {
                Some(admission_id) => {
                    desk.discharge_admission(required_id("admission id", &admission_id)?, bed_id)
                }
                None => {
                    let patient_id = patient.ok_or("either --patient or --admission is required")?;
                    desk.discharge_patient(required_id("patient id", &patient_id)?, bed_id)
                }
            };
            let completed = outcome.is_ok();
            match outcome.admission {
                Ok(Some(a)) => println!("Admission {} is {}", a.id, a.status),
                Ok(None) => println!("No admission found for that patient and bed"),
                Err(e) => eprintln!("Error discharging admission: {}", e),
            }
            match outcome.bed {
                Ok(b) => println!("Bed {} is {}", b.bed_number, b.status),
                Err(e) => eprintln!("Error releasing bed: {}", e),
            }
            if !completed {
                return Err("discharge did not complete".into());
            }
        }
        Commands::Inventory(InventoryCommands::List) => {
            let items = desk.inventory().list()?;
            for i in &items {
                println!(
                    "{} {}: {} {} (expires {})",
                    i.id, i.name, i.stock, i.unit, i.expiry_date
                );
            }
            println!("Total units: {}", views::total_units(&items));
        }
        Commands::Inventory(InventoryCommands::Add {
            name,
            stock,
            expiry_date,
            unit,
        }) => {
            let item = desk
                .inventory()
                .add_item(NewInventoryItem::parse(&name, stock, &expiry_date, &unit)?)?;
            println!("Added {} ({})", item.name, item.id);
        }
        Commands::Inventory(InventoryCommands::Stock { id, stock }) => {
            let item = desk
                .inventory()
                .update_stock(required_id("item id", &id)?, parse_stock(stock)?)?;
            println!("{} now has {} {}", item.name, item.stock, item.unit);
        }
        Commands::Inventory(InventoryCommands::Alerts) => {
            println!(
                "Low stock (below {}):",
                desk.config().low_stock_threshold()
            );
            for i in desk.low_stock()? {
                println!("  {}: {} {}", i.name, i.stock, i.unit);
            }
            println!(
                "Expiring within {} days:",
                desk.config().expiry_window_days()
            );
            for i in desk.expiring_soon(Utc::now().date_naive())? {
                println!("  {}: expires {}", i.name, i.expiry_date);
            }
        }
        Commands::Dashboard => {
            let s = desk.dashboard(Utc::now().date_naive())?;
            println!("Patients:           {}", s.total_patients);
            println!("Available beds:     {}", s.available_beds);
            println!("Occupied beds:      {}", s.occupied_beds);
            println!("Waiting in OPD:     {}", s.waiting_queue);
            println!("Current admissions: {}", s.current_admissions);
            println!("Low stock items:    {}", s.low_stock_items);
            println!("Expiring items:     {}", s.expiring_items);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::RecordId;

    fn desk() -> FrontDeskService<TableStore> {
        FrontDeskService::new(
            Arc::new(TableStore::in_memory()),
            Arc::new(CoreConfig::default()),
        )
    }

    #[test]
    fn discharge_fails_when_the_bed_cannot_be_released() {
        let desk = desk();
        let err = run(
            &desk,
            Commands::Discharge {
                bed: RecordId::new().to_string(),
                patient: Some(RecordId::new().to_string()),
                admission: None,
            },
        )
        .expect_err("unknown bed");
        assert_eq!(err.to_string(), "discharge did not complete");
    }

    #[test]
    fn discharge_of_an_admitted_patient_succeeds() {
        let desk = desk();
        let bed = desk.beds().add_bed("B-1", "General").unwrap();
        let request =
            AdmitRequest::new_patient("Ivy Chen", 52, None, &bed.id.to_string(), None).unwrap();
        let admitted = desk.admit_patient(request).unwrap();

        run(
            &desk,
            Commands::Discharge {
                bed: bed.id.to_string(),
                patient: Some(admitted.patient.id.to_string()),
                admission: None,
            },
        )
        .unwrap();
        assert!(desk.current_admissions().unwrap().is_empty());
    }

    #[test]
    fn patient_role_may_view_queue_but_not_records() {
        let queue = action(&Commands::Opd(OpdCommands::Queue));
        assert!(Role::Patient.require(queue).is_ok());

        let patients = action(&Commands::Patients(PatientCommands::List));
        assert_eq!(patients, Action::ReadRecords);
        assert!(Role::Patient.require(patients).is_err());
        assert!(Role::Staff.require(patients).is_ok());
    }
}
