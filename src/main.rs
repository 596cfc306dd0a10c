//! Rollcall CLI
//!
//! Operator console for the attendance backend and the biometric
//! device middleware:
//! - Attendance listing and dashboard summary
//! - Status-change request review
//! - Person enrollment and biometric registration
//! - Scan-log watching
//! - Report export and settings management

use clap::{Parser, Subcommand};
use rollcall::client::{attendance::AttendanceFilter, reports::ReportRange, ApiClient};
use rollcall::config::{generate_default_config, Config};
use rollcall::device::{
    enrollment::{BiometricKind, BiometricRegistration, Hand, NewPerson},
    scan::ScanLogWatcher,
    ConnectionState, DeviceClient,
};
use rollcall::events::{AppEvent, EventBus};
use rollcall::model::{Decision, HolidaySettings};
use rollcall::ReviewSession;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Attendance management console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check backend and device middleware connectivity
    Status,

    /// List attendance records
    Attendance {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Filter by user id
        #[arg(long)]
        user: Option<u64>,
        /// Show only the calling employee's records
        #[arg(long)]
        mine: bool,
    },

    /// Dashboard summary (presence percentages, pending requests)
    Dashboard,

    /// Review status-change requests
    Requests {
        #[command(subcommand)]
        action: RequestCommands,
    },

    /// List persons enrolled on the device
    Persons,

    /// Enroll a person on the device
    Enroll {
        person_sn: String,
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        gender: String,
        #[arg(long, default_value = "")]
        department: String,
        #[arg(long, default_value = "")]
        id_number: String,
        #[arg(long, default_value = "")]
        pin: String,
        /// Face photo file (downscaled and re-encoded before upload)
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Register a biometric for an enrolled person
    Register {
        #[command(subcommand)]
        kind: RegisterCommands,
    },

    /// List persons still missing a face or palm registration
    Available {
        /// Biometric kind: face or palm
        kind: String,
    },

    /// Remove a person and all their biometrics from the device
    DeletePerson {
        person_sn: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Remove one registered face
    DeleteFace {
        person_sn: String,
        face_id: String,
        #[arg(long)]
        yes: bool,
    },

    /// Watch the scan log (Ctrl+C to stop)
    Logs {
        /// Poll interval in seconds (clamped to 3-60)
        #[arg(short, long, default_value = "5")]
        interval: u64,
        /// Maximum records per fetch
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Device maintenance operations
    Device {
        #[command(subcommand)]
        action: DeviceCommands,
    },

    /// Per-user holiday assignments
    Holidays {
        #[command(subcommand)]
        action: HolidayCommands,
    },

    /// Export the attendance report as xlsx
    Export {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Output file
        #[arg(short, long, default_value = "attendance-report.xlsx")]
        output: PathBuf,
    },

    /// Per-employee KPI scores
    Kpi {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RequestCommands {
    /// List pending requests
    List,
    /// Approve a pending request
    Approve {
        id: u64,
        #[arg(long)]
        note: Option<String>,
    },
    /// Reject a pending request
    Reject {
        id: u64,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
enum RegisterCommands {
    /// Register a face from a photo file
    Face {
        person_sn: String,
        photo: PathBuf,
    },
    /// Register a palm feature
    Palm {
        person_sn: String,
        /// Captured palm feature blob
        feature: String,
        /// Which hand: left or right
        #[arg(long, default_value = "right")]
        hand: String,
    },
    /// Register an access card
    Card {
        person_sn: String,
        card_number: String,
    },
}

#[derive(Subcommand)]
enum DeviceCommands {
    /// Push the current time to the device clock
    SyncTime,
    /// Point the middleware's event callback at a URL
    SetCallback { url: String },
    /// Reboot the device
    Restart {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum HolidayCommands {
    /// List all assignments
    List,
    /// Set one user's holiday days (blank slots allowed, e.g. 1 "" "" "" "" "" "")
    Set {
        user_id: u64,
        /// Seven day slots; empty string leaves a slot unused
        #[arg(num_args = 7)]
        days: Vec<String>,
    },
    /// Delete one user's assignment
    Delete {
        user_id: u64,
        #[arg(long)]
        yes: bool,
    },
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("rollcall={}", config.logging.level)),
    );

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Interactive confirmation for destructive operations.
fn confirm(prompt: &str, skip: bool) -> bool {
    if skip {
        return true;
    }
    print!("{} [y/N] ", prompt);
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Ok(Config::load_with_env(p)?),
        None => Ok(Config::load_default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_logging(&config);

    let api = Arc::new(ApiClient::new(config.api.clone()));
    let device = Arc::new(DeviceClient::new(Arc::clone(&api), config.device.clone()));
    let bus = EventBus::default();

    match cli.command {
        Commands::Status => {
            println!("Rollcall v{}", env!("CARGO_PKG_VERSION"));
            println!("Backend: {}", api.config().base_url);

            println!("Checking device middleware...");
            match device.check_connection().await {
                ConnectionState::Connected => println!("Device: connected"),
                ConnectionState::Disconnected => println!("Device: disconnected"),
                ConnectionState::Checking => unreachable!(),
            }
        }

        Commands::Attendance {
            start,
            end,
            user,
            mine,
        } => {
            let records = if mine {
                api.my_attendances().await?
            } else {
                let filter = AttendanceFilter {
                    start_date: start,
                    end_date: end,
                    user_id: user,
                    status: None,
                };
                api.list_attendances(&filter).await?
            };

            println!("{:<12} {:<20} {:<10}", "Date", "Name", "Badge");
            for record in &records {
                println!(
                    "{:<12} {:<20} {:<10}",
                    record.date,
                    record.user_name.as_deref().unwrap_or("-"),
                    record.badge()
                );
            }
            println!("{} records", records.len());
        }

        Commands::Dashboard => {
            let summary = api.dashboard_summary(&AttendanceFilter::default()).await?;
            println!("Records:  {}", summary.total_records);
            println!(
                "Present:  {} ({:.1}%)",
                summary.present, summary.present_pct
            );
            println!("Late:     {} ({:.1}%)", summary.late, summary.late_pct);
            println!("Absent:   {}", summary.absent);
            println!("Pending requests: {}", summary.pending_requests);
        }

        Commands::Requests { action } => {
            let mut session = ReviewSession::new(Arc::clone(&api), bus.clone());
            session.refresh().await?;

            match action {
                RequestCommands::List => {
                    for request in session.pending() {
                        println!(
                            "#{} {} {} -> {} ({})",
                            request.id,
                            request.user_name.as_deref().unwrap_or("-"),
                            request.current_status,
                            request.requested_status,
                            request.reason.as_deref().unwrap_or("no reason given")
                        );
                    }
                    println!("{} pending", session.pending().len());
                }
                RequestCommands::Approve { id, note } => {
                    session.decide(id, Decision::Approve, note.as_deref()).await?;
                    println!("Request #{} approved", id);
                }
                RequestCommands::Reject { id, note } => {
                    session.decide(id, Decision::Reject, note.as_deref()).await?;
                    println!("Request #{} rejected", id);
                }
            }
        }

        Commands::Persons => {
            let persons = device.persons().await?;
            for person in &persons {
                println!(
                    "{:<12} {:<20} {}",
                    person.person_sn,
                    person.name,
                    person.department.as_deref().unwrap_or("-")
                );
            }
            println!("{} persons", persons.len());
        }

        Commands::Enroll {
            person_sn,
            name,
            phone,
            gender,
            department,
            id_number,
            pin,
            photo,
        } => {
            let mut person = NewPerson::new(&person_sn, &name)?
                .phone(&phone)
                .gender(&gender)
                .department(&department)
                .id_number(&id_number)
                .pin(&pin);

            if let Some(path) = photo {
                let raw = tokio::fs::read(&path).await?;
                person = person.face_photo(&raw)?;
            }

            device.add_person(&person).await?;
            println!("Enrolled {}", person_sn);
        }

        Commands::Register { kind } => match kind {
            RegisterCommands::Face { person_sn, photo } => {
                let raw = tokio::fs::read(&photo).await?;
                device
                    .register_biometric(&person_sn, BiometricRegistration::Face { photo: &raw })
                    .await?;
                println!("Face registered for {}", person_sn);
            }
            RegisterCommands::Palm {
                person_sn,
                feature,
                hand,
            } => {
                let hand = match hand.as_str() {
                    "left" => Hand::Left,
                    "right" => Hand::Right,
                    other => anyhow::bail!("unknown hand: {}", other),
                };
                device
                    .register_biometric(
                        &person_sn,
                        BiometricRegistration::Palm {
                            feature: &feature,
                            hand,
                        },
                    )
                    .await?;
                println!("Palm registered for {}", person_sn);
            }
            RegisterCommands::Card {
                person_sn,
                card_number,
            } => {
                device
                    .register_biometric(
                        &person_sn,
                        BiometricRegistration::Card {
                            card_number: &card_number,
                        },
                    )
                    .await?;
                println!("Card registered for {}", person_sn);
            }
        },

        Commands::Available { kind } => {
            let kind = match kind.as_str() {
                "face" => BiometricKind::Face,
                "palm" => BiometricKind::Palm,
                other => anyhow::bail!("unknown biometric kind: {}", other),
            };
            let persons = device.available_for_enrollment(kind).await?;
            for person in &persons {
                println!("{:<12} {}", person.person_sn, person.name);
            }
            println!("{} available", persons.len());
        }

        Commands::DeletePerson { person_sn, yes } => {
            if !confirm(
                &format!("Delete person {} and all their biometrics?", person_sn),
                yes,
            ) {
                println!("Aborted");
                return Ok(());
            }
            device.delete_person(&person_sn).await?;
            println!("Deleted {}", person_sn);
        }

        Commands::DeleteFace {
            person_sn,
            face_id,
            yes,
        } => {
            if !confirm(&format!("Delete face {} of {}?", face_id, person_sn), yes) {
                println!("Aborted");
                return Ok(());
            }
            device.delete_face(&person_sn, &face_id).await?;
            println!("Deleted face {}", face_id);
        }

        Commands::Logs { interval, limit } => {
            let watcher = ScanLogWatcher::new(Arc::clone(&device), bus.clone(), interval, limit);
            let mut rx = bus.subscribe();
            watcher.start();
            println!(
                "Watching scan log every {}s (Ctrl+C to stop)",
                watcher.interval().as_secs()
            );

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = rx.recv() => {
                        if let Ok(AppEvent::ScanLogUpdated { at }) = event {
                            let snapshot = watcher.snapshot().await;
                            println!("-- updated {} --", at.format("%H:%M:%S"));
                            for record in snapshot.records.iter().take(20) {
                                println!(
                                    "{:<20} {:<12} {:?} {}",
                                    record.scan_time.as_deref().unwrap_or("-"),
                                    record.person_name.as_deref().unwrap_or("stranger"),
                                    record.method,
                                    record.outcome.label()
                                );
                            }
                        }
                    }
                }
            }

            watcher.stop();
            println!("Stopped");
        }

        Commands::Device { action } => match action {
            DeviceCommands::SyncTime => {
                device.sync_time().await?;
                println!("Device time synchronized");
            }
            DeviceCommands::SetCallback { url } => {
                device.set_callback_url(&url).await?;
                println!("Callback URL set to {}", url);
            }
            DeviceCommands::Restart { yes } => {
                if !confirm("Restart the device?", yes) {
                    println!("Aborted");
                    return Ok(());
                }
                device.restart().await?;
                println!("Restart requested");
            }
        },

        Commands::Holidays { action } => match action {
            HolidayCommands::List => {
                let settings = api.list_holiday_settings().await?;
                for s in &settings {
                    let days: Vec<String> = [s.day1, s.day2, s.day3, s.day4, s.day5, s.day6, s.day7]
                        .iter()
                        .flatten()
                        .map(|d| d.to_string())
                        .collect();
                    println!("user {}: days [{}]", s.user_id, days.join(", "));
                }
            }
            HolidayCommands::Set { user_id, days } => {
                let slots: [&str; 7] = [
                    days[0].as_str(),
                    days[1].as_str(),
                    days[2].as_str(),
                    days[3].as_str(),
                    days[4].as_str(),
                    days[5].as_str(),
                    days[6].as_str(),
                ];
                let settings = HolidaySettings::from_form(user_id, slots);
                api.save_holiday_settings(&settings).await?;
                println!("Holiday settings saved for user {}", user_id);
            }
            HolidayCommands::Delete { user_id, yes } => {
                if !confirm(
                    &format!("Delete holiday settings for user {}?", user_id),
                    yes,
                ) {
                    println!("Aborted");
                    return Ok(());
                }
                api.delete_holiday_settings(user_id).await?;
                println!("Deleted");
            }
        },

        Commands::Export { start, end, output } => {
            let range = ReportRange {
                start_date: start,
                end_date: end,
            };
            let bytes = api.export_excel(&range, &output).await?;
            println!("Wrote {} bytes to {}", bytes, output.display());
        }

        Commands::Kpi { start, end } => {
            let range = ReportRange {
                start_date: start,
                end_date: end,
            };
            let reports = api.kpi_reports(&range).await?;
            println!(
                "{:<20} {:>7} {:>8} {:>6} {:>7}",
                "Name", "Score", "Present", "Late", "Absent"
            );
            for report in &reports {
                println!(
                    "{:<20} {:>7.1} {:>8} {:>6} {:>7}",
                    report.name,
                    report.score,
                    report.present_days,
                    report.late_days,
                    report.absent_days
                );
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    tokio::fs::write(&path, content).await?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}
