use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use homecare_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "homecare")]
#[command(about = "Home health service booking with local pharmacies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a directory account
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Account type (user, pharmacy)
        #[arg(long, default_value = "user", value_parser = parse_role)]
        role: Role,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Account type (user, pharmacy)
        #[arg(long, default_value = "user", value_parser = parse_role)]
        role: Role,

        #[arg(long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Edit the signed-in account's profile
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// List services
    Services {
        /// Filter by category (measurement, injection, consultation, therapy)
        #[arg(long, value_parser = parse_category)]
        category: Option<ServiceCategory>,

        /// Search service names
        #[arg(long)]
        search: Option<String>,
    },

    /// List pharmacies currently offering a service
    Providers {
        service_id: String,
    },

    /// List bookable time slots
    Slots,

    /// Book a service
    Book {
        #[arg(long)]
        service: String,

        #[arg(long)]
        provider: String,

        /// Date as YYYY-MM-DD, or "today" / "tomorrow"
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Time slot as HH:MM
        #[arg(long)]
        time: String,

        #[arg(long)]
        address: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List your bookings
    List {
        /// Only show bookings with this status (repeatable)
        #[arg(long = "status", value_parser = parse_status)]
        statuses: Vec<BookingStatus>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one booking
    Show {
        booking_id: String,
    },

    /// Move a booking to a new status
    Status {
        booking_id: String,

        /// pending, confirmed, in-progress, completed or cancelled
        #[arg(value_parser = parse_status)]
        status: BookingStatus,
    },

    /// Booking counts and revenue
    Stats,

    /// Export your bookings to CSV
    Export {
        path: PathBuf,
    },

    /// Replace the booking store with an empty collection
    Reset {
        /// Confirm that all stored bookings will be discarded
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    homecare_core::logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Storage handles shared by every command
struct App {
    storage: LocalStorage,
    config: Config,
}

impl App {
    fn sessions(&self) -> SessionProvider {
        SessionProvider::new(self.storage.clone(), self.config.storage.session_key())
    }

    fn store(&self) -> JsonBookingStore {
        JsonBookingStore::new(self.storage.clone(), self.config.storage.bookings_key())
    }

    fn engine(&self) -> Result<BookingEngine<'static, JsonBookingStore>> {
        let session = self.sessions().require()?;
        Ok(BookingEngine::new(default_catalog(), self.store(), session))
    }
}

fn run(cli: Cli) -> Result<()> {
    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    let catalog = default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let app = App {
        storage: LocalStorage::new(data_dir),
        config,
    };

    match cli.command {
        Commands::Login {
            email,
            password,
            role,
        } => cmd_login(&app, &email, &password, role),
        Commands::Register {
            name,
            email,
            phone,
            role,
            password,
        } => cmd_register(
            &app,
            Registration {
                name,
                email,
                phone,
                role,
            },
            &password,
        ),
        Commands::Logout => {
            app.sessions().logout()?;
            println!("✓ Logged out");
            Ok(())
        }
        Commands::Whoami => cmd_whoami(&app),
        Commands::Profile { name, email, phone } => {
            let user = app
                .sessions()
                .update_profile(ProfileUpdate { name, email, phone })?;
            println!("✓ Profile updated");
            display_user(&user);
            Ok(())
        }
        Commands::Services { category, search } => {
            cmd_services(catalog, category, search.as_deref());
            Ok(())
        }
        Commands::Providers { service_id } => cmd_providers(catalog, &service_id),
        Commands::Slots => {
            for slot in all_slots() {
                println!("{}", slot);
            }
            Ok(())
        }
        Commands::Book {
            service,
            provider,
            date,
            time,
            address,
            notes,
        } => {
            let booking = app.engine()?.create_booking(NewBooking {
                service_id: service,
                provider_id: provider,
                date,
                time,
                address,
                notes,
            })?;
            println!("✓ Booking created!");
            display_booking(&booking);
            Ok(())
        }
        Commands::List { statuses, json } => cmd_list(&app, &statuses, json),
        Commands::Show { booking_id } => {
            let booking = app.engine()?.get_booking(&booking_id)?;
            display_booking(&booking);
            Ok(())
        }
        Commands::Status { booking_id, status } => {
            let booking = app.engine()?.update_status(&booking_id, status)?;
            println!(
                "✓ Booking {} is now {} ({})",
                booking.id,
                booking.status,
                booking.status.label()
            );
            Ok(())
        }
        Commands::Stats => cmd_stats(&app),
        Commands::Export { path } => {
            let bookings = app.engine()?.list_bookings(None)?;
            let count = export_bookings_csv(&bookings, &path)?;
            println!("✓ Exported {} bookings to {}", count, path.display());
            Ok(())
        }
        Commands::Reset { yes } => cmd_reset(&app, yes),
    }
}

fn cmd_login(app: &App, email: &str, password: &str, role: Role) -> Result<()> {
    if !app.sessions().login(email, password, role)? {
        return Err(Error::Unauthorized(format!(
            "invalid credentials for {} account '{}'",
            role, email
        )));
    }
    println!("✓ Logged in as {} ({})", email, role);
    Ok(())
}

fn cmd_register(app: &App, registration: Registration, password: &str) -> Result<()> {
    if !app.sessions().register(registration, password)? {
        return Err(Error::Unauthorized("registration was refused".into()));
    }
    println!("✓ Account created");
    cmd_whoami(app)
}

fn cmd_whoami(app: &App) -> Result<()> {
    match app.sessions().current()? {
        Some(user) => display_user(&user),
        None => println!("Not logged in."),
    }
    Ok(())
}

fn cmd_services(catalog: &Catalog, category: Option<ServiceCategory>, search: Option<&str>) {
    let services = catalog.search_services(search, category);
    if services.is_empty() {
        println!("No services match.");
        return;
    }

    for service in services {
        println!(
            "[{}] {} - {} ريال, {} دقيقة ({})",
            service.id, service.name, service.price, service.duration_minutes, service.category
        );
        println!("    {}", service.description);
    }
}

fn cmd_providers(catalog: &Catalog, service_id: &str) -> Result<()> {
    let service = catalog
        .service(service_id)
        .ok_or_else(|| Error::NotFound {
            kind: "service",
            id: service_id.to_string(),
        })?;

    let providers = catalog.available_providers_for(&service.id);
    if providers.is_empty() {
        println!("No pharmacies currently offer {}.", service.name);
        return Ok(());
    }

    println!("Pharmacies offering {}:", service.name);
    for provider in providers {
        println!(
            "[{}] {} - {} ({} km, ★ {} from {} reviews, {})",
            provider.id,
            provider.name,
            provider.address,
            provider.distance_km,
            provider.rating,
            provider.review_count,
            provider.estimated_time_label
        );
    }
    Ok(())
}

fn cmd_list(app: &App, statuses: &[BookingStatus], json: bool) -> Result<()> {
    let filter = (!statuses.is_empty()).then_some(statuses);
    let bookings = app.engine()?.list_bookings(filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bookings)?);
        return Ok(());
    }

    if bookings.is_empty() {
        println!("No bookings found.");
        return Ok(());
    }

    for booking in &bookings {
        println!(
            "{}  {} {}  {:<12} {} @ {}  {} ريال",
            booking.id,
            booking.scheduled_date,
            booking.scheduled_time,
            booking.status,
            booking.service_name,
            booking.provider_name,
            booking.price
        );
    }
    Ok(())
}

fn cmd_stats(app: &App) -> Result<()> {
    let stats = app.engine()?.stats()?;
    println!("Pending:      {}", stats.pending);
    println!("Confirmed:    {}", stats.confirmed);
    println!("In progress:  {}", stats.in_progress);
    println!("Completed:    {}", stats.completed);
    println!("Cancelled:    {}", stats.cancelled);
    println!("Today's revenue: {} ريال", stats.today_revenue);
    println!("Total revenue:   {} ريال", stats.total_revenue);
    Ok(())
}

fn cmd_reset(app: &App, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Validation(
            "reset discards every stored booking; pass --yes to confirm".into(),
        ));
    }
    app.store().reset()?;
    println!("✓ Booking store reset");
    Ok(())
}

fn display_user(user: &User) {
    println!("  {} <{}>", user.name, user.email);
    println!("  ID: {}", user.id);
    println!("  Role: {}", user.role);
    if !user.phone.is_empty() {
        println!("  Phone: {}", user.phone);
    }
    if let Some(ref provider_id) = user.provider_id {
        println!("  Pharmacy: {}", provider_id);
    }
}

fn display_booking(booking: &Booking) {
    println!();
    println!("  {} - {}", booking.service_name, booking.provider_name);
    println!("  ID: {}", booking.id);
    println!(
        "  Status: {} ({})",
        booking.status,
        booking.status.label()
    );
    println!(
        "  When: {} {}",
        booking.scheduled_date, booking.scheduled_time
    );
    println!("  Address: {}", booking.address);
    if let Some(ref notes) = booking.notes {
        println!("  Notes: {}", notes);
    }
    println!("  Price: {} ريال", booking.price);
    println!();
}

fn parse_role(s: &str) -> std::result::Result<Role, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_category(s: &str) -> std::result::Result<ServiceCategory, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_status(s: &str) -> std::result::Result<BookingStatus, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    let today = Local::now().date_naive();
    match s.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => Ok(today + Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", s)),
    }
}
