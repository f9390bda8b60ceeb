//! CLI module for the supplier admin client.
//!
//! Provides subcommands for working against the supplier registry backend:
//! - `login` / `register` / `logout` / `whoami` - Session management
//! - `suppliers list|add|edit|delete` - Supplier registry
//! - `users list|add|edit|delete` - Account administration (admins only)
//! - `shell` - Interactive session with debounced search
//! - `config check` - Validate configuration file

mod shell;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::HttpTransport;
use crate::auth::{self, AuthController, AuthOutcome};
use crate::config::Config;
use crate::form::{
    DeleteOutcome, SaveOutcome, SupplierForm, SupplierFormController, UserForm,
    UserFormController,
};
use crate::list::{ListController, LoadOutcome, ViewState};
use crate::models::{ManagedUser, Role, Supplier, SupplierField, UserField};
use crate::session::{FileStore, Session, SessionStore};
use crate::ui::{
    AlwaysConfirm, Confirmer, ConsoleConfirmer, ConsoleNotifier, ConsoleView, LoadingIndicator,
    Navigator, Route,
};
use crate::AppState;

const SESSION_EXPIRED: &str = "Session expired. Run `supplier-admin login` to sign in again.";
const NOT_SIGNED_IN: &str = "Not signed in. Run `supplier-admin login` first.";

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "supplier-admin")]
#[command(author, version, about = "Admin client for the supplier registry", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "supplier-admin.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend URL (overrides api.base_url)
    #[arg(long, env = "SUPPLIER_ADMIN_API_URL")]
    pub api_url: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        username: String,
        /// Prompted for when omitted
        #[arg(short, long, env = "SUPPLIER_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Supplier registry
    #[command(subcommand)]
    Suppliers(SupplierCommands),

    /// Account administration (admins only)
    #[command(subcommand)]
    Users(UserCommands),

    /// Interactive session
    Shell,

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum SupplierCommands {
    /// List suppliers
    List {
        /// Only rows where name, CNPJ, email or phone contains this text
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<SupplierField>,
    },
    /// Register a supplier
    Add {
        #[arg(long)]
        name: String,
        /// 14 digits, masked or not
        #[arg(long)]
        cnpj: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Change a supplier. Unset fields keep their value.
    Edit {
        /// Row number from `suppliers list` (default sort) or supplier id
        reference: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        cnpj: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Delete a supplier
    Delete {
        /// Row number from `suppliers list` (default sort) or supplier id
        reference: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List accounts
    List {
        /// Only rows where username, email or role contains this text
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<UserField>,
    },
    /// Create an account
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value = "user")]
        role: Role,
        /// Create the account disabled
        #[arg(long)]
        inactive: bool,
    },
    /// Change an account. Unset fields keep their value.
    Edit {
        /// Row number from `users list` (default sort) or user id
        reference: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum)]
        role: Option<Role>,
        #[arg(long)]
        active: Option<bool>,
        /// New password
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete an account
    Delete {
        /// Row number from `users list` (default sort) or user id
        reference: String,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

// ============================================================================
// Wiring
// ============================================================================

/// Application state wired to the console and the HTTP backend.
pub struct Console {
    pub app: Arc<AppState>,
}

impl Console {
    pub fn connect(cli: &Cli) -> Result<Self> {
        let mut config = Config::load(&cli.config)?;
        config.apply_overrides(cli.api_url.clone(), cli.log_level.clone());
        config.validate().context("Invalid configuration")?;

        let transport = HttpTransport::new(&config.api.base_url, config.api.timeout())
            .context("Failed to create HTTP client")?;
        let session = SessionStore::new(Arc::new(FileStore::open(&config.session.path)));
        let start = if session.is_authenticated() {
            Route::Suppliers
        } else {
            Route::Login
        };
        let confirmer: Arc<dyn Confirmer> = if cli.yes {
            Arc::new(AlwaysConfirm)
        } else {
            Arc::new(ConsoleConfirmer)
        };

        tracing::debug!(base_url = %config.api.base_url, "Client configured");

        let app = AppState::new(
            config,
            session,
            Arc::new(transport),
            Navigator::new(start),
            Arc::new(ConsoleNotifier),
            confirmer,
            LoadingIndicator::new(),
        );
        Ok(Self { app: Arc::new(app) })
    }

    fn suppliers(
        &self,
        view: Arc<ConsoleView>,
    ) -> (Arc<ListController<Supplier>>, SupplierFormController) {
        let list = ListController::new(self.app.clone(), view, self.app.config.view.supplier_sort);
        let form = SupplierFormController::new(self.app.clone(), list.clone());
        (list, form)
    }

    fn users(&self, view: Arc<ConsoleView>) -> (Arc<ListController<ManagedUser>>, UserFormController) {
        let list = ListController::new(self.app.clone(), view, self.app.config.view.user_sort);
        let form = UserFormController::new(self.app.clone(), list.clone());
        (list, form)
    }

    fn signed_in(&self) -> Result<Session> {
        auth::require_session(&self.app).ok_or_else(|| anyhow!(NOT_SIGNED_IN))
    }

    fn admin(&self) -> Result<Session> {
        self.signed_in()?;
        auth::require_admin(&self.app)
            .ok_or_else(|| anyhow!("Account administration is only available to admins."))
    }
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(cli: &Cli) -> Result<()> {
    if let Commands::Config(ConfigCommands::Check) = &cli.command {
        return cmd_config_check(cli);
    }

    let console = Console::connect(cli)?;
    let result = match &cli.command {
        Commands::Login { username, password } => {
            cmd_login(&console, username, password.clone()).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => cmd_register(&console, username, email, password).await,
        Commands::Logout => {
            auth::logout(&console.app);
            println!("Signed out.");
            Ok(())
        }
        Commands::Whoami => cmd_whoami(&console),
        Commands::Suppliers(command) => cmd_suppliers(&console, command).await,
        Commands::Users(command) => cmd_users(&console, command).await,
        Commands::Shell => shell::run(&console).await,
        Commands::Config(ConfigCommands::Check) => Ok(()),
    };

    if result.is_err() {
        console.app.loading.force_hide();
    }
    result
}

async fn cmd_login(console: &Console, username: &str, password: Option<String>) -> Result<()> {
    let password = login_password(password).await?;

    let auth = AuthController::new(console.app.clone());
    match auth.login(username, &password).await {
        AuthOutcome::SignedIn | AuthOutcome::AlreadySignedIn => {
            let session = console.signed_in()?;
            println!(
                "Signed in as {} ({})",
                session.user.username, session.user.role
            );
            Ok(())
        }
        outcome => check_auth(outcome),
    }
}

async fn cmd_register(console: &Console, username: &str, email: &str, password: &str) -> Result<()> {
    let auth = AuthController::new(console.app.clone());
    check_auth(auth.register(username, email, password).await)
}

fn cmd_whoami(console: &Console) -> Result<()> {
    let Some(session) = console.app.session.get_session() else {
        println!("Not signed in.");
        return Ok(());
    };

    println!("Username:   {}", session.user.username);
    println!("Email:      {}", or_dash(&session.user.email));
    println!("Role:       {}", session.user.role);
    if let Some(at) = session.signed_in_at {
        println!("Since:      {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    let pages: Vec<&str> = auth::nav_links(&session).iter().map(|r| r.title()).collect();
    println!("Pages:      {}", pages.join(", "));
    Ok(())
}

async fn cmd_suppliers(console: &Console, command: &SupplierCommands) -> Result<()> {
    console.signed_in()?;

    match command {
        SupplierCommands::List { search, sort } => {
            let (list, _) = console.suppliers(Arc::new(ConsoleView::new()));
            list.preset(ViewState {
                search_term: search.clone().unwrap_or_default(),
                sort_field: sort.unwrap_or(console.app.config.view.supplier_sort),
            });
            check_load(list.load().await)
        }
        SupplierCommands::Add {
            name,
            cnpj,
            email,
            phone,
        } => {
            let (_, form) = console.suppliers(Arc::new(ConsoleView::quiet()));
            form.open_new();
            let draft = SupplierForm {
                id: None,
                name: name.clone(),
                tax_id: cnpj.clone(),
                email: email.clone(),
                phone: phone.clone(),
            };
            check_save(form.save(draft).await)
        }
        SupplierCommands::Edit {
            reference,
            name,
            cnpj,
            email,
            phone,
        } => {
            let view = Arc::new(ConsoleView::quiet());
            let (list, form) = console.suppliers(view.clone());
            check_load(list.load().await)?;

            let id = resolve(&view, reference, "supplier")?;
            let mut draft = form
                .open_edit(&id)
                .ok_or_else(|| anyhow!("Supplier {} not found", id))?;
            override_field(&mut draft.name, name);
            override_field(&mut draft.tax_id, cnpj);
            override_field(&mut draft.email, email);
            override_field(&mut draft.phone, phone);
            check_save(form.save(draft).await)
        }
        SupplierCommands::Delete { reference } => {
            let view = Arc::new(ConsoleView::quiet());
            let (list, form) = console.suppliers(view.clone());
            check_load(list.load().await)?;

            let id = resolve(&view, reference, "supplier")?;
            check_delete(form.delete(&id).await)
        }
    }
}

async fn cmd_users(console: &Console, command: &UserCommands) -> Result<()> {
    console.admin()?;

    match command {
        UserCommands::List { search, sort } => {
            let (list, _) = console.users(Arc::new(ConsoleView::new()));
            list.preset(ViewState {
                search_term: search.clone().unwrap_or_default(),
                sort_field: sort.unwrap_or(console.app.config.view.user_sort),
            });
            check_load(list.load().await)
        }
        UserCommands::Add {
            username,
            email,
            password,
            role,
            inactive,
        } => {
            let (_, form) = console.users(Arc::new(ConsoleView::quiet()));
            form.open_new();
            let draft = UserForm {
                id: None,
                username: username.clone(),
                email: email.clone(),
                role: *role,
                active: !inactive,
                password: password.clone(),
            };
            check_save(form.save(draft).await)
        }
        UserCommands::Edit {
            reference,
            username,
            email,
            role,
            active,
            password,
        } => {
            let view = Arc::new(ConsoleView::quiet());
            let (list, form) = console.users(view.clone());
            check_load(list.load().await)?;

            let id = resolve(&view, reference, "user")?;
            let mut draft = form
                .open_edit(&id)
                .ok_or_else(|| anyhow!("User {} not found", id))?;
            override_field(&mut draft.username, username);
            override_field(&mut draft.email, email);
            override_field(&mut draft.password, password);
            if let Some(role) = role {
                draft.role = *role;
            }
            if let Some(active) = active {
                draft.active = *active;
            }
            check_save(form.save(draft).await)
        }
        UserCommands::Delete { reference } => {
            let view = Arc::new(ConsoleView::quiet());
            let (list, form) = console.users(view.clone());
            check_load(list.load().await)?;

            let id = resolve(&view, reference, "user")?;
            check_delete(form.delete(&id).await)
        }
    }
}

/// Validate configuration file
fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used (backend at http://localhost:5000).");
        return Ok(());
    }

    let loaded = Config::load(config_path).and_then(|mut config| {
        config.apply_overrides(cli.api_url.clone(), None);
        config.validate()?;
        Ok(config)
    });

    match loaded {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!(
                "  Timeout:      {}",
                config
                    .api
                    .timeout_secs
                    .map(|s| format!("{}s", s))
                    .unwrap_or_else(|| "none".to_string())
            );
            println!();
            println!("Session:");
            println!("  File:         {}", config.session.path.display());
            println!();
            println!("View:");
            println!("  Debounce:     {} ms", config.view.search_debounce_ms);
            println!("  Supplier sort: {:?}", config.view.supplier_sort);
            println!("  User sort:    {:?}", config.view.user_sort);
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!();

            if config.api.base_url.starts_with("http://")
                && !config.api.base_url.contains("localhost")
                && !config.api.base_url.contains("127.0.0.1")
            {
                println!("Warnings:");
                println!("  [!] Backend is not local and uses plain HTTP - tokens travel unencrypted");
                println!();
            }
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            println!("Please check the configuration file syntax and try again.");
            bail!("Invalid configuration file");
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn check_auth(outcome: AuthOutcome) -> Result<()> {
    match outcome {
        AuthOutcome::SignedIn | AuthOutcome::AlreadySignedIn | AuthOutcome::Registered => Ok(()),
        AuthOutcome::Invalid(e) => bail!("{}", e),
        AuthOutcome::Failed(_) => bail!("Request was not accepted"),
        AuthOutcome::Busy => bail!("Another request is still running"),
    }
}

fn check_load(outcome: LoadOutcome) -> Result<()> {
    match outcome {
        LoadOutcome::Loaded(_) | LoadOutcome::Busy => Ok(()),
        LoadOutcome::SessionExpired => bail!(SESSION_EXPIRED),
        LoadOutcome::Failed(_) => bail!("Could not load the list"),
    }
}

fn check_save(outcome: SaveOutcome) -> Result<()> {
    match outcome {
        SaveOutcome::Created | SaveOutcome::Updated => Ok(()),
        SaveOutcome::Invalid(e) => bail!("{}", e),
        SaveOutcome::Failed(_) => bail!("Save was not accepted"),
        SaveOutcome::SessionExpired => bail!(SESSION_EXPIRED),
        SaveOutcome::Busy => bail!("Another save is still running"),
    }
}

fn check_delete(outcome: DeleteOutcome) -> Result<()> {
    match outcome {
        DeleteOutcome::Deleted => Ok(()),
        DeleteOutcome::Declined => {
            println!("Cancelled.");
            Ok(())
        }
        DeleteOutcome::Failed(_) => bail!("Delete was not accepted"),
        DeleteOutcome::SessionExpired => bail!(SESSION_EXPIRED),
        DeleteOutcome::Busy => bail!("Another delete is still running"),
    }
}

/// Row number or id from the last rendered table.
fn resolve(view: &ConsoleView, reference: &str, entity: &str) -> Result<String> {
    view.resolve(reference)
        .ok_or_else(|| anyhow!("No {} matches {:?}", entity, reference))
}

fn override_field(field: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Read one line from stdin without blocking the runtime. `None` on EOF.
pub(crate) async fn read_line(prompt: &str) -> Result<Option<String>> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    })
    .await
    .context("Input task failed")?
}

/// The password given on the command line, else a hidden prompt.
async fn login_password(given: Option<String>) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => read_password("Password: ").await,
    }
}

/// Read a secret from the terminal with echo turned off.
pub(crate) async fn read_password(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt))
        .await
        .context("Input task failed")?
        .context("Failed to read password")
}
