//! Interactive session. Keeps both list pages in memory so search and sort
//! work on the cached collection without refetching.

use anyhow::Result;
use clap::ValueEnum;
use std::sync::Arc;
use tracing::debug;

use super::{read_line, read_password, Console};
use crate::auth::{self, AuthController, AuthOutcome};
use crate::form::{
    DeleteOutcome, SaveOutcome, SupplierForm, SupplierFormController, UserForm,
    UserFormController,
};
use crate::format::{mask_phone_input, mask_tax_id_input};
use crate::list::ListController;
use crate::models::{ManagedUser, Role, Supplier, SupplierField, UserField};
use crate::ui::{ConsoleView, Route};

const HELP: &str = "\
Commands:
  suppliers              open the suppliers page
  users                  open the users page (admins)
  search <text>          filter the current page as you type
  sort <field>           suppliers: name, cnpj, email, phone
                         users: username, email, role, active
  reload                 fetch the current page again
  add                    create a record
  edit <row|id>          change a record
  delete <row|id>        delete a record
  login | logout | whoami
  help | quit";

struct Shell<'a> {
    console: &'a Console,
    view: Arc<ConsoleView>,
    suppliers: Arc<ListController<Supplier>>,
    supplier_form: SupplierFormController,
    users: Arc<ListController<ManagedUser>>,
    user_form: UserFormController,
}

pub async fn run(console: &Console) -> Result<()> {
    let view = Arc::new(ConsoleView::new());
    let (suppliers, supplier_form) = console.suppliers(view.clone());
    let (users, user_form) = console.users(view.clone());
    let shell = Shell {
        console,
        view,
        suppliers,
        supplier_form,
        users,
        user_form,
    };

    println!("supplier-admin shell. Type `help` for commands.");
    if console.app.session.is_authenticated() {
        shell.open(Route::Suppliers).await;
    } else {
        println!("Not signed in. Use `login`.");
    }

    loop {
        let page = console.app.navigator.current();
        let Some(line) = read_line(&format!("{}> ", page.title().to_lowercase())).await? else {
            break;
        };
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let was_signed_in = console.app.session.is_authenticated();
        match command {
            "" => continue,
            "help" | "?" => println!("{}", HELP),
            "quit" | "exit" => break,
            "login" => shell.login().await?,
            "logout" => {
                auth::logout(&console.app);
                println!("Signed out.");
                continue;
            }
            "whoami" => super::cmd_whoami(console)?,
            "suppliers" => shell.open(Route::Suppliers).await,
            "users" => shell.open(Route::Users).await,
            "reload" => shell.reload().await,
            "search" => shell.search(rest),
            "sort" => shell.sort(rest),
            "add" => shell.add().await?,
            "edit" => shell.edit(rest).await?,
            "delete" => shell.delete(rest).await,
            other => println!("Unknown command `{}`. Type `help`.", other),
        }

        if was_signed_in && !console.app.session.is_authenticated() {
            println!("Session expired. Use `login` to sign in again.");
        }
    }

    Ok(())
}

impl Shell<'_> {
    fn app(&self) -> &crate::AppState {
        &self.console.app
    }

    async fn open(&self, route: Route) {
        let allowed = match route {
            Route::Users => auth::require_admin(self.app()).is_some(),
            _ => auth::require_session(self.app()).is_some(),
        };
        if !allowed {
            match self.app().navigator.current() {
                Route::Login => println!("Not signed in. Use `login`."),
                _ => println!("The users page is only available to admins."),
            }
            return;
        }

        self.app().navigator.redirect(route);
        self.reload().await;
    }

    async fn reload(&self) {
        match self.app().navigator.current() {
            Route::Suppliers => {
                self.suppliers.load().await;
            }
            Route::Users => {
                self.users.load().await;
            }
            _ => println!("Not signed in. Use `login`."),
        }
    }

    fn search(&self, term: &str) {
        match self.app().navigator.current() {
            Route::Suppliers => self.suppliers.on_search_input(term),
            Route::Users => self.users.on_search_input(term),
            _ => println!("Open a page first."),
        }
    }

    fn sort(&self, field: &str) {
        match self.app().navigator.current() {
            Route::Suppliers => match SupplierField::from_str(field, true) {
                Ok(field) => self.suppliers.set_sort_field(field),
                Err(_) => println!("Sort by one of: name, cnpj, email, phone"),
            },
            Route::Users => match UserField::from_str(field, true) {
                Ok(field) => self.users.set_sort_field(field),
                Err(_) => println!("Sort by one of: username, email, role, active"),
            },
            _ => println!("Open a page first."),
        }
    }

    async fn login(&self) -> Result<()> {
        let Some(username) = read_line("Username: ").await? else {
            return Ok(());
        };
        let password = match read_password("Password: ").await {
            Ok(password) => password,
            Err(e) => {
                println!("  {:#}", e);
                return Ok(());
            }
        };

        let auth = AuthController::new(self.console.app.clone());
        match auth.login(&username, &password).await {
            AuthOutcome::SignedIn | AuthOutcome::AlreadySignedIn => self.reload().await,
            AuthOutcome::Invalid(e) => println!("  {}", e),
            _ => {}
        }
        Ok(())
    }

    async fn add(&self) -> Result<()> {
        match self.app().navigator.current() {
            Route::Suppliers => {
                let draft = self.supplier_form.open_new();
                self.edit_supplier(draft).await
            }
            Route::Users => {
                let draft = self.user_form.open_new();
                self.edit_user(draft).await
            }
            _ => {
                println!("Open a page first.");
                Ok(())
            }
        }
    }

    async fn edit(&self, reference: &str) -> Result<()> {
        let Some(id) = self.view.resolve(reference) else {
            println!("No row matches {:?}.", reference);
            return Ok(());
        };

        match self.app().navigator.current() {
            Route::Suppliers => match self.supplier_form.open_edit(&id) {
                Some(draft) => self.edit_supplier(draft).await,
                None => Ok(()),
            },
            Route::Users => match self.user_form.open_edit(&id) {
                Some(draft) => self.edit_user(draft).await,
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    async fn delete(&self, reference: &str) {
        let Some(id) = self.view.resolve(reference) else {
            println!("No row matches {:?}.", reference);
            return;
        };

        let outcome = match self.app().navigator.current() {
            Route::Suppliers => self.supplier_form.delete(&id).await,
            Route::Users => self.user_form.delete(&id).await,
            _ => return,
        };
        if outcome == DeleteOutcome::Declined {
            println!("Cancelled.");
        }
    }

    /// Prompt until the form saves or the user gives up.
    async fn edit_supplier(&self, mut draft: SupplierForm) -> Result<()> {
        loop {
            draft.name = prompt("Name", &draft.name).await?;
            draft.tax_id = mask_tax_id_input(&prompt("CNPJ", &draft.tax_id).await?);
            draft.email = prompt("Email", &draft.email).await?;
            draft.phone = mask_phone_input(&prompt("Phone", &draft.phone).await?);

            match self.supplier_form.save(draft.clone()).await {
                SaveOutcome::Invalid(e) => {
                    println!("  {}", e);
                    if !retry().await? {
                        self.supplier_form.surface().close();
                        return Ok(());
                    }
                }
                outcome => {
                    debug!(?outcome, "Supplier dialog closed");
                    return Ok(());
                }
            }
        }
    }

    async fn edit_user(&self, mut draft: UserForm) -> Result<()> {
        loop {
            draft.username = prompt("Username", &draft.username).await?;
            draft.email = prompt("Email", &draft.email).await?;
            draft.role = Role::from(prompt("Role (admin/user)", draft.role.as_str()).await?);
            let active = prompt("Active (y/n)", if draft.active { "y" } else { "n" }).await?;
            draft.active = matches!(active.trim().to_lowercase().as_str(), "y" | "yes");
            let label = if draft.id.is_some() {
                "Password (blank keeps current)"
            } else {
                "Password"
            };
            draft.password = match read_password(&format!("{}: ", label)).await {
                Ok(password) => password,
                Err(e) => {
                    println!("  {:#}", e);
                    self.user_form.surface().close();
                    return Ok(());
                }
            };

            match self.user_form.save(draft.clone()).await {
                SaveOutcome::Invalid(e) => {
                    println!("  {}", e);
                    if !retry().await? {
                        self.user_form.surface().close();
                        return Ok(());
                    }
                }
                outcome => {
                    debug!(?outcome, "User dialog closed");
                    return Ok(());
                }
            }
        }
    }
}

/// Ask for a field, keeping `current` on an empty answer.
async fn prompt(label: &str, current: &str) -> Result<String> {
    let question = if current.is_empty() {
        format!("{}: ", label)
    } else {
        format!("{} [{}]: ", label, current)
    };
    let answer = read_line(&question).await?.unwrap_or_default();
    if answer.trim().is_empty() {
        Ok(current.to_string())
    } else {
        Ok(answer.trim().to_string())
    }
}

async fn retry() -> Result<bool> {
    match read_line("Edit again? [Y/n] ").await? {
        Some(answer) => Ok(!matches!(answer.trim().to_lowercase().as_str(), "n" | "no")),
        None => Ok(false),
    }
}
