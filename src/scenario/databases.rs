//! Database lifecycle: create, scale, delete

use crate::common::{Error, Result};
use crate::platform::{
    find_available, find_by_id, App, Confirmation, Database, DatabaseId, DatabaseState,
    GigalixirCli,
};
use crate::poll::{poll_until, PollPolicy, Probe};

use super::{ScenarioContext, StepLog};

pub(super) const STEPS: usize = 8;

const CLEANUP: &str = "delete database manually";

pub(super) async fn run(ctx: &ScenarioContext, steps: &mut StepLog) -> Result<()> {
    let cli = &ctx.cli;
    let policy = PollPolicy::from(ctx.config.polling.database);

    cli.login(&ctx.credentials).await?;
    steps.pass(format!("login as {}", ctx.credentials.email));

    let apps = cli.apps().await?;
    let app = select_app(&apps, ctx.config.database.app.as_deref())?;
    let app = app.name.as_str();
    steps.pass(format!("selected idle app {app}"));

    let existing = cli.databases(app).await?;
    if let Some(db) = find_available(&existing) {
        return Err(Error::Precondition(format!(
            "database {} of app {} is already AVAILABLE; remove it before running",
            db.id, app
        )));
    }
    steps.pass("no AVAILABLE database at start");

    cli.create_database(app).await?;
    steps.pass("create_database");

    let id = wait_for_state(cli, app, None, DatabaseState::Available, policy).await?;
    steps.pass(format!("database {id} is AVAILABLE"));

    let size = ctx.config.database.scale_size;
    cli.scale_database(app, &id, size).await?;
    wait_for_state(cli, app, Some(&id), DatabaseState::Available, policy).await?;
    steps.pass(format!("scaled database {id} to size {size}"));

    cli.delete_database(app, &id, Confirmation::Yes).await?;
    steps.pass(format!("delete_database {id}"));

    wait_for_state(cli, app, Some(&id), DatabaseState::Deleted, policy).await?;
    steps.pass(format!("database {id} is DELETED"));

    Ok(())
}

/// Pick the app to provision against
///
/// The configured app when named, otherwise the last app listed. It must not
/// be running any replicas.
fn select_app<'a>(apps: &'a [App], wanted: Option<&str>) -> Result<&'a App> {
    let app = match wanted {
        Some(name) => apps.iter().find(|app| app.name == name).ok_or_else(|| {
            Error::Precondition(format!("app {name} does not exist on this account"))
        })?,
        None => apps.last().ok_or_else(|| {
            Error::Precondition("the account has no apps; create one first".to_string())
        })?,
    };

    if app.replicas != 0 {
        return Err(Error::Precondition(format!(
            "app {} has {} replicas; scale it to 0 first",
            app.name, app.replicas
        )));
    }
    Ok(app)
}

/// Poll `databases` until a database (or the one with `id`) is in `target`
async fn wait_for_state(
    cli: &GigalixirCli,
    app: &str,
    id: Option<&DatabaseId>,
    target: DatabaseState,
    policy: PollPolicy,
) -> Result<DatabaseId> {
    let label = match id {
        Some(id) => format!("waiting for database {id} to be {target}"),
        None => format!("waiting for a database to be {target}"),
    };
    let target = &target;

    let outcome = poll_until(policy, &label, move |_| async move {
        let databases = cli.databases(app).await?;
        let hit = match id {
            Some(id) => find_by_id(&databases, id).filter(|db| &db.state == target),
            None => databases.iter().find(|db| &db.state == target),
        };
        Ok(match hit {
            Some(db) => Probe::Ready(db.id.clone()),
            None => Probe::Pending(describe(&databases)),
        })
    })
    .await?;

    outcome.or_cleanup(&label, CLEANUP)
}

fn describe(databases: &[Database]) -> String {
    if databases.is_empty() {
        return "No databases listed.".to_string();
    }
    let states: Vec<String> = databases
        .iter()
        .map(|db| format!("{}={}", db.id, db.state))
        .collect();
    format!("Current states: {}", states.join(", "))
}
