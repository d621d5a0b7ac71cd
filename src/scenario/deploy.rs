//! Full deploy lifecycle: create, push, configs, hot upgrade, scale to zero

use crate::common::{Error, Result};
use crate::platform::{Configs, GigalixirCli};
use crate::poll::{poll_until, PollPolicy};
use crate::probe::{app_url, classify, BodyCheck, Endpoint};
use crate::vcs::PushMode;

use super::{ScenarioContext, StepLog};

pub(super) const STEPS: usize = 9;

const CLEANUP: &str = "scale down your app manually";

pub(super) async fn run(ctx: &ScenarioContext, steps: &mut StepLog) -> Result<()> {
    let cli = &ctx.cli;
    let deploy = &ctx.config.deploy;
    let policy = PollPolicy::from(ctx.config.polling.http);

    cli.login(&ctx.credentials).await?;
    steps.pass(format!("login as {}", ctx.credentials.email));

    let repo = ctx.vcs.clone_repo(&deploy.repository, &ctx.workdir).await?;
    steps.pass(format!("cloned {}", deploy.repository));

    let app = cli.create_app(&repo).await?;
    steps.pass(format!("created app {app}"));

    ctx.vcs
        .push(&repo, &deploy.remote, &deploy.branch, PushMode::Cold)
        .await?;
    tracing::info!("Completed Deploy.");
    steps.pass(format!("pushed {} to {}", deploy.branch, deploy.remote));

    let url = app_url(&app, &deploy.app_domain);
    wait_for_http(ctx.endpoint.as_ref(), &url, &BodyCheck::Any, policy).await?;
    steps.pass(format!("{url} serves 200"));

    expect_replicas(cli, &app, 1).await?;
    steps.pass("1 replica desired and running");

    config_round_trip(cli, &app, &deploy.config_key, &deploy.config_value).await?;
    steps.pass(format!("set and deleted config {}", deploy.config_key));

    ctx.vcs.rebase(&repo, &deploy.upgrade_ref).await?;
    ctx.vcs
        .push(&repo, &deploy.remote, &deploy.branch, PushMode::Hot)
        .await?;
    tracing::info!("Completed Hot Upgrade.");
    let marker = BodyCheck::Contains(deploy.version_marker.clone());
    wait_for_http(ctx.endpoint.as_ref(), &url, &marker, policy).await?;
    steps.pass(format!("hot upgraded to {}", deploy.version_marker));

    cli.scale(&app, 0).await?;
    expect_replicas(cli, &app, 0).await?;
    steps.pass("scaled to 0 replicas");

    Ok(())
}

async fn wait_for_http(
    endpoint: &dyn Endpoint,
    url: &str,
    check: &BodyCheck,
    policy: PollPolicy,
) -> Result<()> {
    let label = format!("Checking {url}");
    let outcome = poll_until(policy, &label, move |_| async move {
        let fetched = endpoint.fetch(url).await?;
        Ok(classify(fetched, check))
    })
    .await?;

    let what = match check {
        BodyCheck::Any => format!("{url} to return 200"),
        BodyCheck::Contains(marker) => format!("{url} to serve {marker}"),
    };
    outcome.or_cleanup(&what, CLEANUP)
}

async fn expect_replicas(cli: &GigalixirCli, app: &str, replicas: u32) -> Result<()> {
    let status = cli.status(app).await?;
    if status.replicas_desired != replicas || status.replicas_running != replicas {
        return Err(Error::Assertion(format!(
            "expected {replicas} replicas desired and running for {app}, got desired={} running={}",
            status.replicas_desired, status.replicas_running
        )));
    }
    Ok(())
}

/// Set a config, see it listed alone, delete it, see the list empty
async fn config_round_trip(cli: &GigalixirCli, app: &str, key: &str, value: &str) -> Result<()> {
    cli.set_config(app, key, value).await?;
    let expected = Configs::from([(key.to_string(), value.to_string())]);
    expect_configs(cli, app, &expected).await?;

    cli.delete_config(app, key).await?;
    expect_configs(cli, app, &Configs::new()).await
}

async fn expect_configs(cli: &GigalixirCli, app: &str, expected: &Configs) -> Result<()> {
    let configs = cli.configs(app).await?;
    if &configs != expected {
        return Err(Error::Assertion(format!(
            "configs for {app}: expected {expected:?}, got {configs:?}"
        )));
    }
    Ok(())
}
