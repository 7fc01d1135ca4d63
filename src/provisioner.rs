//! Bootstrap pass: drive an [`AdminClient`] to the desired state.
//!
//! Steps run strictly in this order:
//!
//! 1. create the admin account (fail-fast: any error other than "already
//!    exists" aborts the run)
//! 2. rebind the client to the admin credentials
//! 3. for each database, in document order: create the database, then its
//!    user, then grant the user every privilege on it (fail-soft: an error
//!    ends the work for that database only)
//!
//! Nothing is rolled back. Re-running the same request is safe because an
//! "already exists" answer counts as success.

use tracing::Instrument;

use crate::backend::{AdminClient, ClientResult};
use crate::models::{DatabaseSpec, ProvisioningRequest, ProvisioningResult, Step, StepOutcome};

/// Run one bootstrap pass. The client is closed exactly once before returning.
pub async fn provision<C: AdminClient>(
    request: &ProvisioningRequest,
    mut client: C,
) -> ProvisioningResult {
    let span = tracing::info_span!(
        "provision",
        admin = %request.admin.user,
        databases = request.databases.len()
    );

    let result = run_steps(request, &mut client).instrument(span).await;
    client.close().await;
    result
}

async fn run_steps<C: AdminClient + ?Sized>(
    request: &ProvisioningRequest,
    client: &mut C,
) -> ProvisioningResult {
    let mut result = ProvisioningResult::default();
    let admin = &request.admin;

    let step = Step::Admin {
        user: admin.user.clone(),
    };
    let outcome = creation_outcome(client.create_superuser(&admin.user, &admin.password).await);
    log_outcome(&step, &outcome);
    let admin_failed = outcome.is_failure();
    result.record(step, outcome);

    if admin_failed {
        tracing::error!("Admin account unavailable, skipping all database steps");
        return result;
    }

    client.authenticate_as(&admin.user, &admin.password);

    for database in &request.databases {
        let span = tracing::info_span!("database", name = %database.name);
        provision_database(database, client, &mut result)
            .instrument(span)
            .await;
    }

    result
}

async fn provision_database<C: AdminClient + ?Sized>(
    database: &DatabaseSpec,
    client: &mut C,
    result: &mut ProvisioningResult,
) {
    let step = Step::Database {
        name: database.name.clone(),
    };
    let outcome = creation_outcome(client.create_database(&database.name).await);
    log_outcome(&step, &outcome);
    let database_failed = outcome.is_failure();
    result.record(step, outcome);

    if database_failed {
        return;
    }

    // An existing database may still lack its user from an earlier partial run
    let Some(credentials) = &database.user else {
        return;
    };

    let step = Step::User {
        database: database.name.clone(),
        user: credentials.user.clone(),
    };
    let outcome = creation_outcome(
        client
            .create_user(&credentials.user, &credentials.password)
            .await,
    );
    log_outcome(&step, &outcome);
    let user_failed = outcome.is_failure();
    result.record(step, outcome);

    if user_failed {
        return;
    }

    let step = Step::Grant {
        database: database.name.clone(),
        user: credentials.user.clone(),
    };
    let outcome = match client
        .grant_all_privileges(&credentials.user, &database.name)
        .await
    {
        Ok(()) => StepOutcome::Applied,
        Err(e) => StepOutcome::Failed(e.to_string()),
    };
    log_outcome(&step, &outcome);
    result.record(step, outcome);
}

fn creation_outcome(result: ClientResult<()>) -> StepOutcome {
    match result {
        Ok(()) => StepOutcome::Created,
        Err(e) if e.is_already_exists() => {
            tracing::debug!("{}", e);
            StepOutcome::AlreadyExists
        }
        Err(e) => StepOutcome::Failed(e.to_string()),
    }
}

fn log_outcome(step: &Step, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Failed(reason) => tracing::error!("Failed to provision {}: {}", step, reason),
        StepOutcome::Created => tracing::info!("Created {}", step),
        StepOutcome::AlreadyExists => tracing::info!("{} already exists", step),
        StepOutcome::Applied => tracing::info!("Applied {}", step),
    }
}
