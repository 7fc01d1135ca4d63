use std::collections::HashSet;

use crate::config::{DatabaseEntry, ProvisioningDocument};
use crate::error::{AppError, AppResult};
use crate::models::{DatabaseSpec, ProvisioningRequest, UserCredentials};

/// Second validation pass, run on a schema-conforming document.
///
/// Checks the rules a structural schema cannot express and folds each
/// database's `user`/`password` keys into a single optional credential pair.
pub fn validate_document(document: ProvisioningDocument) -> AppResult<ProvisioningRequest> {
    let mut problems = Vec::new();

    if document.admin.user.is_empty() {
        problems.push("admin.user must not be empty".to_string());
    }
    if document.admin.password.is_empty() {
        problems.push("admin.password must not be empty".to_string());
    }

    let mut seen = HashSet::new();
    let mut databases = Vec::with_capacity(document.databases.len());

    for (index, entry) in document.databases.into_iter().enumerate() {
        if entry.name.is_empty() {
            problems.push(format!("databases[{}].name must not be empty", index));
        } else if !seen.insert(entry.name.clone()) {
            problems.push(format!(
                "databases[{}].name '{}' is declared more than once",
                index, entry.name
            ));
        }

        match database_spec(index, entry) {
            Ok(spec) => databases.push(spec),
            Err(problem) => problems.push(problem),
        }
    }

    if !problems.is_empty() {
        return Err(AppError::SemanticValidation(problems));
    }

    Ok(ProvisioningRequest {
        admin: document.admin,
        databases,
    })
}

fn database_spec(index: usize, entry: DatabaseEntry) -> Result<DatabaseSpec, String> {
    let user = match (entry.user, entry.password) {
        (None, None) => None,
        (Some(user), Some(password)) => {
            if user.is_empty() || password.is_empty() {
                return Err(format!(
                    "databases[{}] ('{}'): user and password must not be empty",
                    index, entry.name
                ));
            }
            Some(UserCredentials { user, password })
        }
        (Some(_), None) => {
            return Err(format!(
                "databases[{}] ('{}'): user is set but password is missing",
                index, entry.name
            ))
        }
        (None, Some(_)) => {
            return Err(format!(
                "databases[{}] ('{}'): password is set but user is missing",
                index, entry.name
            ))
        }
    };

    Ok(DatabaseSpec {
        name: entry.name,
        user,
    })
}
