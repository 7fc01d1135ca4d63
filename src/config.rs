use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::models::{AdminCredentials, ProvisioningRequest};
use crate::schema::definitions::ADMIN_KEY;
use crate::schema::{self, ADMIN_CREDENTIALS_SCHEMA, PROVISIONING_SCHEMA};

/// Provisioning document as written on disk, after schema validation.
///
/// `user`/`password` are still independent here; [`schema::validate_document`]
/// enforces the pairing and produces the [`ProvisioningRequest`].
#[derive(Debug, Deserialize, Clone)]
pub struct ProvisioningDocument {
    pub admin: AdminCredentials,
    pub databases: Vec<DatabaseEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseEntry {
    pub name: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` and `.yml` files are YAML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

type VariableLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

lazy_static! {
    // `$${NAME}` is an escaped, literal `${NAME}`
    static ref VARIABLE_REFERENCE: Regex =
        Regex::new(r"\$(\$)?\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").unwrap();
}

/// Loader for provisioning documents
///
/// The associated `load_*` functions cover the common case. Build an instance
/// to supply the admin credentials from elsewhere or to resolve `${VAR}`
/// references from something other than the process environment.
pub struct ProvisioningConfig {
    admin: Option<AdminCredentials>,
    variables: VariableLookup,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            admin: None,
            variables: Box::new(|name| std::env::var(name).ok()),
        }
    }
}

impl ProvisioningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these admin credentials instead of the document's `admin` entry
    pub fn with_admin(mut self, admin: AdminCredentials) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Resolve `${VAR}` references through `lookup`
    pub fn with_variables<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.variables = Box::new(lookup);
        self
    }

    /// Load and validate a provisioning document from a file
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> AppResult<ProvisioningRequest> {
        Self::new().read_file(config_path)
    }

    /// Load and validate a provisioning document from any reader (e.g. stdin)
    pub fn load_from_reader<R: Read>(
        reader: R,
        format: DocumentFormat,
    ) -> AppResult<ProvisioningRequest> {
        Self::new().read_reader(reader, format)
    }

    /// Parse, normalize and validate document text
    pub fn load_from_str(content: &str, format: DocumentFormat) -> AppResult<ProvisioningRequest> {
        Self::new().read_str(content, format)
    }

    /// Load a standalone admin credentials file (`{"user": .., "password": ..}`)
    pub fn load_admin_credentials<P: AsRef<Path>>(path: P) -> AppResult<AdminCredentials> {
        Self::new().read_admin_credentials(path)
    }

    pub fn read_file<P: AsRef<Path>>(&self, config_path: P) -> AppResult<ProvisioningRequest> {
        let path = config_path.as_ref();
        tracing::info!("Loading provisioning document from {}", path.display());

        let content = read_to_string(path)?;
        self.read_str(&content, DocumentFormat::from_path(path))
    }

    pub fn read_reader<R: Read>(
        &self,
        mut reader: R,
        format: DocumentFormat,
    ) -> AppResult<ProvisioningRequest> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|source| AppError::Io {
                path: "<stdin>".into(),
                source,
            })?;

        self.read_str(&content, format)
    }

    pub fn read_str(&self, content: &str, format: DocumentFormat) -> AppResult<ProvisioningRequest> {
        let raw = parse(content, format)?;

        // Secrets may come from the container runtime
        let expanded = self.expand_variables(raw)?;
        let mut document = schema::normalize_legacy_layout(expanded);

        if let (Some(admin), Value::Object(root)) = (&self.admin, &mut document) {
            if root.contains_key(ADMIN_KEY) {
                tracing::debug!("Admin credentials file overrides the document's admin entry");
            }
            root.insert(ADMIN_KEY.to_string(), serde_json::to_value(admin)?);
        }

        check_schema(&document, &PROVISIONING_SCHEMA)?;

        let document: ProvisioningDocument = serde_json::from_value(document)?;
        let request = schema::validate_document(document)?;

        tracing::debug!(
            "Desired state: admin '{}', {} database(s): [{}]",
            request.admin.user,
            request.databases.len(),
            request
                .databases
                .iter()
                .map(|db| db.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(request)
    }

    pub fn read_admin_credentials<P: AsRef<Path>>(&self, path: P) -> AppResult<AdminCredentials> {
        let path = path.as_ref();
        tracing::info!("Loading admin credentials from {}", path.display());

        let content = read_to_string(path)?;
        let credentials = self.expand_variables(parse(&content, DocumentFormat::from_path(path))?)?;
        check_schema(&credentials, &ADMIN_CREDENTIALS_SCHEMA)?;

        Ok(serde_json::from_value(credentials)?)
    }

    /// Expand `${VAR}` and `${VAR:-default}` inside every string value
    fn expand_variables(&self, value: Value) -> AppResult<Value> {
        Ok(match value {
            Value::String(text) => Value::String(self.expand_string(&text)?),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.expand_variables(item))
                    .collect::<AppResult<_>>()?,
            ),
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, item)| Ok((key, self.expand_variables(item)?)))
                    .collect::<AppResult<_>>()?,
            ),
            other => other,
        })
    }

    fn expand_string(&self, text: &str) -> AppResult<String> {
        let mut expanded = String::with_capacity(text.len());
        let mut last = 0;

        for caps in VARIABLE_REFERENCE.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            expanded.push_str(&text[last..whole.start()]);
            last = whole.end();

            if caps.get(1).is_some() {
                expanded.push_str(&whole.as_str()[1..]);
                continue;
            }

            let value = match (self.variables)(name.as_str()) {
                Some(value) => value,
                None => caps
                    .get(3)
                    .map(|default| default.as_str().to_string())
                    .ok_or_else(|| {
                        AppError::Configuration(format!(
                            "Environment variable {} not found and no default provided",
                            name.as_str()
                        ))
                    })?,
            };
            expanded.push_str(&value);
        }

        expanded.push_str(&text[last..]);
        Ok(expanded)
    }
}

fn read_to_string(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse(content: &str, format: DocumentFormat) -> AppResult<Value> {
    Ok(match format {
        DocumentFormat::Json => serde_json::from_str(content)?,
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
    })
}

fn check_schema(document: &Value, schema: &Value) -> AppResult<()> {
    let violations = schema::validate_against_schema(document, schema)?;
    if violations.is_empty() {
        return Ok(());
    }
    for violation in &violations {
        tracing::debug!("Schema violation: {}", violation);
    }
    Err(AppError::SchemaValidation(violations))
}
