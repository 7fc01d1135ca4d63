//! InfluxQL statement builders for the administrative operations.
//!
//! Each builder returns the statement text sent to the server together with a
//! redacted rendering that is safe to log.

const REDACTED: &str = "'******'";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub text: String,
    pub redacted: String,
}

impl Statement {
    fn public(text: String) -> Self {
        Self {
            redacted: text.clone(),
            text,
        }
    }
}

/// Double-quote an identifier (database or user name)
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", escape(ident, '"'))
}

/// Single-quote a string literal (passwords)
pub fn quote_string(value: &str) -> String {
    format!("'{}'", escape(value, '\''))
}

fn escape(value: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == quote {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn create_user(user: &str, password: &str, admin: bool) -> Statement {
    let suffix = if admin { " WITH ALL PRIVILEGES" } else { "" };
    let user = quote_ident(user);
    Statement {
        text: format!(
            "CREATE USER {} WITH PASSWORD {}{}",
            user,
            quote_string(password),
            suffix
        ),
        redacted: format!("CREATE USER {} WITH PASSWORD {}{}", user, REDACTED, suffix),
    }
}

pub fn create_database(name: &str) -> Statement {
    Statement::public(format!("CREATE DATABASE {}", quote_ident(name)))
}

pub fn grant_all(database: &str, user: &str) -> Statement {
    Statement::public(format!(
        "GRANT ALL ON {} TO {}",
        quote_ident(database),
        quote_ident(user)
    ))
}

pub fn show_databases() -> Statement {
    Statement::public("SHOW DATABASES".to_string())
}

pub fn show_users() -> Statement {
    Statement::public("SHOW USERS".to_string())
}
