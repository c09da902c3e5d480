//! Secret backends for reading the updown.io API key.
//!
//! Resolution is via secret backends only (1Password, Bitwarden, KeePassXC).
//! Each backend is configured through `UPDOWN_*` environment variables and
//! returns `None` when it is not configured or the lookup fails.

use std::process::{Command, Stdio};

/// Trimmed, non-empty value of an env var.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read a secret from a subprocess; stderr is discarded to avoid leaking into output.
fn read_secret(args: &[&str], env_extra: &[(&str, &str)]) -> Option<String> {
    let (bin, rest) = args.split_first()?;
    let mut cmd = Command::new(bin);
    cmd.args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .envs(env_extra.iter().copied());
    let out = cmd.output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build the `op://` reference for the API key field.
fn op_reference(
    entry_path: Option<String>,
    vault_item: Option<(String, String)>,
    field: &str,
) -> Option<String> {
    if let Some(path) = entry_path {
        return Some(format!("{}/{}", path.trim_end_matches('/'), field));
    }
    let (vault, item) = vault_item?;
    Some(format!("op://{}/{}/{}", vault, item, field))
}

/// 1Password CLI (`op read`).
///
/// Configure via:
/// - `UPDOWN_OP_ENTRY_PATH`: `op://Vault/Item` (field name from `UPDOWN_OP_FIELD`, default `API_KEY`)
/// - Or `UPDOWN_OP_VAULT` + `UPDOWN_OP_ITEM` + optional `UPDOWN_OP_FIELD` (default `API_KEY`)
pub fn one_password() -> Option<String> {
    // Set but blank means misconfigured, not "use the default".
    let field = match std::env::var("UPDOWN_OP_FIELD") {
        Ok(_) => env_value("UPDOWN_OP_FIELD")?,
        Err(_) => "API_KEY".to_string(),
    };
    let vault_item = env_value("UPDOWN_OP_VAULT").zip(env_value("UPDOWN_OP_ITEM"));
    let uri = op_reference(env_value("UPDOWN_OP_ENTRY_PATH"), vault_item, &field)?;
    read_secret(&["op", "read", &uri], &[])
}

/// Bitwarden CLI (`bw get password`).
///
/// Configure via:
/// - `UPDOWN_BW_ITEM_ID`: UUID of the login item (from `bw list items`)
/// - `UPDOWN_BW_SESSION`: optional session key (from `bw unlock --raw`), passed on as `BW_SESSION`
pub fn bitwarden() -> Option<String> {
    let id = env_value("UPDOWN_BW_ITEM_ID")?;
    match env_value("UPDOWN_BW_SESSION") {
        Some(session) => read_secret(
            &["bw", "get", "password", &id],
            &[("BW_SESSION", session.as_str())],
        ),
        None => read_secret(&["bw", "get", "password", &id], &[]),
    }
}

/// KeePassXC CLI (`keepassxc-cli show`).
///
/// Configure via:
/// - `UPDOWN_KPXC_DB`: path to the .kdbx database file
/// - `UPDOWN_KPXC_ENTRY`: entry title or path (e.g. "updown" or "Web/updown")
/// - `UPDOWN_KPXC_ATTRIBUTE`: attribute name (default `Password`)
pub fn keepassxc() -> Option<String> {
    let db = env_value("UPDOWN_KPXC_DB")?;
    let entry = env_value("UPDOWN_KPXC_ENTRY")?;
    let attr = env_value("UPDOWN_KPXC_ATTRIBUTE").unwrap_or_else(|| "Password".to_string());
    read_secret(&["keepassxc-cli", "show", "-a", &attr, &db, &entry], &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backends_not_configured() {
        assert!(one_password().is_none());
        assert!(bitwarden().is_none());
        assert!(keepassxc().is_none());
    }

    #[test]
    fn op_reference_from_entry_path() {
        assert_eq!(
            op_reference(Some("op://Ops/updown/".to_string()), None, "API_KEY").as_deref(),
            Some("op://Ops/updown/API_KEY")
        );
    }

    #[test]
    fn op_reference_from_vault_and_item() {
        let vi = Some(("Ops".to_string(), "updown".to_string()));
        assert_eq!(
            op_reference(None, vi, "READONLY_KEY").as_deref(),
            Some("op://Ops/updown/READONLY_KEY")
        );
        assert!(op_reference(None, None, "API_KEY").is_none());
    }
}
