//! `tessera check` command implementation.
//!
//! Loads a configuration and cross-checks its files:
//! - Metadata builds (no duplicate objects, no dangling relations)
//! - Every role's matrix resolves against the metadata
//! - Suspicious grants (write access on objects the role cannot read)

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

use tessera_core::{Capability, ObjectMetadataMaps, ObjectRecordsPermissions, TesseraConfig};

// ============================================================================
// Check Result Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Category of the check that produced this finding.
    pub category: String,
    pub message: String,
    /// Role the finding applies to, if any.
    pub role: Option<String>,
}

impl CheckFinding {
    fn new(severity: Severity, category: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.to_string(),
            message: message.into(),
            role: None,
        }
    }

    fn error(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    fn warning(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    fn info(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }

    fn for_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }
}

/// Results from running all checks.
#[derive(Debug, Default)]
pub struct CheckResults {
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    fn add(&mut self, finding: CheckFinding) {
        self.findings.push(finding);
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Print findings, most severe first.
    pub fn print_summary(&self) {
        let mut findings: Vec<_> = self.findings.iter().collect();
        findings.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.category.cmp(&b.category))
        });

        for finding in findings {
            let role = finding
                .role
                .as_deref()
                .map(|r| format!(" [role:{}]", r))
                .unwrap_or_default();
            println!(
                "  {:<5} [{}]{}: {}",
                finding.severity, finding.category, role, finding.message
            );
        }

        println!();
        if self.has_errors() || self.warning_count() > 0 {
            println!(
                "Summary: {} error(s), {} warning(s)",
                self.error_count(),
                self.warning_count()
            );
        } else {
            println!("All checks passed.");
        }
    }
}

// ============================================================================
// Checks
// ============================================================================

/// Run all configuration checks without printing.
pub fn run_quiet(config_path: &Path) -> Result<CheckResults> {
    let config =
        TesseraConfig::load_with_context(config_path).context("Failed to load configuration")?;
    let mut results = CheckResults::default();

    let maps = match config.metadata_maps() {
        Ok(maps) => maps,
        Err(e) => {
            results.add(CheckFinding::error("metadata", e.to_string()));
            return Ok(results);
        }
    };
    if maps.is_empty() {
        results.add(CheckFinding::warning("metadata", "no objects are defined"));
    }

    if config.roles.is_empty() {
        results.add(CheckFinding::warning(
            "permissions",
            "no permission matrices were loaded; every query will be denied",
        ));
    }

    for role in config.role_names() {
        match config.permissions_for(role, &maps) {
            Ok(permissions) => check_role(role, &permissions, &maps, &mut results),
            Err(e) => results.add(CheckFinding::error("permissions", e.to_string()).for_role(role)),
        }
    }

    tracing::debug!(
        findings = results.findings.len(),
        roles = config.roles.len(),
        objects = maps.len(),
        "Configuration checked"
    );
    Ok(results)
}

fn check_role(
    role: &str,
    permissions: &ObjectRecordsPermissions,
    maps: &ObjectMetadataMaps,
    results: &mut CheckResults,
) {
    let mut objects: Vec<_> = maps.objects().collect();
    objects.sort_by(|a, b| a.name_singular.cmp(&b.name_singular));

    for object in objects {
        let Some(perms) = permissions.get(&object.id) else {
            results.add(
                CheckFinding::info(
                    "coverage",
                    format!("'{}' has no entry and is denied", object.name_singular),
                )
                .for_role(role),
            );
            continue;
        };

        if perms.can_read {
            continue;
        }
        let writes: Vec<String> = [
            Capability::Create,
            Capability::Update,
            Capability::SoftDelete,
            Capability::Destroy,
        ]
        .into_iter()
        .filter(|c| perms.allows(*c))
        .map(|c| c.to_string())
        .collect();
        if !writes.is_empty() {
            results.add(
                CheckFinding::warning(
                    "grants",
                    format!(
                        "'{}' grants {} without read; it cannot be selected or joined",
                        object.name_singular,
                        writes.join(", ")
                    ),
                )
                .for_role(role),
            );
        }
    }
}

/// Run all configuration checks and print the results.
pub fn run(config_path: &Path) -> Result<()> {
    println!("Checking {}", config_path.display());
    println!();

    let results = run_quiet(config_path)?;
    results.print_summary();

    if results.has_errors() {
        anyhow::bail!("Configuration has {} error(s)", results.error_count());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(dir: &TempDir, permissions: &str) -> std::path::PathBuf {
        fs::write(
            dir.path().join("tessera.yaml"),
            "metadata_file: metadata.yaml\npermissions_dir: permissions\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("metadata.yaml"),
            r#"
objects:
  - name: company
    fields:
      - name: id
      - name: name
  - name: person
    fields:
      - name: id
"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("permissions")).unwrap();
        fs::write(dir.path().join("permissions/sales.yaml"), permissions).unwrap();
        dir.path().join("tessera.yaml")
    }

    #[test]
    fn test_valid_config() {
        let dir = TempDir::new().unwrap();
        let path = write_project(
            &dir,
            "role: sales\nobjects:\n  company:\n    can_read: true\n  person:\n    can_read: true\n",
        );

        let results = run_quiet(&path).unwrap();
        assert!(!results.has_errors());
        assert_eq!(results.warning_count(), 0);
    }

    #[test]
    fn test_unknown_object_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_project(&dir, "role: sales\nobjects:\n  invoice:\n    can_read: true\n");

        let results = run_quiet(&path).unwrap();
        assert_eq!(results.error_count(), 1);
        assert_eq!(results.findings[0].role.as_deref(), Some("sales"));
        assert!(results.findings[0].message.contains("invoice"));
    }

    #[test]
    fn test_write_without_read_warns_and_missing_entry_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_project(&dir, "role: sales\nobjects:\n  company:\n    can_update: true\n");

        let results = run_quiet(&path).unwrap();
        assert!(!results.has_errors());
        assert_eq!(results.warning_count(), 1);
        assert!(
            results
                .findings
                .iter()
                .any(|f| f.severity == Severity::Info && f.message.contains("'person'"))
        );
    }
}
