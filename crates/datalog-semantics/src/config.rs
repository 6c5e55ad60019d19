//! Configuration recognized by the semantic checker

use datalog_ast::{Program, RelationName};

/// The two keys the checker reacts to. Anything else the driver carries is
/// of no concern here.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// `*` to mute every relation, or a comma-separated list of dotted
    /// relation names
    pub suppress_warnings: Option<String>,
    /// Non-empty value enables the per-clause debug report of the type
    /// analysis
    pub debug_report: Option<String>,
}

impl Config {
    pub fn debug_report_enabled(&self) -> bool {
        self.debug_report.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Set the suppression qualifier on the configured relations. This is the
/// only place the checker writes to the AST; run it before the read-only
/// checks.
pub fn apply_warning_suppression(program: &mut Program, config: &Config) {
    let Some(value) = config.suppress_warnings.as_deref() else {
        return;
    };
    let requested: Vec<&str> = value.split(',').map(str::trim).collect();

    if requested.contains(&"*") {
        for relation in &mut program.relations {
            relation.is_suppressed = true;
        }
        return;
    }

    for name in requested {
        if name.is_empty() {
            continue;
        }
        let name = RelationName::from_dotted(name);
        if let Some(relation) = program.relations.iter_mut().find(|r| r.name == name) {
            relation.is_suppressed = true;
        }
    }
}
