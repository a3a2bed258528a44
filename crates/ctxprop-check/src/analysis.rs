//! The whole-graph analysis pass.

use std::collections::BTreeSet;

use ctxprop_core::graph::ValueGraph;
use ctxprop_core::id::ProcId;

use crate::ambient;
use crate::classify::RoleClassifier;
use crate::directive::{Suppress, DEFAULT_DIRECTIVE};
use crate::driver::Checker;
use crate::report::{Finding, FindingKind, Report, Reporter};

/// File-name suffix of test sources.
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// Knobs for one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Directive text, used to label unused-directive findings.
    pub directive: String,
    pub report_unused_directives: bool,
    /// Leave procedures declared in test sources unchecked.
    pub skip_test_files: bool,
    /// Files whose procedures are left unchecked.
    pub exclude_files: BTreeSet<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            directive: DEFAULT_DIRECTIVE.to_string(),
            report_unused_directives: true,
            skip_test_files: false,
            exclude_files: BTreeSet::new(),
        }
    }
}

impl AnalysisOptions {
    /// `true` if procedures declared in `file` are not checked.
    pub fn skips_file(&self, file: &str) -> bool {
        (self.skip_test_files && file.ends_with(TEST_FILE_SUFFIX)) || self.exclude_files.contains(file)
    }

    fn skips_procedure(&self, graph: &ValueGraph, proc: ProcId) -> bool {
        declared_file(graph, proc).is_some_and(|file| self.skips_file(file))
    }
}

/// File `proc` is declared in; closures without a position of their own
/// take their nearest positioned ancestor's.
fn declared_file(graph: &ValueGraph, proc: ProcId) -> Option<&str> {
    let mut current = graph.procedure(proc);
    let mut hops = 0;
    while let Some(def) = current {
        if let Some(pos) = &def.pos {
            return Some(pos.file.as_str());
        }
        hops += 1;
        if hops > graph.procedure_count() {
            return None;
        }
        current = def.parent.and_then(|parent| graph.procedure(parent));
    }
    None
}

/// Analyzes every procedure with an ambient binding using default options.
pub fn analyze(graph: &ValueGraph, classifier: &dyn RoleClassifier, suppress: &mut dyn Suppress) -> Report {
    analyze_with(graph, classifier, suppress, &AnalysisOptions::default())
}

/// Analyzes every procedure with an ambient binding, in `ProcId` order.
pub fn analyze_with(
    graph: &ValueGraph,
    classifier: &dyn RoleClassifier,
    suppress: &mut dyn Suppress,
    options: &AnalysisOptions,
) -> Report {
    let bindings = ambient::discover(graph, classifier);
    tracing::debug!(
        procedures = graph.procedure_count(),
        bound = bindings.len(),
        "ambient bindings discovered"
    );

    let checker = Checker::new(graph, classifier);
    let mut reporter = Reporter::new(suppress);
    for (proc, binding) in &bindings {
        if options.skips_procedure(graph, *proc) {
            tracing::debug!(%proc, "procedure in skipped file");
            continue;
        }
        for finding in checker.check_procedure(*proc, binding) {
            reporter.report(finding);
        }
    }

    let unused = if options.report_unused_directives {
        reporter.unused_directives()
    } else {
        Vec::new()
    };
    let mut report = reporter.finish();
    if !unused.is_empty() {
        let suppressed = report.suppressed();
        let mut findings = report.into_findings();
        findings.extend(unused.into_iter().map(|pos| Finding {
            kind: FindingKind::UnusedDirective,
            node: None,
            position: Some(pos),
            marker: options.directive.clone(),
        }));
        report = Report::new(findings, suppressed);
    }

    tracing::debug!(findings = report.len(), suppressed = report.suppressed(), "analysis finished");
    report
}
