//! Findings and the reporter that dedups and suppresses them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use ctxprop_core::id::NodeId;
use ctxprop_core::node::Position;

use crate::directive::Suppress;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A terminal call whose chain never received the marker.
    MissingPropagation,
    /// A direct logging call that skips the builder chain entirely.
    BypassCall,
    /// An ignore directive that suppressed nothing.
    UnusedDirective,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::MissingPropagation => write!(f, "missing-propagation"),
            FindingKind::BypassCall => write!(f, "bypass-call"),
            FindingKind::UnusedDirective => write!(f, "unused-directive"),
        }
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// Offending node; `None` for directive findings.
    pub node: Option<NodeId>,
    pub position: Option<Position>,
    /// Name of the marker binding in scope, or the directive text for
    /// [`FindingKind::UnusedDirective`].
    pub marker: String,
}

impl Finding {
    /// Human-readable message; `setter` names the marker setter method.
    pub fn message(&self, setter: &str) -> String {
        match self.kind {
            FindingKind::MissingPropagation => {
                format!("call chain missing .{}({})", setter, self.marker)
            }
            FindingKind::BypassCall => format!(
                "direct logging bypasses the call chain; use .{}({})",
                setter, self.marker
            ),
            FindingKind::UnusedDirective => format!("unused {} directive", self.marker),
        }
    }

    fn sort_key(&self) -> (bool, Option<&Position>, Option<NodeId>) {
        (self.position.is_none(), self.position.as_ref(), self.node)
    }
}

/// Collects findings for one analysis pass.
///
/// A position is reported at most once; findings without a position are
/// deduplicated by node instead. Suppressed findings are counted but not
/// kept.
pub struct Reporter<'s> {
    suppress: &'s mut dyn Suppress,
    seen_positions: HashSet<Position>,
    seen_nodes: HashSet<NodeId>,
    findings: Vec<Finding>,
    suppressed: usize,
}

impl<'s> Reporter<'s> {
    pub fn new(suppress: &'s mut dyn Suppress) -> Self {
        Reporter {
            suppress,
            seen_positions: HashSet::new(),
            seen_nodes: HashSet::new(),
            findings: Vec::new(),
            suppressed: 0,
        }
    }

    /// Records `finding` unless it is a duplicate or suppressed. Returns
    /// `true` if it was kept.
    pub fn report(&mut self, finding: Finding) -> bool {
        let fresh = match (&finding.position, finding.node) {
            (Some(pos), _) => self.seen_positions.insert(pos.clone()),
            (None, Some(node)) => self.seen_nodes.insert(node),
            (None, None) => true,
        };
        if !fresh {
            return false;
        }
        if let Some(pos) = &finding.position {
            if self.suppress.should_suppress(pos) {
                tracing::debug!(%pos, kind = %finding.kind, "finding suppressed");
                self.suppressed += 1;
                return false;
            }
        }
        self.findings.push(finding);
        true
    }

    /// Directives the suppression source never used.
    pub fn unused_directives(&self) -> Vec<Position> {
        self.suppress.unused()
    }

    pub fn finish(self) -> Report {
        Report::new(self.findings, self.suppressed)
    }
}

/// The result of an analysis pass, sorted by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    findings: Vec<Finding>,
    suppressed: usize,
}

impl Report {
    pub fn new(mut findings: Vec<Finding>, suppressed: usize) -> Self {
        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Report { findings, suppressed }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    /// Number of findings dropped by suppression directives.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{DirectiveIndex, NoSuppression};

    fn missing(node: u32, pos: Option<Position>) -> Finding {
        Finding {
            kind: FindingKind::MissingPropagation,
            node: Some(NodeId(node)),
            position: pos,
            marker: "ctx".into(),
        }
    }

    #[test]
    fn messages() {
        let f = missing(1, None);
        assert_eq!(f.message("Ctx"), "call chain missing .Ctx(ctx)");

        let bypass = Finding {
            kind: FindingKind::BypassCall,
            ..f.clone()
        };
        assert_eq!(
            bypass.message("Ctx"),
            "direct logging bypasses the call chain; use .Ctx(ctx)"
        );

        let unused = Finding {
            kind: FindingKind::UnusedDirective,
            node: None,
            position: None,
            marker: "ctxprop:ignore".into(),
        };
        assert_eq!(unused.message("Ctx"), "unused ctxprop:ignore directive");
    }

    #[test]
    fn dedup_by_position_then_node() {
        let mut none = NoSuppression;
        let mut reporter = Reporter::new(&mut none);
        let pos = Position::new("a.go", 3, 1);

        assert!(reporter.report(missing(1, Some(pos.clone()))));
        assert!(!reporter.report(missing(2, Some(pos))));
        assert!(reporter.report(missing(3, None)));
        assert!(!reporter.report(missing(3, None)));
        assert!(reporter.report(missing(4, None)));

        assert_eq!(reporter.finish().len(), 3);
    }

    #[test]
    fn suppressed_findings_are_counted() {
        let mut index = DirectiveIndex::new();
        index.add_source("a.go", "x\n//ctxprop:ignore\ny\n", "ctxprop:ignore");
        let mut reporter = Reporter::new(&mut index);

        assert!(!reporter.report(missing(1, Some(Position::new("a.go", 3, 1)))));
        assert!(reporter.report(missing(2, Some(Position::new("a.go", 1, 1)))));
        assert!(reporter.unused_directives().is_empty());

        let report = reporter.finish();
        assert_eq!(report.len(), 1);
        assert_eq!(report.suppressed(), 1);
    }

    #[test]
    fn report_sorts_positioned_first() {
        let report = Report::new(
            vec![
                missing(9, None),
                missing(2, Some(Position::new("b.go", 1, 1))),
                missing(5, Some(Position::new("a.go", 7, 1))),
            ],
            0,
        );
        let nodes: Vec<_> = report.findings().iter().map(|f| f.node).collect();
        assert_eq!(nodes, vec![Some(NodeId(5)), Some(NodeId(2)), Some(NodeId(9))]);
        assert_eq!(report.of_kind(FindingKind::BypassCall).count(), 0);
    }
}
