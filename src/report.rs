//! # Run Reports
//!
//! Renders check results for humans (text) or machines (JSON), and maps them
//! onto the process exit code.

use crate::constants::exit_codes;
use crate::orchestration::CheckResult;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Serialize)]
struct Summary {
    total: usize,
    terminal: usize,
    failed: usize,
    orders_submitted: usize,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    summary: Summary,
    runs: &'a [CheckResult],
}

fn summarize(results: &[CheckResult]) -> Summary {
    Summary {
        total: results.len(),
        terminal: results.iter().filter(|r| !r.is_failed()).count(),
        failed: results.iter().filter(|r| r.is_failed()).count(),
        orders_submitted: results.iter().filter(|r| r.order.is_some()).count(),
    }
}

pub fn render(results: &[CheckResult], format: ReportFormat) -> String {
    match format {
        ReportFormat::Json => {
            let report = Report {
                summary: summarize(results),
                runs: results,
            };
            serde_json::to_string_pretty(&report)
                .unwrap_or_else(|e| format!("{{\"error\": \"failed to render report: {e}\"}}"))
        }
        ReportFormat::Text => render_text(results),
    }
}

fn render_text(results: &[CheckResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = writeln!(
            out,
            "{} {} [{}] {}ms",
            result.service_id,
            result.final_state,
            result.run_id,
            result.duration_ms()
        );
        if let Some(reach) = &result.reachability {
            let _ = writeln!(
                out,
                "  reachable: {} ({})",
                reach.reachable,
                reach.observed.as_deref().unwrap_or("-")
            );
        }
        if let (Some(target), Some(bandwidth)) = (&result.target, &result.target_bandwidth) {
            let _ = writeln!(
                out,
                "  bandwidth: {} -> {} {}{}",
                result.previous_bandwidth.as_deref().unwrap_or("?"),
                target,
                bandwidth,
                if result.dry_run && result.decision_made {
                    " (dry run)"
                } else {
                    ""
                }
            );
        }
        if let Some(order) = &result.order {
            let _ = writeln!(
                out,
                "  order: {} external_id={}{}",
                order.order_id,
                order.external_id,
                if order.duplicate { " (existing)" } else { "" }
            );
        }
        if let Some(outcome) = &result.order_outcome {
            let _ = writeln!(out, "  outcome: {outcome}");
        }
        if let Some(error) = &result.error {
            let _ = writeln!(out, "  error: [{}] at {}: {}", error.kind, error.state, error.message);
        }
    }
    let summary = summarize(results);
    let _ = writeln!(
        out,
        "{} run(s): {} terminal, {} failed, {} order(s) submitted",
        summary.total, summary.terminal, summary.failed, summary.orders_submitted
    );
    out
}

pub fn write_report(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

/// 0 when every run reached TERMINAL, 1 when any failed; with `strict`, 3 when a
/// run terminated with a rejected or timed-out order
pub fn exit_code(results: &[CheckResult], strict: bool) -> u8 {
    if results.iter().any(CheckResult::is_failed) {
        exit_codes::FAILED
    } else if strict && !results.iter().all(CheckResult::converged) {
        exit_codes::NOT_CONVERGED
    } else {
        exit_codes::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderOutcome;
    use crate::orchestration::RunError;
    use crate::state_machine::CheckState;

    fn result(final_state: CheckState, outcome: Option<OrderOutcome>) -> CheckResult {
        let mut result = CheckResult::started("SVC-1", false);
        result.final_state = final_state;
        result.order_outcome = outcome;
        if final_state == CheckState::Failed {
            result.error = Some(RunError {
                state: CheckState::Inventoried,
                kind: "inventory_error".into(),
                message: "permanent inventory failure: 404".into(),
            });
        }
        result
    }

    #[test]
    fn test_exit_codes() {
        let ok = result(CheckState::Terminal, None);
        let accepted = result(CheckState::Terminal, Some(OrderOutcome::Accepted));
        let timed_out = result(CheckState::Terminal, Some(OrderOutcome::TimedOut));
        let failed = result(CheckState::Failed, None);

        assert_eq!(exit_code(&[ok.clone(), accepted.clone()], false), 0);
        assert_eq!(exit_code(&[ok.clone(), timed_out.clone()], false), 0);
        assert_eq!(exit_code(&[ok.clone(), timed_out], true), 3);
        assert_eq!(exit_code(&[accepted, failed], true), 1);
        assert_eq!(exit_code(&[ok], true), 0);
    }

    #[test]
    fn test_json_report_has_summary_and_runs() {
        let rendered = render(
            &[result(CheckState::Terminal, None), result(CheckState::Failed, None)],
            ReportFormat::Json,
        );
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["runs"][1]["final_state"], "FAILED");
        assert_eq!(value["runs"][1]["error"]["kind"], "inventory_error");
    }

    #[test]
    fn test_text_report_mentions_error() {
        let rendered = render(&[result(CheckState::Failed, None)], ReportFormat::Text);
        assert!(rendered.contains("SVC-1 FAILED"));
        assert!(rendered.contains("inventory_error"));
        assert!(rendered.contains("1 failed"));
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.json");
        write_report(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }
}
