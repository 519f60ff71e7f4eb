//! Terminal rendering for evidence, versions and stats.

use crate::core::{CriterionStats, PendingValidation, StoreSummary};
use crate::domain::{Evidence, Validation, Version};

pub fn show_evidence(evidence: &Evidence) {
    println!("Evidence ID: {}", evidence.id);
    println!("Title: {}", evidence.title);
    println!("Criterion: {}", evidence.criterion_id);
    if let Some(ref plan) = evidence.action_plan_id {
        println!("Action plan: {}", plan);
    }
    println!("Department: {}", evidence.department);
    println!("Type: {}", evidence.evidence_type);
    println!("Maturity contribution: {}", evidence.maturity_contribution.get());
    println!("Created: {}", evidence.created_at);
    if !evidence.description.is_empty() {
        println!("\n{}", evidence.description);
    }

    println!(
        "\nCurrent version: {} of {}",
        evidence.current_version(),
        evidence.total_versions()
    );
    if let Some(latest) = evidence.latest() {
        show_version(latest);
    }
}

pub fn show_history(evidence: &Evidence) {
    println!("{} ({})", evidence.title, evidence.id);
    println!("{}", "=".repeat(60));

    for version in evidence.history() {
        println!();
        show_version(version);
    }
}

fn show_version(version: &Version) {
    let marker = if version.is_latest { " [latest]" } else { "" };
    println!("  v{} {}{}", version.version, version.status, marker);
    println!("  ID: {}", version.id);
    println!("  Submitted: {} by {}", version.submitted_at, version.submitted_by);
    println!("  Change log: {}", version.change_log);

    if !version.attachments.is_empty() {
        println!(
            "  Attachments: {} ({} bytes)",
            version.attachments.len(),
            version.attachment_bytes()
        );
    }
    for attachment in &version.attachments {
        println!(
            "    {} ({}, {} bytes)",
            attachment.name, attachment.mime_type, attachment.size_bytes
        );
    }

    if let Some(ref validation) = version.rssi_validation {
        show_validation(validation);
    }
}

fn show_validation(validation: &Validation) {
    println!(
        "  Validated: {} by {}",
        validation.validated_at, validation.validated_by
    );

    let scores: Vec<String> = validation
        .criteria
        .scores()
        .iter()
        .map(|(name, score)| format!("{}={}", name, score))
        .collect();
    println!(
        "  Score: {}/10 ({})",
        validation.overall_score,
        scores.join(", ")
    );

    if !validation.remarks.is_empty() {
        println!("  Remarks: {}", validation.remarks);
    }
    for recommendation in &validation.recommendations {
        println!("  - Recommendation: {}", recommendation);
    }
    for action in &validation.next_actions {
        println!("  - Next action: {}", action);
    }
}

pub fn list_evidence(items: &[&Evidence]) {
    if items.is_empty() {
        println!("No evidence found");
        return;
    }

    println!(
        "{:<38} {:<12} {:<8} {:<24} {:<30}",
        "EVIDENCE ID", "CRITERION", "VERSION", "STATUS", "TITLE"
    );
    println!("{}", "-".repeat(115));

    for evidence in items {
        let status = evidence
            .latest()
            .map(|v| v.status.to_string())
            .unwrap_or_default();
        println!(
            "{:<38} {:<12} {:<8} {:<24} {:<30}",
            evidence.id,
            truncate(&evidence.criterion_id, 12),
            format!("v{}", evidence.current_version()),
            status,
            truncate(&evidence.title, 30)
        );
    }

    println!("\nTotal: {} items", items.len());
}

pub fn list_pending(pending: &[PendingValidation<'_>]) {
    if pending.is_empty() {
        println!("No versions awaiting validation");
        return;
    }

    println!(
        "{:<38} {:<8} {:<12} {:<20} {:<30}",
        "EVIDENCE ID", "VERSION", "CRITERION", "SUBMITTED", "TITLE"
    );
    println!("{}", "-".repeat(112));

    for item in pending {
        println!(
            "{:<38} {:<8} {:<12} {:<20} {:<30}",
            item.evidence.id,
            format!("v{}", item.version.version),
            truncate(&item.evidence.criterion_id, 12),
            item.version.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
            truncate(&item.evidence.title, 30)
        );
    }

    println!("\nTotal: {} pending", pending.len());
}

pub fn show_stats(stats: &CriterionStats) {
    println!("Criterion: {}", stats.criterion_id);
    println!("Evidence items: {}", stats.evidence_count);
    println!("Versions: {}", stats.total_versions);
    println!("  Approved: {}", stats.approved_versions);
    println!("  Pending: {}", stats.pending_versions);
    println!("  Rejected: {}", stats.rejected_versions);
    println!(
        "  Requires modification: {}",
        stats.requires_modification_versions
    );
    println!("Maturity gain: {}", stats.maturity_gain);
}

pub fn show_summary(summary: &StoreSummary) {
    println!("Evidence items: {}", summary.evidence_count);
    println!("Approved evidence: {}", summary.approved_evidence);
    println!("Versions: {}", summary.total_versions);
    println!("  Pending: {}", summary.pending_versions);
    println!("  Validated: {}", summary.validated_versions);
    println!("Maturity gain: {}", summary.maturity_gain);
    match summary.average_score {
        Some(avg) => println!("Average score: {:.1}/10", avg),
        None => println!("Average score: -"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Politique de sauvegarde", 10), "Politiq...");
        assert_eq!(truncate("éééééé", 5), "éé...");
    }
}
