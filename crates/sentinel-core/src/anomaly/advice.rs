//! Recommendation and impact lookup tables
//!
//! Static advice keyed by metric and anomaly direction. Unmapped
//! combinations fall back to generic guidance.

use super::stats::Trend;
use super::AnomalyKind;
use crate::models::metric_names::{ACTIVE_USERS, ERROR_RATE, RESPONSE_TIME, SERVER_LOAD};

const FALLBACK_RECOMMENDATION: &str = "Monitor closely and investigate if pattern continues.";
const FALLBACK_IMPACT: &str = "Monitor for business impact";

/// Recommended action for an anomaly of `kind` on `metric`
pub fn recommendation(metric: &str, kind: AnomalyKind) -> &'static str {
    match (metric, kind) {
        (ACTIVE_USERS, AnomalyKind::Spike) => {
            "Monitor server capacity and consider auto-scaling. Check for traffic sources."
        }
        (ACTIVE_USERS, AnomalyKind::Drop) => {
            "Investigate potential service issues or marketing campaign effectiveness."
        }
        (ACTIVE_USERS, AnomalyKind::Trend) => {
            "Analyze user engagement patterns and optimize conversion funnels."
        }
        (RESPONSE_TIME, AnomalyKind::Spike) => {
            "Check database performance, optimize queries, and review server resources."
        }
        (RESPONSE_TIME, AnomalyKind::Drop) => {
            "Great! Monitor to ensure performance improvements are sustained."
        }
        (RESPONSE_TIME, AnomalyKind::Trend) => {
            "Implement performance monitoring and consider infrastructure upgrades."
        }
        (ERROR_RATE, AnomalyKind::Spike) => {
            "Immediate investigation required. Check logs and recent deployments."
        }
        (ERROR_RATE, AnomalyKind::Drop) => {
            "Excellent! Continue monitoring error patterns for sustained improvement."
        }
        (ERROR_RATE, AnomalyKind::Trend) => {
            "Review error patterns and implement preventive measures."
        }
        (SERVER_LOAD, AnomalyKind::Spike) => {
            "Consider load balancing and resource optimization. Monitor for capacity limits."
        }
        (SERVER_LOAD, AnomalyKind::Drop) => {
            "Good resource utilization. Monitor for any underlying issues."
        }
        (SERVER_LOAD, AnomalyKind::Trend) => {
            "Plan capacity management and consider infrastructure scaling."
        }
        _ => FALLBACK_RECOMMENDATION,
    }
}

/// Expected business impact of a spike or drop on `metric`
pub fn predicted_impact(metric: &str, kind: AnomalyKind) -> &'static str {
    match (metric, kind) {
        (ACTIVE_USERS, AnomalyKind::Spike) => {
            "Potential server overload, increased costs, possible service degradation"
        }
        (ACTIVE_USERS, AnomalyKind::Drop) => {
            "Reduced revenue, lower engagement, potential business impact"
        }
        (RESPONSE_TIME, AnomalyKind::Spike) => {
            "Poor user experience, increased bounce rate, SEO impact"
        }
        (RESPONSE_TIME, AnomalyKind::Drop) => "Improved user satisfaction, better conversion rates",
        (ERROR_RATE, AnomalyKind::Spike) => "User frustration, data loss risk, reputation damage",
        (ERROR_RATE, AnomalyKind::Drop) => "Improved reliability, better user trust",
        (SERVER_LOAD, AnomalyKind::Spike) => {
            "System instability, potential downtime, performance degradation"
        }
        (SERVER_LOAD, AnomalyKind::Drop) => "Improved efficiency, cost savings",
        _ => FALLBACK_IMPACT,
    }
}

/// Impact text for a detected trend
pub fn trend_impact(trend: Trend, slope: f64) -> String {
    let intensity = if slope.abs() > 0.5 {
        "significant"
    } else {
        "moderate"
    };
    let concern = if trend == Trend::Increasing {
        "capacity"
    } else {
        "performance"
    };
    format!("{intensity} {trend} trend may lead to {concern} concerns if continued")
}
