//! Utility functions for reporting and persisting results.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::evaluator::FitnessReport;
use crate::solution::{DeliverySchedule, Solution};

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Everything written out for a finished run.
#[derive(Debug, Serialize)]
pub struct SolutionRecord<'a> {
    pub routes: Vec<&'a [usize]>,
    pub report: &'a FitnessReport,
    pub schedule: &'a DeliverySchedule,
}

impl<'a> SolutionRecord<'a> {
    /// Collect the routes of `solution` with its report and schedule.
    pub fn new(
        solution: &'a Solution,
        report: &'a FitnessReport,
        schedule: &'a DeliverySchedule,
    ) -> Self {
        SolutionRecord {
            routes: solution.routes.iter().map(|r| r.nodes.as_slice()).collect(),
            report,
            schedule,
        }
    }
}

/// Save a solution, its report and its delivery schedule as JSON.
pub fn save_solution<P: AsRef<Path>>(record: &SolutionRecord<'_>, path: P) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, record)?;
    Ok(())
}

/// Print a short summary of a solution to the console.
pub fn print_solution(solution: &Solution, report: &FitnessReport) {
    println!("Raw cost: {:.2}", report.raw_cost);
    println!("Penalty: {:.2}", report.penalty);
    println!("Valid: {}", report.is_valid());
    println!("Routes used: {}", solution.used_route_count());
    for (i, route) in solution.routes.iter().enumerate() {
        if route.is_empty() {
            continue;
        }
        let path: Vec<String> = route.nodes.iter().map(|n| n.to_string()).collect();
        println!("Route #{}: {}", i + 1, path.join(" -> "));
    }
    for violation in &report.violations {
        println!("  {}", violation);
    }
}
