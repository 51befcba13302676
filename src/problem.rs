//! Problem definition for the capacitated VRP with time windows.

use crate::distance::DistanceMatrix;
use crate::error::{Result, VrpError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Index of the depot in every problem.
pub const DEPOT: usize = 0;

/// A customer (or the depot) with its demand and time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub demand: u32,
    pub time_open: f64,
    pub time_close: f64,
    pub service_time: f64,
}

impl Customer {
    /// Create a new customer.
    pub fn new(
        id: usize,
        x: f64,
        y: f64,
        demand: u32,
        time_open: f64,
        time_close: f64,
        service_time: f64,
    ) -> Self {
        Customer {
            id,
            x,
            y,
            demand,
            time_open,
            time_close,
            service_time,
        }
    }

    /// Create a depot at the given location, open over `[0, time_close]`.
    pub fn depot(x: f64, y: f64, time_close: f64) -> Self {
        Customer::new(DEPOT, x, y, 0, 0.0, time_close, 0.0)
    }
}

/// A validated problem instance: fleet, capacity, customers and their distances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub fleet_size: usize,
    pub vehicle_capacity: u32,
    pub customers: Vec<Customer>,
    pub distances: DistanceMatrix,
}

impl Problem {
    /// Create a problem, rejecting descriptors the solvers cannot work with.
    ///
    /// Customers must be listed by id, with the depot first.
    pub fn new(fleet_size: usize, vehicle_capacity: u32, customers: Vec<Customer>) -> Result<Self> {
        if customers.is_empty() {
            return Err(VrpError::MalformedProblem(
                "customer set is empty".to_string(),
            ));
        }
        if vehicle_capacity == 0 {
            return Err(VrpError::MalformedProblem(
                "vehicle capacity must be positive".to_string(),
            ));
        }
        if fleet_size == 0 {
            return Err(VrpError::MalformedProblem(
                "fleet must contain at least one vehicle".to_string(),
            ));
        }
        if customers[DEPOT].demand != 0 {
            return Err(VrpError::MalformedProblem(
                "depot must have zero demand".to_string(),
            ));
        }

        for (position, customer) in customers.iter().enumerate() {
            if customer.id != position {
                return Err(VrpError::MalformedProblem(format!(
                    "customer at position {} has id {}",
                    position, customer.id
                )));
            }
            if customer.time_open > customer.time_close {
                return Err(VrpError::MalformedProblem(format!(
                    "customer {} has time window [{}, {}]",
                    customer.id, customer.time_open, customer.time_close
                )));
            }
            if customer.service_time < 0.0 {
                return Err(VrpError::MalformedProblem(format!(
                    "customer {} has negative service time",
                    customer.id
                )));
            }
        }

        let points: Vec<(f64, f64)> = customers.iter().map(|c| (c.x, c.y)).collect();
        let distances = DistanceMatrix::from_points(&points)?;

        Ok(Problem {
            fleet_size,
            vehicle_capacity,
            customers,
            distances,
        })
    }

    /// Distance between two customers.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances.get(from, to)
    }

    /// Number of customers, excluding the depot.
    pub fn customer_count(&self) -> usize {
        self.customers.len() - 1
    }

    /// Get the depot.
    pub fn depot(&self) -> &Customer {
        &self.customers[DEPOT]
    }

    /// Load a problem from a text instance.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse a text instance.
    ///
    /// The first line holds `customer_count fleet_size vehicle_capacity`, followed by one
    /// `id x y demand time_open time_close service_time` row per node, depot first.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (header_line, header) = lines.next().ok_or_else(|| VrpError::Parse {
            line: 1,
            message: "missing header".to_string(),
        })?;
        let header = parse_fields(header_line, header, 3)?;
        let declared_customers = header[0] as usize;
        let fleet_size = header[1] as usize;
        let vehicle_capacity = header[2] as u32;

        let mut customers = Vec::new();
        for (line_number, line) in lines {
            let f = parse_fields(line_number, line, 7)?;
            if f[3] < 0.0 {
                return Err(VrpError::Parse {
                    line: line_number,
                    message: "demand must not be negative".to_string(),
                });
            }
            customers.push(Customer::new(
                f[0] as usize,
                f[1],
                f[2],
                f[3] as u32,
                f[4],
                f[5],
                f[6],
            ));
        }

        if customers.len().saturating_sub(1) != declared_customers {
            warn!(
                "Header declares {} customers but {} rows follow the depot",
                declared_customers,
                customers.len().saturating_sub(1)
            );
        }

        Problem::new(fleet_size, vehicle_capacity, customers)
    }
}

fn parse_fields(line_number: usize, line: &str, expected: usize) -> Result<Vec<f64>> {
    let fields = line
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| VrpError::Parse {
                line: line_number,
                message: format!("'{}' is not a number", token),
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    if fields.len() < expected {
        return Err(VrpError::Parse {
            line: line_number,
            message: format!("expected {} fields, found {}", expected, fields.len()),
        });
    }
    Ok(fields)
}
