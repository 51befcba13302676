//! Solution representation: routes, edges and neighborhood moves.

use crate::problem::DEPOT;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An undirected edge between two nodes, stored with the smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge(pub usize, pub usize);

impl Edge {
    /// Create a normalized edge.
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Edge(a, b)
        } else {
            Edge(b, a)
        }
    }

    /// Check if the edge connects a node to itself.
    pub fn is_loop(&self) -> bool {
        self.0 == self.1
    }
}

/// A vehicle route, stored with the depot at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub nodes: Vec<usize>,
}

impl Route {
    /// Create a route serving `customers` in order.
    pub fn new(customers: &[usize]) -> Self {
        let mut nodes = Vec::with_capacity(customers.len() + 2);
        nodes.push(DEPOT);
        nodes.extend_from_slice(customers);
        nodes.push(DEPOT);
        Route { nodes }
    }

    /// Create a route from a full node sequence, depots included.
    pub fn from_nodes(nodes: Vec<usize>) -> Self {
        Route { nodes }
    }

    /// The customers served, without the bounding depots.
    pub fn customers(&self) -> &[usize] {
        if self.is_closed() {
            &self.nodes[1..self.nodes.len() - 1]
        } else {
            &self.nodes
        }
    }

    /// Check if the route starts and ends at the depot.
    pub fn is_closed(&self) -> bool {
        self.nodes.len() >= 2
            && self.nodes.first() == Some(&DEPOT)
            && self.nodes.last() == Some(&DEPOT)
    }

    /// Check if the route serves no customer.
    pub fn is_empty(&self) -> bool {
        self.customers().is_empty()
    }

    /// The edges travelled by this route.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.nodes
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| Edge::new(a, b))
    }
}

/// A complete solution: one route per vehicle used.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Solution {
    pub routes: Vec<Route>,
}

impl Solution {
    /// Create a solution from its routes.
    pub fn new(routes: Vec<Route>) -> Self {
        Solution { routes }
    }

    /// Concatenate the routes into a single sequence, sharing the depot between
    /// consecutive routes.
    ///
    /// `[0, 1, 2, 0]` and `[0, 3, 0]` become `[0, 1, 2, 0, 3, 0]`.
    pub fn to_sequence(&self) -> Vec<usize> {
        let mut sequence = vec![DEPOT];

        for route in &self.routes {
            sequence.extend_from_slice(route.customers());
            sequence.push(DEPOT);
        }

        sequence
    }

    /// Split a depot-delimited sequence back into routes.
    ///
    /// Adjacent depot markers yield an empty route, so the number of routes is
    /// preserved across [`to_sequence`](Self::to_sequence).
    pub fn from_sequence(sequence: &[usize]) -> Self {
        let inner = match sequence {
            [DEPOT, inner @ .., DEPOT] => inner,
            [DEPOT] | [] => return Solution::new(Vec::new()),
            other => other,
        };

        let routes = inner
            .split(|&node| node == DEPOT)
            .map(Route::new)
            .collect();

        Solution::new(routes)
    }

    /// All customers in visiting order.
    pub fn customers(&self) -> Vec<usize> {
        self.routes
            .iter()
            .flat_map(|route| route.customers().iter().copied())
            .collect()
    }

    /// Number of routes, empty ones included.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Number of routes serving at least one customer.
    pub fn used_route_count(&self) -> usize {
        self.routes.iter().filter(|route| !route.is_empty()).count()
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution:")?;
        for (i, route) in self.routes.iter().enumerate() {
            writeln!(
                f,
                "  Route {}: {}",
                i,
                route.nodes.iter().join(" -> ")
            )?;
        }
        Ok(())
    }
}

/// A neighbor of a solution, with the edges the move removed and introduced.
#[derive(Debug, Clone)]
pub struct Move {
    pub solution: Solution,
    pub sequence: Vec<usize>,
    pub deleted: Vec<Edge>,
    pub added: Vec<Edge>,
}

impl Move {
    /// Every edge touched by the move.
    pub fn touched_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.deleted.iter().chain(self.added.iter())
    }
}

/// Arrival time at each customer along its route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliverySchedule {
    pub arrivals: BTreeMap<usize, f64>,
}

impl DeliverySchedule {
    /// Arrival time at a customer, if visited.
    pub fn arrival(&self, customer: usize) -> Option<f64> {
        self.arrivals.get(&customer).copied()
    }
}
