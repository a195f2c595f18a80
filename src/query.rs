//! Builder for the Netskope query filter DSL.
//!
//! Both v1 endpoints accept a `query` parameter of `field OP value` clauses
//! joined by `and`, e.g. `hostname eq HOST1 and user eq alice`. The builder
//! only renders the expression; URL encoding happens when the client
//! attaches it as a query parameter.

/// An ordered conjunction of `field eq value` clauses.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<String>,
}

impl Filter {
    /// Starts an empty filter.
    pub fn new() -> Self {
        Filter::default()
    }

    /// Appends a `field eq value` clause.
    pub fn eq(mut self, field: &str, value: &str) -> Self {
        self.clauses.push(format!("{field} eq {value}"));
        self
    }

    /// Renders the expression with clauses joined by ` and `.
    pub fn render(&self) -> String {
        self.clauses.join(" and ")
    }
}
