//! Graph backends.
//!
//! A backend provides a [`GraphClient`](crate::graph::GraphClient) whose
//! transactions also speak SQL, so the migration runner can manage AGE labels
//! and indexes. PostgreSQL + Apache AGE is the only one.

pub mod postgres;
