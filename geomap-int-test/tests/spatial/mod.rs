//! Spatial integration test module.
//!
//! These tests drive the handler against real SQLite database files with
//! stand-ins for the Spatialite SQL functions registered on the connection.

mod boundary_query_test;
mod catalog_test;
mod geometry_iterator_test;
mod handler_test;
