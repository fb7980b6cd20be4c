// Integration tests run against a real Postgres instance and are ignored by
// default. Set DATABASE_URL and run with `cargo test -- --ignored`.
mod common;
mod ledger_test;
mod reconciler_test;
mod routes_test;
mod submission_test;
