//! SQLite database handle for buildgate.

buildgate_core::define_database!(Database, "Database migrations complete");
