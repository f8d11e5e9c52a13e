//! Event types handed over by the kernel-data source.

pub mod mount;
