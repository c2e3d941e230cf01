//! ReadPick client library: the authenticated request pipeline and the
//! typed backend client built on it.

pub mod api;
pub mod core;
pub mod net;
pub mod store;

#[cfg(test)]
pub mod test_support;
