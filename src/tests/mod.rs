pub(crate) mod fixtures;
mod idx;
