pub mod share;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_support;
