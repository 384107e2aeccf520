pub(crate) mod reference;
pub mod xml;
pub(crate) mod zip;
