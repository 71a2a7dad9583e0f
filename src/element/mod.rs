pub mod element_model;
pub mod extractor;
