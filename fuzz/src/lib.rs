pub mod result_format;
