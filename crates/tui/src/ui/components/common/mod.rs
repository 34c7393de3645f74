pub mod json_syntax;
