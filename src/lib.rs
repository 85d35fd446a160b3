pub mod dataflow_functions;
pub mod parser;
pub mod statement;
pub mod translate;
